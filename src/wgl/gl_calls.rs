// wglcore/src/wgl/gl_calls.rs
//
//! GL entry points that the layer wraps: extension queries and debug callbacks.

use super::Wgl;
use crate::current::{self, CurrentState};
use crate::debug::{DebugCallbackFlavor, DebugProc};
use crate::driver::{GLenum, GLint, GLuint};
use crate::error::{self, Error};
use crate::extensions;
use crate::handle::HandleKind;
use crate::registry::ExtFunction;

use glow as gl;
use log::debug;
use std::sync::Arc;

impl Wgl {
    /// `glGetString`. `GL_EXTENSIONS` comes back without the disabled extensions.
    ///
    /// Returns `None` if the calling thread has no current context.
    pub fn gl_get_string(&self, name: GLenum) -> Option<Arc<str>> {
        let state = current::get(self.id)?;
        let raw = state.funcs.driver().get_string(name)?;
        if name != gl::EXTENSIONS {
            return Some(raw.into());
        }
        let disabled = self.disabled_extensions();
        if disabled.is_empty() {
            return Some(raw.into());
        }

        let mut handles = self.handles.lock();
        let index = match handles.find(state.context, HandleKind::Context) {
            Ok(index) => index,
            Err(_) => return Some(raw.into()),
        };
        let context = handles.context_mut(index).ok()?;
        let extensions = context.extensions.get_or_insert_with(|| disabled.filter_string(&raw).into());
        Some(extensions.clone())
    }

    /// `glGetStringi`. For `GL_EXTENSIONS`, `index` counts only the extensions that aren't
    /// disabled.
    pub fn gl_get_string_i(&self, name: GLenum, index: GLuint) -> Option<String> {
        let state = current::get(self.id)?;
        state.funcs.lookup(ExtFunction::GlGetStringi)?;
        let index = match name {
            gl::EXTENSIONS => match self.disabled_indices(&state) {
                Some(disabled) => extensions::remap_index(index, &disabled),
                None => index,
            },
            _ => index,
        };
        state.funcs.driver().get_string_i(name, index)
    }

    /// `glGetIntegerv` for a single value. `GL_NUM_EXTENSIONS` doesn't count the disabled
    /// extensions.
    ///
    /// Returns zero if the calling thread has no current context.
    pub fn gl_get_integer(&self, pname: GLenum) -> GLint {
        let state = match current::get(self.id) {
            Some(state) => state,
            None => return 0,
        };
        let value = state.funcs.driver().get_integer(pname);
        if pname != gl::NUM_EXTENSIONS {
            return value;
        }
        match self.disabled_indices(&state) {
            Some(disabled) => extensions::filtered_count(value, &disabled),
            None => value,
        }
    }

    /// Registers a debug message callback on the current context (`glDebugMessageCallback`,
    /// `glDebugMessageCallbackARB` or `glDebugMessageCallbackAMD`).
    ///
    /// Does nothing if the driver doesn't export the matching entry point.
    pub fn gl_debug_message_callback(
        &self,
        flavor: DebugCallbackFlavor,
        callback: Option<DebugProc>,
        user_data: usize,
    ) -> Result<(), Error> {
        error::record(self.gl_debug_message_callback_inner(flavor, callback, user_data))
    }

    fn gl_debug_message_callback_inner(
        &self,
        flavor: DebugCallbackFlavor,
        callback: Option<DebugProc>,
        user_data: usize,
    ) -> Result<(), Error> {
        let state = current::get(self.id).ok_or(Error::NoCurrentContext)?;
        if state.funcs.lookup(flavor.function()).is_none() {
            debug!("driver has no {}", flavor.function().name());
            return Ok(());
        }
        let trampoline = {
            let handles = self.handles.lock();
            let index = handles.find(state.context, HandleKind::Context)?;
            let context = handles.context(index)?;
            context.debug.set(callback, user_data);
            context.debug.clone()
        };
        state.funcs.driver().debug_message_callback(flavor, trampoline);
        Ok(())
    }

    /// The current context's disabled-index list, built on first use.
    ///
    /// `None` means no filtering: nothing is disabled, or the driver has no `glGetStringi`.
    fn disabled_indices(&self, state: &CurrentState) -> Option<Arc<[GLuint]>> {
        let disabled = self.disabled_extensions();
        if disabled.is_empty() {
            return None;
        }
        {
            let handles = self.handles.lock();
            let index = handles.find(state.context, HandleKind::Context).ok()?;
            if let Some(ref indices) = handles.context(index).ok()?.disabled_indices {
                return Some(indices.clone());
            }
        }

        // Enumerate without the table locked; the driver is only talking to this thread.
        state.funcs.lookup(ExtFunction::GlGetStringi)?;
        let driver = state.funcs.driver();
        let count = driver.get_integer(gl::NUM_EXTENSIONS);
        let indices: Arc<[GLuint]> = disabled
            .disabled_indices(count, |index| driver.get_string_i(gl::EXTENSIONS, index))
            .into();

        let mut handles = self.handles.lock();
        let index = handles.find(state.context, HandleKind::Context).ok()?;
        let context = handles.context_mut(index).ok()?;
        Some(context.disabled_indices.get_or_insert(indices).clone())
    }
}
