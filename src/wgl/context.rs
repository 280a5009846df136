// wglcore/src/wgl/context.rs
//
//! Context lifecycle and the current-context protocol.

use super::{disown, Wgl};
use crate::context::{self, AttribMask, Context};
use crate::current::{self, CurrentState};
use crate::driver::{Dc, DriverContext, DriverTable};
use crate::error::{self, Error};
use crate::handle::{HandleKind, HandleType, Hglrc};
use crate::handle_table::{HandleTable, Payload};
use crate::registry::ExtFunction;

use log::{debug, warn};
use std::sync::Arc;
use std::thread;

impl Wgl {
    /// Creates a rendering context for a device context (`wglCreateContext`).
    pub fn create_context(&self, dc: Dc) -> Result<Hglrc, Error> {
        error::record(self.create_context_inner(dc))
    }

    /// Creates a rendering context with attributes (`wglCreateContextAttribsARB`).
    ///
    /// `attribs` is a list of (name, value) pairs, optionally zero-terminated. Asking for a
    /// major version of 3 or more creates a `ContextV3` handle. A share context that doesn't
    /// resolve fails with `InvalidOperation`.
    pub fn create_context_attribs(
        &self,
        dc: Dc,
        share: Option<Hglrc>,
        attribs: &[i32],
    ) -> Result<Hglrc, Error> {
        error::record(self.create_context_attribs_inner(dc, share, attribs))
    }

    /// Destroys a rendering context (`wglDeleteContext`).
    ///
    /// A context current on another thread, or in use by a driver call, can't be deleted.
    /// Deleting the calling thread's current context releases it first.
    pub fn delete_context(&self, handle: Hglrc) -> Result<(), Error> {
        error::record(self.delete_context_inner(handle))
    }

    /// `wglMakeCurrent`.
    ///
    /// With a context, makes it current on the calling thread with `dc` as both draw and read
    /// target. Without one, releases the calling thread's current context; if there is none,
    /// this succeeds only when a device context is given.
    pub fn make_current(&self, dc: Option<Dc>, handle: Option<Hglrc>) -> Result<(), Error> {
        let result = match handle {
            Some(handle) => self.adopt(handle, dc, dc, |funcs, driver_context| {
                funcs
                    .driver()
                    .make_current(dc, Some(driver_context))
                    .map_err(Error::MakeCurrentFailed)
            }),
            None => {
                if current::context(self.id).is_some() {
                    self.release_current()
                } else if dc.is_none() {
                    Err(Error::InvalidHandle)
                } else {
                    Ok(())
                }
            }
        };
        error::record(result)
    }

    /// `wglMakeContextCurrentARB`: like `make_current`, with distinct draw and read targets.
    ///
    /// Releasing when nothing is current succeeds.
    pub fn make_context_current(
        &self,
        draw_dc: Option<Dc>,
        read_dc: Option<Dc>,
        handle: Option<Hglrc>,
    ) -> Result<(), Error> {
        let result = match handle {
            Some(handle) => self.adopt(handle, draw_dc, read_dc, |funcs, driver_context| {
                funcs.require(ExtFunction::WglMakeContextCurrentArb)?;
                funcs
                    .driver()
                    .make_context_current(draw_dc, read_dc, driver_context)
                    .map_err(Error::MakeCurrentFailed)
            }),
            None => self.release_current(),
        };
        error::record(result)
    }

    /// Shares display lists and objects from `src` with `dst` (`wglShareLists`).
    ///
    /// Both contexts must belong to the same driver.
    pub fn share_lists(&self, src: Hglrc, dst: Hglrc) -> Result<(), Error> {
        let result = self.with_context_pair(src, dst, |funcs, src, dst| {
            funcs.driver().share_lists(src, dst).map_err(Error::DriverCallFailed)
        });
        error::record(result)
    }

    /// Copies the state groups in `mask` from `src` to `dst` (`wglCopyContext`).
    ///
    /// Both contexts must belong to the same driver.
    pub fn copy_context(&self, src: Hglrc, dst: Hglrc, mask: AttribMask) -> Result<(), Error> {
        let result = self.with_context_pair(src, dst, |funcs, src, dst| {
            funcs.driver().copy_context(src, dst, mask).map_err(Error::DriverCallFailed)
        });
        error::record(result)
    }

    /// The calling thread's current context (`wglGetCurrentContext`).
    #[inline]
    pub fn get_current_context(&self) -> Option<Hglrc> {
        current::context(self.id)
    }

    /// The draw device context of the calling thread's current context (`wglGetCurrentDC`).
    pub fn get_current_dc(&self) -> Option<Dc> {
        self.with_current_context(|context| context.draw_dc)
    }

    /// The read device context of the calling thread's current context
    /// (`wglGetCurrentReadDCARB`).
    pub fn get_current_read_dc(&self) -> Option<Dc> {
        self.with_current_context(|context| context.read_dc)
    }

    fn create_context_inner(&self, dc: Dc) -> Result<Hglrc, Error> {
        let funcs = self.dc_funcs(dc).ok_or(Error::DcNotFound)?;
        let driver_context = funcs.driver().create_context(dc).map_err(Error::ContextCreationFailed)?;
        bind_context(&self.handles, HandleType::Context, &funcs, driver_context)
    }

    fn create_context_attribs_inner(
        &self,
        dc: Dc,
        share: Option<Hglrc>,
        attribs: &[i32],
    ) -> Result<Hglrc, Error> {
        let funcs = self.dc_funcs(dc).ok_or(Error::DcNotFound)?;
        funcs.require(ExtFunction::WglCreateContextAttribsArb)?;

        // The share context can't be deleted while the driver creates the new one.
        let share = match share {
            None => None,
            Some(share) => {
                let slot = self
                    .handles
                    .resolve(share, HandleKind::Context)
                    .map_err(|_| Error::InvalidOperation)?;
                let driver_context = slot.context().map_err(|_| Error::InvalidOperation)?.driver_context;
                Some((slot.pin(), driver_context))
            }
        };

        let created = funcs.driver().create_context_attribs(
            dc,
            share.as_ref().map(|&(_, driver_context)| driver_context),
            attribs,
        );
        drop(share);
        let driver_context = created.map_err(Error::ContextCreationFailed)?;
        let handle_type = context::context_type_for_attribs(attribs);
        bind_context(&self.handles, handle_type, &funcs, driver_context)
    }

    fn delete_context_inner(&self, handle: Hglrc) -> Result<(), Error> {
        if current::context(self.id) == Some(handle) {
            if let Err(error) = self.release_current() {
                warn!("failed to release context {} before deleting it: {:?}", handle, error);
                if let Some(context) = current::clear(self.id) {
                    disown(&mut self.handles.lock(), context);
                }
            }
        }

        let slot = self.handles.resolve(handle, HandleKind::Context)?;
        match slot.context()?.owner {
            Some(owner) if owner != thread::current().id() => {
                warn!("can't delete context {}: it is current on another thread", handle);
                return Err(Error::Busy);
            }
            // Being made current on this thread, from inside a driver call.
            Some(_) => {
                warn!("can't delete context {}: it is being made current", handle);
                return Err(Error::Busy);
            }
            None if slot.is_pinned() => {
                warn!("can't delete context {}: a driver call is using it", handle);
                return Err(Error::Busy);
            }
            None => {}
        }

        let binding = slot.free().ok_or(Error::InvalidHandle)?;
        if let Payload::Context(context) = binding.payload {
            if let Err(error) = binding.funcs.driver().delete_context(context.driver_context) {
                warn!("driver failed to destroy context {}: {:?}", handle, error);
            }
        }
        debug!("deleted context {}", handle);
        Ok(())
    }

    /// Makes a context current on the calling thread.
    ///
    /// The context is claimed for this thread before the driver is called, so a second thread
    /// gets `Busy` instead of racing. The table is unlocked during the driver call. If
    /// `make_current` fails, the claim is undone and nothing changes.
    fn adopt<F>(
        &self,
        handle: Hglrc,
        draw_dc: Option<Dc>,
        read_dc: Option<Dc>,
        make_current: F,
    ) -> Result<(), Error>
    where
        F: FnOnce(&DriverTable, DriverContext) -> Result<(), Error>,
    {
        let this_thread = thread::current().id();
        let (pin, funcs, driver_context, previous_owner) = {
            let mut slot = self.handles.resolve(handle, HandleKind::Context)?;
            let context = slot.context_mut()?;
            let previous_owner = context.owner;
            if let Some(owner) = previous_owner {
                if owner != this_thread {
                    warn!("context {} is current on another thread", handle);
                    return Err(Error::Busy);
                }
            }
            context.owner = Some(this_thread);
            let driver_context = context.driver_context;
            let funcs = slot.funcs()?.clone();
            (slot.pin(), funcs, driver_context, previous_owner)
        };

        let result = make_current(&*funcs, driver_context);
        drop(pin);

        let mut handles = self.handles.lock();
        let index = handles.find(handle, HandleKind::Context)?;
        if let Err(error) = result {
            // A nested call from the driver may have made it current after all.
            if current::context(self.id) != Some(handle) {
                if let Ok(context) = handles.context_mut(index) {
                    context.owner = previous_owner;
                }
            }
            return Err(error);
        }

        if let Some(previous) = current::context(self.id) {
            if previous != handle {
                disown(&mut handles, previous);
            }
        }
        if let Ok(context) = handles.context_mut(index) {
            context.owner = Some(this_thread);
            context.draw_dc = draw_dc;
            context.read_dc = read_dc;
        }
        current::set(self.id, CurrentState { context: handle, funcs });
        debug!("made context {} current", handle);
        Ok(())
    }

    fn with_context_pair<F>(&self, src: Hglrc, dst: Hglrc, call: F) -> Result<(), Error>
    where
        F: FnOnce(&DriverTable, DriverContext, DriverContext) -> Result<(), Error>,
    {
        let (funcs, src_context, dst_context, pins) = {
            let mut handles = self.handles.lock();
            let src_index = handles.find(src, HandleKind::Context)?;
            let dst_index = handles.find(dst, HandleKind::Context)?;
            let funcs = handles.funcs(src_index)?.clone();
            if !Arc::ptr_eq(&funcs, handles.funcs(dst_index)?) {
                warn!("contexts {} and {} belong to different drivers", src, dst);
                return Err(Error::InvalidHandle);
            }
            let src_context = handles.context(src_index)?.driver_context;
            let dst_context = handles.context(dst_index)?.driver_context;
            let pins = [handles.pin(src_index), handles.pin(dst_index)];
            drop(handles);
            (funcs, src_context, dst_context, pins)
        };
        let result = call(&*funcs, src_context, dst_context);
        drop(pins);
        result
    }

    fn with_current_context<F, T>(&self, query: F) -> Option<T>
    where
        F: FnOnce(&Context) -> Option<T>,
    {
        let handle = current::context(self.id)?;
        let handles = self.handles.lock();
        let index = handles.find(handle, HandleKind::Context).ok()?;
        query(handles.context(index).ok()?)
    }
}

/// Puts a new driver context in the table, destroying it again if the table is full.
fn bind_context(
    table: &HandleTable,
    handle_type: HandleType,
    funcs: &Arc<DriverTable>,
    driver_context: DriverContext,
) -> Result<Hglrc, Error> {
    let payload = Payload::Context(Context::new(driver_context));
    let allocated = table.lock().alloc(handle_type, funcs.clone(), payload);
    match allocated {
        Ok(handle) => {
            debug!("created context {} ({:?})", handle, handle_type);
            Ok(handle)
        }
        Err(error) => {
            warn!("no handle left for a new context");
            if let Err(error) = funcs.driver().delete_context(driver_context) {
                warn!("driver failed to destroy context: {:?}", error);
            }
            Err(error)
        }
    }
}
