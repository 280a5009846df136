// wglcore/src/debug.rs
//
//! Debug message callbacks.
//!
//! The driver never sees the application's callback. Each context owns one trampoline that the
//! driver is handed at registration time; the trampoline looks up the (callback, user data) pair
//! the application registered last and forwards the message to it.

use crate::driver::{GLenum, GLsizei, GLuint};
use crate::registry::ExtFunction;

use log::trace;
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, Mutex, PoisonError};

/// The message block handed to an application debug callback.
#[derive(Clone, Copy, Debug)]
pub struct DebugMessageParams<'a> {
    /// `GL_DEBUG_SOURCE_*`, or the category for `GL_AMD_debug_output` callbacks.
    pub source: GLenum,
    /// `GL_DEBUG_TYPE_*`. Zero for `GL_AMD_debug_output` callbacks.
    pub ty: GLenum,
    /// The message identifier.
    pub id: GLuint,
    /// `GL_DEBUG_SEVERITY_*`.
    pub severity: GLenum,
    /// The length of `message` in bytes.
    pub length: GLsizei,
    /// The message text.
    pub message: &'a str,
    /// The opaque value passed along with the callback at registration time.
    pub user_data: usize,
}

/// An application debug callback.
pub type DebugProc = Arc<dyn Fn(&DebugMessageParams) + Send + Sync>;

/// The three entry points that register a debug callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebugCallbackFlavor {
    /// `glDebugMessageCallback` (`GL_KHR_debug`, core in 4.3).
    Khr,
    /// `glDebugMessageCallbackARB` (`GL_ARB_debug_output`).
    Arb,
    /// `glDebugMessageCallbackAMD` (`GL_AMD_debug_output`).
    Amd,
}

impl DebugCallbackFlavor {
    /// The driver entry point for this flavor.
    pub(crate) fn function(self) -> ExtFunction {
        match self {
            DebugCallbackFlavor::Khr => ExtFunction::GlDebugMessageCallback,
            DebugCallbackFlavor::Arb => ExtFunction::GlDebugMessageCallbackArb,
            DebugCallbackFlavor::Amd => ExtFunction::GlDebugMessageCallbackAmd,
        }
    }
}

type DebugSlot = Option<(DebugProc, usize)>;

/// The fixed callback a driver receives for one context.
///
/// Clones share the same registration.
#[derive(Clone)]
pub struct DebugTrampoline {
    slot: Arc<Mutex<DebugSlot>>,
}

impl DebugTrampoline {
    pub(crate) fn new() -> DebugTrampoline {
        DebugTrampoline { slot: Arc::new(Mutex::new(None)) }
    }

    pub(crate) fn set(&self, callback: Option<DebugProc>, user_data: usize) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = callback.map(|callback| (callback, user_data));
    }

    /// Delivers one driver message to the application callback, if one is registered.
    pub fn call(&self, source: GLenum, ty: GLenum, id: GLuint, severity: GLenum, message: &str) {
        // Don't hold the lock while the application runs; it may register a new callback.
        let registered = self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let (callback, user_data) = match registered {
            Some(registered) => registered,
            None => {
                trace!("dropping debug message {} with no callback registered", id);
                return;
            }
        };
        let params = DebugMessageParams {
            source,
            ty,
            id,
            severity,
            length: GLsizei::try_from(message.len()).unwrap_or(GLsizei::MAX),
            message,
            user_data,
        };
        callback(&params);
    }

    /// Returns true if both trampolines forward to the same registration.
    pub fn same_slot(&self, other: &DebugTrampoline) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl Debug for DebugTrampoline {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let registered = self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_some();
        f.debug_struct("DebugTrampoline").field("registered", &registered).finish()
    }
}
