// wglcore/src/context.rs
//
//! What the handle table stores for contexts and pbuffers.

use crate::debug::DebugTrampoline;
use crate::driver::{Dc, DriverContext, DriverPbuffer, GLuint};
use crate::handle::HandleType;

use bitflags::bitflags;
use std::sync::Arc;
use std::thread::ThreadId;

/// `WGL_CONTEXT_MAJOR_VERSION_ARB`.
pub const WGL_CONTEXT_MAJOR_VERSION_ARB: i32 = 0x2091;
/// `WGL_CONTEXT_MINOR_VERSION_ARB`.
pub const WGL_CONTEXT_MINOR_VERSION_ARB: i32 = 0x2092;
/// `WGL_CONTEXT_PROFILE_MASK_ARB`.
pub const WGL_CONTEXT_PROFILE_MASK_ARB: i32 = 0x9126;

bitflags! {
    /// Which groups of state `wglCopyContext` transfers, as for `glPushAttrib`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct AttribMask: u32 {
        const CURRENT         = 0x0000_0001;
        const POINT           = 0x0000_0002;
        const LINE            = 0x0000_0004;
        const POLYGON         = 0x0000_0008;
        const POLYGON_STIPPLE = 0x0000_0010;
        const PIXEL_MODE      = 0x0000_0020;
        const LIGHTING        = 0x0000_0040;
        const FOG             = 0x0000_0080;
        const DEPTH_BUFFER    = 0x0000_0100;
        const ACCUM_BUFFER    = 0x0000_0200;
        const STENCIL_BUFFER  = 0x0000_0400;
        const VIEWPORT        = 0x0000_0800;
        const TRANSFORM       = 0x0000_1000;
        const ENABLE          = 0x0000_2000;
        const COLOR_BUFFER    = 0x0000_4000;
        const HINT            = 0x0000_8000;
        const EVAL            = 0x0001_0000;
        const LIST            = 0x0002_0000;
        const TEXTURE         = 0x0004_0000;
        const SCISSOR         = 0x0008_0000;
        const ALL             = 0xffff_ffff;
    }
}

/// A rendering context, as the handle table holds it.
pub(crate) struct Context {
    pub(crate) driver_context: DriverContext,
    /// The thread this context is current on, if any.
    pub(crate) owner: Option<ThreadId>,
    pub(crate) draw_dc: Option<Dc>,
    pub(crate) read_dc: Option<Dc>,
    /// Filtered `GL_EXTENSIONS` string, built on first query.
    pub(crate) extensions: Option<Arc<str>>,
    /// Ascending indices of disabled extensions in the driver's list, terminated by
    /// `u32::MAX`. Built on first indexed query.
    pub(crate) disabled_indices: Option<Arc<[GLuint]>>,
    pub(crate) debug: DebugTrampoline,
}

impl Context {
    pub(crate) fn new(driver_context: DriverContext) -> Context {
        Context {
            driver_context,
            owner: None,
            draw_dc: None,
            read_dc: None,
            extensions: None,
            disabled_indices: None,
            debug: DebugTrampoline::new(),
        }
    }
}

/// A pbuffer, as the handle table holds it.
pub(crate) struct Pbuffer {
    pub(crate) driver_pbuffer: DriverPbuffer,
}

/// Picks the handle type of a context created with `wglCreateContextAttribsARB`.
///
/// The list is read in (name, value) pairs up to a zero name or the end of the slice. Asking
/// for a major version of 3 or more gives a `ContextV3` handle.
pub(crate) fn context_type_for_attribs(attribs: &[i32]) -> HandleType {
    for pair in attribs.chunks(2) {
        match *pair {
            [0, ..] => break,
            [WGL_CONTEXT_MAJOR_VERSION_ARB, major] => {
                if major >= 3 {
                    return HandleType::ContextV3;
                }
                break;
            }
            _ => {}
        }
    }
    HandleType::Context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_type_for_attribs() {
        assert_eq!(context_type_for_attribs(&[]), HandleType::Context);
        assert_eq!(
            context_type_for_attribs(&[WGL_CONTEXT_MAJOR_VERSION_ARB, 2, 0]),
            HandleType::Context
        );
        assert_eq!(
            context_type_for_attribs(&[
                WGL_CONTEXT_MINOR_VERSION_ARB,
                2,
                WGL_CONTEXT_MAJOR_VERSION_ARB,
                4,
                0
            ]),
            HandleType::ContextV3
        );
        // Nothing after the terminator counts.
        assert_eq!(
            context_type_for_attribs(&[0, 0, WGL_CONTEXT_MAJOR_VERSION_ARB, 3]),
            HandleType::Context
        );
        // A dangling name without a value is ignored.
        assert_eq!(context_type_for_attribs(&[WGL_CONTEXT_MAJOR_VERSION_ARB]), HandleType::Context);
    }
}
