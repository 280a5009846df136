// wglcore/src/handle.rs
//
//! Opaque handles for contexts and pbuffers.

use std::fmt::{self, Display, Formatter};

const INDEX_MASK: u32 = 0x0fff;
const TYPE_MASK: u32 = 0xf000;
const LOW_MASK: u32 = 0xffff;
const GENERATION_SHIFT: u32 = 16;

/// The kind of object a handle slot holds.
///
/// The tag is encoded in the handle itself, so a handle of one type never resolves as another.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandleType {
    /// A context created by `wglCreateContext`, or by `wglCreateContextAttribsARB` with a
    /// pre-3.0 version.
    Context,
    /// A context created by `wglCreateContextAttribsARB` with a major version of 3 or more.
    ///
    /// Such contexts may only expose the indexed extension enumeration.
    ContextV3,
    /// A pbuffer created by `wglCreatePbufferARB`.
    Pbuffer,
}

/// What an entry point expects a handle to point at.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HandleKind {
    Context,
    Pbuffer,
}

impl HandleType {
    #[inline]
    fn tag(self) -> u32 {
        match self {
            HandleType::Context => 0x1000,
            HandleType::Pbuffer => 0x2000,
            HandleType::ContextV3 => 0x3000,
        }
    }

    #[inline]
    fn from_tag(tag: u32) -> Option<HandleType> {
        match tag {
            0x1000 => Some(HandleType::Context),
            0x2000 => Some(HandleType::Pbuffer),
            0x3000 => Some(HandleType::ContextV3),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn kind(self) -> HandleKind {
        match self {
            HandleType::Context | HandleType::ContextV3 => HandleKind::Context,
            HandleType::Pbuffer => HandleKind::Pbuffer,
        }
    }
}

/// An opaque 32-bit handle to a context (`HGLRC`) or a pbuffer (`HPBUFFERARB`).
///
/// The low 12 bits hold the slot index, the next 4 bits the handle type, and the high 16 bits
/// the generation of the slot at the time the handle was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Handle(u32);

/// A rendering context handle.
pub type Hglrc = Handle;

/// A pbuffer handle.
pub type Hpbuffer = Handle;

impl Handle {
    /// Wraps a raw handle value, as received from an application.
    #[inline]
    pub fn from_raw(raw: u32) -> Handle {
        Handle(raw)
    }

    /// Returns the raw handle value.
    #[inline]
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns the type tag encoded in this handle, if it is a recognized one.
    #[inline]
    pub fn handle_type(self) -> Option<HandleType> {
        HandleType::from_tag(self.0 & TYPE_MASK)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        (self.0 & INDEX_MASK) as usize
    }

    #[inline]
    pub(crate) fn generation(self) -> u16 {
        (self.0 >> GENERATION_SHIFT) as u16
    }
}

impl Display for Handle {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Computes the value stored in a slot being handed out again, bumping its generation.
///
/// Generation zero is skipped, so a handle is never zero.
#[inline]
pub(crate) fn next_handle(previous: u32, index: usize, handle_type: HandleType) -> u32 {
    let mut generation = ((previous >> GENERATION_SHIFT) as u16).wrapping_add(1);
    if generation == 0 {
        generation = 1;
    }
    ((generation as u32) << GENERATION_SHIFT) | (index as u32 & INDEX_MASK) | handle_type.tag()
}

/// The value a slot holds while it sits on the free list.
///
/// All-ones low bits never match an issued handle, whatever its type.
#[inline]
pub(crate) fn retired_handle(current: u32) -> u32 {
    current | LOW_MASK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoding() {
        let raw = next_handle(0, 5, HandleType::Pbuffer);
        let handle = Handle::from_raw(raw);
        assert_eq!(handle.index(), 5);
        assert_eq!(handle.generation(), 1);
        assert_eq!(handle.handle_type(), Some(HandleType::Pbuffer));
        assert_eq!(HandleType::ContextV3.kind(), HandleKind::Context);
    }

    #[test]
    fn test_generation_skips_zero() {
        let retired = retired_handle(0xffff_1000);
        let raw = next_handle(retired, 7, HandleType::Context);
        assert_eq!(Handle::from_raw(raw).generation(), 1);
        assert_ne!(raw, 0);
    }

    #[test]
    fn test_retired_handle_never_matches() {
        for handle_type in [HandleType::Context, HandleType::ContextV3, HandleType::Pbuffer] {
            let raw = next_handle(0, 0x0fff, handle_type);
            assert_ne!(retired_handle(raw), raw);
            assert_eq!(Handle::from_raw(retired_handle(raw)).handle_type(), None);
        }
    }
}
