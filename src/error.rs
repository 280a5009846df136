// wglcore/src/error.rs
//
//! Various errors that entry points can produce.

use std::cell::Cell;

/// Various errors that entry points can produce.
///
/// Every failed entry point leaves the handle table, the thread's current context and the
/// per-context caches exactly as they were before the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// The handle is null, stale (its generation no longer matches its slot), out of range, or
    /// names an object of a different kind than the one expected.
    InvalidHandle,
    /// The context is current on another thread.
    Busy,
    /// The handle table is full.
    OutOfMemory,
    /// No driver is attached to the device context.
    DcNotFound,
    /// The share context passed at creation time is invalid.
    InvalidOperation,
    /// The operation needs a current context and the calling thread has none.
    NoCurrentContext,
    /// The function name isn't part of the extension registry.
    UnknownFunction,
    /// Neither the extension that owns the function nor any known alternative is supported by
    /// the current driver.
    ExtensionUnsupported,
    /// The driver claims to support the extension but doesn't export the function.
    GLFunctionNotFound,
    /// An extension entry point this operation needs isn't exported by the driver.
    RequiredExtensionUnavailable,
    /// The driver couldn't create an OpenGL context.
    ContextCreationFailed(WindowingApiError),
    /// The driver couldn't make the OpenGL context current or not current.
    MakeCurrentFailed(WindowingApiError),
    /// The driver couldn't create a pbuffer.
    PbufferCreationFailed(WindowingApiError),
    /// The device context has no valid pixel format.
    InvalidPixelFormat,
    /// Any other driver call failed.
    DriverCallFailed(WindowingApiError),
}

/// Abstraction of the errors that drivers return.
///
/// They all tend to follow similar patterns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowingApiError {
    /// Miscellaneous error.
    Failed,
    /// An unrecognized attribute or attribute value was passed in the attribute list.
    BadAttribute,
    /// Invalid pixel format.
    BadPixelFormat,
    /// The driver context argument doesn't name a valid rendering context.
    BadContext,
    /// Invalid drawable.
    BadDrawable,
    /// Invalid numerical value.
    BadValue,
    /// Arguments are inconsistent (for example, two contexts that can't share objects).
    BadMatch,
    /// The driver couldn't allocate resources for the requested operation.
    BadAlloc,
    /// The driver can't access a requested resource (for example a context is bound in
    /// another thread).
    BadAccess,
    /// A power management event has occurred; the context must be recreated.
    ContextLost,
}

/// `ERROR_INVALID_HANDLE`.
pub const ERROR_INVALID_HANDLE: u32 = 6;
/// `ERROR_NOT_ENOUGH_MEMORY`.
pub const ERROR_NOT_ENOUGH_MEMORY: u32 = 8;
/// `ERROR_GEN_FAILURE`.
pub const ERROR_GEN_FAILURE: u32 = 31;
/// `ERROR_PROC_NOT_FOUND`.
pub const ERROR_PROC_NOT_FOUND: u32 = 127;
/// `ERROR_BUSY`.
pub const ERROR_BUSY: u32 = 170;
/// `ERROR_DC_NOT_FOUND`.
pub const ERROR_DC_NOT_FOUND: u32 = 1425;
/// `ERROR_INVALID_PIXEL_FORMAT`.
pub const ERROR_INVALID_PIXEL_FORMAT: u32 = 2000;
/// `ERROR_INVALID_OPERATION`.
pub const ERROR_INVALID_OPERATION: u32 = 4317;

impl Error {
    /// Returns the Win32 last-error code that the WGL entry points report for this error.
    pub fn code(self) -> u32 {
        match self {
            Error::InvalidHandle => ERROR_INVALID_HANDLE,
            Error::Busy => ERROR_BUSY,
            Error::OutOfMemory => ERROR_NOT_ENOUGH_MEMORY,
            Error::DcNotFound => ERROR_DC_NOT_FOUND,
            Error::InvalidOperation => ERROR_INVALID_OPERATION,
            Error::InvalidPixelFormat => ERROR_INVALID_PIXEL_FORMAT,
            Error::NoCurrentContext
            | Error::UnknownFunction
            | Error::ExtensionUnsupported
            | Error::GLFunctionNotFound
            | Error::RequiredExtensionUnavailable => ERROR_PROC_NOT_FOUND,
            Error::ContextCreationFailed(_)
            | Error::MakeCurrentFailed(_)
            | Error::PbufferCreationFailed(_)
            | Error::DriverCallFailed(_) => ERROR_GEN_FAILURE,
        }
    }
}

thread_local! {
    static LAST_ERROR: Cell<Option<Error>> = const { Cell::new(None) };
}

/// Returns the error recorded by the last failing entry point on this thread.
///
/// Successful calls don't reset it, like `GetLastError()`.
pub fn last_error() -> Option<Error> {
    LAST_ERROR.with(|last_error| last_error.get())
}

/// Forgets the error recorded for this thread.
pub fn clear_last_error() {
    LAST_ERROR.with(|last_error| last_error.set(None));
}

pub(crate) fn set_last_error(error: Error) {
    LAST_ERROR.with(|last_error| last_error.set(Some(error)));
}

/// Records the error of a failing entry point in the thread's last-error cell.
pub(crate) fn record<T>(result: Result<T, Error>) -> Result<T, Error> {
    if let Err(error) = result {
        set_last_error(error);
    }
    result
}
