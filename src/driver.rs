// wglcore/src/driver.rs
//
//! The abstract interface that graphics drivers conform to, and the per-driver function table.

use crate::context::AttribMask;
use crate::debug::{DebugCallbackFlavor, DebugTrampoline};
use crate::registry::{ExtFunction, EXTENSION_REGISTRY};
use crate::{Error, WindowingApiError};

use euclid::default::Size2D;
use std::fmt::{self, Debug, Formatter};
use std::os::raw::c_void;
use std::ptr::NonNull;
use std::sync::{Arc, OnceLock};

/// OpenGL enumerant.
pub type GLenum = u32;
/// OpenGL signed integer.
pub type GLint = i32;
/// OpenGL unsigned integer.
pub type GLuint = u32;
/// OpenGL size or length.
pub type GLsizei = i32;

/// A device context (`HDC`), opaque to this layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dc(pub u64);

/// A driver-level rendering context, opaque to this layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DriverContext(pub u64);

/// A driver-level pbuffer, opaque to this layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DriverPbuffer(pub u64);

/// A non-null function pointer handed out by a driver.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcAddress(NonNull<c_void>);

// Function pointers are plain code addresses.
unsafe impl Send for ProcAddress {}
unsafe impl Sync for ProcAddress {}

impl ProcAddress {
    /// Wraps a raw function pointer, returning `None` if it is null.
    #[inline]
    pub fn new(address: *const c_void) -> Option<ProcAddress> {
        NonNull::new(address as *mut c_void).map(ProcAddress)
    }

    /// Returns the raw function pointer.
    #[inline]
    pub fn as_ptr(self) -> *const c_void {
        self.0.as_ptr()
    }
}

impl Debug for ProcAddress {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "ProcAddress({:p})", self.0)
    }
}

/// Result of a driver call.
pub type DriverResult<T> = Result<T, WindowingApiError>;

/// A graphics driver, as seen by the WGL layer.
///
/// The core WGL and GL entry points are required. The extension entry points have default
/// implementations that report failure; the layer only calls one after the driver's own
/// `get_proc_address` returned a pointer for it, so a driver that doesn't export an extension
/// simply leaves both unimplemented.
pub trait Driver: Send + Sync {
    // wgl

    /// Creates a rendering context for the device context (`wglCreateContext`).
    fn create_context(&self, dc: Dc) -> DriverResult<DriverContext>;

    /// Destroys a rendering context (`wglDeleteContext`).
    fn delete_context(&self, context: DriverContext) -> DriverResult<()>;

    /// Makes the context current on the calling thread, or releases the current context when
    /// `context` is `None` (`wglMakeCurrent`).
    fn make_current(&self, dc: Option<Dc>, context: Option<DriverContext>) -> DriverResult<()>;

    /// Copies state between two contexts (`wglCopyContext`).
    fn copy_context(
        &self,
        src: DriverContext,
        dst: DriverContext,
        mask: AttribMask,
    ) -> DriverResult<()>;

    /// Shares display lists and objects between two contexts (`wglShareLists`).
    fn share_lists(&self, src: DriverContext, dst: DriverContext) -> DriverResult<()>;

    /// Looks up an extension function.
    ///
    /// Like `glXGetProcAddress`, this may return a pointer for functions the driver doesn't
    /// actually support; the layer verifies support separately.
    fn get_proc_address(&self, name: &str) -> Option<ProcAddress>;

    /// Presents the back buffer of the device context (`wglSwapBuffers`).
    fn swap_buffers(&self, dc: Dc) -> DriverResult<()>;

    /// Returns the pixel format selected on the device context (`wglGetPixelFormat`).
    fn get_pixel_format(&self, dc: Dc) -> DriverResult<i32>;

    // gl

    /// `glGetString`, on the calling thread's current driver context.
    fn get_string(&self, name: GLenum) -> Option<String>;

    /// `glGetIntegerv` for a single-valued parameter.
    fn get_integer(&self, pname: GLenum) -> GLint;

    // extensions

    /// `glGetStringi`.
    fn get_string_i(&self, _name: GLenum, _index: GLuint) -> Option<String> {
        None
    }

    /// `wglGetExtensionsStringARB`.
    fn get_extensions_string(&self, _dc: Option<Dc>) -> Option<String> {
        None
    }

    /// `wglCreateContextAttribsARB`.
    fn create_context_attribs(
        &self,
        _dc: Dc,
        _share: Option<DriverContext>,
        _attribs: &[i32],
    ) -> DriverResult<DriverContext> {
        Err(WindowingApiError::Failed)
    }

    /// `wglMakeContextCurrentARB`.
    fn make_context_current(
        &self,
        _draw_dc: Option<Dc>,
        _read_dc: Option<Dc>,
        _context: DriverContext,
    ) -> DriverResult<()> {
        Err(WindowingApiError::Failed)
    }

    /// `wglCreatePbufferARB`.
    fn create_pbuffer(
        &self,
        _dc: Dc,
        _pixel_format: i32,
        _size: Size2D<i32>,
        _attribs: &[i32],
    ) -> DriverResult<DriverPbuffer> {
        Err(WindowingApiError::Failed)
    }

    /// `wglDestroyPbufferARB`.
    fn destroy_pbuffer(&self, _pbuffer: DriverPbuffer) -> DriverResult<()> {
        Err(WindowingApiError::Failed)
    }

    /// `wglGetPbufferDCARB`.
    fn get_pbuffer_dc(&self, _pbuffer: DriverPbuffer) -> DriverResult<Dc> {
        Err(WindowingApiError::Failed)
    }

    /// `wglReleasePbufferDCARB`.
    fn release_pbuffer_dc(&self, _pbuffer: DriverPbuffer, _dc: Dc) -> DriverResult<()> {
        Err(WindowingApiError::Failed)
    }

    /// `wglQueryPbufferARB`.
    fn query_pbuffer(&self, _pbuffer: DriverPbuffer, _attribute: i32) -> DriverResult<i32> {
        Err(WindowingApiError::Failed)
    }

    /// `wglSetPbufferAttribARB`.
    fn set_pbuffer_attrib(&self, _pbuffer: DriverPbuffer, _attribs: &[i32]) -> DriverResult<()> {
        Err(WindowingApiError::Failed)
    }

    /// `wglBindTexImageARB`.
    fn bind_tex_image(&self, _pbuffer: DriverPbuffer, _buffer: i32) -> DriverResult<()> {
        Err(WindowingApiError::Failed)
    }

    /// `wglReleaseTexImageARB`.
    fn release_tex_image(&self, _pbuffer: DriverPbuffer, _buffer: i32) -> DriverResult<()> {
        Err(WindowingApiError::Failed)
    }

    /// `glDebugMessageCallback` and its ARB and AMD flavors.
    ///
    /// The driver must forward every message to `trampoline` until the next registration on
    /// the same context.
    fn debug_message_callback(&self, _flavor: DebugCallbackFlavor, _trampoline: DebugTrampoline) {}
}

/// A driver plus the memoized addresses of its extension functions.
///
/// One table is normally shared by every context created against the same driver, so the cost
/// of resolving an extension function is paid once per driver.
pub struct DriverTable {
    driver: Box<dyn Driver>,
    extensions: Box<[OnceLock<ProcAddress>]>,
}

impl DriverTable {
    /// Wraps a driver in a new function table with no extension function resolved yet.
    pub fn new<D>(driver: D) -> Arc<DriverTable>
    where
        D: Driver + 'static,
    {
        Arc::new(DriverTable {
            driver: Box::new(driver),
            extensions: EXTENSION_REGISTRY.iter().map(|_| OnceLock::new()).collect(),
        })
    }

    /// Returns the driver.
    #[inline]
    pub fn driver(&self) -> &dyn Driver {
        &*self.driver
    }

    /// Returns the memoized address of an extension function, if it was resolved already.
    #[inline]
    pub fn resolved(&self, function: ExtFunction) -> Option<ProcAddress> {
        self.extensions[function.index()].get().copied()
    }

    /// Memoizes the address of an extension function and returns the address stored in the
    /// slot.
    ///
    /// If another thread won the race, its address is kept.
    pub(crate) fn store(&self, function: ExtFunction, address: ProcAddress) -> ProcAddress {
        *self.extensions[function.index()].get_or_init(|| address)
    }

    /// Returns the address of an extension function, asking the driver for it the first time.
    ///
    /// No support check happens here; this is how the layer finds the entry points it calls
    /// itself.
    pub(crate) fn lookup(&self, function: ExtFunction) -> Option<ProcAddress> {
        if let Some(address) = self.resolved(function) {
            return Some(address);
        }
        let address = self.driver.get_proc_address(function.name())?;
        Some(self.store(function, address))
    }

    /// Like `lookup`, but fails with `RequiredExtensionUnavailable`.
    pub(crate) fn require(&self, function: ExtFunction) -> Result<ProcAddress, Error> {
        self.lookup(function).ok_or(Error::RequiredExtensionUnavailable)
    }
}

impl Debug for DriverTable {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("DriverTable")
            .field("resolved", &self.extensions.iter().filter(|slot| slot.get().is_some()).count())
            .finish()
    }
}
