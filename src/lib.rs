// wglcore/src/lib.rs
//
//! Context and handle management for a WGL implementation.
//!
//! This crate sits between an application's WGL and OpenGL calls and a native graphics driver.
//! It hands out opaque, generation-checked handles for rendering contexts and pbuffers, keeps
//! track of which context is current on which thread, hides user-disabled extensions from both
//! forms of `GL_EXTENSIONS`, and resolves `wglGetProcAddress` lookups only for functions whose
//! extension the current driver really supports. Those lookups only cover the functions in
//! `registry::EXTENSION_REGISTRY`; other names are reported as unknown.
//!
//! Drivers plug in through the `Driver` trait; device contexts are mapped to drivers through
//! `DeviceContexts`, of which `DcRegistry` is a ready-made implementation.

pub mod error;
pub use crate::error::{clear_last_error, last_error, Error, WindowingApiError};

pub mod config;
pub use crate::config::{ConfigSource, EnvConfig, StaticConfig};

pub mod dc;
pub use crate::dc::{DcRegistry, DeviceContexts};

pub mod driver;
pub use crate::driver::{Dc, Driver, DriverContext, DriverPbuffer, DriverTable, ProcAddress};

pub mod debug;
pub use crate::debug::{DebugCallbackFlavor, DebugMessageParams, DebugProc, DebugTrampoline};

pub mod registry;
pub use crate::registry::ExtFunction;

mod context;
pub use crate::context::{AttribMask, WGL_CONTEXT_MAJOR_VERSION_ARB};
pub use crate::context::{WGL_CONTEXT_MINOR_VERSION_ARB, WGL_CONTEXT_PROFILE_MASK_ARB};

mod current;

mod extensions;
pub use crate::extensions::DisabledExtensions;

mod handle;
pub use crate::handle::{Handle, HandleType, Hglrc, Hpbuffer};

mod handle_table;
pub use crate::handle_table::MAX_WGL_HANDLES;

mod info;
pub use crate::info::GLVersion;

mod wgl;
pub use crate::wgl::{ResolvedProc, Wgl, WGL_SWAP_MAIN_PLANE};
