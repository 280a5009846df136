// wglcore/src/wgl/proc_address.rs
//
//! `wglGetProcAddress`.
//!
//! Drivers may return a pointer for any name they are asked about, supported or not, so every
//! function is checked against the extensions the current context actually advertises before
//! its address is handed out.

use super::Wgl;
use crate::current::{self, CurrentState};
use crate::driver::{Driver, GLuint, ProcAddress};
use crate::error::{self, Error};
use crate::extensions::has_extension;
use crate::handle::HandleType;
use crate::info::GLVersion;
use crate::registry::{self, ExtFunction};

use glow as gl;
use log::{error, trace, warn};

/// An extension function address handed out by `Wgl::get_proc_address`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedProc {
    /// The function the address belongs to. This may be a compatible alternative to the
    /// function asked for.
    pub function: ExtFunction,
    /// The driver's entry point.
    pub address: ProcAddress,
}

impl Wgl {
    /// Looks up an extension function for the calling thread's current context.
    pub fn get_proc_address(&self, name: &str) -> Result<ResolvedProc, Error> {
        error::record(self.resolve_proc(name))
    }

    /// Returns the address of an extension function that was already resolved for the current
    /// context's driver, without asking the driver again.
    pub fn dispatch_address(&self, function: ExtFunction) -> Option<ProcAddress> {
        current::get(self.id)?.funcs.resolved(function)
    }

    fn resolve_proc(&self, name: &str) -> Result<ResolvedProc, Error> {
        // Without a current context there is no driver to ask.
        let state = match current::get(self.id) {
            Some(state) => state,
            None => {
                warn!("No active WGL context found");
                return Err(Error::NoCurrentContext);
            }
        };

        let entry = match registry::lookup(name) {
            Some(entry) => entry,
            None => {
                warn!("Function {} unknown", name);
                return Err(Error::UnknownFunction);
            }
        };

        if let Some(address) = state.funcs.resolved(entry.function) {
            return Ok(ResolvedProc { function: entry.function, address });
        }

        let driver_address = state.funcs.driver().get_proc_address(name);
        if !self.is_extension_supported(&state, entry.extension) {
            if let Some(alternative) = registry::alternative(name) {
                warn!("Extension {} required for {} not supported, trying {}",
                      entry.extension, name, alternative);
                return self.resolve_proc(alternative);
            }
            warn!("Extension {} required for {} not supported", entry.extension, name);
            return Err(Error::ExtensionUnsupported);
        }

        let address = match driver_address {
            Some(address) => address,
            None => {
                warn!("Function {} not supported by driver", name);
                return Err(Error::GLFunctionNotFound);
            }
        };
        let address = state.funcs.store(entry.function, address);
        Ok(ResolvedProc { function: entry.function, address })
    }

    fn is_extension_supported(&self, state: &CurrentState, requirement: &str) -> bool {
        match self.available_extensions(state) {
            Some(available) => check_extension_support(state.funcs.driver(), requirement, &available),
            None => {
                error!("No OpenGL extensions found, check if your OpenGL setup is correct!");
                false
            }
        }
    }

    /// The extensions the driver advertises for the current context, unfiltered, followed by
    /// its WGL extensions.
    fn available_extensions(&self, state: &CurrentState) -> Option<String> {
        let driver = state.funcs.driver();

        // Contexts of version 3 and up may only have the indexed enumeration.
        let mut available = match state.context.handle_type() {
            Some(HandleType::Context) => driver.get_string(gl::EXTENSIONS),
            _ => None,
        };
        if available.as_deref().map_or(true, str::is_empty) {
            available = enumerate_extensions(state);
        }

        if state.funcs.lookup(ExtFunction::WglGetExtensionsStringArb).is_some() {
            if let Some(wgl_extensions) = driver.get_extensions_string(self.get_current_dc()) {
                let list = available.get_or_insert_with(String::new);
                if !list.is_empty() {
                    list.push(' ');
                }
                list.push_str(&wgl_extensions);
            }
        }
        available.filter(|list| !list.is_empty())
    }
}

/// Joins the driver's indexed extension enumeration into one string.
fn enumerate_extensions(state: &CurrentState) -> Option<String> {
    state.funcs.lookup(ExtFunction::GlGetStringi)?;
    let driver = state.funcs.driver();
    let count = GLuint::try_from(driver.get_integer(gl::NUM_EXTENSIONS)).unwrap_or(0);
    let mut list = String::with_capacity(count as usize * 32);
    for index in 0..count {
        if let Some(extension) = driver.get_string_i(gl::EXTENSIONS, index) {
            if !list.is_empty() {
                list.push(' ');
            }
            list.push_str(&extension);
        }
    }
    Some(list)
}

/// True if any token of `requirement` is satisfied, either by appearing in `available` or,
/// for `GL_VERSION_x_y`, by the driver's version being x.y or later.
fn check_extension_support(driver: &dyn Driver, requirement: &str, available: &str) -> bool {
    trace!("Checking for extension '{}'", requirement);
    for token in requirement.split(' ').filter(|token| !token.is_empty()) {
        if has_extension(available, token) {
            return true;
        }

        let required = match GLVersion::from_core_token(token) {
            Some(required) => required,
            None => continue,
        };
        let version = match driver.get_string(gl::VERSION) {
            Some(version) => version,
            None => {
                error!("No OpenGL version found!");
                return false;
            }
        };
        match GLVersion::parse(&version) {
            Some(version) if version >= required => return true,
            Some(version) => {
                warn!("The function requires OpenGL version '{}.{}' while your drivers only \
                       provide '{}.{}'",
                      required.major, required.minor, version.major, version.minor);
            }
            None => {
                error!("Couldn't parse the OpenGL version {:?}", version);
                return false;
            }
        }
    }
    false
}
