// wglcore/src/wgl/pbuffer.rs
//
//! `WGL_ARB_pbuffer` and `WGL_ARB_render_texture`.

use super::Wgl;
use crate::context::Pbuffer;
use crate::driver::{Dc, Driver, DriverPbuffer, DriverResult};
use crate::error::{self, Error};
use crate::handle::{HandleKind, HandleType, Hpbuffer};
use crate::handle_table::Payload;
use crate::registry::ExtFunction;

use euclid::default::Size2D;
use log::{debug, warn};

impl Wgl {
    /// Creates an off-screen pbuffer compatible with a device context (`wglCreatePbufferARB`).
    pub fn create_pbuffer(
        &self,
        dc: Dc,
        pixel_format: i32,
        size: Size2D<i32>,
        attribs: &[i32],
    ) -> Result<Hpbuffer, Error> {
        error::record(self.create_pbuffer_inner(dc, pixel_format, size, attribs))
    }

    /// Destroys a pbuffer (`wglDestroyPbufferARB`).
    ///
    /// A pbuffer that a driver call is using fails with `Busy`.
    pub fn destroy_pbuffer(&self, handle: Hpbuffer) -> Result<(), Error> {
        error::record(self.destroy_pbuffer_inner(handle))
    }

    /// `wglGetPbufferDCARB`.
    pub fn get_pbuffer_dc(&self, handle: Hpbuffer) -> Result<Dc, Error> {
        self.with_pbuffer(handle, ExtFunction::WglGetPbufferDcArb, |driver, pbuffer| {
            driver.get_pbuffer_dc(pbuffer)
        })
    }

    /// `wglReleasePbufferDCARB`.
    pub fn release_pbuffer_dc(&self, handle: Hpbuffer, dc: Dc) -> Result<(), Error> {
        self.with_pbuffer(handle, ExtFunction::WglReleasePbufferDcArb, |driver, pbuffer| {
            driver.release_pbuffer_dc(pbuffer, dc)
        })
    }

    /// `wglQueryPbufferARB`.
    pub fn query_pbuffer(&self, handle: Hpbuffer, attribute: i32) -> Result<i32, Error> {
        self.with_pbuffer(handle, ExtFunction::WglQueryPbufferArb, |driver, pbuffer| {
            driver.query_pbuffer(pbuffer, attribute)
        })
    }

    /// `wglSetPbufferAttribARB`.
    pub fn set_pbuffer_attrib(&self, handle: Hpbuffer, attribs: &[i32]) -> Result<(), Error> {
        self.with_pbuffer(handle, ExtFunction::WglSetPbufferAttribArb, |driver, pbuffer| {
            driver.set_pbuffer_attrib(pbuffer, attribs)
        })
    }

    /// `wglBindTexImageARB`.
    pub fn bind_tex_image(&self, handle: Hpbuffer, buffer: i32) -> Result<(), Error> {
        self.with_pbuffer(handle, ExtFunction::WglBindTexImageArb, |driver, pbuffer| {
            driver.bind_tex_image(pbuffer, buffer)
        })
    }

    /// `wglReleaseTexImageARB`.
    pub fn release_tex_image(&self, handle: Hpbuffer, buffer: i32) -> Result<(), Error> {
        self.with_pbuffer(handle, ExtFunction::WglReleaseTexImageArb, |driver, pbuffer| {
            driver.release_tex_image(pbuffer, buffer)
        })
    }

    fn create_pbuffer_inner(
        &self,
        dc: Dc,
        pixel_format: i32,
        size: Size2D<i32>,
        attribs: &[i32],
    ) -> Result<Hpbuffer, Error> {
        let funcs = self.dc_funcs(dc).ok_or(Error::DcNotFound)?;
        funcs.require(ExtFunction::WglCreatePbufferArb)?;
        let driver_pbuffer = funcs
            .driver()
            .create_pbuffer(dc, pixel_format, size, attribs)
            .map_err(Error::PbufferCreationFailed)?;

        let payload = Payload::Pbuffer(Pbuffer { driver_pbuffer });
        let allocated = self.handles.lock().alloc(HandleType::Pbuffer, funcs.clone(), payload);
        match allocated {
            Ok(handle) => {
                debug!("created pbuffer {} ({}x{})", handle, size.width, size.height);
                Ok(handle)
            }
            Err(error) => {
                warn!("no handle left for a new pbuffer");
                if let Err(error) = funcs.driver().destroy_pbuffer(driver_pbuffer) {
                    warn!("driver failed to destroy pbuffer: {:?}", error);
                }
                Err(error)
            }
        }
    }

    fn destroy_pbuffer_inner(&self, handle: Hpbuffer) -> Result<(), Error> {
        let funcs = {
            let slot = self.handles.resolve(handle, HandleKind::Pbuffer)?;
            let funcs = slot.funcs()?.clone();
            slot.release();
            funcs
        };
        funcs.require(ExtFunction::WglDestroyPbufferArb)?;

        let slot = self.handles.resolve(handle, HandleKind::Pbuffer)?;
        if slot.is_pinned() {
            warn!("can't destroy pbuffer {}: a driver call is using it", handle);
            return Err(Error::Busy);
        }
        let binding = slot.free().ok_or(Error::InvalidHandle)?;
        if let Payload::Pbuffer(pbuffer) = binding.payload {
            if let Err(error) = binding.funcs.driver().destroy_pbuffer(pbuffer.driver_pbuffer) {
                warn!("driver failed to destroy pbuffer {}: {:?}", handle, error);
            }
        }
        debug!("destroyed pbuffer {}", handle);
        Ok(())
    }

    /// Runs a driver pbuffer call with the pbuffer pinned, so it can't be destroyed underneath
    /// the call.
    fn with_pbuffer<F, T>(&self, handle: Hpbuffer, function: ExtFunction, call: F) -> Result<T, Error>
    where
        F: FnOnce(&dyn Driver, DriverPbuffer) -> DriverResult<T>,
    {
        let result = self.handles.resolve(handle, HandleKind::Pbuffer).and_then(|slot| {
            let funcs = slot.funcs()?.clone();
            let pbuffer = slot.pbuffer()?.driver_pbuffer;
            let _pin = slot.pin();
            funcs.require(function)?;
            call(funcs.driver(), pbuffer).map_err(Error::DriverCallFailed)
        });
        error::record(result)
    }
}
