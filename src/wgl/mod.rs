// wglcore/src/wgl/mod.rs
//
//! The WGL entry points.

use crate::config::ConfigSource;
use crate::current;
use crate::dc::DeviceContexts;
use crate::driver::{Dc, DriverTable};
use crate::error::{self, Error};
use crate::extensions::DisabledExtensions;
use crate::handle::{Handle, HandleKind};
use crate::handle_table::{HandleTable, LockedHandles, Payload, MAX_WGL_HANDLES};

use log::{debug, log_enabled, trace, warn, Level};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

mod context;
mod gl_calls;
mod pbuffer;
mod proc_address;

pub use self::proc_address::ResolvedProc;

/// `WGL_SWAP_MAIN_PLANE`.
pub const WGL_SWAP_MAIN_PLANE: u32 = 1;

const FPS_INTERVAL: Duration = Duration::from_millis(1500);

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// One WGL layer: a handle table, the per-thread current contexts that refer into it, and the
/// user configuration.
///
/// Most embedders create exactly one. Instances are independent of each other; each thread has
/// its own current context per instance.
///
/// Dropping the layer destroys every context and pbuffer still alive. Threads other than the
/// dropping one keep a stale current entry until they call `thread_detach` or exit; that entry
/// doesn't keep the driver alive and is pruned the next time the thread makes a context
/// current.
pub struct Wgl {
    id: u64,
    handles: HandleTable,
    devices: Arc<dyn DeviceContexts>,
    config: Box<dyn ConfigSource>,
    disabled: OnceLock<DisabledExtensions>,
    frames: Mutex<FrameCounter>,
}

#[derive(Default)]
struct FrameCounter {
    start: Option<Instant>,
    previous: Option<Instant>,
    frames: u64,
    total: u64,
}

impl Wgl {
    /// Creates a layer with room for `MAX_WGL_HANDLES` live contexts and pbuffers.
    pub fn new<C>(devices: Arc<dyn DeviceContexts>, config: C) -> Wgl
    where
        C: ConfigSource + 'static,
    {
        Wgl::with_max_handles(devices, config, MAX_WGL_HANDLES)
    }

    /// Creates a layer with room for at most `max_handles` live contexts and pbuffers.
    ///
    /// Handles only have room for 4096 slot indices; larger values are clamped.
    pub fn with_max_handles<C>(
        devices: Arc<dyn DeviceContexts>,
        config: C,
        max_handles: usize,
    ) -> Wgl
    where
        C: ConfigSource + 'static,
    {
        let id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        debug!("creating WGL layer {} with {} handle slots", id, max_handles);
        Wgl {
            id,
            handles: HandleTable::new(max_handles),
            devices,
            config: Box::new(config),
            disabled: OnceLock::new(),
            frames: Mutex::new(FrameCounter::default()),
        }
    }

    /// The extensions hidden from applications. Read from the configuration on first use.
    pub fn disabled_extensions(&self) -> &DisabledExtensions {
        self.disabled.get_or_init(|| DisabledExtensions::load(&*self.config))
    }

    /// Prepares the calling thread: no context is current.
    pub fn thread_attach(&self) {
        current::clear(self.id);
    }

    /// Tears down the calling thread's state. A context still current on it is released.
    pub fn thread_detach(&self) {
        if current::context(self.id).is_none() {
            return;
        }
        if let Err(error) = self.release_current() {
            warn!("failed to release the current context at thread exit: {:?}", error);
            if let Some(context) = current::clear(self.id) {
                disown(&mut self.handles.lock(), context);
            }
        }
    }

    /// Presents the back buffer of a device context (`wglSwapBuffers`).
    pub fn swap_buffers(&self, dc: Dc) -> Result<(), Error> {
        error::record(self.swap_buffers_inner(dc))
    }

    /// `wglSwapLayerBuffers`. Only the main plane is supported; other planes are ignored.
    pub fn swap_layer_buffers(&self, dc: Dc, planes: u32) -> Result<(), Error> {
        let mut planes = planes;
        if planes & WGL_SWAP_MAIN_PLANE != 0 {
            self.swap_buffers(dc)?;
            planes &= !WGL_SWAP_MAIN_PLANE;
        }
        if planes != 0 {
            warn!("unhandled layer planes: {:#010x}", planes);
        }
        Ok(())
    }

    /// Returns the pixel format selected on a device context (`wglGetPixelFormat`).
    pub fn get_pixel_format(&self, dc: Dc) -> Result<i32, Error> {
        let result = match self.dc_funcs(dc) {
            None => Err(Error::InvalidPixelFormat),
            Some(funcs) => match funcs.driver().get_pixel_format(dc) {
                Ok(format) if format > 0 => Ok(format),
                _ => Err(Error::InvalidPixelFormat),
            },
        };
        error::record(result)
    }

    fn swap_buffers_inner(&self, dc: Dc) -> Result<(), Error> {
        let funcs = self.dc_funcs(dc).ok_or(Error::DcNotFound)?;
        funcs.driver().swap_buffers(dc).map_err(Error::DriverCallFailed)?;
        if log_enabled!(target: "fps", Level::Trace) {
            self.frames.lock().unwrap_or_else(PoisonError::into_inner).tick();
        }
        Ok(())
    }

    #[inline]
    fn dc_funcs(&self, dc: Dc) -> Option<Arc<DriverTable>> {
        self.devices.driver_table(dc)
    }

    /// Makes no context current on the calling thread. Succeeds if nothing was current.
    ///
    /// The context stays current and owned until the driver call returns. On failure nothing
    /// changes.
    fn release_current(&self) -> Result<(), Error> {
        let state = match current::get(self.id) {
            None => return Ok(()),
            Some(state) => state,
        };
        state.funcs.driver().make_current(None, None).map_err(Error::MakeCurrentFailed)?;
        disown(&mut self.handles.lock(), state.context);
        current::clear(self.id);
        debug!("released context {}", state.context);
        Ok(())
    }
}

/// Marks a context as current nowhere.
fn disown(handles: &mut LockedHandles, handle: Handle) {
    if let Ok(index) = handles.find(handle, HandleKind::Context) {
        if let Ok(context) = handles.context_mut(index) {
            context.owner = None;
        }
    }
}

impl FrameCounter {
    fn tick(&mut self) {
        let now = Instant::now();
        self.frames += 1;
        self.total += 1;
        let start = *self.start.get_or_insert(now);
        let previous = *self.previous.get_or_insert(now);
        let elapsed = now - previous;
        if elapsed > FPS_INTERVAL {
            trace!(target: "fps",
                   "@ approx {:.2}fps, total {:.2}fps",
                   self.frames as f64 / elapsed.as_secs_f64(),
                   self.total as f64 / (now - start).as_secs_f64());
            self.previous = Some(now);
            self.frames = 0;
        }
    }
}

impl Drop for Wgl {
    fn drop(&mut self) {
        let this_thread = thread::current().id();
        current::clear(self.id);
        for binding in self.handles.drain() {
            let driver = binding.funcs.driver();
            match binding.payload {
                Payload::Context(context) => {
                    warn!("destroying context {:?} left alive", context.driver_context);
                    if context.owner == Some(this_thread) {
                        if let Err(error) = driver.make_current(None, None) {
                            warn!("failed to release context: {:?}", error);
                        }
                    }
                    if let Err(error) = driver.delete_context(context.driver_context) {
                        warn!("failed to destroy context: {:?}", error);
                    }
                }
                Payload::Pbuffer(pbuffer) => {
                    warn!("destroying pbuffer {:?} left alive", pbuffer.driver_pbuffer);
                    if let Err(error) = driver.destroy_pbuffer(pbuffer.driver_pbuffer) {
                        warn!("failed to destroy pbuffer: {:?}", error);
                    }
                }
            }
        }
    }
}
