// wglcore/src/dc.rs
//
//! Mapping device contexts to the driver that renders to them.

use crate::driver::{Dc, DriverTable};

use fnv::FnvHashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Finds the driver function table for a device context.
pub trait DeviceContexts: Send + Sync {
    /// Returns the driver table of the device context, or `None` if the device context is
    /// unknown or has no OpenGL driver.
    fn driver_table(&self, dc: Dc) -> Option<Arc<DriverTable>>;
}

/// A device context registry filled in by the embedder.
#[derive(Debug, Default)]
pub struct DcRegistry {
    dcs: RwLock<FnvHashMap<Dc, Arc<DriverTable>>>,
}

impl DcRegistry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> DcRegistry {
        DcRegistry::default()
    }

    /// Attaches a driver to a device context, returning the driver it replaces.
    pub fn register(&self, dc: Dc, table: Arc<DriverTable>) -> Option<Arc<DriverTable>> {
        self.dcs.write().unwrap_or_else(PoisonError::into_inner).insert(dc, table)
    }

    /// Forgets a device context.
    pub fn unregister(&self, dc: Dc) -> Option<Arc<DriverTable>> {
        self.dcs.write().unwrap_or_else(PoisonError::into_inner).remove(&dc)
    }
}

impl DeviceContexts for DcRegistry {
    fn driver_table(&self, dc: Dc) -> Option<Arc<DriverTable>> {
        self.dcs.read().unwrap_or_else(PoisonError::into_inner).get(&dc).cloned()
    }
}
