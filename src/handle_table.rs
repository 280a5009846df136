// wglcore/src/handle_table.rs
//
//! The table of live contexts and pbuffers.
//!
//! Slots never move. A freed slot keeps its generation in the high bits of its stored handle
//! and goes on a free-index stack; allocation pops that stack before growing the table.
//!
//! Driver calls never run with the table locked: a driver may call back into the layer from
//! inside any entry point, for example to deliver a debug message. A slot whose object a driver
//! call is using is pinned instead, and a pinned slot can't be freed.

use crate::context::{Context, Pbuffer};
use crate::driver::DriverTable;
use crate::handle::{self, Handle, HandleKind, HandleType};
use crate::Error;

use log::warn;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The default maximum number of live handles.
pub const MAX_WGL_HANDLES: usize = 1024;

// Twelve bits of slot index.
const HANDLE_INDEX_LIMIT: usize = 0x1000;

/// The object a handle points at.
pub(crate) enum Payload {
    Context(Context),
    Pbuffer(Pbuffer),
}

impl Payload {
    fn kind(&self) -> HandleKind {
        match *self {
            Payload::Context(_) => HandleKind::Context,
            Payload::Pbuffer(_) => HandleKind::Pbuffer,
        }
    }
}

/// A bound slot: the driver that owns the object, and the object.
pub(crate) struct Binding {
    pub(crate) funcs: Arc<DriverTable>,
    pub(crate) payload: Payload,
    pins: usize,
}

struct Slot {
    handle: u32,
    binding: Option<Binding>,
}

struct Slots {
    entries: Vec<Slot>,
    free: Vec<usize>,
}

pub(crate) struct HandleTable {
    slots: Mutex<Slots>,
    max: usize,
}

impl HandleTable {
    pub(crate) fn new(max: usize) -> HandleTable {
        let max = if max > HANDLE_INDEX_LIMIT {
            warn!("clamping the handle table size from {} to {}", max, HANDLE_INDEX_LIMIT);
            HANDLE_INDEX_LIMIT
        } else {
            max
        };
        HandleTable { slots: Mutex::new(Slots { entries: vec![], free: vec![] }), max }
    }

    /// Takes the table lock.
    pub(crate) fn lock(&self) -> LockedHandles {
        LockedHandles {
            table: self,
            slots: self.slots.lock().unwrap_or_else(PoisonError::into_inner),
            max: self.max,
        }
    }

    /// Looks a handle up, keeping the table locked until the returned reference is released or
    /// freed.
    pub(crate) fn resolve(&self, handle: Handle, kind: HandleKind) -> Result<SlotRef, Error> {
        let handles = self.lock();
        let index = handles.find(handle, kind)?;
        Ok(SlotRef { handles, index })
    }

    /// Empties the table, handing back everything that was still bound.
    pub(crate) fn drain(&self) -> Vec<Binding> {
        let mut handles = self.lock();
        let slots = &mut *handles.slots;
        let mut bindings = vec![];
        for (index, slot) in slots.entries.iter_mut().enumerate() {
            if let Some(binding) = slot.binding.take() {
                slot.handle = handle::retired_handle(slot.handle);
                slots.free.push(index);
                bindings.push(binding);
            }
        }
        bindings
    }
}

/// The handle table, locked.
pub(crate) struct LockedHandles<'a> {
    table: &'a HandleTable,
    slots: MutexGuard<'a, Slots>,
    max: usize,
}

impl<'a> LockedHandles<'a> {
    /// Finds the slot of a live handle of the given kind.
    pub(crate) fn find(&self, handle: Handle, kind: HandleKind) -> Result<usize, Error> {
        let index = handle.index();
        let slot = self.slots.entries.get(index).ok_or(Error::InvalidHandle)?;
        if slot.handle != handle.as_raw() {
            return Err(Error::InvalidHandle);
        }
        match (handle.handle_type(), &slot.binding) {
            (Some(handle_type), Some(binding))
                if handle_type.kind() == kind && binding.payload.kind() == kind =>
            {
                Ok(index)
            }
            _ => Err(Error::InvalidHandle),
        }
    }

    /// Binds a new object to a slot and returns its handle.
    pub(crate) fn alloc(
        &mut self,
        handle_type: HandleType,
        funcs: Arc<DriverTable>,
        payload: Payload,
    ) -> Result<Handle, Error> {
        debug_assert_eq!(handle_type.kind(), payload.kind());
        let slots = &mut *self.slots;
        let index = match slots.free.pop() {
            Some(index) => index,
            None if slots.entries.len() < self.max => {
                slots.entries.push(Slot { handle: 0, binding: None });
                slots.entries.len() - 1
            }
            None => return Err(Error::OutOfMemory),
        };
        let slot = &mut slots.entries[index];
        slot.handle = handle::next_handle(slot.handle, index, handle_type);
        slot.binding = Some(Binding { funcs, payload, pins: 0 });
        Ok(Handle::from_raw(slot.handle))
    }

    /// Unbinds a slot. Its handle stops resolving at once.
    pub(crate) fn free(&mut self, index: usize) -> Option<Binding> {
        let slots = &mut *self.slots;
        let slot = slots.entries.get_mut(index)?;
        let binding = slot.binding.take()?;
        slot.handle = handle::retired_handle(slot.handle);
        slots.free.push(index);
        Some(binding)
    }

    /// Pins a slot found with `find`. Drop this guard before the pin: dropping a pin locks the
    /// table.
    pub(crate) fn pin(&mut self, index: usize) -> SlotPin<'a> {
        let mut handle = Handle::from_raw(0);
        if let Some(slot) = self.slots.entries.get_mut(index) {
            if let Some(ref mut binding) = slot.binding {
                binding.pins += 1;
                handle = Handle::from_raw(slot.handle);
            }
        }
        SlotPin { table: self.table, handle }
    }

    pub(crate) fn is_pinned(&self, index: usize) -> bool {
        self.binding(index).map_or(false, |binding| binding.pins > 0)
    }

    fn unpin(&mut self, handle: Handle) {
        if let Some(slot) = self.slots.entries.get_mut(handle.index()) {
            if slot.handle == handle.as_raw() {
                if let Some(ref mut binding) = slot.binding {
                    binding.pins = binding.pins.saturating_sub(1);
                }
            }
        }
    }

    pub(crate) fn funcs(&self, index: usize) -> Result<&Arc<DriverTable>, Error> {
        self.binding(index).map(|binding| &binding.funcs)
    }

    pub(crate) fn context(&self, index: usize) -> Result<&Context, Error> {
        match self.binding(index)?.payload {
            Payload::Context(ref context) => Ok(context),
            Payload::Pbuffer(_) => Err(Error::InvalidHandle),
        }
    }

    pub(crate) fn context_mut(&mut self, index: usize) -> Result<&mut Context, Error> {
        match self.binding_mut(index)?.payload {
            Payload::Context(ref mut context) => Ok(context),
            Payload::Pbuffer(_) => Err(Error::InvalidHandle),
        }
    }

    pub(crate) fn pbuffer(&self, index: usize) -> Result<&Pbuffer, Error> {
        match self.binding(index)?.payload {
            Payload::Pbuffer(ref pbuffer) => Ok(pbuffer),
            Payload::Context(_) => Err(Error::InvalidHandle),
        }
    }

    fn binding(&self, index: usize) -> Result<&Binding, Error> {
        self.slots
            .entries
            .get(index)
            .and_then(|slot| slot.binding.as_ref())
            .ok_or(Error::InvalidHandle)
    }

    fn binding_mut(&mut self, index: usize) -> Result<&mut Binding, Error> {
        self.slots
            .entries
            .get_mut(index)
            .and_then(|slot| slot.binding.as_mut())
            .ok_or(Error::InvalidHandle)
    }

    #[cfg(test)]
    pub(crate) fn live_count(&self) -> usize {
        self.slots.entries.iter().filter(|slot| slot.binding.is_some()).count()
    }
}

/// One resolved handle. The table stays locked while this exists.
pub(crate) struct SlotRef<'a> {
    handles: LockedHandles<'a>,
    index: usize,
}

impl<'a> SlotRef<'a> {
    pub(crate) fn funcs(&self) -> Result<&Arc<DriverTable>, Error> {
        self.handles.funcs(self.index)
    }

    pub(crate) fn context(&self) -> Result<&Context, Error> {
        self.handles.context(self.index)
    }

    pub(crate) fn context_mut(&mut self) -> Result<&mut Context, Error> {
        self.handles.context_mut(self.index)
    }

    pub(crate) fn pbuffer(&self) -> Result<&Pbuffer, Error> {
        self.handles.pbuffer(self.index)
    }

    #[inline]
    pub(crate) fn is_pinned(&self) -> bool {
        self.handles.is_pinned(self.index)
    }

    /// Unlocks the table.
    #[inline]
    pub(crate) fn release(self) {}

    /// Pins the slot and unlocks the table.
    pub(crate) fn pin(mut self) -> SlotPin<'a> {
        self.handles.pin(self.index)
    }

    /// Unbinds the slot and unlocks the table, handing back the object for teardown.
    pub(crate) fn free(mut self) -> Option<Binding> {
        self.handles.free(self.index)
    }
}

/// Keeps a slot bound while its object is used without the table locked.
///
/// Dropping the pin takes the table lock, so it must not be dropped while this thread holds
/// the lock.
pub(crate) struct SlotPin<'a> {
    table: &'a HandleTable,
    handle: Handle,
}

impl<'a> Drop for SlotPin<'a> {
    fn drop(&mut self) {
        self.table.lock().unpin(self.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Pbuffer;
    use crate::driver::{Dc, DriverContext, DriverPbuffer, DriverResult, GLenum, GLint};
    use crate::driver::{Driver, ProcAddress};
    use crate::AttribMask;

    struct NullDriver;

    impl Driver for NullDriver {
        fn create_context(&self, _: Dc) -> DriverResult<DriverContext> {
            Ok(DriverContext(1))
        }
        fn delete_context(&self, _: DriverContext) -> DriverResult<()> {
            Ok(())
        }
        fn make_current(&self, _: Option<Dc>, _: Option<DriverContext>) -> DriverResult<()> {
            Ok(())
        }
        fn copy_context(&self, _: DriverContext, _: DriverContext, _: AttribMask) -> DriverResult<()> {
            Ok(())
        }
        fn share_lists(&self, _: DriverContext, _: DriverContext) -> DriverResult<()> {
            Ok(())
        }
        fn get_proc_address(&self, _: &str) -> Option<ProcAddress> {
            None
        }
        fn swap_buffers(&self, _: Dc) -> DriverResult<()> {
            Ok(())
        }
        fn get_pixel_format(&self, _: Dc) -> DriverResult<i32> {
            Ok(1)
        }
        fn get_string(&self, _: GLenum) -> Option<String> {
            None
        }
        fn get_integer(&self, _: GLenum) -> GLint {
            0
        }
    }

    fn pbuffer(id: u64) -> Payload {
        Payload::Pbuffer(Pbuffer { driver_pbuffer: DriverPbuffer(id) })
    }

    fn context(id: u64) -> Payload {
        Payload::Context(Context::new(DriverContext(id)))
    }

    #[test]
    fn test_stale_handles_never_resolve() {
        let table = HandleTable::new(MAX_WGL_HANDLES);
        let funcs = DriverTable::new(NullDriver);

        let first = table.lock().alloc(HandleType::Pbuffer, funcs.clone(), pbuffer(1)).unwrap();
        assert!(table.resolve(first, HandleKind::Pbuffer).unwrap().free().is_some());
        assert_eq!(table.resolve(first, HandleKind::Pbuffer).err(), Some(Error::InvalidHandle));

        // The slot is reused under a new generation.
        let second = table.lock().alloc(HandleType::Pbuffer, funcs, pbuffer(2)).unwrap();
        assert_eq!(second.index(), first.index());
        assert_ne!(second, first);
        assert_eq!(table.resolve(first, HandleKind::Pbuffer).err(), Some(Error::InvalidHandle));
        let slot = table.resolve(second, HandleKind::Pbuffer).unwrap();
        assert_eq!(slot.pbuffer().unwrap().driver_pbuffer, DriverPbuffer(2));
        slot.release();
    }

    #[test]
    fn test_kind_mismatch_is_invalid() {
        let table = HandleTable::new(MAX_WGL_HANDLES);
        let funcs = DriverTable::new(NullDriver);
        let mut handles = table.lock();
        let context_handle = handles.alloc(HandleType::ContextV3, funcs.clone(), context(1)).unwrap();
        let pbuffer_handle = handles.alloc(HandleType::Pbuffer, funcs, pbuffer(1)).unwrap();
        assert_eq!(handles.find(context_handle, HandleKind::Pbuffer), Err(Error::InvalidHandle));
        assert_eq!(handles.find(pbuffer_handle, HandleKind::Context), Err(Error::InvalidHandle));
        assert!(handles.find(context_handle, HandleKind::Context).is_ok());

        // Same slot bits, other type tag.
        let forged = Handle::from_raw(context_handle.as_raw() & !0xf000 | 0x1000);
        assert_eq!(handles.find(forged, HandleKind::Context), Err(Error::InvalidHandle));
        assert_eq!(handles.find(Handle::from_raw(0), HandleKind::Context), Err(Error::InvalidHandle));
    }

    #[test]
    fn test_exhaustion() {
        let table = HandleTable::new(2);
        let funcs = DriverTable::new(NullDriver);
        let mut handles = table.lock();
        let first = handles.alloc(HandleType::Context, funcs.clone(), context(1)).unwrap();
        handles.alloc(HandleType::Context, funcs.clone(), context(2)).unwrap();
        assert_eq!(
            handles.alloc(HandleType::Context, funcs.clone(), context(3)).err(),
            Some(Error::OutOfMemory)
        );
        let index = handles.find(first, HandleKind::Context).unwrap();
        assert!(handles.free(index).is_some());
        assert!(handles.alloc(HandleType::Context, funcs, context(3)).is_ok());
        assert_eq!(handles.live_count(), 2);
    }

    #[test]
    fn test_drain_retires_everything() {
        let table = HandleTable::new(MAX_WGL_HANDLES);
        let funcs = DriverTable::new(NullDriver);
        let handle = table.lock().alloc(HandleType::Context, funcs, context(1)).unwrap();
        assert_eq!(table.drain().len(), 1);
        assert!(table.resolve(handle, HandleKind::Context).is_err());
        assert_eq!(table.lock().live_count(), 0);
    }

    #[test]
    fn test_pins_outlive_the_lock() {
        let table = HandleTable::new(MAX_WGL_HANDLES);
        let funcs = DriverTable::new(NullDriver);
        let handle = table.lock().alloc(HandleType::Pbuffer, funcs, pbuffer(1)).unwrap();

        let first = table.resolve(handle, HandleKind::Pbuffer).unwrap().pin();
        let second = table.resolve(handle, HandleKind::Pbuffer).unwrap().pin();
        // The table is unlocked while the pins live.
        assert!(table.resolve(handle, HandleKind::Pbuffer).unwrap().is_pinned());
        drop(first);
        assert!(table.resolve(handle, HandleKind::Pbuffer).unwrap().is_pinned());
        drop(second);
        let slot = table.resolve(handle, HandleKind::Pbuffer).unwrap();
        assert!(!slot.is_pinned());
        assert!(slot.free().is_some());
    }
}
