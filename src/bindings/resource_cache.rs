// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Storage for bound objects.

A cache is a list of tables, each a fixed array of slots.  The backend decides how many tables
there are and which slots a resource occupies: the slot backend uses one table per register
range and stage, the descriptor-set backend uses one table per set.  A resource visible to
several stages of the slot backend occupies one slot per stage, and every write reaches all of
them.

Each slot records the resource kind expected there, so debug builds can catch a write that lands
in the wrong place.
*/

use std::sync::Arc;

use smallvec::SmallVec;

use crate::bindings::objects::DeviceObject;
use crate::bindings::resource_desc::{ResourceKind, VariableClass};
use crate::bindings::signature::SignatureLayout;
use crate::imp::Backend;

/// Which resources a cache holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheContentType {
    /// Static resources, owned by a signature.
    Signature,
    /// Every resource, owned by a binding instance.
    BindingInstance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotAddress {
    pub table: u32,
    pub offset: u32,
}

pub type SlotAddresses = SmallVec<[SlotAddress; 4]>;

/// Opaque handle of a native binding set allocated for a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeSetHandle(pub u64);

#[derive(Debug, Clone, Default)]
pub struct CacheSlot {
    object: Option<DeviceObject>,
    expected: Option<ResourceKind>,
}

impl CacheSlot {
    pub fn object(&self) -> Option<&DeviceObject> {
        self.object.as_ref()
    }
    /// Kind of the resource placed in this slot, or `None` for unused slots.
    pub fn expected_kind(&self) -> Option<ResourceKind> {
        self.expected
    }
    pub fn is_bound(&self) -> bool {
        self.object.is_some()
    }
}

#[derive(Debug)]
struct CacheTable {
    slots: Box<[CacheSlot]>,
    native_set: Option<NativeSetHandle>,
}

#[derive(Debug)]
pub struct ResourceCache<B: Backend> {
    layout: Arc<SignatureLayout<B>>,
    content: CacheContentType,
    tables: Box<[CacheTable]>,
}

impl<B: Backend> ResourceCache<B> {
    /// Allocates empty tables and records the expected kind of every slot.
    pub fn new(layout: &Arc<SignatureLayout<B>>, content: CacheContentType) -> Self {
        let tables = B::table_sizes(layout, content)
            .into_iter()
            .map(|size| CacheTable {
                slots: vec![CacheSlot::default(); size as usize].into_boxed_slice(),
                native_set: None,
            })
            .collect();
        let mut cache = ResourceCache {
            layout: layout.clone(),
            content,
            tables,
        };
        for r in 0..layout.resource_count() {
            let res = layout.resource_desc(r);
            for a in 0..res.array_size {
                for address in cache.addresses_of(r, a) {
                    let slot = cache.slot_mut(address);
                    debug_assert!(
                        slot.expected.is_none(),
                        "slot {:?} is assigned to more than one resource",
                        address
                    );
                    slot.expected = Some(res.kind);
                }
            }
        }
        cache
    }

    pub fn layout(&self) -> &Arc<SignatureLayout<B>> {
        &self.layout
    }

    pub fn content_type(&self) -> CacheContentType {
        self.content
    }

    pub fn table_count(&self) -> u32 {
        self.tables.len() as u32
    }

    pub fn table_size(&self, table: u32) -> u32 {
        self.tables[table as usize].slots.len() as u32
    }

    /// Slots of `table`.
    pub fn table(&self, table: u32) -> &[CacheSlot] {
        &self.tables[table as usize].slots
    }

    /// Every slot this cache holds for `resource[array_index]`.
    ///
    /// A signature cache holds static resources only.
    pub fn addresses_of(&self, resource_index: u32, array_index: u32) -> SlotAddresses {
        if self.content == CacheContentType::Signature
            && self.layout.resource_desc(resource_index).class != VariableClass::Static
        {
            return SlotAddresses::new();
        }
        B::slot_addresses(&self.layout, resource_index, self.content, array_index)
    }

    pub fn slot(&self, address: SlotAddress) -> &CacheSlot {
        &self.tables[address.table as usize].slots[address.offset as usize]
    }

    fn slot_mut(&mut self, address: SlotAddress) -> &mut CacheSlot {
        &mut self.tables[address.table as usize].slots[address.offset as usize]
    }

    pub(crate) fn set_object(&mut self, address: SlotAddress, object: Option<DeviceObject>) {
        let slot = self.slot_mut(address);
        debug_assert!(slot.expected.is_some(), "write to unused slot {:?}", address);
        slot.object = object;
    }

    /// The object bound to `resource[array_index]`.
    pub fn resource(&self, resource_index: u32, array_index: u32) -> Option<&DeviceObject> {
        let addresses = self.addresses_of(resource_index, array_index);
        let first = addresses.first()?;
        self.slot(*first).object()
    }

    pub fn is_bound(&self, resource_index: u32, array_index: u32) -> bool {
        self.resource(resource_index, array_index).is_some()
    }

    pub fn native_set(&self, table: u32) -> Option<NativeSetHandle> {
        self.tables.get(table as usize)?.native_set
    }

    /// Attaches a native binding set to `table`.
    ///
    /// Returns `false` when the backend does not allow a native set there.
    pub fn set_native_set(&mut self, table: u32, handle: NativeSetHandle) -> bool {
        if (table as usize) >= self.tables.len()
            || !B::table_holds_native_set(&self.layout, self.content, table)
        {
            logwise::error_sync!(
                "table {table} of signature {name} cannot hold a native set",
                table = table,
                name = logwise::privacy::LogIt(self.layout.name())
            );
            return false;
        }
        self.tables[table as usize].native_set = Some(handle);
        true
    }

    /// Number of bound slots across all tables.
    pub fn bound_count(&self) -> u32 {
        self.tables
            .iter()
            .flat_map(|t| t.slots.iter())
            .filter(|s| s.is_bound())
            .count() as u32
    }
}
