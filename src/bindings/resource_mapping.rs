// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Name-keyed object lookup for batch binding.

use std::collections::HashMap;

use crate::bindings::objects::DeviceObject;
use crate::bindings::resource_desc::VariableClass;

bitflags::bitflags! {
    /// Controls a batch bind.
    ///
    /// If none of the `UPDATE_*` bits are set, all classes are updated.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BindFlags: u32 {
        const UPDATE_STATIC = 1 << 0;
        const UPDATE_MUTABLE = 1 << 1;
        const UPDATE_DYNAMIC = 1 << 2;
        const UPDATE_ALL = Self::UPDATE_STATIC.bits() | Self::UPDATE_MUTABLE.bits() | Self::UPDATE_DYNAMIC.bits();
        /// Skip array elements that are already bound.
        const KEEP_EXISTING = 1 << 3;
        /// Report variables left unbound after the batch.
        const VERIFY_ALL_RESOLVED = 1 << 4;
    }
}

impl BindFlags {
    pub fn for_class(class: VariableClass) -> Self {
        match class {
            VariableClass::Static => BindFlags::UPDATE_STATIC,
            VariableClass::Mutable => BindFlags::UPDATE_MUTABLE,
            VariableClass::Dynamic => BindFlags::UPDATE_DYNAMIC,
        }
    }

    /// Applies the "no update bits means update all" rule.
    pub fn normalized(self) -> Self {
        if self.intersects(BindFlags::UPDATE_ALL) {
            self
        } else {
            self | BindFlags::UPDATE_ALL
        }
    }
}

/// Objects keyed by variable name and array index.
#[derive(Debug, Clone, Default)]
pub struct ResourceMapping {
    entries: HashMap<String, Vec<Option<DeviceObject>>>,
}

impl ResourceMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `name[0]`.
    pub fn add(&mut self, name: impl Into<String>, object: impl Into<DeviceObject>) -> &mut Self {
        self.add_array(name, 0, [object.into()])
    }

    /// Maps `name[first_element..]` to `objects`.
    pub fn add_array(
        &mut self,
        name: impl Into<String>,
        first_element: u32,
        objects: impl IntoIterator<Item = DeviceObject>,
    ) -> &mut Self {
        let elements = self.entries.entry(name.into()).or_default();
        for (i, object) in objects.into_iter().enumerate() {
            let index = first_element as usize + i;
            if elements.len() <= index {
                elements.resize(index + 1, None);
            }
            elements[index] = Some(object);
        }
        self
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.entries.remove(name).is_some()
    }

    pub fn get(&self, name: &str, array_index: u32) -> Option<&DeviceObject> {
        self.entries
            .get(name)
            .and_then(|elements| elements.get(array_index as usize))
            .and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
