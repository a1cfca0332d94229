// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Name-to-location map consumed by a shader bytecode remapper.

A signature fills the map with the final bind point and space of each resource it exposes to a
stage.  The remapper later records, in the same entry, the bind point and space the shader
originally declared.
*/

use std::collections::HashMap;

/// Marks a bind point or space that has not been assigned.
pub const INVALID_BIND_POINT: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindInfo {
    pub bind_point: u32,
    pub space: u32,
    /// The bind point in the original bytecode, filled in by the remapper.
    pub src_bind_point: u32,
    pub src_space: u32,
}

impl BindInfo {
    pub fn new(bind_point: u32, space: u32) -> Self {
        BindInfo {
            bind_point,
            space,
            src_bind_point: INVALID_BIND_POINT,
            src_space: INVALID_BIND_POINT,
        }
    }

    /// Whether the remapper has recorded the original location.
    pub fn has_source(&self) -> bool {
        self.src_bind_point != INVALID_BIND_POINT
    }
}

impl Default for BindInfo {
    fn default() -> Self {
        BindInfo {
            bind_point: INVALID_BIND_POINT,
            space: INVALID_BIND_POINT,
            src_bind_point: INVALID_BIND_POINT,
            src_space: INVALID_BIND_POINT,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceBindingMap {
    entries: HashMap<String, BindInfo>,
}

impl ResourceBindingMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry, returning the previous value if the name was already mapped.
    pub fn insert(&mut self, name: impl Into<String>, info: BindInfo) -> Option<BindInfo> {
        self.entries.insert(name.into(), info)
    }

    pub fn get(&self, name: &str) -> Option<&BindInfo> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Records where the original bytecode declared `name`.
    ///
    /// Returns `false` when the name is not mapped.
    pub fn record_source(&mut self, name: &str, src_bind_point: u32, src_space: u32) -> bool {
        match self.entries.get_mut(name) {
            Some(info) => {
                info.src_bind_point = src_bind_point;
                info.src_space = src_space;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BindInfo)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_fields_default_to_invalid() {
        let mut map = ResourceBindingMap::new();
        map.insert("cb", BindInfo::new(2, 0));
        let info = *map.get("cb").unwrap();
        assert_eq!(info.bind_point, 2);
        assert_eq!(info.src_bind_point, INVALID_BIND_POINT);
        assert!(!info.has_source());

        assert!(map.record_source("cb", 5, 1));
        assert!(!map.record_source("missing", 0, 0));
        let info = *map.get("cb").unwrap();
        assert_eq!((info.src_bind_point, info.src_space), (5, 1));
        assert_eq!(BindInfo::default().bind_point, INVALID_BIND_POINT);
    }
}
