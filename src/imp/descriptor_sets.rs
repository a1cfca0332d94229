// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Descriptor-set binding model.

A signature uses at most two descriptor sets: one for static and mutable resources and one for
dynamic resources.  When there are no static or mutable resources, the dynamic set is set 0.
Every resource takes one binding, numbered in declaration order within its set.

Binding-instance caches have one table per set.  The signature cache has a single table that
holds the static resources packed in declaration order.
*/

mod descriptor_type;

pub use descriptor_type::DescriptorType;

use crate::bindings::error::SignatureError;
use crate::bindings::objects::DeviceObject;
use crate::bindings::resource_binding_map::{BindInfo, ResourceBindingMap};
use crate::bindings::resource_cache::{CacheContentType, ResourceCache, SlotAddress, SlotAddresses};
use crate::bindings::resource_desc::{ResourceFlags, ResourceKind, SignatureDesc, VariableClass};
use crate::bindings::signature::{NativeLayout, ResolvedResources, SignatureLayout};
use crate::bindings::visible_to::ShaderStages;
use crate::imp::Backend;

pub const MAX_DESCRIPTOR_SETS: usize = 2;
/// Marks a resource with no slot in a cache.
pub const INVALID_CACHE_OFFSET: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorSetKind {
    StaticMutable,
    Dynamic,
}

impl DescriptorSetKind {
    pub fn for_class(class: VariableClass) -> Self {
        match class {
            VariableClass::Static | VariableClass::Mutable => DescriptorSetKind::StaticMutable,
            VariableClass::Dynamic => DescriptorSetKind::Dynamic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorLocation {
    pub set: u32,
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    srb_cache_offset: u32,
    static_cache_offset: u32,
}

impl DescriptorLocation {
    /// First slot of the resource in a cache of the given content.
    pub fn cache_offset(&self, content: CacheContentType) -> Option<u32> {
        let offset = match content {
            CacheContentType::Signature => self.static_cache_offset,
            CacheContentType::BindingInstance => self.srb_cache_offset,
        };
        (offset != INVALID_CACHE_OFFSET).then_some(offset)
    }
}

/// Where an immutable sampler is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorBindPoint {
    pub set: u32,
    pub binding: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorSetTotals {
    set_kinds: Vec<DescriptorSetKind>,
    binding_counts: Vec<u32>,
    cache_sizes: Vec<u32>,
    static_cache_size: u32,
    dynamic_offset_count: u32,
}

impl DescriptorSetTotals {
    pub fn set_count(&self) -> u32 {
        self.set_kinds.len() as u32
    }
    pub fn set_index(&self, kind: DescriptorSetKind) -> Option<u32> {
        self.set_kinds.iter().position(|k| *k == kind).map(|i| i as u32)
    }
    pub fn set_kind(&self, set: u32) -> Option<DescriptorSetKind> {
        self.set_kinds.get(set as usize).copied()
    }
    pub fn binding_count(&self, set: u32) -> u32 {
        self.binding_counts.get(set as usize).copied().unwrap_or(0)
    }
    /// Slots in the binding-instance table of `set`.
    pub fn cache_size(&self, set: u32) -> u32 {
        self.cache_sizes.get(set as usize).copied().unwrap_or(0)
    }
    pub fn static_cache_size(&self) -> u32 {
        self.static_cache_size
    }
    pub fn dynamic_offset_count(&self) -> u32 {
        self.dynamic_offset_count
    }
}

/// The descriptor-set binding model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DescriptorSets;

impl Backend for DescriptorSets {
    const NAME: &'static str = "descriptor set";
    type Location = DescriptorLocation;
    type SamplerBindPoints = DescriptorBindPoint;
    type Totals = DescriptorSetTotals;
    /// Index of the first set.
    type BaseBindings = u32;

    fn create_layout(
        desc: &SignatureDesc,
        resolved: &ResolvedResources,
    ) -> Result<NativeLayout<Self>, SignatureError> {
        let has_static_mutable = desc.resources.iter().any(|r| r.class != VariableClass::Dynamic);
        let has_dynamic = desc.resources.iter().any(|r| r.class == VariableClass::Dynamic);
        let mut totals = DescriptorSetTotals::default();
        if has_static_mutable {
            totals.set_kinds.push(DescriptorSetKind::StaticMutable);
        }
        if has_dynamic {
            totals.set_kinds.push(DescriptorSetKind::Dynamic);
        }
        totals.binding_counts = vec![0; totals.set_kinds.len()];
        totals.cache_sizes = vec![0; totals.set_kinds.len()];

        let mut runtime_array: [Option<usize>; MAX_DESCRIPTOR_SETS] = [None; MAX_DESCRIPTOR_SETS];
        let mut locations = Vec::with_capacity(desc.resources.len());
        for (r, res) in desc.resources.iter().enumerate() {
            let set = match DescriptorSetKind::for_class(res.class) {
                DescriptorSetKind::StaticMutable => 0,
                DescriptorSetKind::Dynamic => has_static_mutable as usize,
            };
            if let Some(previous) = runtime_array[set] {
                return Err(SignatureError::RuntimeArrayNotLast {
                    name: desc.resources[previous].name.clone(),
                    set: set as u32,
                });
            }
            if res.flags.contains(ResourceFlags::RUNTIME_ARRAY) {
                runtime_array[set] = Some(r);
            }

            let descriptor_type = DescriptorType::for_resource(res);
            let binding = totals.binding_counts[set];
            totals.binding_counts[set] += 1;

            let immutable =
                res.kind == ResourceKind::Sampler && resolved.immutable_sampler(r as u32).is_some();
            let grow = |total: &mut u32| -> Result<u32, SignatureError> {
                let offset = *total;
                *total = offset.checked_add(res.array_size).ok_or_else(|| {
                    SignatureError::DescriptorCountOverflow {
                        name: res.name.clone(),
                        set: set as u32,
                    }
                })?;
                Ok(offset)
            };
            let (srb_cache_offset, static_cache_offset) = if immutable {
                (INVALID_CACHE_OFFSET, INVALID_CACHE_OFFSET)
            } else {
                let srb = grow(&mut totals.cache_sizes[set])?;
                let stat = if res.class == VariableClass::Static {
                    grow(&mut totals.static_cache_size)?
                } else {
                    INVALID_CACHE_OFFSET
                };
                (srb, stat)
            };
            if descriptor_type.has_dynamic_offset() {
                grow(&mut totals.dynamic_offset_count)?;
            }
            locations.push(DescriptorLocation {
                set: set as u32,
                binding,
                descriptor_type,
                srb_cache_offset,
                static_cache_offset,
            });
        }

        let mut immutable_samplers = Vec::with_capacity(desc.immutable_samplers.len());
        for (i, imtbl) in desc.immutable_samplers.iter().enumerate() {
            let carrier = (0..desc.resources.len()).find(|&r| {
                let res = &desc.resources[r];
                resolved.immutable_sampler(r as u32) == Some(i as u32)
                    && (res.kind == ResourceKind::Sampler
                        || (res.flags.contains(ResourceFlags::COMBINED_SAMPLER)
                            && resolved.assigned_sampler(r as u32).is_none()))
            });
            let Some(r) = carrier else {
                return Err(SignatureError::UnresolvedImmutableSampler {
                    name: imtbl.name.clone(),
                });
            };
            immutable_samplers.push(DescriptorBindPoint {
                set: locations[r].set,
                binding: locations[r].binding,
            });
        }

        Ok(NativeLayout {
            locations,
            immutable_samplers,
            totals,
        })
    }

    fn table_sizes(layout: &SignatureLayout<Self>, content: CacheContentType) -> Vec<u32> {
        match content {
            CacheContentType::Signature => vec![layout.totals().static_cache_size],
            CacheContentType::BindingInstance => layout.totals().cache_sizes.clone(),
        }
    }

    fn slot_addresses(
        layout: &SignatureLayout<Self>,
        resource_index: u32,
        content: CacheContentType,
        array_index: u32,
    ) -> SlotAddresses {
        let location = layout.resource_attribs(resource_index).location;
        let mut addresses = SlotAddresses::new();
        if let Some(offset) = location.cache_offset(content) {
            let table = match content {
                CacheContentType::Signature => 0,
                CacheContentType::BindingInstance => location.set,
            };
            addresses.push(SlotAddress {
                table,
                offset: offset + array_index,
            });
        }
        addresses
    }

    fn table_holds_native_set(layout: &SignatureLayout<Self>, content: CacheContentType, table: u32) -> bool {
        content == CacheContentType::BindingInstance
            && layout.totals().set_kind(table) == Some(DescriptorSetKind::StaticMutable)
    }

    fn shift_bindings(layout: &SignatureLayout<Self>, bindings: &mut u32) {
        *bindings += layout.totals().set_count();
    }

    fn update_resource_binding_map(
        layout: &SignatureLayout<Self>,
        map: &mut ResourceBindingMap,
        stage: ShaderStages,
        base: &u32,
    ) {
        for r in 0..layout.resource_count() {
            let res = layout.resource_desc(r);
            if !res.stages.intersects(stage) {
                continue;
            }
            let location = layout.resource_attribs(r).location;
            map.insert(res.name.clone(), BindInfo::new(location.binding, base + location.set));
        }
    }
}

/// One binding of a native descriptor set layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSetLayoutBinding {
    pub binding: u32,
    pub descriptor_type: DescriptorType,
    pub count: u32,
    pub stages: ShaderStages,
    /// Immutable sampler baked into this binding.
    pub immutable_sampler: Option<u32>,
    pub runtime_array: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorSetLayoutDesc {
    pub set: u32,
    pub kind: DescriptorSetKind,
    pub bindings: Vec<DescriptorSetLayoutBinding>,
}

impl SignatureLayout<DescriptorSets> {
    pub fn descriptor_set_count(&self) -> u32 {
        self.totals().set_count()
    }

    /// Total dynamic offsets the pipeline must supply at bind time.
    pub fn dynamic_offset_count(&self) -> u32 {
        self.totals().dynamic_offset_count()
    }

    pub fn descriptor_set_layouts(&self) -> Vec<DescriptorSetLayoutDesc> {
        let totals = self.totals();
        let mut sets: Vec<DescriptorSetLayoutDesc> = totals
            .set_kinds
            .iter()
            .enumerate()
            .map(|(set, kind)| DescriptorSetLayoutDesc {
                set: set as u32,
                kind: *kind,
                bindings: Vec::with_capacity(totals.binding_count(set as u32) as usize),
            })
            .collect();
        for r in 0..self.resource_count() {
            let res = self.resource_desc(r);
            let attribs = self.resource_attribs(r);
            let location = attribs.location;
            let immutable_sampler = match location.descriptor_type {
                DescriptorType::Sampler | DescriptorType::CombinedImageSampler => {
                    attribs.immutable_sampler_index()
                }
                _ => None,
            };
            sets[location.set as usize].bindings.push(DescriptorSetLayoutBinding {
                binding: location.binding,
                descriptor_type: location.descriptor_type,
                count: res.array_size,
                stages: res.stages,
                immutable_sampler,
                runtime_array: res.flags.contains(ResourceFlags::RUNTIME_ARRAY),
            });
        }
        sets
    }
}

/// One bound descriptor, ready to be written into a native set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorWrite<'a> {
    pub binding: u32,
    pub array_element: u32,
    pub descriptor_type: DescriptorType,
    pub object: &'a DeviceObject,
}

impl ResourceCache<DescriptorSets> {
    /// Bound descriptors of `set`, in binding order.
    ///
    /// Only binding-instance caches map to sets; a signature cache yields nothing.
    pub fn descriptor_writes(&self, set: u32) -> Vec<DescriptorWrite<'_>> {
        let mut writes = Vec::new();
        if self.content_type() != CacheContentType::BindingInstance {
            return writes;
        }
        let layout = self.layout();
        for r in 0..layout.resource_count() {
            let location = layout.resource_attribs(r).location;
            if location.set != set {
                continue;
            }
            for a in 0..layout.resource_desc(r).array_size {
                if let Some(object) = self.resource(r, a) {
                    writes.push(DescriptorWrite {
                        binding: location.binding,
                        array_element: a,
                        descriptor_type: location.descriptor_type,
                        object,
                    });
                }
            }
        }
        writes
    }
}
