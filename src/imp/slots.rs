// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Slot-based binding model.

Resources live in four register ranges (constant buffers, shader resources, samplers and
unordered-access views), counted independently for each of six stages.  A resource takes
`array_size` consecutive slots of its range in every stage it is visible to.  Immutable samplers
take sampler slots first, and sampler resources they apply to reuse those slots.

The cache has one table per range and stage.
*/

use std::sync::Arc;

use crate::bindings::error::SignatureError;
use crate::bindings::objects::{DeviceObject, Sampler};
use crate::bindings::resource_binding_map::{BindInfo, ResourceBindingMap};
use crate::bindings::resource_cache::{CacheContentType, ResourceCache, SlotAddress, SlotAddresses};
use crate::bindings::resource_desc::{ResourceFlags, ResourceKind, SignatureDesc};
use crate::bindings::signature::{NativeLayout, ResolvedResources, SignatureLayout};
use crate::bindings::visible_to::ShaderStages;
use crate::imp::Backend;

pub const STAGE_COUNT: usize = 6;
pub const RANGE_COUNT: usize = 4;

/// Stages with their own slot ranges, in table order.
pub const SLOT_STAGES: [ShaderStages; STAGE_COUNT] = [
    ShaderStages::VERTEX,
    ShaderStages::PIXEL,
    ShaderStages::GEOMETRY,
    ShaderStages::HULL,
    ShaderStages::DOMAIN,
    ShaderStages::COMPUTE,
];

/// Marks a stage the resource is not visible to.
pub const INVALID_SLOT: u8 = 0xFF;

pub fn slot_stage_index(stage: ShaderStages) -> Option<usize> {
    SLOT_STAGES.iter().position(|s| *s == stage)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotRange {
    ConstantBuffer,
    ShaderResource,
    Sampler,
    UnorderedAccess,
}

impl SlotRange {
    pub const ALL: [SlotRange; RANGE_COUNT] = [
        SlotRange::ConstantBuffer,
        SlotRange::ShaderResource,
        SlotRange::Sampler,
        SlotRange::UnorderedAccess,
    ];

    /// The range a resource kind is placed in.  Acceleration structures have none.
    pub fn of(kind: ResourceKind) -> Option<SlotRange> {
        match kind {
            ResourceKind::ConstantBuffer => Some(SlotRange::ConstantBuffer),
            ResourceKind::TextureSrv | ResourceKind::BufferSrv | ResourceKind::InputAttachment => {
                Some(SlotRange::ShaderResource)
            }
            ResourceKind::Sampler => Some(SlotRange::Sampler),
            ResourceKind::TextureUav | ResourceKind::BufferUav => Some(SlotRange::UnorderedAccess),
            ResourceKind::AccelStruct => None,
        }
    }

    /// Number of slots per stage.
    pub const fn limit(self) -> u32 {
        match self {
            SlotRange::ConstantBuffer => 14,
            SlotRange::ShaderResource => 128,
            SlotRange::Sampler => 16,
            SlotRange::UnorderedAccess => 64,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            SlotRange::ConstantBuffer => "constant buffer",
            SlotRange::ShaderResource => "shader resource",
            SlotRange::Sampler => "sampler",
            SlotRange::UnorderedAccess => "unordered access",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

/// Slots used per range and stage.
pub type SlotCounters = [[u32; STAGE_COUNT]; RANGE_COUNT];

/// First slot of a resource in each stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotBindPoints {
    active: ShaderStages,
    points: [u8; STAGE_COUNT],
}

impl Default for SlotBindPoints {
    fn default() -> Self {
        SlotBindPoints {
            active: ShaderStages::empty(),
            points: [INVALID_SLOT; STAGE_COUNT],
        }
    }
}

impl SlotBindPoints {
    pub fn active_stages(&self) -> ShaderStages {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn get(&self, stage: ShaderStages) -> Option<u32> {
        let s = slot_stage_index(stage)?;
        match self.points[s] {
            INVALID_SLOT => None,
            point => Some(point as u32),
        }
    }

    fn set(&mut self, stage_index: usize, point: u8) {
        self.active |= SLOT_STAGES[stage_index];
        self.points[stage_index] = point;
    }

    /// `(stage index, first slot)` for every active stage.
    pub fn iter(&self) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, p)| **p != INVALID_SLOT)
            .map(|(s, p)| (s, *p as u32))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotLocation {
    pub range: SlotRange,
    pub bind_points: SlotBindPoints,
}

fn table_index(range: SlotRange, stage_index: usize) -> u32 {
    (range.index() * STAGE_COUNT + stage_index) as u32
}

fn unsupported(name: &str, what: &'static str) -> SignatureError {
    SignatureError::Unsupported {
        backend: Slots::NAME,
        name: name.to_string(),
        what,
    }
}

fn allocate(
    counters: &mut SlotCounters,
    range: SlotRange,
    stages: ShaderStages,
    array_size: u32,
    name: &str,
) -> Result<SlotBindPoints, SignatureError> {
    let mut points = SlotBindPoints::default();
    for stage in stages.iter() {
        let s = slot_stage_index(stage).ok_or_else(|| unsupported(name, stage.stage_name()))?;
        let first = counters[range.index()][s];
        let end = match first.checked_add(array_size) {
            Some(end) if end <= range.limit() => end,
            _ => {
                return Err(SignatureError::SlotRangeExhausted {
                    backend: Slots::NAME,
                    name: name.to_string(),
                    range: range.name(),
                    stage,
                    required: first.saturating_add(array_size),
                    limit: range.limit(),
                });
            }
        };
        points.set(s, first as u8);
        counters[range.index()][s] = end;
    }
    Ok(points)
}

/// The slot binding model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Slots;

impl Backend for Slots {
    const NAME: &'static str = "slot";
    type Location = SlotLocation;
    type SamplerBindPoints = SlotBindPoints;
    type Totals = SlotCounters;
    type BaseBindings = SlotCounters;

    fn create_layout(
        desc: &SignatureDesc,
        resolved: &ResolvedResources,
    ) -> Result<NativeLayout<Self>, SignatureError> {
        let mut counters = SlotCounters::default();
        let mut immutable_samplers = Vec::with_capacity(desc.immutable_samplers.len());
        for (i, imtbl) in desc.immutable_samplers.iter().enumerate() {
            immutable_samplers.push(allocate(
                &mut counters,
                SlotRange::Sampler,
                imtbl.stages,
                resolved.immutable_array_size(i as u32),
                &imtbl.name,
            )?);
        }

        let mut locations = Vec::with_capacity(desc.resources.len());
        for (r, res) in desc.resources.iter().enumerate() {
            if res.flags.contains(ResourceFlags::RUNTIME_ARRAY) {
                return Err(unsupported(&res.name, "runtime-sized arrays"));
            }
            let range = SlotRange::of(res.kind)
                .ok_or_else(|| unsupported(&res.name, "acceleration structures"))?;
            let bind_points = match resolved.immutable_sampler(r as u32) {
                Some(i) if res.kind == ResourceKind::Sampler => immutable_samplers[i as usize],
                _ => allocate(&mut counters, range, res.stages, res.array_size, &res.name)?,
            };
            locations.push(SlotLocation { range, bind_points });
        }
        Ok(NativeLayout {
            locations,
            immutable_samplers,
            totals: counters,
        })
    }

    fn table_sizes(layout: &SignatureLayout<Self>, _content: CacheContentType) -> Vec<u32> {
        layout.totals().iter().flatten().copied().collect()
    }

    fn slot_addresses(
        layout: &SignatureLayout<Self>,
        resource_index: u32,
        _content: CacheContentType,
        array_index: u32,
    ) -> SlotAddresses {
        let attribs = layout.resource_attribs(resource_index);
        if layout.resource_desc(resource_index).kind == ResourceKind::Sampler
            && attribs.is_immutable_sampler_assigned()
        {
            return SlotAddresses::new();
        }
        let location = attribs.location;
        location
            .bind_points
            .iter()
            .map(|(s, point)| SlotAddress {
                table: table_index(location.range, s),
                offset: point + array_index,
            })
            .collect()
    }

    fn shift_bindings(layout: &SignatureLayout<Self>, bindings: &mut SlotCounters) {
        for (base, used) in bindings.iter_mut().zip(layout.totals()) {
            for (b, u) in base.iter_mut().zip(used) {
                *b += u;
            }
        }
    }

    fn update_resource_binding_map(
        layout: &SignatureLayout<Self>,
        map: &mut ResourceBindingMap,
        stage: ShaderStages,
        base: &SlotCounters,
    ) {
        let Some(s) = slot_stage_index(stage) else {
            return;
        };
        for r in 0..layout.resource_count() {
            let res = layout.resource_desc(r);
            let location = layout.resource_attribs(r).location;
            if let Some(point) = location.bind_points.get(stage) {
                map.insert(
                    res.name.clone(),
                    BindInfo::new(base[location.range.index()][s] + point, 0),
                );
            }
        }
        let suffix = layout.combined_sampler_suffix().unwrap_or("");
        for i in 0..layout.immutable_sampler_count() {
            let attribs = layout.immutable_sampler_attribs(i);
            let Some(point) = attribs.bind_points.get(stage) else {
                continue;
            };
            let name = format!("{}{}", layout.immutable_sampler_desc(i).name, suffix);
            if !map.contains(&name) {
                map.insert(
                    name,
                    BindInfo::new(base[SlotRange::Sampler.index()][s] + point, 0),
                );
            }
        }
    }
}

/// One bound slot, ready to be set on a device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotWrite<'a> {
    pub slot: u32,
    pub object: &'a DeviceObject,
}

impl ResourceCache<Slots> {
    /// Bound slots of one range in one stage, in slot order.
    pub fn slot_writes(&self, stage: ShaderStages, range: SlotRange) -> Vec<SlotWrite<'_>> {
        let Some(s) = slot_stage_index(stage) else {
            return Vec::new();
        };
        let table = table_index(range, s);
        if table >= self.table_count() {
            return Vec::new();
        }
        self.table(table)
            .iter()
            .enumerate()
            .filter_map(|(slot, cached)| {
                cached.object().map(|object| SlotWrite {
                    slot: slot as u32,
                    object,
                })
            })
            .collect()
    }
}

impl SignatureLayout<Slots> {
    /// `(slot, sampler)` for every immutable sampler element visible to `stage`.
    pub fn immutable_sampler_slots(&self, stage: ShaderStages) -> Vec<(u32, &Arc<Sampler>)> {
        let mut slots = Vec::new();
        for i in 0..self.immutable_sampler_count() {
            let attribs = self.immutable_sampler_attribs(i);
            if let Some(point) = attribs.bind_points.get(stage) {
                slots.extend((0..attribs.array_size).map(|a| (point + a, &attribs.sampler)));
            }
        }
        slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_is_per_stage() {
        let mut counters = SlotCounters::default();
        let a = allocate(
            &mut counters,
            SlotRange::ShaderResource,
            ShaderStages::VERTEX | ShaderStages::PIXEL,
            2,
            "a",
        )
        .unwrap();
        let b = allocate(&mut counters, SlotRange::ShaderResource, ShaderStages::PIXEL, 1, "b").unwrap();
        assert_eq!(a.get(ShaderStages::VERTEX), Some(0));
        assert_eq!(a.get(ShaderStages::PIXEL), Some(0));
        assert_eq!(a.get(ShaderStages::COMPUTE), None);
        assert_eq!(b.get(ShaderStages::PIXEL), Some(2));
        assert_eq!(counters[SlotRange::ShaderResource.index()], [2, 3, 0, 0, 0, 0]);
    }

    #[test]
    fn allocation_respects_limits() {
        let mut counters = SlotCounters::default();
        let err = allocate(&mut counters, SlotRange::ConstantBuffer, ShaderStages::VERTEX, 15, "big")
            .unwrap_err();
        assert!(matches!(err, SignatureError::SlotRangeExhausted { limit: 14, .. }));
        let err = allocate(&mut counters, SlotRange::ConstantBuffer, ShaderStages::MESH, 1, "m")
            .unwrap_err();
        assert!(matches!(err, SignatureError::Unsupported { .. }));
    }
}
