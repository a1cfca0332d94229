// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Backend seam.
//!
//! Both binding models are always compiled; `DefaultBackend` picks the one a build targets.

use std::fmt::Debug;

use crate::bindings::error::SignatureError;
use crate::bindings::resource_binding_map::ResourceBindingMap;
use crate::bindings::resource_cache::{CacheContentType, SlotAddresses};
use crate::bindings::resource_desc::SignatureDesc;
use crate::bindings::signature::{NativeLayout, ResolvedResources, SignatureLayout};
use crate::bindings::visible_to::ShaderStages;

/// A binding model that turns a resolved signature description into native locations.
///
/// The generic layer owns the description, sampler resolution, caches and the bind protocol.
/// A backend only decides where each resource lives.
pub trait Backend: Debug + Clone + Copy + PartialEq + Eq + Default + Send + Sync + 'static {
    /// Used in diagnostics.
    const NAME: &'static str;
    /// Native location of one resource.
    type Location: Debug + Clone + PartialEq + Send + Sync;
    /// Native location of one immutable sampler.
    type SamplerBindPoints: Debug + Clone + PartialEq + Send + Sync;
    /// Layout-wide counts produced while assigning locations.
    type Totals: Debug + Clone + PartialEq + Send + Sync;
    /// Offsets a signature is shifted by when it is placed after others in a pipeline layout.
    type BaseBindings: Debug + Clone + Default + PartialEq + Send + Sync;

    /// Assigns a location to every resource and immutable sampler, in declaration order.
    fn create_layout(
        desc: &SignatureDesc,
        resolved: &ResolvedResources,
    ) -> Result<NativeLayout<Self>, SignatureError>;

    /// Slot counts of each cache table.
    fn table_sizes(layout: &SignatureLayout<Self>, content: CacheContentType) -> Vec<u32>;

    /// Every cache slot that holds `resource[array_index]`.
    ///
    /// Immutable samplers have no slots.
    fn slot_addresses(
        layout: &SignatureLayout<Self>,
        resource_index: u32,
        content: CacheContentType,
        array_index: u32,
    ) -> SlotAddresses;

    /// Whether the given table may carry a native binding-set handle.
    fn table_holds_native_set(
        _layout: &SignatureLayout<Self>,
        _content: CacheContentType,
        _table: u32,
    ) -> bool {
        false
    }

    /// Advances `bindings` past everything this layout occupies.
    fn shift_bindings(layout: &SignatureLayout<Self>, bindings: &mut Self::BaseBindings);

    /// Adds every resource visible to `stage` to `map`, offset by `base`.
    fn update_resource_binding_map(
        layout: &SignatureLayout<Self>,
        map: &mut ResourceBindingMap,
        stage: ShaderStages,
        base: &Self::BaseBindings,
    );
}

pub mod descriptor_sets;
pub mod slots;

#[cfg(feature = "backend_wgpu")]
pub mod wgpu;

#[cfg(feature = "backend_slots")]
pub type DefaultBackend = slots::Slots;
#[cfg(not(feature = "backend_slots"))]
pub type DefaultBackend = descriptor_sets::DescriptorSets;
