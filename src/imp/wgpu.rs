// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Export of descriptor-set layouts to wgpu bind group layouts.
//!
//! Each descriptor set maps to one bind group.  Texel buffers, storage images, input attachments
//! and acceleration structures have no fixed wgpu binding type and are rejected.

use std::num::NonZeroU32;

use wgpu::{
    BindGroupLayoutEntry, BindingType, BufferBindingType, SamplerBindingType, TextureSampleType,
    TextureViewDimension,
};

use crate::bindings::signature::SignatureLayout;
use crate::bindings::visible_to::ShaderStages;
use crate::imp::descriptor_sets::{DescriptorSetLayoutBinding, DescriptorSets, DescriptorType};

mod error;
mod sampler;

pub use error::Error;
pub use sampler::{is_filtering, sampler_descriptor};

pub fn shader_stages(name: &str, stages: ShaderStages) -> Result<wgpu::ShaderStages, Error> {
    let supported = ShaderStages::VERTEX | ShaderStages::PIXEL | ShaderStages::COMPUTE;
    if !supported.contains(stages) {
        return Err(Error::UnsupportedStages {
            name: name.to_string(),
            stages: stages - supported,
        });
    }
    let mut out = wgpu::ShaderStages::NONE;
    if stages.contains(ShaderStages::VERTEX) {
        out |= wgpu::ShaderStages::VERTEX;
    }
    if stages.contains(ShaderStages::PIXEL) {
        out |= wgpu::ShaderStages::FRAGMENT;
    }
    if stages.contains(ShaderStages::COMPUTE) {
        out |= wgpu::ShaderStages::COMPUTE;
    }
    Ok(out)
}

fn binding_type(name: &str, binding: &DescriptorSetLayoutBinding) -> Result<BindingType, Error> {
    let texture = BindingType::Texture {
        sample_type: TextureSampleType::Float { filterable: true },
        view_dimension: TextureViewDimension::D2,
        multisampled: false,
    };
    let buffer = |ty| BindingType::Buffer {
        ty,
        has_dynamic_offset: binding.descriptor_type.has_dynamic_offset(),
        min_binding_size: None,
    };
    Ok(match binding.descriptor_type {
        DescriptorType::Sampler => BindingType::Sampler(SamplerBindingType::Filtering),
        // wgpu has no combined image-sampler binding; those are rejected below
        DescriptorType::SeparateImage => texture,
        DescriptorType::UniformBuffer | DescriptorType::UniformBufferDynamic => {
            buffer(BufferBindingType::Uniform)
        }
        DescriptorType::StorageBuffer | DescriptorType::StorageBufferDynamic => {
            buffer(BufferBindingType::Storage { read_only: false })
        }
        DescriptorType::StorageBufferReadOnly | DescriptorType::StorageBufferDynamicReadOnly => {
            buffer(BufferBindingType::Storage { read_only: true })
        }
        other => {
            return Err(Error::UnsupportedDescriptorType {
                name: name.to_string(),
                descriptor_type: other,
            });
        }
    })
}

impl SignatureLayout<DescriptorSets> {
    /// Bind group layout entries of one descriptor set, in binding order.
    ///
    /// Fails on descriptor types wgpu cannot express, including combined image samplers.
    pub fn wgpu_bind_group_layout_entries(&self, set: u32) -> Result<Vec<BindGroupLayoutEntry>, Error> {
        let sets = self.descriptor_set_layouts();
        let layout = sets.get(set as usize).ok_or(Error::NoSuchSet(set))?;
        let mut entries = Vec::with_capacity(layout.bindings.len());
        // bindings are pushed in declaration order, so the n-th binding of a set is resource
        // number n of that set
        let names: Vec<&str> = (0..self.resource_count())
            .filter(|&r| self.resource_attribs(r).location.set == set)
            .map(|r| self.resource_desc(r).name.as_str())
            .collect();
        for (binding, name) in layout.bindings.iter().zip(names) {
            entries.push(BindGroupLayoutEntry {
                binding: binding.binding,
                visibility: shader_stages(name, binding.stages)?,
                ty: binding_type(name, binding)?,
                count: if binding.count > 1 || binding.runtime_array {
                    NonZeroU32::new(binding.count)
                } else {
                    None
                },
            });
        }
        Ok(entries)
    }
}
