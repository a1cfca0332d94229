// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use wgpu::SamplerDescriptor;

use crate::bindings::sampler::{AddressMode, SamplerDesc, SamplerType};

fn address_mode(mode: AddressMode) -> wgpu::AddressMode {
    match mode {
        AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        AddressMode::Repeat => wgpu::AddressMode::Repeat,
        AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    }
}

/// The wgpu descriptor of a sampler, e.g. to create immutable samplers of a signature.
pub fn sampler_descriptor<'a>(desc: &SamplerDesc, label: Option<&'a str>) -> SamplerDescriptor<'a> {
    let min_filter = match desc.sampler_type {
        SamplerType::Mipmapped | SamplerType::PixelLinear => wgpu::FilterMode::Linear,
        SamplerType::Nearest => wgpu::FilterMode::Nearest,
    };
    let mag_filter = match desc.sampler_type {
        SamplerType::Mipmapped => wgpu::FilterMode::Linear,
        SamplerType::PixelLinear | SamplerType::Nearest => wgpu::FilterMode::Nearest,
    };
    let mipmap_filter = match desc.sampler_type {
        SamplerType::Mipmapped => wgpu::FilterMode::Linear,
        SamplerType::PixelLinear | SamplerType::Nearest => wgpu::FilterMode::Nearest,
    };
    let address = address_mode(desc.address_mode);
    SamplerDescriptor {
        label,
        address_mode_u: address,
        address_mode_v: address,
        address_mode_w: address,
        mag_filter,
        min_filter,
        mipmap_filter,
        lod_min_clamp: 0.0,
        lod_max_clamp: 14.0,
        compare: None,
        anisotropy_clamp: 1,
        border_color: None,
    }
}

/// Whether a sampler can be bound to a filtering sampler binding.
pub fn is_filtering(desc: &SamplerDesc) -> bool {
    desc.sampler_type != SamplerType::Nearest
}
