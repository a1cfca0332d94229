// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/// Filtering configuration of a sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SamplerType {
    ///The sampler shall use normalized coordinates, and will do interpolation for mipmapping.
    #[default]
    Mipmapped,
    ///Linear filtering within a mip level, nearest between levels.
    PixelLinear,
    ///Point sampling everywhere.
    Nearest,
}

/// How coordinates outside `[0, 1]` are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

/// Sampler configuration, used both for bindable samplers and for samplers baked into a
/// signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SamplerDesc {
    pub sampler_type: SamplerType,
    pub address_mode: AddressMode,
}

impl SamplerDesc {
    pub const fn new(sampler_type: SamplerType, address_mode: AddressMode) -> Self {
        SamplerDesc {
            sampler_type,
            address_mode,
        }
    }
}
