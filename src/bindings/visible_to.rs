// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Shader stage visibility for described resources.
//!
//! Every resource in a signature declares the set of shader stages that can see it.  Backends
//! use the mask differently: the slot backend allocates one register range per stage in the
//! mask, while the descriptor-set backend records the mask on the binding so the driver can
//! restrict visibility.
//!
//! # Examples
//!
//! ```
//! use pipeline_signatures::bindings::visible_to::ShaderStages;
//!
//! let stages = ShaderStages::VERTEX | ShaderStages::PIXEL;
//! assert_eq!(stages.iter().count(), 2);
//! assert_eq!(ShaderStages::PIXEL.stage_index(), Some(1));
//! assert_eq!(stages.stage_index(), None);
//! ```

bitflags::bitflags! {
    /// A set of shader stages.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShaderStages: u32 {
        const VERTEX = 1 << 0;
        const PIXEL = 1 << 1;
        const GEOMETRY = 1 << 2;
        const HULL = 1 << 3;
        const DOMAIN = 1 << 4;
        const COMPUTE = 1 << 5;
        const AMPLIFICATION = 1 << 6;
        const MESH = 1 << 7;
    }
}

impl ShaderStages {
    /// All classic rasterization stages.
    pub const GRAPHICS: Self = Self::VERTEX
        .union(Self::PIXEL)
        .union(Self::GEOMETRY)
        .union(Self::HULL)
        .union(Self::DOMAIN);

    /// Returns the bit position of a single stage, or `None` when the set does not hold exactly
    /// one stage.
    pub fn stage_index(self) -> Option<usize> {
        if self.bits().count_ones() == 1 {
            Some(self.bits().trailing_zeros() as usize)
        } else {
            None
        }
    }

    /// The stage at the given bit position.
    pub fn from_stage_index(index: usize) -> Option<Self> {
        if index >= u32::BITS as usize {
            return None;
        }
        Self::from_bits(1 << index)
    }

    /// Human-readable name of a single stage.
    pub fn stage_name(self) -> &'static str {
        match self {
            Self::VERTEX => "vertex",
            Self::PIXEL => "pixel",
            Self::GEOMETRY => "geometry",
            Self::HULL => "hull",
            Self::DOMAIN => "domain",
            Self::COMPUTE => "compute",
            Self::AMPLIFICATION => "amplification",
            Self::MESH => "mesh",
            _ => "multiple stages",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ShaderStages;

    #[test]
    fn stage_index_roundtrip() {
        for stage in ShaderStages::all().iter() {
            let index = stage.stage_index().unwrap();
            assert_eq!(ShaderStages::from_stage_index(index), Some(stage));
        }
        assert_eq!(ShaderStages::empty().stage_index(), None);
        assert_eq!(ShaderStages::from_stage_index(12), None);
    }

    #[test]
    fn iteration_order_is_lowest_bit_first() {
        let stages = ShaderStages::COMPUTE | ShaderStages::VERTEX | ShaderStages::HULL;
        let order: Vec<_> = stages.iter().collect();
        assert_eq!(
            order,
            vec![ShaderStages::VERTEX, ShaderStages::HULL, ShaderStages::COMPUTE]
        );
        assert_eq!(ShaderStages::GRAPHICS.iter().count(), 5);
    }
}
