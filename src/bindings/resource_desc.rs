// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Declarative description of a pipeline resource signature.

A [`SignatureDesc`] lists named resources with their kind, array size, stage visibility and
variable class, plus optional immutable samplers that are baked into the layout.  Nothing here
talks to a backend; the descriptions are consumed by [`crate::bindings::signature::SignatureLayout`].
*/

use crate::bindings::sampler::SamplerDesc;
use crate::bindings::visible_to::ShaderStages;

/// The default suffix that pairs a texture with its separate sampler, e.g. `g_Tex` and
/// `g_Tex_sampler`.
pub const DEFAULT_COMBINED_SAMPLER_SUFFIX: &str = "_sampler";

/// Kind of shader resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    ConstantBuffer,
    TextureSrv,
    BufferSrv,
    TextureUav,
    BufferUav,
    Sampler,
    InputAttachment,
    AccelStruct,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::ConstantBuffer,
        ResourceKind::TextureSrv,
        ResourceKind::BufferSrv,
        ResourceKind::TextureUav,
        ResourceKind::BufferUav,
        ResourceKind::Sampler,
        ResourceKind::InputAttachment,
        ResourceKind::AccelStruct,
    ];

    /// Flags that may legally be combined with this kind.
    pub fn allowed_flags(self) -> ResourceFlags {
        match self {
            ResourceKind::ConstantBuffer => {
                ResourceFlags::NO_DYNAMIC_BUFFERS | ResourceFlags::RUNTIME_ARRAY
            }
            ResourceKind::TextureSrv => ResourceFlags::COMBINED_SAMPLER | ResourceFlags::RUNTIME_ARRAY,
            ResourceKind::BufferSrv | ResourceKind::BufferUav => {
                ResourceFlags::NO_DYNAMIC_BUFFERS
                    | ResourceFlags::FORMATTED_BUFFER
                    | ResourceFlags::RUNTIME_ARRAY
            }
            ResourceKind::TextureUav | ResourceKind::Sampler | ResourceKind::AccelStruct => {
                ResourceFlags::RUNTIME_ARRAY
            }
            ResourceKind::InputAttachment => ResourceFlags::empty(),
        }
    }

    /// What a caller must bind to a resource of this kind, used in error messages.
    pub fn expected_object(self) -> &'static str {
        match self {
            ResourceKind::ConstantBuffer => "buffer",
            ResourceKind::TextureSrv | ResourceKind::InputAttachment => "texture SRV view",
            ResourceKind::TextureUav => "texture UAV view",
            ResourceKind::BufferSrv => "buffer SRV view",
            ResourceKind::BufferUav => "buffer UAV view",
            ResourceKind::Sampler => "sampler",
            ResourceKind::AccelStruct => "top-level acceleration structure",
        }
    }
}

/// How often a variable is expected to change.
///
/// The ordering is meaningful: static < mutable < dynamic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VariableClass {
    /// Bound once on the signature, shared by every binding instance.
    Static,
    /// Bound once per binding instance.
    Mutable,
    /// May be rebound freely.
    Dynamic,
}

bitflags::bitflags! {
    /// A set of variable classes, used to select which variables a manager exposes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct VariableClasses: u8 {
        const STATIC = 1 << 0;
        const MUTABLE = 1 << 1;
        const DYNAMIC = 1 << 2;
    }
}

impl VariableClasses {
    pub fn contains_class(self, class: VariableClass) -> bool {
        self.contains(VariableClasses::from(class))
    }
}

impl From<VariableClass> for VariableClasses {
    fn from(class: VariableClass) -> Self {
        match class {
            VariableClass::Static => VariableClasses::STATIC,
            VariableClass::Mutable => VariableClasses::MUTABLE,
            VariableClass::Dynamic => VariableClasses::DYNAMIC,
        }
    }
}

bitflags::bitflags! {
    /// Per-resource modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ResourceFlags: u8 {
        /// The buffer is never bound with a dynamic offset.
        const NO_DYNAMIC_BUFFERS = 1 << 0;
        /// The texture is sampled through a sampler combined with it in the shader.
        const COMBINED_SAMPLER = 1 << 1;
        /// The buffer view is a typed (formatted) view.
        const FORMATTED_BUFFER = 1 << 2;
        /// The array is sized at draw time.
        const RUNTIME_ARRAY = 1 << 3;
    }
}

/// One named resource of a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDesc {
    pub name: String,
    pub kind: ResourceKind,
    pub array_size: u32,
    pub stages: ShaderStages,
    pub class: VariableClass,
    pub flags: ResourceFlags,
    /// Name of the separate sampler this texture is sampled with.
    ///
    /// When `None` and combined texture samplers are enabled on the signature, the sampler is
    /// looked up by the suffix convention.
    pub sampler: Option<String>,
}

impl ResourceDesc {
    pub fn new(
        name: impl Into<String>,
        stages: ShaderStages,
        kind: ResourceKind,
        class: VariableClass,
    ) -> Self {
        ResourceDesc {
            name: name.into(),
            kind,
            array_size: 1,
            stages,
            class,
            flags: ResourceFlags::empty(),
            sampler: None,
        }
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn with_flags(mut self, flags: ResourceFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Pairs this texture with the named separate sampler.
    pub fn with_sampler(mut self, sampler: impl Into<String>) -> Self {
        self.sampler = Some(sampler.into());
        self
    }

    /// Whether two resources would produce the same layout, regardless of their names.
    pub fn is_compatible_with(&self, other: &ResourceDesc) -> bool {
        self.kind == other.kind
            && self.array_size == other.array_size
            && self.stages == other.stages
            && self.class == other.class
            && self.flags == other.flags
    }

    /// `name` for scalars, `name[index]` for arrays.
    pub fn print_name(&self, array_index: u32) -> String {
        if self.array_size > 1 {
            format!("{}[{}]", self.name, array_index)
        } else {
            self.name.clone()
        }
    }
}

/// A sampler baked into the layout.
///
/// It applies to every sampler resource with the same name in an overlapping stage, and to
/// combined-sampler textures of that name.  When combined texture samplers are enabled, the name
/// also matches `name + suffix`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImmutableSamplerDesc {
    pub stages: ShaderStages,
    pub name: String,
    pub desc: SamplerDesc,
}

impl ImmutableSamplerDesc {
    pub fn new(name: impl Into<String>, stages: ShaderStages, desc: SamplerDesc) -> Self {
        ImmutableSamplerDesc {
            stages,
            name: name.into(),
            desc,
        }
    }

    /// Whether this immutable sampler applies to a resource with the given name and stages.
    pub fn matches(&self, resource_name: &str, stages: ShaderStages, suffix: Option<&str>) -> bool {
        if !self.stages.intersects(stages) {
            return false;
        }
        if resource_name == self.name {
            return true;
        }
        match suffix {
            Some(suffix) => resource_name
                .strip_suffix(suffix)
                .is_some_and(|base| base == self.name),
            None => false,
        }
    }
}

/// Full configuration of a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureDesc {
    pub name: String,
    pub resources: Vec<ResourceDesc>,
    pub immutable_samplers: Vec<ImmutableSamplerDesc>,
    /// Position of this signature within a pipeline layout.
    pub binding_index: u8,
    /// Pair textures with samplers named `texture + combined_sampler_suffix`.
    pub use_combined_texture_samplers: bool,
    pub combined_sampler_suffix: String,
}

impl SignatureDesc {
    pub fn new(name: impl Into<String>) -> Self {
        SignatureDesc {
            name: name.into(),
            resources: Vec::new(),
            immutable_samplers: Vec::new(),
            binding_index: 0,
            use_combined_texture_samplers: false,
            combined_sampler_suffix: DEFAULT_COMBINED_SAMPLER_SUFFIX.to_string(),
        }
    }

    pub fn with_resource(mut self, resource: ResourceDesc) -> Self {
        self.resources.push(resource);
        self
    }

    pub fn with_immutable_sampler(mut self, sampler: ImmutableSamplerDesc) -> Self {
        self.immutable_samplers.push(sampler);
        self
    }

    pub fn with_binding_index(mut self, binding_index: u8) -> Self {
        self.binding_index = binding_index;
        self
    }

    pub fn with_combined_texture_samplers(mut self, suffix: impl Into<String>) -> Self {
        self.use_combined_texture_samplers = true;
        self.combined_sampler_suffix = suffix.into();
        self
    }

    /// The suffix in effect, or `None` when combined texture samplers are off.
    pub fn combined_suffix(&self) -> Option<&str> {
        if self.use_combined_texture_samplers {
            Some(&self.combined_sampler_suffix)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn immutable_sampler_matching() {
        let imtbl = ImmutableSamplerDesc::new("g_Tex", ShaderStages::PIXEL, SamplerDesc::default());
        assert!(imtbl.matches("g_Tex", ShaderStages::PIXEL | ShaderStages::VERTEX, None));
        assert!(!imtbl.matches("g_Tex", ShaderStages::VERTEX, None));
        assert!(!imtbl.matches("g_Tex_sampler", ShaderStages::PIXEL, None));
        assert!(imtbl.matches("g_Tex_sampler", ShaderStages::PIXEL, Some("_sampler")));
        assert!(!imtbl.matches("g_Tex2_sampler", ShaderStages::PIXEL, Some("_sampler")));
    }

    #[test]
    fn print_name_marks_arrays() {
        let scalar = ResourceDesc::new(
            "cb",
            ShaderStages::VERTEX,
            ResourceKind::ConstantBuffer,
            VariableClass::Static,
        );
        assert_eq!(scalar.print_name(0), "cb");
        let array = scalar.clone().with_array_size(4);
        assert_eq!(array.print_name(3), "cb[3]");
        assert!(!scalar.is_compatible_with(&array));
    }

    #[test]
    fn texture_allows_combined_sampler_flag() {
        assert!(ResourceKind::TextureSrv
            .allowed_flags()
            .contains(ResourceFlags::COMBINED_SAMPLER));
        assert!(!ResourceKind::BufferSrv
            .allowed_flags()
            .contains(ResourceFlags::COMBINED_SAMPLER));
        assert!(ResourceKind::InputAttachment.allowed_flags().is_empty());
    }
}
