// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use crate::bindings::resource_desc::{ResourceDesc, ResourceFlags, ResourceKind};

/// Native descriptor type of a binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SeparateImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    StorageTexelBufferReadOnly,
    UniformBuffer,
    UniformBufferDynamic,
    StorageBuffer,
    StorageBufferReadOnly,
    StorageBufferDynamic,
    StorageBufferDynamicReadOnly,
    InputAttachment,
    AccelerationStructure,
}

impl DescriptorType {
    /// The descriptor type a resource description compiles to.
    pub fn for_resource(res: &ResourceDesc) -> Self {
        let dynamic = !res.flags.contains(ResourceFlags::NO_DYNAMIC_BUFFERS);
        let formatted = res.flags.contains(ResourceFlags::FORMATTED_BUFFER);
        match res.kind {
            ResourceKind::ConstantBuffer if dynamic => DescriptorType::UniformBufferDynamic,
            ResourceKind::ConstantBuffer => DescriptorType::UniformBuffer,
            ResourceKind::TextureSrv if res.flags.contains(ResourceFlags::COMBINED_SAMPLER) => {
                DescriptorType::CombinedImageSampler
            }
            ResourceKind::TextureSrv => DescriptorType::SeparateImage,
            ResourceKind::BufferSrv if formatted => DescriptorType::UniformTexelBuffer,
            ResourceKind::BufferSrv if dynamic => DescriptorType::StorageBufferDynamicReadOnly,
            ResourceKind::BufferSrv => DescriptorType::StorageBufferReadOnly,
            ResourceKind::TextureUav => DescriptorType::StorageImage,
            ResourceKind::BufferUav if formatted => DescriptorType::StorageTexelBuffer,
            ResourceKind::BufferUav if dynamic => DescriptorType::StorageBufferDynamic,
            ResourceKind::BufferUav => DescriptorType::StorageBuffer,
            ResourceKind::Sampler => DescriptorType::Sampler,
            ResourceKind::InputAttachment => DescriptorType::InputAttachment,
            ResourceKind::AccelStruct => DescriptorType::AccelerationStructure,
        }
    }

    /// Whether the binding takes a dynamic offset at bind time.
    pub fn has_dynamic_offset(self) -> bool {
        matches!(
            self,
            DescriptorType::UniformBufferDynamic
                | DescriptorType::StorageBufferDynamic
                | DescriptorType::StorageBufferDynamicReadOnly
        )
    }

    pub fn is_read_only(self) -> bool {
        !matches!(
            self,
            DescriptorType::StorageImage
                | DescriptorType::StorageTexelBuffer
                | DescriptorType::StorageBuffer
                | DescriptorType::StorageBufferDynamic
        )
    }
}

#[cfg(test)]
mod tests {
    use super::DescriptorType;
    use crate::bindings::resource_desc::{ResourceDesc, ResourceFlags, ResourceKind, VariableClass};
    use crate::bindings::visible_to::ShaderStages;

    fn res(kind: ResourceKind, flags: ResourceFlags) -> ResourceDesc {
        ResourceDesc::new("r", ShaderStages::COMPUTE, kind, VariableClass::Mutable).with_flags(flags)
    }

    #[test]
    fn buffers_default_to_dynamic_offsets() {
        let cb = DescriptorType::for_resource(&res(ResourceKind::ConstantBuffer, ResourceFlags::empty()));
        assert_eq!(cb, DescriptorType::UniformBufferDynamic);
        assert!(cb.has_dynamic_offset());
        let cb = DescriptorType::for_resource(&res(
            ResourceKind::ConstantBuffer,
            ResourceFlags::NO_DYNAMIC_BUFFERS,
        ));
        assert_eq!(cb, DescriptorType::UniformBuffer);
        assert!(!cb.has_dynamic_offset());
    }

    #[test]
    fn buffer_views() {
        assert_eq!(
            DescriptorType::for_resource(&res(ResourceKind::BufferSrv, ResourceFlags::FORMATTED_BUFFER)),
            DescriptorType::UniformTexelBuffer
        );
        assert_eq!(
            DescriptorType::for_resource(&res(ResourceKind::BufferUav, ResourceFlags::NO_DYNAMIC_BUFFERS)),
            DescriptorType::StorageBuffer
        );
        assert_eq!(
            DescriptorType::for_resource(&res(ResourceKind::BufferSrv, ResourceFlags::empty())),
            DescriptorType::StorageBufferDynamicReadOnly
        );
        assert!(!DescriptorType::StorageBuffer.is_read_only());
    }

    #[test]
    fn textures() {
        assert_eq!(
            DescriptorType::for_resource(&res(ResourceKind::TextureSrv, ResourceFlags::COMBINED_SAMPLER)),
            DescriptorType::CombinedImageSampler
        );
        assert_eq!(
            DescriptorType::for_resource(&res(ResourceKind::TextureSrv, ResourceFlags::empty())),
            DescriptorType::SeparateImage
        );
        assert_eq!(
            DescriptorType::for_resource(&res(ResourceKind::TextureUav, ResourceFlags::empty())),
            DescriptorType::StorageImage
        );
    }
}
