// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use std::fmt::Display;

use crate::bindings::visible_to::ShaderStages;
use crate::imp::descriptor_sets::DescriptorType;

/// A layout cannot be expressed as wgpu bind group layouts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    UnsupportedDescriptorType { name: String, descriptor_type: DescriptorType },
    UnsupportedStages { name: String, stages: ShaderStages },
    NoSuchSet(u32),
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::UnsupportedDescriptorType {
                name,
                descriptor_type,
            } => write!(f, "wgpu has no {:?} binding for resource '{}'", descriptor_type, name),
            Error::UnsupportedStages { name, stages } => {
                write!(f, "wgpu has no {:?} stages for resource '{}'", stages, name)
            }
            Error::NoSuchSet(set) => write!(f, "No such descriptor set {}", set),
        }
    }
}
