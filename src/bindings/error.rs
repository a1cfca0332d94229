// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Errors raised while building signatures and binding resources.

use std::fmt::Display;

use crate::bindings::resource_desc::{ResourceFlags, ResourceKind, VariableClass};
use crate::bindings::visible_to::ShaderStages;

/// A signature description could not be compiled into a layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("pipeline resource signature name must not be empty")]
    EmptyName,
    #[error("resource #{index} of signature '{signature}' has an empty name")]
    EmptyResourceName { signature: String, index: u32 },
    #[error("resource '{name}' is declared more than once in overlapping shader stages")]
    DuplicateResource { name: String },
    #[error("resource '{name}' has zero array size")]
    ZeroArraySize { name: String },
    #[error("resource '{name}' is not visible to any shader stage")]
    NoShaderStages { name: String },
    #[error("flags {flags:?} are not valid for {kind:?} resource '{name}'")]
    InvalidFlags {
        name: String,
        kind: ResourceKind,
        flags: ResourceFlags,
    },
    #[error("{kind:?} resource '{name}' names a sampler, but only texture SRVs may be combined with one")]
    InvalidSamplerReference { name: String, kind: ResourceKind },
    #[error("texture '{texture}' is combined with sampler '{sampler}', which is not declared in the same stages")]
    UnknownSampler { texture: String, sampler: String },
    #[error("texture '{texture}' is combined with '{sampler}', which is a {kind:?} resource rather than a sampler")]
    NotASampler {
        texture: String,
        sampler: String,
        kind: ResourceKind,
    },
    #[error("sampler '{sampler}' must be visible to every stage of texture '{texture}'")]
    SamplerStagesMismatch { texture: String, sampler: String },
    #[error("sampler '{sampler}' ({sampler_class:?}) and texture '{texture}' ({texture_class:?}) must have the same variable class")]
    SamplerClassMismatch {
        texture: String,
        sampler: String,
        texture_class: VariableClass,
        sampler_class: VariableClass,
    },
    #[error("sampler '{sampler}' has array size {sampler_array_size}; combined with texture '{texture}' it must be 1 or {texture_array_size}")]
    SamplerArraySizeMismatch {
        texture: String,
        sampler: String,
        texture_array_size: u32,
        sampler_array_size: u32,
    },
    #[error("immutable sampler #{index} has an empty name")]
    EmptyImmutableSamplerName { index: u32 },
    #[error("immutable sampler '{name}' is not visible to any shader stage")]
    ImmutableSamplerNoStages { name: String },
    #[error("immutable sampler '{name}' does not match any sampler or combined texture of the signature")]
    UnresolvedImmutableSampler { name: String },
    #[error("the {backend} backend does not support {what} (resource '{name}')")]
    Unsupported {
        backend: &'static str,
        name: String,
        what: &'static str,
    },
    #[error("the {backend} backend ran out of {range} slots in the {stage:?} stage: '{name}' needs {required}, the limit is {limit}")]
    SlotRangeExhausted {
        backend: &'static str,
        name: String,
        range: &'static str,
        stage: ShaderStages,
        required: u32,
        limit: u32,
    },
    #[error("runtime-sized array '{name}' must be the last binding of descriptor set {set}")]
    RuntimeArrayNotLast { name: String, set: u32 },
    #[error("resource '{name}' overflows the descriptor count of set {set}")]
    DescriptorCountOverflow { name: String, set: u32 },
}

/// A single resource could not be bound.
///
/// Every variant is logged when it is produced, then returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    #[error("failed to bind {object_type} '{object}' to variable '{variable}': {expected} is expected")]
    TypeMismatch {
        variable: String,
        object: String,
        object_type: &'static str,
        expected: &'static str,
    },
    #[error("a different resource is already bound to {class:?} variable '{variable}'; declare it dynamic or use another binding instance")]
    StaleBinding {
        variable: String,
        class: VariableClass,
    },
    #[error("{class:?} variable '{variable}' was reset to null; only dynamic variables may be unbound")]
    ResetNonDynamic {
        variable: String,
        class: VariableClass,
    },
    #[error("array index {index} is out of range for variable '{variable}' of array size {array_size}")]
    ArrayIndexOutOfRange {
        variable: String,
        index: u32,
        array_size: u32,
    },
    #[error("variable '{variable}' is an immutable sampler and cannot be bound")]
    ImmutableSampler { variable: String },
    #[error("texture view '{view}' bound to '{texture}' has no sampler for combined sampler '{sampler}'")]
    MissingSampler {
        texture: String,
        view: String,
        sampler: String,
    },
    #[error("no resource named '{variable}' was found in the resource mapping")]
    UnresolvedResource { variable: String },
}

impl BindError {
    /// Logs the error and hands it back.
    pub(crate) fn report(self) -> Self {
        logwise::error_sync!("{err}", err = self.to_string());
        self
    }
}

/// Every error produced by a batch bind.
///
/// Batch binds keep going after a failure, so one call can produce several errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindErrors(Vec<BindError>);

impl BindErrors {
    /// `Ok` when the list is empty.
    pub(crate) fn check(errors: Vec<BindError>) -> Result<(), BindErrors> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(BindErrors(errors))
        }
    }
    pub fn errors(&self) -> &[BindError] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn into_vec(self) -> Vec<BindError> {
        self.0
    }
}

impl Display for BindErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_slice() {
            [] => write!(f, "no binding errors"),
            [only] => write!(f, "{}", only),
            [first, rest @ ..] => write!(f, "{} (and {} more)", first, rest.len()),
        }
    }
}

impl std::error::Error for BindErrors {}

impl From<BindError> for BindErrors {
    fn from(value: BindError) -> Self {
        BindErrors(vec![value])
    }
}

impl IntoIterator for BindErrors {
    type Item = BindError;
    type IntoIter = std::vec::IntoIter<BindError>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Signatures could not be composed into a pipeline layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineLayoutError {
    #[error("signatures '{first}' and '{second}' both use binding index {binding_index}")]
    DuplicateBindingIndex {
        binding_index: u8,
        first: String,
        second: String,
    },
}
