// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Composition of several signatures into one pipeline layout.
//!
//! Signatures are ordered by binding index.  Each one is placed after everything the previous
//! ones occupy, using the backend's binding shift.

use std::sync::Arc;

use crate::bindings::error::PipelineLayoutError;
use crate::bindings::resource_binding_map::ResourceBindingMap;
use crate::bindings::signature::Signature;
use crate::bindings::visible_to::ShaderStages;
use crate::imp::Backend;

#[derive(Debug)]
pub struct PipelineLayout<B: Backend> {
    signatures: Vec<Arc<Signature<B>>>,
    base_bindings: Vec<B::BaseBindings>,
    total_bindings: B::BaseBindings,
}

impl<B: Backend> PipelineLayout<B> {
    pub fn new(signatures: impl IntoIterator<Item = Arc<Signature<B>>>) -> Result<Self, PipelineLayoutError> {
        let mut signatures: Vec<_> = signatures.into_iter().collect();
        signatures.sort_by_key(|s| s.layout().binding_index());
        for pair in signatures.windows(2) {
            if pair[0].layout().binding_index() == pair[1].layout().binding_index() {
                let err = PipelineLayoutError::DuplicateBindingIndex {
                    binding_index: pair[0].layout().binding_index(),
                    first: pair[0].name().to_string(),
                    second: pair[1].name().to_string(),
                };
                logwise::error_sync!("{err}", err = err.to_string());
                return Err(err);
            }
        }
        let mut base_bindings = Vec::with_capacity(signatures.len());
        let mut running = B::BaseBindings::default();
        for signature in &signatures {
            base_bindings.push(running.clone());
            signature.layout().shift_bindings(&mut running);
        }
        Ok(PipelineLayout {
            signatures,
            base_bindings,
            total_bindings: running,
        })
    }

    pub fn signature_count(&self) -> u32 {
        self.signatures.len() as u32
    }

    /// Signatures in binding-index order.
    pub fn signatures(&self) -> &[Arc<Signature<B>>] {
        &self.signatures
    }

    /// The signature with the given binding index.
    pub fn signature_by_binding_index(&self, binding_index: u8) -> Option<&Arc<Signature<B>>> {
        self.signatures
            .iter()
            .find(|s| s.layout().binding_index() == binding_index)
    }

    /// Where the `position`-th signature starts.
    pub fn base_bindings(&self, position: u32) -> Option<&B::BaseBindings> {
        self.base_bindings.get(position as usize)
    }

    /// Everything the layout occupies.
    pub fn total_bindings(&self) -> &B::BaseBindings {
        &self.total_bindings
    }

    /// Final locations of every resource visible to `stage`.
    pub fn resource_binding_map(&self, stage: ShaderStages) -> ResourceBindingMap {
        let mut map = ResourceBindingMap::new();
        for (signature, base) in self.signatures.iter().zip(&self.base_bindings) {
            signature
                .layout()
                .update_resource_binding_map(&mut map, stage, base);
        }
        map
    }
}
