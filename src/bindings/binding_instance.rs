// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
//! Per-draw resource bindings of a signature.

use std::sync::Arc;

use crate::bindings::error::BindErrors;
use crate::bindings::resource_cache::{CacheContentType, ResourceCache};
use crate::bindings::resource_desc::VariableClasses;
use crate::bindings::resource_mapping::{BindFlags, ResourceMapping};
use crate::bindings::signature::Signature;
use crate::bindings::variable_manager::{ShaderVariable, ShaderVariableMut, StageVariables};
use crate::bindings::visible_to::ShaderStages;
use crate::imp::Backend;

/// Holds the mutable and dynamic resources of one signature, plus a copy of its static ones.
///
/// Variables are exposed per stage.  A resource visible to several stages appears in each of
/// them; binding through any stage writes the same cache slots.
#[derive(Debug)]
pub struct BindingInstance<B: Backend> {
    signature: Arc<Signature<B>>,
    cache: ResourceCache<B>,
    variables: Vec<StageVariables<B>>,
    static_resources_initialized: bool,
}

impl<B: Backend> BindingInstance<B> {
    pub(crate) fn new(signature: &Arc<Signature<B>>) -> Self {
        let layout = signature.layout();
        let cache = ResourceCache::new(layout, CacheContentType::BindingInstance);
        let variables = StageVariables::for_stages(
            layout,
            VariableClasses::MUTABLE | VariableClasses::DYNAMIC,
            layout.active_stages(),
        );
        BindingInstance {
            signature: signature.clone(),
            cache,
            variables,
            static_resources_initialized: false,
        }
    }

    pub fn signature(&self) -> &Arc<Signature<B>> {
        &self.signature
    }

    pub fn cache(&self) -> &ResourceCache<B> {
        &self.cache
    }

    /// Direct cache access, e.g. to attach native binding sets.
    pub fn cache_mut(&mut self) -> &mut ResourceCache<B> {
        &mut self.cache
    }

    /// Copies the signature's static resources into this instance.
    ///
    /// Only the first call copies; later calls log a warning and do nothing.
    pub fn initialize_static_resources(&mut self) {
        if self.static_resources_initialized {
            logwise::warn_sync!(
                "static resources of a binding instance of {name} are already initialized",
                name = logwise::privacy::LogIt(self.signature.name())
            );
            return;
        }
        self.signature.copy_static_resources(&mut self.cache);
        self.static_resources_initialized = true;
    }

    pub fn static_resources_initialized(&self) -> bool {
        self.static_resources_initialized
    }

    fn stage(&self, stage: ShaderStages) -> Option<&StageVariables<B>> {
        self.variables.iter().find(|s| s.stage == stage)
    }

    pub fn variable_count(&self, stage: ShaderStages) -> u32 {
        self.stage(stage).map_or(0, |s| s.manager.variable_count())
    }

    pub fn variable(&self, stage: ShaderStages, index: u32) -> Option<ShaderVariable<'_, B>> {
        self.stage(stage)?.manager.variable(&self.cache, index)
    }

    pub fn variable_by_name(&self, stage: ShaderStages, name: &str) -> Option<ShaderVariable<'_, B>> {
        self.stage(stage)?.manager.variable_by_name(&self.cache, name)
    }

    pub fn variable_mut(&mut self, stage: ShaderStages, index: u32) -> Option<ShaderVariableMut<'_, B>> {
        let stage = self.variables.iter().find(|s| s.stage == stage)?;
        stage.manager.variable_mut(&mut self.cache, index)
    }

    pub fn variable_by_name_mut(
        &mut self,
        stage: ShaderStages,
        name: &str,
    ) -> Option<ShaderVariableMut<'_, B>> {
        let stage = self.variables.iter().find(|s| s.stage == stage)?;
        stage.manager.variable_by_name_mut(&mut self.cache, name)
    }

    /// Binds mutable and dynamic variables of every stage in `stages` from `mapping`.
    pub fn bind_resources(
        &mut self,
        stages: ShaderStages,
        mapping: &ResourceMapping,
        flags: BindFlags,
    ) -> Result<(), BindErrors> {
        let mut visited = vec![false; self.signature.resource_count() as usize];
        let mut errors = Vec::new();
        for stage in self.variables.iter().filter(|s| stages.intersects(s.stage)) {
            stage
                .manager
                .bind_unvisited(&mut self.cache, mapping, flags, &mut visited, &mut errors);
        }
        BindErrors::check(errors)
    }
}
