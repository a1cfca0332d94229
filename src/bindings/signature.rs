// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Pipeline resource signatures.

A [`SignatureLayout`] is the immutable, compiled form of a [`SignatureDesc`]: every resource
carries its backend location, the index of the separate sampler it is combined with and the
index of the immutable sampler baked into it.  Building a layout runs the same validation and
sampler resolution for every backend; only the location assignment is backend specific.

A [`Signature`] owns a layout together with the cache of static resources and the static
variable managers.  Binding instances created from a signature share its layout and copy its
static resources.

```
use pipeline_signatures::bindings::resource_desc::*;
use pipeline_signatures::bindings::signature::Signature;
use pipeline_signatures::bindings::visible_to::ShaderStages;
use pipeline_signatures::DefaultBackend;

let desc = SignatureDesc::new("forward")
    .with_resource(ResourceDesc::new("g_Camera", ShaderStages::VERTEX, ResourceKind::ConstantBuffer, VariableClass::Static))
    .with_resource(ResourceDesc::new("g_Tex", ShaderStages::PIXEL, ResourceKind::TextureSrv, VariableClass::Mutable));
let signature = Signature::<DefaultBackend>::new(desc).unwrap();
assert_eq!(signature.static_variable_count(ShaderStages::VERTEX), 1);
assert_eq!(signature.static_variable_count(ShaderStages::PIXEL), 0);
```
*/

use std::sync::Arc;

use crate::bindings::binding_instance::BindingInstance;
use crate::bindings::error::{BindErrors, SignatureError};
use crate::bindings::objects::Sampler;
use crate::bindings::resource_binding_map::ResourceBindingMap;
use crate::bindings::resource_cache::{CacheContentType, ResourceCache};
use crate::bindings::resource_desc::{
    ImmutableSamplerDesc, ResourceDesc, ResourceFlags, ResourceKind, SignatureDesc,
    VariableClass, VariableClasses,
};
use crate::bindings::resource_mapping::{BindFlags, ResourceMapping};
use crate::bindings::variable_manager::{ShaderVariable, ShaderVariableMut, StageVariables};
use crate::bindings::visible_to::ShaderStages;
use crate::imp::Backend;

/// Sampler pairings computed before any backend runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedResources {
    assigned_sampler: Vec<Option<u32>>,
    immutable_sampler: Vec<Option<u32>>,
    immutable_array_sizes: Vec<u32>,
}

impl ResolvedResources {
    /// The separate sampler combined with texture `resource_index`.
    pub fn assigned_sampler(&self, resource_index: u32) -> Option<u32> {
        self.assigned_sampler[resource_index as usize]
    }

    /// The immutable sampler baked into `resource_index`.
    ///
    /// For a texture this is the immutable sampler of its assigned sampler, or the one matched
    /// by name for a combined-sampler texture.
    pub fn immutable_sampler(&self, resource_index: u32) -> Option<u32> {
        self.immutable_sampler[resource_index as usize]
    }

    /// The largest array size among the resources an immutable sampler applies to.
    pub fn immutable_array_size(&self, sampler_index: u32) -> u32 {
        self.immutable_array_sizes[sampler_index as usize]
    }
}

/// What a backend produces for a signature.
#[derive(Debug, Clone)]
pub struct NativeLayout<B: Backend> {
    /// One per resource, in declaration order.
    pub locations: Vec<B::Location>,
    /// One per immutable sampler, in declaration order.
    pub immutable_samplers: Vec<B::SamplerBindPoints>,
    pub totals: B::Totals,
}

/// Compiled per-resource attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceAttribs<B: Backend> {
    pub location: B::Location,
    sampler_index: Option<u32>,
    immutable_sampler_index: Option<u32>,
    combined_with_texture: bool,
}

impl<B: Backend> ResourceAttribs<B> {
    pub fn is_sampler_assigned(&self) -> bool {
        self.sampler_index.is_some()
    }
    pub fn sampler_index(&self) -> Option<u32> {
        self.sampler_index
    }
    pub fn is_immutable_sampler_assigned(&self) -> bool {
        self.immutable_sampler_index.is_some()
    }
    pub fn immutable_sampler_index(&self) -> Option<u32> {
        self.immutable_sampler_index
    }
    /// For a sampler: some texture is combined with it.
    pub fn is_combined_with_texture(&self) -> bool {
        self.combined_with_texture
    }
}

/// Compiled immutable sampler.
#[derive(Debug, Clone)]
pub struct ImmutableSamplerAttribs<B: Backend> {
    pub sampler: Arc<Sampler>,
    pub array_size: u32,
    pub bind_points: B::SamplerBindPoints,
}

impl<B: Backend> PartialEq for ImmutableSamplerAttribs<B> {
    fn eq(&self, other: &Self) -> bool {
        self.sampler.desc() == other.sampler.desc()
            && self.array_size == other.array_size
            && self.bind_points == other.bind_points
    }
}

#[derive(Debug)]
pub struct SignatureLayout<B: Backend> {
    desc: SignatureDesc,
    attribs: Box<[ResourceAttribs<B>]>,
    immutable_samplers: Box<[ImmutableSamplerAttribs<B>]>,
    totals: B::Totals,
    active_stages: ShaderStages,
}

fn validate(desc: &SignatureDesc) -> Result<(), SignatureError> {
    if desc.name.is_empty() {
        return Err(SignatureError::EmptyName);
    }
    for (index, res) in desc.resources.iter().enumerate() {
        if res.name.is_empty() {
            return Err(SignatureError::EmptyResourceName {
                signature: desc.name.clone(),
                index: index as u32,
            });
        }
        if res.array_size == 0 {
            return Err(SignatureError::ZeroArraySize {
                name: res.name.clone(),
            });
        }
        if res.stages.is_empty() {
            return Err(SignatureError::NoShaderStages {
                name: res.name.clone(),
            });
        }
        if !res.kind.allowed_flags().contains(res.flags) {
            return Err(SignatureError::InvalidFlags {
                name: res.name.clone(),
                kind: res.kind,
                flags: res.flags,
            });
        }
        if res.sampler.is_some() && res.kind != ResourceKind::TextureSrv {
            return Err(SignatureError::InvalidSamplerReference {
                name: res.name.clone(),
                kind: res.kind,
            });
        }
        let duplicate = desc.resources[index + 1..]
            .iter()
            .any(|other| other.name == res.name && other.stages.intersects(res.stages));
        if duplicate {
            return Err(SignatureError::DuplicateResource {
                name: res.name.clone(),
            });
        }
    }
    for (index, imtbl) in desc.immutable_samplers.iter().enumerate() {
        if imtbl.name.is_empty() {
            return Err(SignatureError::EmptyImmutableSamplerName {
                index: index as u32,
            });
        }
        if imtbl.stages.is_empty() {
            return Err(SignatureError::ImmutableSamplerNoStages {
                name: imtbl.name.clone(),
            });
        }
    }
    Ok(())
}

/// Finds the separate sampler for texture `res`, if any.
fn assign_sampler(
    desc: &SignatureDesc,
    res: &ResourceDesc,
) -> Result<Option<u32>, SignatureError> {
    let (sampler_name, explicit) = match (&res.sampler, desc.combined_suffix()) {
        (Some(name), _) => (name.clone(), true),
        (None, Some(suffix)) if res.kind == ResourceKind::TextureSrv => {
            (format!("{}{}", res.name, suffix), false)
        }
        _ => return Ok(None),
    };
    let found = desc
        .resources
        .iter()
        .enumerate()
        .find(|(_, other)| other.name == sampler_name && other.stages.intersects(res.stages));
    let Some((sampler_index, sampler)) = found else {
        if explicit {
            return Err(SignatureError::UnknownSampler {
                texture: res.name.clone(),
                sampler: sampler_name,
            });
        }
        return Ok(None);
    };
    if sampler.kind != ResourceKind::Sampler {
        if explicit {
            return Err(SignatureError::NotASampler {
                texture: res.name.clone(),
                sampler: sampler_name,
                kind: sampler.kind,
            });
        }
        return Ok(None);
    }
    if !sampler.stages.contains(res.stages) {
        return Err(SignatureError::SamplerStagesMismatch {
            texture: res.name.clone(),
            sampler: sampler_name,
        });
    }
    if sampler.class != res.class {
        return Err(SignatureError::SamplerClassMismatch {
            texture: res.name.clone(),
            sampler: sampler_name,
            texture_class: res.class,
            sampler_class: sampler.class,
        });
    }
    if sampler.array_size != 1 && sampler.array_size != res.array_size {
        return Err(SignatureError::SamplerArraySizeMismatch {
            texture: res.name.clone(),
            sampler: sampler_name,
            texture_array_size: res.array_size,
            sampler_array_size: sampler.array_size,
        });
    }
    Ok(Some(sampler_index as u32))
}

fn find_immutable(
    samplers: &[ImmutableSamplerDesc],
    res: &ResourceDesc,
    suffix: Option<&str>,
) -> Option<u32> {
    samplers
        .iter()
        .position(|imtbl| imtbl.matches(&res.name, res.stages, suffix))
        .map(|i| i as u32)
}

fn resolve(desc: &SignatureDesc) -> Result<ResolvedResources, SignatureError> {
    let count = desc.resources.len();
    let suffix = desc.combined_suffix();
    let mut assigned_sampler = vec![None; count];
    for (r, res) in desc.resources.iter().enumerate() {
        if res.kind == ResourceKind::TextureSrv {
            assigned_sampler[r] = assign_sampler(desc, res)?;
        }
    }

    let mut immutable_sampler = vec![None; count];
    let mut immutable_array_sizes = vec![1; desc.immutable_samplers.len()];
    let mut matched = vec![false; desc.immutable_samplers.len()];
    let mut record = |immutable_sampler: &mut [Option<u32>], r: usize, i: u32, array_size: u32| {
        immutable_sampler[r] = Some(i);
        let size = &mut immutable_array_sizes[i as usize];
        *size = (*size).max(array_size);
        matched[i as usize] = true;
    };
    for (r, res) in desc.resources.iter().enumerate() {
        if res.kind == ResourceKind::Sampler {
            if let Some(i) = find_immutable(&desc.immutable_samplers, res, suffix) {
                record(&mut immutable_sampler, r, i, res.array_size);
            }
        }
    }
    for (r, res) in desc.resources.iter().enumerate() {
        if res.kind != ResourceKind::TextureSrv {
            continue;
        }
        match assigned_sampler[r] {
            Some(s) => immutable_sampler[r] = immutable_sampler[s as usize],
            None if res.flags.contains(ResourceFlags::COMBINED_SAMPLER) => {
                if let Some(i) = find_immutable(&desc.immutable_samplers, res, None) {
                    record(&mut immutable_sampler, r, i, res.array_size);
                }
            }
            None => {}
        }
    }
    if let Some(unmatched) = matched.iter().position(|m| !m) {
        return Err(SignatureError::UnresolvedImmutableSampler {
            name: desc.immutable_samplers[unmatched].name.clone(),
        });
    }
    Ok(ResolvedResources {
        assigned_sampler,
        immutable_sampler,
        immutable_array_sizes,
    })
}

impl<B: Backend> SignatureLayout<B> {
    /// Validates `desc`, resolves its samplers and assigns backend locations.
    pub fn new(desc: SignatureDesc) -> Result<Self, SignatureError> {
        Self::build(desc).inspect_err(|e| {
            logwise::error_sync!("failed to create signature: {err}", err = e.to_string());
        })
    }

    fn build(desc: SignatureDesc) -> Result<Self, SignatureError> {
        validate(&desc)?;
        let resolved = resolve(&desc)?;
        let native = B::create_layout(&desc, &resolved)?;
        debug_assert_eq!(native.locations.len(), desc.resources.len());
        debug_assert_eq!(native.immutable_samplers.len(), desc.immutable_samplers.len());

        let mut combined = vec![false; desc.resources.len()];
        for s in resolved.assigned_sampler.iter().flatten() {
            combined[*s as usize] = true;
        }
        let attribs = native
            .locations
            .into_iter()
            .enumerate()
            .map(|(r, location)| ResourceAttribs {
                location,
                sampler_index: resolved.assigned_sampler[r],
                immutable_sampler_index: resolved.immutable_sampler[r],
                combined_with_texture: combined[r],
            })
            .collect();
        let immutable_samplers = desc
            .immutable_samplers
            .iter()
            .zip(native.immutable_samplers)
            .enumerate()
            .map(|(i, (imtbl, bind_points))| ImmutableSamplerAttribs {
                sampler: Sampler::new(imtbl.name.clone(), imtbl.desc),
                array_size: resolved.immutable_array_sizes[i],
                bind_points,
            })
            .collect();
        let active_stages = desc
            .resources
            .iter()
            .fold(ShaderStages::empty(), |acc, res| acc | res.stages);
        logwise::trace_sync!(
            "created {backend} signature {name} with {count} resources",
            backend = B::NAME.to_string(),
            name = logwise::privacy::LogIt(&desc.name),
            count = desc.resources.len()
        );
        Ok(SignatureLayout {
            desc,
            attribs,
            immutable_samplers,
            totals: native.totals,
            active_stages,
        })
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }
    pub fn desc(&self) -> &SignatureDesc {
        &self.desc
    }
    pub fn binding_index(&self) -> u8 {
        self.desc.binding_index
    }
    pub fn resource_count(&self) -> u32 {
        self.attribs.len() as u32
    }
    /// Panics when `resource_index` is out of range.
    pub fn resource_desc(&self, resource_index: u32) -> &ResourceDesc {
        &self.desc.resources[resource_index as usize]
    }
    /// Panics when `resource_index` is out of range.
    pub fn resource_attribs(&self, resource_index: u32) -> &ResourceAttribs<B> {
        &self.attribs[resource_index as usize]
    }
    pub fn immutable_sampler_count(&self) -> u32 {
        self.immutable_samplers.len() as u32
    }
    /// Panics when `sampler_index` is out of range.
    pub fn immutable_sampler_desc(&self, sampler_index: u32) -> &ImmutableSamplerDesc {
        &self.desc.immutable_samplers[sampler_index as usize]
    }
    /// Panics when `sampler_index` is out of range.
    pub fn immutable_sampler_attribs(&self, sampler_index: u32) -> &ImmutableSamplerAttribs<B> {
        &self.immutable_samplers[sampler_index as usize]
    }
    pub fn totals(&self) -> &B::Totals {
        &self.totals
    }
    /// Union of the stages of every resource.
    pub fn active_stages(&self) -> ShaderStages {
        self.active_stages
    }
    pub fn uses_combined_texture_samplers(&self) -> bool {
        self.desc.use_combined_texture_samplers
    }
    pub fn combined_sampler_suffix(&self) -> Option<&str> {
        self.desc.combined_suffix()
    }

    /// Union of the stages of every resource in one of `classes`.
    pub fn stages_of(&self, classes: VariableClasses) -> ShaderStages {
        self.desc
            .resources
            .iter()
            .filter(|res| classes.contains_class(res.class))
            .fold(ShaderStages::empty(), |acc, res| acc | res.stages)
    }

    /// Whether `resource_index` is exposed as a shader variable.
    ///
    /// Samplers that are immutable or combined with a texture are bound through other paths.
    pub fn is_variable(&self, resource_index: u32) -> bool {
        let res = self.resource_desc(resource_index);
        let attribs = self.resource_attribs(resource_index);
        !(res.kind == ResourceKind::Sampler
            && (attribs.is_immutable_sampler_assigned() || attribs.is_combined_with_texture()))
    }

    /// Variable resources of the given classes visible to any of `stages`, in declaration order.
    pub fn variable_resources(
        &self,
        classes: VariableClasses,
        stages: ShaderStages,
    ) -> impl Iterator<Item = u32> + '_ {
        (0..self.resource_count()).filter(move |&r| {
            let res = self.resource_desc(r);
            classes.contains_class(res.class) && res.stages.intersects(stages) && self.is_variable(r)
        })
    }

    /// Whether pipelines built against `other` can use this layout's bindings.
    ///
    /// Names are ignored.
    pub fn is_compatible_with(&self, other: &SignatureLayout<B>) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.binding_index() == other.binding_index()
            && self.desc.resources.len() == other.desc.resources.len()
            && self.immutable_samplers.len() == other.immutable_samplers.len()
            && self
                .desc
                .resources
                .iter()
                .zip(&other.desc.resources)
                .all(|(a, b)| a.is_compatible_with(b))
            && self.attribs == other.attribs
            && self.immutable_samplers == other.immutable_samplers
            && self
                .desc
                .immutable_samplers
                .iter()
                .zip(&other.desc.immutable_samplers)
                .all(|(a, b)| a.stages == b.stages && a.desc == b.desc)
    }

    /// See [`Backend::shift_bindings`].
    pub fn shift_bindings(&self, bindings: &mut B::BaseBindings) {
        B::shift_bindings(self, bindings)
    }

    /// See [`Backend::update_resource_binding_map`].
    pub fn update_resource_binding_map(
        &self,
        map: &mut ResourceBindingMap,
        stage: ShaderStages,
        base: &B::BaseBindings,
    ) {
        B::update_resource_binding_map(self, map, stage, base)
    }
}

/// A signature with its static resources.
#[derive(Debug)]
pub struct Signature<B: Backend> {
    layout: Arc<SignatureLayout<B>>,
    static_cache: ResourceCache<B>,
    static_variables: Vec<StageVariables<B>>,
}

impl<B: Backend> Signature<B> {
    pub fn new(desc: SignatureDesc) -> Result<Self, SignatureError> {
        let layout = Arc::new(SignatureLayout::new(desc)?);
        let static_cache = ResourceCache::new(&layout, CacheContentType::Signature);
        let static_stages = layout.stages_of(VariableClasses::STATIC);
        let static_variables =
            StageVariables::for_stages(&layout, VariableClasses::STATIC, static_stages);
        Ok(Signature {
            layout,
            static_cache,
            static_variables,
        })
    }

    pub fn layout(&self) -> &Arc<SignatureLayout<B>> {
        &self.layout
    }
    pub fn name(&self) -> &str {
        self.layout.name()
    }
    pub fn resource_count(&self) -> u32 {
        self.layout.resource_count()
    }
    pub fn resource_desc(&self, resource_index: u32) -> &ResourceDesc {
        self.layout.resource_desc(resource_index)
    }
    pub fn resource_attribs(&self, resource_index: u32) -> &ResourceAttribs<B> {
        self.layout.resource_attribs(resource_index)
    }
    pub fn immutable_sampler_count(&self) -> u32 {
        self.layout.immutable_sampler_count()
    }
    pub fn immutable_sampler_attribs(&self, sampler_index: u32) -> &ImmutableSamplerAttribs<B> {
        self.layout.immutable_sampler_attribs(sampler_index)
    }
    pub fn is_compatible_with(&self, other: &Signature<B>) -> bool {
        self.layout.is_compatible_with(&other.layout)
    }

    /// The cache of static resources.
    pub fn static_cache(&self) -> &ResourceCache<B> {
        &self.static_cache
    }

    fn static_stage(&self, stage: ShaderStages) -> Option<&StageVariables<B>> {
        self.static_variables.iter().find(|s| s.stage == stage)
    }

    /// Number of static variables in `stage`, or 0 if the stage has none.
    pub fn static_variable_count(&self, stage: ShaderStages) -> u32 {
        self.static_stage(stage)
            .map_or(0, |s| s.manager.variable_count())
    }

    pub fn static_variable(&self, stage: ShaderStages, index: u32) -> Option<ShaderVariable<'_, B>> {
        self.static_stage(stage)?
            .manager
            .variable(&self.static_cache, index)
    }

    pub fn static_variable_by_name(
        &self,
        stage: ShaderStages,
        name: &str,
    ) -> Option<ShaderVariable<'_, B>> {
        self.static_stage(stage)?
            .manager
            .variable_by_name(&self.static_cache, name)
    }

    pub fn static_variable_mut(
        &mut self,
        stage: ShaderStages,
        index: u32,
    ) -> Option<ShaderVariableMut<'_, B>> {
        let stage = self.static_variables.iter().find(|s| s.stage == stage)?;
        stage.manager.variable_mut(&mut self.static_cache, index)
    }

    pub fn static_variable_by_name_mut(
        &mut self,
        stage: ShaderStages,
        name: &str,
    ) -> Option<ShaderVariableMut<'_, B>> {
        let stage = self.static_variables.iter().find(|s| s.stage == stage)?;
        stage.manager.variable_by_name_mut(&mut self.static_cache, name)
    }

    /// Binds static variables of every stage in `stages` from `mapping`.
    pub fn bind_static_resources(
        &mut self,
        stages: ShaderStages,
        mapping: &ResourceMapping,
        flags: BindFlags,
    ) -> Result<(), BindErrors> {
        let mut visited = vec![false; self.layout.resource_count() as usize];
        let mut errors = Vec::new();
        for stage in self
            .static_variables
            .iter()
            .filter(|s| stages.intersects(s.stage))
        {
            stage
                .manager
                .bind_unvisited(&mut self.static_cache, mapping, flags, &mut visited, &mut errors);
        }
        BindErrors::check(errors)
    }

    /// Copies every static resource into a binding-instance cache of this signature.
    pub fn copy_static_resources(&self, dst: &mut ResourceCache<B>) {
        debug_assert!(Arc::ptr_eq(&self.layout, dst.layout()));
        debug_assert_eq!(dst.content_type(), CacheContentType::BindingInstance);
        for r in 0..self.layout.resource_count() {
            let res = self.layout.resource_desc(r);
            if res.class != VariableClass::Static {
                continue;
            }
            for a in 0..res.array_size {
                let src = self.static_cache.addresses_of(r, a);
                let Some(first) = src.first() else {
                    continue;
                };
                match self.static_cache.slot(*first).object() {
                    Some(object) => {
                        for address in dst.addresses_of(r, a) {
                            dst.set_object(address, Some(object.clone()));
                        }
                    }
                    None => {
                        logwise::warn_sync!(
                            "no resource is bound to static variable {name} of signature {signature}",
                            name = res.print_name(a),
                            signature = logwise::privacy::LogIt(self.name())
                        );
                    }
                }
            }
        }
    }

    /// Creates a binding instance holding the mutable and dynamic resources of this signature.
    pub fn create_binding_instance(self: &Arc<Self>) -> BindingInstance<B> {
        BindingInstance::new(self)
    }
}
