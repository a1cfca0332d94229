// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Shader variables.

A [`ShaderVariableManager`] exposes the resources of one stage and a set of variable classes as
indexed, named variables.  Variables are grouped by resource kind in a fixed order
(constant buffers, texture SRVs, texture UAVs, buffer SRVs, buffer UAVs, samplers, input
attachments, acceleration structures).  Within a group they keep declaration order.  Indices are
dense across groups.

The manager does not own the cache it binds into.  A signature pairs its static managers with
its own cache; a binding instance pairs its managers with the instance cache.
*/

use std::fmt::Debug;
use std::sync::Arc;

use crate::bindings::bind_resource;
use crate::bindings::error::{BindError, BindErrors};
use crate::bindings::objects::DeviceObject;
use crate::bindings::resource_cache::ResourceCache;
use crate::bindings::resource_desc::{ResourceDesc, ResourceKind, VariableClass, VariableClasses};
use crate::bindings::resource_mapping::{BindFlags, ResourceMapping};
use crate::bindings::signature::SignatureLayout;
use crate::bindings::visible_to::ShaderStages;
use crate::imp::Backend;

const REGION_ORDER: [ResourceKind; 8] = [
    ResourceKind::ConstantBuffer,
    ResourceKind::TextureSrv,
    ResourceKind::TextureUav,
    ResourceKind::BufferSrv,
    ResourceKind::BufferUav,
    ResourceKind::Sampler,
    ResourceKind::InputAttachment,
    ResourceKind::AccelStruct,
];
const REGION_COUNT: usize = REGION_ORDER.len();

fn region_of(kind: ResourceKind) -> usize {
    match kind {
        ResourceKind::ConstantBuffer => 0,
        ResourceKind::TextureSrv => 1,
        ResourceKind::TextureUav => 2,
        ResourceKind::BufferSrv => 3,
        ResourceKind::BufferUav => 4,
        ResourceKind::Sampler => 5,
        ResourceKind::InputAttachment => 6,
        ResourceKind::AccelStruct => 7,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct VariableRecord {
    resource_index: u32,
    variable_index: u32,
}

#[derive(Debug)]
pub struct ShaderVariableManager<B: Backend> {
    layout: Arc<SignatureLayout<B>>,
    classes: VariableClasses,
    stages: ShaderStages,
    regions: [Box<[VariableRecord]>; REGION_COUNT],
    region_starts: [u32; REGION_COUNT],
    variable_count: u32,
}

impl<B: Backend> ShaderVariableManager<B> {
    /// Builds the variables of `classes` visible to any of `stages`.
    pub fn new(layout: &Arc<SignatureLayout<B>>, classes: VariableClasses, stages: ShaderStages) -> Self {
        let mut counts = [0usize; REGION_COUNT];
        for r in layout.variable_resources(classes, stages) {
            counts[region_of(layout.resource_desc(r).kind)] += 1;
        }
        let mut region_starts = [0u32; REGION_COUNT];
        let mut running = 0u32;
        for (start, count) in region_starts.iter_mut().zip(counts) {
            *start = running;
            running += count as u32;
        }

        let mut regions: [Vec<VariableRecord>; REGION_COUNT] =
            std::array::from_fn(|i| Vec::with_capacity(counts[i]));
        for r in layout.variable_resources(classes, stages) {
            let region = region_of(layout.resource_desc(r).kind);
            let variable_index = region_starts[region] + regions[region].len() as u32;
            regions[region].push(VariableRecord {
                resource_index: r,
                variable_index,
            });
        }
        debug_assert!(regions.iter().zip(counts).all(|(v, c)| v.len() == c));

        ShaderVariableManager {
            layout: layout.clone(),
            classes,
            stages,
            regions: regions.map(Vec::into_boxed_slice),
            region_starts,
            variable_count: running,
        }
    }

    pub fn layout(&self) -> &Arc<SignatureLayout<B>> {
        &self.layout
    }
    pub fn classes(&self) -> VariableClasses {
        self.classes
    }
    pub fn stages(&self) -> ShaderStages {
        self.stages
    }
    pub fn variable_count(&self) -> u32 {
        self.variable_count
    }

    /// Number of variables of one resource kind.
    pub fn variable_count_of(&self, kind: ResourceKind) -> u32 {
        self.regions[region_of(kind)].len() as u32
    }

    fn record(&self, index: u32) -> Option<VariableRecord> {
        let region = self
            .region_starts
            .iter()
            .rposition(|&start| start <= index && index < self.variable_count)?;
        let offset = index - self.region_starts[region];
        self.regions[region].get(offset as usize).copied()
    }

    fn record_by_name(&self, name: &str) -> Option<VariableRecord> {
        self.regions
            .iter()
            .flat_map(|region| region.iter())
            .find(|record| self.layout.resource_desc(record.resource_index).name == name)
            .copied()
    }

    fn check_cache(&self, cache: &ResourceCache<B>) {
        debug_assert!(
            Arc::ptr_eq(&self.layout, cache.layout()),
            "cache belongs to a different signature"
        );
    }

    fn invalid_index(&self, index: u32) {
        logwise::error_sync!(
            "{index} is not a valid variable index; the manager has {count} variables",
            index = index,
            count = self.variable_count
        );
    }

    fn unknown_name(&self, name: &str) {
        logwise::error_sync!(
            "no variable named {name} in this manager",
            name = logwise::privacy::LogIt(name)
        );
    }

    pub fn variable<'a>(&'a self, cache: &'a ResourceCache<B>, index: u32) -> Option<ShaderVariable<'a, B>> {
        self.check_cache(cache);
        let Some(record) = self.record(index) else {
            self.invalid_index(index);
            return None;
        };
        Some(ShaderVariable {
            manager: self,
            cache,
            record,
        })
    }

    pub fn variable_by_name<'a>(
        &'a self,
        cache: &'a ResourceCache<B>,
        name: &str,
    ) -> Option<ShaderVariable<'a, B>> {
        self.check_cache(cache);
        let Some(record) = self.record_by_name(name) else {
            self.unknown_name(name);
            return None;
        };
        Some(ShaderVariable {
            manager: self,
            cache,
            record,
        })
    }

    pub fn variable_mut<'a>(
        &'a self,
        cache: &'a mut ResourceCache<B>,
        index: u32,
    ) -> Option<ShaderVariableMut<'a, B>> {
        self.check_cache(cache);
        let Some(record) = self.record(index) else {
            self.invalid_index(index);
            return None;
        };
        Some(ShaderVariableMut {
            manager: self,
            cache,
            record,
        })
    }

    pub fn variable_by_name_mut<'a>(
        &'a self,
        cache: &'a mut ResourceCache<B>,
        name: &str,
    ) -> Option<ShaderVariableMut<'a, B>> {
        self.check_cache(cache);
        let Some(record) = self.record_by_name(name) else {
            self.unknown_name(name);
            return None;
        };
        Some(ShaderVariableMut {
            manager: self,
            cache,
            record,
        })
    }

    /// Computes the index of `variable` from its resource and this manager's grouping.
    ///
    /// Returns `None`, and logs, for a variable of another manager.
    pub fn variable_index(&self, variable: &ShaderVariable<'_, B>) -> Option<u32> {
        if !std::ptr::eq(variable.manager, self) {
            logwise::error_sync!(
                "variable {name} does not belong to this manager",
                name = logwise::privacy::LogIt(variable.name())
            );
            return None;
        }
        let resource_index = variable.record.resource_index;
        let region = region_of(self.layout.resource_desc(resource_index).kind);
        let offset = self.regions[region]
            .binary_search_by_key(&resource_index, |record| record.resource_index)
            .ok()?;
        let index = self.region_starts[region] + offset as u32;
        debug_assert_eq!(index, variable.record.variable_index);
        Some(index)
    }

    /// Binds every variable whose class is selected by `flags` from `mapping`.
    pub fn bind_resources(
        &self,
        cache: &mut ResourceCache<B>,
        mapping: &ResourceMapping,
        flags: BindFlags,
    ) -> Result<(), BindErrors> {
        let mut visited = vec![false; self.layout.resource_count() as usize];
        let mut errors = Vec::new();
        self.bind_unvisited(cache, mapping, flags, &mut visited, &mut errors);
        BindErrors::check(errors)
    }

    /// Binds like [`Self::bind_resources`], skipping resources already marked in `visited`.
    ///
    /// Marks every resource it touches, so managers of several stages sharing one `visited`
    /// bind a multi-stage resource once.
    pub(crate) fn bind_unvisited(
        &self,
        cache: &mut ResourceCache<B>,
        mapping: &ResourceMapping,
        flags: BindFlags,
        visited: &mut [bool],
        errors: &mut Vec<BindError>,
    ) {
        self.check_cache(cache);
        let flags = flags.normalized();
        for record in self.regions.iter().flat_map(|region| region.iter()) {
            let seen = &mut visited[record.resource_index as usize];
            if *seen {
                continue;
            }
            *seen = true;
            bind_resource::bind_from_mapping(
                &self.layout,
                cache,
                record.resource_index,
                mapping,
                flags,
                errors,
            );
        }
    }
}

/// A manager for one stage.
#[derive(Debug)]
pub(crate) struct StageVariables<B: Backend> {
    pub(crate) stage: ShaderStages,
    pub(crate) manager: ShaderVariableManager<B>,
}

impl<B: Backend> StageVariables<B> {
    /// One manager per stage in `stages`, lowest stage first.
    pub(crate) fn for_stages(
        layout: &Arc<SignatureLayout<B>>,
        classes: VariableClasses,
        stages: ShaderStages,
    ) -> Vec<Self> {
        stages
            .iter()
            .map(|stage| StageVariables {
                stage,
                manager: ShaderVariableManager::new(layout, classes, stage),
            })
            .collect()
    }
}

/// Read-only handle to one variable.
pub struct ShaderVariable<'a, B: Backend> {
    manager: &'a ShaderVariableManager<B>,
    cache: &'a ResourceCache<B>,
    record: VariableRecord,
}

impl<B: Backend> Clone for ShaderVariable<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<B: Backend> Copy for ShaderVariable<'_, B> {}

impl<B: Backend> PartialEq for ShaderVariable<'_, B> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.manager, other.manager)
            && std::ptr::eq(self.cache, other.cache)
            && self.record == other.record
    }
}

impl<B: Backend> Debug for ShaderVariable<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderVariable")
            .field("name", &self.name())
            .field("index", &self.record.variable_index)
            .field("resource_index", &self.record.resource_index)
            .finish()
    }
}

impl<'a, B: Backend> ShaderVariable<'a, B> {
    pub fn resource_desc(&self) -> &'a ResourceDesc {
        self.manager.layout.resource_desc(self.record.resource_index)
    }
    pub fn name(&self) -> &'a str {
        &self.resource_desc().name
    }
    pub fn kind(&self) -> ResourceKind {
        self.resource_desc().kind
    }
    pub fn variable_type(&self) -> VariableClass {
        self.resource_desc().class
    }
    pub fn array_size(&self) -> u32 {
        self.resource_desc().array_size
    }
    /// Index of the underlying resource in the signature.
    pub fn resource_index(&self) -> u32 {
        self.record.resource_index
    }
    /// Index of this variable in its manager.
    pub fn index(&self) -> u32 {
        self.record.variable_index
    }
    /// The object bound to `array_index`, if any.
    pub fn get(&self, array_index: u32) -> Option<&'a DeviceObject> {
        if array_index >= self.array_size() {
            return None;
        }
        self.cache.resource(self.record.resource_index, array_index)
    }
    pub fn is_bound(&self, array_index: u32) -> bool {
        self.get(array_index).is_some()
    }
}

/// Handle to one variable that can bind into the cache.
pub struct ShaderVariableMut<'a, B: Backend> {
    manager: &'a ShaderVariableManager<B>,
    cache: &'a mut ResourceCache<B>,
    record: VariableRecord,
}

impl<B: Backend> Debug for ShaderVariableMut<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.as_variable().fmt(f)
    }
}

impl<'a, B: Backend> ShaderVariableMut<'a, B> {
    pub fn as_variable(&self) -> ShaderVariable<'_, B> {
        ShaderVariable {
            manager: self.manager,
            cache: &*self.cache,
            record: self.record,
        }
    }
    pub fn resource_desc(&self) -> &'a ResourceDesc {
        self.manager.layout.resource_desc(self.record.resource_index)
    }
    pub fn name(&self) -> &'a str {
        &self.resource_desc().name
    }
    pub fn variable_type(&self) -> VariableClass {
        self.resource_desc().class
    }
    pub fn index(&self) -> u32 {
        self.record.variable_index
    }
    pub fn is_bound(&self, array_index: u32) -> bool {
        self.as_variable().is_bound(array_index)
    }

    /// Binds `object` to element 0; `None` unbinds.
    pub fn set(&mut self, object: Option<&DeviceObject>) -> Result<(), BindError> {
        self.set_element(0, object)
    }

    /// Binds `object` to one array element; `None` unbinds.
    pub fn set_element(&mut self, array_index: u32, object: Option<&DeviceObject>) -> Result<(), BindError> {
        bind_resource::bind_resource(
            &self.manager.layout,
            self.cache,
            self.record.resource_index,
            array_index,
            object,
        )
    }

    /// Binds `objects` to consecutive elements starting at `first_element`.
    ///
    /// Elements past the end of the array are rejected one by one; the rest are bound.
    pub fn set_array(
        &mut self,
        objects: &[Option<DeviceObject>],
        first_element: u32,
    ) -> Result<(), BindErrors> {
        let mut errors = Vec::new();
        for (i, object) in objects.iter().enumerate() {
            let element = first_element.saturating_add(i as u32);
            if let Err(e) = self.set_element(element, object.as_ref()) {
                errors.push(e);
            }
        }
        BindErrors::check(errors)
    }
}
