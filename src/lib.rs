// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*! pipeline_signatures describes the shader resources of a pipeline once, and compiles that
description to the binding model of a backend.

A *signature* is a list of named resources (constant buffers, texture and buffer views,
samplers, and so on).  Each resource has an array size, a set of shader stages it is visible
to, and a *variable class* that says how often it changes:

| Class   | Bound on          | Rebinding                      |
|---------|-------------------|--------------------------------|
| Static  | the signature     | only with the same object      |
| Mutable | a binding instance| only with the same object      |
| Dynamic | a binding instance| at any time                    |

Textures can be paired with a separate sampler, either explicitly or by the
`texture + "_sampler"` naming convention.  Binding a texture view then binds the sampler the
view carries.  Samplers can also be *immutable*: baked into the layout and never bound.

# Backends

Two binding models are supported:

* [`slots::Slots`] places resources in per-stage register ranges for constant buffers, shader
  resources, samplers and unordered-access views.
* [`descriptor_sets::DescriptorSets`] places resources in up to two descriptor sets, one for
  static and mutable resources and one for dynamic resources.

Both are always available.  [`DefaultBackend`] is the descriptor-set model unless the
`backend_slots` feature is enabled.  With `backend_wgpu`, descriptor-set layouts can be exported
as wgpu bind group layout entries.

# Example

```
use std::sync::Arc;
use pipeline_signatures::bindings::objects::*;
use pipeline_signatures::bindings::resource_desc::*;
use pipeline_signatures::bindings::resource_mapping::{BindFlags, ResourceMapping};
use pipeline_signatures::bindings::sampler::SamplerDesc;
use pipeline_signatures::bindings::visible_to::ShaderStages;
use pipeline_signatures::{DefaultBackend, Signature};

let desc = SignatureDesc::new("material")
    .with_combined_texture_samplers("_sampler")
    .with_resource(ResourceDesc::new("g_Albedo", ShaderStages::PIXEL, ResourceKind::TextureSrv, VariableClass::Mutable))
    .with_resource(ResourceDesc::new("g_Albedo_sampler", ShaderStages::PIXEL, ResourceKind::Sampler, VariableClass::Mutable));
let signature = Arc::new(Signature::<DefaultBackend>::new(desc).unwrap());

let mut instance = signature.create_binding_instance();
// the sampler is bound through the texture
assert_eq!(instance.variable_count(ShaderStages::PIXEL), 1);

let sampler = Sampler::new("linear", SamplerDesc::default());
let view = TextureView::with_sampler("albedo", TextureViewType::ShaderResource, &sampler);
let mut mapping = ResourceMapping::new();
mapping.add("g_Albedo", view);
instance.bind_resources(ShaderStages::PIXEL, &mapping, BindFlags::empty()).unwrap();
assert!(instance.cache().is_bound(1, 0));
```
*/

pub mod bindings;
mod imp;

pub use bindings::{
    BindError, BindErrors, BindingInstance, PipelineLayout, PipelineLayoutError, Signature,
    SignatureError, SignatureLayout,
};
pub use imp::{Backend, DefaultBackend, descriptor_sets, slots};

#[cfg(feature = "backend_wgpu")]
pub use imp::wgpu;
