// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The bind protocol shared by every backend.

Binding `object` to `resource[array_index]`:

1. The object is checked against the resource kind (constant buffers take buffers, texture SRVs
   take shader-resource texture views, and so on).
2. A non-dynamic slot that already holds a different object rejects the write.  Rebinding the
   same object is a no-op.
3. The object is written to every slot the backend assigned to the element.
4. For a texture combined with a separate, non-immutable sampler, the view's sampler is bound to
   that sampler too.
*/

use crate::bindings::error::BindError;
use crate::bindings::objects::{
    BufferMode, BufferViewType, DeviceObject, TextureViewType,
};
use crate::bindings::resource_cache::ResourceCache;
use crate::bindings::resource_desc::{ResourceDesc, ResourceFlags, ResourceKind, VariableClass};
use crate::bindings::resource_mapping::{BindFlags, ResourceMapping};
use crate::bindings::signature::SignatureLayout;
use crate::imp::Backend;

fn type_mismatch(res: &ResourceDesc, array_index: u32, object: &DeviceObject) -> BindError {
    BindError::TypeMismatch {
        variable: res.print_name(array_index),
        object: object.name().to_string(),
        object_type: object.type_name(),
        expected: res.kind.expected_object(),
    }
    .report()
}

fn cache_constant_buffer(res: &ResourceDesc, array_index: u32, object: &DeviceObject) -> Result<(), BindError> {
    match object {
        DeviceObject::Buffer(_) => Ok(()),
        _ => Err(type_mismatch(res, array_index, object)),
    }
}

fn cache_texture_view(
    res: &ResourceDesc,
    array_index: u32,
    object: &DeviceObject,
    view_type: TextureViewType,
) -> Result<(), BindError> {
    match object {
        DeviceObject::TextureView(view) if view.view_type() == view_type => Ok(()),
        _ => Err(type_mismatch(res, array_index, object)),
    }
}

fn cache_buffer_view(
    res: &ResourceDesc,
    array_index: u32,
    object: &DeviceObject,
    view_type: BufferViewType,
) -> Result<(), BindError> {
    let DeviceObject::BufferView(view) = object else {
        return Err(type_mismatch(res, array_index, object));
    };
    if view.view_type() != view_type {
        return Err(type_mismatch(res, array_index, object));
    }
    #[cfg(feature = "development")]
    {
        let formatted = res.flags.contains(ResourceFlags::FORMATTED_BUFFER);
        let mode = view.buffer().mode();
        let mode_matches = match mode {
            BufferMode::Formatted => formatted,
            BufferMode::Structured | BufferMode::Raw => !formatted,
            BufferMode::Undefined => false,
        };
        if !mode_matches {
            logwise::warn_sync!(
                "buffer {buffer} bound to {variable} has mode {mode}, which does not match the declared view",
                buffer = logwise::privacy::LogIt(view.buffer().name()),
                variable = res.print_name(array_index),
                mode = logwise::privacy::LogIt(mode)
            );
        }
    }
    Ok(())
}

fn cache_sampler(res: &ResourceDesc, array_index: u32, object: &DeviceObject) -> Result<(), BindError> {
    match object {
        DeviceObject::Sampler(_) => Ok(()),
        _ => Err(type_mismatch(res, array_index, object)),
    }
}

fn cache_accel_struct(res: &ResourceDesc, array_index: u32, object: &DeviceObject) -> Result<(), BindError> {
    match object {
        DeviceObject::TopLevelAS(_) => Ok(()),
        _ => Err(type_mismatch(res, array_index, object)),
    }
}

fn check_kind(res: &ResourceDesc, array_index: u32, object: &DeviceObject) -> Result<(), BindError> {
    match res.kind {
        ResourceKind::ConstantBuffer => cache_constant_buffer(res, array_index, object),
        ResourceKind::TextureSrv | ResourceKind::InputAttachment => {
            cache_texture_view(res, array_index, object, TextureViewType::ShaderResource)
        }
        ResourceKind::TextureUav => {
            cache_texture_view(res, array_index, object, TextureViewType::UnorderedAccess)
        }
        ResourceKind::BufferSrv => {
            cache_buffer_view(res, array_index, object, BufferViewType::ShaderResource)
        }
        ResourceKind::BufferUav => {
            cache_buffer_view(res, array_index, object, BufferViewType::UnorderedAccess)
        }
        ResourceKind::Sampler => cache_sampler(res, array_index, object),
        ResourceKind::AccelStruct => cache_accel_struct(res, array_index, object),
    }
}

/// Binds `object`, or unbinds with `None`, to `resource[array_index]` in `cache`.
pub(crate) fn bind_resource<B: Backend>(
    layout: &SignatureLayout<B>,
    cache: &mut ResourceCache<B>,
    resource_index: u32,
    array_index: u32,
    object: Option<&DeviceObject>,
) -> Result<(), BindError> {
    let res = layout.resource_desc(resource_index);
    let attribs = layout.resource_attribs(resource_index);
    if array_index >= res.array_size {
        return Err(BindError::ArrayIndexOutOfRange {
            variable: res.name.clone(),
            index: array_index,
            array_size: res.array_size,
        }
        .report());
    }
    if res.kind == ResourceKind::Sampler && attribs.is_immutable_sampler_assigned() {
        return Err(BindError::ImmutableSampler {
            variable: res.name.clone(),
        }
        .report());
    }

    let addresses = cache.addresses_of(resource_index, array_index);
    let Some(first) = addresses.first().copied() else {
        debug_assert!(false, "resource {} has no slots in this cache", res.name);
        return Ok(());
    };
    let already_bound = cache.slot(first).is_bound();

    let Some(object) = object else {
        for address in &addresses {
            cache.set_object(*address, None);
        }
        if already_bound && res.class != VariableClass::Dynamic {
            return Err(BindError::ResetNonDynamic {
                variable: res.print_name(array_index),
                class: res.class,
            }
            .report());
        }
        return Ok(());
    };

    check_kind(res, array_index, object)?;

    if already_bound && res.class != VariableClass::Dynamic {
        if cache.slot(first).object() == Some(object) {
            return Ok(());
        }
        return Err(BindError::StaleBinding {
            variable: res.print_name(array_index),
            class: res.class,
        }
        .report());
    }

    for address in &addresses {
        cache.set_object(*address, Some(object.clone()));
    }

    if res.kind == ResourceKind::TextureSrv {
        bind_assigned_sampler(layout, cache, resource_index, array_index, object)?;
    }
    Ok(())
}

/// Binds the sampler carried by a texture view to the texture's separate sampler.
fn bind_assigned_sampler<B: Backend>(
    layout: &SignatureLayout<B>,
    cache: &mut ResourceCache<B>,
    resource_index: u32,
    array_index: u32,
    object: &DeviceObject,
) -> Result<(), BindError> {
    let res = layout.resource_desc(resource_index);
    let attribs = layout.resource_attribs(resource_index);
    let DeviceObject::TextureView(view) = object else {
        return Ok(());
    };

    let Some(sampler_index) = attribs.sampler_index() else {
        #[cfg(feature = "development")]
        {
            if res.flags.contains(ResourceFlags::COMBINED_SAMPLER)
                && !attribs.is_immutable_sampler_assigned()
                && view.sampler().is_none()
            {
                logwise::warn_sync!(
                    "texture view {view} bound to combined-sampler texture {texture} carries no sampler",
                    view = logwise::privacy::LogIt(view.name()),
                    texture = res.print_name(array_index)
                );
            }
        }
        return Ok(());
    };
    if attribs.is_immutable_sampler_assigned() {
        return Ok(());
    }
    let sampler_res = layout.resource_desc(sampler_index);
    let Some(sampler) = view.sampler() else {
        return Err(BindError::MissingSampler {
            texture: res.print_name(array_index),
            view: view.name().to_string(),
            sampler: sampler_res.name.clone(),
        }
        .report());
    };
    let sampler_element = if sampler_res.array_size == 1 { 0 } else { array_index };
    bind_resource(
        layout,
        cache,
        sampler_index,
        sampler_element,
        Some(&DeviceObject::Sampler(sampler.clone())),
    )
}

/// Binds every element of one resource from `mapping`, collecting errors.
pub(crate) fn bind_from_mapping<B: Backend>(
    layout: &SignatureLayout<B>,
    cache: &mut ResourceCache<B>,
    resource_index: u32,
    mapping: &ResourceMapping,
    flags: BindFlags,
    errors: &mut Vec<BindError>,
) {
    let res = layout.resource_desc(resource_index);
    if !flags.contains(BindFlags::for_class(res.class)) {
        return;
    }
    for array_index in 0..res.array_size {
        if flags.contains(BindFlags::KEEP_EXISTING) && cache.is_bound(resource_index, array_index) {
            continue;
        }
        match mapping.get(&res.name, array_index) {
            Some(object) => {
                if let Err(e) = bind_resource(layout, cache, resource_index, array_index, Some(object)) {
                    errors.push(e);
                }
            }
            None => {
                if flags.contains(BindFlags::VERIFY_ALL_RESOLVED)
                    && !cache.is_bound(resource_index, array_index)
                {
                    errors.push(
                        BindError::UnresolvedResource {
                            variable: res.print_name(array_index),
                        }
                        .report(),
                    );
                }
            }
        }
    }
}
