// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use pipeline_signatures::bindings::objects::*;
use pipeline_signatures::bindings::resource_cache::{CacheContentType, NativeSetHandle};
use pipeline_signatures::bindings::resource_desc::*;
use pipeline_signatures::bindings::resource_mapping::{BindFlags, ResourceMapping};
use pipeline_signatures::bindings::visible_to::ShaderStages;
use pipeline_signatures::descriptor_sets::DescriptorSets;
use pipeline_signatures::slots::{SlotRange, Slots};
use pipeline_signatures::{BindError, Signature};
use std::sync::Arc;

const VS: ShaderStages = ShaderStages::VERTEX;
const PS: ShaderStages = ShaderStages::PIXEL;

fn res(name: &str, stages: ShaderStages, kind: ResourceKind, class: VariableClass) -> ResourceDesc {
    ResourceDesc::new(name, stages, kind, class)
}

fn buffer(name: &str) -> DeviceObject {
    Buffer::new(name, 256, BufferMode::Undefined, BufferUsage::Default).into()
}

fn srv(name: &str) -> DeviceObject {
    TextureView::new(name, TextureViewType::ShaderResource).into()
}

/// Resources 0 and 1 are static, 2 is mutable and 3 is dynamic.
fn scene_desc() -> SignatureDesc {
    SignatureDesc::new("scene")
        .with_resource(res("g_Camera", VS | PS, ResourceKind::ConstantBuffer, VariableClass::Static))
        .with_resource(res("g_Environment", PS, ResourceKind::TextureSrv, VariableClass::Static))
        .with_resource(res("g_Albedo", PS, ResourceKind::TextureSrv, VariableClass::Mutable))
        .with_resource(res("g_Object", VS, ResourceKind::ConstantBuffer, VariableClass::Dynamic))
}

#[test]
fn static_resources_are_copied_on_initialization() {
    logwise::info_sync!("static_resources_are_copied_on_initialization");
    let camera = buffer("camera");
    let mut signature = Signature::<DescriptorSets>::new(scene_desc()).unwrap();
    signature
        .static_variable_by_name_mut(VS, "g_Camera")
        .unwrap()
        .set(Some(&camera))
        .unwrap();
    // the same static slot is seen from every stage
    assert!(signature.static_variable_by_name(PS, "g_Camera").unwrap().is_bound(0));
    assert_eq!(signature.static_cache().content_type(), CacheContentType::Signature);
    assert_eq!(signature.static_cache().resource(2, 0), None);

    let signature = Arc::new(signature);
    let mut instance = signature.create_binding_instance();
    assert!(!instance.static_resources_initialized());
    assert!(!instance.cache().is_bound(0, 0));

    instance.initialize_static_resources();
    assert!(instance.static_resources_initialized());
    assert_eq!(instance.cache().resource(0, 0), Some(&camera));
    // an unbound static resource is logged and left empty
    assert!(!instance.cache().is_bound(1, 0));

    instance.initialize_static_resources();
    assert!(instance.static_resources_initialized());
    assert_eq!(instance.cache().bound_count(), 1);
}

#[test]
fn static_batch_binds_filter_by_stage_and_class() {
    let mut signature = Signature::<Slots>::new(scene_desc()).unwrap();
    let mut mapping = ResourceMapping::new();
    mapping.add("g_Camera", Buffer::new("camera", 256, BufferMode::Undefined, BufferUsage::Dynamic));
    mapping.add("g_Environment", TextureView::new("sky", TextureViewType::ShaderResource));
    mapping.add("g_Albedo", TextureView::new("brick", TextureViewType::ShaderResource));

    signature
        .bind_static_resources(VS | PS, &mapping, BindFlags::UPDATE_MUTABLE)
        .unwrap();
    assert_eq!(signature.static_cache().bound_count(), 0);

    signature
        .bind_static_resources(VS, &mapping, BindFlags::empty())
        .unwrap();
    assert!(signature.static_cache().is_bound(0, 0));
    assert!(!signature.static_cache().is_bound(1, 0));

    signature
        .bind_static_resources(PS, &mapping, BindFlags::empty())
        .unwrap();
    assert!(signature.static_cache().is_bound(1, 0));
    assert_eq!(signature.static_cache().resource(2, 0), None);
}

#[test]
fn static_slots_reject_different_objects() {
    let first = buffer("first");
    let mut signature = Signature::<DescriptorSets>::new(scene_desc()).unwrap();
    let mut camera = signature.static_variable_by_name_mut(PS, "g_Camera").unwrap();
    camera.set(Some(&first)).unwrap();
    assert_eq!(
        camera.set(Some(&buffer("second"))).unwrap_err(),
        BindError::StaleBinding {
            variable: "g_Camera".to_string(),
            class: VariableClass::Static,
        }
    );
    assert_eq!(signature.static_cache().resource(0, 0), Some(&first));

    let signature = Arc::new(signature);
    let mut instance = signature.create_binding_instance();
    instance.initialize_static_resources();
    assert_eq!(instance.cache().resource(0, 0), Some(&first));
}

#[test]
fn instances_expose_only_mutable_and_dynamic_variables() {
    let signature = Arc::new(Signature::<DescriptorSets>::new(scene_desc()).unwrap());
    let instance = signature.create_binding_instance();
    assert_eq!(instance.variable_count(PS), 1);
    assert_eq!(instance.variable_count(VS), 1);
    assert!(instance.variable_by_name(PS, "g_Camera").is_none());
    assert_eq!(instance.variable(VS, 0).unwrap().name(), "g_Object");
    assert!(Arc::ptr_eq(instance.signature(), &signature));
}

#[test]
fn instances_share_statics_but_not_mutables() {
    let camera = buffer("camera");
    let mut signature = Signature::<DescriptorSets>::new(scene_desc()).unwrap();
    signature
        .static_variable_by_name_mut(VS, "g_Camera")
        .unwrap()
        .set(Some(&camera))
        .unwrap();
    let signature = Arc::new(signature);

    let mut first = signature.create_binding_instance();
    let mut second = signature.create_binding_instance();
    first.initialize_static_resources();
    second.initialize_static_resources();
    first
        .variable_by_name_mut(PS, "g_Albedo")
        .unwrap()
        .set(Some(&srv("brick")))
        .unwrap();

    assert_eq!(first.cache().resource(0, 0), second.cache().resource(0, 0));
    assert!(first.cache().is_bound(2, 0));
    assert!(!second.cache().is_bound(2, 0));
}

#[test]
fn slot_statics_reach_every_stage() {
    let camera = buffer("camera");
    let mut signature = Signature::<Slots>::new(scene_desc()).unwrap();
    signature
        .static_variable_by_name_mut(PS, "g_Camera")
        .unwrap()
        .set(Some(&camera))
        .unwrap();
    assert_eq!(signature.static_cache().slot_writes(VS, SlotRange::ConstantBuffer).len(), 1);

    let signature = Arc::new(signature);
    let mut instance = signature.create_binding_instance();
    instance.initialize_static_resources();
    for stage in [VS, PS] {
        let writes = instance.cache().slot_writes(stage, SlotRange::ConstantBuffer);
        assert_eq!(writes.len(), 1, "{:?}", stage);
        assert_eq!(writes[0].slot, 0);
        assert_eq!(writes[0].object, &camera);
    }
}

#[test]
fn descriptor_set_static_cache_is_packed() {
    let desc = scene_desc()
        .with_resource(res("g_Shadows", PS, ResourceKind::TextureSrv, VariableClass::Static).with_array_size(4));
    let mut signature = Signature::<DescriptorSets>::new(desc).unwrap();
    assert_eq!(signature.static_cache().table_count(), 1);
    assert_eq!(signature.static_cache().table_size(0), 6);

    let cascades: Vec<DeviceObject> = (0..4).map(|i| srv(&format!("cascade{}", i))).collect();
    let mut mapping = ResourceMapping::new();
    mapping.add_array("g_Shadows", 0, cascades.iter().cloned());
    signature
        .bind_static_resources(PS, &mapping, BindFlags::UPDATE_STATIC)
        .unwrap();

    let signature = Arc::new(signature);
    let mut instance = signature.create_binding_instance();
    instance.initialize_static_resources();
    for (a, cascade) in cascades.iter().enumerate() {
        assert_eq!(instance.cache().resource(4, a as u32), Some(cascade));
    }
}

#[test]
fn native_sets_attach_to_static_mutable_tables_only() {
    let signature = Arc::new(Signature::<DescriptorSets>::new(scene_desc()).unwrap());
    let mut instance = signature.create_binding_instance();
    let cache = instance.cache_mut();
    assert!(cache.set_native_set(0, NativeSetHandle(7)));
    assert_eq!(cache.native_set(0), Some(NativeSetHandle(7)));
    assert!(!cache.set_native_set(1, NativeSetHandle(8)));
    assert_eq!(cache.native_set(1), None);
    assert!(!cache.set_native_set(2, NativeSetHandle(9)));

    let slots = Arc::new(Signature::<Slots>::new(scene_desc()).unwrap());
    let mut instance = slots.create_binding_instance();
    assert!(!instance.cache_mut().set_native_set(0, NativeSetHandle(1)));
}
