// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
use pipeline_signatures::bindings::objects::*;
use pipeline_signatures::bindings::resource_desc::*;
use pipeline_signatures::bindings::resource_mapping::{BindFlags, ResourceMapping};
use pipeline_signatures::bindings::sampler::SamplerDesc;
use pipeline_signatures::bindings::visible_to::ShaderStages;
use pipeline_signatures::descriptor_sets::{DescriptorSets, DescriptorType};
use pipeline_signatures::slots::{SlotRange, Slots};
use pipeline_signatures::{Backend, BindError, Signature};
use std::sync::Arc;

const VS: ShaderStages = ShaderStages::VERTEX;
const PS: ShaderStages = ShaderStages::PIXEL;

fn res(name: &str, stages: ShaderStages, kind: ResourceKind, class: VariableClass) -> ResourceDesc {
    ResourceDesc::new(name, stages, kind, class)
}

fn make_signature<B: Backend>(desc: SignatureDesc) -> Arc<Signature<B>> {
    Arc::new(Signature::new(desc).unwrap())
}

fn buffer(name: &str) -> DeviceObject {
    Buffer::new(name, 256, BufferMode::Undefined, BufferUsage::Default).into()
}

fn srv(name: &str) -> DeviceObject {
    TextureView::new(name, TextureViewType::ShaderResource).into()
}

fn srv_with_sampler(name: &str, sampler: &Arc<Sampler>) -> DeviceObject {
    TextureView::with_sampler(name, TextureViewType::ShaderResource, sampler).into()
}

fn one_of_each(class: VariableClass) -> SignatureDesc {
    SignatureDesc::new("single")
        .with_resource(res("g_CB", PS, ResourceKind::ConstantBuffer, class))
        .with_resource(res("g_Tex", PS, ResourceKind::TextureSrv, class).with_array_size(3))
}

#[test]
fn kind_is_checked_before_binding() {
    let signature = make_signature::<DescriptorSets>(one_of_each(VariableClass::Mutable));
    let mut instance = signature.create_binding_instance();
    let mut cb = instance.variable_by_name_mut(PS, "g_CB").unwrap();
    let err = cb.set(Some(&srv("albedo"))).unwrap_err();
    assert_eq!(
        err,
        BindError::TypeMismatch {
            variable: "g_CB".to_string(),
            object: "albedo".to_string(),
            object_type: "texture SRV view",
            expected: "buffer",
        }
    );
    assert!(!cb.is_bound(0));

    let uav: DeviceObject = TextureView::new("rw", TextureViewType::UnorderedAccess).into();
    let mut tex = instance.variable_by_name_mut(PS, "g_Tex").unwrap();
    assert!(matches!(
        tex.set_element(1, Some(&uav)),
        Err(BindError::TypeMismatch { .. })
    ));
}

#[test]
fn non_dynamic_slots_keep_their_first_object() {
    logwise::info_sync!("non_dynamic_slots_keep_their_first_object");
    let signature = make_signature::<DescriptorSets>(one_of_each(VariableClass::Mutable));
    let mut instance = signature.create_binding_instance();
    let a = buffer("a");
    let b = buffer("b");

    let mut cb = instance.variable_by_name_mut(PS, "g_CB").unwrap();
    cb.set(Some(&a)).unwrap();
    cb.set(Some(&a)).unwrap();
    assert_eq!(
        cb.set(Some(&b)).unwrap_err(),
        BindError::StaleBinding {
            variable: "g_CB".to_string(),
            class: VariableClass::Mutable,
        }
    );
    assert_eq!(instance.variable_by_name(PS, "g_CB").unwrap().get(0), Some(&a));
}

#[test]
fn dynamic_slots_rebind_freely() {
    let signature = make_signature::<Slots>(one_of_each(VariableClass::Dynamic));
    let mut instance = signature.create_binding_instance();
    let a = buffer("a");
    let b = buffer("b");

    let mut cb = instance.variable_by_name_mut(PS, "g_CB").unwrap();
    cb.set(Some(&a)).unwrap();
    cb.set(Some(&b)).unwrap();
    cb.set(None).unwrap();
    assert!(!cb.is_bound(0));
    cb.set(Some(&a)).unwrap();
    assert_eq!(instance.variable_by_name(PS, "g_CB").unwrap().get(0), Some(&a));
}

#[test]
fn null_resets_non_dynamic_slots_with_an_error() {
    let signature = make_signature::<DescriptorSets>(one_of_each(VariableClass::Mutable));
    let mut instance = signature.create_binding_instance();
    let a = buffer("a");

    let mut cb = instance.variable_by_name_mut(PS, "g_CB").unwrap();
    // unbinding an empty slot is fine
    cb.set(None).unwrap();
    cb.set(Some(&a)).unwrap();
    assert!(matches!(
        cb.set(None),
        Err(BindError::ResetNonDynamic {
            class: VariableClass::Mutable,
            ..
        })
    ));
    assert!(!cb.is_bound(0));
    // once cleared, a different object may be bound
    cb.set(Some(&buffer("b"))).unwrap();
}

#[test]
fn array_elements_are_bounds_checked() {
    let signature = make_signature::<DescriptorSets>(one_of_each(VariableClass::Mutable));
    let mut instance = signature.create_binding_instance();
    let mut tex = instance.variable_by_name_mut(PS, "g_Tex").unwrap();
    assert_eq!(
        tex.set_element(3, Some(&srv("t"))).unwrap_err(),
        BindError::ArrayIndexOutOfRange {
            variable: "g_Tex".to_string(),
            index: 3,
            array_size: 3,
        }
    );

    let objects = [Some(srv("t0")), Some(srv("t1")), Some(srv("t2"))];
    let errors = tex.set_array(&objects, 1).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(
        errors.errors()[0],
        BindError::ArrayIndexOutOfRange { index: 3, .. }
    ));
    assert!(!tex.is_bound(0));
    assert_eq!(tex.as_variable().get(1), objects[0].as_ref());
    assert_eq!(tex.as_variable().get(2), objects[1].as_ref());
}

fn combined_desc(texture_array: u32, sampler_array: u32) -> SignatureDesc {
    SignatureDesc::new("combined")
        .with_combined_texture_samplers("_sampler")
        .with_resource(
            res("g_Tex", PS, ResourceKind::TextureSrv, VariableClass::Mutable)
                .with_array_size(texture_array),
        )
        .with_resource(
            res("g_Tex_sampler", PS, ResourceKind::Sampler, VariableClass::Mutable)
                .with_array_size(sampler_array),
        )
}

fn sampler_cascade<B: Backend>() {
    let linear = Sampler::new("linear", SamplerDesc::default());

    let signature = make_signature::<B>(combined_desc(2, 1));
    let mut instance = signature.create_binding_instance();
    instance
        .variable_by_name_mut(PS, "g_Tex")
        .unwrap()
        .set_element(1, Some(&srv_with_sampler("t", &linear)))
        .unwrap();
    assert_eq!(
        instance.cache().resource(1, 0),
        Some(&DeviceObject::from(linear.clone()))
    );

    let signature = make_signature::<B>(combined_desc(2, 2));
    let mut instance = signature.create_binding_instance();
    instance
        .variable_by_name_mut(PS, "g_Tex")
        .unwrap()
        .set_element(1, Some(&srv_with_sampler("t", &linear)))
        .unwrap();
    assert!(!instance.cache().is_bound(1, 0));
    assert_eq!(
        instance.cache().resource(1, 1),
        Some(&DeviceObject::from(linear))
    );
}

#[test]
fn texture_views_bind_their_sampler_slots() {
    sampler_cascade::<Slots>();
}

#[test]
fn texture_views_bind_their_sampler_descriptor_sets() {
    sampler_cascade::<DescriptorSets>();
}

#[test]
fn missing_view_sampler_is_reported() {
    let signature = make_signature::<DescriptorSets>(combined_desc(1, 1));
    let mut instance = signature.create_binding_instance();
    let err = instance
        .variable_by_name_mut(PS, "g_Tex")
        .unwrap()
        .set(Some(&srv("bare")))
        .unwrap_err();
    assert_eq!(
        err,
        BindError::MissingSampler {
            texture: "g_Tex".to_string(),
            view: "bare".to_string(),
            sampler: "g_Tex_sampler".to_string(),
        }
    );
    // the texture itself is still bound
    assert!(instance.cache().is_bound(0, 0));
    assert!(!instance.cache().is_bound(1, 0));
}

#[test]
fn immutable_samplers_are_never_bound() {
    let desc = combined_desc(1, 1)
        .with_immutable_sampler(ImmutableSamplerDesc::new("g_Tex", PS, SamplerDesc::default()));
    let signature = make_signature::<Slots>(desc);
    let mut instance = signature.create_binding_instance();
    let linear = Sampler::new("linear", SamplerDesc::default());
    instance
        .variable_by_name_mut(PS, "g_Tex")
        .unwrap()
        .set(Some(&srv_with_sampler("t", &linear)))
        .unwrap();
    assert!(instance.cache().is_bound(0, 0));
    assert!(!instance.cache().is_bound(1, 0));
    assert!(instance.variable_by_name(PS, "g_Tex_sampler").is_none());
    assert!(instance.cache().slot_writes(PS, SlotRange::Sampler).is_empty());
}

#[test]
fn writes_reach_every_stage_slot() {
    let desc = SignatureDesc::new("shared")
        .with_resource(res("g_Frame", VS | PS, ResourceKind::ConstantBuffer, VariableClass::Mutable))
        .with_resource(res("g_Material", PS, ResourceKind::ConstantBuffer, VariableClass::Mutable));
    let signature = make_signature::<Slots>(desc);
    let mut instance = signature.create_binding_instance();
    let frame = buffer("frame");
    let material = buffer("material");
    instance.variable_by_name_mut(VS, "g_Frame").unwrap().set(Some(&frame)).unwrap();
    instance.variable_by_name_mut(PS, "g_Material").unwrap().set(Some(&material)).unwrap();

    let vertex = instance.cache().slot_writes(VS, SlotRange::ConstantBuffer);
    assert_eq!(vertex.len(), 1);
    assert_eq!((vertex[0].slot, vertex[0].object), (0, &frame));

    let pixel = instance.cache().slot_writes(PS, SlotRange::ConstantBuffer);
    assert_eq!(pixel.len(), 2);
    assert_eq!((pixel[0].slot, pixel[0].object), (0, &frame));
    assert_eq!((pixel[1].slot, pixel[1].object), (1, &material));

    // the pixel stage sees the binding done through the vertex stage
    assert!(instance.variable_by_name(PS, "g_Frame").unwrap().is_bound(0));
}

fn mixed_classes() -> SignatureDesc {
    SignatureDesc::new("classes")
        .with_resource(res("g_Mutable", PS, ResourceKind::ConstantBuffer, VariableClass::Mutable))
        .with_resource(res("g_Dynamic", PS, ResourceKind::TextureSrv, VariableClass::Dynamic))
}

#[test]
fn batch_binds_select_classes() {
    let signature = make_signature::<DescriptorSets>(mixed_classes());
    let mut mapping = ResourceMapping::new();
    mapping.add("g_Mutable", Buffer::new("m", 64, BufferMode::Undefined, BufferUsage::Default));
    mapping.add("g_Dynamic", TextureView::new("d", TextureViewType::ShaderResource));

    let mut instance = signature.create_binding_instance();
    instance.bind_resources(PS, &mapping, BindFlags::UPDATE_MUTABLE).unwrap();
    assert!(instance.cache().is_bound(0, 0));
    assert!(!instance.cache().is_bound(1, 0));

    let mut instance = signature.create_binding_instance();
    instance.bind_resources(PS, &mapping, BindFlags::empty()).unwrap();
    assert!(instance.cache().is_bound(0, 0));
    assert!(instance.cache().is_bound(1, 0));

    // stages without variables bind nothing
    let mut instance = signature.create_binding_instance();
    instance.bind_resources(VS, &mapping, BindFlags::empty()).unwrap();
    assert_eq!(instance.cache().bound_count(), 0);
}

#[test]
fn batch_binds_keep_existing_objects_on_request() {
    let signature = make_signature::<DescriptorSets>(mixed_classes());
    let first = buffer("first");
    let mut instance = signature.create_binding_instance();
    instance.variable_by_name_mut(PS, "g_Mutable").unwrap().set(Some(&first)).unwrap();

    let mut mapping = ResourceMapping::new();
    mapping.add("g_Mutable", Buffer::new("second", 64, BufferMode::Undefined, BufferUsage::Default));

    instance
        .bind_resources(PS, &mapping, BindFlags::UPDATE_MUTABLE | BindFlags::KEEP_EXISTING)
        .unwrap();
    assert_eq!(instance.cache().resource(0, 0), Some(&first));

    let errors = instance
        .bind_resources(PS, &mapping, BindFlags::UPDATE_MUTABLE)
        .unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors.errors()[0], BindError::StaleBinding { .. }));
    assert_eq!(instance.cache().resource(0, 0), Some(&first));
}

#[test]
fn batch_binds_verify_resolution() {
    let desc = mixed_classes()
        .with_resource(res("g_Missing", VS | PS, ResourceKind::BufferSrv, VariableClass::Mutable));
    let signature = make_signature::<DescriptorSets>(desc);
    let mut mapping = ResourceMapping::new();
    mapping.add("g_Mutable", Buffer::new("m", 64, BufferMode::Undefined, BufferUsage::Default));

    let mut instance = signature.create_binding_instance();
    instance.bind_resources(VS | PS, &mapping, BindFlags::empty()).unwrap();

    let errors = instance
        .bind_resources(VS | PS, &mapping, BindFlags::VERIFY_ALL_RESOLVED)
        .unwrap_err();
    // stages are visited vertex first; g_Missing is visible to both but reported once
    assert_eq!(
        errors.into_vec(),
        vec![
            BindError::UnresolvedResource {
                variable: "g_Missing".to_string()
            },
            BindError::UnresolvedResource {
                variable: "g_Dynamic".to_string()
            },
        ]
    );
}

#[test]
fn same_named_resources_in_separate_stages_report_separately() {
    let split = || {
        SignatureDesc::new("split")
            .with_resource(res("g_Tex", VS, ResourceKind::TextureSrv, VariableClass::Mutable))
            .with_resource(res("g_Tex", PS, ResourceKind::TextureSrv, VariableClass::Mutable))
    };
    let unresolved = || BindError::UnresolvedResource {
        variable: "g_Tex".to_string(),
    };
    let signature = make_signature::<DescriptorSets>(split());
    let mut instance = signature.create_binding_instance();
    let errors = instance
        .bind_resources(VS | PS, &ResourceMapping::new(), BindFlags::VERIFY_ALL_RESOLVED)
        .unwrap_err();
    assert_eq!(errors.into_vec(), vec![unresolved(), unresolved()]);

    let texture = srv("shared");
    let mut mapping = ResourceMapping::new();
    mapping.add("g_Tex", texture.clone());
    instance.bind_resources(VS | PS, &mapping, BindFlags::empty()).unwrap();
    assert_eq!(instance.cache().resource(0, 0), Some(&texture));
    assert_eq!(instance.cache().resource(1, 0), Some(&texture));

    let statics = split()
        .with_resource(res("g_Env", VS, ResourceKind::TextureSrv, VariableClass::Static))
        .with_resource(res("g_Env", PS, ResourceKind::TextureSrv, VariableClass::Static));
    let mut signature = Signature::<Slots>::new(statics).unwrap();
    let errors = signature
        .bind_static_resources(VS | PS, &ResourceMapping::new(), BindFlags::VERIFY_ALL_RESOLVED)
        .unwrap_err();
    assert_eq!(errors.len(), 2);
}

#[test]
fn buffer_views_match_their_view_type() {
    let desc = SignatureDesc::new("views")
        .with_resource(res("g_In", ShaderStages::COMPUTE, ResourceKind::BufferSrv, VariableClass::Mutable))
        .with_resource(res("g_Out", ShaderStages::COMPUTE, ResourceKind::BufferUav, VariableClass::Mutable));
    let signature = make_signature::<DescriptorSets>(desc);
    let mut instance = signature.create_binding_instance();
    let storage = Buffer::new("storage", 1024, BufferMode::Structured, BufferUsage::Default);
    let read: DeviceObject = BufferView::new("srv", &storage, BufferViewType::ShaderResource).into();
    let write: DeviceObject = BufferView::new("uav", &storage, BufferViewType::UnorderedAccess).into();

    let mut input = instance.variable_by_name_mut(ShaderStages::COMPUTE, "g_In").unwrap();
    assert!(matches!(input.set(Some(&write)), Err(BindError::TypeMismatch { .. })));
    input.set(Some(&read)).unwrap();
    let mut output = instance.variable_by_name_mut(ShaderStages::COMPUTE, "g_Out").unwrap();
    output.set(Some(&write)).unwrap();

    let writes = instance.cache().descriptor_writes(0);
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0].binding, 0);
    assert_eq!(writes[0].descriptor_type, DescriptorType::StorageBufferDynamicReadOnly);
    assert_eq!(writes[1].binding, 1);
    assert_eq!(writes[1].object, &write);
}

#[test]
fn acceleration_structures_and_input_attachments() {
    let desc = SignatureDesc::new("misc")
        .with_resource(res("g_TLAS", ShaderStages::COMPUTE, ResourceKind::AccelStruct, VariableClass::Dynamic))
        .with_resource(res("g_GBuffer", PS, ResourceKind::InputAttachment, VariableClass::Mutable));
    let signature = make_signature::<DescriptorSets>(desc);
    let mut instance = signature.create_binding_instance();
    let tlas: DeviceObject = TopLevelAS::new("scene").into();

    let mut accel = instance
        .variable_by_name_mut(ShaderStages::COMPUTE, "g_TLAS")
        .unwrap();
    assert!(matches!(
        accel.set(Some(&buffer("not a tlas"))),
        Err(BindError::TypeMismatch { .. })
    ));
    accel.set(Some(&tlas)).unwrap();

    instance
        .variable_by_name_mut(PS, "g_GBuffer")
        .unwrap()
        .set(Some(&srv("gbuffer")))
        .unwrap();
    assert_eq!(instance.cache().bound_count(), 2);
    assert_eq!(
        instance.cache().descriptor_writes(1)[0].descriptor_type,
        DescriptorType::AccelerationStructure
    );
}
