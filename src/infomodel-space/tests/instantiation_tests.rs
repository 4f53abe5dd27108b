//! Integration tests for instantiation, value binding and methods.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use common_error::ModelError;
use infomodel_core::well_known::{DataTypeIds, ObjectIds, ObjectTypeIds, ReferenceTypeIds, ns0};
use infomodel_core::{DataValue, ExtensionObject, NodeClass, NodeId, StatusCode, Variant};
use infomodel_space::testing::{ModelAssertions, ModelFixture};
use infomodel_space::*;

fn objects() -> NodeId {
    ns0(ObjectIds::OBJECTS_FOLDER)
}

#[test]
fn test_mandatory_children_only() {
    let mut fixture = ModelFixture::machine_library();
    let motor_type = fixture.node_id("MotorType");
    let before = fixture.space().node_count();
    let space = fixture.space_mut();

    let motor = space
        .instantiate(&motor_type, InstantiateOptions::new("Motor1").organized_by(objects()))
        .unwrap();

    ModelAssertions::new(space)
        .assert_node_count(before + 3)
        .assert_has_child(&motor, "Speed")
        .assert_has_child(&motor, "SerialNumber")
        .assert_no_child(&motor, "Temperature")
        .assert_references_mirrored();
    assert!(space.is_instance_of(&motor, &motor_type).unwrap());
    assert_eq!(space.modelling_rule_of(&motor), None);
    let speed = space.child_by_name(&motor, "Speed").unwrap();
    assert_eq!(space.modelling_rule_of(&speed), None);
    assert!(space.property_by_name(&motor, "SerialNumber").is_some());
}

#[test]
fn test_placed_root_uses_parent_namespace() {
    let mut fixture = ModelFixture::machine_library();
    let motor_type = fixture.node_id("MotorType");
    let ns = fixture.namespace();
    let space = fixture.space_mut();

    let plant = space
        .create_node(NodeSpec::object(fixture_name(ns, "Plant")).organized_by(objects()))
        .unwrap();
    assert!(plant.as_string().is_none());
    let motor = space
        .instantiate(&motor_type, InstantiateOptions::new("Motor1").organized_by(plant.clone()))
        .unwrap();
    assert_eq!(motor.namespace, ns);
    assert!(motor.as_string().is_none());
    let speed = space.child_by_name(&motor, "Speed").unwrap();
    assert_eq!(speed.namespace, ns);

    let plant2 = space
        .create_node(
            NodeSpec::object(fixture_name(ns, "Plant2"))
                .with_node_id(NodeId::string(ns, "Plant2"))
                .organized_by(objects()),
        )
        .unwrap();
    let motor2 = space
        .instantiate(&motor_type, InstantiateOptions::new("Motor2").organized_by(plant2))
        .unwrap();
    assert_eq!(motor2, NodeId::string(ns, "Plant2-Motor2"));
    assert_eq!(
        space.child_by_name(&motor2, "Speed"),
        Some(NodeId::string(ns, "Plant2-Motor2-Speed"))
    );
}

#[test]
fn test_children_of_same_type_get_independent_subtrees() {
    let mut fixture = ModelFixture::new();
    let box_type = fixture.add_object_type("BoxType", ns0(ObjectTypeIds::FOLDER_TYPE));
    fixture.add_variable(
        &box_type,
        "BoxType.Inner",
        "Inner",
        ns0(DataTypeIds::INT32),
        ModellingRule::Mandatory,
    );
    let shelf_type = fixture.add_object_type("ShelfType", ns0(ObjectTypeIds::BASE_OBJECT_TYPE));
    for side in ["Left", "Right"] {
        fixture.add_object(
            &shelf_type,
            &format!("ShelfType.{side}"),
            side,
            box_type.clone(),
            ModellingRule::Mandatory,
        );
    }
    let space = fixture.space_mut();

    let shelf = space
        .instantiate(&shelf_type, InstantiateOptions::new("Shelf").organized_by(objects()))
        .unwrap();
    let left = space.child_by_name(&shelf, "Left").unwrap();
    let right = space.child_by_name(&shelf, "Right").unwrap();
    let left_inner = space.child_by_name(&left, "Inner").unwrap();
    let right_inner = space.child_by_name(&right, "Inner").unwrap();
    assert_ne!(left, right);
    assert_ne!(left_inner, right_inner);

    space.delete_node(&left).unwrap();
    assert!(!space.contains_node(&left_inner));
    assert!(space.contains_node(&right_inner));
    assert_eq!(space.child_by_name(&right, "Inner"), Some(right_inner));
}

#[test]
fn test_optional_paths_select_nested_children() {
    let mut fixture = ModelFixture::machine_library();
    let pump_type = fixture.node_id("PumpType");
    let machine_type = fixture.node_id("MachineType");
    let space = fixture.space_mut();

    let pump = space
        .instantiate(
            &pump_type,
            InstantiateOptions::new("Pump1")
                .organized_by(objects())
                .with_optionals(["Diagnostics.LastError", "Motor.Temperature"]),
        )
        .unwrap();

    let diagnostics = space.child_by_name(&pump, "Diagnostics").unwrap();
    let motor = space.child_by_name(&pump, "Motor").unwrap();
    ModelAssertions::new(space)
        .assert_has_child(&pump, "FlowRate")
        .assert_has_child(&pump, "Status")
        .assert_has_child(&pump, "Start")
        .assert_has_child(&diagnostics, "ErrorCount")
        .assert_has_child(&diagnostics, "LastError")
        .assert_has_child(&motor, "Temperature");
    assert_eq!(
        space.type_definition_of(&diagnostics),
        Some(ns0(ObjectTypeIds::FOLDER_TYPE))
    );
    assert!(space.is_instance_of(&pump, &machine_type).unwrap());
}

#[test]
fn test_string_ids_follow_parent() {
    let mut fixture = ModelFixture::machine_library();
    let machine_type = fixture.node_id("MachineType");
    let ns = fixture.namespace();
    let space = fixture.space_mut();

    let machine = space
        .instantiate(
            &machine_type,
            InstantiateOptions::new(fixture_name(ns, "Line1"))
                .with_node_id(NodeId::string(ns, "Line1"))
                .organized_by(objects()),
        )
        .unwrap();
    assert_eq!(
        space.child_by_name(&machine, "Motor"),
        Some(NodeId::string(ns, "Line1-Motor"))
    );
    assert!(space.contains_node(&NodeId::string(ns, "Line1-Motor-Speed")));

    let dotted = space
        .instantiate(
            &machine_type,
            InstantiateOptions::new(fixture_name(ns, "Line2"))
                .with_node_id(NodeId::string(ns, "Line2"))
                .with_separator(".")
                .organized_by(objects()),
        )
        .unwrap();
    assert_eq!(
        space.child_by_name(&dotted, "Status"),
        Some(NodeId::string(ns, "Line2.Status"))
    );
}

#[test]
fn test_occupied_string_id_falls_back() {
    let mut fixture = ModelFixture::machine_library();
    let motor_type = fixture.node_id("MotorType");
    let ns = fixture.namespace();
    let space = fixture.space_mut();
    space
        .create_node(
            NodeSpec::object(fixture_name(ns, "Squatter"))
                .with_node_id(NodeId::string(ns, "M-Speed")),
        )
        .unwrap();

    let motor = space
        .instantiate(
            &motor_type,
            InstantiateOptions::new(fixture_name(ns, "M")).with_node_id(NodeId::string(ns, "M")),
        )
        .unwrap();
    let speed = space.child_by_name(&motor, "Speed").unwrap();
    assert_ne!(speed, NodeId::string(ns, "M-Speed"));
    assert!(space
        .warnings()
        .iter()
        .any(|w| matches!(w, ModelWarning::NodeIdFallback { .. })));
}

#[test]
fn test_child_named_like_its_type() {
    let mut fixture = ModelFixture::new();
    let widget = fixture.add_object_type("Widget", ns0(ObjectTypeIds::BASE_OBJECT_TYPE));
    fixture.add_variable(
        &widget,
        "Widget.Widget",
        "Widget",
        ns0(DataTypeIds::INT32),
        ModellingRule::Mandatory,
    );
    let space = fixture.space_mut();

    let instance = space
        .instantiate(&widget, InstantiateOptions::new("Widget").organized_by(objects()))
        .unwrap();
    let child = space.child_by_name(&instance, "Widget").unwrap();
    assert_eq!(space.node(&child).unwrap().node_class(), NodeClass::Variable);
}

#[test]
fn test_failed_instantiation_rolls_back() {
    let mut fixture = ModelFixture::machine_library();
    let broken = fixture.add_object_type("BrokenType", fixture.node_id("MachineType"));
    let ns = fixture.namespace();
    fixture.add_object(
        &broken,
        "BrokenType.Ghost",
        "Ghost",
        NodeId::string(ns, "MissingType"),
        ModellingRule::Mandatory,
    );
    let space = fixture.space_mut();
    let before = space.node_count();

    let err = space
        .instantiate(&broken, InstantiateOptions::new("Broken").organized_by(objects()))
        .unwrap_err();
    assert!(matches!(err, ModelError::ModellingRuleViolation(_)));
    assert_eq!(space.node_count(), before);
    assert_eq!(space.child_by_name(&objects(), "Broken"), None);
    ModelAssertions::new(space).assert_references_mirrored();
}

#[test]
fn test_abstract_and_non_types_rejected() {
    let mut space = AddressSpace::with_core_model();
    let abstract_type = space
        .create_node(
            NodeSpec::object_type("AbstractThing")
                .with_abstract(true)
                .subtype_of(ns0(ObjectTypeIds::BASE_OBJECT_TYPE)),
        )
        .unwrap();
    assert!(matches!(
        space.instantiate(&abstract_type, InstantiateOptions::new("X")),
        Err(ModelError::ModellingRuleViolation(_))
    ));
    assert!(matches!(
        space.instantiate(&objects(), InstantiateOptions::new("X")),
        Err(ModelError::InvalidNodeClass(_))
    ));
}

#[test]
fn test_references_between_declarations_are_reproduced() {
    let mut fixture = ModelFixture::machine_library();
    let machine_type = fixture.node_id("MachineType");
    let status = fixture.node_id("MachineType.Status");
    let motor = fixture.node_id("MachineType.Motor");
    let generates_event = ns0(ReferenceTypeIds::GENERATES_EVENT);
    let space = fixture.space_mut();
    space.add_reference(&motor, &generates_event, &status, true).unwrap();

    let machine = space
        .instantiate(&machine_type, InstantiateOptions::new("Machine").organized_by(objects()))
        .unwrap();
    let motor_clone = space.child_by_name(&machine, "Motor").unwrap();
    let status_clone = space.child_by_name(&machine, "Status").unwrap();
    let targets: Vec<_> = space
        .find_references(&motor_clone, &generates_event, true, false)
        .unwrap()
        .into_iter()
        .map(|r| r.target)
        .collect();
    assert_eq!(targets, vec![status_clone]);
}

#[test]
fn test_instance_declarations_include_inherited() {
    let fixture = ModelFixture::machine_library();
    let declarations = fixture
        .space()
        .instance_declarations(&fixture.node_id("PumpType"))
        .unwrap();
    let mut names: Vec<_> = declarations.keys().map(|name| name.name.clone()).collect();
    names.sort();
    assert_eq!(names, ["Diagnostics", "FlowRate", "Motor", "Start", "Status"]);
}

#[tokio::test]
async fn test_instance_values_and_methods() {
    let mut fixture = ModelFixture::machine_library();
    let machine_type = fixture.node_id("MachineType");
    let start = fixture.node_id("MachineType.Start");
    let space = fixture.space_mut();

    let runs = Arc::new(AtomicI32::new(0));
    let handler_runs = Arc::clone(&runs);
    space
        .bind_method(
            &start,
            Arc::new(FnMethodHandler::new(move |ctx, _| {
                handler_runs.fetch_add(1, Ordering::SeqCst);
                Ok(vec![Variant::from(ctx.object().browse_name().name.clone())])
            })),
        )
        .unwrap();

    let machine = space
        .instantiate(&machine_type, InstantiateOptions::new("Mill").organized_by(objects()))
        .unwrap();
    let start_clone = space.child_by_name(&machine, "Start").unwrap();
    let result = space.call_method(&machine, &start_clone, vec![]).await;
    assert_eq!(result.status, StatusCode::GOOD);
    assert_eq!(result.outputs, vec![Variant::from("Mill")]);

    // Methods declared on the type may be called on its instances.
    let result = space.call_method(&machine, &start, vec![]).await;
    assert_eq!(result.status, StatusCode::GOOD);
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    let status = space.child_by_name(&machine, "Status").unwrap();
    space.set_value(&status, 3i32).unwrap();
    let read = space.read_value(&status, None).await;
    assert_eq!(read.value, Variant::Int32(3));
    assert_eq!(
        space.write_value(&status, DataValue::new(4i32), None).await,
        StatusCode::BAD_NOT_WRITABLE
    );
}

#[tokio::test]
async fn test_bound_reads_have_increasing_timestamps() {
    let mut space = AddressSpace::with_core_model();
    let level = space
        .create_node(NodeSpec::variable("Level", ns0(DataTypeIds::INT32)).organized_by(objects()))
        .unwrap();
    let counter = Arc::new(AtomicI32::new(0));
    space
        .bind_value(
            &level,
            Arc::new(FnValueSource::new(move |_| {
                Ok(Variant::Int32(counter.fetch_add(1, Ordering::SeqCst)))
            })),
        )
        .unwrap();

    let mut previous = None;
    for expected in 0..5 {
        let read = space.read_value(&level, None).await;
        assert_eq!(read.value, Variant::Int32(expected));
        let stamp = read.source_timestamp.unwrap();
        if let Some(previous) = previous {
            assert!(stamp > previous);
        }
        previous = Some(stamp);
    }
}

#[test]
fn test_change_data_type_cases() {
    let mut space = AddressSpace::with_core_model();
    let scalar = space
        .create_node(NodeSpec::variable("Scalar", ns0(DataTypeIds::UINT32)).with_value(42u32))
        .unwrap();
    let array = space
        .create_node(
            NodeSpec::variable("Array", ns0(DataTypeIds::UINT32))
                .with_value_rank(1)
                .with_value(vec![42u32, 23]),
        )
        .unwrap();
    let empty = space
        .create_node(NodeSpec::variable("Empty", ns0(DataTypeIds::UINT32)))
        .unwrap();

    space.change_data_type(&scalar, &ns0(DataTypeIds::INT32)).unwrap();
    space.change_data_type(&array, &ns0(DataTypeIds::INT32)).unwrap();
    space.change_data_type(&empty, &ns0(DataTypeIds::STRUCTURE)).unwrap();

    ModelAssertions::new(&space)
        .assert_value(&scalar, &Variant::Int32(42))
        .assert_value(&array, &Variant::from(vec![42i32, 23]))
        .assert_value(&empty, &Variant::from(ExtensionObject::null()));
}

fn fixture_name(ns: u16, name: &str) -> infomodel_core::QualifiedName {
    infomodel_core::QualifiedName::new(ns, name)
}
