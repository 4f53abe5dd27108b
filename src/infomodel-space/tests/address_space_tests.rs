//! Integration tests for namespaces, the reference graph and lifecycle.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use common_config::{BrowseNamePolicy, ModelConfig};
use common_error::ModelError;
use infomodel_core::well_known::{DataTypeIds, ObjectIds, ReferenceTypeIds, ns0};
use infomodel_core::{NodeId, QualifiedName, Variant};
use infomodel_space::testing::{ModelAssertions, ModelFixture};
use infomodel_space::*;
use proptest::prelude::*;

fn objects() -> NodeId {
    ns0(ObjectIds::OBJECTS_FOLDER)
}

#[test]
fn test_resolve_round_trip() {
    let mut space = AddressSpace::with_core_model();
    space.register_namespace("urn:a").unwrap();
    space.register_namespace("urn:b").unwrap();
    for text in [
        "ns=0;i=85",
        "ns=1;s=Pump;Inlet",
        "ns=1;s=a/b:c",
        "ns=2;s=Line[3]/Station[1:2]",
        "ns=2;g=72962b91-fa75-4ae6-8d28-b404dc7daf63",
        "ns=1;b=AAEC",
    ] {
        assert_eq!(space.resolve_node_id(text).unwrap().to_string(), text);
    }
    assert!(matches!(
        space.resolve_node_id("ns=1;x=1"),
        Err(ModelError::InvalidIdentifierSyntax(_))
    ));
}

#[test]
fn test_aliases_resolve_first() {
    let mut space = AddressSpace::with_core_model();
    let ns = space.register_namespace("urn:alias").unwrap();
    space.add_alias("HasComponent", ns0(ReferenceTypeIds::HAS_COMPONENT)).unwrap();
    space
        .add_alias(&format!("{ns}:Pump"), NodeId::string(ns, "Plant.Pump"))
        .unwrap();

    assert_eq!(
        space.resolve_node_id("HasComponent").unwrap(),
        ns0(ReferenceTypeIds::HAS_COMPONENT)
    );
    assert_eq!(
        space.resolve_node_id(&format!("{ns}:Pump")).unwrap(),
        NodeId::string(ns, "Plant.Pump")
    );
}

#[test]
fn test_register_namespace_idempotent() {
    let mut space = AddressSpace::create();
    let a = space.register_namespace("urn:a").unwrap();
    let b = space.register_namespace("urn:b").unwrap();
    assert_eq!(space.register_namespace("urn:a").unwrap(), a);
    assert!(b > a);
    assert_eq!(space.namespace("urn:b").unwrap().index(), b);
    assert!(matches!(
        space.namespace(9u16),
        Err(ModelError::UnknownNamespace(_))
    ));
}

#[test]
fn test_add_reference_is_symmetric() {
    let mut space = AddressSpace::with_core_model();
    let a = space.create_node(NodeSpec::object("A").organized_by(objects())).unwrap();
    let b = space.create_node(NodeSpec::object("B").organized_by(objects())).unwrap();
    let has_component = ns0(ReferenceTypeIds::HAS_COMPONENT);
    space.add_reference(&a, &has_component, &b, true).unwrap();
    space.add_reference(&a, &has_component, &b, true).unwrap();

    let inverse = space
        .find_references(&b, &ns0(ReferenceTypeIds::HIERARCHICAL_REFERENCES), false, true)
        .unwrap();
    assert!(inverse.iter().any(|r| r.target == a && r.reference_type == has_component));
    let forward = space.find_references(&a, &has_component, true, false).unwrap();
    assert_eq!(forward.iter().filter(|r| r.target == b).count(), 1);

    ModelAssertions::new(&space).assert_references_mirrored();

    assert!(matches!(
        space.add_reference(&a, &NodeId::numeric(0, 65_000), &b, true),
        Err(ModelError::UnknownReferenceType(_))
    ));
}

#[test]
fn test_remove_reference_tolerates_missing() {
    let mut space = AddressSpace::with_core_model();
    let a = space.create_node(NodeSpec::object("A")).unwrap();
    let b = space.create_node(NodeSpec::object("B")).unwrap();
    let organizes = ns0(ReferenceTypeIds::ORGANIZES);
    space.add_reference(&a, &organizes, &b, true).unwrap();

    assert!(space.remove_reference(&b, &organizes, &a, false).unwrap());
    assert!(!space.remove_reference(&a, &organizes, &b, true).unwrap());
    assert!(space.find_references(&a, &organizes, true, false).unwrap().is_empty());
}

#[test]
fn test_delete_child_from_either_side() {
    let has_component = ns0(ReferenceTypeIds::HAS_COMPONENT);
    for held_by_parent in [true, false] {
        let mut space = AddressSpace::with_core_model();
        let parent = space.create_node(NodeSpec::object("Parent")).unwrap();
        let child = space.create_node(NodeSpec::object("Child")).unwrap();
        if held_by_parent {
            space.add_reference(&parent, &has_component, &child, true).unwrap();
        } else {
            space.add_reference(&child, &has_component, &parent, false).unwrap();
        }
        assert_eq!(space.component_by_name(&parent, "Child"), Some(child.clone()));

        space.delete_node(&child).unwrap();
        assert!(!space.contains_node(&child));
        assert!(space
            .find_references(&parent, &has_component, true, true)
            .unwrap()
            .is_empty());
        assert_eq!(space.component_by_name(&parent, "Child"), None);
        space.delete_node(&child).unwrap();
    }
}

#[test]
fn test_delete_cascades_to_owned_children() {
    let mut fixture = ModelFixture::machine_library();
    let machine = fixture.node_id("MachineType");
    let space = fixture.space_mut();
    let instance = space
        .instantiate(
            &machine,
            InstantiateOptions::new(QualifiedName::new(1, "Press")).organized_by(objects()),
        )
        .unwrap();
    let motor = space.child_by_name(&instance, "Motor").unwrap();
    let before = space.node_count();

    space.delete_node(&instance).unwrap();
    assert!(!space.contains_node(&motor));
    assert_eq!(space.node_count(), before - 6);
    let organized = space.browse(
        &BrowseDescription::new(objects())
            .with_reference_type(ns0(ReferenceTypeIds::ORGANIZES), false),
    );
    assert!(organized.references.is_empty());
}

#[test]
fn test_pending_references_attach_later() {
    let mut space = AddressSpace::with_core_model();
    let ns = space.register_namespace("urn:loader").unwrap();
    let later = NodeId::string(ns, "Later");
    let early = space
        .create_node(
            NodeSpec::object(QualifiedName::new(ns, "Early"))
                .reference(ns0(ReferenceTypeIds::ORGANIZES), later.clone(), true),
        )
        .unwrap();
    assert_eq!(space.check_unresolved_references().len(), 1);

    space
        .create_node(NodeSpec::object(QualifiedName::new(ns, "Later")).with_node_id(later.clone()))
        .unwrap();
    assert!(space.check_unresolved_references().is_empty());
    let inverse = space
        .find_references(&later, &ns0(ReferenceTypeIds::ORGANIZES), false, false)
        .unwrap();
    assert_eq!(inverse[0].target, early);
}

#[test]
fn test_duplicate_browse_names() {
    let mut space = AddressSpace::with_core_model();
    space.create_node(NodeSpec::object("Twin").organized_by(objects())).unwrap();
    space.create_node(NodeSpec::object("Twin").organized_by(objects())).unwrap();
    assert!(matches!(
        space.warnings(),
        [ModelWarning::DuplicateBrowseName { .. }]
    ));

    let config = ModelConfig::default().with_browse_name_policy(BrowseNamePolicy::Reject);
    let mut strict = AddressSpace::with_core_model_and_config(config);
    strict.create_node(NodeSpec::object("Twin").organized_by(objects())).unwrap();
    let before = strict.node_count();
    assert!(matches!(
        strict.create_node(NodeSpec::object("Twin").organized_by(objects())),
        Err(ModelError::DuplicateBrowseName(_))
    ));
    assert_eq!(strict.node_count(), before);
}

#[test]
fn test_duplicate_node_id() {
    let mut space = AddressSpace::with_core_model();
    assert!(matches!(
        space.create_node(NodeSpec::object("Again").with_node_id(objects())),
        Err(ModelError::DuplicateNodeId(_))
    ));
}

#[test]
fn test_browse_filters() {
    let mut space = AddressSpace::with_core_model();
    let pump = space.create_node(NodeSpec::object("Pump").organized_by(objects())).unwrap();
    space
        .create_node(NodeSpec::variable("Speed", ns0(DataTypeIds::DOUBLE)).component_of(pump.clone()))
        .unwrap();
    space
        .create_node(NodeSpec::variable("Model", ns0(DataTypeIds::STRING)).property_of(pump.clone()))
        .unwrap();

    let all = space.browse(&BrowseDescription::new(pump.clone()));
    assert_eq!(all.references.len(), 2);
    let properties = space.browse(
        &BrowseDescription::new(pump.clone())
            .with_reference_type(ns0(ReferenceTypeIds::HAS_PROPERTY), false),
    );
    assert_eq!(properties.references.len(), 1);
    assert_eq!(properties.references[0].browse_name.name, "Model");

    let path = space
        .translate_browse_path(&objects(), &[QualifiedName::from("Pump"), QualifiedName::from("Speed")])
        .unwrap();
    assert_eq!(space.node(&path).unwrap().browse_name().name, "Speed");
}

#[tokio::test]
async fn test_shutdown_order() {
    let mut space = AddressSpace::with_core_model();
    let observed = Arc::new(Mutex::new(Vec::new()));
    for (name, delay) in [("T1", 10u64), ("T2", 0)] {
        let observed = Arc::clone(&observed);
        space
            .register_shutdown_task(move || async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                observed.lock().unwrap().push(name);
            })
            .unwrap();
    }
    space.shutdown().await.unwrap();
    assert_eq!(*observed.lock().unwrap(), vec!["T1", "T2"]);
}

#[tokio::test]
async fn test_dispose_releases_bound_values() {
    let mut weak_sources = Vec::new();
    for _ in 0..20 {
        let mut fixture = ModelFixture::machine_library();
        let machine = fixture.node_id("MachineType");
        let space = fixture.space_mut();
        let instance = space
            .instantiate(&machine, InstantiateOptions::new("Machine").organized_by(objects()))
            .unwrap();
        let status = space.child_by_name(&instance, "Status").unwrap();

        let counter = Arc::new(AtomicU32::new(0));
        let source = Arc::new(FnValueSource::new(move |_| {
            Ok(Variant::Int32(counter.fetch_add(1, Ordering::SeqCst) as i32))
        }));
        weak_sources.push(Arc::downgrade(&source));
        space.bind_value(&status, source).unwrap();
        assert!(space.read_value(&status, None).await.status.is_good());

        space.dispose();
        assert_eq!(space.node_count(), 0);
        assert!(weak_sources.last().is_some_and(|weak| weak.upgrade().is_none()));
        assert!(matches!(
            space.instantiate(&machine, InstantiateOptions::new("Again")),
            Err(ModelError::AddressSpaceDisposed)
        ));
    }
    assert!(weak_sources.iter().all(|weak| weak.upgrade().is_none()));
}

proptest! {
    #[test]
    fn prop_string_ids_resolve(name in "[A-Za-z0-9;:/\\[\\]._-]{1,24}") {
        let mut space = AddressSpace::create();
        let ns = space.register_namespace("urn:prop").unwrap();
        let id = NodeId::string(ns, name);
        let text = id.to_string();
        prop_assert_eq!(space.resolve_node_id(&text).unwrap(), id);
    }

    #[test]
    fn prop_namespace_indices_increase(uris in proptest::collection::btree_set("[a-z]{1,8}", 1..10)) {
        let mut space = AddressSpace::create();
        let mut last = 0u16;
        for uri in &uris {
            let index = space.register_namespace(uri).unwrap();
            prop_assert!(index > last);
            prop_assert_eq!(space.register_namespace(uri).unwrap(), index);
            last = index;
        }
    }
}
