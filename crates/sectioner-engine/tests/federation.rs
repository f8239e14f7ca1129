// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end classification runs against the in-memory host

use sectioner_engine::{
    classify, classify_with_cancellation, find_by_section, CancellationToken,
    ClassificationConfig, Eligibility, PredicateKind, PredicateOverride, ScopeStatus,
    SyncOutcome,
};
use sectioner_model::{
    Aabb, Attribute, AttributeValue, Category, Document, Element, ElementId, GeometryNode, LinkId,
    LinkReference, LocationKind, Solid,
};
use sectioner_store::{
    CentralStore, DocumentData, FsCentral, HostEvent, InMemoryCentral, MemoryDocument, MemoryHost,
};

const TARGET: &str = "BS_Блок";
const LABEL: &str = "Группа модели";

fn form(id: u64, label: &str, min: [f64; 3], max: [f64; 3]) -> Element {
    let bounds = Aabb::new(min, max);
    Element::new(id)
        .with_category(Category::Mass)
        .with_bounds(bounds)
        .with_geometry(GeometryNode::solid(Solid::cuboid(&bounds)))
        .with_attribute(Attribute::new(LABEL, label))
}

fn wall(id: u64, min: [f64; 3], max: [f64; 3]) -> Element {
    let bounds = Aabb::new(min, max);
    Element::new(id)
        .with_category(Category::Walls)
        .with_type(900u64)
        .with_location(LocationKind::Curve)
        .with_bounds(bounds)
        .with_geometry(GeometryNode::solid(Solid::cuboid(&bounds)))
        .with_attribute(Attribute::empty(TARGET))
}

fn linked(name: &str, elements: Vec<Element>) -> DocumentData {
    DocumentData {
        name: name.into(),
        elements,
        ..Default::default()
    }
}

fn primary() -> MemoryDocument {
    MemoryDocument::new("Корпус 1")
        .with_element(form(100, "Секция 01", [0.0; 3], [10.0; 3]))
        .with_element(form(101, "Секция 02", [10.0, 0.0, 0.0], [20.0, 10.0, 10.0]))
}

fn zone_in<C: CentralStore>(host: &MemoryHost<C>, path: &str, id: u64) -> Option<String> {
    let data = host.central().load(path).ok()?;
    let element = data.elements.iter().find(|e| e.id == ElementId(id))?;
    element.attribute_str(TARGET).map(str::to_string)
}

/// Value in the host's local copy, written at commit time
fn local_zone_in<C: CentralStore>(host: &MemoryHost<C>, path: &str, id: u64) -> Option<String> {
    let data = host.local_copy(path)?;
    let element = data.elements.iter().find(|e| e.id == ElementId(id))?;
    element.attribute_str(TARGET).map(str::to_string)
}

fn two_link_host() -> MemoryHost {
    let central = InMemoryCentral::new()
        .with_document(
            "ar.json",
            linked(
                "Корпус 1_АР",
                vec![wall(1, [1.0; 3], [2.0; 3]), wall(2, [12.0, 1.0, 1.0], [13.0, 2.0, 2.0])],
            ),
        )
        .with_document(
            "kr.json",
            linked("Корпус 1_КР", vec![wall(1, [3.0; 3], [4.0; 3])]),
        );
    MemoryHost::new(primary(), central)
        .with_link(LinkReference::new(1, "Корпус 1_АР", "ar.json"))
        .with_link(LinkReference::new(2, "Корпус 1_КР", "kr.json"))
}

#[test]
fn test_overlap_and_fully_inside_scenario() {
    let doc = |straddle: Element| {
        MemoryDocument::new("Primary")
            .with_element(form(100, "A", [0.0; 3], [10.0; 3]))
            .with_element(wall(1, [2.0; 3], [3.0; 3]))
            .with_element(straddle)
    };

    let mut overlap = MemoryHost::new(doc(wall(2, [9.0; 3], [11.0; 3])), InMemoryCentral::new());
    classify(&mut overlap, &ClassificationConfig::default()).unwrap();
    let primary = overlap.primary_document();
    assert_eq!(primary.element(ElementId(1)).unwrap().attribute_str(TARGET), Some("A"));
    assert_eq!(primary.element(ElementId(2)).unwrap().attribute_str(TARGET), Some("A"));

    let mut config = ClassificationConfig::default();
    config.predicate.default = PredicateKind::FullyInside;
    let mut fully = MemoryHost::new(doc(wall(2, [9.0; 3], [11.0; 3])), InMemoryCentral::new());
    classify(&mut fully, &config).unwrap();
    let primary = fully.primary_document();
    assert_eq!(primary.element(ElementId(1)).unwrap().attribute_str(TARGET), Some("A"));
    assert_eq!(primary.element(ElementId(2)).unwrap().attribute_str(TARGET), None);
}

#[test]
fn test_duplicate_labels_with_disjoint_volumes() {
    let doc = MemoryDocument::new("Primary")
        .with_element(form(100, "B", [0.0; 3], [10.0; 3]))
        .with_element(form(101, "B", [50.0; 3], [60.0; 3]))
        .with_element(wall(1, [52.0; 3], [53.0; 3]));
    let mut host = MemoryHost::new(doc, InMemoryCentral::new());

    let report = classify(&mut host, &ClassificationConfig::default()).unwrap();
    let element = host.primary_document().element(ElementId(1)).unwrap();
    assert_eq!(element.attribute_str(TARGET), Some("B"));

    let sections = &report.scope("Primary").unwrap().sections;
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0].candidates, 0);
    assert_eq!(sections[1].writes, 1);
}

#[test]
fn test_links_are_classified_and_synchronized() {
    let mut host = two_link_host();
    let report = classify(&mut host, &ClassificationConfig::default()).unwrap();

    assert!(report.is_success(), "{report}");
    assert_eq!(zone_in(&host, "ar.json", 1).as_deref(), Some("Секция 01"));
    assert_eq!(zone_in(&host, "ar.json", 2).as_deref(), Some("Секция 02"));
    assert_eq!(zone_in(&host, "kr.json", 1).as_deref(), Some("Секция 01"));

    let ar = report.scope("Корпус 1_АР").unwrap();
    assert_eq!(ar.committed_writes(), 2);
    assert_eq!(ar.sync, Some(SyncOutcome::Synchronized));
    assert!(host.events().contains(&HostEvent::Closed {
        name: "Корпус 1_АР".into(),
        saved: false,
    }));
}

#[test]
fn test_unresolved_link_is_skipped() {
    let mut host = two_link_host().with_link(LinkReference::unresolved(3, "Корпус 1_ОВ"));
    let report = classify(&mut host, &ClassificationConfig::default()).unwrap();

    let skipped = report.scope("Корпус 1_ОВ").unwrap();
    assert_eq!(skipped.status, ScopeStatus::Skipped);
    assert!(skipped.sections.is_empty());
    assert!(report.is_success());
    assert_eq!(zone_in(&host, "kr.json", 1).as_deref(), Some("Секция 01"));
}

#[test]
fn test_read_only_target_is_untouched() {
    let locked = wall(5, [1.0; 3], [2.0; 3]);
    let locked = Element {
        attributes: vec![Attribute::new(TARGET, "Секция 99").read_only()],
        ..locked
    };
    let doc = primary().with_element(locked.clone());
    let mut host = MemoryHost::new(doc, InMemoryCentral::new());

    let report = classify(&mut host, &ClassificationConfig::default()).unwrap();
    assert_eq!(host.primary_document().element(ElementId(5)), Some(&locked));
    assert_eq!(
        report.scope("Корпус 1").unwrap().section("Секция 01").unwrap().skipped_read_only,
        1
    );
}

#[test]
fn test_unlabelled_form_contributes_nothing() {
    let blank = Element {
        attributes: vec![Attribute::new(LABEL, AttributeValue::Null)],
        ..form(102, "", [0.0; 3], [100.0; 3])
    };
    let doc = MemoryDocument::new("Primary")
        .with_element(blank)
        .with_element(wall(1, [50.0; 3], [51.0; 3]));
    let mut host = MemoryHost::new(doc, InMemoryCentral::new());

    let report = classify(&mut host, &ClassificationConfig::default()).unwrap();
    assert!(report.scope("Primary").unwrap().sections.is_empty());
    let element = host.primary_document().element(ElementId(1)).unwrap();
    assert_eq!(element.attribute_str(TARGET), None);
}

#[test]
fn test_second_run_is_idempotent() {
    let mut host = two_link_host();
    let config = ClassificationConfig::default();
    let first = classify(&mut host, &config).unwrap();
    assert_eq!(first.committed_writes(), 3);

    let ar_before = host.central().document("ar.json").cloned();
    let second = classify(&mut host, &config).unwrap();
    assert_eq!(second.committed_writes(), 0);
    assert_eq!(host.central().document("ar.json").cloned(), ar_before);
    for scope in &second.scopes {
        assert!(scope.sync.is_none(), "nothing to synchronize in {}", scope.scope);
    }
}

#[test]
fn test_commit_failure_is_contained_to_its_link() {
    let mut host = two_link_host();
    let mut locked = host.central().load("ar.json").unwrap();
    locked.locked_by = Some("другой пользователь".into());
    *host.central_mut() = host.central().clone().with_document("ar.json", locked);

    let report = classify(&mut host, &ClassificationConfig::default()).unwrap();
    let ar = report.scope("Корпус 1_АР").unwrap();
    assert_eq!(ar.status, ScopeStatus::Failed);
    assert!(ar.sync.is_none());
    assert_eq!(zone_in(&host, "ar.json", 1), None);

    let kr = report.scope("Корпус 1_КР").unwrap();
    assert_eq!(kr.status, ScopeStatus::Committed);
    assert_eq!(zone_in(&host, "kr.json", 1).as_deref(), Some("Секция 01"));
    assert!(!report.is_success());
}

#[test]
fn test_sync_failure_is_not_fatal() {
    let mut host = two_link_host();
    host.central_mut().set_read_only("ar.json");

    let report = classify(&mut host, &ClassificationConfig::default()).unwrap();
    let ar = report.scope("Корпус 1_АР").unwrap();
    assert_eq!(ar.status, ScopeStatus::Committed);
    assert!(matches!(ar.sync, Some(SyncOutcome::Failed { .. })));
    assert!(report.warnings.iter().any(|w| w.contains("synchronize failed")));

    assert_eq!(zone_in(&host, "kr.json", 1).as_deref(), Some("Секция 01"));
    assert!(report.is_success());

    // Committed writes survive the failed synchronize in the local copy
    assert_eq!(zone_in(&host, "ar.json", 1), None);
    assert_eq!(local_zone_in(&host, "ar.json", 1).as_deref(), Some("Секция 01"));
}

#[test]
fn test_commits_persist_without_synchronize() {
    let mut host = two_link_host();
    let mut config = ClassificationConfig::default();
    config.federation.synchronize = false;

    let report = classify(&mut host, &config).unwrap();
    let ar = report.scope("Корпус 1_АР").unwrap();
    assert_eq!(ar.status, ScopeStatus::Committed);
    assert_eq!(ar.committed_writes(), 2);
    assert!(ar.sync.is_none());

    for path in ["ar.json", "kr.json"] {
        assert_eq!(zone_in(&host, path, 1), None);
        assert_eq!(local_zone_in(&host, path, 1).as_deref(), Some("Секция 01"));
    }
    assert!(!host
        .events()
        .iter()
        .any(|e| matches!(e, HostEvent::Synchronized(_))));
}

#[test]
fn test_open_failure_skips_only_that_link() {
    let template = two_link_host();
    let mut host = MemoryHost::new(primary(), template.central().clone())
        .with_link(LinkReference::new(9, "Корпус 1_ВК", "missing.json"))
        .with_link(template.link(LinkId(1)).unwrap().clone())
        .with_link(template.link(LinkId(2)).unwrap().clone());

    let report = classify(&mut host, &ClassificationConfig::default()).unwrap();
    assert_eq!(report.scope("Корпус 1_ВК").unwrap().status, ScopeStatus::Failed);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(zone_in(&host, "ar.json", 1).as_deref(), Some("Секция 01"));
    assert_eq!(zone_in(&host, "kr.json", 1).as_deref(), Some("Секция 01"));
    assert_eq!(report.reloaded_links, vec![LinkId(9), LinkId(1), LinkId(2)]);
}

#[test]
fn test_links_are_reloaded_after_the_run() {
    let central = InMemoryCentral::new()
        .with_document("ar.json", linked("AR", vec![wall(1, [1.0; 3], [2.0; 3])]))
        .with_document("nested.json", linked("Nested", vec![]))
        .with_document("off.json", linked("Off", vec![]));
    let mut host = MemoryHost::new(primary(), central)
        .with_link(LinkReference::new(1, "AR", "ar.json"))
        .with_link(LinkReference::new(2, "Nested", "nested.json").nested())
        .with_link(LinkReference::new(3, "Off", "off.json").with_loaded(false));

    let report = classify(&mut host, &ClassificationConfig::default()).unwrap();
    assert_eq!(report.reloaded_links, vec![LinkId(1)]);

    let events = host.events();
    assert_eq!(events.first(), Some(&HostEvent::Unloaded(LinkId(1))));
    assert_eq!(events.last(), Some(&HostEvent::Reloaded(LinkId(1))));
    assert!(!events.contains(&HostEvent::Unloaded(LinkId(2))));
    assert!(!events.contains(&HostEvent::Unloaded(LinkId(3))));
    assert!(host.link(LinkId(1)).unwrap().loaded);
    assert!(!host.link(LinkId(3)).unwrap().loaded);
}

#[test]
fn test_link_name_filter() {
    let mut host = two_link_host();
    let mut config = ClassificationConfig::default();
    config.federation.link_name_contains = Some("АР".into());
    config.federation.process_primary = false;

    let report = classify(&mut host, &config).unwrap();
    assert_eq!(report.scopes.len(), 2);
    assert_eq!(report.scope("Корпус 1_КР").unwrap().status, ScopeStatus::Skipped);
    assert_eq!(zone_in(&host, "kr.json", 1), None);
    assert_eq!(zone_in(&host, "ar.json", 1).as_deref(), Some("Секция 01"));
}

#[test]
fn test_solid_override_for_matching_links() {
    // Wedge form: x + y <= 10 inside the 10 x 10 x 10 box
    let wedge = sectioner_model::Shell::new(vec![
        vec![[0.0, 0.0, 0.0], [0.0, 10.0, 0.0], [10.0, 0.0, 0.0]],
        vec![[0.0, 0.0, 10.0], [10.0, 0.0, 10.0], [0.0, 10.0, 10.0]],
        vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0], [10.0, 0.0, 10.0], [0.0, 0.0, 10.0]],
        vec![[0.0, 0.0, 0.0], [0.0, 0.0, 10.0], [0.0, 10.0, 10.0], [0.0, 10.0, 0.0]],
        vec![[10.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 10.0, 10.0], [10.0, 0.0, 10.0]],
    ]);
    let form = Element {
        geometry: vec![GeometryNode::solid(Solid::new(vec![wedge]))],
        ..form(100, "W", [0.0; 3], [10.0; 3])
    };
    let corner = || wall(1, [8.0, 8.0, 0.0], [9.5, 9.5, 2.0]);
    let central = InMemoryCentral::new()
        .with_document("ar.json", linked("Корпус_АР", vec![corner()]))
        .with_document("kr.json", linked("Корпус_КР", vec![corner()]));
    let mut host = MemoryHost::new(MemoryDocument::new("Primary").with_element(form), central)
        .with_link(LinkReference::new(1, "Корпус_АР", "ar.json"))
        .with_link(LinkReference::new(2, "Корпус_КР", "kr.json"));

    let mut config = ClassificationConfig::default();
    config.predicate.overrides.push(PredicateOverride {
        scope_name_contains: Some("АР".into()),
        categories: vec![Category::Walls],
        kind: PredicateKind::SolidIntersect,
    });

    classify(&mut host, &config).unwrap();
    assert_eq!(zone_in(&host, "ar.json", 1), None);
    assert_eq!(zone_in(&host, "kr.json", 1).as_deref(), Some("W"));
}

#[test]
fn test_cancelled_run_touches_nothing() {
    let mut host = two_link_host();
    let token = CancellationToken::new();
    token.cancel();

    let report =
        classify_with_cancellation(&mut host, &ClassificationConfig::default(), token).unwrap();
    assert!(report.cancelled);
    assert!(report.scopes.iter().all(|s| s.status == ScopeStatus::Cancelled));
    assert_eq!(zone_in(&host, "ar.json", 1), None);
    assert!(host.events().is_empty());
}

#[test]
fn test_file_backed_federation() {
    let dir = tempfile::tempdir().unwrap();
    let mut central = FsCentral::new(dir.path());
    central
        .store(
            "links/ar.json",
            &linked("AR", vec![wall(1, [1.0; 3], [2.0; 3])]),
        )
        .unwrap();

    let mut host = MemoryHost::new(primary(), central)
        .with_link(LinkReference::new(1, "AR", "links/ar.json"));
    let report = classify(&mut host, &ClassificationConfig::default()).unwrap();
    assert!(report.is_success());

    let on_disk = DocumentData::load(&dir.path().join("links/ar.json")).unwrap();
    let doc = MemoryDocument::from_data(on_disk);
    let found = find_by_section(&doc, TARGET, "Секция 01", &Eligibility::new(Category::Mass));
    assert_eq!(found, vec![ElementId(1)]);
}
