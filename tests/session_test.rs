//! Tests for EditSession: template seeding, revision counting, persistence of old values

use std::sync::Arc;

use rstest::{fixture, rstest};

use proctree::application::{ApplicationError, EditSession};
use proctree::config::Templates;
use proctree::domain::{fields, list_ids, search, DomainError, NodeId, SequentialIds};
use proctree::util::testing;

#[fixture]
fn session() -> EditSession {
    testing::init_test_setup();
    EditSession::new(Templates::default(), Box::new(SequentialIds::new()))
}

#[rstest]
fn given_new_session_when_inspecting_root_then_seeded_from_templates(session: EditSession) {
    let root = session.tree();

    assert_eq!(root.depth(), 0);
    assert_eq!(root.properties(), &fields([("test", "property")]));
    assert_eq!(root.evaluations(), &[fields([("test", "evaluation")])]);
    assert!(root.is_leaf());
    assert_eq!(session.revision(), 0);
}

#[rstest]
fn given_session_when_adding_child_then_child_template_and_revision_bump(
    mut session: EditSession,
) {
    let root = session.root_id();

    let child = session.add_child(&root).unwrap().unwrap();

    let node = search(session.tree(), &child).unwrap();
    assert_eq!(node.properties(), &session.templates().child_properties);
    assert!(node.evaluations().is_empty());
    assert_eq!(node.depth(), 1);
    assert_eq!(session.revision(), 1);
}

#[rstest]
fn given_edits_when_holding_old_tree_then_old_value_unchanged(mut session: EditSession) {
    let root = session.root_id();
    let before = Arc::clone(session.tree());

    let child = session.add_child(&root).unwrap().unwrap();
    session.set_property(&child, "text", "cut");
    session.add_evaluation(&root);

    assert_eq!(list_ids(&before), vec![root]);
    assert_eq!(before.evaluations().len(), 1);
    assert_eq!(session.tree().evaluations().len(), 2);
    assert_eq!(session.revision(), 3);
}

#[rstest]
fn given_stale_ids_when_editing_then_revision_not_bumped(mut session: EditSession) {
    let root = session.root_id();
    let child = session.add_child(&root).unwrap().unwrap();
    assert!(session.remove(&child));
    let revision = session.revision();

    assert!(!session.remove(&child));
    assert!(!session.set_property(&child, "k", "v"));
    assert!(!session.add_evaluation(&child));
    assert!(!session.remove_evaluation(&child, 0).unwrap());
    assert!(!session.set_evaluation_field(&child, 0, "k", "v").unwrap());
    assert_eq!(session.add_child(&child).unwrap(), None);

    assert_eq!(session.revision(), revision);
}

#[rstest]
fn given_root_when_removing_then_refused(mut session: EditSession) {
    let root = session.root_id();
    assert!(!session.remove(&root));
    assert_eq!(list_ids(session.tree()), vec![root]);
}

#[rstest]
fn given_out_of_range_index_when_editing_evaluation_then_domain_error(mut session: EditSession) {
    let root = session.root_id();

    let err = session.remove_evaluation(&root, 5).unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::EvaluationIndexOutOfRange {
            index: 5,
            len: 1,
            ..
        })
    ));

    let err = session.set_evaluation_field(&root, 1, "k", "v").unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::EvaluationIndexOutOfRange { .. })
    ));
    assert_eq!(session.revision(), 0);
}

#[rstest]
fn given_evaluation_when_setting_field_then_only_that_record_changes(mut session: EditSession) {
    let root = session.root_id();
    session.add_evaluation(&root);

    assert!(session.set_evaluation_field(&root, 1, "test", "10").unwrap());

    let evaluations = session.tree().evaluations();
    assert_eq!(evaluations[0], fields([("test", "evaluation")]));
    assert_eq!(
        evaluations[1],
        fields([("evaluation", "template"), ("test", "10")])
    );
}

#[rstest]
fn given_custom_templates_when_starting_then_used_for_new_nodes() {
    let templates = Templates {
        root_properties: fields([("process", "assembly")]),
        root_evaluations: vec![],
        child_properties: fields([("step", "todo")]),
        evaluation: fields([("score", "0")]),
    };
    let mut session = EditSession::new(templates, Box::new(SequentialIds::starting_at(100)));
    let root = session.root_id();
    assert_eq!(root, NodeId::from(uuid::Uuid::from_u128(100)));

    let child = session.add_child(&root).unwrap().unwrap();
    session.add_evaluation(&child);

    let node = search(session.tree(), &child).unwrap();
    assert_eq!(node.properties(), &fields([("step", "todo")]));
    assert_eq!(node.evaluations(), &[fields([("score", "0")])]);
    assert!(session.tree().evaluations().is_empty());
}
