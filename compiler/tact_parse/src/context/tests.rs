#![allow(clippy::unwrap_used, clippy::expect_used)]

use super::*;
use pretty_assertions::assert_eq;
use tact_ir::StringInterner;

const ROBOT: &str = r#"{
    "structs": [
        { "name": "pose", "fields": [["x", "double"], ["y", "double"]] }
    ],
    "attributes": { "ready": "bool" },
    "queries": { "distance": { "params": ["double"], "returns": "double" } },
    "commands": { "home": {} },
    "peers": {
        "arm": {
            "attributes": { "target": "pose" },
            "commands": { "move_to": { "params": ["pose", "int"] } }
        }
    }
}"#;

fn robot(interner: &StringInterner) -> Component {
    let spec: ComponentSpec = serde_json::from_str(ROBOT).unwrap();
    spec.build(interner).unwrap()
}

#[test]
fn test_root_members_resolve() {
    let interner = StringInterner::new();
    let component = robot(&interner);
    let root = ComponentPath::root();

    assert_eq!(
        component.lookup(&root, interner.intern("ready"), MemberKind::Attribute),
        Some(Member::Attribute(ValueType::Bool))
    );
    assert_eq!(
        component.lookup(&root, interner.intern("distance"), MemberKind::Query),
        Some(Member::Query(Signature::query(
            vec![ValueType::Double],
            ValueType::Double
        )))
    );
    assert_eq!(
        component.lookup(&root, interner.intern("home"), MemberKind::Command),
        Some(Member::Command(Signature::command(Vec::new())))
    );
}

#[test]
fn test_kind_must_match() {
    let interner = StringInterner::new();
    let component = robot(&interner);
    let root = ComponentPath::root();
    assert_eq!(
        component.lookup(&root, interner.intern("home"), MemberKind::Attribute),
        None
    );
}

#[test]
fn test_peer_members_resolve_through_path() {
    let interner = StringInterner::new();
    let component = robot(&interner);
    let arm = interner.intern("arm");
    let pose = component.struct_type(interner.intern("pose")).unwrap();

    assert_eq!(
        component.lookup(&ComponentPath::root(), arm, MemberKind::Peer),
        Some(Member::Peer)
    );
    let path = ComponentPath::from_peers([arm]);
    assert_eq!(
        component.lookup(&path, interner.intern("move_to"), MemberKind::Command),
        Some(Member::Command(Signature::command(vec![
            ValueType::Struct(pose),
            ValueType::Int
        ])))
    );
    // Root members are not visible through a peer path.
    assert_eq!(
        component.lookup(&path, interner.intern("home"), MemberKind::Command),
        None
    );
}

#[test]
fn test_unknown_peer_path() {
    let interner = StringInterner::new();
    let component = robot(&interner);
    let path = ComponentPath::from_peers([interner.intern("leg")]);
    assert_eq!(
        component.lookup(&path, interner.intern("ready"), MemberKind::Attribute),
        None
    );
}

#[test]
fn test_unknown_type_is_rejected() {
    let interner = StringInterner::new();
    let spec: ComponentSpec =
        serde_json::from_str(r#"{ "attributes": { "speed": "float" } }"#).unwrap();
    assert_eq!(
        spec.build(&interner).unwrap_err(),
        ContextError::UnknownType {
            ty: "float".to_string(),
            owner: "attribute `speed`".to_string(),
        }
    );
}

#[test]
fn test_duplicate_struct_is_rejected() {
    let interner = StringInterner::new();
    let spec: ComponentSpec = serde_json::from_str(
        r#"{ "structs": [ { "name": "p", "fields": [] }, { "name": "p", "fields": [] } ] }"#,
    )
    .unwrap();
    assert_eq!(
        spec.build(&interner).unwrap_err(),
        ContextError::DuplicateStruct("p".to_string())
    );
}

#[test]
fn test_unknown_fields_fail_to_deserialize() {
    assert!(serde_json::from_str::<ComponentSpec>(r#"{ "methods": {} }"#).is_err());
}

#[test]
fn test_query_needs_result_type() {
    let interner = StringInterner::new();
    let spec: ComponentSpec =
        serde_json::from_str(r#"{ "queries": { "probe": { "params": [] } } }"#).unwrap();
    assert_eq!(
        spec.build(&interner).unwrap_err(),
        ContextError::MissingResult("probe".to_string())
    );
}
