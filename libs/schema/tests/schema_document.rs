//! Integration tests for schema documents produced by the schema compiler

use schema::{
    openflow, ClassSpec, LayoutSpec, MemberSpec, MemberType, ProtocolVersion, SchemaBuilder,
    SchemaDocument, SchemaError, OPENFLOW_SCHEMA,
};

#[test]
fn test_bundled_document_survives_json_conversion() {
    let doc = SchemaDocument::from_toml_str(OPENFLOW_SCHEMA).expect("bundled schema parses");
    let class_count = doc.classes.len();

    let json = serde_json::to_string(&doc).expect("document serializes");
    let reparsed = SchemaDocument::from_json_str(&json).expect("json reparses");
    let schema = reparsed.build().expect("json schema builds");

    assert_eq!(schema.len(), class_count);
    assert_eq!(schema.len(), openflow().unwrap().len());
}

#[test]
fn test_unassigned_wire_id_is_kept_as_none() {
    let schema = SchemaBuilder::new("hdr")
        .class(ClassSpec {
            name: "hdr".into(),
            is_abstract: true,
            layouts: vec![LayoutSpec {
                versions: vec![1, 4],
                base_length: 8,
                discriminator: Some(schema::Discriminator { offset: 1, width: 1 }),
                ..Default::default()
            }],
            ..Default::default()
        })
        .class(ClassSpec {
            name: "late".into(),
            parent: Some("hdr".into()),
            layouts: vec![
                LayoutSpec {
                    versions: vec![1],
                    base_length: 8,
                    ..Default::default()
                },
                LayoutSpec {
                    versions: vec![4],
                    base_length: 8,
                    wire_id: Some(40),
                    ..Default::default()
                },
            ],
            ..Default::default()
        })
        .build()
        .expect("schema builds");

    let root = schema.message_root();
    let of10: Vec<_> = schema.subtypes_at(root, ProtocolVersion::Of10).collect();
    let of13: Vec<_> = schema.subtypes_at(root, ProtocolVersion::Of13).collect();
    assert_eq!(of10.len(), 1);
    assert_eq!(of10[0].1, None);
    assert_eq!(of13[0].1, Some(40));
}

#[test]
fn test_member_types_resolve() {
    let schema = openflow().unwrap();
    let packet_out = schema.lookup("of_packet_out").unwrap();
    let layout = schema.layout(packet_out, ProtocolVersion::Of10).unwrap();

    assert_eq!(layout.member("actions_len").unwrap().ty, MemberType::Scalar { width: 2 });
    assert_eq!(layout.member("data").unwrap().ty, MemberType::Opaque);
    let actions = layout.member("actions").unwrap();
    assert_eq!(actions.object(), schema.lookup("of_list_action"));
    assert!(actions.variable_length);

    let layout = schema.layout(packet_out, ProtocolVersion::Of13).unwrap();
    assert_eq!(layout.member("pad").unwrap().ty, MemberType::Pad { len: 6 });
}

#[test]
fn test_inherit_requires_parent_layout() {
    let err = SchemaBuilder::new("hdr")
        .class(ClassSpec {
            name: "hdr".into(),
            is_abstract: true,
            layouts: vec![LayoutSpec {
                versions: vec![1],
                base_length: 8,
                ..Default::default()
            }],
            ..Default::default()
        })
        .class(ClassSpec {
            name: "child".into(),
            parent: Some("hdr".into()),
            inherit: true,
            versions: Some(vec![4]),
            ..Default::default()
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::MissingParentLayout { version: 4, .. }));
}

#[test]
fn test_fixed_class_cannot_hold_variable_member() {
    let err = SchemaBuilder::new("hdr")
        .class(ClassSpec {
            name: "hdr".into(),
            is_abstract: true,
            layouts: vec![LayoutSpec {
                versions: vec![4],
                base_length: 8,
                ..Default::default()
            }],
            ..Default::default()
        })
        .class(ClassSpec {
            name: "blob".into(),
            layouts: vec![LayoutSpec {
                versions: vec![4],
                base_length: 4,
                variable_length: true,
                ..Default::default()
            }],
            ..Default::default()
        })
        .class(ClassSpec {
            name: "holder".into(),
            layouts: vec![LayoutSpec {
                versions: vec![4],
                base_length: 4,
                members: vec![MemberSpec::new("b", 4, "blob")],
                ..Default::default()
            }],
            ..Default::default()
        })
        .build()
        .unwrap_err();
    assert!(matches!(err, SchemaError::FixedClassWithVariableMember { .. }));
}

#[test]
fn test_oversized_member_offset_is_rejected() {
    let json = r#"{
        "message_root": "hdr",
        "class": [
            { "name": "hdr", "abstract": true,
              "layout": [{ "versions": [1], "base_length": 8,
                           "discriminator": { "offset": 1, "width": 1 } }] },
            { "name": "huge", "parent": "hdr", "wire_id": 0,
              "layout": [{ "versions": [1], "base_length": 16,
                           "members": [{ "name": "value", "offset": 18446744073709551615, "type": "u64" }] }] }
        ]
    }"#;
    let err = SchemaDocument::from_json_str(json)
        .expect("document parses")
        .build()
        .unwrap_err();
    match err {
        SchemaError::MemberOutOfBounds {
            class,
            member,
            end,
            base_length,
            ..
        } => {
            assert_eq!(class, "huge");
            assert_eq!(member, "value");
            assert_eq!(end, None);
            assert_eq!(base_length, 16);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn test_discriminator_outside_base_is_rejected() {
    let json = r#"{
        "message_root": "hdr",
        "class": [
            { "name": "hdr", "abstract": true,
              "layout": [{ "versions": [1], "base_length": 8,
                           "discriminator": { "offset": 18446744073709551615, "width": 2 } }] }
        ]
    }"#;
    let err = SchemaDocument::from_json_str(json)
        .expect("document parses")
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        SchemaError::DiscriminatorOutOfBounds { base_length: 8, .. }
    ));
}
