//! Codec Tests
//!
//! Serialization ordering, required/optional/repeated rules, error
//! envelopes, unmapped preservation, and XML round-trips.

use ocilink::codec::{
    deserialize, from_xml, serialize, to_xml, ErrorCode, Response, WireElement, WireValue,
};
use ocilink::entity::{Entity, EntityKind, Scalar, Value};
use ocilink::error::OciError;
use ocilink::schema::{FieldKind, ScalarKind, SchemaCatalog, SchemaDef};

// =============================================================================
// Fixtures
// =============================================================================

/// AddUser command from the protocol docs:
/// [(id, 0, required), (firstName, 1, optional), (services, 2, repeated)]
fn add_user_catalog() -> SchemaCatalog {
    let add_user = SchemaDef::build("AddUser")
        .field("id", "id", true, false, FieldKind::Scalar(ScalarKind::Text))
        .field(
            "first_name",
            "firstName",
            false,
            false,
            FieldKind::Scalar(ScalarKind::Text),
        )
        .field(
            "services",
            "services",
            false,
            true,
            FieldKind::Scalar(ScalarKind::Text),
        )
        .finish()
        .unwrap();

    SchemaCatalog::new(vec![add_user]).unwrap()
}

fn user_profile_catalog() -> SchemaCatalog {
    let address = SchemaDef::build("StreetAddress")
        .field(
            "street",
            "street",
            true,
            false,
            FieldKind::Scalar(ScalarKind::Text),
        )
        .field(
            "city",
            "city",
            true,
            false,
            FieldKind::Scalar(ScalarKind::Text),
        )
        .finish()
        .unwrap();

    let profile = SchemaDef::build("UserProfile")
        .field(
            "user_id",
            "userId",
            true,
            false,
            FieldKind::Scalar(ScalarKind::Text),
        )
        .field(
            "port_count",
            "portCount",
            false,
            false,
            FieldKind::Scalar(ScalarKind::Int),
        )
        .field(
            "enabled",
            "enabled",
            false,
            false,
            FieldKind::Scalar(ScalarKind::Bool),
        )
        .field(
            "addresses",
            "address",
            false,
            true,
            FieldKind::Nested("StreetAddress".to_string()),
        )
        .finish()
        .unwrap();

    SchemaCatalog::new(vec![address, profile]).unwrap()
}

fn wire_names(children: &[WireElement]) -> Vec<&str> {
    children.iter().map(|c| c.name.as_str()).collect()
}

fn root_children(doc: &ocilink::codec::WireDocument) -> &[WireElement] {
    match &doc.root.value {
        WireValue::Children(children) => children,
        WireValue::Text(_) => panic!("expected composite root"),
    }
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn test_sibling_order_follows_schema_not_set_order() {
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    // Set fields in reverse of wire order
    let mut entity = Entity::command("AddUser");
    entity.set("services", vec![Value::from("voicemail")]);
    entity.set("first_name", "Ada");
    entity.set("id", "u1");

    let doc = serialize(&entity, &schema, &catalog).unwrap();
    assert_eq!(doc.root.name, "AddUser");
    assert_eq!(
        wire_names(root_children(&doc)),
        vec!["id", "firstName", "services"]
    );
}

#[test]
fn test_add_user_example_scenario() {
    // {id: "u1", services: ["voicemail", "callerid"]}, firstName absent
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let entity = Entity::command("AddUser")
        .with("id", "u1")
        .with("services", vec!["voicemail", "callerid"]);

    let doc = serialize(&entity, &schema, &catalog).unwrap();
    let children = root_children(&doc);

    // firstName omitted, services preserving submitted order
    assert_eq!(wire_names(children), vec!["id", "services", "services"]);
    assert_eq!(children[1].value, WireValue::Text("voicemail".to_string()));
    assert_eq!(children[2].value, WireValue::Text("callerid".to_string()));
}

#[test]
fn test_repeated_order_preserved_exactly() {
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let entity = Entity::command("AddUser")
        .with("id", "u1")
        .with("services", vec!["c", "a", "b"]);

    let doc = serialize(&entity, &schema, &catalog).unwrap();
    let texts: Vec<_> = root_children(&doc)
        .iter()
        .filter(|c| c.name == "services")
        .map(|c| c.value.clone())
        .collect();
    assert_eq!(
        texts,
        vec![
            WireValue::Text("c".to_string()),
            WireValue::Text("a".to_string()),
            WireValue::Text("b".to_string()),
        ]
    );
}

#[test]
fn test_nested_ordering_recursive() {
    let catalog = user_profile_catalog();
    let schema = catalog.lookup("UserProfile").unwrap();

    let mut address = Entity::generic();
    address.set("city", "Basin City");
    address.set("street", "12 High St");

    let entity = Entity::command("UserProfile")
        .with("user_id", "u9")
        .with("addresses", vec![Value::from(address)]);

    let doc = serialize(&entity, &schema, &catalog).unwrap();
    let children = root_children(&doc);
    assert_eq!(wire_names(children), vec!["userId", "address"]);

    match &children[1].value {
        WireValue::Children(nested) => {
            // street before city, per the nested schema, not set order
            assert_eq!(wire_names(nested), vec!["street", "city"]);
        }
        other => panic!("expected nested children, got {:?}", other),
    }
}

// =============================================================================
// Required / Optional Rules
// =============================================================================

#[test]
fn test_missing_required_field_fails() {
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let entity = Entity::command("AddUser").with("first_name", "Ada");

    match serialize(&entity, &schema, &catalog) {
        Err(OciError::MissingRequiredField(field)) => assert_eq!(field, "AddUser.id"),
        other => panic!("expected MissingRequiredField, got {:?}", other),
    }
}

#[test]
fn test_optional_absent_is_omitted_not_empty() {
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let entity = Entity::command("AddUser").with("id", "u1");

    let doc = serialize(&entity, &schema, &catalog).unwrap();
    assert_eq!(wire_names(root_children(&doc)), vec!["id"]);
}

#[test]
fn test_required_repeated_rejects_empty_sequence() {
    let services_required = SchemaDef::build("AssignServices")
        .field(
            "services",
            "services",
            true,
            true,
            FieldKind::Scalar(ScalarKind::Text),
        )
        .finish()
        .unwrap();
    let catalog = SchemaCatalog::new(vec![services_required]).unwrap();
    let schema = catalog.lookup("AssignServices").unwrap();

    let entity = Entity::command("AssignServices").with("services", Value::List(vec![]));

    assert!(matches!(
        serialize(&entity, &schema, &catalog),
        Err(OciError::MissingRequiredField(_))
    ));
}

#[test]
fn test_repeated_field_requires_sequence_value() {
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let entity = Entity::command("AddUser")
        .with("id", "u1")
        .with("services", "voicemail");

    assert!(matches!(
        serialize(&entity, &schema, &catalog),
        Err(OciError::UnexpectedNesting(_))
    ));
}

#[test]
fn test_scalar_field_rejects_entity_value() {
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let entity = Entity::command("AddUser").with("id", Entity::generic());

    assert!(matches!(
        serialize(&entity, &schema, &catalog),
        Err(OciError::UnexpectedNesting(_))
    ));
}

// =============================================================================
// Round-Trip
// =============================================================================

#[test]
fn test_round_trip_structural_equality() {
    let catalog = user_profile_catalog();
    let schema = catalog.lookup("UserProfile").unwrap();

    let mut home = Entity::generic();
    home.set("street", "12 High St");
    home.set("city", "Basin City");
    let mut office = Entity::generic();
    office.set("street", "1 Main Rd");
    office.set("city", "Springfield");

    let entity = Entity::command("UserProfile")
        .with("user_id", "u42")
        .with("port_count", 3i64)
        .with("enabled", true)
        .with("addresses", vec![Value::from(home), Value::from(office)]);

    let doc = serialize(&entity, &schema, &catalog).unwrap();
    let bytes = to_xml(&doc).unwrap();
    let parsed = from_xml(&bytes).unwrap();

    match deserialize(&parsed, &schema, &catalog).unwrap() {
        Response::Success(round_tripped) => assert_eq!(round_tripped, entity),
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_round_trip_absent_optional_stays_absent() {
    let catalog = user_profile_catalog();
    let schema = catalog.lookup("UserProfile").unwrap();

    let entity = Entity::command("UserProfile").with("user_id", "u1");

    let doc = serialize(&entity, &schema, &catalog).unwrap();
    let parsed = from_xml(&to_xml(&doc).unwrap()).unwrap();

    match deserialize(&parsed, &schema, &catalog).unwrap() {
        Response::Success(round_tripped) => {
            assert_eq!(round_tripped, entity);
            assert!(round_tripped.get("port_count").is_none());
            assert!(round_tripped.get("enabled").is_none());
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_xml_escaping_round_trips() {
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let entity = Entity::command("AddUser").with("id", "a<b>&\"c\"");

    let doc = serialize(&entity, &schema, &catalog).unwrap();
    let bytes = to_xml(&doc).unwrap();
    let parsed = from_xml(&bytes).unwrap();

    match deserialize(&parsed, &schema, &catalog).unwrap() {
        Response::Success(round_tripped) => {
            assert_eq!(
                round_tripped.get("id"),
                Some(&Value::Scalar(Scalar::Text("a<b>&\"c\"".to_string())))
            );
        }
        other => panic!("expected success, got {:?}", other),
    }
}

// =============================================================================
// Deserialization
// =============================================================================

#[test]
fn test_error_envelope_bypasses_schema() {
    // Deserialized against an unrelated schema: the envelope has its own
    // fixed shape
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let xml = br#"<?xml version="1.0" encoding="UTF-8"?>
        <ErrorResponse>
            <errorCode>SCHEMA_VIOLATION</errorCode>
            <summary>element order violated</summary>
        </ErrorResponse>"#;
    let parsed = from_xml(xml).unwrap();

    match deserialize(&parsed, &schema, &catalog).unwrap() {
        Response::Failure { code, message } => {
            assert_eq!(code, ErrorCode::Server("SCHEMA_VIOLATION".to_string()));
            assert_eq!(message, "element order violated");
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[test]
fn test_unknown_wire_elements_preserved_in_order() {
    let catalog = user_profile_catalog();
    let schema = catalog.lookup("UserProfile").unwrap();

    let xml = br#"<UserProfile>
            <userId>u7</userId>
            <newFlag>on</newFlag>
            <newBlock><inner>1</inner></newBlock>
        </UserProfile>"#;
    let parsed = from_xml(xml).unwrap();

    let entity = match deserialize(&parsed, &schema, &catalog).unwrap() {
        Response::Success(entity) => entity,
        other => panic!("expected success, got {:?}", other),
    };

    assert_eq!(
        entity.get("user_id"),
        Some(&Value::Scalar(Scalar::Text("u7".to_string())))
    );
    let unmapped = entity.unmapped();
    assert_eq!(unmapped.len(), 2);
    assert_eq!(unmapped[0].0, "newFlag");
    assert_eq!(
        unmapped[0].1,
        Value::Scalar(Scalar::Text("on".to_string()))
    );
    assert_eq!(unmapped[1].0, "newBlock");
    let nested = unmapped[1].1.as_entity().expect("nested unmapped entity");
    assert_eq!(nested.unmapped()[0].0, "inner");
}

#[test]
fn test_deserialize_retypes_scalars() {
    let catalog = user_profile_catalog();
    let schema = catalog.lookup("UserProfile").unwrap();

    let xml = br#"<UserProfile>
            <userId>u7</userId>
            <portCount>12</portCount>
            <enabled>true</enabled>
        </UserProfile>"#;
    let parsed = from_xml(xml).unwrap();

    let entity = match deserialize(&parsed, &schema, &catalog).unwrap() {
        Response::Success(entity) => entity,
        other => panic!("expected success, got {:?}", other),
    };
    assert_eq!(entity.get("port_count"), Some(&Value::Scalar(Scalar::Int(12))));
    assert_eq!(entity.get("enabled"), Some(&Value::Scalar(Scalar::Bool(true))));
}

#[test]
fn test_deserialize_entity_kind_from_schema() {
    let user_get = SchemaDef::build("UserGetResponse")
        .entity_kind(EntityKind::User)
        .field(
            "user_id",
            "userId",
            true,
            false,
            FieldKind::Scalar(ScalarKind::Text),
        )
        .finish()
        .unwrap();
    let catalog = SchemaCatalog::new(vec![user_get]).unwrap();
    let schema = catalog.lookup("UserGetResponse").unwrap();

    let parsed = from_xml(b"<UserGetResponse><userId>u1</userId></UserGetResponse>").unwrap();
    match deserialize(&parsed, &schema, &catalog).unwrap() {
        Response::Success(entity) => assert!(entity.is_user()),
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn test_duplicate_single_valued_element_is_malformed() {
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let parsed = from_xml(b"<AddUser><id>a</id><id>b</id></AddUser>").unwrap();
    assert!(matches!(
        deserialize(&parsed, &schema, &catalog),
        Err(OciError::MalformedDocument(_))
    ));
}

#[test]
fn test_scalar_element_with_children_is_unexpected_nesting() {
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let parsed = from_xml(b"<AddUser><id><sub>x</sub></id></AddUser>").unwrap();
    assert!(matches!(
        deserialize(&parsed, &schema, &catalog),
        Err(OciError::UnexpectedNesting(_))
    ));
}

#[test]
fn test_root_schema_mismatch_is_unexpected_nesting() {
    let catalog = add_user_catalog();
    let schema = catalog.lookup("AddUser").unwrap();

    let parsed = from_xml(b"<SomethingElse/>").unwrap();
    assert!(matches!(
        deserialize(&parsed, &schema, &catalog),
        Err(OciError::UnexpectedNesting(_))
    ));
}

#[test]
fn test_bad_integer_text_is_malformed() {
    let catalog = user_profile_catalog();
    let schema = catalog.lookup("UserProfile").unwrap();

    let parsed =
        from_xml(b"<UserProfile><userId>u</userId><portCount>twelve</portCount></UserProfile>")
            .unwrap();
    assert!(matches!(
        deserialize(&parsed, &schema, &catalog),
        Err(OciError::MalformedDocument(_))
    ));
}

// =============================================================================
// XML Layer
// =============================================================================

#[test]
fn test_unparsable_bytes_are_malformed() {
    assert!(matches!(
        from_xml(b"<AddUser><id>u1</AddUser>"),
        Err(OciError::MalformedDocument(_))
    ));
    assert!(matches!(
        from_xml(b""),
        Err(OciError::MalformedDocument(_))
    ));
}

#[test]
fn test_empty_element_parses_as_empty_text() {
    let parsed = from_xml(b"<AddUser><id/></AddUser>").unwrap();
    match &parsed.root.value {
        WireValue::Children(children) => {
            assert_eq!(children[0].value, WireValue::Text(String::new()));
        }
        other => panic!("expected children, got {:?}", other),
    }
}
