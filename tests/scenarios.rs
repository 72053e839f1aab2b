//! End-to-end scenarios across parsing, building, JSON and path selection.

use pretty_assertions::assert_eq;

use bsonpath::{
    path_select, read_json, to_json_string, ArrayBuilder, Document, DocumentBuilder, Element,
    ElementType,
};

#[test]
fn string_element_round_trip() {
    let bytes = b"\x02hello\x00\x06\x00\x00\x00world\x00";
    let element = Element::from_slice(bytes).unwrap();
    assert_eq!(element.element_type(), ElementType::String);
    assert_eq!(element.name(), "hello");
    assert_eq!(element.as_str().unwrap(), "world");
    assert_eq!(element.size(), 17);
    assert_eq!(element.as_bytes(), bytes);
}

#[test]
fn malformed_element_missing_name_terminator() {
    let bytes = b"\x02hello\x06\x00\x00\x00world\x00";
    let err = Element::from_slice(bytes).unwrap_err();
    assert!(err.is_invalid_element_type(), "{err}");
}

#[test]
fn builder_produces_nested_document() {
    let i = 7;
    let doc = DocumentBuilder::new()
        .append(
            "foo",
            DocumentBuilder::new().append(
                "bar",
                DocumentBuilder::new()
                    .append("baz", ArrayBuilder::new().push(i).push(2).push(3)),
            ),
        )
        .build()
        .unwrap();

    let mut top = doc.iter();
    let foo = top.next().unwrap();
    assert!(top.next().is_none());
    assert_eq!(foo.name(), "foo");
    assert_eq!(foo.element_type(), ElementType::EmbeddedDocument);

    let bar = foo.as_document().unwrap().into_owned();
    let bar = bar.find("bar").unwrap();
    assert_eq!(bar.element_type(), ElementType::EmbeddedDocument);

    let inner = bar.as_document().unwrap().into_owned();
    let baz = inner.find("baz").unwrap();
    assert_eq!(baz.element_type(), ElementType::Array);

    let array = baz.as_array().unwrap();
    let elements: Vec<_> = array.iter().collect();
    assert_eq!(elements.len(), 3);
    for (index, expected) in [(0usize, 7), (1, 2), (2, 3)] {
        assert_eq!(elements[index].name(), index.to_string());
        assert_eq!(elements[index].element_type(), ElementType::Int32);
        assert_eq!(elements[index].as_i32().unwrap(), expected);
    }
}

#[test]
fn jsonpath_recursive_descent() {
    let doc = read_json(br#"{"a":{"b":1,"c":{"b":2}},"d":[{"b":3},{"b":4}]}"#).unwrap();
    let matches = path_select(&doc, "$..b").unwrap();
    let values: Vec<i32> = matches.iter().map(|e| e.as_i32().unwrap()).collect();
    assert_eq!(values, vec![1, 2, 3, 4]);
    for element in &matches {
        assert_eq!(element.element_type(), ElementType::Int32);
    }
}

#[test]
fn jsonpath_filter_expression() {
    let doc = read_json(br#"{"items":[{"n":1},{"n":2},{"n":3}]}"#).unwrap();
    let matches = path_select(&doc, "$.items[?(@.n > 1)].n").unwrap();
    let values: Vec<i32> = matches.iter().map(|e| e.as_i32().unwrap()).collect();
    assert_eq!(values, vec![2, 3]);
}

#[test]
fn json_whitespace_tolerance() {
    let doc = read_json(b"   \n\r\t[0]").unwrap();
    let elements: Vec<_> = doc.iter().collect();
    assert_eq!(elements.len(), 1);
    assert_eq!(elements[0].name(), "0");
    assert_eq!(elements[0].element_type(), ElementType::Int32);
    assert_eq!(elements[0].as_i32().unwrap(), 0);
}

#[test]
fn bson_byte_round_trip() {
    let docs: &[&[u8]] = &[
        b"\x05\x00\x00\x00\x00",
        b"\x13\x00\x00\x00\x02hi\x00\x06\x00\x00\x00y'all\x00\x00",
        b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00",
        b"\x0C\x00\x00\x00\x10i\x00\x01\x00\x00\x00\x00",
    ];
    for bytes in docs {
        let doc = Document::from_slice(bytes).unwrap();
        assert_eq!(doc.as_bytes(), *bytes);
        let copied = doc.clone().into_owned();
        assert_eq!(copied.as_bytes(), *bytes);
    }
}

#[test]
fn element_size_law() {
    let doc = read_json(br#"{"a": 1, "b": "text", "c": {"d": [1, 2]}, "e": null}"#).unwrap();
    for element in doc.iter() {
        assert_eq!(element.as_bytes().len(), element.size());
    }
    let total: usize = doc.iter().map(|e| e.size()).sum();
    assert_eq!(total + 5, doc.as_bytes().len());
}

#[test]
fn json_round_trip_preserves_structure() {
    let json = r#"{"a":1,"b":[true,null,"x"],"c":{"d":1.5}}"#;
    let doc = read_json(json.as_bytes()).unwrap();
    assert_eq!(to_json_string(&doc).unwrap(), json);
}

#[test]
fn path_select_is_idempotent_on_root() {
    let doc = read_json(br#"{"a": 1, "b": {"c": 2}}"#).unwrap();
    let dollar = path_select(&doc, "$").unwrap();
    let empty = path_select(&doc, "").unwrap();
    assert_eq!(dollar, empty);
    assert_eq!(dollar.len(), doc.len());
    for (selected, iterated) in dollar.iter().zip(doc.iter()) {
        assert_eq!(*selected, iterated);
    }
}

#[test]
fn failed_mutations_leave_element_unchanged() {
    let doc = read_json(br#"{"n": 5}"#).unwrap();
    let mut element = doc.find("n").unwrap().into_owned();
    let before = element.clone();

    assert!(element.set_name("bad\0name").is_err());
    assert_eq!(element, before);

    assert!(element
        .set_value_with(ElementType::Double, "not a number")
        .is_err());
    assert_eq!(element, before);

    assert_eq!(element.name(), "n");
    assert_eq!(element.as_i32().unwrap(), 5);
}

#[test]
fn selected_elements_serialize_back() {
    let doc = read_json(br#"{"items":[{"n":1},{"n":2}]}"#).unwrap();
    let matches = path_select(&doc, "$.items[*]").unwrap();
    assert_eq!(matches.len(), 2);

    // each match is a view that can be detached and re-wrapped
    let owned = matches[0].to_owned();
    let nested = owned.as_document().unwrap();
    assert_eq!(nested.find("n").unwrap().as_i32().unwrap(), 1);
}
