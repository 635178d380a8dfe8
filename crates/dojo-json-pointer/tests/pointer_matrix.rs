use dojo_json_pointer::{
    escape_component, format_pointer, parse_pointer, unescape_component, walk, Pointer,
    PointerError,
};
use proptest::prelude::*;
use serde_json::json;

#[test]
fn pointer_parse_format_roundtrip_matrix() {
    let cases = ["", "/", "/foo", "/foo/bar", "/a~0b/c~1d", "/arr/0", "/~0/~1"];

    for pointer in cases {
        let segments = parse_pointer(pointer);
        let out = format_pointer(&segments);
        assert_eq!(out, pointer);
    }
}

#[test]
fn pointer_segments_match_split() {
    let pointer = Pointer::new("/todos/3/label");
    let expected: Vec<&str> = "/todos/3/label".split('/').skip(1).collect();
    assert_eq!(pointer.segments(), expected.as_slice());
}

#[test]
fn pointer_get_matrix() {
    let doc = json!({"foo": {"bar": [10, 20, null]}, "": {"": "empty"}});

    assert_eq!(Pointer::new("/foo/bar/0").get(&doc), Some(&json!(10)));
    assert_eq!(Pointer::new("/foo/bar/2").get(&doc), Some(&json!(null)));
    assert_eq!(Pointer::new("/foo/bar/3").get(&doc), None);
    assert_eq!(Pointer::new("/foo/baz/0").get(&doc), None);
    assert_eq!(Pointer::new("//").get(&doc), Some(&json!("empty")));
    assert_eq!(Pointer::new("").get(&doc), Some(&doc));
}

#[test]
fn walk_write_does_not_touch_other_branches() {
    let original = json!({"a": {"x": 1}, "b": {"y": 2}});
    let mut working = original.clone();
    {
        let target = walk(&["a", "z"], &mut working, true).unwrap().unwrap();
        if let serde_json::Value::Object(map) = target.target {
            map.insert("z".to_string(), json!(3));
        }
    }
    assert_eq!(working, json!({"a": {"x": 1, "z": 3}, "b": {"y": 2}}));
    assert_eq!(original, json!({"a": {"x": 1}, "b": {"y": 2}}));
}

#[test]
fn walk_reports_bad_array_segment() {
    let mut doc = json!({"list": [[1]]});
    let err = Pointer::new("/list/first/0").walk(&mut doc, true).unwrap_err();
    assert_eq!(err, PointerError::InvalidIndex("first".to_string()));
}

proptest! {
    #[test]
    fn escape_then_unescape_roundtrips(segment in ".*") {
        prop_assert_eq!(unescape_component(&escape_component(&segment)), segment);
    }

    #[test]
    fn plain_pointer_string_roundtrips(parts in proptest::collection::vec("[a-z0-9]{1,8}", 1..6)) {
        let s = format!("/{}", parts.join("/"));
        let pointer = Pointer::new(&s);
        prop_assert_eq!(pointer.path(), s);
        prop_assert_eq!(pointer.segments(), parts.as_slice());
    }

    #[test]
    fn segments_roundtrip_through_path(parts in proptest::collection::vec("[a-z/~]{0,6}", 0..5)) {
        let pointer = Pointer::from_segments(parts.clone());
        let reparsed = Pointer::new(&pointer.path());
        prop_assert_eq!(reparsed.segments(), parts.as_slice());
    }
}
