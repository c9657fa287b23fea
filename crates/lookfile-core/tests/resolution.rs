//! Integration tests for rule JSON to resolution to application

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use lookfile_core::prelude::*;
use serde_json::json;
use std::collections::HashMap;

#[derive(Default)]
struct Recorder {
    kinds: HashMap<&'static str, ParamKind>,
    set: Vec<(String, String)>,
}

impl Recorder {
    fn new(kinds: &[(&'static str, ParamKind)]) -> Self {
        Self {
            kinds: kinds.iter().copied().collect(),
            set: Vec::new(),
        }
    }

    fn record(&mut self, name: &str, value: impl ToString) {
        self.set.push((name.to_string(), value.to_string()));
    }
}

impl ParameterSink for Recorder {
    fn param_kind(&self, name: &str) -> Option<ParamKind> {
        self.kinds.get(name).copied()
    }
    fn set_bool(&mut self, name: &str, value: bool) {
        self.record(name, value);
    }
    fn set_byte(&mut self, name: &str, value: u8) {
        self.record(name, value);
    }
    fn set_int(&mut self, name: &str, value: i32) {
        self.record(name, value);
    }
    fn set_uint(&mut self, name: &str, value: u32) {
        self.record(name, value);
    }
    fn set_float(&mut self, name: &str, value: f32) {
        self.record(name, value);
    }
    fn set_string(&mut self, name: &str, value: &str) {
        self.record(name, value);
    }
}

fn set_table() -> AttributeTable {
    AttributeTable::from_json(&json!({
        "/root/set": {"opaque": false, "matte": false},
        "/root/set/tree": {"opaque": true},
        "*leaf*": {"sidedness": 1},
        "hero": {"matte": true},
    }))
    .expect("Table should parse")
}

#[test]
fn deepest_path_wins_and_values_are_not_merged() {
    let table = set_table();
    let object = ObjectIdentity::from_path("/root/set/tree/trunk");

    let resolution = resolve(&object, &table);
    assert_eq!(resolution.selector(), Some("/root/set/tree"));

    let bag = resolution.value().unwrap();
    assert_eq!(bag.len(), 1);
    assert_eq!(bag["opaque"], Value::Bool(true));
}

#[test]
fn longest_structural_selector_wins() {
    let table = set_table();
    // "/root/set" is longer than "*leaf*"
    let object = ObjectIdentity::from_path("/root/set/leaf01");
    assert_eq!(resolve(&object, &table).selector(), Some("/root/set"));

    // Outside /root/set only the pattern matches
    let object = ObjectIdentity::from_path("/root/props/leaf01");
    assert_eq!(resolve(&object, &table).selector(), Some("*leaf*"));
}

#[test]
fn tag_only_wins_without_structural_match() {
    let table = set_table();

    let tagged = ObjectIdentity::new("/root/chars/bob", ["hero"]);
    let resolution = resolve(&tagged, &table);
    assert!(matches!(resolution, Resolution::Tag(_)));
    assert_eq!(resolution.selector(), Some("hero"));

    let tagged_in_set = ObjectIdentity::new("/root/set/rock", ["hero"]);
    let resolution = resolve(&tagged_in_set, &table);
    assert!(matches!(resolution, Resolution::Path(_)));
    assert_eq!(resolution.selector(), Some("/root/set"));
}

#[test]
fn sibling_prefix_is_not_containment() {
    let table = set_table();
    let object = ObjectIdentity::from_path("/root/settings/lamp");
    assert!(!resolve(&object, &table).is_match());
}

#[test]
fn batch_resolution_matches_single() {
    let table = set_table();
    let objects: Vec<ObjectIdentity> = (0..64)
        .map(|i| ObjectIdentity::from_path(format!("/root/set/tree/branch{}", i)))
        .chain([ObjectIdentity::from_path("/elsewhere")])
        .collect();

    let batch = resolve_all(&objects, &table);
    assert_eq!(batch.len(), objects.len());
    for (object, resolution) in objects.iter().zip(&batch) {
        assert_eq!(resolution.selector(), resolve(object, &table).selector());
    }
    assert!(!batch[64].is_match());
}

#[test]
fn merged_overrides_feed_resolution() {
    let base = set_table();
    let overrides = AttributeTable::from_json(&json!({
        "/root/set/tree": {"matte": true},
        "/root/set/tree/trunk": {"opaque": false},
    }))
    .unwrap();

    let merged = merge_attribute_overrides(&base, &overrides);
    assert_eq!(merged.len(), base.len() + 1);

    let tree = merged.get("/root/set/tree").unwrap();
    assert_eq!(tree["opaque"], Value::Bool(true));
    assert_eq!(tree["matte"], Value::Bool(true));

    let trunk = ObjectIdentity::from_path("/root/set/tree/trunk/bark");
    assert_eq!(resolve(&trunk, &merged).selector(), Some("/root/set/tree/trunk"));
}

#[test]
fn shader_reassignment_then_binding() {
    let base = AssignmentTable::from_json(&json!({
        "wood": ["/root/set/tree", "/root/set/fence"],
        "stone": ["/root/set/wall"],
    }))
    .unwrap();
    let overrides = AssignmentTable::from_json(&json!({"stone": ["/root/set/fence"]})).unwrap();

    let merged = merge_shader_assignments(&base, &overrides);
    assert_eq!(merged.paths("wood").unwrap(), ["/root/set/tree"]);
    assert_eq!(merged.paths("stone").unwrap(), ["/root/set/fence", "/root/set/wall"]);

    let handles: HashMap<&str, u32> = [("lib:wood", 1), ("stone", 2)].into_iter().collect();
    let bound = merged.bind(Some("lib"), "", |name| handles.get(name).copied());

    let fence = ObjectIdentity::from_path("/root/set/fence/post");
    assert_eq!(resolve(&fence, &bound).value(), Some(&2));
    let tree = ObjectIdentity::from_path("/root/set/tree");
    assert_eq!(resolve(&tree, &bound).value(), Some(&1));
    let wall = ObjectIdentity::from_path("/root/set/wall");
    assert_eq!(resolve(&wall, &bound).value(), Some(&2));
}

#[test]
fn resolved_bag_is_applied_to_sink() {
    let table = AttributeTable::from_json(&json!({
        "/root/set": {
            "opaque": true,
            "subdiv_iterations": 3,
            "visibility": 0xF0,
            "user_note": "ignored",
        },
    }))
    .unwrap();
    let object = ObjectIdentity::from_path("/root/set/rock");
    let bag = resolve(&object, &table).value().unwrap();

    let mut sink = Recorder::new(&[
        ("opaque", ParamKind::Bool),
        ("iterations", ParamKind::Byte),
        ("visibility", ParamKind::Byte),
    ]);
    let options = ApplyOptions {
        parent_visibility: 0x3C,
        ray_flags: RayFlagMode::Mask,
    };
    let report = apply_bag(&mut sink, bag, &options);

    assert_eq!(
        sink.set,
        vec![
            ("opaque".to_string(), "true".to_string()),
            ("iterations".to_string(), "3".to_string()),
            ("visibility".to_string(), "48".to_string()),
        ]
    );
    assert_eq!(report.skipped, vec![("user_note".to_string(), SkipReason::UnknownParameter)]);

    let split = report.visibility.unwrap();
    assert_eq!(split.object, 0xF0 & 0x3C);
    assert_eq!(split.object & split.parent, 0);
}
