//! Integration tests for rule file to lookup pipeline

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use lookfile_engine::{
    LoadOptions, LookCache, Lookfile, ObjectIdentity, ParamKind, RayFlagMode, SkipReason,
};
use lookfile_core::apply::{ApplyOptions, ParameterSink};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

const LOOK: &str = r#"{
    "namespace": "set_look",
    "shaders": {
        "bark": ["/root/forest/tree"],
        "leaves": ["/root/forest/tree/crown"],
        "moss": ["rock*"]
    },
    "displacement": {
        "bark_disp": ["/root/forest/tree/trunk"]
    },
    "attributes": {
        "/root/forest": { "opaque": true, "disp_height": 0.5 },
        "/root/forest/tree/crown": { "opaque": false, "visibility": 253 },
        "hero": { "matte": true }
    },
    "layers": {
        "matte": {
            "removeShaders": true,
            "shaders": { "black_hole": ["/root"] }
        }
    }
}"#;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("lookfile_{}_{}", std::process::id(), name));
    fs::write(&path, contents).expect("Should write temp rule file");
    path
}

fn handles(name: &str) -> Option<String> {
    let known = ["set_look:bark", "set_look:leaves", "moss", "bark_disp", "black_hole"];
    known.contains(&name).then(|| name.to_string())
}

#[derive(Default)]
struct Node {
    params: HashMap<&'static str, ParamKind>,
    floats: HashMap<String, f32>,
    others: HashMap<String, String>,
}

impl ParameterSink for Node {
    fn param_kind(&self, name: &str) -> Option<ParamKind> {
        self.params.get(name).copied()
    }
    fn set_bool(&mut self, name: &str, value: bool) {
        self.others.insert(name.into(), value.to_string());
    }
    fn set_byte(&mut self, name: &str, value: u8) {
        self.others.insert(name.into(), value.to_string());
    }
    fn set_int(&mut self, name: &str, value: i32) {
        self.others.insert(name.into(), value.to_string());
    }
    fn set_uint(&mut self, name: &str, value: u32) {
        self.others.insert(name.into(), value.to_string());
    }
    fn set_float(&mut self, name: &str, value: f32) {
        self.floats.insert(name.into(), value);
    }
    fn set_string(&mut self, name: &str, value: &str) {
        self.others.insert(name.into(), value.into());
    }
}

#[test]
fn rule_file_to_shader_lookups() {
    let path = write_temp("shaders.json", LOOK);
    let look = Lookfile::open(&path, &LoadOptions::default(), "", handles).expect("Rules should load");

    let trunk = ObjectIdentity::from_path("/root/forest/tree/trunk");
    let crown = ObjectIdentity::from_path("/root/forest/tree/crown/leaf_01");
    let rock = ObjectIdentity::from_path("/root/forest/rock_03");

    assert_eq!(look.shader_for(&trunk).map(String::as_str), Some("set_look:bark"));
    assert_eq!(look.shader_for(&crown).map(String::as_str), Some("set_look:leaves"));
    assert_eq!(look.shader_for(&rock).map(String::as_str), Some("moss"));
    assert_eq!(look.displacement_for(&trunk).map(String::as_str), Some("bark_disp"));
    assert!(look.displacement_for(&crown).is_none());

    let _ = fs::remove_file(&path);
}

#[test]
fn rule_file_to_applied_attributes() {
    let path = write_temp("attributes.json", LOOK);
    let look = Lookfile::open(&path, &LoadOptions::default(), "", handles)
        .expect("Rules should load")
        .with_apply_options(ApplyOptions {
            parent_visibility: 0xFF,
            ray_flags: RayFlagMode::Mask,
        });

    let mut node = Node {
        params: [
            ("opaque", ParamKind::Bool),
            ("disp_height", ParamKind::Float),
            ("visibility", ParamKind::Byte),
        ]
        .into_iter()
        .collect(),
        ..Default::default()
    };

    let trunk = ObjectIdentity::new("/root/forest/tree/trunk", ["hero"]);
    let report = look.apply_attributes(&trunk, &mut node);
    assert!(report.skipped.is_empty());
    assert_eq!(node.others["opaque"], "true");
    assert_relative_eq!(node.floats["disp_height"], 0.5);

    // The crown rule wins outright; nothing is inherited from /root/forest
    let mut crown_node = Node {
        params: node.params.clone(),
        ..Default::default()
    };
    let crown = ObjectIdentity::from_path("/root/forest/tree/crown");
    let report = look.apply_attributes(&crown, &mut crown_node);
    assert_eq!(crown_node.others["opaque"], "false");
    assert!(crown_node.floats.is_empty());
    let split = report.visibility.expect("Visibility should be reconciled");
    assert_eq!(split.object & split.parent, 0);

    // A tag-only object picks up the tag rule
    let hero = ObjectIdentity::new("/elsewhere/bob", ["hero"]);
    let report = look.apply_attributes(&hero, &mut Node::default());
    assert_eq!(report.skipped, vec![("matte".to_string(), SkipReason::UnknownParameter)]);

    let _ = fs::remove_file(&path);
}

#[test]
fn secondary_file_and_layer() {
    let path = write_temp("primary.json", LOOK);
    let secondary = write_temp(
        "secondary.json",
        r#"{ "attributes": { "/root/forest": { "opaque": false } } }"#,
    );

    let options = LoadOptions {
        secondary_file: Some(secondary.to_string_lossy().into_owned()),
        layer: Some("matte".into()),
        ..Default::default()
    };
    let look = Lookfile::open(&path, &options, "", handles).expect("Rules should load");

    let rock = ObjectIdentity::from_path("/root/forest/rock_03");
    assert_eq!(look.shader_for(&rock).map(String::as_str), Some("black_hole"));

    let bag = look.attributes_for(&rock).expect("Forest rule should match");
    assert_eq!(bag["opaque"], lookfile_core::value::Value::Bool(false));
    assert!(bag.contains_key("disp_height"));

    let _ = fs::remove_file(&path);
    let _ = fs::remove_file(&secondary);
}

#[test]
fn missing_file_uses_inline_overrides() {
    let options = LoadOptions {
        shaders_override: Some(r#"{"moss": ["/root"]}"#.into()),
        ..Default::default()
    };
    let look = Lookfile::open("/nonexistent/look.json", &options, "", handles).expect("Overrides should load");

    let anything = ObjectIdentity::from_path("/root/forest/tree");
    assert_eq!(look.shader_for(&anything).map(String::as_str), Some("moss"));
    assert!(look.attributes().is_empty());
}

#[test]
fn name_prefix_namespace_lookup() {
    let path = write_temp("prefix.json", r#"{ "shaders": { "chrome": ["/root"] } }"#);
    let lookups = AtomicUsize::new(0);

    let look = Lookfile::open(&path, &LoadOptions::default(), "asset01:proc", |name: &str| {
        lookups.fetch_add(1, Ordering::SeqCst);
        (name == "asset01:chrome").then(|| name.to_string())
    })
    .expect("Rules should load");

    assert_eq!(
        look.shader_for(&ObjectIdentity::from_path("/root/a")).map(String::as_str),
        Some("asset01:chrome")
    );
    assert_eq!(lookups.load(Ordering::SeqCst), 2);

    let _ = fs::remove_file(&path);
}

#[test]
fn cache_shares_and_flushes() {
    let path = write_temp("cached.json", LOOK);
    let cache = LookCache::default();
    let options = LoadOptions::default();

    let first: Lookfile<String> = Lookfile::open_cached(&cache, &path, &options, "", handles).expect("Should load");
    assert_eq!(cache.len(), 1);

    // Same file, different options: a separate entry
    let layered = LoadOptions {
        layer: Some("matte".into()),
        ..Default::default()
    };
    let _ = Lookfile::open_cached(&cache, &path, &layered, "", handles).expect("Should load");
    assert_eq!(cache.len(), 2);

    // Edits are invisible until the cache is flushed
    fs::write(&path, r#"{ "shaders": { "moss": ["/root"] } }"#).expect("Should rewrite");
    let stale = Lookfile::open_cached(&cache, &path, &options, "", handles).expect("Should load");
    assert_eq!(stale.shaders().len(), first.shaders().len());

    cache.flush();
    let fresh = Lookfile::open_cached(&cache, &path, &options, "", handles).expect("Should reload");
    assert_eq!(fresh.shaders().len(), 1);

    let _ = fs::remove_file(&path);
}
