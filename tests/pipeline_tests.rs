//! Integration tests for the resolution pipeline.
//!
//! Exercises Load -> Merge -> Resolve -> Persist against scratch site roots:
//! - completeness and override precedence
//! - list replacement
//! - placeholder behavior on the merged tree
//! - malformed input resilience and byte-stable artifacts

use serde_json::{Value, json};
use site_config::config::{
    OverrideStatus, PlaceholderResolver, ResolvedConfig, SiteConfig, SitePaths, deep_merge,
    persist,
};
use site_config::orchestrator::{Orchestrator, RunMode, resolve_site};
use std::fs;
use tempfile::TempDir;

const YEAR: i32 = 2025;

/// Helper to create a site root with an optional override document.
fn site_with_override(content: Option<&str>) -> (TempDir, SitePaths) {
    let temp = TempDir::new().expect("Failed to create temp dir");
    if let Some(content) = content {
        fs::write(temp.path().join("site.config.yaml"), content).unwrap();
    }
    let paths = SitePaths::new(temp.path());
    (temp, paths)
}

fn resolve(paths: &SitePaths) -> Value {
    resolve_site(paths, &PlaceholderResolver::new(YEAR))
        .expect("defaults are always available")
        .config
        .into_tree()
}

/// Assert every key path of `shape` exists in `tree` with the same container kind.
fn assert_covers_shape(tree: &Value, shape: &Value, path: &str) {
    match (shape, tree) {
        (Value::Object(shape_map), Value::Object(tree_map)) => {
            for (key, shape_value) in shape_map {
                let child = tree_map
                    .get(key)
                    .unwrap_or_else(|| panic!("missing key {}.{}", path, key));
                assert_covers_shape(child, shape_value, &format!("{}.{}", path, key));
            }
        }
        (Value::Object(_), other) => panic!("{} should be a mapping, got {}", path, other),
        (Value::Array(_), other) => assert!(other.is_array(), "{} should be a sequence", path),
        _ => {}
    }
}

fn defaults_tree() -> Value {
    SiteConfig::default().to_tree().unwrap()
}

#[test]
fn test_empty_override_yields_complete_defaults() {
    let (_temp, paths) = site_with_override(None);
    let tree = resolve(&paths);

    assert_covers_shape(&tree, &defaults_tree(), "");
    assert_eq!(
        tree["footer"]["copyright"],
        json!("© 2025 未命名班级. All rights reserved.")
    );
}

#[test]
fn test_partial_override_keeps_shape_and_wins() {
    let (_temp, paths) = site_with_override(Some(
        r##"
class:
  name: "7(3)班"
theme:
  custom:
    colors:
      primary: "#ff6600"
features:
  darkMode: false
"##,
    ));
    let tree = resolve(&paths);

    assert_covers_shape(&tree, &defaults_tree(), "");
    assert_eq!(tree["class"]["name"], json!("7(3)班"));
    assert_eq!(tree["class"]["school"], json!("未知学校"));
    assert_eq!(tree["theme"]["custom"]["colors"]["primary"], json!("#ff6600"));
    assert_eq!(tree["theme"]["custom"]["colors"]["background"], Value::Null);
    assert_eq!(tree["theme"]["custom"]["layout"]["borderRadius"], json!("12px"));
    assert_eq!(tree["features"]["darkMode"], json!(false));
    assert_eq!(tree["features"]["customCSS"], json!(false));
}

#[test]
fn test_shape_breaking_override_is_rejected() {
    let (_temp, paths) = site_with_override(Some("theme: dark\nnavigation:\n  name: x\n"));
    let resolution = resolve_site(&paths, &PlaceholderResolver::new(YEAR)).unwrap();

    assert_eq!(resolution.conflicts.len(), 2);
    assert_covers_shape(resolution.config.tree(), &defaults_tree(), "");
    assert_eq!(resolution.config.get("theme.preset"), Some(&json!("default")));
}

#[test]
fn test_navigation_list_is_replaced() {
    let (_temp, paths) = site_with_override(Some(
        r#"
navigation:
  - name: 首页
    path: /
    children:
      - name: "{class.name} 相册"
        path: /album
"#,
    ));
    let tree = resolve(&paths);

    assert_eq!(
        tree["navigation"],
        json!([
            {
                "name": "首页",
                "path": "/",
                "children": [{"name": "未命名班级 相册", "path": "/album"}]
            }
        ])
    );
    let site = ResolvedConfig::new(tree.clone()).site().unwrap();
    assert_eq!(site.navigation.len(), 1);
    assert_eq!(site.navigation[0].children.as_ref().unwrap().len(), 1);
}

#[test]
fn test_override_placeholders_see_merged_values() {
    let (_temp, paths) = site_with_override(Some(
        r#"
class:
  name: "7(3)班"
footer:
  extra: "{class.name} 版权所有 | {class.school} | {info.missing}"
"#,
    ));
    let tree = resolve(&paths);

    assert_eq!(
        tree["footer"]["copyright"],
        json!("© 2025 7(3)班. All rights reserved.")
    );
    assert_eq!(
        tree["footer"]["extra"],
        json!("7(3)班 版权所有 | 未知学校 | {info.missing}")
    );
}

#[test]
fn test_placeholders_are_not_re_expanded() {
    let (_temp, paths) = site_with_override(Some(
        r#"
class:
  name: "{class.school}"
footer:
  extra: "{class.name}"
"#,
    ));
    let tree = resolve(&paths);

    // class.name itself resolves to the school, footer.extra gets the raw merged value
    assert_eq!(tree["class"]["name"], json!("未知学校"));
    assert_eq!(tree["footer"]["extra"], json!("{class.school}"));
}

#[test]
fn test_unknown_fields_pass_through() {
    let (_temp, paths) = site_with_override(Some("gallery:\n  columns: 3\n  title: \"{class.name}\"\n"));
    let tree = resolve(&paths);

    assert_eq!(tree["gallery"], json!({"columns": 3, "title": "未命名班级"}));
}

#[test]
fn test_malformed_override_equals_no_override() {
    let (_temp_bad, bad_paths) = site_with_override(Some("class:\n  name: [unterminated\n"));
    let (_temp_none, none_paths) = site_with_override(None);

    let bad = resolve_site(&bad_paths, &PlaceholderResolver::new(YEAR)).unwrap();
    assert!(matches!(bad.override_status, OverrideStatus::Malformed(_)));
    assert_eq!(bad.config.into_tree(), resolve(&none_paths));
}

#[test]
fn test_resolution_is_idempotent() {
    let (_temp, paths) = site_with_override(Some("class:\n  name: A\n"));
    let tree = resolve(&paths);

    let again = PlaceholderResolver::new(YEAR).resolve(&tree, &tree);
    assert_eq!(again, tree);
}

#[test]
fn test_consecutive_cycles_write_identical_artifacts() {
    let (temp, paths) = site_with_override(Some("class:\n  name: A\nnavigation: []\n"));
    let artifact = paths.artifact_file();

    let orchestrator = Orchestrator::start_at_year(paths, RunMode::Production, YEAR).unwrap();
    let first = fs::read(&artifact).unwrap();

    orchestrator.run_cycle(vec![]).unwrap();
    let second = fs::read(&artifact).unwrap();

    assert_eq!(first, second);
    assert!(temp.path().join("build").is_dir());
}

#[test]
fn test_artifact_matches_published_snapshot() {
    let (_temp, paths) = site_with_override(None);
    let artifact = paths.artifact_file();
    let orchestrator = Orchestrator::start_at_year(paths, RunMode::Production, YEAR).unwrap();

    let written: Value = serde_json::from_slice(&fs::read(&artifact).unwrap()).unwrap();
    assert_eq!(&written, orchestrator.current().tree());

    let text = fs::read_to_string(&artifact).unwrap();
    assert!(text.starts_with("{\n  \"info\": {\n    \"title\""));
}

#[test]
fn test_defaults_file_replaces_builtin_defaults() {
    let temp = TempDir::new().unwrap();
    let mut defaults = SiteConfig::default();
    defaults.class.school = "第一中学".into();
    let defaults_path = temp.path().join("defaults.yaml");
    fs::write(&defaults_path, serde_yaml::to_string(&defaults).unwrap()).unwrap();
    fs::write(temp.path().join("site.config.yaml"), "class:\n  name: B\n").unwrap();

    let paths = SitePaths::new(temp.path()).with_defaults_file(&defaults_path);
    let tree = resolve(&paths);

    assert_eq!(tree["class"]["school"], json!("第一中学"));
    assert_eq!(tree["class"]["name"], json!("B"));
}

#[test]
fn test_missing_defaults_file_is_fatal_at_startup() {
    let temp = TempDir::new().unwrap();
    let paths = SitePaths::new(temp.path()).with_defaults_file(temp.path().join("nope.yaml"));

    let err = Orchestrator::start(paths, RunMode::Production).unwrap_err();
    assert!(err.is_fatal());
    assert!(!temp.path().join("build/site.data.json").exists());
}

#[test]
fn test_merge_then_resolve_matches_pipeline() {
    let (_temp, paths) = site_with_override(Some("footer:\n  copyright: \"{year}/{class.name}\"\n"));

    let manual = {
        let merged = deep_merge(
            defaults_tree(),
            json!({"footer": {"copyright": "{year}/{class.name}"}}),
        );
        PlaceholderResolver::new(YEAR).resolve(&merged, &merged)
    };
    assert_eq!(resolve(&paths), manual);

    let temp_out = TempDir::new().unwrap();
    let out = temp_out.path().join("site.data.json");
    persist(&ResolvedConfig::new(manual.clone()), &out).unwrap();
    let reread: Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
    assert_eq!(reread, manual);
}

#[test]
fn test_override_keeps_artifact_key_order() {
    let (_temp, paths) = site_with_override(Some("class:\n  name: A\ninfo:\n  title: T\n"));
    let artifact = paths.artifact_file();
    Orchestrator::start_at_year(paths, RunMode::Production, YEAR).unwrap();

    let written: Value = serde_json::from_slice(&fs::read(&artifact).unwrap()).unwrap();
    let keys: Vec<&str> = written.as_object().unwrap().keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "info",
            "class",
            "theme",
            "features",
            "navigation",
            "footer",
            "social",
            "integrations"
        ]
    );
    let class_keys: Vec<&str> = written["class"]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(class_keys, vec!["name", "school", "slogan"]);
}
