use assert_cmd::prelude::*;
use once_cell::sync::Lazy;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::{NamedTempFile, TempDir};

static SCENE_JSON: Lazy<String> = Lazy::new(|| {
    r#"{
  "Version": 1,
  "NextUUID": 5,
  "Objects": [
    { "Type": "LightActor", "Name": "Sun", "Intensity": 2.0 },
    { "Type": "CameraActor", "Name": "Eye", "Fov": 70.0 }
  ]
}
"#
    .to_string()
});

fn write_scene() -> NamedTempFile {
    let mut tmp = NamedTempFile::new().expect("temp scene");
    tmp.write_all(SCENE_JSON.as_bytes()).expect("write scene");
    tmp
}

#[test]
fn cli_prints_scene_summary() {
    let scene = write_scene();
    let mut cmd = Command::cargo_bin("crystal-object").expect("binary exists");
    cmd.arg(scene.path());
    cmd.assert()
        .success()
        .stdout(contains("Loaded scene with 2 objects"))
        .stdout(contains(" - Sun (LightActor) uuid=5"))
        .stdout(contains(" - Eye (CameraActor) uuid=6"));
}

#[test]
fn cli_duplicates_objects_with_fresh_uuids() {
    let scene = write_scene();
    let mut cmd = Command::cargo_bin("crystal-object").expect("binary exists");
    cmd.arg(scene.path()).arg("--duplicate");
    cmd.assert()
        .success()
        .stdout(contains("Duplicated 2 object(s):"))
        .stdout(contains(" - Sun uuid=5 -> uuid=7"))
        .stdout(contains(" - Eye uuid=6 -> uuid=8"));
}

#[test]
fn cli_saves_a_reloadable_scene() {
    let scene = write_scene();
    let out_dir = TempDir::new().expect("temp dir");
    let out_path = out_dir.path().join("resaved.json");

    let mut cmd = Command::cargo_bin("crystal-object").expect("binary exists");
    cmd.arg(scene.path()).arg("--save").arg(&out_path);
    cmd.assert().success().stdout(contains("Saved scene to"));

    let text = std::fs::read_to_string(&out_path).expect("saved scene");
    let value: serde_json::Value = serde_json::from_str(&text).expect("valid document");
    let objects = value
        .get("Objects")
        .and_then(|v| v.as_array())
        .expect("objects array");
    assert_eq!(objects.len(), 2);
    assert_eq!(
        objects[0].get("Type"),
        Some(&serde_json::Value::String("LightActor".to_string()))
    );
    assert_eq!(value.get("NextUUID"), Some(&serde_json::Value::from(7)));
}

#[test]
fn cli_rejects_missing_scene_path() {
    let mut cmd = Command::cargo_bin("crystal-object").expect("binary exists");
    cmd.assert().failure().stderr(contains("Usage"));
}
