use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::process::Command;

const BIN: &str = env!("CARGO_BIN_EXE_lameta-rocrate");

fn write_snapshot(dir: &Path) -> std::path::PathBuf {
    let session_dir = dir.join("Sessions").join("ETR009");
    fs::create_dir_all(&session_dir).unwrap();
    fs::write(session_dir.join("ETR009.wav"), vec![0u8; 2048]).unwrap();

    let snapshot = json!({
        "properties": {"title": "Edolo Texts", "archiveConfigurationName": "REAP"},
        "sessions": [{
            "filePrefix": "ETR009",
            "properties": {"title": "Hewya", "access": "U", "languages": "etr"},
            "contributions": [{"personReference": "Awi Heole", "role": "speaker"}],
            "files": [{"path": "Sessions/ETR009/ETR009.wav"}]
        }],
        "people": [{"filePrefix": "Awi_Heole", "properties": {"name": "Awi Heole"}}]
    });
    let path = dir.join("project.json");
    fs::write(&path, serde_json::to_string_pretty(&snapshot).unwrap()).unwrap();
    path
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(BIN)
        .args(args)
        .env_remove("LAMETA_LOG_DIR")
        .env("LAMETA_LOG_LEVEL", "error")
        .output()
        .unwrap()
}

#[test]
fn writes_metadata_and_preview() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let out = dir.path().join("crate");

    let output = run(&[
        snapshot.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--date-published",
        "2026-01-01T00:00:00.000Z",
        "--validate",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stderr).contains("\"valid\": true"));

    let metadata: Value =
        serde_json::from_str(&fs::read_to_string(out.join("ro-crate-metadata.json")).unwrap())
            .unwrap();
    let graph = metadata["@graph"].as_array().unwrap();
    assert_eq!(graph[0]["@id"], "./");
    assert_eq!(graph[0]["datePublished"], "2026-01-01T00:00:00.000Z");
    let wav = graph
        .iter()
        .find(|entity| entity["@id"] == "Sessions/ETR009/ETR009.wav")
        .unwrap();
    assert_eq!(wav["contentSize"], 2048);
    assert!(wav.get("dateModified").is_some());

    let html = fs::read_to_string(out.join("ro-crate-preview.html")).unwrap();
    assert!(html.contains("Hewya"));
}

#[test]
fn session_export_without_preview() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let out = dir.path().join("session");

    let output = run(&[
        snapshot.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--session",
        "ETR009",
        "--no-html",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(!out.join("ro-crate-preview.html").exists());
    let metadata: Value =
        serde_json::from_str(&fs::read_to_string(out.join("ro-crate-metadata.json")).unwrap())
            .unwrap();
    assert_eq!(metadata["@graph"][0]["name"], "Hewya");
}

#[test]
fn unknown_session_fails() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = write_snapshot(dir.path());
    let output = run(&[
        snapshot.to_str().unwrap(),
        "--out",
        dir.path().join("x").to_str().unwrap(),
        "--session",
        "nope",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("session `nope` not found"));
}

#[test]
fn malformed_snapshot_fails() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("broken.json");
    fs::write(&snapshot, "{not json").unwrap();
    let output = run(&[
        snapshot.to_str().unwrap(),
        "--out",
        dir.path().join("x").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid project snapshot"));
}

#[test]
fn version_reports_core_version() {
    let output = run(&["--version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(lameta_core::core_version()), "{stdout}");
}
