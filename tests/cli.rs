//! Integration tests for the molt CLI

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn molt(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_molt"))
        .args(args)
        .arg("--no-color")
        .current_dir(dir)
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run molt")
}

fn project() -> TempDir {
    let temp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/camel2");
    let src = temp.path().join("src");
    fs::create_dir(&src).unwrap();
    for name in ["RouteConfig.java", "routes.xml", "application.properties"] {
        fs::copy(fixtures.join(name), src.join(name)).unwrap();
    }
    temp
}

#[test]
fn test_plans_lists_steps() {
    let temp = TempDir::new().unwrap();
    let output = molt(temp.path(), &["plans"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2.0 -> 3.0"));
    assert!(stdout.contains("camel-3.0-java-api"));
    assert!(stdout.contains("4.17 -> 4.18"));
}

#[test]
fn test_recipes_json() {
    let temp = TempDir::new().unwrap();
    let output = molt(temp.path(), &["recipes", "--from", "3.0", "--to", "3.1", "--format", "json"]);

    assert!(output.status.success());
    let recipes: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = recipes
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["camel-3.1-java-api", "camel-3.1-java-types"]);
}

#[test]
fn test_unknown_version_pair() {
    let temp = project();
    let output = molt(temp.path(), &["run", "--from", "9", "--to", "10"]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("No migration registered from 9.0 to 10.0"));
}

#[test]
fn test_invalid_version() {
    let temp = TempDir::new().unwrap();
    let output = molt(temp.path(), &["run", "--from", "two", "--to", "3"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid version"));
}

#[test]
fn test_check_mode_leaves_files_alone() {
    let temp = project();
    let route = temp.path().join("src/RouteConfig.java");
    let before = fs::read_to_string(&route).unwrap();

    let output = molt(temp.path(), &["run", "--from", "2", "--to", "3.0"]);

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("warning[consume-ref]"));
    assert!(stdout.contains("3 files processed, 2 changed"));
    assert!(stdout.contains("2 file(s) would change"));
    assert_eq!(fs::read_to_string(&route).unwrap(), before);
}

#[test]
fn test_strict_fails_on_manual_steps() {
    let temp = project();
    let output = molt(temp.path(), &["run", "--from", "2", "--to", "3.0", "--strict", "src"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_diff_mode() {
    let temp = project();
    let output = molt(temp.path(), &["run", "--from", "2", "--to", "3.0", "--diff", "src"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-import org.apache.camel.impl.SimpleRegistry;"));
    assert!(stdout.contains("+import org.apache.camel.support.SimpleRegistry;"));
    assert!(stdout.contains("+            <customLoadBalancer ref=\"myBalancer\"/>"));
    assert!(!stdout.contains("application.properties\n"));
}

#[test]
fn test_write_then_rerun_is_clean() {
    let temp = project();
    let output = molt(temp.path(), &["run", "--from", "2", "--to", "3.0", "--write", "src"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("2 file(s) written"));

    let migrated = fs::read_to_string(temp.path().join("src/routes.xml")).unwrap();
    assert!(migrated.contains("<circuitBreaker>"));

    let rerun = molt(temp.path(), &["run", "--from", "2", "--to", "3.0", "--diff", "src"]);
    assert!(rerun.status.success());
    let stdout = String::from_utf8_lossy(&rerun.stdout);
    assert!(!stdout.contains("+++"));
    assert!(stdout.contains("0 changed"));
}

#[test]
fn test_json_report_and_disabled_recipe() {
    let temp = project();
    let output = molt(
        temp.path(),
        &[
            "run",
            "--from",
            "2",
            "--to",
            "3.0",
            "--format",
            "json",
            "--disable",
            "camel-3.0-xml-dsl",
            "src",
        ],
    );

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["files_processed"], 3);
    assert_eq!(report["summary"]["files_changed"], 1);
    let routes = report["artifacts"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["file"].as_str().unwrap().ends_with("routes.xml"))
        .unwrap();
    assert_eq!(routes["changed"], false);
}

#[test]
fn test_config_file_and_custom_catalogue() {
    let temp = project();
    fs::create_dir(temp.path().join("catalogue")).unwrap();
    fs::write(
        temp.path().join("catalogue/acme.yaml"),
        r#"
recipes:
  - id: acme-options
    from: "2"
    to: "3.0"
    kind: properties
    rules:
      - id: rename-policy-key
        match:
          property: "camel.threadpool.rejectedPolicy"
        action:
          rename: camel.threadpool.rejected-policy
"#,
    )
    .unwrap();
    fs::write(
        temp.path().join(".moltrc.yaml"),
        "recipes:\n  catalogues: [catalogue]\n",
    )
    .unwrap();

    let output = molt(temp.path(), &["run", "--from", "2", "--to", "3.0", "--write", "src"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert_eq!(
        fs::read_to_string(temp.path().join("src/application.properties")).unwrap(),
        "# untouched by the 3.0 plan\ncamel.threadpool.rejected-policy=DiscardOldest\n"
    );
}
