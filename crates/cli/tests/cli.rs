use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn extracts_python_closure_end_to_end() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("project");
    fs::create_dir_all(&root).unwrap();
    write(&root, "main.py", "import utils.db\n");
    write(&root, "utils/db.py", "import requests\n");
    write(&root, "unrelated.py", "import json\n");
    let out = temp.path().join("out");

    Command::cargo_bin("codeslice")
        .unwrap()
        .arg(root.join("main.py"))
        .args(["--quiet", "--report"])
        .arg("-d")
        .arg(&root)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 files"));

    assert!(out.join("main.py").is_file());
    assert!(out.join("utils/db.py").is_file());
    assert!(!out.join("unrelated.py").exists());
    let requirements = fs::read_to_string(out.join("requirements.txt")).unwrap();
    assert_eq!(requirements, "requests\n");
    assert!(out.join("extraction-report.md").is_file());
}

#[test]
fn missing_project_root_fails_before_traversal() {
    let temp = tempfile::tempdir().unwrap();
    let entry = temp.path().join("main.py");
    fs::write(&entry, "").unwrap();

    Command::cargo_bin("codeslice")
        .unwrap()
        .arg(&entry)
        .args(["--quiet"])
        .arg("-d")
        .arg(temp.path().join("does-not-exist"))
        .arg("-o")
        .arg(temp.path().join("out"))
        .assert()
        .failure();
}

#[test]
fn json_config_supplies_the_job() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path().join("project");
    fs::create_dir_all(&root).unwrap();
    write(&root, "main.py", "import helper\n");
    write(&root, "helper.py", "");
    let out = temp.path().join("out");

    let config = temp.path().join("job.json");
    fs::write(
        &config,
        serde_json::json!({
            "entry_files": [root.join("main.py")],
            "project_dirs": [root],
            "output_dir": out,
        })
        .to_string(),
    )
    .unwrap();

    Command::cargo_bin("codeslice")
        .unwrap()
        .args(["--quiet", "-c"])
        .arg(&config)
        .assert()
        .success();

    assert!(out.join("main.py").is_file());
    assert!(out.join("helper.py").is_file());
}

#[test]
fn no_output_means_nothing_to_do() {
    let temp = tempfile::tempdir().unwrap();
    let entry = temp.path().join("main.py");
    fs::write(&entry, "").unwrap();

    Command::cargo_bin("codeslice")
        .unwrap()
        .arg(&entry)
        .arg("-d")
        .arg(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("no output specified"));
}
