//! Binary-level tests for the esdiag CLI.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, value: &Value) {
    fs::write(dir.join(name), value.to_string()).expect("write artifact");
}

/// One yellow node with six hot threads.
fn bundle() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    let root = dir.path();
    write(
        root,
        "cluster_health.json",
        &json!({
            "cluster_name": "ci",
            "status": "yellow",
            "number_of_nodes": 1,
            "unassigned_shards": 1
        }),
    );
    write(
        root,
        "nodes.json",
        &json!({"nodes": {"n1": {
            "name": "data-1",
            "jvm": {"using_compressed_ordinary_object_pointers": "true"}
        }}}),
    );
    write(
        root,
        "nodes_stats.json",
        &json!({"nodes": {"n1": {
            "name": "data-1",
            "jvm": {
                "mem": {"heap_used_percent": 40},
                "gc": {"collectors": {
                    "young": {"collection_time_in_millis": 1_000},
                    "old": {"collection_time_in_millis": 1_000}
                }}
            },
            "os": {"cpu": {"percent": 10}, "mem": {"used_percent": 50}},
            "fs": {"total": {
                "total_in_bytes": 1_099_511_627_776_u64,
                "available_in_bytes": 549_755_813_888_u64
            }},
            "thread_pool": {"search": {"rejected": 0, "completed": 10}},
            "indices": {"docs": {"count": 1_000}, "store": {"size_in_bytes": 1_048_576}}
        }}}),
    );
    write(
        root,
        "shards.json",
        &json!([
            {"index": "logs", "shard": "0", "prirep": "p", "state": "STARTED",
             "docs": "1000", "store": "1048576", "node": "data-1"},
            {"index": "logs", "shard": "0", "prirep": "r", "state": "UNASSIGNED",
             "docs": null, "store": null, "node": null}
        ]),
    );
    write(
        root,
        "settings.json",
        &json!({"logs": {"settings": {"index": {"number_of_replicas": "1"}}}}),
    );
    write(
        root,
        "mapping.json",
        &json!({"logs": {"mappings": {
            "dynamic": "strict",
            "properties": {"host": {"type": "keyword"}}
        }}}),
    );
    write(root, "fielddata_stats.json", &json!({"nodes": {"n1": {"indices": {"fielddata": {}}}}}));
    write(root, "cluster_state.json", &json!({"metadata": {}}));

    let dump: String = (0..6)
        .map(|i| {
            format!(
                "   99.0% [cpu=99.0%] cpu usage by thread 'write[T#{i}]'\n     at Engine.index\n\n"
            )
        })
        .collect();
    fs::write(root.join("nodes_hot_threads.txt"), dump).expect("write dump");
    dir
}

fn esdiag() -> Command {
    let mut cmd = Command::cargo_bin("esdiag").expect("binary built");
    cmd.env_remove("ESDIAG_CONFIG");
    cmd
}

#[test]
fn rules_lists_cluster_health_first() {
    esdiag()
        .arg("rules")
        .assert()
        .success()
        .stdout(predicate::str::contains("CLUSTER_HEALTH"))
        .stdout(predicate::str::contains("Total: 24 rule(s)"));
}

#[test]
fn analyze_missing_directory_fails() {
    let dir = TempDir::new().expect("temp dir");
    esdiag()
        .arg("analyze")
        .arg(dir.path().join("absent"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bundle not found"));
}

#[test]
fn analyze_prints_sections_in_order() {
    let dir = bundle();
    let output = esdiag()
        .arg("analyze")
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).expect("utf8");
    let attention = text.find("ATTENTION:").expect("attention section");
    let charts = text.find("CHARTS:").expect("charts section");
    let ok = text.find("OK:").expect("ok section");
    assert!(attention < charts && charts < ok);
    assert!(text.contains("[CLUSTER_HEALTH]"));
}

#[test]
fn analyze_json_is_parseable_and_exports_hot_threads() {
    let dir = bundle();
    let output = esdiag()
        .args(["--format", "json", "analyze"])
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(report["cluster_name"], "ci");
    assert_eq!(report["hot_threads"]["blocks"], 6);
    assert!(dir.path().join("hot_threads_extract.txt").exists());
}

#[test]
fn attention_only_drops_ok_findings() {
    let dir = bundle();
    let output = esdiag()
        .args(["-f", "json", "analyze", "--attention-only"])
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report: Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(report["ok"].as_array().map(Vec::len), Some(0));
    assert!(!report["attention"].as_array().expect("attention").is_empty());
}

#[test]
fn fail_on_attention_exits_with_two() {
    let dir = bundle();
    esdiag()
        .arg("analyze")
        .arg(dir.path())
        .arg("--fail-on-attention")
        .assert()
        .code(2);
}

#[test]
fn missing_artifact_names_the_file() {
    let dir = bundle();
    fs::remove_file(dir.path().join("shards.json")).expect("remove");
    esdiag()
        .arg("analyze")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("shards.json"));
}

#[test]
fn config_file_is_applied() {
    let dir = bundle();
    let config = dir.path().join("esdiag.toml");
    fs::write(&config, "[hot_threads]\nexport_threshold = 10\n").expect("write config");
    let out = dir.path().join("hot.txt");
    esdiag()
        .arg("--config")
        .arg(&config)
        .arg("analyze")
        .arg(dir.path())
        .arg("--hot-threads-out")
        .arg(&out)
        .assert()
        .success();
    assert!(!out.exists());
}

#[test]
fn bad_config_is_reported() {
    let dir = bundle();
    let config = dir.path().join("esdiag.toml");
    fs::write(&config, "[shards]\nmax_small_shard_ratio = 2.0\n").expect("write config");
    esdiag()
        .arg("-c")
        .arg(&config)
        .arg("analyze")
        .arg(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("configuration error"));
}
