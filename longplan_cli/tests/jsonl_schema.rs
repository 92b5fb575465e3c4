use assert_cmd::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

const LOG: &str = "\
t,v_ego,a_ego,standstill,steering_deg,v_cruise_kph,enabled,long_off,force_decel,lead_status,lead_d_rel,lead_v_rel
0.00,12.0,0.0,false,0.0,60.0,true,false,false,false,0.0,0.0
0.05,12.0,0.1,false,0.0,60.0,true,false,false,false,0.0,0.0
0.10,12.1,0.1,false,5.0,60.0,true,false,false,false,0.0,0.0
0.15,12.1,0.1,false,5.0,60.0,true,false,true,false,0.0,0.0
0.20,12.1,0.0,false,0.0,60.0,true,true,false,false,0.0,0.0
";

fn write_config(dir: &tempfile::TempDir, extra: &str) -> PathBuf {
    let toml = format!("[sim]\nduration_s = 1.0\nv_init_mps = 8.0\nv_cruise_kph = 50.0\n{extra}");
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn json_lines(stdout: &[u8]) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("bad JSON line {l:?}: {e}")))
        .collect()
}

fn assert_plan_schema(v: &serde_json::Value) {
    for key in ["speeds", "accels", "jerks"] {
        let arr = v[key].as_array().unwrap_or_else(|| panic!("{key} missing"));
        assert_eq!(arr.len(), 17, "{key}");
    }
    for key in ["has_lead", "fcw", "is_blended", "reset"] {
        assert!(v[key].is_boolean(), "{key}");
    }
    assert!(v["source"].is_string());
    assert!(v["mode"].is_string());
    assert!(v["solver_execution_time"].is_number());
    assert!(v["accel_limits"]["min"].as_f64().unwrap() <= v["accel_limits"]["max"].as_f64().unwrap());
    assert!(v["advisories"]["speed_limit"].is_object());
}

/// One plan per cycle followed by a summary line.
#[rstest]
fn sim_jsonl_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");

    let out = Command::cargo_bin("longplan")
        .unwrap()
        .arg("--json")
        .arg("--log-level")
        .arg("error")
        .arg("--config")
        .arg(&cfg)
        .arg("sim")
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let lines = json_lines(&out.stdout);
    assert_eq!(lines.len(), 21);
    for plan in &lines[..20] {
        assert_plan_schema(plan);
    }
    let last = &lines[20];
    assert_eq!(last["summary"]["cycles"], 20);
    assert_eq!(last["summary"]["interrupted"], false);
    assert!(last["sim"]["final_v_mps"].as_f64().unwrap() > 8.0);
    assert!(last["sim"]["min_gap_m"].is_null());
}

#[rstest]
fn replay_jsonl_schema() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "");
    let log = dir.path().join("drive.csv");
    fs::write(&log, LOG).unwrap();

    let out = Command::cargo_bin("longplan")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("replay")
        .arg("--log")
        .arg(&log)
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));

    let lines = json_lines(&out.stdout);
    assert_eq!(lines.len(), 6);
    for plan in &lines[..5] {
        assert_plan_schema(plan);
    }
    // Longitudinal control handed back on the last row
    assert_eq!(lines[4]["reset"], true);
    assert_eq!(lines[5]["summary"]["cycles"], 5);
    assert_eq!(lines[5]["summary"]["resets"], 1);
}

#[rstest]
fn experimental_setting_publishes_blended_plans() {
    let dir = tempdir().unwrap();
    let cfg = write_config(&dir, "\n[settings]\nexperimental_mode = true\n");

    let out = Command::cargo_bin("longplan")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("sim")
        .arg("--max-cycles")
        .arg("5")
        .output()
        .unwrap();
    assert!(out.status.success());

    let lines = json_lines(&out.stdout);
    assert_eq!(lines.len(), 6);
    assert!(lines[..5].iter().all(|p| p["is_blended"] == true));
    assert_eq!(lines[5]["summary"]["final_mode"], "blended");
}

#[rstest]
fn json_error_object_on_bad_config() {
    let dir = tempdir().unwrap();
    let cfg = dir.path().join("bad.toml");
    fs::write(&cfg, "[integrator]\ndt_s = 0.0\n").unwrap();

    let out = Command::cargo_bin("longplan")
        .unwrap()
        .arg("--json")
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
    assert!(out.stdout.is_empty());

    let err: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&out.stderr).trim()).unwrap();
    assert_eq!(err["reason"], "Config");
    assert_eq!(err["exit_code"], 3);
    assert!(err["message"].as_str().unwrap().contains("integrator.dt_s"));
    assert_eq!(err["context"][0], "invalid configuration");
}
