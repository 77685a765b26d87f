#![cfg(feature = "cli")]

use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn cli_fails_without_any_input() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("simulate");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing input data"));
}

#[test]
fn cli_simulates_defaults_with_empty_inputs_json() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("simulate").arg("--json").arg("--inputs-json").arg("{}");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"alkalinity_fitted\""))
        .stdout(predicate::str::contains("\"points\": 51"));
}

#[test]
fn cli_reads_input_document_from_stdin() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    let doc = serde_json::json!({
        "sample": { "dic": 2100.0, "ph_free": 8.0, "salinity": 33.0, "temperature": 20.0 },
        "titration": { "titrant": "HCl", "titrant_molinity": 0.3, "analyte_mass": 0.2, "emf0": 280.0 },
        "sweep": { "start_g": 0.0, "stop_g": 2.5, "step_g": 0.05 },
        "options": { "opt_k_carbonic": 10, "opt_total_borate": 2 }
    })
    .to_string();

    cmd.arg("simulate")
        .arg("--input")
        .arg("-")
        .write_stdin(doc);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("EMF0 (solved): 280.0000"));
}

#[test]
fn cli_reports_invalid_json_for_inputs_json() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("simulate").arg("--inputs-json").arg("{not valid json}");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON for --inputs-json"));
}

#[test]
fn cli_reports_invalid_json_in_file() {
    use std::fs::File;
    use std::io::Write as _;

    let dir = tempdir().unwrap();
    let file_path = dir.path().join("bad.json");
    let mut f = File::create(&file_path).unwrap();
    writeln!(f, "this is not json").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("simulate").arg("--input").arg(file_path);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid JSON in input document"));
}

#[test]
fn cli_rejects_unknown_constant_option() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("simulate")
        .arg("--inputs-json")
        .arg(r#"{"options": {"opt_k_carbonic": 3}}"#);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Invalid input"));
}

#[test]
fn cli_solves_the_table_it_was_given() {
    let dir = tempdir().unwrap();
    let dat = dir.path().join("sim.dat");

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("simulate")
        .arg("--inputs-json")
        .arg("{}")
        .arg("--dat")
        .arg(&dat);
    cmd.assert().success();
    assert!(dat.exists());

    let table = dir.path().join("dataset.csv");
    fs::write(
        &table,
        "file_name,salinity,analyte_mass,titrant_molinity,titrant,dic\nsim.dat,35,0.2,0.15,H2SO4,2000\n",
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("solve").arg("--json").arg("--write").arg(&table);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("\"file_name\": \"sim.dat\""))
        .stdout(predicate::str::contains("\"error\": null"));

    let written = fs::read_to_string(&table).unwrap();
    assert!(written.lines().next().unwrap().ends_with("alkalinity,emf0"));
    assert!(!written.lines().nth(1).unwrap().ends_with(','));
}

#[test]
fn cli_solve_fails_for_missing_titration_file() {
    let dir = tempdir().unwrap();
    let table = dir.path().join("dataset.csv");
    fs::write(
        &table,
        "file_name,salinity,analyte_mass,titrant_molinity\nnowhere.dat,35,0.2,0.1\n",
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("solve").arg(&table);
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("nowhere.dat: failed"))
        .stderr(predicate::str::contains("Error reading file"));
}

fn simulated_dataset(dir: &std::path::Path) -> std::path::PathBuf {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("simulate")
        .arg("--inputs-json")
        .arg("{}")
        .arg("--dat")
        .arg(dir.join("sim.dat"));
    cmd.assert().success();

    let table = dir.join("dataset.csv");
    fs::write(
        &table,
        "file_name,salinity,analyte_mass,titrant_molinity,titrant,dic\nsim.dat,35,0.2,0.15,H2SO4,2000\n",
    )
    .unwrap();
    table
}

#[test]
fn cli_solve_honours_iteration_limit() {
    let dir = tempdir().unwrap();
    let table = simulated_dataset(dir.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("solve").arg("--max-iterations").arg("1").arg(&table);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("did not converge after 1 iterations"));

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("solve")
        .arg("--ph-min")
        .arg("3.2")
        .arg("--ph-max")
        .arg("3.9")
        .arg(&table);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sim.dat: 2265.4"));
}

#[test]
fn cli_solve_rejects_empty_ph_window() {
    let dir = tempdir().unwrap();
    let table = simulated_dataset(dir.path());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("alkalinity_rs");
    cmd.arg("solve")
        .arg("--ph-min")
        .arg("4")
        .arg("--ph-max")
        .arg("3")
        .arg(&table);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("pH window"));
}
