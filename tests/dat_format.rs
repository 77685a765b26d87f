use std::fs;

use alkalinity_rs::{
    AppError, CarbonateEngine, SeawaterSample, TitrationParameters, TitrationPoint,
    io::dat::DAT_COLUMNS,
    io::{TitrantAmountUnit, WriteMode, read_dat, write_dat},
    simulate_isothermal, titrant_mass_sweep,
};
use tempfile::tempdir;

fn simulated_points() -> Vec<TitrationPoint> {
    let masses = titrant_mass_sweep(0.0, 2.5, 0.05).unwrap();
    simulate_isothermal(
        &CarbonateEngine::default(),
        &SeawaterSample::default(),
        &TitrationParameters::default(),
        &masses,
    )
    .unwrap()
    .titration_points()
}

#[test]
fn written_file_reads_back_within_rounding() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sim.dat");
    let points = simulated_points();
    write_dat(&path, &points, WriteMode::Truncate).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[1], DAT_COLUMNS);
    assert_eq!(lines.len(), points.len() + 2);
    assert!(lines[2].starts_with("0.0000\t"));
    assert!(lines[3].starts_with("0.0500\t") && lines[3].ends_with("\t25.0000"));

    let rows = read_dat(&path).unwrap();
    assert_eq!(rows.len(), points.len());
    for (row, p) in rows.iter().zip(&points) {
        let back = row.to_point(TitrantAmountUnit::G);
        assert!((back.titrant_mass - p.titrant_mass).abs() < 5e-8);
        assert!((back.emf - p.emf).abs() <= 5e-5 + 1e-12);
        assert!((back.temperature - p.temperature).abs() <= 5e-5);
    }
}

#[test]
fn truncate_replaces_and_append_extends() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sim.dat");
    let points = simulated_points();

    write_dat(&path, &points, WriteMode::Truncate).unwrap();
    write_dat(&path, &points[..3], WriteMode::Truncate).unwrap();
    assert_eq!(read_dat(&path).unwrap().len(), 3);

    write_dat(&path, &points[3..5], WriteMode::Append).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert_eq!(text.matches(DAT_COLUMNS).count(), 1);
    assert_eq!(read_dat(&path).unwrap().len(), 5);
}

#[test]
fn append_to_missing_file_writes_headers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new.dat");
    write_dat(&path, &simulated_points()[..2], WriteMode::Append).unwrap();
    assert_eq!(read_dat(&path).unwrap().len(), 2);
}

#[test]
fn kilogram_unit_is_taken_as_is() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("kg.dat");
    fs::write(&path, "title\nmass\temf\ttemp\n0.0010\t250.5\t20.0\n").unwrap();
    let rows = read_dat(&path).unwrap();
    let p = rows[0].to_point(TitrantAmountUnit::Kg);
    assert_eq!(p.titrant_mass, 0.001);
    assert_eq!(p.emf, 250.5);
}

#[test]
fn malformed_rows_report_their_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.dat");
    fs::write(&path, "title\ncols\n0.0\t100.0\t25.0\n\n0.05\tabc\t25.0\n").unwrap();
    match read_dat(&path).unwrap_err() {
        AppError::ParseDat { line, .. } => assert_eq!(line, 5),
        other => panic!("unexpected error {other:?}"),
    }

    fs::write(&path, "title\ncols\n0.0\t100.0\n").unwrap();
    match read_dat(&path).unwrap_err() {
        AppError::ParseDat { line, message, .. } => {
            assert_eq!(line, 3);
            assert!(message.contains("3 columns"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn header_only_and_missing_files_are_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.dat");
    fs::write(&path, "title\ncols\n").unwrap();
    assert!(matches!(
        read_dat(&path).unwrap_err(),
        AppError::ParseDat { .. }
    ));
    assert!(matches!(
        read_dat(&dir.path().join("missing.dat")).unwrap_err(),
        AppError::ReadFile { .. }
    ));
}
