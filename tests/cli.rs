use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

fn write_terrain(dir: &Path, lon: f64, lat: f64, elevation: f64) -> PathBuf {
    let path = dir.join("terrain.txt");
    let mut file = File::create(&path).expect("terrain create");
    writeln!(file, "# lon lat elevation (lon in 0-360)").unwrap();
    for i in -10..=10 {
        for j in -10..=10 {
            writeln!(
                file,
                "{:.3} {:.3} {elevation}",
                lon + 360.0 + 0.05 * i as f64,
                lat + 0.05 * j as f64
            )
            .unwrap();
        }
    }
    path
}

fn write_calm_digicora(dir: &Path) -> PathBuf {
    let path = dir.join("sounding.txt");
    let mut file = File::create(&path).expect("sounding create");
    writeln!(file, "Time Height Pres Temp RH Dewp Dir Speed").unwrap();
    for i in 0..=40 {
        writeln!(
            file,
            "{} {} {:.1} 10.0 70 5.0 0 0",
            i * 30,
            300 + 150 * i,
            980.0 - 18.0 * i as f64
        )
        .unwrap();
    }
    writeln!(file, "EOF").unwrap();
    path
}

fn predict() -> Command {
    Command::cargo_bin("predict").expect("predict bin")
}

#[test]
fn sounding_prediction_writes_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let profile = write_calm_digicora(dir.path());
    let terrain = write_terrain(dir.path(), -76.0, 43.7, 250.0);
    let track_csv = dir.path().join("out").join("track.csv");
    let summary_json = dir.path().join("out").join("summary.json");

    predict()
        .args(["sounding", "--profile", profile.to_str().unwrap()])
        .args(["--terrain", terrain.to_str().unwrap()])
        .args(["--lat", "43.7", "--lon", "-76.0", "--alt", "300", "--cutdown-minutes", "10"])
        .args(["--track-csv", track_csv.to_str().unwrap()])
        .args(["--summary-json", summary_json.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("minutes to impact"))
        .stdout(predicate::str::contains(
            "Estimated landing lat, lon, alt (m MSL): 43.7000 -76.0000 204.0",
        ));

    let csv = fs::read_to_string(&track_csv).expect("track csv");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("index,phase,elapsed_s,longitude_deg,latitude_deg,altitude_m")
    );
    assert_eq!(lines.next(), Some("0,launch,0.000,-76.000000,43.700000,300.00"));
    assert_eq!(csv.lines().count(), 1 + 1 + 60 + 75, "header, launch, ascent, descent rows");
    assert!(csv.lines().last().unwrap().contains(",descent,"));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_json).expect("summary json")).unwrap();
    assert_eq!(summary["source"], "sounding");
    assert_eq!(summary["ascent_steps"], 60);
    assert_eq!(summary["descent_steps"], 75);
    assert_eq!(summary["cutdown"]["elapsed_s"], 600.0);
}

#[test]
fn missing_launch_values_are_prompted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let profile = write_calm_digicora(dir.path());
    let terrain = write_terrain(dir.path(), -76.0, 43.7, 250.0);

    predict()
        .args(["sounding", "--profile", profile.to_str().unwrap()])
        .args(["--terrain", terrain.to_str().unwrap()])
        .write_stdin("43.7, -76.0, 300\n10\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Enter starting location"))
        .stdout(predicate::str::contains("Enter expected time from launch to cutdown"))
        .stdout(predicate::str::contains("43.7000 -76.0000 204.0"));
}

#[test]
fn config_file_supplies_terrain_and_overrides() {
    let dir = tempfile::tempdir().expect("tempdir");
    let profile = write_calm_digicora(dir.path());
    let terrain = write_terrain(dir.path(), -76.0, 43.7, 250.0);
    let summary_json = dir.path().join("summary.json");
    let config = dir.path().join("run.toml");
    fs::write(
        &config,
        format!(
            "[simulation]\ndescent_interval = 25.0\n\n[terrain]\npath = {:?}\nlookup = \"axis_aligned\"\n\n[output]\nsummary_json = {:?}\n",
            terrain.display().to_string(),
            summary_json.display().to_string(),
        ),
    )
    .unwrap();

    predict()
        .args(["sounding", "--profile", profile.to_str().unwrap()])
        .args(["--config", config.to_str().unwrap()])
        .args(["--lat", "43.7", "--lon", "-76.0", "--alt", "300", "--cutdown-seconds", "600"])
        .assert()
        .success()
        .stdout(predicate::str::contains("43.7000 -76.0000 229.0"));

    let summary: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_json).expect("summary json")).unwrap();
    assert_eq!(summary["descent_steps"], 149);
}

#[test]
fn sweep_prints_each_cutdown() {
    let dir = tempfile::tempdir().expect("tempdir");
    let profile = write_calm_digicora(dir.path());
    let terrain = write_terrain(dir.path(), -76.0, 43.7, 250.0);

    predict()
        .args(["sounding", "--profile", profile.to_str().unwrap()])
        .args(["--terrain", terrain.to_str().unwrap()])
        .args(["--lat", "43.7", "--lon", "-76.0", "--alt", "300", "--cutdown-minutes", "10"])
        .args(["--sweep-minutes", "5,15"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cutdown 5.0 min:"))
        .stdout(predicate::str::contains("cutdown 15.0 min:"));
}

#[test]
fn tracker_feed_predicts_descent_from_last_fix() {
    let dir = tempfile::tempdir().expect("tempdir");
    let terrain = write_terrain(dir.path(), -76.0, 43.7, 250.0);
    let feed = dir.path().join("cutdown.kml");
    fs::write(
        &feed,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:gx="http://www.google.com/kml/ext/2.2">
<Document>
  <Placemark>
    <name>209825</name>
    <gx:Track>
      <when>2023-11-19T18:00:00Z</when>
      <when>2023-11-19T18:01:00Z</when>
      <when>2023-11-19T18:02:30Z</when>
      <gx:coord>-76.00 43.70 5000</gx:coord>
      <gx:coord>-75.99 43.70 4700</gx:coord>
      <gx:coord>-75.98 43.71 4250</gx:coord>
    </gx:Track>
    <ExtendedData><SchemaData>
      <gx:SimpleArrayData name="pressure">
        <gx:value>540.0</gx:value>
        <gx:value>560.0</gx:value>
        <gx:value>590.0</gx:value>
      </gx:SimpleArrayData>
    </SchemaData></ExtendedData>
  </Placemark>
</Document>
</kml>
"#,
    )
    .unwrap();

    predict()
        .args(["tracker", "--feed", feed.to_str().unwrap(), "--tracker", "209825"])
        .args(["--terrain", terrain.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Estimated landing lat, lon, alt (m MSL): 43.7100 -75.9800"));

    predict()
        .args(["tracker", "--feed", feed.to_str().unwrap(), "--tracker", "42"])
        .args(["--terrain", terrain.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("42"));
}

#[test]
fn saved_model_sounding_runs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let terrain = write_terrain(dir.path(), -76.0, 43.7, 50.0);
    let rap = dir.path().join("rap.txt");
    fs::write(
        &rap,
        "\
Op40 analysis valid for grid point 3.2 nm / 45 deg from 43.7,-76.0:
Op40         17     27      Dec    2023
   CAPE      0    CIN      0  Helic  99999     PW  99999
      1  23062  99999  43.70  76.00  99999  99999
      2  99999  99999  99999     51  99999  99999
      3           43.7,-76.0   12     kt
      9  10000     99  -12  -45    250      9
      4   9990    146  -13  -26    255     10
      5   9500    560  -15  -28    260     20
      5   8500   1450  -19  -33    270     30
      5   7000   3000  -25  -40    275     40
",
    )
    .unwrap();

    predict()
        .args(["model", "--profile", rap.to_str().unwrap()])
        .args(["--terrain", terrain.to_str().unwrap()])
        .args(["--lat", "43.7", "--lon", "-76.0", "--alt", "99", "--cutdown-minutes", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("minutes to impact"));
}

#[test]
fn missing_terrain_fails_with_message() {
    let dir = tempfile::tempdir().expect("tempdir");
    let profile = write_calm_digicora(dir.path());

    predict()
        .args(["sounding", "--profile", profile.to_str().unwrap()])
        .args(["--lat", "43.7", "--lon", "-76.0", "--alt", "300", "--cutdown-minutes", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no terrain file"));
}

#[test]
fn partial_launch_position_is_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let profile = write_calm_digicora(dir.path());
    let terrain = write_terrain(dir.path(), -76.0, 43.7, 200.0);

    predict()
        .args(["sounding", "--profile", profile.to_str().unwrap()])
        .args(["--terrain", terrain.to_str().unwrap()])
        .args(["--lat", "43.7", "--cutdown-minutes", "10"])
        .write_stdin("43.7, -76.0, 300\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--lon"))
        .stderr(predicate::str::contains("--alt"));
}

#[test]
fn fetch_sounding_dry_run_prints_query() {
    Command::cargo_bin("fetch_sounding")
        .expect("fetch_sounding bin")
        .args(["--time", "2023122712", "--lat", "43.7", "--lon", "-76.0", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("data_source=Op40"))
        .stdout(predicate::str::contains("airport=43.7%2C-76"));
}
