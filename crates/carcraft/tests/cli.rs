use assert_cmd::prelude::*;

use predicates::prelude::*;
use predicates::str::contains;
use serial_test::serial;
use std::process::Command;

/// Helper to create a Command for the `carcraft` binary with a temporary home.
fn carcraft_cmd(home: &assert_fs::TempDir) -> Command {
  let mut cmd = Command::cargo_bin("carcraft").expect("binary exists");
  cmd.env("CARCRAFT_HOME", home.path());
  cmd.env("NO_COLOR", "1");
  cmd.env_remove("RUST_LOG");
  cmd
}

fn record(home: &assert_fs::TempDir, company: &str, model: &str, price: &str) {
  carcraft_cmd(home)
    .args([
      "record", "--company", company, "--model", model, "--year", "2019", "--kms", "35000", "--fuel",
      "Petrol", "--price", price, "--confidence", "88",
    ])
    .assert()
    .success()
    .stdout(contains("Recorded prediction"));
}

/// Ids of stored predictions, newest first, read from the storage file
fn stored_ids(home: &assert_fs::TempDir) -> Vec<u64> {
  let path = home.path().join("storage").join("carPredictions.json");
  let content = std::fs::read_to_string(path).unwrap();
  let records: Vec<serde_json::Value> = serde_json::from_str(&content).unwrap();
  records.iter().map(|r| r["id"].as_u64().unwrap()).collect()
}

#[test]
#[serial]
fn test_record_list_and_show() {
  let home = assert_fs::TempDir::new().unwrap();

  record(&home, "Maruti", "Baleno", "650000");
  record(&home, "Hyundai", "i20", "720000");

  carcraft_cmd(&home)
    .args(["list"])
    .assert()
    .success()
    .stdout(contains("Maruti Baleno").and(contains("Hyundai i20")).and(contains("₹720,000")));

  let id = stored_ids(&home)[0].to_string();
  carcraft_cmd(&home)
    .args(["show", &id])
    .assert()
    .success()
    .stdout(contains("Hyundai i20").and(contains("Fuel: Petrol")));

  home.close().unwrap();
}

#[test]
#[serial]
fn test_save_actual_and_stats() {
  let home = assert_fs::TempDir::new().unwrap();
  record(&home, "Tata", "Nexon", "1000000");
  let id = stored_ids(&home)[0].to_string();

  carcraft_cmd(&home).args(["save", &id]).assert().success().stdout(contains("Saved prediction"));

  carcraft_cmd(&home)
    .args(["list", "--saved"])
    .assert()
    .success()
    .stdout(contains("Tata Nexon"));

  carcraft_cmd(&home)
    .args(["actual", &id, "950000"])
    .assert()
    .success()
    .stdout(contains("95.0%"));

  carcraft_cmd(&home)
    .args(["stats"])
    .assert()
    .success()
    .stdout(
      contains("Total predictions: 1")
        .and(contains("Saved predictions: 1"))
        .and(contains("Average accuracy: 95%"))
        .and(contains("Favorite brand: Tata")),
    );

  home.close().unwrap();
}

#[test]
#[serial]
fn test_export_to_stdout_and_file() {
  let home = assert_fs::TempDir::new().unwrap();

  carcraft_cmd(&home)
    .args(["export", "--stdout"])
    .assert()
    .success()
    .stdout(contains("Car,Company,Model,Year,Predicted Price,Confidence,Date,Accuracy,Saved"));

  record(&home, "Kia", "Carens", "1400000");

  let out_dir = home.path().join("exports");
  carcraft_cmd(&home)
    .args(["export", "--output", out_dir.to_str().unwrap()])
    .assert()
    .success()
    .stdout(contains("car-predictions-"));

  let files: Vec<_> = std::fs::read_dir(&out_dir).unwrap().map(|e| e.unwrap().path()).collect();
  assert_eq!(files.len(), 1);
  let csv = std::fs::read_to_string(&files[0]).unwrap();
  assert!(csv.contains("Kia Carens,Kia,Carens,2019,1400000,88%,"));
  assert!(csv.ends_with(",Pending,No"));

  home.close().unwrap();
}

#[test]
#[serial]
fn test_delete_and_clear() {
  let home = assert_fs::TempDir::new().unwrap();
  record(&home, "Honda", "Jazz", "500000");
  record(&home, "Honda", "WR-V", "800000");
  let ids = stored_ids(&home);

  carcraft_cmd(&home)
    .args(["delete", &ids[0].to_string(), "--force"])
    .assert()
    .success()
    .stdout(contains("Deleted prediction"));
  assert_eq!(stored_ids(&home), vec![ids[1]]);

  carcraft_cmd(&home)
    .args(["delete", "12345", "--force"])
    .assert()
    .success()
    .stdout(contains("not found"));

  carcraft_cmd(&home).args(["clear", "--force"]).assert().success();
  carcraft_cmd(&home).args(["list"]).assert().success().stdout(contains("No predictions found"));

  home.close().unwrap();
}

#[test]
#[serial]
fn test_delete_prompt_can_be_declined() {
  let home = assert_fs::TempDir::new().unwrap();
  record(&home, "Skoda", "Rapid", "600000");
  let id = stored_ids(&home)[0];

  assert_cmd::Command::from_std(carcraft_cmd(&home))
    .args(["delete", &id.to_string()])
    .write_stdin("n\n")
    .assert()
    .success()
    .stdout(contains("Deletion cancelled"));
  assert_eq!(stored_ids(&home), vec![id]);

  home.close().unwrap();
}

#[test]
#[serial]
fn test_invalid_confidence_is_rejected() {
  let home = assert_fs::TempDir::new().unwrap();

  carcraft_cmd(&home)
    .args([
      "record", "--company", "Jeep", "--model", "Compass", "--year", "2022", "--kms", "5000", "--fuel",
      "Diesel", "--price", "2500000", "--confidence", "150",
    ])
    .assert()
    .failure()
    .stderr(contains("confidence"));

  home.close().unwrap();
}

#[test]
#[serial]
fn test_predict_reports_unreachable_api() {
  let home = assert_fs::TempDir::new().unwrap();

  carcraft_cmd(&home)
    .env("CARCRAFT_API_URL", "http://127.0.0.1:9")
    .args([
      "predict", "--company", "Maruti", "--model", "Dzire", "--year", "2020", "--kms", "30000", "--fuel",
      "CNG",
    ])
    .assert()
    .failure()
    .stderr(contains("Failed to get prediction"));

  assert!(!home.path().join("storage").join("carPredictions.json").exists());
  home.close().unwrap();
}
