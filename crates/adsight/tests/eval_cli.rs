use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::process::Command;

fn eval_cmd() -> Command {
  Command::cargo_bin("adsight_eval").expect("binary exists")
}

fn adsight_cmd() -> Command {
  Command::cargo_bin("adsight").expect("binary exists")
}

#[test]
fn test_eval_prints_report_line() {
  let temp = assert_fs::TempDir::new().unwrap();
  let csv = temp.child("scores.csv");
  csv.write_str("output,reference\nincrease ad spend,increase your ad spend\n").unwrap();

  // ROUGE-1 = ROUGE-L = 6/7, token F1 = 4/7
  eval_cmd()
    .arg(csv.path())
    .assert()
    .success()
    .stdout(predicate::eq("Average ROUGE-1: 0.86, ROUGE-L: 0.86, F1: 0.57\n"));

  temp.close().unwrap();
}

#[test]
fn test_eval_reads_default_file_from_working_directory() {
  let temp = assert_fs::TempDir::new().unwrap();
  temp
    .child("outputs_vs_refs.csv")
    .write_str("Output , Reference\nsame words here,same words here\n")
    .unwrap();

  eval_cmd()
    .current_dir(temp.path())
    .assert()
    .success()
    .stdout(contains("Average ROUGE-1: 1.00, ROUGE-L: 1.00, F1: 1.00"));

  temp.close().unwrap();
}

#[test]
fn test_eval_missing_reference_column() {
  let temp = assert_fs::TempDir::new().unwrap();
  let csv = temp.child("bad.csv");
  csv.write_str("output,expected\na,b\n").unwrap();

  eval_cmd()
    .arg(csv.path())
    .assert()
    .failure()
    .code(1)
    .stdout(predicate::str::is_empty())
    .stderr(contains(
      "ERROR: CSV must have columns named 'output' and 'reference' (case-insensitive, no extra spaces).",
    ));

  temp.close().unwrap();
}

#[test]
fn test_eval_header_only_file() {
  let temp = assert_fs::TempDir::new().unwrap();
  let csv = temp.child("empty.csv");
  csv.write_str("output,reference\n").unwrap();

  eval_cmd().arg(csv.path()).assert().failure().code(1).stderr(contains("ERROR: No data found in CSV."));

  temp.close().unwrap();
}

#[test]
fn test_eval_unreadable_file() {
  let temp = assert_fs::TempDir::new().unwrap();

  eval_cmd()
    .arg(temp.path().join("missing.csv"))
    .assert()
    .failure()
    .code(1)
    .stderr(contains("ERROR: Failed to read or process CSV:"));

  temp.close().unwrap();
}

#[test]
fn test_sample_eval_then_evaluate_in_process() {
  let temp = assert_fs::TempDir::new().unwrap();
  let sample = temp.child("sample.csv");

  adsight_cmd().arg("sample-eval").arg(sample.path()).assert().success().stdout(contains("Wrote sample"));
  sample.assert(predicate::str::starts_with("output,reference\n"));

  adsight_cmd()
    .arg("evaluate")
    .arg(sample.path())
    .assert()
    .success()
    .stdout(contains("ROUGE-1").and(contains("ROUGE-L")).and(contains("F1 Score")).and(contains("%")));

  temp.close().unwrap();
}

#[test]
fn test_evaluate_external_uses_eval_binary() {
  let temp = assert_fs::TempDir::new().unwrap();
  let csv = temp.child("scores.csv");
  csv.write_str("output,reference\nincrease ad spend,increase your ad spend\n").unwrap();

  adsight_cmd()
    .args(["evaluate", "--external"])
    .arg(csv.path())
    .assert()
    .success()
    .stdout(contains("86.0%").and(contains("57.0%")));

  temp.close().unwrap();
}

#[test]
fn test_evaluate_reports_missing_columns() {
  let temp = assert_fs::TempDir::new().unwrap();
  let csv = temp.child("bad.csv");
  csv.write_str("answer\nx\n").unwrap();

  adsight_cmd()
    .arg("evaluate")
    .arg(csv.path())
    .assert()
    .failure()
    .stderr(contains("CSV must have columns named 'output' and 'reference'"));

  temp.close().unwrap();
}

#[test]
fn test_analyze_rejects_out_of_range_rating() {
  adsight_cmd()
    .args(["analyze", "ads.csv", "--rating", "9"])
    .assert()
    .failure()
    .stderr(contains("9"));
}
