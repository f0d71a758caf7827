//! CLI integration tests using assert_cmd.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const NOTEBOOK: &str = r##"{
 "cells": [
  {"cell_type": "markdown", "metadata": {}, "source": ["# Homework 1\n", "**Student Name:** Ada Lovelace\n"]},
  {"cell_type": "code", "execution_count": 1, "metadata": {}, "source": "getwd()",
   "outputs": [{"output_type": "execute_result", "execution_count": 1, "data": {"text/plain": ["'/home/ada/hw1'"]}, "metadata": {}}]},
  {"cell_type": "code", "execution_count": 2, "metadata": {}, "source": "library(tidyverse)",
   "outputs": []},
  {"cell_type": "code", "execution_count": 3, "metadata": {}, "source": "head(sales_df)",
   "outputs": [{"output_type": "error", "ename": "simpleError", "evalue": "object 'sales_df' not found", "traceback": []}]}
 ],
 "metadata": {},
 "nbformat": 4,
 "nbformat_minor": 5
}"##;

fn nbgrade(home: &Path) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("nbgrade").unwrap();
    cmd.current_dir(home).env("HOME", home);
    cmd
}

fn write_notebook(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn json_records(dir: &Path) -> Vec<serde_json::Value> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .map(|p| serde_json::from_str(&std::fs::read_to_string(p).unwrap()).unwrap())
        .collect()
}

#[test]
fn init_creates_config() {
    let dir = TempDir::new().unwrap();
    nbgrade(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created nbgrade.toml"))
        .stdout(predicate::str::contains("Next steps"));

    let content = std::fs::read_to_string(dir.path().join("nbgrade.toml")).unwrap();
    assert!(content.contains("kernel_name = \"ir\""));
}

#[test]
fn init_skips_existing_config() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("nbgrade.toml"), "execute = false\n").unwrap();

    nbgrade(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists, skipping"));

    let content = std::fs::read_to_string(dir.path().join("nbgrade.toml")).unwrap();
    assert_eq!(content, "execute = false\n");
}

#[test]
fn grade_prints_text_feedback() {
    let dir = TempDir::new().unwrap();
    let nb = write_notebook(&dir, "hw1.ipynb", NOTEBOOK);

    nbgrade(dir.path())
        .args(["grade", "--no-execute", "--format", "text", "--notebook"])
        .arg(&nb)
        .assert()
        .success()
        .stdout(predicate::str::contains("DETAILED HOMEWORK ANALYSIS"))
        .stdout(predicate::str::contains("Final Score:"))
        .stderr(predicate::str::contains("Working Directory"))
        .stderr(predicate::str::contains("Check current working directory"))
        .stderr(predicate::str::contains("Ada Lovelace"));
}

#[test]
fn grade_saves_json_record() {
    let dir = TempDir::new().unwrap();
    let nb = write_notebook(&dir, "hw1.ipynb", NOTEBOOK);
    let out = dir.path().join("records");

    nbgrade(dir.path())
        .args(["grade", "--no-execute", "--format", "json", "--notebook"])
        .arg(&nb)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("Record saved to"));

    let records = json_records(&out);
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record["student"], "Ada Lovelace");
    assert_eq!(record["assignment"], "hw1");
    assert!(record["analysis"]["total_score"].as_f64().unwrap() > 0.0);
    assert_eq!(record["analysis"]["execution"]["status"], "not_attempted");
}

#[test]
fn grade_overrides_student_and_assignment() {
    let dir = TempDir::new().unwrap();
    let nb = write_notebook(&dir, "hw1.ipynb", NOTEBOOK);
    let out = dir.path().join("records");

    nbgrade(dir.path())
        .args(["grade", "--no-execute", "--format", "json"])
        .args(["--student", "Grace Hopper", "--assignment", "Week 2"])
        .arg("--notebook")
        .arg(&nb)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let records = json_records(&out);
    assert_eq!(records[0]["student"], "Grace Hopper");
    assert_eq!(records[0]["assignment"], "Week 2");
}

#[test]
fn grade_writes_pdf_report() {
    let dir = TempDir::new().unwrap();
    let nb = write_notebook(&dir, "hw1.ipynb", NOTEBOOK);
    let out = dir.path().join("reports");

    nbgrade(dir.path())
        .args(["grade", "--no-execute", "--format", "pdf", "--notebook"])
        .arg(&nb)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("PDF report:"));

    let folder = out.join("hw1");
    let pdfs: Vec<_> = std::fs::read_dir(&folder).unwrap().collect();
    assert_eq!(pdfs.len(), 1);
    let path = pdfs[0].as_ref().unwrap().path();
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("Ada_Lovelace_report_"));
    assert!(std::fs::read(path).unwrap().starts_with(b"%PDF"));
}

#[test]
fn grade_unreadable_notebook_scores_zero() {
    let dir = TempDir::new().unwrap();
    let nb = write_notebook(&dir, "broken.ipynb", "{ this is not json");
    let out = dir.path().join("records");

    nbgrade(dir.path())
        .args(["grade", "--no-execute", "--format", "json", "--notebook"])
        .arg(&nb)
        .arg("--output")
        .arg(&out)
        .assert()
        .success();

    let records = json_records(&out);
    assert_eq!(records[0]["analysis"]["total_score"].as_f64(), Some(0.0));
    assert_eq!(records[0]["student"], "Unknown Student");
}

#[test]
fn grade_falls_back_when_jupyter_missing() {
    let dir = TempDir::new().unwrap();
    let nb = write_notebook(&dir, "hw1.ipynb", NOTEBOOK);
    std::fs::write(
        dir.path().join("nbgrade.toml"),
        "execute = true\njupyter_bin = \"nbgrade-test-no-such-jupyter\"\n",
    )
    .unwrap();

    nbgrade(dir.path())
        .args(["grade", "--format", "text", "--notebook"])
        .arg(&nb)
        .assert()
        .success()
        .stdout(predicate::str::contains("Final Score:"))
        .stderr(predicate::str::contains("execution failed"));
}

#[test]
fn grade_missing_notebook_fails() {
    let dir = TempDir::new().unwrap();
    nbgrade(dir.path())
        .args(["grade", "--no-execute", "--notebook", "nope.ipynb"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("notebook not found"));
}

#[test]
fn grade_missing_config_fails() {
    let dir = TempDir::new().unwrap();
    let nb = write_notebook(&dir, "hw1.ipynb", NOTEBOOK);
    nbgrade(dir.path())
        .args(["grade", "--no-execute", "--config", "missing.toml", "--notebook"])
        .arg(&nb)
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn report_from_legacy_feedback() {
    let dir = TempDir::new().unwrap();
    let feedback = dir.path().join("feedback.json");
    let lines = serde_json::json!([
        "📋 **DETAILED HOMEWORK ANALYSIS**",
        "**Final Score: 4.0 / 37.5 points**",
        "",
        "**DETAILED BREAKDOWN:**",
        "✅ **Working Directory (2/2 points)**: getwd() executed",
        "📦 **Package Loading (2/4 points)**: tidyverse loaded",
        "",
        "**CODE ISSUES TO FIX:**",
        "• ERROR: Error: object 'sales_df' not found",
    ]);
    std::fs::write(&feedback, lines.to_string()).unwrap();
    let out = dir.path().join("reports");

    nbgrade(dir.path())
        .arg("report")
        .arg("--feedback")
        .arg(&feedback)
        .args(["--student", "Ada Lovelace", "--assignment", "HW 1"])
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("PDF report generated"));

    let pdfs: Vec<_> = std::fs::read_dir(out.join("HW_1")).unwrap().collect();
    assert_eq!(pdfs.len(), 1);
}

#[test]
fn report_from_saved_record() {
    let dir = TempDir::new().unwrap();
    let nb = write_notebook(&dir, "hw1.ipynb", NOTEBOOK);
    let records = dir.path().join("records");

    nbgrade(dir.path())
        .args(["grade", "--no-execute", "--format", "json", "--notebook"])
        .arg(&nb)
        .arg("--output")
        .arg(&records)
        .assert()
        .success();

    let record = std::fs::read_dir(&records)
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();

    nbgrade(dir.path())
        .arg("report")
        .arg("--feedback")
        .arg(&record)
        .args(["--student", "Ada Lovelace", "--assignment", "hw1"])
        .assert()
        .success();

    // Default reports_dir from the built-in config.
    assert!(dir.path().join("reports").join("hw1").is_dir());
}

#[test]
fn report_missing_feedback_fails() {
    let dir = TempDir::new().unwrap();
    nbgrade(dir.path())
        .args(["report", "--feedback", "missing.json"])
        .args(["--student", "Ada", "--assignment", "HW1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn report_rejects_non_feedback_json() {
    let dir = TempDir::new().unwrap();
    let feedback = dir.path().join("feedback.json");
    std::fs::write(&feedback, "42").unwrap();

    nbgrade(dir.path())
        .arg("report")
        .arg("--feedback")
        .arg(&feedback)
        .args(["--student", "Ada", "--assignment", "HW1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("feedback must be a JSON object or list"));
}
