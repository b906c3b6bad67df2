//! End-to-end CLI integration tests.

use assert_cmd::Command;
use predicates::prelude::*;

fn mathbox() -> Command {
    let mut cmd = Command::cargo_bin("mathbox").expect("binary not found");
    // Keep the user's settings and store out of the tests
    cmd.env_remove("MATHBOX_CONFIG")
        .env_remove("MATHBOX_STORE")
        .env_remove("RUST_LOG")
        .env("HOME", env!("CARGO_TARGET_TMPDIR"));
    cmd
}

#[test]
fn help_flag() {
    mathbox()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("calculators"));
}

#[test]
fn version_flag() {
    mathbox()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mathbox"));
}

#[test]
fn convert_length() {
    mathbox()
        .args(["convert", "length", "1.5", "--from", "kilometer", "--to", "meter"])
        .assert()
        .success()
        .stdout("1.5 km = 1500.0000 m\n");
}

#[test]
fn convert_unknown_unit_fails() {
    mathbox()
        .args(["convert", "weight", "3", "--from", "parsec"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsec"));
}

#[test]
fn percent_of() {
    mathbox()
        .args(["percent", "of", "20", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("100"));
}

#[test]
fn percent_decrease() {
    mathbox()
        .args(["percent", "change", "100", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-50%"));
}

#[test]
fn profit_outcome() {
    mathbox()
        .args(["profit", "outcome", "150", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loss"));
}

#[test]
fn bmi_imperial() {
    mathbox()
        .args(["bmi", "imperial", "150", "5", "6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BMI 24.2"));
}

#[test]
fn eval_expression() {
    mathbox()
        .args(["eval", "x^2 + 1", "-x", "3"])
        .assert()
        .success()
        .stdout("10\n");
}

#[test]
fn eval_parse_error() {
    mathbox()
        .args(["eval", "2 +"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"));
}

#[test]
fn graph_draws_chart() {
    mathbox()
        .args(["graph", "sin(x)", "--width", "30", "--height", "8"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("y = sin(x)").and(predicate::str::contains("*")));
}

#[test]
fn graph_invalid_equation() {
    mathbox()
        .args(["graph", "x +* 2"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid equation"));
}

#[test]
fn calc_persists_history() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    mathbox()
        .arg("--store")
        .arg(&store)
        .args(["calc", "5", "+", "3", "="])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("8\n"));

    mathbox()
        .arg("--store")
        .arg(&store)
        .arg("history")
        .assert()
        .success()
        .stdout(predicate::str::contains("5 + 3 = 8"));
}

#[test]
fn calc_divide_by_zero_shows_zero() {
    mathbox()
        .args(["--ephemeral", "calc", "9", "/", "0", "="])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("\n0\n"));
}

#[test]
fn calc_scientific_keys() {
    mathbox()
        .args(["--ephemeral", "calc", "5", "n!"])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("120\n"));
}

#[test]
fn time_conversion() {
    mathbox()
        .args(["time", "10:00", "--from", "UTC", "--to", "Asia/Kolkata"])
        .assert()
        .success()
        .stdout(predicate::str::contains("= 15:30"));
}

#[test]
fn zones_listed() {
    mathbox()
        .arg("zones")
        .assert()
        .success()
        .stdout(predicate::str::contains("Asia/Kolkata").and(predicate::str::contains("UTC+05:30")));
}

#[test]
fn age_report() {
    mathbox()
        .args(["age", "2000-01-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("years").and(predicate::str::contains("Next birthday in")));
}

#[test]
fn challenge_completion_builds_streak() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("store.json");

    mathbox()
        .arg("--store")
        .arg(&store)
        .args(["challenge", "done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Great start!"));

    mathbox()
        .arg("--store")
        .arg(&store)
        .args(["challenge", "streak"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 day streak"));
}

#[test]
fn typing_reads_stdin() {
    mathbox()
        .arg("typing")
        .write_stdin("\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not finished. 0 WPM").or(predicate::str::contains("WPM with 100% accuracy")));
}

#[test]
fn ask_without_endpoint_fails() {
    mathbox()
        .args(["ask", "what", "is", "2+2"])
        .env_remove("MATHBOX_AI_ENDPOINT")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no AI endpoint"));
}
