mod common;

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value as JsonValue;

use common::{ORDERS_HEADER, TestWorkspace};

fn sieve() -> Command {
    let mut cmd = Command::cargo_bin("csv-sieve").expect("binary exists");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn sniff_prints_detected_delimiter() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_lines("semi.csv", "id;name;amount", &["1;Alice;10"]);

    sieve()
        .args(["sniff", "-i", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(";\n");
}

#[test]
fn preview_skips_malformed_line_and_logs_it() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_lines(
        "orders.csv",
        ORDERS_HEADER,
        &["1,Alice,10", "2,Bob", "3,Carol,30"],
    );

    sieve()
        .args(["preview", "-i", path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("Alice").and(contains("Carol")).and(contains("Bob").not()))
        .stderr(contains("Skipping malformed line 3"));
}

#[test]
fn preview_honours_offset_and_limit() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_lines(
        "orders.csv",
        ORDERS_HEADER,
        &["1,Alice,10", "2,Bob,20", "3,Carol,30", "4,Dan,40"],
    );

    sieve()
        .args([
            "preview",
            "-i",
            path.to_str().unwrap(),
            "--offset",
            "1",
            "--limit",
            "2",
        ])
        .assert()
        .success()
        .stdout(
            contains("Bob")
                .and(contains("Carol"))
                .and(contains("Alice").not())
                .and(contains("Dan").not()),
        );
}

#[test]
fn filter_writes_matching_rows_to_output_file() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_lines(
        "orders.csv",
        ORDERS_HEADER,
        &["1,Alice,10", "2,Bob,", "3,Carol,30"],
    );
    let output = workspace.path().join("filtered.csv");

    sieve()
        .args([
            "filter",
            "-i",
            path.to_str().unwrap(),
            "--include",
            "name=Alice|Carol",
            "--range",
            "amount=..20",
            "-o",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    let contents = fs::read_to_string(&output).expect("read output");
    assert_eq!(contents, "id,name,amount\n1,Alice,10\n");
}

#[test]
fn filter_absent_streams_csv_to_stdout() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_lines(
        "orders.csv",
        ORDERS_HEADER,
        &["1,Alice,10", "2,Bob,", "3,Carol,30"],
    );

    sieve()
        .args(["filter", "-i", path.to_str().unwrap(), "--absent", "amount"])
        .assert()
        .success()
        .stdout("id,name,amount\n2,Bob,\n");
}

#[test]
fn columns_json_reports_types_and_kinds() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_lines(
        "orders.csv",
        ORDERS_HEADER,
        &["1,Alice,10.5", "2,Bob,", "3,Alice,30"],
    );

    let assert = sieve()
        .args(["columns", "-i", path.to_str().unwrap(), "--json"])
        .assert()
        .success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8 stdout");
    let summary: JsonValue = serde_json::from_str(&stdout).expect("parse json");
    let columns = summary.as_array().expect("array of columns");
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0]["name"], "id");
    assert_eq!(columns[0]["data_type"], "integer");
    assert_eq!(columns[1]["kind"], "categorical");
    assert_eq!(columns[1]["distinct"], 2);
    assert_eq!(columns[2]["data_type"], "float");
    assert_eq!(columns[2]["nulls"], 1);
    assert_eq!(columns[2]["max"], 30.0);
}

#[test]
fn explicit_delimiter_flag_is_respected() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_lines("tabs.tsv", "id\tname", &["1\tAlice"]);

    sieve()
        .args([
            "filter",
            "-i",
            path.to_str().unwrap(),
            "--delimiter",
            "tab",
        ])
        .assert()
        .success()
        .stdout("id,name\n1,Alice\n");
}

#[test]
fn missing_input_fails_with_error_message() {
    let workspace = TestWorkspace::new();
    let missing = workspace.path().join("nope.csv");

    sieve()
        .args(["preview", "-i", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("error:").and(contains("nope.csv")));
}

#[test]
fn unknown_filter_column_is_reported() {
    let workspace = TestWorkspace::new();
    let path = workspace.write_lines("orders.csv", ORDERS_HEADER, &["1,Alice,10"]);

    sieve()
        .args(["filter", "-i", path.to_str().unwrap(), "--present", "zip"])
        .assert()
        .failure()
        .stderr(contains("Column 'zip' not found"));
}
