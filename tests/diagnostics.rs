//! Control-plane diagnostics and the queryState report.

mod common;

use common::run_script;

#[test]
fn test_duplicate_begin_is_diagnosed() {
    let lines = run_script("begin(T1)\nbegin(T1)\n");
    assert_eq!(lines, vec!["Transaction T1 already exists"]);
}

#[test]
fn test_unknown_transaction_read_and_write() {
    let lines = run_script("R(T9,x2)\nW(T9,x2,1)\n");
    assert_eq!(
        lines,
        vec![
            "Transaction T9 does not exist",
            "Transaction T9 does not exist",
        ]
    );
}

#[test]
fn test_invalid_and_repeated_fail() {
    let lines = run_script("fail(0)\nfail(11)\nfail(3)\nfail(3)\n");
    assert_eq!(
        lines,
        vec![
            "Invalid site ID: 0",
            "Invalid site ID: 11",
            "Site 3 is already failed",
        ]
    );
}

#[test]
fn test_write_to_failed_home_site_reports_failure() {
    // x5 is homed at site 6
    let lines = run_script("begin(T1)\nfail(6)\nW(T1,x5,55)\n");
    assert_eq!(lines, vec!["Write Failed"]);
}

#[test]
fn test_end_of_unknown_transaction_is_silent() {
    let lines = run_script("end(T5)\n");
    assert!(lines.is_empty());
}

#[test]
fn test_query_state_renders_json_report() {
    let lines = run_script("begin(T1)\nW(T1,x2,21)\nqueryState()\n");
    let report: serde_json::Value =
        serde_json::from_str(&lines.join("\n")).expect("report is valid JSON");

    assert_eq!(report["now"], 2);
    assert_eq!(report["transactions"][0]["id"], 1);
    assert_eq!(report["transactions"][0]["status"], "active");
    assert_eq!(report["transactions"][0]["writes"][0]["var"], 2);
    assert_eq!(report["transactions"][0]["writes"][0]["value"], 21);
    assert_eq!(report["sites"].as_array().map(Vec::len), Some(10));
    assert_eq!(report["sites"][0]["available"], true);
    assert_eq!(report["sites"][0]["buffered"][0]["tran"], 1);
    assert_eq!(report["sites"][0]["buffered"][0]["staged"], 1);
}
