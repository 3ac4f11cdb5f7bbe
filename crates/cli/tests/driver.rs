//! End-to-end tests of the binary: script files, stdin mode, exit codes.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn repkv() -> Command {
    Command::cargo_bin("repkv").expect("binary builds")
}

#[test]
fn test_script_file_runs_to_completion() {
    let mut script = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(script, "// write-write race, first committer wins").expect("write");
    writeln!(script, "begin(T1)").expect("write");
    writeln!(script, "begin(T2)").expect("write");
    writeln!(script, "W(T1,x1,101)").expect("write");
    writeln!(script, "W(T2,x1,102)").expect("write");
    writeln!(script, "end(T1)").expect("write");
    writeln!(script, "end(T2)").expect("write");
    writeln!(script, "dump()").expect("write");

    repkv()
        .arg(script.path())
        .assert()
        .success()
        .stdout(
            predicate::str::contains("T1 commits")
                .and(predicate::str::contains("T2 aborts"))
                .and(predicate::str::contains("x1: 101")),
        );
}

#[test]
fn test_missing_script_file_exits_with_one() {
    repkv()
        .arg("no-such-script.txt")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to open"));
}

#[test]
fn test_stdin_mode_stops_at_blank_line() {
    repkv()
        .write_stdin("begin(T1)\nR(T1,x2)\n\nR(T1,x4)\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("x2: 20").and(predicate::str::contains("x4: 40").not()),
        );
}

#[test]
fn test_unparseable_line_is_diagnosed_and_skipped() {
    repkv()
        .write_stdin("begin(T1)\nnonsense here\nR(T1,x2)\n")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Invalid input command: nonsense here")
                .and(predicate::str::contains("x2: 20")),
        );
}
