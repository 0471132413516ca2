// tests/cli_tests.rs
use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const JBOSS_PATTERN: &str = "%d{HH:mm:ss,SSS} %-5p [%c] (%t) %s%E%n";

const SERVER_LOG: &str = "\
10:15:30,001 INFO  [org.jboss.as] (main) WFLYSRV0049: WildFly starting
10:15:30,500 DEBUG [org.jboss.as.config] (MSC service thread 1-2) Configured system properties
10:15:31,400 ERROR [org.acme.Deployer] (main) Deploy failed: java.lang.IllegalStateException: boom
\tat org.acme.Deployer.run(Deployer.java:42)
10:15:32,000 WARN  [org.acme.Cache] (worker-1) cache nearly full
";

fn patlog() -> Command {
    let mut cmd = Command::cargo_bin("patlog").unwrap();
    cmd.env_remove("PATLOG_PATTERN").env_remove("RUST_LOG");
    cmd
}

fn log_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_raw_pass_through_from_stdin() {
    patlog()
        .arg("-p")
        .arg(JBOSS_PATTERN)
        .write_stdin(SERVER_LOG)
        .assert()
        .success()
        .stdout(SERVER_LOG);
}

#[test]
fn test_pattern_from_environment() {
    patlog()
        .env("PATLOG_PATTERN", JBOSS_PATTERN)
        .args(["-F", "jsonl", "--level", "warn"])
        .write_stdin(SERVER_LOG)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"level\":\"ERROR\""))
        .stdout(predicate::str::contains("\"level\":\"WARN\""))
        .stdout(predicate::str::contains("DEBUG").not());
}

#[test]
fn test_heuristic_mode_reads_files() {
    let file = log_file(SERVER_LOG);
    patlog()
        .args(["-F", "logfmt", "--no-color", "--include-levels", "error"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("level=ERROR logger=org.acme.Deployer thread=main"))
        .stdout(predicate::str::contains("\\n\\tat org.acme.Deployer.run"))
        .stdout(predicate::str::contains("\x1b[").not());
}

#[test]
fn test_exclude_logger_and_grep() {
    patlog()
        .args(["-p", JBOSS_PATTERN, "--exclude-logger", "org.jboss"])
        .args(["--grep", "full"])
        .write_stdin(SERVER_LOG)
        .assert()
        .success()
        .stdout("10:15:32,000 WARN  [org.acme.Cache] (worker-1) cache nearly full\n");
}

#[test]
fn test_count_summary() {
    patlog()
        .args(["-p", JBOSS_PATTERN, "--count"])
        .write_stdin(SERVER_LOG)
        .assert()
        .success()
        .stdout("DEBUG 1\nINFO 1\nWARN 1\nERROR 1\ntotal 4\n");
}

#[test]
fn test_csv_output_to_file() {
    let output = NamedTempFile::new().unwrap();
    patlog()
        .args(["-p", JBOSS_PATTERN, "-F", "csv", "-o"])
        .arg(output.path())
        .write_stdin(SERVER_LOG)
        .assert()
        .success()
        .stdout("");

    let written = std::fs::read_to_string(output.path()).unwrap();
    assert!(written.starts_with("timestamp,level,logger,thread,message,exception,line\n"));
    assert_eq!(written.matches("1970-01-01T").count(), 4);
}

#[test]
fn test_layout_output() {
    patlog()
        .args(["-p", JBOSS_PATTERN, "-F", "layout", "--output-pattern", "%-5p %c{1}: %m"])
        .args(["--level", "ERROR"])
        .write_stdin(SERVER_LOG)
        .assert()
        .success()
        .stdout("ERROR Deployer: Deploy failed\n");
}

#[test]
fn test_exit_code_no_output() {
    patlog()
        .args(["-p", JBOSS_PATTERN, "--grep", "nothing matches this"])
        .write_stdin(SERVER_LOG)
        .assert()
        .code(2)
        .stdout("");
}

#[test]
fn test_invalid_pattern_is_reported() {
    patlog()
        .args(["-p", "%d{HH:mm:ss %m"])
        .write_stdin(SERVER_LOG)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid conversion pattern"));
}

#[test]
fn test_fatal_error_skips_rest_of_file() {
    let broken = log_file("10:15:30,001 INFO  [a] (main) one\n10:15:30,002 INFO  no brackets\n10:15:30,003 INFO  [a] (main) three\n");
    let good = log_file("10:16:00,000 WARN  [b] (main) next file\n");
    patlog()
        .args(["-p", JBOSS_PATTERN])
        .arg(broken.path())
        .arg(good.path())
        .assert()
        .code(1)
        .stdout("10:15:30,001 INFO  [a] (main) one\n10:16:00,000 WARN  [b] (main) next file\n")
        .stderr(predicate::str::contains("line 2, offset 13"));
}

#[test]
fn test_fail_fast_stops_the_run() {
    let broken = log_file("10:15:30,002 INFO  no brackets\n");
    let good = log_file("10:16:00,000 WARN  [b] (main) next file\n");
    patlog()
        .args(["-p", JBOSS_PATTERN, "--fail-fast"])
        .arg(broken.path())
        .arg(good.path())
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("line 1, offset 13"));
}

#[test]
fn test_missing_input_file() {
    patlog()
        .args(["-p", JBOSS_PATTERN, "/nonexistent/server.log"])
        .assert()
        .code(1);
}
