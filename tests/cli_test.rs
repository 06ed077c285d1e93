//! Integration tests for argument validation through the full dispatcher

use clap::Parser;
use nessus_result::cli::Cli;
use nessus_result::config::CredentialSource;
use nessus_result::{ui, NessusError, Result};

/// Fails the test if the dispatcher ever gets as far as prompting.
struct NoPrompt;

impl CredentialSource for NoPrompt {
    fn username(&mut self) -> Result<String> {
        panic!("usage errors must not prompt for a username")
    }

    fn password(&mut self) -> Result<String> {
        panic!("usage errors must not prompt for a password")
    }
}

fn run(args: &[&str]) -> (anyhow::Result<()>, String) {
    let mut argv = vec!["nessus-result"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).expect("arguments parse");
    let mut out = Vec::new();
    let res = ui::run(cli, &mut NoPrompt, &mut out);
    (res, String::from_utf8(out).unwrap())
}

#[test]
fn test_missing_server_prints_usage() {
    let (res, out) = run(&["-l"]);
    let err = res.unwrap_err();
    assert!(matches!(err.downcast_ref::<NessusError>(), Some(NessusError::Usage(_))));
    assert_eq!(err.to_string(), "No server specified (-s)");
    assert!(out.contains("Usage:"));
    // the message is left to the caller so it is reported only once
    assert!(!out.contains("No server specified"));
}

#[test]
fn test_missing_action_prints_usage() {
    let (res, out) = run(&["-s", "scanner.local"]);
    assert!(res.unwrap_err().to_string().starts_with("No action specified"));
    assert!(out.contains("Usage:"));
}

#[test]
fn test_import_flag_requires_files() {
    let (res, out) = run(&["-s", "scanner.local", "-i", "-u", "admin", "-p", "x"]);
    assert!(res
        .unwrap_err()
        .to_string()
        .contains("at least one result file (-r)"));
    assert!(out.contains("Usage:"));
}

#[test]
fn test_unknown_flag_is_rejected_by_parser() {
    let err = Cli::try_parse_from(["nessus-result", "--bogus"]).unwrap_err();
    assert!(err.use_stderr());
}

#[test]
fn test_version_flag_is_not_an_error() {
    let err = Cli::try_parse_from(["nessus-result", "--version"]).unwrap_err();
    assert!(!err.use_stderr());
}
