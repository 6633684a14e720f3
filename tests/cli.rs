use assert_cmd::prelude::*;
use assert_fs::fixture::NamedTempFile;
use assert_fs::prelude::*;
use predicates::prelude::*;

use std::process::Command;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn cmd() -> Command {
    Command::cargo_bin("refval").unwrap()
}

/// No network calls are exercised here: entries with neither an identifier
/// nor a title never get an adapter dispatched (orchestrator.rs), so these
/// tests never touch a live registry.
const NO_LOOKUP_ENTRY: &str = "@misc{k, note = {a note with no identifiers or title}}\n";

#[test]
fn runs_help() -> Result<()> {
    cmd().arg("--help").assert().success();
    Ok(())
}

#[test]
fn validates_and_rewrites_bibliography_in_place() -> Result<()> {
    let input = NamedTempFile::new("refs.bib")?;
    input.write_str(NO_LOOKUP_ENTRY)?;

    cmd()
        .arg(input.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 entries:"));

    let contents = std::fs::read_to_string(input.path())?;
    assert!(contents.contains("@misc{k"));
    Ok(())
}

#[test]
fn writes_to_explicit_output_path_without_touching_input() -> Result<()> {
    let input = NamedTempFile::new("refs.bib")?;
    input.write_str(NO_LOOKUP_ENTRY)?;
    let output = NamedTempFile::new("out.bib")?;

    cmd()
        .arg(input.path())
        .arg("--output")
        .arg(output.path())
        .assert()
        .success();

    let original_contents = std::fs::read_to_string(input.path())?;
    assert_eq!(original_contents, NO_LOOKUP_ENTRY);

    let written_contents = std::fs::read_to_string(output.path())?;
    assert!(written_contents.contains("@misc{k"));
    Ok(())
}

#[test]
fn missing_input_file_fails_with_a_clear_message() -> Result<()> {
    cmd()
        .arg("/nonexistent/path/does-not-exist.bib")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load bibliography"));
    Ok(())
}

#[test]
fn malformed_bibtex_fails() -> Result<()> {
    let input = NamedTempFile::new("refs.bib")?;
    input.write_str("@misc{k, this is not valid bibtex")?;

    cmd().arg(input.path()).assert().failure();
    Ok(())
}

#[test]
fn duplicate_citekeys_fail() -> Result<()> {
    let input = NamedTempFile::new("refs.bib")?;
    input.write_str("@misc{k, note = {a}}\n@misc{k, note = {b}}\n")?;

    cmd()
        .arg(input.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already present in the record store"));
    Ok(())
}
