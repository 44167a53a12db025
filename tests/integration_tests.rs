use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/files")
        .join(name)
}

/// Fresh scratch directory for one test's output files.
fn scratch(test: &str) -> PathBuf {
    let dir = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(test);
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn runs_without_arguments() {
    let mut cmd = Command::cargo_bin("yul").unwrap();
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("yul v"));
}

#[test]
fn checks_clean_source() {
    let mut cmd = Command::cargo_bin("yul").unwrap();
    cmd.arg("check").arg(fixture("hello.agc"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("no errors found!"));
}

#[test]
fn assembles_binary_and_listing() {
    let dir = scratch("assembles_binary_and_listing");
    let dest = dir.join("hello.bin");
    let listing = dir.join("hello.lst");

    let mut cmd = Command::cargo_bin("yul").unwrap();
    cmd.current_dir(&dir)
        .arg("assemble")
        .arg(fixture("hello.agc"))
        .arg("--dest")
        .arg(&dest)
        .arg("--listing")
        .arg(&listing);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("emit binary"));

    // 044 banks of 02000 words, two bytes each.
    let image = fs::read(&dest).unwrap();
    assert_eq!(image.len(), 0o44 * 0o2000 * 2);
    // Bank 2 is written first; START is TC LOOP at 04000, LOOP at 04003.
    assert_eq!(u16::from_be_bytes([image[0], image[1]]) >> 1, 0o4003);

    let listing = fs::read_to_string(&listing).unwrap();
    assert!(listing.contains("000003,000003:    4000"));
    assert!(listing.contains("# jump ahead"));
}

#[test]
fn writes_symbol_tables() {
    let dir = scratch("writes_symbol_tables");
    let mut cmd = Command::cargo_bin("yul").unwrap();
    cmd.current_dir(&dir)
        .arg("assemble")
        .arg(fixture("hello.agc"))
        .arg("--symbols");
    cmd.assert().success();

    let symtab = fs::read_to_string(dir.join("hello.symtab")).unwrap();
    assert!(symtab.contains("START"));
    assert!(symtab.contains("DATA"));
    assert!(dir.join("hello.lines").exists());
    assert!(dir.join("hello.bin").exists());
}

#[test]
fn writes_html_pages() {
    let dir = scratch("writes_html_pages");
    let src = dir.join("hello.agc");
    fs::copy(fixture("hello.agc"), &src).unwrap();

    let mut cmd = Command::cargo_bin("yul").unwrap();
    cmd.current_dir(&dir).arg("assemble").arg(&src).arg("--html");
    cmd.assert().success();

    let page = fs::read_to_string(dir.join("hello.html")).unwrap();
    assert!(page.contains("<a name=\"START\"></a>"));
    assert!(page.contains("href=\"#LOOP\""));
}

#[test]
fn follows_includes() {
    let mut cmd = Command::cargo_bin("yul").unwrap();
    cmd.arg("check").arg(fixture("with_include.agc"));
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("no errors found!"));
}

#[test]
fn undefined_symbols_fail() {
    let dir = scratch("undefined_symbols_fail");
    let mut cmd = Command::cargo_bin("yul").unwrap();
    cmd.current_dir(&dir)
        .arg("assemble")
        .arg(fixture("undefined.agc"));
    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("binary not written"))
        .stderr(predicate::str::contains("Symbol \"NOWHERE\" undefined."));
    assert!(!dir.join("undefined.bin").exists());
}

#[test]
fn missing_source_fails() {
    let mut cmd = Command::cargo_bin("yul").unwrap();
    cmd.arg("check").arg(fixture("nope.agc"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("File does not exist"));
}
