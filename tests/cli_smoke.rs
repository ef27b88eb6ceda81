use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn write_audio_stub(path: &std::path::Path) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, b"stub").unwrap();
}

#[test]
fn scan_reports_the_discovered_folder() {
    let dir = TempDir::new().unwrap();
    write_audio_stub(&dir.path().join("Some Book/track.mp3"));

    Command::cargo_bin("audiobook-librarian")
        .unwrap()
        .args(["scan", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("1 audiobook folder(s) found"));
}

#[test]
fn organize_with_missing_destination_exits_with_invalid_argument_message() {
    let dir = TempDir::new().unwrap();
    write_audio_stub(&dir.path().join("Some Book/track.mp3"));

    Command::cargo_bin("audiobook-librarian")
        .unwrap()
        .args(["organize", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("no destination specified"));
}

#[test]
fn organize_copies_into_the_destination_library() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source");
    write_audio_stub(&source.join("Author - Title/track.mp3"));
    let dest = dir.path().join("library");

    Command::cargo_bin("audiobook-librarian")
        .unwrap()
        .args(["organize", source.to_str().unwrap(), "--dest", dest.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("1/1 audiobook(s) organized"));

    assert!(dest.join("Author/Title/track.mp3").exists());
}

#[test]
fn verify_reports_zero_of_zero_on_an_empty_library() {
    let dir = TempDir::new().unwrap();

    Command::cargo_bin("audiobook-librarian")
        .unwrap()
        .args(["verify", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("0/0 file(s) verified"));
}
