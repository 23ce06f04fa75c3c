//! Integration tests for the paynow-client CLI.
//!
//! These tests run the actual binary against temporary cart and reply files.

use assert_cmd::Command;
use paynow_client::signer::sign;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const KEY: &str = "3e9fed89-60e1-4ce5-ab6e-6b1eb2d4f977";

/// Binary with integration credentials in its environment.
fn cli() -> Command {
    let mut cmd = Command::cargo_bin("paynow-client").unwrap();
    cmd.env("PAYNOW_INTEGRATION_ID", "1201")
        .env("PAYNOW_INTEGRATION_KEY", KEY)
        .env("PAYNOW_RESULT_URL", "https://shop.example/result")
        .env_remove("PAYNOW_RETURN_URL");
    cmd
}

/// Write `contents` to a temporary file that lives as long as the handle.
fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_sign_prints_form_body() {
    let cart = temp_file("title,amount\nBananas,2.50\nApples,3.5\n");

    cli()
        .arg("sign")
        .arg(cart.path())
        .arg("Invoice 35")
        .arg("buyer@example.com")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "resulturl=https%3A%2F%2Fshop.example%2Fresult&returnurl=&reference=Invoice+35&amount=6.00&id=1201&",
        ))
        .stdout(predicate::str::contains("&authemail=buyer%40example.com&status=Message&hash="));
}

#[test]
fn test_sign_rejects_small_total() {
    let cart = temp_file("title,amount\nGum,0.50\n");

    cli()
        .arg("sign")
        .arg(cart.path())
        .arg("Invoice 36")
        .assert()
        .failure()
        .stderr(predicate::str::contains("below the minimum of 1.00"));
}

#[test]
fn test_sign_rejects_bad_amount() {
    let cart = temp_file("title,amount\nGum,lots\n");

    cli()
        .arg("sign")
        .arg(cart.path())
        .arg("Invoice 37")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid amount"));
}

#[test]
fn test_verify_prints_status() {
    let fields = [
        ("reference", "Invoice 35"),
        ("paynowreference", "9510"),
        ("amount", "6.00"),
        ("status", "Paid"),
    ];
    let hash = sign(fields, KEY);
    let reply = temp_file(&format!(
        "reference=Invoice+35&paynowreference=9510&amount=6.00&status=Paid&hash={}\n",
        hash
    ));

    cli()
        .arg("verify")
        .arg(reply.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"paid\": true"))
        .stdout(predicate::str::contains("\"amount\": \"6.00\""));
}

#[test]
fn test_verify_detects_tampering() {
    let fields = [("status", "Paid"), ("amount", "6.00")];
    let hash = sign(fields, KEY);
    let reply = temp_file(&format!("status=Paid&amount=600.00&hash={}", hash));

    cli()
        .arg("verify")
        .arg(reply.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Hashes do not match"));
}

#[test]
fn test_missing_credentials() {
    let cart = temp_file("title,amount\nBread,2.00\n");

    Command::cargo_bin("paynow-client")
        .unwrap()
        .env_remove("PAYNOW_INTEGRATION_ID")
        .env_remove("PAYNOW_INTEGRATION_KEY")
        .arg("sign")
        .arg(cart.path())
        .arg("Invoice 38")
        .assert()
        .failure()
        .stderr(predicate::str::contains("PAYNOW_INTEGRATION_ID"));
}

#[test]
fn test_missing_argument() {
    cli()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_unknown_command() {
    cli()
        .arg("refund")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown command 'refund'"));
}
