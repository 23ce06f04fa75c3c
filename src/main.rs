//! Paynow Client CLI
//!
//! Offline helper around the client library: signs a cart into a request body,
//! or verifies a saved status reply.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- sign cart.csv "Invoice 35" buyer@example.com > request.txt
//! cargo run -- verify reply.txt
//! ```
//!
//! The cart CSV has a `title,amount` header.
//!
//! # Environment Variables
//!
//! - `PAYNOW_INTEGRATION_ID`, `PAYNOW_INTEGRATION_KEY`: required
//! - `PAYNOW_RETURN_URL`, `PAYNOW_RESULT_URL`: optional
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity

use csv::{ReaderBuilder, Trim};
use log::debug;
use paynow_client::{Config, Paynow, PaynowError, Result, TransactionKind, Transport};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::env;
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::process;
use std::str::FromStr;

/// One line item of the cart CSV.
#[derive(Debug, Deserialize)]
struct CartRecord {
    title: String,
    amount: String,
}

/// The CLI never talks to the network.
struct Offline;

impl Transport for Offline {
    fn post_form(&self, url: &str, _body: &str) -> Result<Vec<u8>> {
        Err(PaynowError::Transport(format!("offline, not posting to {}", url)))
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).ok_or(PaynowError::MissingArgument)?;

    match command.as_str() {
        "sign" => {
            let items_path = args.get(2).ok_or(PaynowError::MissingArgument)?;
            let reference = args.get(3).ok_or(PaynowError::MissingArgument)?;
            sign(items_path, reference, args.get(4).map(String::as_str))
        }
        "verify" => {
            let reply_path = args.get(2).ok_or(PaynowError::MissingArgument)?;
            verify(reply_path)
        }
        other => Err(PaynowError::UnknownCommand(other.to_string())),
    }
}

fn sign(items_path: &str, reference: &str, auth_email: Option<&str>) -> Result<()> {
    let paynow = Paynow::new(Config::from_env()?, Offline);
    let mut payment = paynow.create_payment(reference, auth_email);

    let file = File::open(items_path)?;
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(BufReader::new(file));

    for (row_idx, result) in reader.deserialize::<CartRecord>().enumerate() {
        let record = result?;
        let amount = Decimal::from_str(&record.amount).map_err(|e| PaynowError::InvalidArgument {
            field: "amount",
            message: format!("row {}: '{}' {}", row_idx + 2, record.amount, e),
        })?;
        payment.add(record.title, amount)?;
    }
    debug!("Read {} items from {}", payment.len(), items_path);

    let request = paynow.build_request(&payment, &TransactionKind::Web)?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", request.to_form_body())?;
    Ok(())
}

fn verify(reply_path: &str) -> Result<()> {
    let paynow = Paynow::new(Config::from_env()?, Offline);

    let mut body = Vec::new();
    File::open(reply_path)?.read_to_end(&mut body)?;
    debug!("Read {} byte reply from {}", body.len(), reply_path);

    let status = paynow.process_status_update(&body)?;
    let json = serde_json::to_string_pretty(&status)
        .map_err(|e| PaynowError::Io(io::Error::new(io::ErrorKind::Other, e)))?;

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", json)?;
    Ok(())
}
