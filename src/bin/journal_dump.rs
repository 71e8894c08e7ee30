//! journal-dump
//!
//! Prints the journals stored in a journal file, one line each, followed by
//! a summary of anything the reader had to drop.

use std::cell::RefCell;
use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use std::rc::Rc;

use blockjournal::journal::{Dropper, LogDropper, Reader};
use blockjournal::{JournalError, ReaderOptions};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// Dump the contents of a block journal file
#[derive(Parser, Debug)]
#[command(name = "journal-dump")]
#[command(about = "Inspect a block-framed journal file")]
#[command(version)]
struct Args {
    /// Journal file to read
    path: String,

    /// Stop at the first corrupted block
    #[arg(short, long)]
    strict: bool,

    /// Do not verify chunk checksums
    #[arg(long)]
    no_checksum: bool,

    /// Print each journal's payload (lossy UTF-8)
    #[arg(short, long)]
    payload: bool,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,blockjournal=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    match dump(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Failed to dump {}: {}", args.path, e);
            ExitCode::FAILURE
        }
    }
}

fn dump(args: &Args) -> blockjournal::Result<()> {
    let file = File::open(&args.path)?;
    let options = ReaderOptions::default()
        .strict(args.strict)
        .checksum(!args.no_checksum);

    let drops = Rc::new(RefCell::new(LogDropper::default()));
    let sink = Rc::clone(&drops);
    let dropper = move |size: usize, reason: &str| {
        println!("  drop: {} bytes ({})", size, reason);
        sink.borrow_mut().notify(size, reason);
    };

    let mut reader = Reader::with_dropper(BufReader::new(file), options, Box::new(dropper));
    let mut index = 0u64;
    let mut truncated = 0u64;

    while let Some(mut journal) = reader.next_journal()? {
        match journal.read_all() {
            Ok(payload) => {
                println!("journal {}: {} bytes", index, payload.len());
                if args.payload {
                    println!("  {}", String::from_utf8_lossy(&payload));
                }
            }
            Err(JournalError::UnexpectedEof) => {
                println!("journal {}: truncated", index);
                truncated += 1;
            }
            Err(e) => return Err(e),
        }
        index += 1;
    }

    let drops = drops.borrow();
    println!(
        "{} journals, {} truncated, {} drop events, {} bytes dropped",
        index, truncated, drops.events, drops.bytes
    );
    Ok(())
}
