//! Print the directory tree of a compound file, or dump one of its streams.
//!
//! # Usage
//!
//! List every entry:
//! ```sh
//! cargo run --example cfb_tree -- document.doc
//! ```
//!
//! Dump a stream to stdout:
//! ```sh
//! cargo run --example cfb_tree -- document.doc --stream "ObjectPool/_1234/Ole"
//! ```

use cfbtree::{CfbOptions, Document};
use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

/// Inspect Compound File Binary containers
#[derive(Parser, Debug)]
#[command(
    name = "cfb_tree",
    about = "Print the directory tree of a compound file",
    version
)]
struct Args {
    /// Container to open
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Slash-separated path of a stream to write to stdout instead
    #[arg(short, long, value_name = "PATH")]
    stream: Option<String>,

    /// Order children by name instead of on-disk order
    #[arg(long)]
    sorted: bool,

    /// Accept records with unknown types or sized storages
    #[arg(long)]
    lenient: bool,
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::open(&args.input)?;
    let options = CfbOptions::new()
        .with_eager_directory(true)
        .with_entry_validation(!args.lenient);
    let doc = Document::open_with_options(io::BufReader::new(file), options)?;

    if let Some(path) = &args.stream {
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let mut stream = doc.open_stream(&components)?;
        let mut stdout = io::stdout().lock();
        io::copy(&mut stream, &mut stdout)?;
        stdout.flush()?;
        return Ok(());
    }

    let header = doc.header();
    println!(
        "version {}.{:#x}, {} sectors of {} bytes",
        header.major_version,
        header.minor_version,
        doc.sector_count(),
        header.sector_size()?
    );

    let mut pending = vec![doc.root()?];
    while let Some(entry) = pending.pop() {
        let indent = "  ".repeat(entry.level() as usize);
        if entry.is_stream() {
            println!("{}{} [{} bytes]", indent, entry.name(), entry.size());
        } else {
            println!("{}{}/", indent, entry.name());
        }

        let children = if args.sorted {
            entry.sorted_children()
        } else {
            entry.children()
        };
        pending.extend(children.into_iter().rev());
    }
    Ok(())
}
