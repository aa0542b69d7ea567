//! TocStore CLI
//!
//! Command-line interface for inspecting and maintaining a block store file.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tocstore::{Config, Engine, SyncStrategy};
use tracing_subscriber::{fmt, EnvFilter};

/// TocStore CLI
#[derive(Parser, Debug)]
#[command(name = "tocstore-cli")]
#[command(about = "CLI for TocStore block store files")]
#[command(version)]
struct Args {
    /// Store file
    #[arg(short, long, default_value = "./tocstore.db")]
    file: PathBuf,

    /// Slots added when a write finds the TOC full
    #[arg(long, default_value = "16")]
    growth_slots: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a block to stdout
    Get {
        /// The key to read
        key: i32,
    },

    /// Store a block
    Put {
        /// The key to write
        key: i32,

        /// The value to store (ignored when --input is given)
        value: Option<String>,

        /// Read the value from a file instead
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Delete a block
    Del {
        /// The key to delete
        key: i32,
    },

    /// Defragment the store
    Repack {
        /// Free TOC slots to leave after repacking
        #[arg(short, long, default_value = "0")]
        reserve: u32,
    },

    /// Show space accounting
    Stat,

    /// List blocks in offset order with their CRC32
    List,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tocstore=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::builder()
        .path(&args.file)
        .toc_growth_slots(args.growth_slots)
        .sync_strategy(SyncStrategy::EveryWrite)
        .build();

    let engine = Engine::open_path(config)?;

    match args.command {
        Commands::Get { key } => match engine.read(key)? {
            Some(data) => io::stdout().write_all(&data)?,
            None => {
                engine.close()?;
                return Err(format!("key {} not found", key).into());
            }
        },
        Commands::Put { key, value, input } => {
            let data = match (input, value) {
                (Some(path), _) => fs::read(path)?,
                (None, Some(value)) => value.into_bytes(),
                (None, None) => {
                    engine.close()?;
                    return Err("put needs a VALUE or --input FILE".into());
                }
            };
            engine.write(key, &data)?;
            println!("stored {} bytes under key {}", data.len(), key);
        }
        Commands::Del { key } => {
            engine.delete(key)?;
            println!("deleted key {}", key);
        }
        Commands::Repack { reserve } => {
            let before = engine.stats()?;
            engine.repack(reserve)?;
            let after = engine.stats()?;
            println!(
                "repacked: {} -> {} bytes ({} reclaimed)",
                before.store_len,
                after.store_len,
                before.store_len.saturating_sub(after.store_len)
            );
        }
        Commands::Stat => {
            let stats = engine.stats()?;
            println!("store length:  {}", stats.store_len);
            println!("data offset:   {}", stats.data_offset);
            println!("toc slots:     {} ({} used)", stats.toc_capacity, stats.entries_used);
            println!("live bytes:    {}", stats.live_bytes);
            println!("wasted bytes:  {}", stats.wasted_bytes);
        }
        Commands::List => {
            println!("{:>10} {:>6} {:>12} {:>10} {:>10}", "key", "slot", "offset", "size", "crc32");
            for entry in engine.entries()? {
                let data = engine.read(entry.key)?.unwrap_or_default();
                println!(
                    "{:>10} {:>6} {:>12} {:>10} {:>10x}",
                    entry.key,
                    entry.slot_index,
                    entry.offset,
                    entry.size,
                    crc32fast::hash(&data)
                );
            }
        }
    }

    engine.close()?;
    Ok(())
}
