//! tspage CLI
//!
//! Command-line interface for working with page files:
//! - Create and clear pages
//! - Append entries
//! - Sort, point-search and range-query
//! - Inspect page counters

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tspage::config::{generate_default_config, Config, LoggingConfig};
use tspage::page::*;

#[derive(Parser)]
#[command(name = "tspage")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and query time-series page files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new empty page file
    Init {
        /// Page file
        file: PathBuf,
        /// Page size in bytes (default: from config)
        #[arg(short, long)]
        size: Option<u64>,
        /// Page id within the storage volume
        #[arg(long, default_value = "0")]
        page_id: u32,
        /// Page kind
        #[arg(long, value_enum, default_value = "index")]
        kind: KindArg,
    },

    /// Append an entry
    Append {
        /// Page file
        file: PathBuf,
        /// Parameter id
        key: u32,
        /// Payload (stored as UTF-8 bytes)
        value: String,
        /// Timestamp (default: now). Supports: "now", RFC 3339, microseconds since epoch
        #[arg(short, long)]
        time: Option<String>,
    },

    /// Sort the page index by (key, timestamp)
    Sort {
        /// Page file
        file: PathBuf,
    },

    /// Find the first entry of a parameter at or after a timestamp
    ///
    /// Sorts a private copy of the page; the file keeps its index order.
    Get {
        /// Page file
        file: PathBuf,
        /// Parameter id
        key: u32,
        /// Lower bound (default: -inf)
        #[arg(short, long)]
        from: Option<String>,
    },

    /// Range query for one parameter, streamed through a cursor
    ///
    /// Sorts a private copy of the page; the file keeps its index order.
    Query {
        /// Page file
        file: PathBuf,
        /// Parameter id
        key: u32,
        /// Lower bound, inclusive (default: -inf)
        #[arg(short, long)]
        from: Option<String>,
        /// Upper bound, inclusive (default: +inf)
        #[arg(short, long)]
        to: Option<String>,
        /// Results per cursor call (default: from config)
        #[arg(short, long)]
        batch: Option<usize>,
    },

    /// Show page counters
    Inspect {
        /// Page file
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
        /// Also list every entry in index order
        #[arg(long)]
        entries: bool,
    },

    /// Drop all entries (bumps the overwrite generation)
    Clear {
        /// Page file
        file: PathBuf,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Metadata,
    Index,
}

impl From<KindArg> for PageKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Metadata => PageKind::Metadata,
            KindArg::Index => PageKind::Index,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    init_logging(&config.logging);

    match cli.command {
        Commands::Init {
            file,
            size,
            page_id,
            kind,
        } => {
            let path = config.page.resolve(&file);
            let size = size.unwrap_or(config.page.page_size);
            let map = create_page_file(&path, size)?;
            let page = Page::new(kind.into(), map, page_id)?;
            flush(page.into_inner())?;
            println!("Created {} ({} bytes, page id {})", path.display(), size, page_id);
        }

        Commands::Append {
            file,
            key,
            value,
            time,
        } => {
            let mut page = Page::open(open_page_file(&config.page.resolve(&file))?)?;
            let timestamp = match time {
                Some(t) => parse_timestamp(&t)?,
                None => Timestamp::utc_now(),
            };
            let index = page.add_entry_ref(&EntryRef::new(key, timestamp, value.as_bytes()))?;
            println!(
                "Appended entry #{} (key {}, {}), {} bytes free",
                index,
                key,
                timestamp,
                page.get_free_space()
            );
            flush(page.into_inner())?;
        }

        Commands::Sort { file } => {
            let page = Page::open(open_page_file(&config.page.resolve(&file))?)?.sort();
            println!("Sorted {} entries", page.get_entries_count());
            flush(page.into_inner())?;
        }

        Commands::Get { file, key, from } => {
            let page = Page::open(open_page_copy(&config.page.resolve(&file))?)?.sort();
            let lowerbound = match from {
                Some(t) => parse_timestamp(&t)?,
                None => Timestamp::MIN,
            };

            match page.search(key, lowerbound).and_then(|off| page.read_entry_at(off)) {
                Some(entry) => print_entry(None, &entry),
                None => println!("No entry for key {} at or after {}", key, lowerbound),
            }
        }

        Commands::Query {
            file,
            key,
            from,
            to,
            batch,
        } => {
            let page = Page::open(open_page_copy(&config.page.resolve(&file))?)?.sort();
            let lowerbound = match from {
                Some(t) => parse_timestamp(&t)?,
                None => Timestamp::MIN,
            };
            let upperbound = match to {
                Some(t) => parse_timestamp(&t)?,
                None => Timestamp::MAX,
            };
            let batch = batch.unwrap_or(config.page.results_capacity);
            if batch == 0 {
                bail!("batch size must be at least 1");
            }

            let mut results = vec![0u32; batch];
            let mut cursor =
                PageCursor::single_parameter(key, lowerbound, upperbound, &mut results)?;
            let mut total = 0usize;
            let mut calls = 0usize;

            while !cursor.is_done() {
                page.search_cursor(&mut cursor);
                calls += 1;
                for &index in cursor.results() {
                    if let Some(entry) = page.read_entry(index) {
                        print_entry(Some(index), &entry);
                    }
                }
                total += cursor.len();
                cursor.reset_results();
            }

            tracing::debug!(calls, total, "Range query finished");
            println!("{} entries", total);
        }

        Commands::Inspect {
            file,
            format,
            entries,
        } => {
            let page = Page::open(open_page_file(&config.page.resolve(&file))?)?;
            match format {
                OutputFormat::Table => {
                    println!("{}", page.stats());
                    if entries {
                        for index in 0..page.get_entries_count() {
                            if let Some(entry) = page.read_entry(index) {
                                print_entry(Some(index), &entry);
                            }
                        }
                    }
                }
                OutputFormat::Json => {
                    let mut value = serde_json::to_value(page.stats())?;
                    if entries {
                        let list: Vec<_> = (0..page.get_entries_count())
                            .filter_map(|i| page.read_entry(i))
                            .map(|e| {
                                serde_json::json!({
                                    "key": e.key(),
                                    "timestamp": e.timestamp(),
                                    "length": e.length(),
                                    "payload": String::from_utf8_lossy(e.payload()),
                                })
                            })
                            .collect();
                        value["entries"] = serde_json::Value::Array(list);
                    }
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
            }
        }

        Commands::Clear { file } => {
            let mut page = Page::open(open_page_file(&config.page.resolve(&file))?)?;
            page.clear();
            println!(
                "Cleared page {} (generation {})",
                page.page_id(),
                page.overwrite_generation()
            );
            flush(page.into_inner())?;
        }

        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(&path, content)?;
                    println!("Config written to {}", path.display());
                }
                None => print!("{}", content),
            }
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tspage={}", logging.level)),
    );
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so command output stays pipeable
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn create_page_file(path: &Path, size: u64) -> anyhow::Result<MmapMut> {
    if size > MAX_PAGE_SIZE {
        bail!("page size {} exceeds the {} byte maximum", size, MAX_PAGE_SIZE);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create_new(true)
        .open(path)
        .with_context(|| format!("creating {}", path.display()))?;
    file.set_len(size)?;

    // Safety: the file was just created by us and is not shared
    let map = unsafe { MmapMut::map_mut(&file)? };
    Ok(map)
}

fn open_page_file(path: &Path) -> anyhow::Result<MmapMut> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    // Safety: page files are not modified by other processes while mapped
    let map = unsafe { MmapMut::map_mut(&file)? };
    Ok(map)
}

/// Copy-on-write mapping: sorting it never reaches the file
fn open_page_copy(path: &Path) -> anyhow::Result<MmapMut> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("opening {}", path.display()))?;

    // Safety: page files are not modified by other processes while mapped
    let map = unsafe { MmapOptions::new().map_copy(&file)? };
    Ok(map)
}

fn flush(map: MmapMut) -> anyhow::Result<()> {
    map.flush().context("flushing page file")
}

fn parse_timestamp(s: &str) -> anyhow::Result<Timestamp> {
    match s {
        "now" => Ok(Timestamp::utc_now()),
        "-inf" | "min" => Ok(Timestamp::MIN),
        "+inf" | "inf" | "max" => Ok(Timestamp::MAX),
        _ => {
            if let Ok(micros) = s.parse::<i64>() {
                return Ok(Timestamp::from_micros(micros));
            }
            let dt = chrono::DateTime::parse_from_rfc3339(s)
                .with_context(|| format!("invalid timestamp: {}", s))?;
            Ok(Timestamp::from(dt.with_timezone(&chrono::Utc)))
        }
    }
}

fn print_entry(index: Option<u32>, entry: &EntryView<'_>) {
    let prefix = index.map(|i| format!("#{:<6} ", i)).unwrap_or_default();
    println!(
        "{}key={:<8} time={:<32} len={:<6} {}",
        prefix,
        entry.key(),
        entry.timestamp().to_string(),
        entry.length(),
        String::from_utf8_lossy(entry.payload())
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_commands_leave_file_order_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.page");

        let map = create_page_file(&path, 4096).unwrap();
        let mut page = Page::new(PageKind::Index, map, 1).unwrap();
        for (key, micros) in [(3, 30), (1, 10), (2, 20)] {
            page.add_entry_ref(&EntryRef::new(key, Timestamp::from_micros(micros), b"v"))
                .unwrap();
        }
        let before: Vec<_> = page.offsets().collect();
        flush(page.into_inner()).unwrap();

        let sorted = Page::open(open_page_copy(&path).unwrap()).unwrap().sort();
        assert_eq!(sorted.read_entry(0).unwrap().key(), 1);
        assert!(sorted.search(2, Timestamp::MIN).is_some());
        drop(sorted);

        let reopened = Page::open(open_page_file(&path).unwrap()).unwrap();
        let after: Vec<_> = reopened.offsets().collect();
        assert_eq!(before, after);
        assert_eq!(reopened.read_entry(0).unwrap().key(), 3);
    }
}
