//! # tspage
//!
//! Page storage for a time-series engine: a fixed-capacity, memory-mappable
//! byte region holding variable-length timestamped entries keyed by a
//! parameter id, with an in-page index for fast retrieval by key and time
//! range.
//!
//! ## Features
//!
//! - **Compact layout**: 32-bit offset index growing up, records packed down
//! - **Bounding box**: O(1) rejection of queries that miss the page
//! - **Sorted search**: typestate-enforced sort, binary search by (key, time)
//! - **Streaming**: resumable cursors fill a fixed caller-owned buffer
//!
//! ## Modules
//!
//! - [`page`]: Page layout, sort/search engine and cursors
//! - [`config`]: Configuration for the `tspage` binary
//!
//! ## Quick Start
//!
//! ```rust
//! use tspage::page::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Any byte buffer works: Vec<u8>, &mut [u8], a mapped file...
//!     let mut page = Page::new(PageKind::Index, vec![0u8; 4096], 1)?;
//!
//!     page.add_entry(&Entry::new(7, Timestamp::from_micros(100), b"21.5".to_vec())?)?;
//!     page.add_entry(&Entry::new(7, Timestamp::from_micros(200), b"21.7".to_vec())?)?;
//!
//!     // Searching requires a sorted page
//!     let page = page.sort();
//!     let offset = page.search(7, Timestamp::from_micros(150)).expect("entry at 200");
//!     assert_eq!(page.read_entry_at(offset).unwrap().payload(), b"21.7");
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod page;

// Re-export top-level types for convenience
pub use page::{
    BoundingBox, CursorQuery, CursorState, Entry, EntryOffset, EntryRef, EntryView, Page,
    PageCursor, PageError, PageKind, PageResult, PageStats, ParamId, SortedPage, Timestamp,
};

pub use config::{Config, ConfigError, LoggingConfig, PageConfig};
