//! Time-series page storage
//!
//! This module provides the page core of the storage layer:
//!
//! - **timestamp**: Microsecond timestamps with -inf/+inf sentinels
//! - **entry**: Record format, owned and by-reference entries, borrowed views
//! - **bbox**: Key × time bounding box for fast query rejection
//! - **header**: Fixed page header codec
//! - **layout**: Append, free-space accounting, read/copy by index, clear
//! - **search**: Sort typestate, point search, cursor-driven range search
//! - **cursor**: Resumable range-scan state
//! - **error**: Error types
//!
//! # Architecture
//!
//! ```text
//! Write Path:
//!   Entry → fit check → record packed below entry_low_water → offset appended to index
//!
//! Read Path:
//!   Page::sort → SortedPage → bbox reject → binary search → linear scan into cursor buffer
//! ```
//!
//! # Example
//!
//! ```rust
//! use tspage::page::{Entry, Page, PageCursor, PageKind, Timestamp};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut page = Page::new(PageKind::Index, vec![0u8; 4096], 0)?;
//!
//!     for micros in [300, 100, 200] {
//!         page.add_entry(&Entry::new(7, Timestamp::from_micros(micros), vec![0u8; 16])?)?;
//!     }
//!
//!     let page = page.sort();
//!
//!     let mut results = [0u32; 2];
//!     let mut cursor = PageCursor::single_parameter(
//!         7,
//!         Timestamp::from_micros(0),
//!         Timestamp::MAX,
//!         &mut results,
//!     )?;
//!
//!     let mut seen = 0;
//!     while !cursor.is_done() {
//!         page.search_cursor(&mut cursor);
//!         for &index in cursor.results() {
//!             let entry = page.read_entry(index).expect("index from cursor");
//!             println!("{} @ {}", entry.key(), entry.timestamp());
//!             seen += 1;
//!         }
//!         cursor.reset_results();
//!     }
//!     assert_eq!(seen, 3);
//!
//!     Ok(())
//! }
//! ```

pub mod bbox;
pub mod cursor;
pub mod entry;
pub mod error;
pub mod header;
pub mod layout;
pub mod search;
pub mod timestamp;

// Re-export commonly used types
pub use bbox::BoundingBox;
pub use cursor::{CursorQuery, CursorState, PageCursor};
pub use entry::{Entry, EntryRef, EntryView, ParamId, ENTRY_HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use error::{PageError, PageResult};
pub use header::{PageHeader, PageKind, HEADER_SIZE, INDEX_SLOT_SIZE, MAX_PAGE_OFFSET, MAX_PAGE_SIZE};
pub use layout::{EntryOffset, Page, PageStats};
pub use search::SortedPage;
pub use timestamp::Timestamp;
