//! Sort and search
//!
//! Binary search needs the index ordered by `(key, timestamp)`. Rather than
//! trusting callers to sort first, ordering is a typestate: [`Page::sort`]
//! consumes the writable page and returns a [`SortedPage`], and only
//! `SortedPage` offers the search operations. Going back to appending goes
//! through [`SortedPage::into_unsorted`].
//!
//! # Performance
//! - sort: O(n log n), stable
//! - point search: O(log n)
//! - cursor search: O(log n + k) over all calls, where k = matches

use crate::page::cursor::{CursorQuery, CursorState, PageCursor};
use crate::page::entry::ParamId;
use crate::page::layout::{EntryOffset, Page};
use crate::page::timestamp::Timestamp;
use std::ops::Deref;

impl<B: AsRef<[u8]> + AsMut<[u8]>> Page<B> {
    /// Sort page content by `(key, timestamp)`
    ///
    /// The sort is stable, so entries with equal key and timestamp keep
    /// their insertion order. Only the index is reordered; records stay put.
    pub fn sort(mut self) -> SortedPage<B> {
        let mut slots: Vec<(ParamId, Timestamp, EntryOffset)> = (0..self.header.count)
            .map(|i| {
                let (key, ts) = self
                    .entry_key(i)
                    .unwrap_or((ParamId::MAX, Timestamp::MAX));
                (key, ts, self.index_slot(i))
            })
            .collect();

        slots.sort_by_key(|&(key, ts, _)| (key, ts));

        for (i, &(_, _, offset)) in slots.iter().enumerate() {
            self.set_index_slot(i as u32, offset);
        }

        tracing::debug!(
            page_id = self.header.page_id,
            entries = self.header.count,
            "Sorted page index"
        );
        SortedPage { page: self }
    }
}

/// A page whose index is ordered by `(key, timestamp)`
///
/// Dereferences to [`Page`] for every read-only operation. Appending or
/// clearing requires [`into_unsorted`](Self::into_unsorted).
#[derive(Debug)]
pub struct SortedPage<B> {
    page: Page<B>,
}

impl<B> Deref for SortedPage<B> {
    type Target = Page<B>;

    fn deref(&self) -> &Page<B> {
        &self.page
    }
}

impl<B> SortedPage<B> {
    /// Give up the ordering guarantee to append or clear again
    pub fn into_unsorted(self) -> Page<B> {
        self.page
    }
}

impl<B: AsRef<[u8]>> SortedPage<B> {
    /// Binary search for the first entry with `key` and `timestamp >= lowerbound`
    ///
    /// Returns the record offset, readable with
    /// [`read_entry_at`](Page::read_entry_at).
    pub fn search(&self, key: ParamId, lowerbound: Timestamp) -> Option<EntryOffset> {
        self.search_index(key, lowerbound)
            .map(|index| self.page.index_slot(index))
    }

    /// Same as [`search`](Self::search) but returns the entry's index position
    pub fn search_index(&self, key: ParamId, lowerbound: Timestamp) -> Option<u32> {
        let index = self.lower_bound(key, lowerbound);
        if index >= self.page.get_entries_count() {
            return None;
        }
        match self.page.entry_key(index) {
            Some((found, _)) if found == key => Some(index),
            _ => None,
        }
    }

    /// Advance a cursor, writing matching entry indices into its buffer
    ///
    /// Call repeatedly, draining the cursor between calls, until
    /// `cursor.is_done()`. Indices come out in ascending `(key, timestamp)`
    /// order and each match is produced exactly once.
    pub fn search_cursor(&self, cursor: &mut PageCursor<'_>) {
        match cursor.state {
            CursorState::Exhausted => return,
            CursorState::NotStarted => {
                let start = match *cursor.query() {
                    CursorQuery::SingleParameter {
                        param,
                        lowerbound,
                        upperbound,
                    } => {
                        if lowerbound > upperbound
                            || !self.page.header.bbox.intersects(param, lowerbound, upperbound)
                        {
                            tracing::trace!(
                                page_id = self.page.page_id(),
                                param,
                                "Query outside page bounding box"
                            );
                            cursor.finish();
                            return;
                        }
                        self.lower_bound(param, lowerbound)
                    }
                };
                cursor.start_index = start;
                cursor.probe_index = start;
            }
            CursorState::Scanning | CursorState::BufferFull => {}
        }
        cursor.state = CursorState::Scanning;

        let count = self.page.get_entries_count();
        while cursor.probe_index < count {
            let matches = self
                .page
                .entry_key(cursor.probe_index)
                .map(|(key, ts)| cursor.query().matches(key, ts))
                .unwrap_or(false);
            if !matches {
                break;
            }
            if cursor.is_full() {
                cursor.state = CursorState::BufferFull;
                return;
            }
            cursor.push(cursor.probe_index);
            cursor.probe_index += 1;
        }

        tracing::trace!(
            page_id = self.page.page_id(),
            start = cursor.start_index,
            end = cursor.probe_index,
            "Cursor exhausted"
        );
        cursor.finish();
    }

    /// Release the underlying buffer
    pub fn into_inner(self) -> B {
        self.page.into_inner()
    }

    /// First index whose `(key, timestamp)` is not less than the probe
    fn lower_bound(&self, key: ParamId, timestamp: Timestamp) -> u32 {
        let probe = (key, timestamp);
        let mut lo = 0u32;
        let mut hi = self.page.get_entries_count();

        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let less = self
                .page
                .entry_key(mid)
                .map(|found| found < probe)
                .unwrap_or(false);
            if less {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        lo
    }
}
