//! Resumable page cursors
//!
//! A cursor lets an unbounded range query be served through a fixed-size,
//! caller-owned results buffer. Each call to
//! [`SortedPage::search_cursor`](crate::page::SortedPage::search_cursor)
//! fills the free part of the buffer with entry indices and records where
//! the scan stopped; the caller drains the buffer and calls again until the
//! cursor reports `done`.
//!
//! ```text
//! NotStarted ──► Scanning ──┬──► BufferFull ──(drain, search)──► Scanning
//!                           └──► Exhausted (done)
//! ```

use crate::page::entry::ParamId;
use crate::page::error::{PageError, PageResult};
use crate::page::timestamp::Timestamp;

/// Cursor FSM state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No search call made yet
    NotStarted,
    /// Scan in progress
    Scanning,
    /// Results buffer filled before the matching run ended
    BufferFull,
    /// Matching run ended; terminal
    Exhausted,
}

/// Query shapes a cursor can drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorQuery {
    /// All entries of one parameter with `lowerbound <= timestamp <= upperbound`
    SingleParameter {
        param: ParamId,
        lowerbound: Timestamp,
        upperbound: Timestamp,
    },
}

impl CursorQuery {
    /// Check if an entry belongs to the result set
    pub fn matches(&self, key: ParamId, timestamp: Timestamp) -> bool {
        match *self {
            CursorQuery::SingleParameter {
                param,
                lowerbound,
                upperbound,
            } => key == param && timestamp >= lowerbound && timestamp <= upperbound,
        }
    }
}

/// Resumable scan state plus the caller's results buffer
#[derive(Debug)]
pub struct PageCursor<'a> {
    results: &'a mut [u32],
    results_num: usize,
    done: bool,
    pub(crate) start_index: u32,
    pub(crate) probe_index: u32,
    pub(crate) state: CursorState,
    query: CursorQuery,
}

impl<'a> PageCursor<'a> {
    /// Cursor for a single parameter time-range query
    ///
    /// Use `Timestamp::MIN` / `Timestamp::MAX` for open-ended bounds.
    pub fn single_parameter(
        param: ParamId,
        lowerbound: Timestamp,
        upperbound: Timestamp,
        buffer: &'a mut [u32],
    ) -> PageResult<Self> {
        Self::new(
            CursorQuery::SingleParameter {
                param,
                lowerbound,
                upperbound,
            },
            buffer,
        )
    }

    /// Build a cursor over a caller-owned results buffer
    ///
    /// The buffer must hold at least one index; an empty one could never
    /// make progress. Fails with `BufferTooSmall` otherwise.
    pub fn new(query: CursorQuery, buffer: &'a mut [u32]) -> PageResult<Self> {
        if buffer.is_empty() {
            return Err(PageError::BufferTooSmall { required: 1 });
        }
        Ok(Self {
            results: buffer,
            results_num: 0,
            done: false,
            start_index: 0,
            probe_index: 0,
            state: CursorState::NotStarted,
            query,
        })
    }

    /// Entry indices produced since the last drain
    pub fn results(&self) -> &[u32] {
        &self.results[..self.results_num]
    }

    /// Forget the buffered results so the next search call can refill the buffer
    pub fn reset_results(&mut self) {
        self.results_num = 0;
    }

    /// Number of buffered results
    pub fn len(&self) -> usize {
        self.results_num
    }

    pub fn is_empty(&self) -> bool {
        self.results_num == 0
    }

    /// Capacity of the results buffer
    pub fn capacity(&self) -> usize {
        self.results.len()
    }

    /// True once the last matching entry has been written to the buffer
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn query(&self) -> &CursorQuery {
        &self.query
    }

    /// Index where the traversal started
    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    /// Next index the traversal will examine
    pub fn probe_index(&self) -> u32 {
        self.probe_index
    }

    pub(crate) fn is_full(&self) -> bool {
        self.results_num == self.results.len()
    }

    pub(crate) fn push(&mut self, index: u32) {
        debug_assert!(!self.is_full());
        self.results[self.results_num] = index;
        self.results_num += 1;
    }

    pub(crate) fn finish(&mut self) {
        self.state = CursorState::Exhausted;
        self.done = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cursor() {
        let mut buf = [0u32; 4];
        let cursor = PageCursor::single_parameter(
            7,
            Timestamp::from_micros(0),
            Timestamp::MAX,
            &mut buf,
        )
        .unwrap();

        assert_eq!(cursor.state(), CursorState::NotStarted);
        assert_eq!(cursor.capacity(), 4);
        assert!(cursor.is_empty());
        assert!(!cursor.is_done());
    }

    #[test]
    fn test_push_and_reset() {
        let mut buf = [0u32; 2];
        let mut cursor =
            PageCursor::single_parameter(1, Timestamp::MIN, Timestamp::MAX, &mut buf).unwrap();

        cursor.push(5);
        cursor.push(6);
        assert!(cursor.is_full());
        assert_eq!(cursor.results(), &[5, 6]);

        cursor.reset_results();
        assert!(cursor.is_empty());
        assert!(!cursor.is_full());
    }

    #[test]
    fn test_finish_sets_done() {
        let mut buf = [0u32; 1];
        let mut cursor =
            PageCursor::single_parameter(1, Timestamp::MIN, Timestamp::MAX, &mut buf).unwrap();
        cursor.finish();

        assert!(cursor.is_done());
        assert_eq!(cursor.state(), CursorState::Exhausted);
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let mut buf: [u32; 0] = [];
        let err =
            PageCursor::single_parameter(1, Timestamp::MIN, Timestamp::MAX, &mut buf).unwrap_err();
        assert_eq!(err, PageError::BufferTooSmall { required: 1 });
    }

    #[test]
    fn test_query_matches() {
        let query = CursorQuery::SingleParameter {
            param: 3,
            lowerbound: Timestamp::from_micros(10),
            upperbound: Timestamp::from_micros(20),
        };

        assert!(query.matches(3, Timestamp::from_micros(10)));
        assert!(query.matches(3, Timestamp::from_micros(20)));
        assert!(!query.matches(3, Timestamp::from_micros(21)));
        assert!(!query.matches(4, Timestamp::from_micros(15)));
    }
}
