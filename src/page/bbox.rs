//! Page bounding box
//!
//! All page data is two dimensional: parameter id × timestamp. The bounding
//! box records the extent of both dimensions so a query that falls outside
//! it can be rejected without touching the index.

use crate::page::entry::ParamId;
use crate::page::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// Minimum/maximum key and timestamp observed in a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_key: ParamId,
    pub max_key: ParamId,
    pub min_timestamp: Timestamp,
    pub max_timestamp: Timestamp,
}

impl BoundingBox {
    /// Inverted box: the first update redefines every bound
    pub const EMPTY: BoundingBox = BoundingBox {
        min_key: ParamId::MAX,
        max_key: ParamId::MIN,
        min_timestamp: Timestamp::MAX,
        max_timestamp: Timestamp::MIN,
    };

    /// True until the first update
    pub fn is_empty(&self) -> bool {
        self.min_key > self.max_key || self.min_timestamp > self.max_timestamp
    }

    /// Grow the box to include `(key, timestamp)`
    pub fn update(&mut self, key: ParamId, timestamp: Timestamp) {
        self.min_key = self.min_key.min(key);
        self.max_key = self.max_key.max(key);
        self.min_timestamp = self.min_timestamp.min(timestamp);
        self.max_timestamp = self.max_timestamp.max(timestamp);
    }

    /// Check if a point lies inside the box (bounds inclusive)
    pub fn contains(&self, key: ParamId, timestamp: Timestamp) -> bool {
        key >= self.min_key
            && key <= self.max_key
            && timestamp >= self.min_timestamp
            && timestamp <= self.max_timestamp
    }

    /// Check if the query `key × [lowerbound, upperbound]` can overlap the box
    pub fn intersects(&self, key: ParamId, lowerbound: Timestamp, upperbound: Timestamp) -> bool {
        key >= self.min_key
            && key <= self.max_key
            && lowerbound <= self.max_timestamp
            && upperbound >= self.min_timestamp
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(micros: i64) -> Timestamp {
        Timestamp::from_micros(micros)
    }

    #[test]
    fn test_empty_box_contains_nothing() {
        let bbox = BoundingBox::default();

        assert!(bbox.is_empty());
        assert!(!bbox.contains(0, ts(0)));
        assert!(!bbox.intersects(0, Timestamp::MIN, Timestamp::MAX));
    }

    #[test]
    fn test_first_update_defines_both_bounds() {
        let mut bbox = BoundingBox::default();
        bbox.update(5, ts(100));

        assert!(!bbox.is_empty());
        assert_eq!(bbox.min_key, 5);
        assert_eq!(bbox.max_key, 5);
        assert_eq!(bbox.min_timestamp, ts(100));
        assert_eq!(bbox.max_timestamp, ts(100));
        assert!(bbox.contains(5, ts(100)));
    }

    #[test]
    fn test_update_grows_box() {
        let mut bbox = BoundingBox::default();
        bbox.update(5, ts(100));
        bbox.update(2, ts(300));
        bbox.update(9, ts(50));

        assert_eq!(bbox.min_key, 2);
        assert_eq!(bbox.max_key, 9);
        assert_eq!(bbox.min_timestamp, ts(50));
        assert_eq!(bbox.max_timestamp, ts(300));

        assert!(bbox.contains(7, ts(200)));
        assert!(!bbox.contains(10, ts(200)));
        assert!(!bbox.contains(7, ts(301)));
    }

    #[test]
    fn test_intersects() {
        let mut bbox = BoundingBox::default();
        bbox.update(1, ts(100));
        bbox.update(3, ts(200));

        assert!(bbox.intersects(2, ts(0), ts(100)));
        assert!(bbox.intersects(2, ts(200), Timestamp::MAX));
        assert!(bbox.intersects(2, Timestamp::MIN, Timestamp::MAX));
        assert!(!bbox.intersects(2, ts(201), ts(500)));
        assert!(!bbox.intersects(2, ts(0), ts(99)));
        assert!(!bbox.intersects(4, ts(100), ts(200)));
    }
}
