// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Character sets
//!
//! A [`CharSet`] is a set of code points stored as sorted, disjoint,
//! non-adjacent inclusive ranges. The range list is shared (`Arc`) between
//! clones; mutation copies it on demand, thus a face's set may be handed to
//! any number of masters and character maps without duplication.

use crate::conv::{to_u32, to_usize};
use crate::CodePoint;
use std::fmt;
use std::sync::Arc;

/// A copy-on-write set of code points
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct CharSet {
    ranges: Arc<Vec<(CodePoint, CodePoint)>>,
}

impl CharSet {
    /// Construct an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct from arbitrary (possibly overlapping) inclusive ranges
    pub fn from_ranges(ranges: impl IntoIterator<Item = (CodePoint, CodePoint)>) -> Self {
        let mut list: Vec<_> = ranges.into_iter().filter(|r| r.0 <= r.1).collect();
        list.sort_unstable();
        let mut merged: Vec<(CodePoint, CodePoint)> = Vec::with_capacity(list.len());
        for (start, end) in list {
            match merged.last_mut() {
                Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }
        CharSet {
            ranges: Arc::new(merged),
        }
    }

    /// Access the underlying ranges
    pub fn ranges(&self) -> &[(CodePoint, CodePoint)] {
        &self.ranges
    }

    /// Index of the range containing `code` or the insertion position
    fn find(&self, code: CodePoint) -> Result<usize, usize> {
        self.ranges.binary_search_by(|&(start, end)| {
            if end < code {
                std::cmp::Ordering::Less
            } else if start > code {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
    }

    /// Test membership
    #[inline]
    pub fn contains(&self, code: CodePoint) -> bool {
        self.find(code).is_ok()
    }

    /// True if no code is present
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Number of code points in the set
    pub fn len(&self) -> usize {
        self.ranges
            .iter()
            .map(|&(start, end)| to_usize(end - start) + 1)
            .sum()
    }

    /// Smallest member
    pub fn min(&self) -> Option<CodePoint> {
        self.ranges.first().map(|r| r.0)
    }

    /// Largest member
    pub fn max(&self) -> Option<CodePoint> {
        self.ranges.last().map(|r| r.1)
    }

    /// Insert a code point
    ///
    /// Returns true if the set changed. The shared range list is only copied
    /// when the set actually changes.
    pub fn insert(&mut self, code: CodePoint) -> bool {
        let index = match self.find(code) {
            Ok(_) => return false,
            Err(index) => index,
        };
        let ranges = Arc::make_mut(&mut self.ranges);
        let joins_prev = index > 0 && ranges[index - 1].1 + 1 == code;
        let joins_next = index < ranges.len() && code.checked_add(1) == Some(ranges[index].0);
        match (joins_prev, joins_next) {
            (true, true) => {
                ranges[index - 1].1 = ranges[index].1;
                ranges.remove(index);
            }
            (true, false) => ranges[index - 1].1 = code,
            (false, true) => ranges[index].0 = code,
            (false, false) => ranges.insert(index, (code, code)),
        }
        true
    }

    /// Remove a code point
    ///
    /// Returns true if the set changed.
    pub fn remove(&mut self, code: CodePoint) -> bool {
        let index = match self.find(code) {
            Ok(index) => index,
            Err(_) => return false,
        };
        let ranges = Arc::make_mut(&mut self.ranges);
        let (start, end) = ranges[index];
        if start == end {
            ranges.remove(index);
        } else if code == start {
            ranges[index].0 = code + 1;
        } else if code == end {
            ranges[index].1 = code - 1;
        } else {
            ranges[index].1 = code - 1;
            ranges.insert(index + 1, (code + 1, end));
        }
        true
    }

    /// Union of two sets
    pub fn union(&self, other: &CharSet) -> CharSet {
        if other.is_empty() || Arc::ptr_eq(&self.ranges, &other.ranges) {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        CharSet::from_ranges(self.ranges.iter().chain(other.ranges.iter()).copied())
    }

    /// Add all members of `other` to `self`
    pub fn union_with(&mut self, other: &CharSet) {
        *self = self.union(other);
    }

    /// Iterate over members in increasing order
    pub fn iter(&self) -> impl Iterator<Item = CodePoint> + '_ {
        self.ranges.iter().flat_map(|&(start, end)| start..=end)
    }

    /// Get the `n`-th member (in increasing order)
    pub fn nth(&self, mut n: usize) -> Option<CodePoint> {
        for &(start, end) in self.ranges.iter() {
            let len = to_usize(end - start) + 1;
            if n < len {
                return Some(start + to_u32(n));
            }
            n -= len;
        }
        None
    }
}

impl FromIterator<CodePoint> for CharSet {
    fn from_iter<I: IntoIterator<Item = CodePoint>>(iter: I) -> Self {
        CharSet::from_ranges(iter.into_iter().map(|c| (c, c)))
    }
}

impl fmt::Debug for CharSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for &(start, end) in self.ranges.iter() {
            if start == end {
                list.entry(&format_args!("{start:#X}"));
            } else {
                list.entry(&format_args!("{start:#X}..={end:#X}"));
            }
        }
        list.finish()
    }
}
