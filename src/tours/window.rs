//! Sliding window of open tour-start candidates for a single user.
//!
//! Entries are chronological. A real candidate borrows its trip; a gap
//! marker records that one trip was skipped because it did not connect
//! spatially. The window upholds one invariant across all mutations:
//! it never ends on an unresolved gap, so the tail entry (when present)
//! is always a real trip.

use crate::Trip;

/// One entry in the candidate window.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Candidate<'a> {
    /// A trip still eligible to start a tour.
    Trip(&'a Trip),
    /// A tolerated spatial break between two consecutive trips.
    Gap,
}

impl Candidate<'_> {
    pub(crate) fn is_gap(&self) -> bool {
        matches!(self, Candidate::Gap)
    }
}

/// Ordered sequence of candidates and gap markers for one user.
#[derive(Debug, Default)]
pub(crate) struct CandidateWindow<'a> {
    entries: Vec<Candidate<'a>>,
}

impl<'a> CandidateWindow<'a> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of entries, gap markers included.
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of real candidates, gap markers excluded.
    pub(crate) fn trip_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_gap()).count()
    }

    pub(crate) fn get(&self, index: usize) -> Option<Candidate<'a>> {
        self.entries.get(index).copied()
    }

    /// The most recent real candidate, against which the next trip's
    /// spatial connectivity is checked.
    pub(crate) fn last_trip(&self) -> Option<&'a Trip> {
        self.entries.iter().rev().find_map(|e| match e {
            Candidate::Trip(t) => Some(*t),
            Candidate::Gap => None,
        })
    }

    /// Add a real candidate at the tail.
    pub(crate) fn push(&mut self, trip: &'a Trip) {
        self.entries.push(Candidate::Trip(trip));
    }

    /// Add a gap marker at the tail. Only valid when immediately followed
    /// by a `push`, which restores the no-trailing-gap invariant.
    pub(crate) fn push_gap(&mut self) {
        self.entries.push(Candidate::Gap);
    }

    /// Replace the entire window with a single fresh candidate. Used when
    /// a spatial break occurs and gaps are disallowed.
    pub(crate) fn reset_to(&mut self, trip: &'a Trip) {
        self.entries.clear();
        self.entries.push(Candidate::Trip(trip));
    }

    /// Drop all entries strictly before `index`, evicting candidates that
    /// have expired out of the time window. Clamps to the window length.
    pub(crate) fn truncate_from(&mut self, index: usize) {
        let index = index.min(self.entries.len());
        self.entries.drain(..index);
    }

    /// Keep only entries before `index`, discarding a consumed tour span.
    /// Trailing gap markers are dropped afterwards: a window never ends
    /// on an unresolved gap.
    pub(crate) fn truncate_to(&mut self, index: usize) {
        self.entries.truncate(index);
        while self.entries.last().is_some_and(Candidate::is_gap) {
            self.entries.pop();
        }
    }

    /// Count gap markers in `[from, to)`.
    pub(crate) fn count_gaps(&self, from: usize, to: usize) -> usize {
        let to = to.min(self.entries.len());
        if from >= to {
            return 0;
        }
        self.entries[from..to].iter().filter(|e| e.is_gap()).count()
    }

    /// Collect the real trips from `index` to the tail, gaps excluded.
    pub(crate) fn trips_from(&self, index: usize) -> Vec<&'a Trip> {
        self.entries[index.min(self.entries.len())..]
            .iter()
            .filter_map(|e| match e {
                Candidate::Trip(t) => Some(*t),
                Candidate::Gap => None,
            })
            .collect()
    }
}
