//! Frontier for the scan
//!
//! This module handles:
//! - FIFO ordering of candidate URLs in discovery order
//! - The visited set, which is the only deduplication mechanism
//! - The progress ratio reported while draining

use crate::state::CandidateUrl;
use std::collections::{HashSet, VecDeque};

/// Progress never reported before the run completes
const PROGRESS_CAP: usize = 90;

/// Headroom added to the seed count so early progress grows gradually
const PROGRESS_HEADROOM: usize = 10;

/// Work queue and visited set
///
/// A URL enters the visited set when it is enqueued, so each normalized URL
/// is dispatched at most once per run. Failed items are never re-enqueued.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<CandidateUrl>,
    visited: HashSet<String>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a frontier from seeds, dropping duplicates
    pub fn from_seeds(seeds: impl IntoIterator<Item = CandidateUrl>) -> Self {
        let mut frontier = Self::new();
        for seed in seeds {
            frontier.enqueue(seed);
        }
        frontier
    }

    /// Adds a candidate to the back of the queue
    ///
    /// Returns `false` if its normalized URL was already seen.
    pub fn enqueue(&mut self, candidate: CandidateUrl) -> bool {
        if !self.visited.insert(candidate.key.clone()) {
            tracing::debug!("Dropping duplicate candidate: {}", candidate.url);
            return false;
        }
        self.queue.push_back(candidate);
        true
    }

    /// Pops the oldest candidate
    pub fn next(&mut self) -> Option<CandidateUrl> {
        self.queue.pop_front()
    }

    /// Number of candidates still waiting
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn has_visited(&self, key: &str) -> bool {
        self.visited.contains(key)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Progress percentage while a run is draining
///
/// `min(processed * 100 / (seeds + 10), 90)`; the caller reports 100 once the
/// run completes.
pub fn progress_percent(processed: usize, seeds: usize) -> u8 {
    let percent = processed.saturating_mul(100) / (seeds + PROGRESS_HEADROOM);
    percent.min(PROGRESS_CAP) as u8
}
