// src/core/similarity.rs — Stagnation detection between successive submissions

use std::collections::HashSet;

/// Levenshtein comparison window. Similarity is computed over the head of
/// each submission so the cost stays bounded for large artifacts.
const COMPARE_WINDOW_BYTES: usize = 4_000;

/// Cut a string to at most `max_len` bytes on a UTF-8 character boundary.
fn truncate_str(s: &str, max_len: usize) -> &str {
    if s.len() <= max_len {
        s
    } else {
        let mut end = max_len;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}

/// Watches successive developer submissions and counts consecutive
/// iterations without meaningful change.
///
/// An iteration counts as stalled when the normalized similarity to the
/// previous submission is at or above `threshold`, or when fewer than
/// `min_changed_lines` lines differ. The counter resets whenever a
/// submission shows sufficient change. The first submission has no
/// predecessor, so it never counts as stalled.
#[derive(Debug)]
pub struct ProgressDetector {
    threshold: f64,
    min_changed_lines: usize,
    max_no_progress: u32,
    stalled: u32,
    previous: Option<String>,
}

impl ProgressDetector {
    pub fn new(threshold: f64, min_changed_lines: usize, max_no_progress: u32) -> Self {
        Self {
            threshold,
            min_changed_lines,
            max_no_progress,
            stalled: 0,
            previous: None,
        }
    }

    /// Feed the next submission. Returns the similarity to the previous
    /// one, or `None` on the first call.
    pub fn observe(&mut self, submission: &str) -> Option<f64> {
        let score = match self.previous.as_deref() {
            Some(prev) => {
                let score = similarity(prev, submission);
                let delta = changed_lines(prev, submission);
                if score >= self.threshold || delta < self.min_changed_lines {
                    self.stalled += 1;
                } else {
                    self.stalled = 0;
                }
                Some(score)
            }
            None => None,
        };
        self.previous = Some(submission.to_string());
        score
    }

    pub fn stalled_count(&self) -> u32 {
        self.stalled
    }

    pub fn is_stalled(&self) -> bool {
        self.stalled >= self.max_no_progress
    }
}

/// Normalized textual similarity in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    strsim::normalized_levenshtein(
        truncate_str(a, COMPARE_WINDOW_BYTES),
        truncate_str(b, COMPARE_WINDOW_BYTES),
    )
}

/// Number of lines present in exactly one of the two texts, after
/// trimming whitespace. The "meaningful change" heuristic.
pub fn changed_lines(a: &str, b: &str) -> usize {
    let lines_a: HashSet<&str> = a.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    let lines_b: HashSet<&str> = b.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    lines_a.symmetric_difference(&lines_b).count()
}
