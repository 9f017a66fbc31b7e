//! Running statistics shared by the learning models.

use serde::{Deserialize, Serialize};

/// Unweighted incremental mean: `(old*count + new) / (count + 1)`.
///
/// The seed is only reported until the first observation replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunningMean {
    pub mean: f64,
    pub count: u32,
}

impl RunningMean {
    pub fn seeded(seed: f64) -> Self {
        Self { mean: seed, count: 0 }
    }

    pub fn push(&mut self, value: f64) {
        let n = self.count as f64;
        self.mean = (self.mean * n + value) / (n + 1.0);
        self.count += 1;
    }

    pub fn value(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }
}

impl Default for RunningMean {
    fn default() -> Self {
        Self::seeded(0.0)
    }
}

/// Index of the largest value; ties go to the lowest index.
pub fn arg_max(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().copied().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Majority bucket of a histogram and its count; ties go to the lowest bucket.
/// `None` when the histogram is empty.
pub fn majority(counts: &[u32]) -> Option<(usize, u32)> {
    let mut best: Option<(usize, u32)> = None;
    for (i, c) in counts.iter().copied().enumerate() {
        if c == 0 {
            continue;
        }
        match best {
            Some((_, b)) if c <= b => {}
            _ => best = Some((i, c)),
        }
    }
    best
}
