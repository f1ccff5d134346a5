//! Corpus-level positional statistics used by the outlier check.

use std::collections::BTreeMap;

use crate::models::record::ExtractionRecord;

/// Mean and sample standard deviation of the extraction positions observed
/// for one (source, element) group across the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionStats {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl PositionStats {
    fn from_positions(positions: &[f64]) -> Self {
        let count = positions.len();
        let mean = positions.iter().sum::<f64>() / count as f64;
        // Sample variance (N-1); a single observation has no spread.
        let std_dev = if count < 2 {
            0.0
        } else {
            let sum_sq: f64 = positions.iter().map(|p| (p - mean).powi(2)).sum();
            (sum_sq / (count - 1) as f64).sqrt()
        };
        Self {
            mean,
            std_dev,
            count,
        }
    }

    /// Z-score of a position against this group, `None` when the group is
    /// degenerate (fewer than two samples or zero spread).
    pub fn z_score(&self, position: usize) -> Option<f64> {
        if self.count < 2 || self.std_dev == 0.0 {
            return None;
        }
        Some((position as f64 - self.mean) / self.std_dev)
    }
}

/// Collect position statistics for every (source, element) group with at
/// least one positioned record.
pub fn collect_position_stats(
    records: &[ExtractionRecord],
) -> BTreeMap<(String, String), PositionStats> {
    let mut groups: BTreeMap<(String, String), Vec<f64>> = BTreeMap::new();
    for record in records {
        if let Some(position) = record.position {
            groups
                .entry((record.source.clone(), record.element.clone()))
                .or_default()
                .push(position as f64);
        }
    }

    groups
        .into_iter()
        .map(|(key, positions)| (key, PositionStats::from_positions(&positions)))
        .collect()
}
