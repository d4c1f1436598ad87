//! Transition probabilities and summary statistics over a conversation.
//!
//! Both are pure functions of the entry list and are recomputed on every
//! call. Maps are keyed by [`EmotionLabel`], which serialises as its
//! lowercase name and iterates in declaration order.

use crate::memory::ConversationEntry;
use sentio_model::EmotionLabel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Probability of moving from one label to the next between consecutive
/// messages.
///
/// Only labels that were followed by another message have a row; each row
/// sums to 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionMatrix(BTreeMap<EmotionLabel, BTreeMap<EmotionLabel, f64>>);

impl TransitionMatrix {
    /// P(`to` | `from`), 0 when the pair never occurred.
    pub fn probability(&self, from: EmotionLabel, to: EmotionLabel) -> f64 {
        self.0
            .get(&from)
            .and_then(|row| row.get(&to))
            .copied()
            .unwrap_or(0.0)
    }

    /// Successor distribution for `from`, if it was ever followed.
    pub fn row(&self, from: EmotionLabel) -> Option<&BTreeMap<EmotionLabel, f64>> {
        self.0.get(&from)
    }

    /// Iterate rows in label declaration order.
    pub fn rows(&self) -> impl Iterator<Item = (EmotionLabel, &BTreeMap<EmotionLabel, f64>)> {
        self.0.iter().map(|(label, row)| (*label, row))
    }

    /// Whether no transition has been observed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Label frequencies for a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionStatistics {
    /// Occurrences of each label that appeared at least once.
    pub counts: BTreeMap<EmotionLabel, usize>,
    /// Most frequent label; ties go to the label declared first.
    pub most_common: Option<EmotionLabel>,
    /// Number of entries.
    pub total: usize,
    /// Share of `total` for each observed label, 0–100.
    pub percentages: BTreeMap<EmotionLabel, f64>,
}

/// Count consecutive label pairs and normalise each row.
///
/// Fewer than two entries give an empty matrix.
pub fn transition_matrix(entries: &[ConversationEntry]) -> TransitionMatrix {
    let mut counts: BTreeMap<EmotionLabel, BTreeMap<EmotionLabel, usize>> = BTreeMap::new();
    for pair in entries.windows(2) {
        *counts
            .entry(pair[0].label)
            .or_default()
            .entry(pair[1].label)
            .or_default() += 1;
    }

    let rows = counts
        .into_iter()
        .map(|(from, successors)| {
            let row_total: usize = successors.values().sum();
            let row = successors
                .into_iter()
                .map(|(to, n)| (to, n as f64 / row_total as f64))
                .collect();
            (from, row)
        })
        .collect();
    TransitionMatrix(rows)
}

/// Label counts, most common label and percentages.
pub fn statistics(entries: &[ConversationEntry]) -> EmotionStatistics {
    let mut counts: BTreeMap<EmotionLabel, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.label).or_default() += 1;
    }

    // BTreeMap iterates in declaration order, so strict `>` keeps the
    // earliest label on ties.
    let mut most_common: Option<(EmotionLabel, usize)> = None;
    for (&label, &n) in &counts {
        if most_common.is_none_or(|(_, best)| n > best) {
            most_common = Some((label, n));
        }
    }

    let total = entries.len();
    let percentages = counts
        .iter()
        .map(|(&label, &n)| (label, n as f64 * 100.0 / total as f64))
        .collect();

    EmotionStatistics {
        counts,
        most_common: most_common.map(|(label, _)| label),
        total,
        percentages,
    }
}
