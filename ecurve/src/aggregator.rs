//! Aggregates per-word alignment scores into one final score per class.

use std::collections::BTreeMap;

use word::SUFFIX_LEN as S;

/// Per-class accumulator: a running total of committed positions plus a sliding
/// window of the `S` most recent per-position scores still "in flight".
struct Accumulator {
    started:    bool,
    prev_index: usize,
    total:      f64,
    window:     [f64; S]
}

impl Accumulator {
    fn new() -> Self {
        Self { started: false, prev_index: 0, total: 0.0, window: [f64::NEG_INFINITY; S] }
    }

    /// Folds in the alignment scores for a word ending at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is smaller than the index of the previous `add` call.
    fn add(&mut self, index: usize, dist: [f64; S]) {
        let diff = if self.started {
            assert!(index >= self.prev_index, "ScoreAggregator indices must be non-decreasing");
            index - self.prev_index
        } else {
            0
        };

        for j in 0 .. diff.min(S) {
            self.total += self.window[j];
        }

        let mut shifted = [f64::NEG_INFINITY; S];
        for i in 0 .. S {
            if i + diff < S {
                shifted[i] = self.window[i + diff];
            }
        }
        for i in 0 .. S {
            self.window[i] = shifted[i].max(dist[i]);
        }

        self.prev_index = index;
        self.started = true;
    }

    /// Commits the remaining window positions and returns the class's total.
    fn finalize(&self) -> f64 {
        self.total + self.window.iter().sum::<f64>()
    }
}

/// Per-class score accumulator driving the classifier's final argmax.
///
/// Each query amino position contributes exactly once to a class's score, as
/// the best alignment score it receives from any indexed word overlapping
/// that position (see [`ScoreAggregator::add`]).
pub struct ScoreAggregator {
    accumulators: BTreeMap<i64, Accumulator>
}

impl Default for ScoreAggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreAggregator {
    /// Starts an empty aggregator.
    pub fn new() -> Self {
        Self { accumulators: BTreeMap::new() }
    }

    /// Whether no word has been added for any class yet.
    pub fn is_empty(&self) -> bool {
        self.accumulators.is_empty()
    }

    /// Folds the alignment scores `dist` for a word of class `cls` ending at
    /// query position `index` into that class's running total.
    pub fn add(&mut self, cls: i64, index: usize, dist: [f64; S]) {
        self.accumulators.entry(cls).or_insert_with(Accumulator::new).add(index, dist);
    }

    /// Walks every class accumulator, finalizes its total, and returns the
    /// `(class, score)` with the highest score. Ties are broken by the lowest
    /// class label, since `accumulators` is iterated in ascending class order.
    ///
    /// Returns `None` if no word was ever added.
    pub fn finalize(self) -> Option<(i64, f64)> {
        self.accumulators
            .into_iter()
            .map(|(cls, acc)| (cls, acc.finalize()))
            .fold(None, |best, (cls, score)| match best {
                None => Some((cls, score)),
                Some((_, best_score)) if score > best_score => Some((cls, score)),
                some => some
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_add_sums_dist() {
        let mut agg = ScoreAggregator::new();
        let dist = [1.0; S];
        agg.add(7, 0, dist);
        assert_eq!(agg.finalize(), Some((7, S as f64)));
    }

    #[test]
    fn test_overlap_window_property() {
        // Property 7: adding the same dist vector at indices i..=i+m keeps only
        // the max per position, so the total is sum(v) + m * v[S-1].
        let v: [f64; S] = std::array::from_fn(|i| (i + 1) as f64);
        let m = 4;
        let mut agg = ScoreAggregator::new();
        for i in 0 ..= m {
            agg.add(0, i, v);
        }
        let expected: f64 = v.iter().sum::<f64>() + (m as f64) * v[S - 1];
        assert_eq!(agg.finalize(), Some((0, expected)));
    }

    #[test]
    fn test_argmax_ties_broken_by_lowest_class() {
        let mut agg = ScoreAggregator::new();
        agg.add(5, 0, [2.0; S]);
        agg.add(2, 0, [2.0; S]);
        agg.add(9, 0, [1.0; S]);
        assert_eq!(agg.finalize(), Some((2, 2.0 * S as f64)));
    }

    #[test]
    fn test_empty_aggregator_finalizes_to_none() {
        let agg = ScoreAggregator::new();
        assert!(agg.is_empty());
        assert_eq!(agg.finalize(), None);
    }

    #[test]
    fn test_non_overlapping_adds_sum_independently() {
        let mut agg = ScoreAggregator::new();
        agg.add(3, 0, [1.0; S]);
        agg.add(3, S, [1.0; S]); // starts exactly where the window ran out
        assert_eq!(agg.finalize(), Some((3, 2.0 * S as f64)));
    }
}
