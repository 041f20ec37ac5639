//! Weighted random choice over cumulative ranges.
//!
//! Item `i` owns the half-open range `[start_i, start_i + w_i)` and the draw
//! is uniform on `[0, total)`, so every draw lands in exactly one range and
//! item `i` is chosen with probability `w_i / total`. Zero weights own no
//! range and can never be chosen.

use rand::seq::IteratorRandom;
use rand::Rng;

/// One item's slice of the cumulative range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedCandidate<T> {
    pub start: u64,
    pub end: u64,
    pub item: T,
}

#[derive(Debug, Clone)]
pub struct WeightedRanges<T> {
    ranges: Vec<WeightedCandidate<T>>,
    total: u64,
}

impl<T> WeightedRanges<T> {
    pub fn new() -> Self {
        Self {
            ranges: Vec::new(),
            total: 0,
        }
    }

    /// Append an item. Returns `false` (and drops the item) for zero weight.
    pub fn push(&mut self, weight: u64, item: T) -> bool {
        let weight = weight.min(u64::MAX - self.total);
        if weight == 0 {
            return false;
        }
        let start = self.total;
        self.total += weight;
        self.ranges.push(WeightedCandidate {
            start,
            end: self.total,
            item,
        });
        true
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ranges(&self) -> &[WeightedCandidate<T>] {
        &self.ranges
    }

    /// The item owning `draw`, or `None` when `draw >= total`.
    pub fn pick(&self, draw: u64) -> Option<&T> {
        let idx = self.ranges.partition_point(|r| r.end <= draw);
        self.ranges
            .get(idx)
            .filter(|r| r.start <= draw)
            .map(|r| &r.item)
    }

    pub fn into_choice<R: Rng + ?Sized>(self, rng: &mut R) -> Option<T> {
        if self.total == 0 {
            return None;
        }
        let draw = rng.gen_range(0..self.total);
        let idx = self.ranges.partition_point(|r| r.end <= draw);
        self.ranges.into_iter().nth(idx).map(|r| r.item)
    }
}

impl<T> Default for WeightedRanges<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(u64, T)> for WeightedRanges<T> {
    fn from_iter<I: IntoIterator<Item = (u64, T)>>(iter: I) -> Self {
        let mut ranges = Self::new();
        for (weight, item) in iter {
            ranges.push(weight, item);
        }
        ranges
    }
}

/// Choose one item with probability proportional to its weight.
pub fn choose_weighted<T, R, I>(rng: &mut R, items: I) -> Option<T>
where
    R: Rng + ?Sized,
    I: IntoIterator<Item = (u64, T)>,
{
    items.into_iter().collect::<WeightedRanges<T>>().into_choice(rng)
}

/// Choose one item uniformly.
pub fn choose_uniform<T, R: Rng + ?Sized>(rng: &mut R, items: Vec<T>) -> Option<T> {
    items.into_iter().choose(rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_ranges_are_half_open_and_contiguous() {
        let ranges: WeightedRanges<&str> = vec![(3, "a"), (0, "skipped"), (2, "b"), (5, "c")]
            .into_iter()
            .collect();

        assert_eq!(ranges.total(), 10);
        assert_eq!(ranges.len(), 3);
        assert_eq!(
            ranges
                .ranges()
                .iter()
                .map(|r| (r.start, r.end))
                .collect::<Vec<_>>(),
            vec![(0, 3), (3, 5), (5, 10)]
        );
    }

    #[test]
    fn test_pick_boundaries() {
        let ranges: WeightedRanges<&str> = vec![(3, "a"), (2, "b"), (5, "c")].into_iter().collect();

        assert_eq!(ranges.pick(0), Some(&"a"));
        assert_eq!(ranges.pick(2), Some(&"a"));
        // A boundary belongs to the range that starts there.
        assert_eq!(ranges.pick(3), Some(&"b"));
        assert_eq!(ranges.pick(4), Some(&"b"));
        assert_eq!(ranges.pick(5), Some(&"c"));
        assert_eq!(ranges.pick(9), Some(&"c"));
        assert_eq!(ranges.pick(10), None);
    }

    #[test]
    fn test_zero_total_never_chooses() {
        let mut rng = StdRng::seed_from_u64(1);
        let ranges: WeightedRanges<&str> = vec![(0, "a"), (0, "b")].into_iter().collect();
        assert!(ranges.is_empty());
        assert_eq!(ranges.into_choice(&mut rng), None);
        assert_eq!(choose_weighted(&mut rng, Vec::<(u64, &str)>::new()), None);
    }

    #[test]
    fn test_single_item_always_chosen() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(choose_weighted(&mut rng, vec![(0, "a"), (4, "b")]), Some("b"));
        }
    }

    #[test]
    fn test_choice_converges_to_weight_share() {
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 20_000;
        let mut counts = [0usize; 3];
        for _ in 0..trials {
            counts[choose_weighted(&mut rng, vec![(1, 0), (3, 1), (6, 2)]).unwrap()] += 1;
        }

        for (i, expected) in [0.1, 0.3, 0.6].iter().enumerate() {
            let share = counts[i] as f64 / trials as f64;
            assert!(
                (share - expected).abs() < 0.02,
                "item {i}: share {share} expected {expected}"
            );
        }
    }

    #[test]
    fn test_huge_weights_saturate() {
        let mut ranges = WeightedRanges::new();
        assert!(ranges.push(u64::MAX, "a"));
        assert!(!ranges.push(10, "b"));
        assert_eq!(ranges.total(), u64::MAX);
    }

    #[test]
    fn test_choose_uniform() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(choose_uniform::<u8, _>(&mut rng, vec![]), None);
        assert_eq!(choose_uniform(&mut rng, vec![9]), Some(9));

        let mut seen = [false; 4];
        for _ in 0..200 {
            seen[choose_uniform(&mut rng, vec![0, 1, 2, 3]).unwrap()] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }
}
