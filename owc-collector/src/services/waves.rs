//! Wave chunking
//!
//! A wave is a contiguous, order-preserving slice of the target set.

use std::num::NonZeroUsize;

/// One batch of city identifiers fetched concurrently
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wave<'a> {
    /// Zero-based position of the wave in the run
    pub index: usize,
    pub city_ids: &'a [i64],
}

/// Split the target set into waves of `width` (the last may be shorter)
pub fn waves(target_set: &[i64], width: NonZeroUsize) -> impl Iterator<Item = Wave<'_>> {
    target_set
        .chunks(width.get())
        .enumerate()
        .map(|(index, city_ids)| Wave { index, city_ids })
}

/// Number of waves needed for `targets` cities
pub fn wave_count(targets: usize, width: NonZeroUsize) -> usize {
    targets.div_ceil(width.get())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn width(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_chunk_shapes_and_concatenation() {
        for n in 0..35usize {
            for w in 1..12usize {
                let targets: Vec<i64> = (0..n as i64).map(|i| 1000 + i).collect();
                let chunks: Vec<Wave<'_>> = waves(&targets, width(w)).collect();

                assert_eq!(chunks.len(), wave_count(n, width(w)), "n={} w={}", n, w);
                assert_eq!(chunks.len(), (n + w - 1) / w);

                if let Some((last, full)) = chunks.split_last() {
                    assert!(full.iter().all(|c| c.city_ids.len() == w));
                    assert!(!last.city_ids.is_empty() && last.city_ids.len() <= w);
                }

                let joined: Vec<i64> = chunks.iter().flat_map(|c| c.city_ids.iter().copied()).collect();
                assert_eq!(joined, targets);
            }
        }
    }

    #[test]
    fn test_wave_indices_are_sequential() {
        let targets = [5, 4, 3, 2, 1];
        let indices: Vec<usize> = waves(&targets, width(2)).map(|w| w.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicates_are_kept() {
        let targets = [7, 7, 7];
        let chunks: Vec<Wave<'_>> = waves(&targets, width(10)).collect();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].city_ids, &[7, 7, 7]);
    }
}
