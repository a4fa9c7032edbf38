//! Top-N selection for intensity quantification

use std::cmp::Ordering;

/// Number of most intense PSMs summed per ion set
pub const TOP_N: usize = 3;

/// Non-negative PSM intensity with a total order, so it can live in a heap
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Intensity(pub f64);

impl Eq for Intensity {}

impl PartialOrd for Intensity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Intensity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Select the `k` largest items of `slice` in place. Afterwards the first
/// `k` elements hold them in min-heap order (smallest at index 0), and the
/// rest of the slice is left in unspecified order.
pub fn bounded_min_heapify<T: Ord>(slice: &mut [T], k: usize) {
    if slice.len() <= k {
        return;
    }

    for i in (0..k / 2).rev() {
        sift_down(&mut slice[..k], i);
    }
    debug_assert!(is_min_heap(&slice[..k]));

    // Anything larger than the current heap minimum replaces it
    for i in k..slice.len() {
        if k > 0 && slice[i] > slice[0] {
            slice.swap(i, 0);
            sift_down(&mut slice[..k], 0);
        }
    }
    debug_assert!(is_min_heap(&slice[..k]));
}

fn is_min_heap<T: Ord>(slice: &[T]) -> bool {
    (1..slice.len()).all(|i| slice[(i - 1) / 2] <= slice[i])
}

fn sift_down<T: Ord>(slice: &mut [T], mut index: usize) {
    loop {
        let left = index * 2 + 1;
        let right = left + 1;
        let mut smallest = index;

        if left < slice.len() && slice[left] < slice[smallest] {
            smallest = left;
        }
        if right < slice.len() && slice[right] < slice[smallest] {
            smallest = right;
        }
        if smallest == index {
            break;
        }
        slice.swap(smallest, index);
        index = smallest;
    }
}

/// Sum of the `n` largest values. Fewer than `n` values are summed as-is,
/// and an empty input sums to 0
pub fn top_n_sum(mut values: Vec<Intensity>, n: usize) -> f64 {
    bounded_min_heapify(&mut values, n);
    values.iter().take(n).fold(0.0, |acc, i| acc + i.0)
}
