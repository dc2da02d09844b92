//! Interval channel assignment
//!
//! Packs half-open column intervals `[start, end)` into the fewest rows such
//! that no two intervals on a row overlap. Greedy by start position with a
//! min-heap of row end positions, which is optimal for interval partitioning.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Result of packing intervals into channels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelAssignment {
    /// Number of channels used
    pub count: usize,
    /// Channel for each input interval, by input index
    pub channels: Vec<usize>,
}

/// Assign each interval a channel, using as few channels as possible
pub fn assign_channels(intervals: &[(usize, usize)]) -> ChannelAssignment {
    let mut order: Vec<usize> = (0..intervals.len()).collect();
    order.sort_by_key(|&i| intervals[i].0);

    // (end, channel) of the last interval placed on each channel
    let mut heap: BinaryHeap<Reverse<(usize, usize)>> = BinaryHeap::new();
    let mut channels = vec![0; intervals.len()];
    let mut count = 0;

    for index in order {
        let (start, end) = intervals[index];

        let channel = match heap.peek() {
            Some(&Reverse((free_at, channel))) if free_at <= start => {
                heap.pop();
                channel
            }
            _ => {
                count += 1;
                count - 1
            }
        };

        channels[index] = channel;
        heap.push(Reverse((end, channel)));
    }

    ChannelAssignment { count, channels }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        assert_eq!(assign_channels(&[]), ChannelAssignment::default());
    }

    #[test]
    fn test_disjoint_share_a_channel() {
        let result = assign_channels(&[(0, 2), (2, 4), (5, 6)]);
        assert_eq!(result.count, 1);
        assert_eq!(result.channels, vec![0, 0, 0]);
    }

    #[test]
    fn test_overlapping() {
        let intervals = [(1, 3), (2, 4), (3, 5), (7, 8), (6, 9)];
        let result = assign_channels(&intervals);
        assert_eq!(result.count, 2);

        for (i, a) in intervals.iter().enumerate() {
            for (j, b) in intervals.iter().enumerate().skip(i + 1) {
                let overlaps = a.0 < b.1 && b.0 < a.1;
                if overlaps {
                    assert_ne!(result.channels[i], result.channels[j]);
                }
            }
        }
    }

    #[test]
    fn test_all_overlapping() {
        let result = assign_channels(&[(0, 10), (1, 10), (2, 10)]);
        assert_eq!(result.count, 3);
    }
}
