// This software is provided for non-commercial use only.
// Commercial use is strictly prohibited.
// If you use, modify, or redistribute this software, you must provide proper attribution to the original author.
// (c) 2026 Onur Tuna. All rights reserved.

//! Level → partition selection.

use crate::container::{PartitionDesc, NPART};

/// Map severity `level` (0..=7) to a partition index, falling back to the
/// nearest lower-indexed non-empty partition when `part[level]` is
/// disabled (`size_b == 0`). Returns `None` if no partition at or below
/// `level` is enabled, meaning the writer should no-op.
pub fn select(descs: &[PartitionDesc; NPART], level: u8) -> Option<usize> {
    let level = (level as usize).min(NPART - 1);
    (0..=level).rev().find(|&i| descs[i].size_b > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    fn descs(sizes: [u32; NPART]) -> [PartitionDesc; NPART] {
        std::array::from_fn(|i| PartitionDesc { next_addr: AtomicU32::new(0), size_b: sizes[i] })
    }

    #[test]
    fn exact_level_match_wins_when_enabled() {
        let d = descs([1024, 0, 2048, 0, 0, 0, 0, 0]);
        assert_eq!(select(&d, 2), Some(2));
    }

    #[test]
    fn falls_back_to_nearest_lower_non_empty() {
        let d = descs([1024, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(select(&d, 3), Some(0));
    }

    #[test]
    fn no_enabled_partition_at_or_below_level_is_none() {
        let d = descs([0, 0, 0, 4096, 0, 0, 0, 0]);
        assert_eq!(select(&d, 2), None);
    }

    #[test]
    fn level_beyond_npart_clamps() {
        let d = descs([1024, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(select(&d, 200), Some(0));
    }
}
