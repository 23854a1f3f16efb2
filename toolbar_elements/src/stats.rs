// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Derived ratios shown next to an element: click share and completion percentages.

use core::fmt;

use crate::types::ElementMetadata;

/// `part / total` as a whole percentage, rounded half up. `None` when `total` is zero.
pub fn ratio_percent(part: u64, total: u64) -> Option<u64> {
    if total == 0 {
        return None;
    }
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a rounded percentage of a ratio fits in u64"
    )]
    let pct = (part as f64 / total as f64 * 100.0).round() as u64;
    Some(pct)
}

/// Click statistics for one element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClickStats {
    /// Clicks on the element.
    pub count: u64,
    /// Clicks on every heatmap element.
    pub total: u64,
    /// 1-based rank of the element.
    pub rank_position: Option<u32>,
}

impl ClickStats {
    /// Statistics for `meta`, if it carries a heatmap count.
    pub fn for_element<K>(meta: &ElementMetadata<K>, total: u64) -> Option<Self> {
        Some(Self {
            count: meta.count?,
            total,
            rank_position: meta.rank_position,
        })
    }

    /// Share of all clicks in percent, or `None` when there were no clicks.
    pub fn percentage(&self) -> Option<f64> {
        (self.total != 0).then(|| self.count as f64 / self.total as f64 * 100.0)
    }

    /// [`percentage`](Self::percentage) rounded half up to two decimals.
    ///
    /// Formatting alone would round ties to even.
    pub fn rounded_percentage(&self) -> Option<f64> {
        (self.total != 0).then(|| (self.count as f64 / self.total as f64 * 10000.0).round() / 100.0)
    }
}

/// Formats as `count / total (pct%)`, the percentage with at most two decimals.
impl fmt::Display for ClickStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rounded_percentage() {
            Some(pct) => {
                let pct = format!("{pct:.2}");
                let pct = pct.trim_end_matches('0').trim_end_matches('.');
                write!(f, "{} / {} ({pct}%)", self.count, self.total)
            }
            None => write!(f, "{} / {} (-)", self.count, self.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_rounds_half_up() {
        assert_eq!(ratio_percent(3, 5), Some(60));
        assert_eq!(ratio_percent(1, 8), Some(13));
        assert_eq!(ratio_percent(1, 3), Some(33));
        assert_eq!(ratio_percent(2, 3), Some(67));
        assert_eq!(ratio_percent(5, 5), Some(100));
        assert_eq!(ratio_percent(1, 0), None);
    }

    #[test]
    fn click_stats_display() {
        let stats = |count, total| ClickStats {
            count,
            total,
            rank_position: Some(1),
        };
        assert_eq!(stats(40, 100).to_string(), "40 / 100 (40%)");
        assert_eq!(stats(1, 3).to_string(), "1 / 3 (33.33%)");
        assert_eq!(stats(1, 8).to_string(), "1 / 8 (12.5%)");
        assert_eq!(stats(1, 800).to_string(), "1 / 800 (0.13%)");
        assert_eq!(stats(5, 800).to_string(), "5 / 800 (0.63%)");
        assert_eq!(stats(0, 7).to_string(), "0 / 7 (0%)");
        assert_eq!(stats(0, 0).to_string(), "0 / 0 (-)");
        assert_eq!(stats(1, 800).rounded_percentage(), Some(0.13));
    }

    #[test]
    fn stats_need_a_count() {
        let mut meta = ElementMetadata::bare(1_u32);
        assert_eq!(ClickStats::for_element(&meta, 100), None);
        meta.count = Some(40);
        meta.rank_position = Some(2);
        let stats = ClickStats::for_element(&meta, 100).unwrap();
        assert_eq!(stats.rank_position, Some(2));
        assert_eq!(stats.to_string(), "40 / 100 (40%)");
    }
}
