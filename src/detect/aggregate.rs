//! Per-frame detection filtering and candy-count aggregation.

use crate::detect::result::Detection;
use crate::nutrition::NutritionTable;

/// Per-class counts for one frame.
///
/// Every class from the nutrition table is present (possibly zero) so that
/// iteration order is stable for rendering, independent of detection arrival
/// order. Invariant: `total()` equals the number of kept detections whose
/// class is in the table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CandyCounts {
    entries: Vec<(String, u32)>,
}

impl CandyCounts {
    /// All-zero counts over the table's classes, in table order.
    pub fn zeroed(table: &NutritionTable) -> Self {
        Self {
            entries: table.labels().map(|name| (name.to_string(), 0)).collect(),
        }
    }

    /// Increment the count for `label`. Returns false when the class is not
    /// tracked by the table.
    pub fn increment(&mut self, label: &str) -> bool {
        match self.entries.iter_mut().find(|(name, _)| name == label) {
            Some((_, count)) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, label: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, count)| *count)
    }

    /// Sum over all classes.
    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (label, count) pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
    }
}

/// Filter raw detections by confidence and tally per-class counts.
///
/// A detection is kept iff its confidence is strictly greater than the
/// threshold; `confidence == threshold` is rejected. Kept detections whose
/// class is not in the nutrition table stay in the kept list (they are still
/// drawn and labelled) but are excluded from the counts, and thereby from
/// nutrition totals.
pub fn aggregate(
    raw: Vec<Detection>,
    threshold: f32,
    table: &NutritionTable,
) -> (Vec<Detection>, CandyCounts) {
    let mut counts = CandyCounts::zeroed(table);
    let mut kept = Vec::with_capacity(raw.len());
    for detection in raw {
        if detection.confidence <= threshold {
            continue;
        }
        if !counts.increment(&detection.class_label) {
            log::debug!(
                "class '{}' not in nutrition table; drawn but not counted",
                detection.class_label
            );
        }
        kept.push(detection);
    }
    (kept, counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BBox;

    fn det(label: &str, confidence: f32) -> Detection {
        Detection {
            class_id: 0,
            class_label: label.to_string(),
            confidence,
            bbox: BBox::new(0, 0, 10, 10),
        }
    }

    #[test]
    fn threshold_is_strictly_exclusive() {
        let table = NutritionTable::builtin();
        let t = 0.5;
        let eps = 1e-4;
        let raw = vec![det("Gems", t - eps), det("Gems", t), det("Gems", t + eps)];
        let (kept, counts) = aggregate(raw, t, &table);
        assert_eq!(kept.len(), 1);
        assert_eq!(counts.get("Gems"), Some(1));
    }

    #[test]
    fn counts_cover_every_table_class_in_table_order() {
        let table = NutritionTable::builtin();
        let (_, counts) = aggregate(vec![det("Kit_Kat", 0.9)], 0.5, &table);
        let observed: Vec<(&str, u32)> = counts.iter().collect();
        assert_eq!(
            observed,
            [
                ("Bar_One", 0),
                ("Gems", 0),
                ("Kit_Kat", 1),
                ("Milky_Bar", 0)
            ]
        );
    }

    #[test]
    fn unknown_classes_are_kept_but_not_counted() {
        let table = NutritionTable::builtin();
        let raw = vec![det("Toffee", 0.9), det("Gems", 0.8)];
        let (kept, counts) = aggregate(raw, 0.5, &table);
        assert_eq!(kept.len(), 2);
        assert_eq!(counts.total(), 1);
    }

    #[test]
    fn count_total_matches_kept_table_detections() {
        let table = NutritionTable::builtin();
        let raw = vec![
            det("Gems", 0.9),
            det("Kit_Kat", 0.95),
            det("Gems", 0.6),
            det("Milky_Bar", 0.4),
        ];
        let (kept, counts) = aggregate(raw, 0.5, &table);
        assert_eq!(kept.len(), 3);
        assert_eq!(counts.total(), 3);
        assert_eq!(counts.get("Gems"), Some(2));
        assert_eq!(counts.get("Kit_Kat"), Some(1));
        assert_eq!(counts.get("Milky_Bar"), Some(0));
    }
}
