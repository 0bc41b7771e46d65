//! Nutrition lookup table.
//!
//! Static mapping from candy class label to calories and sugar grams, loaded
//! once at startup and never mutated. The table's declared order doubles as
//! the iteration order everywhere counts are rendered, so summary lines come
//! out in the same order on every frame regardless of detection order.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

/// Calories and sugar grams for one candy class.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct NutritionEntry {
    pub calories: u32,
    pub sugar_grams: u32,
}

/// Ordered class-label → nutrition mapping.
#[derive(Clone, Debug)]
pub struct NutritionTable {
    entries: Vec<(String, NutritionEntry)>,
}

impl NutritionTable {
    /// The built-in table for the trained candy model.
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                ("Bar_One".to_string(), entry(201, 21)),
                ("Gems".to_string(), entry(50, 9)),
                ("Kit_Kat".to_string(), entry(106, 11)),
                ("Milky_Bar".to_string(), entry(137, 14)),
            ],
        }
    }

    /// Load a table from a JSON file of the shape
    /// `{"Bar_One": [201, 21], "Gems": [50, 9], ...}`.
    ///
    /// File order is preserved as the table order.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read nutrition file {}: {}", path.display(), e))?;
        let parsed: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid nutrition file {}: {}", path.display(), e))?;
        let mut entries = Vec::with_capacity(parsed.len());
        for (label, value) in parsed {
            let pair: [u32; 2] = serde_json::from_value(value).map_err(|_| {
                anyhow!(
                    "nutrition entry for '{}' must be [calories, sugar_grams]",
                    label
                )
            })?;
            entries.push((label, entry(pair[0], pair[1])));
        }
        if entries.is_empty() {
            return Err(anyhow!("nutrition file {} has no entries", path.display()));
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<NutritionEntry> {
        self.entries
            .iter()
            .find(|(name, _)| name == label)
            .map(|(_, entry)| *entry)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    /// Entries in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NutritionEntry)> {
        self.entries
            .iter()
            .map(|(name, entry)| (name.as_str(), *entry))
    }

    /// Class labels in declared order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

fn entry(calories: u32, sugar_grams: u32) -> NutritionEntry {
    NutritionEntry {
        calories,
        sugar_grams,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_table_has_the_trained_classes_in_order() {
        let table = NutritionTable::builtin();
        let labels: Vec<&str> = table.labels().collect();
        assert_eq!(labels, ["Bar_One", "Gems", "Kit_Kat", "Milky_Bar"]);
        assert_eq!(table.get("Gems"), Some(entry(50, 9)));
        assert_eq!(table.get("Kit_Kat"), Some(entry(106, 11)));
        assert!(!table.contains("Toffee"));
    }

    #[test]
    fn json_file_order_is_preserved() {
        let mut file = tempfile::NamedTempFile::new().expect("temp nutrition file");
        write!(file, r#"{{"Zed": [10, 1], "Alpha": [20, 2]}}"#).expect("write nutrition file");
        let table = NutritionTable::from_json_file(file.path()).expect("load nutrition file");
        let labels: Vec<&str> = table.labels().collect();
        assert_eq!(labels, ["Zed", "Alpha"]);
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp nutrition file");
        write!(file, r#"{{"Zed": [10]}}"#).expect("write nutrition file");
        assert!(NutritionTable::from_json_file(file.path()).is_err());
    }
}
