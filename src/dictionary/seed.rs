/*!
 * Starter vocabulary and seed file loading.
 */

use anyhow::{Context, Result};
use std::path::Path;

use crate::database::models::SeedPair;

/// Vocabulary every fresh dictionary starts with
const DEFAULT_PAIRS: [(&str, &str); 11] = [
    ("Hello", "Привет"),
    ("Apple", "Яблоко"),
    ("Orange", "Оранжевый"),
    ("Pumpkin", "Тыква"),
    ("Banana", "Банан"),
    ("Milk", "Молоко"),
    ("Table", "Стол"),
    ("Chair", "Стул"),
    ("Water", "Вода"),
    ("Drink", "Пить"),
    ("Mango", "Манго"),
];

/// The built-in starter vocabulary
pub fn default_seed() -> Vec<SeedPair> {
    DEFAULT_PAIRS
        .iter()
        .map(|(english, russian)| SeedPair::new(*english, *russian))
        .collect()
}

/// Load seed pairs from a JSON array of `{"english": ..., "russian": ...}` objects
///
/// Entries are trimmed and entries with an empty side are skipped.
pub fn load_seed_file<P: AsRef<Path>>(path: P) -> Result<Vec<SeedPair>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {:?}", path))?;
    parse_seed_json(&content).with_context(|| format!("Failed to parse seed file: {:?}", path))
}

fn parse_seed_json(content: &str) -> Result<Vec<SeedPair>> {
    let raw: Vec<SeedPair> = serde_json::from_str(content)?;

    let pairs: Vec<SeedPair> = raw
        .into_iter()
        .map(|p| SeedPair::new(p.english.trim(), p.russian.trim()))
        .filter(|p| !p.english.is_empty() && !p.russian.is_empty())
        .collect();

    Ok(pairs)
}
