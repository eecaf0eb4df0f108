use std::collections::HashMap;
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use thiserror::Error;

use crate::utils::encoding::decode_with_guess_encoding;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to read translation table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed translation table: {0}")]
    Csv(#[from] csv::Error),
    #[error("translation table has no `{0}` column")]
    MissingColumn(String),
    #[error("row {row}: empty `{column}` cell")]
    EmptyCell { row: usize, column: String },
    #[error("row {row}: `{key}` already maps to `{existing}`, refusing `{conflicting}`")]
    ConflictingEntry {
        row: usize,
        key: String,
        existing: String,
        conflicting: String,
    },
    #[error("translation table is empty")]
    Empty,
}

/// Immutable label -> localized name mapping, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct TranslationTable {
    entries: HashMap<String, String>,
}

impl TranslationTable {
    pub fn load(path: &Path, source_column: &str, target_column: &str) -> Result<Self, TableError> {
        let bytes = std::fs::read(path).map_err(|source| TableError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let content = decode_with_guess_encoding(&bytes);
        Self::from_csv(&content, source_column, target_column)
    }

    /// Parse CSV text with a header row; only the two named columns are used.
    pub fn from_csv(content: &str, source_column: &str, target_column: &str) -> Result<Self, TableError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(content.as_bytes());

        let headers = reader.headers()?.clone();
        let column_index = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TableError::MissingColumn(name.to_string()))
        };
        let source_idx = column_index(source_column)?;
        let target_idx = column_index(target_column)?;

        let mut entries: HashMap<String, String> = HashMap::new();
        for (i, result) in reader.records().enumerate() {
            let record = result?;
            // header is row 1
            let row = i + 2;

            let cell = |idx: usize, column: &str| match record.get(idx) {
                Some(value) if !value.is_empty() => Ok(value.to_string()),
                _ => Err(TableError::EmptyCell {
                    row,
                    column: column.to_string(),
                }),
            };
            let key = cell(source_idx, source_column)?;
            let value = cell(target_idx, target_column)?;

            match entries.get(&key) {
                Some(existing) if *existing != value => {
                    return Err(TableError::ConflictingEntry {
                        row,
                        key,
                        existing: existing.clone(),
                        conflicting: value,
                    });
                }
                Some(_) => {}
                None => {
                    entries.insert(key, value);
                }
            }
        }

        if entries.is_empty() {
            return Err(TableError::Empty);
        }

        Ok(Self { entries })
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries.get(label).map(String::as_str)
    }

    /// `"<label> <translated>"`, or `None` when the label is not in the table.
    pub fn display(&self, label: &str) -> Option<String> {
        self.get(label).map(|translated| format!("{} {}", label, translated))
    }

    /// Labels with no entry, in the order given.
    pub fn missing_labels<'a>(&self, labels: &'a [String]) -> Vec<&'a str> {
        labels
            .iter()
            .map(String::as_str)
            .filter(|label| !self.entries.contains_key(*label))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for TranslationTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATS: &str = "\
#,English,Japanese,Simplified Chinese,Type 1
25,Pikachu,ピカチュウ,皮卡丘,Electric
1,Bulbasaur,フシギダネ,妙蛙种子,Grass
7, Squirtle ,ゼニガメ, 杰尼龟 ,Water
";

    #[test]
    fn picks_named_columns_and_trims() {
        let table = TranslationTable::from_csv(STATS, "English", "Simplified Chinese").unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.get("Pikachu"), Some("皮卡丘"));
        assert_eq!(table.get("Squirtle"), Some("杰尼龟"));
        assert_eq!(table.get("pikachu"), None);
    }

    #[test]
    fn display_joins_label_and_translation() {
        let table: TranslationTable =
            [("Pikachu".to_string(), "皮卡丘".to_string())].into_iter().collect();

        assert_eq!(table.display("Pikachu").as_deref(), Some("Pikachu 皮卡丘"));
        assert_eq!(table.display("Mew"), None);
    }

    #[test]
    fn missing_column_is_fatal() {
        let err = TranslationTable::from_csv(STATS, "English", "Traditional Chinese").unwrap_err();
        assert!(matches!(err, TableError::MissingColumn(ref c) if c == "Traditional Chinese"));
    }

    #[test]
    fn short_row_is_fatal() {
        let csv = "English,Simplified Chinese\nPikachu,皮卡丘\nMew,\n";
        let err = TranslationTable::from_csv(csv, "English", "Simplified Chinese").unwrap_err();
        assert!(matches!(err, TableError::EmptyCell { row: 3, .. }));
    }

    #[test]
    fn ragged_row_is_fatal() {
        let csv = "English,Simplified Chinese\nPikachu\n";
        assert!(TranslationTable::from_csv(csv, "English", "Simplified Chinese").is_err());
    }

    #[test]
    fn identical_duplicates_are_accepted() {
        let csv = "English,Simplified Chinese\nPikachu,皮卡丘\nPikachu,皮卡丘\n";
        let table = TranslationTable::from_csv(csv, "English", "Simplified Chinese").unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn conflicting_duplicates_are_fatal() {
        let csv = "English,Simplified Chinese\nPikachu,皮卡丘\nPikachu,比卡超\n";
        let err = TranslationTable::from_csv(csv, "English", "Simplified Chinese").unwrap_err();
        assert!(matches!(err, TableError::ConflictingEntry { row: 3, .. }));
    }

    #[test]
    fn header_only_table_is_fatal() {
        let err = TranslationTable::from_csv("English,Simplified Chinese\n", "English", "Simplified Chinese")
            .unwrap_err();
        assert!(matches!(err, TableError::Empty));
    }

    #[test]
    fn reports_labels_without_translation() {
        let table = TranslationTable::from_csv(STATS, "English", "Simplified Chinese").unwrap();
        let labels = vec![
            "Pikachu".to_string(),
            "Mewtwo".to_string(),
            "Bulbasaur".to_string(),
            "Ditto".to_string(),
        ];

        assert_eq!(table.missing_labels(&labels), vec!["Mewtwo", "Ditto"]);
    }

    #[test]
    fn load_reports_missing_file() {
        let err = TranslationTable::load(Path::new("/no/such/pokemon_stat.csv"), "English", "Simplified Chinese")
            .unwrap_err();
        assert!(matches!(err, TableError::Io { .. }));
    }
}
