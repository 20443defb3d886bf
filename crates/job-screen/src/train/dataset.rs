use std::{fs::File, io::Read, path::Path};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{Classification, error::DatasetError};

/// One labeled training record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledPosting {
    /// The text fields joined with a space.
    pub text: String,
    pub label: Classification,
    /// Categorical field used for the descriptive report, e.g. industry.
    pub category: Option<String>,
}

impl LabeledPosting {
    pub fn new(text: impl Into<String>, label: Classification) -> Self {
        Self {
            text: text.into(),
            label,
            category: None,
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Which CSV columns hold the text, the label and the category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSchema {
    pub text_columns: Vec<String>,
    pub label_column: String,
    pub category_column: Option<String>,
}

impl Default for DatasetSchema {
    fn default() -> Self {
        Self {
            text_columns: vec![
                "job_description".to_string(),
                "requirements".to_string(),
                "benefits".to_string(),
            ],
            label_column: "is_fake".to_string(),
            category_column: Some("industry".to_string()),
        }
    }
}

fn parse_label(value: &str) -> Option<Classification> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "fake" | "yes" => Some(Classification::Fake),
        "0" | "0.0" | "false" | "real" | "no" => Some(Classification::Real),
        _ => None,
    }
}

/// Load labeled postings from a CSV file with a header row.
pub fn load_csv(
    path: impl AsRef<Path>,
    schema: &DatasetSchema,
) -> Result<Vec<LabeledPosting>, DatasetError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let postings = read_csv(file, schema)?;
    info!(path = %path.display(), rows = postings.len(), "Dataset loaded");
    Ok(postings)
}

/// Read labeled postings from CSV data.
///
/// Empty cells and absent text columns count as empty text. A missing label
/// column or an unreadable label is an error.
pub fn read_csv<R: Read>(
    reader: R,
    schema: &DatasetSchema,
) -> Result<Vec<LabeledPosting>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let label_idx = column(&schema.label_column)
        .ok_or_else(|| DatasetError::MissingColumn(schema.label_column.clone()))?;

    let mut text_idx = Vec::with_capacity(schema.text_columns.len());
    for name in &schema.text_columns {
        match column(name) {
            Some(idx) => text_idx.push(idx),
            None => warn!(column = %name, "Text column not found; treating it as empty"),
        }
    }
    if text_idx.is_empty() {
        return Err(DatasetError::NoTextColumns(schema.text_columns.clone()));
    }
    let category_idx = schema.category_column.as_deref().and_then(column);

    let mut postings = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        // header is line 1
        let line = row + 2;

        let raw_label = record.get(label_idx).unwrap_or_default();
        let label = parse_label(raw_label).ok_or_else(|| DatasetError::InvalidLabel {
            row: line,
            value: raw_label.to_string(),
        })?;

        let text = text_idx
            .iter()
            .map(|&idx| record.get(idx).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(" ");
        let category = category_idx
            .and_then(|idx| record.get(idx))
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned);

        postings.push(LabeledPosting {
            text,
            label,
            category,
        });
    }
    Ok(postings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
title,job_description,requirements,benefits,industry,is_fake
Engineer,Build services,Rust experience,Health insurance,Software,0
Agent,Wire money now!,,,,1
Clerk,\"Data entry, from home\",None,Weekly pay,Staffing,1
";

    #[test]
    fn test_reads_and_joins_text_columns() {
        let postings = read_csv(CSV.as_bytes(), &DatasetSchema::default()).unwrap();
        assert_eq!(postings.len(), 3);
        assert_eq!(
            postings[0].text,
            "Build services Rust experience Health insurance"
        );
        assert_eq!(postings[0].label, Classification::Real);
        assert_eq!(postings[0].category.as_deref(), Some("Software"));
    }

    #[test]
    fn test_missing_values_are_empty_text() {
        let postings = read_csv(CSV.as_bytes(), &DatasetSchema::default()).unwrap();
        assert_eq!(postings[1].text, "Wire money now!  ");
        assert_eq!(postings[1].label, Classification::Fake);
        assert_eq!(postings[1].category, None);
    }

    #[test]
    fn test_absent_text_column_is_tolerated() {
        let schema = DatasetSchema {
            text_columns: vec!["job_description".to_string(), "company_profile".to_string()],
            ..DatasetSchema::default()
        };
        let postings = read_csv(CSV.as_bytes(), &schema).unwrap();
        assert_eq!(postings[0].text, "Build services");
    }

    #[test]
    fn test_missing_label_column() {
        let schema = DatasetSchema {
            label_column: "fraudulent".to_string(),
            ..DatasetSchema::default()
        };
        assert!(matches!(
            read_csv(CSV.as_bytes(), &schema),
            Err(DatasetError::MissingColumn(name)) if name == "fraudulent"
        ));
    }

    #[test]
    fn test_invalid_label_reports_line() {
        let data = "job_description,is_fake\nfine,0\nodd,maybe\n";
        assert!(matches!(
            read_csv(data.as_bytes(), &DatasetSchema::default()),
            Err(DatasetError::InvalidLabel { row: 3, .. })
        ));
    }

    #[test]
    fn test_label_spellings() {
        assert_eq!(parse_label(" TRUE "), Some(Classification::Fake));
        assert_eq!(parse_label("real"), Some(Classification::Real));
        assert_eq!(parse_label("2"), None);
    }
}
