//! CSV dataset adapter: ingestion, schema validation and label
//! normalization for the screening dataset.
//!
//! The source file arrives with an unknown delimiter; comma is tried first
//! and a header that collapses into a single column triggers a semicolon
//! retry. Label text is mapped through fixed vocabularies only — an
//! unrecognized value is a hard error that lists the offenders, never a
//! silent default.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::domain::{ClinicalFeatures, ClinicalSample, Dataset, Gender};

/// Error type for dataset ingestion.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("Dataset is missing required columns: {missing:?}")]
    Schema { missing: Vec<String> },

    #[error("Label values outside the known vocabularies: {values:?}")]
    UnmappedLabels { values: Vec<String> },

    #[error("Row {row}, column '{column}': {message}")]
    InvalidValue {
        row: usize,
        column: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Label words meaning "anemia present" after normalization.
const POSITIVE_TERMS: [&str; 10] = [
    "1", "si", "yes", "positivo", "positive", "anemia", "anemico", "mild", "moderate", "severe",
];

/// Label words meaning "no anemia" after normalization.
const NEGATIVE_TERMS: [&str; 8] = [
    "0",
    "no",
    "negativo",
    "negative",
    "normal",
    "no anemia",
    "non-anemia",
    "non anemia",
];

const REQUIRED_COLUMNS: [&str; 6] = ["gender", "hemoglobin", "mch", "mchc", "mcv", "label"];

/// Load and validate the screening dataset from a delimited file.
///
/// # Errors
/// `Schema` when required columns are absent, `UnmappedLabels` when label
/// text falls outside the vocabularies, `InvalidValue` for unparseable
/// cells.
pub fn load_clinical_csv(path: &Path) -> Result<Vec<ClinicalSample>, DatasetError> {
    let raw = fs::read_to_string(path)?;
    let (headers, records) = read_with_fallback(&raw)?;

    let columns = resolve_columns(&headers)?;
    let mut samples = Vec::with_capacity(records.len());
    let mut unmapped: BTreeSet<String> = BTreeSet::new();

    for (row_number, record) in records.iter().enumerate() {
        let row = row_number + 2; // 1-based, after the header line
        let features = parse_features(record, &columns, row)?;
        let label_cell = record
            .get(columns.label)
            .map(str::trim)
            .unwrap_or_default();

        match normalize_label(label_cell) {
            Some(label) => samples.push(ClinicalSample::new(features, label)),
            None => {
                unmapped.insert(label_cell.to_string());
            }
        }
    }

    if !unmapped.is_empty() {
        return Err(DatasetError::UnmappedLabels {
            values: unmapped.into_iter().collect(),
        });
    }
    tracing::info!(rows = samples.len(), "dataset loaded");
    Ok(samples)
}

/// Persist a partition back to a comma-delimited file, freezing it for
/// later runs.
///
/// # Errors
/// Returns error if the file cannot be written.
pub fn write_partition_csv(path: &Path, dataset: &Dataset) -> Result<(), DatasetError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(REQUIRED_COLUMNS)?;
    for sample in dataset.samples() {
        let f = sample.features();
        writer.write_record(&[
            f.gender.to_string(),
            f.hemoglobin.to_string(),
            f.mch.to_string(),
            f.mchc.to_string(),
            f.mcv.to_string(),
            sample.label().to_string(),
        ])?;
    }
    writer.flush().map_err(DatasetError::from)?;
    Ok(())
}

struct ColumnIndices {
    gender: usize,
    hemoglobin: usize,
    mch: usize,
    mchc: usize,
    mcv: usize,
    label: usize,
}

fn read_with_fallback(raw: &str) -> Result<(Vec<String>, Vec<csv::StringRecord>), DatasetError> {
    let (headers, records) = read_with_delimiter(raw, b',')?;
    if headers.len() > 1 {
        return Ok((headers, records));
    }
    tracing::debug!("comma parse collapsed to one column, retrying with ';'");
    read_with_delimiter(raw, b';')
}

fn read_with_delimiter(
    raw: &str,
    delimiter: u8,
) -> Result<(Vec<String>, Vec<csv::StringRecord>), DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(raw.as_bytes());
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let records = reader.records().collect::<Result<Vec<_>, _>>()?;
    Ok((headers, records))
}

fn resolve_columns(headers: &[String]) -> Result<ColumnIndices, DatasetError> {
    let find = |name: &str| headers.iter().position(|h| h == name);
    // The raw export names the label column "result".
    let label = find("label").or_else(|| find("result"));

    let lookups = [
        ("gender", find("gender")),
        ("hemoglobin", find("hemoglobin")),
        ("mch", find("mch")),
        ("mchc", find("mchc")),
        ("mcv", find("mcv")),
        ("label", label),
    ];
    let missing: Vec<String> = lookups
        .iter()
        .filter(|(_, index)| index.is_none())
        .map(|(name, _)| (*name).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DatasetError::Schema { missing });
    }

    Ok(ColumnIndices {
        gender: lookups[0].1.unwrap_or_default(),
        hemoglobin: lookups[1].1.unwrap_or_default(),
        mch: lookups[2].1.unwrap_or_default(),
        mchc: lookups[3].1.unwrap_or_default(),
        mcv: lookups[4].1.unwrap_or_default(),
        label: lookups[5].1.unwrap_or_default(),
    })
}

fn parse_features(
    record: &csv::StringRecord,
    columns: &ColumnIndices,
    row: usize,
) -> Result<ClinicalFeatures, DatasetError> {
    let cell = |index: usize| record.get(index).map(str::trim).unwrap_or_default();

    let gender_cell = cell(columns.gender);
    let gender = Gender::parse(gender_cell).ok_or_else(|| DatasetError::InvalidValue {
        row,
        column: "gender".to_string(),
        message: format!("'{gender_cell}' is not a recognized gender"),
    })?;

    let numeric = |column: &str, index: usize| -> Result<f64, DatasetError> {
        let text = cell(index);
        let value: f64 = text.parse().map_err(|_| DatasetError::InvalidValue {
            row,
            column: column.to_string(),
            message: format!("'{text}' is not numeric"),
        })?;
        if !value.is_finite() {
            return Err(DatasetError::InvalidValue {
                row,
                column: column.to_string(),
                message: format!("'{text}' is not finite"),
            });
        }
        Ok(value)
    };

    Ok(ClinicalFeatures {
        gender,
        hemoglobin: numeric("hemoglobin", columns.hemoglobin)?,
        mch: numeric("mch", columns.mch)?,
        mchc: numeric("mchc", columns.mchc)?,
        mcv: numeric("mcv", columns.mcv)?,
    })
}

/// Map a label cell to 0/1: numeric values directly, text through the fixed
/// vocabularies. `None` means the value is unmapped.
fn normalize_label(cell: &str) -> Option<u8> {
    if let Ok(value) = cell.parse::<f64>() {
        return match value as i64 {
            0 if value == 0.0 => Some(0),
            1 if value == 1.0 => Some(1),
            _ => None,
        };
    }

    let normalized = strip_accents(&cell.to_lowercase());
    if POSITIVE_TERMS.contains(&normalized.as_str()) {
        Some(1)
    } else if NEGATIVE_TERMS.contains(&normalized.as_str()) {
        Some(0)
    } else {
        None
    }
}

fn strip_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            other => other,
        })
        .collect()
}
