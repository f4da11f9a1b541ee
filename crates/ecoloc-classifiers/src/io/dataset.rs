//! Reader for the tabular localization dataset.
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use ndarray::Array2;

use crate::data_handling::{Label, LabeledDataset, FEATURE_NAMES, LABEL_COLUMN, N_FEATURES};
use crate::error::{ClassifierError, Result};
use crate::io::delimiter_for;

/// Read a CSV/TSV dataset with columns mcg..alm2 and `class`.
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<LabeledDataset> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    log::debug!("Reading dataset {:?}", path);
    read_dataset_from_reader(file, delimiter_for(path))
}

/// Read a dataset from any reader; header names are matched case-insensitively.
pub fn read_dataset_from_reader<R: Read>(reader: R, delimiter: u8) -> Result<LabeledDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();

    let mut feature_idx = [0usize; N_FEATURES];
    for (slot, name) in feature_idx.iter_mut().zip(FEATURE_NAMES.iter()) {
        *slot = require_column(&headers, name)?;
    }
    let label_idx = require_column(&headers, LABEL_COLUMN)?;

    let extra: Vec<&str> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != label_idx && !feature_idx.contains(idx))
        .map(|(_, h)| h)
        .collect();
    if !extra.is_empty() {
        log::warn!("Ignoring extra dataset columns: {}", extra.join(", "));
    }

    let mut features = Vec::new();
    let mut labels = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let row = row_idx + 1;
        let record = result?;

        for (&idx, name) in feature_idx.iter().zip(FEATURE_NAMES.iter()) {
            let raw = record.get(idx).unwrap_or_default();
            let value = raw.parse::<f64>().map_err(|e| ClassifierError::MalformedRecord {
                row,
                column: name.to_string(),
                message: format!("cannot parse '{}': {}", raw, e),
            })?;
            if !value.is_finite() {
                return Err(ClassifierError::MalformedRecord {
                    row,
                    column: name.to_string(),
                    message: format!("non-finite value '{}'", raw),
                });
            }
            features.push(value);
        }

        let label = record.get(label_idx).unwrap_or_default();
        if label.is_empty() {
            return Err(ClassifierError::MalformedRecord {
                row,
                column: LABEL_COLUMN.to_string(),
                message: "empty class label".to_string(),
            });
        }
        labels.push(Label::new(label));
    }

    if labels.is_empty() {
        return Err(ClassifierError::InsufficientData(
            "dataset contains no rows".to_string(),
        ));
    }

    let x = Array2::from_shape_vec((labels.len(), N_FEATURES), features).map_err(|e| {
        ClassifierError::InsufficientData(format!("failed to build feature matrix: {}", e))
    })?;
    LabeledDataset::new(x, labels)
}

fn require_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(name))
        .ok_or_else(|| ClassifierError::SchemaMismatch {
            column: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "mcg,gvh,lip,chg,aac,alm1,alm2,class\n";

    #[test]
    fn reads_rows_in_feature_order() {
        let data = format!("{}0.49,0.29,0.48,0.5,0.56,0.24,0.35,cp\n0.07,0.4,0.48,0.5,0.54,0.35,0.44,im\n", HEADER);
        let ds = read_dataset_from_reader(data.as_bytes(), b',').unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.x[(1, 0)], 0.07);
        assert_eq!(ds.labels[1].as_str(), "im");
    }

    #[test]
    fn columns_may_be_reordered_and_have_extras() {
        let data = "Sequence,class,ALM2,alm1,aac,chg,lip,gvh,mcg\nAAT_ECOLI,pp,7,6,5,4,3,2,1\n";
        let ds = read_dataset_from_reader(data.as_bytes(), b',').unwrap();
        let row: Vec<f64> = ds.x.row(0).to_vec();
        assert_eq!(row, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(ds.labels[0].as_str(), "pp");
    }

    #[test]
    fn missing_class_column_is_schema_mismatch() {
        let data = "mcg,gvh,lip,chg,aac,alm1,alm2\n0.1,0.1,0.1,0.1,0.1,0.1,0.1\n";
        match read_dataset_from_reader(data.as_bytes(), b',') {
            Err(ClassifierError::SchemaMismatch { column }) => assert_eq!(column, "class"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn unparsable_value_reports_row_and_column() {
        let data = format!("{}0.1,0.1,0.1,0.1,0.1,0.1,0.1,cp\n0.1,abc,0.1,0.1,0.1,0.1,0.1,cp\n", HEADER);
        match read_dataset_from_reader(data.as_bytes(), b',') {
            Err(ClassifierError::MalformedRecord { row, column, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "gvh");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn header_only_is_insufficient() {
        assert!(matches!(
            read_dataset_from_reader(HEADER.as_bytes(), b','),
            Err(ClassifierError::InsufficientData(_))
        ));
    }
}
