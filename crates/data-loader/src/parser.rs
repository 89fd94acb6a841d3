//! Parsers for the catalog and similarity artifacts.
//!
//! Catalog artifact (JSON), either shape:
//! - columns: `{"movie_id": [...], "title": [...], "year": [...], "vote_average": [...]}`
//!   Each column may also be an index map (`{"0": ..., "1": ...}`), which is
//!   what a dataframe's `to_dict()` produces. Index maps are read in
//!   ascending numeric index order.
//! - rows: `[{"movie_id": 1, "title": "...", "year": 2000, "vote_average": 7.1}, ...]`
//!
//! Similarity artifact:
//! - `.json`: array of N arrays of N numbers
//! - anything else: binary, `SIMM` magic, u32 LE version, u64 LE size, then
//!   size*size f32 LE scores in row-major order

use crate::error::{DataLoadError, Result};
use crate::types::*;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Magic bytes at the start of a binary similarity artifact
pub const SIMILARITY_MAGIC: &[u8; 4] = b"SIMM";

/// Only version of the binary layout
pub const SIMILARITY_VERSION: u32 = 1;

const HEADER_LEN: usize = 16;

// Accepted names for each catalog column, preferred name first
const ID_COLUMNS: &[&str] = &["movie_id", "id"];
const TITLE_COLUMNS: &[&str] = &["title"];
const YEAR_COLUMNS: &[&str] = &["year"];
const RATING_COLUMNS: &[&str] = &["vote_average", "rating"];

fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DataLoadError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// =============================================================================
// Catalog
// =============================================================================

/// One row of the row-oriented catalog shape
#[derive(Deserialize)]
struct CatalogRow {
    #[serde(alias = "id")]
    movie_id: MovieId,
    title: String,
    #[serde(default)]
    year: Option<f64>,
    #[serde(alias = "rating")]
    vote_average: f64,
}

/// Parse the catalog artifact at `path`
pub fn parse_catalog(path: &Path) -> Result<Vec<MovieRecord>> {
    let bytes = read_file(path)?;
    parse_catalog_bytes(&bytes, &file_label(path))
}

/// Parse catalog JSON already in memory. `file` is only used in errors.
pub fn parse_catalog_bytes(bytes: &[u8], file: &str) -> Result<Vec<MovieRecord>> {
    let value: Value = serde_json::from_slice(bytes).map_err(|source| DataLoadError::Json {
        file: file.to_string(),
        source,
    })?;

    match value {
        Value::Object(columns) => parse_columns(columns, file),
        Value::Array(rows) => parse_rows(rows, file),
        other => Err(DataLoadError::InvalidValue {
            field: "catalog".to_string(),
            value: format!("expected object or array, found {}", json_kind(&other)),
        }),
    }
}

fn parse_columns(mut columns: Map<String, Value>, file: &str) -> Result<Vec<MovieRecord>> {
    let ids: Column<MovieId> = take_column(&mut columns, ID_COLUMNS, file)?;
    let titles: Column<String> = take_column(&mut columns, TITLE_COLUMNS, file)?;
    let years: Column<Option<f64>> = take_column(&mut columns, YEAR_COLUMNS, file)?;
    let ratings: Column<f64> = take_column(&mut columns, RATING_COLUMNS, file)?;

    let expected = ids.keys.len();
    for (column, keys) in [
        (TITLE_COLUMNS[0], &titles.keys),
        (YEAR_COLUMNS[0], &years.keys),
        (RATING_COLUMNS[0], &ratings.keys),
    ] {
        if keys.len() != expected {
            return Err(DataLoadError::ColumnLengthMismatch {
                file: file.to_string(),
                column: column.to_string(),
                expected,
                found: keys.len(),
            });
        }
        // Rows are paired by index, not by position in the file
        if *keys != ids.keys {
            return Err(DataLoadError::ColumnIndexMismatch {
                file: file.to_string(),
                column: column.to_string(),
                reference: ID_COLUMNS[0].to_string(),
            });
        }
    }

    ids.values
        .into_iter()
        .zip(titles.values)
        .zip(years.values)
        .zip(ratings.values)
        .map(|(((id, title), year), rating)| {
            Ok(MovieRecord {
                id,
                title,
                year: parse_year(year)?,
                rating,
            })
        })
        .collect()
}

fn parse_rows(rows: Vec<Value>, file: &str) -> Result<Vec<MovieRecord>> {
    rows.into_iter()
        .map(|row| {
            let row: CatalogRow = decode_value(row, file)?;
            Ok(MovieRecord {
                id: row.movie_id,
                title: row.title,
                year: parse_year(row.year)?,
                rating: row.vote_average,
            })
        })
        .collect()
}

/// A decoded catalog column: row indices in ascending order, and the values
/// in that order. Plain arrays are indexed `0..len`.
struct Column<T> {
    keys: Vec<u64>,
    values: Vec<T>,
}

/// Remove the first present alias of a column and decode it
fn take_column<T: DeserializeOwned>(
    columns: &mut Map<String, Value>,
    names: &[&str],
    file: &str,
) -> Result<Column<T>> {
    let value = names
        .iter()
        .find_map(|name| columns.remove(*name))
        .ok_or_else(|| DataLoadError::MissingColumn {
            file: file.to_string(),
            column: names[0].to_string(),
        })?;

    decode_column(value, names[0], file)
}

/// Decode a column that is either a plain array or an index map
fn decode_column<T: DeserializeOwned>(value: Value, column: &str, file: &str) -> Result<Column<T>> {
    match value {
        Value::Array(items) => {
            let keys = (0..items.len() as u64).collect();
            let values = items
                .into_iter()
                .map(|item| decode_value(item, file))
                .collect::<Result<Vec<T>>>()?;
            Ok(Column { keys, values })
        }
        Value::Object(entries) => {
            let mut indexed = BTreeMap::new();
            for (key, item) in entries {
                let index: u64 = key.parse().map_err(|_| DataLoadError::InvalidValue {
                    field: format!("{} index", column),
                    value: key.clone(),
                })?;
                indexed.insert(index, decode_value(item, file)?);
            }
            let (keys, values) = indexed.into_iter().unzip();
            Ok(Column { keys, values })
        }
        other => Err(DataLoadError::InvalidValue {
            field: column.to_string(),
            value: format!("expected array or object, found {}", json_kind(&other)),
        }),
    }
}

fn decode_value<T: DeserializeOwned>(value: Value, file: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|source| DataLoadError::Json {
        file: file.to_string(),
        source,
    })
}

/// Years arrive as JSON numbers, sometimes floats (`1995.0`) and sometimes
/// null when the source had no date.
fn parse_year(year: Option<f64>) -> Result<Option<u16>> {
    match year {
        None => Ok(None),
        Some(y) if y.fract() == 0.0 && (0.0..=u16::MAX as f64).contains(&y) => Ok(Some(y as u16)),
        Some(y) => Err(DataLoadError::InvalidValue {
            field: "year".to_string(),
            value: y.to_string(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// Similarity matrix
// =============================================================================

/// Parse the similarity artifact at `path`, picking the format by extension
pub fn parse_similarity(path: &Path) -> Result<SimilarityMatrix> {
    let bytes = read_file(path)?;
    let file = file_label(path);
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        parse_similarity_json(&bytes, &file)
    } else {
        parse_similarity_bin(&bytes, &file)
    }
}

/// Parse a nested-array JSON matrix
pub fn parse_similarity_json(bytes: &[u8], file: &str) -> Result<SimilarityMatrix> {
    let rows: Vec<Vec<f32>> = serde_json::from_slice(bytes).map_err(|source| DataLoadError::Json {
        file: file.to_string(),
        source,
    })?;
    SimilarityMatrix::from_rows(rows)
}

/// Parse the binary matrix layout
pub fn parse_similarity_bin(bytes: &[u8], file: &str) -> Result<SimilarityMatrix> {
    if bytes.len() < HEADER_LEN {
        return Err(DataLoadError::Truncated {
            file: file.to_string(),
            expected: HEADER_LEN,
            found: bytes.len(),
        });
    }

    let (header, body) = bytes.split_at(HEADER_LEN);
    if &header[0..4] != SIMILARITY_MAGIC {
        return Err(DataLoadError::BadHeader {
            file: file.to_string(),
            reason: "missing SIMM magic".to_string(),
        });
    }

    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != SIMILARITY_VERSION {
        return Err(DataLoadError::BadHeader {
            file: file.to_string(),
            reason: format!("unsupported version {}", version),
        });
    }

    let mut size_bytes = [0u8; 8];
    size_bytes.copy_from_slice(&header[8..16]);
    let size = usize::try_from(u64::from_le_bytes(size_bytes)).map_err(|_| DataLoadError::BadHeader {
        file: file.to_string(),
        reason: "matrix size does not fit in memory".to_string(),
    })?;

    let expected = size
        .checked_mul(size)
        .and_then(|cells| cells.checked_mul(4))
        .ok_or_else(|| DataLoadError::BadHeader {
            file: file.to_string(),
            reason: format!("matrix size {} overflows", size),
        })?;
    if body.len() != expected {
        return Err(DataLoadError::Truncated {
            file: file.to_string(),
            expected: HEADER_LEN + expected,
            found: bytes.len(),
        });
    }

    let scores = body
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();
    SimilarityMatrix::from_flat(size, scores)
}

/// Encode a matrix in the binary layout read by `parse_similarity_bin`
pub fn encode_similarity_bin(matrix: &SimilarityMatrix) -> Vec<u8> {
    let scores = matrix.as_flat();
    let mut out = Vec::with_capacity(HEADER_LEN + scores.len() * 4);
    out.extend_from_slice(SIMILARITY_MAGIC);
    out.extend_from_slice(&SIMILARITY_VERSION.to_le_bytes());
    out.extend_from_slice(&(matrix.size() as u64).to_le_bytes());
    for score in scores {
        out.extend_from_slice(&score.to_le_bytes());
    }
    out
}

/// Write a matrix to `path` in the binary layout
pub fn write_similarity_bin(path: &Path, matrix: &SimilarityMatrix) -> Result<()> {
    fs::write(path, encode_similarity_bin(matrix))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog_columns() {
        let json = br#"{
            "movie_id": [19995, 285],
            "title": ["Avatar", "Pirates of the Caribbean: At World's End"],
            "year": [2009.0, null],
            "vote_average": [7.2, 6.9],
            "tags": ["ignored", "ignored"]
        }"#;
        let movies = parse_catalog_bytes(json, "movie_dict.json").unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].id, 19995);
        assert_eq!(movies[0].year, Some(2009));
        assert_eq!(movies[1].title, "Pirates of the Caribbean: At World's End");
        assert_eq!(movies[1].year, None);
        assert_eq!(movies[1].rating, 6.9);
    }

    #[test]
    fn test_parse_catalog_index_maps_keep_numeric_order() {
        let json = br#"{
            "id": {"0": 1, "1": 2, "10": 11, "2": 3},
            "title": {"0": "A", "1": "B", "10": "K", "2": "C"},
            "year": {"0": 2000, "1": 2001, "10": 2010, "2": 2002},
            "rating": {"0": 7.0, "1": 8.0, "10": 5.0, "2": 6.5}
        }"#;
        let movies = parse_catalog_bytes(json, "movie_dict.json").unwrap();
        let titles: Vec<&str> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C", "K"]);
    }

    #[test]
    fn test_parse_catalog_index_maps_must_share_keys() {
        let json = br#"{
            "id": {"0": 1, "1": 2},
            "title": {"0": "A", "2": "C"},
            "year": {"0": 2000, "1": 2001},
            "rating": {"0": 7.0, "1": 8.0}
        }"#;
        let err = parse_catalog_bytes(json, "movie_dict.json").unwrap_err();
        match err {
            DataLoadError::ColumnIndexMismatch { column, reference, .. } => {
                assert_eq!(column, "title");
                assert_eq!(reference, "movie_id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_catalog_array_and_index_map_columns_mix() {
        let json = br#"{
            "movie_id": [1, 2],
            "title": {"1": "B", "0": "A"},
            "year": [2000, null],
            "vote_average": {"0": 7.0, "1": 8.0}
        }"#;
        let movies = parse_catalog_bytes(json, "movie_dict.json").unwrap();
        assert_eq!(movies[0].title, "A");
        assert_eq!(movies[1].title, "B");

        // A map that skips row 1 does not line up with a plain array
        let json = br#"{
            "movie_id": [1, 2],
            "title": {"0": "A", "2": "C"},
            "year": [2000, null],
            "vote_average": [7.0, 8.0]
        }"#;
        assert!(matches!(
            parse_catalog_bytes(json, "movie_dict.json"),
            Err(DataLoadError::ColumnIndexMismatch { .. })
        ));
    }

    #[test]
    fn test_parse_catalog_keeps_full_rating_precision() {
        let json = br#"{
            "movie_id": [1, 2, 3],
            "title": ["A", "B", "C"],
            "year": [2000, 2001, 2002],
            "vote_average": [7.05, 6.65, 8.15]
        }"#;
        let movies = parse_catalog_bytes(json, "movie_dict.json").unwrap();
        let ratings: Vec<f64> = movies.iter().map(|m| m.rating).collect();
        assert_eq!(ratings, vec![7.05, 6.65, 8.15]);
        let captions: Vec<String> = ratings.iter().map(|r| format!("{:.1}", r)).collect();
        assert_eq!(captions, vec!["7.0", "6.7", "8.2"]);
    }

    #[test]
    fn test_parse_catalog_rows() {
        let json = br#"[
            {"movie_id": 1, "title": "A", "year": 2000, "vote_average": 7.0},
            {"id": 2, "title": "B", "year": null, "rating": 8.0},
            {"movie_id": 3, "title": "C", "vote_average": 6.5}
        ]"#;
        let movies = parse_catalog_bytes(json, "movies.json").unwrap();
        assert_eq!(movies.len(), 3);
        assert_eq!(movies[1].id, 2);
        assert_eq!(movies[1].year, None);
        assert_eq!(movies[2].year, None);
    }

    #[test]
    fn test_parse_catalog_missing_column() {
        let json = br#"{"movie_id": [1], "title": ["A"], "year": [2000]}"#;
        let err = parse_catalog_bytes(json, "movie_dict.json").unwrap_err();
        match err {
            DataLoadError::MissingColumn { column, .. } => assert_eq!(column, "vote_average"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_catalog_column_length_mismatch() {
        let json = br#"{
            "movie_id": [1, 2],
            "title": ["A"],
            "year": [2000, 2001],
            "vote_average": [7.0, 8.0]
        }"#;
        let err = parse_catalog_bytes(json, "movie_dict.json").unwrap_err();
        assert!(matches!(
            err,
            DataLoadError::ColumnLengthMismatch { expected: 2, found: 1, .. }
        ));
    }

    #[test]
    fn test_parse_year_rejects_fractional() {
        assert_eq!(parse_year(Some(1999.0)).unwrap(), Some(1999));
        assert_eq!(parse_year(None).unwrap(), None);
        assert!(parse_year(Some(1999.5)).is_err());
        assert!(parse_year(Some(-1.0)).is_err());
    }

    #[test]
    fn test_parse_catalog_rejects_scalar() {
        let err = parse_catalog_bytes(b"42", "movie_dict.json").unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidValue { .. }));
    }

    #[test]
    fn test_parse_similarity_json() {
        let matrix = parse_similarity_json(b"[[1.0, 0.5], [0.5, 1.0]]", "similarity.json").unwrap();
        assert_eq!(matrix.size(), 2);
        assert_eq!(matrix.get(1, 0), Some(0.5));
    }

    #[test]
    fn test_binary_matrix_round_trip() {
        let matrix = SimilarityMatrix::from_rows(vec![
            vec![1.0, 0.25, 0.0],
            vec![0.25, 1.0, 0.75],
            vec![0.0, 0.75, 1.0],
        ])
        .unwrap();
        let bytes = encode_similarity_bin(&matrix);
        assert_eq!(bytes.len(), 16 + 9 * 4);
        assert_eq!(parse_similarity_bin(&bytes, "similarity.bin").unwrap(), matrix);
    }

    #[test]
    fn test_binary_matrix_truncated() {
        let matrix = SimilarityMatrix::from_rows(vec![vec![1.0, 0.5], vec![0.5, 1.0]]).unwrap();
        let mut bytes = encode_similarity_bin(&matrix);
        bytes.truncate(bytes.len() - 2);
        let err = parse_similarity_bin(&bytes, "similarity.bin").unwrap_err();
        assert!(matches!(err, DataLoadError::Truncated { .. }));
    }

    #[test]
    fn test_binary_matrix_bad_magic() {
        let mut bytes = encode_similarity_bin(&SimilarityMatrix::default());
        bytes[0] = b'X';
        let err = parse_similarity_bin(&bytes, "similarity.bin").unwrap_err();
        assert!(matches!(err, DataLoadError::BadHeader { .. }));
    }
}
