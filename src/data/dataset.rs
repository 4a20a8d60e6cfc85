// std imports
use std::path::Path;

// 3rd party imports
use polars::prelude::*;
use tracing::{debug, error};

// internal imports
use crate::errors::data_error::DataError;

/// Reads a CSV file with header into a data frame
///
/// # Arguments
/// * `path` - Path to the CSV file
///
pub fn read_csv(path: &Path) -> Result<DataFrame, DataError> {
    let path_str = path.display().to_string();
    let df = CsvReader::from_path(path)
        .and_then(|reader| reader.has_header(true).finish())
        .map_err(|err| {
            error!("Unable to read `{}`: {}", path_str, err);
            DataError::CsvReadError(path_str.clone(), err)
        })?;
    debug!("Read {} rows from `{}`", df.height(), path_str);
    Ok(df)
}

/// Returns the column or `DataError::ColumnNotFound`
///
fn get_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Series, DataError> {
    if !df.get_column_names().contains(&name) {
        error!("Column `{}` not found", name);
        return Err(DataError::ColumnNotFound(name.to_string()));
    }
    Ok(df.column(name)?)
}

/// `true` if the column holds integers or floats
///
/// # Arguments
/// * `df` - Data frame
/// * `name` - Column name
///
pub fn is_numeric_column(df: &DataFrame, name: &str) -> Result<bool, DataError> {
    Ok(get_column(df, name)?.dtype().is_numeric())
}

/// Numeric values of a column as `f64`, values which are null or
/// can not be cast are dropped.
///
/// # Arguments
/// * `df` - Data frame
/// * `name` - Column name
///
pub fn column_as_f64(df: &DataFrame, name: &str) -> Result<Vec<f64>, DataError> {
    let series = get_column(df, name)?.cast(&DataType::Float64)?;
    Ok(series.f64()?.into_iter().flatten().collect())
}

/// Numeric values of two columns, rows where either value is missing are dropped.
///
/// # Arguments
/// * `df` - Data frame
/// * `x` - First column name
/// * `y` - Second column name
///
pub fn paired_columns(
    df: &DataFrame,
    x: &str,
    y: &str,
) -> Result<(Vec<f64>, Vec<f64>), DataError> {
    let x_series = get_column(df, x)?.cast(&DataType::Float64)?;
    let y_series = get_column(df, y)?.cast(&DataType::Float64)?;
    let pairs: Vec<(f64, f64)> = x_series
        .f64()?
        .into_iter()
        .zip(y_series.f64()?.into_iter())
        .filter_map(|pair| match pair {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        })
        .collect();
    Ok(pairs.into_iter().unzip())
}

/// Values of a column as strings, nulls are dropped.
///
/// # Arguments
/// * `df` - Data frame
/// * `name` - Column name
///
pub fn column_as_str(df: &DataFrame, name: &str) -> Result<Vec<String>, DataError> {
    let series = get_column(df, name)?.cast(&DataType::Utf8)?;
    Ok(series
        .utf8()?
        .into_iter()
        .flatten()
        .map(|value| value.to_string())
        .collect())
}

/// Values of two categorical columns, rows where either value is missing are dropped.
///
/// # Arguments
/// * `df` - Data frame
/// * `a` - First column name
/// * `b` - Second column name
///
pub fn paired_str_columns(
    df: &DataFrame,
    a: &str,
    b: &str,
) -> Result<Vec<(String, String)>, DataError> {
    let a_series = get_column(df, a)?.cast(&DataType::Utf8)?;
    let b_series = get_column(df, b)?.cast(&DataType::Utf8)?;
    let pairs = a_series
        .utf8()?
        .into_iter()
        .zip(b_series.utf8()?.into_iter())
        .filter_map(|pair| match pair {
            (Some(a), Some(b)) => Some((a.to_string(), b.to_string())),
            _ => None,
        })
        .collect();
    Ok(pairs)
}

/// Values of the numeric column `value` for each level of the categorical column `group`,
/// levels are sorted lexically.
///
/// # Arguments
/// * `df` - Data frame
/// * `value` - Numeric column
/// * `group` - Categorical column
///
pub fn grouped_column(
    df: &DataFrame,
    value: &str,
    group: &str,
) -> Result<Vec<(String, Vec<f64>)>, DataError> {
    let values = get_column(df, value)?.cast(&DataType::Float64)?;
    let groups = get_column(df, group)?.cast(&DataType::Utf8)?;
    let mut grouped: std::collections::BTreeMap<String, Vec<f64>> = Default::default();
    for (value, group) in values.f64()?.into_iter().zip(groups.utf8()?.into_iter()) {
        if let (Some(value), Some(group)) = (value, group) {
            grouped.entry(group.to_string()).or_default().push(value);
        }
    }
    Ok(grouped.into_iter().collect())
}

#[cfg(test)]
mod test {
    use super::*;

    const DATASET: &str = "test_files/dataset.csv";

    #[test]
    fn test_read_dataset() {
        let df = read_csv(Path::new(DATASET)).unwrap();
        assert_eq!(df.height(), 120);
        assert_eq!(column_as_f64(&df, "Age").unwrap().len(), 120);
        assert!(is_numeric_column(&df, "Score").unwrap());
        assert!(!is_numeric_column(&df, "Gender").unwrap());
        let gender = column_as_str(&df, "Gender").unwrap();
        assert!(gender.iter().all(|g| g == "Female" || g == "Male"));
    }

    #[test]
    fn test_missing_file_and_column() {
        assert!(matches!(
            read_csv(Path::new("test_files/does_not_exist.csv")),
            Err(DataError::CsvReadError(_, _))
        ));
        let df = read_csv(Path::new(DATASET)).unwrap();
        assert!(matches!(
            column_as_f64(&df, "Height"),
            Err(DataError::ColumnNotFound(name)) if name == "Height"
        ));
    }

    #[test]
    fn test_paired_columns_drop_nulls() {
        let df = df!(
            "x" => &[Some(1.0), None, Some(3.0), Some(4.0)],
            "y" => &[Some(2.0), Some(3.0), None, Some(8.0)]
        )
        .unwrap();
        let (x, y) = paired_columns(&df, "x", "y").unwrap();
        assert_eq!(x, vec![1.0, 4.0]);
        assert_eq!(y, vec![2.0, 8.0]);
    }

    #[test]
    fn test_grouped_column() {
        let df = df!(
            "score" => &[1.0, 2.0, 3.0, 4.0],
            "group" => &["b", "a", "b", "a"]
        )
        .unwrap();
        let grouped = grouped_column(&df, "score", "group").unwrap();
        assert_eq!(grouped[0], ("a".to_string(), vec![2.0, 4.0]));
        assert_eq!(grouped[1], ("b".to_string(), vec![1.0, 3.0]));
    }
}
