//! Row-level helpers over polars frames.

use std::collections::HashSet;

use polars::prelude::{AnyValue, BooleanChunked, DataFrame, NewChunkedArray, PolarsResult};

/// Renders a cell for display or comparison; nulls become empty strings.
pub fn any_to_string(value: AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Value of column `name` at row `idx`, or an empty string.
pub fn column_value_string(df: &DataFrame, name: &str, idx: usize) -> String {
    match df.column(name) {
        Ok(column) => any_to_string(column.get(idx).unwrap_or(AnyValue::Null)),
        Err(_) => String::new(),
    }
}

/// Keeps the first occurrence of every distinct row, in input order.
///
/// Null and empty string cells are distinct values.
pub fn distinct_rows(df: &DataFrame) -> PolarsResult<DataFrame> {
    let row_count = df.height();
    if row_count < 2 {
        return Ok(df.clone());
    }
    let columns = df.get_columns();
    let mut seen = HashSet::with_capacity(row_count);
    let mut keep = Vec::with_capacity(row_count);
    for idx in 0..row_count {
        let mut key = String::new();
        for column in columns {
            match column.get(idx)? {
                AnyValue::Null => key.push('\u{0}'),
                value => key.push_str(&any_to_string(value)),
            }
            key.push('\u{1f}');
        }
        keep.push(seen.insert(key));
    }
    if keep.iter().all(|kept| *kept) {
        return Ok(df.clone());
    }
    let mask = BooleanChunked::from_slice("distinct".into(), &keep);
    df.filter(&mask)
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;

    #[test]
    fn distinct_rows_keeps_first_occurrences() {
        let df = df!(
            "A" => ["1", "1", "2", "1"],
            "B" => [Some("x"), Some("x"), None, Some("y")]
        )
        .unwrap();
        let distinct = distinct_rows(&df).unwrap();
        assert_eq!(distinct.height(), 3);
        assert_eq!(column_value_string(&distinct, "B", 2), "y");
    }

    #[test]
    fn null_and_empty_are_different_rows() {
        let df = df!("A" => [Some(""), None]).unwrap();
        assert_eq!(distinct_rows(&df).unwrap().height(), 2);
    }

    #[test]
    fn missing_column_reads_as_empty() {
        let df = df!("A" => ["1"]).unwrap();
        assert_eq!(column_value_string(&df, "B", 0), "");
        assert_eq!(column_value_string(&df, "A", 0), "1");
    }
}
