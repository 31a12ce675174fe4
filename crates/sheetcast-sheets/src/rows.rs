//! Filtering of the raw fetched table into eligible [`Row`]s.

use sheetcast_types::Row;

/// Reduce a raw rectangular table to the rows worth posting.
///
/// The header (index 0) is always skipped. A data row qualifies only when
/// both column A (prompt) and column B (image URL) are present and non-empty.
/// `row_number` is the 1-based sheet coordinate: raw index + 2, accounting
/// for the header.
pub fn filter_rows(values: &[Vec<String>]) -> Vec<Row> {
    values
        .iter()
        .skip(1)
        .enumerate()
        .filter(|(_, row)| row.len() > 1 && !row[0].is_empty() && !row[1].is_empty())
        .map(|(idx, row)| Row {
            row_number: (idx + 2) as u32,
            prompt: row[0].clone(),
            image_url: row[1].clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn skips_header_and_blank_cells() {
        let values = table(&[
            &["p", "u"],
            &["desc1", "http://a"],
            &["", "http://b"],
            &["desc3", "http://c"],
        ]);
        let rows = filter_rows(&values);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].prompt, "desc1");
        assert_eq!(rows[0].image_url, "http://a");
        assert_eq!(rows[1].row_number, 4);
        assert_eq!(rows[1].prompt, "desc3");
        assert_eq!(rows[1].image_url, "http://c");
    }

    #[test]
    fn row_numbers_offset_by_two_from_raw_index() {
        let values = table(&[&["header", "header"], &["a", "b"], &["c", "d"]]);
        let rows = filter_rows(&values);
        assert_eq!(
            rows.iter().map(|r| r.row_number).collect::<Vec<_>>(),
            vec![2, 3]
        );
    }

    #[test]
    fn short_rows_are_excluded() {
        // A row with only column A populated arrives as a one-element vec.
        let values = table(&[&["p", "u"], &["only prompt"], &["ok", "http://x"]]);
        let rows = filter_rows(&values);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, 3);
    }

    #[test]
    fn missing_image_url_is_excluded() {
        let values = table(&[&["p", "u"], &["desc", ""]]);
        assert!(filter_rows(&values).is_empty());
    }

    #[test]
    fn empty_and_header_only_tables_yield_nothing() {
        assert!(filter_rows(&[]).is_empty());
        assert!(filter_rows(&table(&[&["p", "u"]])).is_empty());
    }

    #[test]
    fn extra_columns_are_ignored() {
        let values = table(&[&["p", "u", "x"], &["desc", "http://a", "posted", "extra"]]);
        let rows = filter_rows(&values);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].prompt, "desc");
        assert_eq!(rows[0].image_url, "http://a");
    }
}
