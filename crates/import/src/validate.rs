use crate::error::ImportError;
use crate::text::parse_yen;

/// The portal's footer summary marker. Pasted ranges must stop above it.
pub const TOTAL_MARKER: &str = "合計";

/// Checks that the batch opens with one of the expected section markers
/// and returns the matched marker, which fixes the income/expense kind
/// for the rest of the batch.
pub fn validate_section_header<'a>(
    lines: &'a [String],
    expected: &[&str],
) -> Result<&'a str, ImportError> {
    let actual = lines.first().map(String::as_str).unwrap_or("");
    if expected.contains(&actual) {
        Ok(actual)
    } else {
        Err(ImportError::HeaderMismatch {
            expected: expected.iter().map(|s| s.to_string()).collect(),
            actual: actual.to_string(),
        })
    }
}

/// A 合計 row anywhere in the range would double-count on import.
pub fn validate_no_total_row(lines: &[String]) -> Result<(), ImportError> {
    match lines.iter().find(|line| line.as_str() == TOTAL_MARKER) {
        Some(line) => Err(ImportError::UnexpectedTotalRow(line.clone())),
        None => Ok(()),
    }
}

/// The portal prints a block of column-header lines between the section
/// marker and the first record. Skips to the first line naming a himoku
/// of the expected class and returns the remainder; doubles as the guard
/// against pasting the wrong account's report, since a batch where no
/// line mentions any himoku of the class cannot belong to it.
pub fn skip_header_block<'a>(
    lines: &'a [String],
    vocabulary: &[String],
    class_name: &str,
) -> Result<&'a [String], ImportError> {
    if lines.is_empty() {
        return Ok(lines);
    }
    lines
        .iter()
        .position(|line| vocabulary.iter().any(|word| line.contains(word.as_str())))
        .map(|start| &lines[start..])
        .ok_or_else(|| ImportError::AccountingClassMismatch {
            class_name: class_name.to_string(),
        })
}

/// The first record's amount column must parse as yen. If it does not,
/// a column-header row slipped into the paste and every following group
/// is misaligned.
pub fn validate_numeric_column(
    records: &[Vec<String>],
    column: usize,
) -> Result<(), ImportError> {
    let Some(first) = records.first() else {
        return Ok(());
    };
    let field = first
        .get(column)
        .ok_or(ImportError::ShortRecord { expected: column + 1, actual: first.len() })?;
    parse_yen(field).map_err(|_| ImportError::NonNumericAmount(field.clone()))?;
    Ok(())
}
