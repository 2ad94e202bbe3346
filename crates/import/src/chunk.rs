use crate::error::ImportError;
use crate::text::clean_amount_token;

/// Partitions lines into consecutive records of exactly `width` fields,
/// each field run through `clean_amount_token`. A trailing partial group
/// is discarded silently, since a copy-paste often ends mid-record and the
/// user re-pastes the remainder.
pub fn chunk_fixed(lines: &[String], width: usize) -> Vec<Vec<String>> {
    lines
        .chunks_exact(width)
        .map(|chunk| chunk.iter().map(|field| clean_amount_token(field)).collect())
        .collect()
}

/// Splits lines at sentinel tokens (e.g. お預入れ / お引出し). Each record
/// carries its sentinel followed by every line up to the next sentinel,
/// in original order. The first line must itself be a sentinel; a stray
/// navigation label there means the wrong range was pasted.
pub fn chunk_by_sentinel(
    lines: &[String],
    sentinels: &[&str],
) -> Result<Vec<Vec<String>>, ImportError> {
    let Some(first) = lines.first() else {
        return Ok(Vec::new());
    };
    if !sentinels.contains(&first.as_str()) {
        return Err(ImportError::MalformedInput(first.clone()));
    }

    let mut records = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for line in lines {
        if sentinels.contains(&line.as_str()) {
            if !current.is_empty() {
                records.push(current);
            }
            current = vec![line.clone()];
        } else {
            current.push(clean_amount_token(line));
        }
    }
    records.push(current);
    Ok(records)
}
