use crate::error::ImportError;

/// Splits pasted portal text into trimmed, non-empty lines. Order is
/// preserved; nothing else is touched.
pub fn clean_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Strips the currency glyph, the 円 suffix, and thousands separators
/// (ASCII and full-width) from an amount token. Idempotent: the output
/// contains none of the stripped characters.
pub fn clean_amount_token(s: &str) -> String {
    s.trim()
        .chars()
        .filter(|c| !matches!(c, '¥' | '￥' | '円' | ',' | '，'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Parses a portal amount into signed yen. The portal prints negatives
/// with a leading △ (occasionally a plain minus).
pub fn parse_yen(s: &str) -> Result<i64, ImportError> {
    let cleaned = clean_amount_token(s);
    let (negative, digits) = match cleaned.strip_prefix('△').or_else(|| cleaned.strip_prefix('-')) {
        Some(rest) => (true, rest),
        None => (false, cleaned.as_str()),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ImportError::InvalidAmount(s.to_string()));
    }
    let value: i64 = digits
        .parse()
        .map_err(|_| ImportError::InvalidAmount(s.to_string()))?;
    Ok(if negative { -value } else { value })
}
