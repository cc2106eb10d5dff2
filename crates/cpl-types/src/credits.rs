/// Coerce a credit amount the way the ledger has always stored it.
///
/// Leading whitespace and one optional sign are accepted, followed by the
/// longest run of ASCII digits; anything after the digits is ignored
/// (`"12abc"` yields `12`). Returns `None` when no digits are present or the
/// value does not fit in an `i64`. Only base 10 is recognised.
pub fn parse_credits(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
