/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Splits a plain decimal string such as `"12.345"` into its whole part and the first `scale` fractional digits.
/// Any further digits are returned as a flag indicating whether the truncated remainder was at least one half.
///
/// Returns `None` if the string is not a plain, non-negative decimal number.
pub fn split_decimal(value: &str, scale: u32) -> Option<(i64, i64, bool)> {
    let value = value.trim().replace(',', "");
    if value.is_empty() {
        return None;
    }
    let mut parts = value.splitn(2, '.');
    let whole = parts.next().unwrap_or_default();
    let frac = parts.next().unwrap_or_default();
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let whole = if whole.is_empty() { 0 } else { whole.parse::<i64>().ok()? };
    let scale = scale as usize;
    let (kept, rest) = if frac.len() > scale { frac.split_at(scale) } else { (frac, "") };
    let kept = format!("{kept:0<scale$}");
    let kept = if kept.is_empty() { 0 } else { kept.parse::<i64>().ok()? };
    let round_up = rest.chars().next().map(|c| c >= '5').unwrap_or(false);
    Some((whole, kept, round_up))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boolean_flags() {
        assert!(parse_boolean_flag(Some("Yes".into()), false));
        assert!(!parse_boolean_flag(Some(" off ".into()), true));
        assert!(parse_boolean_flag(Some("maybe".into()), true));
        assert!(!parse_boolean_flag(None, false));
    }

    #[test]
    fn decimals() {
        assert_eq!(split_decimal("100000", 0), Some((100_000, 0, false)));
        assert_eq!(split_decimal("12.5", 2), Some((12, 50, false)));
        assert_eq!(split_decimal("12.345", 2), Some((12, 34, true)));
        assert_eq!(split_decimal("1,250.4", 0), Some((1250, 0, false)));
        assert_eq!(split_decimal(".75", 2), Some((0, 75, false)));
        assert_eq!(split_decimal("-3", 0), None);
        assert_eq!(split_decimal("abc", 0), None);
        assert_eq!(split_decimal("", 0), None);
    }
}
