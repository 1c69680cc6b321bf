// Parsing and small numeric helpers.
//
// Everything that deals with dirty CSV text lives here so the loaders can
// hand clean, typed values to the scoring code.
use num_format::{Locale, ToFormattedString};

/// Parse a CSV cell into `f64`, tolerating thousands separators and
/// surrounding whitespace.
///
/// Returns `None` for blanks, text, and non-finite results.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    let v = s.replace(',', "").parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

/// Numeric input that must be present and non-negative: blanks, junk and
/// negatives all become zero.
pub fn parse_amount(s: Option<&str>) -> f64 {
    match parse_f64_safe(s) {
        Some(v) if v > 0.0 => v,
        _ => 0.0,
    }
}

/// Trimmed text, or `None` when blank.
pub fn clean_text(s: Option<String>) -> Option<String> {
    let s = s?.trim().to_string();
    (!s.is_empty()).then_some(s)
}

pub fn mean(v: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, n) = v.into_iter().fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    (n > 0).then(|| sum / n as f64)
}

/// Fixed decimals with `en` thousands separators, e.g. `1,234,567.89`.
pub fn format_number(n: f64, decimals: usize) -> String {
    let fixed = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let int_val: u64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    // Avoid "-0.00" for tiny negatives that round to zero.
    if n.is_sign_negative() && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

/// Amount expressed in billions, the unit the exposure KPI is read in.
pub fn format_billions(n: f64) -> String {
    format!("Rp {} M", format_number(n / 1e9, 1))
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
