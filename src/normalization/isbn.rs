//! Identifier normalization for catalog join keys.
//!
//! Source spreadsheets carry a mix of real ISBNs, accession numbers and
//! classification codes in one column. Everything is left-padded to ISBN-10
//! width first; only tokens that actually look like an ISBN-10 get converted
//! to the 13-digit form. The scrape side and the merge side must run the
//! same function or the (batch, identifier) join breaks.

use anyhow::{bail, Result};

/// Left-pad with `'0'` to ISBN-10 width. Longer inputs pass through.
pub fn pad_to_10(raw: &str) -> String {
    let len = raw.chars().count();
    if len >= 10 {
        return raw.to_string();
    }
    let mut out = String::with_capacity(10);
    for _ in len..10 {
        out.push('0');
    }
    out.push_str(raw);
    out
}

/// Convert a 10-character ISBN to its EAN-13 form.
///
/// Only the shape is validated (nine digits plus a digit-or-X check
/// character); the ISBN-10 check digit itself is not, matching the
/// permissive converter the catalog has always relied on. Accession numbers
/// and classification codes fail here and are kept as-is by [`normalize`].
pub fn convert_10_to_13(isbn10: &str) -> Result<String> {
    let chars: Vec<char> = isbn10.chars().collect();
    if chars.len() != 10 {
        bail!("ISBN must be 10 characters, got {}", chars.len());
    }
    if !chars[..9].iter().all(|c| c.is_ascii_digit()) {
        bail!("ISBN body contains non-digit characters");
    }
    let last = chars[9];
    if !(last.is_ascii_digit() || last == 'X' || last == 'x') {
        bail!("ISBN check character must be a digit or X");
    }

    let mut out = String::with_capacity(13);
    out.push_str("978");
    for c in &chars[..9] {
        out.push(*c);
    }
    let check = ean13_check_digit(&out);
    out.push(char::from_digit(check, 10).unwrap_or('0'));
    Ok(out)
}

/// EAN-13 check digit over the first 12 digits (alternating 1/3 weights).
fn ean13_check_digit(digits12: &str) -> u32 {
    let sum: u32 = digits12
        .chars()
        .take(12)
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(i, d)| if i % 2 == 0 { d } else { d * 3 })
        .sum();
    (10 - sum % 10) % 10
}

/// Join-key normalization: pad to 10, then convert when the token is a
/// plausible ISBN-10. Conversion failure is silently absorbed and the
/// padded form kept.
pub fn normalize(raw: &str) -> String {
    let padded = pad_to_10(raw);
    if padded.chars().count() == 10 {
        convert_10_to_13(&padded).unwrap_or(padded)
    } else {
        padded
    }
}
