//! Sanitization of user-supplied names into valid C/C++ identifiers.

use once_cell::sync::Lazy;
use regex::Regex;

static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Whether `input` is already a valid C/C++ identifier.
pub fn is_valid_identifier(input: &str) -> bool {
    IDENTIFIER_RE.is_match(input)
}

/// Turn `input` into a valid identifier.
///
/// Invalid characters are replaced with `_` rather than stripped, so two
/// distinct inputs cannot collapse into the same identifier by dropping
/// characters (`a.b` and `ab` stay distinct as `a_b` and `ab`). A leading
/// digit gets a `_` prefix; an empty input becomes `_`.
pub fn make_valid_identifier(input: &str) -> String {
    if is_valid_identifier(input) {
        return input.to_string();
    }

    let mut out: String = input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    match out.chars().next() {
        None => out.push('_'),
        Some(c) if c.is_ascii_digit() => out.insert(0, '_'),
        Some(_) => {}
    }
    out
}
