//! Header and cookie lookup over raw header lines.
//!
//! Headers are kept exactly as the client sent them, one `Name: value` line
//! per entry, in arrival order. Lookups scan that list; names compare
//! case-insensitively, cookie names case-sensitively.

/// Find the value of the first header named `name`.
///
/// The line must have the exact form `Name: value` (colon, then one space).
/// The value is everything after the first space on the line.
pub fn get_header_value<'a>(headers: &'a [String], name: &str) -> Option<&'a str> {
    headers.iter().find_map(|line| {
        let matches = line
            .get(..name.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(name))
            && line[name.len()..].starts_with(": ");

        if matches {
            line.split_once(' ').map(|(_, value)| value)
        } else {
            None
        }
    })
}

/// Split a `Cookie` header value into `(name, value)` pairs.
///
/// Pairs are separated by exactly `"; "`. A segment without `=` is an
/// unnamed value and is returned under the empty name.
pub fn parse_cookies(value: &str) -> Vec<(&str, &str)> {
    value
        .split("; ")
        .map(|segment| match segment.split_once('=') {
            Some((name, value)) => (name.trim_end(), value.trim_start()),
            None => ("", segment.trim_start()),
        })
        .collect()
}

/// Find the value of the first cookie called `name` in the `Cookie` header.
pub fn get_cookie<'a>(headers: &'a [String], name: &str) -> Option<&'a str> {
    let cookies = get_header_value(headers, "Cookie")?;
    parse_cookies(cookies)
        .into_iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
