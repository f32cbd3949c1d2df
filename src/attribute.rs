//! Typed reads of string attributes.
//!
//! Project files store every setting as a string.  A value that does not
//! parse falls back to the setting's default, and the reason is kept next
//! to the value so a view can show it instead of the read failing.

use std::fmt::Display;
use std::str::FromStr;

/// A typed attribute value plus the diagnostic produced if the raw string
/// could not be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub value: T,
    pub diagnostic: Option<String>,
}

impl<T> Parsed<T> {
    pub fn clean(value: T) -> Self {
        Self { value, diagnostic: None }
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostic.is_none()
    }
}

/// Parse `raw` with `parse`, or use `default` when it is absent or invalid.
pub fn parse_or_default<T, E, F>(name: &str, raw: Option<&str>, default: T, parse: F) -> Parsed<T>
where
    F: FnOnce(&str) -> Result<T, E>,
    E: Display,
{
    match raw {
        None => Parsed::clean(default),
        Some(text) => match parse(text) {
            Ok(value) => Parsed::clean(value),
            Err(e) => Parsed {
                value: default,
                diagnostic: Some(format!("invalid {name} '{text}': {e}")),
            },
        },
    }
}

/// [`parse_or_default`] using the type's [`FromStr`] implementation.
pub fn parse_enum_or_default<T>(name: &str, raw: Option<&str>, default: T) -> Parsed<T>
where
    T: FromStr,
    T::Err: Display,
{
    parse_or_default(name, raw, default, str::parse)
}

/// `true` / `false`, ignoring case and surrounding whitespace.
pub fn parse_bool(text: &str) -> Result<bool, String> {
    match text.trim() {
        t if t.eq_ignore_ascii_case("true") => Ok(true),
        t if t.eq_ignore_ascii_case("false") => Ok(false),
        _ => Err("expected 'true' or 'false'".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_value_is_clean_default() {
        let parsed = parse_or_default("autoconfig", None, false, parse_bool);
        assert_eq!(parsed, Parsed::clean(false));
    }

    #[test]
    fn bool_parsing_is_case_insensitive() {
        assert_eq!(parse_or_default("autoconfig", Some("True"), false, parse_bool).value, true);
        assert_eq!(parse_or_default("autoconfig", Some(" FALSE "), true, parse_bool).value, false);
    }

    #[test]
    fn invalid_value_falls_back_with_diagnostic() {
        let parsed = parse_or_default("autoconfig", Some("maybe"), false, parse_bool);
        assert!(!parsed.value);
        assert!(!parsed.is_clean());
        assert!(parsed.diagnostic.unwrap().contains("maybe"));
    }

    #[test]
    fn enum_parsing_uses_from_str() {
        let parsed: Parsed<u8> = parse_enum_or_default("count", Some("12"), 0);
        assert_eq!(parsed.value, 12);
        let parsed: Parsed<u8> = parse_enum_or_default("count", Some("twelve"), 3);
        assert_eq!(parsed.value, 3);
        assert!(parsed.diagnostic.is_some());
    }
}
