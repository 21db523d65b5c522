//! Date helper functions

use chrono::{DateTime, Locale, Utc};
use chrono_tz::Tz;

/// Listing and detail header format, e.g. "15 mar 2021"
pub const SHORT_DATE: &str = "DD MMM YYYY";

/// "Load more" format, e.g. "15 de março de 2021"
pub const LONG_DATE: &str = "DD [de] MMMM [de] YYYY";

/// Format a UTC instant in the given timezone with localized month names
pub fn format_date_localized(date: &DateTime<Utc>, format: &str, locale: Locale, tz: Tz) -> String {
    let chrono_format = moment_to_chrono_format(format);
    date.with_timezone(&tz)
        .format_localized(&chrono_format, locale)
        .to_string()
}

/// Parse an ISO 8601 timestamp as returned by the content API
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .or_else(|| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z").ok())
        .map(|d| d.with_timezone(&Utc))
}

/// Map a BCP 47 language tag onto a chrono locale
pub fn locale_for(language: &str) -> Locale {
    match language.replace('-', "_").as_str() {
        "pt_BR" | "pt" => Locale::pt_BR,
        "pt_PT" => Locale::pt_PT,
        "en" | "en_US" => Locale::en_US,
        "en_GB" => Locale::en_GB,
        "es" | "es_ES" => Locale::es_ES,
        "fr" | "fr_FR" => Locale::fr_FR,
        "de" | "de_DE" => Locale::de_DE,
        _ => Locale::POSIX,
    }
}

/// Convert Moment.js format to chrono format
///
/// Text inside `[...]` is copied literally.
fn moment_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each family
    const TOKENS: [(&str, &str); 16] = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("SSS", "%3f"),
        ("ZZ", "%z"),
        ("A", "%p"),
    ];

    let mut result = String::with_capacity(format.len() * 2);
    let mut rest = format;

    'outer: while let Some(c) = rest.chars().next() {
        if c == '[' {
            match rest.find(']') {
                Some(end) => {
                    result.push_str(&rest[1..end].replace('%', "%%"));
                    rest = &rest[end + 1..];
                    continue;
                }
                None => {
                    result.push_str(&rest[1..].replace('%', "%%"));
                    break;
                }
            }
        }

        for (from, to) in TOKENS {
            if let Some(stripped) = rest.strip_prefix(from) {
                result.push_str(to);
                rest = stripped;
                continue 'outer;
            }
        }

        if c == '%' {
            result.push_str("%%");
        } else {
            result.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }

    result
}
