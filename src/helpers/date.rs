//! Date helper functions

use chrono::{DateTime, Datelike, TimeZone};
use chrono_tz::Tz;

use crate::content::PublicationDate;
use crate::i18n::I18n;

/// Tokens understood in Moment.js / date-fns style format strings, longest first
const TOKENS: &[(&str, Token)] = &[
    ("YYYY", Token::Chrono("%Y")),
    ("yyyy", Token::Chrono("%Y")),
    ("MMMM", Token::MonthLong),
    ("MMM", Token::MonthShort),
    ("DDDD", Token::Chrono("%j")),
    ("dddd", Token::Chrono("%A")),
    ("ddd", Token::Chrono("%a")),
    ("SSS", Token::Chrono("%3f")),
    ("YY", Token::Chrono("%y")),
    ("yy", Token::Chrono("%y")),
    ("MM", Token::Chrono("%m")),
    ("DD", Token::Chrono("%d")),
    ("dd", Token::Chrono("%d")),
    ("HH", Token::Chrono("%H")),
    ("hh", Token::Chrono("%I")),
    ("mm", Token::Chrono("%M")),
    ("ss", Token::Chrono("%S")),
    ("ZZ", Token::Chrono("%z")),
];

#[derive(Debug, Clone, Copy)]
enum Token {
    Chrono(&'static str),
    MonthShort,
    MonthLong,
}

/// Format a date with a Moment.js-compatible format string and localized month names
///
/// Text inside `[...]` is emitted literally.
///
/// # Examples
/// ```ignore
/// format_date(&date, "DD MMM YYYY", &I18n::new("pt-BR")) // -> "19 Abr 2021"
/// ```
pub fn format_date<Tz2: TimeZone>(date: &DateTime<Tz2>, format: &str, i18n: &I18n) -> String
where
    Tz2::Offset: std::fmt::Display,
{
    let mut out = String::with_capacity(format.len() + 8);
    let mut rest = format;

    'outer: while !rest.is_empty() {
        if let Some(stripped) = rest.strip_prefix('[') {
            if let Some(end) = stripped.find(']') {
                out.push_str(&stripped[..end]);
                rest = &stripped[end + 1..];
                continue;
            }
        }

        for (pattern, token) in TOKENS {
            if let Some(stripped) = rest.strip_prefix(*pattern) {
                match token {
                    Token::Chrono(spec) => out.push_str(&date.format(spec).to_string()),
                    Token::MonthShort => out.push_str(&i18n.month_short(date.month())),
                    Token::MonthLong => out.push_str(&i18n.month_long(date.month())),
                }
                rest = stripped;
                continue 'outer;
            }
        }

        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}

/// Format a publication date for display
///
/// The raw timestamp is parsed and converted to `tz` on every call, so the
/// stored value is never replaced by its display form. Missing dates render
/// empty; unparseable ones render verbatim.
pub fn format_publication_date(
    date: Option<&PublicationDate>,
    format: &str,
    tz: Tz,
    i18n: &I18n,
) -> String {
    let Some(date) = date else {
        return String::new();
    };

    match date.parse() {
        Some(parsed) => format_date(&parsed.with_timezone(&tz), format, i18n),
        None => {
            tracing::warn!("Unparseable publication date: {}", date);
            date.as_str().to_string()
        }
    }
}

/// Parse an IANA timezone name, falling back to UTC
pub fn parse_timezone(name: &str) -> Tz {
    if name.is_empty() {
        return Tz::UTC;
    }
    name.parse().unwrap_or_else(|_| {
        tracing::warn!("Unknown timezone {:?}, using UTC", name);
        Tz::UTC
    })
}
