//! Output filename derivation for a finished conversion.
//!
//! Precedence, first hit wins:
//!
//! 1. The response's `Content-Disposition` filename. An RFC 5987
//!    `filename*=UTF-8''…` token wins when it decodes (RFC 6266 §4.3: servers
//!    such as Werkzeug pair it with an ASCII-folded `filename=` fallback).
//!    Otherwise the plain `filename=` token, quoted or bare, quote characters
//!    stripped.
//! 2. The attached file's name with its last extension replaced by `.pdf`.
//! 3. The configured default, `document.pdf` out of the box.
//!
//! A header that is present but yields nothing usable is not an error; the
//! derivation quietly moves on to rule 2.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

/// Fallback name when neither the server nor the attached file suggests one.
pub const DEFAULT_FILENAME: &str = "document.pdf";

static RE_FILENAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\s*=\s*("[^"]*"|'[^']*'|[^;\n]*)"#).unwrap()
});

static RE_FILENAME_EXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|;)\s*filename\*\s*=\s*([^;\n]*)"#).unwrap()
});

/// Pull the suggested filename out of a `Content-Disposition` value.
///
/// Returns `None` when there is no filename token or it is empty after
/// stripping quotes and whitespace.
pub fn parse_content_disposition(header: &str) -> Option<String> {
    if let Some(name) = RE_FILENAME_EXT
        .captures(header)
        .and_then(|caps| decode_ext_value(&caps[1]))
    {
        return Some(name);
    }

    let caps = RE_FILENAME.captures(header)?;
    let name = strip_quotes(&caps[1]);
    (!name.is_empty()).then_some(name)
}

/// Decode an RFC 5987 `charset'lang'percent-encoded` value.
fn decode_ext_value(raw: &str) -> Option<String> {
    let raw = raw.trim().trim_matches('"');
    let encoded = match raw.splitn(3, '\'').collect::<Vec<_>>().as_slice() {
        [_charset, _lang, value] => *value,
        _ => raw,
    };
    let decoded = urlencoding::decode(encoded).ok()?.trim().to_string();
    (!decoded.is_empty()).then_some(decoded)
}

fn strip_quotes(raw: &str) -> String {
    raw.trim().replace(['"', '\''], "").trim().to_string()
}

/// Replace the last extension of `name` with `.pdf`.
///
/// `notes.md` → `notes.pdf`, `README` → `README.pdf`,
/// `archive.tar.gz` → `archive.tar.pdf`. A trailing dot with nothing after it
/// is not an extension.
pub fn with_pdf_extension(name: &str) -> String {
    let stem = match name.rfind('.') {
        Some(dot) if dot + 1 < name.len() && !name[dot + 1..].contains('/') => &name[..dot],
        _ => name,
    };
    format!("{stem}.pdf")
}

/// Pick the download filename for a finished conversion.
pub fn derive_filename(
    content_disposition: Option<&str>,
    attached_name: Option<&str>,
    default_name: &str,
) -> String {
    if let Some(name) = content_disposition.and_then(parse_content_disposition) {
        debug!("Filename from Content-Disposition: {}", name);
        return name;
    }
    if let Some(attached) = attached_name {
        let name = with_pdf_extension(attached);
        debug!("Filename from attached file: {}", name);
        return name;
    }
    default_name.to_string()
}
