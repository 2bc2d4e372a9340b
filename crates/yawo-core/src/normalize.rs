//! Rewriting of the malformed status file some YARG builds produce.
//!
//! Those builds write the song document as a quoted string in which every
//! JSON quote is spelled `\q`, e.g. `"{\qName\q:\qSong\q,\qPlaylist\q:\q,\qYear\q:\q1999\q}"`.
//! Empty string values come out as a lone `\q`, which leaves an
//! unterminated `"Key":",` once the token is turned back into a quote.

/// Vendor spelling of a JSON double quote.
const VENDOR_QUOTE_ESCAPE: &str = "\\q";

/// String fields the vendor writes as an unterminated `"Key":",`.
const REPAIRABLE_KEYS: &[&str] = &[
    "Playlist",
    "SubPlaylist",
    "CacheRoot",
    "Charter",
    "Album",
    "Genre",
    "Year",
    "LoadingPhrase",
];

/// Whether `raw` is in the vendor's quoted form.
pub fn is_vendor_format(raw: &str) -> bool {
    raw.starts_with('"')
}

/// Rewrite vendor-format content into JSON; anything else passes through.
///
/// The output never starts with a quote, so normalizing twice is the same
/// as normalizing once.
pub fn normalize(raw: &str) -> String {
    if !is_vendor_format(raw) {
        return raw.to_string();
    }

    let mut fixed = replace_quote_escapes(&raw.replace('"', ""));

    for key in REPAIRABLE_KEYS {
        let broken = format!("\"{}\":\",", key);
        if fixed.contains(&broken) {
            fixed = fixed.replace(&broken, &format!("\"{}\":\"\",", key));
        }
    }

    fixed.trim_start_matches('"').to_string()
}

/// Replace each `\q` token with `"`.
///
/// A `q` after an escaped backslash (`\\q`, as in `C:\\queue`) is path
/// text, not a token: only an odd run of backslashes ends in one.
fn replace_quote_escapes(text: &str) -> String {
    if !text.contains(VENDOR_QUOTE_ESCAPE) {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let mut run = 1;
        while chars.next_if_eq(&'\\').is_some() {
            run += 1;
        }
        if run % 2 == 1 && chars.next_if_eq(&'q').is_some() {
            out.extend(std::iter::repeat_n('\\', run - 1));
            out.push('"');
        } else {
            out.extend(std::iter::repeat_n('\\', run));
        }
    }
    out
}
