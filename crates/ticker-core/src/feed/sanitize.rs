//! Text normalisation for extracted headlines
//!
//! The display fonts are ASCII only. Markup entities are decoded, common
//! typographic punctuation is mapped to its ASCII look-alike, and every
//! other multi-byte UTF-8 sequence becomes a single `?`.

use alloc::string::String;
use alloc::vec::Vec;

/// Stand-in for characters the display cannot render.
pub const PLACEHOLDER: char = '?';

const CDATA_OPEN: &[u8] = b"<![CDATA[";
const CDATA_CLOSE: &[u8] = b"]]>";

/// Longest entity this decoder recognises, excluding `&` and `;`.
const MAX_ENTITY_NAME: usize = 6;

/// Turn raw captured title bytes into display-ready ASCII text.
///
/// Strips a CDATA wrapper, decodes entities, replaces non-ASCII, then trims.
pub fn normalize_title(raw: &[u8]) -> String {
    let decoded = decode_entities(strip_cdata(raw));
    let ascii = sanitize_non_ascii(&decoded);
    let trimmed = ascii.trim();
    if trimmed.len() == ascii.len() {
        ascii
    } else {
        String::from(trimmed)
    }
}

fn strip_cdata(raw: &[u8]) -> &[u8] {
    let trimmed = raw.trim_ascii();
    trimmed
        .strip_prefix(CDATA_OPEN)
        .and_then(|inner| inner.strip_suffix(CDATA_CLOSE))
        .unwrap_or(raw)
}

/// Decode `&amp; &lt; &gt; &quot; &apos;` and the numeric apostrophe forms.
///
/// Anything else starting with `&` is copied through untouched.
pub fn decode_entities(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        if input[i] == b'&'
            && let Some((decoded, consumed)) = match_entity(&input[i + 1..])
        {
            out.push(decoded);
            i += consumed + 1;
            continue;
        }
        out.push(input[i]);
        i += 1;
    }
    out
}

/// Match an entity body (the bytes after `&`). Returns the decoded byte and
/// how many bytes the body occupied including the `;`.
fn match_entity(rest: &[u8]) -> Option<(u8, usize)> {
    let end = rest
        .iter()
        .take(MAX_ENTITY_NAME + 1)
        .position(|&b| b == b';')?;

    let decoded = match &rest[..end] {
        b"amp" => b'&',
        b"lt" => b'<',
        b"gt" => b'>',
        b"quot" => b'"',
        b"apos" | b"#39" | b"#039" | b"#x27" | b"#X27" => b'\'',
        _ => return None,
    };
    Some((decoded, end + 1))
}

/// Replace every non-ASCII UTF-8 sequence with an ASCII equivalent or `?`.
///
/// Control whitespace becomes a plain space. The output is pure ASCII, so
/// running it through again changes nothing.
pub fn sanitize_non_ascii(input: &[u8]) -> String {
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let byte = input[i];
        if byte.is_ascii() {
            out.push(match byte {
                b'\r' | b'\n' | b'\t' => ' ',
                _ => byte as char,
            });
            i += 1;
            continue;
        }

        let len = sequence_len(&input[i..]);
        match &input[i..i + len] {
            [0xC2, 0xA0] => out.push(' '),
            [0xE2, 0x80, 0x98] | [0xE2, 0x80, 0x99] => out.push('\''),
            [0xE2, 0x80, 0x9C] | [0xE2, 0x80, 0x9D] => out.push('"'),
            [0xE2, 0x80, 0x93] | [0xE2, 0x80, 0x94] => out.push('-'),
            [0xE2, 0x80, 0xA6] => out.push_str("..."),
            _ => out.push(PLACEHOLDER),
        }
        i += len;
    }
    out
}

/// Length of the (possibly truncated) UTF-8 sequence starting at `bytes[0]`.
///
/// Only continuation bytes that are actually present are counted, so a
/// sequence cut short by the capture limit never swallows the ASCII after it.
fn sequence_len(bytes: &[u8]) -> usize {
    let expected = match bytes[0] {
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF7 => 4,
        _ => 1,
    };
    let continuation = bytes[1..]
        .iter()
        .take(expected - 1)
        .take_while(|&&b| (0x80..=0xBF).contains(&b))
        .count();
    1 + continuation
}
