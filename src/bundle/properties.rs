/*!
A parser for Java style `.properties` files.

Each logical line holds one `key = value` pair. The separator is the first
unescaped `=`, `:` or whitespace character. Lines starting with `#` or `!`
are comments, and a line ending in an odd number of backslashes continues
on the next line (whose leading whitespace is dropped). Keys and values may
use the escapes `\t`, `\n`, `\r`, `\f`, `\uXXXX` and `\` followed by any
other character, which stands for that character. A UTF-16 surrogate pair
of `\uXXXX` escapes stands for one character outside the BMP.

Unlike the format's traditional ISO 8859-1 encoding, input here is UTF-8.
*/

use std::collections::HashMap;

/// Parse the contents of a properties file into key/value pairs, in the
/// order they appear.
///
/// When a key appears more than once, the last value wins.
pub(crate) fn parse(text: &str) -> Result<Vec<(String, String)>, String> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut pairs = Pairs::default();
    let mut logical = String::new();
    let mut logical_start = 0;
    let mut continuing = false;
    for (i, line) in text.lines().enumerate() {
        let line = line.trim_start_matches(is_blank);
        if !continuing {
            if line.is_empty() || line.starts_with(['#', '!']) {
                continue;
            }
            logical.clear();
            logical_start = i + 1;
        }
        logical.push_str(line);
        continuing = ends_with_continuation(&logical);
        if continuing {
            logical.pop();
            continue;
        }
        let pair = split(&logical)
            .map_err(|msg| format!("line {logical_start}: {msg}"))?;
        pairs.insert(pair);
    }
    if continuing {
        let pair = split(&logical)
            .map_err(|msg| format!("line {logical_start}: {msg}"))?;
        pairs.insert(pair);
    }
    Ok(pairs.list)
}

/// Key/value pairs in first appearance order, where a repeated key
/// replaces the earlier value.
#[derive(Default)]
struct Pairs {
    list: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Pairs {
    fn insert(&mut self, (key, value): (String, String)) {
        match self.index.get(&key) {
            Some(&i) => self.list[i].1 = value,
            None => {
                self.index.insert(key.clone(), self.list.len());
                self.list.push((key, value));
            }
        }
    }
}

fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\x0C')
}

fn ends_with_continuation(line: &str) -> bool {
    line.bytes().rev().take_while(|&b| b == b'\\').count() % 2 == 1
}

/// Split a logical line into an unescaped key and value.
fn split(line: &str) -> Result<(String, String), String> {
    let mut key_end = line.len();
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || is_blank(c) {
            key_end = i;
            break;
        }
    }
    let (key, rest) = line.split_at(key_end);
    let rest = rest.trim_start_matches(is_blank);
    let rest = rest.strip_prefix(['=', ':']).unwrap_or(rest);
    let value = rest.trim_start_matches(is_blank);
    Ok((unescape(key)?, unescape(value)?))
}

fn unescape(s: &str) -> Result<String, String> {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            None => {}
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\x0C'),
            Some('u') => {
                let (hex, mut unit) = code_unit(&mut chars)?;
                // Characters outside the BMP are written as a UTF-16
                // surrogate pair, e.g., `\uD83D\uDE00`.
                if (0xD800..0xDC00).contains(&unit) {
                    let mut rest = chars.clone();
                    if rest.next() == Some('\\') && rest.next() == Some('u') {
                        if let Ok((_, low)) = code_unit(&mut rest) {
                            if (0xDC00..0xE000).contains(&low) {
                                unit = 0x10000
                                    + ((unit - 0xD800) << 10)
                                    + (low - 0xDC00);
                                chars = rest;
                            }
                        }
                    }
                }
                let ch = char::from_u32(unit).ok_or_else(|| {
                    format!("escape `\\u{hex}` is not a Unicode scalar value")
                })?;
                out.push(ch);
            }
            Some(other) => out.push(other),
        }
    }
    Ok(out)
}

/// Read the four hex digits of a `\uXXXX` escape.
fn code_unit(
    chars: &mut std::str::Chars<'_>,
) -> Result<(String, u32), String> {
    let hex: String = chars.by_ref().take(4).collect();
    let unit = u32::from_str_radix(&hex, 16)
        .ok()
        .filter(|_| hex.len() == 4)
        .ok_or_else(|| format!("malformed \\uXXXX escape `\\u{hex}`"))?;
    Ok((hex, unit))
}
