//! String normalization for values pulled out of embedded page state.
//!
//! Every string leaf goes through four steps, in this order:
//!
//! 1. literal `\n` / `\r` escape sequences become real line breaks,
//! 2. remaining backslash escapes (`\uXXXX`, `\"`, `\\` ...) are decoded;
//!    a malformed sequence leaves the string as it was,
//! 3. named and numeric HTML entities are replaced (unknown names become
//!    U+0000),
//! 4. whitespace runs collapse to one space and the ends are trimmed.
//!
//! The four steps are repeated until the string stops changing, so
//! `clean(clean(x)) == clean(x)` holds even for double-escaped input such
//! as `&amp;amp;`.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Types whose string content can be normalized in place.
pub trait Clean {
    /// Return a copy with every contained string cleaned.
    fn clean(self) -> Self;
}

impl Clean for String {
    fn clean(self) -> Self {
        clean_str(&self)
    }
}

impl<T: Clean> Clean for Option<T> {
    fn clean(self) -> Self {
        self.map(Clean::clean)
    }
}

impl<T: Clean> Clean for Vec<T> {
    fn clean(self) -> Self {
        self.into_iter().map(Clean::clean).collect()
    }
}

impl Clean for Value {
    fn clean(self) -> Self {
        clean(self)
    }
}

/// Recursively clean every string leaf of a JSON value.
///
/// Objects and arrays keep their shape (object keys are left alone);
/// numbers, booleans and null pass through untouched.
pub fn clean(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(clean_str(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(clean).collect()),
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, clean(v))).collect()),
        other => other,
    }
}

/// Clean a single string until it reaches a fixed point.
pub fn clean_str(input: &str) -> String {
    // Every pass that changes the string either shortens it or only swaps
    // whitespace characters, so this terminates.
    let mut current = clean_once(input);
    loop {
        let next = clean_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn clean_once(input: &str) -> String {
    let unescaped = input.replace("\\n", "\n").replace("\\r", "\r");
    let decoded = decode_backslash_escapes(&unescaped).unwrap_or(unescaped);
    let entities = decode_entities(&decoded);
    collapse_whitespace(&entities)
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex is valid"))
}

fn collapse_whitespace(text: &str) -> String {
    whitespace_re().replace_all(text, " ").trim().to_string()
}

// ── Backslash escapes ──────────────────────────────────────────────────────

/// Decode backslash escapes. Returns `None` when any `\u`/`\U` sequence is
/// malformed or the string ends in a lone backslash.
fn decode_backslash_escapes(text: &str) -> Option<String> {
    if !text.contains('\\') {
        return Some(text.to_string());
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'u' => {
                let high = read_hex(&mut chars, 4)?;
                if (0xD800..0xDC00).contains(&high) {
                    // High surrogate must be followed by `\uDC00`-`\uDFFF`.
                    if chars.next()? != '\\' || chars.next()? != 'u' {
                        return None;
                    }
                    let low = read_hex(&mut chars, 4)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return None;
                    }
                    let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    out.push(char::from_u32(combined)?);
                } else {
                    out.push(char::from_u32(high)?);
                }
            }
            'U' => {
                let code = read_hex(&mut chars, 8)?;
                out.push(char::from_u32(code)?);
            }
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            't' => out.push('\t'),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    Some(out)
}

fn read_hex(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<u32> {
    let mut value = 0u32;
    for _ in 0..digits {
        value = value * 16 + chars.next()?.to_digit(16)?;
    }
    Some(value)
}

// ── HTML entities ──────────────────────────────────────────────────────────

/// Replace `&name;`, `&#NNN;` and `&#xHH;` entities in one left-to-right
/// scan.
///
/// A decoded character is fed back into the scan, so nested chains such as
/// `&amp;amp;lt;` resolve completely without rescanning the string.
fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    let mut decoder = EntityDecoder::with_capacity(text.len());
    for c in text.chars() {
        decoder.push(c);
    }
    decoder.out
}

struct EntityDecoder {
    out: String,
    /// Byte offsets in `out` of `&` characters that may still open an
    /// entity. Only name characters follow the top one.
    opens: Vec<usize>,
}

impl EntityDecoder {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
            opens: Vec::new(),
        }
    }

    fn push(&mut self, c: char) {
        let mut next = Some(c);
        while let Some(c) = next.take() {
            match c {
                '&' => {
                    self.opens.push(self.out.len());
                    self.out.push(c);
                }
                ';' => {
                    let decoded = self.opens.last().and_then(|&start| {
                        entity_name_char(&self.out[start + 1..]).map(|ch| (start, ch))
                    });
                    match decoded {
                        Some((start, decoded)) => {
                            self.out.truncate(start);
                            self.opens.pop();
                            next = Some(decoded);
                        }
                        None => {
                            self.out.push(c);
                            self.opens.clear();
                        }
                    }
                }
                c if c.is_ascii_alphanumeric() || c == '#' => self.out.push(c),
                _ => {
                    self.out.push(c);
                    self.opens.clear();
                }
            }
        }
    }
}

/// Decode the text between `&` and `;` if it has entity shape.
fn entity_name_char(name: &str) -> Option<char> {
    let well_formed = match name.strip_prefix('#') {
        Some(num) => match num.strip_prefix(['x', 'X']) {
            Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()),
        },
        None => !name.is_empty() && name.chars().all(|c| c.is_ascii_lowercase()),
    };
    well_formed.then(|| entity_char(name))
}

fn entity_char(name: &str) -> char {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => num.parse::<u32>().ok(),
        };
        return code.and_then(char::from_u32).unwrap_or('\0');
    }
    named_entity(name).unwrap_or('\0')
}

/// Lower-case HTML 4 named entities (plus `apos`).
fn named_entity(name: &str) -> Option<char> {
    let code: u32 = match name {
        "quot" => 34,
        "amp" => 38,
        "apos" => 39,
        "lt" => 60,
        "gt" => 62,
        "nbsp" => 160,
        "iexcl" => 161,
        "cent" => 162,
        "pound" => 163,
        "curren" => 164,
        "yen" => 165,
        "brvbar" => 166,
        "sect" => 167,
        "uml" => 168,
        "copy" => 169,
        "ordf" => 170,
        "laquo" => 171,
        "not" => 172,
        "shy" => 173,
        "reg" => 174,
        "macr" => 175,
        "deg" => 176,
        "plusmn" => 177,
        "acute" => 180,
        "micro" => 181,
        "para" => 182,
        "middot" => 183,
        "cedil" => 184,
        "ordm" => 186,
        "raquo" => 187,
        "iquest" => 191,
        "times" => 215,
        "szlig" => 223,
        "agrave" => 224,
        "aacute" => 225,
        "acirc" => 226,
        "atilde" => 227,
        "auml" => 228,
        "aring" => 229,
        "aelig" => 230,
        "ccedil" => 231,
        "egrave" => 232,
        "eacute" => 233,
        "ecirc" => 234,
        "euml" => 235,
        "igrave" => 236,
        "iacute" => 237,
        "icirc" => 238,
        "iuml" => 239,
        "eth" => 240,
        "ntilde" => 241,
        "ograve" => 242,
        "oacute" => 243,
        "ocirc" => 244,
        "otilde" => 245,
        "ouml" => 246,
        "divide" => 247,
        "oslash" => 248,
        "ugrave" => 249,
        "uacute" => 250,
        "ucirc" => 251,
        "uuml" => 252,
        "yacute" => 253,
        "thorn" => 254,
        "yuml" => 255,
        "oelig" => 339,
        "scaron" => 353,
        "fnof" => 402,
        "circ" => 710,
        "tilde" => 732,
        "alpha" => 945,
        "beta" => 946,
        "gamma" => 947,
        "delta" => 948,
        "epsilon" => 949,
        "zeta" => 950,
        "eta" => 951,
        "theta" => 952,
        "iota" => 953,
        "kappa" => 954,
        "lambda" => 955,
        "mu" => 956,
        "nu" => 957,
        "xi" => 958,
        "omicron" => 959,
        "pi" => 960,
        "rho" => 961,
        "sigmaf" => 962,
        "sigma" => 963,
        "tau" => 964,
        "upsilon" => 965,
        "phi" => 966,
        "chi" => 967,
        "psi" => 968,
        "omega" => 969,
        "thetasym" => 977,
        "upsih" => 978,
        "piv" => 982,
        "ensp" => 8194,
        "emsp" => 8195,
        "thinsp" => 8201,
        "zwnj" => 8204,
        "zwj" => 8205,
        "lrm" => 8206,
        "rlm" => 8207,
        "ndash" => 8211,
        "mdash" => 8212,
        "lsquo" => 8216,
        "rsquo" => 8217,
        "sbquo" => 8218,
        "ldquo" => 8220,
        "rdquo" => 8221,
        "bdquo" => 8222,
        "dagger" => 8224,
        "bull" => 8226,
        "hellip" => 8230,
        "permil" => 8240,
        "prime" => 8242,
        "lsaquo" => 8249,
        "rsaquo" => 8250,
        "oline" => 8254,
        "frasl" => 8260,
        "euro" => 8364,
        "image" => 8465,
        "weierp" => 8472,
        "real" => 8476,
        "trade" => 8482,
        "alefsym" => 8501,
        "larr" => 8592,
        "uarr" => 8593,
        "rarr" => 8594,
        "darr" => 8595,
        "harr" => 8596,
        "crarr" => 8629,
        "forall" => 8704,
        "part" => 8706,
        "exist" => 8707,
        "empty" => 8709,
        "nabla" => 8711,
        "isin" => 8712,
        "notin" => 8713,
        "ni" => 8715,
        "prod" => 8719,
        "sum" => 8721,
        "minus" => 8722,
        "lowast" => 8727,
        "radic" => 8730,
        "prop" => 8733,
        "infin" => 8734,
        "ang" => 8736,
        "and" => 8743,
        "or" => 8744,
        "cap" => 8745,
        "cup" => 8746,
        "int" => 8747,
        "sim" => 8764,
        "cong" => 8773,
        "asymp" => 8776,
        "ne" => 8800,
        "equiv" => 8801,
        "le" => 8804,
        "ge" => 8805,
        "sub" => 8834,
        "sup" => 8835,
        "nsub" => 8836,
        "sube" => 8838,
        "supe" => 8839,
        "oplus" => 8853,
        "otimes" => 8855,
        "perp" => 8869,
        "sdot" => 8901,
        "lceil" => 8968,
        "rceil" => 8969,
        "lfloor" => 8970,
        "rfloor" => 8971,
        "lang" => 9001,
        "rang" => 9002,
        "loz" => 9674,
        "spades" => 9824,
        "clubs" => 9827,
        "hearts" => 9829,
        "diams" => 9830,
        _ => return None,
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_literal_newline_escapes_collapse_to_space() {
        assert_eq!(clean_str(r"first\nsecond\r\nthird"), "first second third");
    }

    #[test]
    fn test_unicode_escapes_decoded() {
        assert_eq!(clean_str(r"caf\u00e9 \u003cb\u003e"), "café <b>");
        assert_eq!(clean_str(r"rocket \ud83d\ude80"), "rocket 🚀");
    }

    #[test]
    fn test_malformed_unicode_escape_left_alone() {
        assert_eq!(clean_str(r"bad \u12 escape"), r"bad \u12 escape");
        assert_eq!(clean_str(r"lone \ud83d surrogate"), r"lone \ud83d surrogate");
    }

    #[test]
    fn test_entities_named_numeric_and_unknown() {
        assert_eq!(clean_str("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(clean_str("it&#39;s &#x41;"), "it's A");
        assert_eq!(clean_str("x&bogus;y"), "x\0y");
        // Upper-case names are not entity candidates.
        assert_eq!(clean_str("&Agrave;"), "&Agrave;");
    }

    #[test]
    fn test_nested_entity_chains_resolve() {
        assert_eq!(decode_entities("&amp;amp;amp;lt;b&amp;gt;"), "<b>");
        assert_eq!(decode_entities("&am&#112;;"), "&");
        assert_eq!(decode_entities("&amp&#59;"), "&");
        assert_eq!(decode_entities("a &amp b; &;"), "a &amp b; &;");
        assert_eq!(decode_entities("&#x;&#;"), "&#x;&#;");
    }

    #[test]
    fn test_long_entity_chain_is_linear() {
        let input = format!("&{}", "amp;".repeat(25_000));
        let start = std::time::Instant::now();
        assert_eq!(clean_str(&input), "&");
        assert!(
            start.elapsed() < std::time::Duration::from_secs(2),
            "took {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn test_whitespace_collapsed_and_trimmed() {
        assert_eq!(clean_str("  a \t\t b\n\nc  "), "a b c");
        assert_eq!(clean_str("a&nbsp;&nbsp;b"), "a b");
    }

    #[test]
    fn test_structure_preserved() {
        let input = json!({
            "name": "  Acme &amp; Co ",
            "tags": ["a\\nb", 3, null],
            "nested": {"ok": true, "n": 1.5}
        });
        let out = clean(input);
        assert_eq!(
            out,
            json!({
                "name": "Acme & Co",
                "tags": ["a b", 3, null],
                "nested": {"ok": true, "n": 1.5}
            })
        );
    }

    #[test]
    fn test_idempotent_on_awkward_inputs() {
        let samples = [
            "&amp;amp;lt;",
            r"\\u0041\\n",
            "\t mixed &lt;tag&gt; \\u00e9 ",
            r"trailing \",
            "plain",
            "",
        ];
        for s in samples {
            let once = clean_str(s);
            assert_eq!(clean_str(&once), once, "not idempotent for {s:?}");
        }

        let value = json!({"a": ["&amp;quot;x&amp;quot;", {"b": "  \\u0020 y "}]});
        let once = clean(value);
        assert_eq!(clean(once.clone()), once);
    }

    #[test]
    fn test_clean_trait_on_containers() {
        let names: Vec<String> = vec![" Ada ".into(), "Grace&nbsp;Hopper".into()];
        assert_eq!(names.clean(), vec!["Ada", "Grace Hopper"]);
        let missing: Option<String> = None;
        assert_eq!(missing.clean(), None);
    }
}
