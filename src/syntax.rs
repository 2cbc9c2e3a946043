//! # Syntax highlighting
//!
//! A small state machine that tags every rendered byte of a row with an [`HlType`], carrying
//! forward whether the row ends inside an unterminated multi-line comment so the next row can
//! continue highlighting correctly.

use std::fmt::{self, Display, Formatter};

/// The highlight class of a single rendered byte.
///
/// Each variant is associated with a color via its discriminant: the ANSI color is the
/// discriminant itself. See <https://en.wikipedia.org/wiki/ANSI_escape_code#Colors>.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HlType {
    Normal = 39,           // Default foreground color
    Number = 31,           // Red
    Keyword2 = 32,         // Green
    Keyword1 = 33,         // Yellow
    Match = 34,            // Blue
    String = 35,           // Magenta
    Comment = 36,          // Cyan
    MultilineComment = 36, // Cyan
}

impl Display for HlType {
    /// Write the ANSI color escape sequence for this `HlType`.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { write!(f, "\x1b[{}m", *self as u32) }
}

/// A keyword and whether it is a primary or secondary keyword.
#[derive(Clone, Copy, Debug)]
pub struct Keyword {
    pub bytes: &'static str,
    pub kind: HlType,
}

/// Syntax highlighting configuration for a filetype.
#[derive(Clone, Debug)]
pub struct Conf {
    /// Display name, e.g. "c".
    pub name: &'static str,
    /// Filename-match patterns. A pattern beginning with `.` is matched as an exact extension;
    /// otherwise it is matched as a substring of the filename.
    pub patterns: &'static [&'static str],
    /// Keywords, in match-priority order.
    pub keywords: &'static [Keyword],
    /// The token that starts a single-line comment, e.g. "//".
    pub sl_comment_start: Option<&'static str>,
    /// The tokens that start and end a multi-line comment, e.g. ("/*", "*/").
    pub ml_comment_delims: Option<(&'static str, &'static str)>,
    /// Whether to highlight numbers.
    pub highlight_numbers: bool,
    /// Whether to highlight strings.
    pub highlight_strings: bool,
}

macro_rules! kw1 { ($s:expr) => { Keyword { bytes: $s, kind: HlType::Keyword1 } } }
macro_rules! kw2 { ($s:expr) => { Keyword { bytes: $s, kind: HlType::Keyword2 } } }

const C_KEYWORDS: &[Keyword] = &[
    kw1!("switch"),
    kw1!("if"),
    kw1!("while"),
    kw1!("for"),
    kw1!("break"),
    kw1!("continue"),
    kw1!("return"),
    kw1!("else"),
    kw1!("struct"),
    kw1!("union"),
    kw1!("typedef"),
    kw1!("static"),
    kw1!("enum"),
    kw1!("class"),
    kw1!("case"),
    kw2!("int"),
    kw2!("long"),
    kw2!("double"),
    kw2!("float"),
    kw2!("char"),
    kw2!("unsigned"),
    kw2!("signed"),
    kw2!("void"),
];

/// The built-in syntax definitions. Only "c" is shipped, matching `.c`, `.h` and `.cpp` files.
const SYNTAXES: &[Conf] = &[Conf {
    name: "c",
    patterns: &[".c", ".h", ".cpp"],
    keywords: C_KEYWORDS,
    sl_comment_start: Some("//"),
    ml_comment_delims: Some(("/*", "*/")),
    highlight_numbers: true,
    highlight_strings: true,
}];

impl Conf {
    /// Find the syntax definition whose patterns match `filename`, if any.
    pub fn find(filename: &str) -> Option<&'static Self> {
        SYNTAXES.iter().find(|syntax| {
            syntax.patterns.iter().any(|pattern| {
                if let Some(ext) = pattern.strip_prefix('.') {
                    filename.ends_with(pattern) && filename != *pattern
                        || filename.rsplit('.').next().is_some_and(|e| e == ext)
                } else {
                    filename.contains(pattern)
                }
            })
        })
    }
}

/// Return whether `b` is a separator byte: whitespace, NUL, or ASCII punctuation other than `_`.
const fn is_sep(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'\0' || (b.is_ascii_punctuation() && b != b'_')
}

/// Highlight one row's rendered bytes, given the optional syntax definition and whether the
/// previous row ended inside an open multi-line comment.
///
/// Returns the highlight class for each rendered byte, and whether this row itself ends inside
/// an open multi-line comment (used by the caller to decide whether to keep propagating to
/// subsequent rows).
pub fn highlight_row(rendered: &[u8], syntax: Option<&Conf>, prev_open_comment: bool) -> (Vec<HlType>, bool) {
    let Some(syntax) = syntax else {
        return (vec![HlType::Normal; rendered.len()], false);
    };

    let mut hl = Vec::with_capacity(rendered.len());
    let mut prev_sep = true;
    let mut in_string: Option<u8> = None;
    let mut in_comment = prev_open_comment;

    let find_at = |i: usize, s: &str| rendered.get(i..i + s.len()).is_some_and(|r| r == s.as_bytes());

    let mut i = 0;
    'outer: while i < rendered.len() {
        if in_string.is_none() && !in_comment {
            if let Some(prefix) = syntax.sl_comment_start {
                if find_at(i, prefix) {
                    hl.extend(std::iter::repeat(HlType::Comment).take(rendered.len() - i));
                    break;
                }
            }
        }

        if in_string.is_none() {
            if let Some((start, end)) = syntax.ml_comment_delims {
                if in_comment {
                    if find_at(i, end) {
                        hl.extend(std::iter::repeat(HlType::MultilineComment).take(end.len()));
                        i += end.len();
                        in_comment = false;
                        prev_sep = true;
                        continue 'outer;
                    }
                    hl.push(HlType::MultilineComment);
                    i += 1;
                    continue 'outer;
                } else if find_at(i, start) {
                    hl.extend(std::iter::repeat(HlType::MultilineComment).take(start.len()));
                    i += start.len();
                    in_comment = true;
                    continue 'outer;
                }
            }
        }

        let c = rendered[i];

        if syntax.highlight_strings {
            if let Some(quote) = in_string {
                hl.push(HlType::String);
                if c == b'\\' && i + 1 < rendered.len() {
                    hl.push(HlType::String);
                    i += 2;
                    continue 'outer;
                }
                if c == quote {
                    in_string = None;
                    prev_sep = true;
                } else {
                    prev_sep = false;
                }
                i += 1;
                continue 'outer;
            } else if c == b'"' || c == b'\'' {
                in_string = Some(c);
                hl.push(HlType::String);
                i += 1;
                continue 'outer;
            }
        }

        if syntax.highlight_numbers
            && ((c.is_ascii_digit() && prev_sep)
                || (c.is_ascii_digit() && !prev_sep && hl.last() == Some(&HlType::Number))
                || (c == b'.' && hl.last() == Some(&HlType::Number)))
        {
            hl.push(HlType::Number);
            prev_sep = false;
            i += 1;
            continue 'outer;
        }

        if prev_sep {
            let matched = syntax.keywords.iter().find(|kw| {
                find_at(i, kw.bytes) && rendered.get(i + kw.bytes.len()).is_none_or(|b| is_sep(*b))
            });
            if let Some(kw) = matched {
                hl.extend(std::iter::repeat(kw.kind).take(kw.bytes.len()));
                i += kw.bytes.len();
                prev_sep = false;
                continue 'outer;
            }
        }

        hl.push(HlType::Normal);
        prev_sep = is_sep(c);
        i += 1;
    }

    (hl, in_comment)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c() -> &'static Conf { Conf::find("main.c").expect("c syntax must be registered") }

    #[test]
    fn finds_by_extension() {
        assert!(Conf::find("main.c").is_some());
        assert!(Conf::find("main.h").is_some());
        assert!(Conf::find("main.cpp").is_some());
        assert!(Conf::find("main.rs").is_none());
        assert!(Conf::find("Makefile").is_none());
    }

    #[test]
    fn no_syntax_is_all_normal() {
        let (hl, open) = highlight_row(b"hello world", None, false);
        assert_eq!(hl, vec![HlType::Normal; 11]);
        assert!(!open);
    }

    #[test]
    fn single_line_comment_consumes_rest_of_line() {
        let (hl, open) = highlight_row(b"int x; // a comment", Some(c()), false);
        assert_eq!(hl[7..], vec![HlType::Comment; "// a comment".len()]);
        assert!(!open);
    }

    #[test]
    fn multi_line_comment_propagates_and_closes() {
        let (hl1, open1) = highlight_row(b"int x; /* open", Some(c()), false);
        assert_eq!(hl1[7..], vec![HlType::MultilineComment; "/* open".len()]);
        assert!(open1);

        let (hl2, open2) = highlight_row(b"still comment */ int y;", Some(c()), true);
        assert_eq!(hl2[..16], vec![HlType::MultilineComment; 16]);
        assert_eq!(hl2[16..], vec![HlType::Normal; " int y;".len()]);
        assert!(!open2);
    }

    #[test]
    fn strings_are_highlighted_and_escape_aware() {
        let (hl, _) = highlight_row(br#"x = "a\"b";"#, Some(c()), false);
        assert_eq!(hl[4..10], vec![HlType::String; 6]);
        assert_eq!(hl[10], HlType::Normal);
    }

    #[test]
    fn numbers_require_a_leading_separator() {
        let (hl, _) = highlight_row(b"a1 12.5", Some(c()), false);
        assert_eq!(hl[0..2], vec![HlType::Normal; 2]);
        assert_eq!(hl[3..], vec![HlType::Number; 4]);
    }

    #[test]
    fn keywords_require_separators_on_both_sides() {
        let (hl, _) = highlight_row(b"int foo_int; int", Some(c()), false);
        assert_eq!(hl[0..3], vec![HlType::Keyword2; 3]);
        assert_eq!(hl[4..11], vec![HlType::Normal; "foo_int".len()]);
        assert_eq!(hl[13..], vec![HlType::Keyword2; 3]);
    }
}
