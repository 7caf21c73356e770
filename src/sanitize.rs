// src/sanitize.rs
//! OCR body normalizer for accepted articles.
//!
//! Steps, in order:
//! 1. delete noise glyphs (`*`, `#`, `©`, `•`, NUL)
//! 2. collapse 3+ newlines to a paragraph break
//! 3. drop whitespace before `, . ! ? : ;`
//! 4. collapse repeated punctuation; any run of 2+ periods becomes `...`
//! 5. collapse runs of spaces
//! 6. rejoin words hyphenated across a line break
//! 7. trim
//!
//! Glyph deletion runs first so a removed glyph can never leave behind a
//! newline run or a space run that a single pass would miss; this keeps
//! `sanitize` idempotent.

use once_cell::sync::OnceCell;
use regex::Regex;

const NOISE_GLYPHS: [char; 5] = ['*', '#', '©', '•', '\0'];
const PUNCT: [char; 6] = [',', '.', '!', '?', ':', ';'];

/// Normalize an article body. Empty input is returned unchanged.
pub fn sanitize(body: &str) -> String {
    if body.is_empty() {
        return String::new();
    }

    // 1) Noise glyphs
    let mut out: String = body.chars().filter(|c| !NOISE_GLYPHS.contains(c)).collect();

    // 2) Excess line breaks
    static RE_NEWLINES: OnceCell<Regex> = OnceCell::new();
    let re_newlines = RE_NEWLINES.get_or_init(|| Regex::new(r"\n{3,}").expect("newline regex"));
    out = re_newlines.replace_all(&out, "\n\n").into_owned();

    // 3) Whitespace before punctuation
    static RE_SPACE_PUNCT: OnceCell<Regex> = OnceCell::new();
    let re_space_punct =
        RE_SPACE_PUNCT.get_or_init(|| Regex::new(r"\s+([,.!?:;])").expect("space-punct regex"));
    out = re_space_punct.replace_all(&out, "$1").into_owned();

    // 4) Repeated punctuation + ellipsis
    out = collapse_punctuation(&out);

    // 5) Space runs
    static RE_SPACES: OnceCell<Regex> = OnceCell::new();
    let re_spaces = RE_SPACES.get_or_init(|| Regex::new(r" {2,}").expect("spaces regex"));
    out = re_spaces.replace_all(&out, " ").into_owned();

    // 6) Hyphenated line breaks
    out = rejoin_hyphenated(&out);

    // 7) Trim
    out.trim().to_string()
}

/// `Option` form for records whose body may be absent: `None` stays `None`.
pub fn sanitize_opt(body: Option<&str>) -> Option<String> {
    body.map(sanitize)
}

/// Collapse immediate repeats of the same punctuation mark. Period runs are
/// the exception: a run of two or more always becomes exactly `...`.
fn collapse_punctuation(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if !PUNCT.contains(&c) {
            out.push(c);
            continue;
        }
        let mut run = 1usize;
        while chars.peek() == Some(&c) {
            chars.next();
            run += 1;
        }
        if c == '.' && run >= 2 {
            out.push_str("...");
        } else {
            out.push(c);
        }
    }
    out
}

/// Remove `-\n` between two word characters. Chains such as `a-\nb-\nc` join
/// fully in one pass.
fn rejoin_hyphenated(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0usize;
    while i < chars.len() {
        let c = chars[i];
        let joins = c == '-'
            && chars.get(i + 1) == Some(&'\n')
            && out.chars().next_back().is_some_and(is_word_char)
            && chars.get(i + 2).copied().is_some_and(is_word_char);
        if joins {
            i += 2;
            continue;
        }
        out.push(c);
        i += 1;
    }
    out
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_paragraph_breaks() {
        assert_eq!(sanitize("Line 1\n\n\n\nLine 2"), "Line 1\n\nLine 2");
    }

    #[test]
    fn rejoins_hyphenated_words() {
        assert_eq!(sanitize("hy-\nphenated"), "hyphenated");
        assert_eq!(sanitize("a-\nb-\nc"), "abc");
        // Not a split word: hyphen after a space
        assert_eq!(sanitize("well -\nknown"), "well -\nknown");
    }

    #[test]
    fn strips_glyphs_and_fixes_punctuation() {
        assert_eq!(sanitize("  Hello , world!!  ** done #1 ©  "), "Hello, world! done 1");
        assert_eq!(sanitize("Wait.... what ,, ok"), "Wait... what, ok");
        assert_eq!(sanitize("So.. yes"), "So... yes");
    }

    #[test]
    fn glyph_between_newlines_leaves_single_break() {
        let once = sanitize("a\n\n*\nb");
        assert_eq!(once, "a\n\nb");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn empty_and_absent() {
        assert_eq!(sanitize(""), "");
        assert_eq!(sanitize_opt(None), None);
        assert_eq!(sanitize_opt(Some(" x ")), Some("x".to_string()));
    }
}
