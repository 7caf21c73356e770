// src/classify/signals.rs
//! Text measurements feeding the rule chain. All functions are pure and
//! operate on chars, so multi-byte OCR output never splits a code point.

use regex::Regex;

/// Number of sentence-terminator runs (`.`, `!`, `?`); `"Wait...!?"` counts once.
pub fn count_sentences(text: &str) -> usize {
    let mut runs = 0usize;
    let mut in_run = false;
    for ch in text.chars() {
        if matches!(ch, '.' | '!' | '?') {
            if !in_run {
                runs += 1;
                in_run = true;
            }
        } else {
            in_run = false;
        }
    }
    runs
}

/// Maximal runs of alphanumeric characters.
pub fn count_word_tokens(text: &str) -> usize {
    let mut words = 0usize;
    let mut in_word = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if !in_word {
                words += 1;
                in_word = true;
            }
        } else {
            in_word = false;
        }
    }
    words
}

/// Characters that are neither alphanumeric nor whitespace.
pub fn count_symbols(text: &str) -> usize {
    text.chars()
        .filter(|c| !c.is_alphanumeric() && !c.is_whitespace())
        .count()
}

/// Symbols per word token. A text with no word tokens scores `1.0`.
pub fn symbol_ratio(text: &str) -> f32 {
    let words = count_word_tokens(text);
    if words == 0 {
        return 1.0;
    }
    count_symbols(text) as f32 / words as f32
}

/// Lines whose trimmed content starts with one of `glyphs`.
pub fn count_bullet_lines<S: AsRef<str>>(text: &str, glyphs: &[S]) -> usize {
    text.split('\n')
        .map(str::trim)
        .filter(|line| glyphs.iter().any(|g| line.starts_with(g.as_ref())))
        .count()
}

/// How many of `terms` occur anywhere in `text` (substring match, each term once).
pub fn count_present_terms<S: AsRef<str>>(text: &str, terms: &[S]) -> usize {
    terms.iter().filter(|t| text.contains(t.as_ref())).count()
}

/// Matches of `re` that are not glued to a neighbouring word character.
///
/// The `regex` crate has no look-around, so a match is dropped when the char
/// right before it or right after it is alphanumeric or `_`.
pub fn count_isolated_matches(re: &Regex, text: &str) -> usize {
    re.find_iter(text)
        .filter(|m| {
            let before = text[..m.start()].chars().next_back();
            let after = text[m.end()..].chars().next();
            !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
        })
        .count()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
