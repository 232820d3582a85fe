//! Line classification and verbatim sequence matching.
//!
//! Sequences are short digit strings, so naive substring search matches across
//! sequence boundaries ("23" inside "123"). The matcher finds separator-flexible
//! occurrences with regex and then checks the surrounding text structurally: a
//! hit only counts when it is not a sub-run of a longer digit chain.

use anyhow::{Context, Result};
use regex::Regex;

const SEQUENCE_DIGITS: [char; 4] = ['1', '2', '3', '4'];

/// Heading heuristic: Markdown `#` headings, lines opening with a
/// chapter/section/part word, or a numbered-list marker followed by text.
/// Known limitation: ordinary numbered content lines can classify as headings.
pub fn is_heading(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return false;
    }

    if is_markdown_heading(trimmed) {
        return true;
    }

    for word in ["chapter", "section", "part"] {
        if starts_with_word(trimmed, word) {
            return true;
        }
    }

    is_numbered_heading(trimmed)
}

fn is_markdown_heading(trimmed: &str) -> bool {
    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if hashes == 0 || hashes > 6 {
        return false;
    }
    let rest = &trimmed[hashes..];
    rest.starts_with(char::is_whitespace) && !rest.trim().is_empty()
}

fn starts_with_word(trimmed: &str, word: &str) -> bool {
    if trimmed.len() < word.len()
        || !trimmed.is_char_boundary(word.len())
        || !trimmed[..word.len()].eq_ignore_ascii_case(word)
    {
        return false;
    }
    // Word boundary: end of line or a non-alphanumeric character.
    trimmed[word.len()..]
        .chars()
        .next()
        .map_or(true, |c| !c.is_alphanumeric())
}

fn is_numbered_heading(trimmed: &str) -> bool {
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return false;
    }
    let rest = &trimmed[digits..];

    // "1 anything": whitespace right after the number is enough.
    if rest.starts_with(char::is_whitespace) {
        return !rest.trim().is_empty();
    }

    // "1. text" / "2) text" / "3- text": marker, then whitespace, then text.
    if let Some(after) = rest.strip_prefix(['.', ')', '-']) {
        return after.starts_with(char::is_whitespace) && !after.trim().is_empty();
    }

    false
}

/// Compiled match rules for one sequence across all of its spellings.
pub struct SequenceMatcher {
    variants: Vec<Regex>,
    exact_keys: Vec<String>,
}

impl SequenceMatcher {
    pub fn compile(digits: &str, candidate_keys: &[String]) -> Result<Self> {
        let mut variants = Vec::new();

        if !digits.is_empty() && digits.chars().all(|c| SEQUENCE_DIGITS.contains(&c)) {
            let parts: Vec<String> = digits.chars().map(|c| c.to_string()).collect();
            let joined = [
                parts.join(""),
                parts.join(r"\s*-\s*"),
                parts.join(r"\s*(?:→|->)\s*"),
                parts.join(r"\s*,\s*"),
                parts.join(r"\s+"),
            ];

            let mut seen = Vec::new();
            for pattern in joined {
                if seen.contains(&pattern) {
                    continue;
                }
                variants.push(
                    Regex::new(&pattern)
                        .with_context(|| format!("invalid sequence pattern: {pattern}"))?,
                );
                seen.push(pattern);
            }
        }

        Ok(Self {
            variants,
            exact_keys: candidate_keys.to_vec(),
        })
    }

    /// Does any match rule fire on this line? Rules are unordered; block-level
    /// deduplication downstream absorbs their overlap.
    pub fn line_matches(&self, line: &str) -> bool {
        let trimmed = line.trim();
        if self
            .exact_keys
            .iter()
            .any(|key| trimmed.eq_ignore_ascii_case(key))
        {
            return true;
        }

        for variant in &self.variants {
            for found in variant.find_iter(line) {
                let before = &line[..found.start()];
                let after = &line[found.end()..];

                if continues_into_longer_sequence(after) {
                    continue;
                }

                if anchored_prefix_ok(before) && anchored_terminator_ok(after) {
                    return true;
                }

                if token_boundary_before(before) && token_boundary_after(after) {
                    return true;
                }
            }
        }

        false
    }
}

/// Sub-run guard: the match must not be the prefix of a longer chain, i.e. not
/// immediately followed by another sequence digit or by a separator then one.
fn continues_into_longer_sequence(after: &str) -> bool {
    if after.starts_with(SEQUENCE_DIGITS) {
        return true;
    }
    let rest = after.trim_start();
    if let Some(past_separator) = rest.strip_prefix([',', '→', '-']) {
        if past_separator.trim_start().starts_with(SEQUENCE_DIGITS) {
            return true;
        }
    }
    false
}

/// Line-anchored rule: only leading whitespace, optionally with a "Sequence"
/// label, may precede the match.
fn anchored_prefix_ok(before: &str) -> bool {
    let lead = before.trim_start();
    if lead.is_empty() {
        return true;
    }
    starts_with_word(lead, "sequence") && lead["sequence".len()..].trim().is_empty()
}

/// The anchored match must end the line or run into whitespace or a
/// colon/dash-like separator.
fn anchored_terminator_ok(after: &str) -> bool {
    match after.chars().next() {
        None => true,
        Some(c) if c.is_whitespace() => true,
        Some(c) => matches!(c, ':' | '：' | '–' | '—' | '-'),
    }
}

/// Token rule: anywhere in the line, delimited by whitespace or separator
/// punctuation on both sides. Stricter than a bare not-a-digit check so that a
/// quoted mention like `"123"` inside prose does not count as an entry.
fn token_boundary_before(before: &str) -> bool {
    match before.chars().last() {
        None => true,
        Some(c) if c.is_whitespace() => true,
        Some(c) => matches!(c, ',' | ';' | ':' | '(' | '[' | '-' | '–' | '—' | '→'),
    }
}

fn token_boundary_after(after: &str) -> bool {
    match after.chars().next() {
        None => true,
        Some(c) if c.is_whitespace() => true,
        Some(c) => matches!(c, '.' | ',' | ';' | ':' | ')' | ']' | '-' | '–' | '—' | '!' | '?'),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::candidate_keys;

    fn matcher(digits: &str) -> SequenceMatcher {
        SequenceMatcher::compile(digits, &candidate_keys(digits)).expect("compile")
    }

    #[test]
    fn standalone_sequence_line_matches() {
        let m = matcher("123");
        assert!(m.line_matches("123"));
        assert!(m.line_matches("  123  "));
        assert!(m.line_matches("1-2-3"));
        assert!(m.line_matches("1 → 2 → 3"));
        assert!(m.line_matches("1,2,3"));
    }

    #[test]
    fn sub_runs_of_longer_chains_are_rejected() {
        let m123 = matcher("123");
        assert!(!m123.line_matches("12345"));
        assert!(!m123.line_matches("4123"));
        assert!(!m123.line_matches("1-2-3-4"));
        assert!(!m123.line_matches("123, 4"));

        let m234 = matcher("234");
        assert!(!m234.line_matches("12345"));

        let m345 = matcher("345");
        assert!(!m345.line_matches("12345"));
    }

    #[test]
    fn sequence_label_prefix_is_accepted() {
        let m = matcher("24");
        assert!(m.line_matches("Sequence 24"));
        assert!(m.line_matches("sequence 2-4: the steady hand"));
    }

    #[test]
    fn colon_and_dash_terminators_are_accepted() {
        let m = matcher("31");
        assert!(m.line_matches("31: begin again"));
        assert!(m.line_matches("3-1 — begin again"));
    }

    #[test]
    fn token_rule_matches_mid_line_with_clean_boundaries() {
        let m = matcher("12");
        assert!(m.line_matches("see roll 1-2 for details"));
        assert!(!m.line_matches("see roll 312 for details"));
        assert!(!m.line_matches("see roll 1-2-3 for details"));
    }

    #[test]
    fn quoted_mention_inside_prose_is_not_an_entry() {
        let m = matcher("123");
        assert!(!m.line_matches("This should NOT match sequence \"123\"."));
    }

    #[test]
    fn empty_or_foreign_digit_sequences_never_match() {
        let empty = SequenceMatcher::compile("", &[]).expect("compile");
        assert!(!empty.line_matches("123"));

        let foreign = SequenceMatcher::compile("15", &[]).expect("compile");
        assert!(!foreign.line_matches("15"));
    }

    #[test]
    fn markdown_and_word_headings_are_detected() {
        assert!(is_heading("# Chapter One"));
        assert!(is_heading("###### Deep"));
        assert!(is_heading("Chapter 2: The Climb"));
        assert!(is_heading("  section 4"));
        assert!(is_heading("PART II"));
        assert!(!is_heading("####### too deep"));
        assert!(!is_heading("chapters are long"));
        assert!(!is_heading("plain text line"));
    }

    #[test]
    fn numbered_list_lines_are_headings_but_bare_sequences_are_not() {
        assert!(is_heading("1. Introduction"));
        assert!(is_heading("2) Second part"));
        assert!(is_heading("3 - Third"));
        assert!(!is_heading("123"));
        assert!(!is_heading("1-2-3"));
        assert!(!is_heading(""));
    }
}
