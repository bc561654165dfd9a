//! Removal of decommissioned site names from free text.
//!
//! Data loaded from storage is never assumed clean: the workbench runs these helpers on
//! every load, before every save and before every export.

use log::debug;
use regex::Regex;
use std::sync::LazyLock;

use crate::config::PersistedRow;

/// Whole-word tokens, matched case-insensitively.
pub const LEGACY_TOKENS: [&str; 4] = ["Mosinee", "Thilmany", "MOS", "THI"];

const CONNECTOR: &str = r"(?:,|/|&|-|\band\b|\bor\b)";

fn token_alternation() -> String {
    let tokens: Vec<String> = LEGACY_TOKENS.iter().map(|t| regex::escape(t)).collect();
    format!(r"\b(?:{})\b", tokens.join("|"))
}

static LEGACY_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("(?i){}", token_alternation())).expect("legacy token pattern")
});

// A run of tokens joined by connectors goes as one unit: "MOS and THI", "MOS-THI".
static LEGACY_RUN: LazyLock<Regex> = LazyLock::new(|| {
    let t = token_alternation();
    Regex::new(&format!(r"(?i){t}(?:[ \t]*{CONNECTOR}[ \t]*{t})*")).expect("legacy run pattern")
});

const SYMBOL_CONNECTORS: [char; 4] = [',', '/', '&', '-'];
const WORD_CONNECTORS: [&str; 2] = ["and", "or"];

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn skip_blanks_back(s: &str, end: usize) -> usize {
    s[..end].trim_end_matches(is_blank).len()
}

fn skip_blanks_forward(s: &str, start: usize) -> usize {
    let rest = &s[start..];
    start + rest.len() - rest.trim_start_matches(is_blank).len()
}

// Start of a connector ending exactly at `end`.
fn connector_before(s: &str, end: usize) -> Option<usize> {
    let head = &s[..end];
    if head.ends_with(SYMBOL_CONNECTORS) {
        return Some(end - 1);
    }
    WORD_CONNECTORS.iter().find_map(|w| {
        let start = end.checked_sub(w.len())?;
        let word = head.get(start..)?;
        let bounded = !head[..start].chars().next_back().map_or(false, is_word_char);
        (word.eq_ignore_ascii_case(w) && bounded).then_some(start)
    })
}

// End of a connector starting exactly at `start`.
fn connector_after(s: &str, start: usize) -> Option<usize> {
    let tail = &s[start..];
    if tail.starts_with(SYMBOL_CONNECTORS) {
        return Some(start + 1);
    }
    WORD_CONNECTORS.iter().find_map(|w| {
        let word = tail.get(..w.len())?;
        let bounded = !tail[w.len()..].chars().next().map_or(false, is_word_char);
        (word.eq_ignore_ascii_case(w) && bounded).then_some(start + w.len())
    })
}

fn opens_line(head: &str) -> bool {
    head.is_empty() || head.ends_with(['\n', '(', '['])
}

// Removes s[a..b] with the connector, blanks and brackets it leaves behind. Nothing
// outside the run's own line segment is changed.
fn remove_run(s: &str, a: usize, b: usize) -> String {
    let left = skip_blanks_back(s, a);
    let right = skip_blanks_forward(s, b);
    let (start, mut end) = if let Some(c) = connector_before(s, left) {
        (skip_blanks_back(s, c), b)
    } else if let Some(d) = connector_after(s, right) {
        (a, skip_blanks_forward(s, d))
    } else {
        (left, b)
    };
    if opens_line(&s[..start]) {
        end = skip_blanks_forward(s, end);
    }

    let mut prefix = &s[..start];
    let mut suffix = &s[end..];
    let p = prefix.trim_end_matches(is_blank);
    let q = suffix.trim_start_matches(is_blank);
    if (p.ends_with('(') && q.starts_with(')')) || (p.ends_with('[') && q.starts_with(']')) {
        prefix = p[..p.len() - 1].trim_end_matches(is_blank);
        suffix = &q[1..];
    }

    // A line left with nothing on it goes away.
    let p = prefix.trim_end_matches(is_blank);
    let q = suffix.trim_start_matches(is_blank);
    if (p.is_empty() || p.ends_with('\n')) && (q.is_empty() || q.starts_with('\n')) {
        return match p.strip_suffix('\n') {
            Some(stripped) => format!("{}{}", stripped, q),
            None => q.strip_prefix('\n').unwrap_or(q).to_string(),
        };
    }
    format!("{}{}", prefix, suffix)
}

/// True when the text still holds a forbidden token as a whole word.
pub fn contains_legacy_token(text: &str) -> bool {
    LEGACY_WORD.is_match(text)
}

/// Removes every forbidden token from the text. Text without tokens is returned unchanged.
pub fn scrub_legacy_text(text: &str) -> String {
    let mut current = text.to_string();
    // One run at a time: a removal can bring word characters together again ("TH(MOS)I").
    while let Some(m) = LEGACY_RUN.find(&current) {
        current = remove_run(&current, m.start(), m.end());
    }
    current
}

fn scrub_field(field: &mut String) -> bool {
    if contains_legacy_token(field) {
        *field = scrub_legacy_text(field);
        true
    } else {
        false
    }
}

/// Scrubs every free-text field of one row. Returns true when something was removed.
pub fn sanitize_row(row: &mut PersistedRow) -> bool {
    let mut changed = false;
    for field in [
        &mut row.mill,
        &mut row.role_area,
        &mut row.retention_risk,
        &mut row.capability_comment,
        &mut row.retention_comment,
        &mut row.notes,
    ] {
        changed |= scrub_field(field);
    }
    changed
}

/// Scrubs a working set in place. Returns the number of rows that changed.
pub fn sanitize_rows(rows: &mut [PersistedRow]) -> usize {
    let changed = rows.iter_mut().map(sanitize_row).filter(|c| *c).count();
    if changed > 0 {
        debug!("sanitize_rows: scrubbed {} of {} rows", changed, rows.len());
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parenthesised_site_list_disappears() {
        assert_eq!(
            scrub_legacy_text("Operations Manager (MOS and THI)"),
            "Operations Manager"
        );
    }

    #[test]
    fn remaining_valid_tokens_keep_their_brackets() {
        assert_eq!(
            scrub_legacy_text("Operations Manager (Paper and MOS)"),
            "Operations Manager (Paper)"
        );
        assert_eq!(
            scrub_legacy_text("Shift Lead (THI, Pulp)"),
            "Shift Lead (Pulp)"
        );
    }

    #[test]
    fn clean_text_is_untouched() {
        let text = "Operations Manager (Paper)";
        assert_eq!(scrub_legacy_text(text), text);
        let spaced = "Two  spaces ( kept )";
        assert_eq!(scrub_legacy_text(spaced), spaced);
    }

    #[test]
    fn tokens_inside_words_survive() {
        assert_eq!(scrub_legacy_text("THIck layer of MOSS"), "THIck layer of MOSS");
        assert!(!contains_legacy_token("Thilmanyesque"));
    }

    #[test]
    fn every_token_is_removed_in_any_case() {
        for token in LEGACY_TOKENS {
            for variant in [token.to_string(), token.to_lowercase(), token.to_uppercase()] {
                let text = format!("Moved from {} to Paper, {}.", variant, variant);
                let cleaned = scrub_legacy_text(&text);
                assert!(!contains_legacy_token(&cleaned), "{:?} -> {:?}", text, cleaned);
                assert!(cleaned.contains("Paper"));
            }
        }
    }

    #[test]
    fn tidying_cannot_rebuild_a_token() {
        let cleaned = scrub_legacy_text("TH(MOS)I");
        assert!(!contains_legacy_token(&cleaned));
    }

    #[test]
    fn multiline_comments_keep_their_lines() {
        let cleaned = scrub_legacy_text("Lead assignments in Mosinee and THI plants.\nKeep");
        assert_eq!(cleaned, "Lead assignments in plants.\nKeep");
    }

    #[test]
    fn cleanup_stays_next_to_the_removed_name() {
        assert_eq!(
            scrub_legacy_text("Ex MOS lead\n/ see attached\nRatio : 3 ( approx )"),
            "Ex lead\n/ see attached\nRatio : 3 ( approx )"
        );
        assert_eq!(scrub_legacy_text("Moved from MOS-THI team"), "Moved from team");
        assert_eq!(
            scrub_legacy_text("Indent:\n    - kept  aligned\nand THI"),
            "Indent:\n    - kept  aligned"
        );
        assert_eq!(scrub_legacy_text("MOS\n  second line"), "  second line");
        assert_eq!(scrub_legacy_text("Moved from Mosinee."), "Moved from.");
    }

    #[test]
    fn rows_are_scrubbed_in_place() {
        let mut rows = vec![
            PersistedRow {
                role_area: "Operations Manager (MOS and THI)".to_string(),
                capability_comment: "Lead assignments in Mosinee and THI plants.".to_string(),
                retention_comment: "Backfill MOS focus with Thilmany experience.".to_string(),
                notes: "Transferred from MOS / THI legacy team.".to_string(),
                ..PersistedRow::default()
            },
            PersistedRow {
                role_area: "Tech".to_string(),
                ..PersistedRow::default()
            },
        ];
        assert_eq!(sanitize_rows(&mut rows), 1);
        let cleaned = &rows[0];
        assert_eq!(cleaned.role_area, "Operations Manager");
        assert_eq!(cleaned.retention_comment, "Backfill focus with experience.");
        assert_eq!(cleaned.notes, "Transferred from legacy team.");
        for text in [
            &cleaned.capability_comment,
            &cleaned.retention_comment,
            &cleaned.notes,
        ] {
            assert!(!contains_legacy_token(text));
        }
        assert_eq!(rows[1].role_area, "Tech");
    }
}
