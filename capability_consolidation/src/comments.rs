//! Loose discovery of comment columns.

use log::debug;

/// Pieces inside one cell are separated by this character.
pub const PIECE_DELIMITER: char = '|';

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CommentKind {
    Capability,
    Retention,
}

impl CommentKind {
    fn topic(&self) -> &'static str {
        match self {
            CommentKind::Capability => "capability",
            CommentKind::Retention => "retention",
        }
    }
}

// Matched against the lower-cased header.
#[derive(Eq, PartialEq, Debug, Clone)]
enum HeaderPattern {
    Contains(&'static str, &'static str),
    EndsWith(&'static str, &'static str),
}

impl HeaderPattern {
    fn matches(&self, header: &str) -> bool {
        match self {
            HeaderPattern::Contains(a, b) => header.contains(a) && header.contains(b),
            HeaderPattern::EndsWith(a, suffix) => header.contains(a) && header.ends_with(suffix),
        }
    }
}

/// Gathers every comment-like column of one category from a row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CommentCollector {
    kind: CommentKind,
    patterns: Vec<HeaderPattern>,
}

impl CommentCollector {
    pub fn new(kind: CommentKind) -> CommentCollector {
        let topic = kind.topic();
        CommentCollector {
            kind,
            patterns: vec![
                HeaderPattern::Contains(topic, "comment"),
                HeaderPattern::EndsWith(topic, "-2024"),
                HeaderPattern::EndsWith(topic, "_additional"),
            ],
        }
    }

    pub fn matches_header(&self, header: &str) -> bool {
        let lower = header.trim().to_lowercase();
        self.patterns.iter().any(|p| p.matches(&lower))
    }

    /// The row's comments as one string: each matching cell split on `|`, trimmed, joined
    /// with newlines, then all matching cells joined with newlines in header order.
    pub fn collect(&self, row: &crate::config::SourceRow) -> Option<String> {
        let texts: Vec<String> = row
            .fields()
            .filter(|(h, _)| self.matches_header(h))
            .filter_map(|(_, v)| split_pieces(v))
            .collect();
        if texts.is_empty() {
            None
        } else {
            Some(texts.join("\n"))
        }
    }

    /// Appends the row's comments as a single entry, if it has any.
    pub fn gather(&self, row: &crate::config::SourceRow, entries: &mut Vec<String>) {
        if let Some(text) = self.collect(row) {
            debug!("gather: {:?} comment entry {:?}", self.kind, text);
            entries.push(text);
        }
    }
}

fn split_pieces(value: &str) -> Option<String> {
    let pieces: Vec<&str> = value
        .split(PIECE_DELIMITER)
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect();
    if pieces.is_empty() {
        None
    } else {
        Some(pieces.join("\n"))
    }
}
