//! Header resolution for the logical attributes of an assessment row.
//!
//! Export vintages spell the same column differently. Each attribute carries an ordered
//! list of accepted spellings; the first spelling present with a non-empty value wins.
//! New spellings are a data change: extend the table with `ColumnTable::add_aliases`.

use log::debug;
use std::collections::HashMap;
use std::str::FromStr;

use crate::config::{normalize_header, SourceRow};

/// The logical attributes read from a row.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Attribute {
    RoleArea,
    Criticality,
    TechnicalKnowledge,
    Experience,
    CrisisManagement,
    LeadershipCommunication,
    Safety,
    RetentionRisk,
}

/// The six averaged metrics, in output order.
pub const METRICS: [Attribute; 6] = [
    Attribute::Criticality,
    Attribute::TechnicalKnowledge,
    Attribute::Experience,
    Attribute::CrisisManagement,
    Attribute::LeadershipCommunication,
    Attribute::Safety,
];

/// The five capability sub-metrics that make up the capability average.
pub const CAPABILITY_METRICS: [Attribute; 5] = [
    Attribute::TechnicalKnowledge,
    Attribute::Experience,
    Attribute::CrisisManagement,
    Attribute::LeadershipCommunication,
    Attribute::Safety,
];

impl Attribute {
    pub const ALL: [Attribute; 8] = [
        Attribute::RoleArea,
        Attribute::Criticality,
        Attribute::TechnicalKnowledge,
        Attribute::Experience,
        Attribute::CrisisManagement,
        Attribute::LeadershipCommunication,
        Attribute::Safety,
        Attribute::RetentionRisk,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Attribute::RoleArea => "Role Area",
            Attribute::Criticality => "Criticality",
            Attribute::TechnicalKnowledge => "Technical Knowledge",
            Attribute::Experience => "Experience",
            Attribute::CrisisManagement => "Crisis Management",
            Attribute::LeadershipCommunication => "Leadership/Communication",
            Attribute::Safety => "Safety",
            Attribute::RetentionRisk => "Retention Risk",
        }
    }

    fn default_headers(&self) -> &'static [&'static str] {
        match self {
            Attribute::RoleArea => &["Role Area", "Role", "Role/Area", "Position"],
            Attribute::Criticality => &["Criticality", "Role Criticality"],
            Attribute::TechnicalKnowledge => &["Technical Knowledge", "Tech", "Technical"],
            Attribute::Experience => &["Experience", "Exp"],
            Attribute::CrisisManagement => &["Crisis Management", "Crisis"],
            Attribute::LeadershipCommunication => &[
                "Leadership/Communication",
                "Leadership & Communication",
                "LeadComm",
                "Leadership",
            ],
            Attribute::Safety => &["Safety"],
            Attribute::RetentionRisk => &["Retention Risk", "Risk"],
        }
    }
}

/// Accepts the display name or a compact spelling such as `leadcomm`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct UnknownAttribute(pub String);

impl std::fmt::Display for UnknownAttribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown attribute {:?}", self.0)
    }
}

impl std::error::Error for UnknownAttribute {}

impl FromStr for Attribute {
    type Err = UnknownAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match compact.as_str() {
            "rolearea" | "role" => Ok(Attribute::RoleArea),
            "criticality" => Ok(Attribute::Criticality),
            "technicalknowledge" | "tech" | "captech" => Ok(Attribute::TechnicalKnowledge),
            "experience" | "exp" | "capexperience" => Ok(Attribute::Experience),
            "crisismanagement" | "crisis" | "capcrisis" => Ok(Attribute::CrisisManagement),
            "leadershipcommunication" | "leadcomm" | "capleadcomm" => {
                Ok(Attribute::LeadershipCommunication)
            }
            "safety" | "capsafety" => Ok(Attribute::Safety),
            "retentionrisk" | "risk" => Ok(Attribute::RetentionRisk),
            _ => Err(UnknownAttribute(s.to_string())),
        }
    }
}

/// Attribute -> ordered accepted header spellings.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnTable {
    headers: HashMap<Attribute, Vec<String>>,
}

impl Default for ColumnTable {
    fn default() -> Self {
        ColumnTable {
            headers: Attribute::ALL
                .iter()
                .map(|a| {
                    (
                        *a,
                        a.default_headers()
                            .iter()
                            .map(|h| normalize_header(h))
                            .collect(),
                    )
                })
                .collect(),
        }
    }
}

impl ColumnTable {
    /// Appends spellings after the existing ones. Duplicates are ignored.
    pub fn add_aliases(&mut self, attribute: Attribute, aliases: &[String]) {
        let entry = self.headers.entry(attribute).or_default();
        for alias in aliases {
            let h = normalize_header(alias);
            if !h.is_empty() && !entry.contains(&h) {
                entry.push(h);
            }
        }
    }

    pub fn headers(&self, attribute: Attribute) -> &[String] {
        self.headers
            .get(&attribute)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// The first non-empty value found under the attribute's spellings, trimmed.
    pub fn resolve_text<'a>(&self, row: &'a SourceRow, attribute: Attribute) -> Option<&'a str> {
        for candidate in self.headers(attribute) {
            let found = row
                .fields()
                .filter(|(h, _)| normalize_header(h) == *candidate)
                .map(|(_, v)| v.trim())
                .find(|v| !v.is_empty());
            if found.is_some() {
                return found;
            }
        }
        None
    }

    /// The resolved value as a number. Blank and non-numeric values are absent, not zero.
    pub fn resolve_number(&self, row: &SourceRow, attribute: Attribute) -> Option<f64> {
        let raw = self.resolve_text(row, attribute)?;
        let res = parse_score(raw);
        if res.is_none() {
            debug!(
                "resolve_number: ignoring non-numeric {:?} for {:?}",
                raw, attribute
            );
        }
        res
    }
}

/// Parses a score, accepting a decimal comma when no dot is present.
pub fn parse_score(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let parsed = match s.parse::<f64>() {
        Ok(x) => Some(x),
        Err(_) if !s.contains('.') && s.matches(',').count() == 1 => {
            s.replace(',', ".").parse::<f64>().ok()
        }
        Err(_) => None,
    };
    parsed.filter(|x| x.is_finite())
}
