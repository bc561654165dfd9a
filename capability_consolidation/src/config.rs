// ********* Input data structures ***********

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// One uploaded record: the raw header/value pairs, in source column order.
///
/// Headers are not fixed across export vintages. The order of the pairs is the
/// order in which the comment collectors discover comment columns.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SourceRow {
    fields: Vec<(String, String)>,
}

impl SourceRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> SourceRow
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        SourceRow {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The first value stored under a header, compared with `normalize_header`.
    pub fn get(&self, header: &str) -> Option<&str> {
        let wanted = normalize_header(header);
        self.fields
            .iter()
            .find(|(h, _)| normalize_header(h) == wanted)
            .map(|(_, v)| v.as_str())
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// True when every value is empty or whitespace.
    pub fn is_blank(&self) -> bool {
        self.fields.iter().all(|(_, v)| v.trim().is_empty())
    }
}

/// Header comparison key: trimmed, lower case, inner whitespace collapsed.
pub fn normalize_header(header: &str) -> String {
    header
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

/// The rows of one uploaded file. The file name is the only input of the site normalizer.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SiteFileGroup {
    pub file_name: String,
    pub rows: Vec<SourceRow>,
}

impl SiteFileGroup {
    pub fn new(file_name: impl Into<String>, rows: Vec<SourceRow>) -> SiteFileGroup {
        SiteFileGroup {
            file_name: file_name.into(),
            rows,
        }
    }
}

// ******** Output data structures *********

/// (canonical site name, role area)
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct AggregationKey {
    pub site: String,
    pub role_area: String,
}

/// One aggregate per (site, role), produced at the end of a consolidation run.
#[derive(PartialEq, Debug, Clone, Default, Serialize)]
pub struct ConsolidatedRow {
    pub mill: String,
    #[serde(rename = "roleArea")]
    pub role_area: String,
    pub criticality: Option<f64>,
    #[serde(rename = "capTech")]
    pub cap_tech: Option<f64>,
    #[serde(rename = "capExperience")]
    pub cap_experience: Option<f64>,
    #[serde(rename = "capCrisis")]
    pub cap_crisis: Option<f64>,
    #[serde(rename = "capLeadComm")]
    pub cap_lead_comm: Option<f64>,
    #[serde(rename = "capSafety")]
    pub cap_safety: Option<f64>,
    #[serde(rename = "capabilityAvg")]
    pub capability_avg: Option<f64>,
    /// Single upper-case letter, or empty when no risk was ever given.
    #[serde(rename = "retentionRisk")]
    pub retention_risk: String,
    #[serde(rename = "capabilityComment")]
    pub capability_comment: String,
    #[serde(rename = "retentionComment")]
    pub retention_comment: String,
}

/// The editable working row kept in the row store.
///
/// Every text field is scrubbed by the sanitizer on each load, save and export.
#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedRow {
    pub mill: String,
    #[serde(rename = "roleArea")]
    pub role_area: String,
    pub criticality: Option<f64>,
    #[serde(rename = "capTech")]
    pub cap_tech: Option<f64>,
    #[serde(rename = "capExperience")]
    pub cap_experience: Option<f64>,
    #[serde(rename = "capCrisis")]
    pub cap_crisis: Option<f64>,
    #[serde(rename = "capLeadComm")]
    pub cap_lead_comm: Option<f64>,
    #[serde(rename = "capSafety")]
    pub cap_safety: Option<f64>,
    #[serde(rename = "capabilityAvg")]
    pub capability_avg: Option<f64>,
    #[serde(rename = "retentionRisk")]
    pub retention_risk: String,
    #[serde(rename = "capabilityComment")]
    pub capability_comment: String,
    #[serde(rename = "retentionComment")]
    pub retention_comment: String,
    pub notes: String,
}

impl PersistedRow {
    /// The five capability metrics, in display order.
    pub fn capability_metrics(&self) -> [Option<f64>; 5] {
        [
            self.cap_tech,
            self.cap_experience,
            self.cap_crisis,
            self.cap_lead_comm,
            self.cap_safety,
        ]
    }

    /// Overwrites the consolidated values, keeping the user's notes.
    pub fn merge_consolidated(&mut self, row: &ConsolidatedRow) {
        let notes = std::mem::take(&mut self.notes);
        *self = PersistedRow::from(row);
        self.notes = notes;
    }
}

impl From<&ConsolidatedRow> for PersistedRow {
    fn from(row: &ConsolidatedRow) -> PersistedRow {
        PersistedRow {
            mill: row.mill.clone(),
            role_area: row.role_area.clone(),
            criticality: row.criticality,
            cap_tech: row.cap_tech,
            cap_experience: row.cap_experience,
            cap_crisis: row.cap_crisis,
            cap_lead_comm: row.cap_lead_comm,
            cap_safety: row.cap_safety,
            capability_avg: row.capability_avg,
            retention_risk: row.retention_risk.clone(),
            capability_comment: row.capability_comment.clone(),
            retention_comment: row.retention_comment.clone(),
            notes: String::new(),
        }
    }
}

/// Drops the notes: the shape returned by a consolidation run.
impl From<&PersistedRow> for ConsolidatedRow {
    fn from(row: &PersistedRow) -> ConsolidatedRow {
        ConsolidatedRow {
            mill: row.mill.clone(),
            role_area: row.role_area.clone(),
            criticality: row.criticality,
            cap_tech: row.cap_tech,
            cap_experience: row.cap_experience,
            cap_crisis: row.cap_crisis,
            cap_lead_comm: row.cap_lead_comm,
            cap_safety: row.cap_safety,
            capability_avg: row.capability_avg,
            retention_risk: row.retention_risk.clone(),
            capability_comment: row.capability_comment.clone(),
            retention_comment: row.retention_comment.clone(),
        }
    }
}

// ********* Display helpers **********

/// Coarse capability level shown next to the average. Never used in the aggregation math.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum CapabilityBucket {
    Low,
    Medium,
    High,
}

impl CapabilityBucket {
    pub fn label(&self) -> &'static str {
        match self {
            CapabilityBucket::Low => "Low",
            CapabilityBucket::Medium => "Medium",
            CapabilityBucket::High => "High",
        }
    }
}

impl Display for CapabilityBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case_and_spacing() {
        let row = SourceRow::from_pairs([("  Role   Area ", "Tech"), ("Safety", "3")]);
        assert_eq!(row.get("role area"), Some("Tech"));
        assert_eq!(row.get("SAFETY"), Some("3"));
        assert_eq!(row.get("Experience"), None);
    }

    #[test]
    fn blank_rows_are_detected() {
        let row = SourceRow::from_pairs([("Role", " "), ("Safety", "")]);
        assert!(row.is_blank());
        assert!(!SourceRow::from_pairs([("Role", "Tech")]).is_blank());
    }

    #[test]
    fn merge_keeps_notes() {
        let consolidated = ConsolidatedRow {
            mill: "Jönköping".to_string(),
            role_area: "Engineer".to_string(),
            criticality: Some(4.0),
            cap_tech: Some(3.0),
            cap_experience: None,
            cap_crisis: None,
            cap_lead_comm: None,
            cap_safety: None,
            capability_avg: Some(3.0),
            retention_risk: "M".to_string(),
            capability_comment: "Alpha".to_string(),
            retention_comment: String::new(),
        };
        let mut persisted = PersistedRow {
            notes: "Follow up in Q3".to_string(),
            criticality: Some(1.0),
            ..PersistedRow::default()
        };
        persisted.merge_consolidated(&consolidated);
        assert_eq!(persisted.criticality, Some(4.0));
        assert_eq!(persisted.capability_comment, "Alpha");
        assert_eq!(persisted.notes, "Follow up in Q3");
    }

    #[test]
    fn plain_rows_drop_the_notes() {
        let persisted = PersistedRow {
            mill: "Jönköping".to_string(),
            role_area: "Engineer".to_string(),
            cap_safety: Some(2.5),
            capability_avg: Some(2.5),
            notes: "Mentor lined up".to_string(),
            ..PersistedRow::default()
        };
        let plain = ConsolidatedRow::from(&persisted);
        assert_eq!(plain.role_area, "Engineer");
        assert_eq!(plain.cap_safety, Some(2.5));
        let back = PersistedRow::from(&plain);
        assert_eq!(back.notes, "");
        assert_eq!(back.capability_avg, Some(2.5));
    }
}
