//! The working session over the row store.
//!
//! Every row crossing the store boundary is scrubbed: after a load and before a save.

use std::collections::BTreeMap;
use std::io::Write;
use std::str::FromStr;

use log::{debug, info};
use snafu::prelude::*;

use crate::workbench::export::{self, OutputFormat};
use crate::workbench::store::{site_key, RowStore, SITE_KEY_PREFIX};
use crate::workbench::*;

/// A field the user may change by hand.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum EditableField {
    RoleArea,
    /// Criticality or one of the capability metrics.
    Metric(Attribute),
    RetentionRisk,
    CapabilityComment,
    RetentionComment,
    Notes,
}

impl FromStr for EditableField {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match compact.as_str() {
            "capabilitycomment" => return Ok(EditableField::CapabilityComment),
            "retentioncomment" => return Ok(EditableField::RetentionComment),
            "notes" | "note" => return Ok(EditableField::Notes),
            _ => {}
        }
        match s.parse::<Attribute>() {
            Ok(Attribute::RoleArea) => Ok(EditableField::RoleArea),
            Ok(Attribute::RetentionRisk) => Ok(EditableField::RetentionRisk),
            Ok(a) => Ok(EditableField::Metric(a)),
            Err(_) => UnknownFieldSnafu { field: s }.fail(),
        }
    }
}

/// Counts reported by `update_tool_data`.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct UpdateSummary {
    pub sites: usize,
    pub added: usize,
    pub updated: usize,
}

fn same_role(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

fn parse_metric(field: EditableField, value: &str) -> ToolResult<Option<f64>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    match columns::parse_score(value) {
        Some(x) => Ok(Some(round_one_decimal(x))),
        None => InvalidScoreSnafu {
            field: format!("{:?}", field),
            value,
        }
        .fail(),
    }
}

fn metric_slot(row: &mut PersistedRow, attribute: Attribute) -> Option<&mut Option<f64>> {
    match attribute {
        Attribute::Criticality => Some(&mut row.criticality),
        Attribute::TechnicalKnowledge => Some(&mut row.cap_tech),
        Attribute::Experience => Some(&mut row.cap_experience),
        Attribute::CrisisManagement => Some(&mut row.cap_crisis),
        Attribute::LeadershipCommunication => Some(&mut row.cap_lead_comm),
        Attribute::Safety => Some(&mut row.cap_safety),
        Attribute::RoleArea | Attribute::RetentionRisk => None,
    }
}

fn apply_edit(row: &mut PersistedRow, field: EditableField, value: &str) -> ToolResult<()> {
    match field {
        EditableField::RoleArea => row.role_area = value.trim().to_string(),
        EditableField::Metric(attribute) => {
            let x = parse_metric(field, value)?;
            let slot = metric_slot(row, attribute).context(UnknownFieldSnafu {
                field: attribute.name(),
            })?;
            *slot = x;
            if CAPABILITY_METRICS.contains(&attribute) {
                row.capability_avg = capability_average(&row.capability_metrics());
            }
        }
        EditableField::RetentionRisk => {
            row.retention_risk = retention_risk_code(value).unwrap_or_default()
        }
        EditableField::CapabilityComment => row.capability_comment = value.to_string(),
        EditableField::RetentionComment => row.retention_comment = value.to_string(),
        EditableField::Notes => row.notes = value.to_string(),
    }
    Ok(())
}

pub struct Workbench<S: RowStore> {
    store: S,
}

impl<S: RowStore> Workbench<S> {
    pub fn new(store: S) -> Workbench<S> {
        Workbench { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn load_rows_for_key(&self, key: &str) -> ToolResult<Vec<PersistedRow>> {
        let mut rows = self.store.load(key)?.unwrap_or_default();
        let changed = sanitize_rows(&mut rows);
        if changed > 0 {
            debug!("load_rows_for_key: {:?}: scrubbed {} row(s)", key, changed);
        }
        Ok(rows)
    }

    fn save_key(&mut self, key: &str, rows: &mut [PersistedRow]) -> ToolResult<()> {
        sanitize_rows(rows);
        self.store.save(key, rows)
    }

    /// The stored rows of a site, scrubbed. Empty when the site was never saved.
    pub fn load_rows_for_site(&self, site: &str) -> ToolResult<Vec<PersistedRow>> {
        self.load_rows_for_key(&site_key(site))
    }

    pub fn save_rows(&mut self, site: &str, rows: &[PersistedRow]) -> ToolResult<()> {
        let mut rows = rows.to_vec();
        self.save_key(&site_key(site), &mut rows)
    }

    /// Every stored site with its rows, in key order.
    pub fn load_all(&self) -> ToolResult<Vec<(String, Vec<PersistedRow>)>> {
        let mut res = Vec::new();
        for key in self.store.keys()? {
            let rows = self.load_rows_for_key(&key)?;
            let name = match rows.first() {
                Some(r) if !r.mill.is_empty() => r.mill.clone(),
                _ => key.trim_start_matches(SITE_KEY_PREFIX).to_string(),
            };
            res.push((name, rows));
        }
        Ok(res)
    }

    /// Merges a consolidation into the stored rows.
    ///
    /// Rows are matched per site on the role area, ignoring case. A stored row matches at
    /// most one incoming row and takes its metrics, risk and comments but keeps its notes.
    /// Unmatched roles are appended.
    pub fn update_tool_data(&mut self, consolidated: &[ConsolidatedRow]) -> ToolResult<UpdateSummary> {
        let mut by_site: BTreeMap<String, Vec<&ConsolidatedRow>> = BTreeMap::new();
        for row in consolidated.iter() {
            by_site.entry(scrub_legacy_text(&row.mill)).or_default().push(row);
        }

        let mut summary = UpdateSummary::default();
        for (site, rows) in by_site.iter() {
            let key = site_key(site);
            let mut stored = self.load_rows_for_key(&key)?;
            // Only rows stored before this update can match, each one once.
            let mut matched = vec![false; stored.len()];
            for row in rows.iter() {
                let role = scrub_legacy_text(&row.role_area);
                let hit = (0..matched.len())
                    .find(|&i| !matched[i] && same_role(&stored[i].role_area, &role));
                match hit {
                    Some(i) => {
                        stored[i].merge_consolidated(row);
                        matched[i] = true;
                        summary.updated += 1;
                    }
                    None => {
                        stored.push(PersistedRow::from(*row));
                        summary.added += 1;
                    }
                }
            }
            self.save_key(&key, &mut stored)?;
            summary.sites += 1;
            debug!("update_tool_data: {:?}: {} row(s) stored", site, stored.len());
        }
        info!(
            "Updated {} site(s): {} added, {} updated",
            summary.sites, summary.added, summary.updated
        );
        Ok(summary)
    }

    /// Sets one field of a stored row and returns the row as saved.
    pub fn edit_field(
        &mut self,
        site: &str,
        role: &str,
        field: EditableField,
        value: &str,
    ) -> ToolResult<PersistedRow> {
        let key = site_key(site);
        let mut rows = self.load_rows_for_key(&key)?;
        ensure!(!rows.is_empty(), UnknownSiteSnafu { site });
        let idx = rows
            .iter()
            .position(|r| same_role(&r.role_area, role))
            .context(UnknownRoleSnafu { site, role })?;
        apply_edit(&mut rows[idx], field, value)?;
        self.save_key(&key, &mut rows)?;
        info!("Edited {:?} of {:?} at {:?}", field, role, site);
        Ok(rows[idx].clone())
    }

    /// Writes the rows of every stored site. Returns the number of rows written.
    pub fn export_all<W: Write>(&self, format: OutputFormat, writer: &mut W) -> ToolResult<usize> {
        let rows: Vec<PersistedRow> = self
            .load_all()?
            .into_iter()
            .flat_map(|(_, rows)| rows)
            .collect();
        export::write_rows(format, &rows, writer)?;
        Ok(rows.len())
    }

    /// Rewrites every stored entry scrubbed. Returns the number of rows that changed.
    pub fn scrub_all(&mut self) -> ToolResult<usize> {
        let mut total = 0;
        for key in self.store.keys()? {
            let mut rows = self.store.load(&key)?.unwrap_or_default();
            let changed = sanitize_rows(&mut rows);
            if changed > 0 {
                self.store.save(&key, &rows)?;
                info!("Scrubbed {} row(s) of {:?}", changed, key);
            }
            total += changed;
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbench::store::MemoryStore;

    fn tainted(role: &str) -> PersistedRow {
        PersistedRow {
            mill: "Jönköping".to_string(),
            role_area: role.to_string(),
            cap_tech: Some(3.0),
            cap_safety: Some(2.0),
            capability_avg: Some(2.5),
            retention_risk: "H".to_string(),
            capability_comment: "Trained at Thilmany".to_string(),
            notes: "Moved from Mosinee".to_string(),
            ..PersistedRow::default()
        }
    }

    fn is_clean(row: &PersistedRow) -> bool {
        [
            &row.mill,
            &row.role_area,
            &row.capability_comment,
            &row.retention_comment,
            &row.notes,
        ]
        .iter()
        .all(|t| !contains_legacy_token(t))
    }

    // Written straight to the store, past the workbench.
    fn seeded(rows: Vec<PersistedRow>) -> Workbench<MemoryStore> {
        let mut store = MemoryStore::default();
        store.save(&site_key("Jönköping"), &rows).unwrap();
        Workbench::new(store)
    }

    fn stored(wb: &Workbench<MemoryStore>, site: &str) -> Vec<PersistedRow> {
        wb.store().load(&site_key(site)).unwrap().unwrap_or_default()
    }

    #[test]
    fn fields_by_name() {
        assert_eq!("notes".parse::<EditableField>().unwrap(), EditableField::Notes);
        assert_eq!("roleArea".parse::<EditableField>().unwrap(), EditableField::RoleArea);
        assert_eq!(
            "capLeadComm".parse::<EditableField>().unwrap(),
            EditableField::Metric(Attribute::LeadershipCommunication)
        );
        assert_eq!(
            "Retention Risk".parse::<EditableField>().unwrap(),
            EditableField::RetentionRisk
        );
        assert_eq!(
            "capability_comment".parse::<EditableField>().unwrap(),
            EditableField::CapabilityComment
        );
        assert!(matches!(
            "salary".parse::<EditableField>(),
            Err(ToolError::UnknownField { .. })
        ));
    }

    #[test]
    fn loads_are_scrubbed() {
        let wb = seeded(vec![tainted("Engineer")]);
        let rows = wb.load_rows_for_site("Jönköping").unwrap();
        assert_eq!(rows.len(), 1);
        assert!(is_clean(&rows[0]));
        assert!(wb.load_rows_for_site("Nowhere").unwrap().is_empty());
    }

    #[test]
    fn saves_are_scrubbed() {
        let mut wb = Workbench::new(MemoryStore::default());
        wb.save_rows("Jönköping", &[tainted("Engineer (MOS)")]).unwrap();
        let saved = stored(&wb, "Jönköping");
        assert_eq!(saved[0].role_area, "Engineer");
        assert!(saved.iter().all(is_clean));
    }

    #[test]
    fn update_merges_by_role_and_keeps_notes() {
        let mut existing = tainted("engineer");
        existing.notes = "Mentor lined up".to_string();
        let mut wb = seeded(vec![existing, tainted("Fitter")]);

        let incoming = vec![
            ConsolidatedRow {
                mill: "Jönköping".to_string(),
                role_area: "Engineer".to_string(),
                cap_tech: Some(4.0),
                capability_avg: Some(4.0),
                retention_risk: "L".to_string(),
                capability_comment: "Ex Mosinee lead".to_string(),
                ..ConsolidatedRow::default()
            },
            ConsolidatedRow {
                mill: "Jönköping".to_string(),
                role_area: "Planner".to_string(),
                ..ConsolidatedRow::default()
            },
        ];
        let summary = wb.update_tool_data(&incoming).unwrap();
        assert_eq!(
            summary,
            UpdateSummary {
                sites: 1,
                added: 1,
                updated: 1
            }
        );

        let saved = stored(&wb, "Jönköping");
        assert!(saved.iter().all(is_clean));
        let roles: Vec<&str> = saved.iter().map(|r| r.role_area.as_str()).collect();
        assert_eq!(roles, vec!["Engineer", "Fitter", "Planner"]);
        assert_eq!(saved[0].cap_tech, Some(4.0));
        assert_eq!(saved[0].retention_risk, "L");
        assert_eq!(saved[0].notes, "Mentor lined up");
    }

    #[test]
    fn roles_differing_in_case_are_both_kept() {
        let incoming = vec![
            ConsolidatedRow {
                mill: "Skogsvik".to_string(),
                role_area: "Tech".to_string(),
                criticality: Some(1.0),
                ..ConsolidatedRow::default()
            },
            ConsolidatedRow {
                mill: "Skogsvik".to_string(),
                role_area: "tech".to_string(),
                criticality: Some(5.0),
                ..ConsolidatedRow::default()
            },
        ];

        let mut wb = Workbench::new(MemoryStore::default());
        let summary = wb.update_tool_data(&incoming).unwrap();
        assert_eq!((summary.added, summary.updated), (2, 0));
        let saved: Vec<(String, Option<f64>)> = stored(&wb, "Skogsvik")
            .into_iter()
            .map(|r| (r.role_area, r.criticality))
            .collect();
        assert_eq!(
            saved,
            vec![
                ("Tech".to_string(), Some(1.0)),
                ("tech".to_string(), Some(5.0))
            ]
        );

        // A second run updates both rows in place.
        let summary = wb.update_tool_data(&incoming).unwrap();
        assert_eq!((summary.added, summary.updated), (0, 2));
        assert_eq!(stored(&wb, "Skogsvik").len(), 2);
    }

    #[test]
    fn edits_recompute_the_average() {
        let mut wb = seeded(vec![tainted("Engineer")]);
        let row = wb
            .edit_field(
                "Jönköping",
                " ENGINEER ",
                EditableField::Metric(Attribute::Safety),
                "4,04",
            )
            .unwrap();
        assert_eq!(row.cap_safety, Some(4.0));
        assert_eq!(row.capability_avg, Some(3.5));
        assert!(is_clean(&row));
        assert!(stored(&wb, "Jönköping").iter().all(is_clean));

        let row = wb
            .edit_field(
                "Jönköping",
                "Engineer",
                EditableField::Metric(Attribute::Criticality),
                "5",
            )
            .unwrap();
        assert_eq!(row.criticality, Some(5.0));
        assert_eq!(row.capability_avg, Some(3.5));

        let row = wb
            .edit_field(
                "Jönköping",
                "Engineer",
                EditableField::Metric(Attribute::TechnicalKnowledge),
                "",
            )
            .unwrap();
        assert_eq!(row.cap_tech, None);
        assert_eq!(row.capability_avg, Some(4.0));

        let row = wb
            .edit_field("Jönköping", "Engineer", EditableField::RetentionRisk, "medium")
            .unwrap();
        assert_eq!(row.retention_risk, "M");
    }

    #[test]
    fn edit_errors() {
        let mut wb = seeded(vec![tainted("Engineer")]);
        assert!(matches!(
            wb.edit_field("Nowhere", "Engineer", EditableField::Notes, "x"),
            Err(ToolError::UnknownSite { .. })
        ));
        assert!(matches!(
            wb.edit_field("Jönköping", "Pilot", EditableField::Notes, "x"),
            Err(ToolError::UnknownRole { .. })
        ));
        assert!(matches!(
            wb.edit_field(
                "Jönköping",
                "Engineer",
                EditableField::Metric(Attribute::Safety),
                "high"
            ),
            Err(ToolError::InvalidScore { .. })
        ));
    }

    #[test]
    fn exports_are_scrubbed() {
        let wb = seeded(vec![tainted("Engineer (THI)")]);
        let mut out: Vec<u8> = Vec::new();
        let count = wb.export_all(OutputFormat::Csv, &mut out).unwrap();
        assert_eq!(count, 1);
        let text = String::from_utf8(out).unwrap();
        assert!(!contains_legacy_token(&text));
        assert!(text.contains("Jönköping,Engineer,"));
    }

    #[test]
    fn scrub_rewrites_the_store() {
        let mut wb = seeded(vec![tainted("Engineer")]);
        let clean = PersistedRow {
            mill: "Skogsvik".to_string(),
            role_area: "Fitter".to_string(),
            ..PersistedRow::default()
        };
        wb.save_rows("Skogsvik", &[clean]).unwrap();

        assert_eq!(wb.scrub_all().unwrap(), 1);
        assert!(stored(&wb, "Jönköping").iter().all(is_clean));
        assert_eq!(wb.scrub_all().unwrap(), 0);

        let all = wb.load_all().unwrap();
        let names: Vec<&str> = all.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Jönköping", "Skogsvik"]);
    }
}
