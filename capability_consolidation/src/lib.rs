mod config;

pub mod builder;
pub mod columns;
pub mod comments;
pub mod manual;
pub mod sanitize;
pub mod site;

use log::{debug, info, warn};

use std::{
    collections::{HashMap, HashSet},
    ops::AddAssign,
};

pub use crate::columns::{Attribute, ColumnTable, CAPABILITY_METRICS, METRICS};
pub use crate::comments::{CommentCollector, CommentKind};
pub use crate::config::*;
pub use crate::sanitize::{contains_legacy_token, sanitize_row, sanitize_rows, scrub_legacy_text};
pub use crate::site::{normalise_site, SiteNormalizer, SiteRule};

// **** Private structures ****

// Running sum of one metric. Each metric counts its own values only.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
struct MetricTally {
    sum: f64,
    count: u32,
}

impl MetricTally {
    fn mean(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(round_one_decimal(self.sum / self.count as f64))
        }
    }
}

impl AddAssign<f64> for MetricTally {
    fn add_assign(&mut self, rhs: f64) {
        self.sum += rhs;
        self.count += 1;
    }
}

// Owned by a single consolidation run.
#[derive(PartialEq, Debug, Clone, Default)]
struct AggregateEntry {
    // Same order as `METRICS`.
    tallies: [MetricTally; 6],
    cap_comments: Vec<String>,
    ret_comments: Vec<String>,
    retention_risk: Option<String>,
}

impl AggregateEntry {
    fn mean(&self, attribute: Attribute) -> Option<f64> {
        METRICS
            .iter()
            .position(|a| *a == attribute)
            .and_then(|idx| self.tallies[idx].mean())
    }
}

// ********* Public API **********

/// Rounds half away from zero to one decimal place.
pub fn round_one_decimal(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

/// The mean of the capability means that are present, rounded to one decimal.
///
/// The inputs are expected to be already rounded: the average is taken over the rounded
/// per-metric means, not over the raw scores.
pub fn capability_average(means: &[Option<f64>]) -> Option<f64> {
    let present: Vec<f64> = means.iter().flatten().cloned().collect();
    if present.is_empty() {
        None
    } else {
        Some(round_one_decimal(
            present.iter().sum::<f64>() / present.len() as f64,
        ))
    }
}

/// Single-letter code of a retention risk rating: "High" -> "H", "medium" -> "M".
pub fn retention_risk_code(rating: &str) -> Option<String> {
    rating
        .trim()
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
}

/// Display bucket for a capability average. Not part of the aggregation math.
pub fn bucket_capability(avg: f64) -> CapabilityBucket {
    if avg < 2.0 {
        CapabilityBucket::Low
    } else if avg < 3.0 {
        CapabilityBucket::Medium
    } else {
        CapabilityBucket::High
    }
}

/// The site normalizer, column table and comment collectors used for one run.
#[derive(PartialEq, Debug, Clone)]
pub struct Consolidator {
    pub sites: SiteNormalizer,
    pub columns: ColumnTable,
    capability: CommentCollector,
    retention: CommentCollector,
}

impl Default for Consolidator {
    fn default() -> Self {
        Consolidator::new(SiteNormalizer::default(), ColumnTable::default())
    }
}

impl Consolidator {
    pub fn new(sites: SiteNormalizer, columns: ColumnTable) -> Consolidator {
        Consolidator {
            sites,
            columns,
            capability: CommentCollector::new(CommentKind::Capability),
            retention: CommentCollector::new(CommentKind::Retention),
        }
    }

    /// Consolidates the file groups into one row per (site, role), in first-seen order.
    ///
    /// The accumulator lives only for the duration of the call: running twice on the same
    /// input returns the same rows.
    pub fn run(&self, groups: &[SiteFileGroup]) -> Vec<ConsolidatedRow> {
        info!("Consolidating {} file(s)", groups.len());
        let mut order: Vec<AggregationKey> = Vec::new();
        let mut entries: HashMap<AggregationKey, AggregateEntry> = HashMap::new();

        for group in groups.iter() {
            let site = self.sites.normalize(&group.file_name);
            info!(
                "File {:?}: site {:?}, {} row(s)",
                group.file_name,
                site,
                group.rows.len()
            );
            for (idx, row) in group.rows.iter().enumerate() {
                if row.is_blank() {
                    debug!("run: {:?} row {}: blank, skipped", group.file_name, idx);
                    continue;
                }
                let role_area = self
                    .columns
                    .resolve_text(row, Attribute::RoleArea)
                    .unwrap_or("")
                    .to_string();
                let key = AggregationKey {
                    site: site.clone(),
                    role_area,
                };
                let entry = entries.entry(key.clone()).or_insert_with(|| {
                    order.push(key.clone());
                    AggregateEntry::default()
                });
                self.accumulate(row, entry);
                debug!("run: {:?} row {} -> {:?}", group.file_name, idx, key);
            }
        }

        let res: Vec<ConsolidatedRow> = order
            .into_iter()
            .filter_map(|key| entries.remove(&key).map(|e| finish(key, e)))
            .collect();
        info!("Produced {} consolidated row(s)", res.len());
        res
    }

    fn accumulate(&self, row: &SourceRow, entry: &mut AggregateEntry) {
        for (idx, attribute) in METRICS.iter().enumerate() {
            if let Some(x) = self.columns.resolve_number(row, *attribute) {
                entry.tallies[idx] += x;
            }
        }
        self.capability.gather(row, &mut entry.cap_comments);
        self.retention.gather(row, &mut entry.ret_comments);
        if let Some(code) = self
            .columns
            .resolve_text(row, Attribute::RetentionRisk)
            .and_then(retention_risk_code)
        {
            entry.retention_risk = Some(code);
        }
    }
}

fn finish(key: AggregationKey, entry: AggregateEntry) -> ConsolidatedRow {
    let capability_means: Vec<Option<f64>> =
        CAPABILITY_METRICS.iter().map(|a| entry.mean(*a)).collect();
    ConsolidatedRow {
        criticality: entry.mean(Attribute::Criticality),
        cap_tech: entry.mean(Attribute::TechnicalKnowledge),
        cap_experience: entry.mean(Attribute::Experience),
        cap_crisis: entry.mean(Attribute::CrisisManagement),
        cap_lead_comm: entry.mean(Attribute::LeadershipCommunication),
        cap_safety: entry.mean(Attribute::Safety),
        capability_avg: capability_average(&capability_means),
        retention_risk: entry.retention_risk.unwrap_or_default(),
        capability_comment: join_unique(&entry.cap_comments),
        retention_comment: join_unique(&entry.ret_comments),
        mill: key.site,
        role_area: key.role_area,
    }
}

// Identical entries are kept once, at their first position.
fn join_unique(entries: &[String]) -> String {
    let mut seen: HashSet<&str> = HashSet::new();
    entries
        .iter()
        .filter(|e| seen.insert(e.as_str()))
        .map(|e| e.as_str())
        .collect::<Vec<&str>>()
        .join("\n")
}

/// Consolidates the row sets of the uploaded files with the default tables.
///
/// Arguments:
/// * `groups` the parsed rows, one set per uploaded file
/// * `file_names` the name of each uploaded file, in the same order as `groups`
///
/// An empty input gives an empty output.
pub fn consolidate(groups: &[Vec<SourceRow>], file_names: &[String]) -> Vec<ConsolidatedRow> {
    if groups.len() != file_names.len() {
        warn!(
            "consolidate: {} row set(s) but {} file name(s), extra entries ignored",
            groups.len(),
            file_names.len()
        );
    }
    let file_groups: Vec<SiteFileGroup> = groups
        .iter()
        .zip(file_names.iter())
        .map(|(rows, name)| SiteFileGroup::new(name.clone(), rows.clone()))
        .collect();
    Consolidator::default().run(&file_groups)
}
