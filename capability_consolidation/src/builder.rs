pub use crate::config::*;
use crate::{Attribute, ColumnTable, Consolidator, SiteNormalizer, SiteRule};

/// A builder for collecting uploaded files before a consolidation run.
///
/// Extra site rules and header spellings are data, added here rather than in code.
///
/// ```
/// use capability_consolidation::builder::Builder;
/// use capability_consolidation::{Attribute, SourceRow};
///
/// let mut builder = Builder::new()
///     .site_rule("skogsvik", "Skogsvik")
///     .column_aliases(Attribute::Experience, &["Years".to_string()]);
///
/// builder.add_file(
///     "skogsvik_2024.csv",
///     vec![SourceRow::from_pairs([("Role", "Tech"), ("Years", "4")])],
/// );
///
/// let rows = builder.consolidate();
/// assert_eq!(rows[0].mill, "Skogsvik");
/// assert_eq!(rows[0].cap_experience, Some(4.0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Builder {
    site_rules: Vec<SiteRule>,
    columns: ColumnTable,
    files: Vec<SiteFileGroup>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Adds a site rule. Added rules are checked in order, before the built-in ones.
    pub fn site_rule(mut self, pattern: &str, site: &str) -> Builder {
        self.site_rules.push(SiteRule::new(pattern, site));
        self
    }

    pub fn column_aliases(mut self, attribute: Attribute, aliases: &[String]) -> Builder {
        self.columns.add_aliases(attribute, aliases);
        self
    }

    /// Adds the rows of one uploaded file.
    pub fn add_file(&mut self, file_name: &str, rows: Vec<SourceRow>) {
        self.files.push(SiteFileGroup::new(file_name, rows));
    }

    pub fn consolidator(&self) -> Consolidator {
        let sites = SiteNormalizer::default().with_leading_rules(self.site_rules.clone());
        Consolidator::new(sites, self.columns.clone())
    }

    pub fn consolidate(&self) -> Vec<ConsolidatedRow> {
        self.consolidator().run(&self.files)
    }
}
