use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::workbench::*;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "outputPath")]
    pub output_path: Option<String>,
    /// json, csv or html
    pub format: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    /// csv or excel. Inferred from the extension when missing.
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: String,
    #[serde(rename = "worksheetName")]
    pub worksheet_name: Option<String>,
}

impl FileSource {
    pub fn new(file_path: &str, worksheet_name: Option<String>) -> FileSource {
        FileSource {
            provider: None,
            file_path: file_path.to_string(),
            worksheet_name,
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SiteRuleConfig {
    pub pattern: String,
    pub site: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(rename = "sourceFiles", default)]
    pub source_files: Vec<FileSource>,
    #[serde(rename = "storeDirectory")]
    pub store_directory: Option<String>,
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "siteRules", default)]
    pub site_rules: Vec<SiteRuleConfig>,
    /// Attribute name (for example "Experience") -> extra header spellings.
    #[serde(rename = "columnAliases", default)]
    pub column_aliases: BTreeMap<String, Vec<String>>,
}

impl ToolConfig {
    /// The consolidator with the configured site rules and header spellings.
    pub fn consolidator(&self) -> ToolResult<Consolidator> {
        let rules: Vec<SiteRule> = self
            .site_rules
            .iter()
            .map(|r| SiteRule::new(&r.pattern, &r.site))
            .collect();
        let mut columns = ColumnTable::default();
        for (name, aliases) in self.column_aliases.iter() {
            let attribute: Attribute = name
                .parse()
                .context(UnknownAttributeSnafu { name: name.clone() })?;
            columns.add_aliases(attribute, aliases);
        }
        Ok(Consolidator::new(
            SiteNormalizer::default().with_leading_rules(rules),
            columns,
        ))
    }

    // Relative paths are read from the directory of the configuration file.
    fn resolve_paths(&mut self, root: &Path) {
        let resolve = |p: &str| -> String {
            let path = Path::new(p);
            if path.is_absolute() || p == "stdout" {
                p.to_string()
            } else {
                let joined: PathBuf = root.join(path);
                joined.display().to_string()
            }
        };
        for cfs in self.source_files.iter_mut() {
            cfs.file_path = resolve(&cfs.file_path);
        }
        self.store_directory = self.store_directory.as_deref().map(&resolve);
        self.output_settings.output_path = self.output_settings.output_path.as_deref().map(&resolve);
    }
}

pub fn read_config(path: &str) -> ToolResult<ToolConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let mut config: ToolConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    let root = Path::new(path).parent().unwrap_or_else(|| Path::new(""));
    config.resolve_paths(root);
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// Reads a reference consolidation, as written by the json output.
pub fn read_reference(path: &str) -> ToolResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}
