//! Filename to site display name.

use log::debug;

/// A substring rule: a folded filename containing `pattern` belongs to `site`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SiteRule {
    pattern: String,
    site: String,
}

impl SiteRule {
    pub fn new(pattern: &str, site: &str) -> SiteRule {
        SiteRule {
            pattern: fold_file_name(pattern),
            site: site.to_string(),
        }
    }
}

// Multi-word rules must stay ahead of the shorter ones they contain.
const DEFAULT_RULES: &[(&str, &str)] = &[
    ("pulp and paper", "Billingfors Paper and Shared"),
    ("paper and shared", "Billingfors Paper and Shared"),
    ("billingfors pulp", "Billingfors Pulp"),
    ("jonkoping", "Jönköping"),
];

/// Ordered substring rules, first match wins.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SiteNormalizer {
    rules: Vec<SiteRule>,
}

impl Default for SiteNormalizer {
    fn default() -> Self {
        SiteNormalizer {
            rules: DEFAULT_RULES
                .iter()
                .map(|(pattern, site)| SiteRule::new(pattern, site))
                .collect(),
        }
    }
}

impl SiteNormalizer {
    /// Places extra rules ahead of the current ones.
    pub fn with_leading_rules(self, extra: Vec<SiteRule>) -> SiteNormalizer {
        let mut rules = extra;
        rules.extend(self.rules);
        SiteNormalizer { rules }
    }

    /// The canonical site for a file name, or the file name itself when no rule matches.
    pub fn normalize(&self, file_name: &str) -> String {
        let folded = fold_file_name(file_name);
        match self.rules.iter().find(|r| folded.contains(&r.pattern)) {
            Some(rule) => {
                debug!(
                    "normalize: {:?} matched {:?} -> {:?}",
                    file_name, rule.pattern, rule.site
                );
                rule.site.clone()
            }
            None => {
                debug!("normalize: no site rule for {:?}", file_name);
                file_name.to_string()
            }
        }
    }
}

/// Normalises a file name with the default rules.
pub fn normalise_site(file_name: &str) -> String {
    SiteNormalizer::default().normalize(file_name)
}

// Lower case, separators to spaces, Nordic vowels to ASCII, whitespace collapsed.
fn fold_file_name(name: &str) -> String {
    let mapped: String = name
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '_' | '-' | '.' => ' ',
            'ö' | 'ø' => 'o',
            'å' | 'ä' | 'æ' => 'a',
            'é' | 'è' => 'e',
            c => c,
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<&str>>().join(" ")
}
