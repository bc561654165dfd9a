use crate::workbench::export::format_score;
use crate::workbench::*;

const COLUMNS: [&str; 10] = [
    "Role Area", "Crit", "Tech", "Exp", "Crisis", "Lead", "Safety", "Avg", "Level", "Risk",
];

fn cells(row: &PersistedRow) -> [String; 10] {
    [
        row.role_area.clone(),
        format_score(row.criticality),
        format_score(row.cap_tech),
        format_score(row.cap_experience),
        format_score(row.cap_crisis),
        format_score(row.cap_lead_comm),
        format_score(row.cap_safety),
        format_score(row.capability_avg),
        row.capability_avg
            .map(|a| bucket_capability(a).to_string())
            .unwrap_or_default(),
        row.retention_risk.clone(),
    ]
}

/// A plain text table of the rows of one site. Comments and notes follow the table.
pub fn render_site(name: &str, rows: &[PersistedRow]) -> String {
    let table: Vec<[String; 10]> = rows.iter().map(cells).collect();
    let mut widths: Vec<usize> = COLUMNS.iter().map(|c| c.chars().count()).collect();
    for r in table.iter() {
        for (w, c) in widths.iter_mut().zip(r.iter()) {
            *w = (*w).max(c.chars().count());
        }
    }

    let line = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(widths.iter())
            .map(|(v, w)| format!("{:<width$}", v, width = *w))
            .collect::<Vec<String>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![format!("== {} ({} row(s))", name, rows.len())];
    out.push(line(COLUMNS.to_vec()));
    for r in table.iter() {
        out.push(line(r.iter().map(|s| s.as_str()).collect()));
    }
    for row in rows.iter() {
        let extras = [
            ("capability", &row.capability_comment),
            ("retention", &row.retention_comment),
            ("notes", &row.notes),
        ];
        for (label, text) in extras.iter() {
            if !text.is_empty() {
                out.push(format!(
                    "  {} / {}: {}",
                    row.role_area,
                    label,
                    text.replace('\n', " | ")
                ));
            }
        }
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_aligned_rows() {
        let rows = vec![
            PersistedRow {
                mill: "Jönköping".to_string(),
                role_area: "Engineer".to_string(),
                cap_tech: Some(3.0),
                capability_avg: Some(3.0),
                retention_risk: "M".to_string(),
                notes: "Mentor\nlined up".to_string(),
                ..PersistedRow::default()
            },
            PersistedRow {
                mill: "Jönköping".to_string(),
                role_area: "Fitter".to_string(),
                ..PersistedRow::default()
            },
        ];
        let text = render_site("Jönköping", &rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "== Jönköping (2 row(s))");
        assert!(lines[1].starts_with("Role Area  Crit"));
        assert!(lines[2].starts_with("Engineer   "));
        assert!(lines[2].contains("3.0"));
        assert!(lines[2].contains("High"));
        assert_eq!(lines[3], "Fitter");
        assert_eq!(lines[4], "  Engineer / notes: Mentor | lined up");
    }
}
