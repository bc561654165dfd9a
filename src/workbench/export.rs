// Writers for the working rows.

use std::io::Write;
use std::str::FromStr;

use log::debug;
use snafu::prelude::*;

use crate::workbench::io_common::path_extension;
use crate::workbench::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum OutputFormat {
    Json,
    Csv,
    Html,
}

impl OutputFormat {
    /// The format named by the extension of a path, if any.
    pub fn from_path(path: &str) -> Option<OutputFormat> {
        match path_extension(path).as_str() {
            "html" | "htm" => Some(OutputFormat::Html),
            "json" => Some(OutputFormat::Json),
            "csv" => Some(OutputFormat::Csv),
            _ => None,
        }
    }

    /// An explicit format name wins, then the extension of the destination, then `fallback`.
    pub fn select(
        name: Option<&str>,
        destination: &str,
        fallback: OutputFormat,
    ) -> ToolResult<OutputFormat> {
        match name {
            Some(n) => n.parse(),
            None => Ok(OutputFormat::from_path(destination).unwrap_or(fallback)),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "html" | "htm" => Ok(OutputFormat::Html),
            x => whatever!("Output format not implemented {:?}", x),
        }
    }
}

pub const EXPORT_HEADERS: [&str; 14] = [
    "Mill",
    "Role Area",
    "Criticality",
    "Technical Knowledge",
    "Experience",
    "Crisis Management",
    "Leadership/Communication",
    "Safety",
    "Capability Avg",
    "Capability Level",
    "Retention Risk",
    "Capability Comment",
    "Retention Comment",
    "Notes",
];

/// One decimal, empty when absent.
pub fn format_score(x: Option<f64>) -> String {
    x.map(|v| format!("{:.1}", v)).unwrap_or_default()
}

// Same order as EXPORT_HEADERS.
fn export_record(row: &PersistedRow) -> [String; 14] {
    [
        row.mill.clone(),
        row.role_area.clone(),
        format_score(row.criticality),
        format_score(row.cap_tech),
        format_score(row.cap_experience),
        format_score(row.cap_crisis),
        format_score(row.cap_lead_comm),
        format_score(row.cap_safety),
        format_score(row.capability_avg),
        row.capability_avg
            .map(|a| bucket_capability(a).label().to_string())
            .unwrap_or_default(),
        row.retention_risk.clone(),
        row.capability_comment.clone(),
        row.retention_comment.clone(),
        row.notes.clone(),
    ]
}

pub fn write_csv<W: Write>(rows: &[PersistedRow], writer: &mut W) -> ToolResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_HEADERS).context(CsvWriteSnafu {})?;
    for row in rows.iter() {
        wtr.write_record(export_record(row))
            .context(CsvWriteSnafu {})?;
    }
    wtr.flush().context(WritingOutputSnafu {})?;
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut res = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => res.push_str("&amp;"),
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            '"' => res.push_str("&quot;"),
            '\'' => res.push_str("&#39;"),
            '\n' => res.push_str("<br>"),
            _ => res.push(c),
        }
    }
    res
}

pub fn write_html<W: Write>(rows: &[PersistedRow], writer: &mut W) -> ToolResult<()> {
    let mut out = String::from("<table>\n<thead>\n<tr>");
    for h in EXPORT_HEADERS.iter() {
        out.push_str(&format!("<th>{}</th>", escape_html(h)));
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");
    for row in rows.iter() {
        out.push_str("<tr>");
        for cell in export_record(row).iter() {
            out.push_str(&format!("<td>{}</td>", escape_html(cell)));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody>\n</table>\n");
    writer.write_all(out.as_bytes()).context(WritingOutputSnafu {})
}

pub fn write_rows<W: Write>(
    format: OutputFormat,
    rows: &[PersistedRow],
    writer: &mut W,
) -> ToolResult<()> {
    debug!("write_rows: {} row(s) as {:?}", rows.len(), format);
    match format {
        OutputFormat::Csv => write_csv(rows, writer),
        OutputFormat::Html => write_html(rows, writer),
        OutputFormat::Json => {
            let js = serde_json::to_value(rows).context(WritingJsonSnafu {})?;
            let pretty = serde_json::to_string_pretty(&js).context(WritingJsonSnafu {})?;
            writeln!(writer, "{}", pretty).context(WritingOutputSnafu {})
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbench::io_csv::read_csv_from;

    fn sample() -> PersistedRow {
        PersistedRow {
            mill: "Billingfors Pulp".to_string(),
            role_area: "Shift Lead".to_string(),
            criticality: Some(4.0),
            cap_tech: Some(2.5),
            cap_safety: Some(3.0),
            capability_avg: Some(2.8),
            retention_risk: "H".to_string(),
            capability_comment: "Strong, <fast>\nNeeds cover".to_string(),
            notes: "Q3 \"review\"".to_string(),
            ..PersistedRow::default()
        }
    }

    #[test]
    fn formats_by_name_and_path() {
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("html".parse::<OutputFormat>().unwrap(), OutputFormat::Html);
        assert!("xml".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::from_path("out/all.HTM"), Some(OutputFormat::Html));
        assert_eq!(OutputFormat::from_path("all.json"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::from_path("all.csv"), Some(OutputFormat::Csv));
        assert_eq!(OutputFormat::from_path("stdout"), None);
    }

    #[test]
    fn selection_order() {
        let select = OutputFormat::select;
        assert_eq!(
            select(Some("json"), "all.csv", OutputFormat::Csv).unwrap(),
            OutputFormat::Json
        );
        assert_eq!(select(None, "all.html", OutputFormat::Json).unwrap(), OutputFormat::Html);
        assert_eq!(select(None, "stdout", OutputFormat::Json).unwrap(), OutputFormat::Json);
        assert_eq!(select(None, "all.txt", OutputFormat::Csv).unwrap(), OutputFormat::Csv);
        assert!(select(Some("xml"), "all.csv", OutputFormat::Csv).is_err());
    }

    #[test]
    fn csv_has_fixed_columns() {
        let mut out: Vec<u8> = Vec::new();
        write_csv(&[sample()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), EXPORT_HEADERS.join(","));
        assert!(lines
            .next()
            .unwrap()
            .starts_with("Billingfors Pulp,Shift Lead,4.0,2.5,,,,3.0,2.8,Medium,H,\"Strong, <fast>"));
    }

    #[test]
    fn exported_csv_reads_back() {
        let mut out: Vec<u8> = Vec::new();
        write_csv(&[sample()], &mut out).unwrap();
        let rows = read_csv_from(out.as_slice(), "export.csv").unwrap();
        assert_eq!(rows.len(), 1);

        let columns = ColumnTable::default();
        assert_eq!(
            columns.resolve_text(&rows[0], Attribute::RoleArea),
            Some("Shift Lead")
        );
        assert_eq!(columns.resolve_number(&rows[0], Attribute::Criticality), Some(4.0));
        assert_eq!(
            columns.resolve_number(&rows[0], Attribute::TechnicalKnowledge),
            Some(2.5)
        );
        assert_eq!(columns.resolve_number(&rows[0], Attribute::Experience), None);
        assert_eq!(
            columns.resolve_text(&rows[0], Attribute::RetentionRisk),
            Some("H")
        );
        let collector = CommentCollector::new(CommentKind::Capability);
        assert_eq!(
            collector.collect(&rows[0]).as_deref(),
            Some("Strong, <fast>\nNeeds cover")
        );
    }

    #[test]
    fn html_is_escaped() {
        let mut out: Vec<u8> = Vec::new();
        write_html(&[sample()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("<table>"));
        assert!(text.contains("<th>Leadership/Communication</th>"));
        assert!(text.contains("<td>Strong, &lt;fast&gt;<br>Needs cover</td>"));
        assert!(text.contains("<td>Q3 &quot;review&quot;</td>"));
        assert!(text.contains("<td>Medium</td>"));
    }

    #[test]
    fn json_keeps_notes() {
        let mut out: Vec<u8> = Vec::new();
        write_rows(OutputFormat::Json, &[sample()], &mut out).unwrap();
        let js: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(js[0]["roleArea"], "Shift Lead");
        assert_eq!(js[0]["notes"], "Q3 \"review\"");
        assert_eq!(js[0]["capExperience"], serde_json::Value::Null);
    }
}
