//! Export of stored queries as JSON, CSV, XML or Markdown

use std::str::FromStr;

use serde::Serialize;

use crate::JournalError;
use crate::models::WeatherRecord;

const COLUMNS: [&str; 8] = [
    "id",
    "location",
    "latitude",
    "longitude",
    "start_date",
    "end_date",
    "weather_summary",
    "created_at",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Xml,
    Markdown,
}

impl ExportFormat {
    /// Parse a `format` query value; anything unrecognised means JSON
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }

    #[must_use]
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xml => "application/xml",
            ExportFormat::Markdown => "text/markdown; charset=utf-8",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Xml => "xml",
            ExportFormat::Markdown => "md",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "xml" => Ok(ExportFormat::Xml),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(JournalError::validation(format!(
                "unknown export format '{other}'"
            ))),
        }
    }
}

/// One flat export row; every value already rendered as text
#[derive(Debug, Serialize)]
struct ExportRow {
    id: u64,
    location: String,
    latitude: String,
    longitude: String,
    start_date: String,
    end_date: String,
    weather_summary: String,
    created_at: String,
}

impl From<&WeatherRecord> for ExportRow {
    fn from(record: &WeatherRecord) -> Self {
        let text = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
        Self {
            id: record.id,
            location: record.location.clone(),
            latitude: text(record.latitude),
            longitude: text(record.longitude),
            start_date: record.start_date.to_string(),
            end_date: record.end_date.to_string(),
            weather_summary: record.weather_summary.clone(),
            created_at: record
                .created_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

impl ExportRow {
    fn cells(&self) -> [String; 8] {
        [
            self.id.to_string(),
            self.location.clone(),
            self.latitude.clone(),
            self.longitude.clone(),
            self.start_date.clone(),
            self.end_date.clone(),
            self.weather_summary.clone(),
            self.created_at.clone(),
        ]
    }
}

#[derive(Serialize)]
struct JsonExport<'a> {
    data: &'a [ExportRow],
}

#[derive(Serialize)]
#[serde(rename = "records")]
struct XmlExport<'a> {
    record: &'a [ExportRow],
}

/// Render `records` in the requested format
pub fn render(records: &[WeatherRecord], format: ExportFormat) -> crate::Result<String> {
    let rows: Vec<ExportRow> = records.iter().map(ExportRow::from).collect();

    match format {
        ExportFormat::Json => serde_json::to_string(&JsonExport { data: &rows })
            .map_err(|e| JournalError::storage(format!("JSON export failed: {e}"))),
        ExportFormat::Csv => Ok(to_csv(&rows)),
        ExportFormat::Xml => quick_xml::se::to_string(&XmlExport { record: &rows })
            .map_err(|e| JournalError::storage(format!("XML export failed: {e}"))),
        ExportFormat::Markdown => Ok(to_markdown(&rows)),
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn to_csv(rows: &[ExportRow]) -> String {
    let mut out = COLUMNS.join(",");
    out.push('\n');
    for row in rows {
        let line: Vec<String> = row.cells().iter().map(|c| csv_field(c)).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    out
}

fn markdown_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', "<br>")
}

fn to_markdown(rows: &[ExportRow]) -> String {
    if rows.is_empty() {
        return "# Export\n\n_No rows_".to_string();
    }

    let mut lines = vec![
        "# Export".to_string(),
        String::new(),
        format!("| {} |", COLUMNS.join(" | ")),
        format!("|{}|", vec![" --- "; COLUMNS.len()].join("|")),
    ];
    for row in rows {
        let cells: Vec<String> = row.cells().iter().map(|c| markdown_cell(c)).collect();
        lines.push(format!("| {} |", cells.join(" | ")));
    }
    lines.join("\n")
}
