//! Export log entries to various formats

use crate::action_log::{ActionType, LogEntry};
use crate::auditor::Auditor;
use crate::{Error, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RON format (Rust Object Notation)
    Ron,
    /// JSON format (requires serde_json feature)
    Json,
    /// One row per entry, details flattened into columns
    Csv,
    /// Human-readable text format
    Text,
}

/// Exporter for a set of log entries
pub struct Exporter<'a> {
    entries: &'a [LogEntry],
}

impl<'a> Exporter<'a> {
    pub fn new(entries: &'a [LogEntry]) -> Self {
        Self { entries }
    }

    /// Export to a string in the specified format
    pub fn export(&self, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Ron => self.to_ron(),
            ExportFormat::Json => self.to_json(),
            ExportFormat::Csv => self.to_csv(),
            ExportFormat::Text => Ok(self.to_text()),
        }
    }

    /// Export to a writer
    pub fn export_to<W: Write>(&self, writer: &mut W, format: ExportFormat) -> Result<()> {
        let content = self.export(format)?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }

    pub fn to_ron(&self) -> Result<String> {
        let export = ExportData::from_entries(self.entries);
        ron::ser::to_string_pretty(&export, ron::ser::PrettyConfig::default())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    #[cfg(feature = "serde_json")]
    pub fn to_json(&self) -> Result<String> {
        let export = ExportData::from_entries(self.entries);
        serde_json::to_string_pretty(&export).map_err(|e| Error::Serialization(e.to_string()))
    }

    #[cfg(not(feature = "serde_json"))]
    pub fn to_json(&self) -> Result<String> {
        Err(Error::ExportError(
            "JSON export requires the 'serde_json' feature".to_string(),
        ))
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for entry in self.entries {
            writer
                .serialize(CsvRow::from(entry))
                .map_err(|e| Error::ExportError(e.to_string()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::ExportError(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| Error::ExportError(e.to_string()))
    }

    pub fn to_text(&self) -> String {
        let mut output = String::new();
        let report = Auditor::new(self.entries).generate_report();

        output.push_str("=== Action Log Export ===\n\n");
        output.push_str(&format!("Total entries: {}\n", report.total_entries));
        if let (Some(first), Some(last)) = (report.first_date, report.last_date) {
            output.push_str(&format!("Date range: {} - {}\n", first, last));
        }

        output.push_str("\n=== Entries ===\n");

        let mut current_date: Option<NaiveDate> = None;
        for entry in self.entries {
            let date = entry.timestamp.date_naive();
            if current_date != Some(date) {
                output.push_str(&format!("\n--- {} ---\n", date));
                current_date = Some(date);
            }

            output.push_str(&format!(
                "  {} {} by {}",
                entry.action_type, entry.item_id, entry.user_id
            ));
            let details = &entry.details;
            if let Some(from) = &details.from_container {
                output.push_str(&format!(" from={}", from));
            }
            if let Some(to) = &details.to_container {
                output.push_str(&format!(" to={}", to));
            }
            if let Some(reason) = &details.reason {
                output.push_str(&format!(" ({})", reason));
            }
            output.push('\n');
        }

        output
    }
}

#[derive(Debug, Clone, Serialize)]
struct ExportData<'a> {
    version: u32,
    total_entries: usize,
    entries: &'a [LogEntry],
}

impl<'a> ExportData<'a> {
    fn from_entries(entries: &'a [LogEntry]) -> Self {
        Self {
            version: 1,
            total_entries: entries.len(),
            entries,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow<'a> {
    timestamp: String,
    user_id: &'a str,
    action_type: ActionType,
    item_id: &'a str,
    from_container: Option<&'a str>,
    to_container: Option<&'a str>,
    reason: Option<&'a str>,
}

impl<'a> From<&'a LogEntry> for CsvRow<'a> {
    fn from(entry: &'a LogEntry) -> Self {
        Self {
            timestamp: entry.timestamp.to_rfc3339(),
            user_id: entry.user_id.as_str(),
            action_type: entry.action_type,
            item_id: entry.item_id.as_str(),
            from_container: entry.details.from_container.as_ref().map(|c| c.as_str()),
            to_container: entry.details.to_container.as_ref().map(|c| c.as_str()),
            reason: entry.details.reason.as_deref(),
        }
    }
}
