//! CSV export of the collected record set.

use std::path::{Path, PathBuf};

use chrono::Local;
use thiserror::Error;
use tracing::info;

use crate::record::PostRecord;

/// Fixed column header, in export order.
pub const CSV_HEADERS: [&str; 8] = [
    "Date",
    "Author",
    "Handle",
    "Content",
    "URL",
    "Media",
    "Quoted Content",
    "Quoted URL",
];

/// Delimiter joining multiple media URLs into a single CSV field.
pub const MEDIA_DELIMITER: &str = " | ";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("no records collected, nothing to export")]
    NoRecords,
    #[error("failed to write export file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Render the full record set as CSV text, one row per record in
/// insertion order.
#[must_use]
pub fn render_csv(records: &[PostRecord]) -> String {
    let mut rows = Vec::with_capacity(records.len() + 1);
    rows.push(CSV_HEADERS.join(","));

    for record in records {
        let fields = [
            escape_csv(&record.timestamp),
            escape_csv(&record.author_name),
            escape_csv(&record.handle),
            escape_csv(&record.content),
            escape_csv(&record.url),
            escape_csv(&record.media.join(MEDIA_DELIMITER)),
            escape_csv(&record.quoted_content),
            escape_csv(&record.quoted_url),
        ];
        rows.push(fields.join(","));
    }

    rows.join("\n")
}

/// Escape a field value per CSV convention: wrap in quotes and double any
/// internal quote whenever the value contains a comma, quote or line break.
#[must_use]
pub fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Name of today's export file.
#[must_use]
pub fn export_file_name() -> String {
    format!("bookmarks_{}.csv", Local::now().format("%Y-%m-%d"))
}

/// Write the record set as a date-stamped CSV file under `dir`.
///
/// # Errors
///
/// Returns [`ExportError::NoRecords`] when the record set is empty (no file
/// is produced), or an I/O error when the file cannot be written.
pub async fn write_csv(records: &[PostRecord], dir: &Path) -> Result<PathBuf, ExportError> {
    if records.is_empty() {
        return Err(ExportError::NoRecords);
    }

    let path = dir.join(export_file_name());
    let csv = render_csv(records);

    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    tokio::fs::write(&path, csv.as_bytes())
        .await
        .map_err(|source| ExportError::Io {
            path: path.clone(),
            source,
        })?;

    info!(count = records.len(), path = %path.display(), "Wrote CSV export");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            timestamp: "2024-01-15 10:30:00".to_string(),
            author_name: "Example Author".to_string(),
            handle: "@example".to_string(),
            content: "plain content".to_string(),
            url: format!("https://x.com/example/status/{id}"),
            media: vec![],
            quoted_content: String::new(),
            quoted_url: String::new(),
        }
    }

    #[test]
    fn test_escape_plain_value_unchanged() {
        assert_eq!(escape_csv("hello world"), "hello world");
        assert_eq!(escape_csv(""), "");
    }

    #[test]
    fn test_escape_comma_and_quotes() {
        assert_eq!(escape_csv("Hello, \"world\""), "\"Hello, \"\"world\"\"\"");
        assert_eq!(escape_csv("a,b"), "\"a,b\"");
        assert_eq!(escape_csv("line1\nline2"), "\"line1\nline2\"");
        assert_eq!(escape_csv("line1\r\nline2"), "\"line1\r\nline2\"");
    }

    /// Minimal CSV field parser used to verify the escaping round-trips.
    fn unescape_csv(field: &str) -> String {
        if let Some(inner) = field
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
        {
            inner.replace("\"\"", "\"")
        } else {
            field.to_string()
        }
    }

    #[test]
    fn test_escape_round_trips() {
        for original in [
            "plain",
            "with, comma",
            "with \"quotes\"",
            "multi\nline",
            "all, of \"it\"\ntogether",
        ] {
            assert_eq!(unescape_csv(&escape_csv(original)), original);
        }
    }

    #[test]
    fn test_render_header_and_order() {
        let records = vec![record("111"), record("222")];
        let csv = render_csv(&records);
        let mut lines = csv.lines();

        assert_eq!(
            lines.next(),
            Some("Date,Author,Handle,Content,URL,Media,Quoted Content,Quoted URL")
        );
        assert!(lines.next().unwrap().contains("/status/111"));
        assert!(lines.next().unwrap().contains("/status/222"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_render_joins_media() {
        let mut r = record("111");
        r.media = vec![
            "https://pbs.example.com/a?name=large".to_string(),
            "https://video.example.com/b.mp4".to_string(),
        ];
        let csv = render_csv(&[r]);
        assert!(csv.contains("https://pbs.example.com/a?name=large | https://video.example.com/b.mp4"));
    }

    #[tokio::test]
    async fn test_write_csv_empty_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = write_csv(&[], dir.path()).await.unwrap_err();
        assert!(matches!(err, ExportError::NoRecords));
        // No file may be produced on the error path.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_write_csv_creates_dated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&[record("111")], dir.path()).await.unwrap();

        assert_eq!(path.file_name().unwrap().to_str(), Some(export_file_name().as_str()));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("Date,Author,"));
        assert!(contents.contains("/status/111"));
    }
}
