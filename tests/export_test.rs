//! Integration tests for CSV rendering and file export.

use bookmark_exporter::export::{escape_csv, export_file_name, render_csv, write_csv, ExportError};
use bookmark_exporter::record::PostRecord;

fn awkward_record() -> PostRecord {
    PostRecord {
        id: "424242".to_string(),
        timestamp: "2024-01-15 10:30:00".to_string(),
        author_name: "Smith, \"The Author\" Jones".to_string(),
        handle: "@smith".to_string(),
        content: "Hello, \"world\"\nsecond line".to_string(),
        url: "https://x.com/smith/status/424242".to_string(),
        media: vec![
            "https://pbs.example.com/media/a?name=large".to_string(),
            "https://pbs.example.com/media/b?name=large".to_string(),
        ],
        quoted_content: "quoted, text".to_string(),
        quoted_url: "https://x.com/other/status/17".to_string(),
    }
}

/// Parse one CSV record back into fields using standard CSV rules.
fn parse_csv_record(text: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut chars = text.chars().peekable();

    loop {
        let mut field = String::new();
        if chars.peek() == Some(&'"') {
            chars.next();
            loop {
                match chars.next() {
                    Some('"') => {
                        if chars.peek() == Some(&'"') {
                            chars.next();
                            field.push('"');
                        } else {
                            break;
                        }
                    }
                    Some(c) => field.push(c),
                    None => break,
                }
            }
            // Consume the delimiter after a quoted field.
            chars.next();
            fields.push(field);
            if chars.peek().is_none() {
                return fields;
            }
        } else {
            let mut ended_at_comma = false;
            for c in chars.by_ref() {
                if c == ',' {
                    ended_at_comma = true;
                    break;
                }
                field.push(c);
            }
            fields.push(field);
            if !ended_at_comma {
                return fields;
            }
        }
    }
}

#[test]
fn spec_escape_example() {
    assert_eq!(escape_csv("Hello, \"world\""), "\"Hello, \"\"world\"\"\"");
}

#[test]
fn rendered_row_parses_back_to_original_fields() {
    let record = awkward_record();
    let csv = render_csv(std::slice::from_ref(&record));

    // The content field contains a newline, so the record spans two
    // physical lines; only the header line is split off.
    let (header, body) = csv.split_once('\n').unwrap();
    assert_eq!(
        header,
        "Date,Author,Handle,Content,URL,Media,Quoted Content,Quoted URL"
    );

    let fields = parse_csv_record(body);
    assert_eq!(fields.len(), 8);
    assert_eq!(fields[0], record.timestamp);
    assert_eq!(fields[1], record.author_name);
    assert_eq!(fields[2], record.handle);
    assert_eq!(fields[3], record.content);
    assert_eq!(fields[4], record.url);
    assert_eq!(
        fields[5],
        "https://pbs.example.com/media/a?name=large | https://pbs.example.com/media/b?name=large"
    );
    assert_eq!(fields[6], record.quoted_content);
    assert_eq!(fields[7], record.quoted_url);
}

#[tokio::test]
async fn writes_dated_file_with_all_records() {
    let dir = tempfile::tempdir().unwrap();
    let mut second = awkward_record();
    second.id = "777".to_string();
    second.url = "https://x.com/smith/status/777".to_string();
    second.content = "plain".to_string();

    let path = write_csv(&[awkward_record(), second], dir.path())
        .await
        .unwrap();

    assert_eq!(
        path.file_name().and_then(|n| n.to_str()),
        Some(export_file_name().as_str())
    );
    let contents = std::fs::read_to_string(path).unwrap();
    assert!(contents.contains("/status/424242"));
    assert!(contents.contains("/status/777"));
}

#[tokio::test]
async fn empty_record_set_produces_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = write_csv(&[], dir.path()).await.unwrap_err();
    assert!(matches!(err, ExportError::NoRecords));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
