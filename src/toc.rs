//! Table-of-contents extraction from markdown headings.

use lazy_static::lazy_static;
use regex::Regex;

use crate::document::TocEntry;

lazy_static! {
    static ref HEADING_RE: Regex = Regex::new(r"^(#{1,6})\s+(.+)$").unwrap();
}

/// Extract a table of contents from ATX heading lines.
///
/// Line numbers are 1-indexed. Each entry's `end_line` is the line before
/// the next heading at the same or higher level, or the last line of the
/// document for entries with no such successor.
pub fn extract_toc(markdown: &str) -> Vec<TocEntry> {
    let lines: Vec<&str> = markdown.split('\n').collect();
    let total_lines = lines.len();
    let mut entries: Vec<TocEntry> = Vec::new();

    for (line_no_0, line) in lines.iter().enumerate() {
        if let Some(caps) = HEADING_RE.captures(line.trim()) {
            entries.push(TocEntry {
                title: caps[2].trim().to_string(),
                level: caps[1].len(),
                start_line: line_no_0 + 1,
                end_line: total_lines,
            });
        }
    }

    for i in 0..entries.len() {
        for j in i + 1..entries.len() {
            if entries[j].level <= entries[i].level {
                entries[i].end_line = entries[j].start_line - 1;
                break;
            }
        }
    }

    entries
}
