//! Markdown preprocessing. Table rows like `| a | b |` carry most of the
//! facts in survey-style corpora, but pipes and separator rows are noise to
//! the tokenizer, so they are flattened into standalone fact lines before
//! indexing. A second, snippet-level flattener runs inside the answer engine
//! on anything the index hands back.

use crate::error::IngestError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::path::Path;

/// A full table row: pipe-delimited from edge to edge.
static TABLE_ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\|.*\|\s*$").expect("static regex"));

/// A separator row such as `| --- | :---: | ---: |`.
static SEP_ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\|?\s*:?-{3,}:?\s*(\|\s*:?-{3,}:?\s*)+\|?\s*$").expect("static regex")
});

/// Reads the Markdown at `path`, flattens any table rows into standalone
/// facts separated by blank lines, and returns the processed text. When the
/// file holds no table and no fact line was emitted, the original contents
/// come back untouched. Fails only when the file cannot be read.
pub fn prepare_markdown(path: &Path) -> Result<String, IngestError> {
    let original = fs::read_to_string(path)?;

    let mut out = String::with_capacity(original.len());
    let mut wrote_any = false;
    // Start true so the output never opens with a blank line.
    let mut wrote_blank = true;
    let mut saw_table = false;

    let mut write_fact = |fact: &str, out: &mut String, wrote_blank: &mut bool| {
        let fact = fact.trim();
        if fact.is_empty() || fact.eq_ignore_ascii_case("text") {
            return;
        }
        out.push_str(fact);
        out.push_str("\n\n");
        wrote_any = true;
        *wrote_blank = true;
    };

    for raw_line in original.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            if !wrote_blank {
                out.push('\n');
                wrote_blank = true;
            }
            continue;
        }

        if line.starts_with('|') && line.ends_with('|') {
            saw_table = true;
            let inner = line.trim_matches('|');
            let mut all_separator = true;
            let mut cells = Vec::new();
            for cell in inner.split('|') {
                let cell = cell.trim();
                if !cell.is_empty() {
                    cells.push(cell);
                }
                let stripped: String = cell.chars().filter(|c| *c != ':' && *c != '-').collect();
                if !stripped.trim().is_empty() {
                    all_separator = false;
                }
            }
            if all_separator || cells.is_empty() {
                continue;
            }
            if cells.len() == 1 {
                write_fact(cells[0], &mut out, &mut wrote_blank);
            } else {
                write_fact(&cells.join(" "), &mut out, &mut wrote_blank);
            }
            continue;
        }

        wrote_blank = false;
        write_fact(line, &mut out, &mut wrote_blank);
    }

    if !saw_table && !wrote_any {
        return Ok(original);
    }
    if saw_table {
        // Table flows expect a single trailing newline.
        let trimmed = out.trim_end_matches('\n');
        return Ok(format!("{trimmed}\n"));
    }
    Ok(out)
}

/// Converts markdown table blocks inside `text` into one-line facts. The
/// header row and the `---` separator row are dropped; body-row cells are
/// joined with spaces; non-table lines pass through unless empty.
pub fn flatten_tables_to_lines(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = Vec::with_capacity(lines.len());

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();

        // A table starts with a header row immediately followed by a
        // separator row.
        if TABLE_ROW_RE.is_match(line)
            && i + 1 < lines.len()
            && SEP_ROW_RE.is_match(lines[i + 1].trim())
        {
            i += 2;
            while i < lines.len() && TABLE_ROW_RE.is_match(lines[i].trim()) {
                let row = lines[i].trim();
                let row = row.strip_prefix('|').unwrap_or(row);
                let row = row.strip_suffix('|').unwrap_or(row);
                let cleaned = row
                    .split('|')
                    .map(str::trim)
                    .collect::<Vec<_>>()
                    .join(" ");
                if !cleaned.is_empty() {
                    out.push(cleaned);
                }
                i += 1;
            }
            continue;
        }

        if !line.is_empty() {
            out.push(line.to_string());
        }
        i += 1;
    }

    out.join("\n")
}
