use std::path::Path;

use anyhow::{Context, Result, bail};
use calamine::{Data, Reader, open_workbook_auto};
use thiserror::Error;
use tracing::debug;

use super::HoldEntry;
use crate::model::HoldKind;

pub const HEADER_SENTINEL: &str = "Folder Name";

pub const LEGAL_HOLD_TEMPLATE: [&str; 12] = [
    "Folder Name",
    "Matter Name",
    "Hold Name",
    "Hold Notice Subject",
    "Hold Notice Title",
    "Custodian Name",
    "Custodian Email",
    "Last Issued",
    "Response Date",
    "Release Date",
    "Legal Hold Text",
    "Attachment Names",
];

pub const SILENT_HOLD_TEMPLATE: [&str; 10] = [
    "Folder Name",
    "Matter Name",
    "Hold Name",
    "Advisory Notice Subject",
    "Advisory Notice Title",
    "Custodian Name",
    "Custodian Email",
    "Last Issued",
    "Release Date",
    "Advisory Notice Body",
];

/// Excel date cells are rendered back into the input format so they pass
/// through the same parsing as text cells.
const SHEET_DATETIME_FORMAT: &str = "%-m/%-d/%y %-I:%M %p";

pub fn template_for(kind: HoldKind) -> &'static [&'static str] {
    match kind {
        HoldKind::Legal => &LEGAL_HOLD_TEMPLATE,
        HoldKind::Silent => &SILENT_HOLD_TEMPLATE,
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HeaderMismatch {
    #[error("header length mismatch: expected {expected} columns, found {found}")]
    Length { expected: usize, found: usize },
    #[error("invalid header column #{index}: {found:?}")]
    Column { index: usize, found: String },
}

pub(super) fn normalize(cell: &str) -> String {
    cell.trim().to_lowercase()
}

pub fn verify_header<S: AsRef<str>>(row: &[S], template: &[&str]) -> Result<(), HeaderMismatch> {
    if row.len() != template.len() {
        return Err(HeaderMismatch::Length {
            expected: template.len(),
            found: row.len(),
        });
    }

    for (index, (cell, expected)) in row.iter().zip(template).enumerate() {
        if normalize(cell.as_ref()) != normalize(expected) {
            return Err(HeaderMismatch::Column {
                index: index + 1,
                found: cell.as_ref().to_string(),
            });
        }
    }

    Ok(())
}

/// Optional equality filters on matter and hold name; an absent filter
/// matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub matter_name: Option<String>,
    pub hold_name: Option<String>,
}

impl RowFilter {
    pub fn new(matter_name: Option<&str>, hold_name: Option<&str>) -> Self {
        let clean = |value: Option<&str>| {
            value
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(ToOwned::to_owned)
        };
        Self {
            matter_name: clean(matter_name),
            hold_name: clean(hold_name),
        }
    }

    pub fn matches(&self, entry: &HoldEntry) -> bool {
        let matter_ok = self
            .matter_name
            .as_deref()
            .is_none_or(|name| name == entry.matter_name);
        let hold_ok = self
            .hold_name
            .as_deref()
            .is_none_or(|name| name == entry.hold_name);
        matter_ok && hold_ok
    }
}

/// Lazily turns sheet rows into entries. Rows before the header are
/// skipped; after it every non-blank row becomes an entry.
pub struct EntryRows<I> {
    rows: std::iter::Enumerate<I>,
    kind: HoldKind,
    template: &'static [&'static str],
    header_line: Option<usize>,
}

impl<I, R> EntryRows<I>
where
    I: Iterator<Item = R>,
    R: AsRef<[String]>,
{
    pub fn new(rows: I, kind: HoldKind) -> Self {
        Self {
            rows: rows.enumerate(),
            kind,
            template: template_for(kind),
            header_line: None,
        }
    }

    pub fn header_line(&self) -> Option<usize> {
        self.header_line
    }
}

impl<I, R> Iterator for EntryRows<I>
where
    I: Iterator<Item = R>,
    R: AsRef<[String]>,
{
    type Item = HoldEntry;

    fn next(&mut self) -> Option<HoldEntry> {
        for (index, row) in self.rows.by_ref() {
            let row = row.as_ref();
            let line = index + 1;

            if self.header_line.is_none() {
                let is_candidate = row
                    .first()
                    .is_some_and(|cell| normalize(cell) == normalize(HEADER_SENTINEL));
                if is_candidate {
                    match verify_header(row, self.template) {
                        Ok(()) => {
                            debug!(line, "found header");
                            self.header_line = Some(line);
                        }
                        Err(err) => debug!(line, error = %err, "header candidate rejected"),
                    }
                }
                continue;
            }

            if row.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }

            return Some(entry_from_row(self.kind, self.template.len(), line, row));
        }

        None
    }
}

fn entry_from_row(kind: HoldKind, width: usize, line: usize, row: &[String]) -> HoldEntry {
    let mut data = vec![String::new(); width];
    for (slot, cell) in data.iter_mut().zip(row) {
        *slot = cell.trim().to_string();
    }
    let mut cells = data.into_iter();
    let mut next = || cells.next().unwrap_or_default();

    let mut entry = HoldEntry {
        line,
        folder_name: next(),
        matter_name: next(),
        hold_name: next(),
        subject: next(),
        title: next(),
        custodian_name: next(),
        custodian_email: next(),
        last_issued: next(),
        ..HoldEntry::default()
    };

    match kind {
        HoldKind::Legal => {
            entry.response_date = next();
            entry.released_at = next();
            entry.body = next();
            entry.attachment_names = next();
        }
        HoldKind::Silent => {
            entry.released_at = next();
            entry.body = next();
        }
    }

    entry
}

#[derive(Debug, Clone, Default)]
pub struct ParsedSheet {
    pub header_line: usize,
    pub entries: Vec<HoldEntry>,
}

pub fn parse_rows<I, R>(rows: I, kind: HoldKind, filter: &RowFilter) -> Result<ParsedSheet>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[String]>,
{
    let mut reader = EntryRows::new(rows.into_iter(), kind);
    let entries = reader
        .by_ref()
        .filter(|entry| filter.matches(entry))
        .collect::<Vec<_>>();

    let Some(header_line) = reader.header_line() else {
        bail!(
            "header row not found; expected columns: {}",
            template_for(kind).join(", ")
        );
    };

    debug!(
        header_line,
        entries = entries.len(),
        kind = kind.as_str(),
        "parsed sheet rows"
    );

    Ok(ParsedSheet {
        header_line,
        entries,
    })
}

/// Reads every row of the first worksheet as text cells. Rows are aligned so
/// index 0 is sheet line 1 and cell 0 is column A; trailing blank cells are
/// dropped.
pub fn read_first_sheet(path: &Path) -> Result<Vec<Vec<String>>> {
    debug!(path = %path.display(), "opening workbook");
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook {}", path.display()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("workbook has no sheets: {}", path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet {sheet_name} of {}", path.display()))?;

    let (first_row, first_col) = range.start().unwrap_or((0, 0));
    let mut rows = vec![Vec::new(); first_row as usize];

    for sheet_row in range.rows() {
        let mut cells = vec![String::new(); first_col as usize];
        cells.extend(sheet_row.iter().map(cell_text));
        while cells.last().is_some_and(|cell| cell.is_empty()) {
            cells.pop();
        }
        rows.push(cells);
    }

    debug!(sheet = %sheet_name, rows = rows.len(), "read sheet");
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(value) | Data::DateTimeIso(value) | Data::DurationIso(value) => value.clone(),
        Data::DateTime(value) => value
            .as_datetime()
            .map(|ts| ts.format(SHEET_DATETIME_FORMAT).to_string())
            .unwrap_or_else(|| value.as_f64().to_string()),
        other => other.to_string(),
    }
}
