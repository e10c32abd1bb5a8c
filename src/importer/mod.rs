//! Spreadsheet-to-API hold import pipeline.
//!
//! rows -> [`sheet`] -> entries -> [`collect`] -> [`Collections`] ->
//! [`validate`] gate -> [`orchestrate`] (resolve, package, submit per hold).
//!
//! [`matters`] and [`custodians`] are smaller siblings that reuse the same
//! sheet reader, validation report and resolver.

mod collect;
mod custodians;
mod matters;
mod orchestrate;
mod package;
mod resolve;
mod sheet;
mod validate;

pub use collect::{Collections, CustodianNotice, HoldKey, HoldMetadata, HoldUnit};
pub use custodians::{
    DEFAULT_BATCH_SIZE, check_custodian_records, import_custodians, read_custodian_input,
};
pub use matters::{
    MatterEntry, MatterImportSummary, MatterOutcome, MatterStatus, check_matter_entries,
    contact_pattern, import_matters, parse_matter_rows,
};
pub use orchestrate::{HoldOutcome, HoldStatus, ImportOptions, ImportStage, ImportSummary, import_holds};
pub use package::{build_archive, build_workbook, convert_to_utc, package_hold, resolve_timezone};
pub use resolve::{DEFAULT_ADMIN_GROUP, EntityResolver, ResolveError, Resolved};
pub use sheet::{HeaderMismatch, ParsedSheet, RowFilter, parse_rows, read_first_sheet, verify_header};
pub use validate::{IntegrityCheck, ValidationError, ValidationKind, ValidationReport};

pub const MAX_HOLD_NAME_LENGTH: usize = 100;

/// `M/D/YY h:mm AM/PM`, the format every timestamp column is entered in.
pub const INPUT_TIME_FORMAT: &str = "%m/%d/%y %I:%M %p";
/// `MM/DD/YYYY hh:mm AM/PM`, the format the import workbook expects.
pub const OUTPUT_TIME_FORMAT: &str = "%m/%d/%Y %I:%M %p";

/// One spreadsheet data row, trimmed. Silent-hold sheets have no response
/// date or attachment columns, so those fields stay empty for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoldEntry {
    /// 1-based line number in the source sheet.
    pub line: usize,
    pub folder_name: String,
    pub matter_name: String,
    pub hold_name: String,
    pub subject: String,
    pub title: String,
    pub body: String,
    pub custodian_name: String,
    pub custodian_email: String,
    pub last_issued: String,
    pub response_date: String,
    pub released_at: String,
    pub attachment_names: String,
}

impl HoldEntry {
    pub fn key(&self) -> HoldKey {
        HoldKey::new(&self.matter_name, &self.hold_name)
    }
}

/// Splits a comma-separated attachment cell into trimmed, non-empty names.
pub fn split_attachment_names(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
}
