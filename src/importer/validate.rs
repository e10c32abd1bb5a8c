use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::Result;
use chrono::NaiveDateTime;
use chrono_tz::Tz;
use email_address::EmailAddress;
use tracing::{debug, info, warn};

use super::{Collections, HoldEntry, INPUT_TIME_FORMAT, MAX_HOLD_NAME_LENGTH, convert_to_utc};
use crate::api::{Client, Transport};
use crate::model::HoldKind;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ValidationKind {
    MatterUnderDifferentFolders,
    HoldNameTooLong,
    InvalidEmailAddress,
    CustodianNameMismatch,
    LastIssuedRequired,
    InvalidResponseDate,
    InvalidReleasedAt,
    AttachmentFileNotFound,
    CustodianNotFound,
    MatterNameRequired,
    DuplicateMatterName,
    InvalidMatterContact,
    CustodianNameRequired,
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MatterUnderDifferentFolders => "matter is under different folders",
            Self::HoldNameTooLong => "hold name too long",
            Self::InvalidEmailAddress => "invalid email address",
            Self::CustodianNameMismatch => "custodian email is under different custodian names",
            Self::LastIssuedRequired => "last issued field is required",
            Self::InvalidResponseDate => "response date field is invalid",
            Self::InvalidReleasedAt => "release date field is invalid",
            Self::AttachmentFileNotFound => "attachment file not found",
            Self::CustodianNotFound => "custodian not found",
            Self::MatterNameRequired => "matter name is required",
            Self::DuplicateMatterName => "matter name appears more than once",
            Self::InvalidMatterContact => "matter contacts are invalid",
            Self::CustodianNameRequired => "custodian name is required",
        };
        f.write_str(text)
    }
}

/// All violations of one rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub violations: Vec<String>,
}

impl ValidationError {
    pub(super) fn new(kind: ValidationKind) -> Self {
        Self {
            kind,
            violations: Vec::new(),
        }
    }

    pub(super) fn add(&mut self, violation: String) {
        self.violations.push(violation);
    }

    pub(super) fn into_option(self) -> Option<Self> {
        (!self.violations.is_empty()).then_some(self)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.kind)?;
        for violation in &self.violations {
            writeln!(f, " - {violation}")?;
        }
        Ok(())
    }
}

/// Every failing rule of one integrity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn violation_count(&self) -> usize {
        self.errors.iter().map(|error| error.violations.len()).sum()
    }

    pub fn find(&self, kind: ValidationKind) -> Option<&ValidationError> {
        self.errors.iter().find(|error| error.kind == kind)
    }
}

impl std::error::Error for ValidationError {}

impl std::error::Error for ValidationReport {}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "data integrity check failed: {} violation(s) in {} rule(s)",
            self.violation_count(),
            self.errors.len()
        )?;
        for error in &self.errors {
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

/// Input for one integrity check over a parsed sheet.
pub struct IntegrityCheck<'a, T> {
    pub kind: HoldKind,
    pub entries: &'a [HoldEntry],
    pub collections: &'a Collections,
    pub attachment_directory: &'a Path,
    pub timezone: Tz,
    pub client: &'a Client<T>,
    /// Validation is the whole job; local failures then skip the remote rule.
    pub check_input_only: bool,
}

impl<T: Transport> IntegrityCheck<'_, T> {
    /// Runs every local rule and accumulates their violations. The remote
    /// custodian lookup runs as well, except for a check-input-only run whose
    /// local rules already failed.
    pub fn run(&self) -> Result<()> {
        let mut errors = Vec::new();

        record(
            &mut errors,
            "same matter under same folder",
            check_same_matter_same_folder(self.entries),
        );
        record(
            &mut errors,
            "hold name length",
            check_hold_name_length(self.entries),
        );
        record(
            &mut errors,
            "custodian email",
            check_email_addresses(self.entries),
        );
        record(
            &mut errors,
            "same custodian under the same email",
            check_custodian_names(self.entries),
        );
        record(
            &mut errors,
            "last issued",
            check_last_issued(self.entries, self.timezone),
        );
        if self.kind.tracks_acknowledgement() {
            record(
                &mut errors,
                "response date",
                check_response_date(self.entries),
            );
        }
        record(
            &mut errors,
            "released at",
            check_released_at(self.entries),
        );
        if self.kind.supports_attachments() {
            record(
                &mut errors,
                "attachment files",
                check_attachment_files(self.collections, self.attachment_directory),
            );
        }

        if errors.is_empty() || !self.check_input_only {
            record(
                &mut errors,
                "custodians exist remotely",
                check_custodians_exist(self.collections, self.client),
            );
        } else {
            info!("local rules failed, skipping remote custodian check");
        }

        if !errors.is_empty() {
            return Err(ValidationReport { errors }.into());
        }

        info!(entries = self.entries.len(), "data integrity check passed");
        Ok(())
    }
}

pub(super) fn record(errors: &mut Vec<ValidationError>, rule: &str, result: Option<ValidationError>) {
    match &result {
        Some(error) => warn!(
            rule,
            violations = error.violations.len(),
            "integrity rule failed"
        ),
        None => debug!(rule, "integrity rule passed"),
    }
    errors.extend(result);
}

fn parse_input_time(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, INPUT_TIME_FORMAT)
}

pub fn check_same_matter_same_folder(entries: &[HoldEntry]) -> Option<ValidationError> {
    let mut error = ValidationError::new(ValidationKind::MatterUnderDifferentFolders);
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for entry in entries {
        let folder = *seen
            .entry(entry.matter_name.as_str())
            .or_insert(entry.folder_name.as_str());
        if folder != entry.folder_name {
            error.add(format!(
                "line #{}: matter [{}] is under folder [{}] but was first seen under [{}]",
                entry.line, entry.matter_name, entry.folder_name, folder
            ));
        }
    }

    error.into_option()
}

pub fn check_hold_name_length(entries: &[HoldEntry]) -> Option<ValidationError> {
    let mut error = ValidationError::new(ValidationKind::HoldNameTooLong);

    for entry in entries {
        let length = entry.hold_name.chars().count();
        if length > MAX_HOLD_NAME_LENGTH {
            error.add(format!(
                "line #{}: matter [{}] - hold [{}] has {length} characters, at most {MAX_HOLD_NAME_LENGTH} are allowed",
                entry.line, entry.matter_name, entry.hold_name
            ));
        }
    }

    error.into_option()
}

/// Accepts an RFC 5322 addr-spec, including quoted local parts and domain
/// literals, or a name-addr such as `Carol <c@x.com>`.
pub fn is_valid_email(value: &str) -> bool {
    let address = match value
        .trim_end()
        .strip_suffix('>')
        .and_then(|rest| rest.rsplit_once('<'))
    {
        Some((_, inner)) => inner.trim(),
        None => value,
    };
    EmailAddress::is_valid(address)
}

pub fn check_email_addresses(entries: &[HoldEntry]) -> Option<ValidationError> {
    let mut error = ValidationError::new(ValidationKind::InvalidEmailAddress);

    for entry in entries {
        if !is_valid_email(&entry.custodian_email) {
            error.add(format!(
                "line #{}: matter [{}] - hold [{}] - custodian email [{}] is invalid",
                entry.line, entry.matter_name, entry.hold_name, entry.custodian_email
            ));
        }
    }

    error.into_option()
}

pub fn check_custodian_names(entries: &[HoldEntry]) -> Option<ValidationError> {
    let mut error = ValidationError::new(ValidationKind::CustodianNameMismatch);
    let mut seen: HashMap<&str, &str> = HashMap::new();

    for entry in entries {
        let name = *seen
            .entry(entry.custodian_email.as_str())
            .or_insert(entry.custodian_name.as_str());
        if name != entry.custodian_name {
            error.add(format!(
                "line #{}: custodian email {} is not under the same name \"{}\" vs \"{}\"",
                entry.line, entry.custodian_email, name, entry.custodian_name
            ));
        }
    }

    error.into_option()
}

pub fn check_last_issued(entries: &[HoldEntry], timezone: Tz) -> Option<ValidationError> {
    let mut error = ValidationError::new(ValidationKind::LastIssuedRequired);

    for entry in entries {
        if entry.last_issued.is_empty() {
            error.add(format!(
                "line #{}: matter [{}] - hold [{}] does not have LastIssued field",
                entry.line, entry.matter_name, entry.hold_name
            ));
            continue;
        }

        match parse_input_time(&entry.last_issued) {
            Ok(_) => debug!(
                line = entry.line,
                timezone = %timezone,
                raw = %entry.last_issued,
                utc = %convert_to_utc(timezone, &entry.last_issued).unwrap_or_default(),
                "last issued timestamp"
            ),
            Err(err) => error.add(format!(
                "line #{}: matter [{}] - hold [{}] - LastIssued field [{}] is invalid: {err}",
                entry.line, entry.matter_name, entry.hold_name, entry.last_issued
            )),
        }
    }

    error.into_option()
}

fn check_optional_time<F>(
    entries: &[HoldEntry],
    kind: ValidationKind,
    label: &str,
    field: F,
) -> Option<ValidationError>
where
    F: Fn(&HoldEntry) -> &str,
{
    let mut error = ValidationError::new(kind);

    for entry in entries {
        let value = field(entry);
        if value.is_empty() {
            continue;
        }
        if let Err(err) = parse_input_time(value) {
            error.add(format!(
                "line #{}: matter [{}] - hold [{}] - {label} field [{value}] is invalid: {err}",
                entry.line, entry.matter_name, entry.hold_name
            ));
        }
    }

    error.into_option()
}

pub fn check_response_date(entries: &[HoldEntry]) -> Option<ValidationError> {
    check_optional_time(
        entries,
        ValidationKind::InvalidResponseDate,
        "ResponseDate",
        |entry| &entry.response_date,
    )
}

pub fn check_released_at(entries: &[HoldEntry]) -> Option<ValidationError> {
    check_optional_time(
        entries,
        ValidationKind::InvalidReleasedAt,
        "ReleasedAt",
        |entry| &entry.released_at,
    )
}

pub fn check_attachment_files(
    collections: &Collections,
    attachment_directory: &Path,
) -> Option<ValidationError> {
    let mut error = ValidationError::new(ValidationKind::AttachmentFileNotFound);

    for name in &collections.attachment_names {
        let path = attachment_directory.join(name);
        debug!(path = %path.display(), "verifying attachment file");
        if !path.is_file() {
            error.add(format!("attachment file {} does not exist", path.display()));
        }
    }

    error.into_option()
}

pub fn check_custodians_exist<T: Transport>(
    collections: &Collections,
    client: &Client<T>,
) -> Option<ValidationError> {
    let mut error = ValidationError::new(ValidationKind::CustodianNotFound);

    for (email, name) in &collections.custodians {
        match client.find_custodian(name, email) {
            Ok(Some(_)) => debug!(name = %name, email = %email, "custodian found"),
            Ok(None) => error.add(format!("custodian: {name} email: {email} not found")),
            Err(err) => error.add(format!(
                "custodian: {name} email: {email} lookup failed: {err}"
            )),
        }
    }

    error.into_option()
}
