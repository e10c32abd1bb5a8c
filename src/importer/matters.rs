//! Matter import: one matter per sheet row, all created inside one folder.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow, bail};
use indexmap::IndexMap;
use regex::Regex;
use tracing::{debug, error, info, warn};

use super::sheet::normalize;
use super::validate::{ValidationError, ValidationKind, ValidationReport, is_valid_email, record};
use super::{EntityResolver, Resolved, verify_header};
use crate::api::{Client, Transport};
use crate::model::{CreateMatterBody, MatterContact};

pub const MATTER_TEMPLATE: [&str; 13] = [
    "Matter Name",
    "Matter Number",
    "Case Number",
    "PO Number",
    "Caption",
    "Region",
    "Business Unit",
    "Notes",
    "Inherit Email Config",
    "Email From",
    "Email Reply-To",
    "Name On Outgoing Emails",
    "Contacts",
];

/// `Name <address>`, one per comma-separated item of the contacts column.
const CONTACT_PATTERN: &str = r"^([^<]+)<([^>]+)>$";

/// One matter sheet row, trimmed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatterEntry {
    pub line: usize,
    pub name: String,
    pub number: String,
    pub case_number: String,
    pub po_number: String,
    pub caption: String,
    pub region: String,
    pub business_unit: String,
    pub notes: String,
    pub inherit_email_config: bool,
    pub email_from: String,
    pub email_reply_to: String,
    pub name_on_outgoing_emails: String,
    pub contacts: String,
}

impl MatterEntry {
    fn from_row(line: usize, row: &[String]) -> Self {
        let mut data = vec![String::new(); MATTER_TEMPLATE.len()];
        for (slot, cell) in data.iter_mut().zip(row) {
            *slot = cell.trim().to_string();
        }
        let mut cells = data.into_iter();
        let mut next = || cells.next().unwrap_or_default();

        Self {
            line,
            name: next(),
            number: next(),
            case_number: next(),
            po_number: next(),
            caption: next(),
            region: next(),
            business_unit: next(),
            notes: next(),
            inherit_email_config: next().eq_ignore_ascii_case("true"),
            email_from: next(),
            email_reply_to: next(),
            name_on_outgoing_emails: next(),
            contacts: next(),
        }
    }

    pub fn to_body(&self, folder_id: i64, contact_pattern: &Regex) -> Result<CreateMatterBody> {
        let contacts = parse_contacts(&self.contacts, contact_pattern)
            .map_err(|reason| anyhow!("line #{}: {reason}", self.line))?;

        Ok(CreateMatterBody {
            name: self.name.clone(),
            folder_id,
            number: self.number.clone(),
            case_number: self.case_number.clone(),
            po_number: self.po_number.clone(),
            caption: self.caption.clone(),
            region: self.region.clone(),
            business_unit: self.business_unit.clone(),
            notes: self.notes.clone(),
            inherit_email_config: self.inherit_email_config,
            email_from: self.email_from.clone(),
            email_reply_to: self.email_reply_to.clone(),
            name_on_outgoing_emails: self.name_on_outgoing_emails.clone(),
            matter_contacts_attributes: contacts,
        })
    }
}

pub fn contact_pattern() -> Result<Regex> {
    Regex::new(CONTACT_PATTERN).context("failed to compile contact regex")
}

/// Splits a contacts cell such as `Ann <a@x.com>, Bo <b@x.com>` into
/// contacts. An empty cell yields no contacts.
pub fn parse_contacts(raw: &str, pattern: &Regex) -> Result<Vec<MatterContact>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            let captures = pattern
                .captures(item)
                .ok_or_else(|| format!("contact [{item}] is not in \"Name <email>\" form"))?;
            let name = captures[1].trim();
            let email = captures[2].trim();
            if name.is_empty() {
                return Err(format!("contact [{item}] has no name"));
            }
            if !is_valid_email(email) {
                return Err(format!("contact [{item}] has an invalid email [{email}]"));
            }
            Ok(MatterContact {
                name: name.to_string(),
                email: email.to_string(),
            })
        })
        .collect()
}

/// Finds the matter header after any preamble and returns every non-blank
/// row below it.
pub fn parse_matter_rows<I, R>(rows: I) -> Result<Vec<MatterEntry>>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[String]>,
{
    let sentinel = normalize(MATTER_TEMPLATE[0]);
    let mut header_line = None;
    let mut entries = Vec::new();

    for (index, row) in rows.into_iter().enumerate() {
        let row = row.as_ref();
        let line = index + 1;

        if header_line.is_none() {
            if row.first().is_some_and(|cell| normalize(cell) == sentinel) {
                match verify_header(row, &MATTER_TEMPLATE) {
                    Ok(()) => header_line = Some(line),
                    Err(err) => debug!(line, error = %err, "matter header candidate rejected"),
                }
            }
            continue;
        }

        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        entries.push(MatterEntry::from_row(line, row));
    }

    let Some(header_line) = header_line else {
        bail!(
            "matter header row not found; expected columns: {}",
            MATTER_TEMPLATE.join(", ")
        );
    };
    debug!(header_line, entries = entries.len(), "parsed matter rows");
    Ok(entries)
}

/// Rejects rows without a name, names used twice and unparseable contacts,
/// before anything is sent.
pub fn check_matter_entries(entries: &[MatterEntry], contact_pattern: &Regex) -> Result<()> {
    let mut names = ValidationError::new(ValidationKind::MatterNameRequired);
    let mut duplicates = ValidationError::new(ValidationKind::DuplicateMatterName);
    let mut contacts = ValidationError::new(ValidationKind::InvalidMatterContact);
    let mut first_seen: HashMap<&str, usize> = HashMap::new();

    for entry in entries {
        if entry.name.is_empty() {
            names.add(format!("line #{}: matter name is empty", entry.line));
        } else if let Some(first) = first_seen.get(entry.name.as_str()) {
            duplicates.add(format!(
                "line #{}: matter [{}] was already listed on line #{first}",
                entry.line, entry.name
            ));
        } else {
            first_seen.insert(entry.name.as_str(), entry.line);
        }

        if let Err(reason) = parse_contacts(&entry.contacts, contact_pattern) {
            contacts.add(format!(
                "line #{}: matter [{}] - {reason}",
                entry.line, entry.name
            ));
        }
    }

    let mut errors = Vec::new();
    record(&mut errors, "matter name", names.into_option());
    record(&mut errors, "unique matter name", duplicates.into_option());
    record(&mut errors, "matter contacts", contacts.into_option());

    if !errors.is_empty() {
        return Err(ValidationReport { errors }.into());
    }
    info!(entries = entries.len(), "matter sheet check passed");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatterStatus {
    Created { matter_id: i64 },
    SkippedExists { matter_id: i64 },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatterOutcome {
    pub line: usize,
    pub name: String,
    pub status: MatterStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatterImportSummary {
    pub folder_id: i64,
    pub outcomes: Vec<MatterOutcome>,
}

impl MatterImportSummary {
    fn count(&self, predicate: impl Fn(&MatterStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }

    pub fn created(&self) -> usize {
        self.count(|status| matches!(status, MatterStatus::Created { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, MatterStatus::SkippedExists { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, MatterStatus::Failed { .. }))
    }

    /// One `line #N: matter [name]: reason` line per failed matter.
    pub fn failure_report(&self) -> String {
        self.outcomes
            .iter()
            .filter_map(|outcome| match &outcome.status {
                MatterStatus::Failed { reason } => Some(format!(
                    "line #{}: matter [{}]: {reason}",
                    outcome.line, outcome.name
                )),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Finds or creates `folder_name`, then creates each matter in it. Matters
/// that already exist are left untouched; a failing matter is recorded and
/// the loop moves on.
pub fn import_matters<T: Transport>(
    client: &Client<T>,
    entries: &[MatterEntry],
    folder_name: &str,
    contact_pattern: &Regex,
) -> Result<MatterImportSummary> {
    let no_matters = IndexMap::new();
    let mut resolver = EntityResolver::new(client, &no_matters);
    let folder_id = resolver
        .resolve_folder_id(folder_name)
        .with_context(|| format!("failed to find or create folder {folder_name}"))?;

    let mut summary = MatterImportSummary {
        folder_id,
        outcomes: Vec::with_capacity(entries.len()),
    };

    for entry in entries {
        let status = match entry
            .to_body(folder_id, contact_pattern)
            .and_then(|body| resolver.find_or_submit_matter(&body).map_err(Into::into))
        {
            Ok(Resolved::Created(matter_id)) => {
                info!(matter = %entry.name, matter_id, "imported matter");
                MatterStatus::Created { matter_id }
            }
            Ok(Resolved::Found(matter_id)) => {
                warn!(matter = %entry.name, matter_id, "matter already exists, skipping");
                MatterStatus::SkippedExists { matter_id }
            }
            Err(err) => {
                let reason = format!("{err:#}");
                error!(matter = %entry.name, line = entry.line, error = %reason, "matter import failed");
                MatterStatus::Failed { reason }
            }
        };

        summary.outcomes.push(MatterOutcome {
            line: entry.line,
            name: entry.name.clone(),
            status,
        });
    }

    info!(
        folder = %folder_name,
        folder_id,
        created = summary.created(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "matter import finished"
    );
    Ok(summary)
}
