//! Bulk custodian import from a JSON array or a CSV file with a header row.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use super::validate::{ValidationError, ValidationKind, ValidationReport, is_valid_email, record};
use crate::api::{Client, Transport};
use crate::model::CustodianInput;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Picks the parser from the file extension (`.json` or `.csv`).
pub fn read_custodian_input(path: &Path) -> Result<Vec<CustodianInput>> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    let custodians = match extension.as_deref() {
        Some("json") => parse_custodian_json(&data),
        Some("csv") => parse_custodian_csv(&data),
        _ => bail!(
            "unsupported custodian input {}; expected a .json or .csv file",
            path.display()
        ),
    }
    .with_context(|| format!("failed to parse {}", path.display()))?;

    debug!(path = %path.display(), records = custodians.len(), "read custodian input");
    Ok(custodians)
}

pub fn parse_custodian_json(data: &[u8]) -> Result<Vec<CustodianInput>> {
    let custodians: Vec<CustodianInput> =
        serde_json::from_slice(data).context("expected a JSON array of custodians")?;
    Ok(custodians.into_iter().map(trimmed).collect())
}

/// Columns are matched by header name, so their order is free and unknown
/// columns are ignored.
pub fn parse_custodian_csv(data: &[u8]) -> Result<Vec<CustodianInput>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(data);

    reader
        .deserialize::<CustodianInput>()
        .enumerate()
        .map(|(index, record)| {
            record.with_context(|| format!("invalid CSV record #{}", index + 1))
        })
        .collect()
}

fn trimmed(mut custodian: CustodianInput) -> CustodianInput {
    custodian.name = custodian.name.trim().to_string();
    custodian.email = custodian.email.trim().to_string();
    custodian
}

/// Every record needs a name and a valid email; violations name the 1-based
/// record number.
pub fn check_custodian_records(custodians: &[CustodianInput]) -> Result<()> {
    let mut names = ValidationError::new(ValidationKind::CustodianNameRequired);
    let mut emails = ValidationError::new(ValidationKind::InvalidEmailAddress);

    for (index, custodian) in custodians.iter().enumerate() {
        let number = index + 1;
        if custodian.name.is_empty() {
            names.add(format!("record #{number}: custodian name is empty"));
        }
        if !is_valid_email(&custodian.email) {
            emails.add(format!(
                "record #{number}: custodian [{}] email [{}] is invalid",
                custodian.name, custodian.email
            ));
        }
    }

    let mut errors = Vec::new();
    record(&mut errors, "custodian name", names.into_option());
    record(&mut errors, "custodian email", emails.into_option());

    if !errors.is_empty() {
        return Err(ValidationReport { errors }.into());
    }
    Ok(())
}

/// Sends `custodians` in batches of `batch_size` and stops at the first
/// rejected batch. Returns the number of records imported.
pub fn import_custodians<T: Transport>(
    client: &Client<T>,
    custodians: &[CustodianInput],
    batch_size: usize,
) -> Result<usize> {
    if batch_size == 0 {
        bail!("batch size must be at least 1");
    }

    let batches = custodians.len().div_ceil(batch_size);
    let mut imported = 0;

    for (index, batch) in custodians.chunks(batch_size).enumerate() {
        let first = imported + 1;
        let last = imported + batch.len();
        client.import_custodians(batch).with_context(|| {
            format!(
                "custodian batch {} of {batches} (records #{first}-#{last}) failed; {imported} record(s) imported before it",
                index + 1
            )
        })?;

        imported = last;
        info!(batch = index + 1, batches, imported, "imported custodian batch");
    }

    Ok(imported)
}
