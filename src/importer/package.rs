use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use tracing::{debug, info};
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

use super::{HoldUnit, INPUT_TIME_FORMAT, OUTPUT_TIME_FORMAT};
use crate::model::HoldKind;

pub const HOLD_DETAILS_SHEET: &str = "hold_details";
pub const CUSTODIAN_DETAILS_SHEET: &str = "custodian_details";

const LEGAL_HOLD_DETAILS_HEADER: [&str; 6] = [
    "Matter id",
    "Hold Name",
    "Hold notice subject",
    "Hold notice body",
    "Hold notice title",
    "Hold notice attachment names",
];

const SILENT_HOLD_DETAILS_HEADER: [&str; 5] = [
    "Matter id",
    "Hold Name",
    "Advisory notice subject",
    "Advisory notice body",
    "Advisory notice title",
];

const LEGAL_CUSTODIAN_HEADER: [&str; 5] =
    ["Name", "Email", "sent_at", "acknowledged_at", "released_at"];

const SILENT_CUSTODIAN_HEADER: [&str; 4] = ["Name", "Email", "sent_at", "released_at"];

/// Maps the short zone names accepted on the command line; anything else is
/// parsed as an IANA zone name.
pub fn resolve_timezone(name: &str) -> Result<Tz> {
    let zone = match name.trim().to_uppercase().as_str() {
        "" | "UTC" => return Ok(Tz::UTC),
        "CST" => "America/Chicago",
        "EST" => "America/New_York",
        "MST" => "America/Denver",
        "PST" => "America/Los_Angeles",
        _ => name.trim(),
    };

    zone.parse::<Tz>()
        .map_err(|err| anyhow!("unknown timezone {name:?}: {err}"))
}

/// Reads `value` as wall-clock time in `tz` and renders it in UTC. Returns
/// `None` for empty or unparseable input, and for local times skipped by a
/// daylight-saving transition.
pub fn convert_to_utc(tz: Tz, value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let naive = NaiveDateTime::parse_from_str(value, INPUT_TIME_FORMAT).ok()?;
    let local = tz.from_local_datetime(&naive).earliest()?;
    Some(
        local
            .with_timezone(&Utc)
            .format(OUTPUT_TIME_FORMAT)
            .to_string(),
    )
}

fn write_row(worksheet: &mut Worksheet, row: u32, cells: &[&str]) -> Result<(), XlsxError> {
    for (col, value) in cells.iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        worksheet.write_string(row, col as u16, *value)?;
    }
    Ok(())
}

fn write_hold_details(
    worksheet: &mut Worksheet,
    unit: &HoldUnit,
    kind: HoldKind,
    matter_id: &str,
) -> Result<(), XlsxError> {
    worksheet.set_name(HOLD_DETAILS_SHEET)?;
    let metadata = &unit.metadata;

    match kind {
        HoldKind::Legal => {
            let attachments = metadata.attachments().collect::<Vec<_>>().join(",");
            write_row(worksheet, 0, &LEGAL_HOLD_DETAILS_HEADER)?;
            write_row(
                worksheet,
                1,
                &[
                    matter_id,
                    &metadata.hold_name,
                    &metadata.subject,
                    &metadata.body,
                    &metadata.title,
                    &attachments,
                ],
            )
        }
        HoldKind::Silent => {
            write_row(worksheet, 0, &SILENT_HOLD_DETAILS_HEADER)?;
            write_row(
                worksheet,
                1,
                &[
                    matter_id,
                    &metadata.hold_name,
                    &metadata.subject,
                    &metadata.body,
                    &metadata.title,
                ],
            )
        }
    }
}

fn write_custodian_details(
    worksheet: &mut Worksheet,
    unit: &HoldUnit,
    kind: HoldKind,
    tz: Tz,
) -> Result<(), XlsxError> {
    worksheet.set_name(CUSTODIAN_DETAILS_SHEET)?;

    let header: &[&str] = match kind {
        HoldKind::Legal => &LEGAL_CUSTODIAN_HEADER,
        HoldKind::Silent => &SILENT_CUSTODIAN_HEADER,
    };
    write_row(worksheet, 0, header)?;

    for (index, notice) in unit.custodians.iter().enumerate() {
        let sent_at = convert_to_utc(tz, &notice.sent_at).unwrap_or_default();
        let released_at = convert_to_utc(tz, &notice.released_at).unwrap_or_default();
        let row = index as u32 + 1;

        if kind.tracks_acknowledgement() {
            let acknowledged_at = convert_to_utc(tz, &notice.acknowledged_at).unwrap_or_default();
            write_row(
                worksheet,
                row,
                &[&notice.name, &notice.email, &sent_at, &acknowledged_at, &released_at],
            )?;
        } else {
            write_row(
                worksheet,
                row,
                &[&notice.name, &notice.email, &sent_at, &released_at],
            )?;
        }
    }

    Ok(())
}

/// Writes `{stem}.xlsx` into `directory` with a `hold_details` sheet (one
/// metadata row) and a `custodian_details` sheet (one row per notice).
pub fn build_workbook(
    unit: &HoldUnit,
    kind: HoldKind,
    tz: Tz,
    directory: &Path,
) -> Result<PathBuf> {
    let matter_id = unit
        .matter_id
        .with_context(|| format!("matter {} has not been resolved", unit.metadata.matter_name))?
        .to_string();
    let path = directory.join(format!("{}.xlsx", kind.artifact_stem()));

    let mut workbook = Workbook::new();
    write_hold_details(workbook.add_worksheet(), unit, kind, &matter_id)
        .context("failed to write hold details sheet")?;
    write_custodian_details(workbook.add_worksheet(), unit, kind, tz)
        .context("failed to write custodian details sheet")?;
    workbook
        .save(&path)
        .with_context(|| format!("failed to save workbook: {}", path.display()))?;

    debug!(
        path = %path.display(),
        custodians = unit.custodians.len(),
        "wrote hold workbook"
    );
    Ok(path)
}

/// Zips `files` into `archive_path`, each stored under its base filename.
/// A base name that repeats is stored once, from its first occurrence.
/// Every input is opened before the archive is created so a missing file
/// leaves nothing half-written behind.
pub fn build_archive(archive_path: &Path, files: &[PathBuf]) -> Result<PathBuf> {
    let mut inputs = Vec::with_capacity(files.len());
    let mut seen = HashSet::new();
    for path in files {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .with_context(|| format!("invalid archive entry name: {}", path.display()))?
            .to_string();
        if !seen.insert(name.clone()) {
            debug!(entry = %name, path = %path.display(), "skipping repeated archive entry");
            continue;
        }
        let file = File::open(path)
            .with_context(|| format!("failed to open file for archiving: {}", path.display()))?;
        inputs.push((name, file));
    }

    let output = File::create(archive_path)
        .with_context(|| format!("failed to create archive: {}", archive_path.display()))?;
    let mut writer = zip::ZipWriter::new(output);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, mut file) in inputs {
        writer
            .start_file(name.as_str(), options)
            .with_context(|| format!("failed to add {name} to archive"))?;
        io::copy(&mut file, &mut writer)
            .with_context(|| format!("failed to write {name} to archive"))?;
    }

    writer
        .finish()
        .with_context(|| format!("failed to finalize archive: {}", archive_path.display()))?;

    debug!(path = %archive_path.display(), entries = seen.len(), "wrote hold archive");
    Ok(archive_path.to_path_buf())
}

/// Builds the workbook and the upload archive for one hold inside `workdir`.
pub fn package_hold(
    unit: &HoldUnit,
    kind: HoldKind,
    tz: Tz,
    attachment_directory: &Path,
    workdir: &Path,
) -> Result<PathBuf> {
    let workbook = build_workbook(unit, kind, tz, workdir)?;

    let mut files = vec![workbook];
    if kind.supports_attachments() {
        files.extend(
            unit.metadata
                .attachments()
                .map(|name| attachment_directory.join(name)),
        );
    }

    let archive = workdir.join(format!("{}.zip", kind.artifact_stem()));
    build_archive(&archive, &files)?;

    info!(
        matter = %unit.metadata.matter_name,
        hold = %unit.metadata.hold_name,
        archive = %archive.display(),
        "packaged hold"
    );
    Ok(archive)
}
