use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use super::connect;
use crate::api::{Client, HttpTransport};
use crate::cli::{CustodianImportArgs, GlobalArgs, ImportArgs, ImportCommand, MatterImportArgs};
use crate::importer::{
    Collections, ImportOptions, IntegrityCheck, RowFilter, check_custodian_records,
    check_matter_entries, contact_pattern, import_custodians, import_holds, import_matters,
    parse_matter_rows, parse_rows, read_custodian_input, read_first_sheet, resolve_timezone,
};
use crate::model::HoldKind;

pub fn run(global: &GlobalArgs, command: ImportCommand) -> Result<()> {
    match command {
        ImportCommand::Legalholds(args) => {
            run_holds(global, HoldKind::Legal, args.import, args.attachment_directory)
        }
        ImportCommand::Silentholds(args) => {
            run_holds(global, HoldKind::Silent, args, PathBuf::from("."))
        }
        ImportCommand::Matters(args) => run_matters(global, args),
        ImportCommand::Custodians(args) => run_custodians(global, args),
    }
}

fn run_holds(
    global: &GlobalArgs,
    kind: HoldKind,
    args: ImportArgs,
    attachment_directory: PathBuf,
) -> Result<()> {
    if let Some(zipfile) = &args.zipfile {
        if args.check_input_only {
            bail!("--check-input-only needs --excel; a prepared archive cannot be checked");
        }
        let client = connect(global)?;
        return upload_archive(&client, kind, zipfile);
    }

    let excel = args
        .excel
        .as_deref()
        .context("either --excel or --zipfile is required")?;
    let timezone = resolve_timezone(&args.timezone)?;

    info!(
        kind = kind.as_str(),
        excel = %excel.display(),
        timezone = %timezone,
        "reading import spreadsheet"
    );
    let rows = read_first_sheet(excel)?;
    let filter = RowFilter::new(args.matter_name.as_deref(), args.hold_name.as_deref());
    let sheet = parse_rows(rows, kind, &filter)
        .with_context(|| format!("failed to parse {}", excel.display()))?;

    if sheet.entries.is_empty() {
        warn!(
            header_line = sheet.header_line,
            "no rows matched the import filters, nothing to do"
        );
        return Ok(());
    }

    let collections = Collections::from_entries(&sheet.entries);
    let client = connect(global)?;

    IntegrityCheck {
        kind,
        entries: &sheet.entries,
        collections: &collections,
        attachment_directory: &attachment_directory,
        timezone,
        client: &client,
        check_input_only: args.check_input_only,
    }
    .run()?;

    if args.check_input_only {
        info!(
            entries = sheet.entries.len(),
            holds = collections.holds.len(),
            "input check passed, nothing imported"
        );
        return Ok(());
    }

    let summary = import_holds(
        &client,
        &collections,
        &ImportOptions {
            kind,
            timezone,
            attachment_directory,
        },
    );

    if summary.failed() > 0 {
        bail!(
            "{} of {} {}s failed to import:\n{}",
            summary.failed(),
            summary.outcomes.len(),
            kind.as_str(),
            summary.failure_report()
        );
    }
    Ok(())
}

fn run_matters(global: &GlobalArgs, args: MatterImportArgs) -> Result<()> {
    info!(excel = %args.excel.display(), folder = %args.folder, "reading matter spreadsheet");
    let rows = read_first_sheet(&args.excel)?;
    let entries = parse_matter_rows(rows)
        .with_context(|| format!("failed to parse {}", args.excel.display()))?;
    if entries.is_empty() {
        warn!("matter sheet has no rows, nothing to do");
        return Ok(());
    }

    let pattern = contact_pattern()?;
    check_matter_entries(&entries, &pattern)?;
    if args.check_input_only {
        info!(entries = entries.len(), "input check passed, nothing imported");
        return Ok(());
    }

    let client = connect(global)?;
    let summary = import_matters(&client, &entries, &args.folder, &pattern)?;
    if summary.failed() > 0 {
        bail!(
            "{} of {} matters failed to import:\n{}",
            summary.failed(),
            summary.outcomes.len(),
            summary.failure_report()
        );
    }
    Ok(())
}

fn run_custodians(global: &GlobalArgs, args: CustodianImportArgs) -> Result<()> {
    let custodians = read_custodian_input(&args.input)?;
    if custodians.is_empty() {
        warn!(input = %args.input.display(), "no custodian records, nothing to do");
        return Ok(());
    }

    check_custodian_records(&custodians)?;
    if args.check_input_only {
        info!(records = custodians.len(), "input check passed, nothing imported");
        return Ok(());
    }

    let client = connect(global)?;
    let imported = import_custodians(&client, &custodians, args.batch_size)?;
    info!(input = %args.input.display(), imported, "custodian import finished");
    Ok(())
}

fn upload_archive(client: &Client<HttpTransport>, kind: HoldKind, zipfile: &Path) -> Result<()> {
    if !zipfile.is_file() {
        bail!("archive not found: {}", zipfile.display());
    }

    let hold = client
        .import_hold(kind, zipfile)
        .with_context(|| format!("failed to import {}", zipfile.display()))?;
    info!(
        kind = kind.as_str(),
        archive = %zipfile.display(),
        hold_id = hold.id,
        hold = %hold.name,
        "imported prepared archive"
    );
    Ok(())
}
