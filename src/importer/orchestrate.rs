use std::fmt;
use std::path::PathBuf;

use chrono_tz::Tz;
use tracing::{error, info, warn};

use super::{Collections, EntityResolver, HoldUnit, package_hold};
use crate::api::{Client, Transport};
use crate::model::HoldKind;
use crate::util::sha256_file;

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub kind: HoldKind,
    pub timezone: Tz,
    pub attachment_directory: PathBuf,
}

/// Step of the per-hold pipeline at which a hold failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ImportStage {
    Resolve,
    Lookup,
    Workspace,
    Package,
    Submit,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Resolve => "resolve",
            Self::Lookup => "lookup",
            Self::Workspace => "workspace",
            Self::Package => "package",
            Self::Submit => "submit",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldStatus {
    Done { hold_id: i64, archive_sha256: String },
    SkippedExists { hold_id: i64 },
    Failed { stage: ImportStage, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldOutcome {
    pub matter_name: String,
    pub hold_name: String,
    pub status: HoldStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub outcomes: Vec<HoldOutcome>,
}

impl ImportSummary {
    fn count(&self, predicate: impl Fn(&HoldStatus) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.status))
            .count()
    }

    pub fn done(&self) -> usize {
        self.count(|status| matches!(status, HoldStatus::Done { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|status| matches!(status, HoldStatus::SkippedExists { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|status| matches!(status, HoldStatus::Failed { .. }))
    }

    pub fn failures(&self) -> impl Iterator<Item = &HoldOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| matches!(outcome.status, HoldStatus::Failed { .. }))
    }

    /// One `matter [M] - hold [H] failed at <stage>: <reason>` line per
    /// failed hold, in processing order.
    pub fn failure_report(&self) -> String {
        self.failures()
            .filter_map(|outcome| match &outcome.status {
                HoldStatus::Failed { stage, reason } => Some(format!(
                    "matter [{}] - hold [{}] failed at {stage}: {reason}",
                    outcome.matter_name, outcome.hold_name
                )),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn failed(stage: ImportStage, err: impl Into<anyhow::Error>) -> HoldStatus {
    HoldStatus::Failed {
        stage,
        reason: format!("{:#}", err.into()),
    }
}

/// Imports every hold of `collections`, one at a time. A failing hold is
/// recorded and the loop moves on; nothing already submitted is rolled back.
pub fn import_holds<T: Transport>(
    client: &Client<T>,
    collections: &Collections,
    options: &ImportOptions,
) -> ImportSummary {
    let mut resolver = EntityResolver::new(client, &collections.matter_to_folder);
    let mut summary = ImportSummary::default();

    for mut unit in collections.hold_units() {
        let status = import_unit(client, &mut resolver, &mut unit, options);
        let matter_name = unit.metadata.matter_name;
        let hold_name = unit.metadata.hold_name;

        match &status {
            HoldStatus::Done { hold_id, .. } => {
                info!(matter = %matter_name, hold = %hold_name, hold_id, "imported hold");
            }
            HoldStatus::SkippedExists { hold_id } => {
                warn!(
                    matter = %matter_name,
                    hold = %hold_name,
                    hold_id,
                    "hold already exists, skipping"
                );
            }
            HoldStatus::Failed { stage, reason } => {
                error!(
                    matter = %matter_name,
                    hold = %hold_name,
                    stage = %stage,
                    error = %reason,
                    "hold import failed"
                );
            }
        }

        summary.outcomes.push(HoldOutcome {
            matter_name,
            hold_name,
            status,
        });
    }

    info!(
        kind = options.kind.as_str(),
        done = summary.done(),
        skipped = summary.skipped(),
        failed = summary.failed(),
        "import finished"
    );
    summary
}

fn import_unit<T: Transport>(
    client: &Client<T>,
    resolver: &mut EntityResolver<'_, T>,
    unit: &mut HoldUnit,
    options: &ImportOptions,
) -> HoldStatus {
    let kind = options.kind;
    let matter_id = match resolver.resolve_matter_id(&unit.metadata.matter_name) {
        Ok(id) => id,
        Err(err) => return failed(ImportStage::Resolve, err),
    };
    unit.matter_id = Some(matter_id);

    match client.find_hold(kind, &unit.metadata.hold_name, matter_id) {
        Ok(Some(existing)) => return HoldStatus::SkippedExists { hold_id: existing.id },
        Ok(None) => {}
        Err(err) => return failed(ImportStage::Lookup, err),
    }

    let workdir = match tempfile::Builder::new()
        .prefix(kind.temp_prefix())
        .tempdir()
    {
        Ok(dir) => dir,
        Err(err) => return failed(ImportStage::Workspace, err),
    };

    let archive = match package_hold(
        unit,
        kind,
        options.timezone,
        &options.attachment_directory,
        workdir.path(),
    ) {
        Ok(path) => path,
        Err(err) => return failed(ImportStage::Package, err),
    };
    let archive_sha256 = match sha256_file(&archive) {
        Ok(digest) => digest,
        Err(err) => return failed(ImportStage::Package, err),
    };

    match client.import_hold(kind, &archive) {
        Ok(hold) => HoldStatus::Done {
            hold_id: hold.id,
            archive_sha256,
        },
        Err(err) => failed(ImportStage::Submit, err),
    }
}
