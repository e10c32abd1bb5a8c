use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_DOMAIN, DEFAULT_PORT};
use crate::importer::DEFAULT_BATCH_SIZE;

#[derive(Parser, Debug)]
#[command(
    name = "otlh",
    version,
    about = "Command-line client and spreadsheet importer for the legal hold service"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Connection and logging flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    #[arg(long, global = true, env = "LHN_DOMAIN", default_value = DEFAULT_DOMAIN)]
    pub domain: String,

    #[arg(long, global = true, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, global = true, env = "LHN_HTTPPROXY")]
    pub proxy: Option<String>,

    #[arg(long, global = true, env = "LHN_TENANT")]
    pub tenant: Option<String>,

    #[arg(long, global = true, env = "LHN_AUTHTOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// JSON file with domain, port, httpProxy, tenant and authToken; replaces
    /// the connection flags when given.
    #[arg(long, global = true, env = "LHN_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, global = true, default_value_t = false)]
    pub skip_verify: bool,

    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[arg(long, global = true, default_value_t = false)]
    pub trace: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(subcommand)]
    Create(CreateCommand),
    #[command(subcommand)]
    Get(GetCommand),
    #[command(subcommand)]
    Import(ImportCommand),
}

#[derive(Subcommand, Debug)]
pub enum CreateCommand {
    /// Find or create a folder under the default admin group.
    Folder(CreateFolderArgs),
    /// Find or create a matter inside an existing folder.
    Matter(CreateMatterArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateFolderArgs {
    #[arg(long)]
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct CreateMatterArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub folder_id: i64,
}

#[derive(Subcommand, Debug)]
pub enum GetCommand {
    Custodians(ListArgs),
    #[command(name = "custodian_groups", alias = "custodian-groups")]
    CustodianGroups(ListArgs),
    Folders(ListArgs),
    Groups(ListArgs),
    Matters(ListArgs),
    Legalholds(ListArgs),
    Silentholds(ListArgs),
    Questionnaires(ListArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Fetch a single entity by id instead of listing.
    #[arg(long)]
    pub id: Option<i64>,

    /// Follow pagination until every page has been fetched.
    #[arg(long, default_value_t = false)]
    pub all: bool,

    #[arg(long)]
    pub page_number: Option<u32>,

    #[arg(long, default_value_t = 50)]
    pub page_size: u32,

    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long)]
    pub filter_term: Option<String>,

    #[arg(long)]
    pub filter_name: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ImportCommand {
    Legalholds(LegalHoldImportArgs),
    Silentholds(ImportArgs),
    /// Create one matter per row of a matter sheet inside a folder.
    Matters(MatterImportArgs),
    /// Bulk-load custodian records from a .json or .csv file.
    Custodians(CustodianImportArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ImportArgs {
    #[arg(long, required_unless_present = "zipfile")]
    pub excel: Option<PathBuf>,

    /// Upload a prepared archive as-is, skipping the spreadsheet pipeline.
    #[arg(long, conflicts_with = "excel")]
    pub zipfile: Option<PathBuf>,

    /// UTC, CST, EST, MST, PST or any IANA zone name.
    #[arg(long, default_value = "UTC")]
    pub timezone: String,

    #[arg(long)]
    pub matter_name: Option<String>,

    #[arg(long)]
    pub hold_name: Option<String>,

    /// Validate the spreadsheet and stop without importing anything.
    #[arg(long, default_value_t = false)]
    pub check_input_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LegalHoldImportArgs {
    #[command(flatten)]
    pub import: ImportArgs,

    #[arg(long, default_value = ".")]
    pub attachment_directory: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct MatterImportArgs {
    #[arg(long)]
    pub excel: PathBuf,

    /// Folder that receives the new matters; created under the default admin
    /// group when missing.
    #[arg(long)]
    pub folder: String,

    /// Validate the sheet and stop without creating anything.
    #[arg(long, default_value_t = false)]
    pub check_input_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct CustodianImportArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Validate the records and stop without sending anything.
    #[arg(long, default_value_t = false)]
    pub check_input_only: bool,
}
