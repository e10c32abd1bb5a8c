pub mod create;
pub mod get;
pub mod import;

use anyhow::Result;

use crate::api::{Client, HttpTransport};
use crate::cli::GlobalArgs;
use crate::config;

/// Builds an HTTP-backed client from the global connection flags.
pub fn connect(global: &GlobalArgs) -> Result<Client<HttpTransport>> {
    let config = config::resolve(global)?;
    let transport = HttpTransport::new(&config)?;
    Ok(Client::new(transport, config.tenant))
}
