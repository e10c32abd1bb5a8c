use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::info;

use super::connect;
use crate::api::Resource;
use crate::cli::{CreateCommand, GlobalArgs};
use crate::importer::EntityResolver;
use crate::util::print_json_pretty;

pub fn run(global: &GlobalArgs, command: CreateCommand) -> Result<()> {
    let client = connect(global)?;
    let no_matters = IndexMap::new();
    let mut resolver = EntityResolver::new(&client, &no_matters);

    let (resource, id) = match command {
        CreateCommand::Folder(args) => {
            let id = resolver
                .resolve_folder_id(&args.name)
                .with_context(|| format!("failed to find or create folder {}", args.name))?;
            info!(folder = %args.name, id, "folder ready");
            (Resource::Folders, id)
        }
        CreateCommand::Matter(args) => {
            let id = resolver
                .find_or_create_matter(&args.name, args.folder_id)
                .with_context(|| format!("failed to find or create matter {}", args.name))?;
            info!(matter = %args.name, id, folder_id = args.folder_id, "matter ready");
            (Resource::Matters, id)
        }
    };

    let entity: Value = client
        .get(resource, id)
        .with_context(|| format!("failed to fetch {} {id}", resource.path()))?;
    print_json_pretty(&entity)
}
