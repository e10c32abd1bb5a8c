use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use super::connect;
use crate::api::{ListOptions, Resource};
use crate::cli::{GetCommand, GlobalArgs, ListArgs};
use crate::util::print_json_pretty;

pub fn run(global: &GlobalArgs, command: GetCommand) -> Result<()> {
    let (resource, args) = match command {
        GetCommand::Custodians(args) => (Resource::Custodians, args),
        GetCommand::CustodianGroups(args) => (Resource::CustodianGroups, args),
        GetCommand::Folders(args) => (Resource::Folders, args),
        GetCommand::Groups(args) => (Resource::Groups, args),
        GetCommand::Matters(args) => (Resource::Matters, args),
        GetCommand::Legalholds(args) => (Resource::LegalHolds, args),
        GetCommand::Silentholds(args) => (Resource::SilentHolds, args),
        GetCommand::Questionnaires(args) => (Resource::Questionnaires, args),
    };
    let client = connect(global)?;

    if let Some(id) = args.id {
        let entity: Value = client
            .get(resource, id)
            .with_context(|| format!("failed to fetch {} {id}", resource.path()))?;
        return print_json_pretty(&entity);
    }

    let options = list_options(&args);
    let items: Vec<Value> = if args.all {
        client
            .list_all(resource, &options)
            .with_context(|| format!("failed to list all {}", resource.path()))?
    } else {
        let page = client
            .list(resource, &options)
            .with_context(|| format!("failed to list {}", resource.path()))?;
        info!(
            resource = resource.path(),
            has_more = page.info.has_more,
            total = page.info.total_count,
            "fetched page"
        );
        page.items
    };

    info!(resource = resource.path(), count = items.len(), "listed entities");
    print_json_pretty(&items)
}

fn list_options(args: &ListArgs) -> ListOptions {
    ListOptions {
        page_size: Some(args.page_size),
        page_number: args.page_number,
        sort: args.sort.clone(),
        filter_term: args.filter_term.clone(),
        filter_name: args.filter_name.clone(),
    }
}
