use std::collections::HashMap;

use indexmap::IndexMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::api::{ApiError, Client, Transport};
use crate::model::CreateMatterBody;

/// Group that owns every folder created by the importer.
pub const DEFAULT_ADMIN_GROUP: &str = "All Admins";

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to search {entity} {name:?}: {source}")]
    RemoteLookup {
        entity: &'static str,
        name: String,
        #[source]
        source: ApiError,
    },
    #[error("failed to create {entity} {name:?}: {source}")]
    Create {
        entity: &'static str,
        name: String,
        #[source]
        source: ApiError,
    },
    #[error("admin group {0:?} not found")]
    GroupNotFound(String),
    #[error("matter {0:?} has no folder in the sheet")]
    UnknownMatter(String),
}

/// Whether a find-or-create call reused an existing entity.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Resolved {
    Found(i64),
    Created(i64),
}

impl Resolved {
    pub fn id(self) -> i64 {
        match self {
            Self::Found(id) | Self::Created(id) => id,
        }
    }
}

/// Find-or-create resolution of folders and matters by exact name. Resolved
/// ids are cached for the lifetime of the resolver, so a name is searched or
/// created at most once per run.
pub struct EntityResolver<'a, T> {
    client: &'a Client<T>,
    matter_to_folder: &'a IndexMap<String, String>,
    folder_ids: HashMap<String, i64>,
    matter_ids: HashMap<String, i64>,
    admin_group_id: Option<i64>,
}

impl<'a, T: Transport> EntityResolver<'a, T> {
    pub fn new(client: &'a Client<T>, matter_to_folder: &'a IndexMap<String, String>) -> Self {
        Self {
            client,
            matter_to_folder,
            folder_ids: HashMap::new(),
            matter_ids: HashMap::new(),
            admin_group_id: None,
        }
    }

    fn admin_group_id(&mut self) -> Result<i64, ResolveError> {
        if let Some(id) = self.admin_group_id {
            return Ok(id);
        }

        let group = self
            .client
            .find_group_by_name(DEFAULT_ADMIN_GROUP)
            .map_err(|source| ResolveError::RemoteLookup {
                entity: "group",
                name: DEFAULT_ADMIN_GROUP.to_string(),
                source,
            })?
            .ok_or_else(|| ResolveError::GroupNotFound(DEFAULT_ADMIN_GROUP.to_string()))?;

        self.admin_group_id = Some(group.id);
        Ok(group.id)
    }

    pub fn resolve_folder_id(&mut self, name: &str) -> Result<i64, ResolveError> {
        if let Some(&id) = self.folder_ids.get(name) {
            debug!(folder = %name, id, "folder id cached");
            return Ok(id);
        }

        let found = self
            .client
            .find_folder_by_name(name)
            .map_err(|source| ResolveError::RemoteLookup {
                entity: "folder",
                name: name.to_string(),
                source,
            })?;

        let id = match found {
            Some(folder) => {
                debug!(folder = %name, id = folder.id, "found folder");
                folder.id
            }
            None => {
                let group_id = self.admin_group_id()?;
                let folder = self
                    .client
                    .create_folder(name, vec![group_id])
                    .map_err(|source| ResolveError::Create {
                        entity: "folder",
                        name: name.to_string(),
                        source,
                    })?;
                info!(folder = %name, id = folder.id, "created folder");
                folder.id
            }
        };

        self.folder_ids.insert(name.to_string(), id);
        Ok(id)
    }

    /// Resolves the matter's folder first, then finds the matter or creates
    /// it under that folder.
    pub fn resolve_matter_id(&mut self, name: &str) -> Result<i64, ResolveError> {
        if let Some(&id) = self.matter_ids.get(name) {
            debug!(matter = %name, id, "matter id cached");
            return Ok(id);
        }

        let matter_to_folder = self.matter_to_folder;
        let folder_name = matter_to_folder
            .get(name)
            .ok_or_else(|| ResolveError::UnknownMatter(name.to_string()))?;
        let folder_id = self.resolve_folder_id(folder_name)?;
        let id = self.find_or_create_matter(name, folder_id)?;

        self.matter_ids.insert(name.to_string(), id);
        Ok(id)
    }

    pub fn find_or_create_matter(&self, name: &str, folder_id: i64) -> Result<i64, ResolveError> {
        self.find_or_submit_matter(&CreateMatterBody::new(name, folder_id))
            .map(Resolved::id)
    }

    /// Looks the matter up by `body.name` and posts `body` only when no
    /// exact match exists. A failed search never falls through to a create.
    pub fn find_or_submit_matter(&self, body: &CreateMatterBody) -> Result<Resolved, ResolveError> {
        let name = body.name.as_str();
        let found = self
            .client
            .find_matter_by_name(name)
            .map_err(|source| ResolveError::RemoteLookup {
                entity: "matter",
                name: name.to_string(),
                source,
            })?;

        if let Some(matter) = found {
            debug!(matter = %name, id = matter.id, "found matter");
            return Ok(Resolved::Found(matter.id));
        }

        let matter = self
            .client
            .submit_matter(body)
            .map_err(|source| ResolveError::Create {
                entity: "matter",
                name: name.to_string(),
                source,
            })?;
        info!(matter = %name, id = matter.id, folder_id = body.folder_id, "created matter");
        Ok(Resolved::Created(matter.id))
    }
}
