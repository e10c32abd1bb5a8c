//! Boundary to the remote legal-hold service.
//!
//! Everything above this module speaks in typed entities; everything below
//! it is a [`Transport`] that turns an [`ApiRequest`] into raw response
//! bytes. Name searches on the service are CONTAINS filters, so every `find_*`
//! helper post-filters the page for an exact match.

mod http;
mod request;
#[cfg(test)]
pub(crate) mod testing;

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::model::{
    CreateFolderBody, CreateMatterBody, Custodian, CustodianInput, CustodianSyncBody,
    CustodianSyncResponse, Folder, Group, HoldKind, HoldRecord, Matter, PageInfo,
};

pub use http::HttpTransport;
pub use request::{ApiRequest, ListOptions, Method, Resource};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("unexpected status code: {0}")]
    UnexpectedStatus(u16),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("failed to attach {path}: {source}")]
    Upload {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<Vec<u8>, ApiError>;
}

/// One page of a list endpoint.
#[derive(Debug, Clone)]
pub struct Page<E> {
    pub info: PageInfo,
    pub items: Vec<E>,
}

pub struct Client<T> {
    transport: T,
    tenant: String,
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T, tenant: impl Into<String>) -> Self {
        Self {
            transport,
            tenant: tenant.into(),
        }
    }

    #[cfg(test)]
    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub fn request(&self, method: Method, resource: Resource) -> ApiRequest {
        ApiRequest::new(method, &self.tenant, resource)
    }

    pub fn send(&self, request: &ApiRequest) -> Result<Vec<u8>, ApiError> {
        debug!(method = request.method.as_str(), path = %request.path, "sending request");
        self.transport.send(request)
    }

    pub fn get<E: DeserializeOwned>(&self, resource: Resource, id: i64) -> Result<E, ApiError> {
        let request = self.request(Method::Get, resource).with_id(id);
        let raw = self.send(&request)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub fn list<E: DeserializeOwned>(
        &self,
        resource: Resource,
        options: &ListOptions,
    ) -> Result<Page<E>, ApiError> {
        let request = self.request(Method::Get, resource).with_options(options);
        let raw = self.send(&request)?;
        decode_page(resource, &raw)
    }

    /// Walks `page_number` from 1 until the service reports no more pages.
    pub fn list_all<E: DeserializeOwned>(
        &self,
        resource: Resource,
        options: &ListOptions,
    ) -> Result<Vec<E>, ApiError> {
        let mut options = options.clone();
        let mut items = Vec::new();
        let mut page_number = 1;

        loop {
            options.page_number = Some(page_number);
            let page = self.list::<E>(resource, &options)?;
            debug!(
                resource = resource.path(),
                page_number,
                total = page.info.total_count,
                "fetched page"
            );

            let received = page.items.len();
            items.extend(page.items);
            if !page.info.has_more || received == 0 {
                break;
            }
            page_number += 1;
        }

        Ok(items)
    }

    /// Pages through a CONTAINS search until an exact match turns up or the
    /// service runs out of pages.
    fn find_exact<E, F>(&self, resource: Resource, name: &str, is_match: F) -> Result<Option<E>, ApiError>
    where
        E: DeserializeOwned,
        F: Fn(&E) -> bool,
    {
        let mut options = ListOptions::filter_name(name);
        let mut page_number = 1;

        loop {
            options.page_number = Some(page_number);
            let page = self.list::<E>(resource, &options)?;
            let received = page.items.len();
            if let Some(found) = page.items.into_iter().find(|item| is_match(item)) {
                return Ok(Some(found));
            }
            if !page.info.has_more || received == 0 {
                return Ok(None);
            }
            page_number += 1;
        }
    }

    pub fn find_folder_by_name(&self, name: &str) -> Result<Option<Folder>, ApiError> {
        debug!(name, "searching folder by name");
        self.find_exact(Resource::Folders, name, |folder: &Folder| folder.name == name)
    }

    pub fn find_matter_by_name(&self, name: &str) -> Result<Option<Matter>, ApiError> {
        debug!(name, "searching matter by name");
        self.find_exact(Resource::Matters, name, |matter: &Matter| matter.name == name)
    }

    pub fn find_group_by_name(&self, name: &str) -> Result<Option<Group>, ApiError> {
        debug!(name, "searching group by name");
        self.find_exact(Resource::Groups, name, |group: &Group| group.name == name)
    }

    pub fn find_custodian(&self, name: &str, email: &str) -> Result<Option<Custodian>, ApiError> {
        debug!(name, email, "searching custodian by name and email");
        self.find_exact(Resource::Custodians, name, |custodian: &Custodian| {
            custodian.name == name && custodian.email == email
        })
    }

    pub fn find_hold(
        &self,
        kind: HoldKind,
        name: &str,
        matter_id: i64,
    ) -> Result<Option<HoldRecord>, ApiError> {
        debug!(kind = kind.as_str(), name, matter_id, "searching hold by name and matter");
        self.find_exact(kind.resource(), name, |hold: &HoldRecord| {
            hold.name == name && hold.matter_id == matter_id
        })
    }

    pub fn create_folder(&self, name: &str, group_ids: Vec<i64>) -> Result<Folder, ApiError> {
        let body = CreateFolderBody {
            name: name.to_string(),
            inherit_email_config: true,
            group_ids,
        };
        let request = self
            .request(Method::Post, Resource::Folders)
            .with_body(serde_json::to_value(&body)?);
        let folder: Folder = serde_json::from_slice(&self.send(&request)?)?;
        debug!(name, id = folder.id, "created folder");
        Ok(folder)
    }

    pub fn submit_matter(&self, body: &CreateMatterBody) -> Result<Matter, ApiError> {
        let request = self
            .request(Method::Post, Resource::Matters)
            .with_body(serde_json::to_value(body)?);
        let matter: Matter = serde_json::from_slice(&self.send(&request)?)?;
        debug!(
            name = %body.name,
            id = matter.id,
            folder_id = body.folder_id,
            contacts = body.matter_contacts_attributes.len(),
            "created matter"
        );
        Ok(matter)
    }

    /// Sends one batch of custodian records to the bulk import endpoint.
    pub fn import_custodians(&self, custodians: &[CustodianInput]) -> Result<(), ApiError> {
        let body = CustodianSyncBody { custodians };
        let request = self
            .request(Method::Post, Resource::CustodianImport)
            .with_body(serde_json::to_value(&body)?);
        let response: CustodianSyncResponse = serde_json::from_slice(&self.send(&request)?)?;

        let rejection = [response.error, response.errors]
            .into_iter()
            .flatten()
            .find(|value| !is_blank(value));
        if let Some(rejection) = rejection {
            return Err(ApiError::Rejected(rejection.to_string()));
        }

        debug!(count = custodians.len(), "imported custodian batch");
        Ok(())
    }

    /// Uploads a prepared hold archive to the import endpoint of `kind`.
    pub fn import_hold(&self, kind: HoldKind, archive: &Path) -> Result<HoldRecord, ApiError> {
        let request = self
            .request(Method::Post, kind.import_resource())
            .with_upload(kind.artifact_stem(), archive.to_path_buf());
        let raw = self.send(&request)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

fn decode_page<E: DeserializeOwned>(resource: Resource, raw: &[u8]) -> Result<Page<E>, ApiError> {
    let mut envelope: Value = serde_json::from_slice(raw)?;

    let info = match envelope.get_mut("page") {
        Some(page) => serde_json::from_value(page.take())?,
        None => PageInfo::default(),
    };

    let items = match envelope
        .get_mut("_embedded")
        .and_then(|embedded| embedded.get_mut(resource.embedded_key()))
    {
        Some(items) => serde_json::from_value(items.take())?,
        None => Vec::new(),
    };

    Ok(Page { info, items })
}
