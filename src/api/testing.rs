//! In-memory stand-in for the remote service, used by unit tests.
//!
//! Entities are stored as JSON per resource path. Name filters behave like
//! the real service (CONTAINS), hold imports unpack the uploaded archive and
//! register a hold built from its `hold_details` sheet, and every request is
//! recorded so tests can assert on remote traffic.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};

use calamine::{Data, Reader, Xlsx};
use serde_json::{Value, json};

use super::{ApiError, ApiRequest, Method, Transport};

struct Failure {
    method: Method,
    resource: String,
    filter_name: Option<String>,
    status: u16,
}

#[derive(Default)]
struct FakeState {
    next_id: i64,
    page_size: Option<usize>,
    entities: HashMap<String, Vec<Value>>,
    failures: Vec<Failure>,
    rejected_emails: Vec<String>,
}

#[derive(Default)]
pub(crate) struct FakeRemote {
    state: RefCell<FakeState>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl FakeRemote {
    pub(crate) fn new() -> Self {
        let remote = Self::default();
        remote.state.borrow_mut().next_id = 100;
        remote.with_entity("groups", json!({"id": 1, "name": "All Admins"}))
    }

    pub(crate) fn with_entity(self, resource: &str, entity: Value) -> Self {
        self.state
            .borrow_mut()
            .entities
            .entry(resource.to_string())
            .or_default()
            .push(entity);
        self
    }

    pub(crate) fn with_custodian(self, name: &str, email: &str) -> Self {
        let id = self.allocate_id();
        self.with_entity("custodians", json!({"id": id, "name": name, "email": email}))
    }

    /// Makes every matching request fail with `status`. A `filter_name` of
    /// `None` matches regardless of the name filter.
    pub(crate) fn with_failure(
        self,
        method: Method,
        resource: &str,
        filter_name: Option<&str>,
        status: u16,
    ) -> Self {
        self.state.borrow_mut().failures.push(Failure {
            method,
            resource: resource.to_string(),
            filter_name: filter_name.map(ToOwned::to_owned),
            status,
        });
        self
    }

    /// Splits list responses into pages of `size` entities, as the service
    /// does for large result sets. Lists come back in one page otherwise.
    pub(crate) fn with_page_size(self, size: usize) -> Self {
        self.state.borrow_mut().page_size = Some(size);
        self
    }

    /// Makes the custodian import endpoint answer with an `error` for any
    /// batch that carries `email`.
    pub(crate) fn with_rejected_custodian(self, email: &str) -> Self {
        self.state.borrow_mut().rejected_emails.push(email.to_string());
        self
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub(crate) fn entities(&self, resource: &str) -> Vec<Value> {
        self.state
            .borrow()
            .entities
            .get(resource)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) fn post_count(&self, resource: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|request| request.method == Method::Post && resource_of(request) == resource)
            .count()
    }

    fn allocate_id(&self) -> i64 {
        let mut state = self.state.borrow_mut();
        state.next_id += 1;
        state.next_id
    }

    fn list(&self, resource: &str, request: &ApiRequest) -> Value {
        let filter = request.query_value("filter[name]").unwrap_or_default();
        let items = self
            .entities(resource)
            .into_iter()
            .filter(|entity| {
                entity
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|name| name.contains(filter))
                    .unwrap_or(false)
            })
            .collect::<Vec<_>>();
        let total = items.len();

        let (items, has_more) = match self.state.borrow().page_size {
            Some(size) => {
                let page_number = request
                    .query_value("page_number")
                    .and_then(|value| value.parse::<usize>().ok())
                    .unwrap_or(1)
                    .max(1);
                let start = (page_number - 1) * size;
                let page = items.into_iter().skip(start).take(size).collect::<Vec<_>>();
                (page, start + size < total)
            }
            None => (items, false),
        };

        json!({
            "page": {"has-more": has_more, "total-count": total},
            "_embedded": {resource: items},
        })
    }

    fn create(&self, resource: &str, body: &Value) -> Value {
        let mut entity = body.clone();
        entity["id"] = json!(self.allocate_id());
        self.state
            .borrow_mut()
            .entities
            .entry(resource.to_string())
            .or_default()
            .push(entity.clone());
        entity
    }

    fn import_custodians(&self, body: &Value) -> Value {
        let custodians = body
            .get("custodians")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let rejected = custodians.iter().find_map(|custodian| {
            let email = custodian.get("email").and_then(Value::as_str)?;
            self.state
                .borrow()
                .rejected_emails
                .iter()
                .any(|rejected| rejected == email)
                .then(|| email.to_string())
        });
        if let Some(email) = rejected {
            return json!({"error": format!("custodian {email} rejected")});
        }

        for custodian in &custodians {
            self.create("custodians", custodian);
        }
        json!({"error": null})
    }

    fn import(&self, holds_resource: &str, request: &ApiRequest) -> Result<Value, ApiError> {
        let upload = request
            .upload
            .as_ref()
            .ok_or_else(|| ApiError::Transport("missing upload".to_string()))?;
        let (matter_id, hold_name, custodian_rows, archive_entries) =
            read_hold_archive(&upload.path, &upload.field)?;

        let hold = json!({
            "name": hold_name,
            "matter_id": matter_id,
            "custodian_rows": custodian_rows,
            "archive_entries": archive_entries,
        });
        Ok(self.create(holds_resource, &hold))
    }
}

impl Transport for FakeRemote {
    fn send(&self, request: &ApiRequest) -> Result<Vec<u8>, ApiError> {
        self.requests.borrow_mut().push(request.clone());
        let resource = resource_of(request);

        let failure = self.state.borrow().failures.iter().find_map(|failure| {
            let filter_matches = match &failure.filter_name {
                Some(name) => request.query_value("filter[name]") == Some(name.as_str()),
                None => true,
            };
            (failure.method == request.method && failure.resource == resource && filter_matches)
                .then_some(failure.status)
        });
        if let Some(status) = failure {
            return Err(ApiError::UnexpectedStatus(status));
        }

        let response = match (request.method, resource.as_str()) {
            (Method::Post, "legal_holds/import") => self.import("legal_holds", request)?,
            (Method::Post, "silent_holds/import") => self.import("silent_holds", request)?,
            (Method::Post, "custodians/import") => {
                self.import_custodians(request.body.as_ref().unwrap_or(&Value::Null))
            }
            (Method::Post, other) => self.create(other, request.body.as_ref().unwrap_or(&Value::Null)),
            (Method::Get, other) => match other.rsplit_once('/') {
                Some((base, id)) => {
                    let id = id.parse::<i64>().map_err(|_| ApiError::UnexpectedStatus(404))?;
                    self.entities(base)
                        .into_iter()
                        .find(|entity| entity.get("id").and_then(Value::as_i64) == Some(id))
                        .ok_or(ApiError::UnexpectedStatus(404))?
                }
                None => self.list(other, request),
            },
        };

        Ok(serde_json::to_vec(&response)?)
    }
}

fn resource_of(request: &ApiRequest) -> String {
    request
        .path
        .split_once("/api/v3/")
        .map(|(_, rest)| rest.to_string())
        .unwrap_or_default()
}

fn transport_error(err: impl std::fmt::Display) -> ApiError {
    ApiError::Transport(err.to_string())
}

fn read_hold_archive(
    path: &std::path::Path,
    stem: &str,
) -> Result<(i64, String, usize, Vec<String>), ApiError> {
    let file = File::open(path).map_err(transport_error)?;
    let mut archive = zip::ZipArchive::new(file).map_err(transport_error)?;

    let mut entries = Vec::new();
    for index in 0..archive.len() {
        let entry = archive.by_index(index).map_err(transport_error)?;
        entries.push(entry.name().to_string());
    }

    let mut workbook_bytes = Vec::new();
    archive
        .by_name(&format!("{stem}.xlsx"))
        .map_err(transport_error)?
        .read_to_end(&mut workbook_bytes)
        .map_err(transport_error)?;

    let mut workbook = Xlsx::new(Cursor::new(workbook_bytes)).map_err(transport_error)?;
    let holds = workbook
        .worksheet_range("hold_details")
        .map_err(transport_error)?;
    let custodians = workbook
        .worksheet_range("custodian_details")
        .map_err(transport_error)?;

    let cell = |row: u32, col: u32| -> String {
        match holds.get_value((row, col)) {
            Some(Data::String(value)) => value.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        }
    };

    let matter_id = cell(1, 0)
        .parse::<i64>()
        .map_err(|_| ApiError::UnexpectedStatus(422))?;
    let hold_name = cell(1, 1);
    let custodian_rows = custodians.height().saturating_sub(1);

    Ok((matter_id, hold_name, custodian_rows, entries))
}
