use std::path::PathBuf;

use serde_json::Value;

pub const API_VERSION: &str = "v3";

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Resource {
    Custodians,
    CustodianImport,
    CustodianGroups,
    Folders,
    Groups,
    Matters,
    Questionnaires,
    LegalHolds,
    SilentHolds,
    LegalHoldImport,
    SilentHoldImport,
}

impl Resource {
    pub fn path(self) -> &'static str {
        match self {
            Self::Custodians => "custodians",
            Self::CustodianImport => "custodians/import",
            Self::CustodianGroups => "custodian_groups",
            Self::Folders => "folders",
            Self::Groups => "groups",
            Self::Matters => "matters",
            Self::Questionnaires => "questionnaires",
            Self::LegalHolds => "legal_holds",
            Self::SilentHolds => "silent_holds",
            Self::LegalHoldImport => "legal_holds/import",
            Self::SilentHoldImport => "silent_holds/import",
        }
    }

    /// Key of the `_embedded` object holding the entities of a list response.
    pub fn embedded_key(self) -> &'static str {
        match self {
            Self::CustodianImport => "custodians",
            Self::LegalHoldImport => "legal_holds",
            Self::SilentHoldImport => "silent_holds",
            other => other.path(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub field: String,
    pub path: PathBuf,
}

/// Everything a transport needs to issue one call: method, tenant-scoped
/// endpoint path, query parameters and at most one body (JSON or multipart).
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub upload: Option<Upload>,
}

impl ApiRequest {
    pub fn new(method: Method, tenant: &str, resource: Resource) -> Self {
        Self {
            method,
            path: format!("/t/{tenant}/api/{API_VERSION}/{}", resource.path()),
            query: Vec::new(),
            body: None,
            upload: None,
        }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.path = format!("{}/{id}", self.path);
        self
    }

    pub fn with_options(mut self, options: &ListOptions) -> Self {
        self.query = options.query_pairs();
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_upload(mut self, field: &str, path: PathBuf) -> Self {
        self.upload = Some(Upload {
            field: field.to_string(),
            path,
        });
        self
    }

    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
    pub sort: Option<String>,
    pub filter_term: Option<String>,
    pub filter_name: Option<String>,
}

impl ListOptions {
    pub fn filter_name(name: &str) -> Self {
        Self {
            filter_name: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        if let Some(size) = self.page_size.filter(|size| *size > 0) {
            pairs.push(("page_size".to_string(), size.to_string()));
        }
        if let Some(number) = self.page_number.filter(|number| *number > 0) {
            pairs.push(("page_number".to_string(), number.to_string()));
        }

        let text_params = [
            ("sort", &self.sort),
            ("filter[term]", &self.filter_term),
            ("filter[name]", &self.filter_name),
        ];
        for (key, value) in text_params {
            if let Some(value) = value.as_deref().filter(|value| !value.is_empty()) {
                pairs.push((key.to_string(), value.to_string()));
            }
        }

        pairs
    }
}
