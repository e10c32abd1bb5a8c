use serde::{Deserialize, Serialize};

use crate::api::Resource;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Folder {
    pub id: i64,
    pub name: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub inherit_email_config: bool,
    pub can_be_deleted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Matter {
    pub id: i64,
    pub name: String,
    pub folder_id: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub inherit_email_config: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Group {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Custodian {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub title: Option<String>,
    pub department: Option<String>,
}

/// A legal hold or silent hold as returned by the remote API. Both resources
/// share the fields the importer relies on.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HoldRecord {
    pub id: i64,
    pub matter_id: i64,
    pub name: String,
    pub status: Option<String>,
    pub draft: bool,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateFolderBody {
    pub name: String,
    pub inherit_email_config: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub group_ids: Vec<i64>,
}

/// Body of `POST matters`. Only the name and folder are required; the
/// descriptive fields come from a matter import sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CreateMatterBody {
    pub name: String,
    pub folder_id: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub number: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub case_number: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub po_number: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub caption: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub business_unit: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    pub inherit_email_config: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email_from: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email_reply_to: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name_on_outgoing_emails: String,
    pub matter_contacts_attributes: Vec<MatterContact>,
}

impl CreateMatterBody {
    pub fn new(name: &str, folder_id: i64) -> Self {
        Self {
            name: name.to_string(),
            folder_id,
            inherit_email_config: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatterContact {
    pub name: String,
    pub email: String,
}

/// One record of a custodian import file (JSON array or CSV with a header
/// row). Only the name and email are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustodianInput {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub employee_id: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub employee_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub employee_status: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub department: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub location: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub supervisor_email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub supervisor_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub function: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub business: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub country: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub delegate_email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub delegate_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustodianSyncBody<'a> {
    pub custodians: &'a [CustodianInput],
}

/// Reply of the custodian import endpoint; a non-null `error` or `errors`
/// means the batch was rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustodianSyncResponse {
    pub error: Option<serde_json::Value>,
    pub errors: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PageInfo {
    #[serde(rename = "has-more")]
    pub has_more: bool,
    #[serde(rename = "total-count")]
    pub total_count: u64,
}

/// The two hold flavours the importer understands. Legal holds track
/// acknowledgement and carry notice attachments; silent (advisory) holds do
/// neither.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum HoldKind {
    Legal,
    Silent,
}

impl HoldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Legal => "legal hold",
            Self::Silent => "silent hold",
        }
    }

    pub fn resource(self) -> Resource {
        match self {
            Self::Legal => Resource::LegalHolds,
            Self::Silent => Resource::SilentHolds,
        }
    }

    pub fn import_resource(self) -> Resource {
        match self {
            Self::Legal => Resource::LegalHoldImport,
            Self::Silent => Resource::SilentHoldImport,
        }
    }

    /// Stem shared by the generated workbook, the archive and the multipart
    /// field name of the import upload.
    pub fn artifact_stem(self) -> &'static str {
        match self {
            Self::Legal => "legal_hold_details",
            Self::Silent => "silent_hold_details",
        }
    }

    pub fn temp_prefix(self) -> &'static str {
        match self {
            Self::Legal => "legalhold_",
            Self::Silent => "silenthold_",
        }
    }

    pub fn tracks_acknowledgement(self) -> bool {
        matches!(self, Self::Legal)
    }

    pub fn supports_attachments(self) -> bool {
        matches!(self, Self::Legal)
    }
}
