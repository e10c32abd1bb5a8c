use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use super::{HoldEntry, split_attachment_names};

/// Identifies one hold-unit: a hold name scoped to its matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HoldKey {
    pub matter_name: String,
    pub hold_name: String,
}

impl HoldKey {
    pub fn new(matter_name: &str, hold_name: &str) -> Self {
        Self {
            matter_name: matter_name.to_string(),
            hold_name: hold_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoldMetadata {
    pub matter_name: String,
    pub hold_name: String,
    pub subject: String,
    pub title: String,
    pub body: String,
    /// Raw comma-separated attachment cell of the first row of the hold.
    pub attachment_names: String,
}

impl HoldMetadata {
    pub fn attachments(&self) -> impl Iterator<Item = &str> {
        split_attachment_names(&self.attachment_names)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustodianNotice {
    pub name: String,
    pub email: String,
    pub sent_at: String,
    pub acknowledged_at: String,
    pub released_at: String,
}

/// Normalised view of a sheet. Every map keeps first-seen order and
/// first-seen values; conflicting later rows are left for the validator to
/// report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collections {
    pub folder_names: IndexSet<String>,
    pub matter_names: IndexSet<String>,
    /// email -> name
    pub custodians: IndexMap<String, String>,
    pub attachment_names: IndexSet<String>,
    pub matter_to_folder: IndexMap<String, String>,
    pub holds: IndexMap<HoldKey, HoldMetadata>,
    pub hold_custodians: IndexMap<HoldKey, Vec<CustodianNotice>>,
}

impl Collections {
    pub fn from_entries<'a, I>(entries: I) -> Self
    where
        I: IntoIterator<Item = &'a HoldEntry>,
    {
        let collections = entries
            .into_iter()
            .fold(Self::default(), |mut acc, entry| {
                acc.collect(entry);
                acc
            });

        debug!(
            folders = collections.folder_names.len(),
            matters = collections.matter_names.len(),
            custodians = collections.custodians.len(),
            attachments = collections.attachment_names.len(),
            holds = collections.holds.len(),
            "collected sheet entries"
        );

        collections
    }

    fn collect(&mut self, entry: &HoldEntry) {
        self.folder_names.insert(entry.folder_name.clone());
        self.matter_names.insert(entry.matter_name.clone());

        self.custodians
            .entry(entry.custodian_email.clone())
            .or_insert_with(|| entry.custodian_name.clone());
        self.matter_to_folder
            .entry(entry.matter_name.clone())
            .or_insert_with(|| entry.folder_name.clone());

        for name in split_attachment_names(&entry.attachment_names) {
            self.attachment_names.insert(name.to_string());
        }

        let key = entry.key();
        self.holds
            .entry(key.clone())
            .or_insert_with(|| HoldMetadata {
                matter_name: entry.matter_name.clone(),
                hold_name: entry.hold_name.clone(),
                subject: entry.subject.clone(),
                title: entry.title.clone(),
                body: entry.body.clone(),
                attachment_names: entry.attachment_names.clone(),
            });
        self.hold_custodians
            .entry(key)
            .or_default()
            .push(CustodianNotice {
                name: entry.custodian_name.clone(),
                email: entry.custodian_email.clone(),
                sent_at: entry.last_issued.clone(),
                acknowledged_at: entry.response_date.clone(),
                released_at: entry.released_at.clone(),
            });
    }

    pub fn folder_for_matter(&self, matter_name: &str) -> Option<&str> {
        self.matter_to_folder.get(matter_name).map(String::as_str)
    }

    /// One packaging unit per distinct matter+hold, in first-seen order.
    pub fn hold_units(&self) -> Vec<HoldUnit> {
        self.holds
            .iter()
            .map(|(key, metadata)| HoldUnit {
                folder_name: self
                    .folder_for_matter(&key.matter_name)
                    .unwrap_or_default()
                    .to_string(),
                metadata: metadata.clone(),
                custodians: self.hold_custodians.get(key).cloned().unwrap_or_default(),
                matter_id: None,
            })
            .collect()
    }
}

/// Everything needed to package and submit one hold. `matter_id` is filled
/// in once the matter has been resolved remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldUnit {
    pub folder_name: String,
    pub metadata: HoldMetadata,
    pub custodians: Vec<CustodianNotice>,
    pub matter_id: Option<i64>,
}

impl HoldUnit {
    pub fn key(&self) -> HoldKey {
        HoldKey::new(&self.metadata.matter_name, &self.metadata.hold_name)
    }
}
