use serde::{Deserialize, Serialize};

/// A change record as returned by the Gerrit `/changes/` endpoint
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Change {
    #[serde(rename = "_number")]
    pub number: u64,
    pub project: String,
    pub change_id: String,
    pub status: ChangeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Set on the last record of a page when more results exist
    #[serde(
        rename = "_more_changes",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub more_changes: bool,
}

/// Review state of a change
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeStatus {
    New,
    Merged,
    Abandoned,
}

impl Change {
    pub fn is_merged(&self) -> bool {
        self.status == ChangeStatus::Merged
    }
}
