use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Application resource as served by the Argo CD API.
///
/// Only the fields the status view needs are modelled; everything else in the
/// resource is ignored during decoding.
#[derive(Debug, Deserialize)]
pub struct ApplicationResource {
    pub metadata: ApplicationMetadata,
    pub status: ApplicationResourceStatus,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationMetadata {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResourceStatus {
    pub sync: StatusField,
    pub health: StatusField,
    pub operation_state: OperationState,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StatusField {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationState {
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub revision: String,
    pub deployed_at: DateTime<Utc>,
    #[serde(default)]
    pub deploy_started_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationListResource {
    #[serde(default)]
    pub items: Option<Vec<ApplicationResource>>,
}
