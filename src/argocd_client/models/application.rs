use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::argocd_client::api::{ApplicationListResource, ApplicationResource, HistoryEntry};

/// One past deployment of an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentEvent {
    pub id: i64,
    pub revision: String,
    pub deployed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_started_at: Option<DateTime<Utc>>,
}

/// Reported state of a single application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationStatus {
    pub name: String,
    pub sync_status: String,
    pub health_status: String,
    pub last_operation_finished_at: DateTime<Utc>,
    /// Oldest first, as the API orders it.
    pub history: Vec<DeploymentEvent>,
}

/// Applications in the order the API returned them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ApplicationStatusList {
    pub items: Vec<ApplicationStatus>,
}

impl ApplicationStatusList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl From<ApplicationStatus> for ApplicationStatusList {
    fn from(status: ApplicationStatus) -> Self {
        Self {
            items: vec![status],
        }
    }
}

impl From<HistoryEntry> for DeploymentEvent {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            id: entry.id,
            revision: entry.revision,
            deployed_at: entry.deployed_at,
            deploy_started_at: entry.deploy_started_at,
        }
    }
}

impl From<ApplicationResource> for ApplicationStatus {
    fn from(resource: ApplicationResource) -> Self {
        let status = resource.status;
        Self {
            name: resource.metadata.name,
            sync_status: status.sync.status,
            health_status: status.health.status,
            last_operation_finished_at: status.operation_state.finished_at,
            history: status.history.into_iter().map(DeploymentEvent::from).collect(),
        }
    }
}

impl From<ApplicationListResource> for ApplicationStatusList {
    fn from(resource: ApplicationListResource) -> Self {
        Self {
            items: resource
                .items
                .unwrap_or_default()
                .into_iter()
                .map(ApplicationStatus::from)
                .collect(),
        }
    }
}
