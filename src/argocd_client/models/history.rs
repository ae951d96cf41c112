use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::application::ApplicationStatusList;

/// A deployment history entry tagged with the application it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentRow {
    pub app: String,
    pub id: i64,
    pub revision: String,
    pub deployed_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_started_at: Option<DateTime<Utc>>,
}

impl DeploymentRow {
    /// Time between the deploy starting and finishing, when the start is known.
    pub fn duration(&self) -> Option<Duration> {
        self.deploy_started_at
            .map(|started| self.deployed_at.signed_duration_since(started))
    }
}

impl ApplicationStatusList {
    /// Flattens every application's history into one sequence.
    ///
    /// Rows follow item order first and history order within an item.
    pub fn history_rows(&self) -> Vec<DeploymentRow> {
        self.items
            .iter()
            .flat_map(|app| {
                app.history.iter().map(move |event| DeploymentRow {
                    app: app.name.clone(),
                    id: event.id,
                    revision: event.revision.clone(),
                    deployed_at: event.deployed_at,
                    deploy_started_at: event.deploy_started_at,
                })
            })
            .collect()
    }
}
