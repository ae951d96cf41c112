use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::argocd_client::{ApplicationStatusList, ArgoCdClient};
use crate::identity::{self, ApplicationQuery};
use crate::tracker::{AsyncResult, AsyncTracker, ErrorSink, TrackedState};
use crate::types::StatusError;

/// Status lookup for one annotated entity: the resolved query and its tracker.
pub struct ApplicationStatusSession {
    query: ApplicationQuery,
    tracker: AsyncTracker<ApplicationStatusList>,
}

impl ApplicationStatusSession {
    /// Resolve the entity's query and start fetching.
    ///
    /// Missing or ambiguous annotations fail here, before any request is made.
    pub fn start(
        annotations: &HashMap<String, String>,
        client: ArgoCdClient,
        sink: Arc<dyn ErrorSink>,
    ) -> Result<Self, StatusError> {
        let query = identity::resolve(annotations)?;
        info!(query = ?query, "Tracking Argo CD application status");

        let tracked_query = query.clone();
        let tracker = AsyncTracker::track(
            move || {
                let client = client.clone();
                let query = tracked_query.clone();
                async move { client.fetch(&query).await }
            },
            sink,
        );

        Ok(Self { query, tracker })
    }

    pub fn query(&self) -> &ApplicationQuery {
        &self.query
    }

    pub fn state(&self) -> AsyncResult<ApplicationStatusList> {
        self.tracker.state()
    }

    pub fn retry(&self) {
        self.tracker.retry();
    }

    pub async fn settled(&self) -> AsyncResult<ApplicationStatusList> {
        self.tracker.settled().await
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackedState<ApplicationStatusList>> {
        self.tracker.subscribe()
    }
}
