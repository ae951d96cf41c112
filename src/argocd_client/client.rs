use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::identity::ApplicationQuery;
use crate::types::StatusError;

use super::api::{AppDetails, ApplicationListResource, ApplicationResource, ListAppsQuery};
use super::helpers::{api_url, with_segments, DEFAULT_PROXY_PATH, PROXY_SERVICE_NAME};
use super::models::{ApplicationStatus, ApplicationStatusList};
use super::schema::{
    describe, validate_application, validate_application_list, ValidationReport, Violation,
};
use super::transport::{Discovery, Transport};

/// Client for the Argo CD application API, reached through the backend proxy.
#[derive(Clone)]
pub struct ArgoCdClient {
    discovery: Arc<dyn Discovery>,
    transport: Arc<dyn Transport>,
    proxy_path: String,
}

impl ArgoCdClient {
    pub fn new(
        discovery: Arc<dyn Discovery>,
        transport: Arc<dyn Transport>,
        proxy_path: Option<String>,
    ) -> Self {
        Self {
            discovery,
            transport,
            proxy_path: proxy_path
                .filter(|path| !path.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PROXY_PATH.to_string()),
        }
    }

    pub fn proxy_path(&self) -> &str {
        &self.proxy_path
    }

    /// Fetch the status of one application by name.
    pub async fn get_app_details(&self, app_name: &str) -> Result<ApplicationStatus, StatusError> {
        let url = self.application_url(app_name).await?;
        let resource: ApplicationResource = self.get_validated(&url, validate_application).await?;
        Ok(resource.into())
    }

    /// Fetch every application matching the given selector and/or project.
    pub async fn list_apps(
        &self,
        selector: Option<&str>,
        project: Option<&str>,
    ) -> Result<ApplicationStatusList, StatusError> {
        let url = self.list_url(selector, project).await?;
        let resource: ApplicationListResource =
            self.get_validated(&url, validate_application_list).await?;
        Ok(resource.into())
    }

    /// Run whichever lookup the query calls for.
    pub async fn fetch(&self, query: &ApplicationQuery) -> Result<AppDetails, StatusError> {
        match query {
            ApplicationQuery::Single { app_name } => {
                self.get_app_details(app_name).await.map(AppDetails::Single)
            }
            ApplicationQuery::Filter { selector, project } => self
                .list_apps(selector.as_deref(), project.as_deref())
                .await
                .map(AppDetails::List),
        }
    }

    pub async fn application_url(&self, app_name: &str) -> Result<Url, StatusError> {
        let base = self.api_url().await?;
        with_segments(&base, &["applications", app_name])
    }

    pub async fn list_url(
        &self,
        selector: Option<&str>,
        project: Option<&str>,
    ) -> Result<Url, StatusError> {
        let base = self.api_url().await?;
        let mut url = with_segments(&base, &["applications"])?;
        ListAppsQuery::new(selector, project).apply(&mut url);
        Ok(url)
    }

    // Resolved on every call; the discovered base may change between requests.
    async fn api_url(&self) -> Result<Url, StatusError> {
        let proxy_base = self.discovery.get_base_url(PROXY_SERVICE_NAME).await?;
        api_url(&proxy_base, &self.proxy_path)
    }

    async fn get_validated<T>(
        &self,
        url: &Url,
        validate: fn(&Value) -> ValidationReport,
    ) -> Result<T, StatusError>
    where
        T: DeserializeOwned,
    {
        debug!(url = %url, "Requesting Argo CD API");
        let response = self.transport.request(url).await.map_err(|err| {
            warn!(url = %url, error = %err, "Argo CD request failed");
            err
        })?;

        if !response.is_success() {
            warn!(url = %url, status = response.status, "Argo CD API returned an error status");
            return Err(StatusError::RemoteStatus {
                url: url.to_string(),
                status: response.status,
                status_text: response.status_text,
            });
        }

        let body = response.json().map_err(|err| {
            invalid(
                url,
                Violation::new("$", "JSON document", format!("unparseable body ({err})")),
            )
        })?;

        let report = validate(&body);
        if !report.is_empty() {
            warn!(
                url = %url,
                violations = report.violations().len(),
                "Argo CD response failed validation"
            );
            return Err(StatusError::Validation(report));
        }

        T::deserialize(&body).map_err(|err| {
            invalid(
                url,
                Violation::new("$", "application payload", format!("{} ({err})", describe(&body))),
            )
        })
    }
}

fn invalid(url: &Url, violation: Violation) -> StatusError {
    warn!(url = %url, error = %violation, "Argo CD response could not be decoded");
    StatusError::Validation(ValidationReport::new(vec![violation]))
}
