mod api;
mod client;
mod helpers;
mod models;
mod schema;
mod transport;

pub use api::{AppDetails, ListAppsQuery};
pub use client::ArgoCdClient;
pub use helpers::{DEFAULT_PROXY_PATH, PROXY_SERVICE_NAME};
pub use models::{ApplicationStatus, ApplicationStatusList, DeploymentEvent, DeploymentRow};
pub use schema::{validate_application, validate_application_list, ValidationReport, Violation};
pub use transport::{Discovery, HttpResponse, ReqwestTransport, Transport, UrlPatternDiscovery};
