//! Argo CD application status for annotated catalog entities.
//!
//! [`identity::resolve`] turns entity annotations into an [`ApplicationQuery`],
//! [`ArgoCdClient`] fetches and validates the matching application status
//! through the backend proxy, and [`AsyncTracker`] exposes the lookup as a
//! retryable loading/value/error state that always carries a list of
//! applications.

pub mod app_status;
pub mod argocd_client;
pub mod config;
pub mod identity;
pub mod tracker;
pub mod types;

pub use app_status::ApplicationStatusSession;
pub use argocd_client::{
    AppDetails, ApplicationStatus, ApplicationStatusList, ArgoCdClient, DeploymentEvent,
    DeploymentRow, Discovery, HttpResponse, ReqwestTransport, Transport, UrlPatternDiscovery,
};
pub use config::Config;
pub use identity::ApplicationQuery;
pub use tracker::{AsyncResult, AsyncTracker, ErrorSink, TracingErrorSink};
pub use types::{ErrorKind, Result, StatusError};
