use crate::argocd_client::models::{ApplicationStatus, ApplicationStatusList};

/// Result of a status lookup, shaped by the kind of query that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppDetails {
    Single(ApplicationStatus),
    List(ApplicationStatusList),
}

impl From<AppDetails> for ApplicationStatusList {
    fn from(details: AppDetails) -> Self {
        match details {
            AppDetails::Single(status) => status.into(),
            AppDetails::List(list) => list,
        }
    }
}
