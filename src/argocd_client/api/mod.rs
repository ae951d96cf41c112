mod queries;
mod responses;
mod types;

pub use queries::ListAppsQuery;
pub use responses::AppDetails;
pub use types::{ApplicationListResource, ApplicationResource, HistoryEntry};
