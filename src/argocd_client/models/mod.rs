mod application;
mod history;

pub use application::{ApplicationStatus, ApplicationStatusList, DeploymentEvent};
pub use history::DeploymentRow;
