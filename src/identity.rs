//! Resolves which Argo CD applications an entity refers to from its annotations.

use std::collections::HashMap;

use crate::types::StatusError;

pub const ANNOTATION_APP_NAME: &str = "argocd/app-name";
pub const ANNOTATION_APP_SELECTOR: &str = "argocd/app-selector";
pub const ANNOTATION_PROJECT_NAME: &str = "argocd/project-name";

/// What to ask the Argo CD API for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationQuery {
    /// One application, looked up by name.
    Single { app_name: String },
    /// Every application matching a label selector and/or belonging to a project.
    /// At least one of the two is set.
    Filter {
        selector: Option<String>,
        project: Option<String>,
    },
}

/// Returns true when the annotations name any Argo CD identity at all.
pub fn is_available(annotations: &HashMap<String, String>) -> bool {
    [
        ANNOTATION_APP_NAME,
        ANNOTATION_APP_SELECTOR,
        ANNOTATION_PROJECT_NAME,
    ]
    .iter()
    .any(|key| annotation(annotations, key).is_some())
}

/// Resolve a query from entity annotations.
///
/// Empty annotation values count as absent. An app name cannot be combined
/// with a selector or project; a selector and a project can be combined.
pub fn resolve(annotations: &HashMap<String, String>) -> Result<ApplicationQuery, StatusError> {
    let app_name = annotation(annotations, ANNOTATION_APP_NAME);
    let selector = annotation(annotations, ANNOTATION_APP_SELECTOR);
    let project = annotation(annotations, ANNOTATION_PROJECT_NAME);

    match (app_name, selector, project) {
        (None, None, None) => Err(StatusError::Configuration(format!(
            "'argocd' annotation is missing: set '{ANNOTATION_APP_NAME}', \
             '{ANNOTATION_APP_SELECTOR}' or '{ANNOTATION_PROJECT_NAME}'"
        ))),
        (Some(name), None, None) => Ok(ApplicationQuery::Single {
            app_name: name.to_string(),
        }),
        (Some(_), _, _) => Err(StatusError::Configuration(format!(
            "Cannot provide both '{ANNOTATION_APP_NAME}' and \
             '{ANNOTATION_APP_SELECTOR}'/'{ANNOTATION_PROJECT_NAME}' annotations"
        ))),
        (None, selector, project) => Ok(ApplicationQuery::Filter {
            selector: selector.map(str::to_string),
            project: project.map(str::to_string),
        }),
    }
}

fn annotation<'a>(annotations: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    annotations
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
