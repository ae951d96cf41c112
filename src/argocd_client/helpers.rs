use reqwest::Url;

use crate::types::StatusError;

pub const DEFAULT_PROXY_PATH: &str = "/argocd/api";
pub const PROXY_SERVICE_NAME: &str = "proxy";

/// Joins the discovered proxy base and the Argo CD proxy path into one URL.
pub fn api_url(proxy_base: &str, proxy_path: &str) -> Result<Url, StatusError> {
    let raw = format!(
        "{}/{}",
        proxy_base.trim_end_matches('/'),
        proxy_path.trim_start_matches('/')
    );
    Url::parse(raw.trim_end_matches('/')).map_err(|err| {
        StatusError::Configuration(format!("Invalid Argo CD API url `{raw}`: {err}"))
    })
}

/// Appends path segments to `base`, percent-encoding each segment.
pub fn with_segments(base: &Url, segments: &[&str]) -> Result<Url, StatusError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| {
            StatusError::Configuration(format!("Argo CD API url `{base}` cannot carry a path"))
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}
