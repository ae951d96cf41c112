use serde::{Deserialize, Serialize};

use crate::argocd_client::DEFAULT_PROXY_PATH;

/// Configuration for the Argo CD status client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Discovery pattern for backend services; `{{pluginId}}` is replaced by the service name.
    #[serde(default = "default_backend_url_pattern")]
    pub backend_url_pattern: String,

    /// Path of the Argo CD API below the proxy, defaults to `/argocd/api`.
    #[serde(default)]
    pub proxy_path: Option<String>,

    /// Argo CD UI base url, only used to build links to applications.
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url_pattern: default_backend_url_pattern(),
            proxy_path: None,
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_backend_url_pattern() -> String {
    "http://localhost:7007/api/{{pluginId}}".to_string()
}

fn default_request_timeout_secs() -> u64 {
    8
}

impl Config {
    pub fn proxy_path(&self) -> &str {
        self.proxy_path
            .as_deref()
            .filter(|path| !path.trim().is_empty())
            .unwrap_or(DEFAULT_PROXY_PATH)
    }

    /// Link to the application in the Argo CD UI, when a UI base url is configured.
    pub fn app_link(&self, app_name: &str) -> Option<String> {
        let base = self.base_url.as_deref()?.trim();
        if base.is_empty() {
            return None;
        }
        Some(format!(
            "{}/applications/{}",
            base.trim_end_matches('/'),
            app_name
        ))
    }
}
