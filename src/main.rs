use std::collections::HashMap;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use argocd_status::{
    ApplicationStatusSession, ArgoCdClient, AsyncResult, Config, ReqwestTransport, StatusError,
    TracingErrorSink, UrlPatternDiscovery,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}: {}", err.kind(), err);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), StatusError> {
    let annotations = parse_annotations(env::args().skip(1))?;
    let config = Config::load().await;

    let transport = ReqwestTransport::new(Duration::from_secs(config.request_timeout_secs))?;
    let client = ArgoCdClient::new(
        Arc::new(UrlPatternDiscovery::compile(config.backend_url_pattern.clone())),
        Arc::new(transport),
        config.proxy_path.clone(),
    );

    let session =
        ApplicationStatusSession::start(&annotations, client, Arc::new(TracingErrorSink))?;
    match session.settled().await {
        AsyncResult::Ready(list) => {
            for app in &list.items {
                if let Some(link) = config.app_link(&app.name) {
                    info!(app = %app.name, link = %link, "Argo CD application");
                }
            }
            let rendered = serde_json::to_string_pretty(&list).map_err(|err| {
                StatusError::Configuration(format!("Failed to render status: {err}"))
            })?;
            println!("{rendered}");
            Ok(())
        }
        AsyncResult::Failed(err) => Err(err),
        AsyncResult::Loading => {
            error!("Status lookup ended without a result");
            Err(StatusError::Configuration(
                "Status lookup ended without a result".to_string(),
            ))
        }
    }
}

fn parse_annotations(
    args: impl Iterator<Item = String>,
) -> Result<HashMap<String, String>, StatusError> {
    args.map(|arg| match arg.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(StatusError::Configuration(format!(
            "Expected annotation as key=value, got `{arg}`"
        ))),
    })
    .collect()
}
