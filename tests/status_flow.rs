use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use argocd_status::identity::{ANNOTATION_APP_NAME, ANNOTATION_APP_SELECTOR};
use argocd_status::{
    AppDetails, ApplicationQuery, ApplicationStatus, ApplicationStatusList,
    ApplicationStatusSession, ArgoCdClient, Discovery, ErrorKind, ErrorSink, HttpResponse,
    StatusError, Transport, UrlPatternDiscovery,
};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::{json, Value};
use tokio::sync::oneshot;

const APPLICATIONS_URL: &str = "http://backstage.test/api/proxy/argocd/api/applications";

/// Serves canned responses by exact url and records every request.
#[derive(Default)]
struct FixtureTransport {
    routes: Mutex<HashMap<String, Result<HttpResponse, StatusError>>>,
    requests: Mutex<Vec<String>>,
}

impl FixtureTransport {
    fn respond(&self, url: &str, status: u16, status_text: &str, body: &Value) {
        self.routes.lock().unwrap().insert(
            url.to_string(),
            Ok(HttpResponse {
                status,
                status_text: status_text.to_string(),
                body: serde_json::to_vec(body).unwrap(),
            }),
        );
    }

    fn fail(&self, url: &str, err: StatusError) {
        self.routes.lock().unwrap().insert(url.to_string(), Err(err));
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FixtureTransport {
    async fn request(&self, url: &Url) -> Result<HttpResponse, StatusError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.routes
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| {
                Ok(HttpResponse {
                    status: 404,
                    status_text: "Not Found".to_string(),
                    body: Vec::new(),
                })
            })
    }
}

/// One queued reply: signals `arrived` when its request comes in and answers once `gate` opens.
struct GatedReply {
    arrived: oneshot::Sender<()>,
    gate: oneshot::Receiver<()>,
    response: HttpResponse,
}

/// Handles the test keeps for a queued reply: arrival notice and gate opener.
struct ReplyHandle {
    arrived: oneshot::Receiver<()>,
    open: oneshot::Sender<()>,
}

fn gated(response: HttpResponse) -> (GatedReply, ReplyHandle) {
    let (arrived_tx, arrived_rx) = oneshot::channel();
    let (open_tx, open_rx) = oneshot::channel();
    let reply = GatedReply {
        arrived: arrived_tx,
        gate: open_rx,
        response,
    };
    let handle = ReplyHandle {
        arrived: arrived_rx,
        open: open_tx,
    };
    (reply, handle)
}

/// Answers the n-th request only once the n-th gate is opened.
struct GatedTransport {
    replies: Mutex<VecDeque<GatedReply>>,
}

#[async_trait]
impl Transport for GatedTransport {
    async fn request(&self, _url: &Url) -> Result<HttpResponse, StatusError> {
        let next = self.replies.lock().unwrap().pop_front();
        let reply = next.expect("unexpected request");
        let _ = reply.arrived.send(());
        let _ = reply.gate.await;
        Ok(reply.response)
    }
}

struct CountingDiscovery {
    inner: UrlPatternDiscovery,
    calls: AtomicUsize,
}

#[async_trait]
impl Discovery for CountingDiscovery {
    async fn get_base_url(&self, service: &str) -> Result<String, StatusError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.get_base_url(service).await
    }
}

#[derive(Default)]
struct RecordingSink {
    posted: Mutex<Vec<ErrorKind>>,
}

impl ErrorSink for RecordingSink {
    fn post(&self, error: &StatusError) {
        self.posted.lock().unwrap().push(error.kind());
    }
}

fn discovery() -> Arc<UrlPatternDiscovery> {
    Arc::new(UrlPatternDiscovery::compile(
        "http://backstage.test/api/{{pluginId}}",
    ))
}

fn client_with(transport: Arc<dyn Transport>) -> ArgoCdClient {
    ArgoCdClient::new(discovery(), transport, None)
}

fn annotations(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn app_payload(name: &str) -> Value {
    json!({
        "metadata": { "name": name, "namespace": "argocd" },
        "spec": { "project": "default" },
        "status": {
            "sync": { "status": "Synced" },
            "health": { "status": "Healthy" },
            "operationState": { "finishedAt": "2020-11-18T16:47:04Z" },
            "history": []
        }
    })
}

fn guestbook_status() -> ApplicationStatus {
    ApplicationStatus {
        name: "guestbook".to_string(),
        sync_status: "Synced".to_string(),
        health_status: "Healthy".to_string(),
        last_operation_finished_at: "2020-11-18T16:47:04Z".parse().unwrap(),
        history: Vec::new(),
    }
}

fn ok_response(body: &Value) -> HttpResponse {
    HttpResponse {
        status: 200,
        status_text: "OK".to_string(),
        body: serde_json::to_vec(body).unwrap(),
    }
}

#[tokio::test]
async fn single_app_settles_as_one_item_list() {
    let transport = Arc::new(FixtureTransport::default());
    transport.respond(
        &format!("{APPLICATIONS_URL}/guestbook"),
        200,
        "OK",
        &app_payload("guestbook"),
    );

    let session = ApplicationStatusSession::start(
        &annotations(&[(ANNOTATION_APP_NAME, "guestbook")]),
        client_with(transport.clone()),
        Arc::new(RecordingSink::default()),
    )
    .unwrap();

    let settled = session.settled().await;
    assert!(!settled.is_loading());
    assert!(settled.error().is_none());
    assert_eq!(settled.value().unwrap().items, vec![guestbook_status()]);
    assert_eq!(
        session.query(),
        &ApplicationQuery::Single {
            app_name: "guestbook".to_string()
        }
    );
    assert_eq!(
        transport.requests(),
        vec![format!("{APPLICATIONS_URL}/guestbook")]
    );
}

#[tokio::test]
async fn forbidden_list_surfaces_remote_status() {
    let transport = Arc::new(FixtureTransport::default());
    transport.respond(
        &format!("{APPLICATIONS_URL}?selector=env%3Dprod"),
        403,
        "Forbidden",
        &json!({ "error": "permission denied" }),
    );
    let sink = Arc::new(RecordingSink::default());

    let session = ApplicationStatusSession::start(
        &annotations(&[(ANNOTATION_APP_SELECTOR, "env=prod")]),
        client_with(transport),
        sink.clone(),
    )
    .unwrap();

    let settled = session.settled().await;
    let err = settled.error().expect("lookup should fail");
    assert_eq!(err.kind(), ErrorKind::RemoteStatus);
    assert!(err.to_string().contains("403"));
    assert!(err.to_string().contains("Forbidden"));
    assert_eq!(sink.posted.lock().unwrap().as_slice(), &[ErrorKind::RemoteStatus]);
}

#[tokio::test]
async fn missing_health_surfaces_validation_path() {
    let mut payload = app_payload("guestbook");
    payload["status"].as_object_mut().unwrap().remove("health");
    let transport = Arc::new(FixtureTransport::default());
    transport.respond(&format!("{APPLICATIONS_URL}/guestbook"), 200, "OK", &payload);

    let session = ApplicationStatusSession::start(
        &annotations(&[(ANNOTATION_APP_NAME, "guestbook")]),
        client_with(transport),
        Arc::new(RecordingSink::default()),
    )
    .unwrap();

    let settled = session.settled().await;
    let err = settled.error().expect("lookup should fail");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("status.health"));
    match err {
        StatusError::Validation(report) => assert!(report.touches("status.health")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn selector_lookup_keeps_remote_order() {
    let transport = Arc::new(FixtureTransport::default());
    transport.respond(
        &format!("{APPLICATIONS_URL}?selector=env%3Dprod"),
        200,
        "OK",
        &json!({ "items": [app_payload("zeta"), app_payload("alpha")] }),
    );

    let session = ApplicationStatusSession::start(
        &annotations(&[(ANNOTATION_APP_SELECTOR, "env=prod")]),
        client_with(transport.clone()),
        Arc::new(RecordingSink::default()),
    )
    .unwrap();

    let settled = session.settled().await;
    let names: Vec<&str> = settled
        .value()
        .unwrap()
        .items
        .iter()
        .map(|app| app.name.as_str())
        .collect();
    assert_eq!(names, vec!["zeta", "alpha"]);
    assert!(!transport.requests()[0].contains("project"));
}

#[tokio::test]
async fn retry_result_wins_over_stale_fetch() {
    let mut stale = app_payload("guestbook");
    stale["status"]["sync"]["status"] = json!("OutOfSync");
    let (first_reply, first) = gated(ok_response(&stale));
    let (second_reply, second) = gated(ok_response(&app_payload("guestbook")));
    let transport = Arc::new(GatedTransport {
        replies: Mutex::new(VecDeque::from(vec![first_reply, second_reply])),
    });

    let session = ApplicationStatusSession::start(
        &annotations(&[(ANNOTATION_APP_NAME, "guestbook")]),
        client_with(transport),
        Arc::new(RecordingSink::default()),
    )
    .unwrap();

    first.arrived.await.unwrap();
    session.retry();
    assert!(session.state().is_loading());

    second.arrived.await.unwrap();
    second.open.send(()).unwrap();
    let settled = session.settled().await;
    assert_eq!(settled.value().unwrap().items[0].sync_status, "Synced");

    first.open.send(()).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let state = session.state();
    assert_eq!(state.value().unwrap().items, vec![guestbook_status()]);
}

#[tokio::test]
async fn retry_after_failure_fetches_again() {
    let transport = Arc::new(FixtureTransport::default());
    let url = format!("{APPLICATIONS_URL}/guestbook");
    transport.fail(
        &url,
        StatusError::Transport {
            url: url.clone(),
            message: "connection refused".to_string(),
        },
    );
    let sink = Arc::new(RecordingSink::default());

    let session = ApplicationStatusSession::start(
        &annotations(&[(ANNOTATION_APP_NAME, "guestbook")]),
        client_with(transport.clone()),
        sink.clone(),
    )
    .unwrap();
    let settled = session.settled().await;
    assert_eq!(settled.error().map(StatusError::kind), Some(ErrorKind::Transport));

    transport.respond(&url, 200, "OK", &app_payload("guestbook"));
    session.retry();
    let settled = session.settled().await;
    assert_eq!(settled.value().unwrap().len(), 1);
    assert_eq!(transport.requests().len(), 2);
    assert_eq!(sink.posted.lock().unwrap().as_slice(), &[ErrorKind::Transport]);
}

#[tokio::test]
async fn unresolvable_identity_never_reaches_the_network() {
    let transport = Arc::new(FixtureTransport::default());
    let result = ApplicationStatusSession::start(
        &annotations(&[
            (ANNOTATION_APP_NAME, "guestbook"),
            (ANNOTATION_APP_SELECTOR, "env=prod"),
        ]),
        client_with(transport.clone()),
        Arc::new(RecordingSink::default()),
    );
    let err = result.err().expect("ambiguous identity must be rejected");
    assert_eq!(err.kind(), ErrorKind::Configuration);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn repeated_lookups_are_equal() {
    let transport = Arc::new(FixtureTransport::default());
    transport.respond(
        &format!("{APPLICATIONS_URL}/guestbook"),
        200,
        "OK",
        &app_payload("guestbook"),
    );
    let client = client_with(transport);

    let first = client.get_app_details("guestbook").await.unwrap();
    let second = client.get_app_details("guestbook").await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn selector_round_trips_and_empty_project_is_omitted() {
    let client = client_with(Arc::new(FixtureTransport::default()));
    let url = client.list_url(Some("env=prod"), Some("")).await.unwrap();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(pairs, vec![("selector".to_string(), "env=prod".to_string())]);
    assert!(!url.as_str().contains("project"));

    let bare = client.list_url(None, None).await.unwrap();
    assert_eq!(bare.as_str(), APPLICATIONS_URL);
}

#[tokio::test]
async fn base_url_is_discovered_on_every_call() {
    let transport = Arc::new(FixtureTransport::default());
    transport.respond(
        &format!("{APPLICATIONS_URL}/guestbook"),
        200,
        "OK",
        &app_payload("guestbook"),
    );
    let discovery = Arc::new(CountingDiscovery {
        inner: UrlPatternDiscovery::compile("http://backstage.test/api/{{pluginId}}"),
        calls: AtomicUsize::new(0),
    });
    let client = ArgoCdClient::new(discovery.clone(), transport, None);

    client.get_app_details("guestbook").await.unwrap();
    client.get_app_details("guestbook").await.unwrap();
    assert_eq!(discovery.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn custom_proxy_path_is_used() {
    let transport = Arc::new(FixtureTransport::default());
    let client = ArgoCdClient::new(
        discovery(),
        transport.clone(),
        Some("/argocd-staging/api".to_string()),
    );
    let _ = client.get_app_details("guestbook").await;
    assert_eq!(
        transport.requests(),
        vec!["http://backstage.test/api/proxy/argocd-staging/api/applications/guestbook".to_string()]
    );
}

#[tokio::test]
async fn non_json_body_is_a_validation_error() {
    let transport = Arc::new(FixtureTransport::default());
    transport.routes.lock().unwrap().insert(
        format!("{APPLICATIONS_URL}/guestbook"),
        Ok(HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            body: b"<html>login</html>".to_vec(),
        }),
    );
    let err = client_with(transport)
        .get_app_details("guestbook")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("$: expected JSON document"));
}

#[tokio::test]
async fn empty_project_list_decodes_from_null_items() {
    let transport = Arc::new(FixtureTransport::default());
    transport.respond(
        &format!("{APPLICATIONS_URL}?project=payments"),
        200,
        "OK",
        &json!({ "metadata": {}, "items": null }),
    );
    let details = client_with(transport)
        .fetch(&ApplicationQuery::Filter {
            selector: None,
            project: Some("payments".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(details, AppDetails::List(ApplicationStatusList::default()));
    assert!(ApplicationStatusList::from(details).is_empty());
}

#[tokio::test]
async fn history_is_decoded_in_remote_order() {
    let mut payload = app_payload("guestbook");
    payload["status"]["history"] = json!([
        {
            "id": 0,
            "revision": "6bed858de32a0e876ec49dad1a2e3c5840d3fb07",
            "deployedAt": "2020-11-18T16:47:04Z",
            "deployStartedAt": "2020-11-18T16:47:02Z"
        },
        {
            "id": 1,
            "revision": "53e28ff20cc530b9ada2173fbbd64d48338583ba",
            "deployedAt": "2020-11-20T19:28:06Z"
        }
    ]);
    let transport = Arc::new(FixtureTransport::default());
    transport.respond(&format!("{APPLICATIONS_URL}/guestbook"), 200, "OK", &payload);

    let status = client_with(transport)
        .get_app_details("guestbook")
        .await
        .unwrap();
    let ids: Vec<i64> = status.history.iter().map(|event| event.id).collect();
    assert_eq!(ids, vec![0, 1]);
    assert!(status.history[0].deploy_started_at.is_some());
    assert!(status.history[1].deploy_started_at.is_none());

    let rows = ApplicationStatusList::from(status).history_rows();
    assert_eq!(rows[0].duration(), Some(chrono::Duration::seconds(2)));
    assert_eq!(rows[1].app, "guestbook");
}
