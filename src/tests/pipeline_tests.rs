use super::fake_driver::{FakeConnector, FakeDriver, article};
use crate::config::{AppConfig, EnvironmentSpec, GridConfig, GridProvider};
use crate::driver::SessionStatus;
use crate::error::{ExtractionError, PipelineError};
use crate::pipeline::{ImageStatus, LOCAL_LABEL, Pipeline, run_all, run_session};
use serde_json::{Value, json};
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Echoes the request back as an "English" translation, failing on titles
/// that start with "FAIL"
struct EchoTranslation;

impl Respond for EchoTranslation {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap();
        let title = body["json"]["title"].as_str().unwrap_or_default();
        let content = body["json"]["content"].as_str().unwrap_or_default();
        if title.starts_with("FAIL") {
            return ResponseTemplate::new(500).set_body_string("upstream error");
        }
        ResponseTemplate::new(200).set_body_json(json!({
            "trans": {"title": format!("EN {}", title), "content": content.to_uppercase()}
        }))
    }
}

async fn server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate"))
        .respond_with(EchoTranslation)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/ok.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/img/gone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

fn config(server: &MockServer, out: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.translator.endpoint = format!("{}/translate", server.uri());
    config.translator.api_key = Some("test-key".to_string());
    config.assets.output_dir = out.to_string_lossy().into_owned();
    config
}

fn env(browser: &str, os: &str) -> EnvironmentSpec {
    EnvironmentSpec {
        browser_name: browser.to_string(),
        browser_version: None,
        os: Some(os.to_string()),
        os_version: None,
        device_name: None,
        real_mobile: false,
    }
}

fn grid(environments: Vec<EnvironmentSpec>) -> GridConfig {
    GridConfig {
        provider: GridProvider::BrowserStack,
        hub_url: None,
        username: Some("u".to_string()),
        access_key: Some("k".to_string()),
        build_name: None,
        project_name: None,
        report_status: true,
        environments,
    }
}

#[tokio::test]
async fn test_full_run_order_and_aggregation() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let img = format!("{}/img/ok.jpg?w=800", server.uri());
    let driver = FakeDriver::new(vec![
        article(Some("la paz y la guerra"), Some("https://elpais.com/1"), Some("uno"), Some(&img)),
        article(Some("la ley"), Some("https://elpais.com/2"), None, None),
        article(Some("Sin enlace"), None, None, None),
        article(Some("la calle"), Some("https://elpais.com/3"), Some("tres"), None),
    ]);

    let pipeline = Pipeline::new(Arc::new(config(&server, tmp.path()))).unwrap();
    let report = pipeline.process(&driver, LOCAL_LABEL).await.unwrap();

    assert_eq!(report.articles.len(), 3);
    assert_eq!(
        report.translated_titles,
        ["EN la paz y la guerra", "EN la ley", "EN la calle"]
    );
    assert_eq!(
        report.articles[0].translation.as_ref().unwrap().content_en,
        "UNO"
    );
    assert_eq!(
        report.articles[0].image,
        ImageStatus::Saved(tmp.path().join("ok.jpg"))
    );
    assert_eq!(report.articles[1].image, ImageStatus::Missing);
    assert_eq!(report.images_saved(), 1);

    // "en" x3 and "la" x4 across titles
    assert_eq!(report.frequencies.len(), 2);
    assert_eq!(report.frequencies.get("en"), Some(3));
    assert_eq!(report.frequencies.get("la"), Some(4));
    assert!(report.passed());
}

#[tokio::test]
async fn test_failed_translation_dropped_from_aggregation() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let driver = FakeDriver::new(vec![
        article(Some("FAIL word word word"), Some("https://elpais.com/1"), None, None),
        article(Some("otra"), Some("https://elpais.com/2"), None, None),
    ]);

    let pipeline = Pipeline::new(Arc::new(config(&server, tmp.path()))).unwrap();
    let report = pipeline.process(&driver, LOCAL_LABEL).await.unwrap();

    assert_eq!(report.articles.len(), 2);
    assert!(report.articles[0].translation.is_none());
    assert!(report.articles[1].translation.is_some());
    assert_eq!(report.translated_titles, ["EN otra"]);
    assert_eq!(report.frequencies.get("word"), None);
}

#[tokio::test]
async fn test_image_failure_does_not_stop_run() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let gone = format!("{}/img/gone.jpg", server.uri());
    let ok = format!("{}/img/ok.jpg", server.uri());
    let driver = FakeDriver::new(vec![
        article(Some("uno"), Some("https://elpais.com/1"), None, Some(&gone)),
        article(Some("dos"), Some("https://elpais.com/2"), None, Some(&ok)),
    ]);

    let pipeline = Pipeline::new(Arc::new(config(&server, tmp.path()))).unwrap();
    let report = pipeline.process(&driver, LOCAL_LABEL).await.unwrap();

    assert!(matches!(report.articles[0].image, ImageStatus::Failed(_)));
    assert_eq!(
        report.articles[1].image,
        ImageStatus::Saved(tmp.path().join("ok.jpg"))
    );
    assert_eq!(report.translated_titles.len(), 2);
}

#[tokio::test]
async fn test_directory_failure_disables_images_for_run() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let blocker = tmp.path().join("covers");
    std::fs::write(&blocker, b"file").unwrap();
    let ok = format!("{}/img/ok.jpg", server.uri());
    let driver = FakeDriver::new(vec![
        article(Some("uno"), Some("https://elpais.com/1"), None, Some(&ok)),
        article(Some("dos"), Some("https://elpais.com/2"), None, Some(&ok)),
    ]);

    let pipeline = Pipeline::new(Arc::new(config(&server, &blocker))).unwrap();
    let report = pipeline.process(&driver, LOCAL_LABEL).await.unwrap();

    assert!(matches!(report.articles[0].image, ImageStatus::Failed(_)));
    assert_eq!(report.articles[1].image, ImageStatus::Disabled);
    assert_eq!(report.translated_titles, ["EN uno", "EN dos"]);
}

#[tokio::test]
async fn test_no_translations_still_aggregates_empty() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let driver = FakeDriver::new(vec![article(
        Some("FAIL uno"),
        Some("https://elpais.com/1"),
        None,
        None,
    )]);

    let pipeline = Pipeline::new(Arc::new(config(&server, tmp.path()))).unwrap();
    let report = pipeline.process(&driver, LOCAL_LABEL).await.unwrap();

    assert!(report.frequencies.is_empty());
    assert!(!report.passed());
    assert_eq!(report.status(), SessionStatus::Failed);
}

#[tokio::test]
async fn test_session_closed_after_extraction_timeout() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let connector = FakeConnector::default();
    let config = Arc::new(config(&server, tmp.path()));

    let run = run_session(&connector, config, None).await;

    assert_eq!(run.label, LOCAL_LABEL);
    assert!(matches!(
        run.outcome,
        Err(PipelineError::Extraction(ExtractionError::Timeout { .. }))
    ));
    let state = connector.session(LOCAL_LABEL).unwrap();
    assert!(state.is_closed());
    // Local sessions have no grid to report to
    assert!(state.statuses.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_environments_run_independently() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let chrome = env("chrome", "Windows");
    let safari = env("safari", "OS X");
    let firefox = env("firefox", "Linux");

    let mut config = config(&server, tmp.path());
    config.grid = Some(grid(vec![chrome.clone(), safari.clone(), firefox.clone()]));

    let connector = Arc::new(
        FakeConnector::default()
            .with_page(
                &chrome.label(),
                vec![
                    article(Some("rojo rojo rojo"), Some("https://elpais.com/r"), None, None),
                ],
            )
            .with_page(
                &safari.label(),
                vec![
                    article(Some("azul"), Some("https://elpais.com/a1"), None, None),
                    article(Some("azul"), Some("https://elpais.com/a2"), None, None),
                    article(Some("azul"), Some("https://elpais.com/a3"), None, None),
                ],
            )
            .unreachable(&firefox.label()),
    );

    let runs = run_all(Arc::clone(&connector), Arc::new(config)).await;
    assert_eq!(runs.len(), 3);

    assert_eq!(runs[0].label, chrome.label());
    let chrome_report = runs[0].outcome.as_ref().unwrap();
    assert_eq!(chrome_report.translated_titles, ["EN rojo rojo rojo"]);
    assert_eq!(chrome_report.frequencies.get("rojo"), Some(3));
    assert_eq!(chrome_report.frequencies.get("azul"), None);

    let safari_report = runs[1].outcome.as_ref().unwrap();
    assert_eq!(safari_report.translated_titles.len(), 3);
    assert_eq!(safari_report.frequencies.get("azul"), Some(3));
    assert_eq!(safari_report.frequencies.get("rojo"), None);

    assert!(matches!(runs[2].outcome, Err(PipelineError::Session(_))));

    for label in [chrome.label(), safari.label()] {
        let state = connector.session(&label).unwrap();
        assert!(state.is_closed());
        let statuses = state.statuses.lock().unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].0, SessionStatus::Passed);
    }
    assert!(connector.session(&firefox.label()).is_none());
}

#[tokio::test]
async fn test_grid_failure_reported() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let edge = env("edge", "Windows");
    let mut config = config(&server, tmp.path());
    config.grid = Some(grid(vec![edge.clone()]));

    // No page registered for this environment: no article blocks appear
    let connector = Arc::new(FakeConnector::default());
    let runs = run_all(Arc::clone(&connector), Arc::new(config)).await;

    assert!(runs[0].outcome.is_err());
    let state = connector.session(&edge.label()).unwrap();
    let statuses = state.statuses.lock().unwrap();
    assert_eq!(statuses[0].0, SessionStatus::Failed);
    assert!(statuses[0].1.contains("no article blocks"));
    assert!(state.is_closed());
}

#[tokio::test]
async fn test_grid_without_environments_runs_locally() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let mut config = config(&server, tmp.path());
    config.grid = Some(grid(vec![]));

    let connector = Arc::new(FakeConnector::default().with_page(
        LOCAL_LABEL,
        vec![article(Some("uno"), Some("https://elpais.com/1"), None, None)],
    ));
    let runs = run_all(connector, Arc::new(config)).await;

    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].label, LOCAL_LABEL);
    assert!(runs[0].outcome.as_ref().unwrap().passed());
}

#[tokio::test]
async fn test_digest_run_with_connector() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let connector = Arc::new(FakeConnector::default().with_page(
        LOCAL_LABEL,
        vec![
            article(Some("uno"), Some("https://elpais.com/1"), None, None),
            article(Some("dos"), Some("https://elpais.com/2"), None, None),
        ],
    ));

    let runs = crate::Digest::new(config(&server, tmp.path()))
        .with_max_articles(1)
        .run_with(connector)
        .await
        .unwrap();

    let report = runs[0].outcome.as_ref().unwrap();
    assert_eq!(report.translated_titles, ["EN uno"]);
}

#[tokio::test]
async fn test_digest_rejects_invalid_config() {
    let server = server().await;
    let tmp = tempfile::tempdir().unwrap();
    let connector = Arc::new(FakeConnector::default());

    let err = crate::Digest::new(config(&server, tmp.path()))
        .with_max_articles(0)
        .run_with(Arc::clone(&connector))
        .await
        .unwrap_err();

    assert!(matches!(err, crate::ConfigError::ZeroArticles));
    assert!(connector.sessions.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_environments_keep_images_apart() {
    let server = server().await;
    Mock::given(method("GET"))
        .and(path("/r/cover.jpg"))
        .and(wiremock::matchers::query_param("width", "1200"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'A'; 64 * 1024]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/r/cover.jpg"))
        .and(wiremock::matchers::query_param("width", "414"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'B'; 16 * 1024]))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let desktop = env("chrome", "Windows");
    let phone = env("safari", "iOS");
    let mut config = config(&server, tmp.path());
    config.grid = Some(grid(vec![desktop.clone(), phone.clone()]));

    let wide = format!("{}/r/cover.jpg?width=1200", server.uri());
    let narrow = format!("{}/r/cover.jpg?width=414", server.uri());
    let connector = Arc::new(
        FakeConnector::default()
            .with_page(
                &desktop.label(),
                vec![article(Some("uno"), Some("https://elpais.com/1"), None, Some(&wide))],
            )
            .with_page(
                &phone.label(),
                vec![article(Some("uno"), Some("https://elpais.com/1"), None, Some(&narrow))],
            ),
    );

    let runs = run_all(connector, Arc::new(config)).await;

    let desktop_path = tmp.path().join("chrome_on_Windows").join("cover.jpg");
    let phone_path = tmp.path().join("safari_on_iOS").join("cover.jpg");
    assert_eq!(
        runs[0].outcome.as_ref().unwrap().articles[0].image,
        ImageStatus::Saved(desktop_path.clone())
    );
    assert_eq!(
        runs[1].outcome.as_ref().unwrap().articles[0].image,
        ImageStatus::Saved(phone_path.clone())
    );
    assert_eq!(std::fs::read(&desktop_path).unwrap(), vec![b'A'; 64 * 1024]);
    assert_eq!(std::fs::read(&phone_path).unwrap(), vec![b'B'; 16 * 1024]);
    assert!(!tmp.path().join("cover.jpg").exists());
}

#[tokio::test]
async fn test_empty_translations_do_not_pass() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "quota"})))
        .mount(&server)
        .await;
    let tmp = tempfile::tempdir().unwrap();
    let edge = env("edge", "Windows");
    let mut config = config(&server, tmp.path());
    config.grid = Some(grid(vec![edge.clone()]));

    let connector = Arc::new(FakeConnector::default().with_page(
        &edge.label(),
        vec![article(Some("uno"), Some("https://elpais.com/1"), None, None)],
    ));
    let runs = run_all(Arc::clone(&connector), Arc::new(config)).await;

    let report = runs[0].outcome.as_ref().unwrap();
    assert_eq!(report.translated_titles, [""]);
    assert!(!report.passed());
    let state = connector.session(&edge.label()).unwrap();
    assert_eq!(state.statuses.lock().unwrap()[0].0, SessionStatus::Failed);
}
