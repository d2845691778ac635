use serde_json::json;
use wallabag_sync::app::{AppContext, SyncError};
use wallabag_sync::cli::commands::{exit_status, EXIT_OK, EXIT_PARTIAL};
use wallabag_sync::config::{Config, WallabagConfig};
use wallabag_sync::domain::Fingerprint;
use wallabag_sync::sync::{self, RecordingSink, SyncEvent, SyncOptions};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> Config {
    Config {
        feed_url: format!("{}/feed.json", server.uri()),
        wallabag: WallabagConfig {
            base_url: server.uri(),
            client_id: "client_id".into(),
            client_secret: "client_secret".into(),
            username: "reader".into(),
            password: "hunter2".into(),
        },
        ..Config::default()
    }
}

async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "token-123",
            "expires_in": 3600,
            "token_type": "bearer"
        })))
        .mount(server)
        .await;
}

async fn mount_feed(server: &MockServer, urls: &[&str]) {
    let items: Vec<_> = urls.iter().map(|url| json!({"id": url, "url": url})).collect();
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "version": "https://jsonfeed.org/version/1.1",
            "title": "Reading list",
            "items": items
        })))
        .mount(server)
        .await;
}

async fn mount_unread(server: &MockServer, entries: &[(i64, &str)]) {
    let items: Vec<_> = entries
        .iter()
        .map(|(id, url)| {
            json!({
                "id": id,
                "url": url,
                "given_url": url,
                "hashed_given_url": Fingerprint::of(url).to_string(),
                "is_archived": 0
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/api/entries.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "page": 1,
            "limit": 500,
            "pages": 1,
            "total": items.len(),
            "_embedded": { "items": items }
        })))
        .mount(server)
        .await;
}

async fn mount_mutations(server: &MockServer, adds: u64, archives: u64) {
    Mock::given(method("POST"))
        .and(path("/api/entries.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1000})))
        .expect(adds)
        .mount(server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1000})))
        .expect(archives)
        .mount(server)
        .await;
}

async fn run(server: &MockServer, sink: &RecordingSink) -> wallabag_sync::app::Result<sync::SyncReport> {
    let ctx = AppContext::new(config(server)).unwrap();
    sync::run(&ctx, &SyncOptions::default(), sink).await
}

#[tokio::test]
async fn new_feed_article_is_added() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_feed(&server, &["https://a.example/1"]).await;
    mount_unread(&server, &[]).await;
    mount_mutations(&server, 1, 0).await;

    let report = run(&server, &RecordingSink::new()).await.unwrap();
    assert_eq!(report.plan.to_add, vec!["https://a.example/1".to_string()]);
    assert!(report.plan.to_archive.is_empty());
    assert_eq!(report.added, vec!["https://a.example/1".to_string()]);
    assert_eq!(exit_status(&report), EXIT_OK);
}

#[tokio::test]
async fn entry_gone_from_feed_is_archived() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_feed(&server, &[]).await;
    mount_unread(&server, &[(7, "https://a.example/1")]).await;
    Mock::given(method("PATCH"))
        .and(path("/api/entries/7.json"))
        .and(body_json(json!({"archive": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let report = run(&server, &RecordingSink::new()).await.unwrap();
    assert!(report.plan.to_add.is_empty());
    assert_eq!(report.plan.archive_ids(), vec![7]);
    assert_eq!(report.archived, vec![7]);
}

#[tokio::test]
async fn matching_entry_needs_no_calls() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_feed(&server, &["https://a.example/1"]).await;
    mount_unread(&server, &[(7, "https://a.example/1")]).await;
    mount_mutations(&server, 0, 0).await;

    let report = run(&server, &RecordingSink::new()).await.unwrap();
    assert!(report.plan.is_empty());
    assert_eq!(report.summary(), "Sync complete: 0 added, 0 archived, 0 failed");
}

#[tokio::test]
async fn unavailable_feed_aborts_before_any_mutation() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/feed.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_unread(&server, &[(7, "https://a.example/1")]).await;
    mount_mutations(&server, 0, 0).await;

    let err = run(&server, &RecordingSink::new()).await.unwrap_err();
    assert!(matches!(err, SyncError::FeedUnavailable(_)));
    assert!(err.to_string().contains("HTTP 503"));
}

#[tokio::test]
async fn failed_listing_aborts_before_any_mutation() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_feed(&server, &["https://a.example/new"]).await;
    Mock::given(method("GET"))
        .and(path("/api/entries.json"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database is down"))
        .mount(&server)
        .await;
    mount_mutations(&server, 0, 0).await;

    let sink = RecordingSink::new();
    let err = run(&server, &sink).await.unwrap_err();
    assert!(matches!(err, SyncError::EntryFetch { status: Some(500), .. }));
    assert!(!sink
        .take()
        .iter()
        .any(|event| matches!(event, SyncEvent::Planned(_))));
}

#[tokio::test]
async fn one_failed_add_does_not_stop_the_others() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_feed(
        &server,
        &["https://a.example/1", "https://a.example/2", "https://a.example/3"],
    )
    .await;
    mount_unread(&server, &[]).await;
    Mock::given(method("POST"))
        .and(path("/api/entries.json"))
        .and(body_json(json!({"url": "https://a.example/2"})))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"message": "Invalid URL"})))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_mutations(&server, 2, 0).await;

    let sink = RecordingSink::new();
    let report = run(&server, &sink).await.unwrap();

    assert_eq!(
        report.added,
        vec!["https://a.example/1".to_string(), "https://a.example/3".to_string()]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].target, "https://a.example/2");
    assert_eq!(report.summary(), "Sync complete: 2 added, 0 archived, 1 failed");
    assert_eq!(exit_status(&report), EXIT_PARTIAL);

    let failed: Vec<_> = sink
        .take()
        .into_iter()
        .filter(|event| matches!(event, SyncEvent::AddFailed { .. }))
        .collect();
    assert_eq!(failed.len(), 1);
}

#[tokio::test]
async fn rejected_credentials_abort_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/token"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_client",
            "error_description": "The client credentials are invalid"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = run(&server, &RecordingSink::new()).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "Authentication failed (HTTP 401): The client credentials are invalid"
    );
}

#[tokio::test]
async fn dry_run_makes_no_mutations() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    mount_feed(&server, &["https://a.example/new"]).await;
    mount_unread(&server, &[(7, "https://a.example/old")]).await;
    mount_mutations(&server, 0, 0).await;

    let ctx = AppContext::new(config(&server)).unwrap();
    let options = SyncOptions {
        dry_run: true,
        ..SyncOptions::default()
    };
    let report = sync::run(&ctx, &options, &RecordingSink::new()).await.unwrap();

    assert_eq!(report.plan.to_add.len(), 1);
    assert_eq!(report.plan.archive_ids(), vec![7]);
    assert!(report.dry_run);
}

#[test]
fn empty_configuration_fails_before_networking() {
    let err = match AppContext::new(Config::default()) {
        Ok(_) => panic!("empty config must be rejected"),
        Err(e) => e,
    };
    assert!(matches!(err, SyncError::Config(_)));
}
