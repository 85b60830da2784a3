//! End-to-end flows against a mock server: anonymous browsing, login,
//! debounced search, token refresh mid-session, and admin mutations.

use std::sync::Arc;
use std::time::Duration;

use jobboard_client::{
    ApiError, ClientConfig, FeedSnapshot, JobBoardClient, MemoryCredentialStore,
};
use jobboard_types::{Job, JobCreate, JobStatus};

fn job_value(id: i64, status: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": format!("Job {id}"),
        "company": "PropelPeople",
        "description": "Build the board.",
        "application_url": "https://example.com/apply",
        "status": status,
    })
}

fn page_body(ids: std::ops::Range<i64>, status: &str) -> String {
    let jobs: Vec<serde_json::Value> = ids.map(|id| job_value(id, status)).collect();
    serde_json::Value::Array(jobs).to_string()
}

fn client(server: &mockito::Server) -> JobBoardClient {
    let config = ClientConfig {
        debounce: Duration::from_millis(50),
        ..ClientConfig::with_base_url(server.url())
    };
    JobBoardClient::with_store(config, Box::new(MemoryCredentialStore::default())).unwrap()
}

/// Poll the feed until `pred` holds or two seconds pass.
async fn wait_for(client: &JobBoardClient, pred: impl Fn(&FeedSnapshot) -> bool) -> FeedSnapshot {
    for _ in 0..200 {
        let snap = client.feed.snapshot().await;
        if pred(&snap) {
            return snap;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("feed never reached the expected state");
}

#[tokio::test]
async fn anonymous_visitor_browses_and_pages() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/jobs/")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("skip".into(), "0".into()),
            mockito::Matcher::UrlEncoded("status".into(), "active".into()),
        ]))
        .with_status(200)
        .with_body(page_body(0..20, "active"))
        .create_async()
        .await;
    server
        .mock("GET", "/jobs/")
        .match_query(mockito::Matcher::UrlEncoded("skip".into(), "20".into()))
        .with_status(200)
        .with_body(page_body(20..28, "active"))
        .create_async()
        .await;

    let client = client(&server);
    client.start().await.unwrap();

    let snap = client.feed.snapshot().await;
    assert_eq!(snap.jobs.len(), 20);
    assert!(snap.has_more);

    // Scroll continuation.
    assert!(client.feed.load_more().await.unwrap());
    let snap = client.feed.snapshot().await;
    assert_eq!(snap.jobs.len(), 28);
    assert!(!snap.has_more);
}

#[tokio::test]
async fn debounced_search_reloads_with_final_value() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/jobs/")
        .match_query(mockito::Matcher::UrlEncoded("skip".into(), "0".into()))
        .with_status(200)
        .with_body(page_body(0..3, "active"))
        .create_async()
        .await;
    // Only the settled search value may reach the server.
    let settled = server
        .mock("GET", "/jobs/")
        .match_query(mockito::Matcher::UrlEncoded("search".into(), "engineer".into()))
        .with_status(200)
        .with_body(page_body(10..12, "active"))
        .expect(1)
        .create_async()
        .await;
    let partial = server
        .mock("GET", "/jobs/")
        .match_query(mockito::Matcher::UrlEncoded("search".into(), "eng".into()))
        .expect(0)
        .create_async()
        .await;

    let client = client(&server);
    client.start().await.unwrap();

    client.filters.set_search("e");
    client.filters.set_search("eng");
    client.filters.set_search("engineer");

    let snap = wait_for(&client, |snap| snap.jobs.len() == 2).await;
    assert_eq!(snap.jobs[0].id, 10);
    settled.assert_async().await;
    partial.assert_async().await;
}

#[tokio::test]
async fn admin_logs_in_switches_tabs_and_mutates() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/users/login")
        .with_status(200)
        .with_body(r#"{"access_token": "jwt-admin", "token_type": "bearer", "is_admin": true}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/jobs/")
        .match_query(mockito::Matcher::UrlEncoded("status".into(), "active".into()))
        .with_status(200)
        .with_body(page_body(0..5, "active"))
        .create_async()
        .await;
    let drafts = server
        .mock("GET", "/jobs/")
        .match_query(mockito::Matcher::UrlEncoded("status".into(), "draft".into()))
        .match_header("authorization", "Bearer jwt-admin")
        .with_status(200)
        .with_body(page_body(30..32, "draft"))
        .expect(1)
        .create_async()
        .await;
    server
        .mock("POST", "/jobs")
        .with_status(200)
        .with_body(job_value(50, "draft").to_string())
        .create_async()
        .await;
    server
        .mock("PATCH", "/jobs/50/status")
        .match_query(mockito::Matcher::UrlEncoded("status".into(), "active".into()))
        .with_status(200)
        .with_body(job_value(50, "active").to_string())
        .create_async()
        .await;

    let client = client(&server);
    client.start().await.unwrap();

    let session = client.login("admin@example.com", "hunter22").await.unwrap();
    assert!(session.user.is_admin);
    assert!(client.session.is_admin());

    // Tab switch reloads immediately with the draft view.
    client.filters.set_admin_tab(JobStatus::Draft);
    let snap = wait_for(&client, |snap| snap.jobs.len() == 2).await;
    assert!(snap.jobs.iter().all(|j| j.status == JobStatus::Draft));
    drafts.assert_async().await;

    // Create a draft posting; it lands at the top of the draft tab.
    let created = client
        .jobs
        .create(&JobCreate {
            title: "New Draft".into(),
            company: "PropelPeople".into(),
            description: "d".into(),
            application_url: "https://example.com/apply".into(),
            status: Some(JobStatus::Draft),
            ..JobCreate::default()
        })
        .await
        .unwrap();
    client.feed.apply_created(created.clone()).await;
    let snap = client.feed.snapshot().await;
    assert_eq!(snap.jobs[0].id, 50);

    // Publish it; the draft view no longer shows it.
    let published: Job = client.jobs.set_status(&created, JobStatus::Active).await.unwrap();
    client.feed.apply_updated(published).await;
    let snap = client.feed.snapshot().await;
    assert!(snap.jobs.iter().all(|j| j.id != 50));

    client.logout();
    assert!(!client.session.is_authenticated());
}

#[tokio::test]
async fn expired_token_is_refreshed_without_the_caller_noticing() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/users/login")
        .with_status(200)
        .with_body(r#"{"access_token": "jwt-old", "token_type": "bearer", "is_admin": true}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/jobs/7")
        .match_header("authorization", "Bearer jwt-old")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/users/refresh")
        .match_header("authorization", "Bearer jwt-old")
        .with_status(200)
        .with_body(r#"{"access_token": "jwt-new"}"#)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/jobs/7")
        .match_header("authorization", "Bearer jwt-new")
        .with_status(200)
        .with_body(job_value(7, "active").to_string())
        .expect(1)
        .create_async()
        .await;

    let client = client(&server);
    client.login("admin@example.com", "hunter22").await.unwrap();

    let job = client.jobs.get(7).await.unwrap();
    assert_eq!(job.id, 7);
    assert_eq!(client.session.access_token().as_deref(), Some("jwt-new"));
    refresh.assert_async().await;
}

#[tokio::test]
async fn failed_refresh_ends_the_session() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/users/login")
        .with_status(200)
        .with_body(r#"{"access_token": "jwt-dead", "token_type": "bearer", "is_admin": false}"#)
        .create_async()
        .await;
    server.mock("GET", "/jobs/7").with_status(401).create_async().await;
    server.mock("POST", "/users/refresh").with_status(401).create_async().await;

    let client = client(&server);
    client.login("user@example.com", "hunter22").await.unwrap();

    let err = client.jobs.get(7).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized { .. }));
    assert!(!client.session.is_authenticated());
}

#[tokio::test]
async fn register_surfaces_server_validation() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/users/register")
        .with_status(400)
        .with_body(r#"{"detail": "Email already registered"}"#)
        .create_async()
        .await;

    let client = client(&server);
    let err = client
        .register(&jobboard_types::RegistrationRequest {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            password: "hunter22".into(),
            confirm_password: "hunter22".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Email already registered");
}

#[tokio::test]
async fn stale_search_response_cannot_clobber_a_newer_one() {
    // Two rapid search settles: the second reset bumps the generation, so
    // even when the first response arrives late it must be discarded. The
    // mock server answers in order, so the late response is simulated by
    // resetting twice before any poll of the final state.
    let mut server = mockito::Server::new_async().await;
    // Catch-all first: later, more specific mocks take precedence.
    server
        .mock("GET", "/jobs/")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(page_body(0..3, "active"))
        .create_async()
        .await;
    server
        .mock("GET", "/jobs/")
        .match_query(mockito::Matcher::UrlEncoded("search".into(), "first".into()))
        .with_status(200)
        .with_body(page_body(0..1, "active"))
        .create_async()
        .await;
    server
        .mock("GET", "/jobs/")
        .match_query(mockito::Matcher::UrlEncoded("search".into(), "second".into()))
        .with_status(200)
        .with_body(page_body(5..7, "active"))
        .create_async()
        .await;

    let client = client(&server);
    client.start().await.unwrap();

    client.filters.set_search("first");
    tokio::time::sleep(Duration::from_millis(70)).await;
    client.filters.set_search("second");

    let snap = wait_for(&client, |snap| snap.jobs.len() == 2 && snap.jobs[0].id == 5).await;
    assert_eq!(snap.jobs.iter().map(|j| j.id).collect::<Vec<_>>(), vec![5, 6]);

    // The settled state stays the second search's rows.
    tokio::time::sleep(Duration::from_millis(150)).await;
    let snap = client.feed.snapshot().await;
    assert_eq!(snap.jobs.iter().map(|j| j.id).collect::<Vec<_>>(), vec![5, 6]);
}
