//! End-to-end runs against a mock API: the full resolution pipeline plus
//! per-group dispatch, for both job modes.

use std::time::Duration;

use httpmock::MockServer;
use serde_json::json;

use attach_worker::client::ApiClient;
use attach_worker::error::{ApiError, RunError};
use attach_worker::pipeline;

fn test_client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.base_url(), "user", "pass", Duration::from_secs(5))
        .expect("failed to build client")
}

/// One regional game in zip 10001 with two addresses: a1 serves grp1,
/// a2 serves no group. grp1 has two members on a single page.
fn mock_small_region(server: &MockServer) {
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/game");
        then.status(200).json_body(json!({"_embedded": {"game": [
            {"game_id": "g1", "meta": {"zipcodes": ["10001"]}},
            {"game_id": "g2", "meta": {"zipcodes": []}},
        ]}}));
    });
    server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/address")
            .query_param("postal_code", "10001")
            .query_param("filter", "group");
        then.status(200).json_body(json!({"_embedded": {"address": [
            {"address_id": "a1"},
            {"address_id": "a2"},
        ]}}));
    });
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/address/a1/group");
        then.status(200)
            .json_body(json!({"_embedded": {"group": [{"group_id": "grp1"}]}}));
    });
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/address/a2/group");
        then.status(200).json_body(json!({"_embedded": {"group": []}}));
    });
    server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/group/grp1/users")
            .query_param("page", "1");
        then.status(200).json_body(json!({
            "_embedded": {"items": [{"user_id": "u1"}, {"user_id": "u2"}]}
        }));
    });
}

#[tokio::test]
async fn test_cron_attaches_the_regional_game_to_every_member() {
    let server = MockServer::start();
    mock_small_region(&server);
    let posts = server.mock(|when, then| {
        when.method(httpmock::Method::POST).path_contains("/game/g1");
        then.status(201);
    });

    let client = test_client(&server);
    let summary = pipeline::run_cron(&client).await.expect("cron run failed");

    // Only a1's placement carries a group; a2's empty group list yields
    // no walk. The excluded game g2 must never be attached.
    assert_eq!(summary.groups, 1);
    assert_eq!(summary.pages, 1);
    assert_eq!(summary.users, 2);
    assert_eq!(summary.attached, 2);
    assert_eq!(summary.failed, 0);
    assert_eq!(posts.hits(), 2);
}

#[tokio::test]
async fn test_group_job_only_touches_the_named_group() {
    let server = MockServer::start();
    mock_small_region(&server);
    let posts = server.mock(|when, then| {
        when.method(httpmock::Method::POST).path_contains("/user/");
        then.status(201);
    });

    let client = test_client(&server);
    let summary = pipeline::run_group(&client, "grp1")
        .await
        .expect("group run failed");

    assert_eq!(summary.groups, 1);
    assert_eq!(summary.attached, 2);
    assert_eq!(posts.hits(), 2);
}

#[tokio::test]
async fn test_group_job_for_an_unrouted_group_dispatches_nothing() {
    let server = MockServer::start();
    mock_small_region(&server);
    let posts = server.mock(|when, then| {
        when.method(httpmock::Method::POST).path_contains("/user/");
        then.status(201);
    });

    let client = test_client(&server);
    let summary = pipeline::run_group(&client, "grp2")
        .await
        .expect("an unrouted group is still a successful run");

    assert_eq!(summary.groups, 0);
    assert_eq!(summary.attached, 0);
    assert_eq!(posts.hits(), 0);
}

#[tokio::test]
async fn test_attachment_failures_do_not_fail_the_run() {
    let server = MockServer::start();
    mock_small_region(&server);
    server.mock(|when, then| {
        when.method(httpmock::Method::POST).path("/user/u1/game/g1");
        then.status(500);
    });
    server.mock(|when, then| {
        when.method(httpmock::Method::POST).path("/user/u2/game/g1");
        then.status(201);
    });

    let client = test_client(&server);
    let summary = pipeline::run_cron(&client).await.expect("cron run failed");

    assert_eq!(summary.attached, 1);
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn test_already_attached_counts_as_success() {
    let server = MockServer::start();
    mock_small_region(&server);
    server.mock(|when, then| {
        when.method(httpmock::Method::POST).path("/user/u1/game/g1");
        then.status(409);
    });
    server.mock(|when, then| {
        when.method(httpmock::Method::POST).path("/user/u2/game/g1");
        then.status(201);
    });

    let client = test_client(&server);
    let summary = pipeline::run_cron(&client).await.expect("cron run failed");

    assert_eq!(summary.attached, 1);
    assert_eq!(summary.already_attached, 1);
    assert_eq!(summary.failed, 0);
}

#[tokio::test]
async fn test_resolution_failure_rejects_the_whole_run() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/game");
        then.status(500);
    });

    let client = test_client(&server);
    let result = pipeline::run_cron(&client).await;

    match result {
        Err(RunError::Api(ApiError::Status { status, .. })) => {
            assert_eq!(status.as_u16(), 500)
        }
        other => panic!("expected a failed run, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cron_walks_every_page_of_a_large_group() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/game");
        then.status(200).json_body(json!({"_embedded": {"game": [
            {"game_id": "g1", "meta": {"zipcodes": ["10001"]}},
        ]}}));
    });
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/address");
        then.status(200).json_body(
            json!({"_embedded": {"address": [{"address_id": "a1"}]}}),
        );
    });
    server.mock(|when, then| {
        when.method(httpmock::Method::GET).path("/address/a1/group");
        then.status(200)
            .json_body(json!({"_embedded": {"group": [{"group_id": "grp1"}]}}));
    });

    let page_of = |prefix: &str, count: usize, next: bool| {
        let items: Vec<_> = (0..count)
            .map(|n| json!({"user_id": format!("{prefix}{n}")}))
            .collect();
        let mut body = json!({"_embedded": {"items": items}});
        if next {
            body["_links"] = json!({"next": {"href": "ignored"}});
        }
        body
    };
    let page1 = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/group/grp1/users")
            .query_param("page", "1");
        then.status(200).json_body(page_of("a", 100, true));
    });
    let page2 = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/group/grp1/users")
            .query_param("page", "2");
        then.status(200).json_body(page_of("b", 100, true));
    });
    let page3 = server.mock(|when, then| {
        when.method(httpmock::Method::GET)
            .path("/group/grp1/users")
            .query_param("page", "3");
        then.status(200).json_body(page_of("c", 50, false));
    });
    let posts = server.mock(|when, then| {
        when.method(httpmock::Method::POST).path_contains("/game/g1");
        then.status(201);
    });

    let client = test_client(&server);
    let summary = pipeline::run_cron(&client).await.expect("cron run failed");

    assert_eq!(page1.hits(), 1);
    assert_eq!(page2.hits(), 1);
    assert_eq!(page3.hits(), 1);
    assert_eq!(posts.hits(), 250);
    assert_eq!(summary.pages, 3);
    assert_eq!(summary.users, 250);
    assert_eq!(summary.attached, 250);
}
