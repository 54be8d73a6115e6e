use std::time::Duration;

use awslite_core::{Env, PaginateMode, PaginationError, Paginator, RawRequest};
use awslite_exec::{Client, ClientConfig, Error, PageIterator};
use futures_util::StreamExt;
use serde_json::{json, Map, Value};
use wiremock::matchers::{body_json, header, method, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer, retries: usize) -> Client {
    let mut cfg = ClientConfig::from_json(&json!({
        "region": "us-west-2",
        "accessKeyId": "AKID",
        "secretAccessKey": "secret",
        "endpoint": server.uri(),
        "retries": retries,
    }))
    .unwrap();
    cfg.retry = cfg.retry.with_base_delay(Duration::from_millis(1));
    Client::builder(cfg).env(Env::empty()).build().unwrap()
}

fn simple_bodies() -> [Value; 3] {
    [
        json!({"Token": "t1", "Accumulator": "a1"}),
        json!({"Token": "t2", "Accumulator": "a2"}),
        json!({"Accumulator": "a3"}),
    ]
}

fn nested_bodies() -> [Value; 3] {
    [
        json!({"Nest": {"Token": "t1", "Accumulator": "a1"}}),
        json!({"Nest": {"Token": "t2", "Accumulator": "a2"}}),
        json!({"Nest": {"Accumulator": "a3"}}),
    ]
}

fn reply(body: &Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body.clone())
}

async fn mount_query_pages(server: &MockServer, bodies: &[Value; 3]) {
    Mock::given(method("GET"))
        .and(query_param_is_missing("Cursor"))
        .respond_with(reply(&bodies[0]))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("Cursor", "t1"))
        .respond_with(reply(&bodies[1]))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("Cursor", "t2"))
        .respond_with(reply(&bodies[2]))
        .expect(1)
        .mount(server)
        .await;
}

fn query_cursor_paginator() -> Paginator {
    Paginator::query("Cursor").with_token("Token")
}

fn iterator_request(paginator: Paginator) -> RawRequest {
    RawRequest {
        query: Some(Map::new()),
        ..RawRequest::default()
    }
    .paginate(PaginateMode::Iterator)
    .paginator(paginator)
}

async fn pages_of(client: &Client, raw: RawRequest) -> PageIterator {
    client
        .request("lambda", raw)
        .await
        .unwrap()
        .into_pages()
        .expect("iterator mode returns pages")
}

async fn assert_yields(pages: &mut PageIterator, bodies: &[Value; 3]) {
    for body in bodies {
        let page = pages.next().await.unwrap().unwrap();
        assert_eq!(&page["payload"], body);
    }
    assert!(pages.next().await.is_none());
    assert!(pages.next().await.is_none());
}

#[tokio::test]
async fn query_cursor() {
    let server = MockServer::start().await;
    let bodies = simple_bodies();
    mount_query_pages(&server, &bodies).await;

    let client = client(&server, 0);
    let mut pages = pages_of(&client, iterator_request(query_cursor_paginator())).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 0);

    assert_yields(&mut pages, &bodies).await;
    assert_eq!(pages.pages_fetched(), 3);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn query_cursor_nested_token() {
    let server = MockServer::start().await;
    let bodies = nested_bodies();
    mount_query_pages(&server, &bodies).await;

    let client = client(&server, 0);
    let mut pages = pages_of(
        &client,
        iterator_request(Paginator::query("Cursor").with_token("Nest.Token")),
    )
    .await;
    assert_yields(&mut pages, &bodies).await;
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

async fn mount_payload_pages(server: &MockServer, bodies: &[Value; 3]) {
    Mock::given(method("POST"))
        .and(body_json(json!({})))
        .respond_with(reply(&bodies[0]))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(body_json(json!({"Cursor": "t1"})))
        .respond_with(reply(&bodies[1]))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(body_json(json!({"Cursor": "t2"})))
        .respond_with(reply(&bodies[2]))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn payload_cursor() {
    for (bodies, token) in [(simple_bodies(), "Token"), (nested_bodies(), "Nest.Token")] {
        let server = MockServer::start().await;
        mount_payload_pages(&server, &bodies).await;

        let client = client(&server, 0);
        let raw = RawRequest::with_payload(json!({}))
            .paginate(PaginateMode::Iterator)
            .paginator(Paginator::payload("Cursor").with_token(token));
        let mut pages = pages_of(&client, raw).await;
        assert_yields(&mut pages, &bodies).await;
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }
}

#[tokio::test]
async fn headers_cursor() {
    for (bodies, token) in [(simple_bodies(), "Token"), (nested_bodies(), "Nest.Token")] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("Cursor", "t1"))
            .respond_with(reply(&bodies[1]))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(header("Cursor", "t2"))
            .respond_with(reply(&bodies[2]))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(reply(&bodies[0]))
            .with_priority(5)
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, 0);
        let mut pages = pages_of(
            &client,
            iterator_request(Paginator::headers("Cursor").with_token(token)),
        )
        .await;
        assert_yields(&mut pages, &bodies).await;
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }
}

#[tokio::test]
async fn auto_mode_accumulates_in_page_order() {
    let server = MockServer::start().await;
    let bodies = simple_bodies();
    mount_query_pages(&server, &bodies).await;

    let client = client(&server, 0);
    let raw = RawRequest::default().paginate(PaginateMode::Auto).paginator(
        Paginator::query("Cursor")
            .with_token("Token")
            .with_accumulator("Accumulator"),
    );
    let out = client.request("lambda", raw).await.unwrap().into_result().unwrap();
    assert_eq!(out["payload"], json!({"Accumulator": ["a1", "a2", "a3"]}));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn auto_mode_with_nested_accumulator() {
    let server = MockServer::start().await;
    let bodies = nested_bodies();
    mount_query_pages(&server, &bodies).await;

    let client = client(&server, 0);
    let raw = RawRequest::default().paginate(PaginateMode::Auto).paginator(
        Paginator::query("Cursor")
            .with_token("Nest.Token")
            .with_accumulator("Nest.Accumulator"),
    );
    let out = client.request("lambda", raw).await.unwrap().into_result().unwrap();
    assert_eq!(out["payload"], json!({"Nest": {"Accumulator": ["a1", "a2", "a3"]}}));
}

#[tokio::test]
async fn missing_or_falsy_first_token_is_a_single_page() {
    for body in [json!({"Items": [1]}), json!({"Token": "", "Items": [1]}), json!({"Token": 0})] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(reply(&body))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server, 0);
        let mut pages = pages_of(&client, iterator_request(query_cursor_paginator())).await;
        assert_eq!(pages.next().await.unwrap().unwrap()["payload"], body);
        assert!(pages.next().await.is_none());
        assert!(pages.is_done());
    }
}

#[tokio::test]
async fn page_error_ends_the_iterator() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param_is_missing("Cursor"))
        .respond_with(reply(&json!({"Token": "t1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("Cursor", "t1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, 0);
    let mut pages = pages_of(&client, iterator_request(query_cursor_paginator())).await;
    assert!(pages.next().await.unwrap().is_ok());
    let err = pages.next().await.unwrap().unwrap_err();
    assert_eq!(err.status(), Some(500));
    assert!(pages.next().await.is_none());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn stream_yields_every_page() {
    let server = MockServer::start().await;
    let bodies = simple_bodies();
    mount_query_pages(&server, &bodies).await;

    let client = client(&server, 0);
    let pages = pages_of(&client, iterator_request(query_cursor_paginator())).await;
    let collected: Vec<_> = pages.into_stream().collect().await;
    let payloads: Vec<Value> = collected
        .into_iter()
        .map(|page| page.unwrap()["payload"].clone())
        .collect();
    assert_eq!(payloads, bodies.to_vec());
}

#[tokio::test]
async fn malformed_paginators_fail_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(reply(&json!({})))
        .expect(0)
        .mount(&server)
        .await;
    let client = client(&server, 0);

    let cases: Vec<(RawRequest, PaginationError)> = vec![
        (
            iterator_request(Paginator::query("Cursor").with_token("Nest..Token")),
            PaginationError::EmptySegment { path: "Nest..Token".into() },
        ),
        (
            iterator_request(Paginator::query("Cursor")),
            PaginationError::MissingField("token"),
        ),
        (
            iterator_request(Paginator::default().with_token("Token")),
            PaginationError::MissingField("cursor"),
        ),
        (
            RawRequest::default()
                .paginate(PaginateMode::Auto)
                .paginator(Paginator::query("C").with_token("T")),
            PaginationError::MissingField("accumulator"),
        ),
        (
            RawRequest::default().paginate(PaginateMode::Iterator),
            PaginationError::NotPaginated("lambda".into()),
        ),
        (
            RawRequest::with_payload(json!("text"))
                .paginate(PaginateMode::Iterator)
                .paginator(Paginator::payload("C").with_token("T")),
            PaginationError::PayloadNotObject { cursor: "C".into() },
        ),
    ];

    for (raw, expected) in cases {
        match client.request("lambda", raw).await {
            Err(Error::Pagination(e)) => assert_eq!(e, expected),
            other => panic!("expected pagination error, got {other:?}"),
        }
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 0);
}
