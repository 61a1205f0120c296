use cekincki_sheets::{
    AccessTokenSource, RosterSheet, ServiceAccountKey, SheetBackend, SheetsClient, SheetsError,
    StaticToken, TokenProvider, UpsertOutcome,
};
use cekincki_types::GuildMember;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, method, path, path_regex, query_param,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_KEY: &str = include_str!("fixtures/test_service_account.pem");

fn client(server: &MockServer) -> SheetsClient {
    SheetsClient::with_client(
        reqwest::Client::new(),
        &server.uri(),
        "sheet-1",
        Arc::new(StaticToken("test-token".to_string())),
    )
    .unwrap()
}

async fn mount_tabs(server: &MockServer, titles: &[&str]) {
    let sheets: Vec<_> = titles
        .iter()
        .map(|t| json!({ "properties": { "title": t } }))
        .collect();
    Mock::given(method("GET"))
        .and(path("/spreadsheets/sheet-1"))
        .and(query_param("fields", "sheets.properties.title"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sheets": sheets })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn reads_rows_from_quoted_range() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/spreadsheets/sheet-1/values/'cekincki'!A:C$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "'cekincki'!A1:C3",
            "values": [["nickname", "username", "cekincki"], ["Ana", "ana", "5"]]
        })))
        .mount(&server)
        .await;

    let rows = client(&server).read_rows("cekincki").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], json!("Ana"));
}

#[tokio::test]
async fn empty_range_has_no_values_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"/values/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "range": "'x'!A1:C1" })))
        .mount(&server)
        .await;

    let rows = client(&server).read_rows("x").await.unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn creates_missing_tab_through_batch_update() {
    let server = MockServer::start().await;
    mount_tabs(&server, &["Sheet1"]).await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/sheet-1:batchUpdate"))
        .and(body_partial_json(json!({
            "requests": [{ "addSheet": { "properties": { "title": "cekincki" } } }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "replies": [{}] })))
        .expect(1)
        .mount(&server)
        .await;

    let roster = RosterSheet::new(Arc::new(client(&server)), "cekincki");
    roster.ensure_tab().await.unwrap();
}

#[tokio::test]
async fn existing_tab_is_not_recreated() {
    let server = MockServer::start().await;
    mount_tabs(&server, &["cekincki"]).await;
    Mock::given(method("POST"))
        .and(path("/spreadsheets/sheet-1:batchUpdate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let roster = RosterSheet::new(Arc::new(client(&server)), "cekincki");
    roster.ensure_tab().await.unwrap();
}

#[tokio::test]
async fn upsert_writes_existing_row_raw() {
    let server = MockServer::start().await;
    mount_tabs(&server, &["cekincki"]).await;
    Mock::given(method("PUT"))
        .and(path_regex(r"/values/'cekincki'!A1:C1$"))
        .and(query_param("valueInputOption", "RAW"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/values/'cekincki'!A:C$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [
                ["nickname", "username", "cekincki"],
                ["Bor", "bor", "1"],
                ["Ana", "ana", "5"]
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"/values/'cekincki'!A3:C3$"))
        .and(body_partial_json(json!({ "values": [["Ana", "ana", 40]] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let roster = RosterSheet::new(Arc::new(client(&server)), "cekincki");
    let member = GuildMember::new("1", "ana").with_nick("Ana");
    let outcome = roster.upsert_member_record(&member, 40).await.unwrap();
    assert_eq!(outcome, UpsertOutcome::Updated { row_index: 3 });
}

#[tokio::test]
async fn bulk_sync_appends_with_insert_rows() {
    let server = MockServer::start().await;
    mount_tabs(&server, &["cekincki"]).await;
    Mock::given(method("PUT"))
        .and(path_regex(r"/values/'cekincki'!A1:C1$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"/values/'cekincki'!A:C$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["nickname", "username", "cekincki"], ["Ana", "ana", "5"]]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"/values/'cekincki'!A:C:append$"))
        .and(query_param("valueInputOption", "RAW"))
        .and(query_param("insertDataOption", "INSERT_ROWS"))
        .and(body_partial_json(json!({ "values": [["Bor", "bor", 0]] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let roster = RosterSheet::new(Arc::new(client(&server)), "cekincki");
    let members = vec![
        GuildMember::new("1", "ana").with_nick("Ana"),
        GuildMember::new("2", "bor").with_global_name("Bor"),
    ];
    let outcome = roster.bulk_sync_members(&members).await.unwrap();
    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.total_members, 2);
}

#[tokio::test]
async fn api_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("PERMISSION_DENIED"))
        .mount(&server)
        .await;

    match client(&server).tab_titles().await {
        Err(SheetsError::Api { status, message }) => {
            assert_eq!(status, 403);
            assert!(message.contains("PERMISSION_DENIED"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

fn test_key(token_uri: String) -> ServiceAccountKey {
    let raw = json!({
        "client_email": "bot@project.iam.gserviceaccount.com",
        "private_key": TEST_KEY,
        "token_uri": token_uri,
    });
    serde_json::from_value(raw).unwrap()
}

#[tokio::test]
async fn token_provider_exchanges_jwt_and_caches() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ya29.test",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = TokenProvider::new(
        test_key(format!("{}/token", server.uri())),
        reqwest::Client::new(),
    );
    assert_eq!(provider.access_token().await.unwrap(), "ya29.test");
    assert_eq!(provider.access_token().await.unwrap(), "ya29.test");
}

#[tokio::test]
async fn token_provider_reports_rejected_grant() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;

    let provider = TokenProvider::new(
        test_key(format!("{}/token", server.uri())),
        reqwest::Client::new(),
    );
    match provider.access_token().await {
        Err(SheetsError::Auth(message)) => assert!(message.contains("invalid_grant")),
        other => panic!("unexpected result: {:?}", other),
    }
}
