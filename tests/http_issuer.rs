//! Tests for the HTTP issuer client against a mock endpoint.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ticketforge::{HttpTicketIssuer, IssuerConfig, Secret, TicketError, TicketIssuer, TicketServer};

fn config(base_uri: &str) -> IssuerConfig {
    IssuerConfig::new(
        format!("{base_uri}/ticket").parse().unwrap(),
        Secret::new("token-123"),
    )
}

#[tokio::test]
async fn test_fetches_and_decodes_a_ticket() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ticket"))
        .and(query_param("access_token", "token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "ticket": "fresh-ticket",
            "expires_in": 7200
        })))
        .mount(&mock_server)
        .await;

    let issuer = HttpTicketIssuer::new(config(&mock_server.uri())).unwrap();
    let issued = issuer.fetch_ticket().await.unwrap();

    assert_eq!(issued.ticket, "fresh-ticket");
    assert_eq!(issued.expires_in, 7200);
}

#[tokio::test]
async fn test_surfaces_issuer_application_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ticket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 42001,
            "errmsg": "access_token expired"
        })))
        .mount(&mock_server)
        .await;

    let issuer = HttpTicketIssuer::new(config(&mock_server.uri())).unwrap();
    let result = issuer.fetch_ticket().await;

    match result {
        Err(TicketError::Issuer { code, message }) => {
            assert_eq!(code, 42001);
            assert_eq!(message, "access_token expired");
        }
        other => panic!("expected issuer rejection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body_is_a_transport_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ticket"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let issuer = HttpTicketIssuer::new(config(&mock_server.uri())).unwrap();
    let result = issuer.fetch_ticket().await;

    assert!(matches!(result, Err(TicketError::Transport { .. })));
}

#[tokio::test]
async fn test_unreachable_issuer_is_a_transport_error() {
    // Nothing listens on the discard port.
    let mut config = config("http://127.0.0.1:9");
    config.fetch_timeout_secs = 2;
    let issuer = HttpTicketIssuer::new(config).unwrap();
    let result = issuer.fetch_ticket().await;

    assert!(matches!(result, Err(TicketError::Transport { .. })));
}

#[tokio::test]
async fn test_server_caches_tickets_fetched_over_http() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/ticket"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errcode": 0,
            "errmsg": "ok",
            "ticket": "http-ticket",
            "expires_in": 7200
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let issuer = HttpTicketIssuer::new(config(&mock_server.uri())).unwrap();
    let server = TicketServer::spawn(issuer);

    assert_eq!(server.ticket().await.unwrap(), "http-ticket");
    assert_eq!(server.ticket().await.unwrap(), "http-ticket");
    // Dropping the mock server verifies the single expected request.
}
