use chrono::NaiveDate;
use httpmock::prelude::*;
use rusty_ns::{ApiConfig, BoardError, NsClient};
use serde_json::json;
use std::time::Duration;

fn client(server: &MockServer) -> NsClient {
    NsClient::new(
        ApiConfig::new("secret")
            .with_base_url(server.base_url())
            .with_timeout(Duration::from_secs(2)),
    )
}

#[test]
fn test_fetch_departures_sends_key_and_station() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/reisinformatie-api/api/v2/departures")
            .query_param("station", "ESK")
            .header("Ocp-Apim-Subscription-Key", "secret")
            .header("Cache-Control", "no-cache");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "payload": {
                    "source": "PPV",
                    "departures": [
                        {"direction": "Zwolle", "plannedDateTime": "2024-05-10T14:35:00+0200"},
                        {"direction": "Hengelo", "plannedDateTime": "2024-05-10T14:41:00+0200"}
                    ]
                }
            }));
    });

    let records = client(&server).fetch_departures("ESK").unwrap();

    mock.assert();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["direction"], "Zwolle");
    assert_eq!(records[1]["direction"], "Hengelo");
}

#[test]
fn test_fetch_departures_empty_payload() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reisinformatie-api/api/v2/departures");
        then.status(200).json_body(json!({"payload": {}}));
    });

    let records = client(&server).fetch_departures("ESK").unwrap();
    assert!(records.is_empty());
}

#[test]
fn test_http_error_status() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reisinformatie-api/api/v2/departures");
        then.status(401).body("Access denied due to invalid subscription key.");
    });

    let err = client(&server).fetch_departures("ESK").unwrap_err();
    assert!(matches!(err, BoardError::Status { status: 401, .. }));
}

#[test]
fn test_malformed_json() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reisinformatie-api/api/v2/departures");
        then.status(200).body("<html>maintenance</html>");
    });

    let err = client(&server).fetch_departures("ESK").unwrap_err();
    match err {
        BoardError::Json { body, .. } => {
            assert_eq!(body.as_deref(), Some("<html>maintenance</html>"));
        }
        other => panic!("expected JSON error, got {other:?}"),
    }
}

#[test]
fn test_timeout_is_network_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/reisinformatie-api/api/v2/departures");
        then.status(200)
            .delay(Duration::from_millis(1500))
            .json_body(json!({"payload": {"departures": []}}));
    });

    let client = NsClient::new(
        ApiConfig::new("secret")
            .with_base_url(server.base_url())
            .with_timeout(Duration::from_millis(200)),
    );
    let err = client.fetch_departures("ESK").unwrap_err();
    assert!(matches!(err, BoardError::Network { .. }));
}

#[test]
fn test_fetch_composition() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/virtual-train-api/api/v1/trein/3035")
            .query_param("date", "2024-05-10")
            .header("Ocp-Apim-Subscription-Key", "secret");
        then.status(200).json_body(json!({
            "stops": [
                {
                    "station": "ESK",
                    "materialUnits": [
                        {"type": "VIRM6", "remainsBehind": false},
                        {"type": "VIRM4", "remainsBehind": true}
                    ]
                }
            ]
        }));
    });

    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    let composition = client(&server).fetch_composition("3035", date).unwrap();

    mock.assert();
    assert_eq!(composition.stops.len(), 1);
    let units = &composition.stops[0].material_units;
    assert_eq!(units.len(), 2);
    assert_eq!(units[0].unit_type, "VIRM6");
    assert!(units[1].remains_behind);
}

#[test]
fn test_composition_resolves_through_client() {
    use rusty_ns::RollingStockResolver;
    use std::sync::Arc;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/virtual-train-api/api/v1/trein/140");
        then.status(200).json_body(json!({
            "stops": [
                {"station": "HGL", "materialUnits": [{"type": "DB-BER9"}, {"type": "E-LOC 193"}]}
            ]
        }));
    });

    let resolver = RollingStockResolver::new(Arc::new(client(&server)));
    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    assert_eq!(resolver.resolve("140", date, "HGL"), "BER-9");
}

#[test]
fn test_composition_not_found_degrades_to_blank() {
    use rusty_ns::RollingStockResolver;
    use std::sync::Arc;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/virtual-train-api/api/v1/trein/9999");
        then.status(404);
    });

    let resolver = RollingStockResolver::new(Arc::new(client(&server)));
    let date = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
    assert_eq!(resolver.resolve("9999", date, "ESK"), "");
}
