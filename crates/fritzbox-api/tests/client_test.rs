#![allow(clippy::unwrap_used)]
// Integration tests for `FritzClient` using wiremock.

use secrecy::SecretString;
use url::Url;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fritzbox_api::{Credentials, Error, FritzClient, SessionId, challenge_response};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, FritzClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = FritzClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn credentials(password: &str) -> Credentials {
    Credentials::new(Some("admin".into()), SecretString::from(password.to_owned()))
}

fn session_info(sid: &str, challenge: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?><SessionInfo><SID>{sid}</SID>\
         <Challenge>{challenge}</Challenge><BlockTime>0</BlockTime></SessionInfo>"
    )
}

fn sid(raw: &str) -> SessionId {
    SessionId::parse(raw).unwrap()
}

const HOMEAUTO: &str = "/webservices/homeautoswitch.lua";

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_challenge_response() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param_is_missing("response"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(session_info("0000000000000000", "1234567z")),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param("username", "admin"))
        .and(query_param("response", challenge_response("1234567z", "äbc")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(session_info("a1b2c3d4e5f60708", "1234567z")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let sid = client.get_session_id(&credentials("äbc")).await.unwrap();
    assert_eq!(sid.as_str(), "a1b2c3d4e5f60708");
}

#[tokio::test]
async fn test_login_reuses_existing_session() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(session_info("feedfacecafebeef", "1234567z")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let sid = client.get_session_id(&credentials("pw")).await.unwrap();
    assert_eq!(sid.as_str(), "feedfacecafebeef");
}

#[tokio::test]
async fn test_login_missing_challenge() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not a box</html>"))
        .mount(&server)
        .await;

    let result = client.get_session_id(&credentials("pw")).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("challenge"), "unexpected message: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_rejected_with_placeholder() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(session_info("0000000000000000", "abcdef12")),
        )
        .mount(&server)
        .await;

    let result = client.get_session_id(&credentials("wrong")).await;

    assert!(
        matches!(result, Err(Error::InvalidCredentials { placeholder: true })),
        "expected InvalidCredentials, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_rejected_without_sid() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param_is_missing("response"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(session_info("0000000000000000", "abcdef12")),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param("username", "admin"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<SessionInfo/>"))
        .mount(&server)
        .await;

    let result = client.get_session_id(&credentials("wrong")).await;

    assert!(
        matches!(result, Err(Error::InvalidCredentials { placeholder: false })),
        "expected InvalidCredentials, got: {result:?}"
    );
}

// ── Command tests ───────────────────────────────────────────────────

#[tokio::test]
async fn test_switch_state_sends_sid_and_ain() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .and(query_param("switchcmd", "getswitchstate"))
        .and(query_param("ain", "087610000434"))
        .and(query_param("sid", "a1b2c3d4e5f60708"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1\n"))
        .expect(1)
        .mount(&server)
        .await;

    let on = client
        .switch_state(&sid("a1b2c3d4e5f60708"), "087610000434")
        .await
        .unwrap();
    assert!(on);
}

#[tokio::test]
async fn test_set_switch_off_reports_confirmation() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .and(query_param("switchcmd", "setswitchoff"))
        .respond_with(ResponseTemplate::new(200).set_body_string("0\n"))
        .mount(&server)
        .await;

    let off = client
        .set_switch_off(&sid("a1b2c3d4e5f60708"), "087610000434")
        .await
        .unwrap();
    assert!(off);
}

#[tokio::test]
async fn test_set_switch_off_unconfirmed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .and(query_param("switchcmd", "setswitchoff"))
        .respond_with(ResponseTemplate::new(200).set_body_string("1\n"))
        .mount(&server)
        .await;

    let off = client
        .set_switch_off(&sid("a1b2c3d4e5f60708"), "087610000434")
        .await
        .unwrap();
    assert!(!off);
}

#[tokio::test]
async fn test_temperature_is_in_tenths() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .and(query_param("switchcmd", "gettemperature"))
        .respond_with(ResponseTemplate::new(200).set_body_string("225\n"))
        .mount(&server)
        .await;

    let celsius = client
        .temperature(&sid("a1b2c3d4e5f60708"), "087610000434")
        .await
        .unwrap();
    assert!((celsius - 22.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_set_temp_target_encodes_param() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .and(query_param("switchcmd", "sethkrtsoll"))
        .and(query_param("param", "40"))
        .respond_with(ResponseTemplate::new(200).set_body_string("40\n"))
        .expect(1)
        .mount(&server)
        .await;

    client
        .set_temp_target(&sid("a1b2c3d4e5f60708"), "116300123456", 20.0)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_device_list_infos() {
    let (server, client) = setup().await;

    let body = r#"<devicelist version="1">
<device identifier="11630 0123456" id="18" functionbitmask="320" fwversion="04.90" manufacturer="AVM" productname="Comet DECT"><present>1</present><name>Heizung</name></device>
</devicelist>"#;

    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .and(query_param("switchcmd", "getdevicelistinfos"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(&server)
        .await;

    let devices = client
        .device_list_infos(&sid("a1b2c3d4e5f60708"))
        .await
        .unwrap();

    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].identifier, "11630 0123456");
    assert_eq!(devices[0].function_bitmask, 320);
    assert!(devices[0].present);
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_forbidden_is_session_expired() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client
        .switch_state(&sid("a1b2c3d4e5f60708"), "087610000434")
        .await;

    assert!(
        matches!(result, Err(Error::SessionExpired)),
        "expected SessionExpired, got: {result:?}"
    );
}

#[tokio::test]
async fn test_server_error_carries_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client
        .temp_target(&sid("a1b2c3d4e5f60708"), "116300123456")
        .await;

    match result {
        Err(Error::Http { status, ref message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Internal Server Error");
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_temperature() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .respond_with(ResponseTemplate::new(200).set_body_string("inval\n"))
        .mount(&server)
        .await;

    let result = client
        .temperature(&sid("a1b2c3d4e5f60708"), "087610000434")
        .await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_set_temp_target_out_of_range_sends_nothing() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .respond_with(ResponseTemplate::new(200).set_body_string("56\n"))
        .expect(0)
        .mount(&server)
        .await;

    let err = client
        .set_temp_target(&sid("a1b2c3d4e5f60708"), "116300123456", 35.0)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }), "{err:?}");
}
