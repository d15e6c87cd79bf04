//! Integration tests for the `fritzbox` CLI binary.
//!
//! Argument parsing and error paths run without a box; the end-to-end
//! tests point `--host` at a wiremock server.
#![allow(clippy::unwrap_used)]

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fritzbox_api::PLACEHOLDER_SID;

// ── Helpers ─────────────────────────────────────────────────────────

const HOMEAUTO: &str = "/webservices/homeautoswitch.lua";
const CHALLENGE: &str = "4711beef";
const PASSWORD: &str = "geheim";
const SID: &str = "5c2d8e0a91b3f4a7";

const DEVICE_LIST: &str = r#"<devicelist version="1">
<device identifier="08761 0000434" id="17" functionbitmask="2944" fwversion="03.33" manufacturer="AVM" productname="FRITZ!DECT 200"><present>1</present><name>Steckdose</name></device>
<device identifier="11630 0123456" id="18" functionbitmask="320" fwversion="04.90" manufacturer="AVM" productname="Comet DECT"><present>1</present><name>Heizung</name></device>
</devicelist>"#;

/// Build a [`Command`] for the `fritzbox` binary with env isolation.
///
/// Clears all `FRITZBOX_*` env vars and points the config file at a
/// nonexistent path so tests never touch the user's real configuration.
fn fritzbox_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("fritzbox");
    cmd.env("HOME", "/tmp/fritzbox-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/fritzbox-cli-test-nonexistent")
        .env(
            "FRITZBOX_CONFIG",
            "/tmp/fritzbox-cli-test-nonexistent/config.toml",
        )
        .env_remove("FRITZBOX_PROFILE")
        .env_remove("FRITZBOX_HOST")
        .env_remove("FRITZBOX_USERNAME")
        .env_remove("FRITZBOX_PASSWORD")
        .env_remove("FRITZBOX_OUTPUT")
        .env_remove("FRITZBOX_STRICT_TLS")
        .env_remove("FRITZBOX_TIMEOUT");
    cmd
}

/// `fritzbox_cmd` aimed at a mock box with a password in the env.
fn box_cmd(server: &MockServer, password: &str) -> assert_cmd::Command {
    let mut cmd = fritzbox_cmd();
    cmd.env("FRITZBOX_PASSWORD", password)
        .args(["--host", &server.uri(), "--username", "smarthome"]);
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn session_info(sid: &str) -> String {
    format!("<SessionInfo><SID>{sid}</SID><Challenge>{CHALLENGE}</Challenge></SessionInfo>")
}

/// Mount a box that accepts only [`PASSWORD`] and knows two devices.
async fn mock_box() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param_is_missing("response"))
        .respond_with(ResponseTemplate::new(200).set_body_string(session_info(PLACEHOLDER_SID)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .and(query_param(
            "response",
            fritzbox_api::challenge_response(CHALLENGE, PASSWORD),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string(session_info(SID)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/login_sid.lua"))
        .respond_with(ResponseTemplate::new(200).set_body_string(session_info(PLACEHOLDER_SID)))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .and(query_param("switchcmd", "getdevicelistinfos"))
        .and(query_param("sid", SID))
        .respond_with(ResponseTemplate::new(200).set_body_string(DEVICE_LIST))
        .mount(&server)
        .await;

    server
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = fritzbox_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(
        text.contains("Usage"),
        "Expected 'Usage' in output:\n{text}"
    );
}

#[test]
fn test_help_flag() {
    fritzbox_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("FRITZ!Box")
            .and(predicate::str::contains("devices"))
            .and(predicate::str::contains("switch"))
            .and(predicate::str::contains("temp")),
    );
}

#[test]
fn test_version_flag() {
    fritzbox_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("fritzbox"));
}

#[test]
fn test_completions_bash() {
    fritzbox_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_config_path_honours_override() {
    fritzbox_cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "/tmp/fritzbox-cli-test-nonexistent/config.toml",
        ));
}

#[test]
fn test_unknown_subcommand_is_usage_error() {
    let output = fritzbox_cmd().arg("toast").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Error paths without a box ───────────────────────────────────────

#[test]
fn test_missing_password_exits_auth() {
    let output = fritzbox_cmd()
        .args(["--host", "http://127.0.0.1:9", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    let text = combined_output(&output);
    assert!(
        text.contains("No password configured"),
        "unexpected output:\n{text}"
    );
}

#[test]
fn test_unknown_profile_exits_usage() {
    let output = fritzbox_cmd()
        .args(["--profile", "attic", "devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("attic"), "unexpected output:\n{text}");
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_show_masks_password() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
default_profile = "home"

[profiles.home]
host = "192.168.178.1"
username = "smarthome"
password = "hunter2"

[profiles.cabin]
host = "fritz.cabin"
"#,
    )
    .unwrap();

    fritzbox_cmd()
        .env("FRITZBOX_CONFIG", &path)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("[profiles.home]")
                .and(predicate::str::contains("password = \"****\""))
                .and(predicate::str::contains("hunter2").not()),
        );

    fritzbox_cmd()
        .env("FRITZBOX_CONFIG", &path)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout("cabin\nhome *\n");
}

// ── End-to-end against a mock box ───────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_json() {
    let server = mock_box().await;

    let output = box_cmd(&server, PASSWORD)
        .args(["devices", "list", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let devices: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let devices = devices.as_array().unwrap();
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0]["name"], "Steckdose");
    assert_eq!(devices[1]["identifier"], "11630 0123456");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_devices_list_filters_by_capability() {
    let server = mock_box().await;

    box_cmd(&server, PASSWORD)
        .args(["devices", "list", "--capability", "thermostat", "-o", "plain"])
        .assert()
        .success()
        .stdout("11630 0123456\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_switch_on_sends_stripped_ain() {
    let server = mock_box().await;
    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .and(query_param("switchcmd", "setswitchon"))
        .and(query_param("ain", "087610000434"))
        .and(query_param("sid", SID))
        .respond_with(ResponseTemplate::new(200).set_body_string("1\n"))
        .expect(1)
        .mount(&server)
        .await;

    box_cmd(&server, PASSWORD)
        .args(["switch", "08761 0000434", "on", "-o", "plain"])
        .assert()
        .success()
        .stdout("on\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_switch_off_reports_confirmed_state() {
    let server = mock_box().await;
    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .and(query_param("switchcmd", "setswitchoff"))
        .and(query_param("ain", "087610000434"))
        .respond_with(ResponseTemplate::new(200).set_body_string("0\n"))
        .expect(1)
        .mount(&server)
        .await;

    box_cmd(&server, PASSWORD)
        .args(["switch", "08761 0000434", "off", "-o", "plain"])
        .assert()
        .success()
        .stdout("off\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_temp_get_reports_celsius() {
    let server = mock_box().await;
    Mock::given(method("GET"))
        .and(path(HOMEAUTO))
        .and(query_param("switchcmd", "gettemperature"))
        .and(query_param("ain", "116300123456"))
        .respond_with(ResponseTemplate::new(200).set_body_string("215\n"))
        .mount(&server)
        .await;

    let output = box_cmd(&server, PASSWORD)
        .args(["temp", "116300123456", "get", "-o", "json-compact"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));

    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["name"], "Heizung");
    assert_eq!(result["kind"], "temperature");
    assert_eq!(result["celsius"], 21.5);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_temp_set_out_of_range_is_usage_error() {
    let server = mock_box().await;

    let output = box_cmd(&server, PASSWORD)
        .args(["temp", "116300123456", "set", "35"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_wrong_password_exits_auth() {
    let server = mock_box().await;

    let output = box_cmd(&server, "falsch")
        .args(["devices", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_device_exits_not_found() {
    let server = mock_box().await;

    let output = box_cmd(&server, PASSWORD)
        .args(["switch", "99999 9999999", "state"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
    let text = combined_output(&output);
    assert!(text.contains("Steckdose"), "candidates missing:\n{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_call_rejects_unknown_operation() {
    let server = mock_box().await;

    let output = box_cmd(&server, PASSWORD)
        .args(["call", "getWeather"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("getDeviceList"));
}
