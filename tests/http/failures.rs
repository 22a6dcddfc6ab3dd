//! Timeouts, refused connections, invalid requests and config-driven limits.

use crate::common::*;
use std::time::Duration;

#[test]
fn test_request_timeout_reports_timeout() {
    let server = TestServer::start();
    let manager = http_manager();
    let handle = manager
        .submit(
            RequestSpec::get(server.url("/slow")).with_timeout(Duration::from_millis(200)),
            |view, body| {
                assert_eq!(view.outcome, TransferOutcome::Timeout);
                assert!(body.is_empty());
            },
        )
        .unwrap();

    drive_all(&manager, &[handle], Duration::from_secs(5));
    assert_eq!(manager.outcome(handle), Some(TransferOutcome::Timeout));
    assert_eq!(manager.metrics().timed_out, 1);
}

#[test]
fn test_config_default_timeout_applies() {
    let server = TestServer::start();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("conduit.toml");
    ClientConfig {
        default_timeout_ms: Some(200),
        worker_threads: 1,
        ..ClientConfig::default()
    }
    .write_to_file(&path)
    .unwrap();

    let manager = http_manager_with(ClientConfig::from_file(&path).unwrap());
    let handle = manager
        .submit(RequestSpec::get(server.url("/slow")), |_, _| {})
        .unwrap();

    drive_all(&manager, &[handle], Duration::from_secs(5));
    assert_eq!(manager.outcome(handle), Some(TransferOutcome::Timeout));
}

#[test]
fn test_refused_connection_reports_connect_error() {
    let manager = http_manager();
    let handle = manager
        .submit(RequestSpec::get(refused_url()), |_, _| {})
        .unwrap();

    drive_all(&manager, &[handle], Duration::from_secs(10));
    assert_eq!(
        manager.outcome(handle),
        Some(TransferOutcome::Error(ErrorCode::Connect))
    );
}

#[test]
fn test_malformed_requests_fail_synchronously() {
    let manager = http_manager();

    let no_body = manager.submit(RequestSpec::new("http://127.0.0.1/", Method::Post), |_, _| {});
    assert!(no_body.unwrap_err().is_configuration());

    let bad_url = manager.submit(RequestSpec::get("not a url"), |_, _| {});
    assert!(bad_url.unwrap_err().is_configuration());

    let bad_scheme = manager.submit(RequestSpec::get("ftp://127.0.0.1/file"), |_, _| {});
    assert!(bad_scheme.unwrap_err().is_configuration());

    assert_eq!(manager.tracked(), 0);
    assert_eq!(manager.metrics().rejected, 3);
}

#[test]
fn test_releasing_in_flight_request_suppresses_callback() {
    let server = TestServer::start();
    let manager = http_manager();
    let handle = manager
        .submit(RequestSpec::get(server.url("/slow")), |_, _| {
            panic!("released request must not complete")
        })
        .unwrap();

    manager.poll();
    assert!(manager.release(handle));
    for _ in 0..20 {
        manager.poll();
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(manager.metrics().callback_panics, 0);
    assert_eq!(manager.with_engine(|e| conduit::TransferEngine::in_flight(e)), 0);
}
