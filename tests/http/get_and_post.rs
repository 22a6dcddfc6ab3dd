//! The basic scenario: a GET that succeeds and a POST the server rejects,
//! both delivered through callbacks on the polling thread.

use crate::common::*;
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[test]
fn test_get_succeeds_and_post_is_rejected_with_405() {
    let server = TestServer::start();
    let manager = http_manager();
    let seen: Arc<Mutex<Vec<(TransactionView, Vec<u8>, thread::ThreadId)>>> =
        Arc::new(Mutex::new(Vec::new()));

    let record = |seen: &Arc<Mutex<Vec<_>>>| {
        let seen = Arc::clone(seen);
        move |view: &TransactionView, body: &[u8]| {
            seen.lock()
                .push((view.clone(), body.to_vec(), thread::current().id()));
        }
    };

    let get = manager
        .submit(RequestSpec::get(server.url("/")), record(&seen))
        .unwrap();
    let post = manager
        .submit(RequestSpec::post(server.url("/"), "hello"), record(&seen))
        .unwrap();
    assert_ne!(get, post);

    drive_all(&manager, &[get, post], Duration::from_secs(10));

    let seen = seen.lock();
    assert_eq!(seen.len(), 2);
    for (view, body, thread_id) in seen.iter() {
        // Callbacks run on the polling thread
        assert_eq!(*thread_id, thread::current().id());
        if view.handle == get {
            assert_eq!(view.outcome, TransferOutcome::Ok);
            assert!(!body.is_empty());
            assert_eq!(view.method, Method::Get);
        } else {
            assert_eq!(view.handle, post);
            assert_eq!(view.outcome, TransferOutcome::Error(ErrorCode::Status(405)));
            assert_eq!(view.outcome.status_code(), Some(405));
        }
    }

    assert!(manager.is_completed(get));
    assert!(manager.is_completed(post));
    assert_eq!(manager.outcome(get), Some(TransferOutcome::Ok));

    assert!(manager.release(get));
    assert!(manager.release(post));
    assert!(manager.is_completed(get));
    assert_eq!(manager.tracked(), 0);
}

#[test]
fn test_post_body_reaches_the_server() {
    let server = TestServer::start();
    let manager = http_manager();
    let echoed = Arc::new(Mutex::new(None));

    let handle = {
        let echoed = Arc::clone(&echoed);
        manager
            .submit(
                RequestSpec::post(server.url("/echo"), "a=1&b=2"),
                move |view, body| {
                    assert!(view.outcome.is_ok());
                    *echoed.lock() = Some(String::from_utf8_lossy(body).into_owned());
                },
            )
            .unwrap()
    };

    drive_all(&manager, &[handle], Duration::from_secs(10));
    assert_eq!(echoed.lock().as_deref(), Some("a=1&b=2"));
}

#[test]
fn test_handle_stays_pending_until_polled() {
    let server = TestServer::start();
    let manager = http_manager();
    let handle = manager
        .submit(RequestSpec::get(server.url("/")), |_, _| {})
        .unwrap();

    // Nothing is sent before the first poll
    thread::sleep(Duration::from_millis(50));
    assert!(!manager.is_completed(handle));
    assert_eq!(manager.status(handle), Some(TransactionStatus::Pending));

    drive_all(&manager, &[handle], Duration::from_secs(10));
    assert_eq!(manager.status(handle), Some(TransactionStatus::Completed));
}
