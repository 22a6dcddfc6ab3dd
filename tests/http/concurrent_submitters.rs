//! Many threads submitting while one thread drives the manager.

use crate::common::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

#[test]
fn test_submitters_and_driver_run_concurrently() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 10;

    let server = Arc::new(TestServer::start());
    let manager = http_manager();
    let ok = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let submitters: Vec<_> = (0..THREADS)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let server = Arc::clone(&server);
            let ok = Arc::clone(&ok);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                (0..PER_THREAD)
                    .map(|_| {
                        let ok = Arc::clone(&ok);
                        manager
                            .submit(RequestSpec::get(server.url("/")), move |view, _| {
                                if view.outcome.is_ok() {
                                    ok.fetch_add(1, Ordering::SeqCst);
                                }
                            })
                            .unwrap()
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    // Drive while submissions are still arriving
    let mut handles = Vec::new();
    for submitter in submitters {
        while !submitter.is_finished() {
            manager.poll();
            thread::sleep(Duration::from_millis(1));
        }
        handles.extend(submitter.join().unwrap());
    }

    let distinct: HashSet<_> = handles.iter().copied().collect();
    assert_eq!(distinct.len(), THREADS * PER_THREAD);

    drive_all(&manager, &handles, Duration::from_secs(20));
    assert_eq!(ok.load(Ordering::SeqCst), THREADS * PER_THREAD);

    for handle in handles {
        assert!(manager.release(handle));
    }
    assert_eq!(manager.tracked(), 0);
}
