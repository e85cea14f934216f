//! Concurrency tests: many threads share one gateway and its cached chain.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use serde_json::json;

use crate::dispatch::Gateway;

use super::support::{
    Recording, decoded_response, echo_request, started_directory,
};

const THREADS: usize = 100;

#[test]
fn concurrent_calls_share_the_chain_without_crosstalk() {
    let recording = Recording::new("observer");
    let calls = recording.calls();
    let positions = recording.positions();
    let gateway = Arc::new(
        Gateway::builder(started_directory(&["svc1"]))
            .interceptor(Arc::new(recording))
            .build(),
    );
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|index| {
            let gateway = Arc::clone(&gateway);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Stagger starts so calls overlap at different chain depths.
                thread::sleep(Duration::from_micros(((index * 37) % 500) as u64));
                let argument = format!("payload-{index}");
                let response = gateway
                    .invoke(&echo_request("svc1", &argument))
                    .expect("invoke");
                let envelope = decoded_response(&response);
                assert_eq!(envelope.as_result(), Some(&json!(argument)));
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker thread");
    }

    // Every call ran the shared interceptor exactly once, always entering
    // at position zero: no call observed another's cursor.
    assert_eq!(calls.load(Ordering::SeqCst), THREADS);
    let recorded = positions.lock().expect("positions");
    assert_eq!(recorded.len(), THREADS);
    assert!(recorded.iter().all(|position| *position == 0));

    // All in-flight guards have been released.
    let usage = gateway.resource_usage().expect("usage");
    assert_eq!(decoded_response(&usage).as_result(), Some(&json!(0)));
}

#[test]
fn concurrent_liveness_probes_race_with_dispatch() {
    let gateway = Arc::new(Gateway::builder(started_directory(&["svc1"])).build());
    let barrier = Arc::new(Barrier::new(16));

    let workers: Vec<_> = (0..16)
        .map(|index| {
            let gateway = Arc::clone(&gateway);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if index % 2 == 0 {
                    let response = gateway
                        .invoke(&echo_request("svc1", "hi"))
                        .expect("invoke");
                    assert_eq!(decoded_response(&response).as_result(), Some(&json!("hi")));
                } else {
                    let status = gateway.alive_check(Some("svc1"));
                    assert_eq!(status, crate::dispatch::AliveStatus::Alive);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker thread");
    }
}
