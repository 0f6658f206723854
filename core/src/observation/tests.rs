use super::*;

use crate::error::Error;

use std::thread;

const TIMEOUT: Duration = Duration::from_millis(10);

#[test]
fn test_observations_keep_arrival_order() {
    let (send, stream) = observation_stream();

    for db in [-40.0, -25.0, -31.0, -30.0] {
        send.signal(ActivitySignal::Level(db)).unwrap();
    }
    drop(send);

    let levels: Vec<f64> = stream
        .map(|observation| match observation {
            Ok(ActivitySignal::Level(db)) => db,
            other => panic!("unexpected observation {other:?}"),
        })
        .collect();
    assert_eq!(levels, vec![-40.0, -25.0, -31.0, -30.0]);
}

#[test]
fn test_invalid_observation_is_delivered() {
    let (send, mut stream) = observation_stream();
    send.invalid("rms field is missing").unwrap();

    assert!(matches!(stream.next(), Some(Err(Error::InvalidSignal(_)))));
}

#[test]
fn test_next_timeout_states() {
    let (send, stream) = observation_stream();
    assert!(matches!(stream.next_timeout(TIMEOUT), NextObservation::Pending));

    send.signal(ActivitySignal::Presence(true)).unwrap();
    assert_eq!(stream.pending(), 1);
    assert!(matches!(
        stream.next_timeout(TIMEOUT),
        NextObservation::Ready(Ok(ActivitySignal::Presence(true)))
    ));

    drop(send);
    assert!(matches!(stream.next_timeout(TIMEOUT), NextObservation::Closed));
}

#[test]
fn test_send_after_stream_dropped_fails() {
    let (send, stream) = observation_stream();
    drop(stream);

    assert!(send.signal(ActivitySignal::Presence(false)).is_err());
}

#[test]
fn test_stream_across_threads() {
    let (send, stream) = observation_stream();

    let handle = thread::spawn(move || {
        for i in 0..100 {
            send.signal(ActivitySignal::Presence(i % 2 == 0)).unwrap();
        }
    });

    let received: Vec<bool> = stream
        .map(|observation| matches!(observation, Ok(ActivitySignal::Presence(true))))
        .collect();
    handle.join().unwrap();

    assert_eq!(received.len(), 100);
    assert!(received.iter().step_by(2).all(|&present| present));
}
