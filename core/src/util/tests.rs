use super::*;

use crate::error::{self, Error};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Counter {
    updates: Arc<AtomicUsize>,
    starts: usize,
    stops: usize,
    limit: Option<usize>,
    fail_with: Option<fn() -> Error>,
}

impl Runnable for Counter {
    fn update(&mut self, control_flow: &mut ControlFlow) -> error::Result<()> {
        let updates = self.updates.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(fail_with) = self.fail_with {
            return Err(fail_with());
        }
        if self.limit.is_some_and(|limit| updates >= limit) {
            *control_flow = ControlFlow::Break;
        }

        Ok(())
    }

    fn on_start(&mut self) {
        self.starts += 1;
    }

    fn on_stop(&mut self) {
        self.stops += 1;
    }
}

#[test]
fn test_timer_times_out() {
    let timer = Timer::new(Duration::from_millis(20));
    assert!(!timer.is_time_out());
    assert!(timer.remaining() <= Duration::from_millis(20));

    timer.wait();
    assert!(timer.remaining() > Duration::ZERO);

    std::thread::sleep(Duration::from_millis(25));
    assert!(timer.is_time_out());
    assert!(!timer.is_time_out());
}

#[test]
fn test_zero_interval_timer() {
    let mut timer = Timer::new(Duration::from_secs(60));
    timer.set_interval(Duration::ZERO);

    assert_eq!(timer.interval(), Duration::ZERO);
    assert_eq!(timer.remaining(), Duration::ZERO);
    assert!(timer.is_time_out());
}

#[test]
fn test_state_machine_transitions() {
    let mut runnable_sm = RunnableStateMachine::new(Counter::default());
    assert_eq!(runnable_sm.state(), RunnableState::NotRunning);
    assert!(runnable_sm.proceed().is_none());
    assert!(matches!(runnable_sm.stop(), Err(Error::WrongRunnableState)));

    runnable_sm.start().unwrap();
    assert!(runnable_sm.is_running());
    assert!(matches!(runnable_sm.start(), Err(Error::WrongRunnableState)));
    assert!(matches!(runnable_sm.proceed(), Some(Ok(()))));

    runnable_sm.stop().unwrap();
    assert_eq!(runnable_sm.runnable().starts, 1);
    assert_eq!(runnable_sm.runnable().stops, 1);
}

#[test]
fn test_break_ends_proceeding() {
    let counter = Counter {
        limit: Some(3),
        ..Default::default()
    };
    let updates = counter.updates.clone();
    let mut runnable_sm = RunnableStateMachine::new_running(counter);

    while runnable_sm.proceed().is_some() {}

    assert_eq!(updates.load(Ordering::SeqCst), 3);
    assert_eq!(
        runnable_sm.state(),
        RunnableState::Running(ControlFlow::Break)
    );
}

#[test]
fn test_run_stops_on_fatal_error() {
    let mut counter = Counter {
        fail_with: Some(|| Error::Pipeline(String::from("gone"))),
        ..Default::default()
    };
    counter.run();

    assert_eq!(counter.updates.load(Ordering::SeqCst), 1);
    assert_eq!(counter.starts, 1);
    assert_eq!(counter.stops, 1);
}

#[test]
fn test_run_until_break() {
    let mut counter = Counter {
        limit: Some(5),
        ..Default::default()
    };
    counter.run();

    assert_eq!(counter.updates.load(Ordering::SeqCst), 5);
    assert_eq!(counter.stops, 1);
}

#[test]
fn test_thread_survives_recoverable_errors() {
    let counter = Counter {
        fail_with: Some(|| Error::InvalidSignal(String::from("nan"))),
        ..Default::default()
    };
    let updates = counter.updates.clone();
    let thread = RunnableThread::spawn("failing", counter).unwrap();

    while updates.load(Ordering::SeqCst) < 10 {
        std::thread::yield_now();
    }
    assert!(!thread.is_finished());
    thread.finish();
}

#[test]
fn test_runnable_thread_finishes_on_break() {
    let counter = Counter {
        limit: Some(2),
        ..Default::default()
    };
    let updates = counter.updates.clone();
    let thread = RunnableThread::spawn("counter", counter).unwrap();
    assert_eq!(thread.name(), "counter");

    while !thread.is_finished() {
        std::thread::yield_now();
    }
    thread.finish();

    assert_eq!(updates.load(Ordering::SeqCst), 2);
}
