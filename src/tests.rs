use crate::{
    error::*, Builder, Clock, ConcurrentGenerator, Exhaustion, Generator, MachineIdSelection,
    Resolution,
};
use chrono::prelude::*;
use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    thread,
    time::{Duration, Instant},
};

/// A clock that only moves when told to, or when a generator sleeps on it.
#[derive(Clone)]
struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
    sleeps: Arc<AtomicUsize>,
}

impl ManualClock {
    fn at_millis(millis: i64) -> Self {
        Self {
            now: Arc::new(Mutex::new(epoch() + chrono::Duration::milliseconds(millis))),
            sleeps: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn set_millis(&self, millis: i64) {
        *self.now.lock().unwrap() = epoch() + chrono::Duration::milliseconds(millis);
    }

    fn advance(&self, duration: chrono::Duration) {
        *self.now.lock().unwrap() += duration;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn sleep(&self, duration: Duration) {
        self.sleeps.fetch_add(1, Ordering::SeqCst);
        self.advance(chrono::Duration::from_std(duration).unwrap());
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn builder(clock: &ManualClock) -> Builder<ManualClock> {
    Builder::with_clock(clock.clone()).epoch(epoch())
}

#[test]
fn test_next_id() -> Result<(), Error> {
    let mut sf = Generator::new(1)?;
    assert!(sf.next_id().is_ok());
    Ok(())
}

#[test]
fn test_sequence_increments_within_same_tick() -> Result<(), Error> {
    let clock = ManualClock::at_millis(42);
    let mut sf = builder(&clock).machine_id(5).finalize()?;

    let ids = [sf.next_id()?, sf.next_id()?, sf.next_id()?];
    for (sequence, &id) in ids.iter().enumerate() {
        let parts = sf.decompose(id);
        assert_eq!(parts.tick, 42);
        assert_eq!(parts.machine_id, 5);
        assert_eq!(parts.sequence, sequence as u64);
        assert_eq!(parts.msb, 0);
    }
    assert!(ids[0] < ids[1] && ids[1] < ids[2]);
    Ok(())
}

#[test]
fn test_packs_tick_machine_and_sequence() -> Result<(), Error> {
    let clock = ManualClock::at_millis(42);
    let mut sf = builder(&clock)
        .machine_id(5)
        .machine_id_bits(4)
        .sequence_bits(3)
        .finalize()?;

    assert_eq!(sf.next_id()?, (42 << 7) | (5 << 3));
    assert_eq!(sf.next_id()?, (42 << 7) | (5 << 3) | 1);
    assert_eq!(
        sf.time_of((42 << 7) | (5 << 3)),
        Some(epoch() + chrono::Duration::milliseconds(42))
    );
    Ok(())
}

#[test]
fn test_new_tick_resets_sequence() -> Result<(), Error> {
    let clock = ManualClock::at_millis(42);
    let mut sf = builder(&clock).machine_id(1).finalize()?;

    sf.next_id()?;
    let last = sf.next_id()?;
    clock.set_millis(43);
    let id = sf.next_id()?;

    let parts = sf.decompose(id);
    assert_eq!(parts.tick, 43);
    assert_eq!(parts.sequence, 0);
    assert!(id > last);
    Ok(())
}

#[test]
fn test_resolution_scales_ticks() -> Result<(), Error> {
    let clock = ManualClock::at_millis(2_500);
    let mut sf = builder(&clock)
        .machine_id(1)
        .resolution(Resolution::Second)
        .finalize()?;

    let id = sf.next_id()?;
    assert_eq!(sf.decompose(id).tick, 2);
    assert_eq!(sf.time_of(id), Some(epoch() + chrono::Duration::seconds(2)));
    Ok(())
}

#[test]
fn test_clock_regression_fails_without_side_effects() -> Result<(), Error> {
    let clock = ManualClock::at_millis(42);
    let mut sf = builder(&clock).machine_id(1).finalize()?;
    sf.next_id()?;
    sf.next_id()?;

    clock.set_millis(41);
    let err = sf.next_id().unwrap_err();
    assert!(matches!(
        err,
        Error::ClockRegression {
            last_tick: 42,
            tick: 41
        }
    ));
    assert_eq!(err.kind(), ErrorKind::ClockRegression);

    // the generator picks up exactly where it left off
    clock.set_millis(42);
    let id = sf.next_id()?;
    let parts = sf.decompose(id);
    assert_eq!(parts.tick, 42);
    assert_eq!(parts.sequence, 2);
    Ok(())
}

#[test]
fn test_clock_before_epoch_is_a_regression() -> Result<(), Error> {
    let clock = ManualClock::at_millis(0);
    let mut sf = builder(&clock).machine_id(1).finalize()?;

    clock.set_millis(-5);
    assert!(matches!(
        sf.next_id(),
        Err(Error::ClockRegression {
            last_tick: -1,
            tick: -5
        })
    ));
    Ok(())
}

#[test]
fn test_exhausted_sequence_fails_fast() -> Result<(), Error> {
    let clock = ManualClock::at_millis(7);
    let mut sf = builder(&clock)
        .machine_id(1)
        .sequence_bits(1)
        .exhaustion(Exhaustion::Fail)
        .finalize()?;

    sf.next_id()?;
    sf.next_id()?;
    let err = sf.next_id().unwrap_err();
    assert!(matches!(err, Error::SequenceExhausted { tick: 7 }));
    assert_eq!(err.kind(), ErrorKind::SequenceExhausted);

    clock.set_millis(8);
    let id = sf.next_id()?;
    let parts = sf.decompose(id);
    assert_eq!((parts.tick, parts.sequence), (8, 0));
    Ok(())
}

#[test]
fn test_exhausted_sequence_waits_for_next_tick() -> Result<(), Error> {
    let clock = ManualClock::at_millis(42);
    clock.advance(chrono::Duration::microseconds(250));
    let mut sf = builder(&clock)
        .machine_id(1)
        .sequence_bits(0)
        .finalize()?;

    let first = sf.next_id()?;
    let second = sf.next_id()?;

    assert_eq!(sf.decompose(first).tick, 42);
    assert_eq!(sf.decompose(second).tick, 43);
    assert_eq!(clock.sleeps.load(Ordering::SeqCst), 1);
    assert_eq!(clock.now(), epoch() + chrono::Duration::milliseconds(43));
    Ok(())
}

#[test]
fn test_spillover_moves_to_next_machine_id() -> Result<(), Error> {
    let clock = ManualClock::at_millis(42);
    let mut sf = builder(&clock)
        .machine_ids([3, 1])
        .machine_id_bits(2)
        .sequence_bits(1)
        .selection(MachineIdSelection::Spillover)
        .exhaustion(Exhaustion::Fail)
        .finalize()?;
    assert_eq!(sf.machine_ids(), &[1, 3]);

    let ids: Vec<u64> = (0..4).map(|_| sf.next_id()).collect::<Result<_, _>>()?;
    let parts: Vec<(u64, u64)> = ids
        .iter()
        .map(|&id| {
            let parts = sf.decompose(id);
            (parts.machine_id, parts.sequence)
        })
        .collect();
    assert_eq!(parts, vec![(1, 0), (1, 1), (3, 0), (3, 1)]);
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(matches!(sf.next_id(), Err(Error::SequenceExhausted { tick: 42 })));

    clock.set_millis(43);
    let id = sf.next_id()?;
    let parts = sf.decompose(id);
    assert_eq!((parts.tick, parts.machine_id, parts.sequence), (43, 1, 0));
    Ok(())
}

#[test]
fn test_round_robin_cycles_machine_ids() -> Result<(), Error> {
    let clock = ManualClock::at_millis(42);
    let mut sf = builder(&clock)
        .machine_ids([1, 2, 3])
        .selection(MachineIdSelection::RoundRobin)
        .finalize()?;

    let mut ids = HashSet::new();
    let mut machine_ids = Vec::new();
    for _ in 0..6 {
        let id = sf.next_id()?;
        assert!(ids.insert(id), "duplicated id: {}", id);
        machine_ids.push(sf.decompose(id).machine_id);
    }
    assert_eq!(machine_ids, vec![1, 2, 3, 1, 2, 3]);
    Ok(())
}

#[test]
fn test_pinned_machine_id() -> Result<(), Error> {
    let clock = ManualClock::at_millis(42);
    let mut sf = builder(&clock)
        .machine_ids([4, 7])
        .selection(MachineIdSelection::Pinned(1))
        .finalize()?;

    for _ in 0..3 {
        let id = sf.next_id()?;
        assert_eq!(sf.decompose(id).machine_id, 7);
    }
    Ok(())
}

#[test]
fn test_over_time_limit() -> Result<(), Error> {
    let clock = ManualClock::at_millis(1);
    let mut sf = builder(&clock)
        .machine_id(1)
        .machine_id_bits(31)
        .sequence_bits(31)
        .finalize()?;
    assert_eq!(sf.layout().timestamp_bits(), 1);

    sf.next_id()?;
    clock.set_millis(2);
    let err = sf.next_id().unwrap_err();
    assert!(matches!(err, Error::OverTimeLimit));
    assert_eq!(err.kind(), ErrorKind::ValueOutOfRange);
    Ok(())
}

#[test]
fn test_builder_errors() {
    let clock = ManualClock::at_millis(0);
    let errors = [
        builder(&clock)
            .machine_id(1)
            .machine_id_bits(40)
            .sequence_bits(23)
            .finalize()
            .err(),
        builder(&clock).finalize().err(),
        builder(&clock).machine_id(4).machine_id_bits(2).finalize().err(),
        builder(&clock).machine_ids([1, 2, 1]).finalize().err(),
        builder(&clock)
            .machine_ids([1, 2])
            .selection(MachineIdSelection::Pinned(2))
            .finalize()
            .err(),
        builder(&clock)
            .epoch(epoch() + chrono::Duration::seconds(1))
            .machine_id(1)
            .finalize()
            .err(),
    ];

    assert!(matches!(errors[0], Some(Error::InvalidBitLength(40, 23))));
    assert!(matches!(errors[1], Some(Error::NoMachineIds)));
    assert!(matches!(
        errors[2],
        Some(Error::MachineIdTooLarge {
            machine_id: 4,
            bits: 2
        })
    ));
    assert!(matches!(errors[3], Some(Error::DuplicateMachineId(1))));
    assert!(matches!(
        errors[4],
        Some(Error::InvalidSelection { index: 2, len: 2 })
    ));
    assert!(matches!(
        errors[5],
        Some(Error::StartTimeAheadOfCurrentTime(_))
    ));
    for err in errors.iter().flatten() {
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }
}

#[test]
fn test_zero_machine_bits_accepts_only_zero() -> Result<(), Error> {
    let clock = ManualClock::at_millis(0);
    assert!(builder(&clock)
        .machine_id(0)
        .machine_id_bits(0)
        .finalize()
        .is_ok());
    assert!(matches!(
        builder(&clock).machine_id(1).machine_id_bits(0).finalize(),
        Err(Error::MachineIdTooLarge { .. })
    ));
    Ok(())
}

#[test]
fn test_run_for_100ms() -> Result<(), Error> {
    let expected_machine_id = 15u64;
    let mut sf = Generator::builder()
        .epoch(Utc::now())
        .machine_id(expected_machine_id)
        .finalize()?;

    let mut last_id = None;
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(100) {
        let id = sf.next_id()?;
        if let Some(last_id) = last_id {
            assert!(id > last_id, "duplicated id (id: {}, last_id: {})", id, last_id);
        }
        last_id = Some(id);

        let parts = sf.decompose(id);
        assert_eq!(
            parts.machine_id, expected_machine_id,
            "unexpected machine id: {}",
            parts.machine_id
        );
    }
    Ok(())
}

#[test]
fn test_threads_uniqueness() -> Result<(), Error> {
    let sf = ConcurrentGenerator::new(
        Generator::builder()
            .machine_id(1)
            .sequence_bits(8)
            .finalize()?,
    );
    let ids = Arc::new(Mutex::new(HashSet::new()));
    let mut children = Vec::new();
    let num_threads = 10;
    let ids_per_thread = 10_000;

    for _ in 0..num_threads {
        let thread_sf = sf.clone();
        let thread_ids = Arc::clone(&ids);
        children.push(thread::spawn(move || {
            let mut local_ids = Vec::with_capacity(ids_per_thread);
            for _ in 0..ids_per_thread {
                local_ids.push(thread_sf.next_id().unwrap());
            }
            assert!(
                local_ids.windows(2).all(|pair| pair[0] < pair[1]),
                "ids observed by one thread must increase"
            );
            let mut ids_lock = thread_ids.lock().unwrap();
            for id in local_ids {
                assert!(ids_lock.insert(id), "Duplicate ID detected: {}", id);
            }
        }));
    }

    for child in children {
        child.join().expect("Child thread panicked");
    }

    let final_count = ids.lock().unwrap().len();
    assert_eq!(final_count, num_threads * ids_per_thread);
    Ok(())
}

#[test]
fn test_concurrent_generator_propagates_errors() -> Result<(), Error> {
    let clock = ManualClock::at_millis(42);
    let sf = builder(&clock).machine_id(1).finalize()?.into_concurrent();
    let other = sf.clone();

    let id = sf.next_id()?;
    assert_eq!(other.decompose(other.next_id()?).sequence, 1);

    clock.set_millis(40);
    assert!(matches!(
        other.next_id(),
        Err(Error::ClockRegression {
            last_tick: 42,
            tick: 40
        })
    ));
    assert_eq!(sf.decompose(id).tick, 42);
    Ok(())
}

/// Records `module::name` of every span opened while it is the default subscriber.
#[cfg(feature = "tracing")]
#[derive(Default)]
struct SpanRecorder {
    spans: Arc<Mutex<Vec<String>>>,
    next_span: std::sync::atomic::AtomicU64,
}

#[cfg(feature = "tracing")]
impl tracing::Subscriber for SpanRecorder {
    fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
        true
    }

    fn new_span(&self, span: &tracing::span::Attributes<'_>) -> tracing::span::Id {
        let metadata = span.metadata();
        self.spans.lock().unwrap().push(format!(
            "{}::{}",
            metadata.module_path().unwrap_or_default(),
            metadata.name()
        ));
        tracing::span::Id::from_u64(self.next_span.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}

    fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}

    fn event(&self, _: &tracing::Event<'_>) {}

    fn enter(&self, _: &tracing::span::Id) {}

    fn exit(&self, _: &tracing::span::Id) {}
}

#[test]
#[cfg(feature = "tracing")]
fn test_concurrent_next_id_is_instrumented() -> Result<(), Error> {
    let clock = ManualClock::at_millis(42);
    let sf = builder(&clock).machine_id(1).finalize()?.into_concurrent();

    let recorder = SpanRecorder::default();
    let spans = Arc::clone(&recorder.spans);
    tracing::subscriber::with_default(recorder, || sf.next_id())?;

    let spans = spans.lock().unwrap();
    for expected in [
        "wordflake::concurrent::next_id",
        "wordflake::generator::next_id",
    ] {
        assert!(spans.iter().any(|span| span == expected), "{spans:?}");
    }
    Ok(())
}

#[test]
fn test_error_send_sync() {
    // This test ensures the Error type is Send + Sync
    let err = Error::NoMachineIds;
    thread::spawn(move || {
        let _ = err;
    })
    .join()
    .unwrap();
}

// --- Performance Benchmarks ---
// These tests are ignored by default. Run with `cargo test -- --ignored`.

#[test]
#[ignore]
fn bench_multi_thread_throughput() -> Result<(), Error> {
    let sf = Generator::new(1)?.into_concurrent();
    let num_threads = thread::available_parallelism().map_or(2, |n| n.get().max(2));
    let ids_per_thread = 1_000_000 / num_threads;
    let total_ids = num_threads * ids_per_thread;

    let start = Instant::now();
    let mut handles = vec![];

    for _ in 0..num_threads {
        let sf_clone = sf.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..ids_per_thread {
                let _ = sf_clone.next_id().unwrap();
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let duration = start.elapsed();
    let rate = total_ids as f64 / duration.as_secs_f64();

    println!("\n--- Multi-Thread Benchmark ---");
    println!("Threads: {}", num_threads);
    println!(
        "Generated {} IDs in {:?}. Throughput: {:.2} IDs/sec",
        total_ids, duration, rate
    );
    println!("----------------------------\n");

    Ok(())
}
