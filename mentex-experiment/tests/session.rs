//! End-to-end session: generate, tick at the target cadence, relay markers.

use mentex_core::SessionPhase;
use mentex_experiment::{
    generate, schedule_rng, separator_rng, MarkerRelay, MarkerSendError, MarkerSink, SessionConfig,
    SessionEngine, MAX_RUN,
};

const MS: u64 = 1_000_000;
const TICK_MS: u64 = 50;

#[derive(Default)]
struct RecordingSink {
    labels: Vec<&'static str>,
}

impl MarkerSink for RecordingSink {
    fn push(&mut self, label: &'static str) -> Result<(), MarkerSendError> {
        self.labels.push(label);
        Ok(())
    }
}

struct DeadSink;

impl MarkerSink for DeadSink {
    fn push(&mut self, label: &'static str) -> Result<(), MarkerSendError> {
        Err(MarkerSendError {
            label,
            reason: "no consumer".into(),
        })
    }
}

fn run_session<S: MarkerSink>(
    config: &SessionConfig,
    sink: S,
) -> (SessionPhase, MarkerRelay<S>, Vec<&'static str>) {
    let mut rng = schedule_rng(config.seed);
    let schedule = generate(config.trials_per_class, MAX_RUN, &mut rng).unwrap();
    let expected: Vec<&'static str> = schedule
        .iter()
        .flat_map(|class| {
            [
                mentex_core::BoundaryKind::start_of(class).label(),
                mentex_core::BoundaryKind::end_of(class).label(),
            ]
        })
        .collect();

    let mut engine = SessionEngine::new(config, schedule, separator_rng(config.seed));
    let mut relay = MarkerRelay::new(sink);

    let mut now_ms = 0;
    while !engine.phase().is_terminal() {
        let result = engine.tick(now_ms * MS).unwrap();
        if let Some(event) = result.boundary {
            relay.forward(event);
        }
        now_ms += TICK_MS;
    }

    (engine.phase(), relay, expected)
}

#[test]
fn full_session_streams_every_marker_in_schedule_order() {
    let config = SessionConfig {
        seed: Some(2024),
        ..SessionConfig::default()
    };

    let (phase, relay, expected) = run_session(&config, RecordingSink::default());

    assert_eq!(phase, SessionPhase::Completed);
    assert_eq!(relay.forwarded(), 200);
    assert_eq!(relay.failed(), 0);
    assert_eq!(relay.sink().labels, expected);
}

#[test]
fn dead_sink_does_not_stop_the_session() {
    let config = SessionConfig {
        seed: Some(2024),
        trials_per_class: 5,
        initial_fixation_ms: 500,
        active_ms: 500,
        inter_trial_range_ms: (250, 250),
    };

    let (phase, relay, expected) = run_session(&config, DeadSink);

    assert_eq!(phase, SessionPhase::Completed);
    assert_eq!(relay.forwarded(), 0);
    assert_eq!(relay.failed(), expected.len());
}
