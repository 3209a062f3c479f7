use mentex_core::BoundaryEvent;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("marker sink rejected '{label}': {reason}")]
pub struct MarkerSendError {
    pub label: &'static str,
    pub reason: String,
}

/// Push-only receiver for the marker stream: short string labels at an
/// irregular rate, no acknowledgement. An LSL outlet, a log, a test buffer.
pub trait MarkerSink {
    fn push(&mut self, label: &'static str) -> Result<(), MarkerSendError>;
}

/// Forwards boundary events to the sink in production order, never
/// reordering, deduplicating, or dropping one. A failed send is logged and
/// counted; the session timeline does not depend on marker delivery.
pub struct MarkerRelay<S: MarkerSink> {
    sink: S,
    forwarded: usize,
    failed: usize,
}

impl<S: MarkerSink> MarkerRelay<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            forwarded: 0,
            failed: 0,
        }
    }

    pub fn forward(&mut self, event: BoundaryEvent) {
        let label = event.kind.label();
        match self.sink.push(label) {
            Ok(()) => self.forwarded += 1,
            Err(err) => {
                self.failed += 1;
                tracing::warn!(
                    %err,
                    timestamp_ns = event.timestamp_ns,
                    "marker delivery failed; continuing"
                );
            }
        }
    }

    pub fn forwarded(&self) -> usize {
        self.forwarded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mentex_core::BoundaryKind;

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

    struct RejectingSink;

    impl MarkerSink for RejectingSink {
        fn push(&mut self, label: &'static str) -> Result<(), MarkerSendError> {
            Err(MarkerSendError {
                label,
                reason: "stream closed".into(),
            })
        }
    }

    fn event(kind: BoundaryKind, timestamp_ns: u64) -> BoundaryEvent {
        BoundaryEvent { kind, timestamp_ns }
    }

    #[test]
    fn forwards_in_production_order() {
        let mut relay = MarkerRelay::new(RecordingSink::default());
        relay.forward(event(BoundaryKind::FocusStart, 10));
        relay.forward(event(BoundaryKind::FocusEnd, 20));
        relay.forward(event(BoundaryKind::RelaxationStart, 30));

        assert_eq!(relay.forwarded(), 3);
        assert_eq!(relay.failed(), 0);
        assert_eq!(
            relay.into_sink().labels,
            vec!["focus_start", "focus_end", "relaxation_start"]
        );
    }

    #[test]
    fn delivery_failure_is_counted_not_propagated() {
        let mut relay = MarkerRelay::new(RejectingSink);
        relay.forward(event(BoundaryKind::RelaxationEnd, 40));
        relay.forward(event(BoundaryKind::FocusStart, 50));

        assert_eq!(relay.forwarded(), 0);
        assert_eq!(relay.failed(), 2);
    }
}
