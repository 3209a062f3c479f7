pub mod config;
pub mod marker;
pub mod rng;
pub mod schedule;
pub mod state;

pub use config::{ConfigError, SessionConfig, MAX_RUN};
pub use marker::{MarkerRelay, MarkerSendError, MarkerSink};
pub use rng::{schedule_rng, separator_rng};
pub use schedule::{generate, ScheduleError, MAX_ATTEMPTS};
pub use state::{SessionEngine, TickResult, TimelineError};
