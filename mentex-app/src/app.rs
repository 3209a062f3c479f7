use anyhow::Result;
use mentex_core::{SessionPhase, TrialClass};
use mentex_experiment::{
    generate, schedule_rng, separator_rng, MarkerRelay, MarkerSendError, MarkerSink, SessionConfig,
    SessionEngine, MAX_RUN,
};
use mentex_timing::{CadenceMonitor, Clock, MonotonicClock};
use rand::Rng;
use rand::rngs::{StdRng, ThreadRng};
use std::io::{BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

// ~60 Hz presentation loop; markers may coalesce past 50 ms between ticks
const FRAME_INTERVAL: Duration = Duration::from_millis(16);
const CADENCE_LIMIT: Duration = Duration::from_millis(50);

/// Echoes each marker so a dry run without an acquisition rig still shows
/// the stream. A real recording setup replaces this with its outlet.
pub struct ConsoleMarkerSink;

impl MarkerSink for ConsoleMarkerSink {
    fn push(&mut self, label: &'static str) -> Result<(), MarkerSendError> {
        println!("  [marker] {label}");
        Ok(())
    }
}

pub struct App {
    engine: SessionEngine<StdRng>,
    clock: MonotonicClock,
    relay: MarkerRelay<ConsoleMarkerSink>,
    cadence: CadenceMonitor,
    prompt_rng: ThreadRng,
    abort: Arc<AtomicBool>,
    last_phase: Option<SessionPhase>,
    nominal_total_ms: u64,
}

impl App {
    pub fn new(config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = schedule_rng(config.seed);
        let schedule = generate(config.trials_per_class, MAX_RUN, &mut rng)?;
        let engine = SessionEngine::new(&config, schedule, separator_rng(config.seed));

        Ok(Self {
            engine,
            clock: MonotonicClock::new(),
            relay: MarkerRelay::new(ConsoleMarkerSink),
            cadence: CadenceMonitor::new(1000),
            prompt_rng: rand::rng(),
            abort: Arc::new(AtomicBool::new(false)),
            last_phase: None,
            nominal_total_ms: config.nominal_total_ms(),
        })
    }

    pub fn run(mut self) -> Result<()> {
        self.show_welcome();
        wait_for_enter()?;
        spawn_abort_watcher(self.abort.clone());

        loop {
            let now_ns = self.clock.now_ns();
            if let Some(interval) = self.cadence.record_tick(now_ns) {
                if interval > CADENCE_LIMIT {
                    tracing::warn!(
                        interval_ms = interval.as_secs_f64() * 1e3,
                        "tick interval exceeded the 50 ms cadence target"
                    );
                }
            }

            let result = self.engine.tick(now_ns)?;
            if let Some(event) = result.boundary {
                self.relay.forward(event);
            }
            if self.last_phase != Some(result.phase) {
                self.render(result.phase);
                self.last_phase = Some(result.phase);
            }
            if result.phase.is_terminal() {
                break;
            }

            if self.abort.load(Ordering::Relaxed) {
                // the next tick reports Aborted and the loop exits
                self.engine.abort();
            }

            self.clock.sleep(FRAME_INTERVAL);
        }

        self.show_summary();
        Ok(())
    }

    fn show_welcome(&self) {
        let trials = self.engine.schedule().len();
        println!("{}", "=".repeat(60));
        println!("  Mental-state session: {trials} trials");
        println!("  Nominal length: {:.0} s", self.nominal_total_ms as f64 / 1e3);
        println!("{}", "=".repeat(60));
        println!();
        println!("On each trial you will either:");
        println!("  - FOCUS: subtract a number repeatedly in your mind");
        println!("  - RELAX: close your eyes and let your mind rest");
        println!();
        println!("A fixation cross (+) separates trials.");
        println!("Once running, press ENTER at any time to end the session early.");
        println!();
        print!("Press ENTER to begin...");
        let _ = std::io::stdout().flush();
    }

    fn render(&mut self, phase: SessionPhase) {
        match phase {
            SessionPhase::InitialFixation | SessionPhase::InterTrialFixation { .. } => {
                println!("\n        +\n");
            }
            SessionPhase::ActiveTrial { class, .. } => {
                let (current, total) = self.engine.trial_progress().unwrap_or((0, 0));
                match class {
                    TrialClass::Focus => {
                        let start: u32 = self.prompt_rng.random_range(500..=999);
                        println!(
                            "[Trial {current:3}/{total}]  FOCUS: starting from {start}, \
                             keep subtracting 7 in your mind"
                        );
                    }
                    TrialClass::Relaxation => {
                        println!(
                            "[Trial {current:3}/{total}]  RELAX: close your eyes and let \
                             your mind rest"
                        );
                    }
                }
            }
            SessionPhase::Completed => {
                println!("\nSession complete. Thank you for participating.");
            }
            SessionPhase::Aborted => {
                println!("\nSession ended early.");
            }
        }
    }

    fn show_summary(&self) {
        let stats = self.cadence.stats();
        println!(
            "\nMarkers forwarded: {} ({} delivery failures)",
            self.relay.forwarded(),
            self.relay.failed()
        );
        println!(
            "Cadence: {:.3} ms/tick, {:.1} Hz, jitter {:.3} ms, worst {:.3} ms",
            stats.average_tick_ns / 1e6,
            stats.effective_hz,
            stats.jitter_ns / 1e6,
            stats.max_tick_ns / 1e6,
        );
    }
}

fn wait_for_enter() -> Result<()> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

/// Any input line (or closed stdin) after the session starts requests an
/// abort; the loop observes the flag once per frame.
fn spawn_abort_watcher(flag: Arc<AtomicBool>) {
    std::thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
        flag.store(true, Ordering::Relaxed);
    });
}
