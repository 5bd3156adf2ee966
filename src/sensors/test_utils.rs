use crate::core::{CommandRunner, SensorSource, Temperature};
use crate::sensors::SourceError;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Shared view of how many times a [`ScriptedSource`] was attempted.
#[derive(Debug, Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
enum Behavior {
    Reading(f64),
    Fail,
    Hang(Duration),
}

/// Sensor source with a fixed behavior and call counting.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    name: String,
    timeout: Duration,
    behavior: Behavior,
    calls: CallCounter,
}

impl ScriptedSource {
    fn with_behavior(name: &str, behavior: Behavior) -> Self {
        Self {
            name: name.to_string(),
            timeout: Duration::from_millis(2000),
            behavior,
            calls: CallCounter::default(),
        }
    }

    /// Reports `celsius`, subject to the usual validity window.
    pub fn reading(name: &str, celsius: f64) -> Self {
        Self::with_behavior(name, Behavior::Reading(celsius))
    }

    /// Always fails as if the backing process could not run.
    pub fn failing(name: &str) -> Self {
        Self::with_behavior(name, Behavior::Fail)
    }

    /// Sleeps for `delay` before reporting nothing. With a 2s budget and a
    /// longer delay this exercises the resolver timeout.
    pub fn hanging(name: &str, delay: Duration) -> Self {
        Self::with_behavior(name, Behavior::Hang(delay))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl SensorSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt(&self, _budget: Duration) -> Result<Temperature, SourceError> {
        self.calls.0.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            Behavior::Reading(celsius) => {
                Temperature::new(*celsius).ok_or(SourceError::OutOfRange(*celsius))
            }
            Behavior::Fail => Err(SourceError::Failed {
                program: self.name.clone(),
                status: "exit code: 1".to_string(),
            }),
            Behavior::Hang(delay) => {
                tokio::time::sleep(*delay).await;
                Err(SourceError::NotFound)
            }
        }
    }
}

#[derive(Debug, Clone)]
enum FakeResponse {
    Stdout(String),
    Failure(String),
    Hang(Duration),
}

/// Fake command runner for testing sources without spawning processes.
///
/// The timeout argument is ignored; a queued hang sleeps for its full delay.
#[derive(Default)]
pub struct FakeCommandRunner {
    // A queue of responses per program. The front of the queue is the next response.
    responses: Mutex<HashMap<String, VecDeque<FakeResponse>>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, program: &str, response: FakeResponse) {
        self.responses
            .lock()
            .unwrap()
            .entry(program.to_string())
            .or_default()
            .push_back(response);
    }

    /// Queue a successful stdout for `program`.
    pub fn add_success(&self, program: &str, stdout: &str) {
        self.push(program, FakeResponse::Stdout(stdout.to_string()));
    }

    /// Queue a failed run for `program`.
    pub fn add_failure(&self, program: &str, status: &str) {
        self.push(program, FakeResponse::Failure(status.to_string()));
    }

    /// Queue a run of `program` that never finishes within `delay`.
    pub fn add_hang(&self, program: &str, delay: Duration) {
        self.push(program, FakeResponse::Hang(delay));
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn get_call_count(&self, program: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == program)
            .count()
    }
}

#[async_trait]
impl CommandRunner for FakeCommandRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        _timeout: Duration,
    ) -> Result<String, SourceError> {
        self.calls
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));

        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(program)
            .and_then(|queue| queue.pop_front());

        match next {
            Some(FakeResponse::Stdout(stdout)) => Ok(stdout),
            Some(FakeResponse::Failure(status)) => Err(SourceError::Failed {
                program: program.to_string(),
                status,
            }),
            Some(FakeResponse::Hang(delay)) => {
                tokio::time::sleep(delay).await;
                Err(SourceError::Timeout(delay))
            }
            None => Err(SourceError::Io {
                program: program.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
            }),
        }
    }
}
