//! Coordinator task.
//!
//! Moves the orchestrator onto one Tokio task that serializes transition
//! requests and drives the tick loop, so listener callbacks and fetch
//! completions are only ever processed on that task.

use std::time::Duration;

use ageshift_core::error::DomainError;
use ageshift_core::generation::Generation;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::orchestrator::TransitionOrchestrator;
use crate::state::AgeState;

type Reply = oneshot::Sender<Result<Generation, DomainError>>;

#[derive(Debug)]
enum Command {
    Transition {
        index: usize,
        play_cutscene: bool,
        reply: Reply,
    },
    Resume {
        reply: Reply,
    },
}

/// Cloneable handle to a running coordinator.
#[derive(Debug, Clone)]
pub struct CoordinatorHandle {
    commands: mpsc::Sender<Command>,
    state: AgeState,
}

/// Spawns the coordinator task, ticking every `tick`.
///
/// The task stops once every handle has been dropped.
///
/// # Panics
///
/// Panics if called outside a Tokio runtime or if `tick` is zero.
#[must_use]
pub fn spawn_coordinator(
    orchestrator: TransitionOrchestrator,
    tick: Duration,
) -> CoordinatorHandle {
    let (commands, receiver) = mpsc::channel(32);
    let state = orchestrator.state();
    tokio::spawn(run(orchestrator, receiver, tick));
    CoordinatorHandle { commands, state }
}

async fn run(
    orchestrator: TransitionOrchestrator,
    mut commands: mpsc::Receiver<Command>,
    tick: Duration,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();
    info!(tick_ms = tick.as_millis(), "coordinator started");

    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                match command {
                    Command::Transition { index, play_cutscene, reply } => {
                        let result = orchestrator.request_transition(index, play_cutscene).await;
                        let _ = reply.send(result);
                    }
                    Command::Resume { reply } => {
                        let _ = reply.send(orchestrator.resume().await);
                    }
                }
            }
            now = interval.tick() => {
                orchestrator.tick(now.duration_since(last_tick));
                last_tick = now;
            }
        }
    }
    debug!("coordinator stopped");
}

impl CoordinatorHandle {
    /// Reader over the current age.
    #[must_use]
    pub fn state(&self) -> &AgeState {
        &self.state
    }

    async fn send(
        &self,
        command: Command,
        reply: oneshot::Receiver<Result<Generation, DomainError>>,
    ) -> Result<Generation, DomainError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| DomainError::Infrastructure("coordinator stopped".into()))?;
        reply
            .await
            .map_err(|_| DomainError::Infrastructure("coordinator dropped the request".into()))?
    }

    /// Requests a transition on the coordinator task.
    ///
    /// # Errors
    ///
    /// Returns the orchestrator's error, or `DomainError::Infrastructure` if
    /// the coordinator has stopped.
    pub async fn request_transition(
        &self,
        index: usize,
        play_cutscene: bool,
    ) -> Result<Generation, DomainError> {
        let (reply, receiver) = oneshot::channel();
        self.send(
            Command::Transition {
                index,
                play_cutscene,
                reply,
            },
            receiver,
        )
        .await
    }

    /// Resumes from saved progress on the coordinator task.
    ///
    /// # Errors
    ///
    /// Returns the orchestrator's error, or `DomainError::Infrastructure` if
    /// the coordinator has stopped.
    pub async fn resume(&self) -> Result<Generation, DomainError> {
        let (reply, receiver) = oneshot::channel();
        self.send(Command::Resume { reply }, receiver).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use ageshift_core::listener::Tick;
    use ageshift_test_support::{RecordingListener, sample_age_set};

    #[derive(Default)]
    struct TickCounter(Mutex<u32>);

    impl Tick for TickCounter {
        fn tick(&self, _dt: Duration) {
            *self.0.lock().unwrap() += 1;
        }
    }

    #[tokio::test]
    async fn test_requests_are_applied_in_order() {
        // Arrange
        let orchestrator = TransitionOrchestrator::new(sample_age_set()).unwrap();
        let listener = Arc::new(RecordingListener::new());
        orchestrator.register(listener.clone());
        let handle = spawn_coordinator(orchestrator, Duration::from_millis(5));

        // Act
        let first = handle.request_transition(1, false).await.unwrap();
        let second = handle.request_transition(2, false).await.unwrap();

        // Assert
        assert_eq!(first, Generation::new(1));
        assert_eq!(second, Generation::new(2));
        assert_eq!(handle.state().current_age().age_years, 21);
        assert_eq!(listener.generations(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_errors_are_returned_to_the_caller() {
        let orchestrator = TransitionOrchestrator::new(sample_age_set()).unwrap();
        let handle = spawn_coordinator(orchestrator, Duration::from_millis(5));

        let result = handle.request_transition(7, false).await;

        assert!(matches!(result, Err(DomainError::OutOfRange { index: 7, .. })));
        assert_eq!(handle.state().current_generation(), Generation::INITIAL);
    }

    #[tokio::test]
    async fn test_tick_participants_are_driven_by_the_interval() {
        let mut orchestrator = TransitionOrchestrator::new(sample_age_set()).unwrap();
        let counter = Arc::new(TickCounter::default());
        orchestrator.register_tick(counter.clone());
        let _handle = spawn_coordinator(orchestrator, Duration::from_millis(1));

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(*counter.0.lock().unwrap() >= 2);
    }
}
