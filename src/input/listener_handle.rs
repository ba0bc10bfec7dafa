//! Listener Handle - runs an [`InputListenerManager`] in its own tokio task
//!
//! The task owns the manager and a [`DelayQueueScheduler`]; commands arrive over an mpsc
//! channel and timers are polled in the same `select!` loop, so all state changes happen
//! on one task. Device snapshots and the listening status are published through watch
//! channels and can be read without a round trip.

use crate::config::EmulatorSettings;
use crate::gamepad::clock::TokioClock;
use crate::gamepad::device::GamepadSnapshot;
use crate::input::event::{EventDisposition, InputEvent, ListeningStatus};
use crate::input::listener::InputListenerManager;
use crate::input::scheduler::DelayQueueScheduler;
use crate::mapping::binding::GamepadConfig;
use crate::mapping::compiler::InvalidBinding;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

const COMMAND_BUFFER: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    /// Listener task is gone or dropped the reply
    #[error("Channel error: {0}")]
    ChannelError(String),

    #[error("Thread error: {0}")]
    ThreadError(String),
}

#[derive(Debug)]
enum ListenerCommand {
    Enable {
        config: Box<GamepadConfig>,
        reply: oneshot::Sender<Vec<InvalidBinding>>,
    },
    Disable {
        reply: oneshot::Sender<()>,
    },
    Dispatch {
        event: InputEvent,
        reply: oneshot::Sender<EventDisposition>,
    },
}

#[derive(Debug)]
pub struct ListenerHandle {
    commands: mpsc::Sender<ListenerCommand>,
    status: watch::Receiver<ListeningStatus>,
    gamepad: watch::Receiver<GamepadSnapshot>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task_handle: Option<JoinHandle<()>>,
}

impl ListenerHandle {
    /// Spawns the listener task; must be called from within a tokio runtime
    pub fn spawn(settings: EmulatorSettings) -> Self {
        info!("Spawning input listener task");
        let manager = InputListenerManager::new(
            settings,
            DelayQueueScheduler::new(),
            Arc::new(TokioClock::new()),
        );
        let status = manager.subscribe_status();
        let gamepad = manager.subscribe_gamepad();

        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let task_handle = tokio::spawn(run_listener(manager, command_rx, shutdown_rx));

        Self {
            commands,
            status,
            gamepad,
            shutdown_tx: Some(shutdown_tx),
            task_handle: Some(task_handle),
        }
    }

    /// Applies `config`, replacing any active one; returns the dropped conflicting bindings
    pub async fn enable(&self, config: GamepadConfig) -> Result<Vec<InvalidBinding>, HandleError> {
        let (reply, response) = oneshot::channel();
        self.send(ListenerCommand::Enable {
            config: Box::new(config),
            reply,
        })
        .await?;
        receive(response).await
    }

    pub async fn disable(&self) -> Result<(), HandleError> {
        let (reply, response) = oneshot::channel();
        self.send(ListenerCommand::Disable { reply }).await?;
        receive(response).await
    }

    /// Hands one host event to the listener and waits for its disposition
    pub async fn dispatch(&self, event: InputEvent) -> Result<EventDisposition, HandleError> {
        let (reply, response) = oneshot::channel();
        self.send(ListenerCommand::Dispatch { event, reply }).await?;
        receive(response).await
    }

    pub fn status(&self) -> ListeningStatus {
        *self.status.borrow()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ListeningStatus> {
        self.status.clone()
    }

    /// Receiver for device snapshots, e.g. for [`GamepadNavigator::install`](crate::gamepad::GamepadNavigator::install)
    pub fn gamepad(&self) -> watch::Receiver<GamepadSnapshot> {
        self.gamepad.clone()
    }

    pub fn snapshot(&self) -> GamepadSnapshot {
        self.gamepad.borrow().clone()
    }

    /// Disables the listener and waits for the task to finish
    pub async fn shutdown(&mut self) -> Result<(), HandleError> {
        debug!("Sending shutdown signal to input listener");
        if let Some(tx) = self.shutdown_tx.take() {
            if tx.send(()).is_err() {
                warn!("Input listener task already terminated");
            }
        }

        match self.task_handle.take() {
            Some(handle) => handle.await.map_err(|e| {
                error!("Input listener task panicked: {}", e);
                HandleError::ThreadError(format!("Input listener task panicked: {}", e))
            }),
            None => {
                debug!("Input listener already shut down");
                Ok(())
            }
        }
    }

    async fn send(&self, command: ListenerCommand) -> Result<(), HandleError> {
        self.commands.send(command).await.map_err(|e| {
            error!("Failed to send command to input listener: {}", e);
            HandleError::ChannelError(format!("Failed to send command: {}", e))
        })
    }
}

async fn receive<T>(response: oneshot::Receiver<T>) -> Result<T, HandleError> {
    response
        .await
        .map_err(|e| HandleError::ChannelError(format!("Input listener dropped reply: {}", e)))
}

async fn run_listener(
    mut manager: InputListenerManager<DelayQueueScheduler>,
    mut commands: mpsc::Receiver<ListenerCommand>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    debug!("Input listener task started");

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                info!("Shutdown signal received for input listener");
                break;
            }

            command = commands.recv() => match command {
                Some(command) => execute(&mut manager, command),
                None => {
                    warn!("All listener handles dropped");
                    break;
                }
            },

            // an empty queue yields None and disables this branch until the next iteration
            Some((id, timer)) = std::future::poll_fn(|cx| manager.scheduler_mut().poll_expired(cx)) => {
                manager.on_timer(id, timer);
            }
        }
    }

    manager.disable();
    info!("Input listener task terminated");
}

fn execute(manager: &mut InputListenerManager<DelayQueueScheduler>, command: ListenerCommand) {
    match command {
        ListenerCommand::Enable { config, reply } => {
            let invalid = manager.enable(&config);
            if reply.send(invalid).is_err() {
                debug!("Enable caller went away before the reply");
            }
        }
        ListenerCommand::Disable { reply } => {
            manager.disable();
            let _ = reply.send(());
        }
        ListenerCommand::Dispatch { event, reply } => {
            let disposition = manager.handle_event(event);
            let _ = reply.send(disposition);
        }
    }
}
