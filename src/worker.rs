//! Dedicated worker that owns a rig and serializes every call made on it.
//!
//! Vendor acquisition calls block for up to the acquisition timeout, so the
//! rig lives on a blocking task and async callers talk to it over a command
//! channel.

use crate::error::{Result, StereoError};
use crate::frame::StereoFrame;
use crate::rig::{RigState, StereoRig};
use crate::sdk::CameraSdk;
use crate::stats::RigHealth;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const COMMAND_QUEUE_CAPACITY: usize = 16;

type Reply<T> = oneshot::Sender<Result<T>>;

/// Requests handled by the worker task
#[derive(Debug)]
enum RigCommand {
    Initialize { response: Reply<()> },
    StartGrabbing { response: Reply<()> },
    StopGrabbing { response: Reply<()> },
    TriggerSoftware { response: Reply<()> },
    Capture { response: Reply<StereoFrame> },
    Status { slot: usize, response: Reply<(f32, u32)> },
    Health { response: Reply<RigHealth> },
    ConfigureForStage { stage: String, response: Reply<()> },
    FrameBufferSize { response: Reply<usize> },
    State { response: Reply<RigState> },
    Release { response: Reply<()> },
    Shutdown { response: oneshot::Sender<()> },
}

/// Async front end to a [`StereoRig`] running on its own blocking task
pub struct RigWorker {
    sender: mpsc::Sender<RigCommand>,
    task: Option<JoinHandle<()>>,
}

impl RigWorker {
    /// Move the rig onto a blocking task; must be called inside a tokio runtime
    pub fn spawn<S>(rig: StereoRig<S>) -> Self
    where
        S: CameraSdk + 'static,
    {
        let (sender, receiver) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let task = tokio::task::spawn_blocking(move || run(rig, receiver));
        info!("Rig worker started");
        Self {
            sender,
            task: Some(task),
        }
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> RigCommand) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| StereoError::worker("rig worker has stopped"))?;
        rx.await
            .map_err(|_| StereoError::worker("rig worker dropped the request"))?
    }

    pub async fn initialize(&self) -> Result<()> {
        self.request(|response| RigCommand::Initialize { response }).await
    }

    pub async fn start_grabbing(&self) -> Result<()> {
        self.request(|response| RigCommand::StartGrabbing { response }).await
    }

    pub async fn stop_grabbing(&self) -> Result<()> {
        self.request(|response| RigCommand::StopGrabbing { response }).await
    }

    pub async fn trigger_software(&self) -> Result<()> {
        self.request(|response| RigCommand::TriggerSoftware { response }).await
    }

    pub async fn capture(&self) -> Result<StereoFrame> {
        self.request(|response| RigCommand::Capture { response }).await
    }

    pub async fn status(&self, slot: usize) -> Result<(f32, u32)> {
        self.request(|response| RigCommand::Status { slot, response }).await
    }

    pub async fn health(&self) -> Result<RigHealth> {
        self.request(|response| RigCommand::Health { response }).await
    }

    pub async fn configure_for_stage(&self, stage: &str) -> Result<()> {
        let stage = stage.to_string();
        self.request(|response| RigCommand::ConfigureForStage { stage, response })
            .await
    }

    pub async fn frame_buffer_size(&self) -> Result<usize> {
        self.request(|response| RigCommand::FrameBufferSize { response }).await
    }

    pub async fn state(&self) -> Result<RigState> {
        self.request(|response| RigCommand::State { response }).await
    }

    pub async fn release(&self) -> Result<()> {
        self.request(|response| RigCommand::Release { response }).await
    }

    /// Release the rig and wait for the worker task to finish
    pub async fn shutdown(mut self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(RigCommand::Shutdown { response: tx }).await.is_ok() {
            let _ = rx.await;
        }
        if let Some(task) = self.task.take() {
            task.await
                .map_err(|e| StereoError::worker(format!("rig worker panicked: {}", e)))?;
        }
        info!("Rig worker stopped");
        Ok(())
    }
}

fn run<S: CameraSdk>(mut rig: StereoRig<S>, mut receiver: mpsc::Receiver<RigCommand>) {
    debug!("Rig worker loop running");

    while let Some(command) = receiver.blocking_recv() {
        match command {
            RigCommand::Initialize { response } => {
                let _ = response.send(rig.initialize());
            }
            RigCommand::StartGrabbing { response } => {
                let _ = response.send(rig.start_grabbing());
            }
            RigCommand::StopGrabbing { response } => {
                let _ = response.send(rig.stop_grabbing());
            }
            RigCommand::TriggerSoftware { response } => {
                let _ = response.send(rig.trigger_software());
            }
            RigCommand::Capture { response } => {
                let _ = response.send(rig.capture_stereo_frame());
            }
            RigCommand::Status { slot, response } => {
                let _ = response.send(rig.get_status(slot));
            }
            RigCommand::Health { response } => {
                let _ = response.send(Ok(rig.health()));
            }
            RigCommand::ConfigureForStage { stage, response } => {
                let _ = response.send(rig.configure_for_stage(&stage));
            }
            RigCommand::FrameBufferSize { response } => {
                let _ = response.send(Ok(rig.frame_buffer_size()));
            }
            RigCommand::State { response } => {
                let _ = response.send(Ok(rig.state()));
            }
            RigCommand::Release { response } => {
                let _ = response.send(rig.release());
            }
            RigCommand::Shutdown { response } => {
                if let Err(e) = rig.release() {
                    warn!("Release during worker shutdown failed: {}", e);
                }
                let _ = response.send(());
                break;
            }
        }
    }

    debug!("Rig worker loop exiting");
}
