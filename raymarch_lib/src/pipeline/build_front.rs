use std::{sync::Arc, thread::JoinHandle};

use crossbeam::channel::{Receiver, Sender};
use log::{debug, warn};

use crate::{
    common::CancelToken,
    error::BuildError,
    slice::EncodedSlice,
    texture::{VolumeSlot, VolumeTexture},
};

use super::{BuildReport, VolumePipeline};

pub type BuildResult = Result<BuildReport, BuildError>;

/// Messages to build worker
///
/// Messages queue up and one is read after a build is done
pub enum BuildMessage {
    /// Build and publish a new volume
    Rebuild {
        slices: Vec<EncodedSlice>,
        cancel: CancelToken,
    },
    /// Shut down, thread will get ready to be joined
    ShutDown,
}

/// Communicating with background build worker
///
/// Starting a rebuild cancels the one in flight, results of every rebuild
/// (cancelled ones included) come back in order.
pub struct BuildFront {
    handle: Option<JoinHandle<()>>,
    slot: Arc<VolumeSlot<VolumeTexture>>,
    in_flight: Option<CancelToken>,
    communication_in: Sender<BuildMessage>,   // main -> worker
    communication_out: Receiver<BuildResult>, // worker -> main
}

impl BuildFront {
    /// Spawn worker thread owning `pipeline`
    ///
    /// Worker waits for messages, does _not_ start building.
    pub fn start(pipeline: VolumePipeline) -> BuildFront {
        let (msg_sender, msg_receiver) = crossbeam::channel::unbounded();
        let (result_sender, result_receiver) = crossbeam::channel::unbounded();
        let slot = pipeline.slot().clone();

        let handle = std::thread::spawn(move || {
            build_loop(pipeline, msg_receiver, result_sender);
        });

        BuildFront {
            handle: Some(handle),
            slot,
            in_flight: None,
            communication_in: msg_sender,
            communication_out: result_receiver,
        }
    }

    /// Slot the worker publishes into
    pub fn slot(&self) -> &Arc<VolumeSlot<VolumeTexture>> {
        &self.slot
    }

    /// Queue new build, previous build gets cancelled
    ///
    /// Returns token of the new build.
    pub fn rebuild(&mut self, slices: Vec<EncodedSlice>) -> CancelToken {
        self.cancel();

        let cancel = CancelToken::new();
        self.in_flight = Some(cancel.clone());
        let msg = BuildMessage::Rebuild {
            slices,
            cancel: cancel.clone(),
        };
        if self.communication_in.send(msg).is_err() {
            warn!("Build worker is not running, rebuild dropped");
        }
        cancel
    }

    /// Cancel the latest build
    pub fn cancel(&mut self) {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
    }

    /// Getter for result receiver
    pub fn get_receiver(&self) -> Receiver<BuildResult> {
        self.communication_out.clone()
    }

    /// Receive result of the oldest unreported build
    ///
    /// Blocking call, `None` if worker is gone.
    pub fn receive_result(&self) -> Option<BuildResult> {
        self.communication_out.recv().ok()
    }

    /// Shut the worker down and join it
    ///
    /// Queued builds are finished first, unless cancelled.
    pub fn finish(&mut self) {
        if let Some(handle) = self.handle.take() {
            // worker may have ended already
            let _ = self.communication_in.send(BuildMessage::ShutDown);
            if handle.join().is_err() {
                warn!("Build worker panicked");
            }
        }
    }
}

impl Drop for BuildFront {
    fn drop(&mut self) {
        self.cancel();
        self.finish();
    }
}

fn build_loop(
    pipeline: VolumePipeline,
    messages: Receiver<BuildMessage>,
    results: Sender<BuildResult>,
) {
    while let Ok(msg) = messages.recv() {
        match msg {
            BuildMessage::Rebuild { slices, cancel } => {
                let result = pipeline.rebuild(slices, Some(&cancel));
                if let Err(err) = &result {
                    debug!("Rebuild failed: {err}");
                }
                if results.send(result).is_err() {
                    // nobody listens anymore
                    break;
                }
            }
            BuildMessage::ShutDown => break,
        }
    }
    debug!("Build worker shutting down");
}
