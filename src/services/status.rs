//! Status synchronization
//!
//! Polls the read endpoints of the device for as long as the client runs and
//! hands every successfully decoded snapshot to a render callback. The peer
//! may reboot or drop off the network at any time, so failures only change
//! the cadence: there is no retry limit and no backoff.

use crate::{
    device_client::DeviceClient,
    error::Result,
    types::{DeviceStatusSnapshot, ModbusStatusSnapshot},
};
use log::debug;
use std::{future::Future, sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;

/// Delay before the next fetch after a rendered snapshot
pub const SUCCESS_DELAY: Duration = Duration::from_millis(500);
/// Delay before the next fetch after any failure
pub const FAILURE_DELAY: Duration = Duration::from_millis(1000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollState {
    WaitingForResponse,
    Scheduled(Duration),
}

/// Polling loop for a single endpoint
pub struct StatusPoller<F, R> {
    name: &'static str,
    fetch: F,
    render: R,
    state: PollState,
    cancel: CancellationToken,
}

impl<F, Fut, T, R> StatusPoller<F, R>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    R: FnMut(T),
{
    pub fn new(name: &'static str, fetch: F, render: R, cancel: CancellationToken) -> Self {
        Self {
            name,
            fetch,
            render,
            state: PollState::Scheduled(Duration::ZERO),
            cancel,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Issue one fetch, render on success and return the delay before the next one
    pub async fn poll_once(&mut self) -> Duration {
        self.state = PollState::WaitingForResponse;

        let delay = match (self.fetch)().await {
            Ok(snapshot) => {
                (self.render)(snapshot);
                SUCCESS_DELAY
            }
            Err(e) => {
                debug!("{} poll failed: {e}", self.name);
                FAILURE_DELAY
            }
        };

        self.state = PollState::Scheduled(delay);
        delay
    }

    /// Poll until the token is cancelled.
    ///
    /// Cancellation only stops further fetches; a fetch already in flight
    /// runs to completion and its snapshot is still rendered.
    pub async fn run(mut self) {
        while let PollState::Scheduled(delay) = self.state {
            if self.cancel.is_cancelled() {
                break;
            }

            if !delay.is_zero() {
                tokio::select! {
                    _ = self.cancel.cancelled() => break,
                    _ = sleep(delay) => {}
                }
            }

            self.poll_once().await;
        }

        debug!("{} polling stopped", self.name);
    }
}

/// Runs the device-info and modbus-info pollers side by side
pub struct StatusSynchronizer {
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl StatusSynchronizer {
    /// Spawn both pollers on the current runtime
    pub fn start<C, D, M>(client: Arc<C>, render_device: D, render_modbus: M) -> Self
    where
        C: DeviceClient + Send + Sync + 'static,
        D: FnMut(DeviceStatusSnapshot) + Send + 'static,
        M: FnMut(ModbusStatusSnapshot) + Send + 'static,
    {
        let cancel = CancellationToken::new();

        let device_client = client.clone();
        let device = StatusPoller::new(
            "device-info",
            move || {
                let client = device_client.clone();
                async move { client.device_info().await }
            },
            render_device,
            cancel.child_token(),
        );

        let modbus = StatusPoller::new(
            "modbus-info",
            move || {
                let client = client.clone();
                async move { client.modbus_info().await }
            },
            render_modbus,
            cancel.child_token(),
        );

        Self {
            tasks: vec![tokio::spawn(device.run()), tokio::spawn(modbus.run())],
            cancel,
        }
    }

    /// Stop scheduling further fetches on both pollers
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Wait until both pollers have finished
    pub async fn join(self) {
        for task in self.tasks {
            if let Err(e) = task.await {
                debug!("status poller ended abnormally: {e}");
            }
        }
    }
}
