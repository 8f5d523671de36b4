//! Firmware and filesystem upload
//!
//! Drives one upload attempt from endpoint selection to the interpretation of
//! the device answer, keeping the submit control and progress indicator of
//! the view consistent however the attempt ends.

use crate::{
    device_client::DeviceClient,
    error::{ClientError, Result},
    types::{
        ProgressFn, UPLOAD_SUCCESS_SENTINEL, UploadEndpoint, UploadFile, UploadResponse,
        UploadState, UploadTarget,
    },
};
use log::{info, warn};
#[cfg(any(test, feature = "mock"))]
use mockall::automock;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Controls the view exposes to an upload
#[cfg_attr(any(test, feature = "mock"), automock)]
pub trait UploadView {
    fn set_progress_visible(&self, visible: bool);
    fn set_submit_enabled(&self, enabled: bool);
    /// Progress in percent, `0.0..=100.0`
    fn show_progress(&self, percent: f64);
    /// Called on every transition of the controller state
    fn state_changed(&self, state: &UploadState);
}

/// Percentage of `sent` in `total`, if the total is known and non-zero
pub fn progress_percent(sent: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 => Some(100.0 * sent as f64 / total as f64),
        _ => None,
    }
}

/// Map the answer of an upload endpoint to the terminal upload state
pub fn interpret(response: Result<UploadResponse>) -> UploadState {
    match response {
        Ok(UploadResponse { status: 200, body }) if body.contains(UPLOAD_SUCCESS_SENTINEL) => {
            UploadState::Completed
        }
        Ok(UploadResponse { status: 200, .. }) => UploadState::Failed("upload failed".to_string()),
        Ok(UploadResponse { status, .. }) => {
            UploadState::Failed(format!("upload failed with status {status}"))
        }
        Err(e) => UploadState::Failed(format!("upload failed: {e}")),
    }
}

fn lock_state(state: &Mutex<UploadState>) -> MutexGuard<'_, UploadState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the view locked for the duration of an upload.
/// Dropping it releases the view and returns the controller to `Idle`.
struct UiLock<'a> {
    view: &'a (dyn UploadView + Send + Sync),
    state: &'a Mutex<UploadState>,
}

impl<'a> UiLock<'a> {
    fn acquire(
        view: &'a (dyn UploadView + Send + Sync),
        state: &'a Mutex<UploadState>,
    ) -> Result<Self> {
        {
            let mut state = lock_state(state);
            if *state != UploadState::Idle {
                return Err(ClientError::UploadInProgress);
            }
            *state = UploadState::Uploading;
        }
        view.state_changed(&UploadState::Uploading);

        view.set_submit_enabled(false);
        view.set_progress_visible(true);

        Ok(Self { view, state })
    }

    /// Record the terminal state of the attempt, then release the view
    fn finish(self, outcome: &UploadState) {
        self.enter(outcome.clone());
    }

    fn enter(&self, next: UploadState) {
        *lock_state(self.state) = next.clone();
        self.view.state_changed(&next);
    }
}

impl Drop for UiLock<'_> {
    fn drop(&mut self) {
        self.view.set_submit_enabled(true);
        self.view.set_progress_visible(false);
        self.enter(UploadState::Idle);
    }
}

pub struct UploadController {
    view: Arc<dyn UploadView + Send + Sync>,
    state: Mutex<UploadState>,
}

impl UploadController {
    pub fn new(view: Arc<dyn UploadView + Send + Sync>) -> Self {
        Self {
            view,
            state: Mutex::new(UploadState::Idle),
        }
    }

    pub fn state(&self) -> UploadState {
        lock_state(&self.state).clone()
    }

    /// Upload `file` to the endpoint matching `target` and its extension
    ///
    /// Returns the terminal state of the attempt, `Completed` or `Failed`.
    /// The controller passes through that state, reported to the view with
    /// `state_changed`, and is back in `Idle` when this returns.
    ///
    /// # Errors
    /// * `NoFileSelected` - no file was given, nothing is sent
    /// * `UploadInProgress` - another upload on this controller has not finished
    pub async fn upload<C: DeviceClient>(
        &self,
        client: &C,
        target: UploadTarget,
        file: Option<UploadFile>,
    ) -> Result<UploadState> {
        let file = file.ok_or(ClientError::NoFileSelected)?;
        let endpoint = UploadEndpoint::select(target, &file.file_name);

        let lock = UiLock::acquire(self.view.as_ref(), &self.state)?;
        info!(
            "uploading {} to {}",
            file.file_name,
            endpoint.path()
        );

        let view = self.view.clone();
        let progress: ProgressFn = Arc::new(move |sent: u64, total: Option<u64>| {
            if let Some(percent) = progress_percent(sent, total) {
                view.show_progress(percent);
            }
        });

        let outcome = interpret(client.upload(endpoint, file, progress).await);
        match &outcome {
            UploadState::Completed => info!("upload completed"),
            UploadState::Failed(reason) => warn!("{reason}"),
            _ => {}
        }
        lock.finish(&outcome);

        Ok(outcome)
    }
}
