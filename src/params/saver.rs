//! Debounced auto-save task
//!
//! Persisting on every write would wear the flash under bursty mutation, so
//! the store only arms a request through [`SaveChannel`] and this task
//! debounces: each new `Schedule` within the window restarts the timer, and
//! one save covers the whole burst once the store goes quiet.
//!
//! The task never outruns a manual save. [`execute_save`](ParamSaver) locks
//! the shared store and checks the dirty flag first, so a
//! [`save_to_flash`](super::ParamStore::save_to_flash) that already ran turns
//! the pending request into a no-op.
//!
//! Requires the Embassy runtime (feature `autosave`).

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Timer};

use super::ParamStore;
use crate::platform::traits::FlashPartition;
use crate::{log_debug, log_error, log_info};

/// Debounce window matching the classic one-shot save timer
pub const DEFAULT_DEBOUNCE_MS: u64 = 2000;

/// Channel carrying save requests from the store to the task
///
/// Depth 4 is plenty: requests coalesce, so a full channel always means a
/// save is already pending.
pub type SaveChannel = Channel<CriticalSectionRawMutex, SaveRequest, 4>;

/// Save request message
#[derive(Debug, Clone, Copy)]
pub enum SaveRequest {
    /// Arm or restart the debounce timer
    Schedule,
    /// Save now, bypassing the debounce
    Immediate,
}

/// Debounced save driver
///
/// Owns the receiving end of the request channel; the store holds the
/// sending end via [`attach_saver`](super::ParamStore::attach_saver).
pub struct ParamSaver {
    channel: &'static SaveChannel,
}

impl ParamSaver {
    pub fn new(channel: &'static SaveChannel) -> Self {
        Self { channel }
    }

    /// Schedule a debounced save
    pub async fn schedule_save(&self) {
        self.channel.send(SaveRequest::Schedule).await;
    }

    /// Request an immediate save, bypassing the debounce
    pub async fn save_immediately(&self) {
        self.channel.send(SaveRequest::Immediate).await;
    }

    /// Run the save task (spawn on the async executor)
    ///
    /// Receives requests and debounces them: `Schedule` requests within
    /// `debounce_ms` of each other collapse into a single flash write;
    /// `Immediate` cuts any running window short.
    pub async fn run_task<F: FlashPartition>(
        &self,
        store: &'static Mutex<CriticalSectionRawMutex, ParamStore<F>>,
        debounce_ms: u64,
    ) {
        loop {
            let request = self.channel.receive().await;

            if let SaveRequest::Schedule = request {
                let mut pending = true;
                while pending {
                    match embassy_futures::select::select(
                        Timer::after(Duration::from_millis(debounce_ms)),
                        self.channel.receive(),
                    )
                    .await
                    {
                        embassy_futures::select::Either::First(_) => {
                            pending = false;
                        }
                        embassy_futures::select::Either::Second(SaveRequest::Schedule) => {
                            // Restart the window
                        }
                        embassy_futures::select::Either::Second(SaveRequest::Immediate) => {
                            pending = false;
                        }
                    }
                }
            }

            self.execute_save(store).await;
        }
    }

    async fn execute_save<F: FlashPartition>(
        &self,
        store: &'static Mutex<CriticalSectionRawMutex, ParamStore<F>>,
    ) {
        let mut store = store.lock().await;

        // A manual save_to_flash since the request was armed cleared the
        // flag; nothing to do
        if !store.is_dirty() {
            log_debug!("params already saved, skipping");
            return;
        }

        log_info!("auto-saving params to flash");
        if let Err(_e) = store.save_to_flash() {
            log_error!("param auto-save failed");
        }
    }
}
