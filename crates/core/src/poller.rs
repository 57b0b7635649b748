//! Polling loop: locate → exchange → decode → present, on a fixed interval.
//!
//! [`Monitor`] runs one blocking cycle and never fails; every fault degrades
//! to the not-found state. [`Poller`] drives it from a single tokio task and
//! hands each result to a [`TraySurface`]. A [`PollerHandle`] lets the host
//! request an immediate refresh or shut the loop down.

use crate::battery::{self, BatteryStatus};
use crate::device::{self, DeviceIdentity};
use crate::exchange;
use crate::presentation::{self, Presentation};
use crate::profile::DeviceProfile;
use crate::transport::HidBackend;
use crate::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default interval between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
/// Default bound on one locate/exchange/decode cycle.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(2);

/// Receives each presentation. Only ever called from the poll task.
pub trait TraySurface: Send {
    fn show(&mut self, presentation: &Presentation);
}

/// Poll cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    pub interval: Duration,
    pub exchange_timeout: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }
}

/// One device, one backend, one profile. [`Monitor::refresh`] may be called
/// from anywhere at any time; only one cycle touches the device at once.
pub struct Monitor<B> {
    backend: B,
    identity: DeviceIdentity,
    profile: DeviceProfile,
    busy: AtomicBool,
}

/// Marks a cycle as running until dropped, including on panic.
struct CycleGuard<'a>(&'a AtomicBool);

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<B: HidBackend> Monitor<B> {
    pub fn new(backend: B, identity: DeviceIdentity, profile: DeviceProfile) -> Self {
        Self {
            backend,
            identity,
            profile,
            busy: AtomicBool::new(false),
        }
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether a cycle is still running, e.g. one stalled past its timeout.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Read the battery once. Absent device, failed exchange, and malformed
    /// response all yield [`BatteryStatus::NOT_FOUND`]. While another cycle
    /// still holds the device this returns not-found without touching it.
    pub fn poll_status(&self) -> BatteryStatus {
        if self.busy.swap(true, Ordering::AcqRel) {
            debug!("Previous cycle still running, skipping device access");
            return BatteryStatus::NOT_FOUND;
        }
        let _guard = CycleGuard(&self.busy);

        let found = match device::locate(&self.backend, &self.identity) {
            Ok(Some(found)) => found,
            Ok(None) => return BatteryStatus::NOT_FOUND,
            Err(e) => {
                warn!(error = %e, "Device enumeration failed");
                return BatteryStatus::NOT_FOUND;
            }
        };

        // The handle lives only inside this scope and is closed on drop.
        let response = {
            let mut handle = match self.backend.open(&found) {
                Ok(handle) => handle,
                Err(e) => {
                    warn!(error = %e, "Failed to open device");
                    return BatteryStatus::NOT_FOUND;
                }
            };
            exchange::exchange(&mut handle, &self.profile)
        };

        match response {
            Ok(raw) => battery::decode(&self.profile, &raw),
            Err(e) => {
                warn!(error = %e, "Battery query failed");
                BatteryStatus::NOT_FOUND
            }
        }
    }

    /// Run the full pipeline and present the result.
    pub fn refresh(&self) -> Presentation {
        let status = self.poll_status();
        self.present(&status)
    }

    /// Present a status under this monitor's device name.
    pub fn present(&self, status: &BatteryStatus) -> Presentation {
        presentation::present(status, self.identity.name())
    }
}

/// Read the battery on the blocking pool, bounded by `timeout`.
///
/// A stalled transport or a panicking cycle yields
/// [`BatteryStatus::NOT_FOUND`]. A stalled cycle keeps its blocking thread
/// until the transport returns; no new cycle starts until then.
pub async fn poll_status_with_timeout<B>(monitor: Arc<Monitor<B>>, timeout: Duration) -> BatteryStatus
where
    B: HidBackend + Send + Sync + 'static,
{
    if monitor.is_busy() {
        warn!("Previous cycle has not returned yet");
        return BatteryStatus::NOT_FOUND;
    }

    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(move || monitor.poll_status()))
        .await
    {
        Ok(Ok(status)) => {
            debug!(
                level = status.level,
                charging = status.charging,
                fully_charged = status.fully_charged,
                online = status.online,
                "Poll cycle complete"
            );
            status
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Poll cycle aborted");
            BatteryStatus::NOT_FOUND
        }
        Err(_) => {
            let e = Error::Timeout(format!("poll cycle exceeded {}ms", timeout.as_millis()));
            warn!(error = %e, "Poll cycle abandoned");
            BatteryStatus::NOT_FOUND
        }
    }
}

/// Bounded cycle followed by presentation.
pub async fn poll_with_timeout<B>(monitor: Arc<Monitor<B>>, timeout: Duration) -> Presentation
where
    B: HidBackend + Send + Sync + 'static,
{
    let status = poll_status_with_timeout(Arc::clone(&monitor), timeout).await;
    monitor.present(&status)
}

/// Commands accepted by a running [`Poller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerCommand {
    /// Run a cycle now, outside the timer.
    Refresh,
    /// Stop after the current cycle.
    Shutdown,
}

/// Host-side control of a [`Poller`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PollerHandle {
    commands: mpsc::UnboundedSender<PollerCommand>,
}

impl PollerHandle {
    /// Request an immediate cycle. Returns `false` if the poller has stopped.
    pub fn refresh(&self) -> bool {
        self.commands.send(PollerCommand::Refresh).is_ok()
    }

    /// Ask the poller to stop.
    pub fn shutdown(&self) {
        let _ = self.commands.send(PollerCommand::Shutdown);
    }
}

/// Timer-driven poll loop owning the tray surface.
pub struct Poller<B, S> {
    monitor: Arc<Monitor<B>>,
    surface: S,
    config: PollerConfig,
    commands: mpsc::UnboundedReceiver<PollerCommand>,
    last: Option<Presentation>,
}

impl<B, S> Poller<B, S>
where
    B: HidBackend + Send + Sync + 'static,
    S: TraySurface,
{
    pub fn new(monitor: Arc<Monitor<B>>, surface: S, config: PollerConfig) -> (Self, PollerHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = Self {
            monitor,
            surface,
            config,
            commands: rx,
            last: None,
        };
        (poller, PollerHandle { commands: tx })
    }

    /// Run one cycle and hand the result to the surface.
    pub async fn cycle(&mut self) -> Presentation {
        let presentation =
            poll_with_timeout(Arc::clone(&self.monitor), self.config.exchange_timeout).await;
        if self.last.as_ref() != Some(&presentation) {
            info!(
                icon = presentation.icon_key,
                tooltip = %presentation.tooltip,
                "Battery display changed"
            );
        }
        self.surface.show(&presentation);
        self.last = Some(presentation.clone());
        presentation
    }

    /// Poll until shut down, then return the surface.
    ///
    /// The first cycle runs before any command is read. Ticks do not back
    /// off after failures, and a cycle always finishes before the next wait
    /// begins.
    pub async fn run(mut self) -> S {
        info!(
            device = self.monitor.identity().name(),
            interval_secs = self.config.interval.as_secs(),
            "Poller started"
        );
        self.cycle().await;

        let interval = self.config.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = ticker.tick() => {
                    self.cycle().await;
                }
                command = self.commands.recv() => match command {
                    Some(PollerCommand::Refresh) => {
                        debug!("Out-of-band refresh");
                        self.cycle().await;
                    }
                    Some(PollerCommand::Shutdown) | None => break,
                },
            }
        }

        info!("Poller stopped");
        self.surface
    }
}
