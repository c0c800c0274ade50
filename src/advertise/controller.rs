//! Advertiser controller
//!
//! Session bookkeeping around an [`AdvertisingBackend`]:
//!
//! ```text
//! Idle --start--> Pending(session) --on_start_success--> Advertising(session)
//!                     |                                        |
//!                     +--on_start_failure--> Idle <---stop-----+
//! ```
//!
//! Every start request produces exactly one [`AdvertiseOutcome`], unless it
//! is cancelled by [`AdvertiserController::stop`] before the platform
//! answers. Session state lives behind a blocking mutex so `stop` can be
//! called from any context, including platform callbacks.

use core::cell::RefCell;

use crate::advertise::traits::AdvertisingBackend;
use crate::advertise::types::{
    AdvertiseData, AdvertiseError, AdvertiseOutcome, AdvertiseSettings, SessionId,
};
use crate::hooks::PeripheralHooks;
use crate::readiness::RadioReady;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Pending(SessionId),
    Advertising(SessionId),
}

struct Inner<B> {
    backend: B,
    state: SessionState,
    next_session: u32,
}

pub struct AdvertiserController<M: RawMutex, B: AdvertisingBackend, H: PeripheralHooks> {
    settings: AdvertiseSettings,
    data: AdvertiseData,
    inner: Mutex<M, RefCell<Inner<B>>>,
    outcome: Signal<M, AdvertiseOutcome>,
    hooks: H,
}

impl<M: RawMutex, B: AdvertisingBackend, H: PeripheralHooks> AdvertiserController<M, B, H> {
    /// Controller using the fixed calculator settings
    pub fn new(data: AdvertiseData, backend: B, hooks: H) -> Self {
        Self {
            settings: AdvertiseSettings::calculator(),
            data,
            inner: Mutex::new(RefCell::new(Inner {
                backend,
                state: SessionState::Idle,
                next_session: 1,
            })),
            outcome: Signal::new(),
            hooks,
        }
    }

    pub fn settings(&self) -> &AdvertiseSettings {
        &self.settings
    }

    pub fn data(&self) -> &AdvertiseData {
        &self.data
    }

    /// Request advertising. Returns at once; the outcome follows through
    /// [`Self::outcome`] and the hooks.
    ///
    /// A start while another session is pending or active fails with
    /// `AlreadyStarted` and leaves that session alone. Only the hook sees
    /// that failure, the outcome signal stays with the existing session.
    pub fn start(&self, _ready: &RadioReady) -> Result<SessionId, AdvertiseError> {
        let result = self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            if inner.state != SessionState::Idle {
                return Err(AdvertiseError::AlreadyStarted);
            }

            let session = SessionId(inner.next_session);
            inner.next_session = inner.next_session.wrapping_add(1);
            // Outcomes of earlier sessions must not answer this one
            self.outcome.reset();

            match inner.backend.request_start(session, &self.settings, &self.data) {
                Ok(()) => {
                    inner.state = SessionState::Pending(session);
                    Ok(session)
                }
                Err(error) => {
                    self.outcome.signal(AdvertiseOutcome::Failed(error));
                    Err(error)
                }
            }
        });

        match result {
            Ok(session) => {
                log::info!("ADV: Start requested, session {}", session);
            }
            Err(error) => {
                log::warn!("ADV: Start rejected: {}", error);
                self.hooks
                    .on_advertise_outcome(&AdvertiseOutcome::Failed(error));
            }
        }
        result
    }

    /// Platform callback: advertising began for `session`
    pub fn on_start_success(&self, session: SessionId, effective: AdvertiseSettings) {
        let outcome = AdvertiseOutcome::Started(effective);
        if self.resolve(session, SessionState::Advertising(session), outcome) {
            log::info!(
                "ADV: Advertising, session {} ({} ms, {} dBm)",
                session,
                effective.mode.interval_ms(),
                effective.tx_power.dbm()
            );
            self.hooks.on_advertise_outcome(&outcome);
        }
    }

    /// Platform callback: advertising could not begin for `session`
    pub fn on_start_failure(&self, session: SessionId, reason: AdvertiseError) {
        let outcome = AdvertiseOutcome::Failed(reason);
        if self.resolve(session, SessionState::Idle, outcome) {
            log::warn!("ADV: Start failed, session {}: {}", session, reason);
            self.hooks.on_advertise_outcome(&outcome);
        }
    }

    /// Stop advertising. Does nothing when idle, so calling it twice is fine.
    ///
    /// A start that has not been answered yet is cancelled and will never
    /// deliver an outcome.
    pub fn stop(&self) {
        let stopped = self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            let session = match inner.state {
                SessionState::Idle => return None,
                SessionState::Pending(session) | SessionState::Advertising(session) => session,
            };
            inner.state = SessionState::Idle;
            inner.backend.request_stop(session);
            self.outcome.reset();
            Some(session)
        });

        if let Some(session) = stopped {
            log::info!("ADV: Stopped session {}", session);
        }
    }

    /// Wait for the outcome of the current start request
    pub async fn outcome(&self) -> AdvertiseOutcome {
        self.outcome.wait().await
    }

    /// Take the outcome if one is waiting
    pub fn try_outcome(&self) -> Option<AdvertiseOutcome> {
        self.outcome.try_take()
    }

    pub fn is_advertising(&self) -> bool {
        self.inner
            .lock(|inner| matches!(inner.borrow().state, SessionState::Advertising(_)))
    }

    /// Session currently pending or advertising
    pub fn session(&self) -> Option<SessionId> {
        self.inner.lock(|inner| match inner.borrow().state {
            SessionState::Idle => None,
            SessionState::Pending(session) | SessionState::Advertising(session) => Some(session),
        })
    }

    /// Move a pending `session` to `next`. False for stale or repeated
    /// callbacks.
    fn resolve(&self, session: SessionId, next: SessionState, outcome: AdvertiseOutcome) -> bool {
        let matched = self.inner.lock(|inner| {
            let mut inner = inner.borrow_mut();
            if inner.state != SessionState::Pending(session) {
                return false;
            }
            inner.state = next;
            self.outcome.signal(outcome);
            true
        });

        if !matched {
            log::debug!("ADV: Ignoring callback for stale session {}", session);
        }
        matched
    }
}
