//! Marshalling worker events onto the interactive loop.
//!
//! Workers never touch presentation state. They send [`UiEvent`]s through a
//! [`UiDispatcher`], gated by a [`LivenessToken`] that the presentation layer
//! closes when its surface is torn down. The interactive loop applies queued
//! events to a [`Presenter`] with [`pump`] or [`pump_until_closed`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use tracing::debug;

use crate::core::types::{BuildState, Notification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    BuildState(BuildState),
    Notify(Notification),
}

/// Delivers events to the thread that owns the interactive surface.
pub trait UiDispatcher: Send + Sync {
    fn dispatch(&self, event: UiEvent);
}

/// [`UiDispatcher`] backed by an `mpsc` channel drained by the interactive loop.
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    tx: Sender<UiEvent>,
}

impl UiDispatcher for ChannelDispatcher {
    fn dispatch(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            debug!("ui loop has gone away, dropping event");
        }
    }
}

/// Create a dispatcher and the receiving end for the interactive loop.
pub fn channel() -> (ChannelDispatcher, Receiver<UiEvent>) {
    let (tx, rx) = mpsc::channel();
    (ChannelDispatcher { tx }, rx)
}

/// Shared flag answering "is the surface still alive?".
#[derive(Debug, Clone)]
pub struct LivenessToken(Arc<AtomicBool>);

impl LivenessToken {
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owned by the presentation layer; closes its tokens when dropped.
#[derive(Debug)]
pub struct SurfaceLifetime {
    alive: Arc<AtomicBool>,
}

impl SurfaceLifetime {
    pub fn new() -> Self {
        Self {
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn token(&self) -> LivenessToken {
        LivenessToken(Arc::clone(&self.alive))
    }

    pub fn close(&self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Default for SurfaceLifetime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SurfaceLifetime {
    fn drop(&mut self) {
        self.close();
    }
}

/// Receives build state transitions, e.g. to enable/disable the build control.
pub trait BuildStateObserver {
    fn on_build_state(&mut self, state: BuildState);
}

/// Shows user-visible failure messages.
pub trait NotificationSink {
    fn show(&mut self, notification: &Notification);
}

pub trait Presenter: BuildStateObserver + NotificationSink {}

impl<T: BuildStateObserver + NotificationSink> Presenter for T {}

fn apply<P: Presenter>(presenter: &mut P, event: UiEvent) {
    match event {
        UiEvent::BuildState(state) => presenter.on_build_state(state),
        UiEvent::Notify(notification) => presenter.show(&notification),
    }
}

/// Apply every queued event without blocking. Returns how many were applied.
pub fn pump<P: Presenter>(rx: &Receiver<UiEvent>, presenter: &mut P) -> usize {
    let mut applied = 0;
    loop {
        match rx.try_recv() {
            Ok(event) => {
                apply(presenter, event);
                applied += 1;
            }
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => return applied,
        }
    }
}

/// Block applying events until every dispatcher has been dropped.
pub fn pump_until_closed<P: Presenter>(rx: &Receiver<UiEvent>, presenter: &mut P) -> usize {
    let mut applied = 0;
    while let Ok(event) = rx.recv() {
        apply(presenter, event);
        applied += 1;
    }
    applied
}
