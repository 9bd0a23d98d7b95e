/*
 * Copyright 2025 PenTutor Contributors
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 */

//! Elapsed call duration.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::events::{EventSender, SessionEvent};

/// Ticks once per second from the moment the call connected, publishing
/// the elapsed whole seconds to a `watch` channel and the session events.
#[derive(Debug)]
pub struct CallTimer {
    elapsed_rx: watch::Receiver<u64>,
    handle: Option<JoinHandle<()>>,
}

impl CallTimer {
    pub fn start(events: EventSender) -> Self {
        let started_at = Instant::now();
        let (tx, elapsed_rx) = watch::channel(0);

        let handle = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut interval = tokio::time::interval_at(started_at + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let secs = started_at.elapsed().as_secs();
                if tx.send(secs).is_err() {
                    break;
                }
                events.emit(SessionEvent::DurationTick(secs));
            }
        });

        Self {
            elapsed_rx,
            handle: Some(handle),
        }
    }

    /// Elapsed seconds as last published by the ticker.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed_rx.clone()
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for CallTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// `MM:SS`, or `HH:MM:SS` from one hour on.
pub fn format_duration(elapsed_secs: u64) -> String {
    let hours = elapsed_secs / 3600;
    let minutes = (elapsed_secs % 3600) / 60;
    let seconds = elapsed_secs % 60;

    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}
