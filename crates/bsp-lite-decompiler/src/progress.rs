// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Progress reporting and diagnostics for one job

use std::fmt;

/// Smallest change in the completed fraction that is reported
pub const PROGRESS_STEP: f64 = 0.01;

/// Throttled progress over a known amount of work
///
/// Intermediate reports stay below `1.0`; [`Progress::finish`] reports
/// exactly `1.0` once.
pub struct Progress<'a> {
    callback: Option<&'a (dyn Fn(f64) + Send)>,
    total: usize,
    done: usize,
    last: f64,
    finished: bool,
}

impl<'a> Progress<'a> {
    pub fn new(callback: Option<&'a (dyn Fn(f64) + Send)>, total: usize) -> Self {
        Self {
            callback,
            total,
            done: 0,
            last: 0.0,
            finished: false,
        }
    }

    /// Record `n` finished work items
    pub fn advance(&mut self, n: usize) {
        self.done = (self.done + n).min(self.total);
        let Some(callback) = self.callback else {
            return;
        };
        if self.total == 0 {
            return;
        }
        let fraction = self.done as f64 / self.total as f64;
        if fraction < 1.0 && fraction - self.last >= PROGRESS_STEP {
            self.last = fraction;
            callback(fraction);
        }
    }

    pub fn fraction(&self) -> f64 {
        if self.finished {
            1.0
        } else if self.total == 0 {
            0.0
        } else {
            self.done as f64 / self.total as f64
        }
    }

    /// Report completion
    pub fn finish(&mut self) {
        if self.finished {
            return;
        }
        self.finished = true;
        self.done = self.total;
        if let Some(callback) = self.callback {
            callback(1.0);
        }
    }
}

/// Sink for recoverable diagnostics
///
/// Every message is logged at `warn`, forwarded to the job's message
/// callback and counted.
pub struct MessageSink<'a> {
    callback: Option<&'a (dyn Fn(&str) + Send)>,
    count: usize,
}

impl<'a> MessageSink<'a> {
    pub fn new(callback: Option<&'a (dyn Fn(&str) + Send)>) -> Self {
        Self { callback, count: 0 }
    }

    pub fn warn(&mut self, message: impl fmt::Display) {
        let text = message.to_string();
        log::warn!("{}", text);
        if let Some(callback) = self.callback {
            callback(&text);
        }
        self.count += 1;
    }

    /// Number of warnings so far
    pub fn count(&self) -> usize {
        self.count
    }
}
