// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Tracks the minimum value seen over a fixed-length window of host ticks.
//!
//! A minimum-only filter over `u32` host ticks (`last_min_rtt` /
//! `last_min_rtt_stamp`), rather than a `Timestamp`/`Duration` pair, since this
//! core never sees wall-clock time.

use crate::recovery::spline::types::HostTick;

#[derive(Clone, Copy, Debug)]
pub(crate) struct WindowedMin {
    current_value: Option<u32>,
    last_updated: Option<HostTick>,
    window_length: u32,
}

impl WindowedMin {
    pub(crate) const fn new(window_length: u32) -> Self {
        Self {
            current_value: None,
            last_updated: None,
            window_length,
        }
    }

    /// Offers a new sample to the window.
    ///
    /// Returns `true` if the sample became the new window minimum, either because it
    /// is strictly smaller than the current minimum or because the current minimum
    /// has aged out of the window.
    pub(crate) fn update(&mut self, new_sample: u32, now: HostTick) -> bool {
        let expired = self
            .last_updated
            .map_or(true, |last_updated| now.wrapping_sub(last_updated) >= self.window_length);

        let supersedes = self
            .current_value
            .map_or(true, |current| new_sample <= current);

        if expired || supersedes {
            self.current_value = Some(new_sample);
            self.last_updated = Some(now);
            true
        } else {
            false
        }
    }

    pub(crate) fn value(&self) -> Option<u32> {
        self.current_value
    }

    pub(crate) fn last_updated(&self) -> Option<HostTick> {
        self.last_updated
    }
}
