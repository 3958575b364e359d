// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C3: Mode Arbiter — advances the probe-mode state machine using the epoch counter
//! and the signals produced by sample intake and rate estimation.
//!
//! The four states are driven by one `advance` entry point, since §4.3's
//! transitions form a single ordered list rather than per-state round-trip checks.

use crate::recovery::spline::{config, rate::RateEstimate, sample::Intake, types::Mode, FlowController};

impl FlowController {
    /// Advances `current_mode` per §4.3's ordered transition list. Must be called
    /// once per `on_ack`, after sample intake and rate estimation.
    ///
    /// `current_mode` is sticky: it only changes on one of the three triggers below.
    /// A literal reading of step 3 ("drain shortcut, else `PROBE_BW`") would instead
    /// reassign the mode on every call, which contradicts the start-up-ramp scenario
    /// (§8.1, expects `START_PROBE` to persist across many calls). See DESIGN.md for
    /// the full resolution.
    pub(crate) fn advance_mode(&mut self, intake: &Intake, rate: &RateEstimate) {
        let _ = intake;

        // 1. First call ever: `new()` already seeds `current_mode = StartProbe`; the
        //    remaining triggers below still apply from the second call onward.
        if !self.probe_mode_started {
            self.probe_mode_started = true;
            self.epp = 0;
            #[cfg(feature = "state-tracing")]
            tracing::trace!(mode = ?self.current_mode, epp = self.epp, "mode arbiter advanced");
            return;
        }

        // 2 & 3. Overload and drain shortcuts, folded into one trigger: both force
        // DRAIN_PROBE; neither one touches `current_mode` when false.
        let queued_over_cwnd = self.bytes_in_flight as u64 > self.curr_ack as u64 * self.mss as u64
            && self.bytes_in_flight as u64 > self.curr_cwnd as u64 * self.mss as u64;
        let starved = self.last_acked_sacked < self.mss;

        if rate.overload || queued_over_cwnd || starved {
            self.current_mode = Mode::DrainProbe;
        }

        // 4. Epoch roll.
        self.epp += 1;
        if self.epp >= config::EPOCH_CAP {
            self.epp = 0;
            if self.epp_min_rtt > 0 {
                self.epp_min_rtt = 0;
                self.current_mode = Mode::ProbeBw;
            } else {
                self.current_mode = match self.current_mode {
                    Mode::ProbeBw => Mode::ProbeRtt,
                    Mode::ProbeRtt => Mode::DrainProbe,
                    Mode::DrainProbe => Mode::StartProbe,
                    Mode::StartProbe => Mode::ProbeBw,
                };
            }
        }

        #[cfg(feature = "state-tracing")]
        tracing::trace!(mode = ?self.current_mode, epp = self.epp, "mode arbiter advanced");
    }
}
