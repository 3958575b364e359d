// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C1: Sample Intake — normalizes raw per-ACK measurements and folds them into the
//! smoothed RTT/ack/min-RTT state carried by [`super::FlowController`].

use crate::recovery::spline::{
    config,
    fixed_point::{clamp_u32, div_u32},
    types::{CaState, HostTick, Sample},
    FlowController,
};

/// The coefficients folded out of a sample by [`FlowController::intake`]: the
/// "breathing-room" coefficients ε and γ (§4.1), plus whether this ACK indicates a
/// loss-driven ack-count regression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Intake {
    pub(crate) epsilon: u32,
    pub(crate) gamma: u32,
    pub(crate) is_loss: bool,
}

impl FlowController {
    /// Folds a raw [`Sample`] into RTT/ack/min-RTT state and returns the derived ε/γ
    /// coefficients plus the loss signal.
    pub(crate) fn intake(&mut self, sample: &Sample) -> Intake {
        let mss = if sample.mss == 0 {
            config::MSS_DEFAULT
        } else {
            sample.mss
        };
        self.mss = mss;
        self.bytes_in_flight = sample.bytes_in_flight;
        self.last_acked_sacked = sample.acked_sacked_bytes;

        let rtt_us = Self::fold_rtt(sample.rtt_us);
        self.last_rtt = self.curr_rtt;
        self.curr_rtt = rtt_us;

        self.fold_min_rtt(rtt_us, sample.host_time_ticks);
        self.rtt_avg = (self.last_min_rtt + self.last_rtt) / 2;

        self.last_ack = self.curr_ack;
        self.curr_ack = sample.delivered_segments;

        // §4.1 `Is_Loss`: keyed off the state as of the *previous* call, not this
        // sample's own `ca_state` — a flow only regresses once a loss episode is
        // already underway, so the flip into `Loss` itself does not yet trigger it.
        let is_loss = self.prev_ca_state == CaState::Loss && self.curr_ack < self.last_ack;
        self.prev_ca_state = sample.ca_state;

        let epsilon = Self::epsilon(self.curr_rtt, self.last_rtt);
        let gamma = Self::gamma(self.curr_ack, self.last_ack);

        Intake {
            epsilon,
            gamma,
            is_loss,
        }
    }

    /// §4.1 RTT folding: substitutes the floor for a zero or out-of-range sample.
    #[inline]
    fn fold_rtt(rtt_us: u32) -> u32 {
        if rtt_us == 0 || rtt_us > config::MAX_RTT_US {
            config::MIN_RTT_US
        } else {
            rtt_us
        }
    }

    /// §4.1 minimum-RTT window: accepts `rtt_us` as the new window minimum when it is
    /// strictly smaller than the current minimum or the window has aged out.
    fn fold_min_rtt(&mut self, rtt_us: u32, now: HostTick) {
        if self.window.update(rtt_us, now) {
            self.last_min_rtt = self
                .window
                .value()
                .expect("update() just set a value");
            self.last_min_rtt_stamp = self.window.last_updated().expect("update() just set a value");
            self.epp_min_rtt += 1;
        }
    }

    /// §4.1 ε: `⌊(curr_rtt + last_rtt)/curr_rtt⌋ + 1`, clamped to `[1, 10]`.
    #[inline]
    fn epsilon(curr_rtt: u32, last_rtt: u32) -> u32 {
        if curr_rtt == 0 {
            return 1;
        }
        let raw = div_u32(curr_rtt + last_rtt, curr_rtt, 0) + 1;
        clamp_u32(raw, 1, 10)
    }

    /// §4.1 γ: same shape over ack deltas, only defined when acks are advancing.
    #[inline]
    fn gamma(curr_ack: u32, last_ack: u32) -> u32 {
        if curr_ack <= last_ack || curr_ack == 0 {
            return 1;
        }
        let raw = div_u32(curr_ack + last_ack, curr_ack, 0) + 1;
        clamp_u32(raw, 1, 10)
    }
}
