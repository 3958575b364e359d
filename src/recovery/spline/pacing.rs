// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C5: Pacing Policy — derives `pacing_rate` and the pacing-enabled flag from §4.5.
//!
//! A gain derived from the fairness/ε signals, scaled against `bw` and floored
//! at 1, with per-mode trim/disable rules layered on top.

use crate::recovery::spline::{
    fixed_point::{clamp_u32, div_u32},
    types::Mode,
    FlowController,
};

impl FlowController {
    /// Computes this call's pacing rate and whether the host should pace at all,
    /// per §4.5. Must run after [`FlowController::update_window`] so `bw` and
    /// `fairness_rat` reflect this call's estimate.
    pub(crate) fn update_pacing(&mut self, fairness_rat: u32) -> (u64, bool) {
        let mut rate = self
            .bw
            .saturating_mul(fairness_rat as u64)
            .saturating_mul(self.last_min_rtt as u64);

        if self.current_mode == Mode::ProbeRtt {
            rate = scale_u64(rate, 12, 16);
        }

        let floor = self.mss as u64;
        if rate < floor {
            rate = floor;
        }

        self.pacing_rate = rate;

        let enabled = self.current_mode != Mode::StartProbe;
        (rate, enabled)
    }

    /// The original `pacing_gain_rate`'s diagnostic gain: `(ε + γ) / ε`, clamped to
    /// `[1, 3]`. Not used to scale `pacing_rate`; see [`FlowController::pacing_gain_hint`].
    pub(crate) fn compute_pacing_gain_hint(epsilon: u32, gamma: u32) -> u32 {
        if epsilon == 0 {
            return 1;
        }
        clamp_u32(div_u32(epsilon + gamma, epsilon, 1), 1, 3)
    }
}

#[inline]
fn scale_u64(value: u64, num: u64, den: u64) -> u64 {
    if den == 0 {
        value
    } else {
        (value as u128 * num as u128 / den as u128) as u64
    }
}
