// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! C2: Rate Estimator — derives delivery bandwidth and throughput-in-flight, the
//! smoothed/clamped bandwidth estimate, and the fairness coefficient.

use crate::recovery::spline::{
    config,
    fixed_point::{clamp_u64, mul_div_u64},
    FlowController,
};

/// One second, expressed in the same microsecond unit as `rtt_us`/host ticks.
const ONE_SECOND_US: u64 = 1_000_000;

/// Output of [`FlowController::estimate_rate`]: the signals the mode arbiter and
/// window/pacing policies consume for this call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RateEstimate {
    pub(crate) fairness_rat: u32,
    pub(crate) overload: bool,
}

impl FlowController {
    /// Updates `throughput`, `bw`, `last_bw`, and `fairness_rat` from the current
    /// sample-intake state, and reports whether the overload shortcut (§4.2) fires.
    pub(crate) fn estimate_rate(&mut self) -> RateEstimate {
        self.throughput = Self::throughput(self.bytes_in_flight, self.last_min_rtt);

        let bw_raw = Self::bw_raw(self.curr_ack, self.mss, self.last_min_rtt);

        // 75/25 EMA over this call's raw bandwidth, widened to avoid overflowing the
        // weighted sum for very large bandwidths.
        self.last_bw =
            ((config::EMA_NUM as u128 * self.last_bw as u128 + bw_raw as u128) / config::EMA_DEN as u128) as u64;

        self.bw = self.clamp_bw(bw_raw);

        let fairness_rat = self.fairness_coefficient();
        self.fairness_rat = fairness_rat;

        let overload = self.throughput * 12 / 16 > self.bw;

        RateEstimate {
            fairness_rat,
            overload,
        }
    }

    /// §4.2 throughput: `bytes_in_flight * 1s / last_min_rtt`.
    #[inline]
    fn throughput(bytes_in_flight: u32, last_min_rtt: u32) -> u64 {
        if last_min_rtt == 0 {
            return 0;
        }
        mul_div_u64(bytes_in_flight as u64, ONE_SECOND_US, last_min_rtt as u64, 0)
    }

    /// §4.2 raw bandwidth: `delivered * mss * 1s / last_min_rtt`.
    #[inline]
    fn bw_raw(delivered: u32, mss: u32, last_min_rtt: u32) -> u64 {
        if last_min_rtt == 0 {
            return 0;
        }
        mul_div_u64(
            delivered as u64 * mss as u64,
            ONE_SECOND_US,
            last_min_rtt as u64,
            0,
        )
    }

    /// §4.2 clamp-against-history + hold-on-rtt-inflation + floor/ceiling.
    fn clamp_bw(&self, bw_raw: u64) -> u64 {
        let mut bw = bw_raw;

        if self.last_bw > 0 {
            let low = mul_div_u64(
                self.last_bw,
                config::BW_CLAMP_LOW_NUM,
                config::BW_CLAMP_LOW_DEN,
                self.last_bw,
            );
            let high = mul_div_u64(
                self.last_bw,
                config::BW_CLAMP_HIGH_NUM,
                config::BW_CLAMP_HIGH_DEN,
                self.last_bw,
            );
            bw = clamp_u64(bw, low, high);

            if self.curr_rtt > 2 * self.last_min_rtt {
                bw = self.last_bw;
            }
        }

        let min_bw = self.mss as u64;
        let max_bw = config::MAX_CWND as u64 * self.mss as u64;
        clamp_u64(bw, min_bw, max_bw)
    }

    /// §4.2 fairness coefficient: `gamma = curr_cwnd^2 * mss`, `beta = 2 * bytes_in_flight^2`.
    fn fairness_coefficient(&self) -> u32 {
        if self.bytes_in_flight == 0 {
            return 2;
        }

        let gamma = (self.curr_cwnd as u128)
            .saturating_mul(self.curr_cwnd as u128)
            .saturating_mul(self.mss as u128);
        let beta = 2u128.saturating_mul((self.bytes_in_flight as u128).saturating_mul(self.bytes_in_flight as u128));

        let ratio = if beta == 0 { gamma } else { gamma / beta };
        (ratio as u32).saturating_add(1)
    }
}
