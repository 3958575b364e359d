// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! The Spline sender-side congestion control decision core.
//!
//! A single per-connection [`FlowController`] value owns all state (§3's data
//! model); the host transport drives it exclusively through [`FlowController::on_ack`],
//! [`FlowController::ss_thresh`], and [`FlowController::event`] (§4.0). The five
//! components (C1-C5) are implemented as one `impl FlowController` block per
//! submodule.

pub(crate) mod arbiter;
pub(crate) mod config;
pub(crate) mod fixed_point;
pub(crate) mod pacing;
pub(crate) mod rate;
pub(crate) mod sample;
mod types;
pub(crate) mod window;
mod windowed_min;

pub use types::{AckResult, CaState, Event, Sample};
pub(crate) use types::Mode;

use windowed_min::WindowedMin;

/// The per-connection Spline congestion control core (§2's "Flow Controller").
///
/// Allocation-free, synchronous, and non-blocking: every field is a fixed-size
/// integer scalar, and every public method completes in bounded time. The host
/// transport owns the value and is responsible for supplying timestamps (as an
/// opaque, monotonically increasing tick counter) and RTT samples; the core never
/// measures time or performs I/O itself.
#[derive(Clone, Debug)]
pub struct FlowController {
    initial_cwnd: u32,
    curr_cwnd: u32,
    last_cwnd: u32,
    last_max_cwnd: u32,
    prior_cwnd: u32,
    min_cwnd: u32,
    curr_rtt: u32,
    last_rtt: u32,
    last_min_rtt: u32,
    last_min_rtt_stamp: types::HostTick,
    rtt_avg: u32,
    curr_ack: u32,
    last_ack: u32,
    last_acked_sacked: u32,
    bytes_in_flight: u32,
    mss: u32,
    bw: u64,
    last_bw: u64,
    throughput: u64,
    fairness_rat: u32,
    pacing_rate: u64,
    max_could_cwnd: u32,
    current_mode: Mode,
    epp: u32,
    epp_min_rtt: u32,
    prev_ca_state: CaState,
    probe_mode_started: bool,
    window: WindowedMin,
    pacing_gain_hint: u32,
}

impl FlowController {
    /// Creates a new controller. `initial_cwnd` seeds `curr_cwnd` and `min_cwnd`
    /// (the floor is never below 1 segment); `mss` seeds the segment size used
    /// until the first sample reports otherwise.
    pub fn new(initial_cwnd: u32, mss: u32) -> Self {
        let initial_cwnd = initial_cwnd.max(1);
        let mss = if mss == 0 { config::MSS_DEFAULT } else { mss };
        Self {
            initial_cwnd,
            curr_cwnd: initial_cwnd,
            last_cwnd: initial_cwnd,
            last_max_cwnd: initial_cwnd,
            prior_cwnd: initial_cwnd,
            min_cwnd: initial_cwnd.max(1),
            curr_rtt: 0,
            last_rtt: 0,
            last_min_rtt: 0,
            last_min_rtt_stamp: 0,
            rtt_avg: 0,
            curr_ack: 0,
            last_ack: 0,
            last_acked_sacked: 0,
            bytes_in_flight: 0,
            mss,
            bw: 0,
            last_bw: 0,
            throughput: 0,
            fairness_rat: 2,
            pacing_rate: mss as u64,
            max_could_cwnd: 0,
            current_mode: Mode::StartProbe,
            epp: 0,
            epp_min_rtt: 0,
            prev_ca_state: CaState::Open,
            probe_mode_started: false,
            window: WindowedMin::new(config::MIN_RTT_WINDOW_TICKS),
            pacing_gain_hint: 1,
        }
    }

    /// §4.0.1: folds one per-ACK [`Sample`] into the controller's state and
    /// returns the updated cwnd and pacing rate. Infallible: malformed inputs are
    /// clamped by the sub-components rather than rejected.
    pub fn on_ack(&mut self, sample: Sample) -> AckResult {
        let intake = self.intake(&sample);
        let rate = self.estimate_rate();
        self.advance_mode(&intake, &rate);
        self.update_window(&intake, &rate);
        let (pacing_rate_bps, pacing_enabled) = self.update_pacing(rate.fairness_rat);
        self.pacing_gain_hint = Self::compute_pacing_gain_hint(intake.epsilon, intake.gamma);

        self.debug_assert_invariants();

        #[cfg(feature = "state-tracing")]
        tracing::trace!(
            cwnd = self.curr_cwnd,
            pacing_rate = pacing_rate_bps,
            mode = ?self.current_mode,
            "on_ack"
        );

        AckResult {
            cwnd_segments: self.curr_cwnd,
            pacing_rate_bps,
            pacing_enabled,
        }
    }

    /// §4.0.2: `max(⌊curr_cwnd · 14/16⌋, 1)`.
    pub fn ss_thresh(&self, _bytes_in_flight: u32) -> u32 {
        ((self.curr_cwnd as u64 * 14 / 16) as u32).max(1)
    }

    /// §4.0.3: host-notified lifecycle events.
    pub fn event(&mut self, kind: Event) {
        match kind {
            Event::CwndRestart | Event::TxStart => {
                self.curr_cwnd = self.initial_cwnd;
                self.current_mode = Mode::StartProbe;
                self.probe_mode_started = false;
                self.epp = 0;
                // `last_min_rtt`/`last_bw` are learned state and survive the reset.
            }
            Event::Loss => {
                self.prior_cwnd = self.curr_cwnd;
                self.prev_ca_state = CaState::Loss;
                let rate = self.estimate_rate();
                self.fairness_rat = rate.fairness_rat;
            }
            Event::RecoveryEnter => {
                self.prior_cwnd = self.curr_cwnd;
                self.prev_ca_state = CaState::Recovery;
            }
            Event::RecoveryExit => {
                self.prev_ca_state = CaState::Open;
            }
        }

        #[cfg(feature = "state-tracing")]
        tracing::trace!(?kind, cwnd = self.curr_cwnd, "event");
    }

    /// Produces a value-copy of this controller for a cloned flow (e.g. a host
    /// transport forking a listening socket's congestion state into an accepted
    /// connection). No state is shared between the original and the copy.
    pub fn fork(&self) -> Self {
        self.clone()
    }

    /// Mean of `last_min_rtt` and `last_rtt`, in microseconds. Diagnostic only: §3
    /// lists this as persistent state, but no formula in §4 reads it back (see
    /// DESIGN.md); the distilled spec's bandwidth path uses `last_min_rtt` directly.
    pub fn rtt_avg(&self) -> u32 {
        self.rtt_avg
    }

    /// The ε/γ-derived pacing gain hint from the original `pacing_gain_rate`,
    /// `(ε + γ) / ε` clamped to `[1, 3]`. Diagnostic only: it does not scale the
    /// `pacing_rate_bps` returned by [`Self::on_ack`] (§4.5 fully specifies that
    /// formula); hosts that want this signal for telemetry can read it here.
    pub fn pacing_gain_hint(&self) -> u32 {
        self.pacing_gain_hint
    }

    /// Debug-only check of §3's seven invariants, run at the end of every
    /// `on_ack`. Release builds rely on the explicit clamps each component
    /// already applies; this is a cross-check, not the enforcement mechanism.
    fn debug_assert_invariants(&self) {
        debug_assert!(self.min_cwnd >= 1 && self.curr_cwnd >= self.min_cwnd);
        debug_assert!(self.curr_cwnd <= config::MAX_CWND);
        debug_assert!(self.last_max_cwnd >= self.curr_cwnd);
        debug_assert!(self.last_min_rtt == 0 || self.curr_rtt == 0 || self.last_min_rtt <= self.curr_rtt);
        debug_assert!(self.pacing_rate >= 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(rtt_us: u32, delivered: u32, bytes_in_flight: u32, tick: u32) -> Sample {
        Sample {
            rtt_us,
            delivered_segments: delivered,
            acked_sacked_bytes: 1448,
            bytes_in_flight,
            mss: 1448,
            ca_state: CaState::Open,
            host_time_ticks: tick,
        }
    }

    #[test]
    fn new_seeds_invariants() {
        let fc = FlowController::new(10, 1448);
        assert_eq!(fc.curr_cwnd, 10);
        assert_eq!(fc.min_cwnd, 10);
        assert_eq!(fc.current_mode, Mode::StartProbe);
        assert!(fc.pacing_rate >= 1);
    }

    #[test]
    fn zero_initial_cwnd_is_promoted_to_one() {
        let fc = FlowController::new(0, 1448);
        assert_eq!(fc.min_cwnd, 1);
        assert_eq!(fc.curr_cwnd, 1);
    }

    #[test]
    fn on_ack_never_returns_a_zero_cwnd_or_pacing_rate() {
        let mut fc = FlowController::new(10, 1448);
        for tick in 0..50u32 {
            let result = fc.on_ack(sample(50_000, tick + 1, 1448 * (tick + 1), tick * 1000));
            assert!(result.cwnd_segments >= 1);
            assert!(result.pacing_rate_bps >= 1);
            assert!(result.cwnd_segments <= config::MAX_CWND);
        }
    }

    #[test]
    fn cwnd_restart_resets_cwnd_and_mode_but_keeps_learned_min_rtt() {
        let mut fc = FlowController::new(10, 1448);
        for tick in 0..5u32 {
            fc.on_ack(sample(50_000, tick + 1, 1448 * (tick + 1), tick * 1000));
        }
        let learned_min_rtt = fc.last_min_rtt;
        assert!(learned_min_rtt > 0);

        fc.event(Event::CwndRestart);
        assert_eq!(fc.curr_cwnd, fc.initial_cwnd);
        assert_eq!(fc.current_mode, Mode::StartProbe);
        assert_eq!(fc.last_min_rtt, learned_min_rtt);
    }

    #[test]
    fn cwnd_restart_then_zero_delta_ack_leaves_cwnd_at_initial() {
        let mut fc = FlowController::new(10, 1448);
        fc.on_ack(sample(50_000, 1, 1448, 0));
        fc.event(Event::CwndRestart);

        let mut s = sample(50_000, fc.curr_ack, 0, 1000);
        s.acked_sacked_bytes = 0;
        fc.on_ack(s);
        assert_eq!(fc.curr_cwnd, fc.initial_cwnd);
        assert_eq!(fc.current_mode, Mode::StartProbe);
    }

    #[test]
    fn loss_event_marks_prev_ca_state_and_snapshots_prior_cwnd() {
        let mut fc = FlowController::new(10, 1448);
        fc.on_ack(sample(50_000, 1, 1448, 0));
        let cwnd_before = fc.curr_cwnd;
        fc.event(Event::Loss);
        assert_eq!(fc.prev_ca_state, CaState::Loss);
        assert_eq!(fc.prior_cwnd, cwnd_before);
    }

    #[test]
    fn fork_produces_an_independent_copy() {
        let mut fc = FlowController::new(10, 1448);
        fc.on_ack(sample(50_000, 1, 1448, 0));
        let mut forked = fc.fork();
        forked.on_ack(sample(50_000, 2, 2896, 1000));
        assert_ne!(fc.curr_ack, forked.curr_ack);
    }

    #[test]
    fn ss_thresh_is_floored_at_one() {
        let fc = FlowController::new(1, 1448);
        assert_eq!(fc.ss_thresh(0), 1);
    }

    #[test]
    fn rtt_avg_and_pacing_gain_hint_are_readable_diagnostics() {
        let mut fc = FlowController::new(10, 1448);
        fc.on_ack(sample(50_000, 1, 1448, 0));
        fc.on_ack(sample(60_000, 2, 2896, 1000));
        // Both are derived, read-only diagnostics; neither feeds back into cwnd or
        // the returned pacing rate (§4.5 fully specifies that formula).
        assert!(fc.rtt_avg() > 0);
        assert!((1..=3).contains(&fc.pacing_gain_hint()));
    }

    #[test]
    fn rtt_inflation_past_double_min_rtt_holds_bw_and_drains() {
        // §8.4: warm up a min-RTT/bandwidth estimate, then inflate RTT past 2x
        // the established minimum with a starved ack. Expect `bw` held at
        // `last_bw`, `current_mode` forced to DRAIN_PROBE, and `curr_cwnd`
        // unable to grow past its pre-drain value.
        let mut fc = FlowController::new(10, 1448);
        for tick in 0..5u32 {
            fc.on_ack(sample(50_000, tick + 1, 1448 * (tick + 1), tick * 10_000));
        }
        let prior_cwnd = fc.curr_cwnd;
        let inflated_rtt = fc.last_min_rtt * 3;

        fc.on_ack(Sample {
            rtt_us: inflated_rtt,
            delivered_segments: fc.curr_ack,
            acked_sacked_bytes: 0,
            bytes_in_flight: fc.bytes_in_flight,
            mss: 1448,
            ca_state: CaState::Open,
            host_time_ticks: 1_000_000,
        });

        assert_eq!(fc.current_mode, Mode::DrainProbe);
        assert_eq!(fc.bw, fc.last_bw);
        assert!(fc.curr_cwnd <= prior_cwnd);
    }
}
