// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

/// An opaque, monotonically increasing tick counter supplied by the host.
///
/// The core does not measure time itself; the host is responsible for choosing a
/// tick unit (microseconds, matching `rtt_us`'s unit) and for ensuring ticks
/// increase across calls on one [`super::FlowController`] instance.
pub type HostTick = u32;

/// A single per-ACK measurement reported by the host transport.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Latest RTT sample, in microseconds.
    pub rtt_us: u32,
    /// Cumulative count of delivered segments reported by the host.
    pub delivered_segments: u32,
    /// Bytes newly acked or sacked in this event.
    pub acked_sacked_bytes: u32,
    /// Outstanding unacknowledged bytes at the time of this event.
    pub bytes_in_flight: u32,
    /// Segment size in bytes; `0` is promoted to [`config::MSS_DEFAULT`](super::config::MSS_DEFAULT).
    pub mss: u32,
    /// The host's congestion-avoidance state at the time of this event.
    pub ca_state: CaState,
    /// Opaque host-side timestamp, in ticks.
    pub host_time_ticks: HostTick,
}

/// The host's congestion-avoidance state, as reported alongside a [`Sample`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaState {
    Open,
    Recovery,
    Loss,
}

/// The result of a single [`super::FlowController::on_ack`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AckResult {
    /// The updated congestion window, in segments. Always `>= 1`.
    pub cwnd_segments: u32,
    /// The updated pacing rate, in bytes per second. Always `>= 1`.
    pub pacing_rate_bps: u64,
    /// Whether the host should pace packets for this flow right now.
    ///
    /// Disabled in [`Mode::StartProbe`]; enabled in every other mode.
    pub pacing_enabled: bool,
}

/// Host-notified lifecycle events recognized by [`super::FlowController::event`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    CwndRestart,
    TxStart,
    Loss,
    RecoveryEnter,
    RecoveryExit,
}

/// The probe-mode state machine's four states (component C3).
///
/// Modeled as an exhaustive tagged variant rather than an integer, per the
/// re-architecture guidance: the arbiter's transitions are total over this type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    StartProbe,
    ProbeBw,
    ProbeRtt,
    DrainProbe,
}
