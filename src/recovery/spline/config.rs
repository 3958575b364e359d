// Copyright Amazon.com, Inc. or its affiliates. All Rights Reserved.
// SPDX-License-Identifier: Apache-2.0

//! Compile-time tunables for the Spline controller.
//!
//! These are `pub const`s rather than a parsed configuration file, following the
//! teacher crate's own approach to congestion control tuning (e.g. `cubic.rs`'s
//! `C`/`BETA_CUBIC`, `hybrid_slow_start.rs`'s `N_SAMPLING`/`LOW_SSTHRESH`): values
//! fixed for binary compatibility, not runtime-configurable.

/// Ceiling on the congestion window, in segments.
pub const MAX_CWND: u32 = 900_000;

/// RTT samples above this value (microseconds) are clamped down to `MIN_RTT_US`.
pub const MAX_RTT_US: u32 = 1_000_000;

/// Floor substituted when a host reports a zero or out-of-range RTT sample.
pub const MIN_RTT_US: u32 = 1;

/// Segment size substituted when the host reports a zero MSS.
pub const MSS_DEFAULT: u32 = 1448;

/// Numerator/denominator of the 75/25 EMA applied to `last_bw`.
pub const EMA_NUM: u64 = 3;
pub const EMA_DEN: u64 = 4;

/// Per-sample bandwidth clamp relative to `last_bw`: `[3/4, 6/4]`.
pub const BW_CLAMP_LOW_NUM: u64 = 3;
pub const BW_CLAMP_LOW_DEN: u64 = 4;
pub const BW_CLAMP_HIGH_NUM: u64 = 6;
pub const BW_CLAMP_HIGH_DEN: u64 = 4;

/// Number of `on_ack` calls that make up one epoch before the mode arbiter rolls
/// over. The source material disagrees between a 10-tick simulator/user-space
/// cadence and a 4-tick kernel cadence (see DESIGN.md); this build picks 10 and
/// keeps it a single named constant so a kernel-cadence build is a one-line change.
pub const EPOCH_CAP: u32 = 10;

/// Width of the minimum-RTT sliding window, in host ticks. Assumes the host's
/// tick unit is microseconds, matching `rtt_us`'s unit, so the window is
/// expressed directly in ticks rather than a separate duration type.
pub const MIN_RTT_WINDOW_TICKS: u32 = 10 * 1_000_000;

/// Base scale for fixed-point intermediates (ε/γ clamps, cwnd-gain path).
pub const FIXED_SHIFT: u32 = 10;

/// Scale used for the bandwidth-domain fixed-point intermediates.
pub const BW_SCALE: u32 = 12;
