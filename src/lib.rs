#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod recovery;

pub use recovery::spline::{AckResult, CaState, Event, FlowController, Sample};

/// Asserts two floating point (or fixed-point ratio) expressions are within `delta` of
/// each other
#[cfg(test)]
#[macro_export]
macro_rules! assert_delta {
    ($x:expr, $y:expr, $d:expr) => {
        let x = $x as f64;
        let y = $y as f64;
        let d = $d as f64;
        if (x - y).abs() > d {
            panic!(
                "assertion failed: `(left !== right)` \
                 (left: `{:?}`, right: `{:?}`, delta: `{:?}`)",
                x, y, d
            );
        }
    };
}
