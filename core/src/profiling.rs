//! Optional Tracy instrumentation for history replay.
//!
//! Enabled with the `profiling` Cargo feature. Without it every macro in this
//! module expands to nothing, so call sites can stay in place unconditionally.
//!
//! ```ignore
//! use hammer_core::{profile_plot, profile_scope};
//!
//! fn replay() {
//!     profile_scope!("history_undo");
//!     profile_plot!("history_bytes", 4096usize);
//! }
//! ```

#[cfg(feature = "profiling")]
pub use tracy_client::{self, plot as tracy_plot, span};

/// Create a profiling span for the current scope.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

/// Create a profiling span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Plot a value over time in Tracy, e.g. the byte size of an undo stack.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        $crate::profiling::tracy_plot!($name, $value as f64)
    };
}

/// Plot a value (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        let _ = $value;
    };
}
