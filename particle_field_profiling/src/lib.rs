//! # Particle Field Profiling
//!
//! Frame-time monitoring and the advisory adaptation policy for the particle field.
//!
//! ## Modules
//!
//! - [`monitoring`] - Frame sampling, memory probing and the subscribable monitor
//! - [`adaptation`] - Turns metrics snapshots into configuration suggestions
//!
//! ## Example
//!
//! ```rust
//! use particle_field_profiling::{MonitorSettings, PerformanceMonitor};
//! use std::time::Duration;
//!
//! let mut monitor = PerformanceMonitor::new(MonitorSettings::default());
//! let subscription = monitor.subscribe(|metrics| println!("fps: {:.1}", metrics.fps));
//! monitor.start();
//! monitor.record_frame(Duration::from_millis(16));
//! subscription.unsubscribe();
//! ```

// Macro for implementing Default trait
#[macro_export]
macro_rules! impl_default {
    ($type:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $type {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}

pub mod adaptation;
pub mod monitoring;

// Re-export public APIs
pub use adaptation::{AdaptationPolicy, AdaptationReason, AdaptationSuggestion};
pub use monitoring::*;
