//! # Safe Frame Core
//!
//! Viewport-to-safe-frame scaling engine for fixed-aspect-ratio (16:9)
//! content. Computes a letterboxed/pillarboxed safe frame for an arbitrary
//! viewport and keeps it current as the viewport resizes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 ScaleEngine                 │
//! ├─────────────────────────────────────────────┤
//! │  Measurement     │  Resize handling         │
//! │  - cached w/h    │  - 150 ms debounce       │
//! │  - per-runtime   │  - listener registry     │
//! │    strategies    │  - panic isolation       │
//! ├─────────────────────────────────────────────┤
//! │  Geometry        │  Host abstraction        │
//! │  - 16:9 fit      │  - PlatformProbe         │
//! │  - insets        │  - ViewportSource        │
//! │  - font scale    │  - FontSink              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! The host constructs one [`ScaleEngine`] at startup and injects its
//! platform collaborators through [`HostEnv`]; UI consumers receive the
//! engine by handle and re-read [`ScaleEngine::scale_info`] whenever a
//! registered resize listener fires.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod engine;
pub mod error;
pub mod geometry;
pub mod platform;

pub use engine::{HostEnv, ListenerGuard, ResizeCallback, ScaleEngine, RESIZE_DEBOUNCE};
pub use error::{SafeFrameError, SafeFrameResult};
pub use geometry::{
    SafeFrameInsets, ScaleResult, Viewport, DEFAULT_PIXEL_RATIO, FONT_SCALE_MULTIPLIER,
    REFERENCE_ASPECT_RATIO, REFERENCE_HEIGHT, REFERENCE_WIDTH, SAFE_FRAME_REM_HEIGHT,
    SAFE_FRAME_REM_WIDTH,
};
pub use platform::{
    FixedProbe, FixedViewport, FontSink, NoopFontSink, PlatformProbe, ViewportSource,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
