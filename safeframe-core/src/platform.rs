//! Host-environment abstraction.
//!
//! The engine never reads ambient globals. The host injects three
//! collaborators at construction: a capability probe that selects the
//! measurement strategy, a viewport measurement source, and a font-size side
//! channel for em/rem-relative sizing in the consuming application.

use std::sync::Arc;

use crate::geometry::Viewport;

/// Answers the two capability questions that pick the raw measurement
/// strategy.
///
/// TV-class and desktop-browser-class runtimes report trustworthy inner
/// window sizes; anything else gets the defensive `min(outer, inner)`
/// treatment.
pub trait PlatformProbe: Send + Sync {
    /// Whether this is a TV runtime.
    fn is_tv(&self) -> bool;

    /// Whether this is a desktop-browser-class runtime.
    fn is_desktop_browser(&self) -> bool;
}

impl<T> PlatformProbe for Arc<T>
where
    T: PlatformProbe + ?Sized,
{
    fn is_tv(&self) -> bool {
        (**self).is_tv()
    }

    fn is_desktop_browser(&self) -> bool {
        (**self).is_desktop_browser()
    }
}

/// Raw viewport measurements from the host window system.
///
/// Both sizes are refreshed per query; the engine owns all caching.
pub trait ViewportSource: Send + Sync {
    /// Usable inner window size in device-independent pixels.
    fn inner_size(&self) -> Viewport;

    /// Outer window size. Hosts without a distinct outer size report the
    /// inner size.
    fn outer_size(&self) -> Viewport {
        self.inner_size()
    }
}

impl<T> ViewportSource for Arc<T>
where
    T: ViewportSource + ?Sized,
{
    fn inner_size(&self) -> Viewport {
        (**self).inner_size()
    }

    fn outer_size(&self) -> Viewport {
        (**self).outer_size()
    }
}

/// Font-size side channel on the document-root equivalent.
///
/// The engine writes percentage strings such as `"150%"` after each
/// recomputation.
pub trait FontSink: Send + Sync {
    /// Write the root font-size value.
    fn set_font_size(&self, value: &str);
}

impl<T> FontSink for Arc<T>
where
    T: FontSink + ?Sized,
{
    fn set_font_size(&self, value: &str) {
        (**self).set_font_size(value);
    }
}

/// Font sink for hosts with no document root. Discards every write.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFontSink;

impl FontSink for NoopFontSink {
    fn set_font_size(&self, _value: &str) {}
}

/// Probe reporting fixed capability flags.
///
/// Useful for embedded hosts with a known runtime class, and as a test
/// double.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedProbe {
    /// Report a TV-class runtime.
    pub tv: bool,
    /// Report a desktop-browser-class runtime.
    pub desktop_browser: bool,
}

impl PlatformProbe for FixedProbe {
    fn is_tv(&self) -> bool {
        self.tv
    }

    fn is_desktop_browser(&self) -> bool {
        self.desktop_browser
    }
}

/// Viewport source that always reports the same sizes.
///
/// Covers fixed-panel embedded hosts; also the standard test double.
#[derive(Debug, Clone, Copy)]
pub struct FixedViewport {
    inner: Viewport,
    outer: Viewport,
}

impl FixedViewport {
    /// Source where inner and outer sizes coincide.
    #[must_use]
    pub const fn new(viewport: Viewport) -> Self {
        Self {
            inner: viewport,
            outer: viewport,
        }
    }

    /// Source with divergent inner and outer sizes, as seen in windowed or
    /// embedded contexts.
    #[must_use]
    pub const fn with_outer(inner: Viewport, outer: Viewport) -> Self {
        Self { inner, outer }
    }
}

impl ViewportSource for FixedViewport {
    fn inner_size(&self) -> Viewport {
        self.inner
    }

    fn outer_size(&self) -> Viewport {
        self.outer
    }
}
