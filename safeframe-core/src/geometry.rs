//! Reference-resolution scaling geometry.
//!
//! Pure functions that fit a 16:9 safe frame inside an arbitrary viewport:
//! limiting-dimension scale factor, font-scale percentage for em/rem-relative
//! sizing, and the centering insets between the safe frame and the viewport
//! edges.

use serde::{Deserialize, Serialize};

use crate::error::{SafeFrameError, SafeFrameResult};

/// Reference design width in device-independent pixels.
pub const REFERENCE_WIDTH: f64 = 1920.0;

/// Reference design height in device-independent pixels.
pub const REFERENCE_HEIGHT: f64 = 1080.0;

/// Multiplier applied to the limiting dimension to produce the root
/// font-size percentage. At the reference resolution the font scale is
/// exactly this value.
pub const FONT_SCALE_MULTIPLIER: f64 = 150.0;

/// Pixel ratio applied to the defensive `min(outer, inner)` measurement
/// strategy for windowed or embedded runtimes.
pub const DEFAULT_PIXEL_RATIO: f64 = 1.0;

/// Target aspect ratio of the safe frame (16:9).
pub const REFERENCE_ASPECT_RATIO: f64 = REFERENCE_WIDTH / REFERENCE_HEIGHT;

/// Safe-frame width in rem units, for consumers that lay out in rem against
/// the root font size the engine maintains.
pub const SAFE_FRAME_REM_WIDTH: f64 = 80.0;

/// Safe-frame height in rem units. 80:45 keeps the 16:9 ratio.
pub const SAFE_FRAME_REM_HEIGHT: f64 = 45.0;

/// Raw usable viewport size in device-independent pixels.
///
/// Both dimensions are strictly positive. Measurements coming from trusted
/// host collaborators are built directly; numbers crossing an untrusted
/// boundary go through [`Viewport::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in device-independent pixels.
    pub width: f64,
    /// Height in device-independent pixels.
    pub height: f64,
}

impl Viewport {
    /// Validate a measurement from an untrusted source.
    ///
    /// # Errors
    ///
    /// Returns [`SafeFrameError::InvalidViewport`] if either dimension is
    /// non-positive or non-finite.
    pub fn new(width: f64, height: f64) -> SafeFrameResult<Self> {
        if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
            Ok(Self { width, height })
        } else {
            Err(SafeFrameError::InvalidViewport { width, height })
        }
    }

    /// Aspect ratio `width / height`.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Whether the width is the constraining dimension when fitting a 16:9
    /// frame into this viewport.
    ///
    /// A viewport narrower than 16:9 is "too tall": the frame spans the full
    /// width and leaves vertical insets.
    #[must_use]
    pub fn is_width_constrained(&self) -> bool {
        self.aspect_ratio() < REFERENCE_ASPECT_RATIO
    }
}

/// Symmetric padding between the viewport edges and the centered safe frame.
///
/// `top == bottom` and `left == right` by construction, and at most one axis
/// is non-zero: the safe frame always touches both edges on whichever axis
/// constrains it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SafeFrameInsets {
    /// Distance from the top viewport edge.
    pub top: f64,
    /// Distance from the bottom viewport edge.
    pub bottom: f64,
    /// Distance from the left viewport edge.
    pub left: f64,
    /// Distance from the right viewport edge.
    pub right: f64,
}

impl SafeFrameInsets {
    /// Insets of a viewport that is exactly 16:9.
    pub const ZERO: Self = Self {
        top: 0.0,
        bottom: 0.0,
        left: 0.0,
        right: 0.0,
    };
}

/// Complete derived output of the scaling engine: safe-frame pixel
/// dimensions, font-scale percentage, and centering insets.
///
/// `width / height` equals 16:9 within floating-point tolerance, and neither
/// dimension exceeds the viewport it was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleResult {
    /// Safe-frame width in pixels.
    pub width: f64,
    /// Safe-frame height in pixels.
    pub height: f64,
    /// Font-scale percentage (150 at the reference resolution).
    pub scale_ratio: f64,
    /// Padding between the viewport edges and the safe frame.
    pub insets: SafeFrameInsets,
}

impl ScaleResult {
    /// Serialize to JSON for transport to UI consumers.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> SafeFrameResult<String> {
        serde_json::to_string(self).map_err(SafeFrameError::Serialization)
    }

    /// Deserialize from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails.
    pub fn from_json(json: &str) -> SafeFrameResult<Self> {
        serde_json::from_str(json).map_err(SafeFrameError::Serialization)
    }
}

/// Limiting-dimension scale factor ("fit inside, preserve aspect ratio").
///
/// `1.0` at the reference resolution, `2.0` at 3840x2160.
#[must_use]
pub fn scale_ratio(viewport: Viewport) -> f64 {
    if viewport.is_width_constrained() {
        viewport.width / REFERENCE_WIDTH
    } else {
        viewport.height / REFERENCE_HEIGHT
    }
}

/// Font-scale percentage for the root element.
///
/// Same branch as [`scale_ratio`] in percentage form: a 1280x720 viewport
/// yields `1280 * 150 / 1920 = 100`.
#[must_use]
pub fn font_scale(viewport: Viewport) -> f64 {
    if viewport.is_width_constrained() {
        viewport.width * FONT_SCALE_MULTIPLIER / REFERENCE_WIDTH
    } else {
        viewport.height * FONT_SCALE_MULTIPLIER / REFERENCE_HEIGHT
    }
}

/// Fit a 16:9 safe frame inside `viewport` and center it.
///
/// A viewport narrower than 16:9 is width-constrained: the frame spans the
/// full width and the leftover height becomes top/bottom insets. Otherwise
/// the frame spans the full height and the leftover width becomes left/right
/// insets. Centering offsets are clamped at zero.
#[must_use]
pub fn scale_info(viewport: Viewport) -> ScaleResult {
    let (width, height) = if viewport.is_width_constrained() {
        (viewport.width, viewport.width / REFERENCE_ASPECT_RATIO)
    } else {
        (viewport.height * REFERENCE_ASPECT_RATIO, viewport.height)
    };

    let horizontal = ((viewport.width - width) / 2.0).max(0.0);
    let vertical = ((viewport.height - height) / 2.0).max(0.0);

    ScaleResult {
        width,
        height,
        scale_ratio: font_scale(viewport),
        insets: SafeFrameInsets {
            top: vertical,
            bottom: vertical,
            left: horizontal,
            right: horizontal,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn vp(width: f64, height: f64) -> Viewport {
        Viewport::new(width, height).expect("test viewport should be valid")
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < TOLERANCE,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_reference_resolution_is_identity() {
        let info = scale_info(vp(1920.0, 1080.0));
        assert_close(info.width, 1920.0);
        assert_close(info.height, 1080.0);
        assert_close(info.scale_ratio, 150.0);
        assert_eq!(info.insets, SafeFrameInsets::ZERO);
    }

    #[test]
    fn test_exact_16_9_viewports_have_zero_insets() {
        for (width, height) in [(1280.0, 720.0), (2560.0, 1440.0), (3840.0, 2160.0)] {
            let info = scale_info(vp(width, height));
            assert_close(info.width, width);
            assert_close(info.height, height);
            assert_eq!(info.insets, SafeFrameInsets::ZERO);
        }
    }

    #[test]
    fn test_wider_viewport_is_pillarboxed() {
        let info = scale_info(vp(2560.0, 1080.0));
        assert_close(info.width, 1920.0);
        assert_close(info.height, 1080.0);
        assert_close(info.insets.left, 320.0);
        assert_close(info.insets.right, 320.0);
        assert_close(info.insets.top, 0.0);
        assert_close(info.insets.bottom, 0.0);
    }

    #[test]
    fn test_taller_viewport_is_letterboxed() {
        let info = scale_info(vp(1920.0, 1440.0));
        assert_close(info.width, 1920.0);
        assert_close(info.height, 1080.0);
        assert_close(info.insets.top, 180.0);
        assert_close(info.insets.bottom, 180.0);
        assert_close(info.insets.left, 0.0);
        assert_close(info.insets.right, 0.0);
    }

    #[test]
    fn test_safe_frame_preserves_aspect_ratio_and_fits() {
        for (width, height) in [(800.0, 1200.0), (3000.0, 900.0), (1366.0, 768.0)] {
            let viewport = vp(width, height);
            let info = scale_info(viewport);
            assert_close(info.width / info.height, REFERENCE_ASPECT_RATIO);
            assert!(info.width <= viewport.width + TOLERANCE);
            assert!(info.height <= viewport.height + TOLERANCE);
        }
    }

    #[test]
    fn test_at_most_one_inset_axis_is_nonzero() {
        for (width, height) in [(2560.0, 1080.0), (1920.0, 1440.0), (1280.0, 720.0)] {
            let insets = scale_info(vp(width, height)).insets;
            assert!(insets.left < TOLERANCE || insets.top < TOLERANCE);
            assert_close(insets.left, insets.right);
            assert_close(insets.top, insets.bottom);
        }
    }

    #[test]
    fn test_font_scale_percentages() {
        assert_close(font_scale(vp(1280.0, 720.0)), 100.0);
        assert_close(font_scale(vp(1920.0, 1080.0)), 150.0);
        assert_close(font_scale(vp(3840.0, 2160.0)), 300.0);
    }

    #[test]
    fn test_scale_ratio_uses_limiting_dimension() {
        // Narrower than 16:9: width limits.
        assert_close(scale_ratio(vp(960.0, 1080.0)), 0.5);
        // Wider than 16:9: height limits.
        assert_close(scale_ratio(vp(2560.0, 1080.0)), 1.0);
        assert_close(scale_ratio(vp(3840.0, 2160.0)), 2.0);
    }

    #[test]
    fn test_viewport_rejects_bad_dimensions() {
        assert!(Viewport::new(0.0, 1080.0).is_err());
        assert!(Viewport::new(1920.0, -1.0).is_err());
        assert!(Viewport::new(f64::NAN, 1080.0).is_err());
        assert!(Viewport::new(1920.0, f64::INFINITY).is_err());
        assert!(Viewport::new(1.0, 1.0).is_ok());
    }

    #[test]
    fn test_rem_constants_match_reference_ratio() {
        assert_close(SAFE_FRAME_REM_WIDTH / SAFE_FRAME_REM_HEIGHT, 16.0 / 9.0);
    }

    #[test]
    fn test_scale_result_json_round_trip() {
        let info = scale_info(vp(2560.0, 1080.0));
        let json = info.to_json().expect("should serialize");
        let parsed = ScaleResult::from_json(&json).expect("should deserialize");
        assert_eq!(parsed, info);
    }
}
