use serde::Serialize;
use spectrum_types::NormalizedPoint;

/// Inset between the surface edge and the plot area, in CSS pixels.
pub const DEFAULT_MARGIN_CSS: f64 = 50.0;
/// Share of the smaller viewport dimension the square surface occupies.
pub const DEFAULT_FILL_FRACTION: f64 = 0.8;

/// A position on the draw surface in device pixels, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: PixelPoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Host window description the surface is laid out in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub css_width: f64,
    pub css_height: f64,
    pub device_pixel_ratio: f64,
}

impl Viewport {
    pub fn new(css_width: f64, css_height: f64, device_pixel_ratio: f64) -> Self {
        Self {
            css_width,
            css_height,
            device_pixel_ratio,
        }
    }

    fn sanitized_ratio(&self) -> f64 {
        if self.device_pixel_ratio.is_finite() && self.device_pixel_ratio > 0.0 {
            self.device_pixel_ratio
        } else {
            1.0
        }
    }
}

/// Bidirectional mapping between normalized space and device pixels.
///
/// `px = M + x·(W−2M)` and `py = H − M − y·(H−2M)`, so y grows upwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTransform {
    width: f64,
    height: f64,
    margin: f64,
}

impl SurfaceTransform {
    /// Returns `None` when the plot area would be empty or the inputs are
    /// not finite.
    pub fn new(width: f64, height: f64, margin: f64) -> Option<Self> {
        let finite = width.is_finite() && height.is_finite() && margin.is_finite();
        if !finite || margin < 0.0 || width - 2.0 * margin <= 0.0 || height - 2.0 * margin <= 0.0
        {
            return None;
        }
        Some(Self {
            width,
            height,
            margin,
        })
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Pixels per normalized unit along x.
    pub fn scale_x(&self) -> f64 {
        self.width - 2.0 * self.margin
    }

    /// Pixels per normalized unit along y.
    pub fn scale_y(&self) -> f64 {
        self.height - 2.0 * self.margin
    }

    pub fn to_pixel(&self, point: NormalizedPoint) -> PixelPoint {
        PixelPoint {
            x: self.margin + point.x * self.scale_x(),
            y: self.height - self.margin - point.y * self.scale_y(),
        }
    }

    /// Inverse of [`to_pixel`](Self::to_pixel). Not clamped: positions outside
    /// the plot area map outside [0, 1].
    pub fn to_normalized(&self, pixel: PixelPoint) -> NormalizedPoint {
        NormalizedPoint {
            x: (pixel.x - self.margin) / self.scale_x(),
            y: 1.0 - (pixel.y - self.margin) / self.scale_y(),
        }
    }
}

/// The square, responsive game surface.
///
/// Holds only the inputs; the transform is re-derived from them on demand so a
/// resize or pixel ratio change can never leave a stale mapping behind.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSurface {
    viewport: Viewport,
    fill_fraction: f64,
    margin_css: f64,
}

impl GameSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            fill_fraction: DEFAULT_FILL_FRACTION,
            margin_css: DEFAULT_MARGIN_CSS,
        }
    }

    /// Custom layout: `fill_fraction` of the smaller viewport side, inset by
    /// `margin_css`.
    pub fn with_layout(viewport: Viewport, fill_fraction: f64, margin_css: f64) -> Self {
        Self {
            viewport,
            fill_fraction,
            margin_css,
        }
    }

    pub fn resize(&mut self, css_width: f64, css_height: f64) {
        self.viewport.css_width = css_width;
        self.viewport.css_height = css_height;
    }

    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.viewport.device_pixel_ratio = ratio;
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.viewport.sanitized_ratio()
    }

    /// Side of the square surface in CSS pixels.
    pub fn css_side(&self) -> f64 {
        self.viewport.css_width.min(self.viewport.css_height).max(0.0) * self.fill_fraction
    }

    /// Side of the square surface in device pixels.
    pub fn device_side(&self) -> f64 {
        self.css_side() * self.device_pixel_ratio()
    }

    /// Convert a length given in CSS pixels to device pixels.
    pub fn css_to_device(&self, css: f64) -> f64 {
        css * self.device_pixel_ratio()
    }

    pub fn transform(&self) -> Option<SurfaceTransform> {
        let side = self.device_side();
        SurfaceTransform::new(side, side, self.css_to_device(self.margin_css))
    }
}
