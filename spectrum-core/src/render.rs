use serde::Serialize;
use spectrum_types::{Guess, NormalizedPoint, SpectrumLabels, Target};
use std::collections::HashSet;

use crate::{GameSurface, LeaderboardView, PixelPoint, SelectedPoint, SurfaceTransform};

const POINT_RADIUS_CSS: f64 = 5.0;
const HIGHLIGHT_RADIUS_CSS: f64 = 9.0;
const ANNOTATION_OFFSET_CSS: f64 = 12.0;
const FONT_SIZE_CSS: f64 = 16.0;
const ARROW_HEAD_CSS: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const BACKGROUND: Color = Color::rgba(0x2A, 0x2A, 0x2A, 255);
    pub const GRID: Color = Color::rgba(255, 255, 255, 255);
    pub const LABEL: Color = Color::rgba(255, 255, 255, 255);
    pub const OWN_GUESS: Color = Color::rgba(75, 192, 192, 153);
    pub const LEADERBOARD: Color = Color::rgba(255, 193, 7, 200);
    pub const TARGET: Color = Color::rgba(220, 38, 38, 255);
    pub const HIGHLIGHT: Color = Color::rgba(255, 255, 0, 255);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Paint order of a frame. Commands in a frame never go back to an earlier layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Layer {
    Background,
    Grid,
    AxisArrows,
    AxisLabels,
    Leaderboard,
    OwnGuesses,
    Target,
    Selection,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DrawCommand {
    Clear {
        color: Color,
    },
    Line {
        from: PixelPoint,
        to: PixelPoint,
        color: Color,
        width: f64,
    },
    Arrow {
        from: PixelPoint,
        to: PixelPoint,
        head: f64,
        color: Color,
        width: f64,
    },
    Rect {
        origin: PixelPoint,
        width: f64,
        height: f64,
        color: Color,
        line_width: f64,
    },
    Circle {
        center: PixelPoint,
        radius: f64,
        color: Color,
        filled: bool,
    },
    Text {
        at: PixelPoint,
        text: String,
        size: f64,
        color: Color,
        align: TextAlign,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawItem {
    pub layer: Layer,
    pub command: DrawCommand,
}

/// A fully described frame in device pixels. Two frames that compare equal
/// paint identical pixels on any deterministic backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub items: Vec<DrawItem>,
}

impl Frame {
    pub fn empty() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            items: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = &DrawCommand> {
        self.items
            .iter()
            .filter(move |item| item.layer == layer)
            .map(|item| &item.command)
    }

    /// Replay the frame onto a backend.
    pub fn paint(&self, surface: &mut dyn DrawSurface) {
        surface.begin(self.width, self.height);
        for item in &self.items {
            surface.draw(item.layer, &item.command);
        }
    }
}

/// A backend a [`Frame`] can be painted onto.
pub trait DrawSurface {
    fn begin(&mut self, width: f64, height: f64);
    fn draw(&mut self, layer: Layer, command: &DrawCommand);
}

/// Everything a frame depends on, borrowed read-only from the game state.
pub struct RenderInput<'a> {
    pub surface: &'a GameSurface,
    pub labels: Option<&'a SpectrumLabels>,
    pub target: Option<&'a Target>,
    pub guesses: &'a [Guess],
    pub leaderboard: &'a LeaderboardView,
    pub selection: Option<&'a SelectedPoint>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Renderer;

struct FrameBuilder {
    items: Vec<DrawItem>,
}

impl FrameBuilder {
    fn push(&mut self, layer: Layer, command: DrawCommand) {
        self.items.push(DrawItem { layer, command });
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Pure function of the input: same input, same frame.
    pub fn render(&self, input: &RenderInput<'_>) -> Frame {
        let Some(transform) = input.surface.transform() else {
            return Frame::empty();
        };
        let css = |v: f64| input.surface.css_to_device(v);
        let mut frame = FrameBuilder { items: Vec::new() };

        frame.push(
            Layer::Background,
            DrawCommand::Clear {
                color: Color::BACKGROUND,
            },
        );

        self.draw_grid(&mut frame, &transform, css(1.0));
        self.draw_axis_arrows(&mut frame, &transform, css(1.0), css(ARROW_HEAD_CSS));
        if let Some(labels) = input.labels {
            self.draw_axis_labels(&mut frame, &transform, labels, css(FONT_SIZE_CSS));
        }

        let own_ids: HashSet<&str> = input.guesses.iter().map(|g| g.id.as_str()).collect();
        for entry in input.leaderboard.entries() {
            if own_ids.contains(entry.id.as_str()) {
                continue;
            }
            frame.push(
                Layer::Leaderboard,
                DrawCommand::Circle {
                    center: transform.to_pixel(entry.point.clamped()),
                    radius: css(POINT_RADIUS_CSS),
                    color: Color::LEADERBOARD,
                    filled: true,
                },
            );
        }

        for guess in input.guesses {
            frame.push(
                Layer::OwnGuesses,
                DrawCommand::Circle {
                    center: transform.to_pixel(guess.point.clamped()),
                    radius: css(POINT_RADIUS_CSS),
                    color: Color::OWN_GUESS,
                    filled: true,
                },
            );
        }

        if let Some(target) = input.target {
            let center = transform.to_pixel(target.point.clamped());
            let half_w = target.size * transform.scale_x();
            let half_h = target.size * transform.scale_y();
            frame.push(
                Layer::Target,
                DrawCommand::Rect {
                    origin: PixelPoint::new(center.x - half_w, center.y - half_h),
                    width: 2.0 * half_w,
                    height: 2.0 * half_h,
                    color: Color::TARGET,
                    line_width: css(2.0),
                },
            );
        }

        if let Some(selected) = input.selection {
            let center = transform.to_pixel(selected.point.clamped());
            frame.push(
                Layer::Selection,
                DrawCommand::Circle {
                    center,
                    radius: css(HIGHLIGHT_RADIUS_CSS),
                    color: Color::HIGHLIGHT,
                    filled: false,
                },
            );
            frame.push(
                Layer::Selection,
                DrawCommand::Text {
                    at: PixelPoint::new(
                        center.x + css(ANNOTATION_OFFSET_CSS),
                        center.y - css(ANNOTATION_OFFSET_CSS),
                    ),
                    text: selected.word.clone(),
                    size: css(FONT_SIZE_CSS),
                    color: Color::HIGHLIGHT,
                    align: TextAlign::Left,
                },
            );
        }

        Frame {
            width: transform.width(),
            height: transform.height(),
            items: frame.items,
        }
    }

    fn draw_grid(&self, frame: &mut FrameBuilder, transform: &SurfaceTransform, width: f64) {
        let m = transform.margin();
        frame.push(
            Layer::Grid,
            DrawCommand::Rect {
                origin: PixelPoint::new(m, m),
                width: transform.scale_x(),
                height: transform.scale_y(),
                color: Color::GRID,
                line_width: 2.0 * width,
            },
        );

        let center = transform.to_pixel(NormalizedPoint::new(0.5, 0.5));
        frame.push(
            Layer::Grid,
            DrawCommand::Line {
                from: PixelPoint::new(m, center.y),
                to: PixelPoint::new(transform.width() - m, center.y),
                color: Color::GRID,
                width,
            },
        );
        frame.push(
            Layer::Grid,
            DrawCommand::Line {
                from: PixelPoint::new(center.x, transform.height() - m),
                to: PixelPoint::new(center.x, m),
                color: Color::GRID,
                width,
            },
        );
    }

    // One arrow from the center towards each edge of the plot area.
    fn draw_axis_arrows(
        &self,
        frame: &mut FrameBuilder,
        transform: &SurfaceTransform,
        width: f64,
        head: f64,
    ) {
        use NormalizedPoint as P;
        let center = transform.to_pixel(P::new(0.5, 0.5));
        for end in [P::new(0.0, 0.5), P::new(1.0, 0.5), P::new(0.5, 0.0), P::new(0.5, 1.0)] {
            frame.push(
                Layer::AxisArrows,
                DrawCommand::Arrow {
                    from: center,
                    to: transform.to_pixel(end),
                    head,
                    color: Color::GRID,
                    width,
                },
            );
        }
    }

    fn draw_axis_labels(
        &self,
        frame: &mut FrameBuilder,
        transform: &SurfaceTransform,
        labels: &SpectrumLabels,
        size: f64,
    ) {
        let m = transform.margin();
        let w = transform.width();
        let h = transform.height();
        let placements = [
            (&labels.x_axis.low, PixelPoint::new(m, h - 0.4 * m), TextAlign::Left),
            (&labels.x_axis.high, PixelPoint::new(w - m, h - 0.4 * m), TextAlign::Right),
            (&labels.y_axis.low, PixelPoint::new(0.2 * m, h - m), TextAlign::Left),
            (&labels.y_axis.high, PixelPoint::new(0.2 * m, m + size), TextAlign::Left),
        ];
        for (text, at, align) in placements {
            if text.is_empty() {
                continue;
            }
            frame.push(
                Layer::AxisLabels,
                DrawCommand::Text {
                    at,
                    text: text.clone(),
                    size,
                    color: Color::LABEL,
                    align,
                },
            );
        }
    }
}
