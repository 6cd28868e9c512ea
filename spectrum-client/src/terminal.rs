use spectrum_core::{
    DrawCommand, DrawSurface, Frame, GameEvent, Layer, PixelPoint, SelectionSource, TextAlign,
};

use crate::runtime::{Command, Notice, StatusLine};

pub const DEFAULT_COLUMNS: usize = 64;
pub const DEFAULT_ROWS: usize = 32;

pub const USAGE: &str = "\
Type a word to guess it. Commands:
  /click X Y    select the point nearest to device pixel (X, Y)
  /post NAME    post your win under NAME
  /resize W H   resize the viewport (CSS pixels)
  /dpr R        set the device pixel ratio
  /wins         list the win tally
  /show         draw the board
  /dump         print the current frame as JSON
  /quit         leave";

/// Character-grid backend. Device pixels are scaled down onto a fixed
/// number of columns and rows.
pub struct TextCanvas {
    columns: usize,
    rows: usize,
    cells: Vec<char>,
    pixels_per_column: f64,
    pixels_per_row: f64,
}

impl TextCanvas {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            columns,
            rows,
            cells: vec![' '; columns * rows],
            pixels_per_column: 0.0,
            pixels_per_row: 0.0,
        }
    }

    fn cell(&self, point: PixelPoint) -> Option<(usize, usize)> {
        if self.pixels_per_column <= 0.0 || self.pixels_per_row <= 0.0 {
            return None;
        }
        let column = (point.x / self.pixels_per_column).floor();
        let row = (point.y / self.pixels_per_row).floor();
        if column < 0.0 || row < 0.0 {
            return None;
        }
        let (column, row) = (column as usize, row as usize);
        (column < self.columns && row < self.rows).then_some((column, row))
    }

    fn put(&mut self, column: usize, row: usize, ch: char) {
        if column < self.columns && row < self.rows {
            self.cells[row * self.columns + column] = ch;
        }
    }

    fn plot(&mut self, point: PixelPoint, ch: char) {
        if let Some((column, row)) = self.cell(point) {
            self.put(column, row, ch);
        }
    }

    fn line(&mut self, from: PixelPoint, to: PixelPoint, ch: char) {
        if self.pixels_per_column <= 0.0 || self.pixels_per_row <= 0.0 {
            return;
        }
        let dx = (to.x - from.x) / self.pixels_per_column;
        let dy = (to.y - from.y) / self.pixels_per_row;
        let limit = (2 * (self.columns + self.rows)) as f64;
        let steps = dx.abs().max(dy.abs()).ceil().clamp(1.0, limit.max(1.0)) as usize;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            self.plot(
                PixelPoint::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t),
                ch,
            );
        }
    }

    fn text(&mut self, at: PixelPoint, text: &str, align: TextAlign) {
        let Some((column, row)) = self.cell(at) else {
            return;
        };
        let len = text.chars().count();
        let start = match align {
            TextAlign::Left => column,
            TextAlign::Center => column.saturating_sub(len / 2),
            TextAlign::Right => column.saturating_sub(len),
        };
        for (offset, ch) in text.chars().enumerate() {
            self.put(start + offset, row, ch);
        }
    }

    pub fn to_text(&self) -> String {
        self.cells
            .chunks(self.columns.max(1))
            .map(|row| row.iter().collect::<String>().trim_end().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn glyph(layer: Layer) -> char {
    match layer {
        Layer::Background | Layer::AxisLabels => ' ',
        Layer::Grid | Layer::AxisArrows => '.',
        Layer::Leaderboard => '+',
        Layer::OwnGuesses => 'o',
        Layer::Target => '#',
        Layer::Selection => '@',
    }
}

impl DrawSurface for TextCanvas {
    fn begin(&mut self, width: f64, height: f64) {
        self.cells.iter_mut().for_each(|cell| *cell = ' ');
        self.pixels_per_column = width / self.columns as f64;
        self.pixels_per_row = height / self.rows as f64;
    }

    fn draw(&mut self, layer: Layer, command: &DrawCommand) {
        let ch = glyph(layer);
        match command {
            DrawCommand::Clear { .. } => self.cells.iter_mut().for_each(|cell| *cell = ' '),
            DrawCommand::Line { from, to, .. } | DrawCommand::Arrow { from, to, .. } => {
                self.line(*from, *to, ch)
            }
            DrawCommand::Rect {
                origin,
                width,
                height,
                ..
            } => {
                let (x0, y0) = (origin.x, origin.y);
                let (x1, y1) = (origin.x + width, origin.y + height);
                self.line(PixelPoint::new(x0, y0), PixelPoint::new(x1, y0), ch);
                self.line(PixelPoint::new(x1, y0), PixelPoint::new(x1, y1), ch);
                self.line(PixelPoint::new(x1, y1), PixelPoint::new(x0, y1), ch);
                self.line(PixelPoint::new(x0, y1), PixelPoint::new(x0, y0), ch);
            }
            DrawCommand::Circle { center, .. } => self.plot(*center, ch),
            DrawCommand::Text { at, text, align, .. } => self.text(*at, text, *align),
        }
    }
}

/// Rasterize a frame onto a fresh character grid.
pub fn draw_frame(frame: &Frame, columns: usize, rows: usize) -> String {
    let mut canvas = TextCanvas::new(columns, rows);
    frame.paint(&mut canvas);
    canvas.to_text()
}

/// Parse one input line. A line that is not a command is a guess, including
/// an empty one so validation reports it.
pub fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Guess(line.to_string()));
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    let number = |index: usize| -> Result<f64, String> {
        args.get(index)
            .ok_or_else(|| format!("/{} needs more arguments", name))?
            .parse::<f64>()
            .map_err(|_| format!("'{}' is not a number", args[index]))
    };

    match name {
        "click" => Ok(Command::Click {
            x: number(0)?,
            y: number(1)?,
        }),
        "post" => Ok(Command::PostWin(args.join(" "))),
        "resize" => Ok(Command::Resize {
            width: number(0)?,
            height: number(1)?,
        }),
        "dpr" => Ok(Command::SetDevicePixelRatio(number(0)?)),
        "wins" => Ok(Command::ListWins),
        "show" => Ok(Command::Show),
        "dump" => Ok(Command::Dump),
        "quit" | "exit" => Ok(Command::Quit),
        _ => Err(USAGE.to_string()),
    }
}

fn describe_status(status: &StatusLine) -> String {
    let mut lines = Vec::new();
    match &status.countdown {
        Some(countdown) => lines.push(format!("Next round in: {}", countdown)),
        None => lines.push("Waiting for round timing...".to_string()),
    }
    if let Some(labels) = &status.labels {
        lines.push(format!(
            "x: {} <-> {}   y: {} <-> {}",
            labels.x_axis.low, labels.x_axis.high, labels.y_axis.low, labels.y_axis.high
        ));
    }
    lines.push(format!(
        "{} guesses, {} on the leaderboard{}",
        status.guesses,
        status.leaderboard,
        if status.submitting { ", guessing..." } else { "" }
    ));
    if let Some(word) = &status.won_with {
        let hint = if status.can_post { " Use /post NAME to record it." } else { "" };
        lines.push(format!("You won with '{}'.{}", word, hint));
    }
    if let Some(error) = &status.inline_error {
        lines.push(error.clone());
    }
    lines.join("\n")
}

fn describe_event(event: &GameEvent) -> Option<String> {
    match event {
        GameEvent::GuessSubmitted { word, .. } => Some(format!("Guessing '{}'...", word)),
        GameEvent::GuessRejected { error } => Some(error.to_string()),
        GameEvent::GuessAccepted { guess, .. } => Some(format!(
            "'{}' landed at ({:.2}, {:.2})",
            guess.word, guess.point.x, guess.point.y
        )),
        GameEvent::GuessFailed { message, .. } | GameEvent::WinPostFailed { message, .. } => {
            Some(message.clone())
        }
        GameEvent::Won {
            guess, postable, ..
        } => {
            let hint = if *postable { " Use /post NAME to record it." } else { "" };
            Some(format!("You hit the target with '{}'!{}", guess.word, hint))
        }
        GameEvent::WinPosted { username, .. } => Some(format!("Win posted as {}.", username)),
        GameEvent::RoundAdvanced { .. } => Some("A new round has started.".to_string()),
        GameEvent::SelectionChanged {
            selected: Some(selected),
        } => {
            let whose = match selected.source {
                SelectionSource::Own => "yours",
                SelectionSource::Leaderboard => "leaderboard",
            };
            Some(format!("Selected '{}' ({})", selected.word, whose))
        }
        GameEvent::SelectionChanged { selected: None }
        | GameEvent::TargetUpdated { .. }
        | GameEvent::SpectrumUpdated { .. }
        | GameEvent::LeaderboardMerged { .. }
        | GameEvent::StaleDiscarded { .. }
        | GameEvent::FetchFailed { .. } => None,
    }
}

/// Text to print for a notice, if any.
pub fn describe_notice(notice: &Notice, columns: usize, rows: usize) -> Option<String> {
    match notice {
        Notice::Event(event) => describe_event(event),
        Notice::Frame { frame, status } => Some(format!(
            "{}\n{}",
            draw_frame(frame, columns, rows),
            describe_status(status)
        )),
        Notice::FrameJson(json) => Some(json.clone()),
        Notice::Wins(wins) if wins.is_empty() => Some("No wins yet.".to_string()),
        Notice::Wins(wins) => Some(
            wins.iter()
                .map(|(rank, tally)| format!("{}. {} ({} wins)", rank, tally.username, tally.win_count))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        Notice::Rejected(error) => Some(error.to_string()),
        Notice::Info(message) => Some(message.clone()),
    }
}
