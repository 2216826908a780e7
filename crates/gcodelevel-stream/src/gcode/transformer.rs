//! Surface-compensating G-code transformer
//!
//! `StreamTransformer::transition` is a pure step function: it takes the
//! machine state and one input line and returns the next state together with
//! the lines to emit. Moves in absolute mode are rebuilt with a compensated Z
//! and, when they are long enough, split where the optimizer finds the linear
//! height interpolation straying from the fitted surface. All other lines are
//! passed through byte-identical after updating the state.

use std::fmt::Write as _;
use std::sync::Arc;

use gcodelevel_core::{BoundsError, Error, GeometryError, Point2, Result};
use gcodelevel_surface::{
    evaluate, CoefficientGrid, OptimizerConfig, PathOptimizer, PathSegment, Span,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::arc::ArcGeometry;
use super::command::{classify, LineKind, MoveWords};
use super::state::{MachineState, MoveMode, Plane};

/// Machine limits and subdivision settings for a leveling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Lowest acceptable compensated Z (inclusive)
    pub z_min: f64,
    /// Highest acceptable compensated Z (inclusive)
    pub z_max: f64,
    /// Subtract commanded Z from the surface height instead of adding it
    pub invert_position: bool,
    /// Added to every commanded Z before compensation
    pub z_offset: f64,
    /// Lines longer than this are considered for splitting; 0 disables
    pub line_break_distance: f64,
    /// Arcs longer than this are considered for splitting; 0 disables
    pub arc_segment_distance: f64,
    pub optimizer: OptimizerConfig,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            z_min: 0.0,
            z_max: 100.0,
            invert_position: false,
            z_offset: 0.0,
            line_break_distance: 10.0,
            arc_segment_distance: 15.0,
            optimizer: OptimizerConfig::default(),
        }
    }
}

/// One rebuilt move line
#[derive(Debug, Clone, Default)]
struct MoveLine<'a> {
    command: &'a str,
    x: Option<f64>,
    y: Option<f64>,
    z: f64,
    i: Option<f64>,
    j: Option<f64>,
    r: Option<f64>,
    e: Option<f64>,
    f: Option<f64>,
    extra: &'a [String],
    comment: Option<String>,
}

impl MoveLine<'_> {
    fn render(&self) -> String {
        let mut out = String::from(self.command);
        let mut word = |letter: char, value: Option<f64>, precision: usize| {
            if let Some(v) = value {
                let _ = write!(out, " {letter}{v:.precision$}");
            }
        };
        word('X', self.x, 3);
        word('Y', self.y, 3);
        word('Z', Some(self.z), 3);
        word('I', self.i, 3);
        word('J', self.j, 3);
        word('R', self.r, 3);
        word('E', self.e, 5);
        if let Some(f) = self.f {
            let _ = write!(out, " F{f}");
        }
        for extra in self.extra {
            out.push(' ');
            out.push_str(extra);
        }
        if let Some(comment) = &self.comment {
            out.push(' ');
            out.push_str(comment);
        }
        out
    }
}

/// Rewrites G-code against a fitted height field
#[derive(Debug, Clone)]
pub struct StreamTransformer {
    grid: Arc<CoefficientGrid>,
    config: TransformConfig,
    optimizer: PathOptimizer,
}

impl StreamTransformer {
    pub fn new(grid: Arc<CoefficientGrid>, config: TransformConfig) -> Self {
        let optimizer = PathOptimizer::new(&config.optimizer);
        Self {
            grid,
            config,
            optimizer,
        }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    pub fn grid(&self) -> &CoefficientGrid {
        &self.grid
    }

    /// Start a streaming pass with a fresh machine state
    pub fn stream(&self) -> LevelingStream<'_> {
        LevelingStream {
            transformer: self,
            state: MachineState::new(),
        }
    }

    /// Transform a whole program held in memory, joining output with `\n`
    pub fn transform_str(&self, input: &str) -> Result<String> {
        let mut stream = self.stream();
        let mut output = Vec::new();
        for line in input.lines() {
            output.extend(stream.push(line)?);
        }
        Ok(output.join("\n"))
    }

    /// Process one input line
    ///
    /// # Errors
    /// Returns a bounds error when a compensated Z leaves `[z_min, z_max]` and
    /// a geometry error for arcs that cannot be resolved.
    pub fn transition(
        &self,
        mut state: MachineState,
        line: &str,
    ) -> Result<(MachineState, Vec<String>)> {
        state.line_number += 1;

        let emitted = match classify(line) {
            LineKind::Linear if state.move_mode == MoveMode::Absolute => {
                self.level_line(&mut state, line)?
            }
            LineKind::Arc { clockwise } if state.move_mode == MoveMode::Absolute => {
                self.level_arc(&mut state, line, clockwise)?
            }
            LineKind::Linear | LineKind::Arc { .. } => {
                track_relative_move(&mut state, line);
                vec![line.to_string()]
            }
            LineKind::Feed(feed) => {
                state.apply_feed(feed);
                vec![line.to_string()]
            }
            LineKind::MoveMode(mode) => {
                state.move_mode = mode;
                vec![line.to_string()]
            }
            LineKind::ExtrusionMode(mode) => {
                state.extrusion_mode = mode;
                vec![line.to_string()]
            }
            LineKind::SetPosition => {
                let words = MoveWords::parse(line);
                state.set_position(words.x, words.y, words.z, words.e);
                vec![line.to_string()]
            }
            LineKind::Plane(plane) => {
                state.plane = plane;
                vec![line.to_string()]
            }
            LineKind::PassThrough => vec![line.to_string()],
        };

        Ok((state, emitted))
    }

    fn level_line(&self, state: &mut MachineState, line: &str) -> Result<Vec<String>> {
        let words = begin_move(state, line);
        let start = state.previous_position();
        let end = state.position();
        let segment = PathSegment::line(state.to_machine(start), state.to_machine(end));

        let breaks = self.config.line_break_distance;
        let spans = if state.started && breaks > 0.0 && segment.length() > breaks {
            self.optimizer.subdivide(&self.grid, &segment)
        } else {
            vec![Span::FULL]
        };
        state.started = true;

        let mut emitted = Vec::with_capacity(spans.len());
        let mut last = start;
        for (index, span) in spans.iter().enumerate() {
            let point = if span.end >= 1.0 {
                end
            } else {
                start.lerp(&end, span.end)
            };
            let z = self.compensate(state, point, commanded_z(state, span.end))?;
            let mut out = MoveLine {
                command: &words.command,
                x: (point.x != last.x).then_some(point.x),
                y: (point.y != last.y).then_some(point.y),
                z,
                e: words.e.map(|_| state.extrusion_at(span.start, span.end)),
                extra: &[],
                ..Default::default()
            };
            if index == 0 {
                self.attach_first_line_words(state, &words, &mut out);
            }
            emitted.push(out.render());
            last = point;
        }

        if emitted.len() > 1 {
            trace!(
                "Line {} split into {} moves",
                state.line_number,
                emitted.len()
            );
        }
        Ok(emitted)
    }

    fn level_arc(
        &self,
        state: &mut MachineState,
        line: &str,
        clockwise: bool,
    ) -> Result<Vec<String>> {
        if state.plane != Plane::XY {
            return Err(GeometryError::UnsupportedPlane {
                line_number: state.line_number,
                plane: state.plane.to_string(),
            }
            .into());
        }

        let words = begin_move(state, line);
        let start = state.previous_position();
        let end = state.position();
        let arc = ArcGeometry::resolve(
            state.to_machine(start),
            state.to_machine(end),
            &words,
            clockwise,
            state.line_number,
        )?;

        let segment_distance = self.config.arc_segment_distance;
        let spans = if state.started && segment_distance > 0.0 && arc.length() > segment_distance {
            self.optimizer.subdivide(&self.grid, &arc.segment())
        } else {
            vec![Span::FULL]
        };
        state.started = true;

        if spans.len() == 1 {
            let z = self.compensate(state, end, state.z)?;
            let mut out = MoveLine {
                command: &words.command,
                x: (end.x != start.x).then_some(end.x),
                y: (end.y != start.y).then_some(end.y),
                z,
                i: nonzero(words.i),
                j: nonzero(words.j),
                r: nonzero(words.r),
                e: words.e.map(|_| state.extrusion_at(0.0, 1.0)),
                ..Default::default()
            };
            self.attach_first_line_words(state, &words, &mut out);
            return Ok(vec![out.render()]);
        }

        let mut emitted = Vec::with_capacity(spans.len());
        for (index, span) in spans.iter().enumerate() {
            let point = if span.end >= 1.0 {
                end
            } else {
                arc.position(span.end) - state.work_offset
            };
            let offset = arc.offset_at(span.start);
            let z = self.compensate(state, point, commanded_z(state, span.end))?;
            let mut out = MoveLine {
                command: &words.command,
                x: Some(point.x),
                y: Some(point.y),
                z,
                i: Some(offset.x),
                j: Some(offset.y),
                e: words.e.map(|_| state.extrusion_at(span.start, span.end)),
                ..Default::default()
            };
            if index == 0 {
                self.attach_first_line_words(state, &words, &mut out);
            }
            emitted.push(out.render());
        }
        trace!(
            "Arc on line {} split into {} moves",
            state.line_number,
            emitted.len()
        );
        Ok(emitted)
    }

    /// Feed, unrecognised words and the trailing comment ride on the first
    /// emitted line of a move
    fn attach_first_line_words<'a>(
        &self,
        state: &mut MachineState,
        words: &'a MoveWords,
        out: &mut MoveLine<'a>,
    ) {
        if state.feed_changed {
            out.f = state.feed_rate;
        }
        out.extra = &words.extra;
        out.comment = state.pending_comment.take();
    }

    /// Surface height at the machine position of `point` plus the commanded Z
    ///
    /// # Errors
    /// Returns [`BoundsError`] if the result leaves `[z_min, z_max]`.
    fn compensate(&self, state: &MachineState, point: Point2, commanded: f64) -> Result<f64> {
        let machine = state.to_machine(point);
        let sign = if self.config.invert_position { -1.0 } else { 1.0 };
        let z =
            evaluate(&self.grid, machine.x, machine.y) + sign * (commanded + self.config.z_offset);

        if z >= self.config.z_min && z <= self.config.z_max {
            Ok(z)
        } else {
            Err(Error::Bounds(BoundsError {
                line_number: state.line_number,
                x: machine.x,
                y: machine.y,
                z,
                z_min: self.config.z_min,
                z_max: self.config.z_max,
            }))
        }
    }
}

/// Parse a move and advance the state to its end point
fn begin_move(state: &mut MachineState, line: &str) -> MoveWords {
    let words = MoveWords::parse(line);
    state.begin_move();
    if let Some(x) = words.x {
        state.x = x;
    }
    if let Some(y) = words.y {
        state.y = y;
    }
    if let Some(z) = words.z {
        state.z = z;
    }
    if let Some(e) = words.e {
        state.apply_extrusion(e);
    }
    match words.f {
        Some(f) => state.apply_feed(f),
        None => state.feed_changed = false,
    }
    state.pending_comment = words.comment.clone();
    words
}

/// Relative moves pass through untouched but still move the machine
fn track_relative_move(state: &mut MachineState, line: &str) {
    let words = MoveWords::parse(line);
    state.begin_move();
    state.x += words.x.unwrap_or(0.0);
    state.y += words.y.unwrap_or(0.0);
    state.z += words.z.unwrap_or(0.0);
    if let Some(f) = words.f {
        state.apply_feed(f);
    }
}

/// Zero I/J/R words count as absent and are not written back
fn nonzero(word: Option<f64>) -> Option<f64> {
    word.filter(|v| *v != 0.0)
}

/// Commanded Z interpolated to fraction `t` of the current move
fn commanded_z(state: &MachineState, t: f64) -> f64 {
    if t >= 1.0 {
        state.z
    } else {
        state.prev_z + (state.z - state.prev_z) * t
    }
}

/// Streaming driver owning the machine state of one pass
#[derive(Debug)]
pub struct LevelingStream<'a> {
    transformer: &'a StreamTransformer,
    state: MachineState,
}

impl LevelingStream<'_> {
    /// Feed one line, returning the lines to emit
    ///
    /// After an error the pass is over; the state is reset.
    pub fn push(&mut self, line: &str) -> Result<Vec<String>> {
        let state = std::mem::take(&mut self.state);
        let (next, emitted) = self.transformer.transition(state, line)?;
        self.state = next;
        Ok(emitted)
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }
}
