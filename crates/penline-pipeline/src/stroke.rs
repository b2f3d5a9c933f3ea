//! Stroke emission: replay drawing-space strokes as pen commands.
//!
//! The rendering back end is anything implementing [`DrawingAgent`], a
//! turtle-style sink with pen state and absolute moves. For each
//! non-empty stroke the emitter issues:
//!
//! ```text
//! pen_up, move_to(p0), pen_down, move_to(p1), ..., move_to(pn)
//! ```
//!
//! so the travel to the first point leaves no mark. After the last
//! stroke it lifts the pen once more and, if asked, parks the agent and
//! writes a completion label.

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, DrawPoint, DrawSpeed, PenSettings, Stroke};

/// Label written by [`Completion::for_dimensions`].
pub const COMPLETION_LABEL: &str = "Drawing Complete";

/// Distance of the completion marker from the bottom-left corner, in
/// drawing units.
const COMPLETION_INSET: f64 = 20.0;

/// A turtle-style drawing sink.
///
/// Coordinates are in drawing space. Implementations decide how (and how
/// fast) commands are rendered; the emitter only relies on call order.
pub trait DrawingAgent {
    /// Lift the pen; subsequent moves leave no mark.
    fn pen_up(&mut self);
    /// Lower the pen; subsequent moves draw.
    fn pen_down(&mut self);
    /// Move to an absolute position.
    fn move_to(&mut self, to: DrawPoint);
    /// Set the line width.
    fn set_pen_width(&mut self, width: f64);
    /// Set the line color by name.
    fn set_pen_color(&mut self, color: &str);
    /// Set the replay speed.
    fn set_speed(&mut self, speed: DrawSpeed);
    /// Jump to an absolute position without drawing, regardless of pen state.
    fn set_position(&mut self, to: DrawPoint);
    /// Write text at the current position.
    fn label(&mut self, text: &str);
    /// Erase everything drawn so far.
    fn clear(&mut self);
}

impl<A: DrawingAgent + ?Sized> DrawingAgent for &mut A {
    fn pen_up(&mut self) {
        (**self).pen_up();
    }
    fn pen_down(&mut self) {
        (**self).pen_down();
    }
    fn move_to(&mut self, to: DrawPoint) {
        (**self).move_to(to);
    }
    fn set_pen_width(&mut self, width: f64) {
        (**self).set_pen_width(width);
    }
    fn set_pen_color(&mut self, color: &str) {
        (**self).set_pen_color(color);
    }
    fn set_speed(&mut self, speed: DrawSpeed) {
        (**self).set_speed(speed);
    }
    fn set_position(&mut self, to: DrawPoint) {
        (**self).set_position(to);
    }
    fn label(&mut self, text: &str) {
        (**self).label(text);
    }
    fn clear(&mut self) {
        (**self).clear();
    }
}

/// One drawing-agent call, as data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    /// [`DrawingAgent::pen_up`].
    PenUp,
    /// [`DrawingAgent::pen_down`].
    PenDown,
    /// [`DrawingAgent::move_to`].
    MoveTo {
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// [`DrawingAgent::set_pen_width`].
    SetPenWidth {
        /// Line width.
        width: f64,
    },
    /// [`DrawingAgent::set_pen_color`].
    SetPenColor {
        /// Color name.
        color: String,
    },
    /// [`DrawingAgent::set_speed`].
    SetSpeed {
        /// Replay speed.
        speed: DrawSpeed,
    },
    /// [`DrawingAgent::set_position`].
    SetPosition {
        /// Target x.
        x: f64,
        /// Target y.
        y: f64,
    },
    /// [`DrawingAgent::label`].
    Label {
        /// Label text.
        text: String,
    },
    /// [`DrawingAgent::clear`].
    Clear,
}

impl DrawCommand {
    /// Shorthand for a [`DrawCommand::MoveTo`].
    #[must_use]
    pub const fn move_to(x: f64, y: f64) -> Self {
        Self::MoveTo { x, y }
    }

    /// Issue this command against an agent.
    pub fn apply<A: DrawingAgent + ?Sized>(&self, agent: &mut A) {
        match self {
            Self::PenUp => agent.pen_up(),
            Self::PenDown => agent.pen_down(),
            Self::MoveTo { x, y } => agent.move_to(DrawPoint::new(*x, *y)),
            Self::SetPenWidth { width } => agent.set_pen_width(*width),
            Self::SetPenColor { color } => agent.set_pen_color(color),
            Self::SetSpeed { speed } => agent.set_speed(*speed),
            Self::SetPosition { x, y } => agent.set_position(DrawPoint::new(*x, *y)),
            Self::Label { text } => agent.label(text),
            Self::Clear => agent.clear(),
        }
    }
}

/// Agent that records every call as a [`DrawCommand`].
///
/// Useful as a test double and as a buffer between the emitter and
/// serializers that need the whole command list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    /// Create an empty recorder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Commands recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Consume the recorder and return its commands.
    #[must_use]
    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    /// Replay all recorded commands into another agent.
    pub fn replay<A: DrawingAgent + ?Sized>(&self, agent: &mut A) {
        for command in &self.commands {
            command.apply(agent);
        }
    }
}

impl DrawingAgent for CommandRecorder {
    fn pen_up(&mut self) {
        self.commands.push(DrawCommand::PenUp);
    }
    fn pen_down(&mut self) {
        self.commands.push(DrawCommand::PenDown);
    }
    fn move_to(&mut self, to: DrawPoint) {
        self.commands.push(DrawCommand::move_to(to.x, to.y));
    }
    fn set_pen_width(&mut self, width: f64) {
        self.commands.push(DrawCommand::SetPenWidth { width });
    }
    fn set_pen_color(&mut self, color: &str) {
        self.commands.push(DrawCommand::SetPenColor {
            color: color.to_string(),
        });
    }
    fn set_speed(&mut self, speed: DrawSpeed) {
        self.commands.push(DrawCommand::SetSpeed { speed });
    }
    fn set_position(&mut self, to: DrawPoint) {
        self.commands
            .push(DrawCommand::SetPosition { x: to.x, y: to.y });
    }
    fn label(&mut self, text: &str) {
        self.commands.push(DrawCommand::Label {
            text: text.to_string(),
        });
    }
    fn clear(&mut self) {
        self.commands.push(DrawCommand::Clear);
    }
}

/// Marker drawn after the last stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// Where to park the agent.
    pub position: DrawPoint,
    /// Text to write there.
    pub label: String,
}

impl Completion {
    /// Park near the bottom-left corner of the drawing with the standard
    /// label.
    #[must_use]
    pub fn for_dimensions(dimensions: Dimensions) -> Self {
        Self {
            position: DrawPoint::new(
                -f64::from(dimensions.width) / 2.0 + COMPLETION_INSET,
                -f64::from(dimensions.height) / 2.0 + COMPLETION_INSET,
            ),
            label: COMPLETION_LABEL.to_string(),
        }
    }
}

/// Apply pen settings and clear the canvas before drawing.
pub fn prepare_agent<A: DrawingAgent + ?Sized>(agent: &mut A, pen: &PenSettings) {
    agent.set_speed(pen.speed);
    agent.clear();
    agent.set_pen_width(pen.width);
    agent.set_pen_color(&pen.color);
}

/// Emit strokes in order, then lift the pen and optionally mark completion.
///
/// Empty strokes produce no commands. Returns the number of strokes
/// actually drawn.
pub fn emit_strokes<A: DrawingAgent + ?Sized>(
    strokes: &[Stroke],
    agent: &mut A,
    completion: Option<&Completion>,
) -> usize {
    let mut drawn = 0;
    for stroke in strokes {
        let Some((first, rest)) = stroke.points().split_first() else {
            continue;
        };
        agent.pen_up();
        agent.move_to(*first);
        agent.pen_down();
        for &p in rest {
            agent.move_to(p);
        }
        drawn += 1;
    }

    agent.pen_up();
    if let Some(done) = completion {
        agent.set_position(done.position);
        agent.label(&done.label);
    }
    drawn
}

/// Prepare the agent and emit all strokes: a full drawing session.
pub fn draw<A: DrawingAgent + ?Sized>(
    strokes: &[Stroke],
    agent: &mut A,
    pen: &PenSettings,
    completion: Option<&Completion>,
) -> usize {
    prepare_agent(agent, pen);
    emit_strokes(strokes, agent, completion)
}
