//! Drawing agents that live on the I/O side: JSON-lines streaming,
//! fan-out to several back ends, and speed pacing.

use std::io::Write;
use std::time::Duration;

use penline_pipeline::{DrawCommand, DrawPoint, DrawSpeed, DrawingAgent};

/// Delay per move at animated level 1. Each level above shortens it by
/// one step, so level 10 waits a single step.
const SLOWEST_STEP_MS: u64 = 5;

/// Time to wait after each move at the given speed.
#[must_use]
pub fn move_delay(speed: DrawSpeed) -> Duration {
    match speed {
        DrawSpeed::Instant => Duration::ZERO,
        DrawSpeed::Animated(level) => {
            let level = level.clamp(DrawSpeed::MIN_LEVEL, DrawSpeed::MAX_LEVEL);
            let steps = u64::from(DrawSpeed::MAX_LEVEL - level + 1);
            Duration::from_millis(steps * SLOWEST_STEP_MS)
        }
    }
}

/// Writes each command as one JSON line as soon as it is issued.
///
/// The first write error stops further output and is returned by
/// [`finish`](Self::finish).
pub struct JsonLinesAgent<W: Write> {
    sink: W,
    error: Option<std::io::Error>,
    written: usize,
}

impl<W: Write> JsonLinesAgent<W> {
    /// Stream into `sink`.
    pub const fn new(sink: W) -> Self {
        Self {
            sink,
            error: None,
            written: 0,
        }
    }

    /// Number of commands written so far.
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Flush and return the sink.
    ///
    /// # Errors
    ///
    /// Returns the first error hit while writing, or the flush error.
    pub fn finish(mut self) -> Result<W, std::io::Error> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        self.sink.flush()?;
        Ok(self.sink)
    }

    fn emit(&mut self, command: &DrawCommand) {
        if self.error.is_some() {
            return;
        }
        let result = penline_export::to_json_line(command)
            .map_err(std::io::Error::from)
            .and_then(|line| writeln!(self.sink, "{line}"));
        match result {
            Ok(()) => self.written += 1,
            Err(e) => self.error = Some(e),
        }
    }
}

impl<W: Write> DrawingAgent for JsonLinesAgent<W> {
    fn pen_up(&mut self) {
        self.emit(&DrawCommand::PenUp);
    }
    fn pen_down(&mut self) {
        self.emit(&DrawCommand::PenDown);
    }
    fn move_to(&mut self, to: DrawPoint) {
        self.emit(&DrawCommand::move_to(to.x, to.y));
    }
    fn set_pen_width(&mut self, width: f64) {
        self.emit(&DrawCommand::SetPenWidth { width });
    }
    fn set_pen_color(&mut self, color: &str) {
        self.emit(&DrawCommand::SetPenColor {
            color: color.to_string(),
        });
    }
    fn set_speed(&mut self, speed: DrawSpeed) {
        self.emit(&DrawCommand::SetSpeed { speed });
    }
    fn set_position(&mut self, to: DrawPoint) {
        self.emit(&DrawCommand::SetPosition { x: to.x, y: to.y });
    }
    fn label(&mut self, text: &str) {
        self.emit(&DrawCommand::Label {
            text: text.to_string(),
        });
    }
    fn clear(&mut self) {
        self.emit(&DrawCommand::Clear);
    }
}

/// Forwards every call to each agent in turn.
#[derive(Default)]
pub struct Fanout<'a> {
    agents: Vec<&'a mut dyn DrawingAgent>,
}

impl<'a> Fanout<'a> {
    /// No agents yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { agents: Vec::new() }
    }

    /// Add an agent.
    pub fn push(&mut self, agent: &'a mut dyn DrawingAgent) {
        self.agents.push(agent);
    }

    /// Number of agents.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.agents.len()
    }

    fn each(&mut self, mut f: impl FnMut(&mut dyn DrawingAgent)) {
        for agent in &mut self.agents {
            f(&mut **agent);
        }
    }
}

impl DrawingAgent for Fanout<'_> {
    fn pen_up(&mut self) {
        self.each(|a| a.pen_up());
    }
    fn pen_down(&mut self) {
        self.each(|a| a.pen_down());
    }
    fn move_to(&mut self, to: DrawPoint) {
        self.each(|a| a.move_to(to));
    }
    fn set_pen_width(&mut self, width: f64) {
        self.each(|a| a.set_pen_width(width));
    }
    fn set_pen_color(&mut self, color: &str) {
        self.each(|a| a.set_pen_color(color));
    }
    fn set_speed(&mut self, speed: DrawSpeed) {
        self.each(|a| a.set_speed(speed));
    }
    fn set_position(&mut self, to: DrawPoint) {
        self.each(|a| a.set_position(to));
    }
    fn label(&mut self, text: &str) {
        self.each(|a| a.label(text));
    }
    fn clear(&mut self) {
        self.each(|a| a.clear());
    }
}

/// Throttles moves according to the last requested speed.
///
/// The wrapped agent sees every call unchanged; after each move the
/// pacer waits [`move_delay`] using the supplied sleep function.
pub struct PacedAgent<A, S> {
    inner: A,
    sleep: S,
    delay: Duration,
}

impl<A: DrawingAgent> PacedAgent<A, fn(Duration)> {
    /// Pace with `std::thread::sleep`.
    pub fn new(inner: A) -> Self {
        Self::with_sleep(inner, std::thread::sleep)
    }
}

impl<A: DrawingAgent, S: FnMut(Duration)> PacedAgent<A, S> {
    /// Pace with a custom sleep function.
    pub const fn with_sleep(inner: A, sleep: S) -> Self {
        Self {
            inner,
            sleep,
            delay: Duration::ZERO,
        }
    }

    fn pause(&mut self) {
        if !self.delay.is_zero() {
            (self.sleep)(self.delay);
        }
    }
}

impl<A: DrawingAgent, S: FnMut(Duration)> DrawingAgent for PacedAgent<A, S> {
    fn pen_up(&mut self) {
        self.inner.pen_up();
    }
    fn pen_down(&mut self) {
        self.inner.pen_down();
    }
    fn move_to(&mut self, to: DrawPoint) {
        self.inner.move_to(to);
        self.pause();
    }
    fn set_pen_width(&mut self, width: f64) {
        self.inner.set_pen_width(width);
    }
    fn set_pen_color(&mut self, color: &str) {
        self.inner.set_pen_color(color);
    }
    fn set_speed(&mut self, speed: DrawSpeed) {
        self.delay = move_delay(speed);
        self.inner.set_speed(speed);
    }
    fn set_position(&mut self, to: DrawPoint) {
        self.inner.set_position(to);
    }
    fn label(&mut self, text: &str) {
        self.inner.label(text);
    }
    fn clear(&mut self) {
        self.inner.clear();
    }
}
