//! Planned toolpaths and the shared generator interface
//!
//! Generators write command batches into a [`PathWriter`] one at a time.
//! A [`Toolpath`] collects them for inspection; a [`SinkWriter`] submits
//! each batch to the machine as soon as it is produced, so a run never
//! holds the whole path in memory.

use std::fmt;

use millkit_core::{Command, CommandSink, Directive, MillingParameters, StatusEvent};

use crate::error::{CamToolResult, ParameterError};
use crate::pacing::StatusPacer;

/// Destination for command batches as a generator produces them
pub trait PathWriter {
    /// Accept the next non-empty batch
    fn put_command(&mut self, command: Command) -> CamToolResult<()>;

    /// Accept a batch, dropping it when empty
    fn put(&mut self, command: impl Into<Command>) -> CamToolResult<()>
    where
        Self: Sized,
    {
        let command = command.into();
        if command.is_empty() {
            return Ok(());
        }
        self.put_command(command)
    }
}

/// An ordered list of command batches produced by a generator
///
/// Each batch is submitted to the sink as one unit; the pacer may yield
/// between batches.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Toolpath {
    label: String,
    commands: Vec<Command>,
}

impl Toolpath {
    /// Create an empty toolpath with a status label
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            commands: Vec::new(),
        }
    }

    /// Status label shown while the toolpath runs
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Append a batch
    pub fn push(&mut self, command: impl Into<Command>) {
        let command = command.into();
        if !command.is_empty() {
            self.commands.push(command);
        }
    }

    /// Batches in submission order
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Every directive in submission order, across batches
    pub fn directives(&self) -> impl Iterator<Item = &Directive> {
        self.commands.iter().flat_map(|c| c.directives().iter())
    }
}

impl PathWriter for Toolpath {
    fn put_command(&mut self, command: Command) -> CamToolResult<()> {
        self.push(command);
        Ok(())
    }
}

impl fmt::Display for Toolpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for command in &self.commands {
            writeln!(f, "{}", command)?;
        }
        Ok(())
    }
}

/// Streams batches straight to a sink, bracketed by status events
pub struct SinkWriter<'a, S: CommandSink + ?Sized> {
    label: String,
    sink: &'a mut S,
    pacer: StatusPacer,
    batches: usize,
}

impl<'a, S: CommandSink + ?Sized> SinkWriter<'a, S> {
    /// Announce the operation and start streaming to `sink`
    pub fn start(label: &str, sink: &'a mut S) -> Self {
        sink.notify(StatusEvent::Started(label.to_string()));
        Self {
            label: label.to_string(),
            sink,
            pacer: StatusPacer::new(),
            batches: 0,
        }
    }

    /// Replace the default one second pacer
    pub fn with_pacer(mut self, pacer: StatusPacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Batches submitted so far
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Announce completion
    pub fn finish(self) {
        tracing::info!("{}: {} command batches", self.label, self.batches);
        self.sink.notify(StatusEvent::Completed(self.label));
    }
}

impl<S: CommandSink + ?Sized> PathWriter for SinkWriter<'_, S> {
    fn put_command(&mut self, command: Command) -> CamToolResult<()> {
        self.sink.emit(&command)?;
        self.batches += 1;
        self.pacer.tick(&mut *self.sink);
        Ok(())
    }
}

/// Renders batches as G-code text, one directive per line
#[derive(Debug, Default)]
struct TextWriter {
    text: String,
}

impl PathWriter for TextWriter {
    fn put_command(&mut self, command: Command) -> CamToolResult<()> {
        self.text.push_str(&command.to_string());
        self.text.push('\n');
        Ok(())
    }
}

/// A toolpath generator driven by [`MillingParameters`]
pub trait PathGenerator {
    /// Status label for the operation
    fn label(&self) -> &str;

    /// Produce the toolpath batch by batch
    fn write_path<W: PathWriter>(&self, out: &mut W) -> CamToolResult<()>;

    /// Plan the full toolpath without touching a machine
    fn plan(&self) -> CamToolResult<Toolpath> {
        let mut path = Toolpath::new(self.label());
        self.write_path(&mut path)?;
        Ok(path)
    }

    /// Submit the toolpath to a sink while it is generated
    fn run<S: CommandSink + ?Sized>(&self, sink: &mut S) -> CamToolResult<()> {
        let mut writer = SinkWriter::start(self.label(), sink);
        self.write_path(&mut writer)?;
        writer.finish();
        Ok(())
    }

    /// Render the toolpath as G-code text
    fn generate(&self) -> CamToolResult<String> {
        let mut writer = TextWriter::default();
        self.write_path(&mut writer)?;
        Ok(writer.text)
    }
}

/// Reject parameters that cannot produce a terminating sweep
pub fn check_finite(params: &MillingParameters) -> Result<(), ParameterError> {
    match params.first_non_finite() {
        Some(name) => Err(ParameterError::NotFinite {
            name: name.to_string(),
        }),
        None => Ok(()),
    }
}

/// Clamp an extent to zero when geometry is out of range
pub(crate) fn non_negative(value: f64) -> f64 {
    value.max(0.0)
}

/// Step used by sweeping generators; a non-positive pitch degrades to `fallback`
pub(crate) fn effective_step(step: f64, fallback: f64) -> f64 {
    if step > 0.0 {
        step
    } else {
        fallback
    }
}
