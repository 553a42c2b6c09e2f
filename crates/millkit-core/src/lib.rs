//! # millkit Core
//!
//! Core types, traits, and utilities for millkit.
//! Provides the data model shared by the toolpath generators and the file
//! scanner, the structured command builder that replaces string-templated
//! G-code, and the capability traits through which the core talks to the
//! external motion engine.

pub mod command;
pub mod data;
pub mod error;
pub mod machine;

pub use command::{Command, DistanceMode, Directive, MotionWords, TOOL_CHANGE_MACRO_SLOT};

pub use data::{
    extrema::Extrema, milling::MillingParameters, Axis, PinLevel, Position, ProbeOutcome,
    Workspace,
};

pub use error::{ControllerError, Error, GcodeError, Result};

pub use machine::{
    virtual_machine::VirtualMachine, CommandSink, Machine, PositionControl, ProbeInput,
    StatusEvent, StreamSink,
};
