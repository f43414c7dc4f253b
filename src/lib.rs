//! Live microphone to single-voice MIDI.
//!
//! Each captured block is turned into a magnitude spectrum, reweighted by an
//! equalizer that adapts to recently detected pitches, reduced to its dominant
//! bin and mapped to a MIDI note. Loudness changes drive the velocity through
//! a self-adjusting gain multiplier. At most one note sounds at a time.

pub mod audio;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod midi;
pub mod status;

pub use config::EngineConfig;
pub use engine::{CycleOutcome, CycleReport, Engine, run};
pub use error::{Error, Result};
