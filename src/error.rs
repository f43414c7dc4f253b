//! Error types for capture, analysis and MIDI output
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Audio block has {actual} samples, expected {expected}")]
    BlockSize { expected: usize, actual: usize },

    #[error("Audio source runs at {actual} Hz, engine expects {expected} Hz")]
    SampleRateMismatch { expected: u32, actual: u32 },

    #[error("Input device not found: {0}")]
    DeviceNotFound(String),

    #[error("Input device doesn't support F32 format (got {0})")]
    UnsupportedSampleFormat(String),

    #[error("Failed to enumerate audio devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("Failed to read device name: {0}")]
    DeviceName(#[from] cpal::DeviceNameError),

    #[error("Failed to get input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("Failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("Failed to start input stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    /// The capture stream reported a failure while running.
    #[error("Capture failed: {0}")]
    Capture(String),

    #[error("MIDI init error: {0}")]
    MidiInit(#[from] midir::InitError),

    #[error("MIDI port info error: {0}")]
    MidiPortInfo(#[from] midir::PortInfoError),

    #[error("MIDI connection error: {0}")]
    MidiConnect(String),

    #[error("MIDI send error: {0}")]
    MidiSend(#[from] midir::SendError),

    #[error("No MIDI output port matches {0:?}")]
    NoMidiPorts(Option<String>),

    #[error("Failed to install shutdown handler: {0}")]
    ShutdownHandler(#[from] ctrlc::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
