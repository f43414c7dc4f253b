pub mod block;
pub mod capture;
pub mod devices;
pub mod processor;
pub mod state;

pub use block::AudioBlock;
pub use capture::{BlockSource, CpalCapture};
pub use processor::{Spectrum, SpectrumAnalyzer};
pub use state::{ControllerState, LevelHistory, PitchHistory};
