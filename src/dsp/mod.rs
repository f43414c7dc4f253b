pub mod equalizer;
pub mod gain;
pub mod pitch;

pub use equalizer::AdaptiveEqualizer;
pub use gain::{GainController, LevelUpdate};
pub use pitch::{PitchEstimate, PitchExtractor};
