//! Per-block control loop: spectrum, adaptive equalization, pitch, loudness
//! and note dispatch, in that order.

use tracing::{debug, error, info};

use crate::audio::{AudioBlock, BlockSource, ControllerState, SpectrumAnalyzer};
use crate::config::EngineConfig;
use crate::dsp::{AdaptiveEqualizer, GainController, LevelUpdate, PitchEstimate, PitchExtractor};
use crate::error::{Error, Result};
use crate::midi::{MidiSink, NoteDispatcher};

/// What a processed block led to.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// RMS at or below the silence threshold. Nothing was sent or changed.
    Silent { rms: f32 },
    /// The pitch resolved to note 0: any sounding note was released.
    Rest(CycleReport),
    /// A note-on was sent (after a note-off for the previous note, if any).
    Note(CycleReport),
}

impl CycleOutcome {
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            CycleOutcome::Silent { .. } => None,
            CycleOutcome::Rest(report) | CycleOutcome::Note(report) => Some(report),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// Peak of the spectrum before equalization.
    pub raw_pitch: PitchEstimate,
    /// Peak after equalization; this one drives the note.
    pub pitch: PitchEstimate,
    pub note: u8,
    pub velocity: u8,
    pub level: LevelUpdate,
}

pub struct Engine {
    config: EngineConfig,
    analyzer: SpectrumAnalyzer,
    equalizer: AdaptiveEqualizer,
    extractor: PitchExtractor,
    gain: GainController,
    dispatcher: NoteDispatcher,
    state: ControllerState,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            analyzer: SpectrumAnalyzer::new(config.window_size),
            equalizer: AdaptiveEqualizer::new(config.bands, config.eq_min_gain, config.eq_max_gain),
            extractor: PitchExtractor::new(
                config.window_size,
                config.reference_frequency,
                config.reference_note,
                config.frequency_epsilon,
            ),
            gain: GainController::new(&config),
            dispatcher: NoteDispatcher::new(config.channel),
            state: ControllerState::new(&config),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// Current band gains derived from the pitch history.
    pub fn band_gains(&self) -> Vec<f32> {
        self.equalizer.band_gains(&self.state.pitch_history)
    }

    /// Runs one cycle. State is only committed after the MIDI messages for
    /// this cycle went out.
    pub fn process_block<S: MidiSink + ?Sized>(
        &mut self,
        block: &AudioBlock,
        sink: &mut S,
    ) -> Result<CycleOutcome> {
        if block.len() != self.config.block_len() {
            return Err(Error::BlockSize {
                expected: self.config.block_len(),
                actual: block.len(),
            });
        }

        let rms = block.rms();
        if !self.gain.is_active(rms) {
            return Ok(CycleOutcome::Silent { rms });
        }

        let spectrum = self.analyzer.process(block)?;
        let equalized = self.equalizer.process(&spectrum, &self.state.pitch_history);

        let (Some(raw_pitch), Some(pitch)) = (
            self.extractor.extract(&spectrum, block.sample_rate),
            self.extractor.extract(&equalized, block.sample_rate),
        ) else {
            return Ok(CycleOutcome::Silent { rms });
        };

        let note = pitch.midi_note();
        let level = self.gain.update(&self.state, rms);
        let velocity = level.velocity();

        self.dispatcher
            .dispatch(&mut self.state.current_note, note, velocity, sink)?;

        self.state.multiplier = level.multiplier;
        let report = CycleReport {
            raw_pitch,
            pitch,
            note,
            velocity,
            level,
        };

        if note == 0 {
            debug!(raw_note = raw_pitch.note, multiplier = level.multiplier, "rest");
            return Ok(CycleOutcome::Rest(report));
        }

        self.state.level = level.level;
        self.state.previous_rms = rms;
        self.state.pitch_history.push(pitch.frequency);
        self.state.level_history.push(level.raw_level);

        debug!(
            note,
            raw_note = raw_pitch.note,
            frequency = pitch.frequency,
            velocity_delta = level.delta,
            velocity,
            rms,
            multiplier = level.multiplier,
            min_level = self.state.level_history.min(),
            max_level = self.state.level_history.max(),
            "note"
        );

        Ok(CycleOutcome::Note(report))
    }

    /// Releases the sounding note, if any.
    pub fn release<S: MidiSink + ?Sized>(&mut self, sink: &mut S) -> Result<()> {
        self.dispatcher.release(&mut self.state.current_note, sink)
    }
}

/// Drives `engine` from `source` until the source stops or something fails.
/// The sounding note is always released on the way out.
pub fn run<B, S, F>(
    engine: &mut Engine,
    source: &mut B,
    sink: &mut S,
    mut on_cycle: F,
) -> Result<()>
where
    B: BlockSource + ?Sized,
    S: MidiSink + ?Sized,
    F: FnMut(&CycleOutcome, &Engine),
{
    if source.sample_rate() != engine.config().sample_rate {
        return Err(Error::SampleRateMismatch {
            expected: engine.config().sample_rate,
            actual: source.sample_rate(),
        });
    }

    let result = loop {
        let block = match source.next_block() {
            Ok(Some(block)) => block,
            Ok(None) => {
                info!("capture stopped");
                break Ok(());
            }
            Err(e) => break Err(e),
        };

        match engine.process_block(&block, sink) {
            Ok(outcome) => on_cycle(&outcome, engine),
            Err(e) => break Err(e),
        }
    };

    let cleanup = engine.release(sink);
    match (result, cleanup) {
        (Ok(()), cleanup) => cleanup,
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(cleanup_err)) => {
            error!(error = %cleanup_err, "failed to release sounding note");
            Err(e)
        }
    }
}
