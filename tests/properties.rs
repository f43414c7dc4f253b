use proptest::prelude::*;

use mic2midi::audio::AudioBlock;
use mic2midi::audio::state::History;
use mic2midi::dsp::AdaptiveEqualizer;
use mic2midi::dsp::pitch::{frequency_to_note, peak_bin, resolve_note};
use mic2midi::midi::MidiMessage;
use mic2midi::{CycleOutcome, Engine, EngineConfig};

proptest! {
    #[test]
    fn band_gains_stay_in_range(
        values in prop::collection::vec(0.0f32..24_000.0, 0..200),
        bands in 1usize..64,
    ) {
        let equalizer = AdaptiveEqualizer::new(bands, 0.1, 1.0);
        let history = History::seeded(values.len().max(1), values.iter().copied());
        let gains = equalizer.band_gains(&history);

        prop_assert_eq!(gains.len(), bands);
        for gain in gains {
            prop_assert!((0.1 - 1e-6..=1.0 + 1e-6).contains(&gain));
        }
    }

    #[test]
    fn equalizer_keeps_spectrum_length(
        spectrum in prop::collection::vec(0.0f32..10.0, 0..300),
        gains in prop::collection::vec(0.1f32..1.0, 0..20),
    ) {
        let equalizer = AdaptiveEqualizer::new(gains.len(), 0.1, 1.0);
        let shaped = equalizer.apply(&spectrum, &gains);
        prop_assert_eq!(shaped.len(), spectrum.len());
    }

    #[test]
    fn higher_frequency_never_lowers_the_note(a in 0.0f32..30_000.0, b in 0.0f32..30_000.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_note = resolve_note(frequency_to_note(low, 220.0, 57.01, 1e-6));
        let high_note = resolve_note(frequency_to_note(high, 220.0, 57.01, 1e-6));
        prop_assert!(low_note <= high_note);
        prop_assert!(high_note <= 127);
    }

    #[test]
    fn peak_bin_is_a_maximum(spectrum in prop::collection::vec(0.0f32..100.0, 1..500)) {
        let peak = peak_bin(&spectrum).unwrap();
        prop_assert!(spectrum.iter().all(|&m| m <= spectrum[peak]));
        prop_assert!(spectrum[..peak].iter().all(|&m| m < spectrum[peak]));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn at_most_one_note_sounds(
        blocks in prop::collection::vec((1usize..128, 0.0f32..1.0), 1..60),
    ) {
        let config = EngineConfig {
            window_size: 256,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config.clone()).unwrap();
        let len = config.block_len();
        let mut sounding: Option<u8> = None;

        for (bin, amplitude) in blocks {
            let freq = bin as f32 * config.sample_rate as f32 / len as f32;
            let samples = (0..len)
                .map(|i| {
                    let t = i as f32 / config.sample_rate as f32;
                    (2.0 * std::f32::consts::PI * freq * t).sin() * amplitude
                })
                .collect();
            let block = AudioBlock::new(samples, config.sample_rate);

            let mut sink: Vec<MidiMessage> = Vec::new();
            engine.process_block(&block, &mut sink).unwrap();

            for message in sink {
                match message {
                    MidiMessage::NoteOn { note, .. } => {
                        prop_assert_eq!(sounding, None);
                        prop_assert!(note > 0);
                        sounding = Some(note);
                    }
                    MidiMessage::NoteOff { note, .. } => {
                        prop_assert_eq!(sounding, Some(note));
                        sounding = None;
                    }
                }
            }
            prop_assert_eq!(engine.state().current_note, sounding);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn quiet_blocks_change_nothing(
        noise in prop::collection::vec(-1.0f32..1.0, 512),
        loudness in 0.0f32..0.99,
        sounding_first in any::<bool>(),
    ) {
        let config = EngineConfig {
            window_size: 256,
            ..EngineConfig::default()
        };
        let mut engine = Engine::new(config.clone()).unwrap();

        if sounding_first {
            let len = config.block_len();
            let freq = 20.0 * config.sample_rate as f32 / len as f32;
            let samples = (0..len)
                .map(|i| {
                    let t = i as f32 / config.sample_rate as f32;
                    (2.0 * std::f32::consts::PI * freq * t).sin() * 0.2
                })
                .collect();
            let mut sink: Vec<MidiMessage> = Vec::new();
            engine
                .process_block(&AudioBlock::new(samples, config.sample_rate), &mut sink)
                .unwrap();
        }

        // Scale the noise so its RMS sits at or below the silence threshold.
        let raw = AudioBlock::new(noise, config.sample_rate);
        let scale = if raw.rms() > 0.0 {
            config.silence_threshold * loudness / raw.rms()
        } else {
            0.0
        };
        let quiet = AudioBlock::new(
            raw.samples.iter().map(|s| s * scale).collect(),
            config.sample_rate,
        );
        prop_assume!(quiet.rms() <= config.silence_threshold);

        let before = engine.state().clone();
        let mut sink: Vec<MidiMessage> = Vec::new();
        let outcome = engine.process_block(&quiet, &mut sink).unwrap();

        prop_assert!(matches!(outcome, CycleOutcome::Silent { .. }), "outcome was not silent");
        prop_assert!(sink.is_empty());
        prop_assert_eq!(engine.state(), &before);
    }
}
