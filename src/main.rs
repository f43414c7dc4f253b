use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mic2midi::audio::CpalCapture;
use mic2midi::audio::devices::list_input_devices;
use mic2midi::config;
use mic2midi::midi::{MidiPortSink, list_output_ports};
use mic2midi::status::{EqualizerBars, STATUS_HEADER, StatusLine};
use mic2midi::{CycleOutcome, Engine, EngineConfig, Error};

const MIDI_CLIENT: &str = "mic2midi";

/// Microphone to MIDI
#[derive(Parser)]
#[command(name = "mic2midi")]
#[command(about = "Turn the dominant pitch of a live microphone into MIDI notes")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture audio and send notes until interrupted
    Run(RunArgs),
    /// List audio input devices and MIDI output ports
    List,
}

#[derive(Args)]
struct RunArgs {
    /// Input device (substring of its name); default device if omitted
    #[arg(short, long)]
    device: Option<String>,

    /// Only connect MIDI outputs whose name contains this; all if omitted
    #[arg(short, long)]
    port: Option<String>,

    /// MIDI channel (0-15)
    #[arg(long, default_value_t = 0)]
    channel: u8,

    #[arg(long, default_value_t = config::SAMPLE_RATE)]
    sample_rate: u32,

    /// Spectrum bins per cycle; blocks are twice this long
    #[arg(long, default_value_t = config::WINDOW_SIZE)]
    window: usize,

    /// RMS at or below this is silence
    #[arg(long, default_value_t = config::SILENCE_THRESHOLD)]
    threshold: f32,

    /// Equalizer band count
    #[arg(long, default_value_t = config::BANDS)]
    bands: usize,

    #[arg(long, default_value_t = config::PITCH_HISTORY)]
    pitch_history: usize,

    #[arg(long, default_value_t = config::LEVEL_HISTORY)]
    level_history: usize,

    #[arg(long, default_value_t = config::GAIN_INCREASE)]
    gain_up: f64,

    #[arg(long, default_value_t = config::GAIN_DECREASE)]
    gain_down: f64,

    /// Print a status line per emitted note
    #[arg(long)]
    status: bool,

    /// With --status, also draw the equalizer band gains
    #[arg(long, requires = "status")]
    eq: bool,
}

impl RunArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            window_size: self.window,
            sample_rate: self.sample_rate,
            silence_threshold: self.threshold,
            bands: self.bands,
            pitch_history: self.pitch_history,
            level_history: self.level_history,
            gain_increase: self.gain_up,
            gain_decrease: self.gain_down,
            channel: self.channel,
            ..EngineConfig::default()
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run(args) => run(args),
        Commands::List => list(),
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut engine = Engine::new(args.engine_config()).context("Invalid engine settings")?;

    let stop = Arc::new(AtomicBool::new(false));
    let handler_stop = stop.clone();
    ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))
        .map_err(Error::ShutdownHandler)?;

    let mut sink = MidiPortSink::open(MIDI_CLIENT, args.port.as_deref())
        .context("Failed to open MIDI output")?;

    let host = cpal::default_host();
    let mut capture = CpalCapture::open(
        &host,
        args.device.as_deref(),
        engine.config().sample_rate,
        engine.config().block_len(),
        stop,
    )
    .context("Failed to open audio input")?;

    info!(
        device = capture.device_name(),
        ports = ?sink.port_names(),
        "running, press Ctrl-C to stop"
    );
    if args.status {
        println!("{}", STATUS_HEADER);
    }

    let result = mic2midi::run(&mut engine, &mut capture, &mut sink, |outcome, engine| {
        let CycleOutcome::Note(report) = outcome else {
            return;
        };
        if args.status {
            let state = engine.state();
            println!("{}", StatusLine { report, state });
        }
        if args.eq {
            println!("{}", EqualizerBars(&engine.band_gains()));
        }
    });

    sink.close();
    result.context("Engine stopped")?;
    Ok(())
}

fn list() -> anyhow::Result<()> {
    let host = cpal::default_host();

    println!("Audio inputs:");
    for (name, is_default) in list_input_devices(&host)? {
        let marker = if is_default { " (default)" } else { "" };
        println!("  {}{}", name, marker);
    }

    println!("MIDI outputs:");
    for name in list_output_ports(MIDI_CLIENT)? {
        println!("  {}", name);
    }

    Ok(())
}
