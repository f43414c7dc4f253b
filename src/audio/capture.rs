use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{Host, SampleFormat, Stream};
use crossbeam_channel::{Receiver, TryRecvError};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use tracing::{info, warn};

use crate::audio::AudioBlock;
use crate::audio::block::first_channel;
use crate::audio::devices::{create_stream_config, get_input_device};
use crate::config::CAPTURE_BLOCKS_BUFFERED;
use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Source of fixed-size audio blocks for the control loop.
pub trait BlockSource {
    fn sample_rate(&self) -> u32;

    /// Blocks until the next block is available. Returns `Ok(None)` once
    /// the source has been asked to stop.
    fn next_block(&mut self) -> Result<Option<AudioBlock>>;
}

/// Microphone capture through cpal. The input callback pushes the first
/// channel into a ring buffer that `next_block` drains.
pub struct CpalCapture {
    _stream: Stream,
    consumer: HeapCons<f32>,
    errors: Receiver<String>,
    overruns: Arc<AtomicUsize>,
    stop: Arc<AtomicBool>,
    block_len: usize,
    sample_rate: u32,
    device_name: String,
}

impl CpalCapture {
    pub fn open(
        host: &Host,
        device_name: Option<&str>,
        sample_rate: u32,
        block_len: usize,
        stop: Arc<AtomicBool>,
    ) -> Result<Self> {
        let device = get_input_device(host, device_name)?;
        let device_name = device.name()?;

        let input_config = device.default_input_config()?;
        if input_config.sample_format() != SampleFormat::F32 {
            return Err(Error::UnsupportedSampleFormat(format!(
                "{:?}",
                input_config.sample_format()
            )));
        }

        let channels = input_config.channels().max(1);
        let stream_config = create_stream_config(channels, sample_rate);

        let capacity = block_len * CAPTURE_BLOCKS_BUFFERED;
        let (mut producer, consumer) = HeapRb::<f32>::new(capacity).split();
        let (error_tx, errors) = crossbeam_channel::bounded(8);
        let overruns = Arc::new(AtomicUsize::new(0));
        let callback_overruns = overruns.clone();
        let step = channels as usize;

        let stream = device.build_input_stream(
            &stream_config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let frames = data.len().div_ceil(step);
                let pushed = producer.push_iter(first_channel(data, step));
                if pushed < frames {
                    callback_overruns.fetch_add(frames - pushed, Ordering::Relaxed);
                }
            },
            move |err| {
                let _ = error_tx.try_send(err.to_string());
            },
            None,
        )?;
        stream.play()?;

        info!(
            device = %device_name,
            channels,
            sample_rate,
            block_len,
            "capturing audio"
        );

        Ok(Self {
            _stream: stream,
            consumer,
            errors,
            overruns,
            stop,
            block_len,
            sample_rate,
            device_name,
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }
}

impl BlockSource for CpalCapture {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn next_block(&mut self) -> Result<Option<AudioBlock>> {
        loop {
            match self.errors.try_recv() {
                Ok(message) => return Err(Error::Capture(message)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
            }

            if self.stop.load(Ordering::SeqCst) {
                return Ok(None);
            }

            if self.consumer.occupied_len() >= self.block_len {
                let mut samples = vec![0.0; self.block_len];
                self.consumer.pop_slice(&mut samples);

                let dropped = self.overruns.swap(0, Ordering::Relaxed);
                if dropped > 0 {
                    warn!(dropped, "capture buffer overrun, samples dropped");
                }

                return Ok(Some(AudioBlock::new(samples, self.sample_rate)));
            }

            thread::sleep(POLL_INTERVAL);
        }
    }
}
