//! CPAL-based audio output backend.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use sc_engine::Frame;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::traits::{AudioError, AudioOutput};

/// Ring buffer length in milliseconds.
const BUFFER_MS: usize = 100;

/// Default-device output fed from a lock-free ring of frames.
pub struct CpalOutput {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
    producer: HeapProd<Frame>,
    running: Arc<AtomicBool>,
}

impl CpalOutput {
    /// Open the default output device in stereo.
    ///
    /// Returns the output and the consumer half of the ring, which must be
    /// handed to [`CpalOutput::build_stream`].
    pub fn new() -> Result<(Self, HeapCons<Frame>), AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::DeviceInit(e.to_string()))?;

        let mut config: StreamConfig = config.into();
        // The callback writes interleaved stereo pairs.
        config.channels = 2;

        let capacity = (config.sample_rate.0 as usize * BUFFER_MS / 1000).max(1);
        let (producer, consumer) = HeapRb::<Frame>::new(capacity).split();
        log::debug!(
            "audio output at {} Hz, {} frame ring",
            config.sample_rate.0,
            capacity
        );

        let output = Self {
            device,
            config,
            stream: None,
            producer,
            running: Arc::new(AtomicBool::new(false)),
        };

        Ok((output, consumer))
    }

    /// Build the device stream draining `consumer`.
    pub fn build_stream(&mut self, mut consumer: HeapCons<Frame>) -> Result<(), AudioError> {
        let running = self.running.clone();
        let channels = self.config.channels as usize;

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if !running.load(Ordering::Relaxed) {
                        data.fill(0.0);
                        return;
                    }
                    for chunk in data.chunks_mut(channels) {
                        let frame = consumer.try_pop().unwrap_or_default();
                        write_device_frame(chunk, frame);
                    }
                },
                |err| log::error!("audio stream error: {err}"),
                None,
            )
            .map_err(|e| AudioError::StreamCreate(e.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }

    /// Push one frame, spinning while the ring is full.
    ///
    /// Gives up and returns `false` once `cancel` is set.
    pub fn write_spin(&mut self, frame: Frame, cancel: &AtomicBool) -> bool {
        while self.producer.try_push(frame).is_err() {
            if cancel.load(Ordering::Relaxed) {
                return false;
            }
            std::hint::spin_loop();
        }
        true
    }

    /// Frames queued but not yet consumed by the device.
    pub fn buffered(&self) -> usize {
        self.producer.occupied_len()
    }
}

/// Scale a frame to float and write it into one device frame,
/// zero-filling channels past the stereo pair.
fn write_device_frame(chunk: &mut [f32], frame: Frame) {
    for (i, sample) in chunk.iter_mut().enumerate() {
        *sample = match i {
            0 => frame.left as f32 / 32768.0,
            1 => frame.right as f32 / 32768.0,
            _ => 0.0,
        };
    }
}

impl AudioOutput for CpalOutput {
    fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    fn write(&mut self, frames: &[Frame]) -> usize {
        self.producer.push_slice(frames)
    }

    fn start(&mut self) -> Result<(), AudioError> {
        self.running.store(true, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.play().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), AudioError> {
        self.running.store(false, Ordering::Relaxed);
        if let Some(ref stream) = self.stream {
            stream.pause().map_err(|e| AudioError::Playback(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_frame_scaling() {
        let mut chunk = [1.0f32; 4];
        write_device_frame(&mut chunk, Frame { left: -32768, right: 16384 });
        assert_eq!(chunk, [-1.0, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn mono_device_takes_left() {
        let mut chunk = [0.0f32; 1];
        write_device_frame(&mut chunk, Frame { left: 16384, right: -16384 });
        assert_eq!(chunk, [0.5]);
    }
}
