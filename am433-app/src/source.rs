use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::time::SystemTime;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, Stream};
use log::warn;

use crate::error::CaptureError;

/// A byte stream of raw unsigned 8-bit PCM samples, read in fixed-size
/// chunks. Implementors are the two collaborators named in the
/// specification's external-interfaces section: a regular file, or a
/// live sound card.
pub trait SampleSource {
    /// Blocking read of up to `buf.len()` bytes. Returns `0` at
    /// end-of-stream, matching `std::io::Read`'s own convention.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError>;

    /// Wallclock corresponding to sample index 0 of this source, used to
    /// derive per-packet timestamps.
    fn capture_start(&self) -> SystemTime;
}

/// Reads raw samples from a regular file, once, start to end.
pub struct FileSource {
    reader: BufReader<File>,
    path: PathBuf,
    capture_start: SystemTime,
}

impl FileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let file =
            File::open(&path).map_err(|e| CaptureError::InputFileOpen(path.clone(), e))?;
        Ok(Self {
            reader: BufReader::new(file),
            path,
            capture_start: SystemTime::now(),
        })
    }
}

impl SampleSource for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        self.reader
            .read(buf)
            .map_err(|e| CaptureError::InputFileRead(self.path.clone(), e))
    }

    fn capture_start(&self) -> SystemTime {
        self.capture_start
    }
}

/// Reads raw samples from a live sound card input. A dedicated cpal
/// callback thread pushes fixed-size chunks across a bounded channel to
/// whoever calls [`SoundcardSource::read`]; this is the concession the
/// ambient stack makes to the blocking nature of device I/O, not a
/// change to the core's own single-threaded model (§5).
pub struct SoundcardSource {
    rx: Receiver<Vec<u8>>,
    leftover: Option<(Vec<u8>, usize)>,
    capture_start: SystemTime,
    // Kept alive for the duration of capture; dropping it stops the stream.
    _stream: Stream,
}

impl SoundcardSource {
    pub fn open(device_name: Option<&str>, fs: u32) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => host
                .devices()
                .map_err(CaptureError::DeviceEnumeration)?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| CaptureError::DeviceNotFound(name.to_string()))?,
            None => host
                .default_input_device()
                .ok_or_else(|| CaptureError::DeviceNotFound("default".to_string()))?,
        };

        let mut configs = device
            .supported_input_configs()
            .map_err(CaptureError::SupportedConfigs)?;
        let config = configs
            .find(|c| {
                c.channels() == 1
                    && c.sample_format() == SampleFormat::U8
                    && c.min_sample_rate().0 <= fs
                    && c.max_sample_rate().0 >= fs
            })
            .ok_or(CaptureError::NoCompatibleConfig(fs))?
            .with_sample_rate(SampleRate(fs));

        let (tx, rx) = sync_channel(128);
        let capture_start = SystemTime::now();

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[u8], _info: &cpal::InputCallbackInfo| {
                    send_chunk(&tx, data);
                },
                move |e| {
                    warn!("sound card input stream error: {e}");
                },
                None,
            )
            .map_err(CaptureError::StreamBuild)?;
        stream.play().map_err(CaptureError::StreamPlay)?;

        Ok(Self {
            rx,
            leftover: None,
            capture_start,
            _stream: stream,
        })
    }
}

fn send_chunk(tx: &SyncSender<Vec<u8>>, data: &[u8]) {
    if tx.try_send(data.to_vec()).is_err() {
        warn!("sound card input overrun: dropping a chunk of {} samples", data.len());
    }
}

impl SampleSource for SoundcardSource {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, CaptureError> {
        if let Some((chunk, idx)) = self.leftover.take() {
            let remaining = chunk.len() - idx;
            let to_copy = remaining.min(buf.len());
            buf[..to_copy].copy_from_slice(&chunk[idx..idx + to_copy]);
            if to_copy < remaining {
                self.leftover = Some((chunk, idx + to_copy));
            }
            return Ok(to_copy);
        }

        let chunk = self.rx.recv().map_err(|_| CaptureError::ShortRead)?;
        let to_copy = chunk.len().min(buf.len());
        buf[..to_copy].copy_from_slice(&chunk[..to_copy]);
        if to_copy < chunk.len() {
            self.leftover = Some((chunk, to_copy));
        }
        Ok(to_copy)
    }

    fn capture_start(&self) -> SystemTime {
        self.capture_start
    }
}
