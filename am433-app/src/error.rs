use std::path::PathBuf;

use thiserror::Error;

/// Failures from the ambient stack: opening input/output/logfiles,
/// configuring a sound card. Decoder rejection is never an error - only
/// genuine I/O and configuration failures reach here, per the core's
/// own error policy.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("unable to open input file: {0}")]
    InputFileOpen(PathBuf, #[source] std::io::Error),

    #[error("failed to read from input file: {0}")]
    InputFileRead(PathBuf, #[source] std::io::Error),

    #[error("unable to create raw-sample tee file: {0}")]
    TeeFileCreate(PathBuf, #[source] std::io::Error),

    #[error("failed to write to raw-sample tee file: {0}")]
    TeeFileWrite(#[source] std::io::Error),

    #[error("failed to write decoded output: {0}")]
    OutputWrite(#[source] std::io::Error),

    #[error("unable to enumerate sound card devices: {0}")]
    DeviceEnumeration(#[source] cpal::DevicesError),

    #[error("unable to locate sound card '{0}'")]
    DeviceNotFound(String),

    #[error("sound card has no input config compatible with 8-bit unsigned mono at {0} Hz")]
    NoCompatibleConfig(u32),

    #[error("unable to retrieve supported input configs from sound card: {0}")]
    SupportedConfigs(#[source] cpal::SupportedStreamConfigsError),

    #[error("unable to build sound card input stream: {0}")]
    StreamBuild(#[source] cpal::BuildStreamError),

    #[error("unable to start sound card input stream: {0}")]
    StreamPlay(#[source] cpal::PlayStreamError),

    #[error("sound card input stream reported an error: {0}")]
    Stream(#[source] cpal::StreamError),

    #[error("short read from sound card input stream")]
    ShortRead,
}
