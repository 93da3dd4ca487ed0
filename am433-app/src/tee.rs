use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::CaptureError;

/// Writes the raw sample stream verbatim to a file, alongside normal
/// processing - the optional `-l LOGFILE` tee named in §6.
pub struct RawTee {
    writer: BufWriter<File>,
}

impl RawTee {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| CaptureError::TeeFileCreate(path, e))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<(), CaptureError> {
        self.writer
            .write_all(bytes)
            .map_err(CaptureError::TeeFileWrite)
    }
}
