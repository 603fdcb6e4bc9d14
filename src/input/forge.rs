use std::{
    fs::{self, File},
    io::{self, Cursor, Read, Seek, SeekFrom},
    path::Path,
};

use log::{debug, trace, warn};
use parking_lot::Mutex;
use rsmpeg::{avformat::AVFormatContextInput, ffi};

use crate::{encoders::EncodedStream, error::Result};

use super::{
    InputStreamInitialized, InputStreamInitializing, MediaInputStream, ReadOutcome, SeekOutcome,
};

/// URL prefix that replaces `file://` in the URIs of forge streams.
pub const SCHEME: &str = "forge://";

pub const READ_BUFFER_LENGTH: usize = 1024 * 16;

const SEEK_SET: i32 = 0;
const SEEK_CUR: i32 = 1;
const SEEK_END: i32 = 2;

trait StreamSource: Read + Seek + Send {}

impl<T: Read + Seek + Send> StreamSource for T {}

struct StreamState {
    source: Option<Box<dyn StreamSource>>,
    read_buffer: Vec<u8>,
}

/// Non-seekable to the host, but `seek` still answers direct size queries and repositioning.
pub struct ForgeInputStream {
    stream_uri: String,
    state: Mutex<StreamState>,
    on_initializing: Option<InputStreamInitializing>,
    on_initialized: Option<InputStreamInitialized>,
}

impl ForgeInputStream {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let full_path = fs::canonicalize(path.as_ref())?;
        let stream_uri = forge_uri(&full_path);

        debug!("Opened {} as {}", full_path.display(), stream_uri);

        Ok(Self::with_source(stream_uri, Box::new(file)))
    }

    /// Serves an in-memory bitstream, e.g. the output of the synthetic frame encoder.
    pub fn from_encoded(name: &str, stream: EncodedStream) -> Self {
        let stream_uri = format!("{}encoded/{}", SCHEME, name);

        debug!("Serving {} encoded bytes as {}", stream.len(), stream_uri);

        Self::with_source(stream_uri, Box::new(Cursor::new(stream.freeze())))
    }

    fn with_source(stream_uri: String, source: Box<dyn StreamSource>) -> Self {
        Self {
            stream_uri,
            state: Mutex::new(StreamState {
                source: Some(source),
                read_buffer: vec![0; READ_BUFFER_LENGTH],
            }),
            on_initializing: None,
            on_initialized: None,
        }
    }

    pub fn with_initializing_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_initializing = Some(Box::new(hook));
        self
    }

    pub fn with_initialized_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AVFormatContextInput) + Send + Sync + 'static,
    {
        self.on_initialized = Some(Box::new(hook));
        self
    }

    pub fn is_disposed(&self) -> bool {
        self.state.lock().source.is_none()
    }
}

impl MediaInputStream for ForgeInputStream {
    fn stream_uri(&self) -> &str {
        &self.stream_uri
    }

    fn can_seek(&self) -> bool {
        false
    }

    fn read_buffer_length(&self) -> usize {
        READ_BUFFER_LENGTH
    }

    fn read(&self, target: &mut [u8]) -> ReadOutcome {
        let mut state = self.state.lock();
        let StreamState {
            source,
            read_buffer,
        } = &mut *state;

        let Some(source) = source.as_mut() else {
            return ReadOutcome::IoFault(disposed_error());
        };

        let len = target.len().min(read_buffer.len());
        if len == 0 {
            return ReadOutcome::Data(0);
        }

        loop {
            match source.read(&mut read_buffer[..len]) {
                Ok(0) => {
                    debug!("End of input on {}", self.stream_uri);
                    return ReadOutcome::EndOfInput;
                }
                Ok(count) => {
                    target[..count].copy_from_slice(&read_buffer[..count]);
                    trace!("Read {} bytes from {}", count, self.stream_uri);
                    return ReadOutcome::Data(count);
                }
                Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
                Err(error) => {
                    warn!("Read failed on {}: {}", self.stream_uri, error);
                    return ReadOutcome::IoFault(error);
                }
            }
        }
    }

    fn seek(&self, offset: i64, whence: i32) -> SeekOutcome {
        let mut state = self.state.lock();
        let Some(source) = state.source.as_mut() else {
            return SeekOutcome::IoFault(disposed_error());
        };

        if whence & ffi::AVSEEK_SIZE as i32 != 0 {
            return match stream_length(&mut **source) {
                Ok(size) => SeekOutcome::Size(size),
                Err(error) => SeekOutcome::IoFault(error),
            };
        }

        let target = match whence & !(ffi::AVSEEK_FORCE as i32) {
            SEEK_SET if offset < 0 => {
                return SeekOutcome::IoFault(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("negative seek offset {}", offset),
                ));
            }
            SEEK_SET => SeekFrom::Start(offset as u64),
            SEEK_CUR => SeekFrom::Current(offset),
            SEEK_END => SeekFrom::End(offset),
            other => {
                return SeekOutcome::IoFault(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("unsupported whence {}", other),
                ));
            }
        };

        match source.seek(target) {
            Ok(position) => {
                trace!("Seeked {} to {}", self.stream_uri, position);
                SeekOutcome::Position(position)
            }
            Err(error) => {
                warn!("Seek failed on {}: {}", self.stream_uri, error);
                SeekOutcome::IoFault(error)
            }
        }
    }

    fn dispose(&self) {
        if self.state.lock().source.take().is_some() {
            debug!("Released {}", self.stream_uri);
        }
    }

    fn on_initializing(&self) -> Option<&InputStreamInitializing> {
        self.on_initializing.as_ref()
    }

    fn on_initialized(&self) -> Option<&InputStreamInitialized> {
        self.on_initialized.as_ref()
    }
}

/// The `forge://` URI for an absolute path: its `file://` URI with the scheme swapped.
pub fn forge_uri(full_path: &Path) -> String {
    let path = full_path.to_string_lossy();
    let path = path.strip_prefix(r"\\?\").unwrap_or(&path[..]).replace('\\', "/");
    if path.starts_with('/') {
        format!("{}{}", SCHEME, path)
    } else {
        format!("{}/{}", SCHEME, path)
    }
}

fn stream_length(source: &mut dyn StreamSource) -> io::Result<u64> {
    let position = source.stream_position()?;
    let end = source.seek(SeekFrom::End(0))?;
    if position != end {
        source.seek(SeekFrom::Start(position))?;
    }
    Ok(end)
}

fn disposed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "input stream has been disposed")
}
