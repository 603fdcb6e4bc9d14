use std::io;

use rsmpeg::{avformat::AVFormatContextInput, ffi};

mod forge;
mod host;

pub use forge::*;
pub use host::*;

/// Called with the stream URI right before the demuxer is opened.
pub type InputStreamInitializing = Box<dyn Fn(&str) + Send + Sync>;

/// Called with the opened demuxer, before any packet is read.
pub type InputStreamInitialized = Box<dyn Fn(&AVFormatContextInput) + Send + Sync>;

#[derive(Debug)]
pub enum ReadOutcome {
    Data(usize),
    EndOfInput,
    IoFault(io::Error),
}

impl ReadOutcome {
    pub fn to_avio_code(&self) -> i32 {
        match self {
            ReadOutcome::Data(count) => *count as i32,
            ReadOutcome::EndOfInput => ffi::AVERROR_EOF,
            ReadOutcome::IoFault(error) => io_error_code(error),
        }
    }
}

#[derive(Debug)]
pub enum SeekOutcome {
    Position(u64),
    /// Answer to an `AVSEEK_SIZE` query.
    Size(u64),
    IoFault(io::Error),
}

impl SeekOutcome {
    pub fn to_avio_code(&self) -> i64 {
        match self {
            SeekOutcome::Position(position) => *position as i64,
            SeekOutcome::Size(size) => *size as i64,
            SeekOutcome::IoFault(error) => io_error_code(error) as i64,
        }
    }
}

fn io_error_code(error: &io::Error) -> i32 {
    let errno = error
        .raw_os_error()
        .filter(|errno| *errno > 0)
        .unwrap_or(ffi::EIO as i32);
    -errno
}

/// `read` and `seek` may be called from any thread; implementations serialize access.
pub trait MediaInputStream: Send + Sync {
    fn stream_uri(&self) -> &str;

    fn can_seek(&self) -> bool;

    fn read_buffer_length(&self) -> usize;

    fn read(&self, target: &mut [u8]) -> ReadOutcome;

    fn seek(&self, offset: i64, whence: i32) -> SeekOutcome;

    /// Idempotent.
    fn dispose(&self);

    fn on_initializing(&self) -> Option<&InputStreamInitializing> {
        None
    }

    fn on_initialized(&self) -> Option<&InputStreamInitialized> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_outcomes_map_to_distinct_codes() {
        assert_eq!(ReadOutcome::Data(512).to_avio_code(), 512);
        assert_eq!(ReadOutcome::EndOfInput.to_avio_code(), ffi::AVERROR_EOF);

        let fault = ReadOutcome::IoFault(io::Error::from_raw_os_error(ffi::EIO as i32));
        assert_eq!(fault.to_avio_code(), -(ffi::EIO as i32));
        assert_ne!(fault.to_avio_code(), ffi::AVERROR_EOF);
    }

    #[test]
    fn faults_without_errno_fall_back_to_eio() {
        let fault = ReadOutcome::IoFault(io::Error::new(io::ErrorKind::Other, "disk on fire"));
        assert_eq!(fault.to_avio_code(), -(ffi::EIO as i32));

        let fault = SeekOutcome::IoFault(io::Error::new(io::ErrorKind::InvalidInput, "bad whence"));
        assert_eq!(fault.to_avio_code(), -(ffi::EIO as i64));
    }

    #[test]
    fn seek_outcomes_report_positions() {
        assert_eq!(SeekOutcome::Position(4096).to_avio_code(), 4096);
        assert_eq!(SeekOutcome::Size(1 << 40).to_avio_code(), 1 << 40);
    }
}
