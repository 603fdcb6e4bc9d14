use std::{ffi::CStr, io, os::raw::c_char};

use rsmpeg::{error::RsmpegError, ffi};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("invalid width: expected {expected}, got {actual}")]
    Width { expected: i32, actual: i32 },

    #[error("invalid height: expected {expected}, got {actual}")]
    Height { expected: i32, actual: i32 },

    #[error("invalid Y linesize: expected {expected}, got {actual}")]
    LinesizeY { expected: i32, actual: i32 },

    #[error("invalid U linesize: expected {expected}, got {actual}")]
    LinesizeU { expected: i32, actual: i32 },

    #[error("invalid V linesize: expected {expected}, got {actual}")]
    LinesizeV { expected: i32, actual: i32 },

    #[error("invalid {plane} data size: buffer holds {available} bytes, plane needs {required}")]
    PlaneSize {
        plane: &'static str,
        required: usize,
        available: usize,
    },

    #[error("unsupported frame size {width}x{height}")]
    Dimensions { width: i32, height: i32 },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("{context}: {message}")]
    Ffmpeg { context: &'static str, message: String },

    #[error("ffmpeg call failed: {0}")]
    Rsmpeg(#[from] RsmpegError),

    #[error("codec not found: {0}")]
    CodecNotFound(String),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error("invalid option '{0}'")]
    InvalidOption(String),

    #[error("unsupported pixel format {0}: only 4:2:0 planar layouts are encoded")]
    UnsupportedPixelFormat(ffi::AVPixelFormat),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Human readable text for an FFmpeg status code.
pub fn av_error_string(code: i32) -> String {
    let mut buffer = [0 as c_char; 1024];
    let ret = unsafe { ffi::av_strerror(code, buffer.as_mut_ptr(), buffer.len() as _) };
    if ret < 0 {
        return format!("unknown error code {}", code);
    }

    unsafe { CStr::from_ptr(buffer.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}

/// Keeps FFmpeg's own message for status codes rsmpeg hands back raw.
pub fn from_rsmpeg(error: RsmpegError, context: &'static str) -> Error {
    match error {
        RsmpegError::SendFrameError(code) | RsmpegError::ReceivePacketError(code) => {
            Error::Ffmpeg {
                context,
                message: av_error_string(code),
            }
        }
        other => Error::Rsmpeg(other),
    }
}
