use bytes::{BufMut, BytesMut};
use log::debug;
use rsmpeg::{avcodec::AVCodecContext, error::RsmpegError};

use crate::error::{from_rsmpeg, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainState {
    NeedsInput,
    Flushed,
}

/// Appends every ready packet to `output_buffer`; returns the bytes written and why it stopped.
pub fn receive_encoded_packets(
    encode_context: &mut AVCodecContext,
    output_buffer: &mut BytesMut,
) -> Result<(usize, DrainState)> {
    let mut written = 0;

    loop {
        let packet = match encode_context.receive_packet() {
            Ok(packet) => packet,
            Err(RsmpegError::EncoderDrainError) => {
                debug!("Encoder needs more input, stopping drain");
                return Ok((written, DrainState::NeedsInput));
            }
            Err(RsmpegError::EncoderFlushedError) => {
                debug!("Encoder flushed, stopping drain");
                return Ok((written, DrainState::Flushed));
            }
            Err(error) => return Err(from_rsmpeg(error, "receive packet")),
        };

        let data = if packet.size > 0 && !packet.data.is_null() {
            unsafe { std::slice::from_raw_parts(packet.data, packet.size as usize) }
        } else {
            &[][..]
        };

        debug!("Encoded packet (pts: {}, size: {})", packet.pts, data.len());

        output_buffer.put(data);
        written += data.len();
    }
}
