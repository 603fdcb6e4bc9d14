use std::sync::Arc;

use log::{debug, info};
use rsmpeg::{
    avcodec::{AVCodec, AVPacket},
    avformat::{AVFormatContextInput, AVIOContextContainer, AVIOContextCustom},
    avutil::AVMem,
    ffi,
};

use crate::error::Result;

use super::MediaInputStream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    pub index: usize,
    pub media_type: ffi::AVMediaType,
    pub codec_name: String,
    pub width: i32,
    pub height: i32,
}

impl StreamSummary {
    pub fn is_video(&self) -> bool {
        self.media_type == ffi::AVMediaType_AVMEDIA_TYPE_VIDEO
    }
}

pub struct MediaInput {
    format_context: AVFormatContextInput,
    stream: Arc<dyn MediaInputStream>,
}

/// The seek callback is only installed when the stream reports it can seek.
pub fn open_media_input(stream: Arc<dyn MediaInputStream>) -> Result<MediaInput> {
    if let Some(hook) = stream.on_initializing() {
        hook(stream.stream_uri());
    }

    let read_stream = stream.clone();
    let seek_stream = stream.can_seek().then(|| stream.clone());

    let io_context = AVIOContextCustom::alloc_context(
        AVMem::new(stream.read_buffer_length()),
        false,
        vec![],
        Some(Box::new(move |_: &mut Vec<u8>, buf: &mut [u8]| {
            read_stream.read(buf).to_avio_code()
        })),
        None,
        match seek_stream {
            Some(seek_stream) => Some(Box::new(
                move |_: &mut Vec<u8>, offset: i64, whence: i32| {
                    seek_stream.seek(offset, whence).to_avio_code()
                },
            )),
            None => None,
        },
    );

    let format_context =
        AVFormatContextInput::from_io_context(AVIOContextContainer::Custom(io_context))?;

    info!(
        "Opened {} ({} streams)",
        stream.stream_uri(),
        format_context.nb_streams
    );

    if let Some(hook) = stream.on_initialized() {
        hook(&format_context);
    }

    Ok(MediaInput {
        format_context,
        stream,
    })
}

impl MediaInput {
    pub fn stream_uri(&self) -> &str {
        self.stream.stream_uri()
    }

    pub fn streams(&self) -> Vec<StreamSummary> {
        self.format_context
            .streams()
            .into_iter()
            .map(|stream| {
                let codecpar = stream.codecpar();
                let codec_name = AVCodec::find_decoder(codecpar.codec_id)
                    .map(|codec| codec.name().to_string_lossy().into_owned())
                    .unwrap_or_else(|| String::from("unknown"));

                StreamSummary {
                    index: stream.index as usize,
                    media_type: codecpar.codec_type,
                    codec_name,
                    width: codecpar.width,
                    height: codecpar.height,
                }
            })
            .collect()
    }

    pub fn read_packet(&mut self) -> Result<Option<AVPacket>> {
        Ok(self.format_context.read_packet()?)
    }

    /// Reads to the end of input, returning the packet count and total payload size.
    pub fn drain_packets(&mut self) -> Result<(usize, usize)> {
        let mut packets = 0;
        let mut bytes = 0;

        while let Some(packet) = self.read_packet()? {
            packets += 1;
            bytes += packet.size.max(0) as usize;
        }

        debug!(
            "Drained {} packets ({} bytes) from {}",
            packets,
            bytes,
            self.stream.stream_uri()
        );

        Ok((packets, bytes))
    }

    pub fn close(self) {
        let MediaInput {
            format_context,
            stream,
        } = self;
        drop(format_context);
        stream.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    };

    use crate::{
        encoders::{encode_synthetic_stream, SyntheticFrameEncoderBuilder},
        input::ForgeInputStream,
    };

    use super::*;

    fn small_mjpeg() -> crate::encoders::EncodedStream {
        encode_synthetic_stream(SyntheticFrameEncoderBuilder::new().width(64).height(48)).unwrap()
    }

    #[test]
    fn demuxes_encoded_frame_through_forge_stream() {
        let encoded = small_mjpeg();
        let encoded_len = encoded.len();

        let stream = Arc::new(ForgeInputStream::from_encoded("frame", encoded));
        let mut input = open_media_input(stream.clone()).unwrap();

        assert_eq!(input.stream_uri(), "forge://encoded/frame");

        let streams = input.streams();
        assert_eq!(streams.len(), 1);
        assert!(streams[0].is_video());
        assert_eq!(streams[0].codec_name, "mjpeg");

        let (packets, bytes) = input.drain_packets().unwrap();
        assert!(packets >= 1);
        assert!(bytes > 0 && bytes <= encoded_len);

        input.close();
        assert!(stream.is_disposed());
    }

    #[test]
    fn initialization_hooks_run_around_open() {
        let seen_uri = Arc::new(Mutex::new(None));
        let initialized = Arc::new(AtomicBool::new(false));

        let hook_uri = seen_uri.clone();
        let hook_initialized = initialized.clone();
        let stream = ForgeInputStream::from_encoded("hooks", small_mjpeg())
            .with_initializing_hook(move |uri| {
                *hook_uri.lock().unwrap() = Some(uri.to_string());
            })
            .with_initialized_hook(move |format_context| {
                assert!(format_context.nb_streams >= 1);
                hook_initialized.store(true, Ordering::SeqCst);
            });

        let input = open_media_input(Arc::new(stream)).unwrap();

        assert_eq!(
            seen_uri.lock().unwrap().as_deref(),
            Some("forge://encoded/hooks")
        );
        assert!(initialized.load(Ordering::SeqCst));

        input.close();
    }
}
