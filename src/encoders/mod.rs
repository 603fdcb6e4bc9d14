use std::{
    ffi::CString,
    fs,
    path::{Path, PathBuf},
};

use bytes::{Bytes, BytesMut};
use log::{debug, info};
use rsmpeg::avcodec::{AVCodec, AVCodecContext};

use crate::{
    error::{Error, Result},
    ffi,
    options::Options,
};

mod picture;
mod utils;

pub use picture::*;
pub use utils::packet::DrainState;

use utils::{
    avframe::{send_flush, send_picture},
    packet::receive_encoded_packets,
};

pub const DEFAULT_WIDTH: i32 = 1920;
pub const DEFAULT_HEIGHT: i32 = 1080;
pub const DEFAULT_FPS: i32 = 25;
pub const DEFAULT_CODEC_ID: ffi::AVCodecID = ffi::AVCodecID_AV_CODEC_ID_MJPEG;
pub const DEFAULT_PIXEL_FORMAT: ffi::AVPixelFormat = ffi::AVPixelFormat_AV_PIX_FMT_YUVJ420P;

#[derive(Debug, Default, Clone)]
pub struct EncodedStream {
    data: BytesMut,
    output_file_name: Option<PathBuf>,
}

impl EncodedStream {
    pub fn new(data: BytesMut) -> Self {
        Self {
            data,
            output_file_name: None,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn freeze(self) -> Bytes {
        self.data.freeze()
    }

    pub fn output_file_name(&self) -> Option<&Path> {
        self.output_file_name.as_deref()
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path.as_ref(), &self.data)?;
        info!(
            "Wrote {} encoded bytes to {}",
            self.data.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}

pub struct SyntheticFrameEncoderBuilder {
    codec_id: Option<ffi::AVCodecID>,
    codec_name: Option<String>,

    width: Option<i32>,
    height: Option<i32>,
    fps: Option<i32>,

    pixel_format: Option<ffi::AVPixelFormat>,
    options: Option<Options>,

    output_file_name: Option<PathBuf>,
}

impl Default for SyntheticFrameEncoderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticFrameEncoderBuilder {
    pub fn new() -> Self {
        Self {
            codec_id: None,
            codec_name: None,
            width: None,
            height: None,
            fps: None,
            pixel_format: None,
            options: None,
            output_file_name: None,
        }
    }

    pub fn build(self) -> Result<SyntheticFrameEncoder> {
        let width = self.width.unwrap_or(DEFAULT_WIDTH);
        let height = self.height.unwrap_or(DEFAULT_HEIGHT);
        let fps = self.fps.unwrap_or(DEFAULT_FPS);
        let pixel_format = self.pixel_format.unwrap_or(DEFAULT_PIXEL_FORMAT);
        let options = self
            .options
            .unwrap_or_else(|| Options::new().set("preset", "veryslow"));

        if fps <= 0 {
            return Err(Error::InvalidOption(format!("fps={}", fps)));
        }

        if !is_planar_yuv420(pixel_format) {
            return Err(Error::UnsupportedPixelFormat(pixel_format));
        }

        let geometry = PlanarGeometry::yuv420(width, height)?;

        let encoder = match self.codec_name {
            Some(name) => {
                let codec_name = CString::new(name.as_str())
                    .map_err(|_| Error::InvalidOption(name.clone()))?;
                AVCodec::find_encoder_by_name(&codec_name).ok_or(Error::CodecNotFound(name))?
            }
            None => {
                let codec_id = self.codec_id.unwrap_or(DEFAULT_CODEC_ID);
                AVCodec::find_encoder(codec_id)
                    .ok_or_else(|| Error::CodecNotFound(format!("codec id {}", codec_id)))?
            }
        };

        let mut encode_context = AVCodecContext::new(&encoder);
        encode_context.set_width(width);
        encode_context.set_height(height);
        encode_context.set_time_base(ffi::AVRational { num: 1, den: fps });
        encode_context.set_framerate(ffi::AVRational { num: fps, den: 1 });
        encode_context.set_pix_fmt(pixel_format);

        debug!("Opening encoder {:?} with options {:?}", encoder.name(), options);

        encode_context.open(Some(options.to_av_dict()?))?;

        Ok(SyntheticFrameEncoder {
            encode_context,
            geometry,
            frame_number: 0,
            output: BytesMut::with_capacity(geometry.frame_size()),
            output_file_name: self.output_file_name,
        })
    }

    builder_set!(codec_id, ffi::AVCodecID);
    builder_set!(width, i32);
    builder_set!(height, i32);
    builder_set!(fps, i32);
    builder_set!(pixel_format, ffi::AVPixelFormat);
    builder_set!(options, Options);

    pub fn codec_name(mut self, codec_name: &str) -> Self {
        self.codec_name = Some(codec_name.to_string());
        self
    }

    pub fn output_file_name<P: Into<PathBuf>>(mut self, output_file_name: P) -> Self {
        self.output_file_name = Some(output_file_name.into());
        self
    }
}

pub struct SyntheticFrameEncoder {
    encode_context: AVCodecContext,
    geometry: PlanarGeometry,
    frame_number: i64,
    output: BytesMut,
    output_file_name: Option<PathBuf>,
}

impl SyntheticFrameEncoder {
    pub fn geometry(&self) -> &PlanarGeometry {
        &self.geometry
    }

    pub fn blank_picture(&self) -> RawPicture {
        RawPicture::blank(&self.geometry)
    }

    pub fn encode(&mut self, picture: &RawPicture) -> Result<usize> {
        let pts = self.frame_number;
        send_picture(&mut self.encode_context, picture, &self.geometry, pts)?;
        self.frame_number += 1;

        let (written, state) = receive_encoded_packets(&mut self.encode_context, &mut self.output)?;
        debug!("Frame {} produced {} bytes ({:?})", pts, written, state);

        Ok(written)
    }

    pub fn finish(mut self) -> Result<EncodedStream> {
        send_flush(&mut self.encode_context)?;

        loop {
            let (written, state) =
                receive_encoded_packets(&mut self.encode_context, &mut self.output)?;
            debug!("Flush produced {} bytes ({:?})", written, state);
            if state == DrainState::Flushed || written == 0 {
                break;
            }
        }

        let stream = EncodedStream {
            data: self.output,
            output_file_name: self.output_file_name,
        };

        if let Some(path) = stream.output_file_name() {
            stream.write_to(path)?;
        }

        Ok(stream)
    }
}

fn is_planar_yuv420(pixel_format: ffi::AVPixelFormat) -> bool {
    pixel_format == ffi::AVPixelFormat_AV_PIX_FMT_YUV420P
        || pixel_format == ffi::AVPixelFormat_AV_PIX_FMT_YUVJ420P
}

/// Encodes a single zero-filled picture and returns the resulting bitstream.
pub fn encode_synthetic_stream(builder: SyntheticFrameEncoderBuilder) -> Result<EncodedStream> {
    let mut encoder = builder.build()?;
    let picture = encoder.blank_picture();

    encoder.encode(&picture)?;
    let stream = encoder.finish()?;

    info!(
        "Encoded one {}x{} synthetic frame into {} bytes",
        picture.width,
        picture.height,
        stream.len()
    );

    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GeometryError;

    #[test]
    fn default_example_encodes_one_full_hd_frame() {
        let stream = encode_synthetic_stream(SyntheticFrameEncoderBuilder::new()).unwrap();

        assert!(!stream.is_empty());
        assert_eq!(&stream.as_bytes()[..2], &[0xff, 0xd8]);
        assert!(stream.output_file_name().is_none());
    }

    #[test]
    fn mismatched_picture_is_rejected_before_encoding() {
        let mut encoder = SyntheticFrameEncoderBuilder::new()
            .width(64)
            .height(48)
            .build()
            .unwrap();

        let mut picture = encoder.blank_picture();
        picture.linesize[0] = 128;

        match encoder.encode(&picture) {
            Err(Error::Geometry(GeometryError::LinesizeY { expected, actual })) => {
                assert_eq!(expected, 64);
                assert_eq!(actual, 128);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let picture = RawPicture::blank(&PlanarGeometry::yuv420(32, 48).unwrap());
        assert!(matches!(
            encoder.encode(&picture),
            Err(Error::Geometry(GeometryError::Width { expected: 64, actual: 32 }))
        ));
    }

    #[test]
    fn unknown_codec_name_is_reported() {
        let result = SyntheticFrameEncoderBuilder::new()
            .codec_name("no-such-encoder")
            .build();

        match result {
            Err(Error::CodecNotFound(name)) => assert_eq!(name, "no-such-encoder"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("encoder should not exist"),
        }
    }

    #[test]
    fn non_yuv420_pixel_format_is_rejected() {
        for pixel_format in [
            ffi::AVPixelFormat_AV_PIX_FMT_RGBA64LE,
            ffi::AVPixelFormat_AV_PIX_FMT_YUV444P,
            ffi::AVPixelFormat_AV_PIX_FMT_BGR24,
        ] {
            let result = SyntheticFrameEncoderBuilder::new()
                .codec_name("rawvideo")
                .width(16)
                .height(16)
                .pixel_format(pixel_format)
                .build();

            match result {
                Err(Error::UnsupportedPixelFormat(rejected)) => assert_eq!(rejected, pixel_format),
                Err(other) => panic!("unexpected error: {}", other),
                Ok(_) => panic!("pixel format {} should be rejected", pixel_format),
            }
        }

        let encoder = SyntheticFrameEncoderBuilder::new()
            .codec_name("rawvideo")
            .width(16)
            .height(16)
            .pixel_format(ffi::AVPixelFormat_AV_PIX_FMT_YUV420P)
            .build();
        assert!(encoder.is_ok());
    }

    #[test]
    fn encoded_stream_is_written_to_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.mjpeg");

        let stream = encode_synthetic_stream(
            SyntheticFrameEncoderBuilder::new()
                .width(32)
                .height(32)
                .output_file_name(&path),
        )
        .unwrap();

        assert_eq!(stream.output_file_name(), Some(path.as_path()));
        assert_eq!(std::fs::read(&path).unwrap(), stream.as_bytes());
    }
}
