use log::trace;
use rsmpeg::{avcodec::AVCodecContext, avutil::AVFrame, error::RsmpegError, UnsafeDerefMut};

use crate::{
    encoders::picture::{PlanarGeometry, RawPicture},
    error::{from_rsmpeg, Result},
};

/// The frame borrows the picture's planes; FFmpeg copies non-refcounted frames on submission.
pub fn send_picture(
    encode_context: &mut AVCodecContext,
    picture: &RawPicture,
    geometry: &PlanarGeometry,
    pts: i64,
) -> Result<()> {
    picture.validate(geometry)?;

    let mut avframe = AVFrame::new();
    avframe.set_format(encode_context.pix_fmt);
    avframe.set_width(picture.width);
    avframe.set_height(picture.height);
    avframe.set_pts(pts);

    let base = picture.data.as_ptr().cast_mut();
    let offsets = geometry.plane_offsets();
    unsafe {
        let raw = avframe.deref_mut();
        for (plane, offset) in offsets.iter().enumerate() {
            raw.data[plane] = base.add(*offset);
            raw.linesize[plane] = picture.linesize[plane];
        }
    }

    trace!("Sending frame (pts: {}, linesizes: {:?})", pts, picture.linesize);

    encode_context
        .send_frame(Some(&avframe))
        .map_err(|error| from_rsmpeg(error, "send frame"))
}

pub fn send_flush(encode_context: &mut AVCodecContext) -> Result<()> {
    match encode_context.send_frame(None) {
        Ok(()) | Err(RsmpegError::EncoderFlushedError) => Ok(()),
        Err(error) => Err(from_rsmpeg(error, "flush encoder")),
    }
}
