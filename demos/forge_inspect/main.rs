use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::Parser;
use forge_input_stream::{
    encoders::{encode_synthetic_stream, SyntheticFrameEncoderBuilder},
    input::{open_media_input, ForgeInputStream, MediaInputStream},
    options::Options,
};

#[derive(Parser, Debug)]
struct Args {
    /// Media file to open through the forge:// input stream.
    #[arg(conflicts_with = "synthetic")]
    path: Option<PathBuf>,

    /// Encode one blank frame and demux it from memory instead of reading a file.
    #[arg(short, long)]
    synthetic: bool,

    #[arg(long, default_value_t = 1920)]
    width: i32,

    #[arg(long, default_value_t = 1080)]
    height: i32,

    #[arg(long, default_value_t = 25)]
    fps: i32,

    /// Encoder name, e.g. "mjpeg" or "libx264".
    #[arg(long, default_value = "mjpeg")]
    codec: String,

    /// Where to save the synthetic bitstream.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn inspect(args: Args) -> anyhow::Result<()> {
    let stream: Arc<dyn MediaInputStream> = match &args.path {
        Some(path) => Arc::new(
            ForgeInputStream::open(path)
                .with_context(|| format!("opening {}", path.display()))?,
        ),
        None => {
            let mut builder = SyntheticFrameEncoderBuilder::new()
                .codec_name(&args.codec)
                .width(args.width)
                .height(args.height)
                .fps(args.fps)
                .options(Options::new().set("preset", "veryslow"));
            if let Some(output) = &args.output {
                builder = builder.output_file_name(output);
            }

            let encoded = encode_synthetic_stream(builder).context("encoding synthetic frame")?;
            Arc::new(ForgeInputStream::from_encoded(&args.codec, encoded))
        }
    };

    let mut input = open_media_input(stream).context("opening demuxer")?;

    for summary in input.streams() {
        log::info!(
            "Stream #{}: {} {}x{} (type {})",
            summary.index,
            summary.codec_name,
            summary.width,
            summary.height,
            summary.media_type
        );
    }

    let (packets, bytes) = input.drain_packets().context("reading packets")?;
    log::info!(
        "Read {} packets ({} bytes) from {}",
        packets,
        bytes,
        input.stream_uri()
    );

    input.close();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();
    if args.path.is_none() && !args.synthetic {
        anyhow::bail!("pass a media file path or --synthetic");
    }

    tokio::task::spawn_blocking(move || inspect(args)).await?
}
