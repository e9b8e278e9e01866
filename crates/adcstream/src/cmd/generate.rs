use std::fs::File;
use std::io::{self, BufWriter, Write};

use adcstream_frame::SampleWriter;
use adcstream_scope::{SyntheticConfig, SyntheticStream};
use tracing::info;

use crate::cmd::GenerateArgs;
use crate::exit::{frame_error, io_error, scope_error, CliResult, SUCCESS};

pub fn run(args: GenerateArgs) -> CliResult<i32> {
    let mut stream = SyntheticStream::new(SyntheticConfig {
        channels: args.channels,
        pattern: args.pattern.into(),
        ..SyntheticConfig::default()
    })
    .map_err(|err| scope_error("invalid generator config", err))?;

    let out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(File::create(path).map_err(|err| {
            io_error(&format!("failed creating {}", path.display()), err)
        })?),
        None => Box::new(io::stdout().lock()),
    };
    let mut writer = SampleWriter::new(BufWriter::new(out), args.channels)
        .map_err(|err| frame_error("invalid writer config", err))?;

    for _ in 0..args.count {
        writer
            .write_sample(&stream.next_sample())
            .map_err(|err| frame_error("write failed", err))?;
    }
    writer
        .flush()
        .map_err(|err| frame_error("flush failed", err))?;

    info!(frames = writer.frames_written(), "capture written");
    Ok(SUCCESS)
}
