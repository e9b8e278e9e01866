use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use adcstream_frame::{DecoderConfig, FrameError, SampleReader};
use tracing::info;

use crate::cmd::{nonzero, DecodeArgs};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_decode_summary, print_sample, DecodeSummary, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let input = open_input(&args.input)?;
    let mut reader = SampleReader::with_config(
        BufReader::new(input),
        DecoderConfig {
            channels: args.channels,
            max_pending_bytes: nonzero(args.max_pending),
        },
    )
    .map_err(|err| frame_error("invalid decoder config", err))?;

    let mut index = 0u64;
    loop {
        match reader.read_sample() {
            Ok(sample) => {
                if !args.quiet {
                    print_sample(index, sample.values(), format);
                }
                index += 1;
            }
            Err(FrameError::ConnectionClosed) => break,
            Err(err) => return Err(frame_error("read failed", err)),
        }
    }

    let decoder = reader.decoder();
    let stats = decoder.stats();
    info!(
        frames_total = stats.frames_total,
        errors_total = stats.errors_total,
        "capture decoded"
    );
    print_decode_summary(
        &DecodeSummary {
            kind: "decode-summary",
            channels: decoder.channels(),
            bytes_total: stats.bytes_total,
            frames_total: stats.frames_total,
            errors_total: stats.errors_total,
            overflow_bytes_total: stats.overflow_bytes_total,
            trailing_bytes: decoder.pending_len(),
        },
        format,
    );
    Ok(SUCCESS)
}

fn open_input(path: &Path) -> CliResult<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }
    let file = File::open(path)
        .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
    Ok(Box::new(file))
}
