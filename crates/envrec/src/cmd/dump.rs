use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use envrec_envelope::{standard_registry, EnvelopeReader, Payload, StreamError};
use envrec_frame::{FrameConfig, FrameError, MAX_BODY_SIZE};

use crate::cmd::DumpArgs;
use crate::exit::{
    io_error, stream_error, CliError, CliResult, DATA_INVALID, FAILURE, SUCCESS, USAGE,
};
use crate::output::{OutputFormat, RecordOutput};

pub fn run(args: DumpArgs, format: OutputFormat) -> CliResult<i32> {
    if args.max_body_size == 0 || args.max_body_size > MAX_BODY_SIZE {
        return Err(CliError::new(
            USAGE,
            format!("--max-body-size must be between 1 and {MAX_BODY_SIZE}"),
        ));
    }

    let source = open_source(&args.path)?;
    let registry = standard_registry();
    let config = FrameConfig {
        max_body_size: args.max_body_size,
        ..FrameConfig::default()
    };
    let mut reader = EnvelopeReader::with_config(source, &registry, config);

    let stdout = io::stdout();
    let mut output = RecordOutput::new(stdout.lock(), format);
    let mut printed = 0u64;

    for result in reader.by_ref() {
        let record = match result {
            Ok(record) => record,
            Err(err) if err.is_recoverable() => {
                log_skipped(&err);
                continue;
            }
            Err(err) => return Err(stream_error("read failed", err)),
        };

        if !selected(args.types.as_deref(), record.envelope.data_type) {
            continue;
        }

        if let Payload::Failed(err) = &record.payload {
            tracing::warn!(
                frame_index = record.frame_index,
                offset = record.offset,
                error = %err,
                "payload not decoded"
            );
        }

        match output.write_record(&record) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::BrokenPipe => return Ok(SUCCESS),
            Err(err) => return Err(output_error(err)),
        }
        printed = printed.saturating_add(1);

        if args.count.is_some_and(|count| printed >= count) {
            break;
        }
    }

    match output.finish() {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => return Ok(SUCCESS),
        Err(err) => return Err(output_error(err)),
    }

    let stats = reader.stats();
    tracing::info!(
        frames = stats.frames,
        envelopes = stats.envelopes,
        printed,
        decoded = stats.decoded_payloads,
        unknown = stats.unknown_payloads,
        errors = stats.error_count(),
        skipped_bytes = stats.skipped_bytes,
        "recording decoded"
    );

    if args.strict && stats.error_count() > 0 {
        return Ok(DATA_INVALID);
    }
    Ok(SUCCESS)
}

/// Whether `data_type` passes the `--types` filter.
fn selected(types: Option<&[i32]>, data_type: i32) -> bool {
    types.is_none_or(|types| types.contains(&data_type))
}

fn open_source(path: &Path) -> CliResult<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin().lock()));
    }

    let file =
        File::open(path).map_err(|err| io_error(&format!("open {}", path.display()), err))?;
    Ok(Box::new(file))
}

fn log_skipped(err: &StreamError) {
    match err {
        // One of these per skipped byte; keep them out of the default output.
        StreamError::Frame(FrameError::InvalidMagic { .. }) => {
            tracing::debug!(error = %err, "resynchronising");
        }
        _ => tracing::warn!(error = %err, "skipping"),
    }
}

fn output_error(err: io::Error) -> CliError {
    CliError::new(FAILURE, format!("write failed: {err}"))
}
