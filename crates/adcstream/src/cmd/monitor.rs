use std::time::Instant;

use adcstream_frame::DecoderConfig;
use adcstream_scope::{
    HistoryConfig, PollOutcome, Scope, ScopeConfig, TelemetryConfig, DEFAULT_SMOOTHING_WINDOW,
};
use adcstream_source::{ByteSource, CancellationToken};
use tracing::info;

use crate::cmd::source::{install_ctrlc_handler, open_source, SourceGuard};
use crate::cmd::{nonzero, parse_duration, MonitorArgs};
use crate::exit::{scope_error, CliResult, SUCCESS};
use crate::output::{now_unix_seconds, print_telemetry, OutputFormat, TelemetryLine};

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    let tick = parse_duration(&args.tick)?;
    let deadline = args.duration.as_deref().map(parse_duration).transpose()?;
    let config = ScopeConfig {
        decoder: DecoderConfig {
            channels: args.source.channels,
            max_pending_bytes: nonzero(args.max_pending),
        },
        history: HistoryConfig {
            capacity: args.history,
            ..HistoryConfig::default()
        },
        telemetry: TelemetryConfig {
            report_interval: parse_duration(&args.interval)?,
            smoothing_window: args.smoothing.then_some(DEFAULT_SMOOTHING_WINDOW),
        },
    };

    let cancel = CancellationToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let (source, guard) = open_source(&args.source, &cancel)?;
    let mut scope =
        Scope::with_config(source, config).map_err(|err| scope_error("invalid config", err))?;

    info!(source = guard.label(), channels = scope.channels(), "monitoring");

    let started = Instant::now();
    let result = scope.run(&cancel, tick, |scope, outcome| {
        render(scope, outcome, &guard, format);
        if deadline.is_some_and(|limit| started.elapsed() >= limit) {
            cancel.cancel();
        }
    });

    let stats = scope.decoder_stats();
    info!(
        frames_total = stats.frames_total,
        errors_total = stats.errors_total,
        dropped_bytes = guard.dropped_bytes(),
        "monitor stopped"
    );
    guard.finish();

    result.map_err(|err| scope_error("stream failed", err))?;
    Ok(SUCCESS)
}

fn render<S: ByteSource>(
    scope: &Scope<S>,
    outcome: &PollOutcome,
    guard: &SourceGuard,
    format: OutputFormat,
) {
    let Some(report) = &outcome.report else {
        return;
    };
    let stats = scope.decoder_stats();
    let line = TelemetryLine {
        kind: "telemetry",
        source: guard.label().to_string(),
        rate_hz: report.rate_hz,
        backlog_bytes: report.backlog_bytes,
        packets: report.packets,
        frames_total: stats.frames_total,
        errors_total: stats.errors_total,
        dropped_bytes: guard.dropped_bytes(),
        latest: scope.history().latest(),
        timestamp: now_unix_seconds(),
    };
    print_telemetry(&line, format);
}
