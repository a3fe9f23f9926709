//! Purpose: `aiscdec` CLI entry point: decode AIS armored payloads into JSON.
//! Role: Binary crate root; parses args, builds one decoder, emits JSON on stdout.
//! Invariants: stdout carries only decode results (one JSON value per request).
//! Invariants: Non-interactive errors and skip notices are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aiscdec::api::{DecodeRequest, DecoderConfig, Error, ErrorKind, create_decoder, to_exit_code};
use aiscdec::notice::{Notice, notice_json};
use aiscdec::stream::{self, ErrorPolicy, StreamConfig, StreamFailure};

#[derive(Parser)]
#[command(
    name = "aiscdec",
    version,
    about = "Decode AIS armored sentence payloads to JSON",
    long_about = None,
    after_help = r#"EXAMPLES
  $ aiscdec decode '177KQJ5000G?tO`K>RA1wUbN0TKH'
  $ aiscdec decode --padding 2 '55P5TL01VIaAL@7WKO@mBplU@<PDhh000000001S;AJ::4A80?4i@E531@0000000000000'
  $ printf '177KQJ5000G?tO`K>RA1wUbN0TKH 0\n' | aiscdec stream

Input lines for `stream` are BODY[<space|,>PADDING]; blank lines and # comments are ignored."#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "JSON decoder config file",
        value_hint = ValueHint::FilePath
    )]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Python module providing the decoder (default: ais)")]
    module: Option<String>,
    #[arg(long, global = true, help = "Decode function name (default: decode)")]
    function: Option<String>,
    #[arg(
        long,
        global = true,
        help = "Give up waiting for the runtime lock after this many milliseconds"
    )]
    lock_timeout_ms: Option<u64>,
    #[arg(long, global = true, help = "Pretty-print JSON output")]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Decode a single armored payload")]
    Decode {
        #[arg(help = "Armored payload (ASCII)")]
        body: String,
        #[arg(
            long,
            short,
            default_value_t = 0,
            value_parser = clap::value_parser!(u8).range(0..=5),
            help = "Fill bits in the last character"
        )]
        padding: u8,
    },
    #[command(about = "Decode line-delimited payloads from a file or stdin")]
    Stream {
        #[arg(help = "Input file (default: stdin)", value_hint = ValueHint::FilePath)]
        input: Option<PathBuf>,
        #[arg(long, value_enum, default_value = "skip", help = "On a failed line: skip|stop")]
        errors: ErrorsArg,
    },
    #[command(about = "Print shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ErrorsArg {
    Skip,
    Stop,
}

impl From<ErrorsArg> for ErrorPolicy {
    fn from(value: ErrorsArg) -> Self {
        match value {
            ErrorsArg::Skip => ErrorPolicy::Skip,
            ErrorsArg::Stop => ErrorPolicy::Stop,
        }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<i32, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(code);
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage).with_message(clap_error_summary(&err)));
            }
        },
    };

    init_tracing();

    let config = match &cli.command {
        Command::Completion { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(*shell, &mut command, "aiscdec", &mut io::stdout());
            return Ok(0);
        }
        _ => resolve_config(&cli)?,
    };
    let decoder = create_decoder(&config)?;
    let pretty = cli.pretty;

    match cli.command {
        Command::Decode { body, padding } => {
            let value = decoder.decode(&body, padding)?;
            stream::write_value(&mut io::stdout().lock(), &value, pretty)?;
        }
        Command::Stream { input, errors } => {
            let stream_config = StreamConfig {
                errors: errors.into(),
                pretty,
            };
            let decode = |request: &DecodeRequest| decoder.decode_request(request);
            let stdout = io::stdout().lock();
            let outcome = match input {
                Some(path) => {
                    let file = File::open(&path).map_err(|err| {
                        Error::new(ErrorKind::Io)
                            .with_message(format!("failed to open {}", path.display()))
                            .with_source(err)
                    })?;
                    stream::run(
                        BufReader::new(file),
                        stdout,
                        stream_config,
                        decode,
                        emit_skip_notice,
                    )?
                }
                None => stream::run(
                    io::stdin().lock(),
                    stdout,
                    stream_config,
                    decode,
                    emit_skip_notice,
                )?,
            };
            info!(
                total = outcome.records_total,
                ok = outcome.ok,
                failed = outcome.failed,
                "stream finished"
            );
        }
        Command::Completion { .. } => {}
    }

    decoder.destroy();
    Ok(0)
}

/// Flags > env > config file > defaults.
fn resolve_config(cli: &Cli) -> Result<DecoderConfig, Error> {
    let base = match &cli.config {
        Some(path) => DecoderConfig::from_path(path)?,
        None => DecoderConfig::default(),
    };
    let mut config = base.with_env()?;
    if let Some(module) = &cli.module {
        config.module = module.clone();
    }
    if let Some(function) = &cli.function {
        config.function = function.clone();
    }
    if let Some(ms) = cli.lock_timeout_ms {
        config.lock_timeout_ms = Some(ms);
    }
    Ok(config)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .try_init();
}

fn emit_skip_notice(failure: StreamFailure) {
    warn!(line = failure.line, error = %failure.error, "skipping input line");
    let mut details = Map::new();
    details.insert(
        "error".to_string(),
        error_json(&failure.error)["error"].clone(),
    );
    let notice = Notice {
        kind: "skip".to_string(),
        cmd: "stream".to_string(),
        line: Some(failure.line),
        message: error_message(&failure.error),
        details,
    };
    let json = serde_json::to_string(&notice_json(&notice)).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"skip\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("error: {}", error_message(err));
        for cause in error_causes(err) {
            eprintln!("  caused by: {cause}");
        }
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::Initialization => "decoder initialization failed".to_string(),
        ErrorKind::Invocation => "decoder rejected input".to_string(),
        ErrorKind::NonTextKey => "decoder returned a non-text key".to_string(),
        ErrorKind::UnsupportedValueType => "decoder returned an unsupported value".to_string(),
        ErrorKind::UseAfterDestroy => "decoder used after destroy".to_string(),
        ErrorKind::Busy => "runtime is busy".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(key) = err.key() {
        inner.insert("key".to_string(), json!(key));
    }
    if let Some(type_name) = err.type_name() {
        inner.insert("type".to_string(), json!(type_name));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}
