//! Purpose: Drive line-delimited decode requests through a decoder and emit JSON lines.
//! Exports: `ErrorPolicy`, `StreamConfig`, `StreamOutcome`, `StreamFailure`, `run`.
//! Role: Input loop used by `aiscdec stream`; isolated from the CLI so it can be tested
//!       with any decode function.
//! Invariants: With `ErrorPolicy::Skip`, one bad line never stops later lines.
//! Invariants: stdout only ever carries successful decode results, one JSON value per line.
use std::io::{self, BufRead, Write};

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};
use crate::core::request::{DecodeRequest, parse_line};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorPolicy {
    Stop,
    Skip,
}

#[derive(Copy, Clone, Debug)]
pub struct StreamConfig {
    pub errors: ErrorPolicy,
    pub pretty: bool,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct StreamOutcome {
    pub records_total: u64,
    pub ok: u64,
    pub failed: u64,
}

#[derive(Debug)]
pub struct StreamFailure {
    pub line: u64,
    pub error: Error,
}

fn io_error(err: io::Error, message: &str) -> Error {
    Error::new(ErrorKind::Io)
        .with_message(message)
        .with_source(err)
}

pub fn run<R, W, D, N>(
    reader: R,
    mut out: W,
    config: StreamConfig,
    mut decode: D,
    mut on_failure: N,
) -> Result<StreamOutcome, Error>
where
    R: BufRead,
    W: Write,
    D: FnMut(&DecodeRequest) -> Result<Value, Error>,
    N: FnMut(StreamFailure),
{
    let mut outcome = StreamOutcome::default();

    for (index, line) in reader.split(b'\n').enumerate() {
        let line_no = index as u64 + 1;
        let line = line.map_err(|err| io_error(err, "failed to read input"))?;
        let result = match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(request)) => decode(&request),
            Err(err) => Err(err),
        };
        outcome.records_total += 1;

        match result {
            Ok(value) => {
                write_value(&mut out, &value, config.pretty)?;
                outcome.ok += 1;
            }
            Err(error) => match config.errors {
                ErrorPolicy::Stop => return Err(error),
                ErrorPolicy::Skip => {
                    outcome.failed += 1;
                    on_failure(StreamFailure {
                        line: line_no,
                        error,
                    });
                }
            },
        }
    }

    out.flush()
        .map_err(|err| io_error(err, "failed to flush output"))?;
    Ok(outcome)
}

pub fn write_value<W: Write>(out: &mut W, value: &Value, pretty: bool) -> Result<(), Error> {
    let encoded = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode json")
            .with_source(err)
    })?;
    writeln!(out, "{encoded}").map_err(|err| io_error(err, "failed to write output"))
}

#[cfg(test)]
mod tests {
    use super::{ErrorPolicy, StreamConfig, StreamOutcome, run};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::request::DecodeRequest;
    use serde_json::{Value, json};
    use std::io::Cursor;

    fn fake_decode(request: &DecodeRequest) -> Result<Value, Error> {
        if request.body.starts_with('!') {
            return Err(Error::new(ErrorKind::Invocation).with_message("bad sentence"));
        }
        Ok(json!({"body": request.body, "padding": request.padding}))
    }

    const INPUT: &str = "# fixtures\n177KQJ 0\n!broken\n\n55P5TL01,2\n";

    #[test]
    fn skip_policy_continues_past_failures() {
        let mut out = Vec::new();
        let mut failures = Vec::new();
        let outcome = run(
            Cursor::new(INPUT),
            &mut out,
            StreamConfig {
                errors: ErrorPolicy::Skip,
                pretty: false,
            },
            fake_decode,
            |failure| failures.push(failure),
        )
        .expect("run");

        assert_eq!(
            outcome,
            StreamOutcome {
                records_total: 3,
                ok: 2,
                failed: 1
            }
        );
        let lines: Vec<Value> = String::from_utf8(out)
            .expect("utf8")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json"))
            .collect();
        assert_eq!(lines[0], json!({"body": "177KQJ", "padding": 0}));
        assert_eq!(lines[1], json!({"body": "55P5TL01", "padding": 2}));

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].line, 3);
        assert_eq!(failures[0].error.kind(), ErrorKind::Invocation);
    }

    #[test]
    fn stop_policy_returns_first_error() {
        let mut out = Vec::new();
        let err = run(
            Cursor::new(INPUT),
            &mut out,
            StreamConfig {
                errors: ErrorPolicy::Stop,
                pretty: false,
            },
            fake_decode,
            |_| panic!("no failure callback in stop mode"),
        )
        .expect_err("should stop");
        assert_eq!(err.kind(), ErrorKind::Invocation);
        assert_eq!(String::from_utf8(out).expect("utf8").lines().count(), 1);
    }

    #[test]
    fn parse_errors_follow_the_policy() {
        let mut failures = Vec::new();
        let outcome = run(
            Cursor::new("177KQJ 99\n177KQJ 1\n"),
            Vec::new(),
            StreamConfig {
                errors: ErrorPolicy::Skip,
                pretty: false,
            },
            fake_decode,
            |failure| failures.push(failure),
        )
        .expect("run");
        assert_eq!(outcome.ok, 1);
        assert_eq!(failures[0].error.kind(), ErrorKind::Usage);
    }
}
