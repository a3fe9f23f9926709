//! Purpose: Decode request value and the line format used by streaming callers.
//! Exports: `DecodeRequest`, `parse_line`, `MAX_PADDING`.
//! Role: Turns `BODY[<ws|,>PADDING]` lines into requests; no NMEA framing is interpreted.
//! Invariants: Blank lines and `#` comments yield `None`; padding defaults to 0.
use bstr::ByteSlice;

use crate::core::error::{Error, ErrorKind};

/// Largest padding a six-bit armored character can carry.
pub const MAX_PADDING: u8 = 5;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DecodeRequest {
    pub body: String,
    pub padding: u8,
}

impl DecodeRequest {
    pub fn new(body: impl Into<String>, padding: u8) -> Self {
        Self {
            body: body.into(),
            padding,
        }
    }
}

pub fn parse_line(line: &[u8]) -> Result<Option<DecodeRequest>, Error> {
    let text = line.to_str_lossy();
    let text = text.trim();
    if text.is_empty() || text.starts_with('#') {
        return Ok(None);
    }

    let mut parts = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());
    let body = parts
        .next()
        .ok_or_else(|| Error::new(ErrorKind::Usage).with_message("missing body"))?;
    let padding = match parts.next() {
        None => 0,
        Some(raw) => parse_padding(raw)?,
    };
    if parts.next().is_some() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("expected at most two fields: BODY PADDING"));
    }

    Ok(Some(DecodeRequest::new(body, padding)))
}

pub fn parse_padding(raw: &str) -> Result<u8, Error> {
    let padding = raw.parse::<u8>().map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid padding `{raw}`"))
            .with_source(err)
    })?;
    if padding > MAX_PADDING {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("padding must be 0..={MAX_PADDING}, got {padding}")));
    }
    Ok(padding)
}
