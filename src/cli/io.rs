//! JSON I/O handling for CLI
//!
//! - Input: a single JSON document
//! - Output: a single JSON object per command
//! - UTF-8 only

use std::io::{Read, Write};

use serde_json::{json, Value};

use crate::schema::ValidationErrors;

use super::errors::{CliError, CliResult};

/// Read one JSON document from `reader`
pub fn read_document<R: Read>(reader: &mut R) -> CliResult<Value> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;

    if input.trim().is_empty() {
        return Err(CliError::Io(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            "Empty input",
        )));
    }

    Ok(serde_json::from_str(&input)?)
}

/// Write a success response
pub fn write_response<W: Write>(writer: &mut W, data: Value) -> CliResult<()> {
    write_json(writer, &json!({ "status": "ok", "data": data }))
}

/// Write a rejection listing every violation
pub fn write_rejection<W: Write>(writer: &mut W, errors: &ValidationErrors) -> CliResult<()> {
    write_json(
        writer,
        &json!({
            "status": "error",
            "code": "CONTRACT_VALIDATION_FAILED",
            "message": format!("{} violation(s)", errors.len()),
            "violations": errors.to_json(),
        }),
    )
}

/// Write an error response
pub fn write_error<W: Write>(writer: &mut W, code: &str, message: &str) -> CliResult<()> {
    write_json(
        writer,
        &json!({ "status": "error", "code": code, "message": message }),
    )
}

fn write_json<W: Write>(writer: &mut W, value: &Value) -> CliResult<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}
