use crate::domain::outcome::WorkflowResult;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

/// Writes workflow results as JSON lines, one result per line.
pub struct ResultWriter<W: Write> {
    writer: W,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_result<T: Serialize>(&mut self, result: &WorkflowResult<T>) -> Result<()> {
        serde_json::to_writer(&mut self.writer, result)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
