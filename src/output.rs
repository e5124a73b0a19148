use std::io::{self, Write};

use serde::Serialize;

use crate::fetcher::{FetchReport, Summary};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

#[derive(Debug, Serialize)]
pub struct BatchOutput<'a> {
    pub reports: &'a [FetchReport],
    pub summary: &'a Summary,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_batch(reports: &[FetchReport], summary: &Summary) -> io::Result<()> {
        Self::print_json(&BatchOutput { reports, summary })
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl crate::fetcher::ProgressSink for JsonOutput {
    fn event(&self, _event: crate::fetcher::ProgressEvent) {}
}
