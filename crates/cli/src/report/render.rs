use std::io::{self, Write};

use serde::Serialize;

use tflog::parser::ResourceRef;
use tflog::{NormalizedRecord, Section, SectionMark};

use super::timeline::Interval;
use super::OutputFormat;

/// JSON-lines shape of one record.
#[derive(Serialize)]
struct RecordRow<'a> {
    index: usize,
    timestamp: &'a str,
    level: Option<&'a str>,
    message: Option<&'a str>,
    resource: Option<&'a ResourceRef>,
    request_id: Option<&'a str>,
    section: Option<SectionMark>,
}

impl<'a> RecordRow<'a> {
    fn new(index: usize, record: &'a NormalizedRecord) -> Self {
        Self {
            index,
            timestamp: &record.timestamp,
            level: record.level.as_deref(),
            message: record.message.as_deref(),
            resource: record.resource.as_ref(),
            request_id: record.request_id.as_deref(),
            section: record.section,
        }
    }
}

pub fn write_records<W: Write>(
    out: &mut W,
    records: &[NormalizedRecord],
    selected: &[usize],
    format: OutputFormat,
    with_sections: bool,
) -> io::Result<()> {
    for &index in selected {
        let record = &records[index];
        match format {
            OutputFormat::Jsonl => write_json_line(out, &RecordRow::new(index, record))?,
            OutputFormat::Pretty => {
                write!(
                    out,
                    "[{}] {} {:<8} {:<25} {}",
                    index,
                    record.timestamp,
                    record.level.as_deref().unwrap_or("-"),
                    record.resource_id().unwrap_or("-"),
                    record.message.as_deref().unwrap_or(""),
                )?;
                if with_sections {
                    write!(out, " | {}", section_label(record.section.as_ref()))?;
                    write!(out, " req={}", record.request_id.as_deref().unwrap_or("-"))?;
                }
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

pub fn write_sections<W: Write>(out: &mut W, sections: &[&Section], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Jsonl => {
            for section in sections {
                write_json_line(out, section)?;
            }
        }
        OutputFormat::Pretty => {
            writeln!(
                out,
                "{:>4}  {:<5}  {:<24}  {:>13}  {:>7}  {:<32}  {}",
                "ID", "TYPE", "REQUEST", "RECORDS", "ENTRIES", "START", "END"
            )?;
            for section in sections {
                let span = match section.end_index {
                    Some(end) => format!("{}-{}", section.start_index, end),
                    None => format!("{}-", section.start_index),
                };
                writeln!(
                    out,
                    "{:>4}  {:<5}  {:<24}  {:>13}  {:>7}  {:<32}  {}",
                    section.id,
                    section.kind,
                    section.request_id.as_deref().unwrap_or("(anonymous)"),
                    span,
                    section.entry_count,
                    section.start_timestamp,
                    section.end_timestamp.as_deref().unwrap_or("-"),
                )?;
            }
        }
    }
    Ok(())
}

pub fn write_timeline<W: Write>(out: &mut W, intervals: &[Interval], format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Jsonl => {
            for interval in intervals {
                write_json_line(out, interval)?;
            }
        }
        OutputFormat::Pretty => {
            writeln!(
                out,
                "{:<24}  {:<32}  {:<32}  {:>10}  {:>7}  {}",
                "REQUEST", "START", "END", "DURATION", "RECORDS", "ERRORS"
            )?;
            for interval in intervals {
                let duration = interval
                    .duration_ms()
                    .map(|ms| format!("{}ms", ms))
                    .unwrap_or_else(|| "-".to_string());
                writeln!(
                    out,
                    "{:<24}  {:<32}  {:<32}  {:>10}  {:>7}  {}",
                    interval.request_id,
                    interval.start.as_deref().unwrap_or("-"),
                    interval.end.as_deref().unwrap_or("-"),
                    duration,
                    interval.count,
                    if interval.has_errors { "yes" } else { "no" },
                )?;
            }
        }
    }
    Ok(())
}

fn section_label(mark: Option<&SectionMark>) -> String {
    match mark {
        Some(mark) => format!("section={}:{}:{}", mark.id, mark.kind, mark.event),
        None => "section=-".to_string(),
    }
}

fn write_json_line<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)
}
