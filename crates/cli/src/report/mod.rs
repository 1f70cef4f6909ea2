//! Report module — everything between a finished segmentation and stdout.
//!
//! - `filter.rs`: level / regex / time-window selection
//! - `sort.rs`: stable record orderings
//! - `timeline.rs`: per-request intervals
//! - `render.rs`: pretty and JSON-lines writers

pub mod filter;
pub mod render;
pub mod sort;
pub mod timeline;

use std::io::Write;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tflog::Segmentation;

use self::filter::RecordFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    /// Normalized records
    #[default]
    Logs,
    /// One row per section
    Sections,
    /// Every record with its section annotation
    SectionsFull,
    /// Per-request time intervals
    Timeline,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// File order
    #[default]
    None,
    Timestamp,
    Level,
    #[value(alias = "level_timestamp")]
    #[serde(alias = "level_timestamp")]
    LevelTimestamp,
    Resource,
    Message,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Jsonl,
}

/// Fully resolved report settings (config file merged with flags).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportOptions {
    pub mode: Mode,
    pub sort: SortKey,
    pub output: OutputFormat,
    /// 0 = unlimited
    pub limit: usize,
    pub filter_level: Option<String>,
    pub grep: Option<String>,
    pub since: Option<String>,
    pub until: Option<String>,
}

/// Select, order and write the records or sections of one run.
pub fn write_report<W: Write>(
    segmentation: &Segmentation,
    options: &ReportOptions,
    out: &mut W,
) -> anyhow::Result<()> {
    let filter = RecordFilter::from_options(options)?;

    match options.mode {
        Mode::Sections => {
            let sections = limited(segmentation.sections.iter().collect(), options.limit);
            render::write_sections(out, &sections, options.output)?;
        }
        Mode::Timeline => {
            let selected = filter.apply(&segmentation.records);
            let intervals = timeline::build(selected.iter().map(|&i| &segmentation.records[i]));
            let intervals = limited(intervals, options.limit);
            render::write_timeline(out, &intervals, options.output)?;
        }
        Mode::Logs | Mode::SectionsFull => {
            let mut selected = filter.apply(&segmentation.records);
            sort::sort_indices(&mut selected, &segmentation.records, options.sort);
            let selected = limited(selected, options.limit);

            tracing::debug!(
                total = segmentation.records.len(),
                shown = selected.len(),
                sort = ?options.sort,
                "records selected"
            );

            let with_sections = options.mode == Mode::SectionsFull;
            render::write_records(
                out,
                &segmentation.records,
                &selected,
                options.output,
                with_sections,
            )?;
        }
    }

    out.flush()?;
    Ok(())
}

fn limited<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    if limit > 0 {
        items.truncate(limit);
    }
    items
}
