use std::path::Path;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info, warn};

use crate::mapping::{Mappings, RemarkLevel, RowMapper};
use crate::sink::ValueSink;
use crate::source::Table;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadResult {
    pub rows: usize,
    pub mapped: usize,
    pub failed: usize,
    pub values: usize,
}

impl LoadResult {
    pub fn merge(&mut self, other: LoadResult) {
        self.rows += other.rows;
        self.mapped += other.mapped;
        self.failed += other.failed;
        self.values += other.values;
    }
}

/// Feeds the records of input tables through a [`RowMapper`] into a sink.
pub struct Pipeline<'m, S: ValueSink> {
    mapper: RowMapper<'m>,
    sink: S,
    fail_fast: bool,
    progress: bool,
}

impl<'m, S: ValueSink> Pipeline<'m, S> {
    pub fn new(mapper: RowMapper<'m>, sink: S) -> Self {
        Self {
            mapper,
            sink,
            fail_fast: false,
            progress: false,
        }
    }

    /// Abort on the first row that fails to map instead of skipping it.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Show a progress bar on stderr while mapping.
    #[must_use]
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Map every record of `table`, writing the values of each mapped row.
    ///
    /// Rows that fail to map are logged and counted, unless fail-fast is set.
    /// Sink errors always abort.
    pub fn run(&mut self, table: &Table) -> Result<LoadResult> {
        let pb = self.progress_bar(table.len() as u64);
        self.run_with_progress(table, &pb)
    }

    /// Like [`Pipeline::run`], reporting to `pb`. The bar is cleared when all
    /// rows are done and left in place when the run aborts.
    fn run_with_progress(&mut self, table: &Table, pb: &ProgressBar) -> Result<LoadResult> {
        debug!(
            "Mapping {} rows by id column {}",
            table.len(),
            self.mapper.mappings().id_column()
        );

        let result = match self.map_records(table, pb) {
            Ok(result) => result,
            Err(e) => {
                pb.abandon();
                return Err(e);
            }
        };

        pb.finish_and_clear();
        info!(
            "Mapped {} of {} rows ({} values, {} failed)",
            result.mapped, result.rows, result.values, result.failed
        );
        Ok(result)
    }

    fn map_records(&mut self, table: &Table, pb: &ProgressBar) -> Result<LoadResult> {
        let mut result = LoadResult::default();

        for record in &table.records {
            result.rows += 1;
            match self.mapper.map(record) {
                Ok(values) => {
                    debug!("line {}: {} values", record.line(), values.len());
                    self.sink
                        .write(&values)
                        .with_context(|| format!("failed to write line {}", record.line()))?;
                    result.mapped += 1;
                    result.values += values.len();
                }
                Err(e) if self.fail_fast => {
                    return Err(e).with_context(|| format!("line {}", record.line()));
                }
                Err(e) => {
                    warn!("line {}: {e}", record.line());
                    result.failed += 1;
                }
            }
            pb.inc(1);
        }

        Ok(result)
    }

    /// Flush the sink and hand it back.
    pub fn finish(mut self) -> Result<S> {
        self.sink.finish()?;
        Ok(self.sink)
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{bar:40.cyan/blue} {pos}/{len} rows ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    }
}

/// Refuse to load an input whose columns the mappings do not fit.
///
/// Check errors abort; warnings such as a missing non-id column are logged
/// and the input is still loaded.
pub fn ensure_columns(mappings: &Mappings, columns: &[String], input: &Path) -> Result<()> {
    let mut failed = false;
    for remark in mappings.check(columns) {
        match remark.level {
            RemarkLevel::Error => {
                error!("{}: {}", input.display(), remark.message);
                failed = true;
            }
            RemarkLevel::Warning => warn!("{}: {}", input.display(), remark.message),
            RemarkLevel::Ok => {}
        }
    }
    if failed {
        bail!("mappings do not fit {}", input.display());
    }
    Ok(())
}
