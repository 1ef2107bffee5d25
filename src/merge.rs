use std::path::Path;

use crate::buffer::{ReadBuffer, WriteBuffer, WriteMode};
use crate::error::Result;
use crate::record::Record;
use crate::run::RunIterator;

/// I/O metrics from one merge phase. `runs_written` is the authoritative
/// post-merge run count the sort driver uses to decide termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeInfo {
    pub reads: u64,
    pub writes: u64,
    pub runs_written: u64,
}

/// Pairwise-merges runs from `source_a` and `source_b` into `dest`
/// (truncated), reducing the run count.
pub fn merge(
    source_a: impl AsRef<Path>,
    source_b: impl AsRef<Path>,
    dest: impl AsRef<Path>,
) -> Result<MergeInfo> {
    let mut ra = ReadBuffer::open(source_a)?;
    let mut rb = ReadBuffer::open(source_b)?;
    let mut out = WriteBuffer::open(dest, WriteMode::Truncate)?;

    while ra.has_more() && rb.has_more() {
        let mut iter_a = RunIterator::new(&mut ra);
        let mut iter_b = RunIterator::new(&mut rb);
        merge_runs(&mut iter_a, &mut iter_b, &mut out)?;
    }

    // One source may still have records (extra runs): drain it directly,
    // not per-run.
    while let Some(r) = ra.read_next()? {
        out.write_next(r)?;
    }
    while let Some(r) = rb.read_next()? {
        out.write_next(r)?;
    }

    out.flush()?;

    Ok(MergeInfo {
        reads: ra.disk_reads() + rb.disk_reads(),
        writes: out.disk_writes(),
        runs_written: out.runs_written(),
    })
}

/// Merge one run from each iterator into `out`. Ties go to `iter_b` — the
/// tie-break policy for this non-antisymmetric order relation.
fn merge_runs(
    iter_a: &mut RunIterator,
    iter_b: &mut RunIterator,
    out: &mut WriteBuffer,
) -> Result<()> {
    let mut a: Option<Record> = iter_a.next().transpose()?;
    let mut b: Option<Record> = iter_b.next().transpose()?;

    while let (Some(x), Some(y)) = (&a, &b) {
        if x.precedes(Some(y)) {
            out.write_next(a.take().unwrap())?;
            a = iter_a.next().transpose()?;
        } else {
            out.write_next(b.take().unwrap())?;
            b = iter_b.next().transpose()?;
        }
    }

    if let Some(x) = a.take() {
        out.write_next(x)?;
        while let Some(r) = iter_a.next().transpose()? {
            out.write_next(r)?;
        }
    }
    if let Some(y) = b.take() {
        out.write_next(y)?;
        while let Some(r) = iter_b.next().transpose()? {
            out.write_next(r)?;
        }
    }

    Ok(())
}
