use std::path::Path;

/// Buffered, disk-op-metered reading and writing of tape files.
pub mod buffer;
/// Splits a tape into two by run (the first half of a sort phase).
pub mod distribute;
/// The typed error returned by every fallible operation in this crate.
mod error;
/// Merges runs from two tapes into one (the second half of a sort phase).
pub mod merge;
/// The record codec and the multiset-difference order relation.
pub mod record;
/// Adapts a [`buffer::ReadBuffer`] into a single natural run.
pub mod run;

pub use buffer::{ReadBuffer, WriteBuffer, WriteMode};
pub use distribute::{distribute, DistributeInfo};
pub use error::{Error, Result};
pub use merge::{merge, MergeInfo};
pub use record::Record;
pub use run::RunIterator;

/// Aggregate I/O metrics for a full `sort_tape` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortInfo {
    pub reads: u64,
    pub writes: u64,
    pub phases: u64,
}

/// Sorts the tape at `path` in place by natural merge sort, using
/// `scratch_a` and `scratch_b` as the two working tapes. Both scratch paths
/// are truncated on every phase.
///
/// Sorting a zero-record (or nonexistent) tape is a no-op: it returns
/// `SortInfo{0,0,0}` rather than an error. When `verbose` is set, each
/// phase transition and the run count observed after each merge is
/// narrated to standard error.
pub fn sort_tape(
    path: impl AsRef<Path>,
    scratch_a: impl AsRef<Path>,
    scratch_b: impl AsRef<Path>,
    verbose: bool,
) -> Result<SortInfo> {
    let path = path.as_ref();

    let size = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
        Err(e) => return Err(e.into()),
    };
    if size == 0 {
        return Ok(SortInfo::default());
    }

    let mut info = SortInfo::default();

    loop {
        info.phases += 1;
        if verbose {
            eprintln!("phase {}: distributing {:?}", info.phases, path);
        }
        let dist = distribute::distribute(path, scratch_a.as_ref(), scratch_b.as_ref())?;
        info.reads += dist.reads;
        info.writes += dist.writes;

        if verbose {
            eprintln!("phase {}: merging into {:?}", info.phases, path);
        }
        let merged = merge::merge(scratch_a.as_ref(), scratch_b.as_ref(), path)?;
        info.reads += merged.reads;
        info.writes += merged.writes;

        if verbose {
            eprintln!(
                "phase {}: {} run(s) remain",
                info.phases, merged.runs_written
            );
        }

        if merged.runs_written <= 1 {
            break;
        }
    }

    Ok(info)
}

/// Counts the natural runs on a tape without mutating it.
pub fn count_runs(path: impl AsRef<Path>) -> Result<u64> {
    let mut buf = buffer::ReadBuffer::open(path)?;
    let mut runs = 0u64;
    while buf.has_more() {
        let mut iter = run::RunIterator::new(&mut buf);
        while iter.next().transpose()?.is_some() {}
        runs += 1;
    }
    Ok(runs)
}

/// Lazily walks a tape's records paired with the 0-based index of the run
/// each belongs to, without mutating the tape.
///
/// This inlines the same run-boundary detection [`run::RunIterator`] uses
/// rather than wrapping one, because a `RunIterator` borrows the
/// `ReadBuffer` it walks and an iterator that owns both would be
/// self-referential.
pub fn iterate_tape(path: impl AsRef<Path>) -> Result<TapeIter> {
    Ok(TapeIter {
        buffer: buffer::ReadBuffer::open(path)?,
        run_index: 0,
        end_of_run: false,
        started: false,
    })
}

/// Iterator returned by [`iterate_tape`].
pub struct TapeIter {
    buffer: buffer::ReadBuffer,
    run_index: u64,
    end_of_run: bool,
    started: bool,
}

impl Iterator for TapeIter {
    type Item = Result<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end_of_run || !self.started {
            if !self.buffer.has_more() {
                return None;
            }
            if self.started {
                self.run_index += 1;
            }
            self.started = true;
            self.end_of_run = false;
        }

        let current = match self.buffer.read_next() {
            Ok(Some(r)) => r,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };

        if let Some(successor) = self.buffer.peek() {
            if successor.precedes(Some(&current)) {
                self.end_of_run = true;
            }
        }

        Some(Ok((self.run_index, current)))
    }
}
