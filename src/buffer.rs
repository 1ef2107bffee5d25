use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::record::{Record, FRAME_SIZE};

/// Records held in memory per buffer; also the unit of "one disk operation".
pub const BUFFER_RECORDS: usize = 32;
/// Bytes covered by one buffer-sized disk operation.
pub const BUFFER_BYTES: usize = BUFFER_RECORDS * FRAME_SIZE;

/// Forward-only, buffered reader over a tape file.
///
/// Deliberately does not layer a `BufReader` underneath: every refill here
/// is meant to be exactly one counted disk operation, and a second buffering
/// layer would make that count diverge from what actually happens.
#[derive(Debug)]
pub struct ReadBuffer {
    file: File,
    file_size: u64,
    file_pos: u64,
    records: Vec<Record>,
    read_pos: usize,
    loaded: usize,
    disk_reads: u64,
}

impl ReadBuffer {
    /// Open `path`, fixing the tape's length at this moment. Fails if the
    /// file size is not a multiple of the frame size.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let file_size = file.metadata()?.len();
        if file_size % FRAME_SIZE as u64 != 0 {
            return Err(Error::MalformedTape {
                size: file_size,
                frame: FRAME_SIZE as u64,
            });
        }

        let mut buf = Self {
            file,
            file_size,
            file_pos: 0,
            records: Vec::with_capacity(BUFFER_RECORDS),
            read_pos: 0,
            loaded: 0,
            disk_reads: 0,
        };
        buf.refill()?;
        Ok(buf)
    }

    /// Number of buffer-sized disk reads performed so far.
    pub fn disk_reads(&self) -> u64 {
        self.disk_reads
    }

    fn refill(&mut self) -> Result<()> {
        let remaining = self.file_size - self.file_pos;
        let to_read = remaining.min(BUFFER_BYTES as u64) as usize;

        self.records.clear();
        self.read_pos = 0;
        self.loaded = 0;

        if to_read == 0 {
            return Ok(());
        }
        if to_read % FRAME_SIZE != 0 {
            return Err(Error::MalformedTape {
                size: to_read as u64,
                frame: FRAME_SIZE as u64,
            });
        }

        let mut raw = vec![0u8; to_read];
        self.file.read_exact(&mut raw)?;
        self.file_pos += to_read as u64;

        for chunk in raw.chunks_exact(FRAME_SIZE) {
            self.records.push(Record::decode(chunk)?);
        }
        self.loaded = self.records.len();
        self.disk_reads += 1;
        Ok(())
    }

    /// Returns the next record, or `None` iff the stream is exhausted.
    pub fn read_next(&mut self) -> Result<Option<Record>> {
        if !self.has_more() {
            return Ok(None);
        }
        let rec = self.records[self.read_pos].clone();
        self.read_pos += 1;

        if self.read_pos == self.loaded {
            if self.file_pos < self.file_size {
                self.refill()?;
            } else {
                // No disk bytes remain: just mark the in-memory buffer
                // drained without counting a disk operation.
                self.records.clear();
                self.read_pos = 0;
                self.loaded = 0;
            }
        }

        Ok(Some(rec))
    }

    /// Peeks the record the next `read_next` will return, without
    /// advancing. Returns `None` if the in-memory buffer is drained, even
    /// when disk bytes remain — peek never triggers a refill.
    pub fn peek(&self) -> Option<&Record> {
        if self.read_pos == self.loaded {
            None
        } else {
            Some(&self.records[self.read_pos])
        }
    }

    /// True iff unread bytes remain on disk or unread records remain in memory.
    pub fn has_more(&self) -> bool {
        self.file_pos < self.file_size || self.read_pos < self.loaded
    }
}

/// Construction mode for [`WriteBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Delete any existing file at the path before the first write.
    Truncate,
    /// Preserve existing content; new records are appended.
    Append,
}

/// Forward-only, buffered writer over a tape file.
///
/// Like [`ReadBuffer`], writes through an unbuffered file handle so each
/// flush is exactly one counted disk write. There is no implicit flush on
/// drop: pending records are lost unless [`WriteBuffer::flush`] is called.
#[derive(Debug)]
pub struct WriteBuffer {
    file: File,
    pending: Vec<Record>,
    last_written: Option<Record>,
    runs_written: u64,
    disk_writes: u64,
}

impl WriteBuffer {
    pub fn open(path: impl AsRef<Path>, mode: WriteMode) -> Result<Self> {
        let file = match mode {
            WriteMode::Truncate => OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(path)?,
            WriteMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
        };
        Ok(Self {
            file,
            pending: Vec::with_capacity(BUFFER_RECORDS),
            last_written: None,
            runs_written: 0,
            disk_writes: 0,
        })
    }

    /// Total runs observed in the stream written so far (see §4.3 of the
    /// design notes: the first record always counts as starting a run).
    pub fn runs_written(&self) -> u64 {
        self.runs_written
    }

    /// Number of buffer-sized disk writes performed so far.
    pub fn disk_writes(&self) -> u64 {
        self.disk_writes
    }

    pub fn write_next(&mut self, rec: Record) -> Result<()> {
        if rec.precedes(self.last_written.as_ref()) {
            self.runs_written += 1;
        }

        if self.pending.len() == BUFFER_RECORDS {
            self.flush()?;
        }

        self.last_written = Some(rec.clone());
        self.pending.push(rec);
        Ok(())
    }

    /// Append-write any pending records in one disk operation.
    pub fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let mut raw = Vec::with_capacity(self.pending.len() * FRAME_SIZE);
        for rec in &self.pending {
            raw.extend_from_slice(&rec.encode());
        }
        self.file.write_all(&raw)?;
        self.pending.clear();
        self.disk_writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use tempfile::tempdir;

    fn write_tape(path: &Path, records: &[Record]) {
        let mut wb = WriteBuffer::open(path, WriteMode::Truncate).unwrap();
        for r in records {
            wb.write_next(r.clone()).unwrap();
        }
        wb.flush().unwrap();
    }

    #[test]
    fn read_buffer_rejects_malformed_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape");
        std::fs::write(&path, [0u8; 5]).unwrap();
        assert!(matches!(
            ReadBuffer::open(&path),
            Err(Error::MalformedTape { .. })
        ));
    }

    #[test]
    fn empty_tape_has_no_records_and_one_cheap_refill() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape");
        std::fs::write(&path, []).unwrap();

        let mut rb = ReadBuffer::open(&path).unwrap();
        assert_eq!(rb.disk_reads(), 0);
        assert!(!rb.has_more());
        assert_eq!(rb.read_next().unwrap(), None);
    }

    #[test]
    fn peek_does_not_trigger_refill_at_buffer_boundary() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape");

        let records: Vec<Record> = (0..BUFFER_RECORDS as i32)
            .map(|i| Record::try_new(&[i % 256]).unwrap())
            .collect();
        write_tape(&path, &records);

        // One full buffer on disk, nothing more: reading it all should
        // take exactly one refill, with no extra refill once it's drained.
        let mut rb = ReadBuffer::open(&path).unwrap();
        assert_eq!(rb.disk_reads(), 1);
        for _ in 0..BUFFER_RECORDS {
            rb.read_next().unwrap().unwrap();
        }
        assert_eq!(rb.disk_reads(), 1);
        assert!(!rb.has_more());
    }

    #[test]
    fn write_buffer_runs_written_counts_descents_including_first() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape");
        let mut wb = WriteBuffer::open(&path, WriteMode::Truncate).unwrap();

        wb.write_next(Record::try_new(&[1]).unwrap()).unwrap();
        assert_eq!(wb.runs_written(), 1);
        wb.write_next(Record::try_new(&[2]).unwrap()).unwrap();
        assert_eq!(wb.runs_written(), 1);
        wb.write_next(Record::try_new(&[0]).unwrap()).unwrap();
        assert_eq!(wb.runs_written(), 2);
    }

    #[test]
    fn write_buffer_flush_is_a_noop_when_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape");
        let mut wb = WriteBuffer::open(&path, WriteMode::Truncate).unwrap();
        wb.flush().unwrap();
        assert_eq!(wb.disk_writes(), 0);
    }

    #[test]
    fn append_mode_preserves_existing_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tape");
        write_tape(&path, &[Record::try_new(&[1]).unwrap()]);

        let mut wb = WriteBuffer::open(&path, WriteMode::Append).unwrap();
        wb.write_next(Record::try_new(&[2]).unwrap()).unwrap();
        wb.flush().unwrap();

        let mut rb = ReadBuffer::open(&path).unwrap();
        assert_eq!(rb.read_next().unwrap().unwrap().items(), &[1]);
        assert_eq!(rb.read_next().unwrap().unwrap().items(), &[2]);
    }
}
