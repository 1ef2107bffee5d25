use crate::buffer::ReadBuffer;
use crate::error::Result;
use crate::record::Record;

/// Adapts a [`ReadBuffer`] into a sequence that terminates at the end of
/// the current natural run.
///
/// Single-use: once exhausted (`next` returns `None`), construct a new
/// `RunIterator` over the same `ReadBuffer` to read the next run.
pub struct RunIterator<'a> {
    read_buffer: &'a mut ReadBuffer,
    end_of_run: bool,
}

impl<'a> RunIterator<'a> {
    pub fn new(read_buffer: &'a mut ReadBuffer) -> Self {
        Self {
            read_buffer,
            end_of_run: false,
        }
    }
}

impl<'a> Iterator for RunIterator<'a> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.end_of_run {
            return None;
        }

        let current = match self.read_buffer.read_next() {
            Ok(Some(r)) => r,
            Ok(None) => return None,
            Err(e) => return Some(Err(e)),
        };

        // Peek never triggers a refill, so a run boundary that coincides
        // with a buffer boundary is invisible here; the run silently
        // continues into the next buffer fill. This is intentional — see
        // the design notes on the peek-without-I/O contract.
        if let Some(successor) = self.read_buffer.peek() {
            if successor.precedes(Some(&current)) {
                self.end_of_run = true;
            }
        }

        Some(Ok(current))
    }
}
