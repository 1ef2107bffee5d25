use thiserror::Error;

/// Everything that can go wrong in the core: a malformed tape on disk, an
/// underlying I/O failure, or a caller handing us a record that can't exist.
#[derive(Debug, Error)]
pub enum Error {
    #[error("tape size {size} is not a multiple of the {frame}-byte frame")]
    MalformedTape { size: u64, frame: u64 },

    #[error("record length byte {0} exceeds the maximum of 15")]
    MalformedRecord(u8),

    #[error("record item count {0} is outside 1..=15")]
    InvalidItemCount(usize),

    #[error("record item value {0} is outside 0..=255")]
    InvalidItemValue(i32),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
