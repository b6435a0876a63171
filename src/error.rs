// Copyright 2022 houseme
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Broad classification of an [`Error`].
///
/// Callers that only care about *what went wrong* (bad configuration versus
/// bad input versus a misbehaving clock) can match on this instead of the
/// individual variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Invalid construction parameters. Raised at construction time only.
    Configuration,
    /// A value does not fit the representable range.
    ValueOutOfRange,
    /// A word sequence or abbreviation could not be decoded.
    Decode,
    /// The wall clock moved backward relative to the last observed tick.
    ClockRegression,
    /// The per-tick sequence space is full and the generator may not wait.
    SequenceExhausted,
    /// A shared generator lock was poisoned.
    Poisoned,
}

/// The error type for this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(
        "invalid bit length configuration: machine_id({0}) + sequence({1}) must be below 63"
    )]
    InvalidBitLength(u8, u8),
    #[error("at least one machine id must be configured")]
    NoMachineIds,
    #[error("machine id {0} is configured more than once")]
    DuplicateMachineId(u64),
    #[error("machine id {machine_id} does not fit in {bits} bits")]
    MachineIdTooLarge { machine_id: u64, bits: u8 },
    #[error("pinned machine id index {index} is out of range for {len} machine ids")]
    InvalidSelection { index: usize, len: usize },
    #[error("epoch `{0}` is ahead of current time")]
    StartTimeAheadOfCurrentTime(DateTime<Utc>),

    #[error("vocabulary must contain at least one category")]
    EmptyVocabulary,
    #[error("category `{0}` contains no words")]
    EmptyCategory(String),
    #[error("category `{category}` contains an empty word")]
    EmptyWord { category: String },
    #[error("category `{category}` contains `{word}` more than once")]
    DuplicateWord { category: String, word: String },
    #[error("`{word}` in category `{category}` is too short for prefix position {position}")]
    WordTooShort {
        category: String,
        word: String,
        position: usize,
    },
    #[error("`{first}` and `{second}` in category `{category}` share the prefix `{prefix}`")]
    PrefixCollision {
        category: String,
        prefix: String,
        first: String,
        second: String,
    },
    #[error("malformed vocabulary version `{0}`, expected `<positions>_<checksum>`")]
    InvalidVersion(String),
    #[error("vocabulary checksum mismatch: version expects `{expected}`, content hashes to `{actual}`")]
    ChecksumMismatch { expected: String, actual: String },
    #[error("unknown bundled vocabulary `{0}`")]
    UnknownBundle(String),
    #[error("failed to read word list `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("min_phrase_size must be between 1 and {max}, got {min}")]
    InvalidPhraseSize { min: usize, max: usize },
    #[error("separator must not be empty")]
    EmptySeparator,
    #[error("separator `{separator}` occurs inside the prefix `{prefix}`")]
    SeparatorInPrefix { separator: String, prefix: String },
    #[error("vocabulary capacity does not fit in 128 bits")]
    CapacityOverflow,

    #[error("the number ({value}) is too large to be encoded (max: {max})")]
    ValueOutOfRange { value: u128, max: u128 },
    #[error("over the time limit")]
    OverTimeLimit,

    #[error("{len} words cannot be decoded with at most {max} categories")]
    TooManyWords { len: usize, max: usize },
    #[error("nothing to decode")]
    EmptyPhrase,
    #[error("`{word}` is not a word of category `{category}`")]
    UnknownWord { word: String, category: String },
    #[error("`{prefix}` is not a prefix of category `{category}`")]
    UnknownPrefix { prefix: String, category: String },

    #[error("clock moved backwards: last tick {last_tick}, current tick {tick}")]
    ClockRegression { last_tick: i64, tick: i64 },
    #[error("sequence exhausted for tick {tick}")]
    SequenceExhausted { tick: i64 },
    #[error("mutex is poisoned (i.e. a panic happened while it was locked)")]
    MutexPoisoned,
}

impl Error {
    /// Returns the taxonomy bucket this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ValueOutOfRange { .. } | Error::OverTimeLimit => ErrorKind::ValueOutOfRange,
            Error::TooManyWords { .. }
            | Error::EmptyPhrase
            | Error::UnknownWord { .. }
            | Error::UnknownPrefix { .. } => ErrorKind::Decode,
            Error::ClockRegression { .. } => ErrorKind::ClockRegression,
            Error::SequenceExhausted { .. } => ErrorKind::SequenceExhausted,
            Error::MutexPoisoned => ErrorKind::Poisoned,
            _ => ErrorKind::Configuration,
        }
    }
}
