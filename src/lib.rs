//! A distributed unique ID generator with reversible word-phrase encoding.
//!
//! Identifiers are Snowflake-style 63-bit integers packing a time tick, a
//! machine (partition) id and a per-tick sequence. A [`WordEncoder`] turns
//! any such integer into a short phrase such as `bearded chubby dog`, plus an
//! abbreviation built from fixed-position characters of each word, and maps
//! both back to the exact integer.
//!
//! ## Quickstart
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use wordflake::{Generator, Resolution, Vocabulary, WordEncoder};
//!
//! let mut generator = Generator::builder()
//!     .epoch(Utc.with_ymd_and_hms(2024, 5, 30, 0, 0, 0).unwrap())
//!     .machine_id(0)
//!     .machine_id_bits(0)
//!     .sequence_bits(0)
//!     .resolution(Resolution::Millisecond)
//!     .finalize()?;
//!
//! let encoder = WordEncoder::new(Vocabulary::bundled()?, 4)?;
//!
//! let id = generator.next_id()?;
//! let phrase = encoder.encode(id)?;
//! assert_eq!(encoder.decode(phrase.words())?, u128::from(id));
//! assert_eq!(
//!     encoder.decode_abbreviation(phrase.abbreviation(), encoder.separator())?,
//!     u128::from(id)
//! );
//! # Ok::<(), wordflake::Error>(())
//! ```
//!
//! ## Capacity
//!
//! The bundled vocabulary encodes every value below 2^40 (its exact bound is
//! [`WordEncoder::get_max`]). That covers any id whose tick fits in
//! `40 - machine_id_bits - sequence_bits` bits, such as millisecond ticks
//! with no machine id or sequence bits for about 34 years after the epoch. Ids of the default
//! layout use all 63 bits and need a larger vocabulary loaded through a
//! [`WordSource`]; encoding them with the bundled one fails with
//! [`Error::ValueOutOfRange`].
//!
//! ## Concurrent use
//!
//! [`ConcurrentGenerator`] is thread-safe. `clone` it before moving to another thread:
//! ```
//! use wordflake::Generator;
//! use std::thread;
//!
//! let sf = Generator::new(1).unwrap().into_concurrent();
//!
//! let mut children = Vec::new();
//! for _ in 0..10 {
//!     let thread_sf = sf.clone();
//!     children.push(thread::spawn(move || {
//!         println!("{}", thread_sf.next_id().unwrap());
//!     }));
//! }
//!
//! for child in children {
//!     child.join().unwrap();
//! }
//! ```

mod builder;
mod clock;
mod concurrent;
mod encoder;
mod error;
mod generator;
mod layout;
mod resolution;
mod source;
mod vocabulary;
#[cfg(test)]
mod tests;

pub use builder::*;
pub use clock::*;
pub use concurrent::*;
pub use encoder::*;
pub use error::*;
pub use generator::*;
pub use layout::*;
pub use resolution::*;
pub use source::*;
pub use vocabulary::*;
