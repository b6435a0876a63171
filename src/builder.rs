use crate::clock::{Clock, SystemClock};
use crate::error::Error;
use crate::generator::{Exhaustion, Generator, Internals, MachineIdSelection};
use crate::layout::Layout;
use crate::resolution::Resolution;
use chrono::prelude::*;
use std::collections::HashSet;

/// A builder for building the [`Generator`].
///
/// [`Generator`]: struct.Generator.html
pub struct Builder<C = SystemClock> {
    epoch: Option<DateTime<Utc>>,
    machine_ids: Vec<u64>,
    machine_id_bits: u8,
    sequence_bits: u8,
    resolution: Resolution,
    selection: MachineIdSelection,
    exhaustion: Exhaustion,
    clock: C,
}

impl Default for Builder<SystemClock> {
    fn default() -> Self {
        Builder::new()
    }
}

impl Builder<SystemClock> {
    /// Construct a new builder for the build of [`Generator`] reading the system clock.
    ///
    /// [`Generator`]: struct.Generator.html
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<C: Clock> Builder<C> {
    /// Construct a new builder whose generator reads time from `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            epoch: None,
            machine_ids: Vec::new(),
            machine_id_bits: 10,
            sequence_bits: 12,
            resolution: Resolution::Millisecond,
            selection: MachineIdSelection::default(),
            exhaustion: Exhaustion::default(),
            clock,
        }
    }

    /// Replace the clock, keeping every other setting.
    pub fn clock<D: Clock>(self, clock: D) -> Builder<D> {
        Builder {
            epoch: self.epoch,
            machine_ids: self.machine_ids,
            machine_id_bits: self.machine_id_bits,
            sequence_bits: self.sequence_bits,
            resolution: self.resolution,
            selection: self.selection,
            exhaustion: self.exhaustion,
            clock,
        }
    }

    /// Set the epoch ticks are counted from.
    /// If the epoch is later than the current time, 'finalize' will fail.
    pub fn epoch(mut self, epoch: DateTime<Utc>) -> Self {
        self.epoch = Some(epoch);
        self
    }

    /// Add a machine ID.
    pub fn machine_id(mut self, machine_id: u64) -> Self {
        self.machine_ids.push(machine_id);
        self
    }

    /// Add several machine IDs, in order.
    pub fn machine_ids(mut self, machine_ids: impl IntoIterator<Item = u64>) -> Self {
        self.machine_ids.extend(machine_ids);
        self
    }

    /// Set the bit length of the machine ID section.
    pub fn machine_id_bits(mut self, machine_id_bits: u8) -> Self {
        self.machine_id_bits = machine_id_bits;
        self
    }

    /// Set the bit length of the sequence section.
    pub fn sequence_bits(mut self, sequence_bits: u8) -> Self {
        self.sequence_bits = sequence_bits;
        self
    }

    /// Set the unit ticks are counted in.
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set how a machine ID is picked when several are configured.
    pub fn selection(mut self, selection: MachineIdSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Set what happens when a tick runs out of sequence numbers.
    pub fn exhaustion(mut self, exhaustion: Exhaustion) -> Self {
        self.exhaustion = exhaustion;
        self
    }

    /// Finish building and create a Generator instance.
    /// This method will return an error if validation fails.
    pub fn finalize(self) -> Result<Generator<C>, Error> {
        let layout = Layout::new(self.machine_id_bits, self.sequence_bits)?;

        let epoch = match self.epoch {
            Some(epoch) => {
                if epoch > self.clock.now() {
                    return Err(Error::StartTimeAheadOfCurrentTime(epoch));
                }
                epoch
            }
            // Default epoch
            None => Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        };

        if self.machine_ids.is_empty() {
            return Err(Error::NoMachineIds);
        }

        let mut seen = HashSet::with_capacity(self.machine_ids.len());
        for &machine_id in &self.machine_ids {
            if machine_id > layout.max_machine_id() {
                return Err(Error::MachineIdTooLarge {
                    machine_id,
                    bits: layout.machine_id_bits(),
                });
            }
            if !seen.insert(machine_id) {
                return Err(Error::DuplicateMachineId(machine_id));
            }
        }

        let mut machine_ids = self.machine_ids;
        match self.selection {
            MachineIdSelection::Pinned(index) if index >= machine_ids.len() => {
                return Err(Error::InvalidSelection {
                    index,
                    len: machine_ids.len(),
                });
            }
            MachineIdSelection::Spillover => machine_ids.sort_unstable(),
            _ => {}
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            %epoch,
            resolution = ?self.resolution,
            machine_id_bits = layout.machine_id_bits(),
            sequence_bits = layout.sequence_bits(),
            timestamp_bits = layout.timestamp_bits(),
            machine_ids = ?machine_ids,
            selection = ?self.selection,
            "generator configured"
        );

        Ok(Generator {
            epoch,
            resolution: self.resolution,
            layout,
            machine_ids,
            selection: self.selection,
            exhaustion: self.exhaustion,
            clock: self.clock,
            internals: Internals::new(),
        })
    }
}
