use crate::builder::Builder;
use crate::clock::{Clock, SystemClock};
use crate::concurrent::ConcurrentGenerator;
use crate::error::*;
use crate::layout::{DecomposedId, Layout};
use crate::resolution::Resolution;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// How a generator holding several machine ids picks the one to stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineIdSelection {
    /// Always use the machine id at this index.
    Pinned(usize),
    /// Cycle through every machine id, one per call.
    ///
    /// Identifiers stay unique, but are no longer strictly increasing in
    /// call order since consecutive calls land on different partitions.
    RoundRobin,
    /// Stay on the first machine id and move on to the next one only when
    /// the current one runs out of sequence numbers within a tick.
    ///
    /// Machine ids are kept in ascending order, so identifiers remain
    /// strictly increasing while a tick can carry
    /// `machine_ids.len() * 2^sequence_bits` of them.
    Spillover,
}

impl Default for MachineIdSelection {
    fn default() -> Self {
        MachineIdSelection::Pinned(0)
    }
}

/// What `next_id` does once a tick has no sequence numbers left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Exhaustion {
    /// Sleep until the clock reaches the next tick, then continue.
    #[default]
    Wait,
    /// Return [`Error::SequenceExhausted`] immediately.
    Fail,
}

/// Internals of Generator.
#[derive(Debug)]
pub(crate) struct Internals {
    pub(crate) last_tick: i64,
    pub(crate) sequence: u64,
    pub(crate) cursor: usize,
}

impl Internals {
    pub(crate) fn new() -> Self {
        Self {
            last_tick: -1,
            sequence: 0,
            cursor: 0,
        }
    }
}

/// Generator is a single-owner, time-based unique ID generator.
///
/// Each identifier packs `| tick | machine id | sequence |` into 63 bits.
/// `next_id` takes `&mut self`; for shared use across threads see
/// [`ConcurrentGenerator`].
pub struct Generator<C = SystemClock> {
    pub(crate) epoch: DateTime<Utc>,
    pub(crate) resolution: Resolution,
    pub(crate) layout: Layout,
    pub(crate) machine_ids: Vec<u64>,
    pub(crate) selection: MachineIdSelection,
    pub(crate) exhaustion: Exhaustion,
    pub(crate) clock: C,
    pub(crate) internals: Internals,
}

impl Generator<SystemClock> {
    /// Create a new Generator for a single machine id with the default configuration.
    /// For custom configuration see [`builder`].
    ///
    /// [`builder`]: struct.Generator.html#method.builder
    pub fn new(machine_id: u64) -> Result<Self, Error> {
        Builder::new().machine_id(machine_id).finalize()
    }

    /// Create a new [`Builder`] to construct a Generator.
    ///
    /// [`Builder`]: struct.Builder.html
    pub fn builder() -> Builder<SystemClock> {
        Builder::new()
    }
}

impl<C: Clock> Generator<C> {
    /// Generate the next unique id.
    ///
    /// Fails with [`Error::ClockRegression`] if the clock reads earlier than
    /// the last tick handed out, with [`Error::OverTimeLimit`] once the tick
    /// no longer fits the timestamp bits, and with
    /// [`Error::SequenceExhausted`] when the tick is full and the generator
    /// is configured with [`Exhaustion::Fail`]. A failed call leaves the
    /// generator untouched.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn next_id(&mut self) -> Result<u64, Error> {
        loop {
            let tick = self.current_tick();
            let internals = &mut self.internals;

            if tick < 0 {
                return Err(Error::ClockRegression {
                    last_tick: internals.last_tick,
                    tick,
                });
            }

            match tick.cmp(&internals.last_tick) {
                Ordering::Less => {
                    return Err(Error::ClockRegression {
                        last_tick: internals.last_tick,
                        tick,
                    });
                }
                Ordering::Greater => {
                    if tick > self.layout.max_tick() {
                        return Err(Error::OverTimeLimit);
                    }
                    internals.last_tick = tick;
                    internals.sequence = 0;
                    if self.selection == MachineIdSelection::Spillover {
                        internals.cursor = 0;
                    }
                    break;
                }
                Ordering::Equal => {
                    if internals.sequence < self.layout.max_sequence() {
                        internals.sequence += 1;
                        break;
                    }
                    if self.selection == MachineIdSelection::Spillover
                        && internals.cursor + 1 < self.machine_ids.len()
                    {
                        internals.cursor += 1;
                        internals.sequence = 0;
                        break;
                    }
                    match self.exhaustion {
                        Exhaustion::Fail => return Err(Error::SequenceExhausted { tick }),
                        Exhaustion::Wait => self.wait_for_next_tick(),
                    }
                }
            }
        }

        let machine_id = self.select_machine_id();
        Ok(self
            .layout
            .pack(self.internals.last_tick, machine_id, self.internals.sequence))
    }

    /// Wrap this generator for shared use across threads.
    pub fn into_concurrent(self) -> ConcurrentGenerator<C> {
        ConcurrentGenerator::new(self)
    }

    fn current_tick(&self) -> i64 {
        self.resolution.ticks_between(self.epoch, self.clock.now())
    }

    fn wait_for_next_tick(&self) {
        let wait = self.resolution.until_next_tick(self.epoch, self.clock.now());
        #[cfg(feature = "tracing")]
        tracing::trace!(?wait, tick = self.internals.last_tick, "sequence exhausted, waiting");
        self.clock.sleep(wait);
    }

    fn select_machine_id(&mut self) -> u64 {
        match self.selection {
            MachineIdSelection::Pinned(index) => self.machine_ids[index],
            MachineIdSelection::Spillover => self.machine_ids[self.internals.cursor],
            MachineIdSelection::RoundRobin => {
                let id = self.machine_ids[self.internals.cursor];
                self.internals.cursor = (self.internals.cursor + 1) % self.machine_ids.len();
                id
            }
        }
    }
}

impl<C> Generator<C> {
    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn machine_ids(&self) -> &[u64] {
        &self.machine_ids
    }

    pub fn selection(&self) -> MachineIdSelection {
        self.selection
    }

    pub fn exhaustion(&self) -> Exhaustion {
        self.exhaustion
    }

    /// Break an id produced by this generator up into its parts.
    pub fn decompose(&self, id: u64) -> DecomposedId {
        self.layout.decompose(id)
    }

    /// The start of the tick an id was issued in, or `None` if it cannot be
    /// represented as a `DateTime<Utc>`.
    pub fn time_of(&self, id: u64) -> Option<DateTime<Utc>> {
        let tick = i128::from(self.layout.decompose(id).tick);
        let nanos = i64::try_from(tick * self.resolution.nanos()).ok()?;
        self.epoch
            .checked_add_signed(chrono::Duration::nanoseconds(nanos))
    }
}
