use crate::error::*;

/// Total number of bits in an identifier; the sign bit of an `i64` stays clear.
pub const TOTAL_BITS: u8 = 63;

/// Bit budget of an identifier: `| timestamp | machine id | sequence |`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Layout {
    machine_id_bits: u8,
    sequence_bits: u8,
}

impl Layout {
    /// Create a layout, rejecting budgets that leave no room for the timestamp.
    pub fn new(machine_id_bits: u8, sequence_bits: u8) -> Result<Self, Error> {
        if u16::from(machine_id_bits) + u16::from(sequence_bits) >= u16::from(TOTAL_BITS) {
            return Err(Error::InvalidBitLength(machine_id_bits, sequence_bits));
        }
        Ok(Self {
            machine_id_bits,
            sequence_bits,
        })
    }

    pub fn machine_id_bits(&self) -> u8 {
        self.machine_id_bits
    }

    pub fn sequence_bits(&self) -> u8 {
        self.sequence_bits
    }

    pub fn timestamp_bits(&self) -> u8 {
        TOTAL_BITS - self.machine_id_bits - self.sequence_bits
    }

    pub fn max_machine_id(&self) -> u64 {
        mask(self.machine_id_bits)
    }

    pub fn max_sequence(&self) -> u64 {
        mask(self.sequence_bits)
    }

    pub fn max_tick(&self) -> i64 {
        mask(self.timestamp_bits()) as i64
    }

    /// Pack the three components into an identifier.
    ///
    /// Callers guarantee every component fits its field.
    pub fn pack(&self, tick: i64, machine_id: u64, sequence: u64) -> u64 {
        debug_assert!(tick >= 0 && tick <= self.max_tick());
        debug_assert!(machine_id <= self.max_machine_id());
        debug_assert!(sequence <= self.max_sequence());
        (tick as u64) << (self.machine_id_bits + self.sequence_bits)
            | machine_id << self.sequence_bits
            | sequence
    }

    /// Break an identifier up into its parts.
    pub fn decompose(&self, id: u64) -> DecomposedId {
        DecomposedId {
            id,
            msb: id >> TOTAL_BITS,
            tick: (id >> (self.machine_id_bits + self.sequence_bits)) & mask(self.timestamp_bits()),
            machine_id: (id >> self.sequence_bits) & self.max_machine_id(),
            sequence: id & self.max_sequence(),
        }
    }
}

/// The parts of an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecomposedId {
    pub id: u64,
    pub msb: u64,
    pub tick: u64,
    pub machine_id: u64,
    pub sequence: u64,
}

fn mask(bits: u8) -> u64 {
    if bits == 0 {
        0
    } else {
        u64::MAX >> (64 - u32::from(bits))
    }
}
