use std::fmt;

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use crate::instructions::Location;

/// The three one-bit address spaces of the control unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Space {
    Ram,
    Input,
    Output,
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Space::Ram => "RAM",
            Space::Input => "input pin",
            Space::Output => "output pin",
        })
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusError {
    #[error("{space} address {addr} is not mapped")]
    Unmapped { space: Space, addr: u8 },
}

pub trait Bus {
    /// Reads RAM or an input pin.
    fn load(&self, loc: Location) -> Result<bool, BusError>;
    /// Writes RAM or an output pin.
    fn store(&mut self, loc: Location, val: bool) -> Result<(), BusError>;
}

/// Eight one-bit cells of which `first..=7` are addressable.
#[derive(Debug, Clone)]
pub struct Bank {
    space: Space,
    first: u8,
    bits: BitArr!(for 8, in u8, Lsb0),
}

impl Bank {
    pub fn new(space: Space, first: u8) -> Self {
        Self {
            space,
            first,
            bits: bitarr![u8, Lsb0; 0; 8],
        }
    }

    pub fn is_mapped(&self, addr: u8) -> bool {
        (self.first..8).contains(&addr)
    }

    pub fn get(&self, addr: u8) -> Result<bool, BusError> {
        self.check(addr)?;
        Ok(self.bits[addr as usize])
    }

    pub fn set(&mut self, addr: u8, val: bool) -> Result<(), BusError> {
        self.check(addr)?;
        self.bits.set(addr as usize, val);
        Ok(())
    }

    /// Mapped cells in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, bool)> + '_ {
        (self.first..8).map(move |a| (a, self.bits[a as usize]))
    }

    fn check(&self, addr: u8) -> Result<(), BusError> {
        if self.is_mapped(addr) {
            Ok(())
        } else {
            Err(BusError::Unmapped {
                space: self.space,
                addr,
            })
        }
    }
}

/// RAM cells 1..=7, input pins 0..=7 and output pins 1..=7.
///
/// Address 0 of RAM and of the outputs does not exist; touching it is a
/// [`BusError::Unmapped`]. Input pin 0 starts high.
#[derive(Debug, Clone)]
pub struct IoSpace {
    pub ram: Bank,
    pub inputs: Bank,
    pub outputs: Bank,
}

impl IoSpace {
    pub fn new() -> Self {
        let mut inputs = Bank::new(Space::Input, 0);
        inputs.bits.set(0, true);
        Self {
            ram: Bank::new(Space::Ram, 1),
            inputs,
            outputs: Bank::new(Space::Output, 1),
        }
    }

    pub fn set_input(&mut self, pin: u8, val: bool) -> Result<(), BusError> {
        self.inputs.set(pin, val)
    }
}

impl Default for IoSpace {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for IoSpace {
    fn load(&self, loc: Location) -> Result<bool, BusError> {
        match loc {
            Location::Ram(a) => self.ram.get(a),
            Location::Pin(a) => self.inputs.get(a),
        }
    }

    fn store(&mut self, loc: Location, val: bool) -> Result<(), BusError> {
        match loc {
            Location::Ram(a) => self.ram.set(a, val),
            Location::Pin(a) => self.outputs.set(a, val),
        }
    }
}
