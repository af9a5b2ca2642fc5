//! Masked read/modify/write primitives over the CTE register block.

use super::map::{Field, Register};

/// Register access contract consumed by the driver.
///
/// Implementations map [`Register`] values onto real memory-mapped I/O or a
/// simulation. Accesses are 32 bits wide and must complete.
pub trait RegisterBus {
    /// Reads a 32-bit register.
    fn read32(&mut self, reg: Register) -> u32;

    /// Writes a 32-bit register.
    fn write32(&mut self, reg: Register, value: u32);

    /// Reads `(reg & mask) >> shift`.
    fn read_masked_field(&mut self, reg: Register, mask: u32, shift: u32) -> u32 {
        (self.read32(reg) & mask) >> shift
    }

    /// Replaces the bits selected by `mask` with the already aligned `value`.
    fn write_masked_field(&mut self, reg: Register, mask: u32, value: u32) {
        let current = self.read32(reg);
        self.write32(reg, (current & !mask) | (value & mask));
    }

    /// Reads one field.
    fn read_field(&mut self, field: Field) -> u32 {
        self.read_masked_field(field.reg, field.mask, field.shift)
    }

    /// Writes one field, leaving the rest of the register untouched.
    fn write_field(&mut self, field: Field, value: u32) {
        self.write_masked_field(field.reg, field.mask, field.encode(value));
    }

    /// Writes 1 then 0 into a single-bit field.
    fn pulse_field(&mut self, field: Field) {
        self.write_field(field, 1);
        self.write_field(field, 0);
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &mut B {
    fn read32(&mut self, reg: Register) -> u32 {
        (**self).read32(reg)
    }

    fn write32(&mut self, reg: Register, value: u32) {
        (**self).write32(reg, value);
    }
}
