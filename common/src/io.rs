use core::{
    cmp::PartialEq,
    ops::{BitAnd, BitOr, Not},
};

mod mmio;

pub use mmio::*;

/// IO abstraction
pub trait Io {
    /// Value type for IO, usually some unsigned number
    type Value: Copy
        + PartialEq
        + BitAnd<Output = Self::Value>
        + BitOr<Output = Self::Value>
        + Not<Output = Self::Value>;

    /// Read the underlying value
    fn read(&self) -> Self::Value;
    /// Write the underlying value
    fn write(&mut self, value: Self::Value);

    /// Check whether the underlying value contains bit flags
    #[inline(always)]
    fn readf(&self, flags: Self::Value) -> bool {
        (self.read() & flags) as Self::Value == flags
    }

    /// Enable or disable specific bit flags
    #[inline(always)]
    fn writef(&mut self, flags: Self::Value, value: bool) {
        let tmp: Self::Value = match value {
            true => self.read() | flags,
            false => self.read() & !flags,
        };
        self.write(tmp);
    }
}

#[cfg(test)]
mod tests {
    use super::Io;

    struct Cell(u32);

    impl Io for Cell {
        type Value = u32;

        fn read(&self) -> u32 {
            self.0
        }

        fn write(&mut self, value: u32) {
            self.0 = value;
        }
    }

    #[test]
    fn writef_touches_only_flags() {
        let mut cell = Cell(0b1010);
        cell.writef(0b0001, true);
        assert_eq!(cell.0, 0b1011);
        cell.writef(0b1000, false);
        assert_eq!(cell.0, 0b0011);
        assert!(cell.readf(0b0011));
        assert!(!cell.readf(0b0111));
    }
}
