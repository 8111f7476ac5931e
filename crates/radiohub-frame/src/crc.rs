//! CRC16 in the X.25 flavour used by the radio modules.
//!
//! Reflected CCITT polynomial, seed `0xFFFF`, one's-complemented result sent
//! little-endian after the message bytes.

/// Reflected form of the CCITT polynomial `0x1021`.
pub const POLYNOMIAL: u16 = 0x8408;

/// Initial value of the running CRC.
pub const INIT: u16 = 0xFFFF;

/// One's-complement of the running CRC over a message and its own
/// trailing CRC when the message is intact.
pub const GOOD: u16 = 0x0F47;

/// Lookup table, one entry per byte value.
pub static TABLE: [u16; 256] = build_table();

const fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLYNOMIAL
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Raw running CRC over `data`, starting from [`INIT`].
pub fn calc(data: &[u8]) -> u16 {
    let mut crc = Crc16::new();
    crc.update(data);
    crc.value()
}

/// X.25 checksum: the one's-complement of [`calc`].
pub fn calc_x25(data: &[u8]) -> u16 {
    !calc(data)
}

/// Verify a buffer whose last two bytes are its X.25 checksum (LE).
pub fn check_x25(data_with_crc: &[u8]) -> bool {
    calc_x25(data_with_crc) == GOOD
}

/// Streaming CRC accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    crc: u16,
}

impl Crc16 {
    /// Start from [`INIT`].
    pub const fn new() -> Self {
        Self { crc: INIT }
    }

    /// Start from an explicit seed.
    pub const fn with_seed(seed: u16) -> Self {
        Self { crc: seed }
    }

    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.crc = TABLE[((self.crc ^ u16::from(byte)) & 0xFF) as usize] ^ (self.crc >> 8);
        }
    }

    /// Raw running value.
    pub const fn value(&self) -> u16 {
        self.crc
    }

    /// Complemented value, as transmitted.
    pub const fn finish_x25(&self) -> u16 {
        !self.crc
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}
