//! CRC-32 as used by Ethernet (IEEE 802.3):
//! ```txt
//! poly   0x04C11DB7
//! init   0xFFFFFFFF
//! refin  true
//! refout true
//! xorout 0xFFFFFFFF
//! ```
//! Computed MSB-first: every input byte is reflected before it is shifted into the top of the
//! register, and the register is reflected once at the end. This gives the same numbers as the
//! usual LSB-first (pre-reflected) form.

pub const POLYNOMIAL: u32 = 0x04C1_1DB7;
pub const INIT_CRC: u32 = 0xFFFF_FFFF;
pub const FINAL_XOR: u32 = 0xFFFF_FFFF;

/// Reverse the bit order of a byte (bit 0 <-> bit 7, ...).
pub const fn reflect8(data: u8) -> u8 {
    let mut res = 0u8;
    let mut i = 0;
    while i < 8 {
        res |= ((data >> i) & 1) << (7 - i);
        i += 1;
    }
    res
}

/// Reverse the bit order of a 32-bit word.
pub const fn reflect32(data: u32) -> u32 {
    let mut res = 0u32;
    let mut i = 0;
    while i < 32 {
        res |= ((data >> i) & 1) << (31 - i);
        i += 1;
    }
    res
}

#[inline]
const fn shift_byte(mut crc: u32, byte: u8) -> u32 {
    crc ^= (reflect8(byte) as u32) << 24;
    let mut j = 0;
    while j < 8 {
        crc = if crc & 0x8000_0000 != 0 {
            (crc << 1) ^ POLYNOMIAL
        } else {
            crc << 1
        };
        j += 1;
    }
    crc
}

/// Checksum of `data`. Total: the empty slice yields `reflect32(INIT_CRC) ^ FINAL_XOR`.
pub fn compute(data: &[u8]) -> u32 {
    let mut crc = INIT_CRC;
    for &b in data {
        crc = shift_byte(crc, b);
    }
    reflect32(crc) ^ FINAL_XOR
}

// Table form over the reflected polynomial; only used to check the bit-serial form against.
#[cfg(test)]
const REFLECTED_TABLE: [u32; 256] = {
    let reflected_poly = reflect32(POLYNOMIAL);
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ reflected_poly
            } else {
                crc >> 1
            };
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

#[cfg(test)]
fn compute_table(data: &[u8]) -> u32 {
    let mut crc = INIT_CRC;
    for &b in data {
        crc = (crc >> 8) ^ REFLECTED_TABLE[((crc ^ b as u32) & 0xff) as usize];
    }
    crc ^ FINAL_XOR
}
