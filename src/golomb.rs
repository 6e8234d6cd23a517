//! Golomb and Rice codeword construction and decoding
//!
//! The entropy coder emits one variable-length codeword per mapped field
//! value. When the divisor `m` is a power of two the codeword is a Rice
//! code: `q` leading ones, a zero, then the `log2(m)`-bit remainder. For
//! other divisors the Golomb arrangement is used: values below the cutoff
//! `c = 2^(log2(m)+1) - m` form group 0 and occupy `log2(m) + 1` bits;
//! larger values carry their group index in leading ones followed by a
//! `log2(m) + 2`-bit suffix.
//!
//! Every codeword fits 32 bits. The [`max_spill`] bound on the spillover
//! threshold guarantees this for any validated configuration, including the
//! largest multi-escape symbol `spill + 15`.

use crate::bitstream::BitReader;
use crate::error::{CodecError, CodecResult};

/// Integer base-2 logarithm, truncated
///
/// `x` must be non-zero.
#[inline]
pub fn ilog2(x: u32) -> u32 {
    debug_assert!(x != 0);
    31 - x.leading_zeros()
}

/// Form the Rice codeword for `value` and return it with its bit length
///
/// `m` must be a power of two with `log2_m = log2(m)`, pre-computed by the
/// caller since it is loop-invariant.
pub fn rice_codeword(value: u32, m: u32, log2_m: u32) -> CodecResult<(u32, u32)> {
    let g = value >> log2_m; // quotient, number of leading ones
    let rl = log2_m + 1; // remainder length (+1 for the terminating zero)
    let len = rl + g;
    if len > 32 {
        return Err(CodecError::CodewordTooLong {
            value,
            golomb_par: m,
        });
    }

    let q = if g == 0 { 0 } else { (1u32 << g) - 1 };
    let cw = (q << rl) | (value & (m - 1));
    Ok((cw, len))
}

/// Form the Golomb codeword for `value` and return it with its bit length
///
/// Used for divisors that are not powers of two; `log2_m = ilog2(m)`.
pub fn golomb_codeword(value: u32, m: u32, log2_m: u32) -> CodecResult<(u32, u32)> {
    let len0 = log2_m + 1; // codeword length in group 0
    let cutoff = (1u32 << (log2_m + 1)) - m; // members in group 0

    if value < cutoff {
        return Ok((value, len0));
    }

    let b = cutoff << 1; // base codeword of the group suffix
    let g = (value - cutoff) / m; // group index
    let len = len0 + g + 1;
    if len > 32 {
        return Err(CodecError::CodewordTooLong {
            value,
            golomb_par: m,
        });
    }

    let q = if g == 0 { 0 } else { (1u32 << g) - 1 };
    let cw = (q << (len0 + 1)) + b + (value - cutoff) - g * m;
    Ok((cw, len))
}

/// Code parameters shared between encoder and decoder
///
/// Bundles the divisor, its pre-computed logarithm, the spillover threshold
/// and the Rice/Golomb selection. The encoder keeps two of these per call
/// when a shape carries an exposure-flags field: one configured, one fixed.
#[derive(Debug, Clone, Copy)]
pub struct Codebook {
    /// Golomb divisor
    pub golomb_par: u32,
    /// `ilog2(golomb_par)`, pre-computed
    pub log2_par: u32,
    /// Spillover threshold: mapped values at or above it take the outlier path
    pub spill: u32,
    rice: bool,
}

impl Codebook {
    /// Build a codebook for a validated `(golomb_par, spill)` pair
    pub fn new(golomb_par: u32, spill: u32) -> Self {
        debug_assert!(golomb_par >= 1);
        Self {
            golomb_par,
            log2_par: ilog2(golomb_par),
            spill,
            rice: golomb_par.is_power_of_two(),
        }
    }

    /// Codeword and bit length for `value`
    #[inline]
    pub fn codeword(&self, value: u32) -> CodecResult<(u32, u32)> {
        if self.rice {
            rice_codeword(value, self.golomb_par, self.log2_par)
        } else {
            golomb_codeword(value, self.golomb_par, self.log2_par)
        }
    }

    /// Decode one codeword from the reader
    pub fn decode(&self, reader: &mut BitReader<'_>) -> CodecResult<u32> {
        if self.rice {
            self.decode_rice(reader)
        } else {
            self.decode_golomb(reader)
        }
    }

    fn decode_rice(&self, reader: &mut BitReader<'_>) -> CodecResult<u32> {
        let mut g = 0u32;
        while reader.read_bit()? == 1 {
            g += 1;
            if g + self.log2_par + 1 > 32 {
                return Err(CodecError::CorruptedBitstream);
            }
        }
        let r = reader.read_bits(self.log2_par)?;
        Ok((g << self.log2_par) | r)
    }

    fn decode_golomb(&self, reader: &mut BitReader<'_>) -> CodecResult<u32> {
        let len0 = self.log2_par + 1;
        let cutoff = (1u32 << (self.log2_par + 1)) - self.golomb_par;
        let b = cutoff << 1;

        let mut n = reader.read_bits(len0)?;
        if n < cutoff {
            return Ok(n);
        }

        // walk the groups: at group g the valid codewords of length
        // len0 + 1 + g occupy [base + b, base + b + m)
        let mut g = 0u32;
        loop {
            if len0 + 1 + g > 32 {
                return Err(CodecError::CorruptedBitstream);
            }
            n = (n << 1) | reader.read_bit()?;
            let base = if g == 0 {
                0
            } else {
                ((1u32 << g) - 1) << (len0 + 1)
            };
            let lo = base + b;
            if n >= lo && n < lo + self.golomb_par {
                return Ok(cutoff + g * self.golomb_par + (n - lo));
            }
            g += 1;
        }
    }
}

/// Magnitude class of a multi-escape outlier
///
/// Returns the step of `ceil(log4(d + 1))` capped at 15; the outlier is then
/// emitted as the escape symbol `spill + offset` followed by `d` in
/// `(offset + 1) * 2` raw bits.
pub fn multi_escape_offset(unencoded_data: u32) -> u32 {
    let mut offset = 0u32;
    let mut bound = 0x3u32;
    while unencoded_data > bound && offset < 15 {
        offset += 1;
        bound = (bound << 2) | 0x3;
    }
    offset
}

/// Largest legal spillover threshold for a Golomb divisor
///
/// Chosen so that the escape symbol `spill + 15` (the largest symbol either
/// escape mechanism can emit) still forms a codeword within the 32-bit
/// budget. Encoder and decoder both derive their bounds from this function.
pub fn max_spill(golomb_par: u32) -> u32 {
    if golomb_par == 0 {
        return 0;
    }

    const MAX_CW_BITS: u32 = 32;
    let log2_m = ilog2(golomb_par);
    let cutoff = (1u32 << (log2_m + 1)) - golomb_par;
    let max_sym_offset = MAX_CW_BITS / 2 - 1;

    (MAX_CW_BITS - 1 - log2_m) * golomb_par + cutoff - max_sym_offset - 1
}
