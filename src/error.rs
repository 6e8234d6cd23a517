//! Error types for fluxcodec
//!
//! All errors are `Copy` and contain minimal data so they can be used in
//! `no_std` environments without allocation. In addition to the error enum,
//! every compression call deposits a bitset of configuration problems in the
//! result record ([`ErrorFlags`]); the two are deliberately separate: the
//! enum is what the caller matches on, the bitset is what gets mirrored into
//! housekeeping telemetry.

use core::fmt;

use bitflags::bitflags;

/// Result type alias for fluxcodec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Error types returned by compression/decompression operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The configuration record failed validation
    InvalidConfig {
        /// Number of independent problems the validator found
        problems: u8,
    },

    /// Output buffer is too small to hold the compressed bitstream
    SmallBuffer {
        /// Bit position the rejected write would have reached
        required_bits: u32,
    },

    /// The compression mode does not match the sample shape of the buffers
    UnsupportedMode,

    /// Two buffers that must have the same sample count do not
    LengthMismatch {
        /// Expected number of samples
        expected: usize,
        /// Actual number of samples found
        actual: usize,
    },

    /// Compressed bitstream ended before all samples were decoded
    UnexpectedEndOfInput,

    /// Compressed bitstream contains a symbol no encoder can produce
    CorruptedBitstream,

    /// A codeword would exceed the 32-bit codeword budget
    ///
    /// Cannot occur for a validated configuration; indicates parameters that
    /// bypassed validation or an internal inconsistency.
    CodewordTooLong {
        /// The value that was being encoded
        value: u32,
        /// The Golomb parameter in use
        golomb_par: u32,
    },
}

impl CodecError {
    /// Convert error to a numeric error code for FFI boundaries
    ///
    /// `-2` is reserved for the small-buffer condition; callers polling for
    /// "give me a bigger buffer and retry" only need to check that code.
    pub const fn to_error_code(self) -> i32 {
        match self {
            CodecError::InvalidConfig { .. } => -1,
            CodecError::SmallBuffer { .. } => -2,
            CodecError::UnsupportedMode => -3,
            CodecError::LengthMismatch { .. } => -4,
            CodecError::UnexpectedEndOfInput => -5,
            CodecError::CorruptedBitstream => -6,
            CodecError::CodewordTooLong { .. } => -7,
        }
    }
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::InvalidConfig { problems } => {
                write!(f, "invalid configuration: {} problem(s) detected", problems)
            }
            CodecError::SmallBuffer { required_bits } => {
                write!(
                    f,
                    "output buffer too small: write would reach bit {}",
                    required_bits
                )
            }
            CodecError::UnsupportedMode => {
                write!(f, "compression mode does not match the sample shape")
            }
            CodecError::LengthMismatch { expected, actual } => {
                write!(
                    f,
                    "buffer length mismatch: expected {} samples, got {}",
                    expected, actual
                )
            }
            CodecError::UnexpectedEndOfInput => {
                write!(f, "unexpected end of compressed bitstream")
            }
            CodecError::CorruptedBitstream => {
                write!(f, "corrupted bitstream (undecodable symbol)")
            }
            CodecError::CodewordTooLong { value, golomb_par } => {
                write!(
                    f,
                    "codeword for value {} exceeds 32 bits with golomb_par {}",
                    value, golomb_par
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CodecError {}

bitflags! {
    /// Error bits mirrored into the result record (`CmpInfo::cmp_err`)
    ///
    /// Several bits may be set by a single call; the validator applies every
    /// check rather than stopping at the first failure. The `AP1`/`AP2` bits
    /// belong to the adaptive secondary parameter sets of the hardware
    /// compression path and are defined for bit-layout compatibility only;
    /// the software pipeline never raises them.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ErrorFlags: u16 {
        /// Unsupported compression mode
        const CMP_MODE = 1 << 0;
        /// Model weighting parameter out of range
        const MODEL_VALUE = 1 << 1;
        /// Golomb parameter or spillover threshold out of range
        const CMP_PAR = 1 << 2;
        /// Adaptive parameter set 1 out of range (hardware path only)
        const AP1_CMP_PAR = 1 << 3;
        /// Adaptive parameter set 2 out of range (hardware path only)
        const AP2_CMP_PAR = 1 << 4;
        /// Output buffer too small for the compressed data
        const SMALL_BUFFER = 1 << 5;
    }
}
