//! Compression configuration and result records
//!
//! A [`CmpCfg`] borrows the caller's buffers for the duration of one
//! compression call; nothing is allocated. The aliasing rules of the
//! on-board interface (input, model and output storage must be disjoint;
//! only the updated model may share storage with the model) are enforced by
//! the borrow checker instead of runtime pointer comparisons: the only
//! aliasing the type system permits is the in-place model update, expressed
//! by leaving [`CmpCfg::updated_model`] as `None`.
//!
//! The validator applies every check and reports the number of problems it
//! found; error bits for the individual conditions are deposited in the
//! [`CmpInfo`] result record.

use crate::error::{CodecError, CodecResult, ErrorFlags};
use crate::golomb::max_spill;
use crate::mode::CmpMode;
use crate::sample::Sample;

/// Largest model weighting parameter; the blend denominator
pub const MAX_MODEL_VALUE: u32 = 16;

/// Largest lossy rounding bit count
pub const MAX_ICU_ROUND: u32 = 3;

/// Smallest supported Golomb parameter
pub const MIN_ICU_GOLOMB_PAR: u32 = 1;

/// Largest supported Golomb parameter
pub const MAX_ICU_GOLOMB_PAR: u32 = 0xFFFF;

/// Smallest supported spillover threshold
pub const MIN_ICU_SPILL: u32 = 2;

/// Fixed Golomb parameter for the exposure-flags field of the structured
/// science products
///
/// Exposure-flag residuals cluster tightly around zero; they are coded with
/// this parameter through a side codebook regardless of the configured
/// `golomb_par`, with a spillover threshold of
/// `max_spill(GOLOMB_PAR_EXPOSURE_FLAGS)`.
pub const GOLOMB_PAR_EXPOSURE_FLAGS: u32 = 1;

/// Configuration of a single compression call
///
/// # Example
/// ```
/// use fluxcodec::{CmpCfg, CmpMode};
///
/// let mut input = [10u16, 12, 9, 9];
/// let mut output = [0u32; 4];
/// let mut cfg = CmpCfg::new(CmpMode::DiffZero, &mut input, &mut output);
/// cfg.golomb_par = 4;
/// cfg.spill = 8;
/// ```
pub struct CmpCfg<'a, S: Sample> {
    /// Compression mode
    pub mode: CmpMode,
    /// Golomb divisor for the data fields
    pub golomb_par: u32,
    /// Spillover threshold for the data fields
    pub spill: u32,
    /// Model weighting parameter, `0..=MAX_MODEL_VALUE`
    pub model_value: u32,
    /// Lossy rounding bit count, `0..=MAX_ICU_ROUND`
    pub round: u32,
    /// Output capacity in 16-bit units; at most `2 * output.len()`
    pub buffer_length: u32,
    /// Samples to compress; transformed in place
    pub input: &'a mut [S],
    /// Model of the data; required by the model modes
    pub model: Option<&'a mut [S]>,
    /// Storage for the updated model; `None` updates `model` in place
    pub updated_model: Option<&'a mut [S]>,
    /// Compressed bitstream destination, written as big-endian words
    pub output: &'a mut [u32],
}

impl<'a, S: Sample> CmpCfg<'a, S> {
    /// Create a configuration with the full capacity of `output` and neutral
    /// coding parameters
    ///
    /// `golomb_par`, `spill`, `model_value` and `round` start at their
    /// smallest legal values; set them before compressing.
    pub fn new(mode: CmpMode, input: &'a mut [S], output: &'a mut [u32]) -> Self {
        let buffer_length = (output.len() * 2) as u32;
        Self {
            mode,
            golomb_par: MIN_ICU_GOLOMB_PAR,
            spill: MIN_ICU_SPILL,
            model_value: 0,
            round: 0,
            buffer_length,
            input,
            model: None,
            updated_model: None,
            output,
        }
    }

    /// Number of samples to compress
    pub fn samples(&self) -> usize {
        self.input.len()
    }
}

/// Result record of a compression call
///
/// Mirrors back the parameters the call actually used (the decompressor
/// consumes exactly this record) and carries the compressed size in bits
/// plus the error bitset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CmpInfo {
    /// Compression mode used
    pub cmp_mode_used: CmpMode,
    /// Model weighting parameter used
    pub model_value_used: u8,
    /// Lossy rounding bit count used
    pub round_used: u8,
    /// Spillover threshold used
    pub spill_used: u32,
    /// Golomb parameter used
    pub golomb_par_used: u32,
    /// Number of samples compressed
    pub samples_used: u32,
    /// Compressed size in bits, excluding the zero padding of the tail word
    pub cmp_size: u32,
    /// Error bits; several may be set by one call
    pub cmp_err: ErrorFlags,
}

impl CmpInfo {
    /// Mirror the configuration parameters into the result record and clear
    /// the outcome fields
    pub(crate) fn record_parameters<S: Sample>(&mut self, cfg: &CmpCfg<'_, S>) {
        self.cmp_err = ErrorFlags::empty();
        self.cmp_mode_used = cfg.mode;
        self.model_value_used = cfg.model_value as u8;
        self.round_used = cfg.round as u8;
        self.spill_used = cfg.spill;
        self.golomb_par_used = cfg.golomb_par;
        self.samples_used = cfg.input.len() as u32;
        self.cmp_size = 0;
    }
}

/// Validate a configuration for software compression
///
/// Applies every check without short-circuiting (raw modes stop after the
/// raw checks, which is all that applies to them), deposits error bits in
/// `info.cmp_err` and reports the total number of problems found.
/// `samples == 0` is a warning, not an error; the pipeline then succeeds
/// with a compressed size of zero.
pub fn validate_cfg<S: Sample>(cfg: &CmpCfg<'_, S>, info: &mut CmpInfo) -> CodecResult<()> {
    let mut problems: u32 = 0;
    let samples = cfg.input.len();

    if samples == 0 {
        log::warn!("the samples parameter is 0, no data are compressed; this may not be intended");
    }

    if cfg.buffer_length == 0 && samples != 0 {
        log::error!("buffer_length is 0, there is no space to store the compressed data");
        problems += 1;
    }

    if (cfg.buffer_length as usize + 1) / 2 > cfg.output.len() {
        log::error!(
            "buffer_length {} exceeds the {} words of the output buffer",
            cfg.buffer_length,
            cfg.output.len()
        );
        info.cmp_err |= ErrorFlags::CMP_PAR;
        problems += 1;
    }

    if cfg.mode.shape() != S::SHAPE {
        log::error!("compression mode {:?} does not fit the sample shape", cfg.mode);
        info.cmp_err |= ErrorFlags::CMP_MODE;
        problems += 1;
    }

    if cfg.mode.is_model() {
        match cfg.model.as_ref() {
            None => {
                log::error!("no model buffer set for a model mode");
                problems += 1;
            }
            Some(model) if model.len() != samples => {
                log::error!(
                    "model buffer holds {} samples, input holds {}",
                    model.len(),
                    samples
                );
                problems += 1;
            }
            Some(_) => {}
        }

        if let Some(up) = cfg.updated_model.as_ref() {
            if up.len() != samples {
                log::error!(
                    "updated-model buffer holds {} samples, input holds {}",
                    up.len(),
                    samples
                );
                problems += 1;
            }
        }
    }

    if cfg.mode.is_raw() {
        if samples as u32 > cfg.buffer_length {
            log::error!("buffer_length is too small to hold the data from the input buffer");
            problems += 1;
        }
        // no coding parameters to check in raw mode
        return finish_validation(problems);
    }

    let sample_bytes = samples * (S::BITS as usize / 8);
    if samples != 0 && (cfg.buffer_length as usize * 2) * 3 < sample_bytes {
        log::warn!("the output buffer is less than a third of the input size; this is probably unintentional");
    }

    if cfg.mode.is_model() && cfg.model_value > MAX_MODEL_VALUE {
        log::error!(
            "model_value {} is invalid, largest supported value is {}",
            cfg.model_value,
            MAX_MODEL_VALUE
        );
        info.cmp_err |= ErrorFlags::MODEL_VALUE;
        problems += 1;
    }

    if cfg.golomb_par < MIN_ICU_GOLOMB_PAR || cfg.golomb_par > MAX_ICU_GOLOMB_PAR {
        log::error!(
            "golomb_par {} is not supported, it has to be in [{}, {}]",
            cfg.golomb_par,
            MIN_ICU_GOLOMB_PAR,
            MAX_ICU_GOLOMB_PAR
        );
        info.cmp_err |= ErrorFlags::CMP_PAR;
        problems += 1;
    }

    if cfg.spill < MIN_ICU_SPILL {
        log::error!(
            "spillover threshold {} is too small, smallest possible value is {}",
            cfg.spill,
            MIN_ICU_SPILL
        );
        info.cmp_err |= ErrorFlags::CMP_PAR;
        problems += 1;
    }

    if cfg.spill > max_spill(cfg.golomb_par) {
        log::error!(
            "spillover threshold {} is too large for golomb_par {}, largest possible value is {}",
            cfg.spill,
            cfg.golomb_par,
            max_spill(cfg.golomb_par)
        );
        info.cmp_err |= ErrorFlags::CMP_PAR;
        problems += 1;
    }

    if cfg.round > MAX_ICU_ROUND {
        log::error!(
            "round parameter {} is not supported, largest supported value is {}",
            cfg.round,
            MAX_ICU_ROUND
        );
        problems += 1;
    }

    finish_validation(problems)
}

fn finish_validation(problems: u32) -> CodecResult<()> {
    if problems == 0 {
        Ok(())
    } else {
        Err(CodecError::InvalidConfig {
            problems: problems.min(u8::MAX as u32) as u8,
        })
    }
}
