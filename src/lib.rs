//! fluxcodec - deterministic compression for imaging instrument telemetry
//!
//! A `#![no_std]` compatible codec for science telemetry produced by an
//! imaging instrument: imagette pixel arrays and the structured flux /
//! centre-of-brightness / exposure-flags products. Designed for constrained
//! on-board processors: no heap allocation anywhere in the codec, no
//! floating point, endian-stable big-endian output, and exact overflow
//! detection on the output buffer.
//!
//! # Pipeline
//!
//! One call runs a four-stage straight line over the caller's sample
//! buffer:
//!
//! 1. **validate** the configuration (every check applied, error bits
//!    collected in the result record);
//! 2. **pre-process** in place: lossy rounding, then 1-D differencing or
//!    model prediction;
//! 3. **map** each signed residual onto the natural numbers;
//! 4. **encode** Rice/Golomb codewords with zero- or multi-escape outlier
//!    handling, packed big-endian into 32-bit words.
//!
//! The input buffer is transformed in place, so a call is not idempotent:
//! on an error return the input may hold partially processed residuals.
//!
//! # Example
//! ```
//! use fluxcodec::{icu_compress_data, decompress_data, CmpCfg, CmpInfo, CmpMode};
//!
//! let original = [10u16, 12, 9, 9];
//!
//! let mut input = original;
//! let mut output = [0u32; 4];
//! let mut cfg = CmpCfg::new(CmpMode::DiffZero, &mut input, &mut output);
//! cfg.golomb_par = 4;
//! cfg.spill = 8;
//!
//! let mut info = CmpInfo::default();
//! icu_compress_data(cfg, &mut info).expect("compression failed");
//! assert_eq!(info.cmp_size, 30);
//!
//! let mut restored = [0u16; 4];
//! decompress_data(&output, None, &info, &mut restored).expect("decompression failed");
//! assert_eq!(restored, original);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]

pub mod bitstream;
pub mod chunk;
pub mod config;
pub mod error;
pub mod golomb;
pub mod map;
pub mod mode;
pub mod preprocess;
pub mod sample;

mod decompress;
mod encode;

// Re-export commonly used types
pub use chunk::{compress_chunk_bound, compress_chunk_cmp_size_bound};
pub use config::{CmpCfg, CmpInfo};
pub use decompress::decompress_data;
pub use error::{CodecError, CodecResult, ErrorFlags};
pub use mode::CmpMode;
pub use sample::{Sample, SampleShape, SFx, SFxEfx, SFxEfxNcobEcob, SFxNcob};

use config::validate_cfg;
use mode::Preprocessing;

/// Compress one sample buffer end-to-end
///
/// Runs the full pipeline over `cfg` and reports the outcome in `info`:
/// the parameters used, the compressed size in bits and the error bitset.
/// The decompressor consumes the same `info` record.
///
/// `cfg.input` is transformed **in place**; after the call it holds the
/// mapped residuals, not the original samples. On an error return it may be
/// partially transformed.
///
/// # Errors
///
/// * [`CodecError::InvalidConfig`] - the validator rejected the
///   configuration; no buffer was touched.
/// * [`CodecError::SmallBuffer`] - the output buffer cannot hold the
///   bitstream; `info.cmp_size` is cleared and the small-buffer error bit
///   is set. Error code −2, for callers working across an FFI boundary.
pub fn icu_compress_data<S: Sample>(
    mut cfg: CmpCfg<'_, S>,
    info: &mut CmpInfo,
) -> CodecResult<()> {
    info.record_parameters(&cfg);

    validate_cfg(&cfg, info)?;

    if cfg.input.is_empty() {
        // nothing to compress; reported as a warning by the validator
        return Ok(());
    }

    pre_process(&mut cfg);
    map_to_pos(&mut cfg);
    encode::encode_data(&mut cfg, info)
}

/// Pre-processing stage: dispatch on the mode's strategy
fn pre_process<S: Sample>(cfg: &mut CmpCfg<'_, S>) {
    match cfg.mode.descriptor().preprocessing {
        Preprocessing::Raw => {}
        Preprocessing::Diff => preprocess::diff_buffer(cfg.input, cfg.round),
        Preprocessing::Model => {
            // model presence and lengths were checked by the validator
            if let Some(model) = cfg.model.as_deref_mut() {
                preprocess::model_buffer(
                    cfg.input,
                    model,
                    cfg.updated_model.as_deref_mut(),
                    cfg.model_value,
                    cfg.round,
                );
            }
        }
    }
}

/// Mapping stage: fold residuals onto the natural numbers
fn map_to_pos<S: Sample>(cfg: &mut CmpCfg<'_, S>) {
    if cfg.mode.is_raw() {
        return;
    }
    map::map_buffer(cfg.input, cfg.mode.uses_zero_escape());
}
