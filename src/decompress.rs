//! Decompression: the mirror of the compression pipeline
//!
//! The decoder consumes the big-endian word stream together with the
//! [`CmpInfo`] record the compressor produced; the record carries every
//! parameter the stages need (mode, divisor, spillover threshold, model
//! weighting, rounding, sample count). Stages run in reverse order: decode
//! the symbols, undo the sign fold, then integrate the residuals back into
//! samples. In model modes the decoder applies the identical model update
//! as the encoder, so a sequence of calls stays in lockstep with the
//! on-board model evolution.
//!
//! Reconstruction is exact up to the lossy rounding: the decoder returns
//! `round_inv(round_fwd(x))`, which equals `x` for `round == 0`.

use crate::bitstream::BitReader;
use crate::config::CmpInfo;
use crate::encode::exposure_flags_codebook;
use crate::error::{CodecError, CodecResult};
use crate::golomb::Codebook;
use crate::map::unmap_buffer;
use crate::mode::{EscapeMechanism, Preprocessing};
use crate::preprocess::{diff_inv_buffer, model_inv_buffer};
use crate::sample::Sample;

/// Decode one symbol under the zero-escape mechanism
///
/// The reserved symbol 0 announces that the (biased) value follows
/// unencoded in the field's native width.
fn decode_value_zero(
    reader: &mut BitReader<'_>,
    code: &Codebook,
    bit_len: u32,
) -> CodecResult<u32> {
    let symbol = code.decode(reader)?;
    if symbol == 0 {
        reader.read_bits(bit_len)
    } else {
        Ok(symbol)
    }
}

/// Decode one symbol under the multi-escape mechanism
///
/// Symbols at or above the spillover threshold tag the magnitude class of
/// the outlier; the difference to the threshold follows unencoded.
fn decode_value_multi(reader: &mut BitReader<'_>, code: &Codebook) -> CodecResult<u32> {
    let symbol = code.decode(reader)?;
    if symbol < code.spill {
        return Ok(symbol);
    }

    let offset = symbol - code.spill;
    if offset > 15 {
        return Err(CodecError::CorruptedBitstream);
    }
    let unencoded_data = reader.read_bits((offset + 1) * 2)?;
    Ok(code.spill.wrapping_add(unencoded_data))
}

/// Decompress a bitstream produced by [`icu_compress_data`]
///
/// `model` must hold the same initial model the compressor started from; it
/// is updated in place. `decompressed` must provide room for
/// `info.samples_used` samples.
///
/// Returns the number of samples written.
///
/// [`icu_compress_data`]: crate::icu_compress_data
pub fn decompress_data<S: Sample>(
    compressed: &[u32],
    mut model: Option<&mut [S]>,
    info: &CmpInfo,
    decompressed: &mut [S],
) -> CodecResult<usize> {
    let mode = info.cmp_mode_used;
    let desc = mode.descriptor();

    if desc.shape != S::SHAPE {
        log::error!("decompression mode {:?} does not fit the sample shape", mode);
        return Err(CodecError::UnsupportedMode);
    }

    let samples = info.samples_used as usize;
    if decompressed.len() < samples {
        return Err(CodecError::LengthMismatch {
            expected: samples,
            actual: decompressed.len(),
        });
    }
    let out = &mut decompressed[..samples];

    if matches!(desc.preprocessing, Preprocessing::Model) {
        match model.as_deref_mut() {
            None => {
                log::error!("no model buffer set for a model mode");
                return Err(CodecError::InvalidConfig { problems: 1 });
            }
            Some(model) if model.len() != samples => {
                return Err(CodecError::LengthMismatch {
                    expected: samples,
                    actual: model.len(),
                });
            }
            Some(_) => {}
        }
    }

    if samples == 0 {
        return Ok(0);
    }

    let mut reader = BitReader::new(compressed);

    if matches!(desc.preprocessing, Preprocessing::Raw) {
        for sample in out.iter_mut() {
            for (idx, field) in S::FIELDS.iter().enumerate() {
                sample.set(idx, reader.read_bits(field.bits)?);
            }
        }
        return Ok(samples);
    }

    if info.golomb_par_used == 0 {
        log::error!("golomb_par 0 in the compression information record");
        return Err(CodecError::InvalidConfig { problems: 1 });
    }

    let data_code = Codebook::new(info.golomb_par_used, info.spill_used);
    let flag_code = exposure_flags_codebook();

    for sample in out.iter_mut() {
        for (idx, field) in S::FIELDS.iter().enumerate() {
            let value = if field.exposure_flags {
                decode_value_multi(&mut reader, &flag_code)?
            } else {
                match desc.escape {
                    Some(EscapeMechanism::Zero) => {
                        decode_value_zero(&mut reader, &data_code, field.bits)?
                    }
                    Some(EscapeMechanism::Multi) => {
                        decode_value_multi(&mut reader, &data_code)?
                    }
                    None => return Err(CodecError::UnsupportedMode),
                }
            };
            sample.set(idx, value);
        }
    }

    unmap_buffer(out, mode.uses_zero_escape());

    match desc.preprocessing {
        Preprocessing::Diff => diff_inv_buffer(out, u32::from(info.round_used)),
        Preprocessing::Model => {
            // presence and length were checked before any decoding
            if let Some(model) = model.as_deref_mut() {
                model_inv_buffer(
                    out,
                    model,
                    u32::from(info.model_value_used),
                    u32::from(info.round_used),
                );
            }
        }
        Preprocessing::Raw => unreachable!("raw handled before symbol decoding"),
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::CmpMode;
    use crate::sample::SFx;

    fn info(mode: CmpMode, golomb_par: u32, spill: u32, samples: u32) -> CmpInfo {
        CmpInfo {
            cmp_mode_used: mode,
            golomb_par_used: golomb_par,
            spill_used: spill,
            samples_used: samples,
            ..CmpInfo::default()
        }
    }

    #[test]
    fn test_decode_diff_zero_stream() {
        // encodes [10, 12, 9, 9] with m = 4, spill 8
        let words = [0x0002_B344u32.to_be()];
        let info = info(CmpMode::DiffZero, 4, 8, 4);

        let mut out = [0u16; 4];
        let n = decompress_data(&words, None, &info, &mut out).unwrap();
        assert_eq!(n, 4);
        assert_eq!(out, [10, 12, 9, 9]);
    }

    #[test]
    fn test_decode_raw_stream() {
        let words = [0x0102_0304u32.to_be(), 0x0506_0000u32.to_be()];
        let info = info(CmpMode::Raw, 0, 0, 3);

        let mut out = [0u16; 3];
        decompress_data(&words, None, &info, &mut out).unwrap();
        assert_eq!(out, [0x0102, 0x0304, 0x0506]);
    }

    #[test]
    fn test_decode_model_multi_single_sample() {
        // residual 5 maps to 10, below spill 16: one Golomb codeword for
        // m = 3: "111010" padded into a word
        let words = [0b111010u32 << 26; 1].map(u32::to_be);
        let mut info = info(CmpMode::ModelMulti, 3, 16, 1);
        info.model_value_used = 8;

        let mut model = [95u16];
        let mut out = [0u16];
        decompress_data(&words, Some(&mut model), &info, &mut out).unwrap();

        assert_eq!(out, [100]);
        assert_eq!(model, [97]); // updated in place
    }

    #[test]
    fn test_zero_samples_decodes_nothing() {
        let words: [u32; 0] = [];
        let info = info(CmpMode::DiffZero, 4, 8, 0);

        let mut out = [0u16; 2];
        assert_eq!(decompress_data(&words, None, &info, &mut out).unwrap(), 0);
    }

    #[test]
    fn test_output_too_small() {
        let words = [0u32; 1];
        let info = info(CmpMode::DiffZero, 4, 8, 4);

        let mut out = [0u16; 2];
        assert_eq!(
            decompress_data(&words, None, &info, &mut out),
            Err(CodecError::LengthMismatch {
                expected: 4,
                actual: 2
            })
        );
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let words = [0u32; 1];
        let info = info(CmpMode::DiffZeroSFx, 4, 8, 1);

        let mut out = [0u16; 1];
        assert_eq!(
            decompress_data(&words, None, &info, &mut out),
            Err(CodecError::UnsupportedMode)
        );
    }

    #[test]
    fn test_missing_model_is_rejected() {
        let words = [0u32; 1];
        let mut info = info(CmpMode::ModelZero, 4, 8, 1);
        info.model_value_used = 8;

        let mut out = [0u16; 1];
        assert_eq!(
            decompress_data(&words, None, &info, &mut out),
            Err(CodecError::InvalidConfig { problems: 1 })
        );
    }

    #[test]
    fn test_truncated_stream_is_detected() {
        // a single all-ones word cannot terminate any Rice codeword
        let words = [0xFFFF_FFFFu32.to_be()];
        let info = info(CmpMode::DiffMulti, 4, 8, 4);

        let mut out = [0u16; 4];
        let err = decompress_data(&words, None, &info, &mut out).unwrap_err();
        assert!(matches!(
            err,
            CodecError::UnexpectedEndOfInput | CodecError::CorruptedBitstream
        ));
    }

    #[test]
    fn test_structured_decode_uses_flag_codebook() {
        // flags residual 0 ("0"), fx biased residual 1 with m = 16:
        // "0" + "00001" for one SFx sample under zero escape
        let words = [((0b0_00001u32) << 26).to_be()];
        let info = info(CmpMode::DiffZeroSFx, 16, 100, 1);

        let mut out = [SFx::default()];
        decompress_data(&words, None, &info, &mut out).unwrap();
        assert_eq!(out[0], SFx { exp_flags: 0, fx: 0 });
    }
}
