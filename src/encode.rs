//! Entropy encoding stage
//!
//! Walks the mapped sample buffer in index order, emitting one codeword per
//! field. Values below the spillover threshold get a direct Rice/Golomb
//! codeword; outliers take the escape path of the active mechanism:
//!
//! * **zero escape**: the codeword of the reserved symbol 0, followed by
//!   the value itself in the field's native width;
//! * **multi escape**: the codeword of `spill + offset` where `offset`
//!   tags the magnitude class of `d = value - spill`, followed by `d` in
//!   `(offset + 1) * 2` bits.
//!
//! Structured shapes interleave two codebooks over the same bit cursor: the
//! configured one for the data fields and the fixed exposure-flags codebook
//! (see [`GOLOMB_PAR_EXPOSURE_FLAGS`]) for the flags field, which always
//! escapes through the multi mechanism so that a flags codeword can never
//! outgrow the 32-bit budget.
//!
//! After the last record the stream is padded with zeros to a word boundary
//! and every completed word is converted to big-endian byte order.

use crate::bitstream::BitWriter;
use crate::config::{CmpCfg, CmpInfo, GOLOMB_PAR_EXPOSURE_FLAGS};
use crate::error::{CodecError, CodecResult, ErrorFlags};
use crate::golomb::{max_spill, multi_escape_offset, Codebook};
use crate::mode::EscapeMechanism;
use crate::sample::{FieldDesc, Sample};

/// Per-call encoder state: the two codebooks and the shared bit cursor
pub(crate) struct Encoder<'w, 'b> {
    writer: &'w mut BitWriter<'b>,
    data_code: Codebook,
    flag_code: Codebook,
    escape: Option<EscapeMechanism>,
}

/// Codebook for the exposure-flags field, fixed across all configurations
pub(crate) fn exposure_flags_codebook() -> Codebook {
    Codebook::new(
        GOLOMB_PAR_EXPOSURE_FLAGS,
        max_spill(GOLOMB_PAR_EXPOSURE_FLAGS),
    )
}

impl<'w, 'b> Encoder<'w, 'b> {
    pub(crate) fn new(
        writer: &'w mut BitWriter<'b>,
        data_code: Codebook,
        escape: Option<EscapeMechanism>,
    ) -> Self {
        Self {
            writer,
            data_code,
            flag_code: exposure_flags_codebook(),
            escape,
        }
    }

    fn encode_normal(&mut self, value: u32, code: &Codebook) -> CodecResult<()> {
        let (cw, len) = code.codeword(value)?;
        self.writer.write_bits(cw, len)
    }

    fn encode_outlier_zero(&mut self, value: u32, bit_len: u32) -> CodecResult<()> {
        // the escape symbol, then the data unencoded
        let code = self.data_code;
        self.encode_normal(0, &code)?;
        self.writer.write_bits(value, bit_len)
    }

    fn encode_outlier_multi(&mut self, value: u32, code: &Codebook) -> CodecResult<()> {
        let unencoded_data = value - code.spill;
        let offset = multi_escape_offset(unencoded_data);
        self.encode_normal(code.spill + offset, code)?;
        self.writer.write_bits(unencoded_data, (offset + 1) * 2)
    }

    /// Encode one field value, routing outliers through the escape path
    pub(crate) fn encode_value(&mut self, value: u32, field: &FieldDesc) -> CodecResult<()> {
        if field.exposure_flags {
            // flags always use the fixed side codebook with multi escape
            let code = self.flag_code;
            if value >= code.spill {
                return self.encode_outlier_multi(value, &code);
            }
            return self.encode_normal(value, &code);
        }

        let code = self.data_code;
        let zero_escape = matches!(self.escape, Some(EscapeMechanism::Zero));

        // 0 is an outlier under the zero-escape mechanism: the +1 bias of
        // the mapper can wrap the largest mapped value to 0
        if value >= code.spill || (zero_escape && value == 0) {
            match self.escape {
                Some(EscapeMechanism::Zero) => self.encode_outlier_zero(value, field.bits),
                Some(EscapeMechanism::Multi) => self.encode_outlier_multi(value, &code),
                None => {
                    log::error!("outlier value in a mode without an escape mechanism");
                    Err(CodecError::UnsupportedMode)
                }
            }
        } else {
            self.encode_normal(value, &code)
        }
    }
}

/// Encode the pre-processed, mapped sample buffer into the output words
///
/// Writes `info.cmp_size` (in bits, excluding tail padding) on success. On
/// a capacity failure the small-buffer error bit is set, `cmp_size` is
/// cleared and the output buffer contents are unspecified.
pub(crate) fn encode_data<S: Sample>(
    cfg: &mut CmpCfg<'_, S>,
    info: &mut CmpInfo,
) -> CodecResult<()> {
    let result = if cfg.mode.is_raw() {
        encode_raw(cfg, info)
    } else {
        encode_coded(cfg, info)
    };

    if let Err(CodecError::SmallBuffer { .. }) = result {
        info.cmp_err |= ErrorFlags::SMALL_BUFFER;
        info.cmp_size = 0;
    }
    result
}

fn encode_coded<S: Sample>(cfg: &mut CmpCfg<'_, S>, info: &mut CmpInfo) -> CodecResult<()> {
    let data_code = Codebook::new(cfg.golomb_par, cfg.spill);
    let escape = cfg.mode.descriptor().escape;

    let mut writer = BitWriter::new(cfg.output, cfg.buffer_length as usize);
    let mut enc = Encoder::new(&mut writer, data_code, escape);

    for sample in cfg.input.iter() {
        for (idx, field) in S::FIELDS.iter().enumerate() {
            enc.encode_value(sample.get(idx), field)?;
        }
    }

    info.cmp_size = writer.bit_position();

    writer.pad_to_word_boundary()?;
    writer.convert_to_big_endian();
    Ok(())
}

/// Raw mode: emit every field big-endian at its native width, no coding
fn encode_raw<S: Sample>(cfg: &mut CmpCfg<'_, S>, info: &mut CmpInfo) -> CodecResult<()> {
    let mut writer = BitWriter::new(cfg.output, cfg.buffer_length as usize);

    for sample in cfg.input.iter() {
        for (idx, field) in S::FIELDS.iter().enumerate() {
            writer.write_bits(sample.get(idx), field.bits)?;
        }
    }

    info.cmp_size = writer.bit_position();

    writer.pad_to_word_boundary()?;
    writer.convert_to_big_endian();
    Ok(())
}
