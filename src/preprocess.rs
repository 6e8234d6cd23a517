//! Pre-processing: lossy rounding, 1-D differencing and model prediction
//!
//! All transforms operate in place on the caller's sample buffer. Rounding
//! comes first (a plain right shift per field), then either differencing
//! against the previous sample or prediction against the model buffer.
//! Subtraction deliberately wraps in the field width; the mapper relies on
//! the two's-complement representation of the residual.
//!
//! Differencing walks the buffer tail to head so every sample still sees
//! the untransformed value of its predecessor. Model prediction walks head
//! to tail; the order does not matter for correctness there but is fixed
//! for determinism.

use crate::config::MAX_MODEL_VALUE;
use crate::sample::Sample;

/// Lossy rounding: drop the `round` least significant bits
#[inline]
pub fn round_fwd(value: u32, round: u32) -> u32 {
    value >> round
}

/// Undo the scaling of [`round_fwd`]; the dropped bits stay zero
#[inline]
pub fn round_inv(value: u32, round: u32) -> u32 {
    value << round
}

/// Weighted blend of an observation into the model
///
/// `model_value` weights the prior model against the observation on a scale
/// of 0 (ignore the model) to [`MAX_MODEL_VALUE`] (ignore the observation).
/// Division truncates; encoder and decoder apply the identical blend so
/// their models evolve in lockstep.
#[inline]
pub fn cal_up_model(data: u32, model: u32, model_value: u32) -> u32 {
    debug_assert!(model_value <= MAX_MODEL_VALUE);
    let weighted_model = u64::from(model) * u64::from(model_value);
    let weighted_data = u64::from(data) * u64::from(MAX_MODEL_VALUE - model_value);
    ((weighted_model + weighted_data) / u64::from(MAX_MODEL_VALUE)) as u32
}

/// Round every field of every sample in place
pub fn lossy_round_buffer<S: Sample>(data: &mut [S], round: u32) {
    if round == 0 {
        return;
    }
    for sample in data.iter_mut() {
        for idx in 0..S::FIELDS.len() {
            sample.set(idx, round_fwd(sample.get(idx), round));
        }
    }
}

/// Undo the scaling of [`lossy_round_buffer`] in place
pub fn lossy_round_inv_buffer<S: Sample>(data: &mut [S], round: u32) {
    if round == 0 {
        return;
    }
    for sample in data.iter_mut() {
        for idx in 0..S::FIELDS.len() {
            sample.set(idx, round_inv(sample.get(idx), round));
        }
    }
}

/// 1-D differencing pre-processing with rounding, in place
///
/// `r[0] = round(x[0])`, `r[i] = round(x[i]) - round(x[i-1])` with the
/// subtraction wrapping in the field width.
pub fn diff_buffer<S: Sample>(data: &mut [S], round: u32) {
    if data.is_empty() {
        return;
    }

    lossy_round_buffer(data, round);

    for i in (1..data.len()).rev() {
        let prev = data[i - 1];
        let cur = &mut data[i];
        for (idx, field) in S::FIELDS.iter().enumerate() {
            // possible underflow is intended
            let diff = cur.get(idx).wrapping_sub(prev.get(idx)) & field.mask();
            cur.set(idx, diff);
        }
    }
}

/// Invert [`diff_buffer`]: prefix-sum the residuals, then scale back
pub fn diff_inv_buffer<S: Sample>(data: &mut [S], round: u32) {
    if data.is_empty() {
        return;
    }

    for i in 1..data.len() {
        let prev = data[i - 1];
        let cur = &mut data[i];
        for (idx, field) in S::FIELDS.iter().enumerate() {
            let sum = cur.get(idx).wrapping_add(prev.get(idx)) & field.mask();
            cur.set(idx, sum);
        }
    }

    lossy_round_inv_buffer(data, round);
}

/// Model pre-processing with rounding, in place
///
/// Each field becomes the wrapping difference between the rounded
/// observation and the rounded model. The updated model is the
/// [`cal_up_model`] blend of the observation (rounded back, because the
/// decoder never sees the unrounded data) and the prior model, written to
/// `up_model` or back into `model` when no separate buffer is given.
pub fn model_buffer<S: Sample>(
    data: &mut [S],
    model: &mut [S],
    mut up_model: Option<&mut [S]>,
    model_value: u32,
    round: u32,
) {
    for i in 0..data.len() {
        let prior = model[i];
        let mut updated = prior;

        let sample = &mut data[i];
        for (idx, field) in S::FIELDS.iter().enumerate() {
            let round_input = round_fwd(sample.get(idx), round);
            let round_model = round_fwd(prior.get(idx), round);

            // possible underflow is intended
            sample.set(idx, round_input.wrapping_sub(round_model) & field.mask());

            updated.set(
                idx,
                cal_up_model(
                    round_inv(round_input, round) & field.mask(),
                    prior.get(idx),
                    model_value,
                ),
            );
        }

        match up_model.as_deref_mut() {
            Some(up) => up[i] = updated,
            None => model[i] = updated,
        }
    }
}

/// Invert the residual computation of [`model_buffer`]
///
/// Turns residuals back into the rounded-and-rescaled observations and
/// applies the identical model update, keeping the decoder's model aligned
/// with the encoder's.
pub fn model_inv_buffer<S: Sample>(
    data: &mut [S],
    model: &mut [S],
    model_value: u32,
    round: u32,
) {
    for i in 0..data.len() {
        let prior = model[i];
        let mut updated = prior;

        let sample = &mut data[i];
        for (idx, field) in S::FIELDS.iter().enumerate() {
            let round_model = round_fwd(prior.get(idx), round);
            let round_input = sample.get(idx).wrapping_add(round_model) & field.mask();
            let rescaled = round_inv(round_input, round) & field.mask();

            sample.set(idx, rescaled);
            updated.set(idx, cal_up_model(rescaled, prior.get(idx), model_value));
        }

        model[i] = updated;
    }
}
