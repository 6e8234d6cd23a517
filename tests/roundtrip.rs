//! End-to-end round-trip tests over the full mode matrix
//!
//! Every coded configuration must satisfy
//! `decompress(compress(x)) == round_inv(round_fwd(x))` element-wise, with
//! exact equality in lossless configurations. Inputs are drawn from a
//! seeded PRNG so failures reproduce.

use fluxcodec::golomb::max_spill;
use fluxcodec::{
    decompress_data, icu_compress_data, CmpCfg, CmpInfo, CmpMode, SFx, SFxEfx, SFxEfxNcobEcob,
    SFxNcob, Sample,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// The reconstruction the codec promises: every field rounded and scaled
/// back
fn expected_after_lossy<S: Sample>(data: &[S], round: u32) -> Vec<S> {
    data.iter()
        .map(|sample| {
            let mut out = *sample;
            for (idx, field) in S::FIELDS.iter().enumerate() {
                let rounded = (sample.get(idx) >> round) << round;
                out.set(idx, rounded & field.mask());
            }
            out
        })
        .collect()
}

fn roundtrip<S: Sample>(
    mode: CmpMode,
    golomb_par: u32,
    spill: u32,
    model_value: u32,
    round: u32,
    original: &[S],
    start_model: Option<&[S]>,
) {
    let samples = original.len();
    let mut input = original.to_vec();
    let mut enc_model = start_model.map(|m| m.to_vec());
    let mut updated_model = vec![S::default(); samples];
    // worst case: every field escapes (codeword + raw bits), plus slack
    let mut output = vec![0u32; samples * S::FIELDS.len() * 3 + 4];

    let mut cfg = CmpCfg::new(mode, &mut input, &mut output);
    cfg.golomb_par = golomb_par;
    cfg.spill = spill;
    cfg.model_value = model_value;
    cfg.round = round;
    cfg.model = enc_model.as_deref_mut();
    if mode.is_model() {
        cfg.updated_model = Some(&mut updated_model);
    }

    let mut info = CmpInfo::default();
    icu_compress_data(cfg, &mut info).unwrap_or_else(|e| {
        panic!("{:?} m={} spill={}: compression failed: {}", mode, golomb_par, spill, e)
    });

    let mut dec_model = start_model.map(|m| m.to_vec());
    let mut restored = vec![S::default(); samples];
    let n = decompress_data(&output, dec_model.as_deref_mut(), &info, &mut restored)
        .unwrap_or_else(|e| {
            panic!("{:?} m={} spill={}: decompression failed: {}", mode, golomb_par, spill, e)
        });

    assert_eq!(n, samples);
    assert_eq!(
        restored,
        expected_after_lossy(original, round),
        "{:?} m={} spill={} round={}",
        mode,
        golomb_par,
        spill,
        round
    );

    // encoder and decoder models must evolve in lockstep
    if mode.is_model() {
        assert_eq!(
            dec_model.as_deref(),
            Some(updated_model.as_slice()),
            "{:?}: model diverged",
            mode
        );
    }
}

/// (golomb_par, spill) pairs covering Rice, Golomb, and the spill extremes
fn param_grid() -> Vec<(u32, u32)> {
    let mut grid = vec![
        (1, 2),
        (1, 16),
        (2, 20),
        (3, 16),
        (4, 8),
        (5, 44),
        (8, 100),
        (16, 350),
        (21, 500),
    ];
    for m in [1u32, 3, 4, 16] {
        grid.push((m, max_spill(m)));
    }
    grid
}

fn u16_inputs(r: &mut ChaCha8Rng) -> Vec<Vec<u16>> {
    let smooth: Vec<u16> = (0..256)
        .scan(5000u16, |acc, _| {
            *acc = acc.wrapping_add(r.gen_range(0..8)).wrapping_sub(3);
            Some(*acc)
        })
        .collect();
    let noisy: Vec<u16> = (0..256).map(|_| r.gen()).collect();
    vec![
        smooth,
        noisy,
        vec![0u16; 32],
        vec![0xFFFF; 32],
        vec![0, 0xFFFF, 0, 0xFFFF, 0x8000, 0x7FFF],
        vec![42],
    ]
}

#[test]
fn roundtrip_u16_diff_modes() {
    let mut r = rng(0xF1);
    let inputs = u16_inputs(&mut r);

    for (m, spill) in param_grid() {
        for input in &inputs {
            for round in [0, 1, 3] {
                roundtrip::<u16>(CmpMode::DiffZero, m, spill, 0, round, input, None);
                roundtrip::<u16>(CmpMode::DiffMulti, m, spill, 0, round, input, None);
            }
        }
    }
}

#[test]
fn roundtrip_u16_model_modes() {
    let mut r = rng(0xF2);
    let inputs = u16_inputs(&mut r);

    for (m, spill) in param_grid() {
        for input in &inputs {
            let model: Vec<u16> = input
                .iter()
                .map(|&v| v.wrapping_add(r.gen_range(0..32)))
                .collect();
            for model_value in [0, 8, 16] {
                for round in [0, 2] {
                    roundtrip::<u16>(
                        CmpMode::ModelZero,
                        m,
                        spill,
                        model_value,
                        round,
                        input,
                        Some(&model),
                    );
                    roundtrip::<u16>(
                        CmpMode::ModelMulti,
                        m,
                        spill,
                        model_value,
                        round,
                        input,
                        Some(&model),
                    );
                }
            }
        }
    }
}

#[test]
fn roundtrip_u32_and_fast_flux_modes() {
    let mut r = rng(0xF3);
    let noisy: Vec<u32> = (0..128).map(|_| r.gen()).collect();
    let smooth: Vec<u32> = (0..128)
        .scan(1_000_000u32, |acc, _| {
            *acc = acc.wrapping_add(r.gen_range(0..64)).wrapping_sub(30);
            Some(*acc)
        })
        .collect();
    let edges = vec![0u32, u32::MAX, 0, u32::MAX, 0x8000_0000, 0x7FFF_FFFF];
    let model: Vec<u32> = smooth.iter().map(|&v| v.wrapping_add(17)).collect();

    for (m, spill) in [(4, 8), (3, 75), (16, 350), (1, 16)] {
        for input in [&noisy, &smooth, &edges] {
            roundtrip::<u32>(CmpMode::DiffZero32, m, spill, 0, 0, input, None);
            roundtrip::<u32>(CmpMode::DiffMulti32, m, spill, 0, 1, input, None);
            roundtrip::<u32>(CmpMode::DiffZeroFFx, m, spill, 0, 0, input, None);
            roundtrip::<u32>(CmpMode::DiffMultiFFx, m, spill, 0, 3, input, None);
        }
        roundtrip::<u32>(CmpMode::ModelZero32, m, spill, 12, 0, &smooth, Some(&model));
        roundtrip::<u32>(CmpMode::ModelMulti32, m, spill, 12, 0, &smooth, Some(&model));
        roundtrip::<u32>(CmpMode::ModelZeroFFx, m, spill, 4, 2, &smooth, Some(&model));
        roundtrip::<u32>(CmpMode::ModelMultiFFx, m, spill, 4, 0, &smooth, Some(&model));
    }
}

fn random_s_fx(r: &mut ChaCha8Rng) -> SFx {
    SFx {
        exp_flags: r.gen_range(0..4),
        fx: r.gen_range(0..2_000_000),
    }
}

#[test]
fn roundtrip_s_fx_modes() {
    let mut r = rng(0xF4);
    let input: Vec<SFx> = (0..96).map(|_| random_s_fx(&mut r)).collect();
    let model: Vec<SFx> = input
        .iter()
        .map(|s| SFx {
            exp_flags: s.exp_flags,
            fx: s.fx.wrapping_add(r.gen_range(0..64)),
        })
        .collect();

    for (m, spill) in [(4, 8), (3, 60), (7, 150), (1, 16)] {
        roundtrip::<SFx>(CmpMode::DiffZeroSFx, m, spill, 0, 0, &input, None);
        roundtrip::<SFx>(CmpMode::DiffMultiSFx, m, spill, 0, 0, &input, None);
        roundtrip::<SFx>(CmpMode::DiffZeroSFx, m, spill, 0, 2, &input, None);
        roundtrip::<SFx>(CmpMode::ModelZeroSFx, m, spill, 8, 0, &input, Some(&model));
        roundtrip::<SFx>(CmpMode::ModelMultiSFx, m, spill, 8, 1, &input, Some(&model));
    }
}

#[test]
fn roundtrip_s_fx_efx_modes() {
    let mut r = rng(0xF5);
    let input: Vec<SFxEfx> = (0..64)
        .map(|_| SFxEfx {
            exp_flags: r.gen_range(0..4),
            fx: r.gen_range(0..2_000_000),
            efx: r.gen_range(0..4_000_000),
        })
        .collect();
    let model: Vec<SFxEfx> = input
        .iter()
        .map(|s| SFxEfx {
            exp_flags: 0,
            fx: s.fx.wrapping_sub(r.gen_range(0..64)),
            efx: s.efx.wrapping_add(r.gen_range(0..64)),
        })
        .collect();

    for (m, spill) in [(4, 8), (5, 100)] {
        roundtrip::<SFxEfx>(CmpMode::DiffZeroSFxEfx, m, spill, 0, 0, &input, None);
        roundtrip::<SFxEfx>(CmpMode::DiffMultiSFxEfx, m, spill, 0, 1, &input, None);
        roundtrip::<SFxEfx>(CmpMode::ModelZeroSFxEfx, m, spill, 16, 0, &input, Some(&model));
        roundtrip::<SFxEfx>(CmpMode::ModelMultiSFxEfx, m, spill, 0, 0, &input, Some(&model));
    }
}

#[test]
fn roundtrip_s_fx_ncob_modes() {
    let mut r = rng(0xF6);
    let input: Vec<SFxNcob> = (0..64)
        .map(|_| SFxNcob {
            exp_flags: r.gen_range(0..4),
            fx: r.gen_range(0..2_000_000),
            ncob_x: r.gen_range(0..4096),
            ncob_y: r.gen_range(0..4096),
        })
        .collect();
    let model: Vec<SFxNcob> = input
        .iter()
        .map(|s| SFxNcob {
            exp_flags: s.exp_flags,
            fx: s.fx.wrapping_add(100),
            ncob_x: s.ncob_x,
            ncob_y: s.ncob_y.wrapping_sub(3),
        })
        .collect();

    for (m, spill) in [(4, 8), (3, 75)] {
        roundtrip::<SFxNcob>(CmpMode::DiffZeroSFxNcob, m, spill, 0, 0, &input, None);
        roundtrip::<SFxNcob>(CmpMode::DiffMultiSFxNcob, m, spill, 0, 0, &input, None);
        roundtrip::<SFxNcob>(CmpMode::ModelZeroSFxNcob, m, spill, 8, 0, &input, Some(&model));
        roundtrip::<SFxNcob>(CmpMode::ModelMultiSFxNcob, m, spill, 8, 3, &input, Some(&model));
    }
}

#[test]
fn roundtrip_full_record_modes() {
    let mut r = rng(0xF7);
    let input: Vec<SFxEfxNcobEcob> = (0..48)
        .map(|_| SFxEfxNcobEcob {
            exp_flags: r.gen_range(0..4),
            fx: r.gen(),
            ncob_x: r.gen_range(0..4096),
            ncob_y: r.gen_range(0..4096),
            efx: r.gen(),
            ecob_x: r.gen_range(0..8192),
            ecob_y: r.gen_range(0..8192),
        })
        .collect();
    let model: Vec<SFxEfxNcobEcob> = input
        .iter()
        .map(|s| SFxEfxNcobEcob {
            exp_flags: 0,
            fx: s.fx.wrapping_add(1),
            ncob_x: s.ncob_x,
            ncob_y: s.ncob_y,
            efx: s.efx.wrapping_sub(1),
            ecob_x: s.ecob_x,
            ecob_y: s.ecob_y,
        })
        .collect();

    for (m, spill) in [(4, 8), (6, 120)] {
        roundtrip::<SFxEfxNcobEcob>(
            CmpMode::DiffZeroSFxEfxNcobEcob,
            m,
            spill,
            0,
            0,
            &input,
            None,
        );
        roundtrip::<SFxEfxNcobEcob>(
            CmpMode::DiffMultiSFxEfxNcobEcob,
            m,
            spill,
            0,
            2,
            &input,
            None,
        );
        roundtrip::<SFxEfxNcobEcob>(
            CmpMode::ModelZeroSFxEfxNcobEcob,
            m,
            spill,
            8,
            0,
            &input,
            Some(&model),
        );
        roundtrip::<SFxEfxNcobEcob>(
            CmpMode::ModelMultiSFxEfxNcobEcob,
            m,
            spill,
            8,
            0,
            &input,
            Some(&model),
        );
    }
}

#[test]
fn roundtrip_raw_modes() {
    let mut r = rng(0xF8);
    let input: Vec<u16> = (0..64).map(|_| r.gen()).collect();
    roundtrip::<u16>(CmpMode::Raw, 1, 2, 0, 0, &input, None);

    let input: Vec<SFx> = (0..64).map(|_| random_s_fx(&mut r)).collect();
    roundtrip::<SFx>(CmpMode::RawSFx, 1, 2, 0, 0, &input, None);
}

#[test]
fn compressed_size_stays_within_the_chunk_bound() {
    // the bound covers the raw fallback of the container: a compressible
    // payload plus the per-collection overhead always fits
    let mut r = rng(0xF9);
    let input: Vec<u16> = (0..200).map(|_| r.gen_range(0..16)).collect();

    let mut work = input.clone();
    let mut output = vec![0u32; 256];
    let mut cfg = CmpCfg::new(CmpMode::DiffMulti, &mut work, &mut output);
    cfg.golomb_par = 4;
    cfg.spill = 16;
    let mut info = CmpInfo::default();
    icu_compress_data(cfg, &mut info).unwrap();

    let payload_bytes = (info.cmp_size as usize).div_ceil(32) * 4;

    // wrap the samples in a single collection
    let data_bytes = input.len() * 2;
    let mut chunk = vec![0u8; 12 + data_bytes];
    chunk[10..12].copy_from_slice(&(data_bytes as u16).to_be_bytes());
    let bound = fluxcodec::compress_chunk_cmp_size_bound(&chunk);

    assert_ne!(bound, 0);
    assert!(payload_bytes as u32 <= bound);
}

#[test]
fn decompression_does_not_read_past_the_reported_stream() {
    // decoding must consume at most ceil(cmp_size / 32) words
    let mut r = rng(0xFA);
    let original: Vec<u16> = (0..100).map(|_| r.gen_range(0..64)).collect();

    let mut input = original.clone();
    let mut output = vec![0u32; 128];
    let mut cfg = CmpCfg::new(CmpMode::DiffZero, &mut input, &mut output);
    cfg.golomb_par = 4;
    cfg.spill = 16;
    let mut info = CmpInfo::default();
    icu_compress_data(cfg, &mut info).unwrap();

    let words_used = (info.cmp_size as usize).div_ceil(32);
    let mut restored = vec![0u16; 100];
    decompress_data(&output[..words_used], None, &info, &mut restored).unwrap();
    assert_eq!(restored, original);
}
