//! Compression modes and the stage dispatcher
//!
//! A [`CmpMode`] bundles three independent choices: the sample shape the
//! buffers must carry, the pre-processing strategy (raw pass-through, 1-D
//! differencing, or model prediction) and the escape mechanism used by the
//! entropy coder for outliers. Rather than switching on the full mode in
//! every stage, each stage asks the mode for the relevant component of its
//! [`descriptor`](CmpMode::descriptor).

use crate::sample::SampleShape;

/// Pre-processing strategy selected by a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preprocessing {
    /// No transform; samples are copied to the output verbatim
    Raw,
    /// 1-D differencing against the previous sample
    Diff,
    /// Prediction against a caller-provided model buffer
    Model,
}

/// Outlier escape mechanism selected by a mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeMechanism {
    /// Symbol 0 is reserved as the escape marker; mapped data fields are
    /// biased by +1 to free it
    Zero,
    /// The symbols at and above the spillover threshold are escape markers
    /// tagged by the magnitude class of the outlier
    Multi,
}

/// Decomposition of a mode into its three orthogonal components
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDescriptor {
    /// Sample shape the caller's buffers must carry
    pub shape: SampleShape,
    /// Pre-processing strategy
    pub preprocessing: Preprocessing,
    /// Escape mechanism; `None` in raw modes, which never escape
    pub escape: Option<EscapeMechanism>,
}

/// Compression mode parameter
///
/// Closed set covering the imagette scalars and the structured
/// science-product records. The fast-cadence flux variants (`*FFx`) share
/// the `u32` buffer shape; they exist as distinct modes because the ground
/// segment configures them independently.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CmpMode {
    #[default]
    Raw,
    RawSFx,

    ModelZero,
    ModelMulti,
    DiffZero,
    DiffMulti,

    ModelZeroSFx,
    ModelMultiSFx,
    DiffZeroSFx,
    DiffMultiSFx,

    ModelZeroSFxEfx,
    ModelMultiSFxEfx,
    DiffZeroSFxEfx,
    DiffMultiSFxEfx,

    ModelZeroSFxNcob,
    ModelMultiSFxNcob,
    DiffZeroSFxNcob,
    DiffMultiSFxNcob,

    ModelZeroSFxEfxNcobEcob,
    ModelMultiSFxEfxNcobEcob,
    DiffZeroSFxEfxNcobEcob,
    DiffMultiSFxEfxNcobEcob,

    ModelZero32,
    ModelMulti32,
    DiffZero32,
    DiffMulti32,

    ModelZeroFFx,
    ModelMultiFFx,
    DiffZeroFFx,
    DiffMultiFFx,
}

impl CmpMode {
    /// Full descriptor: shape, pre-processing and escape mechanism
    pub const fn descriptor(self) -> ModeDescriptor {
        use CmpMode::*;
        use EscapeMechanism as Esc;
        use Preprocessing as Pre;
        use SampleShape as Sh;

        let (shape, preprocessing, escape) = match self {
            Raw => (Sh::U16, Pre::Raw, None),
            RawSFx => (Sh::SFx, Pre::Raw, None),

            ModelZero => (Sh::U16, Pre::Model, Some(Esc::Zero)),
            ModelMulti => (Sh::U16, Pre::Model, Some(Esc::Multi)),
            DiffZero => (Sh::U16, Pre::Diff, Some(Esc::Zero)),
            DiffMulti => (Sh::U16, Pre::Diff, Some(Esc::Multi)),

            ModelZeroSFx => (Sh::SFx, Pre::Model, Some(Esc::Zero)),
            ModelMultiSFx => (Sh::SFx, Pre::Model, Some(Esc::Multi)),
            DiffZeroSFx => (Sh::SFx, Pre::Diff, Some(Esc::Zero)),
            DiffMultiSFx => (Sh::SFx, Pre::Diff, Some(Esc::Multi)),

            ModelZeroSFxEfx => (Sh::SFxEfx, Pre::Model, Some(Esc::Zero)),
            ModelMultiSFxEfx => (Sh::SFxEfx, Pre::Model, Some(Esc::Multi)),
            DiffZeroSFxEfx => (Sh::SFxEfx, Pre::Diff, Some(Esc::Zero)),
            DiffMultiSFxEfx => (Sh::SFxEfx, Pre::Diff, Some(Esc::Multi)),

            ModelZeroSFxNcob => (Sh::SFxNcob, Pre::Model, Some(Esc::Zero)),
            ModelMultiSFxNcob => (Sh::SFxNcob, Pre::Model, Some(Esc::Multi)),
            DiffZeroSFxNcob => (Sh::SFxNcob, Pre::Diff, Some(Esc::Zero)),
            DiffMultiSFxNcob => (Sh::SFxNcob, Pre::Diff, Some(Esc::Multi)),

            ModelZeroSFxEfxNcobEcob => (Sh::SFxEfxNcobEcob, Pre::Model, Some(Esc::Zero)),
            ModelMultiSFxEfxNcobEcob => (Sh::SFxEfxNcobEcob, Pre::Model, Some(Esc::Multi)),
            DiffZeroSFxEfxNcobEcob => (Sh::SFxEfxNcobEcob, Pre::Diff, Some(Esc::Zero)),
            DiffMultiSFxEfxNcobEcob => (Sh::SFxEfxNcobEcob, Pre::Diff, Some(Esc::Multi)),

            ModelZero32 => (Sh::U32, Pre::Model, Some(Esc::Zero)),
            ModelMulti32 => (Sh::U32, Pre::Model, Some(Esc::Multi)),
            DiffZero32 => (Sh::U32, Pre::Diff, Some(Esc::Zero)),
            DiffMulti32 => (Sh::U32, Pre::Diff, Some(Esc::Multi)),

            ModelZeroFFx => (Sh::U32, Pre::Model, Some(Esc::Zero)),
            ModelMultiFFx => (Sh::U32, Pre::Model, Some(Esc::Multi)),
            DiffZeroFFx => (Sh::U32, Pre::Diff, Some(Esc::Zero)),
            DiffMultiFFx => (Sh::U32, Pre::Diff, Some(Esc::Multi)),
        };

        ModeDescriptor {
            shape,
            preprocessing,
            escape,
        }
    }

    /// Sample shape the buffers must carry
    pub const fn shape(self) -> SampleShape {
        self.descriptor().shape
    }

    /// True for the raw pass-through modes
    pub const fn is_raw(self) -> bool {
        matches!(self.descriptor().preprocessing, Preprocessing::Raw)
    }

    /// True for the 1-D differencing modes
    pub const fn is_diff(self) -> bool {
        matches!(self.descriptor().preprocessing, Preprocessing::Diff)
    }

    /// True for the model prediction modes, which require a model buffer
    pub const fn is_model(self) -> bool {
        matches!(self.descriptor().preprocessing, Preprocessing::Model)
    }

    /// True when the zero-escape mechanism is active
    pub const fn uses_zero_escape(self) -> bool {
        matches!(self.descriptor().escape, Some(EscapeMechanism::Zero))
    }

    /// True when the multi-escape mechanism is active
    pub const fn uses_multi_escape(self) -> bool {
        matches!(self.descriptor().escape, Some(EscapeMechanism::Multi))
    }
}

/// All modes, in a fixed order; used by the validator tests and the
/// round-trip test matrix
pub const ALL_MODES: [CmpMode; 30] = [
    CmpMode::Raw,
    CmpMode::RawSFx,
    CmpMode::ModelZero,
    CmpMode::ModelMulti,
    CmpMode::DiffZero,
    CmpMode::DiffMulti,
    CmpMode::ModelZeroSFx,
    CmpMode::ModelMultiSFx,
    CmpMode::DiffZeroSFx,
    CmpMode::DiffMultiSFx,
    CmpMode::ModelZeroSFxEfx,
    CmpMode::ModelMultiSFxEfx,
    CmpMode::DiffZeroSFxEfx,
    CmpMode::DiffMultiSFxEfx,
    CmpMode::ModelZeroSFxNcob,
    CmpMode::ModelMultiSFxNcob,
    CmpMode::DiffZeroSFxNcob,
    CmpMode::DiffMultiSFxNcob,
    CmpMode::ModelZeroSFxEfxNcobEcob,
    CmpMode::ModelMultiSFxEfxNcobEcob,
    CmpMode::DiffZeroSFxEfxNcobEcob,
    CmpMode::DiffMultiSFxEfxNcobEcob,
    CmpMode::ModelZero32,
    CmpMode::ModelMulti32,
    CmpMode::DiffZero32,
    CmpMode::DiffMulti32,
    CmpMode::ModelZeroFFx,
    CmpMode::ModelMultiFFx,
    CmpMode::DiffZeroFFx,
    CmpMode::DiffMultiFFx,
];
