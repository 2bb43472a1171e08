//! Prediction pipeline state machine.

use crate::error::Error;

/// Why a prediction attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The image could not be decoded or resized.
    ImageProcessing,
    /// The classifier could not be loaded.
    ModelUnavailable,
    /// The classifier failed while running.
    Inference,
    /// The classifier returned no labels.
    NoPrediction,
}

impl From<&Error> for FailureReason {
    fn from(error: &Error) -> Self {
        match error {
            Error::ImageProcessing { .. } => Self::ImageProcessing,
            Error::ModelUnavailable { .. } => Self::ModelUnavailable,
            Error::NoPrediction => Self::NoPrediction,
            _ => Self::Inference,
        }
    }
}

/// Pipeline phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Nothing selected yet.
    #[default]
    Idle,
    /// An image was chosen.
    ImageSelected,
    /// The image is being decoded and resized.
    Normalizing,
    /// The classifier is running.
    Classifying,
    /// A prediction was recorded.
    Done,
    /// The last attempt failed.
    Failed(FailureReason),
}

/// Inputs that move the pipeline between phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    /// The user picked an image.
    SelectImage,
    /// Processing starts automatically after a selection.
    Start,
    /// Normalization finished.
    Normalized,
    /// A prediction was built and recorded.
    Classified,
    /// The attempt failed.
    Fail(FailureReason),
}

impl Phase {
    /// Next phase for `event`, or `None` if the event is not valid here.
    ///
    /// A selection is accepted in every phase so a new image can replace one
    /// still being processed.
    pub fn next(self, event: PhaseEvent) -> Option<Self> {
        match (self, event) {
            (_, PhaseEvent::SelectImage) => Some(Self::ImageSelected),
            (Self::ImageSelected, PhaseEvent::Start) => Some(Self::Normalizing),
            (Self::Normalizing, PhaseEvent::Normalized) => Some(Self::Classifying),
            (Self::Normalizing, PhaseEvent::Fail(FailureReason::ImageProcessing)) => {
                Some(Self::Failed(FailureReason::ImageProcessing))
            }
            (Self::Classifying, PhaseEvent::Classified) => Some(Self::Done),
            (Self::Classifying, PhaseEvent::Fail(reason))
                if reason != FailureReason::ImageProcessing =>
            {
                Some(Self::Failed(reason))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ImageSelected => write!(f, "image selected"),
            Self::Normalizing => write!(f, "normalizing"),
            Self::Classifying => write!(f, "classifying"),
            Self::Done => write!(f, "done"),
            Self::Failed(reason) => write!(f, "failed ({reason:?})"),
        }
    }
}
