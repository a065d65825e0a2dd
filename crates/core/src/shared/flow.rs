use thiserror::Error;

/// Why a fill did not produce a frame.
///
/// [`FlowError::Eos`] is the normal end of the stream, every other variant
/// is a fault that stops the pipeline.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowError {
    #[error("end of stream")]
    Eos,
    #[error("only NV12 is supported")]
    UnsupportedFormat,
    #[error("can't write to buffer")]
    BufferWriteFailed,
    #[error("caps have not been negotiated")]
    NotNegotiated,
    #[error("source is not started")]
    Flushing,
}

impl FlowError {
    pub fn is_eos(&self) -> bool {
        matches!(self, Self::Eos)
    }
}

/// Outcome of one fill: `Ok(())` means the buffer holds a complete frame.
pub type FlowResult = Result<(), FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_eos_is_eos() {
        assert!(FlowError::Eos.is_eos());
        assert!(!FlowError::UnsupportedFormat.is_eos());
        assert!(!FlowError::BufferWriteFailed.is_eos());
        assert!(!FlowError::NotNegotiated.is_eos());
        assert!(!FlowError::Flushing.is_eos());
    }

    #[test]
    fn test_messages() {
        assert_eq!(FlowError::BufferWriteFailed.to_string(), "can't write to buffer");
        assert_eq!(FlowError::UnsupportedFormat.to_string(), "only NV12 is supported");
    }
}
