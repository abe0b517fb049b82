//! Utility types for trait definitions.
use std::fmt;

/// Type to handle tree and FMM related errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FmmError {
    /// Failure to run some business logic
    Failed(String),

    /// Unimplemented section
    Unimplemented(String),

    /// Tree construction still had nodes to refine past the deepest level a tag can encode.
    DepthExceeded {
        /// The deepest level supported for this dimension.
        max_level: usize,
    },

    /// A vector was supplied whose length does not match the particle count.
    LengthMismatch {
        /// Length required.
        expected: usize,
        /// Length supplied.
        found: usize,
    },

    /// A particle lies outside the domain of the tree.
    OutOfDomain {
        /// Index of the offending particle in the container.
        index: usize,
    },
}

impl std::fmt::Display for FmmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FmmError::Failed(e) => write!(f, "Failed: {}", e),
            FmmError::Unimplemented(e) => write!(f, "Unimplemented: {}", e),
            FmmError::DepthExceeded { max_level } => {
                write!(f, "Tree has exceeded the maximum level {}", max_level)
            }
            FmmError::LengthMismatch { expected, found } => write!(
                f,
                "Length mismatch: expected {} values, found {}",
                expected, found
            ),
            FmmError::OutOfDomain { index } => {
                write!(f, "Particle {} is not in the domain", index)
            }
        }
    }
}

impl std::error::Error for FmmError {}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_display() {
        let err = FmmError::LengthMismatch {
            expected: 10,
            found: 9,
        };
        assert_eq!(
            err.to_string(),
            "Length mismatch: expected 10 values, found 9"
        );

        let err = FmmError::DepthExceeded { max_level: 19 };
        assert_eq!(err.to_string(), "Tree has exceeded the maximum level 19");
    }
}
