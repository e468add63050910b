use thiserror::Error;

/// Errors reported while setting up a k-means calculation.
///
/// All variants describe an invalid argument. They are raised before any calculation
/// starts, so no partially constructed [`crate::KMeans`] or [`crate::Lloyd`] is ever
/// handed out. Once constructed, a calculation itself cannot fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KMeansError {
    #[error("invalid argument: the dataset does not contain any samples")]
    EmptyDataset,
    #[error("invalid argument: samples need at least one dimension")]
    ZeroDimensions,
    #[error("invalid argument: got {len} values, but {sample_cnt} samples with {sample_dims} dimensions need {}", .sample_cnt * .sample_dims)]
    SampleCountMismatch { len: usize, sample_cnt: usize, sample_dims: usize },
    #[error("invalid argument: sample {sample} has {actual} dimensions, expected {expected}")]
    DimensionMismatch { sample: usize, expected: usize, actual: usize },
    #[error("invalid argument: k = {k} is outside of [1, {sample_cnt}]")]
    InvalidClusterCount { k: usize, sample_cnt: usize },
    #[error("invalid argument: max_iter must be at least 1")]
    InvalidMaxIterations,
}

/// Convenient alias for results produced by this crate.
pub type Result<T> = std::result::Result<T, KMeansError>;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        assert_eq!(
            KMeansError::InvalidClusterCount { k: 5, sample_cnt: 4 }.to_string(),
            "invalid argument: k = 5 is outside of [1, 4]"
        );
        assert_eq!(
            KMeansError::SampleCountMismatch { len: 5, sample_cnt: 3, sample_dims: 2 }.to_string(),
            "invalid argument: got 5 values, but 3 samples with 2 dimensions need 6"
        );
        assert_eq!(
            KMeansError::DimensionMismatch { sample: 2, expected: 3, actual: 1 }.to_string(),
            "invalid argument: sample 2 has 1 dimensions, expected 3"
        );
    }
}
