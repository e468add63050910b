//! Componentwise vector arithmetic on plain slices.
//!
//! Samples and centroids are stored row-major in flat buffers, so every function here
//! operates on `&[T]` rows (or a whole row-major buffer plus its dimensionality).

use crate::Primitive;

/// Componentwise `a * x + b * y`.
///
/// ## Arguments
/// - **x**, **y**: Vectors of equal length
/// - **a**, **b**: Scalars applied to **x** and **y** respectively
pub fn scaled_sum<T: Primitive>(x: &[T], y: &[T], a: T, b: T) -> Vec<T> {
    debug_assert_eq!(x.len(), y.len());
    x.iter().cloned().zip(y.iter().cloned())
        .map(|(xv, yv)| a * xv + b * yv)
        .collect()
}

/// Componentwise minimum and maximum over all samples of a row-major buffer, in a single pass.
///
/// Returns two empty vectors for an empty buffer.
///
/// ## Panics
/// If `sample_dims` is 0.
pub fn bounding_box<T: Primitive>(samples: &[T], sample_dims: usize) -> (Vec<T>, Vec<T>) {
    let mut rows = samples.chunks_exact(sample_dims);
    let (mut min, mut max) = match rows.next() {
        Some(first) => (first.to_vec(), first.to_vec()),
        None => return (Vec::new(), Vec::new()),
    };
    rows.for_each(|s| {
        min.iter_mut().zip(max.iter_mut()).zip(s.iter().cloned())
            .for_each(|((lo, hi), v)| {
                if v < *lo { *lo = v; }
                if v > *hi { *hi = v; }
            });
    });
    (min, max)
}

/// Squared euclidean distance between two vectors of equal length.
#[inline(always)]
pub fn squared_distance<T: Primitive>(x: &[T], y: &[T]) -> T {
    debug_assert_eq!(x.len(), y.len());
    x.iter().cloned().zip(y.iter().cloned())
        .map(|(xv, yv)| xv - yv)           // <sample> - <centroid>
        .map(|v| v * v)                    // <vec_components> ^2
        .fold(T::zero(), |acc, v| acc + v) // sum(<vec_components>^2)
}

/// Index of, and squared distance to, the centroid nearest to **sample**.
/// Exact ties resolve to the lowest centroid index.
///
/// ## Arguments
/// - **sample**: The sample to locate
/// - **centroids**: Row-major centroid buffer, rows of `sample.len()` values
#[inline(always)]
pub(crate) fn nearest_centroid<T: Primitive>(sample: &[T], centroids: &[T]) -> (usize, T) {
    centroids.chunks_exact(sample.len())
        .map(|c| squared_distance(sample, c))
        .enumerate()
        .fold((0, T::infinity()), |(best_idx, best_dist), (idx, dist)| {
            if dist < best_dist { (idx, dist) } else { (best_idx, best_dist) }
        })
}
