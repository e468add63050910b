use crate::{geometry, KMeans, Primitive};

/// Place **k** centroids evenly spaced on the diagonal of the dataset's bounding box, from its
/// minimum corner (centroid `0`) to its maximum corner (centroid `k - 1`).
/// With `k == 1`, the single centroid is the minimum corner.
///
/// Centroid `i` is `(1 - t) * min + t * max` with `t = i / (k - 1)`, so both corners are hit
/// exactly and no intermediate value exceeds the box, even if `max - min` is not representable.
///
/// Returns the centroids [row-major].
pub(crate) fn calculate<T: Primitive>(kmean: &KMeans<T>, k: usize) -> Vec<T> {
    let (min, max) = geometry::bounding_box(&kmean.samples, kmean.sample_dims);
    if k <= 1 {
        return min;
    }
    let partitions = T::from_count(k - 1);
    (0..k)
        .flat_map(|i| {
            let t = T::from_count(i) / partitions;
            geometry::scaled_sum(&min, &max, T::one() - t, t)
        })
        .collect()
}
