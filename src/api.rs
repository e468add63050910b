use crate::{errors::*, geometry, Primitive};
use rayon::prelude::*;

pub type InitDoneCallbackFn<'a, T> = &'a dyn Fn(&KMeansState<T>);
pub type IterationDoneCallbackFn<'a, T> = &'a dyn Fn(&KMeansState<T>, usize);

/// This is a structure holding the configuration options for a k-means calculation. Currently,
/// these are a couple of observer callbacks, that can be set to get status information from
/// a running k-means calculation. The callbacks only get read access to the calculation's state.
///
/// For a more detailed information about all possible options, have a look at [`KMeansConfigBuilder`].
#[derive(Clone, Copy)]
pub struct KMeansConfig<'a, T: Primitive> {
    /// Callback that is called, when the initialization phase finished
    /// ## Arguments
    /// - **state**: Current [`KMeansState`] after the initialization
    pub(crate) init_done: InitDoneCallbackFn<'a, T>,
    /// Callback that is called after each iteration
    /// ## Arguments
    /// - **state**: Current [`KMeansState`] after the iteration
    /// - **iteration_id**: Number of the current iteration (starting at 1)
    pub(crate) iteration_done: IterationDoneCallbackFn<'a, T>,
}
impl<'a, T: Primitive> Default for KMeansConfig<'a, T> {
    fn default() -> Self {
        Self {
            init_done: &|_| {},
            iteration_done: &|_, _| {},
        }
    }
}
impl<'a, T: Primitive> KMeansConfig<'a, T> {
    /// Use the [`KMeansConfigBuilder`] to build a [`KMeansConfig`] instance.
    pub fn build() -> KMeansConfigBuilder<'a, T> {
        KMeansConfigBuilder { config: KMeansConfig::default() }
    }
}
impl<'a, T: Primitive> std::fmt::Debug for KMeansConfig<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KMeansConfig").finish_non_exhaustive()
    }
}

pub struct KMeansConfigBuilder<'a, T: Primitive> {
    config: KMeansConfig<'a, T>,
}
impl<'a, T: Primitive> KMeansConfigBuilder<'a, T> {
    /// Set the callback that should be called after the centroid initialization, before the iteration starts.
    pub fn init_done(mut self, init_done: InitDoneCallbackFn<'a, T>) -> Self {
        self.config.init_done = init_done; self
    }
    /// Set the callback that should be called after each iteration during a running k-means calculation.
    pub fn iteration_done(mut self, iteration_done: IterationDoneCallbackFn<'a, T>) -> Self {
        self.config.iteration_done = iteration_done; self
    }
    /// Return the internally built configuration structure.
    pub fn build(self) -> KMeansConfig<'a, T> { self.config }
}


/// Lifecycle of a k-means calculation.
///
/// `Initialized -> Running -> {Converged, Exhausted}`, where the last two are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KMeansStatus {
    /// Centroids were initialized, no assignment has been calculated yet
    Initialized,
    /// At least one iteration ran, and the assignment has not yet stabilized
    Running,
    /// Two consecutive iterations produced the same assignment
    Converged,
    /// The iteration limit was reached before the assignment stabilized
    Exhausted,
}
impl KMeansStatus {
    /// Whether no further iteration will be carried out in this status.
    pub fn is_terminal(self) -> bool {
        matches!(self, KMeansStatus::Converged | KMeansStatus::Exhausted)
    }
}


/// This is the data-structure storing the current state during calculation, as
/// well as the final result, as returned by the API.
/// All mutations are done in this structure, making [`KMeans`] immutable, and therefore allowing
/// it to be used by multiple calculations at once, without having to duplicate the input-data.
///
/// ## Generics
/// - **T**: Underlying primitive type that was used for the calculation
///
/// ## Fields
/// - **k**: The amount of clusters that were requested when calculating this k-means result
/// - **sample_dims**: Amount of dimensions of each sample and centroid
/// - **distsum**: The total sum of (squared) distances from all samples to their respective centroids,
///   as of the last assignment (infinity before the first one)
/// - **centroids**: Calculated cluster centers [row-major] = [<centroid0>,<centroid1>,<centroid2>,...]
/// - **centroid_frequency**: Amount of samples in each centroid
/// - **assignments**: Vector mapping each sample to its respective nearest cluster (empty before the first iteration)
/// - **centroid_distances**: Vector containing each sample's (squared) distance to its centroid
/// - **iterations**: Amount of completed iterations
/// - **status**: Where in its lifecycle the calculation currently is
#[derive(Clone, Debug)]
pub struct KMeansState<T: Primitive> {
    pub k: usize,
    pub sample_dims: usize,
    pub distsum: T,
    pub centroids: Vec<T>,
    pub centroid_frequency: Vec<usize>,
    pub assignments: Vec<usize>,
    pub centroid_distances: Vec<T>,
    pub iterations: usize,
    pub status: KMeansStatus,
}
impl<T: Primitive> KMeansState<T> {
    pub(crate) fn new(sample_dims: usize, k: usize, centroids: Vec<T>) -> Self {
        debug_assert_eq!(centroids.len(), sample_dims * k);
        Self {
            k,
            sample_dims,
            distsum: T::infinity(),
            centroids,
            centroid_frequency: vec![0usize; k],
            assignments: Vec::new(),
            centroid_distances: Vec::new(),
            iterations: 0,
            status: KMeansStatus::Initialized,
        }
    }

    /// The centroid of cluster **idx**.
    ///
    /// ## Panics
    /// If `idx >= k`.
    pub fn centroid(&self, idx: usize) -> &[T] {
        &self.centroids[idx * self.sample_dims..(idx + 1) * self.sample_dims]
    }

    /// Whether the calculation stopped because the assignment stabilized.
    pub fn did_converge(&self) -> bool {
        self.status == KMeansStatus::Converged
    }
}




/// Entrypoint of this crate's API-Surface.
///
/// Create an instance of this struct, giving the samples you want to operate on. The primitive type
/// of the passed samples array will be the type used internaly for all calculations, as well as the result
/// as stored in the returned [`KMeansState`] structure.
///
/// Creating the instance validates the dataset: it must contain at least one sample, and every sample
/// has to have the same (non-zero) amount of dimensions. The samples are never modified afterwards.
pub struct KMeans<T: Primitive> {
    pub(crate) sample_cnt: usize,
    pub(crate) sample_dims: usize,
    pub(crate) samples: Vec<T>,
}
impl<T: Primitive> KMeans<T> {
    /// Create a new instance of the [`KMeans`] structure.
    ///
    /// ## Arguments
    /// - **samples**: Vector of samples [row-major] = [<sample0>,<sample1>,<sample2>,...]
    /// - **sample_cnt**: Amount of samples, contained in the passed **samples** vector
    /// - **sample_dims**: Amount of dimensions each sample from the **sample** vector has
    ///
    /// ## Errors
    /// [`KMeansError::EmptyDataset`], [`KMeansError::ZeroDimensions`] or [`KMeansError::SampleCountMismatch`]
    pub fn new(samples: Vec<T>, sample_cnt: usize, sample_dims: usize) -> Result<Self> {
        if sample_cnt == 0 {
            return Err(KMeansError::EmptyDataset);
        }
        if sample_dims == 0 {
            return Err(KMeansError::ZeroDimensions);
        }
        if samples.len() != sample_cnt * sample_dims {
            return Err(KMeansError::SampleCountMismatch { len: samples.len(), sample_cnt, sample_dims });
        }
        Ok(Self { sample_cnt, sample_dims, samples })
    }

    /// Create a new instance of the [`KMeans`] structure from individual samples.
    /// The dimensionality of the first sample is the one all other samples have to match.
    ///
    /// ## Errors
    /// [`KMeansError::EmptyDataset`], [`KMeansError::ZeroDimensions`] or [`KMeansError::DimensionMismatch`]
    pub fn from_points<P: AsRef<[T]>>(points: &[P]) -> Result<Self> {
        let sample_dims = points.first().ok_or(KMeansError::EmptyDataset)?.as_ref().len();
        let mut samples = Vec::with_capacity(points.len() * sample_dims);
        for (idx, p) in points.iter().map(AsRef::as_ref).enumerate() {
            if p.len() != sample_dims {
                return Err(KMeansError::DimensionMismatch { sample: idx, expected: sample_dims, actual: p.len() });
            }
            samples.extend_from_slice(p);
        }
        Self::new(samples, points.len(), sample_dims)
    }

    /// Amount of samples in the dataset.
    pub fn sample_cnt(&self) -> usize { self.sample_cnt }
    /// Amount of dimensions of each sample.
    pub fn sample_dims(&self) -> usize { self.sample_dims }
    /// All samples [row-major].
    pub fn samples(&self) -> &[T] { &self.samples }

    /// Find the nearest centroid for every sample.
    ///
    /// Returns freshly allocated vectors, containing each sample's assigned centroid and its
    /// (squared) distance to that centroid. The passed **centroids** are only read.
    pub(crate) fn update_cluster_assignments(&self, centroids: &[T]) -> (Vec<usize>, Vec<T>) {
        // manually calculate work-packet size, because rayon does not do static scheduling (which is more apropriate here)
        let work_packet_size = (self.sample_cnt / rayon::current_num_threads()).max(1);
        let nearest: Vec<(usize, T)> = self.samples.par_chunks_exact(self.sample_dims)
            .with_min_len(work_packet_size)
            .map(|s| geometry::nearest_centroid(s, centroids))
            .collect();
        nearest.into_iter().unzip()
    }

    /// Count the samples assigned to each centroid. Returns the amount of centroids with at least one sample.
    pub(crate) fn update_cluster_frequencies(&self, assignments: &[usize], centroid_frequency: &mut [usize]) -> usize {
        centroid_frequency.iter_mut().for_each(|v| *v = 0);
        let mut used_centroids_cnt = 0;
        assignments.iter().cloned()
            .for_each(|centroid_id| {
                if centroid_frequency[centroid_id] == 0 {
                    used_centroids_cnt += 1; // Count the amount of centroids with more than 0 samples
                }
                centroid_frequency[centroid_id] += 1;
            });
        used_centroids_cnt
    }


    /// Normal K-Means algorithm implementation (Lloyd), run to completion.
    ///
    /// Centroids are initialized by interpolating along the diagonal of the dataset's bounding box,
    /// so repeated calls with the same arguments produce identical results.
    /// If you need to drive the calculation iteration by iteration, use [`crate::Lloyd`] directly.
    ///
    /// ## Arguments
    /// - **k**: Amount of clusters to search for (`1 <= k <= sample_cnt`)
    /// - **max_iter**: Limit the maximum amount of iterations (at least 1)
    /// - **config**: [`KMeansConfig`] instance, containing several configuration options for the calculation.
    ///
    /// ## Returns
    /// Instance of [`KMeansState`], containing the final state (result).
    ///
    /// ## Example
    /// ```rust
    /// use kmeans_lloyd::*;
    ///
    /// let samples = vec![0.0f64, 0.0, 0.5, 0.5, 9.5, 9.5, 10.0, 10.0];
    /// let kmean = KMeans::new(samples, 4, 2).unwrap();
    /// let result = kmean.kmeans_lloyd(2, 100, &KMeansConfig::default()).unwrap();
    ///
    /// assert!(result.did_converge());
    /// assert_eq!(result.assignments, vec![0, 0, 1, 1]);
    /// assert_eq!(result.centroid(0), &[0.25, 0.25]);
    /// assert_eq!(result.centroid(1), &[9.75, 9.75]);
    /// ```
    pub fn kmeans_lloyd<'a>(&'a self, k: usize, max_iter: usize, config: &KMeansConfig<'a, T>) -> Result<KMeansState<T>> {
        let mut lloyd = crate::Lloyd::with_config(self, k, max_iter, config)?;
        lloyd.run();
        Ok(lloyd.into_state())
    }
}
