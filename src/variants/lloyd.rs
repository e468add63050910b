use crate::{convergence::StableAssignment, errors::*, inits, KMeans, KMeansConfig, KMeansState, KMeansStatus, Primitive};

/// Lloyd's k-means algorithm, driven one iteration at a time.
///
/// Each iteration assigns every sample to its nearest centroid. If that assignment is identical
/// to the one of the previous iteration, the calculation has converged, and the centroids are left
/// as they are. Otherwise, every centroid is moved to the mean of its assigned samples. Centroids
/// of empty clusters are kept unchanged, so they may attract samples again in a later iteration.
///
/// The samples are borrowed immutably for the whole calculation, while centroids and assignments
/// are owned by this struct and only handed out by reference.
///
/// ## Example
/// ```rust
/// use kmeans_lloyd::*;
///
/// let kmean: KMeans<f64> = KMeans::from_points(&[[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]]).unwrap();
/// let mut lloyd = Lloyd::new(&kmean, 2, 10).unwrap();
/// assert_eq!(lloyd.status(), KMeansStatus::Initialized);
/// assert_eq!(lloyd.assignments(), None);
///
/// while !lloyd.step().is_terminal() {
///     println!("Iteration {}: {:?}", lloyd.iterations(), lloyd.centroids());
/// }
/// assert!(lloyd.did_converge());
/// assert_eq!(lloyd.assignments(), Some(&[0, 0, 0, 1][..]));
/// ```
pub struct Lloyd<'a, T: Primitive> {
    data: &'a KMeans<T>,
    config: KMeansConfig<'a, T>,
    max_iter: usize,
    convergence: StableAssignment,
    state: KMeansState<T>,
}
impl<'a, T: Primitive> Lloyd<'a, T> {
    /// Validate the arguments and initialize the centroids, using the default [`KMeansConfig`].
    ///
    /// ## Arguments
    /// - **data**: The samples to cluster
    /// - **k**: Amount of clusters to search for (`1 <= k <= sample_cnt`)
    /// - **max_iter**: Limit the maximum amount of iterations (at least 1)
    ///
    /// ## Errors
    /// [`KMeansError::InvalidClusterCount`] or [`KMeansError::InvalidMaxIterations`]
    pub fn new(data: &'a KMeans<T>, k: usize, max_iter: usize) -> Result<Self> {
        Self::with_config(data, k, max_iter, &KMeansConfig::default())
    }

    /// Same as [`Lloyd::new`], with a custom [`KMeansConfig`]. Its `init_done` callback is
    /// invoked before this function returns.
    pub fn with_config(data: &'a KMeans<T>, k: usize, max_iter: usize, config: &KMeansConfig<'a, T>) -> Result<Self> {
        if k == 0 || k > data.sample_cnt {
            return Err(KMeansError::InvalidClusterCount { k, sample_cnt: data.sample_cnt });
        }
        if max_iter == 0 {
            return Err(KMeansError::InvalidMaxIterations);
        }

        let centroids = inits::interpolated::calculate(data, k);
        let state = KMeansState::new(data.sample_dims, k, centroids);
        log::debug!("initialized {} centroids for {} samples with {} dimensions", k, data.sample_cnt, data.sample_dims);
        (config.init_done)(&state);

        Ok(Self {
            data,
            config: *config,
            max_iter,
            convergence: StableAssignment::new(),
            state,
        })
    }

    /// Sum all samples of a cluster together, and divide by the cluster's size.
    /// Returns the amount of empty clusters, whose centroids were left unchanged.
    fn update_centroids(data: &KMeans<T>, state: &mut KMeansState<T>) -> usize {
        let sample_dims = data.sample_dims;
        let mut used_centroids_cnt = 0;
        let mut new_centroids = vec![T::zero(); state.centroids.len()];

        let (centroid_frequency, assignments) = (&mut state.centroid_frequency, &state.assignments);
        rayon::scope(|s| {
            s.spawn(|_| {
                used_centroids_cnt = data.update_cluster_frequencies(assignments, centroid_frequency);
            });
            s.spawn(|_| {
                data.samples.chunks_exact(sample_dims)
                    .zip(assignments.iter().cloned())
                    .for_each(|(s, centroid_id)| {
                        new_centroids[centroid_id * sample_dims..(centroid_id + 1) * sample_dims].iter_mut()
                            .zip(s.iter().cloned())
                            .for_each(|(c, v)| *c += v);
                    });
            });
        });

        // Calculate new centroids from the sums, empty clusters keep their previous centroid
        new_centroids.chunks_exact_mut(sample_dims)
            .zip(state.centroids.chunks_exact(sample_dims))
            .zip(state.centroid_frequency.iter().cloned())
            .enumerate()
            .for_each(|(centroid_id, ((nc, c), cfreq))| {
                if cfreq == 0 {
                    log::trace!("cluster {} is empty, keeping its centroid", centroid_id);
                    nc.copy_from_slice(c);
                } else {
                    let cfreq = T::from_count(cfreq);
                    nc.iter_mut().for_each(|v| *v = *v / cfreq);
                }
            });
        state.centroids = new_centroids;
        state.k - used_centroids_cnt
    }

    /// Run a single iteration, and return the resulting status.
    /// Once a terminal status was reached, this does nothing.
    pub fn step(&mut self) -> KMeansStatus {
        if self.state.status.is_terminal() {
            return self.state.status;
        }
        let iteration = self.state.iterations + 1;

        let (assignments, centroid_distances) = self.data.update_cluster_assignments(&self.state.centroids);
        let reassigned = self.convergence.changed(&assignments);
        let converged = self.convergence.next(&assignments);
        self.state.assignments = assignments;
        self.state.distsum = centroid_distances.iter().cloned().sum();
        self.state.centroid_distances = centroid_distances;
        self.state.iterations = iteration;

        self.state.status = if converged {
            KMeansStatus::Converged
        } else {
            let empty_cnt = Self::update_centroids(self.data, &mut self.state);
            if empty_cnt > 0 {
                log::debug!("iteration {}: {} empty clusters", iteration, empty_cnt);
            }
            if iteration >= self.max_iter { KMeansStatus::Exhausted } else { KMeansStatus::Running }
        };
        log::debug!("iteration {}: distsum {:e}, {} samples reassigned", iteration, self.state.distsum, reassigned);

        // Notify subscriber about finished iteration
        (self.config.iteration_done)(&self.state, iteration);

        match self.state.status {
            KMeansStatus::Converged => log::info!("converged after {} iterations (distsum {:e})", iteration, self.state.distsum),
            KMeansStatus::Exhausted => log::info!("no convergence within {} iterations (distsum {:e})", iteration, self.state.distsum),
            _ => {}
        }
        self.state.status
    }

    /// Run iterations until a terminal status ([`KMeansStatus::Converged`] or [`KMeansStatus::Exhausted`]) is reached.
    pub fn run(&mut self) -> KMeansStatus {
        while !self.step().is_terminal() {}
        self.state.status
    }

    /// Current centroids [row-major] = [<centroid0>,<centroid1>,<centroid2>,...]
    pub fn centroids(&self) -> &[T] { &self.state.centroids }
    /// Current centroid of cluster **idx**.
    pub fn centroid(&self, idx: usize) -> &[T] { self.state.centroid(idx) }
    /// Assignment of the last iteration, `None` before the first one.
    pub fn assignments(&self) -> Option<&[usize]> {
        match self.state.iterations {
            0 => None,
            _ => Some(&self.state.assignments),
        }
    }
    /// Whether the calculation ended because the assignment stopped changing.
    pub fn did_converge(&self) -> bool { self.state.did_converge() }
    /// Current lifecycle status.
    pub fn status(&self) -> KMeansStatus { self.state.status }
    /// Amount of iterations executed so far.
    pub fn iterations(&self) -> usize { self.state.iterations }
    /// Iteration limit this calculation was created with.
    pub fn max_iter(&self) -> usize { self.max_iter }
    /// The complete current [`KMeansState`].
    pub fn state(&self) -> &KMeansState<T> { &self.state }
    /// Give up the calculation, and take its current [`KMeansState`].
    pub fn into_state(self) -> KMeansState<T> { self.state }
}




#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::testing;
    use std::cell::RefCell;

    fn square() -> KMeans<f64> {
        KMeans::<f64>::from_points(&[[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]]).unwrap()
    }

    // Rows: (1,2,3), (-1,3,7), (4,-10,1)
    fn triangle() -> KMeans<f64> {
        KMeans::new(vec![1.0, 2.0, 3.0, -1.0, 3.0, 7.0, 4.0, -10.0, 1.0], 3, 3).unwrap()
    }

    // Cluster 1 starts with the samples 2.6 and 7.4, and loses both of them in iteration 2
    fn vanishing_cluster() -> KMeans<f64> {
        let samples = vec![0.0, 2.4, 2.4, 2.4, 2.6, 7.4, 7.6, 7.6, 7.6, 10.0];
        let sample_cnt = samples.len();
        KMeans::new(samples, sample_cnt, 1).unwrap()
    }

    #[test]
    fn square_converges_on_diagonal() {
        let kmean = square();
        let mut lloyd = Lloyd::new(&kmean, 2, 10).unwrap();
        assert_eq!(lloyd.centroids(), &[0.0, 0.0, 10.0, 10.0]);

        assert_eq!(lloyd.run(), KMeansStatus::Converged);
        assert_eq!(lloyd.iterations(), 2);
        // (10,0) and (0,10) are equally far from both initial centroids -> lowest index wins
        assert_eq!(lloyd.assignments(), Some(&[0, 0, 0, 1][..]));
        assert_approx_eq!(lloyd.centroid(0)[0], 10.0 / 3.0);
        assert_eq!(lloyd.centroid(0)[0], lloyd.centroid(0)[1]);
        assert_eq!(lloyd.centroid(1), &[10.0, 10.0]);
        assert_eq!(lloyd.state().centroid_frequency, vec![3, 1]);
        testing::assert_state_sane(lloyd.state());
    }

    #[test]
    fn single_cluster_converges_to_mean() {
        let kmean = triangle();
        let mut lloyd = Lloyd::new(&kmean, 1, 10).unwrap();
        assert_eq!(lloyd.status(), KMeansStatus::Initialized);
        assert_eq!(lloyd.centroids(), &[-1.0, -10.0, 1.0]);
        assert_eq!(lloyd.assignments(), None);

        assert_eq!(lloyd.step(), KMeansStatus::Running);
        assert_eq!(lloyd.assignments(), Some(&[0, 0, 0][..]));
        let mean = [(1.0 + -1.0 + 4.0) / 3.0, (2.0 + 3.0 + -10.0) / 3.0, (3.0 + 7.0 + 1.0) / 3.0];
        lloyd.centroids().iter().zip(mean.iter()).for_each(|(&c, &m)| assert_approx_eq!(c, m));

        assert_eq!(lloyd.step(), KMeansStatus::Converged);
        assert_eq!(lloyd.iterations(), 2);
        lloyd.centroids().iter().zip(mean.iter()).for_each(|(&c, &m)| assert_approx_eq!(c, m));
    }

    #[test]
    fn single_iteration_exhausts() {
        let kmean = triangle();
        let mut lloyd = Lloyd::new(&kmean, 1, 1).unwrap();
        assert_eq!(lloyd.run(), KMeansStatus::Exhausted);
        assert!(!lloyd.did_converge());
        assert_eq!(lloyd.iterations(), 1);
        // the one update still happened
        assert_approx_eq!(lloyd.centroid(0)[0], 4.0 / 3.0);
    }

    #[test]
    fn one_cluster_per_sample() {
        let kmean = triangle();
        let mut lloyd = Lloyd::new(&kmean, 3, 10).unwrap();
        assert_eq!(lloyd.centroids(), &[-1.0, -10.0, 1.0, 1.5, -3.5, 4.0, 4.0, 3.0, 7.0]);

        assert_eq!(lloyd.run(), KMeansStatus::Converged);
        assert_eq!(lloyd.iterations(), 2);
        assert_eq!(lloyd.assignments(), Some(&[2, 2, 0][..]));
        assert_eq!(lloyd.state().centroid_frequency, vec![1, 0, 2]);
        assert_eq!(lloyd.centroid(0), &[4.0, -10.0, 1.0]);
        // never used, still the initial centroid
        assert_eq!(lloyd.centroid(1), &[1.5, -3.5, 4.0]);
        assert_eq!(lloyd.centroid(2), &[0.0, 2.5, 5.0]);
        testing::assert_state_sane(lloyd.state());

        // identical samples: every sample on its own centroid is impossible
        let kmean = KMeans::new(vec![1.0f64; 5], 5, 1).unwrap();
        let result = kmean.kmeans_lloyd(5, 10, &KMeansConfig::default()).unwrap();
        assert!(result.did_converge());
        assert_eq!(result.assignments, vec![0; 5]);
        testing::assert_state_sane(&result);
    }

    #[test]
    fn invalid_arguments() {
        let kmean = square();
        assert_eq!(Lloyd::new(&kmean, 0, 10).err().map(|e| e.to_string()),
            Some(KMeansError::InvalidClusterCount { k: 0, sample_cnt: 4 }.to_string()));
        assert!(matches!(Lloyd::new(&kmean, 5, 10), Err(KMeansError::InvalidClusterCount { k: 5, sample_cnt: 4 })));
        assert!(matches!(Lloyd::new(&kmean, 2, 0), Err(KMeansError::InvalidMaxIterations)));
        assert!(matches!(kmean.kmeans_lloyd(7, 10, &KMeansConfig::default()), Err(KMeansError::InvalidClusterCount { .. })));
        assert!(Lloyd::new(&kmean, 4, 1).is_ok());
    }

    #[test]
    fn empty_cluster_keeps_centroid() {
        let kmean = vanishing_cluster();
        let mut lloyd = Lloyd::new(&kmean, 3, 10).unwrap();
        assert_eq!(lloyd.centroids(), &[0.0, 5.0, 10.0]);

        assert_eq!(lloyd.step(), KMeansStatus::Running);
        assert_eq!(lloyd.assignments(), Some(&[0, 0, 0, 0, 1, 1, 2, 2, 2, 2][..]));
        assert_eq!(lloyd.state().centroid_frequency, vec![4, 2, 4]);
        let before = lloyd.centroid(1).to_vec();
        assert_approx_eq!(before[0], 5.0);

        assert_eq!(lloyd.step(), KMeansStatus::Running);
        assert_eq!(lloyd.assignments(), Some(&[0, 0, 0, 0, 0, 2, 2, 2, 2, 2][..]));
        assert_eq!(lloyd.state().centroid_frequency, vec![5, 0, 5]);
        assert_eq!(lloyd.centroid(1), &before[..]);

        assert_eq!(lloyd.run(), KMeansStatus::Converged);
        assert_eq!(lloyd.iterations(), 3);
        assert_eq!(lloyd.centroid(1), &before[..]);
        assert_approx_eq!(lloyd.centroid(0)[0], (0.0 + 2.4 * 3.0 + 2.6) / 5.0);
        assert_approx_eq!(lloyd.centroid(2)[0], (7.4 + 7.6 * 3.0 + 10.0) / 5.0);
        testing::assert_state_sane(lloyd.state());
    }

    #[test]
    fn iteration_limit() {
        let kmean = vanishing_cluster();
        let mut lloyd = Lloyd::new(&kmean, 3, 2).unwrap();
        assert_eq!(lloyd.run(), KMeansStatus::Exhausted);
        assert_eq!(lloyd.iterations(), 2);
        assert!(!lloyd.did_converge());

        // terminal: further steps change nothing
        let centroids = lloyd.centroids().to_vec();
        assert_eq!(lloyd.step(), KMeansStatus::Exhausted);
        assert_eq!(lloyd.iterations(), 2);
        assert_eq!(lloyd.centroids(), &centroids[..]);
    }

    #[test]
    fn no_update_after_convergence() {
        let kmean = square();
        let mut lloyd = Lloyd::new(&kmean, 2, 10).unwrap();
        lloyd.run();
        let state = lloyd.state().clone();
        for _ in 0..3 {
            assert_eq!(lloyd.step(), KMeansStatus::Converged);
        }
        assert_eq!(lloyd.iterations(), state.iterations);
        assert_eq!(lloyd.centroids(), &state.centroids[..]);
        assert_eq!(lloyd.assignments(), Some(&state.assignments[..]));
    }

    #[test]
    fn centroids_are_cluster_means() {
        let samples = testing::random_samples(1337, 300, 3);
        let kmean = KMeans::new(samples, 300, 3).unwrap();
        let mut lloyd = Lloyd::new(&kmean, 4, 100).unwrap();

        while lloyd.status() == KMeansStatus::Initialized || lloyd.status() == KMeansStatus::Running {
            let previous = lloyd.centroids().to_vec();
            if lloyd.step() == KMeansStatus::Converged {
                assert_eq!(lloyd.centroids(), &previous[..]);
                break;
            }
            let state = lloyd.state();
            testing::assert_state_sane(state);
            for cid in 0..state.k {
                let members: Vec<&[f64]> = kmean.samples().chunks_exact(3)
                    .zip(state.assignments.iter())
                    .filter(|(_, &a)| a == cid)
                    .map(|(s, _)| s)
                    .collect();
                assert_eq!(members.len(), state.centroid_frequency[cid]);
                for d in 0..3 {
                    let expected = match members.len() {
                        0 => previous[cid * 3 + d],
                        cnt => members.iter().map(|s| s[d]).sum::<f64>() / cnt as f64,
                    };
                    assert_approx_eq!(state.centroid(cid)[d], expected);
                }
            }
        }
        assert!(lloyd.status().is_terminal());
    }

    #[test]
    fn deterministic_results() {
        let samples = testing::random_samples(42, 2000, 5);
        let kmean = KMeans::new(samples, 2000, 5).unwrap();
        let conf = KMeansConfig::default();

        let first = kmean.kmeans_lloyd(8, 50, &conf).unwrap();
        let second = kmean.kmeans_lloyd(8, 50, &conf).unwrap();
        let bits = |v: &[f64]| v.iter().map(|f| f.to_bits()).collect::<Vec<_>>();

        assert_eq!(bits(&first.centroids[..]), bits(&second.centroids[..]));
        assert_eq!(first.assignments, second.assignments);
        assert_eq!(first.iterations, second.iterations);
        assert_eq!(first.status, second.status);
        assert_eq!(first.distsum.to_bits(), second.distsum.to_bits());
        testing::assert_state_sane(&first);
    }

    #[test]
    fn separated_blobs() {
        let centers = [[0.0, 0.0], [5.0, 5.0], [10.0, 10.0]];
        let samples = testing::blob_samples(7, &centers, 50, 0.5);
        let kmean = KMeans::new(samples, 150, 2).unwrap();
        let result = kmean.kmeans_lloyd(3, 100, &KMeansConfig::default()).unwrap();

        assert!(result.did_converge());
        for (blob, center) in centers.iter().enumerate() {
            let members = &result.assignments[blob * 50..(blob + 1) * 50];
            assert!(members.iter().all(|&a| a == members[0]));
            let centroid = result.centroid(members[0]);
            assert_approx_eq!(centroid[0], center[0], 0.5);
            assert_approx_eq!(centroid[1], center[1], 0.5);
        }
        let mut used: Vec<usize> = result.assignments.clone();
        used.dedup();
        assert_eq!(used, vec![0, 1, 2]);
        assert_approx_eq!(result.distsum, result.centroid_distances.iter().sum::<f64>(), 1e-9);
    }

    #[test]
    fn observers_see_every_iteration() {
        let kmean = vanishing_cluster();
        let init_centroids = RefCell::new(Vec::new());
        let history = RefCell::new(Vec::new());
        let init_done = |s: &KMeansState<f64>| {
            assert_eq!(s.status, KMeansStatus::Initialized);
            *init_centroids.borrow_mut() = s.centroids.clone();
        };
        let iteration_done = |s: &KMeansState<f64>, nr: usize| {
            assert_eq!(s.iterations, nr);
            history.borrow_mut().push((nr, s.status, s.centroids.clone()));
        };
        let conf = KMeansConfig::build()
            .init_done(&init_done)
            .iteration_done(&iteration_done)
            .build();

        let result = kmean.kmeans_lloyd(3, 10, &conf).unwrap();
        assert_eq!(*init_centroids.borrow(), vec![0.0, 5.0, 10.0]);

        let history = history.borrow();
        assert_eq!(history.len(), 3);
        assert_eq!(history.iter().map(|h| (h.0, h.1)).collect::<Vec<_>>(), vec![
            (1, KMeansStatus::Running),
            (2, KMeansStatus::Running),
            (3, KMeansStatus::Converged),
        ]);
        assert_eq!(history[1].2[1], history[0].2[1]);
        assert_eq!(history[2].2, result.centroids);
    }

    #[test]
    fn single_precision() {
        let kmean = KMeans::new(vec![0.0f32, 0.0, 0.5, 0.5, 9.5, 9.5, 10.0, 10.0], 4, 2).unwrap();
        let result = kmean.kmeans_lloyd(2, 100, &KMeansConfig::default()).unwrap();
        assert!(result.did_converge());
        assert_eq!(result.assignments, vec![0, 0, 1, 1]);
        assert_approx_eq!(result.centroids[0], 0.25f32, 1e-6);
        assert_approx_eq!(result.centroids[3], 9.75f32, 1e-6);
    }

    #[test]
    fn huge_magnitudes_converge_finite() {
        let kmean = KMeans::new(vec![-1e308f64, 0.0, 1e308], 3, 1).unwrap();
        let mut lloyd = Lloyd::new(&kmean, 3, 10).unwrap();
        assert_eq!(lloyd.centroids(), &[-1e308, 0.0, 1e308]);

        assert_eq!(lloyd.run(), KMeansStatus::Converged);
        assert_eq!(lloyd.iterations(), 2);
        assert_eq!(lloyd.assignments(), Some(&[0, 1, 2][..]));
        assert_eq!(lloyd.centroids(), &[-1e308, 0.0, 1e308]);
        assert_eq!(lloyd.state().distsum, 0.0);
        testing::assert_state_sane(lloyd.state());
    }
}
