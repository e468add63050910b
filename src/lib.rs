//! # kmeans_lloyd - API documentation
//!
//! kmeans_lloyd is a small rust library for the calculation of k-means-clustering, using
//! Lloyd's algorithm.
//!
//! ## Design target
//! Its main target is reproducibility: identical inputs always produce identical centroids and
//! assignments, down to the last bit. Centroids are therefore not initialized randomly, but evenly
//! spaced along the diagonal of the samples' bounding box, and the calculation stops as soon as two
//! consecutive iterations assign every sample to the same cluster.
//! Samples are given using a raw vector [row-major], instead of any high-level arithmetics / matrix
//! crate such as nalgebra or ndarray. The assignment of samples to clusters is parallelized using rayon.
//!
//! ## Supported primitive types
//! - [`f32`]
//! - [`f64`]
//!
//! ## Example
//! ```rust
//! use kmeans_lloyd::*;
//!
//! let (sample_cnt, sample_dims, k, max_iter) = (2000, 8, 4, 100);
//!
//! // Generate some data
//! let samples: Vec<f64> = (0..sample_cnt * sample_dims)
//!     .map(|i| ((i * 7919) % 1000) as f64 / 1000.0)
//!     .collect();
//!
//! let kmean = KMeans::new(samples, sample_cnt, sample_dims).unwrap();
//! let result = kmean.kmeans_lloyd(k, max_iter, &KMeansConfig::default()).unwrap();
//!
//! println!("Centroids: {:?}", result.centroids);
//! println!("Cluster-Assignments: {:?}", result.assignments);
//! println!("Converged: {} after {} iterations", result.did_converge(), result.iterations);
//! println!("Error: {}", result.distsum);
//! ```
//!
//! ## Example (using the status event callbacks)
//! ```rust
//! use kmeans_lloyd::*;
//!
//! let samples = vec![0.0f64, 2.4, 2.4, 2.4, 2.6, 7.4, 7.6, 7.6, 7.6, 10.0];
//!
//! let conf = KMeansConfig::build()
//!     .init_done(&|s| println!("Initialization completed: {:?}", s.centroids))
//!     .iteration_done(&|s, nr| println!("Iteration {} - Error: {:.2} | Status: {:?}", nr, s.distsum, s.status))
//!     .build();
//!
//! let kmean = KMeans::new(samples, 10, 1).unwrap();
//! let result = kmean.kmeans_lloyd(3, 100, &conf).unwrap();
//! assert!(result.did_converge());
//! ```
//!
//! ## Short API-Overview / Description
//! Entry-point of the library is the [`KMeans`] struct. This struct is generic over the underlying primitive
//! type, that should be used for the calculations. To use KMeans, an instance of this struct is created, taking
//! over the sample data into its ownership after validating it.
//!
//! [`KMeans::kmeans_lloyd`] runs a complete calculation and returns its final [`KMeansState`]. Calling it does
//! not mutate the [`KMeans`] instance, so multiple runs can be done on the same samples.
//! To observe or stop a calculation between iterations, create a [`Lloyd`] instance instead, and advance it
//! using [`Lloyd::step`].
//!
//! Progress is reported through the [`log`](https://docs.rs/log) facade; the library does not install a logger.

#[macro_use] mod helpers;
mod primitive;
mod errors;
mod api;
mod geometry;
mod inits;
mod convergence;
mod variants;

pub use api::{KMeansState, KMeansStatus, KMeansConfig, KMeansConfigBuilder, KMeans};
pub use errors::{KMeansError, Result};
pub use geometry::{bounding_box, scaled_sum, squared_distance};
pub use primitive::Primitive;
pub use variants::Lloyd;
