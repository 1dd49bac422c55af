/*
  Copyright© 2023 Raúl Wolters(1)

  This file is part of spx-eval.

  spx-eval is free software: you can redistribute it and/or modify it under
  the terms of the European Union Public License version 1.2 or later, as
  published by the European Commission.

  spx-eval is distributed in the hope that it will be useful, but WITHOUT ANY
  WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR
  A PARTICULAR PURPOSE. See the European Union Public License for more details.

  You should have received a copy of the EUPL in an/all official language(s) of
  the European Union along with spx-eval.  If not, see
  <https://ec.europa.eu/info/european-union-public-licence_en/>.

  (1) Resident of the Kingdom of the Netherlands; agreement between licensor and
  licensee subject to Dutch law as per article 15 of the EUPL.
*/


//! Spx-eval is a pure-rust toolkit for evaluating superpixel segmentations.
//!
//! # Features
//! A superpixel segmentation is a label grid: every pixel carries the id of the
//! region (superpixel) it belongs to, or `-1` if it is excluded from
//! evaluation. This crate treats such a grid as a graph of regions and offers
//! 1. *connectivity normalization*, which relabels the grid so that every id
//! covers exactly one 8-connected region and ids are dense;
//! 2. *region merging*, either down to a target region count or until no region
//! is smaller than a minimum size, by greedily merging regions into their most
//! similar neighbour;
//! 3. *quality metrics*: colour homogeneity (descriptor-based or explained
//! variation), boundary recall, undersegmentation error, compactness and the
//! regularity of region sizes.
//!
//! In addition, `spx-eval` provides extra functionality which can be accessed
//! via cargo feature gates. A list of all additional features [can be found
//! below](#cargo-feature-gates).
//!
//! # Quickstart
//! To use the latest release of spx-eval in a cargo project, add the spx-eval
//! crate as a dependency to your `Cargo.toml` file:
//! ```toml
//! [dependencies]
//! spx-eval = "0.1.0"
//! ```
//!
//! ## Short example: scoring a segmentation
//! `spx-eval` uses the commonly used "builder pattern" to configure a metric
//! before running it. To configure a metric, create an instance of the
//! `EvaluationBuilder` struct for one of the `MetricKind`s. Once you are done
//! specifying options, call the `build()` function to generate a
//! (`Sync`&`Send`) metric object, which evaluates one image at a time or whole
//! batches in parallel.
//! ```rust
//! use spx_eval::prelude::*;
//! use ndarray_rand::{rand_distr::Uniform, RandomExt};
//!
//! //A random label field and a random greyscale image
//! let labels = nd::Array2::<i32>::random((64, 64), Uniform::new(0, 8));
//! let image = nd::Array3::<u8>::random((64, 64, 1), Uniform::new(0, 255));
//! let image = ColourGrid::from_array(image).unwrap();
//!
//! //Explained variation of the labels
//! let metric = EvaluationBuilder::new(MetricKind::ExplainedVariation).build().unwrap();
//! let input = EvalInput::new(LabelGrid::from_array(labels).unwrap()).with_image(&image);
//! let evaluation = metric.evaluate(input).unwrap();
//! assert!((0.0..=1.0).contains(&evaluation.score));
//! ```
//!
//! # Cargo feature gates
//! *By default, all features behind cargo feature gates are **disabled***
//! - `jemalloc`: this feature enables the [jemalloc allocator](https://jemalloc.net).
//! Jemalloc is enabled though usage of the `jemallocator` crate, which
//! increases compile times considerably. Enabling this feature can improve
//! run-time performance of batch evaluations on machines with many cores. To
//! compile `spx-eval` with the `jemalloc` feature, jemalloc must be installed
//! on the host system.
//! - `plots`: with this feature enabled, the `plotting` module can render label
//! grids and per-pixel score maps as png files. Plotting support adds the
//! `plotters` crate as a dependency, which increases compile times and requires
//! the installation of some packages on linux systems, [see the `plotters`
//! documentation for details](https://docs.rs/plotters/).
//! - `progress`: this feature enables a progress bar for batch evaluations.
//! Enabling this feature adds the `indicatif` crate as a dependency,
//! which should not considerably slow down compile times.
//! - `debug`: this feature enables debug and performance monitoring output. This
//! can negatively impact performance. Enabling this feature does not add additional
//! dependencies.

//Set Jemalloc as the global allocator for this crate
#[cfg(feature = "jemalloc")]
#[global_allocator]
static GLOBAL: jemallocator::Jemalloc = jemallocator::Jemalloc;

pub mod colour;
pub mod connectivity;
pub mod delineation;
pub mod descriptor;
pub mod error;
pub mod evaluation;
pub mod grid;
pub mod homogeneity;
pub mod io;
pub mod mask;
pub mod merge;
pub mod queue;
pub mod shape;

#[cfg(feature = "plots")]
/// This module contains all the code required to generate images from label
/// grids and score maps, including the included colour maps.
pub mod plotting;

pub use connectivity::{count_regions, is_normalized, normalize_connectivity};
pub use error::{EvalError, EvalResult};
pub use evaluation::{
  evaluate_batch, BatchReport, EvalInput, Evaluation, EvaluationBuilder, Metric, MetricKind,
};
pub use grid::{ColourGrid, GroundTruth, LabelGrid, Partition, EXCLUDED};
pub use mask::ExclusionMask;
pub use merge::{merge_small_regions, reduce_to_count};

//Utility prelude for batch import
pub mod prelude {
  pub use crate::{
    evaluate_batch, normalize_connectivity, ColourGrid, EvalError, EvalInput, Evaluation,
    EvaluationBuilder, ExclusionMask, GroundTruth, LabelGrid, Metric, MetricKind, Partition,
    EXCLUDED,
  };
  pub use ndarray as nd;
  #[cfg(feature = "plots")]
  pub mod color_maps {
    pub use crate::plotting::grey_scale;
    pub use crate::plotting::heat;
  }
}
