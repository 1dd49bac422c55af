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

//! Configurable evaluation of label grids.
//!
//! Use [`EvaluationBuilder`] to pick one of the metrics in [`MetricKind`] and
//! set its parameters, then call `build()` to obtain a (`Send` & `Sync`)
//! [`Metric`] object. A metric object evaluates one [`EvalInput`] at a time
//! with [`Metric::evaluate`], or a whole batch of them in parallel with
//! [`evaluate_batch`].
//!
//! Every evaluation runs the same pipeline: the exclusion mask (if any) is
//! applied to the labels, the labels are normalized to connected regions with
//! dense ids, and then the metric itself runs. Metrics that merge regions
//! return the merged labels in [`Evaluation::labels`].

use ndarray as nd;
use rayon::prelude::*;

use crate::{
  connectivity::{count_regions, normalize_connectivity},
  delineation::{boundary_recall, undersegmentation_error, DEFAULT_TOLERANCE},
  error::{EvalError, EvalResult},
  grid::{ColourGrid, GroundTruth, LabelGrid, EXCLUDED},
  homogeneity::{descriptor_homogeneity, explained_variation, HomogeneityParams, RegionScores},
  mask::{exclude_masked, ExclusionMask},
  merge::{count_small_regions, merge_small_regions, reduce_to_count},
  shape::{compactness, isoperimetric_quotients, regularity},
};

////////////////////////////////////////////////////////////////////////////////
//                              HELPER FUNCTIONS                              //
////////////////////////////////////////////////////////////////////////////////

#[cfg(feature = "progress")]
fn set_up_bar(images: usize) -> indicatif::ProgressBar {
  const TEMPLATE: &str = "{spinner}[{elapsed}/{duration}] image {pos}/{len}{bar:60}";
  let bar = indicatif::ProgressBar::new(images as u64);
  if let Ok(style) = indicatif::ProgressStyle::with_template(TEMPLATE) {
    bar.set_style(style);
  }
  bar
}

/// Spreads a per-region score over the pixels of each region. Excluded pixels,
/// and pixels whose label has no score, are `NaN`.
pub fn score_map(labels: &LabelGrid, per_region: &[f64]) -> nd::Array2<f64> {
  labels.view().mapv(|label| match label {
    EXCLUDED => f64::NAN,
    label => per_region.get(label as usize).copied().unwrap_or(f64::NAN),
  })
}

#[cfg(feature = "debug")]
mod performance_monitoring {

  #[derive(Clone, Debug, Default)]
  pub struct PerfReport {
    pub metric: u8,
    pub masked_px: usize,
    pub regions: usize,
    pub mask_ms: usize,
    pub normalize_ms: usize,
    pub measure_ms: usize,
    pub total_ms: usize,
  }

  impl std::fmt::Display for PerfReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
      writeln!(f, ">---------[Performance Summary]---------")?;
      writeln!(f, ">  Metric #{}, {} regions", self.metric, self.regions)?;
      writeln!(f, ">  Masking: {}ms ({}px excluded)", self.mask_ms, self.masked_px)?;
      writeln!(f, ">  Normalizing: {}ms", self.normalize_ms)?;
      writeln!(f, ">  Measuring: {}ms", self.measure_ms)?;
      writeln!(f, ">--------------------------------+ total")?;
      writeln!(
        f,
        ">  {}ms with {}ms overhead (Δt)",
        self.total_ms,
        self.total_ms as isize - (self.mask_ms + self.normalize_ms + self.measure_ms) as isize
      )
    }
  }
}

////////////////////////////////////////////////////////////////////////////////
//                               INPUTS/OUTPUTS                               //
////////////////////////////////////////////////////////////////////////////////

/// The available metrics, numbered as on the evaluation command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
  /// descriptor-based colour homogeneity
  Homogeneity = 1,
  ExplainedVariation = 2,
  BoundaryRecall = 3,
  UndersegmentationError = 4,
  Compactness = 5,
  /// number of connected regions after masking
  Connectivity = 6,
  /// merge regions until a target count is reached
  RegionCount = 7,
  /// standard deviation of region areas
  Regularity = 9,
  /// number of regions under a minimum size, optionally merging them afterwards
  SmallRegions = 10,
}

impl MetricKind {
  pub fn id(self) -> u8 {
    self as u8
  }
}

impl TryFrom<u8> for MetricKind {
  type Error = EvalError;

  fn try_from(id: u8) -> Result<Self, Self::Error> {
    Ok(match id {
      1 => MetricKind::Homogeneity,
      2 => MetricKind::ExplainedVariation,
      3 => MetricKind::BoundaryRecall,
      4 => MetricKind::UndersegmentationError,
      5 => MetricKind::Compactness,
      6 => MetricKind::Connectivity,
      7 => MetricKind::RegionCount,
      9 => MetricKind::Regularity,
      10 => MetricKind::SmallRegions,
      other => return Err(EvalError::InvalidParameter(format!("unknown metric id {other}"))),
    })
  }
}

/// Everything a metric may look at for one image. Only the labels are owned:
/// they are processed (masked, normalized, merged) during evaluation.
#[derive(Debug, Clone)]
pub struct EvalInput<'a> {
  pub labels: LabelGrid,
  pub image: Option<&'a ColourGrid>,
  pub ground_truth: Option<&'a GroundTruth>,
  pub mask: Option<&'a ExclusionMask>,
}

impl<'a> EvalInput<'a> {
  pub fn new(labels: LabelGrid) -> Self {
    EvalInput { labels, image: None, ground_truth: None, mask: None }
  }

  pub fn with_image(mut self, image: &'a ColourGrid) -> Self {
    self.image = Some(image);
    self
  }

  pub fn with_ground_truth(mut self, ground_truth: &'a GroundTruth) -> Self {
    self.ground_truth = Some(ground_truth);
    self
  }

  pub fn with_mask(mut self, mask: &'a ExclusionMask) -> Self {
    self.mask = Some(mask);
    self
  }

  fn image(&self) -> EvalResult<&'a ColourGrid> {
    self.image.ok_or(EvalError::MissingInput("image"))
  }

  fn ground_truth(&self) -> EvalResult<&'a GroundTruth> {
    self.ground_truth.ok_or(EvalError::MissingInput("ground truth"))
  }
}

/// What a metric computes on an already normalized label grid
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
  pub score: f64,
  pub per_region: Option<Vec<f64>>,
  pub reconstruction: Option<ColourGrid>,
}

impl Measurement {
  fn scalar(score: f64) -> Self {
    Measurement { score, per_region: None, reconstruction: None }
  }
}

impl From<RegionScores> for Measurement {
  fn from(scores: RegionScores) -> Self {
    Measurement { score: scores.score, per_region: Some(scores.per_region), reconstruction: scores.reconstruction }
  }
}

/// Result of evaluating one image
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
  pub score: f64,
  /// number of regions in `labels`
  pub region_count: usize,
  pub per_region: Option<Vec<f64>>,
  pub reconstruction: Option<ColourGrid>,
  /// the processed labels
  pub labels: LabelGrid,
  /// distinct labels in the input, before masking (connectivity metric only)
  pub label_count: Option<usize>,
}

impl Evaluation {
  /// Per-pixel rendering of the per-region scores, if the metric has any
  pub fn score_map(&self) -> Option<nd::Array2<f64>> {
    self.per_region.as_ref().map(|scores| score_map(&self.labels, scores))
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                   METRICS                                  //
////////////////////////////////////////////////////////////////////////////////

/// Shared behaviour of all metrics.
///
/// Implementors only provide [`measure`](Metric::measure), which works on
/// normalized labels. The provided [`evaluate`](Metric::evaluate) wraps it in
/// the masking and normalization pipeline.
pub trait Metric {
  fn kind(&self) -> MetricKind;

  /// Runs the metric on `labels`, which are already masked and normalized.
  /// Metrics that merge regions do so in place. The labels have been moved
  /// out of `input` by then.
  fn measure(&self, labels: &mut LabelGrid, input: &EvalInput<'_>) -> EvalResult<Measurement>;

  /// `true` if the evaluation reports the number of distinct input labels
  fn reports_label_count(&self) -> bool {
    false
  }

  /// Masks and normalizes the input labels, then measures them
  fn evaluate(&self, mut input: EvalInput<'_>) -> EvalResult<Evaluation> {
    let mut labels = std::mem::replace(&mut input.labels, LabelGrid::new(0, 0));
    let label_count = self.reports_label_count().then(|| count_regions(&labels));

    #[cfg(feature = "debug")]
    let (mut perf, start) = (
      performance_monitoring::PerfReport { metric: self.kind().id(), ..Default::default() },
      std::time::Instant::now(),
    );

    //(1) apply the exclusion mask
    if let Some(mask) = input.mask {
      let _masked = exclude_masked(&mut labels, mask)?;
      #[cfg(feature = "debug")]
      {
        perf.masked_px = _masked;
        perf.mask_ms = start.elapsed().as_millis() as usize;
      }
    }

    //(2) normalize
    #[cfg(feature = "debug")]
    let stage = std::time::Instant::now();
    normalize_connectivity(&mut labels);
    #[cfg(feature = "debug")]
    {
      perf.normalize_ms = stage.elapsed().as_millis() as usize;
    }

    //(3) measure
    #[cfg(feature = "debug")]
    let stage = std::time::Instant::now();
    let Measurement { score, per_region, reconstruction } = self.measure(&mut labels, &input)?;
    let region_count = labels.region_count();

    #[cfg(feature = "debug")]
    {
      perf.measure_ms = stage.elapsed().as_millis() as usize;
      perf.total_ms = start.elapsed().as_millis() as usize;
      perf.regions = region_count;
      println!("{perf}");
    }

    Ok(Evaluation { score, region_count, per_region, reconstruction, labels, label_count })
  }
}

/// Colour homogeneity: descriptor-based or explained variation
#[derive(Debug, Clone)]
pub struct HomogeneityMetric {
  descriptor_based: bool,
  params: HomogeneityParams,
  reconstruct: bool,
}

impl Metric for HomogeneityMetric {
  fn kind(&self) -> MetricKind {
    if self.descriptor_based {
      MetricKind::Homogeneity
    } else {
      MetricKind::ExplainedVariation
    }
  }

  fn measure(&self, labels: &mut LabelGrid, input: &EvalInput<'_>) -> EvalResult<Measurement> {
    let image = input.image()?;
    let scores = if self.descriptor_based {
      descriptor_homogeneity(labels, image, &self.params, self.reconstruct)?
    } else {
      explained_variation(labels, image, self.reconstruct)?
    };
    Ok(scores.into())
  }
}

/// Boundary adherence against a ground truth: recall or undersegmentation
#[derive(Debug, Clone)]
pub struct DelineationMetric {
  recall: bool,
  tolerance: f64,
}

impl Metric for DelineationMetric {
  fn kind(&self) -> MetricKind {
    if self.recall {
      MetricKind::BoundaryRecall
    } else {
      MetricKind::UndersegmentationError
    }
  }

  fn measure(&self, labels: &mut LabelGrid, input: &EvalInput<'_>) -> EvalResult<Measurement> {
    let ground_truth = input.ground_truth()?;
    let score = if self.recall {
      boundary_recall(labels, ground_truth, self.tolerance)?
    } else {
      undersegmentation_error(labels, &ground_truth.segments())?
    };
    Ok(Measurement::scalar(score))
  }
}

/// Region shape: compactness or regularity of sizes
#[derive(Debug, Clone)]
pub struct ShapeMetric {
  compactness: bool,
}

impl Metric for ShapeMetric {
  fn kind(&self) -> MetricKind {
    if self.compactness {
      MetricKind::Compactness
    } else {
      MetricKind::Regularity
    }
  }

  fn measure(&self, labels: &mut LabelGrid, _input: &EvalInput<'_>) -> EvalResult<Measurement> {
    Ok(if self.compactness {
      Measurement { score: compactness(labels), per_region: Some(isoperimetric_quotients(labels)), reconstruction: None }
    } else {
      Measurement::scalar(regularity(labels))
    })
  }
}

/// Region bookkeeping: connectivity, count enforcement and small regions
#[derive(Debug, Clone)]
pub struct PartitionMetric {
  kind: MetricKind,
  target_count: usize,
  min_size: usize,
  merge_small: bool,
}

impl Metric for PartitionMetric {
  fn kind(&self) -> MetricKind {
    self.kind
  }

  fn reports_label_count(&self) -> bool {
    self.kind == MetricKind::Connectivity
  }

  fn measure(&self, labels: &mut LabelGrid, input: &EvalInput<'_>) -> EvalResult<Measurement> {
    let score = match self.kind {
      MetricKind::Connectivity => labels.region_count(),
      MetricKind::RegionCount => reduce_to_count(labels, input.image()?, self.target_count)?,
      _ => {
        //count first, then hand back the merged grid
        let small = count_small_regions(labels, self.min_size);
        if self.merge_small {
          merge_small_regions(labels, input.image()?, self.min_size, input.mask)?;
        }
        small
      }
    };
    Ok(Measurement::scalar(score as f64))
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                   BUILDER                                  //
////////////////////////////////////////////////////////////////////////////////

/// Builder for configuring a metric.
///
/// Start with `EvaluationBuilder::new(kind)`, set the parameters the chosen
/// metric needs, and call `build()`. Parameters that the chosen metric does not
/// use are ignored. `build()` fails with `InvalidParameter` if a parameter the
/// metric needs is missing or out of range:
/// - homogeneity: `buckets >= 1`, `1 <= alpha <= 7 * buckets`, `gaussian_variance > 0`
/// - boundary recall: `tolerance >= 0`
/// - region count: a target count `>= 1`
/// - small regions: a minimum size `>= 1`
#[derive(Debug, Clone)]
pub struct EvaluationBuilder {
  kind: MetricKind,
  homogeneity: HomogeneityParams,
  tolerance: f64,
  target_count: Option<usize>,
  min_size: Option<usize>,
  merge_small: bool,
  reconstruct: bool,
}

impl EvaluationBuilder {
  pub fn new(kind: MetricKind) -> Self {
    EvaluationBuilder {
      kind,
      homogeneity: HomogeneityParams::default(),
      tolerance: DEFAULT_TOLERANCE,
      target_count: None,
      min_size: None,
      merge_small: false,
      reconstruct: false,
    }
  }

  pub fn set_buckets(mut self, buckets: usize) -> Self {
    self.homogeneity.buckets = buckets;
    self
  }

  pub fn set_alpha(mut self, alpha: usize) -> Self {
    self.homogeneity.alpha = alpha;
    self
  }

  pub fn set_gaussian_variance(mut self, variance: f64) -> Self {
    self.homogeneity.gaussian_variance = variance;
    self
  }

  pub fn set_homogeneity_params(mut self, params: HomogeneityParams) -> Self {
    self.homogeneity = params;
    self
  }

  /// Boundary recall search radius, as a fraction of the image diagonal
  pub fn set_boundary_tolerance(mut self, tolerance: f64) -> Self {
    self.tolerance = tolerance;
    self
  }

  pub fn set_target_count(mut self, target: usize) -> Self {
    self.target_count = Some(target);
    self
  }

  pub fn set_min_size(mut self, min_size: usize) -> Self {
    self.min_size = Some(min_size);
    self
  }

  /// Merge regions under the minimum size before counting them
  pub fn set_merge_small(mut self, merge: bool) -> Self {
    self.merge_small = merge;
    self
  }

  /// Also produce a reconstructed image (homogeneity metrics only)
  pub fn set_reconstruction(mut self, reconstruct: bool) -> Self {
    self.reconstruct = reconstruct;
    self
  }

  pub fn build(self) -> EvalResult<Box<dyn Metric + Send + Sync>> {
    use MetricKind::*;
    Ok(match self.kind {
      Homogeneity | ExplainedVariation => {
        if self.kind == Homogeneity {
          self.homogeneity.validate()?;
        }
        Box::new(HomogeneityMetric {
          descriptor_based: self.kind == Homogeneity,
          params: self.homogeneity,
          reconstruct: self.reconstruct,
        })
      }
      BoundaryRecall | UndersegmentationError => {
        if self.kind == BoundaryRecall && !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
          return Err(EvalError::InvalidParameter(format!(
            "boundary tolerance must be finite and >= 0, got {}",
            self.tolerance
          )));
        }
        Box::new(DelineationMetric { recall: self.kind == BoundaryRecall, tolerance: self.tolerance })
      }
      Compactness | Regularity => Box::new(ShapeMetric { compactness: self.kind == Compactness }),
      Connectivity => Box::new(PartitionMetric { kind: Connectivity, target_count: 0, min_size: 0, merge_small: false }),
      RegionCount => {
        let target_count = match self.target_count {
          Some(target) if target >= 1 => target,
          _ => return Err(EvalError::InvalidParameter("region count needs a target count >= 1".into())),
        };
        Box::new(PartitionMetric { kind: RegionCount, target_count, min_size: 0, merge_small: false })
      }
      SmallRegions => {
        let min_size = match self.min_size {
          Some(min_size) if min_size >= 1 => min_size,
          _ => return Err(EvalError::InvalidParameter("small regions needs a minimum size >= 1".into())),
        };
        Box::new(PartitionMetric { kind: SmallRegions, target_count: 0, min_size, merge_small: self.merge_small })
      }
    })
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                    BATCH                                   //
////////////////////////////////////////////////////////////////////////////////

/// Per-image results of a batch, in input order, and their aggregate
#[derive(Debug)]
pub struct BatchReport {
  pub results: Vec<EvalResult<Evaluation>>,
  /// mean score over the successful evaluations, 0 if there are none
  pub mean_score: f64,
  /// mean region count over the successful evaluations, 0 if there are none
  pub mean_region_count: f64,
}

impl BatchReport {
  pub fn successes(&self) -> usize {
    self.results.iter().filter(|r| r.is_ok()).count()
  }
}

impl std::fmt::Display for BatchReport {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "evaluated {}/{} images", self.successes(), self.results.len())?;
    writeln!(f, "mean score: {:.6}", self.mean_score)?;
    write!(f, "mean region count: {:.1}", self.mean_region_count)
  }
}

/// Evaluates every input with `metric`, one image per rayon task
pub fn evaluate_batch<M>(metric: &M, inputs: Vec<EvalInput<'_>>) -> BatchReport
where
  M: Metric + Sync + ?Sized,
{
  #[cfg(feature = "progress")]
  let bar = set_up_bar(inputs.len());

  let results: Vec<EvalResult<Evaluation>> = inputs
    .into_par_iter()
    .map(|input| {
      let result = metric.evaluate(input);
      #[cfg(feature = "progress")]
      bar.inc(1);
      result
    })
    .collect();

  #[cfg(feature = "progress")]
  bar.finish();

  let (mut n, mut score, mut regions) = (0usize, 0.0f64, 0usize);
  for evaluation in results.iter().flatten() {
    n += 1;
    score += evaluation.score;
    regions += evaluation.region_count;
  }
  let (mean_score, mean_region_count) = match n {
    0 => (0.0, 0.0),
    n => (score / n as f64, regions as f64 / n as f64),
  };

  BatchReport { results, mean_score, mean_region_count }
}
