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

//! Colour homogeneity metrics.
//!
//! Both metrics score how well each region can be summarised by a small colour
//! model. Explained variation uses the region's mean colour. The descriptor
//! based metric uses the dominant colours of a [`RegionDescriptor`], which
//! rewards regions with a few clean modes instead of penalising them.

use crate::{
  descriptor::describe_regions,
  error::{EvalError, EvalResult},
  grid::{check_dims, ColourGrid, LabelGrid, EXCLUDED},
};

/// Parameters of the descriptor-based homogeneity metric
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HomogeneityParams {
  /// intensity bins per channel-dominance group
  pub buckets: usize,
  /// number of dominant colours kept per region
  pub alpha: usize,
  /// sensitivity of the score to the mean error
  pub gaussian_variance: f64,
}

impl Default for HomogeneityParams {
  fn default() -> Self {
    HomogeneityParams { buckets: 16, alpha: 4, gaussian_variance: 0.01 }
  }
}

impl HomogeneityParams {
  pub fn validate(&self) -> EvalResult<()> {
    if self.buckets == 0 {
      return Err(EvalError::InvalidParameter("need at least one bucket per channel".into()));
    }
    if self.alpha == 0 || self.alpha > 7 * self.buckets {
      return Err(EvalError::InvalidParameter(format!(
        "alpha must lie in 1..={}, got {}",
        7 * self.buckets,
        self.alpha
      )));
    }
    if !(self.gaussian_variance > 0.0) {
      return Err(EvalError::InvalidParameter(format!(
        "gaussian variance must be positive, got {}",
        self.gaussian_variance
      )));
    }
    Ok(())
  }
}

/// Global and per-region result of a homogeneity metric
#[derive(Debug, Clone, PartialEq)]
pub struct RegionScores {
  pub score: f64,
  /// indexed by label; regions without pixels score 0
  pub per_region: Vec<f64>,
  /// every pixel replaced by the colour model of its region
  pub reconstruction: Option<ColourGrid>,
}

#[inline]
fn to_u8(v: f64) -> u8 {
  v.round().clamp(0.0, 255.0) as u8
}

////////////////////////////////////////////////////////////////////////////////
//                          DESCRIPTOR HOMOGENEITY                            //
////////////////////////////////////////////////////////////////////////////////

/// Descriptor-based colour homogeneity.
///
/// Each pixel is compared with the closest dominant colour of its region. The
/// absolute per-channel error (on a `[0, 1]` scale) is raised to
/// `max(2 - spread, 0.001)`, where `spread` is how far the region's dominant
/// colours lie apart on that channel. A region scores the channel average of
/// `exp(-mean_error / gaussian_variance)`; the global score applies the same
/// map to the channel-averaged error over all valid pixels.
pub fn descriptor_homogeneity(
  labels: &LabelGrid,
  colours: &ColourGrid,
  params: &HomogeneityParams,
  reconstruct: bool,
) -> EvalResult<RegionScores> {
  check_dims(labels.dims(), colours.dims())?;
  params.validate()?;
  let (width, height) = labels.dims();

  //(1) colour models of all regions
  let descriptors = describe_regions(labels, colours, params.buckets, params.alpha)?;
  let normalized: Vec<_> = descriptors.iter().map(|d| d.normalized()).collect();
  let spreads: Vec<[f64; 3]> = normalized.iter().map(|d| d.spread()).collect();

  //(2) accumulate the error of every pixel against its nearest model colour
  let count = descriptors.len();
  let mut errors = vec![[0.0f64; 3]; count];
  let mut sizes = vec![0usize; count];
  let mut valid = 0usize;
  let mut recon = if reconstruct { Some(ColourGrid::new(width, height, colours.channels())?) } else { None };

  for p in 0..labels.len() {
    let label = labels.at(p);
    if label == EXCLUDED {
      continue;
    }
    let region = label as usize;
    let px = colours.normalized(p);
    let Some(nearest) = normalized[region].nearest(px) else { continue };
    let centroid = normalized[region].centroids()[nearest];

    for c in 0..3 {
      let exponent = (2.0 - spreads[region][c]).max(0.001);
      errors[region][c] += (px[c] - centroid[c]).abs().powf(exponent);
    }
    sizes[region] += 1;
    valid += 1;

    if let Some(recon) = recon.as_mut() {
      recon.set_pixel(p, descriptors[region].centroids()[nearest].map(to_u8));
    }
  }

  //(3) map the errors to scores
  let gv = params.gaussian_variance;
  let per_region = errors
    .iter()
    .zip(sizes.iter())
    .map(|(err, &size)| match size {
      0 => 0.0,
      size => err.iter().map(|e| (-(e / size as f64) / gv).exp()).sum::<f64>() / 3.0,
    })
    .collect();

  let score = match valid {
    0 => 0.0,
    valid => {
      let total: f64 = errors.iter().flat_map(|err| err.iter()).sum();
      (-(total / 3.0 / valid as f64) / gv).exp()
    }
  };

  Ok(RegionScores { score, per_region, reconstruction: recon })
}

////////////////////////////////////////////////////////////////////////////////
//                            EXPLAINED VARIATION                             //
////////////////////////////////////////////////////////////////////////////////

/// Explained variation: the share of the image's colour variance that is
/// accounted for by replacing each pixel with the mean colour of its region.
///
/// A region with zero total variance scores 1, so does an image with zero total
/// variance. Regions without pixels score 0, as does an image without valid
/// pixels.
pub fn explained_variation(labels: &LabelGrid, colours: &ColourGrid, reconstruct: bool) -> EvalResult<RegionScores> {
  check_dims(labels.dims(), colours.dims())?;
  let (width, height) = labels.dims();
  let count = labels.region_count();

  //(1) region means and overall mean
  let mut means = vec![[0.0f64; 3]; count];
  let mut sizes = vec![0usize; count];
  let mut overall = [0.0f64; 3];
  let mut valid = 0usize;
  for p in (0..labels.len()).filter(|&p| labels.at(p) != EXCLUDED) {
    let region = labels.at(p) as usize;
    let px = colours.pixel(p);
    for c in 0..3 {
      means[region][c] += px[c] as f64;
      overall[c] += px[c] as f64;
    }
    sizes[region] += 1;
    valid += 1;
  }
  if valid == 0 {
    let recon = if reconstruct { Some(ColourGrid::new(width, height, colours.channels())?) } else { None };
    return Ok(RegionScores { score: 0.0, per_region: vec![0.0; count], reconstruction: recon });
  }
  for (mean, &size) in means.iter_mut().zip(sizes.iter()) {
    if size > 0 {
      mean.iter_mut().for_each(|m| *m /= size as f64);
    }
  }
  overall.iter_mut().for_each(|m| *m /= valid as f64);

  //(2) between-region and total sums of squares
  let mut between = vec![0.0f64; count];
  let mut total = vec![0.0f64; count];
  let mut recon = if reconstruct { Some(ColourGrid::new(width, height, colours.channels())?) } else { None };
  for p in (0..labels.len()).filter(|&p| labels.at(p) != EXCLUDED) {
    let region = labels.at(p) as usize;
    let px = colours.pixel(p);
    for c in 0..3 {
      between[region] += (means[region][c] - overall[c]).powi(2);
      total[region] += (px[c] as f64 - overall[c]).powi(2);
    }
    if let Some(recon) = recon.as_mut() {
      recon.set_pixel(p, means[region].map(to_u8));
    }
  }

  //(3) ratios
  let per_region = (0..count)
    .map(|r| match (sizes[r], total[r]) {
      (0, _) => 0.0,
      (_, t) if t == 0.0 => 1.0,
      (_, t) => between[r] / t,
    })
    .collect();
  let (sum_between, sum_total): (f64, f64) = (between.iter().sum(), total.iter().sum());
  let score = if sum_total == 0.0 { 1.0 } else { sum_between / sum_total };

  Ok(RegionScores { score, per_region, reconstruction: recon })
}
