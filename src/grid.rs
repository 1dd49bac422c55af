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

//! Dense pixel grids.
//!
//! Label grids and colour grids share the same layout: an `ndarray` array whose
//! first axis is the row (`y`) and whose second axis is the column (`x`). Every
//! algorithm in this crate addresses pixels by their linear id
//! `p = y * width + x`, which is also the logical iteration order of the
//! underlying arrays.

use std::collections::HashMap;

use ndarray as nd;
use num_traits::ToPrimitive;

use crate::colour::{rgb_to_ycbcr, ycbcr_to_rgb};
use crate::error::{EvalError, EvalResult};

/// Label value of pixels that are excluded from all processing
pub const EXCLUDED: i32 = -1;

//Offsets of the 8- and 4-connected neighbourhoods, in row-major scan order
const OFFSETS_8CON: [(isize, isize); 8] =
  [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];
const OFFSETS_4CON: [(isize, isize); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];

////////////////////////////////////////////////////////////////////////////////
//                              HELPER FUNCTIONS                              //
////////////////////////////////////////////////////////////////////////////////

#[inline]
fn neighbours(
  offsets: &'static [(isize, isize)],
  p: usize,
  width: usize,
  height: usize,
) -> impl Iterator<Item = usize> {
  let (x, y) = ((p % width) as isize, (p / width) as isize);
  offsets.iter().filter_map(move |&(dx, dy)| {
    let (nx, ny) = (x + dx, y + dy);
    if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
      None
    } else {
      Some(ny as usize * width + nx as usize)
    }
  })
}

/// Linear ids of the (up to eight) pixels surrounding `p`
#[inline]
pub(crate) fn neighbours_8con(p: usize, width: usize, height: usize) -> impl Iterator<Item = usize> {
  neighbours(&OFFSETS_8CON, p, width, height)
}

/// Linear ids of the (up to four) pixels sharing an edge with `p`
#[inline]
pub(crate) fn neighbours_4con(p: usize, width: usize, height: usize) -> impl Iterator<Item = usize> {
  neighbours(&OFFSETS_4CON, p, width, height)
}

/// Fails with `DimensionMismatch` unless both (width, height) pairs agree
pub(crate) fn check_dims(expected: (usize, usize), actual: (usize, usize)) -> EvalResult<()> {
  if expected != actual {
    Err(EvalError::DimensionMismatch { expected, actual })
  } else {
    Ok(())
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                 PARTITIONS                                 //
////////////////////////////////////////////////////////////////////////////////

/// Anything that splits a grid into cells that can be compared for equality.
///
/// Boundary detection only needs to know whether two pixels belong to the same
/// cell, so it is written once against this trait and works for label grids,
/// colour-coded ground truths and greyscale masks alike.
pub trait Partition {
  fn width(&self) -> usize;
  fn height(&self) -> usize;
  /// `true` if pixels `p` and `q` carry the same label (or colour)
  fn same_cell(&self, p: usize, q: usize) -> bool;
}

////////////////////////////////////////////////////////////////////////////////
//                                 LABEL GRID                                 //
////////////////////////////////////////////////////////////////////////////////

/// A `width` x `height` grid of region labels.
///
/// Labels are signed integers. The value [`EXCLUDED`] (-1) marks masked pixels
/// that belong to no region; any value below it is rejected on construction.
/// After [`normalize_connectivity`](crate::connectivity::normalize_connectivity)
/// the remaining labels are the dense ids `0..K`, one per connected region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGrid {
  data: nd::Array2<i32>,
}

impl LabelGrid {
  /// Creates a grid with every pixel in region 0
  pub fn new(width: usize, height: usize) -> Self {
    LabelGrid { data: nd::Array2::zeros((height, width)) }
  }

  /// Wraps an array of shape `(height, width)`
  pub fn from_array(data: nd::Array2<i32>) -> EvalResult<Self> {
    if let Some((index, label)) = data.iter().enumerate().find(|(_, label)| **label < EXCLUDED) {
      return Err(EvalError::InvalidLabel { index, label: *label as i64 });
    }
    Ok(LabelGrid { data: data.as_standard_layout().into_owned() })
  }

  /// Builds a grid from row-major labels
  pub fn from_vec(width: usize, height: usize, labels: Vec<i32>) -> EvalResult<Self> {
    let len = labels.len();
    let data = nd::Array2::from_shape_vec((height, width), labels)
      .map_err(|_| EvalError::DimensionMismatch { expected: (width, height), actual: (len, 1) })?;
    Self::from_array(data)
  }

  /// Converts an array of any numeric type into labels. Values that have no
  /// integer representation (`NaN`, infinities) become [`EXCLUDED`].
  pub fn from_primitive<T>(view: nd::ArrayView2<T>) -> EvalResult<Self>
  where
    T: ToPrimitive + Copy,
  {
    let mut data = nd::Array2::<i32>::zeros(view.raw_dim());
    for (index, (dst, src)) in data.iter_mut().zip(view.iter()).enumerate() {
      *dst = match src.to_i64() {
        None => EXCLUDED,
        Some(label) if label < EXCLUDED as i64 || label > i32::MAX as i64 => {
          return Err(EvalError::InvalidLabel { index, label })
        }
        Some(label) => label as i32,
      };
    }
    Ok(LabelGrid { data })
  }

  #[inline]
  pub fn width(&self) -> usize {
    self.data.ncols()
  }

  #[inline]
  pub fn height(&self) -> usize {
    self.data.nrows()
  }

  /// (width, height)
  #[inline]
  pub fn dims(&self) -> (usize, usize) {
    (self.width(), self.height())
  }

  /// Number of pixels
  #[inline]
  pub fn len(&self) -> usize {
    self.data.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.data.is_empty()
  }

  /// (x, y) coordinates of pixel `p`
  #[inline]
  pub fn coords(&self, p: usize) -> (usize, usize) {
    (p % self.width(), p / self.width())
  }

  /// Linear id of the pixel at (x, y)
  #[inline]
  pub fn index(&self, x: usize, y: usize) -> usize {
    y * self.width() + x
  }

  /// Label of pixel `p`. Panics if `p` lies outside the grid.
  #[inline]
  pub fn at(&self, p: usize) -> i32 {
    let width = self.width();
    self.data[[p / width, p % width]]
  }

  /// Label at (x, y), or `None` outside the grid
  #[inline]
  pub fn get(&self, x: usize, y: usize) -> Option<i32> {
    self.data.get([y, x]).copied()
  }

  /// Overwrites the label of pixel `p`. Panics if `p` lies outside the grid or
  /// if `label` is below [`EXCLUDED`].
  #[inline]
  pub fn set(&mut self, p: usize, label: i32) {
    assert!(label >= EXCLUDED, "label {label} is below the exclusion sentinel");
    let width = self.width();
    self.data[[p / width, p % width]] = label;
  }

  #[inline]
  pub fn is_excluded(&self, p: usize) -> bool {
    self.at(p) == EXCLUDED
  }

  /// Iterates over all labels in linear-id order
  pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
    self.data.iter().copied()
  }

  /// Number of non-excluded pixels
  pub fn valid_pixels(&self) -> usize {
    self.data.iter().filter(|&&label| label != EXCLUDED).count()
  }

  /// Highest label + 1, or 0 if every pixel is excluded. For a normalized grid
  /// this is the number of regions.
  pub fn region_count(&self) -> usize {
    self.data.iter().copied().max().map_or(0, |max| (max + 1).max(0) as usize)
  }

  /// Pixel count per label, indexed by label, `region_count()` long
  pub fn region_areas(&self) -> Vec<usize> {
    let mut areas = vec![0usize; self.region_count()];
    self.data.iter().filter(|&&label| label != EXCLUDED).for_each(|&label| areas[label as usize] += 1);
    areas
  }

  /// Replaces every non-excluded label `l` by `colour_map[l]`
  pub(crate) fn recolour(&mut self, colour_map: &[usize]) {
    self.data.mapv_inplace(|label| if label == EXCLUDED { label } else { colour_map[label as usize] as i32 })
  }

  pub fn view(&self) -> nd::ArrayView2<'_, i32> {
    self.data.view()
  }

  pub fn into_array(self) -> nd::Array2<i32> {
    self.data
  }
}

impl Partition for LabelGrid {
  fn width(&self) -> usize {
    LabelGrid::width(self)
  }
  fn height(&self) -> usize {
    LabelGrid::height(self)
  }
  fn same_cell(&self, p: usize, q: usize) -> bool {
    self.at(p) == self.at(q)
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                 COLOUR GRID                                //
////////////////////////////////////////////////////////////////////////////////

/// A `width` x `height` grid of 8-bit luma/chroma samples.
///
/// The third axis holds either three channels (Y, Cb, Cr) or a single
/// greyscale channel. Metrics always read a pixel as three channels; a
/// greyscale sample is repeated on all three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColourGrid {
  data: nd::Array3<u8>,
}

impl ColourGrid {
  /// Creates a black grid with `channels` (1 or 3) channels
  pub fn new(width: usize, height: usize, channels: usize) -> EvalResult<Self> {
    Self::from_array(nd::Array3::zeros((height, width, channels)))
  }

  /// Wraps an array of shape `(height, width, channels)` holding Y/Cb/Cr (or
  /// greyscale) samples
  pub fn from_array(data: nd::Array3<u8>) -> EvalResult<Self> {
    let channels = data.shape()[2];
    if channels != 1 && channels != 3 {
      return Err(EvalError::InvalidParameter(format!(
        "colour grids need 1 or 3 channels, got {channels}"
      )));
    }
    Ok(ColourGrid { data: data.as_standard_layout().into_owned() })
  }

  /// Converts an RGB array of shape `(height, width, 3)` to luma/chroma
  pub fn from_rgb(rgb: nd::ArrayView3<u8>) -> EvalResult<Self> {
    if rgb.shape()[2] != 3 {
      return Err(EvalError::InvalidParameter(format!(
        "RGB input needs 3 channels, got {}",
        rgb.shape()[2]
      )));
    }
    let mut data = nd::Array3::<u8>::zeros(rgb.raw_dim());
    nd::Zip::from(data.lanes_mut(nd::Axis(2))).and(rgb.lanes(nd::Axis(2))).for_each(|mut dst, src| {
      let ycc = rgb_to_ycbcr([src[0], src[1], src[2]]);
      dst.iter_mut().zip(ycc).for_each(|(d, v)| *d = v);
    });
    Ok(ColourGrid { data })
  }

  /// Converts an array of any numeric type, clamping samples to `0..=255`.
  /// `NaN` samples become 0.
  pub fn from_primitive<T>(view: nd::ArrayView3<T>) -> EvalResult<Self>
  where
    T: ToPrimitive + Copy,
  {
    Self::from_array(view.mapv(|v| v.to_f64().filter(|v| !v.is_nan()).map_or(0, |v| v.round().clamp(0.0, 255.0) as u8)))
  }

  /// RGB rendering of this grid, shape `(height, width, 3)`
  pub fn to_rgb(&self) -> nd::Array3<u8> {
    let (width, height) = self.dims();
    let mut rgb = nd::Array3::<u8>::zeros((height, width, 3));
    for (p, mut lane) in rgb.lanes_mut(nd::Axis(2)).into_iter().enumerate() {
      let px = if self.is_colour() { ycbcr_to_rgb(self.pixel(p)) } else { self.pixel(p) };
      lane.iter_mut().zip(px).for_each(|(d, v)| *d = v);
    }
    rgb
  }

  #[inline]
  pub fn width(&self) -> usize {
    self.data.shape()[1]
  }

  #[inline]
  pub fn height(&self) -> usize {
    self.data.shape()[0]
  }

  /// (width, height)
  #[inline]
  pub fn dims(&self) -> (usize, usize) {
    (self.width(), self.height())
  }

  #[inline]
  pub fn channels(&self) -> usize {
    self.data.shape()[2]
  }

  #[inline]
  pub fn is_colour(&self) -> bool {
    self.channels() == 3
  }

  /// Number of pixels
  #[inline]
  pub fn len(&self) -> usize {
    self.width() * self.height()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The three channel values of pixel `p`. Panics outside the grid.
  #[inline]
  pub fn pixel(&self, p: usize) -> [u8; 3] {
    let (y, x) = (p / self.width(), p % self.width());
    if self.is_colour() {
      [self.data[[y, x, 0]], self.data[[y, x, 1]], self.data[[y, x, 2]]]
    } else {
      let v = self.data[[y, x, 0]];
      [v, v, v]
    }
  }

  /// Pixel `p` as three channels scaled to `[0, 1]`
  #[inline]
  pub fn normalized(&self, p: usize) -> [f64; 3] {
    self.pixel(p).map(|v| v as f64 / 255.0)
  }

  /// Writes pixel `p`. Greyscale grids keep the first channel only.
  #[inline]
  pub fn set_pixel(&mut self, p: usize, value: [u8; 3]) {
    let (y, x) = (p / self.width(), p % self.width());
    for c in 0..self.channels() {
      self.data[[y, x, c]] = value[c];
    }
  }

  pub fn view(&self) -> nd::ArrayView3<'_, u8> {
    self.data.view()
  }

  pub fn into_array(self) -> nd::Array3<u8> {
    self.data
  }
}

impl Partition for ColourGrid {
  fn width(&self) -> usize {
    ColourGrid::width(self)
  }
  fn height(&self) -> usize {
    ColourGrid::height(self)
  }
  fn same_cell(&self, p: usize, q: usize) -> bool {
    self.pixel(p) == self.pixel(q)
  }
}

////////////////////////////////////////////////////////////////////////////////
//                                GROUND TRUTH                                //
////////////////////////////////////////////////////////////////////////////////

/// A reference partition, given either as labels or as a colour-coded image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundTruth {
  Labels(LabelGrid),
  Colours(ColourGrid),
}

impl GroundTruth {
  /// Segment ids of this ground truth. A colour-coded ground truth gets one id
  /// per distinct colour, numbered in scan order.
  pub fn segments(&self) -> LabelGrid {
    match self {
      GroundTruth::Labels(labels) => labels.clone(),
      GroundTruth::Colours(colours) => {
        let mut ids: HashMap<[u8; 3], i32> = HashMap::new();
        let mut segments = LabelGrid::new(colours.width(), colours.height());
        for p in 0..colours.len() {
          let next = ids.len() as i32;
          let id = *ids.entry(colours.pixel(p)).or_insert(next);
          segments.set(p, id);
        }
        segments
      }
    }
  }

  /// (width, height)
  pub fn dims(&self) -> (usize, usize) {
    match self {
      GroundTruth::Labels(labels) => labels.dims(),
      GroundTruth::Colours(colours) => colours.dims(),
    }
  }
}

impl Partition for GroundTruth {
  fn width(&self) -> usize {
    self.dims().0
  }
  fn height(&self) -> usize {
    self.dims().1
  }
  fn same_cell(&self, p: usize, q: usize) -> bool {
    match self {
      GroundTruth::Labels(labels) => labels.same_cell(p, q),
      GroundTruth::Colours(colours) => colours.same_cell(p, q),
    }
  }
}
