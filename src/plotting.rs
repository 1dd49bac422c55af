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

//! PNG rendering of label grids and per-pixel score maps.
//!
//! The generated plots are png files with no text. Each pixel in the generated
//! image corresponds 1:1 to a pixel of the input grid. Excluded pixels (and
//! `NaN` values of a score map) are drawn in black.

use std::{error::Error, path::Path};

use ndarray as nd;
use num_traits::ToPrimitive;
use plotters::prelude::*;

use crate::grid::{LabelGrid, EXCLUDED};

//Colour for nan px
const NAN_COL: RGBColor = BLACK;

/// Maps `value` in `[min, max]` to a colour
pub type ColourMap = fn(value: f64, min: f64, max: f64) -> Result<RGBColor, Box<dyn Error>>;

#[inline]
fn unit(value: f64, min: f64, max: f64) -> f64 {
  if max > min {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
  } else {
    1.0
  }
}

#[inline(always)]
pub fn grey_scale(value: f64, min: f64, max: f64) -> Result<RGBColor, Box<dyn Error>> {
  if value.is_nan() {
    return Ok(NAN_COL);
  }
  let grey = (255.0 * unit(value, min, max)) as u8;
  Ok(RGBColor(grey, grey, grey))
}

/// Black body ramp: dark red, through orange and yellow, to white
#[inline(always)]
pub fn heat(value: f64, min: f64, max: f64) -> Result<RGBColor, Box<dyn Error>> {
  if value.is_nan() {
    return Ok(NAN_COL);
  }
  let t = unit(value, min, max);
  let channel = |offset: f64| (255.0 * (3.0 * t - offset).clamp(0.0, 1.0)) as u8;
  Ok(RGBColor(channel(0.0).max(40), channel(1.0), channel(2.0)))
}

/// Plots any numeric 2D array of shape `(height, width)`. Values without a
/// floating point representation are drawn as `NaN`.
pub fn plot_slice<T>(slice: nd::ArrayView2<T>, file_name: &Path, colour_map: ColourMap) -> Result<(), Box<dyn Error>>
where
  T: ToPrimitive + Copy,
{
  let values = slice.mapv(|v| v.to_f64().unwrap_or(f64::NAN));

  //Get min and max vals of slice
  let (min, max) = values
    .iter()
    .filter(|v| v.is_finite())
    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));

  //Make new fig
  let (height, width) = values.dim();
  let root = BitMapBackend::new(file_name, (width as u32, height as u32)).into_drawing_area();
  root.fill(&WHITE)?;

  //fill pixels
  for ((y, x), &v) in values.indexed_iter() {
    root.draw_pixel((x as i32, y as i32), &colour_map(v, min, max)?)?;
  }

  //save file
  root.present()?;

  #[cfg(feature = "debug")]
  println!("slice saved as png: {file_name:?}; max:{max:.2}, min:{min:.2}");
  Ok(())
}

/// Plots a label grid, excluded pixels in black
pub fn plot_labels(labels: &LabelGrid, file_name: &Path, colour_map: ColourMap) -> Result<(), Box<dyn Error>> {
  let values = labels.view().mapv(|label| if label == EXCLUDED { f64::NAN } else { label as f64 });
  plot_slice(values.view(), file_name, colour_map)
}
