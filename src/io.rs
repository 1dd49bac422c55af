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

//! Reading and writing grids.
//!
//! Colour grids go through any raster format the `image` crate can decode.
//! Label grids are read from and written to delimited text when the path ends
//! in `.csv` or `.txt` (comma- or whitespace-separated integers, one image row
//! per line, `-1` for excluded pixels), and to 16-bit greyscale rasters
//! otherwise.

use std::path::Path;

use image::{ImageBuffer, Luma, Rgb};
use ndarray as nd;

use crate::{
  error::{EvalError, EvalResult},
  grid::{ColourGrid, LabelGrid, EXCLUDED},
};

fn is_text(path: &Path) -> bool {
  matches!(
    path.extension().and_then(|ext| ext.to_str()).map(|ext| ext.to_ascii_lowercase()).as_deref(),
    Some("csv") | Some("txt")
  )
}

fn image_error(path: &Path) -> impl FnOnce(image::ImageError) -> EvalError + '_ {
  move |source| EvalError::Image { path: path.to_path_buf(), source }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> EvalError + '_ {
  move |source| EvalError::Io { path: path.to_path_buf(), source }
}

////////////////////////////////////////////////////////////////////////////////
//                                COLOUR GRIDS                                //
////////////////////////////////////////////////////////////////////////////////

/// Decodes an image. Greyscale images keep a single channel, colour images are
/// converted to Y/Cb/Cr.
pub fn load_colour_grid(path: &Path) -> EvalResult<ColourGrid> {
  let img = image::open(path).map_err(image_error(path))?;
  let (width, height) = (img.width() as usize, img.height() as usize);
  if img.color().has_color() {
    let rgb = img.to_rgb8();
    let rgb = nd::ArrayView3::from_shape((height, width, 3), rgb.as_raw())
      .map_err(|err| EvalError::Unrepresentable(err.to_string()))?;
    ColourGrid::from_rgb(rgb)
  } else {
    let luma = img.to_luma8().into_raw();
    let data = nd::Array3::from_shape_vec((height, width, 1), luma)
      .map_err(|err| EvalError::Unrepresentable(err.to_string()))?;
    ColourGrid::from_array(data)
  }
}

/// Encodes a colour grid as RGB, in the format implied by the extension
pub fn save_colour_grid(grid: &ColourGrid, path: &Path) -> EvalResult<()> {
  let (width, height) = grid.dims();
  let raw = grid.to_rgb().into_raw_vec();
  let buf: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_raw(width as u32, height as u32, raw)
    .ok_or_else(|| EvalError::Unrepresentable(format!("{width}x{height} RGB buffer")))?;
  buf.save(path).map_err(image_error(path))
}

////////////////////////////////////////////////////////////////////////////////
//                                 LABEL GRIDS                                //
////////////////////////////////////////////////////////////////////////////////

fn parse_label_text(text: &str, path: &Path) -> EvalResult<LabelGrid> {
  let parse_error = |line: usize, message: String| EvalError::Parse { path: path.to_path_buf(), line, message };

  let mut labels = Vec::new();
  let (mut width, mut height) = (None, 0usize);
  for (idx, line) in text.lines().enumerate() {
    let row = line
      .split(|c: char| c == ',' || c.is_whitespace())
      .filter(|field| !field.is_empty())
      .map(|field| field.parse::<i32>().map_err(|err| parse_error(idx + 1, format!("{field:?}: {err}"))))
      .collect::<EvalResult<Vec<_>>>()?;
    if row.is_empty() {
      continue;
    }
    match width {
      None => width = Some(row.len()),
      Some(w) if w != row.len() => {
        return Err(parse_error(idx + 1, format!("expected {w} labels, found {}", row.len())))
      }
      Some(_) => {}
    }
    labels.extend(row);
    height += 1;
  }

  LabelGrid::from_vec(width.unwrap_or(0), height, labels)
}

/// Reads a label grid from delimited text (`.csv`, `.txt`) or from a
/// greyscale raster, whose 16-bit luma values become the labels
pub fn load_label_grid(path: &Path) -> EvalResult<LabelGrid> {
  if is_text(path) {
    let text = std::fs::read_to_string(path).map_err(io_error(path))?;
    return parse_label_text(&text, path);
  }
  let luma = image::open(path).map_err(image_error(path))?.to_luma16();
  let (width, height) = (luma.width() as usize, luma.height() as usize);
  let data = nd::Array2::from_shape_vec((height, width), luma.into_raw())
    .map_err(|err| EvalError::Unrepresentable(err.to_string()))?;
  LabelGrid::from_primitive(data.view())
}

/// Writes a label grid as delimited text (`.csv` comma-separated, `.txt`
/// space-separated) or as a 16-bit greyscale raster. Rasters cannot hold
/// excluded pixels or labels above `u16::MAX`.
pub fn save_label_grid(labels: &LabelGrid, path: &Path) -> EvalResult<()> {
  let (width, height) = labels.dims();
  if is_text(path) {
    let sep = if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("csv")) { "," } else { " " };
    let mut text = String::with_capacity(labels.len() * 4);
    for row in labels.view().rows() {
      let fields: Vec<String> = row.iter().map(|label| label.to_string()).collect();
      text.push_str(&fields.join(sep));
      text.push('\n');
    }
    return std::fs::write(path, text).map_err(io_error(path));
  }

  if let Some(label) = labels.iter().find(|&l| l == EXCLUDED || l > u16::MAX as i32) {
    return Err(EvalError::Unrepresentable(format!("label {label} does not fit a 16-bit raster")));
  }
  let raw: Vec<u16> = labels.iter().map(|label| label as u16).collect();
  let buf: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_raw(width as u32, height as u32, raw)
    .ok_or_else(|| EvalError::Unrepresentable(format!("{width}x{height} label buffer")))?;
  buf.save(path).map_err(image_error(path))
}
