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

//! Conversion between 8-bit RGB and studio-swing Y/Cb/Cr (ITU-R BT.601).

#[inline]
fn clamp_u8(v: f64) -> u8 {
  v.round().clamp(0.0, 255.0) as u8
}

/// RGB to Y/Cb/Cr. Y lies in `16..=235`, Cb and Cr in `16..=240`.
pub fn rgb_to_ycbcr([r, g, b]: [u8; 3]) -> [u8; 3] {
  let (r, g, b) = (r as f64, g as f64, b as f64);
  [
    clamp_u8(0.257 * r + 0.504 * g + 0.098 * b + 16.0),
    clamp_u8(-0.148 * r - 0.291 * g + 0.439 * b + 128.0),
    clamp_u8(0.439 * r - 0.368 * g - 0.071 * b + 128.0),
  ]
}

/// Y/Cb/Cr to RGB, clamping out-of-gamut results
pub fn ycbcr_to_rgb([y, cb, cr]: [u8; 3]) -> [u8; 3] {
  let (y, cb, cr) = (1.164 * (y as f64 - 16.0), cb as f64 - 128.0, cr as f64 - 128.0);
  [clamp_u8(y + 1.596 * cr), clamp_u8(y - 0.392 * cb - 0.813 * cr), clamp_u8(y + 2.017 * cb)]
}
