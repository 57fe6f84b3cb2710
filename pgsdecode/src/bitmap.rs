/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Turns objects into RGBA bitmaps.
//!
//! An object's run-length data is decompressed into rows of palette indexes. Each index is
//! then looked up in a palette whose YCbCr colors have been converted to RGB, while the
//! alpha channel is taken from the palette unchanged.

#[cfg(test)]
mod tests;

pub mod rgb;
pub mod rle;

use crate::{
    segment::{Crop, ObjectDefinitionSegment, PaletteEntry},
    warning::{Warning, Warnings},
};
use image::{imageops, Rgba, RgbaImage};
use rgb::{rgb_pixel, YcbcrPixel};

/// The palette index used to fill scanlines that are narrower than their object.
pub const FILL_INDEX: u8 = 0xFF;

/// The order in which the chroma components of a palette entry are stored.
///
/// Stream producers disagree on this, so it is left up to the caller.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChromaOrder {
    /// The second byte of an entry is Cr and the third is Cb.
    CrCb,
    /// The second byte of an entry is Cb and the third is Cr.
    CbCr,
}

impl Default for ChromaOrder {
    fn default() -> Self { Self::CrCb }
}

impl PaletteEntry {

    /// Interprets the chroma bytes of this entry according to `order`.
    pub fn ycbcr(&self, order: ChromaOrder) -> YcbcrPixel {
        match order {
            ChromaOrder::CrCb => YcbcrPixel { y: self.y, cb: self.cb, cr: self.cr },
            ChromaOrder::CbCr => YcbcrPixel { y: self.y, cb: self.cr, cr: self.cb },
        }
    }

    pub fn rgba(&self, order: ChromaOrder) -> Rgba<u8> {
        let rgb = rgb_pixel(self.ycbcr(order));
        Rgba([rgb.red, rgb.green, rgb.blue, self.alpha])
    }
}

/// Converts every entry of a palette into an RGBA color.
pub fn palette_colors(entries: &[PaletteEntry; 256], order: ChromaOrder) -> [Rgba<u8>; 256] {

    let mut colors = [Rgba([0, 0, 0, 0]); 256];

    for (color, entry) in colors.iter_mut().zip(entries.iter()) {
        *color = entry.rgba(order);
    }

    colors
}

/// Decodes an object into a bitmap using the given palette.
///
/// The bitmap is as wide as the object and has one row per decoded scanline. Short scanlines
/// are padded on the left with [`FILL_INDEX`] and long ones are cut off at the object width.
pub fn render_object(
    object: &ObjectDefinitionSegment,
    palette: &[PaletteEntry; 256],
    order: ChromaOrder,
    warnings: &mut Warnings,
) -> RgbaImage {

    let width = object.width().unwrap_or(0);
    let lines = rle::decode_lines(&object.data, width, warnings);

    if let Some(height) = object.height() {
        if lines.len() != height as usize {
            warnings.push(Warning::RowCountMismatch { declared: height, found: lines.len() });
        }
    }

    let colors = palette_colors(palette, order);
    let mut image = RgbaImage::new(width as u32, lines.len() as u32);

    for (row, line) in lines.iter().enumerate() {

        let padding = (width as usize).saturating_sub(line.len());

        for x in 0..width as usize {
            let index = if x < padding { FILL_INDEX } else { line[x - padding] };
            image.put_pixel(x as u32, row as u32, colors[index as usize]);
        }
    }

    image
}

/// Cuts the crop rectangle out of a bitmap.
///
/// The result always has the size of the crop rectangle. Any part of the rectangle that lies
/// outside of the bitmap is transparent.
pub fn crop_image(image: &RgbaImage, crop: &Crop) -> RgbaImage {

    let mut cropped = RgbaImage::new(crop.width as u32, crop.height as u32);
    let visible = imageops::crop_imm(
        image,
        crop.x as u32,
        crop.y as u32,
        crop.width as u32,
        crop.height as u32,
    ).to_image();

    imageops::replace(&mut cropped, &visible, 0, 0);

    cropped
}
