/*
 * Copyright © 2021 William Swartzendruber
 * Licensed under the Open Software License version 3.0
 */

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YcbcrPixel {
    pub y: u8,
    pub cb: u8,
    pub cr: u8,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RgbPixel {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Rows of the full-range YCbCr to RGB transform, applied to `[Y, Cb - 128, Cr - 128]`.
const YCBCR_TO_RGB: [[f64; 3]; 3] = [
    [1.0, 0.0, 1.402],
    [1.0, -0.34414, -0.71414],
    [1.0, 1.772, 0.0],
];

pub fn rgb_pixel(input: YcbcrPixel) -> RgbPixel {

    let ycbcr = [input.y as f64, input.cb as f64 - 128.0, input.cr as f64 - 128.0];
    let channel = |row: &[f64; 3]| {
        let value = row[0] * ycbcr[0] + row[1] * ycbcr[1] + row[2] * ycbcr[2];
        value.max(0.0).min(255.0).round() as u8
    };

    RgbPixel {
        red: channel(&YCBCR_TO_RGB[0]),
        green: channel(&YCBCR_TO_RGB[1]),
        blue: channel(&YCBCR_TO_RGB[2]),
    }
}
