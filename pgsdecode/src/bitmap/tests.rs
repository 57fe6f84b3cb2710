/*
 * Any copyright is dedicated to the Public Domain.
 * https://creativecommons.org/publicdomain/zero/1.0/
 */

use super::{
    *,
    rgb::RgbPixel,
    rle::{decode_lines, encode_lines},
};
use crate::segment::ObjectInfo;
use rand::{thread_rng, Rng};

fn object(width: u16, height: u16, data: Vec<u8>) -> ObjectDefinitionSegment {
    ObjectDefinitionSegment {
        pts: 0,
        dts: 0,
        id: 0,
        version: 0,
        is_first: true,
        is_last: true,
        info: Some(
            ObjectInfo {
                data_length: data.len() as u32 + 4,
                width,
                height,
            }
        ),
        data,
    }
}

fn opaque_palette() -> [PaletteEntry; 256] {

    let mut entries = [PaletteEntry::default(); 256];

    entries[1] = PaletteEntry { y: 235, cr: 128, cb: 128, alpha: 255 };
    entries[2] = PaletteEntry { y: 16, cr: 128, cb: 128, alpha: 128 };
    entries[0xFF] = PaletteEntry { y: 255, cr: 128, cb: 128, alpha: 255 };

    entries
}

#[test]
fn test_decode_every_opcode() {

    let data = vec![
        0x07,                   // one pixel of color 7
        0x00, 0x03,             // three pixels of color 0
        0x00, 0x40, 0x41,       // 65 pixels of color 0
        0x00, 0x84, 0x09,       // four pixels of color 9
        0x00, 0xC1, 0x02, 0x05, // 258 pixels of color 5
        0x00, 0x00,             // end of line
    ];
    let mut warnings = Warnings::new();
    let lines = decode_lines(&data, 400, &mut warnings);
    let mut expected = vec![7u8];

    expected.extend(vec![0u8; 3 + 65]);
    expected.extend(vec![9u8; 4]);
    expected.extend(vec![5u8; 258]);

    assert_eq!(lines, vec![expected]);
    assert!(warnings.is_empty());
}

#[test]
fn test_rle_cycle() {

    let mut rng = thread_rng();
    let mut line = vec![];

    line.push(3);
    line.extend(vec![0u8; 40]);
    line.push(1);
    line.extend(vec![0u8; 300]);
    line.extend(vec![6u8; 20]);
    line.extend(vec![8u8; 1000]);
    line.extend(vec![2u8; 2]);

    for _ in 0..64 {
        line.push(rng.gen());
    }

    let lines = vec![line, vec![], vec![0u8; 20_000]];
    let mut warnings = Warnings::new();

    assert_eq!(decode_lines(&encode_lines(&lines), u16::MAX, &mut warnings), lines);
    assert!(warnings.is_empty());
}

#[test]
fn test_empty_line_is_kept() {

    let mut warnings = Warnings::new();
    let lines = decode_lines(&[0x00, 0x00, 0x01, 0x00, 0x00], 8, &mut warnings);

    assert_eq!(lines, vec![vec![], vec![1]]);
    assert!(warnings.is_empty());
}

#[test]
fn test_hanging_pixels_are_dropped() {

    let mut warnings = Warnings::new();
    let lines = decode_lines(&[0x01, 0x00, 0x00, 0x02, 0x00, 0x83, 0x04], 8, &mut warnings);

    assert_eq!(lines, vec![vec![1]]);
    assert_eq!(warnings.as_slice(), &[Warning::HangingPixels { pixels: 4 }]);
}

#[test]
fn test_truncated_opcode() {

    let mut warnings = Warnings::new();
    let lines = decode_lines(&[0x01, 0x00, 0x00, 0x00, 0xC1], 8, &mut warnings);

    assert_eq!(lines, vec![vec![1]]);
    assert_eq!(warnings.as_slice(), &[Warning::TruncatedRunLength { offset: 3 }]);
}

#[test]
fn test_long_runs_stop_at_width() {

    let mut data = vec![];

    for _ in 0..1_000 {
        data.extend_from_slice(&[0x00, 0xFF, 0xFF, 0x01]);
    }
    data.extend_from_slice(&[0x02, 0x00, 0x00, 0x03, 0x00, 0x00]);

    let mut warnings = Warnings::new();
    let lines = decode_lines(&data, 720, &mut warnings);

    assert_eq!(lines, vec![vec![1u8; 720], vec![3]]);
    assert_eq!(
        warnings.as_slice(),
        &[Warning::ScanlineTooLong { row: 0, length: 16_383_001, width: 720 }],
    );
}

#[test]
fn test_overflowing_hanging_pixels_are_counted() {

    let mut warnings = Warnings::new();
    let lines = decode_lines(&[0x00, 0x8A, 0x05], 4, &mut warnings);

    assert!(lines.is_empty());
    assert_eq!(warnings.as_slice(), &[Warning::HangingPixels { pixels: 10 }]);
}

#[test]
fn test_studio_white_is_neutral_gray() {

    let rgb = rgb::rgb_pixel(rgb::YcbcrPixel { y: 235, cb: 128, cr: 128 });

    assert_eq!(rgb, RgbPixel { red: 235, green: 235, blue: 235 });
}

#[test]
fn test_conversion_saturates() {

    assert_eq!(
        rgb::rgb_pixel(rgb::YcbcrPixel { y: 255, cb: 255, cr: 255 }),
        RgbPixel { red: 255, green: 121, blue: 255 },
    );
    assert_eq!(
        rgb::rgb_pixel(rgb::YcbcrPixel { y: 0, cb: 0, cr: 0 }),
        RgbPixel { red: 0, green: 135, blue: 0 },
    );
}

#[test]
fn test_neutral_chroma_is_gray() {

    for y in 0..=255u8 {
        assert_eq!(
            rgb::rgb_pixel(rgb::YcbcrPixel { y, cb: 128, cr: 128 }),
            RgbPixel { red: y, green: y, blue: y },
        );
    }
}

#[test]
fn test_chroma_order() {

    let entry = PaletteEntry { y: 100, cr: 200, cb: 50, alpha: 7 };

    assert_eq!(entry.ycbcr(ChromaOrder::CrCb), rgb::YcbcrPixel { y: 100, cb: 50, cr: 200 });
    assert_eq!(entry.ycbcr(ChromaOrder::CbCr), rgb::YcbcrPixel { y: 100, cb: 200, cr: 50 });
    assert_eq!(ChromaOrder::default(), ChromaOrder::CrCb);
    assert_eq!(entry.rgba(ChromaOrder::CrCb)[3], 7);
}

#[test]
fn test_render_pads_short_lines_on_the_left() {

    let data = encode_lines(&[vec![1, 1, 2, 2], vec![2, 1]]);
    let mut warnings = Warnings::new();
    let image = render_object(
        &object(4, 2, data),
        &opaque_palette(),
        ChromaOrder::CrCb,
        &mut warnings,
    );

    assert_eq!(image.dimensions(), (4, 2));
    assert_eq!(*image.get_pixel(0, 0), Rgba([235, 235, 235, 255]));
    assert_eq!(*image.get_pixel(2, 0), Rgba([16, 16, 16, 128]));
    assert_eq!(*image.get_pixel(0, 1), Rgba([255, 255, 255, 255]));
    assert_eq!(*image.get_pixel(1, 1), Rgba([255, 255, 255, 255]));
    assert_eq!(*image.get_pixel(2, 1), Rgba([16, 16, 16, 128]));
    assert_eq!(*image.get_pixel(3, 1), Rgba([235, 235, 235, 255]));
    assert!(warnings.is_empty());
}

#[test]
fn test_render_undefined_entries_are_transparent() {

    let data = encode_lines(&[vec![0, 0, 9]]);
    let mut warnings = Warnings::new();
    let image = render_object(
        &object(3, 1, data),
        &opaque_palette(),
        ChromaOrder::CrCb,
        &mut warnings,
    );

    assert_eq!(*image.get_pixel(2, 0), Rgba([0, 135, 0, 0]));
    assert_eq!(image.get_pixel(0, 0)[3], 0);
}

#[test]
fn test_render_reports_shape_mismatches() {

    let data = encode_lines(&[vec![1, 1, 1]]);
    let mut warnings = Warnings::new();
    let image = render_object(
        &object(2, 2, data),
        &opaque_palette(),
        ChromaOrder::CrCb,
        &mut warnings,
    );

    assert_eq!(image.dimensions(), (2, 1));
    assert_eq!(
        warnings.as_slice(),
        &[
            Warning::ScanlineTooLong { row: 0, length: 3, width: 2 },
            Warning::RowCountMismatch { declared: 2, found: 1 },
        ],
    );
}

#[test]
fn test_crop_inside_image() {

    let mut image = RgbaImage::new(4, 4);

    image.put_pixel(1, 2, Rgba([1, 2, 3, 4]));

    let cropped = crop_image(&image, &Crop { x: 1, y: 1, width: 2, height: 3 });

    assert_eq!(cropped.dimensions(), (2, 3));
    assert_eq!(*cropped.get_pixel(0, 1), Rgba([1, 2, 3, 4]));
}

#[test]
fn test_crop_past_image_is_transparent() {

    let image = RgbaImage::from_pixel(2, 2, Rgba([9, 9, 9, 255]));
    let cropped = crop_image(&image, &Crop { x: 1, y: 1, width: 3, height: 2 });

    assert_eq!(cropped.dimensions(), (3, 2));
    assert_eq!(*cropped.get_pixel(0, 0), Rgba([9, 9, 9, 255]));
    assert_eq!(*cropped.get_pixel(1, 0), Rgba([0, 0, 0, 0]));
    assert_eq!(*cropped.get_pixel(0, 1), Rgba([0, 0, 0, 0]));
}
