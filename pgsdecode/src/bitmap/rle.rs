/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Run-length coding of object pixel data.
//!
//! Every scanline is a sequence of opcodes terminated by `00 00`:
//!
//! | Bytes                   | Meaning                                   |
//! |-------------------------|-------------------------------------------|
//! | `CC`                    | one pixel of color `CC` (non-zero)        |
//! | `00 00`                 | end of scanline                           |
//! | `00 0L`                 | `L` (1-63) pixels of color 0              |
//! | `00 4L LL`              | `L` (64-16383) pixels of color 0          |
//! | `00 8L CC`              | `L` (3-63) pixels of color `CC`           |
//! | `00 CL LL CC`           | `L` (64-16383) pixels of color `CC`       |

use crate::warning::{Warning, Warnings};

/// The longest run a single opcode can describe.
pub const MAX_RUN: usize = 0x3FFF;

/// Decompresses run-length data into scanlines of palette indexes.
///
/// No scanline grows past `width` pixels. Pixels beyond it are counted but dropped, and the
/// scanline is reported once it ends. Pixels after the last end-of-line marker do not form a
/// complete scanline and are dropped with a warning.
pub fn decode_lines(data: &[u8], width: u16, warnings: &mut Warnings) -> Vec<Vec<u8>> {

    let mut lines = Vec::new();
    let mut line = Vec::new();
    let mut dropped = 0;
    let mut pos = 0;

    while pos < data.len() {

        let byte = data[pos];

        if byte != 0x00 {
            extend_line(&mut line, &mut dropped, width, 1, byte);
            pos += 1;
            continue
        }

        let check = match data.get(pos + 1) {
            Some(&check) => check,
            None => {
                warnings.push(Warning::TruncatedRunLength { offset: pos });
                break
            }
        };
        let opcode_size = match check {
            0x00 | 0x01..=0x3F => 2,
            0x40..=0xBF => 3,
            0xC0..=0xFF => 4,
        };

        if pos + opcode_size > data.len() {
            warnings.push(Warning::TruncatedRunLength { offset: pos });
            break
        }

        match check {
            0x00 => {
                if dropped > 0 {
                    warnings.push(
                        Warning::ScanlineTooLong {
                            row: lines.len(),
                            length: line.len() + dropped,
                            width,
                        }
                    );
                    dropped = 0;
                }
                lines.push(std::mem::take(&mut line));
            }
            0x01..=0x3F => {
                extend_line(&mut line, &mut dropped, width, check as usize, 0);
            }
            0x40..=0x7F => {
                let length = (((check - 0x40) as usize) << 8) + data[pos + 2] as usize;
                extend_line(&mut line, &mut dropped, width, length, 0);
            }
            0x80..=0xBF => {
                let length = (check - 0x80) as usize;
                extend_line(&mut line, &mut dropped, width, length, data[pos + 2]);
            }
            0xC0..=0xFF => {
                let length = (((check - 0xC0) as usize) << 8) + data[pos + 2] as usize;
                extend_line(&mut line, &mut dropped, width, length, data[pos + 3]);
            }
        }

        pos += opcode_size;
    }

    if !line.is_empty() || dropped > 0 {
        warnings.push(Warning::HangingPixels { pixels: line.len() + dropped });
    }

    lines
}

/// Appends a run to a scanline, stopping at `width` and counting whatever does not fit.
fn extend_line(line: &mut Vec<u8>, dropped: &mut usize, width: u16, length: usize, color: u8) {

    let room = (width as usize).saturating_sub(line.len());
    let kept = length.min(room);

    line.resize(line.len() + kept, color);
    *dropped += length - kept;
}

/// Compresses scanlines of palette indexes into run-length data.
pub fn encode_lines(lines: &[Vec<u8>]) -> Vec<u8> {

    let mut data = Vec::new();

    for line in lines {

        let mut pixels = line.iter().peekable();

        while let Some(&color) = pixels.next() {

            let mut length = 1;

            while length < MAX_RUN && pixels.peek() == Some(&&color) {
                pixels.next();
                length += 1;
            }

            encode_run(&mut data, color, length);
        }

        data.extend_from_slice(&[0x00, 0x00]);
    }

    data
}

fn encode_run(data: &mut Vec<u8>, color: u8, length: usize) {
    match (color, length) {
        (0, 1..=0x3F) => {
            data.extend_from_slice(&[0x00, length as u8]);
        }
        (0, _) => {
            data.extend_from_slice(&[0x00, 0x40 | (length >> 8) as u8, length as u8]);
        }
        (_, 1..=2) => {
            data.resize(data.len() + length, color);
        }
        (_, 3..=0x3F) => {
            data.extend_from_slice(&[0x00, 0x80 | length as u8, color]);
        }
        (_, _) => {
            data.extend_from_slice(&[0x00, 0xC0 | (length >> 8) as u8, length as u8, color]);
        }
    }
}
