/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    CompositionObject,
    CompositionState,
    Crop,
    EndSegment,
    ObjectDefinitionSegment,
    ObjectInfo,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
    RawSegment,
    Segment,
    SegmentType,
    WindowDefinition,
    WindowDefinitionSegment,
    HEADER_SIZE,
};
use crate::{
    warning::{Warning, Warnings},
    TICKS_PER_MS,
};
use std::io::{Cursor, Error as IoError, ErrorKind, Read};
use byteorder::{BigEndian, ReadBytesExt};
use log::trace;
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for segment-reading operations.
pub type SegmentReadResult<T> = Result<T, ReadError>;

/// The error type for reading and decoding segments.
///
/// Every variant means the stream is malformed. No attempt is made to resynchronize.
#[derive(ThisError, Debug)]
pub enum ReadError {
    /// A segment payload is shorter than the fixed fields of its type.
    #[error("segment IO error")]
    IoError {
        #[from]
        source: IoError,
    },
    #[error("segment has unrecognized magic number")]
    UnrecognizedMagicNumber,
    /// The header or the declared payload extends past the end of the data.
    #[error("segment is truncated")]
    TruncatedSegment,
    #[error("segment has unrecognized kind 0x{0:02X}")]
    UnrecognizedKind(u8),
    #[error("presentation composition segment has unrecognized composition state 0x{0:02X}")]
    UnrecognizedCompositionState(u8),
}

/// Allows reading raw segments from a source.
pub trait ReadSegmentExt {
    /// Reads the next segment header and its payload without interpreting the payload.
    fn read_raw_segment(&mut self) -> SegmentReadResult<RawSegment>;
}

impl<T: Read> ReadSegmentExt for T {

    fn read_raw_segment(&mut self) -> SegmentReadResult<RawSegment> {

        let mut header = [0u8; HEADER_SIZE];

        self.read_exact(&mut header).map_err(truncated)?;

        let mut input = Cursor::new(&header[..]);

        if input.read_u16::<BigEndian>()? != 0x5047 {
            return Err(ReadError::UnrecognizedMagicNumber)
        }

        let pts = input.read_u32::<BigEndian>()? / TICKS_PER_MS;
        let dts = input.read_u32::<BigEndian>()? / TICKS_PER_MS;
        let code = input.read_u8()?;
        let kind = SegmentType::from_code(code).ok_or(ReadError::UnrecognizedKind(code))?;
        let size = input.read_u16::<BigEndian>()? as usize;
        let mut payload = vec![0u8; size];

        self.read_exact(&mut payload).map_err(truncated)?;

        Ok(RawSegment { pts, dts, kind, payload })
    }
}

fn truncated(error: IoError) -> ReadError {
    if error.kind() == ErrorKind::UnexpectedEof {
        ReadError::TruncatedSegment
    } else {
        ReadError::IoError { source: error }
    }
}

/// Splits an in-memory PGS bitstream into raw segments.
///
/// This is a single forward pass. Iteration stops after the first error.
pub struct SegmentReader<'a> {
    input: Cursor<&'a [u8]>,
    failed: bool,
}

impl<'a> SegmentReader<'a> {

    pub fn new(data: &'a [u8]) -> Self {
        Self {
            input: Cursor::new(data),
            failed: false,
        }
    }

    /// The number of bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.input.position() as usize
    }

    fn is_at_end(&self) -> bool {
        self.offset() >= self.input.get_ref().len()
    }
}

impl<'a> Iterator for SegmentReader<'a> {

    type Item = SegmentReadResult<RawSegment>;

    fn next(&mut self) -> Option<Self::Item> {

        if self.failed || self.is_at_end() {
            return None
        }

        let offset = self.offset();
        let result = self.input.read_raw_segment();

        match &result {
            Ok(raw) => trace!(
                "read {:?} segment of {} bytes at offset {}",
                raw.kind,
                raw.payload.len(),
                offset,
            ),
            Err(_) => self.failed = true,
        }

        Some(result)
    }
}

/// Decodes the payload of one kind of segment.
pub type SegmentDecoder = fn(u32, u32, &[u8], &mut Warnings) -> SegmentReadResult<Segment>;

/// Returns the decoder registered for a segment type.
pub fn segment_decoder(kind: SegmentType) -> SegmentDecoder {
    match kind {
        SegmentType::PaletteDefinition => decode_pds,
        SegmentType::ObjectDefinition => decode_ods,
        SegmentType::PresentationComposition => decode_pcs,
        SegmentType::WindowDefinition => decode_wds,
        SegmentType::End => decode_es,
    }
}

impl RawSegment {

    /// Interprets the payload according to the segment type.
    pub fn decode(&self, warnings: &mut Warnings) -> SegmentReadResult<Segment> {
        segment_decoder(self.kind)(self.pts, self.dts, &self.payload, warnings)
    }
}

fn decode_pcs(
    pts: u32,
    dts: u32,
    payload: &[u8],
    warnings: &mut Warnings,
) -> SegmentReadResult<Segment> {

    let mut input = Cursor::new(payload);
    let width = input.read_u16::<BigEndian>()?;
    let height = input.read_u16::<BigEndian>()?;
    let frame_rate = input.read_u8()?;
    let composition_number = input.read_u16::<BigEndian>()?;
    let composition_state = match input.read_u8()? {
        0x00 => CompositionState::Normal,
        0x40 => CompositionState::AcquisitionPoint,
        0x80 => CompositionState::EpochStart,
        state => return Err(ReadError::UnrecognizedCompositionState(state)),
    };
    let palette_update = input.read_u8()? != 0x00;
    let palette_id = input.read_u8()?;
    let declared_count = input.read_u8()?;
    let mut composition_objects = Vec::new();

    loop {

        let pos = input.position() as usize;
        let remaining = payload.len() - pos;

        if remaining == 0 {
            break
        }
        if remaining < 8 {
            warnings.push(Warning::TruncatedCompositionObject { composition_number });
            break
        }

        // The flags decide whether this entry is 8 or 16 bytes wide.
        let cropped = payload[pos + 3] & 0x80 != 0;
        let object_id = input.read_u16::<BigEndian>()?;
        let window_id = input.read_u8()?;
        let forced = input.read_u8()? & 0x40 != 0;
        let x = input.read_u16::<BigEndian>()?;
        let y = input.read_u16::<BigEndian>()?;

        if cropped && remaining - 8 < 8 {
            warnings.push(Warning::MissingCrop { object_id });
            composition_objects.push(
                CompositionObject { object_id, window_id, forced, x, y, crop: None }
            );
            break
        }

        let crop = if cropped {
            Some(
                Crop {
                    x: input.read_u16::<BigEndian>()?,
                    y: input.read_u16::<BigEndian>()?,
                    width: input.read_u16::<BigEndian>()?,
                    height: input.read_u16::<BigEndian>()?,
                }
            )
        } else {
            None
        };

        composition_objects.push(
            CompositionObject {
                object_id,
                window_id,
                forced,
                x,
                y,
                crop,
            }
        );
    }

    if composition_objects.len() != declared_count as usize {
        warnings.push(
            Warning::CompositionObjectCount {
                composition_number,
                declared: declared_count,
                found: composition_objects.len(),
            }
        );
    }

    Ok(
        Segment::PresentationComposition(
            PresentationCompositionSegment {
                pts,
                dts,
                width,
                height,
                frame_rate,
                composition_number,
                composition_state,
                palette_update,
                palette_id,
                composition_objects,
            }
        )
    )
}

fn decode_wds(
    pts: u32,
    dts: u32,
    payload: &[u8],
    warnings: &mut Warnings,
) -> SegmentReadResult<Segment> {

    let mut input = Cursor::new(payload);
    let mut windows = Vec::new();
    let declared_count = input.read_u8()?;

    loop {

        let remaining = payload.len() - input.position() as usize;

        if remaining == 0 {
            break
        }
        if remaining < 9 {
            warnings.push(Warning::TruncatedWindow);
            break
        }

        windows.push(
            WindowDefinition {
                id: input.read_u8()?,
                x: input.read_u16::<BigEndian>()?,
                y: input.read_u16::<BigEndian>()?,
                width: input.read_u16::<BigEndian>()?,
                height: input.read_u16::<BigEndian>()?,
            }
        );
    }

    if windows.len() != declared_count as usize {
        warnings.push(
            Warning::WindowCount {
                declared: declared_count,
                found: windows.len(),
            }
        );
    }

    Ok(
        Segment::WindowDefinition(
            WindowDefinitionSegment {
                pts,
                dts,
                windows,
            }
        )
    )
}

fn decode_pds(
    pts: u32,
    dts: u32,
    payload: &[u8],
    _warnings: &mut Warnings,
) -> SegmentReadResult<Segment> {

    let mut input = Cursor::new(payload);
    let id = input.read_u8()?;
    let version = input.read_u8()?;
    let count = (payload.len() - 2) / 5;
    let mut entries = [PaletteEntry::default(); 256];

    for _ in 0..count {

        let index = input.read_u8()?;
        let y = input.read_u8()?;
        let cr = input.read_u8()?;
        let cb = input.read_u8()?;
        let alpha = input.read_u8()?;

        entries[index as usize] = PaletteEntry { y, cr, cb, alpha };
    }

    Ok(
        Segment::PaletteDefinition(
            PaletteDefinitionSegment {
                pts,
                dts,
                id,
                version,
                entries,
            }
        )
    )
}

fn decode_ods(
    pts: u32,
    dts: u32,
    payload: &[u8],
    _warnings: &mut Warnings,
) -> SegmentReadResult<Segment> {

    let mut input = Cursor::new(payload);
    let id = input.read_u16::<BigEndian>()?;
    let version = input.read_u8()?;
    let sequence = input.read_u8()?;
    let is_first = sequence & 0x80 != 0;
    let is_last = sequence & 0x40 != 0;
    let info = if is_first {
        Some(
            ObjectInfo {
                data_length: input.read_u24::<BigEndian>()?,
                width: input.read_u16::<BigEndian>()?,
                height: input.read_u16::<BigEndian>()?,
            }
        )
    } else {
        None
    };
    let data = payload[input.position() as usize..].to_vec();

    Ok(
        Segment::ObjectDefinition(
            ObjectDefinitionSegment {
                pts,
                dts,
                id,
                version,
                is_first,
                is_last,
                info,
                data,
            }
        )
    )
}

fn decode_es(
    pts: u32,
    dts: u32,
    _payload: &[u8],
    _warnings: &mut Warnings,
) -> SegmentReadResult<Segment> {
    Ok(Segment::End(EndSegment { pts, dts }))
}
