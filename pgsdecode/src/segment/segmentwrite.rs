/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */

use super::{
    ObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PaletteEntry,
    PresentationCompositionSegment,
    Segment,
    WindowDefinitionSegment,
};
use crate::{
    segment::CompositionState,
    TICKS_PER_MS,
};
use std::io::{
    Error as IoError,
    Write,
};
use byteorder::{BigEndian, WriteBytesExt};
use thiserror::Error as ThisError;

/// A specialized [`Result`](std::result::Result) type for segment-writing operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// The error type for [WriteSegmentExt].
///
/// Errors are caused by either invalid state or by an underlying I/O error.
#[derive(ThisError, Debug)]
pub enum WriteError {
    /// The [`Segment`] could not be written because of an underlying I/O error.
    #[error("segment IO error")]
    IoError {
        /// The underlying I/O error.
        #[from]
        source: IoError,
    },
    /// A timestamp does not fit into 32 bits once converted back to 90 kHz ticks.
    #[error("timestamp is too large")]
    TimestampTooLarge,
    /// The [`Segment`] ([`PresentationCompositionSegment`]) being written has more than 255
    /// composition objects.
    #[error("too many composition objects in presentation composition segment")]
    TooManyCompositionObjects,
    /// The [`Segment`] ([`WindowDefinitionSegment`]) being written has more than 255 window
    /// definitions.
    #[error("too many window definitions")]
    TooManyWindowDefinitions,
    /// The [`Segment`] ([`ObjectDefinitionSegment`]) being written has more than 16,777,211
    /// compressed bytes of data.
    #[error("object data is too large")]
    ObjectDataTooLarge,
    /// The [`Segment`] ([`ObjectDefinitionSegment`]) is a first fragment without width,
    /// height, and length.
    #[error("first object fragment has no object info")]
    MissingObjectInfo,
    /// The payload does not fit into a single segment.
    #[error("segment payload is too large")]
    PayloadTooLarge,
}

/// Allows writing segments to a destination.
pub trait WriteSegmentExt {
    /// Writes a segment to a destination.
    fn write_segment(&mut self, segment: &Segment) -> WriteResult<()>;
}

impl<T> WriteSegmentExt for T where
    T: Write,
{

    fn write_segment(&mut self, segment: &Segment) -> WriteResult<()> {

        let payload = match &segment {
            Segment::PresentationComposition(pcs) => generate_pcs(pcs)?,
            Segment::WindowDefinition(wds) => generate_wds(wds)?,
            Segment::PaletteDefinition(pds) => generate_pds(pds)?,
            Segment::ObjectDefinition(ods) => generate_ods(ods)?,
            Segment::End(_) => vec![],
        };
        let dts = match &segment {
            Segment::PresentationComposition(pcs) => pcs.dts,
            Segment::WindowDefinition(wds) => wds.dts,
            Segment::PaletteDefinition(pds) => pds.dts,
            Segment::ObjectDefinition(ods) => ods.dts,
            Segment::End(es) => es.dts,
        };

        if payload.len() > u16::MAX as usize {
            return Err(WriteError::PayloadTooLarge)
        }

        self.write_u16::<BigEndian>(0x5047)?;
        self.write_u32::<BigEndian>(to_ticks(segment.pts())?)?;
        self.write_u32::<BigEndian>(to_ticks(dts)?)?;
        self.write_u8(segment.kind().code())?;
        self.write_u16::<BigEndian>(payload.len() as u16)?;
        self.write_all(&payload)?;

        Ok(())
    }
}

fn to_ticks(ms: u32) -> WriteResult<u32> {
    ms.checked_mul(TICKS_PER_MS).ok_or(WriteError::TimestampTooLarge)
}

/// Splits a complete object into fragments carrying at most `chunk_size` bytes of pixel
/// data each. The first fragment keeps the object info.
pub fn split_object(
    object: &ObjectDefinitionSegment,
    chunk_size: usize,
) -> Vec<ObjectDefinitionSegment> {

    let chunks = object.data.chunks(chunk_size.max(1)).collect::<Vec<&[u8]>>();
    let count = chunks.len().max(1);

    (0..count).map(|index| {
        ObjectDefinitionSegment {
            pts: object.pts,
            dts: object.dts,
            id: object.id,
            version: object.version,
            is_first: index == 0,
            is_last: index == count - 1,
            info: if index == 0 { object.info } else { None },
            data: chunks.get(index).map(|chunk| chunk.to_vec()).unwrap_or_default(),
        }
    }).collect()
}

fn generate_pcs(pcs: &PresentationCompositionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u16::<BigEndian>(pcs.width)?;
    payload.write_u16::<BigEndian>(pcs.height)?;
    payload.write_u8(pcs.frame_rate)?;
    payload.write_u16::<BigEndian>(pcs.composition_number)?;
    payload.write_u8(
        match pcs.composition_state {
            CompositionState::Normal => 0x00,
            CompositionState::AcquisitionPoint => 0x40,
            CompositionState::EpochStart => 0x80,
        }
    )?;
    payload.write_u8(if pcs.palette_update { 0x80 } else { 0x00 })?;
    payload.write_u8(pcs.palette_id)?;

    if pcs.composition_objects.len() <= 255 {
        payload.write_u8(pcs.composition_objects.len() as u8)?;
    } else {
        return Err(WriteError::TooManyCompositionObjects)
    }

    for comp_obj in &pcs.composition_objects {

        let mut flags = 0x00;

        if comp_obj.crop.is_some() {
            flags |= 0x80;
        }
        if comp_obj.forced {
            flags |= 0x40;
        }

        payload.write_u16::<BigEndian>(comp_obj.object_id)?;
        payload.write_u8(comp_obj.window_id)?;
        payload.write_u8(flags)?;
        payload.write_u16::<BigEndian>(comp_obj.x)?;
        payload.write_u16::<BigEndian>(comp_obj.y)?;

        if let Some(crop) = &comp_obj.crop {
            payload.write_u16::<BigEndian>(crop.x)?;
            payload.write_u16::<BigEndian>(crop.y)?;
            payload.write_u16::<BigEndian>(crop.width)?;
            payload.write_u16::<BigEndian>(crop.height)?;
        }
    }

    Ok(payload)
}

fn generate_wds(wds: &WindowDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    if wds.windows.len() <= 255 {
        payload.write_u8(wds.windows.len() as u8)?;
    } else {
        return Err(WriteError::TooManyWindowDefinitions)
    }

    for window in wds.windows.iter() {
        payload.write_u8(window.id)?;
        payload.write_u16::<BigEndian>(window.x)?;
        payload.write_u16::<BigEndian>(window.y)?;
        payload.write_u16::<BigEndian>(window.width)?;
        payload.write_u16::<BigEndian>(window.height)?;
    }

    Ok(payload)
}

fn generate_pds(pds: &PaletteDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];

    payload.write_u8(pds.id)?;
    payload.write_u8(pds.version)?;

    // Undefined entries read back as transparent black, so only the others are stored.
    for (index, entry) in pds.entries.iter().enumerate() {
        if *entry != PaletteEntry::default() {
            payload.write_u8(index as u8)?;
            payload.write_u8(entry.y)?;
            payload.write_u8(entry.cr)?;
            payload.write_u8(entry.cb)?;
            payload.write_u8(entry.alpha)?;
        }
    }

    Ok(payload)
}

fn generate_ods(ods: &ObjectDefinitionSegment) -> WriteResult<Vec<u8>> {

    let mut payload = vec![];
    let mut sequence = 0x00;

    if ods.is_first {
        sequence |= 0x80;
    }
    if ods.is_last {
        sequence |= 0x40;
    }

    payload.write_u16::<BigEndian>(ods.id)?;
    payload.write_u8(ods.version)?;
    payload.write_u8(sequence)?;

    if ods.is_first {

        let info = ods.info.ok_or(WriteError::MissingObjectInfo)?;

        if info.data_length > 16_777_215 {
            return Err(WriteError::ObjectDataTooLarge)
        }

        payload.write_u24::<BigEndian>(info.data_length)?;
        payload.write_u16::<BigEndian>(info.width)?;
        payload.write_u16::<BigEndian>(info.height)?;
    }

    payload.write_all(&ods.data)?;

    Ok(payload)
}
