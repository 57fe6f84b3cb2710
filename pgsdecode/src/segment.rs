/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Operates on individual segments.
//!
//! # Overview
//!
//! A segment is the most fundamental data structure within a PGS bitstream. Multiple segments
//! come together in a well-defined manner to form a display set (DS).
//!
//! Every segment starts with a 13-byte header:
//!
//! | Bytes | Field                                  |
//! |-------|----------------------------------------|
//! | 2     | Magic number, always `"PG"`            |
//! | 4     | Presentation timestamp (90 kHz ticks)  |
//! | 4     | Decoding timestamp (90 kHz ticks)      |
//! | 1     | Segment type                           |
//! | 2     | Payload size                           |
//!
//! Reading happens in two steps. A [`SegmentReader`] splits a byte buffer into
//! [`RawSegment`] records without looking inside their payloads. Each record is then decoded
//! into a typed [`Segment`] by the decoder registered for its [`SegmentType`].
//!
//! There are five types that typically appear in this order:
//!
//! 1. Presentation Composition Segment (PCS)
//! 2. Window Definition Segment (WDS)
//! 3. Palette Definition Segment (PDS)
//! 4. Object Definition Segment (ODS)
//! 5. End Segment (ES)
//!
//! ## Presentation Composition Segment (PCS)
//!
//! A PCS defines the role of the DS within the larger epoch, the screen resolution, and which
//! objects are shown where.
//!
//! ## Window Definition Segment (WDS)
//!
//! A WDS defines the areas of the screen that will be used to show objects during the larger
//! epoch.
//!
//! ## Palette Definition Segment (PDS)
//!
//! A PDS contains a list of YCbCrA values with each one having a unique ID. A single DS can
//! have multiple PDS segments.
//!
//! ## Object Definition Segment (ODS)
//!
//! An ODS defines a run-length encoded bitmap whose pixels are palette IDs. Large objects are
//! split across several consecutive ODS fragments.
//!
//! ## End Segment (ES)
//!
//! An ES signals that the current DS has come to an end.


mod segmentread;
mod segmentwrite;

pub use segmentread::*;
pub use segmentwrite::*;

/// The number of bytes in every segment header.
pub const HEADER_SIZE: usize = 13;

/// Identifies the kind of a segment by its type code.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum SegmentType {
    /// Palette Definition Segment (PDS), type code `0x14`.
    PaletteDefinition,
    /// Object Definition Segment (ODS), type code `0x15`.
    ObjectDefinition,
    /// Presentation Composition Segment (PCS), type code `0x16`.
    PresentationComposition,
    /// Window Definition Segment (WDS), type code `0x17`.
    WindowDefinition,
    /// End Segment (ES), type code `0x80`.
    End,
}

impl SegmentType {

    /// Looks up a segment type by its type code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x14 => Some(Self::PaletteDefinition),
            0x15 => Some(Self::ObjectDefinition),
            0x16 => Some(Self::PresentationComposition),
            0x17 => Some(Self::WindowDefinition),
            0x80 => Some(Self::End),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::PaletteDefinition => 0x14,
            Self::ObjectDefinition => 0x15,
            Self::PresentationComposition => 0x16,
            Self::WindowDefinition => 0x17,
            Self::End => 0x80,
        }
    }
}

/// A segment whose header has been read but whose payload has not been interpreted.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RawSegment {
    /// The presentation timestamp in milliseconds.
    pub pts: u32,
    /// The decoding timestamp in milliseconds. This is not used for timing.
    pub dts: u32,
    pub kind: SegmentType,
    pub payload: Vec<u8>,
}

/// Represents a decoded PGS segment.
#[derive(Clone, Debug, Hash, PartialEq)]
pub enum Segment {
    /// Represents a Presentation Composition Segment (PCS).
    PresentationComposition(PresentationCompositionSegment),
    /// Represents a Window Definition Segment (WDS).
    WindowDefinition(WindowDefinitionSegment),
    /// Represents a Palette Definition Segment (PDS).
    PaletteDefinition(PaletteDefinitionSegment),
    /// Represents an Object Definition Segment (ODS).
    ObjectDefinition(ObjectDefinitionSegment),
    /// Represents an End Segment (ES).
    End(EndSegment),
}

impl Segment {

    pub fn kind(&self) -> SegmentType {
        match self {
            Segment::PresentationComposition(_) => SegmentType::PresentationComposition,
            Segment::WindowDefinition(_) => SegmentType::WindowDefinition,
            Segment::PaletteDefinition(_) => SegmentType::PaletteDefinition,
            Segment::ObjectDefinition(_) => SegmentType::ObjectDefinition,
            Segment::End(_) => SegmentType::End,
        }
    }

    /// The presentation timestamp in milliseconds.
    pub fn pts(&self) -> u32 {
        match self {
            Segment::PresentationComposition(pcs) => pcs.pts,
            Segment::WindowDefinition(wds) => wds.pts,
            Segment::PaletteDefinition(pds) => pds.pts,
            Segment::ObjectDefinition(ods) => ods.pts,
            Segment::End(es) => es.pts,
        }
    }
}

/// Defines the role of a PCS (and thereby the associated DS) within an epoch.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum CompositionState {
    /// Indicates that the associated PCS (and the DS it belongs to) defines the start of a new
    /// epoch. Objects and palettes from earlier epochs are no longer valid.
    EpochStart,
    /// Used to refresh the screen with the current composition so that a player seeking into
    /// the middle of an epoch can still show it. Producers often repeat the previous
    /// composition verbatim, including its composition number.
    AcquisitionPoint,
    /// This updates the composition that is on the screen, typically to clear it by defining
    /// a PCS with no composition objects.
    Normal,
}

impl Default for CompositionState {
    fn default() -> Self { Self::EpochStart }
}

/// Defines a Presentation Composition Segment (PCS).
///
/// Every DS holds exactly one PCS.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct PresentationCompositionSegment {
    /// The time at which the composition is displayed, in milliseconds.
    pub pts: u32,
    /// The decoding timestamp in milliseconds. In practice, this value is always zero.
    pub dts: u32,
    /// The width of the display in pixels.
    pub width: u16,
    /// The height of the display in pixels.
    pub height: u16,
    /// This value should be set to `0x10` and can typically be ignored.
    pub frame_rate: u8,
    /// A sequence number that increases with each new composition. Repeated compositions
    /// carry the number of the composition they repeat.
    pub composition_number: u16,
    pub composition_state: CompositionState,
    pub palette_update: bool,
    /// The palette used to render every object of this composition.
    pub palette_id: u8,
    pub composition_objects: Vec<CompositionObject>,
}

/// Places an object onto the screen.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct CompositionObject {
    pub object_id: u16,
    pub window_id: u8,
    pub forced: bool,
    pub x: u16,
    pub y: u16,
    /// The part of the object that is shown. The whole object is shown when absent.
    pub crop: Option<Crop>,
}

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Crop {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinitionSegment {
    /// The presentation timestamp in milliseconds.
    pub pts: u32,
    /// The decoding timestamp in milliseconds.
    pub dts: u32,
    pub windows: Vec<WindowDefinition>,
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct WindowDefinition {
    pub id: u8,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Defines a Palette Definition Segment (PDS).
///
/// The palette always holds 256 entries. Entries that the segment does not define are
/// transparent black (all zeroes).
#[derive(Clone, Debug, Hash, PartialEq)]
pub struct PaletteDefinitionSegment {
    /// The presentation timestamp in milliseconds.
    pub pts: u32,
    /// The decoding timestamp in milliseconds.
    pub dts: u32,
    pub id: u8,
    pub version: u8,
    pub entries: [PaletteEntry; 256],
}

impl Default for PaletteDefinitionSegment {
    fn default() -> Self {
        Self {
            pts: 0,
            dts: 0,
            id: 0,
            version: 0,
            entries: [PaletteEntry::default(); 256],
        }
    }
}

/// A single palette color as stored in the stream.
///
/// Fields are named after the default chroma order, where the second byte of an entry is Cr
/// and the third is Cb. Streams that store them the other way around are handled by
/// [`ChromaOrder`](crate::bitmap::ChromaOrder) at conversion time.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PaletteEntry {
    pub y: u8,
    pub cr: u8,
    pub cb: u8,
    pub alpha: u8,
}

/// Fields that only appear in the first fragment of an object.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ObjectInfo {
    /// The declared size of the object data, which includes the four bytes of width and
    /// height.
    pub data_length: u32,
    pub width: u16,
    pub height: u16,
}

/// Defines an Object Definition Segment (ODS).
///
/// After reassembly, a logical object is both first and last and carries the pixel data of
/// all of its fragments.
#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct ObjectDefinitionSegment {
    /// The presentation timestamp in milliseconds.
    pub pts: u32,
    /// The decoding timestamp in milliseconds.
    pub dts: u32,
    pub id: u16,
    pub version: u8,
    pub is_first: bool,
    pub is_last: bool,
    /// Present only on first fragments.
    pub info: Option<ObjectInfo>,
    /// Run-length encoded pixel data.
    pub data: Vec<u8>,
}

impl ObjectDefinitionSegment {

    /// The width of the object, if its first fragment has been seen.
    pub fn width(&self) -> Option<u16> {
        self.info.map(|info| info.width)
    }

    /// The height of the object, if its first fragment has been seen.
    pub fn height(&self) -> Option<u16> {
        self.info.map(|info| info.height)
    }
}

#[derive(Clone, Debug, Default, Hash, PartialEq)]
pub struct EndSegment {
    /// The presentation timestamp in milliseconds.
    pub pts: u32,
    /// The decoding timestamp in milliseconds.
    pub dts: u32,
}
