/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Non-fatal data-quality diagnostics.
//!
//! Real-world PGS streams frequently disagree with their own headers. None of the conditions
//! listed here prevent decoding; they are collected so that a caller can report them.

use log::warn;
use thiserror::Error as ThisError;

/// A data-quality issue encountered while decoding. Processing continues using whatever data
/// could be read.
#[derive(ThisError, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Warning {
    /// A PCS declared a different number of composition objects than its payload holds.
    #[error(
        "composition {composition_number} declares {declared} composition objects but {found} \
        were found"
    )]
    CompositionObjectCount {
        composition_number: u16,
        declared: u8,
        found: usize,
    },
    /// A PCS payload ended in the middle of a composition object.
    #[error("composition {composition_number} ends within a composition object")]
    TruncatedCompositionObject {
        composition_number: u16,
    },
    /// A composition object has its cropped flag set, but the payload ends before the crop
    /// rectangle.
    #[error("composition object for object {object_id} is flagged as cropped but has no crop")]
    MissingCrop {
        object_id: u16,
    },
    /// A WDS declared a different number of windows than its payload holds.
    #[error("window definition declares {declared} windows but {found} were found")]
    WindowCount {
        declared: u8,
        found: usize,
    },
    /// A WDS payload ended in the middle of a window definition.
    #[error("window definition ends within a window")]
    TruncatedWindow,
    /// The reassembled pixel data of an object differs from the length in its first
    /// fragment.
    #[error("object {object_id} declares {declared} bytes of data but {found} were found")]
    ObjectLengthMismatch {
        object_id: u16,
        declared: usize,
        found: usize,
    },
    /// An object fragment arrived while fragments of another object were still buffered.
    #[error("object {found} interrupts the fragments of object {expected}")]
    InterleavedObjectFragments {
        expected: u16,
        found: u16,
    },
    /// A first fragment arrived while fragments of the same object were still buffered.
    #[error("object {object_id} restarts before its last fragment")]
    RestartedObject {
        object_id: u16,
    },
    /// An object was completed without ever seeing its first fragment.
    #[error("object {object_id} has no first fragment")]
    OrphanObjectFragment {
        object_id: u16,
    },
    /// The stream ended while object fragments were still buffered.
    #[error("stream ends within the fragments of object {object_id}")]
    UnterminatedObject {
        object_id: u16,
    },
    /// The stream ended with segments that were never closed by an end segment.
    #[error("stream ends with {segments} segments outside of a display set")]
    UnterminatedDisplaySet {
        segments: usize,
    },
    /// Run-length data ended without closing its final scanline.
    #[error("run-length data ends with {pixels} hanging pixels")]
    HangingPixels {
        pixels: usize,
    },
    /// Run-length data ended in the middle of an opcode.
    #[error("run-length data ends within an opcode at offset {offset}")]
    TruncatedRunLength {
        offset: usize,
    },
    /// A decoded scanline holds more pixels than the object is wide.
    #[error("scanline {row} holds {length} pixels but the object is {width} pixels wide")]
    ScanlineTooLong {
        row: usize,
        length: usize,
        width: u16,
    },
    /// The number of decoded scanlines differs from the object height.
    #[error("object declares {declared} scanlines but {found} were decoded")]
    RowCountMismatch {
        declared: u16,
        found: usize,
    },
    /// An epoch ended while objects were still being shown. These objects are never emitted.
    #[error("epoch ends with {objects} objects still on screen")]
    ObjectsLeftOnScreen {
        objects: usize,
    },
}

/// Collects warnings, logging each one as it arrives.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Warnings {
    items: Vec<Warning>,
}

impl Warnings {

    pub fn new() -> Self {
        Self::default()
    }

    /// Records a warning.
    pub fn push(&mut self, warning: Warning) {
        warn!("{}", warning);
        self.items.push(warning);
    }

    pub fn as_slice(&self) -> &[Warning] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Appends every warning from `other`, which has already been logged.
    pub fn extend(&mut self, other: Warnings) {
        self.items.extend(other.items);
    }
}
