/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Groups segments into display sets and epochs.
//!
//! # Overview
//!
//! A display set (DS) is every segment up to and including an end segment. It describes one
//! update to what is on the screen and always holds exactly one presentation composition
//! segment (PCS).
//!
//! An epoch is a run of display sets that starts with a PCS whose composition state is
//! [`CompositionState::EpochStart`]. Object and palette IDs are only meaningful within the
//! epoch that defines them.


mod displaysetread;

pub use displaysetread::*;

use super::segment::{
    CompositionState,
    EndSegment,
    ObjectDefinitionSegment,
    PaletteDefinitionSegment,
    PresentationCompositionSegment,
    Segment,
    WindowDefinitionSegment,
};

/// The segments of one screen update, in stream order.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplaySet {
    segments: Vec<Segment>,
    composition: PresentationCompositionSegment,
}

impl DisplaySet {

    /// Builds a display set from its segments, which must hold exactly one PCS.
    pub fn new(segments: Vec<Segment>) -> ReadResult<Self> {

        let mut composition = None;

        for segment in segments.iter() {
            if let Segment::PresentationComposition(pcs) = segment {
                if composition.is_some() {
                    return Err(ReadError::UnexpectedPresentationCompositionSegment)
                }
                composition = Some(pcs.clone());
            }
        }

        match composition {
            Some(composition) => Ok(Self { segments, composition }),
            None => Err(ReadError::MissingPresentationCompositionSegment),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn presentation_composition(&self) -> &PresentationCompositionSegment {
        &self.composition
    }

    pub fn window_definitions(&self) -> impl Iterator<Item = &WindowDefinitionSegment> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::WindowDefinition(wds) => Some(wds),
            _ => None,
        })
    }

    pub fn palette_definitions(&self) -> impl Iterator<Item = &PaletteDefinitionSegment> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::PaletteDefinition(pds) => Some(pds),
            _ => None,
        })
    }

    pub fn object_definitions(&self) -> impl Iterator<Item = &ObjectDefinitionSegment> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::ObjectDefinition(ods) => Some(ods),
            _ => None,
        })
    }

    pub fn end(&self) -> Option<&EndSegment> {
        self.segments.iter().find_map(|segment| match segment {
            Segment::End(es) => Some(es),
            _ => None,
        })
    }

    /// The presentation timestamp of the composition, in milliseconds.
    pub fn pts(&self) -> u32 {
        self.presentation_composition().pts
    }

    pub fn composition_state(&self) -> CompositionState {
        self.presentation_composition().composition_state
    }

    /// Whether this display set carries any object data.
    pub fn has_image(&self) -> bool {
        self.object_definitions().next().is_some()
    }
}

/// A run of display sets sharing one namespace of objects and palettes, ordered by
/// presentation timestamp.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Epoch {
    pub display_sets: Vec<DisplaySet>,
}

impl Epoch {

    pub fn composition_states(&self) -> impl Iterator<Item = CompositionState> + '_ {
        self.display_sets.iter().map(|ds| ds.composition_state())
    }

    /// The time at which the epoch starts, in milliseconds.
    pub fn pts(&self) -> Option<u32> {
        self.display_sets.first().map(|ds| ds.pts())
    }
}
