/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Loads a whole PGS bitstream and arranges it into epochs.

#[cfg(test)]
mod tests;

use crate::{
    displayset::{DisplaySet, DisplaySetReader, Epoch, ReadResult},
    presentation::{DecodeOptions, TimedImages},
    segment::{CompositionState, ReadError as SegmentReadError},
    warning::Warnings,
};
use std::{fs, path::Path};
use log::debug;

/// A fully assembled PGS bitstream.
///
/// Display sets are ordered by presentation timestamp and split into epochs wherever a
/// composition starts a new epoch. Display sets that precede the first epoch start form an
/// epoch of their own.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SupStream {
    epochs: Vec<Epoch>,
    warnings: Warnings,
}

impl SupStream {

    /// Reads and assembles the `.sup` file at `path` in a single read.
    pub fn open<P: AsRef<Path>>(path: P) -> ReadResult<Self> {

        let data = fs::read(path).map_err(SegmentReadError::from)?;

        Self::from_bytes(&data)
    }

    /// Assembles a bitstream that is already in memory.
    pub fn from_bytes(data: &[u8]) -> ReadResult<Self> {

        let mut reader = DisplaySetReader::new(data);
        let mut display_sets = reader.by_ref().collect::<ReadResult<Vec<DisplaySet>>>()?;

        // Stable, so display sets sharing a timestamp keep their stream order.
        display_sets.sort_by_key(|ds| ds.pts());

        let epochs = group_epochs(display_sets);

        debug!("assembled {} epochs", epochs.len());

        Ok(
            Self {
                epochs,
                warnings: reader.into_warnings(),
            }
        )
    }

    pub fn epochs(&self) -> &[Epoch] {
        &self.epochs
    }

    /// Every display set of the stream in presentation order.
    pub fn display_sets(&self) -> impl Iterator<Item = &DisplaySet> {
        self.epochs.iter().flat_map(|epoch| epoch.display_sets.iter())
    }

    /// The screen resolution of the first composition, if there is one.
    pub fn screen_size(&self) -> Option<(u16, u16)> {
        self.display_sets().next().map(|ds| {
            let pcs = ds.presentation_composition();
            (pcs.width, pcs.height)
        })
    }

    /// Warnings raised while reading and assembling the stream.
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    /// Replays the stream, yielding one image each time an object leaves the screen.
    pub fn timed_images(&self, options: DecodeOptions) -> TimedImages<'_> {
        TimedImages::new(&self.epochs, options)
    }
}

/// Splits ordered display sets into epochs at every epoch start.
pub fn group_epochs(display_sets: Vec<DisplaySet>) -> Vec<Epoch> {

    let mut epochs = Vec::new();
    let mut current = Epoch::default();

    for ds in display_sets {

        if ds.composition_state() == CompositionState::EpochStart
            && !current.display_sets.is_empty() {
            epochs.push(std::mem::take(&mut current));
        }

        current.display_sets.push(ds);
    }

    if !current.display_sets.is_empty() {
        epochs.push(current);
    }

    epochs
}
