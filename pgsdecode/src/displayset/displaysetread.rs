/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

use super::{
    DisplaySet,
    super::{
        segment::{
            ObjectDefinitionSegment,
            ReadError as SegmentReadError,
            Segment,
            SegmentReader,
        },
        warning::{Warning, Warnings},
    },
};
use std::mem;
use log::{debug, trace};
use thiserror::Error as ThisError;

pub type ReadResult<T> = Result<T, ReadError>;

#[derive(ThisError, Debug)]
pub enum ReadError {
    #[error("segment value error")]
    SegmentError {
        #[from]
        source: SegmentReadError,
    },
    #[error("display set has no presentation composition segment")]
    MissingPresentationCompositionSegment,
    #[error("unexpected presentation composition segment within display set")]
    UnexpectedPresentationCompositionSegment,
}

/// Reads display sets from an in-memory PGS bitstream in stream order.
///
/// Object fragments are held back until their last fragment arrives, at which point the
/// reassembled object takes the place of the last fragment. Iteration stops after the first
/// error.
pub struct DisplaySetReader<'a> {
    segments: SegmentReader<'a>,
    pending: Vec<Segment>,
    fragments: Vec<ObjectDefinitionSegment>,
    warnings: Warnings,
    done: bool,
}

impl<'a> DisplaySetReader<'a> {

    pub fn new(data: &'a [u8]) -> Self {
        Self {
            segments: SegmentReader::new(data),
            pending: Vec::new(),
            fragments: Vec::new(),
            warnings: Warnings::new(),
            done: false,
        }
    }

    /// Warnings raised by the segments read so far.
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn into_warnings(self) -> Warnings {
        self.warnings
    }

    fn fail<E: Into<ReadError>>(&mut self, error: E) -> Option<ReadResult<DisplaySet>> {
        self.done = true;
        Some(Err(error.into()))
    }

    fn finish(&mut self) {

        self.done = true;

        if let Some(fragment) = self.fragments.first() {
            let object_id = fragment.id;
            self.warnings.push(Warning::UnterminatedObject { object_id });
        }
        if !self.pending.is_empty() {
            let segments = self.pending.len();
            self.warnings.push(Warning::UnterminatedDisplaySet { segments });
        }
    }

    fn push_fragment(&mut self, fragment: ObjectDefinitionSegment) -> Option<ObjectDefinitionSegment> {

        if let Some(buffered) = self.fragments.first() {
            if buffered.id != fragment.id {
                self.warnings.push(
                    Warning::InterleavedObjectFragments {
                        expected: buffered.id,
                        found: fragment.id,
                    }
                );
                self.fragments.clear();
            } else if fragment.is_first {
                self.warnings.push(Warning::RestartedObject { object_id: fragment.id });
                self.fragments.clear();
            }
        }

        let is_last = fragment.is_last;

        self.fragments.push(fragment);

        if is_last {
            merge_fragments(mem::take(&mut self.fragments), &mut self.warnings)
        } else {
            None
        }
    }
}

impl<'a> Iterator for DisplaySetReader<'a> {

    type Item = ReadResult<DisplaySet>;

    fn next(&mut self) -> Option<Self::Item> {

        if self.done {
            return None
        }

        loop {

            let raw = match self.segments.next() {
                Some(Ok(raw)) => raw,
                Some(Err(err)) => return self.fail(err),
                None => {
                    self.finish();
                    return None
                }
            };
            let segment = match raw.decode(&mut self.warnings) {
                Ok(Segment::ObjectDefinition(ods)) => {
                    match self.push_fragment(ods) {
                        Some(object) => Segment::ObjectDefinition(object),
                        None => continue,
                    }
                }
                Ok(segment) => segment,
                Err(err) => return self.fail(err),
            };
            let is_end = matches!(segment, Segment::End(_));

            trace!("decoded {:?} segment at {} ms", segment.kind(), segment.pts());
            self.pending.push(segment);

            if is_end {
                return match DisplaySet::new(mem::take(&mut self.pending)) {
                    Ok(ds) => {
                        debug!(
                            "display set {} at {} ms with {} segments",
                            ds.presentation_composition().composition_number,
                            ds.pts(),
                            ds.segments().len(),
                        );
                        Some(Ok(ds))
                    }
                    Err(err) => self.fail(err),
                }
            }
        }
    }
}

/// Joins the fragments of one object into a single object that is both first and last.
///
/// The width, height, and declared length of the first fragment are kept. Returns `None` when
/// the first fragment is missing.
pub fn merge_fragments(
    fragments: Vec<ObjectDefinitionSegment>,
    warnings: &mut Warnings,
) -> Option<ObjectDefinitionSegment> {

    let mut fragments = fragments.into_iter();
    let mut object = fragments.next()?;
    let info = match object.info {
        Some(info) if object.is_first => info,
        _ => {
            warnings.push(Warning::OrphanObjectFragment { object_id: object.id });
            return None
        }
    };

    for fragment in fragments {
        object.data.extend_from_slice(&fragment.data);
    }

    object.is_first = true;
    object.is_last = true;

    // The declared length also counts the width and height fields.
    let declared = (info.data_length as usize).saturating_sub(4);

    if object.data.len() != declared {
        warnings.push(
            Warning::ObjectLengthMismatch {
                object_id: object.id,
                declared,
                found: object.data.len(),
            }
        );
    }

    Some(object)
}
