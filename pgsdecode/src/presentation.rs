/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Replays epochs to find out when each object is shown.
//!
//! # Overview
//!
//! Every epoch is replayed in presentation order against a fresh epoch context. Palette and
//! object definitions are cached by ID as they arrive. Each new composition then places its
//! objects onto the screen, stamping them with the time of the composition. Any object that
//! was on the screen but is missing from the new composition has left it, and a
//! [`TimedImage`] is produced for it.
//!
//! Bitmaps are only decoded when an object leaves the screen, so pulling one image from
//! [`TimedImages`] performs exactly the decoding work that image needs.


use crate::{
    bitmap::{crop_image, render_object, ChromaOrder},
    displayset::{DisplaySet, Epoch},
    segment::{Crop, ObjectDefinitionSegment, PaletteDefinitionSegment, PaletteEntry},
    warning::{Warning, Warnings},
};
use std::{
    collections::{HashMap, HashSet, VecDeque},
    mem,
    slice::Iter,
    sync::Arc,
};
use image::RgbaImage;
use log::debug;
use thiserror::Error as ThisError;

pub type PresentResult<T> = Result<T, PresentError>;

/// A composition referenced a definition that its epoch never provided.
#[derive(ThisError, Clone, Debug, Eq, PartialEq)]
pub enum PresentError {
    #[error("composition {composition_number} references unknown object {object_id}")]
    UnknownObjectId {
        object_id: u16,
        composition_number: u16,
    },
    #[error("composition {composition_number} references unknown palette {palette_id}")]
    UnknownPaletteId {
        palette_id: u8,
        composition_number: u16,
    },
}

/// Settings that affect how bitmaps are produced.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DecodeOptions {
    pub chroma_order: ChromaOrder,
}

/// A decoded bitmap along with where and when it was shown.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedImage {
    pub image: RgbaImage,
    pub x: u16,
    pub y: u16,
    /// The time at which the object was last placed onto the screen, in milliseconds.
    pub start: u32,
    /// The time at which the object left the screen, in milliseconds.
    pub end: u32,
    /// The palette the bitmap was rendered with.
    pub palette: [PaletteEntry; 256],
}

impl TimedImage {

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// A cached object along with the serial number of its definition.
#[derive(Clone, Debug)]
struct CachedObject {
    serial: u64,
    object: Arc<ObjectDefinitionSegment>,
}

/// An object currently on the screen.
#[derive(Clone, Debug)]
struct ScreenEntry {
    object_id: u16,
    serial: u64,
    object: Arc<ObjectDefinitionSegment>,
    palette: Arc<PaletteDefinitionSegment>,
    x: u16,
    y: u16,
    crop: Option<Crop>,
    start: u32,
}

impl ScreenEntry {

    fn identity(&self) -> (u16, u64) {
        (self.object_id, self.serial)
    }
}

/// The state of a single epoch being replayed.
///
/// Objects are identified on the screen by their ID together with the definition they were
/// shown from. Redefining an object with different data inside an epoch therefore swaps the
/// old bitmap out for the new one.
#[derive(Debug, Default)]
struct EpochContext {
    palettes: HashMap<u8, Arc<PaletteDefinitionSegment>>,
    objects: HashMap<u16, CachedObject>,
    screen: Vec<ScreenEntry>,
    seen_compositions: HashSet<u16>,
    next_serial: u64,
}

impl EpochContext {

    fn new() -> Self {
        Self::default()
    }

    /// The number of objects currently on the screen.
    fn on_screen(&self) -> usize {
        self.screen.len()
    }

    /// Caches every palette and object defined by a display set, replacing older definitions
    /// with the same ID.
    fn define(&mut self, ds: &DisplaySet) {

        for pds in ds.palette_definitions() {
            self.palettes.insert(pds.id, Arc::new(pds.clone()));
        }

        for ods in ds.object_definitions() {

            let unchanged = self.objects.get(&ods.id).map_or(false, |cached| {
                cached.object.info == ods.info && cached.object.data == ods.data
            });

            if !unchanged {
                self.next_serial += 1;
                self.objects.insert(
                    ods.id,
                    CachedObject {
                        serial: self.next_serial,
                        object: Arc::new(ods.clone()),
                    },
                );
            }
        }
    }

    /// Applies the composition of a display set to the screen and returns the objects that
    /// left it, in the order they were placed.
    fn compose(&mut self, ds: &DisplaySet) -> PresentResult<Vec<ScreenEntry>> {

        let pcs = ds.presentation_composition();

        if !self.seen_compositions.insert(pcs.composition_number) {
            debug!(
                "skipping repeated composition {} at {} ms",
                pcs.composition_number,
                pcs.pts,
            );
            return Ok(vec![])
        }

        let mut shown = Vec::with_capacity(pcs.composition_objects.len());

        for comp_obj in pcs.composition_objects.iter() {

            let cached = self.objects.get(&comp_obj.object_id).ok_or(
                PresentError::UnknownObjectId {
                    object_id: comp_obj.object_id,
                    composition_number: pcs.composition_number,
                }
            )?;
            let palette = self.palettes.get(&pcs.palette_id).ok_or(
                PresentError::UnknownPaletteId {
                    palette_id: pcs.palette_id,
                    composition_number: pcs.composition_number,
                }
            )?;
            let entry = ScreenEntry {
                object_id: comp_obj.object_id,
                serial: cached.serial,
                object: cached.object.clone(),
                palette: palette.clone(),
                x: comp_obj.x,
                y: comp_obj.y,
                crop: comp_obj.crop,
                start: pcs.pts,
            };
            let identity = entry.identity();

            match self.screen.iter_mut().find(|existing| existing.identity() == identity) {
                Some(existing) => *existing = entry,
                None => self.screen.push(entry),
            }

            shown.push(identity);
        }

        let (kept, left): (Vec<ScreenEntry>, Vec<ScreenEntry>) = mem::take(&mut self.screen)
            .into_iter()
            .partition(|entry| shown.contains(&entry.identity()));

        self.screen = kept;

        Ok(left)
    }
}

/// Lazily produces a [`TimedImage`] for every object that leaves the screen.
///
/// Images come out in the order objects leave the screen, so an object that outlives one
/// placed after it is produced later even though it started earlier. Objects still on the screen when
/// their epoch ends are never produced; a [`Warning::ObjectsLeftOnScreen`] is raised for
/// them instead. Iteration stops after the first error.
pub struct TimedImages<'a> {
    epochs: Iter<'a, Epoch>,
    display_sets: Iter<'a, DisplaySet>,
    context: EpochContext,
    pending: VecDeque<(ScreenEntry, u32)>,
    options: DecodeOptions,
    warnings: Warnings,
    done: bool,
}

impl<'a> TimedImages<'a> {

    pub fn new(epochs: &'a [Epoch], options: DecodeOptions) -> Self {
        Self {
            epochs: epochs.iter(),
            display_sets: <&[DisplaySet]>::default().iter(),
            context: EpochContext::new(),
            pending: VecDeque::new(),
            options,
            warnings: Warnings::new(),
            done: false,
        }
    }

    /// Warnings raised while rendering the images produced so far.
    pub fn warnings(&self) -> &Warnings {
        &self.warnings
    }

    pub fn into_warnings(self) -> Warnings {
        self.warnings
    }

    fn end_epoch(&mut self) {

        let objects = self.context.on_screen();

        if objects > 0 {
            self.warnings.push(Warning::ObjectsLeftOnScreen { objects });
        }
    }

    fn render(&mut self, entry: ScreenEntry, end: u32) -> TimedImage {

        let image = render_object(
            &entry.object,
            &entry.palette.entries,
            self.options.chroma_order,
            &mut self.warnings,
        );
        let image = match &entry.crop {
            Some(crop) => crop_image(&image, crop),
            None => image,
        };

        TimedImage {
            image,
            x: entry.x,
            y: entry.y,
            start: entry.start,
            end,
            palette: entry.palette.entries,
        }
    }
}

impl<'a> Iterator for TimedImages<'a> {

    type Item = PresentResult<TimedImage>;

    fn next(&mut self) -> Option<Self::Item> {

        loop {

            if let Some((entry, end)) = self.pending.pop_front() {
                return Some(Ok(self.render(entry, end)))
            }

            if self.done {
                return None
            }

            match self.display_sets.next() {
                Some(ds) => {
                    self.context.define(ds);
                    match self.context.compose(ds) {
                        Ok(left) => {
                            let end = ds.pts();
                            self.pending.extend(left.into_iter().map(|entry| (entry, end)));
                        }
                        Err(err) => {
                            self.done = true;
                            return Some(Err(err))
                        }
                    }
                }
                None => {
                    self.end_epoch();
                    match self.epochs.next() {
                        Some(epoch) => {
                            debug!(
                                "replaying epoch of {} display sets at {} ms",
                                epoch.display_sets.len(),
                                epoch.pts().unwrap_or(0),
                            );
                            self.display_sets = epoch.display_sets.iter();
                            self.context = EpochContext::new();
                        }
                        None => {
                            self.done = true;
                            return None
                        }
                    }
                }
            }
        }
    }
}
