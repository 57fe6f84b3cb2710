/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: OSL-3.0
 */

//! Decodes Presentation Graphics Stream (PGS) subtitles into timed bitmaps.
//!
//! # Overview
//!
//! A PGS bitstream (typically stored in a `.sup` file) is a flat sequence of segments. This
//! crate reads those segments, groups them into display sets and epochs, and then replays
//! each epoch to determine when every bitmap object appears on and disappears from the
//! screen. Each time an object leaves the screen, a [`TimedImage`] is produced containing the
//! decoded RGBA bitmap, its position, and its presentation window in milliseconds.
//!
//! ```no_run
//! use pgsdecode::{DecodeOptions, SupStream};
//!
//! let stream = SupStream::open("subtitles.sup")?;
//!
//! for timed_image in stream.timed_images(DecodeOptions::default()) {
//!     let timed_image = timed_image?;
//!     println!("{} -> {}", timed_image.start, timed_image.end);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Malformed data that can still be decoded does not stop the pipeline. Such conditions are
//! collected as [`Warning`] values and logged through the `log` crate.

pub mod bitmap;
pub mod displayset;
pub mod presentation;
pub mod segment;
pub mod stream;
pub mod warning;

pub use bitmap::ChromaOrder;
pub use presentation::{DecodeOptions, PresentError, TimedImage, TimedImages};
pub use stream::SupStream;
pub use warning::{Warning, Warnings};

/// The number of PGS clock ticks within a millisecond. Timestamps are stored on the wire in
/// units of a 90 kHz clock.
pub const TICKS_PER_MS: u32 = 90;

/// Renders a millisecond count as an `HH:MM:SS.mmm` timestamp.
pub fn ms_to_timestamp(ms: u32) -> String {

    let mut time = ms;
    let millis = time % 1000;
    time /= 1000;
    let seconds = time % 60;
    time /= 60;
    let minutes = time % 60;
    time /= 60;
    let hours = time;

    format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, seconds, millis)
}
