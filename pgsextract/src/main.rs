/*
 * This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0. If a
 * copy of the MPL was not distributed with this file, You can obtain one at
 * https://mozilla.org/MPL/2.0/.
 *
 * Copyright 2021 William Swartzendruber
 *
 * SPDX-License-Identifier: MPL-2.0
 */


use pgsdecode::{
    ms_to_timestamp,
    displayset::ReadError as DisplaySetReadError,
    segment::{
        CompositionState,
        ReadError as SegmentReadError,
        Segment,
        SegmentReader,
    },
    ChromaOrder,
    DecodeOptions,
    PresentError,
    SupStream,
    Warnings,
};
use std::{
    fs::{self, File},
    io::{BufWriter, Error as IoError, Write},
    path::{Path, PathBuf},
    process,
};
use clap::{app_from_crate, crate_authors, crate_description, crate_name, crate_version, Arg};
use image::{ImageError, ImageFormat};
use log::{debug, info, warn};
use thiserror::Error as ThisError;

type ExtractResult<T> = Result<T, ExtractError>;

#[derive(ThisError, Debug)]
enum ExtractError {
    #[error("segment error: {source}")]
    Segment {
        #[from]
        source: SegmentReadError,
    },
    #[error("display set error: {source}")]
    DisplaySet {
        #[from]
        source: DisplaySetReadError,
    },
    #[error("presentation error: {source}")]
    Present {
        #[from]
        source: PresentError,
    },
    #[error("image error: {source}")]
    Image {
        #[from]
        source: ImageError,
    },
    #[error("IO error: {source}")]
    Io {
        #[from]
        source: IoError,
    },
}

fn main() {

    env_logger::init();

    let matches = app_from_crate!()
        .arg(Arg::with_name("input")
            .index(1)
            .value_name("INPUT")
            .help("Input .sup file, or a directory of them")
            .required(true)
        )
        .arg(Arg::with_name("output")
            .index(2)
            .value_name("OUTPUT-DIR")
            .help("Directory to write images and their index to")
            .required_unless("segments")
        )
        .arg(Arg::with_name("swap-chroma")
            .long("swap-chroma")
            .short("s")
            .help("Read palette entries as Y, Cb, Cr instead of Y, Cr, Cb")
        )
        .arg(Arg::with_name("segments")
            .long("segments")
            .short("d")
            .help("Dump every segment instead of extracting images")
        )
        .after_help(format!("This utility will extract timed bitmaps from PGS subtitle \
            streams.\n\n\
            Copyright © 2021 William Swartzendruber\n\
            Licensed under the Mozilla Public License 2.0\n\
            <{}>", env!("CARGO_PKG_REPOSITORY")).as_str())
        .get_matches();
    let input = PathBuf::from(matches.value_of("input").unwrap_or_default());
    let output = matches.value_of("output").map(PathBuf::from);
    let dump = matches.is_present("segments");
    let options = DecodeOptions {
        chroma_order: if matches.is_present("swap-chroma") {
            ChromaOrder::CbCr
        } else {
            ChromaOrder::CrCb
        },
    };

    if !input.exists() {
        eprintln!("Input path does not exist: {}", input.display());
        process::exit(1);
    }

    let output = match output {
        Some(output) if output.is_dir() => Some(output),
        Some(output) => {
            eprintln!("Output directory does not exist: {}", output.display());
            process::exit(1);
        }
        None => None,
    };
    let files = match input_files(&input) {
        Ok(files) => files,
        Err(err) => {
            eprintln!("Could not list input directory: {}", err);
            process::exit(1);
        }
    };

    for file in files.iter() {

        if !is_sup(file) {
            eprintln!("Skipping {}: not a .sup file", file.display());
            continue
        }

        let result = match (&output, dump) {
            (Some(output), false) => extract(file, output, options).map(|count| {
                eprintln!("Extracted {} images from {}", count, file.display());
            }),
            _ => dump_segments(file),
        };

        if let Err(err) = result {
            eprintln!("Skipping {}: {}", file.display(), err);
        }
    }
}

/// Lists the files to process, which is either the input itself or the files directly inside
/// of it.
fn input_files(input: &Path) -> ExtractResult<Vec<PathBuf>> {

    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()])
    }

    let mut files = vec![];

    for entry in fs::read_dir(input)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }

    files.sort();

    Ok(files)
}

fn is_sup(path: &Path) -> bool {
    path.extension().map_or(false, |extension| extension.eq_ignore_ascii_case("sup"))
}

fn report(file: &Path, warnings: &Warnings) {
    if !warnings.is_empty() {
        eprintln!("{}: {} warnings", file.display(), warnings.len());
    }
}

/// Writes every image of a stream as a PNG along with a tab-separated index of when and
/// where each one is shown.
///
/// The index only takes its final name once every image has been written. When decoding fails
/// partway through, the images written so far are removed again.
fn extract(file: &Path, output: &Path, options: DecodeOptions) -> ExtractResult<usize> {

    let stream = SupStream::open(file)?;
    let stem = file.file_stem().map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "subtitle".to_string());

    if let Some((width, height)) = stream.screen_size() {
        info!(
            "{}: {} epochs on a {}x{} screen",
            file.display(),
            stream.epochs().len(),
            width,
            height,
        );
    }

    let index_path = output.join(format!("{}.tsv", stem));
    let partial_path = output.join(format!("{}.tsv.part", stem));
    let mut written = vec![];

    match write_images(&stream, &stem, output, &partial_path, options, &mut written) {
        Ok(warnings) => {
            fs::rename(&partial_path, &index_path)?;
            report(file, &warnings);
            Ok(written.len())
        }
        Err(err) => {
            for path in written.iter().chain(Some(&partial_path)) {
                if let Err(remove_err) = fs::remove_file(path) {
                    debug!("could not remove {}: {}", path.display(), remove_err);
                }
            }
            Err(err)
        }
    }
}

fn write_images(
    stream: &SupStream,
    stem: &str,
    output: &Path,
    index_path: &Path,
    options: DecodeOptions,
    written: &mut Vec<PathBuf>,
) -> ExtractResult<Warnings> {

    let mut index = BufWriter::new(File::create(index_path)?);
    let mut timed_images = stream.timed_images(options);

    writeln!(index, "start_ms\tend_ms\tx\ty\twidth\theight\tfile")?;

    for timed_image in timed_images.by_ref() {

        let timed_image = timed_image?;

        if timed_image.width() == 0 || timed_image.height() == 0 {
            warn!("skipping empty image at {}", ms_to_timestamp(timed_image.start));
            continue
        }

        let name = format!("{}_{:05}.png", stem, written.len());
        let path = output.join(&name);

        written.push(path.clone());
        timed_image.image.save_with_format(&path, ImageFormat::Png)?;
        writeln!(
            index,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            timed_image.start,
            timed_image.end,
            timed_image.x,
            timed_image.y,
            timed_image.width(),
            timed_image.height(),
            name,
        )?;
        debug!(
            "{} -> {}: {}",
            ms_to_timestamp(timed_image.start),
            ms_to_timestamp(timed_image.end),
            name,
        );
    }

    index.flush()?;

    let mut warnings = stream.warnings().clone();

    warnings.extend(timed_images.into_warnings());

    Ok(warnings)
}

/// Prints every segment of a stream in stream order.
fn dump_segments(file: &Path) -> ExtractResult<()> {

    let data = fs::read(file)?;
    let mut warnings = Warnings::new();

    for raw in SegmentReader::new(&data) {
        match raw?.decode(&mut warnings)? {
            Segment::PresentationComposition(pcs) => {
                println!(
                    "presentation_composition_segment({})",
                    ms_to_timestamp(pcs.pts),
                );
                println!("  video_width = {}", pcs.width);
                println!("  video_height = {}", pcs.height);
                println!("  composition_number = {}", pcs.composition_number);
                println!("  composition_state = {}", match pcs.composition_state {
                    CompositionState::EpochStart => "EPOCH_START",
                    CompositionState::Normal => "NORMAL_CASE",
                    CompositionState::AcquisitionPoint => "ACQUISITION_POINT",
                });
                println!("  palette_update_flag = {}", pcs.palette_update);
                println!("  palette_id = {}", pcs.palette_id);
                for comp_obj in pcs.composition_objects.iter() {
                    println!("  composition_object");
                    println!("    object_id = {}", comp_obj.object_id);
                    println!("    window_id = {}", comp_obj.window_id);
                    println!("    object_forced_on_flag = {}", comp_obj.forced);
                    println!("    object_horizontal_position = {}", comp_obj.x);
                    println!("    object_vertical_position = {}", comp_obj.y);
                    if let Some(crop) = &comp_obj.crop {
                        println!("    object_cropping_horizontal_position = {}", crop.x);
                        println!("    object_cropping_vertical_position = {}", crop.y);
                        println!("    object_cropping_width = {}", crop.width);
                        println!("    object_cropping_height = {}", crop.height);
                    }
                }
            }
            Segment::WindowDefinition(wds) => {
                println!("window_definition_segment({})", ms_to_timestamp(wds.pts));
                for wd in wds.windows.iter() {
                    println!("  window_id = {}", wd.id);
                    println!("  window_horizontal_position = {}", wd.x);
                    println!("  window_vertical_position = {}", wd.y);
                    println!("  window_width = {}", wd.width);
                    println!("  window_height = {}", wd.height);
                }
            }
            Segment::PaletteDefinition(pds) => {
                println!("palette_definition_segment({})", ms_to_timestamp(pds.pts));
                println!("  palette_id = {}", pds.id);
                println!("  palette_version = {}", pds.version);
            }
            Segment::ObjectDefinition(ods) => {
                println!("object_definition_segment({})", ms_to_timestamp(ods.pts));
                println!("  object_id = {}", ods.id);
                println!("  object_version = {}", ods.version);
                println!("  first_in_sequence = {}", ods.is_first);
                println!("  last_in_sequence = {}", ods.is_last);
                if let Some(info) = ods.info {
                    println!("  object_data_length = {}", info.data_length);
                    println!("  object_width = {}", info.width);
                    println!("  object_height = {}", info.height);
                }
                println!("  object_data = [{}]", ods.data.len());
            }
            Segment::End(es) => {
                println!("end_segment({})", ms_to_timestamp(es.pts));
                println!();
            }
        }
    }

    report(file, &warnings);

    Ok(())
}
