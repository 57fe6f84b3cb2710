/*
 * Any copyright is dedicated to the Public Domain.
 * https://creativecommons.org/publicdomain/zero/1.0/
 */

use super::*;
use crate::{
    displayset::ReadError,
    segment::{
        EndSegment,
        PresentationCompositionSegment,
        Segment,
        WriteSegmentExt,
    },
    warning::Warning,
};

fn display_set(pts: u32, composition_number: u16, state: CompositionState) -> Vec<Segment> {
    vec![
        Segment::PresentationComposition(
            PresentationCompositionSegment {
                pts,
                dts: 0,
                width: 720,
                height: 480,
                frame_rate: 0x10,
                composition_number,
                composition_state: state,
                palette_update: false,
                palette_id: 0,
                composition_objects: vec![],
            }
        ),
        Segment::End(EndSegment { pts, dts: 0 }),
    ]
}

fn stream(display_sets: &[Vec<Segment>]) -> Vec<u8> {

    let mut buffer = vec![];

    for segment in display_sets.iter().flatten() {
        buffer.write_segment(segment).unwrap();
    }

    buffer
}

fn composition_numbers(epoch: &Epoch) -> Vec<u16> {
    epoch.display_sets
        .iter()
        .map(|ds| ds.presentation_composition().composition_number)
        .collect()
}

#[test]
fn test_display_sets_are_sorted_by_timestamp() {

    let data = stream(&[
        display_set(100, 0, CompositionState::EpochStart),
        display_set(900, 2, CompositionState::Normal),
        display_set(500, 1, CompositionState::Normal),
        display_set(500, 3, CompositionState::Normal),
    ]);
    let stream = SupStream::from_bytes(&data).unwrap();

    assert_eq!(stream.epochs().len(), 1);
    assert_eq!(composition_numbers(&stream.epochs()[0]), vec![0, 1, 3, 2]);
}

#[test]
fn test_epochs_split_on_epoch_start_only() {

    let data = stream(&[
        display_set(100, 0, CompositionState::EpochStart),
        display_set(200, 1, CompositionState::AcquisitionPoint),
        display_set(3_600_000, 2, CompositionState::Normal),
        display_set(3_600_100, 3, CompositionState::EpochStart),
        display_set(3_600_200, 4, CompositionState::Normal),
    ]);
    let stream = SupStream::from_bytes(&data).unwrap();
    let epochs = stream.epochs();

    assert_eq!(epochs.len(), 2);
    assert_eq!(composition_numbers(&epochs[0]), vec![0, 1, 2]);
    assert_eq!(composition_numbers(&epochs[1]), vec![3, 4]);
    assert_eq!(epochs[1].pts(), Some(3_600_100));
    assert_eq!(stream.display_sets().count(), 5);
}

#[test]
fn test_leading_display_sets_form_their_own_epoch() {

    let data = stream(&[
        display_set(100, 0, CompositionState::Normal),
        display_set(200, 1, CompositionState::EpochStart),
    ]);
    let stream = SupStream::from_bytes(&data).unwrap();

    assert_eq!(stream.epochs().len(), 2);
    assert_eq!(composition_numbers(&stream.epochs()[0]), vec![0]);
}

#[test]
fn test_screen_size() {

    let data = stream(&[display_set(100, 0, CompositionState::EpochStart)]);

    assert_eq!(SupStream::from_bytes(&data).unwrap().screen_size(), Some((720, 480)));
    assert_eq!(SupStream::from_bytes(&[]).unwrap().screen_size(), None);
}

#[test]
fn test_trailing_segments_are_a_warning() {

    let mut display_sets = vec![display_set(100, 0, CompositionState::EpochStart)];

    display_sets.push(display_set(200, 1, CompositionState::Normal)[..1].to_vec());

    let stream = SupStream::from_bytes(&stream(&display_sets)).unwrap();

    assert_eq!(stream.display_sets().count(), 1);
    assert_eq!(
        stream.warnings().as_slice(),
        &[Warning::UnterminatedDisplaySet { segments: 1 }],
    );
}

#[test]
fn test_read_errors_are_fatal() {

    let mut data = stream(&[display_set(100, 0, CompositionState::EpochStart)]);

    data.truncate(data.len() - 1);

    assert!(matches!(SupStream::from_bytes(&data), Err(ReadError::SegmentError { .. })));
}

#[test]
fn test_open_missing_file() {
    assert!(
        matches!(
            SupStream::open("/nonexistent/subtitles.sup"),
            Err(ReadError::SegmentError { source: SegmentReadError::IoError { .. } })
        )
    );
}
