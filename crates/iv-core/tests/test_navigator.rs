#[allow(dead_code)]
mod common;

use std::sync::Arc;
use std::time::Duration;

use approx::assert_relative_eq;

use iv_core::config::ViewerConfig;
use iv_core::error::IvError;
use iv_core::image::{ReadOutcome, StateKind};
use iv_core::loader::Loader;
use iv_core::navigator::{ImageCollection, LoadPoll};

use common::MemoryDecoder;

fn collection(names: &[&str]) -> (ImageCollection, Arc<MemoryDecoder>) {
    let decoder = Arc::new(MemoryDecoder::new());
    for name in names {
        decoder.insert_gray(*name, 4, 4, 2);
    }
    let mut images = ImageCollection::new(decoder.clone(), ViewerConfig::default());
    for name in names {
        images.add_image(*name, false);
    }
    (images, decoder)
}

fn current_name(images: &ImageCollection) -> String {
    images.current().unwrap().path().display().to_string()
}

#[test]
fn test_empty_collection_is_inert() {
    let (mut images, _) = collection(&[]);
    assert_eq!(images.current_index(), None);
    assert!(images.next().unwrap().is_none());
    assert!(images.prev().unwrap().is_none());
    assert!(images.toggle_last().unwrap().is_none());
    assert!(images.close_current().unwrap().is_none());
    assert!(images.reload().unwrap().is_none());
    assert!(matches!(
        images.select(0),
        Err(IvError::IndexOutOfRange { index: 0, len: 0 })
    ));
}

#[test]
fn test_add_image_fetches_spec_on_request() {
    let decoder = Arc::new(MemoryDecoder::new());
    decoder.insert_gray("a", 4, 4, 1);
    let mut images = ImageCollection::new(decoder.clone(), ViewerConfig::default());

    images.add_image("a", true);
    images.add_image("missing", true);
    images.add_image("a", false);

    assert_eq!(images.len(), 3);
    assert_eq!(images.current_index(), Some(0));
    assert_eq!(images.get(0).unwrap().kind(), StateKind::SpecResident);
    assert_eq!(images.get(1).unwrap().kind(), StateKind::Broken);
    assert_eq!(images.get(2).unwrap().kind(), StateKind::KnownUnread);
    assert_eq!(decoder.opens(), 2);
    assert_eq!(decoder.reads(), 0);
}

#[test]
fn test_select_reads_only_when_needed() {
    let (mut images, decoder) = collection(&["a", "b"]);

    assert_eq!(images.select(1).unwrap(), ReadOutcome::Loaded);
    assert_eq!(images.select(0).unwrap(), ReadOutcome::Loaded);
    assert_eq!(images.select(1).unwrap(), ReadOutcome::Cached);
    assert_eq!(decoder.reads(), 2);
    assert!(images.get(0).unwrap().is_pixels_valid());
    assert!(matches!(
        images.select(2),
        Err(IvError::IndexOutOfRange { index: 2, len: 2 })
    ));
}

#[test]
fn test_next_prev_wrap() {
    let (mut images, _) = collection(&["a", "b", "c", "d"]);
    images.select(0).unwrap();

    for _ in 0..4 {
        images.prev().unwrap();
    }
    assert_eq!(images.current_index(), Some(0));

    images.prev().unwrap();
    assert_eq!(images.current_index(), Some(3));
    images.next().unwrap();
    assert_eq!(images.current_index(), Some(0));

    for _ in 0..4 {
        images.next().unwrap();
    }
    assert_eq!(images.current_index(), Some(0));
}

#[test]
fn test_toggle_last_is_own_inverse() {
    let (mut images, _) = collection(&["a", "b", "c"]);
    images.select(0).unwrap();
    assert!(images.toggle_last().unwrap().is_none());

    images.select(2).unwrap();
    assert_eq!(images.last_index(), Some(0));

    images.toggle_last().unwrap();
    assert_eq!(images.current_index(), Some(0));
    images.toggle_last().unwrap();
    assert_eq!(images.current_index(), Some(2));
}

#[test]
fn test_close_current_selects_follower() {
    let (mut images, _) = collection(&["a", "b", "c"]);
    images.select(1).unwrap();

    images.close_current().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images.current_index(), Some(1));
    assert_eq!(current_name(&images), "c");
    assert!(images.current().unwrap().is_pixels_valid());

    // Closing the last one wraps to the first.
    images.close_current().unwrap();
    assert_eq!(current_name(&images), "a");

    images.close_current().unwrap();
    assert!(images.is_empty());
    assert_eq!(images.current_index(), None);
    assert_eq!(images.last_index(), None);
}

#[test]
fn test_close_current_fixes_last_index() {
    let (mut images, _) = collection(&["a", "b", "c", "d"]);
    images.select(3).unwrap();
    images.select(1).unwrap();
    assert_eq!(images.last_index(), Some(3));

    images.close_current().unwrap();
    assert_eq!(current_name(&images), "c");
    assert_eq!(images.last_index(), Some(2));

    images.toggle_last().unwrap();
    assert_eq!(current_name(&images), "d");
}

#[test]
fn test_subimage_steps_clamp_and_reload_forces() {
    let (mut images, decoder) = collection(&["a"]);
    images.select(0).unwrap();

    assert_eq!(images.set_subimage(1).unwrap(), Some(ReadOutcome::Loaded));
    assert_eq!(images.current().unwrap().subimage(), 1);
    assert!(images.set_subimage(1).unwrap().is_none());
    assert_eq!(images.set_subimage(-5).unwrap(), Some(ReadOutcome::Loaded));
    assert_eq!(images.current().unwrap().subimage(), 0);

    let reads = decoder.reads();
    assert_eq!(images.reload().unwrap(), Some(ReadOutcome::Loaded));
    assert_eq!(decoder.reads(), reads + 1);
}

#[test]
fn test_display_adjustments_are_per_image() {
    let (mut images, _) = collection(&["a", "b"]);
    images.select(0).unwrap();
    let config = images.config().clone();

    images.adjust_exposure(config.exposure_large_step);
    images.adjust_exposure(config.exposure_small_step);
    assert_relative_eq!(images.current().unwrap().exposure(), 0.6, epsilon = 1e-6);

    for _ in 0..100 {
        images.adjust_gamma(-config.gamma_step);
    }
    assert_relative_eq!(images.current().unwrap().gamma(), config.min_gamma);

    images.next().unwrap();
    assert_relative_eq!(images.current().unwrap().exposure(), 0.0);
    images.prev().unwrap();
    assert_relative_eq!(images.current().unwrap().exposure(), 0.6, epsilon = 1e-6);
}

#[test]
fn test_broken_image_stays_listed() {
    let (mut images, decoder) = collection(&["a", "b"]);
    decoder.remove(std::path::Path::new("b"));

    assert!(images.select(1).is_err());
    assert_eq!(images.len(), 2);
    assert!(images.current().unwrap().is_broken());
    assert!(images.current_mut().unwrap().take_error_message().contains("b"));

    images.next().unwrap();
    assert_eq!(current_name(&images), "a");
}

fn wait_for_install(images: &mut ImageCollection) -> LoadPoll {
    for _ in 0..500 {
        let poll = images.poll_loader();
        if !poll.installed.is_empty() || !poll.errors.is_empty() {
            return poll;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    panic!("loader produced nothing");
}

#[test]
fn test_background_loader_installs_pixels() {
    let (mut images, decoder) = collection(&["a", "b"]);
    images.attach_loader(Loader::spawn(decoder.clone()).unwrap());

    let outcome = images.select(1).unwrap();
    assert!(matches!(outcome, ReadOutcome::Queued { .. }));
    assert!(images.is_loading());
    assert!(!images.current().unwrap().is_pixels_valid());

    let poll = wait_for_install(&mut images);
    assert_eq!(poll.installed, vec![images.current().unwrap().id()]);
    assert!(!images.is_loading());
    assert!(images.current().unwrap().is_pixels_valid());
    assert_eq!(images.select(1).unwrap(), ReadOutcome::Cached);
    assert_eq!(decoder.reads(), 1);
}

#[test]
fn test_background_result_for_closed_image_is_dropped() {
    let (mut images, decoder) = collection(&["a", "b"]);
    images.attach_loader(Loader::spawn(decoder.clone()).unwrap());

    images.select(0).unwrap();
    images.close_current().unwrap();

    let poll = wait_for_install(&mut images);
    assert_eq!(images.len(), 1);
    assert_eq!(poll.installed, vec![images.current().unwrap().id()]);
}

#[test]
fn test_background_failure_reports_error() {
    let (mut images, decoder) = collection(&["a"]);
    images.attach_loader(Loader::spawn(decoder.clone()).unwrap());
    decoder.set_fail_pixels(true);

    images.select(0).unwrap();
    let poll = wait_for_install(&mut images);
    assert_eq!(poll.errors.len(), 1);
    let record = images.current_mut().unwrap();
    assert_eq!(record.kind(), StateKind::SpecResident);
    assert!(!record.take_error_message().is_empty());
}

#[test]
fn test_failed_reload_keeps_record_broken() {
    let (mut images, decoder) = collection(&["a"]);
    images.attach_loader(Loader::spawn(decoder.clone()).unwrap());

    assert!(matches!(images.select(0).unwrap(), ReadOutcome::Queued { .. }));
    decoder.remove(std::path::Path::new("a"));
    assert!(images.reload().is_err());
    assert!(images.current().unwrap().is_broken());
    assert!(!images.is_loading());

    // The earlier read finishes (or fails) in the background and is ignored.
    for _ in 0..40 {
        let poll = images.poll_loader();
        assert!(poll.installed.is_empty());
        assert!(poll.errors.is_empty());
        std::thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(images.current().unwrap().kind(), StateKind::Broken);
}
