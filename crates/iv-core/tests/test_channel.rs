use approx::assert_relative_eq;

use iv_core::channel::{describe, ChannelSource, ChannelView};

#[test]
fn test_cycle_wraps_within_channel_range() {
    assert_eq!(ChannelView::Single(2).cycle(3, 1), ChannelView::Single(0));
    assert_eq!(ChannelView::Single(0).cycle(3, -1), ChannelView::Single(2));
    assert_eq!(ChannelView::Single(1).cycle(3, 1), ChannelView::Single(2));
    assert_eq!(ChannelView::Single(1).cycle(3, -1), ChannelView::Single(0));
}

#[test]
fn test_cycle_full_loop_returns_to_start() {
    let mut view = ChannelView::RED;
    for _ in 0..4 {
        view = view.cycle(4, 1);
    }
    assert_eq!(view, ChannelView::RED);
}

#[test]
fn test_named_modes_enter_cycle_at_the_ends() {
    assert_eq!(ChannelView::FullColor.cycle(3, 1), ChannelView::Single(0));
    assert_eq!(ChannelView::FullColor.cycle(3, -1), ChannelView::Single(2));
    assert_eq!(ChannelView::Luminance.cycle(4, 1), ChannelView::Single(0));
    assert_eq!(ChannelView::Luminance.cycle(4, -1), ChannelView::Single(3));
    // Nothing to cycle through.
    assert_eq!(ChannelView::FullColor.cycle(0, 1), ChannelView::FullColor);
}

#[test]
fn test_cycle_from_index_past_end() {
    // A channel remembered from a wider image clamps before stepping.
    assert_eq!(ChannelView::ALPHA.cycle(3, 1), ChannelView::Single(0));
    assert_eq!(ChannelView::ALPHA.cycle(3, -1), ChannelView::Single(1));
}

#[test]
fn test_describe_modes() {
    let full = describe(ChannelView::FullColor, 4);
    assert_eq!(full.source, ChannelSource::All);
    assert!(!full.grayscale && !full.luminance);

    let lum = describe(ChannelView::Luminance, 3);
    assert_eq!(lum.source, ChannelSource::All);
    assert!(lum.grayscale && lum.luminance);

    let green = ChannelView::GREEN.describe(3);
    assert_eq!(green.source, ChannelSource::Index(1));
    assert!(green.grayscale && !green.luminance);
    assert_eq!(green.source_channels(), vec![1]);
}

#[test]
fn test_describe_degrades_for_narrow_images() {
    for mode in [ChannelView::FullColor, ChannelView::Luminance] {
        let d = describe(mode, 1);
        assert_eq!(d.source, ChannelSource::Index(0));
        assert!(d.grayscale);
    }
    // Alpha of an RGB image does not exist.
    assert_eq!(describe(ChannelView::ALPHA, 3).source, ChannelSource::All);
    assert_eq!(describe(ChannelView::ALPHA, 1).source, ChannelSource::Index(0));
}

#[test]
fn test_combine() {
    let lum = describe(ChannelView::Luminance, 3);
    let [y, y2, y3] = lum.combine(&[1.0, 1.0, 1.0]);
    assert_relative_eq!(y, 1.0, epsilon = 1e-6);
    assert_eq!((y, y), (y2, y3));
    let [g, _, _] = lum.combine(&[0.0, 1.0, 0.0]);
    assert_relative_eq!(g, 0.7152);

    let gray = describe(ChannelView::BLUE, 3);
    assert_eq!(gray.combine(&[0.25]), [0.25; 3]);

    let full = describe(ChannelView::FullColor, 3);
    assert_eq!(full.combine(&[0.1, 0.2, 0.3]), [0.1, 0.2, 0.3]);
}

#[test]
fn test_display_names() {
    assert_eq!(ChannelView::FullColor.to_string(), "RGB");
    assert_eq!(ChannelView::RED.to_string(), "Red");
    assert_eq!(ChannelView::Single(7).to_string(), "Channel 7");
}
