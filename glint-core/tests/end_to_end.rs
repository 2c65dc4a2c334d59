//! Wire-to-scene scenarios through the public API

use std::collections::VecDeque;

use glint_core::config::DeviceConfig;
use glint_core::palette::Color;
use glint_core::traits::{ByteSource, DisplayDriver};
use glint_core::{Applied, Engine, LinkError, Runner, Scene};
use glint_protocol::{ParseError, TILE_SIZE};

struct Wire(VecDeque<u8>);

impl Wire {
    fn send(&mut self, text: &str) {
        self.0.extend(text.bytes());
    }
}

impl ByteSource for Wire {
    type Error = core::convert::Infallible;

    fn read_available(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.0.len());
        for (slot, byte) in buf.iter_mut().zip(self.0.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

/// Remembers where each visible node was placed on the last composition
#[derive(Default)]
struct Snapshot {
    visible: Vec<(u16, u16)>,
    refreshes: u32,
}

impl DisplayDriver for Snapshot {
    type Error = ();

    fn set_root_scene(&mut self, scene: &Scene) -> Result<(), ()> {
        self.visible = scene
            .iter()
            .filter(|n| n.is_visible())
            .map(|n| n.anchor())
            .collect();
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), ()> {
        self.refreshes += 1;
        Ok(())
    }
}

fn runner() -> Runner<Wire, Snapshot> {
    Runner::new(
        &DeviceConfig::default(),
        Wire(VecDeque::new()),
        Snapshot::default(),
    )
}

fn tile(value: u8) -> String {
    format!("{:02x}", value).repeat(TILE_SIZE * TILE_SIZE)
}

/// Poll until the wire is drained
fn drain(runner: &mut Runner<Wire, Snapshot>, now_ns: u64) -> Vec<Applied> {
    let mut applied = Vec::new();
    for _ in 0..100 {
        let report = runner.poll(now_ns).unwrap();
        applied.extend(report.applied.iter().copied());
        if report.bytes_read == 0 {
            break;
        }
    }
    applied
}

#[test]
fn test_bitmap_over_wire() {
    let mut runner = runner();
    runner.source_mut().send("<P0A0A0A>");
    runner
        .source_mut()
        .send(&format!("<B00A00A01014{}>", tile(0)));
    drain(&mut runner, 0);

    let engine = runner.engine();
    assert_eq!(engine.palette().get(0).map(|c| c.packed()), Some(0x0A0A0A));
    assert_eq!(engine.scene().len(), 1);
    let node = engine.scene().iter().next().unwrap();
    assert_eq!(node.position(), (2, 2));
    assert_eq!((node.width(), node.height()), (16, 16));
    assert_eq!(engine.color_at(2, 2), Some(Color::new(10, 10, 10)));
    assert_eq!(runner.display().visible, vec![(10, 10)]);
}

#[test]
fn test_multi_tile_bitmap_is_column_major() {
    let mut engine = Engine::default();
    engine
        .apply_script(b"<PFF0000><P00FF00><P0000FF><P000000>")
        .unwrap();
    // 2x2 tiles: column 0 top, column 0 bottom, column 1 top, column 1 bottom
    let script = format!(
        "<B02002002028{}{}{}{}>",
        tile(0),
        tile(1),
        tile(2),
        tile(3)
    );
    engine.apply_script(script.as_bytes()).unwrap();

    // 32x32 bitmap anchored at (32, 32): top-left at (16, 16)
    assert_eq!(engine.color_at(16, 16), Some(Color::new(255, 0, 0)));
    assert_eq!(engine.color_at(16, 32), Some(Color::new(0, 255, 0)));
    assert_eq!(engine.color_at(32, 16), Some(Color::new(0, 0, 255)));
    assert_eq!(engine.color_at(47, 47), Some(Color::new(0, 0, 0)));
}

#[test]
fn test_unknown_command_leaves_state_untouched() {
    let mut runner = runner();
    runner.source_mut().send("<P112233>");
    drain(&mut runner, 0);
    let before = runner.engine().stats();

    runner.source_mut().send("<Q>");
    let report = runner.poll(1).unwrap();
    assert_eq!(
        report.errors.as_slice(),
        &[LinkError::Parse(ParseError::UnknownCommand)]
    );
    assert_eq!(runner.engine().stats(), before);
    assert_eq!(runner.stats().parse_errors, 1);

    runner.source_mut().send("<P445566>");
    let applied = drain(&mut runner, 2);
    assert_eq!(applied, vec![Applied::PaletteAppended { index: 1 }]);
}

#[test]
fn test_clear_leaves_only_background() {
    let mut runner = runner();
    runner.source_mut().send("<Z>\n<P>\n<PFFFFFF>\n");
    runner
        .source_mut()
        .send(&format!("<B07807801018{}>\n", tile(0)));
    runner.source_mut().send("<A01B00078078V>\n<A01B00078078N>\n");
    drain(&mut runner, 0);
    assert_eq!(runner.engine().stats().nodes, 1);
    assert_eq!(runner.engine().stats().tracks, 2);

    runner.source_mut().send("<Z>");
    drain(&mut runner, 10);
    let engine = runner.engine();
    assert!(engine.scene().is_empty());
    assert!(engine.animations().is_empty());
    assert_eq!(engine.color_at(120, 120), None);
    assert!(runner.display().visible.is_empty());
    assert_eq!(engine.palette().len(), 1);
}

#[test]
fn test_two_track_animation_loops() {
    let mut runner = runner();
    runner.source_mut().send("<P>\n<PFFFFFF>\n");
    runner
        .source_mut()
        .send(&format!("<B07807801018{}>\n", tile(0)));
    // Track 0 holds one unit at (20, 20), track 1 two units at (40, 40)
    runner.source_mut().send("<A01B00014014V>\n<A02B00028028V>\n");
    drain(&mut runner, 0);

    let unit = runner.engine().config().time_unit_ns;
    let anchor = |runner: &Runner<Wire, Snapshot>| runner.display().visible.clone();

    // The clock started on the first poll above
    runner.poll(unit / 2).unwrap();
    assert_eq!(anchor(&runner), vec![(20, 20)]);
    runner.poll(unit).unwrap();
    assert_eq!(anchor(&runner), vec![(40, 40)]);
    runner.poll(3 * unit - 1).unwrap();
    assert_eq!(anchor(&runner), vec![(40, 40)]);
    runner.poll(3 * unit).unwrap();
    assert_eq!(anchor(&runner), vec![(20, 20)]);
    assert_eq!(runner.engine().active_track(), Some(0));
}

#[test]
fn test_hidden_by_keyframe() {
    let mut runner = runner();
    runner.source_mut().send("<P>\n<PFFFFFF>\n");
    runner
        .source_mut()
        .send(&format!("<B07807801018{}>\n", tile(0)));
    runner.source_mut().send("<A01B00078078V>\n<A01B00078078N>\n");
    drain(&mut runner, 0);

    let unit = runner.engine().config().time_unit_ns;
    runner.poll(unit).unwrap();
    assert!(runner.display().visible.is_empty());
    assert_eq!(runner.engine().color_at(120, 120), None);
}

#[test]
fn test_template_over_wire() {
    let mut engine = Engine::default();
    engine.apply_script(b"<P000000><PFF0000><P0000FF>").unwrap();
    // 20x20 at (120, 120): black background, disk r=10 red, bottom half blue
    engine
        .apply_script(b"<T07807801400D00A01S302>")
        .unwrap();

    assert_eq!(engine.scene().len(), 1);
    let node = engine.scene().iter().next().unwrap();
    assert_eq!(node.position(), (110, 110));
    assert_eq!(engine.color_at(110, 110), Some(Color::new(0, 0, 0)));
    assert_eq!(engine.color_at(120, 112), Some(Color::new(255, 0, 0)));
    assert_eq!(engine.color_at(120, 125), Some(Color::new(0, 0, 255)));
}

#[test]
fn test_template_with_unknown_color_rejected() {
    let mut runner = runner();
    runner.source_mut().send("<P>\n<P000000>\n<T07807801400D00A05>");
    drain(&mut runner, 0);
    assert!(runner.engine().scene().is_empty());
    assert_eq!(runner.stats().engine_errors, 1);
}

#[test]
fn test_long_bitmap_at_line_rate_is_accepted() {
    // 115200 baud with 8N1 framing delivers about 11 bytes per millisecond
    let mut config = DeviceConfig::default();
    config.link.max_frame_len = 16384;
    config.link.max_bytes_per_poll = 11;
    let mut runner = Runner::new(&config, Wire(VecDeque::new()), Snapshot::default());

    // 2 x 15 tiles: about 15 KB, well over one second on the wire
    let tiles: String = (0..30).map(|_| tile(0)).collect();
    let frame = format!("<B07807802 0F8{}>", tiles).replace(' ', "");
    assert!(frame.len() <= 16384);
    runner.source_mut().send(&frame);

    let mut applied = Vec::new();
    let mut ms = 0u64;
    while applied.is_empty() && ms < 5_000 {
        let report = runner.poll(ms * 1_000_000).unwrap();
        assert!(report.errors.is_empty(), "dropped at {} ms: {:?}", ms, report.errors);
        applied.extend(report.applied.iter().copied());
        ms += 1;
    }

    assert!(ms > config.link.frame_timeout_ms as u64);
    assert!(matches!(
        applied.as_slice(),
        [Applied::NodeAdded {
            width: 32,
            height: 240,
            ..
        }]
    ));
}
