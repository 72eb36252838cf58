//! Batching and vertex layout of the drawing operations.

use std::f64::consts::FRAC_PI_2;

use rstest::rstest;

use dxportlib::config::{BackendKind, Options};
use dxportlib::graphics::backend::{FramebufferTarget, Primitive};
use dxportlib::graphics::blend::{
    DX_BLENDMODE_ADD, DX_BLENDMODE_ALPHA, DX_BLENDMODE_NOBLEND, DX_BLENDMODE_PMA_ADD_X4,
};
use dxportlib::graphics::{BackendCall, CallLog, Graphics, GraphId, RecordingBackend};

// Position2Tex2Color: x, y, u, v as f32 then the packed colour.
const X: usize = 0;
const Y: usize = 1;
const U: usize = 2;
const V: usize = 3;

fn setup() -> (Graphics, CallLog) {
    let backend = RecordingBackend::new();
    let log = backend.log();
    let options = Options {
        backend: BackendKind::Recording,
        ..Options::default()
    };
    let gfx = Graphics::new(options, Box::new(backend)).unwrap();
    log.clear();
    (gfx, log)
}

fn graph_32x16(gfx: &mut Graphics) -> GraphId {
    gfx.make_graph(32, 16, true).unwrap()
}

fn assert_near(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-3,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[test]
fn test_boxes_share_one_draw() {
    let (mut gfx, log) = setup();
    gfx.draw_box(0.0, 0.0, 10.0, 10.0, 0xff0000, true).unwrap();
    gfx.draw_box(20.0, 20.0, 30.0, 30.0, 0x00ff00, true).unwrap();
    assert!(log.draws().is_empty());

    gfx.flush_cache().unwrap();
    let draws = log.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].primitive, Primitive::Triangles);
    assert_eq!(draws[0].count, 12);
}

#[test]
fn test_texture_change_splits_batches() {
    let (mut gfx, log) = setup();
    let graph = graph_32x16(&mut gfx);
    log.clear();

    gfx.draw_box(0.0, 0.0, 10.0, 10.0, 0xffffff, true).unwrap();
    gfx.draw_box(10.0, 0.0, 20.0, 10.0, 0xffffff, true).unwrap();
    gfx.draw_graph(0.0, 0.0, graph, true).unwrap();
    gfx.flush_cache().unwrap();

    let draws = log.draws();
    assert_eq!(draws.len(), 2);
    assert_eq!(draws[0].count, 12);
    assert_eq!(draws[1].count, 6);
    assert_eq!(draws[1].stride, 20);
}

#[test]
fn test_interleaving_flushes_every_switch() {
    let (mut gfx, log) = setup();
    let graph = graph_32x16(&mut gfx);
    log.clear();

    gfx.draw_box(0.0, 0.0, 10.0, 10.0, 0xffffff, true).unwrap();
    gfx.draw_graph(0.0, 0.0, graph, true).unwrap();
    gfx.draw_box(0.0, 0.0, 10.0, 10.0, 0xffffff, true).unwrap();
    gfx.flush_cache().unwrap();
    assert_eq!(log.draws().len(), 3);
}

#[test]
fn test_thin_lines_batch_as_line_list() {
    let (mut gfx, log) = setup();
    gfx.draw_line(0.0, 0.0, 10.0, 0.0, 0xffffff, 1).unwrap();
    gfx.draw_line(0.0, 5.0, 10.0, 5.0, 0xffffff, 1).unwrap();
    gfx.flush_cache().unwrap();

    let draws = log.draws();
    assert_eq!(draws.len(), 1);
    assert_eq!(draws[0].primitive, Primitive::Lines);
    assert_eq!(draws[0].count, 4);
    // Half-pixel offset onto pixel centres.
    assert_near(draws[0].float(0, X), 0.5);
    assert_near(draws[0].float(3, Y), 5.5);
}

#[test]
fn test_unknown_blend_mode_resolves_to_noblend() {
    let (mut gfx, log) = setup();
    gfx.set_draw_blend_mode(99, 128).unwrap();
    gfx.draw_box(0.0, 0.0, 4.0, 4.0, 0xffffff, true).unwrap();
    gfx.flush_cache().unwrap();

    assert_eq!(gfx.draw_state().last_blend_mode(), Some(DX_BLENDMODE_NOBLEND));
    assert_eq!(log.draws().len(), 1);
}

#[rstest]
#[case(DX_BLENDMODE_ALPHA)]
#[case(DX_BLENDMODE_ADD)]
#[case(DX_BLENDMODE_PMA_ADD_X4)]
fn test_known_blend_modes_survive_flush(#[case] mode: i32) {
    let (mut gfx, _log) = setup();
    gfx.set_draw_blend_mode(mode, 200).unwrap();
    gfx.draw_pixel(1.0, 1.0, 0xffffff).unwrap();
    gfx.flush_cache().unwrap();
    assert_eq!(gfx.draw_state().last_blend_mode(), Some(mode));
}

#[test]
fn test_alpha_texture_forces_alpha_blending() {
    let (mut gfx, _log) = setup();
    let graph = graph_32x16(&mut gfx);
    gfx.set_draw_blend_mode(DX_BLENDMODE_NOBLEND, 255).unwrap();
    gfx.draw_graph(0.0, 0.0, graph, true).unwrap();
    gfx.flush_cache().unwrap();
    assert_eq!(gfx.draw_state().last_blend_mode(), Some(DX_BLENDMODE_ALPHA));

    gfx.draw_graph(0.0, 0.0, graph, false).unwrap();
    gfx.flush_cache().unwrap();
    assert_eq!(gfx.draw_state().last_blend_mode(), Some(DX_BLENDMODE_NOBLEND));
}

#[test]
fn test_draw_graph_vertices() {
    let (mut gfx, log) = setup();
    let graph = graph_32x16(&mut gfx);
    gfx.draw_graph(10.0, 20.0, graph, true).unwrap();
    gfx.flush_cache().unwrap();

    let draw = &log.draws()[0];
    // Two triangles: tl, tr, bl, bl, tr, br.
    assert_near(draw.float(0, X), 10.0);
    assert_near(draw.float(0, Y), 20.0);
    assert_near(draw.float(5, X), 42.0);
    assert_near(draw.float(5, Y), 36.0);
    assert_near(draw.float(5, U), 1.0);
    assert_near(draw.float(5, V), 1.0);
}

#[test]
fn test_rect_graph_clips_then_mirrors() {
    let (mut gfx, log) = setup();
    let graph = graph_32x16(&mut gfx);

    // 16 texels wide starting at 24 only has 8 texels to show.
    gfx.draw_rect_graph(100.0, 50.0, 24, 0, 16, 16, graph, true, false)
        .unwrap();
    gfx.draw_rect_graph(100.0, 50.0, 24, 0, 16, 16, graph, true, true)
        .unwrap();
    gfx.flush_cache().unwrap();

    let draw = &log.draws()[0];
    assert_eq!(draw.count, 12);

    assert_near(draw.float(0, X), 100.0);
    assert_near(draw.float(1, X), 108.0);
    assert_near(draw.float(0, U), 0.75);
    assert_near(draw.float(1, U), 1.0);
    assert_near(draw.float(2, Y), 66.0);

    // Mirrored copy is anchored at the far edge of the requested width.
    assert_near(draw.float(6, X), 116.0);
    assert_near(draw.float(7, X), 108.0);
    assert_near(draw.float(6, U), 0.75);
}

#[test]
fn test_rect_graph_fully_outside_draws_nothing() {
    let (mut gfx, log) = setup();
    let graph = graph_32x16(&mut gfx);
    gfx.draw_rect_graph(0.0, 0.0, 40, 0, 8, 8, graph, true, false)
        .unwrap();
    gfx.flush_cache().unwrap();
    assert!(log.draws().is_empty());
}

#[test]
fn test_rota_graph_vertices() {
    let (mut gfx, log) = setup();
    let graph = graph_32x16(&mut gfx);

    gfx.draw_rota_graph(100.0, 100.0, 1.0, 0.0, graph, true, false)
        .unwrap();
    gfx.draw_rota_graph(100.0, 100.0, 1.0, FRAC_PI_2, graph, true, false)
        .unwrap();
    gfx.draw_rota_graph(100.0, 100.0, 2.0, 0.0, graph, true, true)
        .unwrap();
    gfx.flush_cache().unwrap();

    let draw = &log.draws()[0];
    assert_eq!(draw.count, 18);

    // Unrotated: centred on (100, 100).
    assert_near(draw.float(0, X), 84.0);
    assert_near(draw.float(0, Y), 92.0);
    assert_near(draw.float(5, X), 116.0);
    assert_near(draw.float(5, Y), 108.0);

    // Quarter turn: the top-left corner swings to the top-right.
    assert_near(draw.float(6, X), 108.0);
    assert_near(draw.float(6, Y), 84.0);
    assert_near(draw.float(11, X), 92.0);
    assert_near(draw.float(11, Y), 116.0);

    // Doubled and mirrored.
    assert_near(draw.float(12, X), 68.0);
    assert_near(draw.float(12, Y), 84.0);
    assert_near(draw.float(12, U), 1.0);
    assert_near(draw.float(17, U), 0.0);
}

#[test]
fn test_rota_graph2_pivot_lands_on_point() {
    let (mut gfx, log) = setup();
    let graph = graph_32x16(&mut gfx);

    gfx.draw_rota_graph2(50.0, 50.0, 0.0, 0.0, 1.0, 0.0, graph, true, false)
        .unwrap();
    gfx.flush_cache().unwrap();

    let draw = &log.draws()[0];
    assert_near(draw.float(0, X), 50.0);
    assert_near(draw.float(0, Y), 50.0);
    assert_near(draw.float(5, X), 82.0);
    assert_near(draw.float(5, Y), 66.0);
}

#[test]
fn test_drawing_into_screen_graph_binds_its_framebuffer() {
    let (mut gfx, log) = setup();
    let screen = gfx.make_screen(64, 64, false).unwrap();
    let texture = gfx.graph_texture_info(screen).unwrap().texture;

    gfx.set_draw_screen(Some(screen)).unwrap();
    assert_eq!(gfx.get_draw_screen(), Some(screen));
    assert_eq!(gfx.get_draw_screen_size(), (64, 64));
    log.clear();

    gfx.draw_box(0.0, 0.0, 8.0, 8.0, 0xffffff, true).unwrap();
    gfx.set_draw_screen(None).unwrap();
    assert_eq!(log.draws().len(), 1);

    // The box was drawn before the switch back to the window.
    let calls = log.calls();
    let draw_at = calls
        .iter()
        .position(|c| matches!(c, BackendCall::DrawVertexArray(_)))
        .unwrap();
    let rebind_at = calls
        .iter()
        .position(|c| matches!(c, BackendCall::BindFramebuffer(Some(FramebufferTarget { .. }))))
        .unwrap();
    assert!(draw_at < rebind_at);

    gfx.draw_graph(0.0, 0.0, screen, false).unwrap();
    gfx.flush_cache().unwrap();
    assert_eq!(gfx.graph_texture_info(screen).unwrap().texture, texture);
    assert_eq!(gfx.get_draw_screen(), None);
}

#[test]
fn test_deleting_batched_graph_flushes_first() {
    let (mut gfx, log) = setup();
    let graph = graph_32x16(&mut gfx);
    log.clear();

    gfx.draw_graph(0.0, 0.0, graph, true).unwrap();
    gfx.delete_graph(graph).unwrap();

    let calls = log.calls();
    let draw_at = calls
        .iter()
        .position(|c| matches!(c, BackendCall::DrawVertexArray(_)))
        .unwrap();
    let delete_at = calls
        .iter()
        .position(|c| matches!(c, BackendCall::DeleteTexture(_)))
        .unwrap();
    assert!(draw_at < delete_at);
}
