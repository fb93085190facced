//! Canvas 2D painting of the play field.

use std::f64::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::consts::*;
use crate::sim::{GamePhase, GameSession, Rect};

const PIPE_GREEN_TOP: &str = "#4db24a";
const PIPE_GREEN_BOTTOM: &str = "#2f8b3a";
const PIPE_RIM: &str = "#173d1f";
const HUD_INK: &str = "#0b1220";

/// A drifting background cloud
struct Cloud {
    pos: Vec2,
    radius: f32,
    speed: f32,
    alpha: f32,
}

impl Cloud {
    fn new(rng: &mut Pcg32, x: f32) -> Self {
        Self {
            pos: Vec2::new(x, rng.random_range(60.0..ARENA_H - 240.0)),
            radius: rng.random_range(22.0..46.0),
            speed: rng.random_range(0.15..0.4),
            alpha: rng.random_range(0.15..0.3),
        }
    }
}

/// Decorative cloud layer. Purely visual: it scrolls on its own clock and
/// keeps moving through pauses and the game-over screen.
pub struct CloudField {
    clouds: Vec<Cloud>,
    rng: Pcg32,
}

impl CloudField {
    const COUNT: usize = 6;

    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let mut clouds = Vec::with_capacity(Self::COUNT);
        for _ in 0..Self::COUNT {
            let x = rng.random_range(0.0..ARENA_W);
            clouds.push(Cloud::new(&mut rng, x));
        }
        Self { clouds, rng }
    }

    /// Drift left; clouds that scroll fully off-screen re-enter on the right
    /// with fresh shape, speed and opacity.
    pub fn update(&mut self, dt_scale: f32) {
        for cloud in &mut self.clouds {
            cloud.pos.x -= cloud.speed * dt_scale;
            if cloud.pos.x + cloud.radius * 2.0 < -40.0 {
                let x = ARENA_W + self.rng.random_range(30.0..120.0);
                *cloud = Cloud::new(&mut self.rng, x);
            }
        }
    }

    fn draw(&self, ctx: &CanvasRenderingContext2d) {
        ctx.save();
        ctx.set_fill_style_str("#ffffff");
        for cloud in &self.clouds {
            let (x, y) = (cloud.pos.x as f64, cloud.pos.y as f64);
            let r = cloud.radius as f64;
            ctx.set_global_alpha(cloud.alpha as f64);
            ctx.begin_path();
            ctx.arc(x, y, r, 0.0, TAU).ok();
            ctx.arc(x + r * 0.9, y + r * 0.1, r * 0.75, 0.0, TAU).ok();
            ctx.arc(x - r * 0.9, y + r * 0.15, r * 0.7, 0.0, TAU).ok();
            ctx.fill();
        }
        ctx.restore();
    }
}

/// Paint one complete frame: clouds, obstacles, bird, score HUD and the
/// phase overlay banner.
pub fn draw_frame(
    ctx: &CanvasRenderingContext2d,
    session: &GameSession,
    clouds: &CloudField,
    face: Option<&HtmlCanvasElement>,
) {
    ctx.clear_rect(0.0, 0.0, ARENA_W as f64, ARENA_H as f64);

    clouds.draw(ctx);

    for obstacle in &session.obstacles {
        draw_pipe(ctx, &obstacle.top_rect(&session.tuning), true);
        draw_pipe(ctx, &obstacle.bottom_rect(&session.tuning), false);
    }

    draw_bird(ctx, session.bird.center(), face);

    ctx.set_fill_style_str(HUD_INK);
    ctx.set_font(&pixel_font(20));
    ctx.fill_text(&session.score.to_string(), 18.0, 40.0).ok();
    ctx.set_font(&pixel_font(12));
    ctx.fill_text(&format!("best: {}", session.best), 18.0, 62.0)
        .ok();

    if face.is_none() {
        draw_message(ctx, &["Upload your face to start"]);
        return;
    }

    if session.paused {
        draw_message(ctx, &["Paused", "Click/Tap/Space to Resume"]);
        return;
    }

    match session.phase {
        GamePhase::Start => draw_message(ctx, &["Tap/Click/Space", "to Start"]),
        GamePhase::GameOver => draw_message(ctx, &["Game Over", "Tap to Restart"]),
        GamePhase::Playing => {}
    }
}

/// Trace a rectangle with rounded corners as the current path
fn round_rect(ctx: &CanvasRenderingContext2d, x: f64, y: f64, w: f64, h: f64, r: f64) {
    let radius = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + radius, y);
    ctx.arc_to(x + w, y, x + w, y + h, radius).ok();
    ctx.arc_to(x + w, y + h, x, y + h, radius).ok();
    ctx.arc_to(x, y + h, x, y, radius).ok();
    ctx.arc_to(x, y, x + w, y, radius).ok();
    ctx.close_path();
}

/// Draw one obstacle column. `flip_y` mirrors the art vertically so the
/// same drawing serves the hanging and standing columns.
fn draw_pipe(ctx: &CanvasRenderingContext2d, rect: &Rect, flip_y: bool) {
    if rect.h <= 0.0 {
        return;
    }
    let (x, y) = (rect.x as f64, rect.y as f64);
    let (w, h) = (rect.w as f64, rect.h as f64);

    ctx.save();
    if flip_y {
        let (cx, cy) = (x + w / 2.0, y + h / 2.0);
        ctx.translate(cx, cy).ok();
        ctx.scale(1.0, -1.0).ok();
        ctx.translate(-cx, -cy).ok();
    }

    let corner = (w * 0.25).min(18.0);

    let grad = ctx.create_linear_gradient(x, y, x, y + h);
    grad.add_color_stop(0.0, PIPE_GREEN_TOP).ok();
    grad.add_color_stop(1.0, PIPE_GREEN_BOTTOM).ok();
    ctx.set_fill_style_canvas_gradient(&grad);
    round_rect(ctx, x, y, w, h, corner);
    ctx.fill();

    // Dark rim band on the gap-facing edge (the flip mirrors it in place)
    let rim_h = (h * 0.12).clamp(12.0, 28.0);
    ctx.set_fill_style_str(PIPE_RIM);
    round_rect(ctx, x + w * 0.05, y, w * 0.9, rim_h, corner * 0.6);
    ctx.fill();

    // Soft inner shadow near the outer edge
    ctx.set_global_alpha(0.12);
    ctx.set_fill_style_str("#000");
    round_rect(ctx, x + w * 0.02, y + h * 0.02, w * 0.96, h * 0.16, corner * 0.5);
    ctx.fill();
    ctx.set_global_alpha(1.0);

    ctx.set_stroke_style_str("rgba(0,0,0,0.12)");
    ctx.set_line_width((w * 0.03).floor().max(1.0));
    round_rect(ctx, x, y, w, h, corner);
    ctx.stroke();

    ctx.restore();
}

/// The face sprite clipped to a circle, or a plain disc before one is set
fn draw_bird(ctx: &CanvasRenderingContext2d, center: Vec2, face: Option<&HtmlCanvasElement>) {
    let (x, y) = (center.x as f64, center.y as f64);
    let r = BIRD_RADIUS as f64;
    let d = r * 2.0;

    if let Some(face) = face {
        ctx.save();
        ctx.begin_path();
        ctx.arc(x, y, r, 0.0, TAU).ok();
        ctx.clip();
        ctx.draw_image_with_html_canvas_element_and_dw_and_dh(face, x - r, y - r, d, d)
            .ok();
        ctx.restore();
        return;
    }

    ctx.begin_path();
    ctx.set_fill_style_str("#ffd54a");
    ctx.arc(x, y, r, 0.0, TAU).ok();
    ctx.fill();
}

/// Banner text over a dimmed band across the middle of the arena. The font
/// shrinks until the longest line fits, down to a floor of 8px.
fn draw_message(ctx: &CanvasRenderingContext2d, lines: &[&str]) {
    let box_h = 88.0;
    ctx.set_fill_style_str("rgba(0,0,0,0.35)");
    ctx.fill_rect(
        0.0,
        ARENA_H as f64 / 2.0 - box_h / 2.0,
        ARENA_W as f64,
        box_h,
    );

    let max_width = ARENA_W as f64 - 24.0;
    let mut size = 12;
    ctx.set_font(&pixel_font(size));
    while size > 8 && widest_line(ctx, lines) > max_width {
        size -= 1;
        ctx.set_font(&pixel_font(size));
    }

    ctx.set_fill_style_str("#ffffff");
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");

    let line_gap = (size + 6) as f64;
    let start_y = ARENA_H as f64 / 2.0 - line_gap * (lines.len() as f64 - 1.0) / 2.0;
    for (i, line) in lines.iter().enumerate() {
        ctx.fill_text(line, ARENA_W as f64 / 2.0, start_y + i as f64 * line_gap)
            .ok();
    }

    ctx.set_text_align("start");
    ctx.set_text_baseline("alphabetic");
}

fn pixel_font(px: u32) -> String {
    format!("{px}px \"Press Start 2P\", system-ui, sans-serif")
}

fn widest_line(ctx: &CanvasRenderingContext2d, lines: &[&str]) -> f64 {
    lines
        .iter()
        .filter_map(|line| ctx.measure_text(line).ok())
        .map(|metrics| metrics.width())
        .fold(0.0, f64::max)
}
