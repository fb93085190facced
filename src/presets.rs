//! Pre-made cartoon faces
//!
//! Drawn with filled primitives instead of shipped image assets, so picking
//! one works offline and the thumbnails match the stored sprite exactly.
//! Sprites are stored square, like a confirmed crop export; the game clips
//! them to a circle at draw time.

use glam::Vec2;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::consts::FACE_RENDER_SCALE;

/// Thumbnail canvas size; the stored sprite is this times the render scale.
pub const THUMB_SIZE: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresetFace {
    Bird,
    Chicken,
    Fish,
    Dino,
}

impl PresetFace {
    pub const ALL: [PresetFace; 4] = [
        PresetFace::Bird,
        PresetFace::Chicken,
        PresetFace::Fish,
        PresetFace::Dino,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PresetFace::Bird => "Bird",
            PresetFace::Chicken => "Chicken",
            PresetFace::Fish => "Fish",
            PresetFace::Dino => "Dino",
        }
    }

    /// The 120x120 selection thumbnail, transparent outside the drawing.
    pub fn thumbnail(self) -> RgbaImage {
        let mut img = RgbaImage::new(THUMB_SIZE, THUMB_SIZE);
        match self {
            PresetFace::Bird => draw_bird(&mut img),
            PresetFace::Chicken => draw_chicken(&mut img),
            PresetFace::Fish => draw_fish(&mut img),
            PresetFace::Dino => draw_dino(&mut img),
        }
        img
    }

    /// The sprite that gets saved: the thumbnail upscaled with smoothing to
    /// the same resolution a confirmed crop export has.
    pub fn sprite(self) -> RgbaImage {
        let size = THUMB_SIZE * FACE_RENDER_SCALE;
        imageops::resize(&self.thumbnail(), size, size, FilterType::Triangle)
    }
}

fn draw_bird(img: &mut RgbaImage) {
    // yellow head
    fill_disc(img, Vec2::new(60.0, 60.0), 45.0, [0xff, 0xd5, 0x4a]);
    // eyes
    fill_disc(img, Vec2::new(45.0, 50.0), 8.0, [0, 0, 0]);
    fill_disc(img, Vec2::new(75.0, 50.0), 8.0, [0, 0, 0]);
    // beak
    fill_polygon(
        img,
        &[
            Vec2::new(85.0, 60.0),
            Vec2::new(105.0, 55.0),
            Vec2::new(105.0, 65.0),
        ],
        [0xff, 0x95, 0x00],
    );
}

fn draw_chicken(img: &mut RgbaImage) {
    fill_disc(img, Vec2::new(60.0, 65.0), 40.0, [0xcd, 0x7f, 0x32]);
    fill_disc(img, Vec2::new(50.0, 55.0), 7.0, [0, 0, 0]);
    fill_disc(img, Vec2::new(70.0, 55.0), 7.0, [0, 0, 0]);
    // comb
    fill_polygon(
        img,
        &[
            Vec2::new(50.0, 20.0),
            Vec2::new(55.0, 35.0),
            Vec2::new(65.0, 30.0),
            Vec2::new(70.0, 20.0),
        ],
        [0xff, 0x44, 0x44],
    );
    // beak
    fill_polygon(
        img,
        &[
            Vec2::new(75.0, 65.0),
            Vec2::new(95.0, 60.0),
            Vec2::new(95.0, 70.0),
        ],
        [0xff, 0xa5, 0x00],
    );
}

fn draw_fish(img: &mut RgbaImage) {
    fill_ellipse(img, Vec2::new(60.0, 65.0), Vec2::new(45.0, 30.0), [
        0x5b, 0xc0, 0xeb,
    ]);
    // tail
    fill_polygon(
        img,
        &[
            Vec2::new(15.0, 65.0),
            Vec2::new(0.0, 50.0),
            Vec2::new(0.0, 80.0),
        ],
        [0x2f, 0x8a, 0xb8],
    );
    fill_disc(img, Vec2::new(80.0, 60.0), 6.0, [0, 0, 0]);
}

fn draw_dino(img: &mut RgbaImage) {
    fill_disc(img, Vec2::new(60.0, 65.0), 40.0, [0x4c, 0xaf, 0x50]);
    // back spikes
    fill_polygon(
        img,
        &[
            Vec2::new(35.0, 20.0),
            Vec2::new(45.0, 40.0),
            Vec2::new(25.0, 40.0),
        ],
        [0x2e, 0x7d, 0x32],
    );
    fill_polygon(
        img,
        &[
            Vec2::new(55.0, 15.0),
            Vec2::new(65.0, 38.0),
            Vec2::new(45.0, 38.0),
        ],
        [0x2e, 0x7d, 0x32],
    );
    fill_disc(img, Vec2::new(70.0, 60.0), 6.0, [0, 0, 0]);
}

fn fill_disc(img: &mut RgbaImage, center: Vec2, radius: f32, color: [u8; 3]) {
    let r2 = radius * radius;
    fill_shape(
        img,
        center - Vec2::splat(radius),
        center + Vec2::splat(radius),
        color,
        |p| p.distance_squared(center) <= r2,
    );
}

fn fill_ellipse(img: &mut RgbaImage, center: Vec2, radii: Vec2, color: [u8; 3]) {
    fill_shape(img, center - radii, center + radii, color, |p| {
        let n = (p - center) / radii;
        n.length_squared() <= 1.0
    });
}

fn fill_polygon(img: &mut RgbaImage, vertices: &[Vec2], color: [u8; 3]) {
    let min = vertices.iter().copied().reduce(Vec2::min).unwrap_or(Vec2::ZERO);
    let max = vertices.iter().copied().reduce(Vec2::max).unwrap_or(Vec2::ZERO);
    fill_shape(img, min, max, color, |p| point_in_polygon(p, vertices));
}

/// Rasterize one shape over the pixels its bounding box touches, with a
/// 4x4 supersample per pixel for smooth edges.
fn fill_shape(
    img: &mut RgbaImage,
    min: Vec2,
    max: Vec2,
    color: [u8; 3],
    inside: impl Fn(Vec2) -> bool,
) {
    let x0 = (min.x.floor().max(0.0)) as u32;
    let y0 = (min.y.floor().max(0.0)) as u32;
    let x1 = (max.x.ceil() as u32 + 1).min(img.width());
    let y1 = (max.y.ceil() as u32 + 1).min(img.height());

    for y in y0..y1 {
        for x in x0..x1 {
            let mut hits = 0u32;
            for sy in 0..4 {
                for sx in 0..4 {
                    let p = Vec2::new(
                        x as f32 + (sx as f32 + 0.5) / 4.0,
                        y as f32 + (sy as f32 + 0.5) / 4.0,
                    );
                    if inside(p) {
                        hits += 1;
                    }
                }
            }
            if hits > 0 {
                blend(img.get_pixel_mut(x, y), color, hits as f32 / 16.0);
            }
        }
    }
}

/// Even-odd ray cast; sample points never sit exactly on an edge because
/// the supersample offsets are fractional and the vertices are integral.
fn point_in_polygon(p: Vec2, vertices: &[Vec2]) -> bool {
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (a, b) = (vertices[i], vertices[j]);
        if (a.y > p.y) != (b.y > p.y) {
            let cross_x = a.x + (p.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if p.x < cross_x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Source-over an opaque color at the given coverage.
fn blend(px: &mut Rgba<u8>, color: [u8; 3], alpha: f32) {
    let dst_a = px.0[3] as f32 / 255.0;
    let out_a = alpha + dst_a * (1.0 - alpha);
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let src = color[c] as f32 / 255.0;
        let dst = px.0[c] as f32 / 255.0;
        let out = (src * alpha + dst * dst_a * (1.0 - alpha)) / out_a;
        px.0[c] = (out * 255.0).round() as u8;
    }
    px.0[3] = (out_a * 255.0).round() as u8;
}
