//! CPU rasterizer for the crop workspace and the circular sprite export

use glam::Vec2;
use image::{Rgba, RgbaImage};

use super::transform::Transform;
use crate::consts::CROP_RADIUS_FRAC;

/// Workspace background, the page's dark navy.
pub const WORKSPACE_BG: Rgba<u8> = Rgba([11, 18, 32, 255]);

const DIM_ALPHA: f32 = 0.55;
const RING_ALPHA: f32 = 0.9;
const RING_WIDTH: f32 = 3.0;
const OUTLINE_ALPHA: f32 = 0.25;
const OUTLINE_WIDTH: f32 = 2.0;

/// Crop circle for a workspace: concentric, radius a fixed fraction of the
/// width. Never moves during a session; only the image moves beneath it.
pub fn crop_circle(workspace_size: u32) -> (Vec2, f32) {
    let size = workspace_size as f32;
    (Vec2::splat(size / 2.0), size * CROP_RADIUS_FRAC)
}

/// Render the editing workspace: background, the transformed source image,
/// a dim layer outside the crop circle, and the circle's white ring. With
/// no source image this still yields the workspace chrome, so the modal can
/// always blit something sensible.
pub fn render_workspace(
    image: Option<&RgbaImage>,
    transform: &Transform,
    workspace_size: u32,
) -> RgbaImage {
    let (center, radius) = crop_circle(workspace_size);
    let bg = premultiply(WORKSPACE_BG);
    let source = image.map(|img| (img, image_center(img)));

    RgbaImage::from_fn(workspace_size, workspace_size, |x, y| {
        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let mut color = bg;
        if let Some((img, source_center)) = source {
            let at = workspace_to_source(transform, source_center, p);
            color = over(sample_bilinear(img, at), color);
        }

        let dist = p.distance(center);
        let dim = DIM_ALPHA * (1.0 - disc_coverage(dist, radius));
        color = over([0.0, 0.0, 0.0, dim], color);
        let ring = RING_ALPHA * band_coverage(dist, radius, RING_WIDTH);
        color = over([ring, ring, ring, ring], color);

        to_rgba(color)
    })
}

/// Export the crop-circle contents as a square bitmap of the requested
/// diameter: resample the circle's bounding square out of the transformed
/// source, mask to the circle (everything outside fully transparent), then
/// stroke a faint outline just inside the rim.
///
/// Deterministic for a given source, transform, and output size, and
/// allocates a fresh buffer each call, so a low-res preview and a high-res
/// export can be taken back to back from the same state.
pub fn render_circular_crop(
    image: Option<&RgbaImage>,
    transform: &Transform,
    workspace_size: u32,
    out_size: u32,
) -> RgbaImage {
    let (center, radius) = crop_circle(workspace_size);
    let origin = center - Vec2::splat(radius);
    let step = radius * 2.0 / out_size as f32;
    let bg = premultiply(WORKSPACE_BG);
    let source = image.map(|img| (img, image_center(img)));

    let mut out = RgbaImage::from_fn(out_size, out_size, |x, y| {
        let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let mut color = bg;
        if let Some((img, source_center)) = source {
            let at = workspace_to_source(transform, source_center, origin + pixel * step);
            color = over(sample_bilinear(img, at), color);
        }
        to_rgba(color)
    });

    apply_circle_mask(&mut out);
    stroke_outline(&mut out);
    out
}

fn image_center(image: &RgbaImage) -> Vec2 {
    Vec2::new(image.width() as f32 / 2.0, image.height() as f32 / 2.0)
}

/// Workspace point to source-image point, inverting translate(offset) ->
/// rotate(rotation) -> scale(scale) with the image centred on its own
/// midpoint.
fn workspace_to_source(transform: &Transform, source_center: Vec2, point: Vec2) -> Vec2 {
    let local = (point - transform.offset()) / transform.scale();
    let (sin, cos) = (-transform.rotation()).sin_cos();
    source_center + Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
}

/// Bilinear sample with texel centres at (i + 0.5, j + 0.5), premultiplied.
/// Reads outside the image are transparent, so edges fade out instead of
/// smearing the border texels.
fn sample_bilinear(image: &RgbaImage, at: Vec2) -> [f32; 4] {
    let gx = at.x - 0.5;
    let gy = at.y - 0.5;
    let x0 = gx.floor() as i64;
    let y0 = gy.floor() as i64;
    let fx = gx - gx.floor();
    let fy = gy - gy.floor();

    let taps = [
        (x0, y0, (1.0 - fx) * (1.0 - fy)),
        (x0 + 1, y0, fx * (1.0 - fy)),
        (x0, y0 + 1, (1.0 - fx) * fy),
        (x0 + 1, y0 + 1, fx * fy),
    ];

    let mut acc = [0.0f32; 4];
    for (x, y, weight) in taps {
        if weight <= 0.0 {
            continue;
        }
        if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
            continue;
        }
        let texel = premultiply(*image.get_pixel(x as u32, y as u32));
        for (a, t) in acc.iter_mut().zip(texel) {
            *a += t * weight;
        }
    }
    acc
}

/// Multiply alpha by antialiased coverage of the circle inscribed in the
/// (square) image.
fn apply_circle_mask(image: &mut RgbaImage) {
    let size = image.width() as f32;
    let center = Vec2::splat(size / 2.0);
    let radius = size / 2.0;
    for (x, y, px) in image.enumerate_pixels_mut() {
        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let coverage = disc_coverage(p.distance(center), radius);
        px.0[3] = (px.0[3] as f32 * coverage).round() as u8;
    }
}

/// Faint dark ring one pixel inside the rim, composited over the masked
/// image (not clipped by it).
fn stroke_outline(image: &mut RgbaImage) {
    let size = image.width() as f32;
    let center = Vec2::splat(size / 2.0);
    let radius = size / 2.0 - 1.0;
    for (x, y, px) in image.enumerate_pixels_mut() {
        let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let alpha = OUTLINE_ALPHA * band_coverage(p.distance(center), radius, OUTLINE_WIDTH);
        if alpha > 0.0 {
            *px = to_rgba(over([0.0, 0.0, 0.0, alpha], premultiply(*px)));
        }
    }
}

/// Coverage of a pixel whose centre sits `dist` from the centre of a filled
/// disc, with a one-pixel antialiasing ramp across the edge.
fn disc_coverage(dist: f32, radius: f32) -> f32 {
    (radius - dist + 0.5).clamp(0.0, 1.0)
}

/// Coverage of a stroked circle of the given line width.
fn band_coverage(dist: f32, radius: f32, line_width: f32) -> f32 {
    (line_width / 2.0 - (dist - radius).abs() + 0.5).clamp(0.0, 1.0)
}

fn premultiply(px: Rgba<u8>) -> [f32; 4] {
    let a = px.0[3] as f32 / 255.0;
    [
        px.0[0] as f32 / 255.0 * a,
        px.0[1] as f32 / 255.0 * a,
        px.0[2] as f32 / 255.0 * a,
        a,
    ]
}

fn to_rgba(px: [f32; 4]) -> Rgba<u8> {
    let a = px[3];
    if a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let channel = |v: f32| (v / a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba([
        channel(px[0]),
        channel(px[1]),
        channel(px[2]),
        (a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Source-over in premultiplied space.
fn over(src: [f32; 4], dst: [f32; 4]) -> [f32; 4] {
    let keep = 1.0 - src[3];
    [
        src[0] + dst[0] * keep,
        src[1] + dst[1] * keep,
        src[2] + dst[2] * keep,
        src[3] + dst[3] * keep,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{MAX_ZOOM, MIN_ZOOM, WORKSPACE_SIZE};
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    fn transform() -> Transform {
        Transform::new(WORKSPACE_SIZE, MIN_ZOOM, MAX_ZOOM)
    }

    fn noise(w: u32, h: u32, seed: u64) -> RgbaImage {
        let mut rng = Pcg32::seed_from_u64(seed);
        RgbaImage::from_fn(w, h, |_, _| {
            Rgba([rng.random(), rng.random(), rng.random(), 255])
        })
    }

    /// Left half one color, right half another.
    fn split(w: u32, h: u32, left: [u8; 4], right: [u8; 4]) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, _| {
            if x < w / 2 { Rgba(left) } else { Rgba(right) }
        })
    }

    #[test]
    fn test_export_is_deterministic_and_calls_do_not_interfere() {
        let img = noise(400, 400, 7);
        let mut t = transform();
        t.set_scale(1.4);
        t.set_rotation_degrees(25.0);
        t.translate_by(Vec2::new(8.0, -3.0));

        let first = render_circular_crop(Some(&img), &t, WORKSPACE_SIZE, 130);
        let preview = render_circular_crop(Some(&img), &t, WORKSPACE_SIZE, 64);
        let second = render_circular_crop(Some(&img), &t, WORKSPACE_SIZE, 130);

        assert_eq!(preview.dimensions(), (64, 64));
        assert_eq!(first.as_raw(), second.as_raw());
    }

    #[test]
    fn test_export_resolution_independence_on_flat_regions() {
        let img = split(400, 400, [40, 80, 200, 255], [200, 40, 40, 255]);
        let mut t = transform();
        t.set_scale(1.0);

        let low = render_circular_crop(Some(&img), &t, WORKSPACE_SIZE, 64);
        let high = render_circular_crop(Some(&img), &t, WORKSPACE_SIZE, 128);

        // pixels well inside flat areas, away from the seam and the rim
        assert_eq!(*low.get_pixel(16, 32), Rgba([40, 80, 200, 255]));
        assert_eq!(*high.get_pixel(32, 64), Rgba([40, 80, 200, 255]));
        assert_eq!(*low.get_pixel(48, 32), Rgba([200, 40, 40, 255]));
        assert_eq!(*high.get_pixel(96, 64), Rgba([200, 40, 40, 255]));
    }

    #[test]
    fn test_render_without_source_gives_empty_chrome() {
        let t = transform();

        let ws = render_workspace(None, &t, WORKSPACE_SIZE);
        assert_eq!(ws.dimensions(), (300, 300));
        // inside the circle: plain background; outside: dimmed background
        assert_eq!(*ws.get_pixel(150, 150), WORKSPACE_BG);
        assert_eq!(*ws.get_pixel(0, 150), Rgba([5, 8, 14, 255]));

        let crop = render_circular_crop(None, &t, WORKSPACE_SIZE, 130);
        assert_eq!(*crop.get_pixel(65, 65), WORKSPACE_BG);
        assert_eq!(crop.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_workspace_follows_transform() {
        let img = split(400, 400, [10, 200, 10, 255], [10, 10, 200, 255]);
        let mut t = transform();
        t.set_scale(1.0);

        let ws = render_workspace(Some(&img), &t, WORKSPACE_SIZE);
        assert_eq!(*ws.get_pixel(75, 150), Rgba([10, 200, 10, 255]));

        // a half turn swaps which side faces the sampled pixel
        t.set_rotation_degrees(180.0);
        let ws = render_workspace(Some(&img), &t, WORKSPACE_SIZE);
        assert_eq!(*ws.get_pixel(75, 150), Rgba([10, 10, 200, 255]));

        // panning the image far away leaves bare background
        t.set_rotation_degrees(0.0);
        t.set_offset(Vec2::new(1000.0, 150.0));
        let ws = render_workspace(Some(&img), &t, WORKSPACE_SIZE);
        assert_eq!(*ws.get_pixel(75, 150), WORKSPACE_BG);
    }

    #[test]
    fn test_workspace_ring_sits_on_crop_circle() {
        let img = RgbaImage::from_pixel(400, 400, Rgba([255, 255, 255, 255]));
        let mut t = transform();
        t.set_scale(1.0);
        let ws = render_workspace(Some(&img), &t, WORKSPACE_SIZE);

        // white source inside the circle stays white
        assert_eq!(*ws.get_pixel(150, 150), Rgba([255, 255, 255, 255]));
        // outside it is dimmed
        assert_eq!(*ws.get_pixel(10, 150), Rgba([115, 115, 115, 255]));
        // just past the rim the ring covers the dimmed layer
        assert_eq!(*ws.get_pixel(44, 150), Rgba([241, 241, 241, 255]));
    }

    #[test]
    fn test_export_matches_direct_center_resample() {
        let img = noise(400, 400, 99);
        let mut t = transform();
        t.set_scale(1.0);

        let exported = render_circular_crop(Some(&img), &t, WORKSPACE_SIZE, 130);

        // the crop circle's bounding square (radius 105 around 150,150) maps
        // straight onto the 210x210 sub-square centred in the source
        let bg = premultiply(WORKSPACE_BG);
        let step = 210.0 / 130.0;
        let mut expected = RgbaImage::from_fn(130, 130, |x, y| {
            let at = Vec2::new(
                95.0 + (x as f32 + 0.5) * step,
                95.0 + (y as f32 + 0.5) * step,
            );
            to_rgba(over(sample_bilinear(&img, at), bg))
        });
        apply_circle_mask(&mut expected);
        stroke_outline(&mut expected);

        assert_eq!(exported.dimensions(), expected.dimensions());
        for (a, b) in exported.as_raw().iter().zip(expected.as_raw()) {
            assert!(a.abs_diff(*b) <= 1);
        }
    }

    #[test]
    fn test_mask_alpha_profile() {
        let img = noise(400, 400, 3);
        let t = transform();
        let crop = render_circular_crop(Some(&img), &t, WORKSPACE_SIZE, 130);

        assert_eq!(crop.get_pixel(65, 65).0[3], 255);
        assert_eq!(crop.get_pixel(0, 0).0[3], 0);
        assert_eq!(crop.get_pixel(129, 129).0[3], 0);
        // straight up from centre, just inside the rim, still opaque
        assert_eq!(crop.get_pixel(65, 3).0[3], 255);
    }
}
