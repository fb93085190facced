//! Pixel transfer between `image` buffers and canvas elements.

use image::RgbaImage;
use wasm_bindgen::{Clamped, JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlVideoElement, ImageData};

/// Fetch the 2D context of a canvas
pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
    canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("no 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(JsValue::from)
}

/// Blit an image to a context at the origin. This replaces pixels outright
/// (no alpha blending); composite CPU-side first when that matters.
pub fn paint(ctx: &CanvasRenderingContext2d, image: &RgbaImage) -> Result<(), JsValue> {
    let data = ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(image.as_raw().as_slice()),
        image.width(),
        image.height(),
    )?;
    ctx.put_image_data(&data, 0.0, 0.0)
}

/// Create a detached canvas holding the image. Sprites drawn through
/// `draw_image` respect clip paths, which raw `put_image_data` does not.
pub fn canvas_from_image(image: &RgbaImage) -> Result<HtmlCanvasElement, JsValue> {
    let canvas = new_canvas(&document()?, image.width(), image.height())?;
    paint(&context_2d(&canvas)?, image)?;
    Ok(canvas)
}

/// Grab the current frame of a playing video as an image. Falls back to
/// 640x480 when the stream has not reported its dimensions yet.
pub fn frame_from_video(video: &HtmlVideoElement) -> Result<RgbaImage, JsValue> {
    let w = match video.video_width() {
        0 => 640,
        w => w,
    };
    let h = match video.video_height() {
        0 => 480,
        h => h,
    };

    let canvas = new_canvas(&document()?, w, h)?;
    let ctx = context_2d(&canvas)?;
    ctx.draw_image_with_html_video_element_and_dw_and_dh(video, 0.0, 0.0, w as f64, h as f64)?;

    let data = ctx.get_image_data(0.0, 0.0, w as f64, h as f64)?;
    RgbaImage::from_raw(w, h, data.data().0)
        .ok_or_else(|| JsValue::from_str("frame buffer size mismatch"))
}

fn document() -> Result<Document, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn new_canvas(document: &Document, width: u32, height: u32) -> Result<HtmlCanvasElement, JsValue> {
    let canvas: HtmlCanvasElement = document.create_element("canvas")?.dyn_into()?;
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}
