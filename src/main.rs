//! Flappy Face entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use image::RgbaImage;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, File, HtmlCanvasElement, HtmlElement,
        HtmlInputElement, HtmlVideoElement, KeyboardEvent, MediaStream, MediaStreamConstraints,
        MediaStreamTrack, MouseEvent, TouchEvent, TouchList,
    };

    use flappy_face::audio::{AudioManager, SoundEffect};
    use flappy_face::consts::*;
    use flappy_face::crop::{CropSession, ViewMetrics};
    use flappy_face::face;
    use flappy_face::presets::PresetFace;
    use flappy_face::render::{CloudField, bitmap, draw_frame};
    use flappy_face::scores::BestScore;
    use flappy_face::sim::{GameEvent, GamePhase, GameSession, TickInput, dt_scale, tick};
    use flappy_face::store::LocalStore;
    use flappy_face::{Settings, Tuning};

    /// Side length of the live crop preview canvas
    const PREVIEW_SIZE: u32 = 120;

    /// (face, select button id, thumbnail canvas id) for the picker modal
    const PRESET_CONTROLS: [(PresetFace, &str, &str); 4] = [
        (PresetFace::Bird, "selectBirdFace", "birdFaceCanvas"),
        (PresetFace::Chicken, "selectChickenFace", "chickenFaceCanvas"),
        (PresetFace::Fish, "selectFishFace", "fishFaceCanvas"),
        (PresetFace::Dino, "selectDinoFace", "dinoFaceCanvas"),
    ];

    struct Game {
        session: GameSession,         // pure simulation state
        input: TickInput,             // one-shot inputs collected between frames
        last_time: f64,               // previous RAF timestamp
        store: LocalStore,            // localStorage facade
        settings: Settings,           // persisted toggles
        best: BestScore,              // persisted best score mirror
        audio: AudioManager,          // oscillator-based sound effects
        crop: CropSession,            // face editor state
        face_sprite: Option<HtmlCanvasElement>, // rasterized face, ready to draw
        clouds: CloudField,           // background decoration
        camera: Option<MediaStream>,  // live camera, when open
        ctx: CanvasRenderingContext2d,
        crop_canvas: HtmlCanvasElement,
        crop_ctx: CanvasRenderingContext2d,
        preview_ctx: CanvasRenderingContext2d,
    }

    impl Game {
        fn new(
            ctx: CanvasRenderingContext2d,
            crop_canvas: HtmlCanvasElement,
            crop_ctx: CanvasRenderingContext2d,
            preview_ctx: CanvasRenderingContext2d,
        ) -> Self {
            let mut store = LocalStore::new();
            let settings = Settings::load(&store);
            let best = BestScore::load(&store);
            let audio = AudioManager::new(settings.sound_enabled);

            let now = js_sys::Date::now();
            let seed = now as u64;
            let session = GameSession::new(seed, best.0, Tuning::default());

            // A face stored by a recent visit comes back automatically
            let face_sprite = face::load(&mut store, now)
                .and_then(|image| bitmap::canvas_from_image(&image).ok());

            Self {
                session,
                input: TickInput::default(),
                last_time: 0.0,
                store,
                settings,
                best,
                audio,
                crop: CropSession::new(),
                face_sprite,
                clouds: CloudField::new(seed.wrapping_add(1)),
                camera: None,
                ctx,
                crop_canvas,
                crop_ctx,
                preview_ctx,
            }
        }

        /// Advance simulation and decorations by one frame
        fn frame(&mut self, time: f64) -> Vec<GameEvent> {
            let elapsed = if self.last_time > 0.0 {
                time - self.last_time
            } else {
                REFERENCE_FRAME_MS
            };
            self.last_time = time;

            let scale = dt_scale(elapsed);
            // Clouds keep drifting even while paused or between rounds
            self.clouds.update(scale);

            let mut input = std::mem::take(&mut self.input);
            input.face_available = self.face_sprite.is_some();
            tick(&mut self.session, &input, time, scale)
        }

        /// Map frame events onto sounds, persistence and DOM updates
        fn handle_events(&mut self, document: &Document, events: &[GameEvent]) {
            for event in events {
                match event {
                    GameEvent::FacePickerRequested => open_face_select_modal(document),
                    GameEvent::Flapped => self.audio.play(SoundEffect::Flap),
                    GameEvent::Scored(_) => self.audio.play(SoundEffect::Score),
                    GameEvent::NewBest(best) => {
                        self.best.update(*best, &mut self.store);
                    }
                    GameEvent::GameOver => {
                        self.audio.play(SoundEffect::GameOver);
                        // A crash clears any pause, so the button needs a refresh
                        update_pause_button(document, self.session.paused);
                    }
                    GameEvent::Paused | GameEvent::Resumed => {
                        update_pause_button(document, self.session.paused);
                    }
                }
            }
        }

        fn render(&self) {
            draw_frame(&self.ctx, &self.session, &self.clouds, self.face_sprite.as_ref());
        }

        /// Register activity and queue a flap for the next frame
        fn primary_action(&mut self) {
            face::touch(&mut self.store, js_sys::Date::now());
            if self.face_sprite.is_some() {
                // Autoplay policies want the context created inside a gesture
                self.audio.ensure();
            }
            self.input.flap = true;
        }

        /// Repaint the crop workspace and the live preview
        fn redraw_cropper(&self) {
            let workspace = self.crop.render_workspace();
            if let Err(err) = bitmap::paint(&self.crop_ctx, &workspace) {
                log::warn!("Workspace blit failed: {err:?}");
            }

            let size = PREVIEW_SIZE as f64;
            self.preview_ctx.clear_rect(0.0, 0.0, size, size);
            self.preview_ctx.set_fill_style_str("rgba(0,0,0,0.25)");
            self.preview_ctx.fill_rect(0.0, 0.0, size, size);
            if self.crop.has_image() {
                let crop = self.crop.render_crop(PREVIEW_SIZE);
                if let Ok(sprite) = bitmap::canvas_from_image(&crop) {
                    self.preview_ctx
                        .draw_image_with_html_canvas_element(&sprite, 0.0, 0.0)
                        .ok();
                }
            }
        }

        /// Push the transform state back into the slider elements
        fn sync_crop_controls(&self, document: &Document) {
            if let Some(slider) = input_element(document, "zoom") {
                slider.set_value(&self.crop.transform.scale().to_string());
            }
            if let Some(slider) = input_element(document, "rotate") {
                slider.set_value(&self.crop.transform.rotation_degrees().to_string());
            }
        }

        /// Map client coordinates onto the workspace raster
        fn view_metrics(&self) -> ViewMetrics {
            let rect = self.crop_canvas.get_bounding_client_rect();
            ViewMetrics::new(
                Vec2::new(rect.left() as f32, rect.top() as f32),
                Vec2::new(rect.width() as f32, rect.height() as f32),
                self.crop.workspace_size() as f32,
            )
        }

        /// Export the current crop at sprite resolution and adopt it
        fn confirm_crop(&mut self) -> bool {
            let out_size = (BIRD_RADIUS * 2.0) as u32 * FACE_RENDER_SCALE;
            let sprite = self.crop.render_crop(out_size);
            self.adopt_sprite(&sprite)
        }

        /// Persist a sprite and make it the live bird face. Returns true
        /// when a delayed round start should be scheduled.
        fn adopt_sprite(&mut self, sprite: &RgbaImage) -> bool {
            if let Err(err) = face::save(&mut self.store, sprite, js_sys::Date::now()) {
                log::warn!("Could not store face sprite: {err}");
            }
            self.face_sprite = bitmap::canvas_from_image(sprite).ok();
            self.session.phase == GamePhase::Start
        }

        /// Release all camera tracks and hide the viewfinder
        fn stop_camera(&mut self, document: &Document) {
            let Some(stream) = self.camera.take() else { return };
            for track in stream.get_tracks().iter() {
                if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                    track.stop();
                }
            }
            if let Some(video) = video_element(document, "cameraVideo") {
                video.set_src_object(None);
            }
            if let Some(camera_box) = html_element(document, "cameraBox") {
                camera_box.set_hidden(true);
            }
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Flappy Face starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("game")
            .expect("no game canvas")
            .dyn_into()
            .expect("not a canvas");
        canvas.set_width(ARENA_W as u32);
        canvas.set_height(ARENA_H as u32);
        let ctx = bitmap::context_2d(&canvas).expect("no 2d context");

        let crop_canvas: HtmlCanvasElement = document
            .get_element_by_id("cropCanvas")
            .expect("no crop canvas")
            .dyn_into()
            .expect("not a canvas");
        crop_canvas.set_width(WORKSPACE_SIZE);
        crop_canvas.set_height(WORKSPACE_SIZE);
        let crop_ctx = bitmap::context_2d(&crop_canvas).expect("no crop 2d context");

        let preview_canvas: HtmlCanvasElement = document
            .get_element_by_id("previewCanvas")
            .expect("no preview canvas")
            .dyn_into()
            .expect("not a canvas");
        preview_canvas.set_width(PREVIEW_SIZE);
        preview_canvas.set_height(PREVIEW_SIZE);
        let preview_ctx = bitmap::context_2d(&preview_canvas).expect("no preview 2d context");

        let game = Rc::new(RefCell::new(Game::new(
            ctx,
            crop_canvas.clone(),
            crop_ctx,
            preview_ctx,
        )));

        {
            let g = game.borrow();
            log::info!("Game initialized with seed: {}", g.session.seed);
            update_sound_button(&document, g.settings.sound_enabled);
            update_pause_button(&document, g.session.paused);
            g.redraw_cropper();
            g.sync_crop_controls(&document);
        }

        setup_game_input(&canvas, game.clone());
        setup_control_buttons(game.clone());
        setup_crop_pointers(&crop_canvas, game.clone());
        setup_crop_controls(game.clone());
        setup_crop_confirm(game.clone());
        setup_file_inputs(game.clone());
        setup_face_select(game.clone());
        setup_camera(game.clone());
        setup_face_sweep(game.clone());

        request_animation_frame(game);

        log::info!("Flappy Face running!");
    }

    fn setup_game_input(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");

        // Keyboard: Space flaps, P pauses. Any key counts as activity.
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                let mut g = game.borrow_mut();
                face::touch(&mut g.store, js_sys::Date::now());
                match event.code().as_str() {
                    "Space" => {
                        event.prevent_default();
                        if g.face_sprite.is_some() {
                            g.audio.ensure();
                        }
                        g.input.flap = true;
                    }
                    "KeyP" => {
                        event.prevent_default();
                        g.input.toggle_pause = true;
                    }
                    _ => {}
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Primary pointer action on the play canvas
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().primary_action();
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                game.borrow_mut().primary_action();
            });
            let _ = canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_control_buttons(game: Rc<RefCell<Game>>) {
        let document = document();

        if let Some(button) = document.get_element_by_id("soundToggle") {
            let game = game.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let g = &mut *game.borrow_mut();
                let enabled = g.settings.toggle_sound(&mut g.store);
                g.audio.set_enabled(enabled);
                update_sound_button(&document, enabled);
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(button) = document.get_element_by_id("pauseToggle") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().input.toggle_pause = true;
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_crop_pointers(crop_canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let document = document();

        // Mouse drags start on the workspace, but moves and releases are
        // tracked window-wide so fast drags don't stall at the border.
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                let view = g.view_metrics();
                let point = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                g.crop.pointer_down(&view, &[point]);
            });
            let _ = crop_canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let mut g = game.borrow_mut();
                if !g.crop.is_pointer_active() {
                    return;
                }
                event.prevent_default();
                let view = g.view_metrics();
                let point = Vec2::new(event.client_x() as f32, event.client_y() as f32);
                g.crop.pointer_move(&view, &[point]);
                g.redraw_cropper();
                g.sync_crop_controls(&document);
            });
            let _ = window
                .add_event_listener_with_callback("mousemove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().crop.pointer_up(0);
            });
            let _ = window
                .add_event_listener_with_callback("mouseup", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                event.prevent_default();
                let mut g = game.borrow_mut();
                let view = g.view_metrics();
                let points = touch_points(&event.touches());
                g.crop.pointer_down(&view, &points);
            });
            let _ = crop_canvas
                .add_event_listener_with_callback("touchstart", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        {
            let game = game.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                let mut g = game.borrow_mut();
                if !g.crop.is_pointer_active() {
                    return;
                }
                event.prevent_default();
                let view = g.view_metrics();
                let points = touch_points(&event.touches());
                g.crop.pointer_move(&view, &points);
                g.redraw_cropper();
                g.sync_crop_controls(&document);
            });
            let _ = crop_canvas
                .add_event_listener_with_callback("touchmove", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // A finger lifting and the browser cancelling share the release path
        for event_name in ["touchend", "touchcancel"] {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: TouchEvent| {
                game.borrow_mut().crop.pointer_up(event.touches().length() as usize);
            });
            let _ = crop_canvas
                .add_event_listener_with_callback(event_name, closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_crop_controls(game: Rc<RefCell<Game>>) {
        let document = document();

        if let Some(slider) = input_element(&document, "zoom") {
            let game = game.clone();
            let slider_ref = slider.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Ok(value) = slider_ref.value().parse::<f32>() {
                    let mut g = game.borrow_mut();
                    g.crop.set_zoom(value);
                    g.redraw_cropper();
                }
            });
            let _ = slider
                .add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(slider) = input_element(&document, "rotate") {
            let game = game.clone();
            let slider_ref = slider.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                if let Ok(value) = slider_ref.value().parse::<f32>() {
                    let mut g = game.borrow_mut();
                    g.crop.set_rotation_degrees(value);
                    g.redraw_cropper();
                }
            });
            let _ = slider
                .add_event_listener_with_callback("input", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(button) = document.get_element_by_id("resetCrop") {
            let game = game.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.crop.reset_transform();
                g.redraw_cropper();
                g.sync_crop_controls(&document);
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(button) = document.get_element_by_id("snapCenter") {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                g.crop.snap_to_center();
                g.redraw_cropper();
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Close button, cancel button and a click on the backdrop all leave
        // the editor and release the camera
        for id in ["closeModal", "cancelCrop"] {
            if let Some(button) = document.get_element_by_id(id) {
                let game = game.clone();
                let document = document.clone();
                let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                    close_crop_modal(&document);
                    game.borrow_mut().stop_camera(&document);
                });
                let _ = button
                    .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
                closure.forget();
            }
        }

        if let Some(modal) = document.get_element_by_id("modal") {
            let game = game.clone();
            let document = document.clone();
            let target: web_sys::EventTarget = modal.clone().into();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.target().as_ref() == Some(&target) {
                    close_crop_modal(&document);
                    game.borrow_mut().stop_camera(&document);
                }
            });
            let _ = modal
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_crop_confirm(game: Rc<RefCell<Game>>) {
        let document = document();
        let Some(button) = document.get_element_by_id("useCrop") else { return };

        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            let mut g = game.borrow_mut();
            if !g.crop.has_image() {
                alert("Upload a photo or use camera first.");
                return;
            }
            let schedule_start = g.confirm_crop();
            drop(g);
            close_crop_modal(&document);
            if schedule_start {
                schedule_autostart(game.clone());
            }
        });
        let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_file_inputs(game: Rc<RefCell<Game>>) {
        let document = document();

        // Upload input inside the editor modal
        if let Some(input) = input_element(&document, "fileInput") {
            let game = game.clone();
            let input_ref = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let Some(file) = input_ref.files().and_then(|files| files.get(0)) else {
                    return;
                };
                load_picked_file(game.clone(), input_ref.clone(), file, false);
            });
            let _ = input
                .add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Upload input inside the picker modal
        if let Some(input) = input_element(&document, "fileInput2") {
            let game = game.clone();
            let input_ref = input.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                let Some(file) = input_ref.files().and_then(|files| files.get(0)) else {
                    return;
                };
                load_picked_file(game.clone(), input_ref.clone(), file, true);
            });
            let _ = input
                .add_event_listener_with_callback("change", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_face_select(game: Rc<RefCell<Game>>) {
        let document = document();

        // Back from the editor into the picker. The picker stacks on top,
        // so the editor stays open underneath.
        if let Some(button) = document.get_element_by_id("openFaceSelect") {
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                open_face_select_modal(&document);
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        for (preset, button_id, _) in PRESET_CONTROLS {
            let Some(button) = document.get_element_by_id(button_id) else { continue };
            let game = game.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                let mut g = game.borrow_mut();
                let schedule_start = g.adopt_sprite(&preset.sprite());
                drop(g);
                close_face_select_modal(&document);
                if schedule_start {
                    schedule_autostart(game.clone());
                }
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(button) = document.get_element_by_id("closeFaceSelectModal") {
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                close_face_select_modal(&document);
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(modal) = document.get_element_by_id("faceSelectModal") {
            let document = document.clone();
            let target: web_sys::EventTarget = modal.clone().into();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                if event.target().as_ref() == Some(&target) {
                    close_face_select_modal(&document);
                }
            });
            let _ = modal
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_camera(game: Rc<RefCell<Game>>) {
        let document = document();

        if let Some(button) = document.get_element_by_id("openCameraFromSelect") {
            let game = game.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                close_face_select_modal(&document);
                start_camera(game.clone());
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(button) = document.get_element_by_id("captureBtn") {
            let game = game.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                capture_camera_frame(&game, &document);
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        if let Some(button) = document.get_element_by_id("stopCameraBtn") {
            let game = game.clone();
            let document = document.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
                game.borrow_mut().stop_camera(&document);
            });
            let _ = button
                .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    /// Periodically drop the stored sprite once it has been idle too long
    fn setup_face_sweep(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::<dyn FnMut()>::new(move || {
            let mut g = game.borrow_mut();
            if face::sweep(&mut g.store, js_sys::Date::now()) {
                g.face_sprite = None;
                log::info!("Stored face expired after inactivity");
            }
        });
        let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            FACE_SWEEP_INTERVAL_MS,
        );
        closure.forget();
    }

    /// Decode a picked file, then hand the image to the crop session.
    /// Stale loads (the user picked again already) resolve as no-ops.
    fn load_picked_file(
        game: Rc<RefCell<Game>>,
        input: HtmlInputElement,
        file: File,
        from_picker: bool,
    ) {
        let token = game.borrow_mut().crop.begin_load();
        wasm_bindgen_futures::spawn_local(async move {
            let document = document();
            match read_image_file(&file).await {
                Ok(image) => {
                    let mut g = game.borrow_mut();
                    if g.crop.complete_load(token, image) {
                        g.redraw_cropper();
                        g.sync_crop_controls(&document);
                        drop(g);
                        if let Some(camera_box) = html_element(&document, "cameraBox") {
                            camera_box.set_hidden(true);
                        }
                        if from_picker {
                            close_face_select_modal(&document);
                        }
                        open_crop_modal(&document);
                    }
                }
                Err(err) => {
                    log::warn!("Image decode failed: {err:?}");
                    game.borrow_mut().crop.abort_load(token);
                    alert("Sorry — that image couldn't be loaded. Try another one.");
                }
            }
            // Re-selecting the same file must fire another change event
            input.set_value("");
        });
    }

    async fn read_image_file(file: &File) -> Result<RgbaImage, JsValue> {
        let buffer = wasm_bindgen_futures::JsFuture::from(file.array_buffer()).await?;
        let bytes = js_sys::Uint8Array::new(&buffer).to_vec();
        let decoded = image::load_from_memory(&bytes)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;
        Ok(decoded.to_rgba8())
    }

    /// Ask for the front camera and show the viewfinder
    fn start_camera(game: Rc<RefCell<Game>>) {
        wasm_bindgen_futures::spawn_local(async move {
            let document = document();
            match request_user_camera().await {
                Ok(stream) => {
                    if let Some(video) = video_element(&document, "cameraVideo") {
                        video.set_src_object(Some(&stream));
                    }
                    game.borrow_mut().camera = Some(stream);
                    if let Some(camera_box) = html_element(&document, "cameraBox") {
                        camera_box.set_hidden(false);
                    }
                    if let Some(modal) = document.get_element_by_id("modal") {
                        modal.class_list().add_1("camera-only").ok();
                    }
                    open_crop_modal(&document);
                }
                Err(err) => {
                    log::warn!("Camera unavailable: {err:?}");
                    alert("Camera not available or permission denied. Use Upload face instead.");
                }
            }
        });
    }

    async fn request_user_camera() -> Result<MediaStream, JsValue> {
        let navigator = web_sys::window()
            .ok_or_else(|| JsValue::from_str("no window"))?
            .navigator();
        let devices = navigator.media_devices()?;

        let video = js_sys::Object::new();
        js_sys::Reflect::set(&video, &"facingMode".into(), &"user".into())?;
        let constraints = MediaStreamConstraints::new();
        constraints.set_video(&video);
        constraints.set_audio(&JsValue::FALSE);

        let promise = devices.get_user_media_with_constraints(&constraints)?;
        let stream = wasm_bindgen_futures::JsFuture::from(promise).await?;
        stream.dyn_into::<MediaStream>()
    }

    /// Grab a frame, release the camera and load the frame into the editor
    fn capture_camera_frame(game: &Rc<RefCell<Game>>, document: &Document) {
        let mut g = game.borrow_mut();
        if g.camera.is_none() {
            return;
        }
        let Some(video) = video_element(document, "cameraVideo") else { return };

        match bitmap::frame_from_video(&video) {
            Ok(frame) => {
                g.stop_camera(document);
                if let Some(modal) = document.get_element_by_id("modal") {
                    modal.class_list().remove_1("camera-only").ok();
                }
                let token = g.crop.begin_load();
                g.crop.complete_load(token, frame);
                g.redraw_cropper();
                g.sync_crop_controls(document);
            }
            Err(err) => {
                log::warn!("Could not capture camera frame: {err:?}");
            }
        }
    }

    /// Start the round a moment after a face is confirmed, unless the
    /// player already flapped in the meantime
    fn schedule_autostart(game: Rc<RefCell<Game>>) {
        let delay = game.borrow().session.tuning.autostart_delay_ms;
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move || {
            game.borrow_mut().session.autostart();
        });
        let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            delay,
        );
        closure.forget();
    }

    // === DOM helpers ===

    fn document() -> Document {
        web_sys::window()
            .expect("no window")
            .document()
            .expect("no document")
    }

    fn html_element(document: &Document, id: &str) -> Option<HtmlElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn input_element(document: &Document, id: &str) -> Option<HtmlInputElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn video_element(document: &Document, id: &str) -> Option<HtmlVideoElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn canvas_element(document: &Document, id: &str) -> Option<HtmlCanvasElement> {
        document.get_element_by_id(id)?.dyn_into().ok()
    }

    fn alert(message: &str) {
        if let Some(window) = web_sys::window() {
            let _ = window.alert_with_message(message);
        }
    }

    /// Collect client-space touch points
    fn touch_points(touches: &TouchList) -> Vec<Vec2> {
        (0..touches.length())
            .filter_map(|i| touches.get(i))
            .map(|touch| Vec2::new(touch.client_x() as f32, touch.client_y() as f32))
            .collect()
    }

    fn open_crop_modal(document: &Document) {
        if let Some(modal) = document.get_element_by_id("modal") {
            modal.class_list().add_1("open").ok();
            let _ = modal.set_attribute("aria-hidden", "false");
        }
    }

    fn close_crop_modal(document: &Document) {
        if let Some(modal) = document.get_element_by_id("modal") {
            modal.class_list().remove_2("open", "camera-only").ok();
            let _ = modal.set_attribute("aria-hidden", "true");
        }
    }

    fn open_face_select_modal(document: &Document) {
        if let Some(modal) = document.get_element_by_id("faceSelectModal") {
            modal.class_list().add_1("open").ok();
            let _ = modal.set_attribute("aria-hidden", "false");
        }
        draw_preset_thumbnails(document);
    }

    fn close_face_select_modal(document: &Document) {
        if let Some(modal) = document.get_element_by_id("faceSelectModal") {
            modal.class_list().remove_1("open").ok();
            let _ = modal.set_attribute("aria-hidden", "true");
        }
    }

    /// Rasterize the four pre-made faces into their picker canvases
    fn draw_preset_thumbnails(document: &Document) {
        for (preset, _, canvas_id) in PRESET_CONTROLS {
            let Some(canvas) = canvas_element(document, canvas_id) else { continue };
            let thumb = preset.thumbnail();
            canvas.set_width(thumb.width());
            canvas.set_height(thumb.height());
            match bitmap::context_2d(&canvas) {
                Ok(ctx) => {
                    if let Err(err) = bitmap::paint(&ctx, &thumb) {
                        log::warn!("Thumbnail blit failed: {err:?}");
                    }
                }
                Err(err) => log::warn!("Thumbnail context failed: {err:?}"),
            }
        }
    }

    fn update_sound_button(document: &Document, enabled: bool) {
        if let Some(button) = document.get_element_by_id("soundToggle") {
            button.set_text_content(Some(if enabled { "Sound: On" } else { "Sound: Off" }));
            let _ = button.set_attribute("aria-pressed", &enabled.to_string());
        }
    }

    fn update_pause_button(document: &Document, paused: bool) {
        if let Some(button) = document.get_element_by_id("pauseToggle") {
            button.set_text_content(Some(if paused { "Resume" } else { "Pause" }));
            let _ = button.set_attribute("aria-pressed", &paused.to_string());
        }
    }

    // === Main loop ===

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().expect("no window");
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let document = document();
            let mut g = game.borrow_mut();
            let events = g.frame(time);
            g.handle_events(&document, &events);
            g.render();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Flappy Face (native) starting...");
    log::info!("Native mode is headless - run with `trunk serve` for the web version");

    println!("\nRunning scripted session...");
    demo_session();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn demo_session() {
    use flappy_face::Tuning;
    use flappy_face::sim::{GameEvent, GameSession, TickInput, dt_scale, tick};

    fn run_script(seed: u64) -> (u32, u32) {
        let mut session = GameSession::new(seed, 0, Tuning::default());
        let step = 16.67;
        let mut now = 0.0;
        for frame in 0u32..1200 {
            let input = TickInput {
                flap: frame % 40 == 0,
                face_available: true,
                ..TickInput::default()
            };
            let events = tick(&mut session, &input, now, dt_scale(step));
            for event in &events {
                if let GameEvent::Scored(score) = event {
                    println!("  passed an obstacle, score {score}");
                }
            }
            now += step;
        }
        (session.score, session.best)
    }

    let first = run_script(2024);
    let second = run_script(2024);
    assert_eq!(first, second, "scripted sessions diverged");
    println!("✓ Deterministic replay: score {}, best {}", first.0, first.1);

    println!("\nAll checks passed!");
}
