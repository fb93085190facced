//! Sound effects via the Web Audio API.
//!
//! Every tone is synthesized with oscillator nodes, so no audio assets
//! are shipped. The context is created lazily on the first user gesture
//! (autoplay policies block contexts created earlier) and suspended
//! while sound is toggled off.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Wing flap
    Flap,
    /// Passed an obstacle
    Score,
    /// Crashed
    GameOver,
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    enabled: bool,
}

impl AudioManager {
    pub fn new(enabled: bool) -> Self {
        Self { ctx: None, enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Create the context if it does not exist yet and resume it if the
    /// browser left it suspended. Call from a user gesture handler.
    pub fn ensure(&mut self) {
        if !self.enabled {
            return;
        }
        if self.ctx.is_none() {
            self.ctx = AudioContext::new().ok();
            if self.ctx.is_none() {
                log::warn!("Failed to create AudioContext - sound disabled");
            }
        }
        if let Some(ctx) = &self.ctx {
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }
        }
    }

    /// Enable or disable sound. Disabling suspends the live context so
    /// any scheduled tones stop; enabling resumes (or creates) it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            self.ensure();
        } else if let Some(ctx) = &self.ctx {
            let _ = ctx.suspend();
        }
    }

    /// Play a sound effect
    pub fn play(&mut self, effect: SoundEffect) {
        if !self.enabled {
            return;
        }
        self.ensure();
        let Some(ctx) = &self.ctx else { return };

        match effect {
            SoundEffect::Flap => self.play_flap(ctx),
            SoundEffect::Score => self.play_score(ctx),
            SoundEffect::GameOver => self.play_game_over(ctx),
        }
    }

    // === Sound generators ===

    /// Create an oscillator wired through its own gain node
    fn create_osc(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Schedule one tone with a fast attack and exponential decay.
    /// Delayed notes pass a `when` in the future on the audio clock.
    fn play_tone(
        &self,
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
        when: f64,
        dur: f64,
        peak: f32,
    ) {
        let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
            return;
        };

        gain.gain().set_value_at_time(0.0001, when).ok();
        gain.gain()
            .linear_ramp_to_value_at_time(peak, when + 0.01)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.0001, when + dur)
            .ok();

        osc.start_with_when(when).ok();
        osc.stop_with_when(when + dur + 0.02).ok();
    }

    /// Flap - short square blip
    fn play_flap(&self, ctx: &AudioContext) {
        let t = ctx.current_time();
        self.play_tone(ctx, 600.0, OscillatorType::Square, t, 0.09, 0.08);
    }

    /// Score - rising two-note chime
    fn play_score(&self, ctx: &AudioContext) {
        let t = ctx.current_time();
        self.play_tone(ctx, 880.0, OscillatorType::Triangle, t, 0.08, 0.07);
        self.play_tone(ctx, 1040.0, OscillatorType::Triangle, t + 0.06, 0.08, 0.06);
    }

    /// Game over - falling sawtooth pair
    fn play_game_over(&self, ctx: &AudioContext) {
        let t = ctx.current_time();
        self.play_tone(ctx, 220.0, OscillatorType::Sawtooth, t, 0.2, 0.1);
        self.play_tone(ctx, 160.0, OscillatorType::Sawtooth, t + 0.09, 0.25, 0.08);
    }
}
