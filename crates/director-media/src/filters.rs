//! FFmpeg filter graph fragments for scene rendering.

use director_models::RenderProfile;

/// Default final zoom factor for the Ken Burns push-in.
pub const DEFAULT_KEN_BURNS_MAX_ZOOM: f64 = 1.2;

/// Background music level relative to narration.
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.3;

/// Slow push-in applied to still images.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KenBurns {
    /// Zoom reached on the last frame (1.0 = none)
    pub max_zoom: f64,
}

impl Default for KenBurns {
    fn default() -> Self {
        Self {
            max_zoom: DEFAULT_KEN_BURNS_MAX_ZOOM,
        }
    }
}

impl KenBurns {
    /// Per-frame zoom increment so `max_zoom` is reached at the end of the scene.
    pub fn increment(&self, duration_secs: f64, fps: u32) -> f64 {
        let frames = (duration_secs * fps as f64).max(1.0);
        (self.max_zoom - 1.0).max(0.0) / frames
    }

    /// `zoompan` filter centred on the frame, one output frame per input frame.
    pub fn filter(&self, duration_secs: f64, profile: &RenderProfile) -> String {
        format!(
            "zoompan=z='min(1+{inc:.6}*on,{max:.3})':x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':d=1:s={w}x{h}:fps={fps}",
            inc = self.increment(duration_secs, profile.fps),
            max = self.max_zoom,
            w = profile.width,
            h = profile.height,
            fps = profile.fps,
        )
    }
}

/// Letterbox into the profile frame without distorting the source.
pub fn fit_frame(profile: &RenderProfile) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:color=black,setsar=1",
        w = profile.width,
        h = profile.height,
    )
}

/// Fill the frame at twice the profile size, the canvas `zoompan` samples from.
pub fn cover_oversampled(profile: &RenderProfile) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
        w = profile.width * 2,
        h = profile.height * 2,
    )
}

/// Normalize a motion clip: fit, constant frame rate, hold the last frame
/// out to at least `duration_secs`.
pub fn motion_clip_chain(duration_secs: f64, profile: &RenderProfile) -> String {
    format!(
        "{fit},fps={fps},tpad=stop_mode=clone:stop_duration={d:.3},format={pix}",
        fit = fit_frame(profile),
        fps = profile.fps,
        d = duration_secs,
        pix = profile.pixel_format,
    )
}

/// Normalize a looped still image, with or without a Ken Burns move.
pub fn still_chain(
    duration_secs: f64,
    profile: &RenderProfile,
    ken_burns: Option<&KenBurns>,
) -> String {
    match ken_burns {
        Some(kb) => format!(
            "{cover},{zoom},setsar=1,format={pix}",
            cover = cover_oversampled(profile),
            zoom = kb.filter(duration_secs, profile),
            pix = profile.pixel_format,
        ),
        None => format!(
            "{fit},fps={fps},format={pix}",
            fit = fit_frame(profile),
            fps = profile.fps,
            pix = profile.pixel_format,
        ),
    }
}

/// Resample to the profile's rate and layout so every clip's audio matches.
pub fn audio_format(profile: &RenderProfile) -> String {
    let layout = if profile.audio_channels == 1 { "mono" } else { "stereo" };
    format!(
        "aresample={rate},aformat=sample_fmts=fltp:channel_layouts={layout}",
        rate = profile.sample_rate,
    )
}

/// Lavfi silent source in the profile's format.
pub fn silence_source(profile: &RenderProfile) -> String {
    let layout = if profile.audio_channels == 1 { "mono" } else { "stereo" };
    format!("anullsrc=r={}:cl={}", profile.sample_rate, layout)
}

/// Mix a primary track with attenuated music; the primary bounds the length.
pub fn narration_music_mix(
    primary: &str,
    music: &str,
    music_volume: f64,
    profile: &RenderProfile,
    out: &str,
) -> String {
    let fmt = audio_format(profile);
    format!(
        "[{primary}]{fmt}[nar];[{music}]{fmt},volume={vol:.2}[mus];[nar][mus]amix=inputs=2:duration=first:dropout_transition=0:normalize=0,apad[{out}]",
        vol = music_volume,
    )
}

/// Pass a single track through, padded with silence.
pub fn single_track(input: &str, profile: &RenderProfile, out: &str) -> String {
    format!("[{input}]{},apad[{out}]", audio_format(profile))
}
