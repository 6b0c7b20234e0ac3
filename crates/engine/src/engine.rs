//! The engine: one scene, one canvas surface, a playback clock, and pointer
//! interaction.
//!
//! All mutation happens through `&mut Engine` on one thread. Every mutation
//! re-renders synchronously and then notifies subscribers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use scenecast_common::{
    AppConfig, CancelToken, CaptureClock, ExportDefaults, FrameSlots, PlaybackDefaults,
    RenderConfig, SceneCastError, SceneCastResult,
};
use scenecast_encoder::{
    default_recorder, EncoderFactory, MjpegEncoderFactory, StreamRecorder,
};
use scenecast_render_engine::{
    draw_guides, draw_selection_outline, render_scene, Frame, GlyphRasterizer, Surface,
};
use scenecast_scene_model::{ObjectId, ObjectUpdate, PlaybackSettings, Rgba, Scene, SceneObject};

use crate::events::{EngineEvent, EventBus, SubscriptionId};

/// Interval of the playback driver in [`Engine::run_playback`].
pub const PLAYBACK_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Builds a fresh recorder for each realtime export.
pub type RecorderFactory = Box<dyn Fn() -> Box<dyn StreamRecorder> + Send + Sync>;

/// Engine construction parameters.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub width: u32,
    pub height: u32,
    pub playback: PlaybackDefaults,
    pub render: RenderConfig,
    pub export: ExportDefaults,
}

impl EngineConfig {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_app_config(&AppConfig::default(), width, height)
    }

    pub fn from_app_config(config: &AppConfig, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            playback: config.playback.clone(),
            render: config.render.clone(),
            export: config.export.clone(),
        }
    }
}

/// Pointer and touch input, in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down { x: f64, y: f64 },
    Move { x: f64, y: f64 },
    Up,
    TouchStart { x: f64, y: f64 },
    TouchMove { x: f64, y: f64 },
    TouchEnd,
}

/// Z-order change for [`Engine::reorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reorder {
    Up,
    Down,
    Front,
    Back,
}

/// Exists only while a drag is in progress.
#[derive(Debug, Clone, Copy)]
struct DragState {
    id: ObjectId,
    start_x: f64,
    start_y: f64,
    origin_x: f64,
    origin_y: f64,
}

/// A recorder attached to the render path during realtime export.
///
/// The clock starts at the first captured render, so the first frame is
/// stamped 0.
pub(crate) struct Capture {
    pub(crate) recorder: Box<dyn StreamRecorder>,
    width: u32,
    height: u32,
    clock: Option<CaptureClock>,
    slots: FrameSlots,
    pub(crate) error: Option<SceneCastError>,
}

impl Capture {
    pub(crate) fn new(recorder: Box<dyn StreamRecorder>, width: u32, height: u32, fps: u32) -> Self {
        Self {
            recorder,
            width,
            height,
            clock: None,
            slots: FrameSlots::new(fps),
            error: None,
        }
    }

    /// Push the current surface into every frame slot it is due for.
    fn offer(&mut self, surface: &Surface) {
        if self.error.is_some() {
            return;
        }
        let elapsed_ns = self.clock.get_or_insert_with(CaptureClock::start).elapsed_ns();
        self.offer_at(surface, elapsed_ns);
    }

    fn offer_at(&mut self, surface: &Surface, elapsed_ns: u64) {
        let due = self.slots.due(elapsed_ns);
        if due.is_empty() {
            return;
        }
        if due.end - due.start > 1 {
            tracing::trace!(repeated = due.end - due.start - 1, "Capture fell behind");
        }
        let frame = match surface.snapshot(self.width, self.height) {
            Ok(frame) => frame,
            Err(err) => {
                self.error = Some(err);
                return;
            }
        };
        for index in due {
            let timestamp_ms = self.slots.timestamp_ms(index);
            if let Err(err) = self.recorder.push_frame(&frame, timestamp_ms) {
                self.error = Some(err);
                return;
            }
        }
    }
}

pub struct Engine {
    pub(crate) scene: Scene,
    pub(crate) surface: Surface,
    glyphs: GlyphRasterizer,

    pub(crate) current_time_ms: f64,
    total_duration_ms: f64,
    pub(crate) playing: bool,
    pub(crate) looping: bool,
    playback_rate: f64,
    last_tick: Option<Instant>,

    selected: Option<ObjectId>,
    drag: Option<DragState>,
    pub(crate) overlays: bool,

    events: EventBus,
    pub(crate) export_defaults: ExportDefaults,
    pub(crate) capture: Option<Capture>,
    pub(crate) encoder_factory: Arc<dyn EncoderFactory>,
    pub(crate) recorder_factory: RecorderFactory,
}

impl Engine {
    /// Acquire a surface and size the scene to it.
    ///
    /// Fails with a configuration error if the surface cannot be allocated.
    pub fn new(config: EngineConfig) -> SceneCastResult<Self> {
        let surface = Surface::new(config.width, config.height)?;
        let glyphs = GlyphRasterizer::from_config(&config.render)?;

        let mut scene = Scene::new(0, 0);
        if let Some(bg) = Rgba::parse_hex(&config.render.background) {
            scene.background = bg;
        }

        let quality = config.export.jpeg_quality;
        let mut engine = Self {
            scene,
            surface,
            glyphs,
            current_time_ms: 0.0,
            total_duration_ms: positive_or(config.playback.total_duration_ms, 1.0),
            playing: false,
            looping: config.playback.looping,
            playback_rate: positive_or(config.playback.playback_rate, 1.0),
            last_tick: None,
            selected: None,
            drag: None,
            overlays: true,
            events: EventBus::new(),
            export_defaults: config.export,
            capture: None,
            encoder_factory: Arc::new(MjpegEncoderFactory { quality }),
            recorder_factory: Box::new(default_recorder),
        };
        engine.resize(config.width, config.height)?;
        tracing::debug!(
            width = config.width,
            height = config.height,
            font = engine.glyphs.has_font(),
            "Engine initialized"
        );
        Ok(engine)
    }

    // ---- accessors ----

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn glyphs(&self) -> &GlyphRasterizer {
        &self.glyphs
    }

    /// Straight-alpha copy of the whole surface.
    pub fn frame(&self) -> SceneCastResult<Frame> {
        self.surface.snapshot_full()
    }

    pub fn current_time_ms(&self) -> f64 {
        self.current_time_ms
    }

    pub fn total_duration_ms(&self) -> f64 {
        self.total_duration_ms
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn selected(&self) -> Option<ObjectId> {
        self.selected
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn export_defaults(&self) -> &ExportDefaults {
        &self.export_defaults
    }

    pub fn playback_settings(&self) -> PlaybackSettings {
        PlaybackSettings {
            total_duration_ms: self.total_duration_ms,
            looping: self.looping,
            playback_rate: self.playback_rate,
        }
    }

    // ---- observers ----

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&EngineEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub(crate) fn emit(&self, event: EngineEvent) {
        self.events.emit(event);
    }

    // ---- configuration ----

    /// Encoder used by offline export.
    pub fn set_encoder_factory(&mut self, factory: Arc<dyn EncoderFactory>) {
        self.encoder_factory = factory;
    }

    /// Recorder used by realtime export.
    pub fn set_recorder_factory(&mut self, factory: RecorderFactory) {
        self.recorder_factory = factory;
    }

    pub fn set_export_defaults(&mut self, defaults: ExportDefaults) {
        self.export_defaults = defaults;
    }

    /// Show or hide editor overlays (guides, selection outline).
    pub fn set_overlays_enabled(&mut self, enabled: bool) {
        self.overlays = enabled;
        self.render();
    }

    pub fn overlays_enabled(&self) -> bool {
        self.overlays
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    pub fn set_playback_rate(&mut self, rate: f64) -> SceneCastResult<()> {
        if !(rate.is_finite() && rate > 0.0) {
            return Err(SceneCastError::configuration(format!(
                "playback rate must be positive, got {rate}"
            )));
        }
        self.playback_rate = rate;
        Ok(())
    }

    /// Change the timeline length. The current time is clamped into it.
    pub fn set_total_duration(&mut self, duration_ms: f64) -> SceneCastResult<()> {
        if !(duration_ms.is_finite() && duration_ms > 0.0) {
            return Err(SceneCastError::configuration(format!(
                "total duration must be positive, got {duration_ms}"
            )));
        }
        self.total_duration_ms = duration_ms;
        if self.current_time_ms > duration_ms {
            self.seek(duration_ms);
        }
        Ok(())
    }

    pub fn apply_playback(&mut self, settings: PlaybackSettings) -> SceneCastResult<()> {
        self.set_total_duration(settings.total_duration_ms)?;
        self.set_playback_rate(settings.playback_rate)?;
        self.set_looping(settings.looping);
        Ok(())
    }

    // ---- clock ----

    /// Start playing. Restarts from zero when at the end.
    pub fn play(&mut self) {
        if self.playing {
            return;
        }
        if self.current_time_ms >= self.total_duration_ms {
            self.current_time_ms = 0.0;
        }
        self.playing = true;
        self.last_tick = None;
        tracing::debug!(time_ms = self.current_time_ms, "Playback started");
        self.render();
        self.emit(EngineEvent::PlayStateChanged { playing: true });
    }

    /// Stop playing. No further step runs after this returns.
    pub fn pause(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.last_tick = None;
        tracing::debug!(time_ms = self.current_time_ms, "Playback paused");
        self.render();
        self.emit(EngineEvent::PlayStateChanged { playing: false });
    }

    /// Jump to `time_ms`, clamped to the timeline. Play state is unchanged.
    pub fn seek(&mut self, time_ms: f64) {
        let t = if time_ms.is_nan() { 0.0 } else { time_ms };
        self.current_time_ms = t.clamp(0.0, self.total_duration_ms);
        self.render();
        self.emit(EngineEvent::TimeUpdate {
            time_ms: self.current_time_ms,
        });
    }

    /// One playback step at wall-clock `now`. Returns whether still playing.
    ///
    /// The first step after `play` only anchors the clock.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.playing {
            return false;
        }
        let delta_ms = self
            .last_tick
            .map(|last| now.saturating_duration_since(last).as_secs_f64() * 1000.0)
            .unwrap_or(0.0);
        self.last_tick = Some(now);

        let mut t = self.current_time_ms + delta_ms * self.playback_rate;
        let mut finished = false;
        if t > self.total_duration_ms {
            if self.looping {
                t = 0.0;
            } else {
                t = self.total_duration_ms;
                finished = true;
            }
        }
        self.current_time_ms = t;
        if finished {
            self.playing = false;
            self.last_tick = None;
        }

        self.render();
        self.emit(EngineEvent::TimeUpdate { time_ms: t });
        if finished {
            tracing::debug!(time_ms = t, "Playback reached the end");
            self.emit(EngineEvent::PlayStateChanged { playing: false });
        }
        self.playing
    }

    /// Drive playback from a timer until it stops or `cancel` fires.
    pub async fn run_playback(&mut self, cancel: &CancelToken) {
        let mut interval = tokio::time::interval(PLAYBACK_FRAME_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        while self.playing {
            interval.tick().await;
            if cancel.is_cancelled() {
                self.pause();
                break;
            }
            if !self.tick(Instant::now()) {
                break;
            }
        }
    }

    // ---- selection and pointer ----

    /// Select an object, or clear the selection with `None`.
    pub fn select_object(&mut self, id: Option<ObjectId>) -> SceneCastResult<()> {
        if let Some(id) = id {
            if self.scene.get(id).is_none() {
                return Err(SceneCastError::scene(format!("unknown object {id}")));
            }
        }
        self.set_selection(id);
        self.render();
        Ok(())
    }

    fn set_selection(&mut self, id: Option<ObjectId>) {
        if self.selected == id {
            return;
        }
        self.selected = id;
        self.emit(EngineEvent::SelectionChanged { selected: id });
    }

    pub fn pointer_down(&mut self, x: f64, y: f64) {
        let hit = self.scene.topmost_at(x, y);
        self.set_selection(hit);
        self.drag = hit.and_then(|id| self.scene.get(id)).map(|obj| DragState {
            id: obj.id,
            start_x: x,
            start_y: y,
            origin_x: obj.x,
            origin_y: obj.y,
        });
        self.render();
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) {
        let Some(drag) = self.drag else {
            return;
        };
        let Some(obj) = self.scene.get_mut(drag.id) else {
            self.drag = None;
            return;
        };
        obj.x = drag.origin_x + (x - drag.start_x);
        obj.y = drag.origin_y + (y - drag.start_y);
        self.render();
        self.emit(EngineEvent::ObjectChanged { id: drag.id });
    }

    pub fn pointer_up(&mut self) {
        self.drag = None;
    }

    /// Dispatch mouse and touch input.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        match event {
            PointerEvent::Down { x, y } | PointerEvent::TouchStart { x, y } => {
                self.pointer_down(x, y)
            }
            PointerEvent::Move { x, y } | PointerEvent::TouchMove { x, y } => {
                self.pointer_move(x, y)
            }
            PointerEvent::Up | PointerEvent::TouchEnd => self.pointer_up(),
        }
    }

    // ---- scene editing ----

    pub fn add_object(&mut self, object: SceneObject) -> SceneCastResult<ObjectId> {
        let id = self.scene.add(object)?;
        self.render();
        self.emit(EngineEvent::ObjectChanged { id });
        Ok(id)
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<SceneObject> {
        let removed = self.scene.remove(id)?;
        if self.selected == Some(id) {
            self.set_selection(None);
        }
        if self.drag.is_some_and(|d| d.id == id) {
            self.drag = None;
        }
        self.render();
        Some(removed)
    }

    /// Clone an object above the original and select the copy.
    pub fn duplicate_object(&mut self, id: ObjectId) -> SceneCastResult<ObjectId> {
        let copy = self.scene.duplicate(id)?;
        self.set_selection(Some(copy));
        self.render();
        self.emit(EngineEvent::ObjectChanged { id: copy });
        Ok(copy)
    }

    /// Apply one typed field update.
    pub fn update_object(&mut self, id: ObjectId, update: ObjectUpdate) -> SceneCastResult<()> {
        let obj = self
            .scene
            .get_mut(id)
            .ok_or_else(|| SceneCastError::scene(format!("unknown object {id}")))?;
        update.apply(obj)?;
        self.render();
        self.emit(EngineEvent::ObjectChanged { id });
        Ok(())
    }

    pub fn reorder(&mut self, id: ObjectId, change: Reorder) -> bool {
        let moved = match change {
            Reorder::Up => self.scene.move_up(id),
            Reorder::Down => self.scene.move_down(id),
            Reorder::Front => self.scene.bring_to_front(id),
            Reorder::Back => self.scene.send_to_back(id),
        };
        if moved {
            self.render();
            self.emit(EngineEvent::ObjectChanged { id });
        }
        moved
    }

    /// Replace the scene wholesale. The surface follows its dimensions.
    pub fn load_scene(&mut self, scene: Scene) -> SceneCastResult<()> {
        if scene.has_zero_area() {
            return Err(SceneCastError::scene("scene has zero area"));
        }
        self.surface.resize(scene.width, scene.height)?;
        let (width, height) = (scene.width, scene.height);
        self.scene = scene;
        self.drag = None;
        self.set_selection(None);
        self.render();
        self.emit(EngineEvent::Resized { width, height });
        Ok(())
    }

    // ---- resize ----

    /// Resize the canvas, rescaling objects proportionally.
    ///
    /// Positions scale per axis; sizes scale by `min(scale_x, scale_y)`.
    /// A scene with zero area is simply sized.
    pub fn resize(&mut self, width: u32, height: u32) -> SceneCastResult<()> {
        self.surface.resize(width, height)?;

        if self.scene.has_zero_area() {
            self.scene.set_dimensions(width, height);
        } else {
            let scale_x = width as f64 / self.scene.width as f64;
            let scale_y = height as f64 / self.scene.height as f64;
            // Extreme aspect changes can push objects off-canvas.
            let s = scale_x.min(scale_y);
            for obj in self.scene.objects_mut() {
                obj.rescale(scale_x, scale_y, s);
            }
            tracing::debug!(scale_x, scale_y, s, "Scene rescaled");
            self.scene.set_dimensions(width, height);
        }

        self.render();
        self.emit(EngineEvent::Resized { width, height });
        Ok(())
    }

    // ---- rendering ----

    /// Draw the scene at the current time, plus overlays when paused.
    pub fn render(&mut self) {
        render_scene(
            &mut self.surface,
            &self.glyphs,
            &mut self.scene,
            self.current_time_ms,
        );

        if !self.playing && self.overlays {
            draw_guides(&mut self.surface, self.scene.guides);
            let selection = self
                .selected
                .and_then(|id| self.scene.get(id))
                .filter(|obj| obj.visible)
                .map(|obj| obj.bounds());
            if let Some(bounds) = selection {
                draw_selection_outline(&mut self.surface, bounds);
            }
        }

        if let Some(capture) = self.capture.as_mut() {
            capture.offer(&self.surface);
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("width", &self.scene.width)
            .field("height", &self.scene.height)
            .field("objects", &self.scene.len())
            .field("current_time_ms", &self.current_time_ms)
            .field("playing", &self.playing)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenecast_scene_model::{
        Animation, AnimationKind, LogoProps, ObjectKind, TextAlign, TextProps,
    };
    use std::sync::Mutex;

    fn engine(width: u32, height: u32) -> Engine {
        Engine::new(EngineConfig::new(width, height)).unwrap()
    }

    fn logo(x: f64, y: f64) -> SceneObject {
        SceneObject::new(ObjectKind::Logo(LogoProps {
            label: "A".to_string(),
            background: Rgba::rgb(200, 40, 40),
            foreground: Rgba::WHITE,
            corner_radius: 4.0,
            font_size: 12.0,
        }))
        .with_position(x, y)
        .with_size(50.0, 50.0)
    }

    fn text(x: f64, y: f64, font_size: f64) -> SceneObject {
        SceneObject::new(ObjectKind::Text(TextProps {
            text: "Hello".to_string(),
            font_size,
            color: Rgba::WHITE,
            background: None,
            padding: 10.0,
            line_height: 1.2,
            align: TextAlign::Left,
        }))
        .with_position(x, y)
    }

    fn record(engine: &Engine) -> Arc<Mutex<Vec<EngineEvent>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine.subscribe(move |e| sink.lock().unwrap().push(e.clone()));
        seen
    }

    #[test]
    fn test_zero_surface_is_a_configuration_error() {
        let err = Engine::new(EngineConfig::new(0, 100)).unwrap_err();
        assert!(matches!(err, SceneCastError::Configuration { .. }));
    }

    #[test]
    fn test_scene_matches_surface() {
        let mut e = engine(320, 180);
        assert_eq!((e.scene().width, e.scene().height), (320, 180));
        e.resize(640, 360).unwrap();
        assert_eq!((e.surface().width(), e.surface().height()), (640, 360));
        assert_eq!((e.scene().width, e.scene().height), (640, 360));
    }

    #[test]
    fn test_seek_clamps_and_keeps_play_state() {
        let mut e = engine(64, 64);
        e.set_total_duration(2000.0).unwrap();
        e.seek(5000.0);
        assert_eq!(e.current_time_ms(), 2000.0);
        e.seek(-3.0);
        assert_eq!(e.current_time_ms(), 0.0);
        assert!(!e.is_playing());
    }

    #[test]
    fn test_play_at_end_restarts_from_zero() {
        let mut e = engine(64, 64);
        e.set_total_duration(1000.0).unwrap();
        e.seek(1000.0);
        e.play();
        assert!(e.is_playing());
        assert_eq!(e.current_time_ms(), 0.0);
    }

    #[test]
    fn test_tick_advances_by_rate_and_stops_at_end() {
        let mut e = engine(64, 64);
        e.set_total_duration(1000.0).unwrap();
        e.set_playback_rate(2.0).unwrap();
        let seen = record(&e);

        let t0 = Instant::now();
        e.play();
        assert!(e.tick(t0));
        assert_eq!(e.current_time_ms(), 0.0);
        assert!(e.tick(t0 + Duration::from_millis(100)));
        assert!((e.current_time_ms() - 200.0).abs() < 1e-6);

        assert!(!e.tick(t0 + Duration::from_millis(1000)));
        assert_eq!(e.current_time_ms(), 1000.0);
        assert!(!e.is_playing());
        assert!(seen
            .lock()
            .unwrap()
            .contains(&EngineEvent::PlayStateChanged { playing: false }));
    }

    #[test]
    fn test_tick_loops_to_zero() {
        let mut e = engine(64, 64);
        e.set_total_duration(500.0).unwrap();
        e.set_looping(true);
        let t0 = Instant::now();
        e.play();
        e.tick(t0);
        assert!(e.tick(t0 + Duration::from_millis(600)));
        assert_eq!(e.current_time_ms(), 0.0);
        assert!(e.is_playing());
    }

    #[test]
    fn test_pause_cancels_pending_step() {
        let mut e = engine(64, 64);
        let t0 = Instant::now();
        e.play();
        e.tick(t0);
        e.pause();
        assert!(!e.tick(t0 + Duration::from_millis(500)));
        assert_eq!(e.current_time_ms(), 0.0);
    }

    #[test]
    fn test_invalid_rate_and_duration_rejected() {
        let mut e = engine(64, 64);
        assert!(e.set_playback_rate(0.0).is_err());
        assert!(e.set_playback_rate(f64::NAN).is_err());
        assert!(e.set_total_duration(-1.0).is_err());
        assert_eq!(e.playback_rate(), 1.0);
    }

    #[test]
    fn test_hit_priority_skips_locked() {
        let mut e = engine(200, 200);
        let bottom = e.add_object(logo(10.0, 10.0)).unwrap();
        let top = e.add_object(logo(30.0, 30.0)).unwrap();

        e.pointer_down(40.0, 40.0);
        assert_eq!(e.selected(), Some(top));
        e.pointer_up();

        e.update_object(top, ObjectUpdate::Locked { value: true })
            .unwrap();
        e.pointer_down(40.0, 40.0);
        assert_eq!(e.selected(), Some(bottom));
        e.pointer_up();

        e.pointer_down(190.0, 190.0);
        assert_eq!(e.selected(), None);
        assert!(!e.is_dragging());
    }

    #[test]
    fn test_drag_moves_by_pointer_delta() {
        let mut e = engine(200, 200);
        let id = e.add_object(logo(20.0, 30.0)).unwrap();

        e.pointer_down(25.0, 35.0);
        e.pointer_move(40.0, 20.0);
        let obj = e.scene().get(id).unwrap();
        assert_eq!((obj.x, obj.y), (35.0, 15.0));

        e.pointer_up();
        e.pointer_move(100.0, 100.0);
        let obj = e.scene().get(id).unwrap();
        assert_eq!((obj.x, obj.y), (35.0, 15.0));
    }

    #[test]
    fn test_touch_routes_like_mouse() {
        let mut e = engine(200, 200);
        let id = e.add_object(logo(0.0, 0.0)).unwrap();
        e.handle_pointer(PointerEvent::TouchStart { x: 10.0, y: 10.0 });
        e.handle_pointer(PointerEvent::TouchMove { x: 15.0, y: 12.0 });
        e.handle_pointer(PointerEvent::TouchEnd);
        let obj = e.scene().get(id).unwrap();
        assert_eq!((obj.x, obj.y), (5.0, 2.0));
        assert!(!e.is_dragging());
    }

    #[test]
    fn test_selection_event_fires_once_per_change() {
        let mut e = engine(200, 200);
        let id = e.add_object(logo(0.0, 0.0)).unwrap();
        let seen = record(&e);

        e.select_object(Some(id)).unwrap();
        e.select_object(Some(id)).unwrap();
        e.pointer_down(10.0, 10.0);
        e.pointer_up();
        e.select_object(None).unwrap();

        let selections: Vec<_> = seen
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, EngineEvent::SelectionChanged { .. }))
            .cloned()
            .collect();
        assert_eq!(
            selections,
            vec![
                EngineEvent::SelectionChanged { selected: Some(id) },
                EngineEvent::SelectionChanged { selected: None },
            ]
        );
        assert!(e.select_object(Some(ObjectId::new())).is_err());
    }

    #[test]
    fn test_outline_only_while_not_playing() {
        let mut e = engine(120, 120);
        let id = e.add_object(logo(40.0, 40.0)).unwrap();
        e.render();
        let plain = e.frame().unwrap();

        e.select_object(Some(id)).unwrap();
        let selected = e.frame().unwrap();
        assert_ne!(plain, selected);

        e.play();
        assert_eq!(e.frame().unwrap(), plain);
    }

    #[test]
    fn test_rescale_scenario_half_size() {
        let mut e = engine(1920, 1080);
        let id = e.add_object(text(100.0, 100.0, 40.0)).unwrap();
        e.resize(960, 540).unwrap();
        let obj = e.scene().get(id).unwrap();
        assert_eq!((obj.x, obj.y), (50.0, 50.0));
        assert_eq!(obj.kind().font_size(), Some(20.0));
    }

    #[test]
    fn test_anisotropic_resize_scales_size_by_min() {
        let mut e = engine(1000, 1000);
        let id = e.add_object(logo(100.0, 200.0)).unwrap();
        e.resize(2000, 500).unwrap();
        let obj = e.scene().get(id).unwrap();
        assert_eq!((obj.x, obj.y), (200.0, 100.0));
        assert_eq!((obj.width, obj.height), (25.0, 25.0));
    }

    #[test]
    fn test_resize_emits_dimensions() {
        let mut e = engine(100, 100);
        let seen = record(&e);
        e.resize(50, 40).unwrap();
        assert_eq!(
            seen.lock().unwrap().last(),
            Some(&EngineEvent::Resized {
                width: 50,
                height: 40
            })
        );
    }

    #[test]
    fn test_remove_selected_clears_selection() {
        let mut e = engine(100, 100);
        let id = e.add_object(logo(0.0, 0.0)).unwrap();
        e.select_object(Some(id)).unwrap();
        assert!(e.remove_object(id).is_some());
        assert_eq!(e.selected(), None);
        assert!(e.remove_object(id).is_none());
    }

    #[test]
    fn test_duplicate_selects_copy_above_original() {
        let mut e = engine(200, 200);
        let id = e.add_object(logo(10.0, 10.0)).unwrap();
        let copy = e.duplicate_object(id).unwrap();
        assert_eq!(e.selected(), Some(copy));
        assert_eq!(e.scene().index_of(copy), Some(1));
        assert!(e.reorder(copy, Reorder::Back));
        assert_eq!(e.scene().index_of(copy), Some(0));
    }

    #[test]
    fn test_animated_object_depends_on_time() {
        let mut e = engine(100, 100);
        e.add_object(
            logo(20.0, 20.0).with_animation(Animation::new(AnimationKind::FadeIn, 1000.0, 0.0)),
        )
        .unwrap();
        e.set_overlays_enabled(false);
        e.seek(0.0);
        let start = e.frame().unwrap();
        e.seek(1000.0);
        let end = e.frame().unwrap();
        assert_ne!(start, end);
    }

    /// Keeps the timestamps it is given.
    struct StampRecorder(Arc<Mutex<Vec<u64>>>);

    impl StreamRecorder for StampRecorder {
        fn name(&self) -> &str {
            "stamps"
        }
        fn mime_type(&self) -> &'static str {
            "video/x-matroska"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn start(&mut self, _config: &scenecast_encoder::StreamConfig) -> SceneCastResult<()> {
            Ok(())
        }
        fn push_frame(&mut self, _frame: &Frame, timestamp_ms: u64) -> SceneCastResult<()> {
            self.0.lock().unwrap().push(timestamp_ms);
            Ok(())
        }
        fn stop(&mut self) -> SceneCastResult<Vec<u8>> {
            Ok(Vec::new())
        }
        fn abort(&mut self) {}
        fn is_running(&self) -> bool {
            true
        }
        fn stats(&self) -> scenecast_encoder::RecorderStats {
            Default::default()
        }
    }

    #[test]
    fn test_capture_stamps_slots_from_zero() {
        let e = engine(32, 32);
        let stamps = Arc::new(Mutex::new(Vec::new()));
        let mut capture = Capture::new(Box::new(StampRecorder(Arc::clone(&stamps))), 32, 32, 30);

        capture.offer_at(&e.surface, 0);
        // Early by 2 ms, then a repeat render inside the same slot.
        capture.offer_at(&e.surface, 31_000_000);
        capture.offer_at(&e.surface, 40_000_000);
        // A 100 ms stall repeats the picture for the skipped slots.
        capture.offer_at(&e.surface, 140_000_000);

        assert!(capture.error.is_none());
        assert_eq!(*stamps.lock().unwrap(), vec![0, 33, 67, 100, 133]);
    }

    #[tokio::test]
    async fn test_run_playback_stops_at_end() {
        let mut e = engine(32, 32);
        e.set_total_duration(60.0).unwrap();
        e.play();
        let cancel = CancelToken::new();
        e.run_playback(&cancel).await;
        assert!(!e.is_playing());
        assert_eq!(e.current_time_ms(), 60.0);
    }

    #[tokio::test]
    async fn test_run_playback_honors_cancel() {
        let mut e = engine(32, 32);
        e.set_total_duration(60_000.0).unwrap();
        e.play();
        let cancel = CancelToken::new();
        cancel.cancel();
        e.run_playback(&cancel).await;
        assert!(!e.is_playing());
        assert!(e.current_time_ms() < 60_000.0);
    }
}
