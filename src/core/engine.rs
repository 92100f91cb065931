//! Engine singleton and main loop
//!
//! The engine owns the clock, the subsystems, the current and shared scenes,
//! the renderer and the render device. Exactly one engine may be alive per
//! process; constructing a second while the first lives is a programming
//! error and panics. Everything else on the engine reports failure through
//! `Result` or silent skips.

use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use crate::core::messages::{Message, MessageResult};
use crate::core::subsystem::Subsystem;
use crate::core::time::Time;
use crate::renderer::{CommandRecorder, RenderDevice, Renderer};
use crate::scene::Scene;
use crate::state::{StateError, StateRegistry};

/// Fixed timestep driving `fixed_update`, in seconds
pub const FIXED_STEP: f32 = 1.0 / 60.0;

/// Process-wide single-instance guard
static ENGINE_ALIVE: AtomicBool = AtomicBool::new(false);

/// Run state of the engine.
///
/// Subsystems update in every state; the state controls what the scenes and
/// the renderer do each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Scenes update with real delta time and every frame renders
    Running,
    /// Scenes update with a delta of zero; rendering continues
    ZeroDelta,
    /// Scene updates are skipped; rendering continues
    RenderOnly,
    /// Scene updates and rendering are both skipped
    Frozen,
}

/// The engine.
///
/// # Panics
///
/// `Engine::new` panics if another engine is alive in the process. Dropping
/// the engine releases the guard.
pub struct Engine {
    project_name: String,
    args: Vec<String>,
    state: EngineState,
    delta_scale: f32,
    total_time: f64,
    time: Time,
    fixed_accumulator: f32,
    advance_frame: bool,
    exit: bool,
    subsystems: Vec<Box<dyn Subsystem>>,
    scene: Option<Scene>,
    shared_scene: Option<Scene>,
    renderer: Renderer,
    device: Box<dyn RenderDevice>,
}

impl Engine {
    /// Create the engine.
    ///
    /// The default render device is a [`CommandRecorder`]; swap in a real
    /// backend with [`Engine::set_device`].
    #[must_use]
    pub fn new(project_name: impl Into<String>, args: Vec<String>) -> Self {
        assert!(
            !ENGINE_ALIVE.swap(true, Ordering::SeqCst),
            "only one Engine may be alive per process"
        );
        let project_name = project_name.into();
        log::info!("engine created for project '{project_name}'");
        Self {
            project_name,
            args,
            state: EngineState::Running,
            delta_scale: 1.0,
            total_time: 0.0,
            time: Time::new(),
            fixed_accumulator: 0.0,
            advance_frame: false,
            exit: false,
            subsystems: Vec::new(),
            scene: None,
            shared_scene: None,
            renderer: Renderer::new(),
            device: Box::new(CommandRecorder::new()),
        }
    }

    /// Project name given at construction
    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Command-line arguments given at construction
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    // -------------------------------------------------------------------------
    // Run state
    // -------------------------------------------------------------------------

    /// Current run state
    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Change the run state
    pub fn set_state(&mut self, state: EngineState) {
        if self.state != state {
            log::debug!("engine state {:?} -> {:?}", self.state, state);
            self.state = state;
        }
    }

    /// Delta-time multiplier applied to every tick
    #[must_use]
    pub fn delta_scale(&self) -> f32 {
        self.delta_scale
    }

    /// Set the delta-time multiplier
    pub fn set_delta_scale(&mut self, scale: f32) {
        self.delta_scale = scale;
    }

    /// Scaled time accumulated over all ticks, in seconds
    #[must_use]
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Request the main loop to stop at the current frame boundary
    pub fn exit(&mut self) {
        self.exit = true;
    }

    /// While paused (`RenderOnly` or `Frozen`), let exactly one following
    /// tick run a full frame. Consumed by that tick.
    pub fn advance_frame(&mut self) {
        self.advance_frame = true;
    }

    // -------------------------------------------------------------------------
    // Scenes, renderer, subsystems
    // -------------------------------------------------------------------------

    /// Install a new current scene, dropping the previous one whole
    pub fn create_scene(&mut self, scene: Scene) {
        log::info!("scene '{}' installed", scene.type_tag());
        self.scene = Some(scene);
    }

    /// Current scene
    #[must_use]
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// Current scene, mutable
    pub fn scene_mut(&mut self) -> Option<&mut Scene> {
        self.scene.as_mut()
    }

    /// Install a shared scene (persistent UI and the like), dropping the
    /// previous one whole
    pub fn set_shared_scene(&mut self, scene: Scene) {
        self.shared_scene = Some(scene);
    }

    /// Shared scene
    #[must_use]
    pub fn shared_scene(&self) -> Option<&Scene> {
        self.shared_scene.as_ref()
    }

    /// Shared scene, mutable
    pub fn shared_scene_mut(&mut self) -> Option<&mut Scene> {
        self.shared_scene.as_mut()
    }

    /// The renderer
    #[must_use]
    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// The renderer, mutable (for binding work)
    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// Replace the render device
    pub fn set_device(&mut self, device: Box<dyn RenderDevice>) {
        self.device = device;
    }

    /// Append a subsystem; update order is insertion order
    pub fn add_subsystem(&mut self, subsystem: impl Subsystem + 'static) {
        self.subsystems.push(Box::new(subsystem));
    }

    /// Look up a subsystem by id
    #[must_use]
    pub fn subsystem(&self, id: &str) -> Option<&dyn Subsystem> {
        self.subsystems
            .iter()
            .find(|s| s.id() == id)
            .map(Box::as_ref)
    }

    /// Remove a subsystem by id; `false` if no subsystem matched
    pub fn remove_subsystem(&mut self, id: &str) -> bool {
        let before = self.subsystems.len();
        self.subsystems.retain(|s| s.id() != id);
        self.subsystems.len() != before
    }

    /// Deliver a message to subsystems, then the current scene.
    pub fn broadcast(&mut self, message: &Message) -> MessageResult {
        let mut result = MessageResult::Unhandled;
        if message.target.includes_subsystems() {
            for subsystem in &mut self.subsystems {
                result = result.combine(subsystem.receive_message(message));
            }
        }
        if let Some(scene) = &mut self.scene {
            result = result.combine(scene.send_message(message));
        }
        result
    }

    // -------------------------------------------------------------------------
    // Persistence
    // -------------------------------------------------------------------------

    /// Serialize the current and shared scenes into a state document
    pub fn save_state(&self, registry: &StateRegistry) -> Result<Value, StateError> {
        let scene = self.scene.as_ref().ok_or(StateError::MissingField {
            node: "state",
            field: "scene",
        })?;
        crate::state::save_state(registry, scene, self.shared_scene.as_ref())
    }

    /// Rebuild scenes from a state document and swap them in.
    ///
    /// On error the live scenes are left untouched.
    pub fn load_state(&mut self, registry: &StateRegistry, doc: &Value) -> Result<(), StateError> {
        let loaded = crate::state::load_state(registry, doc)?;
        self.scene = Some(loaded.scene);
        self.shared_scene = loaded.shared_scene;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // The loop
    // -------------------------------------------------------------------------

    /// Run one frame with the given raw delta.
    ///
    /// Exposed separately from the loop so frames can be driven manually
    /// (tools, tests, lockstep simulations).
    pub fn tick(&mut self, raw_delta: f32) {
        let delta = match self.state {
            EngineState::ZeroDelta => 0.0,
            _ => raw_delta * self.delta_scale,
        };
        self.total_time += f64::from(delta);

        let step_scenes = match self.state {
            EngineState::Running | EngineState::ZeroDelta => true,
            EngineState::RenderOnly | EngineState::Frozen => self.advance_frame,
        };
        let render = self.state != EngineState::Frozen || self.advance_frame;
        self.advance_frame = false;

        // Subsystems run in every state; pausing only affects the scenes.
        for subsystem in &mut self.subsystems {
            subsystem.update(delta);
        }

        if step_scenes {
            if let Some(scene) = &mut self.shared_scene {
                scene.update(delta);
            }
            if let Some(scene) = &mut self.scene {
                scene.update(delta);
            }

            self.fixed_accumulator += delta;
            while self.fixed_accumulator >= FIXED_STEP {
                if let Some(scene) = &mut self.shared_scene {
                    scene.fixed_update(FIXED_STEP);
                }
                if let Some(scene) = &mut self.scene {
                    scene.fixed_update(FIXED_STEP);
                }
                self.fixed_accumulator -= FIXED_STEP;
            }
        }

        if render {
            if let Some(scene) = self.shared_scene.as_ref() {
                self.renderer.draw(scene, self.device.as_mut());
            }
            if let Some(scene) = self.scene.as_ref() {
                self.renderer.draw(scene, self.device.as_mut());
            }
        }
    }

    /// Run frames until [`Engine::exit`] is called
    pub fn run_main_loop(&mut self) {
        self.run_with(|_| {});
    }

    /// Run frames until exit, invoking `frame` after each tick.
    ///
    /// The callback is where a driver without its own subsystem hooks in;
    /// calling `exit` from it stops the loop at the frame boundary.
    pub fn run_with(&mut self, mut frame: impl FnMut(&mut Engine)) {
        log::info!("'{}' main loop starting", self.project_name);
        while !self.exit {
            self.time.update();
            self.tick(self.time.delta_seconds());
            frame(&mut *self);
        }
        log::info!("'{}' main loop stopped", self.project_name);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        ENGINE_ALIVE.store(false, Ordering::SeqCst);
        log::info!("engine for '{}' dropped", self.project_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::messages::{Command, MessageTarget};
    use crate::scene::{Component, ComponentCore, ObjectKey};
    use std::any::Any;
    use std::sync::{Arc, Mutex, MutexGuard};

    // The engine is a process singleton; tests sharing the process must not
    // overlap. A poisoned lock just means another test panicked.
    static ENGINE_LOCK: Mutex<()> = Mutex::new(());

    fn exclusive() -> MutexGuard<'static, ()> {
        ENGINE_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[derive(Default)]
    struct Probe {
        updates: u32,
        fixed_updates: u32,
        last_delta: f32,
    }

    struct TickProbe {
        core: ComponentCore,
        probe: Arc<Mutex<Probe>>,
    }

    impl TickProbe {
        fn new(owner: ObjectKey, probe: Arc<Mutex<Probe>>) -> Self {
            Self {
                core: ComponentCore::new(owner, "probe"),
                probe,
            }
        }
    }

    impl Component for TickProbe {
        fn core(&self) -> &ComponentCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut ComponentCore {
            &mut self.core
        }

        fn type_tag(&self) -> &'static str {
            "TickProbe"
        }

        fn update(&mut self, delta: f32) {
            let mut probe = self.probe.lock().unwrap();
            probe.updates += 1;
            probe.last_delta = delta;
        }

        fn fixed_update(&mut self, _step: f32) {
            self.probe.lock().unwrap().fixed_updates += 1;
        }

        fn clone_onto(&self, new_owner: ObjectKey) -> Box<dyn Component> {
            Box::new(Self {
                core: self.core.clone_onto(new_owner),
                probe: Arc::clone(&self.probe),
            })
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn engine_with_probe() -> (Engine, Arc<Mutex<Probe>>) {
        let mut engine = Engine::new("test", Vec::new());
        let probe = Arc::new(Mutex::new(Probe::default()));
        let mut scene = Scene::new("test");
        let obj = scene.create_object("probe");
        scene
            .attach_component(TickProbe::new(obj, Arc::clone(&probe)))
            .unwrap();
        engine.create_scene(scene);
        (engine, probe)
    }

    #[test]
    fn test_second_engine_panics() {
        let _guard = exclusive();
        let _engine = Engine::new("first", Vec::new());

        let result = std::panic::catch_unwind(|| Engine::new("second", Vec::new()));
        assert!(result.is_err());
    }

    #[test]
    fn test_drop_releases_singleton() {
        let _guard = exclusive();
        drop(Engine::new("one", Vec::new()));
        drop(Engine::new("two", Vec::new()));
    }

    #[test]
    fn test_running_updates_with_scaled_delta() {
        let _guard = exclusive();
        let (mut engine, probe) = engine_with_probe();
        engine.set_delta_scale(2.0);

        engine.tick(0.25);

        let probe = probe.lock().unwrap();
        assert_eq!(probe.updates, 1);
        assert!((probe.last_delta - 0.5).abs() < f32::EPSILON);
        assert!((engine.total_time() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_delta_updates_with_zero() {
        let _guard = exclusive();
        let (mut engine, probe) = engine_with_probe();
        engine.set_state(EngineState::ZeroDelta);

        engine.tick(0.25);

        let probe = probe.lock().unwrap();
        assert_eq!(probe.updates, 1, "components still update under ZeroDelta");
        assert_eq!(probe.last_delta, 0.0);
        assert_eq!(engine.total_time(), 0.0);
    }

    #[test]
    fn test_render_only_skips_scene_updates() {
        let _guard = exclusive();
        let (mut engine, probe) = engine_with_probe();
        engine.set_state(EngineState::RenderOnly);

        engine.tick(0.25);
        assert_eq!(probe.lock().unwrap().updates, 0);

        // One frame advances on request, then pausing resumes.
        engine.advance_frame();
        engine.tick(0.25);
        assert_eq!(probe.lock().unwrap().updates, 1);
        engine.tick(0.25);
        assert_eq!(probe.lock().unwrap().updates, 1);
    }

    #[test]
    fn test_frozen_skips_everything() {
        let _guard = exclusive();
        let (mut engine, probe) = engine_with_probe();
        engine.set_state(EngineState::Frozen);

        engine.tick(0.25);
        assert_eq!(probe.lock().unwrap().updates, 0);

        engine.advance_frame();
        engine.tick(0.25);
        assert_eq!(probe.lock().unwrap().updates, 1);
    }

    #[test]
    fn test_fixed_step_accumulator() {
        let _guard = exclusive();
        let (mut engine, probe) = engine_with_probe();

        engine.tick(FIXED_STEP * 2.5);
        assert_eq!(probe.lock().unwrap().fixed_updates, 2);

        // The 0.5-step remainder carries over.
        engine.tick(FIXED_STEP * 0.6);
        assert_eq!(probe.lock().unwrap().fixed_updates, 3);
    }

    #[test]
    fn test_subsystems_update_in_every_state() {
        let _guard = exclusive();

        struct Pump {
            ticks: Arc<Mutex<u32>>,
        }
        impl Subsystem for Pump {
            fn id(&self) -> &str {
                "pump"
            }
            fn update(&mut self, _delta: f32) {
                *self.ticks.lock().unwrap() += 1;
            }
        }

        let ticks = Arc::new(Mutex::new(0));
        let mut engine = Engine::new("test", Vec::new());
        engine.add_subsystem(Pump {
            ticks: Arc::clone(&ticks),
        });

        for state in [
            EngineState::Running,
            EngineState::ZeroDelta,
            EngineState::RenderOnly,
            EngineState::Frozen,
        ] {
            engine.set_state(state);
            engine.tick(0.016);
        }
        assert_eq!(*ticks.lock().unwrap(), 4);
    }

    #[test]
    fn test_subsystem_lookup_and_removal() {
        let _guard = exclusive();

        struct Named(&'static str);
        impl Subsystem for Named {
            fn id(&self) -> &str {
                self.0
            }
        }

        let mut engine = Engine::new("test", Vec::new());
        engine.add_subsystem(Named("audio"));
        engine.add_subsystem(Named("physics"));

        assert!(engine.subsystem("audio").is_some());
        assert!(engine.remove_subsystem("audio"));
        assert!(engine.subsystem("audio").is_none());
        assert!(!engine.remove_subsystem("audio"));
    }

    #[test]
    fn test_broadcast_reaches_subsystems_then_scene() {
        let _guard = exclusive();

        struct Sink {
            heard: Arc<Mutex<bool>>,
        }
        impl Subsystem for Sink {
            fn id(&self) -> &str {
                "sink"
            }
            fn receive_message(&mut self, message: &Message) -> MessageResult {
                if matches!(&message.command, Command::Signal(s) if s == "ping") {
                    *self.heard.lock().unwrap() = true;
                    MessageResult::Handled
                } else {
                    MessageResult::Unhandled
                }
            }
        }

        let heard = Arc::new(Mutex::new(false));
        let mut engine = Engine::new("test", Vec::new());
        engine.add_subsystem(Sink {
            heard: Arc::clone(&heard),
        });

        let mut scene = Scene::new("test");
        let obj = scene.create_object("player");
        engine.create_scene(scene);

        let result = engine.broadcast(&Message::broadcast(Command::Signal("ping".into())));
        assert!(result.is_handled());
        assert!(*heard.lock().unwrap());

        // Object commands route through to the scene graph.
        engine.broadcast(
            &Message::new(MessageTarget::Objects, Command::SetActive(false)).filtered("player"),
        );
        assert!(!engine.scene().unwrap().object(obj).unwrap().is_active());
    }

    #[test]
    fn test_run_with_exits_at_frame_boundary() {
        let _guard = exclusive();
        let (mut engine, probe) = engine_with_probe();

        let mut frames = 0;
        engine.run_with(|engine| {
            frames += 1;
            if frames == 3 {
                engine.exit();
            }
        });

        assert_eq!(frames, 3);
        assert_eq!(probe.lock().unwrap().updates, 3);
    }

    #[test]
    fn test_scene_replacement_drops_previous_whole() {
        let _guard = exclusive();
        let (mut engine, _probe) = engine_with_probe();
        assert!(engine.scene().unwrap().find_object("probe").is_some());

        engine.create_scene(Scene::new("next"));
        assert_eq!(engine.scene().unwrap().type_tag(), "next");
        assert!(engine.scene().unwrap().find_object("probe").is_none());
    }
}
