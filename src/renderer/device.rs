//! Render device boundary
//!
//! The renderer orchestrates *what* gets drawn in *which* order; the device
//! is the sink that turns that order into backend work (GL/Vulkan wrappers
//! live behind this trait and are not part of the core). The built-in
//! [`CommandRecorder`] device records the command stream, which is what the
//! tests and the headless demo inspect.

use glam::Mat4;

use crate::scene::ComponentId;

/// Normalized viewport rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Full-target viewport
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };
}

impl Default for Viewport {
    fn default() -> Self {
        Self::FULL
    }
}

/// Camera state bound before a batch of draws
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraView {
    /// Unique id of the camera component
    pub camera: ComponentId,
    /// View matrix (inverse of the camera object's world matrix)
    pub view: Mat4,
    /// Projection matrix
    pub projection: Mat4,
    /// Target viewport
    pub viewport: Viewport,
}

/// Per-draw state handed to a drawable's `draw`
#[derive(Debug)]
pub struct DrawContext<'a> {
    /// Unique id of the drawable component
    pub drawable: ComponentId,
    /// Render group bit index being drawn
    pub group: u8,
    /// World matrix of the owning object
    pub model: Mat4,
    /// Selected lights, already capped per type; empty for unlit draws
    pub lights: &'a [ComponentId],
}

/// One unit of recorded backend work
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Camera target and viewport were bound
    BindCamera(CameraView),
    /// A drawable was issued
    Draw {
        drawable: ComponentId,
        group: u8,
        model: Mat4,
        lights: Vec<ComponentId>,
    },
    /// A drawable was rendered into a light's shadow map
    ShadowCast {
        light: ComponentId,
        drawable: ComponentId,
        model: Mat4,
    },
    /// An environment recorder captured its surroundings
    EnvironmentCapture { recorder: ComponentId },
}

/// Sink for renderer output.
pub trait RenderDevice {
    /// Bind a camera's target and viewport
    fn bind_camera(&mut self, view: &CameraView);

    /// Issue one drawable
    fn draw(&mut self, drawable: ComponentId, group: u8, model: Mat4, lights: &[ComponentId]);

    /// Render one drawable into a light's shadow map
    fn draw_shadow(&mut self, light: ComponentId, drawable: ComponentId, model: Mat4);

    /// Capture an environment map
    fn capture_environment(&mut self, recorder: ComponentId);
}

/// A device that records the command stream instead of talking to a GPU.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<DrawCommand>,
}

impl CommandRecorder {
    /// Create an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded commands in issue order
    #[must_use]
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drop all recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of `Draw` commands recorded
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Draw { .. }))
            .count()
    }
}

impl RenderDevice for CommandRecorder {
    fn bind_camera(&mut self, view: &CameraView) {
        self.commands.push(DrawCommand::BindCamera(*view));
    }

    fn draw(&mut self, drawable: ComponentId, group: u8, model: Mat4, lights: &[ComponentId]) {
        self.commands.push(DrawCommand::Draw {
            drawable,
            group,
            model,
            lights: lights.to_vec(),
        });
    }

    fn draw_shadow(&mut self, light: ComponentId, drawable: ComponentId, model: Mat4) {
        self.commands.push(DrawCommand::ShadowCast {
            light,
            drawable,
            model,
        });
    }

    fn capture_environment(&mut self, recorder: ComponentId) {
        self.commands.push(DrawCommand::EnvironmentCapture { recorder });
    }
}
