//! Kestrel: a component-based real-time scene and rendering core.
//!
//! The crate is organized around a few cooperating pieces:
//!
//! - [`scene`] - objects in a generational arena, polymorphic components,
//!   versioned transform caching and render/update layers.
//! - [`renderer`] - multi-pass forward renderer with shadow and environment
//!   stages, per-type-capped light selection and an abstract render device.
//! - [`core`] - the [`Engine`](core::Engine) singleton, frame timing, run
//!   states, subsystems and typed message dispatch.
//! - [`state`] - registry-driven persistence of the whole world to a JSON
//!   document, loaded all-or-nothing.
//! - [`assets`] - reference-counted shared resources referenced weakly by
//!   components.
//!
//! # Quick start
//!
//! ```no_run
//! use kestrel::prelude::*;
//!
//! let mut engine = Engine::new("demo", std::env::args().collect());
//!
//! let mut scene = Scene::new("world");
//! let rig = scene.create_object("rig");
//! let camera = scene.attach_component(CameraComponent::new(rig)).unwrap();
//! engine.renderer_mut().bind_camera(RenderBinding::new(rig, camera));
//!
//! engine.create_scene(scene);
//! engine.run_main_loop();
//! ```

pub mod assets;
pub mod core;
pub mod renderer;
pub mod scene;
pub mod state;

/// The commonly used types in one import.
pub mod prelude {
    pub use crate::assets::{Material, Mesh, Model, ResourceHandle, Resources, WeakResourceHandle};
    pub use crate::core::{
        Command, Engine, EngineState, Message, MessageResult, MessageTarget, Subsystem,
    };
    pub use crate::renderer::{
        CameraComponent, CommandRecorder, Drawable, EnvironmentRecorder, LightKind, LightSource,
        MeshDrawable, PassKind, Projection, RenderBinding, RenderDevice, Renderer,
    };
    pub use crate::scene::{
        Component, ComponentCore, ComponentId, Layer, LayerKey, Object, ObjectKey, Scene,
        Transform,
    };
    pub use crate::state::{StateError, StateRegistry};
}
