//! Headless demo: builds a small world, runs the engine for a fixed number
//! of frames against a logging render device, then saves the world to disk
//! and loads it back through the state registry.
//!
//! Run with `RUST_LOG=debug` to see the per-frame command stream.

use std::error::Error;

use glam::{Mat4, Quat, Vec3, Vec4};
use serde_json::{json, Value};

use kestrel::prelude::*;
use kestrel::renderer::CameraView;
use kestrel::state;

/// A render device that logs the command stream instead of drawing.
struct LoggingDevice;

impl RenderDevice for LoggingDevice {
    fn bind_camera(&mut self, view: &CameraView) {
        log::debug!("bind camera {} viewport {:?}", view.camera, view.viewport);
    }

    fn draw(&mut self, drawable: ComponentId, group: u8, _model: Mat4, lights: &[ComponentId]) {
        log::debug!("draw {drawable} group {group} with {} lights", lights.len());
    }

    fn draw_shadow(&mut self, light: ComponentId, drawable: ComponentId, _model: Mat4) {
        log::debug!("shadow: light {light} <- drawable {drawable}");
    }

    fn capture_environment(&mut self, recorder: ComponentId) {
        log::debug!("environment capture {recorder}");
    }
}

// -----------------------------------------------------------------------------
// Persistence registrations
// -----------------------------------------------------------------------------

fn world_construct(_: &Value) -> Result<Scene, StateError> {
    Ok(Scene::new("world"))
}

fn world_save(_: &Scene) -> Result<Value, StateError> {
    Ok(json!({}))
}

fn plain_layer_load(scene: &mut Scene, id: &str, _: &Value) -> Result<LayerKey, StateError> {
    Ok(scene.create_layer(Layer::new(id, "plain")))
}

fn plain_layer_save(_: &Layer) -> Result<Value, StateError> {
    Ok(json!({}))
}

fn wrong_data(component: &str) -> StateError {
    log::error!("component data does not match its tag '{component}'");
    StateError::WrongFieldType {
        node: "component",
        field: "data",
    }
}

fn camera_load(scene: &mut Scene, owner: ObjectKey, data: &Value) -> Result<(), StateError> {
    let mask = data.get("mask").and_then(Value::as_u64).unwrap_or(u64::from(u32::MAX)) as u32;
    scene.attach_component(CameraComponent::new(owner).with_mask(mask));
    Ok(())
}

fn camera_save(component: &dyn Component) -> Result<Value, StateError> {
    let camera = component
        .as_any()
        .downcast_ref::<CameraComponent>()
        .ok_or_else(|| wrong_data(CameraComponent::TYPE_TAG))?;
    Ok(json!({ "mask": camera.mask() }))
}

fn light_load(scene: &mut Scene, owner: ObjectKey, data: &Value) -> Result<(), StateError> {
    let kind = match data.get("kind").and_then(Value::as_str) {
        Some("point") => LightKind::Point,
        Some("directional") => LightKind::Directional,
        Some("spot") => LightKind::Spot,
        _ => {
            return Err(StateError::MissingField {
                node: "component",
                field: "kind",
            })
        }
    };
    let range = data.get("range").and_then(Value::as_f64).unwrap_or(10.0) as f32;
    let mut light = LightSource::new(owner, kind).with_range(range);
    if data.get("shadows").and_then(Value::as_bool).unwrap_or(false) {
        light = light.with_shadows();
    }
    scene.attach_component(light);
    Ok(())
}

fn light_save(component: &dyn Component) -> Result<Value, StateError> {
    let light = component
        .as_any()
        .downcast_ref::<LightSource>()
        .ok_or_else(|| wrong_data(LightSource::TYPE_TAG))?;
    let kind = match light.kind() {
        LightKind::Point => "point",
        LightKind::Directional => "directional",
        LightKind::Spot => "spot",
    };
    Ok(json!({
        "kind": kind,
        "range": light.range(),
        "shadows": light.casts_shadows(),
    }))
}

fn drawable_load(scene: &mut Scene, owner: ObjectKey, data: &Value) -> Result<(), StateError> {
    let group = data.get("group").and_then(Value::as_u64).unwrap_or(0) as u8;
    let lit = data.get("lit").and_then(Value::as_bool).unwrap_or(true);
    // Model references are resolved by the application after load; until
    // then the drawable is invalid and the renderer skips it.
    scene.attach_component(
        MeshDrawable::new(owner, WeakResourceHandle::expired())
            .with_group(group)
            .with_lighting(lit),
    );
    Ok(())
}

fn drawable_save(component: &dyn Component) -> Result<Value, StateError> {
    let drawable = component
        .as_any()
        .downcast_ref::<MeshDrawable>()
        .ok_or_else(|| wrong_data(MeshDrawable::TYPE_TAG))?;
    Ok(json!({
        "group": drawable.render_group(),
        "lit": drawable.receives_lights(),
    }))
}

fn build_registry() -> Result<StateRegistry, StateError> {
    let mut registry = StateRegistry::new();
    registry.register_scene("world", world_construct, world_save)?;
    registry.register_layer("plain", plain_layer_load, plain_layer_save)?;
    registry.register_component(CameraComponent::TYPE_TAG, camera_load, camera_save)?;
    registry.register_component(LightSource::TYPE_TAG, light_load, light_save)?;
    registry.register_component(MeshDrawable::TYPE_TAG, drawable_load, drawable_save)?;
    Ok(registry)
}

// -----------------------------------------------------------------------------
// World setup
// -----------------------------------------------------------------------------

fn build_world(resources: &Resources, engine: &mut Engine) -> ObjectKey {
    let mut scene = Scene::new("world");

    let world_layer = scene.create_layer(Layer::new("world", "plain"));
    let hud = scene.create_layer(Layer::new("hud", "plain"));
    if let Some(layer) = scene.layer_mut(hud) {
        layer.bind_other_layer(world_layer);
    }

    let rig = scene.create_object("camera-rig");
    if let Some(object) = scene.object_mut(rig) {
        object.transform_mut().set_position(Vec3::new(0.0, 2.0, 8.0));
    }
    let camera = scene
        .attach_component(CameraComponent::new(rig))
        .expect("fresh object");

    let sun_key = scene.create_object("sun");
    let sun = scene
        .attach_component(
            LightSource::new(sun_key, LightKind::Directional).with_shadows(),
        )
        .expect("fresh object");

    let model = resources.get_weak::<Model>("cube").expect("seeded");
    let mut props = Vec::new();
    for (i, x) in [-3.0f32, 0.0, 3.0].into_iter().enumerate() {
        let key = scene.create_object(&format!("prop-{i}"));
        if let Some(object) = scene.object_mut(key) {
            object.transform_mut().set_position(Vec3::new(x, 0.0, 0.0));
        }
        let drawable = scene
            .attach_component(MeshDrawable::new(key, model.clone()))
            .expect("fresh object");
        props.push((key, drawable));
    }

    let spinner = scene.find_object("prop-1").expect("just created");

    let renderer = engine.renderer_mut();
    renderer.bind_camera(RenderBinding::new(rig, camera));
    renderer.bind_light(RenderBinding::new(sun_key, sun));
    for (key, drawable) in props {
        renderer.bind_drawable(RenderBinding::new(key, drawable));
    }

    engine.create_scene(scene);
    spinner
}

fn run() -> Result<(), Box<dyn Error>> {
    let registry = build_registry()?;

    let mut resources = Resources::new();
    let mesh = resources.insert("cube", Mesh::new("cube", 24, 36).with_bounding_radius(1.0));
    let material = resources.insert("gray", Material::new("gray", Vec4::splat(0.6)));
    resources.insert("cube", Model::new(mesh, material));

    let mut engine = Engine::new("kestrel-demo", std::env::args().collect());
    engine.set_device(Box::new(LoggingDevice));
    let spinner = build_world(&resources, &mut engine);

    let mut frames = 0u32;
    engine.run_with(|engine| {
        frames += 1;
        if let Some(scene) = engine.scene_mut() {
            if let Some(object) = scene.object_mut(spinner) {
                let spun = object.transform().rotation() * Quat::from_rotation_y(0.02);
                object.transform_mut().set_rotation(spun);
            }
        }
        if frames >= 120 {
            engine.exit();
        }
    });
    log::info!("ran {frames} frames, total time {:.3}s", engine.total_time());

    let doc = engine.save_state(&registry)?;
    let path = std::env::temp_dir().join("kestrel-demo-state.json");
    state::save_to_file(&doc, &path)?;
    log::info!("state saved to {}", path.display());

    engine.load_state(&registry, &state::load_from_file(&path)?)?;
    let scene = engine.scene().ok_or("no scene after load")?;
    log::info!(
        "state loaded back: scene '{}' with {} roots",
        scene.type_tag(),
        scene.roots().len()
    );

    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        log::error!("demo failed: {err}");
        std::process::exit(1);
    }
}
