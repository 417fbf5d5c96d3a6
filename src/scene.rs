//! Scene documents: a versioned wrapper around per-object reflection
//! documents, plus the world-level reflected types.
//!
//! Object-level loading stays best-effort, but a scene file that cannot be
//! read or whose root is not an object is a real error.

use std::any::Any;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use glam::Vec3;
use log::warn;
use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;

use crate::actors::{
    Actor, AmbientSoundActor, CameraActor, LightActor, MeshActor, ScriptActor, SkeletalMeshActor,
};
use crate::color::LinearColor;
use crate::doc::{self, DocObject};
use crate::factory::ObjectFactory;
use crate::object::{Object, ObjectBase, ObjectCore, ObjectRef, Reflected};
use crate::property::PropertyTable;
use crate::registry::{ReflectClass, ReflectStruct, TypeDescriptor, TypeRegistry};
use crate::resources::ResourceManager;
use crate::serializer::{serialize_object, Direction};

const SCENE_VERSION: i32 = 1;

/// Height fog parameters, persisted as a nested aggregate.
#[derive(Debug, Clone)]
pub struct FogSettings {
    pub enabled: bool,
    pub density: f32,
    pub color: LinearColor,
    pub start_distance: f32,
}

impl Default for FogSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            density: 0.02,
            color: LinearColor::new(0.5, 0.6, 0.7, 1.0),
            start_distance: 0.0,
        }
    }
}

impl Reflected for FogSettings {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl ReflectStruct for FogSettings {
    const STRUCT_NAME: &'static str = "FogSettings";

    fn register_properties(table: &mut PropertyTable) {
        table.boolean(
            "Enabled",
            |f: &FogSettings| &f.enabled,
            |f: &mut FogSettings| &mut f.enabled,
        );
        table
            .float(
                "Density",
                |f: &FogSettings| &f.density,
                |f: &mut FogSettings| &mut f.density,
            )
            .range(0.0, 1.0);
        table.color(
            "Color",
            |f: &FogSettings| &f.color,
            |f: &mut FogSettings| &mut f.color,
        );
        table.float(
            "StartDistance",
            |f: &FogSettings| &f.start_distance,
            |f: &mut FogSettings| &mut f.start_distance,
        );
    }
}

/// Per-scene simulation settings.
#[derive(Debug, Clone)]
pub struct WorldSettings {
    base: ObjectBase,
    pub gravity: Vec3,
    pub kill_z: f32,
    pub fog: FogSettings,
}

impl Default for WorldSettings {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            gravity: Vec3::new(0.0, -9.81, 0.0),
            kill_z: -1000.0,
            fog: FogSettings::default(),
        }
    }
}

impl Reflected for WorldSettings {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn base(&self) -> Option<&dyn Reflected> {
        Some(&self.base)
    }

    fn base_mut(&mut self) -> Option<&mut dyn Reflected> {
        Some(&mut self.base)
    }
}

impl Object for WorldSettings {
    fn core(&self) -> &ObjectCore {
        self.base.core()
    }

    fn core_mut(&mut self) -> &mut ObjectCore {
        self.base.core_mut()
    }

    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn as_reflected(&self) -> &dyn Reflected {
        self
    }

    fn as_reflected_mut(&mut self) -> &mut dyn Reflected {
        self
    }

    fn clone_object(&self) -> ObjectRef {
        let handle: ObjectRef = Arc::new(RwLock::new(self.clone()));
        handle
    }

    fn duplicate_sub_objects(&mut self, factory: &mut ObjectFactory) {
        self.base.duplicate_sub_objects(factory);
    }
}

impl ReflectClass for WorldSettings {
    const CLASS_NAME: &'static str = "WorldSettings";

    fn super_descriptor(registry: &mut TypeRegistry) -> Option<Arc<TypeDescriptor>> {
        Some(registry.class_of::<ObjectBase>())
    }

    fn register_properties(table: &mut PropertyTable) {
        table
            .vector3(
                "Gravity",
                |w: &WorldSettings| &w.gravity,
                |w: &mut WorldSettings| &mut w.gravity,
            )
            .category("Physics");
        table
            .float(
                "KillZ",
                |w: &WorldSettings| &w.kill_z,
                |w: &mut WorldSettings| &mut w.kill_z,
            )
            .category("Physics")
            .tooltip("Objects below this height are removed");
        table
            .aggregate(
                "Fog",
                |w: &WorldSettings| &w.fog,
                |w: &mut WorldSettings| &mut w.fog,
            )
            .category("Environment");
    }
}

/// Registers every class and aggregate the runtime ships with.
pub fn register_builtins(registry: &mut TypeRegistry) {
    registry.class_of::<ObjectBase>();
    registry.class_of::<Actor>();
    registry.class_of::<MeshActor>();
    registry.class_of::<SkeletalMeshActor>();
    registry.class_of::<LightActor>();
    registry.class_of::<CameraActor>();
    registry.class_of::<AmbientSoundActor>();
    registry.class_of::<ScriptActor>();
    registry.class_of::<WorldSettings>();
    registry.struct_of::<FogSettings>();
}

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("unable to read scene file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("unable to write scene file {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid scene document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("scene document root must be an object")]
    NotAnObject,
}

/// Objects loaded from, or destined for, one scene document.
#[derive(Default)]
pub struct Scene {
    pub objects: Vec<ObjectRef>,
}

impl Scene {
    /// Spawns and loads every recognizable object entry in the document.
    ///
    /// Entries with a missing or unregistered `Type` are skipped with a
    /// warning. The UUID counter is restored before any object spawns, so a
    /// reloaded scene reproduces the identities it was saved with.
    pub fn from_value(
        value: &Value,
        factory: &mut ObjectFactory,
        resources: &mut ResourceManager,
    ) -> Result<Self, SceneError> {
        let root = value.as_object().ok_or(SceneError::NotAnObject)?;

        if let Some(version) = doc::read_int32(root, "Version") {
            if version != SCENE_VERSION {
                warn!("scene document version {version} differs from supported {SCENE_VERSION}");
            }
        }
        if let Some(next_uuid) = root.get("NextUUID").and_then(Value::as_u64) {
            factory.set_next_uuid(next_uuid as u32);
        }

        let mut objects = Vec::new();
        for entry in root
            .get("Objects")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
        {
            let Some(entry) = entry.as_object() else {
                warn!("scene object entry is not a keyed object, skipping");
                continue;
            };
            let Some(class_name) = entry.get("Type").and_then(Value::as_str) else {
                warn!("scene object entry has no Type, skipping");
                continue;
            };
            let Some(object) = factory.spawn_by_name(class_name) else {
                warn!("scene references unknown class {class_name}, skipping");
                continue;
            };
            let mut object_doc = entry.clone();
            serialize_object(
                &mut *object.write(),
                Direction::Load,
                &mut object_doc,
                factory.registry(),
                resources,
            );
            objects.push(object);
        }
        Ok(Self { objects })
    }

    /// Writes every object under its class name, with the UUID counter
    /// checkpointed alongside.
    pub fn to_value(&self, factory: &ObjectFactory, resources: &mut ResourceManager) -> Value {
        let mut entries = Vec::with_capacity(self.objects.len());
        for object in &self.objects {
            let mut object_doc = DocObject::new();
            let mut guard = object.write();
            serialize_object(
                &mut *guard,
                Direction::Save,
                &mut object_doc,
                factory.registry(),
                resources,
            );
            object_doc.insert(
                "Type".to_string(),
                Value::String(guard.class_name().to_string()),
            );
            entries.push(Value::Object(object_doc));
        }

        let mut root = DocObject::new();
        root.insert("Version".to_string(), Value::from(SCENE_VERSION));
        root.insert("NextUUID".to_string(), Value::from(factory.peek_next_uuid()));
        root.insert("Objects".to_string(), Value::Array(entries));
        Value::Object(root)
    }

    pub fn load_file(
        path: impl AsRef<Path>,
        factory: &mut ObjectFactory,
        resources: &mut ResourceManager,
    ) -> Result<Self, SceneError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SceneError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text)?;
        Self::from_value(&value, factory, resources)
    }

    pub fn save_file(
        &self,
        path: impl AsRef<Path>,
        factory: &ObjectFactory,
        resources: &mut ResourceManager,
    ) -> Result<(), SceneError> {
        let path = path.as_ref();
        let value = self.to_value(factory, resources);
        let mut text = serde_json::to_string_pretty(&value)?;
        text.push('\n');
        fs::write(path, text).map_err(|source| SceneError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{cast, cast_mut};
    use tempfile::NamedTempFile;

    const SAMPLE: &str = r#"{
        "Version": 1,
        "NextUUID": 10,
        "Objects": [
            { "Type": "CameraActor", "Name": "MainCamera", "Fov": 90.0 },
            {
                "Type": "LightActor",
                "Name": "Sun",
                "Intensity": 2.5,
                "Position": [0.0, 5.0, 0.0],
                "Color": [1.0, 0.5, 0.0, 1.0]
            },
            { "Type": "Wormhole", "Name": "Future" }
        ]
    }"#;

    fn context() -> (ObjectFactory, ResourceManager) {
        let mut factory = ObjectFactory::new();
        register_builtins(factory.registry_mut());
        (factory, ResourceManager::new())
    }

    #[test]
    fn parse_populates_objects_and_skips_unknown_types() {
        let (mut factory, mut resources) = context();
        let value: Value = serde_json::from_str(SAMPLE).expect("sample parses");
        let scene = Scene::from_value(&value, &mut factory, &mut resources).expect("scene loads");

        assert_eq!(scene.objects.len(), 2);
        let camera_guard = scene.objects[0].read();
        assert_eq!(camera_guard.name().as_str(), "MainCamera");
        let camera = cast::<CameraActor>(camera_guard.as_reflected()).expect("camera layer");
        assert_eq!(camera.fov, 90.0);

        let light_guard = scene.objects[1].read();
        let light = cast::<LightActor>(light_guard.as_reflected()).expect("light layer");
        assert_eq!(light.intensity, 2.5);
        let actor = cast::<Actor>(light_guard.as_reflected()).expect("actor layer");
        assert_eq!(actor.position, Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(light.color, LinearColor::new(1.0, 0.5, 0.0, 1.0));
    }

    #[test]
    fn next_uuid_is_restored_before_spawning() {
        let (mut factory, mut resources) = context();
        let value: Value = serde_json::from_str(SAMPLE).expect("sample parses");
        let scene = Scene::from_value(&value, &mut factory, &mut resources).expect("scene loads");

        assert_eq!(scene.objects[0].read().uuid(), 10);
        assert_eq!(scene.objects[1].read().uuid(), 11);
        assert_eq!(factory.peek_next_uuid(), 12);
    }

    #[test]
    fn non_object_root_is_an_error() {
        let (mut factory, mut resources) = context();
        let value = Value::Array(Vec::new());
        assert!(matches!(
            Scene::from_value(&value, &mut factory, &mut resources),
            Err(SceneError::NotAnObject)
        ));
    }

    #[test]
    fn world_settings_round_trip_through_scene_document() {
        let (mut factory, mut resources) = context();
        let world = factory.spawn::<WorldSettings>();
        {
            let mut guard = world.write();
            let settings =
                cast_mut::<WorldSettings>(guard.as_reflected_mut()).expect("settings layer");
            settings.gravity = Vec3::new(0.0, -3.7, 0.0);
            settings.fog.enabled = true;
            settings.fog.density = 0.3;
        }
        let scene = Scene {
            objects: vec![world],
        };

        let value = scene.to_value(&factory, &mut resources);
        let (mut fresh_factory, mut fresh_resources) = context();
        let reloaded = Scene::from_value(&value, &mut fresh_factory, &mut fresh_resources)
            .expect("scene loads");

        let guard = reloaded.objects[0].read();
        let settings = cast::<WorldSettings>(guard.as_reflected()).expect("settings layer");
        assert_eq!(settings.gravity, Vec3::new(0.0, -3.7, 0.0));
        assert!(settings.fog.enabled);
        assert_eq!(settings.fog.density, 0.3);
        assert_eq!(settings.kill_z, -1000.0);
    }

    #[test]
    fn file_round_trip_preserves_objects() {
        let (mut factory, mut resources) = context();
        let light = factory.spawn::<LightActor>();
        {
            let mut guard = light.write();
            guard.core_mut().name = "Lamp".into();
            cast_mut::<LightActor>(guard.as_reflected_mut())
                .expect("light layer")
                .intensity = 7.5;
        }
        let scene = Scene {
            objects: vec![light],
        };

        let file = NamedTempFile::new().expect("temp file");
        scene
            .save_file(file.path(), &factory, &mut resources)
            .expect("scene saves");

        let (mut fresh_factory, mut fresh_resources) = context();
        let reloaded = Scene::load_file(file.path(), &mut fresh_factory, &mut fresh_resources)
            .expect("scene loads");
        assert_eq!(reloaded.objects.len(), 1);
        let guard = reloaded.objects[0].read();
        assert_eq!(guard.name().as_str(), "Lamp");
        assert_eq!(
            cast::<LightActor>(guard.as_reflected())
                .expect("light layer")
                .intensity,
            7.5
        );
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let (mut factory, mut resources) = context();
        let result = Scene::load_file("definitely/not/here.json", &mut factory, &mut resources);
        assert!(matches!(result, Err(SceneError::Read { .. })));
    }
}
