//! Object model and reflection core for the Crystal runtime, rewritten in
//! Rust.
//!
//! The crate provides the type registry, the per-class property tables, the
//! document serializer driven by those tables, and the two-stage object
//! duplication protocol.  Rendering, audio and editor surfaces are
//! intentionally kept outside of the crate; they consume reflected objects
//! through the serializer and factory without knowing any property list.

pub mod actors;
pub mod color;
pub mod doc;
pub mod factory;
pub mod name;
pub mod object;
pub mod property;
pub mod registry;
pub mod resources;
pub mod scene;
pub mod serializer;

pub use actors::{
    Actor, AmbientSoundActor, CameraActor, CameraProjection, LightActor, LightMobility, MeshActor,
    ScriptActor, SkeletalMeshActor,
};
pub use color::LinearColor;
pub use factory::ObjectFactory;
pub use name::Name;
pub use object::{
    cast, cast_mut, is_a, Object, ObjectBase, ObjectCore, ObjectRef, Reflected, WeakObjectRef,
};
pub use property::{PropertyDescriptor, PropertyMeta, PropertyTable, TypeTag};
pub use registry::{ReflectClass, ReflectStruct, TypeDescriptor, TypeRegistry};
pub use resources::{Asset, AssetHandle, AssetKind, ResourceManager};
pub use scene::{register_builtins, FogSettings, Scene, SceneError, WorldSettings};
pub use serializer::{serialize_object, Direction};
