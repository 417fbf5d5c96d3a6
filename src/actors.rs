//! Reflected classes shipped with the runtime.
//!
//! Each class embeds its parent, delegates identity to the root layer, and
//! registers its own properties on top of the inherited list. The fix-up
//! hooks follow the duplication contract: base hook first, then deep copies
//! of owned sub-objects, leaving non-owning references aliased.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use parking_lot::RwLock;

use crate::color::LinearColor;
use crate::factory::ObjectFactory;
use crate::object::{Object, ObjectBase, ObjectCore, ObjectRef, Reflected, WeakObjectRef};
use crate::property::PropertyTable;
use crate::registry::{ReflectClass, TypeDescriptor, TypeRegistry};
use crate::resources::{AssetHandle, AssetKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum CameraProjection {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum LightMobility {
    #[default]
    Static,
    Stationary,
    Movable,
}

/// Placeable object with a transform and an owned component list.
///
/// Components are runtime state: they duplicate with the actor but are not
/// part of its persisted document. The attach target is a non-owning
/// reference and survives duplication unchanged.
#[derive(Debug, Clone)]
pub struct Actor {
    base: ObjectBase,
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
    pub visible: bool,
    components: Vec<ObjectRef>,
    attach_target: Option<WeakObjectRef>,
}

impl Default for Actor {
    fn default() -> Self {
        Self {
            base: ObjectBase::default(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            visible: true,
            components: Vec::new(),
            attach_target: None,
        }
    }
}

impl Actor {
    pub fn add_component(&mut self, component: ObjectRef) {
        self.components.push(component);
    }

    pub fn components(&self) -> &[ObjectRef] {
        &self.components
    }

    pub fn set_attach_target(&mut self, target: Option<WeakObjectRef>) {
        self.attach_target = target;
    }

    pub fn attach_target(&self) -> Option<&WeakObjectRef> {
        self.attach_target.as_ref()
    }
}

impl Reflected for Actor {
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

impl Object for Actor {
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
        self.components = self
            .components
            .iter()
            .map(|component| factory.duplicate(component))
            .collect();
    }
}

impl ReflectClass for Actor {
    const CLASS_NAME: &'static str = "Actor";

    fn super_descriptor(registry: &mut TypeRegistry) -> Option<Arc<TypeDescriptor>> {
        Some(registry.class_of::<ObjectBase>())
    }

    fn register_properties(table: &mut PropertyTable) {
        table
            .vector3("Position", |a: &Actor| &a.position, |a: &mut Actor| &mut a.position)
            .category("Transform");
        table
            .vector3("Rotation", |a: &Actor| &a.rotation, |a: &mut Actor| &mut a.rotation)
            .category("Transform")
            .tooltip("Euler angles in degrees");
        table
            .vector3("Scale", |a: &Actor| &a.scale, |a: &mut Actor| &mut a.scale)
            .category("Transform");
        table
            .boolean("Visible", |a: &Actor| &a.visible, |a: &mut Actor| &mut a.visible)
            .category("Rendering");
    }
}

/// Actor rendering a static mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshActor {
    base: Actor,
    pub mesh: Option<AssetHandle>,
    pub material: Option<AssetHandle>,
    pub tint: LinearColor,
}

impl Reflected for MeshActor {
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

impl Object for MeshActor {
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

impl ReflectClass for MeshActor {
    const CLASS_NAME: &'static str = "MeshActor";

    fn super_descriptor(registry: &mut TypeRegistry) -> Option<Arc<TypeDescriptor>> {
        Some(registry.class_of::<Actor>())
    }

    fn register_properties(table: &mut PropertyTable) {
        table
            .asset(
                "Mesh",
                AssetKind::StaticMesh,
                |m: &MeshActor| &m.mesh,
                |m: &mut MeshActor| &mut m.mesh,
            )
            .category("Rendering");
        table
            .asset(
                "Material",
                AssetKind::Material,
                |m: &MeshActor| &m.material,
                |m: &mut MeshActor| &mut m.material,
            )
            .category("Rendering");
        table
            .color("Tint", |m: &MeshActor| &m.tint, |m: &mut MeshActor| &mut m.tint)
            .category("Rendering");
    }
}

/// Actor rendering a skinned mesh.
#[derive(Debug, Clone)]
pub struct SkeletalMeshActor {
    base: Actor,
    pub skin: Option<AssetHandle>,
    pub anim_rate: f32,
}

impl Default for SkeletalMeshActor {
    fn default() -> Self {
        Self {
            base: Actor::default(),
            skin: None,
            anim_rate: 1.0,
        }
    }
}

impl Reflected for SkeletalMeshActor {
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

impl Object for SkeletalMeshActor {
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

impl ReflectClass for SkeletalMeshActor {
    const CLASS_NAME: &'static str = "SkeletalMeshActor";

    fn super_descriptor(registry: &mut TypeRegistry) -> Option<Arc<TypeDescriptor>> {
        Some(registry.class_of::<Actor>())
    }

    fn register_properties(table: &mut PropertyTable) {
        table
            .asset(
                "Skin",
                AssetKind::SkeletalMesh,
                |s: &SkeletalMeshActor| &s.skin,
                |s: &mut SkeletalMeshActor| &mut s.skin,
            )
            .category("Rendering");
        table
            .float(
                "AnimRate",
                |s: &SkeletalMeshActor| &s.anim_rate,
                |s: &mut SkeletalMeshActor| &mut s.anim_rate,
            )
            .category("Animation")
            .range(0.0, 4.0);
    }
}

/// Point light source.
#[derive(Debug, Clone)]
pub struct LightActor {
    base: Actor,
    pub color: LinearColor,
    pub intensity: f32,
    pub enabled: bool,
    pub falloff: [f32; 4],
    pub cookie: Option<AssetHandle>,
    pub mobility: LightMobility,
}

impl Default for LightActor {
    fn default() -> Self {
        Self {
            base: Actor::default(),
            color: LinearColor::WHITE,
            intensity: 1.0,
            enabled: true,
            falloff: [1.0, 1.0, 0.0, 0.0],
            cookie: None,
            mobility: LightMobility::Static,
        }
    }
}

impl Reflected for LightActor {
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

impl Object for LightActor {
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

impl ReflectClass for LightActor {
    const CLASS_NAME: &'static str = "LightActor";

    fn super_descriptor(registry: &mut TypeRegistry) -> Option<Arc<TypeDescriptor>> {
        Some(registry.class_of::<Actor>())
    }

    fn register_properties(table: &mut PropertyTable) {
        table
            .color("Color", |l: &LightActor| &l.color, |l: &mut LightActor| &mut l.color)
            .category("Light");
        table
            .float(
                "Intensity",
                |l: &LightActor| &l.intensity,
                |l: &mut LightActor| &mut l.intensity,
            )
            .category("Light")
            .range(0.0, 100.0);
        table
            .boolean("Enabled", |l: &LightActor| &l.enabled, |l: &mut LightActor| &mut l.enabled)
            .category("Light");
        table
            .curve(
                "Falloff",
                |l: &LightActor| &l.falloff,
                |l: &mut LightActor| &mut l.falloff,
            )
            .category("Light")
            .tooltip("Attenuation over normalized distance");
        table
            .asset(
                "Cookie",
                AssetKind::Texture,
                |l: &LightActor| &l.cookie,
                |l: &mut LightActor| &mut l.cookie,
            )
            .category("Light");
        table
            .enumeration(
                "Mobility",
                |l: &LightActor| &l.mobility,
                |l: &mut LightActor| &mut l.mobility,
            )
            .category("Light");
    }
}

/// Viewpoint actor.
#[derive(Debug, Clone)]
pub struct CameraActor {
    base: Actor,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub projection: CameraProjection,
}

impl Default for CameraActor {
    fn default() -> Self {
        Self {
            base: Actor::default(),
            fov: 45.0,
            near: 0.1,
            far: 100.0,
            projection: CameraProjection::Perspective,
        }
    }
}

impl Reflected for CameraActor {
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

impl Object for CameraActor {
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

impl ReflectClass for CameraActor {
    const CLASS_NAME: &'static str = "CameraActor";

    fn super_descriptor(registry: &mut TypeRegistry) -> Option<Arc<TypeDescriptor>> {
        Some(registry.class_of::<Actor>())
    }

    fn register_properties(table: &mut PropertyTable) {
        table
            .float("Fov", |c: &CameraActor| &c.fov, |c: &mut CameraActor| &mut c.fov)
            .category("Camera")
            .range(1.0, 179.0);
        table
            .float("Near", |c: &CameraActor| &c.near, |c: &mut CameraActor| &mut c.near)
            .category("Camera");
        table
            .float("Far", |c: &CameraActor| &c.far, |c: &mut CameraActor| &mut c.far)
            .category("Camera");
        table
            .enumeration(
                "Projection",
                |c: &CameraActor| &c.projection,
                |c: &mut CameraActor| &mut c.projection,
            )
            .category("Camera");
    }
}

/// Looping environmental sound emitter.
#[derive(Debug, Clone)]
pub struct AmbientSoundActor {
    base: Actor,
    pub clips: Vec<Option<AssetHandle>>,
    pub volume: f32,
    pub looping: bool,
}

impl Default for AmbientSoundActor {
    fn default() -> Self {
        Self {
            base: Actor::default(),
            clips: Vec::new(),
            volume: 1.0,
            looping: true,
        }
    }
}

impl Reflected for AmbientSoundActor {
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

impl Object for AmbientSoundActor {
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

impl ReflectClass for AmbientSoundActor {
    const CLASS_NAME: &'static str = "AmbientSoundActor";

    fn super_descriptor(registry: &mut TypeRegistry) -> Option<Arc<TypeDescriptor>> {
        Some(registry.class_of::<Actor>())
    }

    fn register_properties(table: &mut PropertyTable) {
        table
            .array_sound(
                "Clips",
                |s: &AmbientSoundActor| &s.clips,
                |s: &mut AmbientSoundActor| &mut s.clips,
            )
            .category("Audio");
        table
            .float(
                "Volume",
                |s: &AmbientSoundActor| &s.volume,
                |s: &mut AmbientSoundActor| &mut s.volume,
            )
            .category("Audio")
            .range(0.0, 1.0);
        table
            .boolean(
                "Looping",
                |s: &AmbientSoundActor| &s.looping,
                |s: &mut AmbientSoundActor| &mut s.looping,
            )
            .category("Audio");
    }
}

/// Actor driven by an embedded script, with script-visible state tables.
#[derive(Debug, Clone, Default)]
pub struct ScriptActor {
    base: Actor,
    pub script: String,
    pub counters: HashMap<String, i32>,
    pub pins: HashMap<i32, String>,
    pub lines: Vec<String>,
}

impl Reflected for ScriptActor {
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

impl Object for ScriptActor {
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

impl ReflectClass for ScriptActor {
    const CLASS_NAME: &'static str = "ScriptActor";

    fn super_descriptor(registry: &mut TypeRegistry) -> Option<Arc<TypeDescriptor>> {
        Some(registry.class_of::<Actor>())
    }

    fn register_properties(table: &mut PropertyTable) {
        table
            .string("Script", |s: &ScriptActor| &s.script, |s: &mut ScriptActor| &mut s.script)
            .category("Scripting")
            .tooltip("Script file path inside the project");
        table
            .map_string_int32(
                "Counters",
                |s: &ScriptActor| &s.counters,
                |s: &mut ScriptActor| &mut s.counters,
            )
            .category("Scripting");
        table
            .map_int32_string(
                "Pins",
                |s: &ScriptActor| &s.pins,
                |s: &mut ScriptActor| &mut s.pins,
            )
            .category("Scripting");
        table
            .array_string(
                "Lines",
                |s: &ScriptActor| &s.lines,
                |s: &mut ScriptActor| &mut s.lines,
            )
            .category("Scripting");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{cast, is_a};

    fn registry_with_actors() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.class_of::<MeshActor>();
        registry.class_of::<LightActor>();
        registry
    }

    #[test]
    fn ancestry_walks_to_the_root() {
        let mut registry = registry_with_actors();
        let mesh = registry.class_of::<MeshActor>();
        let actor = registry.class_of::<Actor>();
        let object = registry.class_of::<ObjectBase>();

        assert!(mesh.is_child_of(&object));
        assert!(mesh.is_child_of(&actor));
        assert!(mesh.is_child_of(&mesh));
        assert!(!actor.is_child_of(&mesh));
    }

    #[test]
    fn structural_cast_agrees_with_descriptor_ancestry() {
        let mesh = MeshActor::default();
        assert!(is_a::<Actor>(&mesh));
        assert!(is_a::<ObjectBase>(&mesh));
        assert!(cast::<Actor>(&mesh).is_some());

        let plain = Actor::default();
        assert!(cast::<MeshActor>(&plain).is_none());
    }

    #[test]
    fn inherited_properties_precede_declared_ones() {
        let mut registry = registry_with_actors();
        let descriptor = registry.class_of::<MeshActor>();
        let names: Vec<&str> = descriptor.properties().iter().map(|p| p.name).collect();
        assert_eq!(
            names,
            vec!["Name", "Position", "Rotation", "Scale", "Visible", "Mesh", "Material", "Tint"]
        );

        let instance = MeshActor::default();
        let dynamic = instance.class(&registry).expect("registered class");
        assert!(Arc::ptr_eq(&dynamic, &descriptor));
    }

    #[test]
    fn inherited_accessor_reaches_derived_instance() {
        let mut registry = registry_with_actors();
        let descriptor = registry.class_of::<MeshActor>();
        let position = descriptor
            .properties()
            .iter()
            .find(|p| p.name == "Position")
            .expect("inherited property");

        let mut mesh = MeshActor::default();
        match &position.storage {
            crate::property::PropertyStorage::Vector3(access) => {
                *access.get_mut(&mut mesh).expect("layer found") = Vec3::new(7.0, 8.0, 9.0);
            }
            _ => panic!("unexpected storage"),
        }
        assert_eq!(mesh.base.position, Vec3::new(7.0, 8.0, 9.0));
    }

    #[test]
    fn duplicate_deep_copies_components_and_keeps_back_references() {
        let mut factory = ObjectFactory::new();
        factory.class_of::<ObjectBase>();
        factory.class_of::<LightActor>();
        factory.class_of::<Actor>();

        let anchor = factory.spawn::<ObjectBase>();
        let light = factory.spawn::<LightActor>();
        let actor = factory.spawn::<Actor>();
        {
            let mut guard = actor.write();
            let layer = cast_mut_actor(&mut *guard);
            layer.add_component(Arc::clone(&light));
            layer.set_attach_target(Some(Arc::downgrade(&anchor)));
        }

        let copy = factory.duplicate(&actor);
        let copy_guard = copy.read();
        let copied = cast::<Actor>(copy_guard.as_reflected()).expect("actor layer");

        assert_eq!(copied.components().len(), 1);
        assert!(!Arc::ptr_eq(&copied.components()[0], &light));
        assert_ne!(
            copied.components()[0].read().uuid(),
            light.read().uuid()
        );
        let target = copied
            .attach_target()
            .and_then(WeakObjectRef::upgrade)
            .expect("live back-reference");
        assert!(Arc::ptr_eq(&target, &anchor));
    }

    fn cast_mut_actor<'a>(object: &'a mut dyn Object) -> &'a mut Actor {
        crate::object::cast_mut::<Actor>(object.as_reflected_mut()).expect("actor layer")
    }

    #[test]
    fn component_copies_mutate_independently() {
        let mut factory = ObjectFactory::new();
        factory.class_of::<Actor>();
        factory.class_of::<LightActor>();

        let light = factory.spawn::<LightActor>();
        let actor = factory.spawn::<Actor>();
        cast_mut_actor(&mut *actor.write()).add_component(Arc::clone(&light));

        let copy = factory.duplicate(&actor);
        {
            let copy_guard = copy.read();
            let copied = cast::<Actor>(copy_guard.as_reflected()).expect("actor layer");
            let mut component = copied.components()[0].write();
            crate::object::cast_mut::<LightActor>(component.as_reflected_mut())
                .expect("light layer")
                .intensity = 5.0;
        }
        let original_guard = light.read();
        let original = cast::<LightActor>(original_guard.as_reflected()).expect("light layer");
        assert_eq!(original.intensity, 1.0);
    }

    #[test]
    fn defaults_match_authoring_expectations() {
        let actor = Actor::default();
        assert_eq!(actor.scale, Vec3::ONE);
        assert!(actor.visible);

        let camera = CameraActor::default();
        assert_eq!(camera.fov, 45.0);
        assert_eq!(camera.projection, CameraProjection::Perspective);

        let sound = AmbientSoundActor::default();
        assert_eq!(sound.volume, 1.0);
        assert!(sound.looping);
    }
}
