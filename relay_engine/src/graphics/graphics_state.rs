/// Graphics subsystem state, owned by the render thread.
///
/// Holds render entities in a SlotMap so keys carried by commands stay
/// valid until their own entity is destroyed, and resolve to nothing
/// afterwards. Changed entities are tracked in a dirty set that the render
/// loop takes once per frame to upload only what moved.

use bitflags::bitflags;
use glam::{Vec3, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use crate::dispatch::{ApplyOutcome, Subsystem, Timestamp};
use crate::error::{Error, Result};
use super::graphics_command::GraphicsCommand;

new_key_type! {
    /// Stable key for a render entity.
    ///
    /// A key becomes stale once its entity is destroyed, even if the slot is
    /// later reused by another entity.
    pub struct RenderEntityKey;
}

bitflags! {
    /// Render entity flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntityFlags: u32 {
        const VISIBLE        = 1 << 0;
        const CAST_SHADOW    = 1 << 1;
        const RECEIVE_SHADOW = 1 << 2;
    }
}

/// Creation parameters for a render entity
#[derive(Debug, Clone)]
pub struct RenderEntityDesc {
    pub position: Vec3,
    pub scale: Vec3,
    pub texture: Option<String>,
    pub tint: Vec4,
    pub flags: EntityFlags,
}

impl Default for RenderEntityDesc {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            scale: Vec3::ONE,
            texture: None,
            tint: Vec4::ONE,
            flags: EntityFlags::VISIBLE,
        }
    }
}

/// A drawable entity
#[derive(Debug, Clone)]
pub struct RenderEntity {
    position: Vec3,
    scale: Vec3,
    texture: Option<String>,
    tint: Vec4,
    flags: EntityFlags,
}

impl RenderEntity {
    fn from_desc(desc: RenderEntityDesc) -> Self {
        Self {
            position: desc.position,
            scale: desc.scale,
            texture: desc.texture,
            tint: desc.tint,
            flags: desc.flags,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn texture(&self) -> Option<&str> {
        self.texture.as_deref()
    }

    pub fn tint(&self) -> Vec4 {
        self.tint
    }

    pub fn flags(&self) -> EntityFlags {
        self.flags
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(EntityFlags::VISIBLE)
    }
}

/// Point light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub position: Vec3,
    /// RGB, components in [0, 1]
    pub color: Vec3,
    pub intensity: f32,
}

/// Camera placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub eye: Vec3,
    pub target: Vec3,
}

impl Default for CameraState {
    fn default() -> Self {
        Self { eye: Vec3::new(0.0, 0.0, 10.0), target: Vec3::ZERO }
    }
}

/// Render-thread state mutated by GraphicsCommand
pub struct GraphicsState {
    entities: SlotMap<RenderEntityKey, RenderEntity>,
    /// Entities changed since the last take_dirty()
    dirty: FxHashSet<RenderEntityKey>,
    /// Texture names known to the renderer
    textures: FxHashSet<String>,
    lights: FxHashMap<String, Light>,
    camera: CameraState,
    clear_color: Vec4,
    frame: u64,
}

impl GraphicsState {
    pub fn new() -> Self {
        Self {
            entities: SlotMap::with_key(),
            dirty: FxHashSet::default(),
            textures: FxHashSet::default(),
            lights: FxHashMap::default(),
            camera: CameraState::default(),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            frame: 0,
        }
    }

    // ===== OWNING-THREAD API =====

    /// Create an entity and return its key for producers to target
    pub fn spawn_entity(&mut self, desc: RenderEntityDesc) -> RenderEntityKey {
        let key = self.entities.insert(RenderEntity::from_desc(desc));
        self.dirty.insert(key);
        key
    }

    /// Make a texture name available to SetTexture
    pub fn register_texture(&mut self, name: &str) {
        self.textures.insert(name.to_string());
    }

    pub fn has_texture(&self, name: &str) -> bool {
        self.textures.contains(name)
    }

    pub fn entity(&self, key: RenderEntityKey) -> Option<&RenderEntity> {
        self.entities.get(key)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Keys of entities with the VISIBLE flag
    pub fn visible_entities(&self) -> impl Iterator<Item = RenderEntityKey> + '_ {
        self.entities
            .iter()
            .filter(|(_, entity)| entity.is_visible())
            .map(|(key, _)| key)
    }

    /// Take the set of entities changed since the last call
    pub fn take_dirty(&mut self) -> FxHashSet<RenderEntityKey> {
        std::mem::take(&mut self.dirty)
    }

    pub fn light(&self, name: &str) -> Option<&Light> {
        self.lights.get(name)
    }

    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    pub fn camera(&self) -> CameraState {
        self.camera
    }

    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    /// Start a new frame and return its number (the first frame is 1)
    pub fn begin_frame(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    fn entity_mut(&mut self, key: RenderEntityKey) -> Option<&mut RenderEntity> {
        let entity = self.entities.get_mut(key)?;
        self.dirty.insert(key);
        Some(entity)
    }

    fn update_entity(
        &mut self,
        key: RenderEntityKey,
        update: impl FnOnce(&mut RenderEntity),
    ) -> ApplyOutcome {
        match self.entity_mut(key) {
            Some(entity) => {
                update(entity);
                ApplyOutcome::Applied
            }
            None => ApplyOutcome::Stale,
        }
    }
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem for GraphicsState {
    type Command = GraphicsCommand;
    const NAME: &'static str = "relay::GraphicsManager";

    fn apply(&mut self, command: GraphicsCommand, _now: Timestamp) -> Result<ApplyOutcome> {
        let outcome = match command {
            GraphicsCommand::SetTexture { target, texture } => {
                if !self.entities.contains_key(target) {
                    return Ok(ApplyOutcome::Stale);
                }
                if !self.textures.contains(&texture) {
                    return Err(Error::InvalidResource(
                        format!("texture '{}' is not registered", texture)
                    ));
                }
                self.update_entity(target, |e| e.texture = Some(texture))
            }
            GraphicsCommand::SetPosition { target, position } => {
                self.update_entity(target, |e| e.position = position)
            }
            GraphicsCommand::SetScale { target, scale } => {
                self.update_entity(target, |e| e.scale = scale)
            }
            GraphicsCommand::SetTint { target, tint } => {
                self.update_entity(target, |e| e.tint = tint)
            }
            GraphicsCommand::SetVisible { targets, visible } => {
                let mut touched = 0;
                for target in targets {
                    let outcome = self.update_entity(target, |e| {
                        e.flags.set(EntityFlags::VISIBLE, visible)
                    });
                    if outcome == ApplyOutcome::Applied {
                        touched += 1;
                    }
                }
                if touched > 0 { ApplyOutcome::Applied } else { ApplyOutcome::Stale }
            }
            GraphicsCommand::DestroyEntity { target } => {
                self.dirty.remove(&target);
                match self.entities.remove(target) {
                    Some(_) => ApplyOutcome::Applied,
                    None => ApplyOutcome::Stale,
                }
            }
            GraphicsCommand::AddLight { name, light } => {
                if self.lights.insert(name.clone(), light).is_some() {
                    crate::engine_debug!(Self::NAME, "Light '{}' replaced", name);
                }
                ApplyOutcome::Applied
            }
            GraphicsCommand::RemoveLight { name } => match self.lights.remove(&name) {
                Some(_) => ApplyOutcome::Applied,
                None => ApplyOutcome::Stale,
            },
            GraphicsCommand::SetClearColor { color } => {
                self.clear_color = color;
                ApplyOutcome::Applied
            }
            GraphicsCommand::SetCamera { eye, target } => {
                self.camera = CameraState { eye, target };
                ApplyOutcome::Applied
            }
        };
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "graphics_state_tests.rs"]
mod tests;
