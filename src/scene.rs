//! Voxel scene surface the controller draws into.
//!
//! `SceneController` is passed explicitly to whoever needs save/undo/redo
//! (the interaction controller, keyboard shortcuts, menus); there is no
//! ambient global scene.

use std::collections::{HashMap, VecDeque};

use glam::{IVec3, Vec3};

pub const MAX_HISTORY: usize = 100;

pub trait SceneController {
    fn add_voxel(&mut self, position: Vec3, color: u32, size: f32);
    /// Removes voxels within `radius`; true when anything was removed.
    fn erase_voxel(&mut self, position: Vec3, radius: f32) -> bool;
    /// Pushes an undo snapshot of the current scene.
    fn save_state(&mut self);
    fn undo(&mut self) -> bool;
    fn redo(&mut self) -> bool;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voxel {
    pub color: u32,
    pub size: f32,
}

type Snapshot = HashMap<IVec3, Voxel>;

/// In-memory voxel set keyed by quantized grid coordinates.
pub struct VoxelScene {
    cell: f32,
    voxels: Snapshot,
    undo: VecDeque<Snapshot>,
    redo: Vec<Snapshot>,
}

impl VoxelScene {
    pub fn new(cell: f32) -> Self {
        Self {
            cell,
            voxels: HashMap::new(),
            undo: VecDeque::new(),
            redo: Vec::new(),
        }
    }

    pub fn key(&self, position: Vec3) -> IVec3 {
        (position / self.cell).round().as_ivec3()
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn contains(&self, position: Vec3) -> bool {
        self.voxels.contains_key(&self.key(position))
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn clear(&mut self) {
        self.voxels.clear();
    }
}

impl SceneController for VoxelScene {
    fn add_voxel(&mut self, position: Vec3, color: u32, size: f32) {
        let key = self.key(position);
        self.voxels.insert(key, Voxel { color, size });
    }

    fn erase_voxel(&mut self, position: Vec3, radius: f32) -> bool {
        let cell = self.cell;
        let before = self.voxels.len();
        self.voxels
            .retain(|key, _| (key.as_vec3() * cell).distance(position) > radius);
        self.voxels.len() != before
    }

    fn save_state(&mut self) {
        if self.undo.len() == MAX_HISTORY {
            self.undo.pop_front();
        }
        self.undo.push_back(self.voxels.clone());
        self.redo.clear();
    }

    fn undo(&mut self) -> bool {
        match self.undo.pop_back() {
            Some(snapshot) => {
                let current = std::mem::replace(&mut self.voxels, snapshot);
                self.redo.push(current);
                true
            }
            None => false,
        }
    }

    fn redo(&mut self) -> bool {
        match self.redo.pop() {
            Some(snapshot) => {
                let current = std::mem::replace(&mut self.voxels, snapshot);
                self.undo.push_back(current);
                true
            }
            None => false,
        }
    }
}
