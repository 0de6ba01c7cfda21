//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

/// Identity of one successful model load. Bone groups are stamped with it so
/// references into an unloaded skeleton are never followed.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ModelId(pub u32);

/// Clip-playback handle issued by a [`crate::mixer::Mixer`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct HandleId(pub u32);

/// Index of a bone inside its skeleton.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BoneId(pub u32);

impl BoneId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Monotonic allocator for ModelId and HandleId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_model: u32,
    next_handle: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_model(&mut self) -> ModelId {
        let id = ModelId(self.next_model);
        self.next_model = self.next_model.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_handle(&mut self) -> HandleId {
        let id = HandleId(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        id
    }
}
