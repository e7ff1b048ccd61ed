/// Resource cache
///
/// Indexes every texture created by a context by an optional unique key and
/// an optional scratch key.
///
/// Each resource owns one slot for its whole life. While at least one
/// `TextureRef` exists the slot only holds a weak pointer; when the last
/// reference goes away the texture is handed back to the cache, which keeps
/// it as *purgeable* if a key could still find it and destroys it otherwise.
///
/// The cache never drops a `TextureRef` itself: releasing a reference locks
/// the cache, so doing it from inside a cache method would deadlock.

use std::mem;
use std::sync::{Arc, Weak};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::resource::{ScratchKey, UniqueKey};
use crate::texture::{Texture, TextureRef};

new_key_type! {
    /// Stable handle of a cache slot
    pub struct ResourceId;
}

const SOURCE: &str = "galaxy3d::gpu::ResourceCache";

enum EntryState {
    /// At least one `TextureRef` is alive
    Referenced(Weak<Texture>),
    /// No reference left; kept alive for key lookups
    Purgeable(Box<Texture>),
}

struct CacheEntry {
    state: EntryState,
    unique_key: Option<UniqueKey>,
    scratch_key: Option<ScratchKey>,
    gpu_memory_size: u64,
}

impl CacheEntry {
    fn has_keys(&self) -> bool {
        self.unique_key.is_some() || self.scratch_key.is_some()
    }

    fn is_purgeable(&self) -> bool {
        matches!(self.state, EntryState::Purgeable(_))
    }
}

/// Key-indexed store of the textures of one context
pub struct ResourceCache {
    entries: SlotMap<ResourceId, CacheEntry>,
    unique_index: FxHashMap<UniqueKey, ResourceId>,
    /// Scratch key multimap. Uniquely-keyed resources are not fungible and
    /// are left out even when they carry a scratch key.
    scratch_index: FxHashMap<ScratchKey, Vec<ResourceId>>,
    gpu_bytes: u64,
}

impl ResourceCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            entries: SlotMap::with_key(),
            unique_index: FxHashMap::default(),
            scratch_index: FxHashMap::default(),
            gpu_bytes: 0,
        }
    }

    // ===== REGISTRATION =====

    /// Register a new texture
    ///
    /// `build` receives the slot id the texture must carry and is called
    /// exactly once.
    pub fn insert(
        &mut self,
        scratch_key: Option<ScratchKey>,
        build: impl FnOnce(ResourceId) -> Texture,
    ) -> TextureRef {
        let id = self.entries.insert(CacheEntry {
            state: EntryState::Referenced(Weak::new()),
            unique_key: None,
            scratch_key,
            gpu_memory_size: 0,
        });

        let texture = Arc::new(build(id));
        let gpu_memory_size = texture.gpu_memory_size();

        if let Some(entry) = self.entries.get_mut(id) {
            entry.state = EntryState::Referenced(Arc::downgrade(&texture));
            entry.gpu_memory_size = gpu_memory_size;
        }
        if let Some(key) = scratch_key {
            self.scratch_index.entry(key).or_default().push(id);
        }
        self.gpu_bytes += gpu_memory_size;

        crate::engine_trace!(SOURCE, "Registered resource {:?} ({} bytes, scratch key: {})",
            id, gpu_memory_size, scratch_key.is_some());

        TextureRef::from_arc(texture)
    }

    // ===== QUERIES =====

    /// Number of resources tracked, referenced and purgeable
    pub fn resource_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of resources kept alive only by a key
    pub fn purgeable_count(&self) -> usize {
        self.entries.values().filter(|e| e.is_purgeable()).count()
    }

    /// Sum of the GPU memory footprints of every tracked resource
    pub fn gpu_memory_bytes(&self) -> u64 {
        self.gpu_bytes
    }

    /// Whether the slot still exists
    pub fn contains(&self, id: ResourceId) -> bool {
        self.entries.contains_key(id)
    }

    /// Whether the slot holds a purgeable texture
    pub fn is_purgeable(&self, id: ResourceId) -> bool {
        self.entries.get(id).is_some_and(CacheEntry::is_purgeable)
    }

    pub fn unique_key(&self, id: ResourceId) -> Option<&UniqueKey> {
        self.entries.get(id).and_then(|e| e.unique_key.as_ref())
    }

    pub fn scratch_key(&self, id: ResourceId) -> Option<ScratchKey> {
        self.entries.get(id).and_then(|e| e.scratch_key)
    }

    /// Whether any resource currently answers to `key`
    pub fn has_unique_key(&self, key: &UniqueKey) -> bool {
        self.unique_index.contains_key(key)
    }

    /// Number of resources indexed under a scratch key
    pub fn scratch_count(&self, key: &ScratchKey) -> usize {
        self.scratch_index.get(key).map_or(0, Vec::len)
    }

    // ===== LOOKUP =====

    /// Reference the resource holding `key`, resurrecting it if purgeable
    pub fn find_and_ref_unique(&mut self, key: &UniqueKey) -> Option<TextureRef> {
        let id = *self.unique_index.get(key)?;
        let found = self.resurrect(id);
        if found.is_some() {
            crate::engine_trace!(SOURCE, "Unique key hit on {:?}", id);
        }
        found
    }

    /// Reference a purgeable resource with a matching scratch key
    ///
    /// Referenced resources are in use and never handed out twice.
    pub fn find_and_ref_scratch(&mut self, key: &ScratchKey) -> Option<TextureRef> {
        let id = self
            .scratch_index
            .get(key)?
            .iter()
            .copied()
            .find(|id| self.is_purgeable(*id))?;
        crate::engine_trace!(SOURCE, "Scratch key hit on {:?}", id);
        self.resurrect(id)
    }

    fn resurrect(&mut self, id: ResourceId) -> Option<TextureRef> {
        let entry = self.entries.get_mut(id)?;
        match mem::replace(&mut entry.state, EntryState::Referenced(Weak::new())) {
            EntryState::Purgeable(texture) => {
                let texture = Arc::new(*texture);
                entry.state = EntryState::Referenced(Arc::downgrade(&texture));
                Some(TextureRef::from_arc(texture))
            }
            EntryState::Referenced(weak) => {
                // Upgrade can fail while the last reference is on its way back
                let texture = weak.upgrade();
                entry.state = EntryState::Referenced(weak);
                texture.map(TextureRef::from_arc)
            }
        }
    }

    // ===== KEY MANAGEMENT =====

    /// Give `key` to a resource
    ///
    /// A resource that already answers to `key` loses it. The resource's own
    /// previous unique key, if different, is dropped. Returns `false` if the
    /// slot does not exist.
    pub fn change_unique_key(&mut self, id: ResourceId, key: UniqueKey) -> bool {
        if !self.entries.contains_key(id) {
            return false;
        }

        if let Some(&holder) = self.unique_index.get(&key) {
            if holder == id {
                return true;
            }
            crate::engine_trace!(SOURCE, "Unique key moves from {:?} to {:?}", holder, id);
            self.remove_unique_key(holder);
        }

        self.detach_unique_key(id);
        if let Some(scratch_key) = self.scratch_key(id) {
            self.unindex_scratch(&scratch_key, id);
        }

        self.unique_index.insert(key.clone(), id);
        if let Some(entry) = self.entries.get_mut(id) {
            entry.unique_key = Some(key);
        }
        true
    }

    /// Drop the unique key of a resource
    ///
    /// Returns whether a key was removed. Removing an absent key is a no-op.
    pub fn remove_unique_key(&mut self, id: ResourceId) -> bool {
        if !self.detach_unique_key(id) {
            return false;
        }
        if let Some(scratch_key) = self.scratch_key(id) {
            self.scratch_index.entry(scratch_key).or_default().push(id);
        }
        self.release_if_unreachable(id);
        true
    }

    /// Drop the scratch key of a resource
    ///
    /// Returns whether a key was removed. Removing an absent key is a no-op.
    pub fn remove_scratch_key(&mut self, id: ResourceId) -> bool {
        let Some(key) = self.entries.get_mut(id).and_then(|e| e.scratch_key.take()) else {
            return false;
        };
        self.unindex_scratch(&key, id);
        self.release_if_unreachable(id);
        true
    }

    /// Drop both keys of a resource
    pub fn remove_keys(&mut self, id: ResourceId) {
        self.remove_unique_key(id);
        self.remove_scratch_key(id);
    }

    fn detach_unique_key(&mut self, id: ResourceId) -> bool {
        let Some(key) = self.entries.get_mut(id).and_then(|e| e.unique_key.take()) else {
            return false;
        };
        self.unique_index.remove(&key);
        true
    }

    fn unindex_scratch(&mut self, key: &ScratchKey, id: ResourceId) {
        if let Some(ids) = self.scratch_index.get_mut(key) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.scratch_index.remove(key);
            }
        }
    }

    // ===== RELEASE =====

    /// Take back a texture whose last reference was dropped
    ///
    /// Keyed textures stay in the cache as purgeable, the rest are destroyed.
    pub fn notify_ref_count_zero(&mut self, texture: Texture) {
        let id = texture.resource_id();
        let Some(entry) = self.entries.get_mut(id) else {
            return;
        };

        if entry.has_keys() {
            entry.state = EntryState::Purgeable(Box::new(texture));
            crate::engine_trace!(SOURCE, "Resource {:?} is now purgeable", id);
        } else {
            self.release_entry(id);
            crate::engine_trace!(SOURCE, "Resource {:?} released", id);
        }
    }

    /// Destroy every purgeable resource, returning how many were dropped
    pub fn purge_unreferenced(&mut self) -> usize {
        let purgeable: Vec<ResourceId> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_purgeable())
            .map(|(id, _)| id)
            .collect();

        for id in &purgeable {
            self.detach_unique_key(*id);
            if let Some(key) = self.entries.get_mut(*id).and_then(|e| e.scratch_key.take()) {
                self.unindex_scratch(&key, *id);
            }
            self.release_entry(*id);
        }

        if !purgeable.is_empty() {
            crate::engine_debug!(SOURCE, "Purged {} unreferenced resources", purgeable.len());
        }
        purgeable.len()
    }

    /// Destroy a purgeable resource that no key can reach any more
    fn release_if_unreachable(&mut self, id: ResourceId) {
        if self.entries.get(id).is_some_and(|e| e.is_purgeable() && !e.has_keys()) {
            self.release_entry(id);
            crate::engine_trace!(SOURCE, "Purgeable resource {:?} lost its keys and was released", id);
        }
    }

    fn release_entry(&mut self, id: ResourceId) {
        if let Some(entry) = self.entries.remove(id) {
            self.gpu_bytes = self.gpu_bytes.saturating_sub(entry.gpu_memory_size);
        }
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "resource_cache_tests.rs"]
mod tests;
