use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use parking_lot::RwLock;

/// Currently published volume texture.
///
/// Renderers take an `Arc` of the current texture and keep using it for the whole frame.
/// Publishing swaps the pointer, so readers see either the old or the new texture.
#[derive(Debug)]
pub struct VolumeSlot<T> {
    current: RwLock<Option<Arc<T>>>,
    generation: AtomicU64,
}

impl<T> Default for VolumeSlot<T> {
    fn default() -> Self {
        VolumeSlot {
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }
}

impl<T> VolumeSlot<T> {
    /// Empty slot, generation 0
    pub fn new() -> VolumeSlot<T> {
        VolumeSlot::default()
    }

    /// Snapshot of the published texture
    pub fn current(&self) -> Option<Arc<T>> {
        self.current.read().clone()
    }

    /// Publish new texture, returns its generation
    pub fn publish(&self, texture: T) -> u64 {
        self.publish_arc(Arc::new(texture))
    }

    pub fn publish_arc(&self, texture: Arc<T>) -> u64 {
        let mut current = self.current.write();
        *current = Some(texture);
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish unless `cancelled` returns true.
    ///
    /// `cancelled` is evaluated under the write lock, so a cancellation either
    /// comes after the publication or prevents it.
    pub fn publish_unless<F>(&self, texture: T, cancelled: F) -> Option<u64>
    where
        F: FnOnce() -> bool,
    {
        let mut current = self.current.write();
        if cancelled() {
            return None;
        }
        *current = Some(Arc::new(texture));
        Some(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Remove the published texture
    pub fn clear(&self) -> Option<Arc<T>> {
        self.current.write().take()
    }

    /// Number of publications so far
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
