use marker_tracking_core::VisualHandleId;

/// Source of renderables for newly tracked spatial markers.
///
/// Called with the registry lock held: implementations must not call back
/// into the registry.
pub trait VisualAllocator {
    /// Return a handle scaled to `size_m`, made visible and bound to `identity`.
    fn acquire(&self, identity: &str, size_m: f32) -> Option<VisualHandleId>;
}

/// Allocator for hosts that render nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoVisuals;

impl VisualAllocator for NoVisuals {
    fn acquire(&self, _identity: &str, _size_m: f32) -> Option<VisualHandleId> {
        None
    }
}

impl<T: VisualAllocator + ?Sized> VisualAllocator for &T {
    fn acquire(&self, identity: &str, size_m: f32) -> Option<VisualHandleId> {
        (**self).acquire(identity, size_m)
    }
}

impl<T: VisualAllocator + ?Sized> VisualAllocator for std::sync::Arc<T> {
    fn acquire(&self, identity: &str, size_m: f32) -> Option<VisualHandleId> {
        (**self).acquire(identity, size_m)
    }
}
