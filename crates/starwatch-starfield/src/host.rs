//! The host display the starfield mounts into.

use starwatch_render::{RenderError, RenderSurface, SurfaceSize};

/// Callback invoked with the new size whenever the host display resizes.
pub type ResizeCallback = Box<dyn FnMut(SurfaceSize)>;

/// Identifies a registered resize listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A display that can host one render surface and report resizes.
pub trait HostDisplay {
    type Surface: RenderSurface + 'static;

    /// Allocate a render surface and attach it to the display.
    fn create_surface(&mut self, size: SurfaceSize) -> Result<Self::Surface, RenderError>;

    /// Detach a surface previously returned by `create_surface`.
    fn detach_surface(&mut self, surface: Self::Surface);

    fn add_resize_listener(&mut self, listener: ResizeCallback) -> ListenerId;

    /// Returns `false` if the listener was not registered.
    fn remove_resize_listener(&mut self, id: ListenerId) -> bool;
}

/// Registry of resize listeners for [`HostDisplay`] implementations.
#[derive(Default)]
pub struct ResizeListeners {
    next_id: u64,
    listeners: Vec<(ListenerId, ResizeCallback)>,
}

impl ResizeListeners {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: ResizeCallback) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Invoke every listener with `size`. Returns how many were called.
    pub fn notify(&mut self, size: SurfaceSize) -> usize {
        for (_, listener) in &mut self.listeners {
            listener(size);
        }
        self.listeners.len()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_notify_calls_every_listener() {
        let calls = Rc::new(Cell::new(0));
        let mut listeners = ResizeListeners::new();
        for _ in 0..2 {
            let calls = calls.clone();
            listeners.add(Box::new(move |_| calls.set(calls.get() + 1)));
        }
        assert_eq!(listeners.notify(SurfaceSize::new(10, 10)), 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_removed_listener_is_not_called() {
        let last = Rc::new(Cell::new(None));
        let mut listeners = ResizeListeners::new();
        let id = {
            let last = last.clone();
            listeners.add(Box::new(move |size| last.set(Some(size))))
        };
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        assert_eq!(listeners.notify(SurfaceSize::new(3, 4)), 0);
        assert_eq!(last.get(), None);
        assert!(listeners.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        let mut listeners = ResizeListeners::new();
        let a = listeners.add(Box::new(|_| {}));
        let b = listeners.add(Box::new(|_| {}));
        assert_ne!(a, b);
        assert_eq!(listeners.len(), 2);
    }
}
