/// Holds the live editing surface once it has mounted.
///
/// The cell is empty until [`EditorHandle::attach`] runs, which is the only
/// way to put a surface in. Everything else borrows through it, so toolbar
/// commands always act on the surface that is currently mounted.
#[derive(Debug)]
pub struct EditorHandle<T> {
    surface: Option<T>,
}

impl<T> Default for EditorHandle<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EditorHandle<T> {
    pub const fn new() -> Self {
        Self { surface: None }
    }

    /// Install a freshly mounted surface, returning the one it replaces.
    pub fn attach(&mut self, surface: T) -> Option<T> {
        self.surface.replace(surface)
    }

    pub fn detach(&mut self) -> Option<T> {
        self.surface.take()
    }

    pub const fn get(&self) -> Option<&T> {
        self.surface.as_ref()
    }

    pub const fn get_mut(&mut self) -> Option<&mut T> {
        self.surface.as_mut()
    }

    /// Run `f` against the surface if one is attached.
    pub fn with_mut<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.surface.as_mut().map(f)
    }

    pub const fn is_attached(&self) -> bool {
        self.surface.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_detached() {
        let mut handle: EditorHandle<String> = EditorHandle::new();
        assert!(!handle.is_attached());
        assert_eq!(handle.with_mut(|s| s.len()), None);
    }

    #[test]
    fn test_attach_replaces_previous_surface() {
        let mut handle = EditorHandle::new();
        assert_eq!(handle.attach("first".to_string()), None);
        assert_eq!(handle.attach("second".to_string()), Some("first".to_string()));
        assert_eq!(handle.get().map(String::as_str), Some("second"));
    }

    #[test]
    fn test_with_mut_reaches_live_surface() {
        let mut handle = EditorHandle::new();
        handle.attach(String::from("a"));
        handle.with_mut(|s| s.push('b'));
        assert_eq!(handle.detach(), Some("ab".to_string()));
        assert!(!handle.is_attached());
    }
}
