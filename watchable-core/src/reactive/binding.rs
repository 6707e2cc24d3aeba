//! Two-way bindings.
//!
//! A [`Binding`] pairs a getter with a setter so UI code can read and write
//! a value without holding the cell that stores it.

use std::sync::Arc;

/// A getter/setter pair over some stored value.
///
/// Clones share the same endpoints.
pub struct Binding<T> {
    get: Arc<dyn Fn() -> T + Send + Sync>,
    set: Arc<dyn Fn(T) + Send + Sync>,
}

impl<T: 'static> Binding<T> {
    /// Create a binding from a getter and a setter.
    pub fn new<G, S>(get: G, set: S) -> Self
    where
        G: Fn() -> T + Send + Sync + 'static,
        S: Fn(T) + Send + Sync + 'static,
    {
        Self {
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// A binding that always reads `value` and ignores writes.
    ///
    /// Handy for previews and tests.
    pub fn constant(value: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        Self::new(move || value.clone(), |_| {})
    }

    /// Read the current value.
    pub fn get(&self) -> T {
        (self.get)()
    }

    /// Write a new value through the binding.
    pub fn set(&self, value: T) {
        (self.set)(value)
    }

    /// Read, transform and write back.
    ///
    /// This is two separate operations on the underlying storage, not an
    /// atomic update.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let current = self.get();
        self.set(f(&current));
    }

    /// Project this binding onto another type.
    ///
    /// `into` converts on read, `from` converts on write.
    pub fn map<U, I, F>(&self, into: I, from: F) -> Binding<U>
    where
        U: 'static,
        I: Fn(T) -> U + Send + Sync + 'static,
        F: Fn(U) -> T + Send + Sync + 'static,
    {
        let get = Arc::clone(&self.get);
        let set = Arc::clone(&self.set);
        Binding::new(move || into(get()), move |value| set(from(value)))
    }
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        Self {
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Binding").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn stored(initial: i32) -> (Arc<Mutex<i32>>, Binding<i32>) {
        let slot = Arc::new(Mutex::new(initial));
        let reader = slot.clone();
        let writer = slot.clone();
        let binding = Binding::new(move || *reader.lock(), move |v| *writer.lock() = v);
        (slot, binding)
    }

    #[test]
    fn binding_reads_and_writes() {
        let (slot, binding) = stored(1);

        assert_eq!(binding.get(), 1);
        binding.set(9);
        assert_eq!(*slot.lock(), 9);
    }

    #[test]
    fn binding_update() {
        let (_slot, binding) = stored(10);
        binding.update(|v| v * 3);
        assert_eq!(binding.get(), 30);
    }

    #[test]
    fn constant_ignores_writes() {
        let binding = Binding::constant("fixed".to_string());
        binding.set("other".to_string());
        assert_eq!(binding.get(), "fixed");
    }

    #[test]
    fn map_projects_both_directions() {
        let (slot, binding) = stored(42);
        let text = binding.map(|v| v.to_string(), |s: String| s.parse().unwrap_or(0));

        assert_eq!(text.get(), "42");
        text.set("7".to_string());
        assert_eq!(*slot.lock(), 7);
    }

    #[test]
    fn clones_share_endpoints() {
        let (_slot, binding) = stored(0);
        let other = binding.clone();

        other.set(5);
        assert_eq!(binding.get(), 5);
    }
}
