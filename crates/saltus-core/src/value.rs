//! Dynamically typed attribute values.
//!
//! Events carry a named bag of attributes whose types are chosen by
//! the models exchanging them. [`Value`] is the object-safe trait
//! those payloads are boxed behind; [`Attributes`] is the ordered
//! name-to-value map attached to each event.

use indexmap::IndexMap;
use std::any::Any;
use std::fmt;

/// A dynamically typed value carried on an event attribute.
///
/// Implemented automatically for every `Clone + Debug + Send + 'static`
/// type, so models attach plain Rust values and consumers recover them
/// with `downcast_ref` on the trait object or [`Attributes::get_as`].
pub trait Value: Any + fmt::Debug + Send {
    /// Clone into a fresh boxed value.
    fn clone_boxed(&self) -> Box<dyn Value>;

    /// Upcast to [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;
}

impl<T> Value for T
where
    T: Any + Clone + fmt::Debug + Send,
{
    fn clone_boxed(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Clone for Box<dyn Value> {
    fn clone(&self) -> Self {
        // Deref past the box: the blanket impl also matches `Box<dyn Value>`
        // itself, and resolving there would recurse back into this `clone`.
        (**self).clone_boxed()
    }
}

impl dyn Value {
    /// Downcast to a concrete type by reference.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Named attributes attached to an event.
///
/// Preserves insertion order, which keeps iteration deterministic
/// across runs. Setting a name twice replaces the earlier value in
/// place.
#[derive(Clone, Debug, Default)]
pub struct Attributes {
    entries: IndexMap<String, Box<dyn Value>>,
}

impl Attributes {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `name`, replacing any existing attribute.
    pub fn set(&mut self, name: impl Into<String>, value: impl Value) {
        self.entries.insert(name.into(), Box::new(value));
    }

    /// Insert an already boxed value under `name`.
    pub fn set_boxed(&mut self, name: impl Into<String>, value: Box<dyn Value>) {
        self.entries.insert(name.into(), value);
    }

    /// Look up an attribute by name.
    pub fn get(&self, name: &str) -> Option<&dyn Value> {
        self.entries.get(name).map(|v| v.as_ref())
    }

    /// Typed lookup. `None` when the attribute is missing or holds a
    /// different type.
    pub fn get_as<T: Any>(&self, name: &str) -> Option<&T> {
        self.get(name).and_then(|v| v.downcast_ref::<T>())
    }

    /// Whether an attribute with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_and_get_typed() {
        let mut attrs = Attributes::new();
        attrs.set("count", 7u64);
        attrs.set("label", "pulse".to_string());

        assert_eq!(attrs.get_as::<u64>("count"), Some(&7));
        assert_eq!(attrs.get_as::<String>("label"), Some(&"pulse".to_string()));
        assert_eq!(attrs.get_as::<i32>("count"), None, "wrong type");
        assert_eq!(attrs.get_as::<u64>("missing"), None);
    }

    #[test]
    fn set_replaces_in_place() {
        let mut attrs = Attributes::new();
        attrs.set("a", 1u64);
        attrs.set("b", 2u64);
        attrs.set("a", 10u64);

        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs.get_as::<u64>("a"), Some(&10));
        let order: Vec<&str> = attrs.iter().map(|(k, _)| k).collect();
        assert_eq!(order, vec!["a", "b"], "replace keeps insertion order");
    }

    #[test]
    fn clone_is_deep() {
        let mut attrs = Attributes::new();
        attrs.set("v", vec![1.0f64, 2.0]);

        let mut copy = attrs.clone();
        copy.set("v", vec![9.0f64]);

        assert_eq!(attrs.get_as::<Vec<f64>>("v"), Some(&vec![1.0, 2.0]));
        assert_eq!(copy.get_as::<Vec<f64>>("v"), Some(&vec![9.0]));
    }
}
