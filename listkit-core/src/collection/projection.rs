//! Type-erased projection of a collection.
//!
//! Some consumers bind many view-models with different element types through
//! a single code path. For them the collection also publishes its snapshot
//! with every element boxed as an [`AnyElement`]: the value is opaque, but
//! the identity stays comparable and hashable, and the concrete value can be
//! recovered with [`AnyElement::downcast_ref`].

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::identity::{Element, Identify};
use super::section::Section;

/// Object-safe view of an identity value.
trait DynKey: Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn eq_key(&self, other: &dyn DynKey) -> bool;
    fn hash_key(&self, state: &mut dyn Hasher);
    fn fmt_key(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<K> DynKey for K
where
    K: Eq + Hash + fmt::Debug + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_key(&self, other: &dyn DynKey) -> bool {
        other.as_any().downcast_ref::<K>() == Some(self)
    }

    fn hash_key(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<K>().hash(&mut state);
        self.hash(&mut state);
    }

    fn fmt_key(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// An identity value of any type.
///
/// Identities of different types never compare equal.
#[derive(Clone)]
pub struct AnyIdentity(Arc<dyn DynKey>);

impl AnyIdentity {
    pub fn new<K>(key: K) -> Self
    where
        K: Eq + Hash + fmt::Debug + Send + Sync + 'static,
    {
        Self(Arc::new(key))
    }

    /// Borrow the identity as its concrete type.
    pub fn downcast_ref<K: 'static>(&self) -> Option<&K> {
        self.0.as_any().downcast_ref()
    }
}

impl PartialEq for AnyIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_key(other.0.as_ref())
    }
}

impl Eq for AnyIdentity {}

impl Hash for AnyIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash_key(state);
    }
}

impl fmt::Debug for AnyIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt_key(f)
    }
}

/// A boxed element with a comparable identity.
#[derive(Clone)]
pub struct AnyElement {
    value: Arc<dyn Any + Send + Sync>,
    identity: AnyIdentity,
    type_name: &'static str,
}

impl AnyElement {
    pub fn new<T: Element>(value: T) -> Self {
        let identity = AnyIdentity::new(value.identity());
        Self {
            value: Arc::new(value),
            identity,
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Boxed elements are equal when their identities are.
impl PartialEq for AnyElement {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Identify for AnyElement {
    type Id = AnyIdentity;

    fn identity(&self) -> AnyIdentity {
        self.identity.clone()
    }
}

impl fmt::Debug for AnyElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyElement")
            .field("type", &self.type_name)
            .field("identity", &self.identity)
            .finish()
    }
}

/// Box every element of every section, keeping section keys.
pub fn project<T: Element>(sections: &[Section<T>]) -> Vec<Section<AnyElement>> {
    sections
        .iter()
        .map(|section| section.with_items(section.map(|item| AnyElement::new(item.clone()))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identities_compare_by_type_and_value() {
        assert_eq!(AnyIdentity::new(1u32), AnyIdentity::new(1u32));
        assert_ne!(AnyIdentity::new(1u32), AnyIdentity::new(2u32));
        assert_ne!(AnyIdentity::new(1u32), AnyIdentity::new(1u64));
    }

    #[test]
    fn identities_hash_consistently() {
        let set: HashSet<AnyIdentity> = [
            AnyIdentity::new("a"),
            AnyIdentity::new("a"),
            AnyIdentity::new(String::from("a")),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn elements_downcast_back() {
        let element = AnyElement::new(String::from("row"));
        assert!(element.is::<String>());
        assert_eq!(element.downcast_ref::<String>().map(String::as_str), Some("row"));
        assert!(element.downcast_ref::<u32>().is_none());
        assert_eq!(element.identity().downcast_ref::<String>().map(String::as_str), Some("row"));
    }

    #[test]
    fn projection_keeps_shape_and_keys() {
        let sections = vec![
            Section::new("a", vec![1u32, 2]),
            Section::new("b", vec![3u32]),
        ];
        let projected = project(&sections);

        assert_eq!(projected.len(), 2);
        assert_eq!(projected[0].key().as_str(), "a");
        assert_eq!(projected[0].len(), 2);
        assert_eq!(projected[1].key().as_str(), "b");
        assert_eq!(projected[1][0].downcast_ref::<u32>(), Some(&3));
        assert_eq!(projected[0][1], AnyElement::new(2u32));
    }
}
