//! Typed property references
//!
//! A [`Property`] names an accessor of an entity (`getUserName`, `isActive`,
//! `get_user_name` or the bare field `userName`) and carries the entity and
//! value types, so column-taking builder methods can be checked at compile
//! time. The [`PropertyResolver`] turns a property into the field name it
//! reads and memoizes the result.

use std::any::TypeId;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use regex::Regex;
use thiserror::Error;

use crate::error::MapperError;
use crate::schema::TableDescriptor;
use crate::sql::naming::decapitalize;

static ACCESSOR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid accessor pattern"));

/// Reference to a property `T` of entity `E`
///
/// The accessor text is only checked against the mapping when the property
/// is first used. [`EntityRegistry::verify_property`] runs that check up
/// front, e.g. from a test over an entity's constants.
///
/// [`EntityRegistry::verify_property`]: crate::registry::EntityRegistry::verify_property
pub struct Property<E, T> {
    accessor: &'static str,
    _marker: PhantomData<fn(&E) -> T>,
}

impl<E, T> Property<E, T> {
    pub const fn new(accessor: &'static str) -> Self {
        Self {
            accessor,
            _marker: PhantomData,
        }
    }

    /// Accessor text as declared
    pub const fn accessor(&self) -> &'static str {
        self.accessor
    }
}

impl<E, T> Clone for Property<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Property<E, T> {}

impl<E, T> fmt::Debug for Property<E, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("entity", &std::any::type_name::<E>())
            .field("accessor", &self.accessor)
            .finish()
    }
}

/// Resolved property: the field it reads and the entity declaring it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyReference {
    pub field_name: String,
    pub entity_type_name: &'static str,
}

/// Why an accessor could not be turned into a field name
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("empty accessor on {entity}")]
    Empty { entity: &'static str },

    #[error("{entity}: unsupported accessor \"{accessor}\"")]
    Unsupported {
        entity: &'static str,
        accessor: &'static str,
    },
}

impl From<PropertyError> for MapperError {
    fn from(err: PropertyError) -> Self {
        MapperError::Property(err.to_string())
    }
}

/// Derive the field name read by an accessor
///
/// `getUserName` and `get_user_name` become `userName` and `user_name`,
/// `isActive` becomes `active`, a bare field name is kept as written.
pub fn derive_field_name(accessor: &str) -> Option<String> {
    if !ACCESSOR_PATTERN.is_match(accessor) {
        return None;
    }

    for prefix in ["get_", "is_"] {
        if let Some(rest) = accessor.strip_prefix(prefix) {
            return (!rest.is_empty()).then(|| rest.to_string());
        }
    }

    for prefix in ["get", "is"] {
        if let Some(rest) = accessor.strip_prefix(prefix)
            && rest.chars().next().is_some_and(char::is_uppercase)
        {
            return Some(decapitalize(rest));
        }
    }

    Some(accessor.to_string())
}

struct ResolverInner {
    cache: DashMap<(TypeId, &'static str), Arc<PropertyReference>>,
    derivations: AtomicUsize,
}

/// Memoizing property resolver
///
/// Cloning yields another handle onto the same cache.
#[derive(Clone)]
pub struct PropertyResolver {
    inner: Arc<ResolverInner>,
}

impl Default for PropertyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl PropertyResolver {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ResolverInner {
                cache: DashMap::new(),
                derivations: AtomicUsize::new(0),
            }),
        }
    }

    /// Resolve a property to its field name and declaring entity
    pub fn resolve<E: 'static, T>(
        &self,
        property: &Property<E, T>,
    ) -> Result<Arc<PropertyReference>, PropertyError> {
        let key = (TypeId::of::<E>(), property.accessor);
        if let Some(hit) = self.inner.cache.get(&key) {
            tracing::trace!(accessor = property.accessor, "property cache hit");
            return Ok(hit.clone());
        }

        let entity = std::any::type_name::<E>();
        if property.accessor.trim().is_empty() {
            return Err(PropertyError::Empty { entity });
        }
        let field_name =
            derive_field_name(property.accessor).ok_or(PropertyError::Unsupported {
                entity,
                accessor: property.accessor,
            })?;

        self.inner.derivations.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            entity,
            accessor = property.accessor,
            field = %field_name,
            "derived property field name"
        );

        let reference = Arc::new(PropertyReference {
            field_name,
            entity_type_name: entity,
        });
        Ok(self
            .inner
            .cache
            .entry(key)
            .or_insert(reference)
            .value()
            .clone())
    }

    /// Field name of a property, if the entity maps that field
    pub fn resolve_field_name<E: 'static, T>(
        &self,
        property: &Property<E, T>,
        table: &TableDescriptor,
    ) -> Option<String> {
        let reference = self.resolve(property).ok()?;
        table
            .contains_field(&reference.field_name)
            .then(|| reference.field_name.clone())
    }

    /// Number of derivations performed (cache misses that succeeded)
    pub fn derivation_count(&self) -> usize {
        self.inner.derivations.load(Ordering::Relaxed)
    }

    /// Number of cached references
    pub fn len(&self) -> usize {
        self.inner.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.cache.is_empty()
    }

    /// Drop cached references that no caller holds any more
    ///
    /// Evicted entries are derived again on next use.
    pub fn evict_unused(&self) -> usize {
        let before = self.inner.cache.len();
        self.inner
            .cache
            .retain(|_, reference| Arc::strong_count(reference) > 1);
        let evicted = before.saturating_sub(self.inner.cache.len());
        if evicted > 0 {
            tracing::debug!(evicted, "evicted unused property references");
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct User;

    impl User {
        const NAME: Property<User, String> = Property::new("getName");
        const ACTIVE: Property<User, bool> = Property::new("isActive");
    }

    // =========================================================================
    // Field Name Derivation Tests
    // =========================================================================

    #[test]
    fn test_derive_getter() {
        assert_eq!(derive_field_name("getName").as_deref(), Some("name"));
        assert_eq!(derive_field_name("getUserName").as_deref(), Some("userName"));
        assert_eq!(derive_field_name("getURL").as_deref(), Some("URL"));
    }

    #[test]
    fn test_derive_boolean_getter() {
        assert_eq!(derive_field_name("isActive").as_deref(), Some("active"));
        assert_eq!(derive_field_name("is_active").as_deref(), Some("active"));
    }

    #[test]
    fn test_derive_snake_getter() {
        assert_eq!(derive_field_name("get_user_name").as_deref(), Some("user_name"));
    }

    #[test]
    fn test_derive_bare_field() {
        assert_eq!(derive_field_name("name").as_deref(), Some("name"));
        assert_eq!(derive_field_name("getter").as_deref(), Some("getter"));
        assert_eq!(derive_field_name("issue").as_deref(), Some("issue"));
    }

    #[test]
    fn test_derive_rejects_unsupported_shapes() {
        assert_eq!(derive_field_name("get_"), None);
        assert_eq!(derive_field_name("u.getName()"), None);
        assert_eq!(derive_field_name("|u| u.name"), None);
        assert_eq!(derive_field_name(""), None);
    }

    // =========================================================================
    // Resolver Cache Tests
    // =========================================================================

    #[test]
    fn test_resolve_is_cached() {
        let resolver = PropertyResolver::new();
        let first = resolver.resolve(&User::NAME).unwrap();
        let second = resolver.resolve(&Property::<User, String>::new("getName")).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.field_name, "name");
        assert!(first.entity_type_name.ends_with("User"));
        assert_eq!(resolver.derivation_count(), 1);
    }

    #[test]
    fn test_clones_share_cache() {
        let resolver = PropertyResolver::new();
        let other = resolver.clone();
        resolver.resolve(&User::ACTIVE).unwrap();
        other.resolve(&User::ACTIVE).unwrap();
        assert_eq!(other.derivation_count(), 1);
    }

    #[test]
    fn test_unsupported_accessor_is_error() {
        let resolver = PropertyResolver::new();
        let err = resolver
            .resolve(&Property::<User, i32>::new("a.b"))
            .unwrap_err();
        assert!(matches!(err, PropertyError::Unsupported { accessor: "a.b", .. }));
        assert_eq!(resolver.derivation_count(), 0);

        let err = resolver.resolve(&Property::<User, i32>::new(" ")).unwrap_err();
        assert!(matches!(err, PropertyError::Empty { .. }));
    }

    #[test]
    fn test_evict_unused() {
        let resolver = PropertyResolver::new();
        let held = resolver.resolve(&User::NAME).unwrap();
        resolver.resolve(&User::ACTIVE).unwrap();
        assert_eq!(resolver.len(), 2);

        assert_eq!(resolver.evict_unused(), 1);
        assert_eq!(resolver.len(), 1);

        drop(held);
        assert_eq!(resolver.evict_unused(), 1);
        assert!(resolver.is_empty());

        resolver.resolve(&User::NAME).unwrap();
        assert_eq!(resolver.derivation_count(), 3);
    }
}
