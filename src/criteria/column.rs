//! Column arguments accepted by the builders
//!
//! Every column-taking builder method accepts either a name (`"userName"`,
//! `"user_name"`, or `"t1.user_name"` on selects) or a typed
//! [`Property`] of the builder's entity.

use crate::error::{MapperError, Result};
use crate::property::{Property, PropertyResolver};
use crate::schema::{ColumnDescriptor, TableDescriptor};

/// A column argument before it is looked up in a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Field name or column name, first match wins
    Name(String),
    /// Field name derived from a property
    Field(String),
}

impl ColumnRef {
    pub fn as_str(&self) -> &str {
        match self {
            ColumnRef::Name(name) | ColumnRef::Field(name) => name,
        }
    }
}

/// Something that names a column of entity `E`
pub trait IntoColumn<E> {
    fn into_column(self, properties: &PropertyResolver) -> Result<ColumnRef>;
}

impl<E> IntoColumn<E> for &str {
    fn into_column(self, _properties: &PropertyResolver) -> Result<ColumnRef> {
        Ok(ColumnRef::Name(self.to_string()))
    }
}

impl<E> IntoColumn<E> for String {
    fn into_column(self, _properties: &PropertyResolver) -> Result<ColumnRef> {
        Ok(ColumnRef::Name(self))
    }
}

impl<E> IntoColumn<E> for &String {
    fn into_column(self, _properties: &PropertyResolver) -> Result<ColumnRef> {
        Ok(ColumnRef::Name(self.clone()))
    }
}

impl<E: 'static, T> IntoColumn<E> for Property<E, T> {
    fn into_column(self, properties: &PropertyResolver) -> Result<ColumnRef> {
        let reference = properties.resolve(&self)?;
        Ok(ColumnRef::Field(reference.field_name.clone()))
    }
}

impl<E: 'static, T> IntoColumn<E> for &Property<E, T> {
    fn into_column(self, properties: &PropertyResolver) -> Result<ColumnRef> {
        (*self).into_column(properties)
    }
}

/// Look a column up in a table
pub(crate) fn lookup(table: &TableDescriptor, column: ColumnRef) -> Result<&ColumnDescriptor> {
    let found = match &column {
        ColumnRef::Name(name) => table.find_column(name),
        ColumnRef::Field(field) => table.column(field),
    };
    found.ok_or_else(|| MapperError::column_not_found(table.entity_name(), column.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperConfig;
    use crate::entity::{Entity, EntityDef, FieldDef};
    use crate::registry::EntityRegistry;

    struct User;

    impl User {
        const USER_NAME: Property<User, String> = Property::new("getUserName");
        const NICKNAME: Property<User, String> = Property::new("getNickname");
        const BROKEN: Property<User, String> = Property::new("u.name");
    }

    impl Entity for User {
        fn definition() -> EntityDef {
            EntityDef::new()
                .field(FieldDef::new("id"))
                .field(FieldDef::new("userName"))
        }
    }

    fn resolve<C: IntoColumn<User>>(registry: &EntityRegistry, column: C) -> Result<String> {
        let table = registry.describe::<User>()?;
        let column = column.into_column(registry.properties())?;
        Ok(lookup(&table, column)?.column_name.clone())
    }

    #[test]
    fn test_string_matches_field_or_column() {
        let registry = EntityRegistry::new(MapperConfig::default());
        assert_eq!(resolve(&registry, "userName").unwrap(), "user_name");
        assert_eq!(resolve(&registry, "user_name").unwrap(), "user_name");
        assert_eq!(resolve(&registry, String::from("id")).unwrap(), "id");
    }

    #[test]
    fn test_property_resolves_to_field() {
        let registry = EntityRegistry::new(MapperConfig::default());
        assert_eq!(resolve(&registry, User::USER_NAME).unwrap(), "user_name");
        assert_eq!(resolve(&registry, &User::USER_NAME).unwrap(), "user_name");
    }

    #[test]
    fn test_unknown_column_names_entity() {
        let registry = EntityRegistry::new(MapperConfig::default());
        let err = resolve(&registry, "nickname").unwrap_err();
        assert_eq!(err.to_string(), "User: column \"nickname\" not found");

        let err = resolve(&registry, User::NICKNAME).unwrap_err();
        assert!(matches!(err, MapperError::ColumnNotFound { .. }));
    }

    #[test]
    fn test_unresolvable_property() {
        let registry = EntityRegistry::new(MapperConfig::default());
        let err = resolve(&registry, User::BROKEN).unwrap_err();
        assert!(matches!(err, MapperError::Property(_)));
    }
}
