//! Class maps: the ordered field mappings for one target type.

use std::any;
use std::fmt;
use std::sync::Arc;

use super::collection::CollectionTarget;
use super::convert::FromCell;
use super::fallback::EmptyValueStrategy;
use super::field::{CollectionField, DictionaryField, FieldMapping, NestedField, ScalarField};
use super::registry::{BuildStack, ClassMapRegistry};
use crate::error::{MappingError, MappingResult};
use crate::types::RawCellSource;

/// How to read a `T` from one row.
///
/// Members without a field mapping keep their `T::default()` value.
pub struct ClassMap<T> {
    fields: Vec<Box<dyn FieldMapping<T>>>,
    strategy: EmptyValueStrategy,
}

impl<T: 'static> ClassMap<T> {
    pub fn builder() -> ClassMapBuilder<T> {
        ClassMapBuilder {
            fields: Vec::new(),
            strategy: EmptyValueStrategy::default(),
        }
    }
}

impl<T> ClassMap<T> {
    /// Names of the mapped members, in mapping order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.member())
    }

    pub fn fields(&self) -> impl Iterator<Item = &dyn FieldMapping<T>> {
        self.fields.iter().map(|f| f.as_ref())
    }

    pub fn empty_value_strategy(&self) -> EmptyValueStrategy {
        self.strategy
    }

    /// Fill `target` from `row`, one field at a time. Stops at the first failing field.
    pub fn apply_row(&self, target: &mut T, row: &dyn RawCellSource) -> MappingResult<()> {
        for field in &self.fields {
            field.apply(target, row, self.strategy)?;
        }
        Ok(())
    }
}

impl<T: Default> ClassMap<T> {
    /// Read a new `T` from `row`.
    pub fn map_row(&self, row: &dyn RawCellSource) -> MappingResult<T> {
        let mut value = T::default();
        self.apply_row(&mut value, row)?;
        Ok(value)
    }
}

impl<T> fmt::Debug for ClassMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassMap")
            .field("type", &any::type_name::<T>())
            .field("members", &self.members().collect::<Vec<_>>())
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Builder for an explicit [`ClassMap`].
pub struct ClassMapBuilder<T> {
    fields: Vec<Box<dyn FieldMapping<T>>>,
    strategy: EmptyValueStrategy,
}

impl<T: 'static> ClassMapBuilder<T> {
    /// Append a field. Fields are applied in the order they were added.
    pub fn field(mut self, field: impl FieldMapping<T> + 'static) -> Self {
        self.fields.push(Box::new(field));
        self
    }

    pub fn empty_value_strategy(mut self, strategy: EmptyValueStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn build(self) -> ClassMap<T> {
        ClassMap {
            fields: self.fields,
            strategy: self.strategy,
        }
    }
}

/// Convention-based mapping: each member is read from the column named after it.
///
/// ```rust
/// use sheet_mapper::mapping::{AutoMap, AutoMapper, RowMapper};
/// use sheet_mapper::types::Sheet;
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Person {
///     name: String,
///     age: Option<u32>,
///     tags: Vec<String>,
/// }
///
/// impl AutoMap for Person {
///     fn auto_map(map: &mut AutoMapper<'_, Self>) {
///         map.scalar("name", |p| &mut p.name);
///         map.scalar("age", |p| &mut p.age);
///         map.collection("tags", |p| &mut p.tags);
///     }
/// }
///
/// let sheet = Sheet::from_strings(Some(&["name", "age", "tags"]), &[&["Ada", "", "a,b"]]);
/// let person: Person = RowMapper::new().map_row(&sheet.row(0).unwrap()).unwrap();
/// assert_eq!(person.age, None);
/// assert_eq!(person.tags, vec!["a", "b"]);
/// ```
pub trait AutoMap: Default + 'static {
    /// Declare the members of `Self`.
    fn auto_map(map: &mut AutoMapper<'_, Self>);
}

/// Collects the fields of an [`AutoMap`] type while its map is being built.
///
/// The kind of each field is fixed by which method declares it; the trait bounds on those methods
/// keep a member from being mapped with the wrong kind.
pub struct AutoMapper<'a, T> {
    registry: &'a ClassMapRegistry,
    stack: &'a mut BuildStack,
    builder: ClassMapBuilder<T>,
    error: Option<MappingError>,
}

impl<'a, T: 'static> AutoMapper<'a, T> {
    pub(crate) fn new(registry: &'a ClassMapRegistry, stack: &'a mut BuildStack) -> Self {
        Self {
            registry,
            stack,
            builder: ClassMap::builder(),
            error: None,
        }
    }

    /// A leaf member read from the column named `member`.
    pub fn scalar<V, F>(&mut self, member: &str, accessor: F) -> &mut Self
    where
        V: FromCell + Clone + Default + Send + Sync + 'static,
        F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
    {
        self.field(ScalarField::new(member, accessor))
    }

    /// A leaf member with extra configuration, for example a fallback or an alternate header.
    pub fn configure<V, F, C>(&mut self, member: &str, accessor: F, configure: C) -> &mut Self
    where
        V: FromCell + Clone + Default + Send + Sync + 'static,
        F: Fn(&mut T) -> &mut V + Send + Sync + 'static,
        C: FnOnce(ScalarField<T, V>) -> ScalarField<T, V>,
    {
        self.field(configure(ScalarField::new(member, accessor)))
    }

    /// A collection member split from the column named `member`.
    pub fn collection<C, F>(&mut self, member: &str, accessor: F) -> &mut Self
    where
        C: CollectionTarget + 'static,
        C::Element: FromCell + Clone + Default + Send + Sync + 'static,
        F: Fn(&mut T) -> &mut C + Send + Sync + 'static,
    {
        self.field(CollectionField::new(member, accessor))
    }

    /// A dictionary member holding the column named `member`, keyed by that header.
    pub fn dictionary<D, V, F>(&mut self, member: &str, accessor: F) -> &mut Self
    where
        D: CollectionTarget<Element = (String, V)> + 'static,
        V: FromCell + Clone + Default + Send + Sync + 'static,
        F: Fn(&mut T) -> &mut D + Send + Sync + 'static,
    {
        self.field(DictionaryField::new(member, accessor))
    }

    /// A nested member read from the same row through its own automatic map.
    ///
    /// A type graph that leads back to a type still being built fails the whole build with
    /// [`MappingError::RecursiveMapping`].
    pub fn nested<N, F>(&mut self, member: &str, accessor: F) -> &mut Self
    where
        N: AutoMap,
        F: Fn(&mut T) -> &mut N + Send + Sync + 'static,
    {
        if self.error.is_some() {
            return self;
        }
        match self.registry.build_with_stack::<N>(self.stack) {
            Ok(map) => self.field(NestedField::new(member, map, accessor)),
            Err(e) => {
                self.error = Some(e);
                self
            }
        }
    }

    /// Any other field mapping.
    pub fn field(&mut self, field: impl FieldMapping<T> + 'static) -> &mut Self {
        self.builder.fields.push(Box::new(field));
        self
    }

    pub fn empty_value_strategy(&mut self, strategy: EmptyValueStrategy) -> &mut Self {
        self.builder.strategy = strategy;
        self
    }

    /// Look up an already built or registered map, e.g. for a [`NestedField`] of a type that is
    /// not itself [`AutoMap`].
    pub fn registered<N: 'static>(&self) -> Option<Arc<ClassMap<N>>> {
        self.registry.get::<N>()
    }

    pub(crate) fn finish(self) -> MappingResult<ClassMap<T>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.builder.build()),
        }
    }
}
