//! Registry of class maps, keyed by target type.
//!
//! A map moves through three states: unbuilt, building and built. Built maps are immutable and
//! shared behind an [`Arc`]; readers take a read lock and never see a half-built map. First-time
//! builds are serialized by a separate mutex which also owns the stack of types currently being
//! built, so a type graph that refers back to itself is caught instead of recursing forever.

use std::any::{self, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use super::class_map::{AutoMap, AutoMapper, ClassMap};
use crate::error::{MappingError, MappingResult};

type SharedMap = Arc<dyn Any + Send + Sync>;

/// Types whose maps are currently being built, outermost first.
#[derive(Debug, Default)]
pub(crate) struct BuildStack {
    frames: Vec<(TypeId, &'static str)>,
}

impl BuildStack {
    fn contains(&self, id: TypeId) -> bool {
        self.frames.iter().any(|(f, _)| *f == id)
    }

    fn chain_to(&self, name: &'static str) -> Vec<String> {
        self.frames
            .iter()
            .map(|(_, n)| n.to_string())
            .chain(std::iter::once(name.to_string()))
            .collect()
    }
}

/// Holds the class map for each target type.
///
/// The registry is `Send + Sync`; share one through an `Arc` so that every mapper reuses the same
/// built maps.
#[derive(Default)]
pub struct ClassMapRegistry {
    built: RwLock<HashMap<TypeId, SharedMap>>,
    building: Mutex<BuildStack>,
}

impl ClassMapRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an explicit map for `T`.
    ///
    /// Fails with [`MappingError::MapAlreadyRegistered`] if `T` already has a map, whether it was
    /// registered or built automatically.
    pub fn register<T: 'static>(&self, map: ClassMap<T>) -> MappingResult<Arc<ClassMap<T>>> {
        let map = Arc::new(map);
        let mut built = self.built.write().unwrap_or_else(PoisonError::into_inner);
        let id = TypeId::of::<T>();
        if built.contains_key(&id) {
            return Err(MappingError::MapAlreadyRegistered {
                type_name: any::type_name::<T>().to_string(),
            });
        }
        built.insert(id, map.clone());
        tracing::debug!(target_type = any::type_name::<T>(), members = ?map.members().collect::<Vec<_>>(), "class map registered");
        Ok(map)
    }

    /// The map for `T`, if one has been registered or built.
    pub fn get<T: 'static>(&self) -> Option<Arc<ClassMap<T>>> {
        let built = self.built.read().unwrap_or_else(PoisonError::into_inner);
        built
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|m| m.downcast::<ClassMap<T>>().ok())
    }

    /// Whether `T` has a map.
    pub fn contains<T: 'static>(&self) -> bool {
        self.built
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&TypeId::of::<T>())
    }

    /// The map for `T`, building it from [`AutoMap`] on first use.
    pub fn get_or_build<T: AutoMap>(&self) -> MappingResult<Arc<ClassMap<T>>> {
        if let Some(found) = self.get::<T>() {
            return Ok(found);
        }
        let mut stack = self.building.lock().unwrap_or_else(PoisonError::into_inner);
        // A panic inside an earlier build can leave frames behind.
        stack.frames.clear();
        self.build_with_stack::<T>(&mut stack)
    }

    pub(crate) fn build_with_stack<T: AutoMap>(
        &self,
        stack: &mut BuildStack,
    ) -> MappingResult<Arc<ClassMap<T>>> {
        // Another thread may have finished the build while this one waited for the lock.
        if let Some(found) = self.get::<T>() {
            return Ok(found);
        }
        let id = TypeId::of::<T>();
        let name = any::type_name::<T>();
        if stack.contains(id) {
            return Err(MappingError::RecursiveMapping {
                chain: stack.chain_to(name),
            });
        }

        stack.frames.push((id, name));
        let mut mapper = AutoMapper::new(self, stack);
        T::auto_map(&mut mapper);
        let result = mapper.finish();
        stack.frames.pop();
        let map = Arc::new(result?);

        let mut built = self.built.write().unwrap_or_else(PoisonError::into_inner);
        // `register` does not take the build lock, so it may have won the race.
        if let Some(existing) = built.get(&id).cloned().and_then(|m| m.downcast::<ClassMap<T>>().ok()) {
            return Ok(existing);
        }
        built.insert(id, map.clone());
        tracing::debug!(target_type = name, members = ?map.members().collect::<Vec<_>>(), "class map built");
        Ok(map)
    }
}

impl fmt::Debug for ClassMapRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let len = self
            .built
            .read()
            .map(|b| b.len())
            .unwrap_or_else(|p| p.into_inner().len());
        f.debug_struct("ClassMapRegistry")
            .field("maps_len", &len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ScalarField;

    #[derive(Debug, Default)]
    struct Leaf {
        value: i32,
    }

    impl AutoMap for Leaf {
        fn auto_map(map: &mut AutoMapper<'_, Self>) {
            map.scalar("value", |l| &mut l.value);
        }
    }

    #[derive(Debug, Default)]
    struct Ping {
        pong: Pong,
    }

    #[derive(Debug, Default)]
    struct Pong {
        holder: Holder,
    }

    #[derive(Debug, Default)]
    struct Holder {
        ping: Option<Box<Ping>>,
    }

    impl AutoMap for Ping {
        fn auto_map(map: &mut AutoMapper<'_, Self>) {
            map.nested("pong", |p| &mut p.pong);
        }
    }

    impl AutoMap for Pong {
        fn auto_map(map: &mut AutoMapper<'_, Self>) {
            map.nested("holder", |p| &mut p.holder);
        }
    }

    impl AutoMap for Holder {
        fn auto_map(map: &mut AutoMapper<'_, Self>) {
            map.nested("ping", |h| &mut **h.ping.get_or_insert_with(Default::default));
        }
    }

    #[test]
    fn built_maps_are_shared() {
        let registry = ClassMapRegistry::new();
        assert!(!registry.contains::<Leaf>());
        let a = registry.get_or_build::<Leaf>().unwrap();
        let b = registry.get_or_build::<Leaf>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.contains::<Leaf>());
    }

    #[test]
    fn re_registration_is_rejected() {
        let registry = ClassMapRegistry::new();
        registry.get_or_build::<Leaf>().unwrap();
        let err = registry
            .register(
                ClassMap::<Leaf>::builder()
                    .field(ScalarField::new("value", |l: &mut Leaf| &mut l.value).column_index(0))
                    .build(),
            )
            .unwrap_err();
        assert!(matches!(err, MappingError::MapAlreadyRegistered { .. }));
    }

    #[test]
    fn registered_map_wins_over_auto_map() {
        let registry = ClassMapRegistry::new();
        let explicit = registry
            .register(
                ClassMap::<Leaf>::builder()
                    .field(ScalarField::new("value", |l: &mut Leaf| &mut l.value).column_index(3))
                    .build(),
            )
            .unwrap();
        let found = registry.get_or_build::<Leaf>().unwrap();
        assert!(Arc::ptr_eq(&explicit, &found));
    }

    #[test]
    fn cycles_fail_fast_and_leave_nothing_half_built() {
        let registry = ClassMapRegistry::new();
        let err = registry.get_or_build::<Ping>().unwrap_err();
        match err {
            MappingError::RecursiveMapping { chain } => {
                assert_eq!(chain.len(), 4);
                assert!(chain.first().unwrap().ends_with("Ping"));
                assert!(chain.last().unwrap().ends_with("Ping"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!registry.contains::<Ping>());
        assert!(!registry.contains::<Pong>());
        // The build stack is reset, so unrelated builds still work.
        registry.get_or_build::<Leaf>().unwrap();
    }
}
