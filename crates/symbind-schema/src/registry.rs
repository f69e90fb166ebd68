//! Process-lifetime cache of compiled schemas.
//!
//! Compiling a schema is a pure function of its declarations, so each
//! entity type only needs to be compiled once. The registry compiles
//! outside its lock: two threads racing on the first use of a type may
//! both compile it, and the second insert simply replaces an identical
//! schema.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use symbind_core::SchemaError;

use crate::builder::SchemaBuilder;
use crate::schema::Schema;

/// An entity type with a statically known schema.
///
/// ```
/// use symbind_schema::{Entity, Field, SchemaBuilder};
///
/// struct Circle;
///
/// impl Entity for Circle {
///     const NAME: &'static str = "Circle";
///
///     fn declare() -> SchemaBuilder {
///         SchemaBuilder::new(Self::NAME)
///             .field(Field::real("radius"))
///             .field(Field::real("area").equation("pi * radius ^ 2"))
///             .constraint("radius > 0")
///     }
/// }
///
/// let schema = Circle::schema().unwrap();
/// assert_eq!(schema.name(), "Circle");
/// assert!(std::sync::Arc::ptr_eq(&schema, &Circle::schema().unwrap()));
/// ```
pub trait Entity {
    /// Registry key and display name.
    const NAME: &'static str;

    /// Field and constraint declarations.
    fn declare() -> SchemaBuilder;

    /// The compiled schema, from the global registry.
    fn schema() -> Result<Arc<Schema>, SchemaError> {
        SchemaRegistry::global().get_or_compile(Self::NAME, Self::declare)
    }
}

/// Thread-safe map from entity name to compiled schema.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<Schema>>>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by [`Entity::schema`].
    pub fn global() -> &'static SchemaRegistry {
        static GLOBAL: OnceLock<SchemaRegistry> = OnceLock::new();
        GLOBAL.get_or_init(SchemaRegistry::new)
    }

    /// Return the cached schema for `name`, compiling `declare()` on first
    /// use. Compilation errors are returned and nothing is cached.
    pub fn get_or_compile<F>(&self, name: &str, declare: F) -> Result<Arc<Schema>, SchemaError>
    where
        F: FnOnce() -> SchemaBuilder,
    {
        if let Some(schema) = self.get(name) {
            return Ok(schema);
        }
        let schema = Arc::new(declare().build()?);
        self.schemas
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// The cached schema for `name`, if compiled.
    pub fn get(&self, name: &str) -> Option<Arc<Schema>> {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Number of cached schemas.
    pub fn len(&self) -> usize {
        self.schemas
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Field;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn compiles_once() {
        let registry = SchemaRegistry::new();
        let calls = AtomicUsize::new(0);
        let declare = || {
            calls.fetch_add(1, Ordering::Relaxed);
            SchemaBuilder::new("Pair")
                .field(Field::real("x"))
                .field(Field::real("y").equation("2 * x"))
        };
        let a = registry.get_or_compile("Pair", declare).unwrap();
        let b = registry.get_or_compile("Pair", declare).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn errors_are_not_cached() {
        let registry = SchemaRegistry::new();
        let broken = || SchemaBuilder::new("Broken").field(Field::real("x").equation("y"));
        assert!(registry.get_or_compile("Broken", broken).is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn concurrent_first_use_is_harmless() {
        let registry = SchemaRegistry::new();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    registry
                        .get_or_compile("Shared", || {
                            SchemaBuilder::new("Shared").field(Field::real("v"))
                        })
                        .unwrap()
                });
            }
        });
        assert_eq!(registry.get("Shared").unwrap().len(), 1);
    }
}
