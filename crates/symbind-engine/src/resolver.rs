//! The resolution orchestrator: construct, update and replace.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use symbind_core::{FieldId, FieldSet, ResolutionError, SchemaError, Value};
use symbind_schema::{Entity, Rule, Schema};
use symbind_solver::{EquationSolver, NewtonSolver};
use tracing::{debug, debug_span};

use crate::config::{ConfigError, ResolverConfig};
use crate::instance::Instance;
use crate::metrics::ResolutionMetrics;
use crate::state::Working;
use crate::{constraints, equations, forward, validate};

/// Resolves instances of one entity type.
///
/// Cheap to clone: the schema, configuration and solver are shared.
/// Every operation is all-or-nothing; on error nothing observable
/// changes.
///
/// ```
/// use symbind_engine::Resolver;
/// use symbind_schema::{Field, SchemaBuilder};
///
/// let schema = SchemaBuilder::new("Sum")
///     .field(Field::real("a"))
///     .field(Field::real("b"))
///     .field(Field::real("c").equation("a + b"))
///     .build()
///     .unwrap();
/// let resolver = Resolver::new(schema);
///
/// let sum = resolver.construct([("a", 1.0), ("c", 3.0)]).unwrap();
/// assert_eq!(sum.real("b"), Some(2.0));
/// ```
#[derive(Clone)]
pub struct Resolver {
    schema: Arc<Schema>,
    config: Arc<ResolverConfig>,
    solver: Arc<dyn EquationSolver>,
}

impl Resolver {
    /// A resolver with the default configuration and Newton solver.
    pub fn new(schema: impl Into<Arc<Schema>>) -> Self {
        Self {
            schema: schema.into(),
            config: Arc::new(ResolverConfig::default()),
            solver: Arc::new(NewtonSolver::default()),
        }
    }

    /// A resolver using `config`, including its solver settings.
    pub fn with_config(
        schema: impl Into<Arc<Schema>>,
        config: ResolverConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let solver = NewtonSolver::new(config.solver.clone())?;
        Ok(Self {
            schema: schema.into(),
            config: Arc::new(config),
            solver: Arc::new(solver),
        })
    }

    /// A resolver delegating equation solving to `solver`. The solver
    /// section of `config` is validated but otherwise unused.
    pub fn with_solver(
        schema: impl Into<Arc<Schema>>,
        config: ResolverConfig,
        solver: Arc<dyn EquationSolver>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            schema: schema.into(),
            config: Arc::new(config),
            solver,
        })
    }

    /// A default resolver for `T`, compiling its schema on first use.
    pub fn for_entity<T: Entity>() -> Result<Self, SchemaError> {
        Ok(Self::new(T::schema()?))
    }

    /// The compiled schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The active configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    // ── Operations ─────────────────────────────────────────────────

    /// Build a new instance from `given` values.
    pub fn construct<I, K, V>(&self, given: I) -> Result<Instance, ResolutionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let _span = debug_span!("construct", entity = %self.schema.name()).entered();
        let given = self.typed(given)?;
        let (values, metrics) = self.resolve(&given)?;
        Ok(Instance::new(self.clone(), values, metrics))
    }

    /// Apply `changes` to `instance` in place.
    ///
    /// Changed fields become givens. Roots are kept at their current
    /// value unless they lie upstream of a changed equation target, in
    /// which case they are released and re-derived along with every
    /// other non-root field. Fields whose only rule is a zero-parameter
    /// default are kept like roots. If every change already equals the
    /// current value the call succeeds without doing anything.
    pub fn update<I, K, V>(&self, instance: &mut Instance, changes: I) -> Result<(), ResolutionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let _span = debug_span!("update", entity = %self.schema.name()).entered();
        if !self.owns(instance) {
            return Err(ResolutionError::SchemaMismatch {
                expected: self.schema.name().to_string(),
                found: instance.schema().name().to_string(),
            });
        }
        let changes = self.typed(changes)?;
        if self.is_noop(instance, &changes) {
            debug!("update leaves every field unchanged");
            return Ok(());
        }
        let knowns = self.update_knowns(instance, &changes);
        let (values, metrics) = self.resolve(&knowns)?;
        instance.values = values;
        instance.metrics = metrics;
        Ok(())
    }

    /// Like [`update`](Self::update) but on a copy; `instance` is left
    /// as it was. With no changes the copy equals the original.
    pub fn replace<I, K, V>(&self, instance: &Instance, changes: I) -> Result<Instance, ResolutionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut copy = instance.clone();
        self.update(&mut copy, changes)?;
        Ok(copy)
    }

    /// Whether `instance` was built against this resolver's schema, or
    /// one declaring the same entity with the same fields.
    fn owns(&self, instance: &Instance) -> bool {
        let theirs = instance.schema();
        std::ptr::eq(theirs, &*self.schema)
            || (theirs.name() == self.schema.name()
                && theirs.len() == self.schema.len()
                && theirs
                    .fields()
                    .iter()
                    .zip(self.schema.fields())
                    .all(|(a, b)| a.name == b.name && a.ty == b.ty))
    }

    // ── Pipeline ───────────────────────────────────────────────────

    /// Solve, filter, evaluate forward rules, check completeness and
    /// validate, starting from `knowns`.
    fn resolve(
        &self,
        knowns: &[(FieldId, Value)],
    ) -> Result<(Vec<Value>, ResolutionMetrics), ResolutionError> {
        let started = Instant::now();
        let schema = &*self.schema;
        let mut metrics = ResolutionMetrics::default();
        let mut working = Working::new(schema);
        for (id, value) in knowns {
            working.set(*id, value.clone());
        }
        let provided = schema.names(working.known());
        debug!(given = ?provided, "resolving");

        let t = Instant::now();
        let candidates = equations::solve(self.solver.as_ref(), &working, &mut metrics)?;
        metrics.solve_us = elapsed_us(t);

        let t = Instant::now();
        let chosen = constraints::select(&working, candidates)?;
        metrics.surviving_candidates = 1;
        metrics.filter_us = elapsed_us(t);
        for (name, value) in chosen {
            if let Some(id) = schema.id_of(&name) {
                working.set(id, value);
            }
        }

        let t = Instant::now();
        forward::evaluate(&mut working, &mut metrics)?;
        metrics.forward_us = elapsed_us(t);

        let missing = working.missing();
        let insufficient = || ResolutionError::InsufficientInputs {
            provided: provided.clone(),
            missing: schema.names(&missing),
        };
        if !missing.is_empty() {
            return Err(insufficient());
        }
        let values = working.into_values().ok_or_else(insufficient)?;

        let t = Instant::now();
        validate::check(schema, &values, &self.config.tolerance)?;
        metrics.validate_us = elapsed_us(t);
        metrics.total_us = elapsed_us(started);
        debug!(total_us = metrics.total_us, "resolved");
        Ok((values, metrics))
    }

    /// Check names and types of caller-supplied values. Later entries
    /// for the same field win.
    fn typed<I, K, V>(&self, given: I) -> Result<Vec<(FieldId, Value)>, ResolutionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut out: Vec<(FieldId, Value)> = Vec::new();
        for (name, value) in given {
            let name = name.as_ref();
            let spec = self
                .schema
                .field_by_name(name)
                .ok_or_else(|| ResolutionError::UnknownField {
                    name: name.to_string(),
                })?;
            let mismatch = |found| ResolutionError::TypeMismatch {
                field: spec.name.clone(),
                expected: spec.ty,
                found,
            };
            let value = spec.ty.coerce(value.into()).map_err(mismatch)?;
            if value.as_f64().is_some_and(|x| !x.is_finite()) {
                return Err(mismatch(value));
            }
            match out.iter_mut().find(|(id, _)| *id == spec.id) {
                Some(slot) => slot.1 = value,
                None => out.push((spec.id, value)),
            }
        }
        Ok(out)
    }

    fn is_noop(&self, instance: &Instance, changes: &[(FieldId, Value)]) -> bool {
        changes.iter().all(|(id, value)| {
            match (self.schema.field(*id), instance.get(self.schema.name_of(*id))) {
                (Some(spec), Some(current)) => {
                    spec.ty.values_match(current, value, &self.config.tolerance)
                }
                _ => false,
            }
        })
    }

    /// Changes plus every retained field with its current value.
    fn update_knowns(
        &self,
        instance: &Instance,
        changes: &[(FieldId, Value)],
    ) -> Vec<(FieldId, Value)> {
        let schema = &*self.schema;
        let mut changed = FieldSet::empty();
        let mut released = FieldSet::empty();
        for (id, _) in changes {
            changed.insert(*id);
            if schema.rule_for(*id).is_some_and(Rule::is_invertible) {
                released.extend_from(&schema.graph().upstream_roots(*id));
            }
        }

        let mut knowns = changes.to_vec();
        for spec in schema.fields() {
            if changed.contains(spec.id) || released.contains(spec.id) {
                continue;
            }
            let retained = spec.root
                || schema
                    .rule_for(spec.id)
                    .is_some_and(|r| !r.is_invertible() && r.inputs().is_empty());
            if !retained {
                continue;
            }
            if let Some(value) = instance.get(&spec.name) {
                knowns.push((spec.id, value.clone()));
            }
        }
        debug!(
            changed = ?schema.names(&changed),
            released = ?schema.names(&released),
            "planned update"
        );
        knowns
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("entity", &self.schema.name())
            .field("solver", &self.solver.name())
            .field("config", &self.config)
            .finish()
    }
}

fn elapsed_us(since: Instant) -> u64 {
    since.elapsed().as_micros() as u64
}
