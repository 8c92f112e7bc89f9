//! Injection metadata: plans, the provider interface, and registration tables
//!
//! The resolution core never inspects types on its own. Everything it knows
//! about how to construct a type - constructor parameters, injectable
//! properties, injectable methods - comes from an [`InjectionPlan`] obtained
//! through the [`MetadataProvider`] trait.
//!
//! Rust has no runtime reflection, so plans are built from explicit
//! registration tables: each spec carries a type-erased closure that knows
//! how to construct, assign, or invoke on the concrete type. The typed
//! [`PlanBuilder`] keeps the erasure out of user code.
//!
//! # Example
//!
//! ```rust
//! use bindery::{ArgList, InjectionPlan, MetadataRegistry, ServiceKey};
//! use std::sync::Arc;
//!
//! struct Engine { hp: u32 }
//! struct Car { engine: Arc<Engine>, plate: String }
//!
//! let plan = InjectionPlan::for_type::<Car>()
//!     .constructor_with(vec![ServiceKey::of::<Engine>()], |mut args: ArgList| {
//!         let engine = args.take::<Engine>()?;
//!         let plate = args.take::<String>()?;
//!         Ok(Car { engine, plate: plate.as_ref().clone() })
//!     })
//!     .finish();
//!
//! let provider = MetadataRegistry::new().with(plan);
//! assert!(!provider.is_empty());
//! ```

use crate::error::{DiError, Result};
use crate::key::ServiceKey;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A resolved, type-erased instance as produced by the container.
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

/// Erase a plain value into an [`AnyInstance`].
///
/// Useful for extra constructor arguments and method-call extras:
///
/// ```rust
/// use bindery::arg;
///
/// let extras = vec![arg(7u32), arg("plate".to_string())];
/// ```
#[inline]
pub fn arg<T: Send + Sync + 'static>(value: T) -> AnyInstance {
    Arc::new(value)
}

/// Build a `Vec<AnyInstance>` from plain values.
///
/// ```rust
/// use bindery::args;
///
/// let extras = args![1u32, "label".to_string()];
/// assert_eq!(extras.len(), 2);
/// ```
#[macro_export]
macro_rules! args {
    () => { Vec::<$crate::AnyInstance>::new() };
    ($($value:expr),+ $(,)?) => {
        vec![$($crate::arg($value)),+]
    };
}

// =============================================================================
// Argument lists
// =============================================================================

/// Ordered cursor over the argument values handed to a construct or method
/// closure: resolved dependencies first, caller-supplied extras after.
///
/// Closures consume it positionally with [`ArgList::take`]; a wrong type or
/// an exhausted list surfaces as [`DiError::ConstructionFailed`] naming the
/// offending position.
pub struct ArgList {
    target: ServiceKey,
    values: Vec<AnyInstance>,
    cursor: usize,
}

impl ArgList {
    pub(crate) fn new(target: ServiceKey, values: Vec<AnyInstance>) -> Self {
        Self {
            target,
            values,
            cursor: 0,
        }
    }

    /// Take the next argument, downcast to `T`.
    pub fn take<T: Send + Sync + 'static>(&mut self) -> Result<Arc<T>> {
        let position = self.cursor;
        let value = self.take_value().map_err(|_| {
            DiError::construction_failed(
                self.target,
                format!("argument {position} missing (arity mismatch)"),
            )
        })?;
        value.downcast::<T>().map_err(|_| {
            DiError::construction_failed(
                self.target,
                format!(
                    "argument {position} is not a `{}`",
                    std::any::type_name::<T>()
                ),
            )
        })
    }

    /// Take the next argument without downcasting.
    pub fn take_value(&mut self) -> Result<AnyInstance> {
        let value = self.values.get(self.cursor).cloned().ok_or_else(|| {
            DiError::construction_failed(
                self.target,
                format!("argument {} missing (arity mismatch)", self.cursor),
            )
        })?;
        self.cursor += 1;
        Ok(value)
    }

    /// Number of arguments not yet taken.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.values.len() - self.cursor
    }

    /// Whether every argument has been taken.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

// =============================================================================
// Injection plan
// =============================================================================

/// Type-erased construct closure
type ConstructFn = Box<dyn Fn(ArgList) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;
/// Type-erased property setter
type AssignFn = Box<dyn Fn(&mut (dyn Any + Send + Sync), AnyInstance) -> Result<()> + Send + Sync>;
/// Type-erased method invoker
type InvokeFn = Box<dyn Fn(&mut (dyn Any + Send + Sync), ArgList) -> Result<()> + Send + Sync>;

/// One injectable property: member name, dependency key, erased setter.
pub struct PropertySpec {
    pub(crate) name: &'static str,
    pub(crate) target: ServiceKey,
    pub(crate) assign: AssignFn,
}

/// One injectable method: name, ordered dependency keys, erased invoker.
pub struct MethodSpec {
    pub(crate) name: &'static str,
    pub(crate) params: Vec<ServiceKey>,
    pub(crate) invoke: InvokeFn,
}

/// Everything the pipeline knows about constructing and wiring one type.
///
/// Obtained from a [`MetadataProvider`]; built with [`InjectionPlan::for_type`].
pub struct InjectionPlan {
    target: ServiceKey,
    /// `Some(params)` = constructor injection declared (possibly empty);
    /// `None` = extras are forwarded as the full argument list.
    pub(crate) ctor_params: Option<Vec<ServiceKey>>,
    pub(crate) construct: Option<ConstructFn>,
    pub(crate) properties: Vec<PropertySpec>,
    pub(crate) methods: Vec<MethodSpec>,
}

impl InjectionPlan {
    /// Start a typed plan for `T`.
    #[inline]
    pub fn for_type<T: Send + Sync + 'static>() -> PlanBuilder<T> {
        PlanBuilder {
            plan: InjectionPlan {
                target: ServiceKey::of::<T>(),
                ctor_params: None,
                construct: None,
                properties: Vec::new(),
                methods: Vec::new(),
            },
            _marker: std::marker::PhantomData,
        }
    }

    /// The key this plan describes.
    #[inline]
    pub fn target(&self) -> ServiceKey {
        self.target
    }

    /// Whether the plan declares no injection at all (stages will no-op).
    #[inline]
    pub fn is_passthrough(&self) -> bool {
        self.ctor_params.is_none() && self.properties.is_empty() && self.methods.is_empty()
    }

    pub(crate) fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl std::fmt::Debug for InjectionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionPlan")
            .field("target", &self.target)
            .field("ctor_params", &self.ctor_params)
            .field("constructible", &self.construct.is_some())
            .field("properties", &self.properties.len())
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Fluent, typed builder for an [`InjectionPlan`].
pub struct PlanBuilder<T> {
    plan: InjectionPlan,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> PlanBuilder<T> {
    /// Declare a constructor with no injected parameters: the closure receives
    /// only the caller-supplied extra arguments.
    pub fn constructor<F>(mut self, construct: F) -> Self
    where
        F: Fn(ArgList) -> Result<T> + Send + Sync + 'static,
    {
        self.plan.construct = Some(Box::new(move |args| {
            construct(args).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
        }));
        self
    }

    /// Declare constructor injection: each key in `params` is resolved in
    /// order and handed to the closure ahead of any extra arguments.
    pub fn constructor_with<F>(mut self, params: Vec<ServiceKey>, construct: F) -> Self
    where
        F: Fn(ArgList) -> Result<T> + Send + Sync + 'static,
    {
        self.plan.ctor_params = Some(params);
        self.constructor(construct)
    }

    /// Declare an injectable property whose dependency key is the value type.
    pub fn property<D, F>(self, name: &'static str, assign: F) -> Self
    where
        D: Send + Sync + 'static,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        self.keyed_property(name, ServiceKey::of::<D>(), assign)
    }

    /// Declare an injectable property resolved under an explicit key.
    ///
    /// The resolved value must still downcast to `D`; use this when the
    /// property's dependency is registered under an abstract identity whose
    /// chain ends in `D`.
    pub fn keyed_property<D, F>(mut self, name: &'static str, key: ServiceKey, assign: F) -> Self
    where
        D: Send + Sync + 'static,
        F: Fn(&mut T, Arc<D>) + Send + Sync + 'static,
    {
        let target = self.plan.target;
        self.plan.properties.push(PropertySpec {
            name,
            target: key,
            assign: Box::new(move |product, value| {
                let product = product.downcast_mut::<T>().ok_or_else(|| {
                    DiError::construction_failed(target, "product type changed mid-build")
                })?;
                let value = value.downcast::<D>().map_err(|_| {
                    DiError::construction_failed(
                        target,
                        format!(
                            "property `{name}` expects a `{}`",
                            std::any::type_name::<D>()
                        ),
                    )
                })?;
                assign(product, value);
                Ok(())
            }),
        });
        self
    }

    /// Declare an injectable method: each key in `params` is resolved in order
    /// and handed to the closure, followed by any caller-supplied extras.
    pub fn method<F>(mut self, name: &'static str, params: Vec<ServiceKey>, invoke: F) -> Self
    where
        F: Fn(&mut T, ArgList) -> Result<()> + Send + Sync + 'static,
    {
        let target = self.plan.target;
        self.plan.methods.push(MethodSpec {
            name,
            params,
            invoke: Box::new(move |product, args| {
                let product = product.downcast_mut::<T>().ok_or_else(|| {
                    DiError::construction_failed(target, "product type changed mid-build")
                })?;
                invoke(product, args)
            }),
        });
        self
    }

    /// Finalize the plan.
    #[inline]
    pub fn finish(self) -> InjectionPlan {
        self.plan
    }
}

// =============================================================================
// Provider interface + table implementation
// =============================================================================

/// Source of injection plans, consumed by the resolution core.
///
/// `None` means the type is unknown to the provider; a class binding for such
/// a type fails with [`DiError::MetadataUnavailable`].
pub trait MetadataProvider: Send + Sync {
    /// Look up the plan for a key.
    fn plan_for(&self, key: ServiceKey) -> Option<Arc<InjectionPlan>>;
}

/// A provider with no plans at all.
///
/// The default for containers that only use factory and instance bindings.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMetadata;

impl MetadataProvider for NoMetadata {
    #[inline]
    fn plan_for(&self, _key: ServiceKey) -> Option<Arc<InjectionPlan>> {
        None
    }
}

/// Table-based [`MetadataProvider`]: plans registered explicitly, keyed by
/// their target.
///
/// Registration is write-once-then-read-many, so a plain `HashMap` behind an
/// `Arc` is enough; the concurrent map lives in the binding registry where
/// mutation actually happens.
#[derive(Default)]
pub struct MetadataRegistry {
    plans: HashMap<ServiceKey, Arc<InjectionPlan>>,
}

impl MetadataRegistry {
    /// Create an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plan, replacing any previous plan for the same target.
    pub fn insert(&mut self, plan: InjectionPlan) {
        self.plans.insert(plan.target(), Arc::new(plan));
    }

    /// Chainable [`MetadataRegistry::insert`].
    #[inline]
    pub fn with(mut self, plan: InjectionPlan) -> Self {
        self.insert(plan);
        self
    }

    /// Number of registered plans.
    #[inline]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Whether the registry holds no plans.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

impl MetadataProvider for MetadataRegistry {
    #[inline]
    fn plan_for(&self, key: ServiceKey) -> Option<Arc<InjectionPlan>> {
        self.plans.get(&key).map(Arc::clone)
    }
}

impl std::fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataRegistry")
            .field("plans", &self.plans.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Engine {
        hp: u32,
    }

    struct Car {
        engine: Arc<Engine>,
        plate: u32,
    }

    #[test]
    fn test_arg_list_positional_take() {
        let mut args = ArgList::new(
            ServiceKey::of::<Car>(),
            vec![arg(Engine { hp: 90 }), arg(7u32)],
        );

        let engine = args.take::<Engine>().unwrap();
        assert_eq!(engine.hp, 90);
        let plate = args.take::<u32>().unwrap();
        assert_eq!(*plate, 7);
        assert!(args.is_exhausted());
    }

    #[test]
    fn test_arg_list_arity_error() {
        let mut args = ArgList::new(ServiceKey::of::<Car>(), vec![]);
        let err = args.take::<u32>().unwrap_err();
        assert!(matches!(err, DiError::ConstructionFailed { .. }));
        assert!(err.to_string().contains("arity"));
    }

    #[test]
    fn test_arg_list_type_error() {
        let mut args = ArgList::new(ServiceKey::of::<Car>(), vec![arg("nope")]);
        let err = args.take::<u32>().unwrap_err();
        assert!(err.to_string().contains("u32"));
    }

    #[test]
    fn test_plan_builder_records_specs_in_order() {
        let plan = InjectionPlan::for_type::<Car>()
            .constructor_with(vec![ServiceKey::of::<Engine>()], |mut args| {
                Ok(Car {
                    engine: args.take()?,
                    plate: *args.take::<u32>()?,
                })
            })
            .method("first", vec![], |_, _| Ok(()))
            .method("second", vec![], |_, _| Ok(()))
            .finish();

        assert_eq!(plan.target(), ServiceKey::of::<Car>());
        assert_eq!(plan.ctor_params.as_deref(), Some(&[ServiceKey::of::<Engine>()][..]));
        assert!(!plan.is_passthrough());
        assert_eq!(plan.methods[0].name, "first");
        assert_eq!(plan.methods[1].name, "second");
        assert!(plan.method("missing").is_none());
    }

    #[test]
    fn test_passthrough_plan() {
        let plan = InjectionPlan::for_type::<Engine>()
            .constructor(|_| Ok(Engine { hp: 1 }))
            .finish();
        assert!(plan.is_passthrough());
    }

    #[test]
    fn test_registry_lookup_and_replace() {
        let mut registry = MetadataRegistry::new();
        assert!(registry.is_empty());

        registry.insert(
            InjectionPlan::for_type::<Engine>()
                .constructor(|_| Ok(Engine { hp: 1 }))
                .finish(),
        );
        registry.insert(
            InjectionPlan::for_type::<Engine>()
                .constructor(|_| Ok(Engine { hp: 2 }))
                .finish(),
        );

        assert_eq!(registry.len(), 1);
        let plan = registry.plan_for(ServiceKey::of::<Engine>()).unwrap();
        let built = (plan.construct.as_ref().unwrap())(ArgList::new(
            ServiceKey::of::<Engine>(),
            vec![],
        ))
        .unwrap();
        assert_eq!(built.downcast_ref::<Engine>().unwrap().hp, 2);
    }
}
