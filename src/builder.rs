//! Staged instance assembly: construct, inject properties, inject methods
//!
//! An [`InstanceBuilder`] walks one instance through the injection pipeline.
//! Stage order is enforced by an explicit state machine rather than call-order
//! discipline; a stage invoked out of turn fails with
//! [`DiError::OutOfOrderBuild`] instead of producing a half-wired object.
//!
//! Two entry stages exist: [`InstanceBuilder::construct`] builds a fresh
//! instance from the plan's constructor, and [`InstanceBuilder::adopt`] takes
//! over an already-constructed one (the autowiring path). After the pipeline
//! has run, [`InstanceBuilder::product`] releases the instance; repeated calls
//! return the same `Arc`.

use crate::container::Container;
use crate::error::{DiError, Result};
use crate::key::ServiceKey;
use crate::metadata::{AnyInstance, ArgList, InjectionPlan, MethodSpec};
use std::any::Any;
use std::sync::Arc;

#[cfg(feature = "logging")]
use tracing::trace;

/// Pipeline position of a builder.
enum BuildState {
    /// No instance yet; `construct` or `adopt` must run first
    Empty,
    /// Freshly constructed, injections pending
    Constructed(Box<dyn Any + Send + Sync>),
    /// Adopted pre-built instance; product may be taken immediately
    Adopted(Box<dyn Any + Send + Sync>),
    /// Properties assigned
    PropertiesInjected(Box<dyn Any + Send + Sync>),
    /// Methods invoked; pipeline complete
    MethodsInjected(Box<dyn Any + Send + Sync>),
    /// Product released as an `Arc`; further `product` calls clone it
    Released(AnyInstance),
}

impl BuildState {
    fn name(&self) -> &'static str {
        match self {
            BuildState::Empty => "empty",
            BuildState::Constructed(_) => "constructed",
            BuildState::Adopted(_) => "adopted",
            BuildState::PropertiesInjected(_) => "properties-injected",
            BuildState::MethodsInjected(_) => "methods-injected",
            BuildState::Released(_) => "released",
        }
    }

    /// Mutable access to the in-progress instance, in any state that has one.
    fn product_mut(&mut self) -> Option<&mut (dyn Any + Send + Sync)> {
        match self {
            BuildState::Empty | BuildState::Released(_) => None,
            BuildState::Constructed(p)
            | BuildState::Adopted(p)
            | BuildState::PropertiesInjected(p)
            | BuildState::MethodsInjected(p) => Some(p.as_mut()),
        }
    }
}

/// Single-use assembler for one resolution.
///
/// A failed injection stage discards the half-wired instance and resets the
/// builder to empty; the dependency error propagates unchanged.
pub struct InstanceBuilder {
    container: Container,
    plan: Arc<InjectionPlan>,
    state: BuildState,
}

impl InstanceBuilder {
    fn new(container: Container, plan: Arc<InjectionPlan>) -> Self {
        Self {
            container,
            plan,
            state: BuildState::Empty,
        }
    }

    /// The key of the type under construction.
    #[inline]
    pub fn target(&self) -> ServiceKey {
        self.plan.target()
    }

    /// Entry stage: resolve declared constructor parameters in order, append
    /// `extra` after them, and run the plan's constructor.
    ///
    /// Plans that declare no constructor injection forward `extra` alone as
    /// the full argument list. A plan without a construct closure cannot
    /// build and fails with [`DiError::MetadataUnavailable`].
    pub fn construct(&mut self, extra: &[AnyInstance]) -> Result<&mut Self> {
        if !matches!(self.state, BuildState::Empty) {
            return Err(DiError::out_of_order("construct", self.state.name()));
        }

        let key = self.plan.target();
        let construct = self
            .plan
            .construct
            .as_ref()
            .ok_or_else(|| DiError::metadata_unavailable(key))?;

        let declared = self.plan.ctor_params.as_deref().unwrap_or(&[]);
        let mut values = Vec::with_capacity(declared.len() + extra.len());
        for param in declared {
            values.push(self.container.resolve_key(*param)?);
        }
        values.extend(extra.iter().cloned());

        #[cfg(feature = "logging")]
        trace!(
            target: "bindery",
            key = key.name(),
            injected = declared.len(),
            extra = extra.len(),
            "Constructing instance"
        );

        let product = construct(ArgList::new(key, values))?;
        self.state = BuildState::Constructed(product);
        Ok(self)
    }

    /// Alternative entry stage: adopt an already-constructed instance instead
    /// of building one. Used when wiring objects created outside the
    /// container; the product may be taken immediately or after injections.
    pub fn adopt(&mut self, instance: Box<dyn Any + Send + Sync>) -> Result<&mut Self> {
        if !matches!(self.state, BuildState::Empty) {
            return Err(DiError::out_of_order("adopt", self.state.name()));
        }

        #[cfg(feature = "logging")]
        trace!(
            target: "bindery",
            key = self.plan.target().name(),
            "Adopting pre-built instance"
        );

        self.state = BuildState::Adopted(instance);
        Ok(self)
    }

    /// Resolve and assign each declared property, in declaration order.
    ///
    /// Properties must not depend on each other; the order is fixed but not a
    /// contract the assigned values may rely on.
    pub fn inject_properties(&mut self) -> Result<&mut Self> {
        let mut product = match std::mem::replace(&mut self.state, BuildState::Empty) {
            BuildState::Constructed(p) | BuildState::Adopted(p) => p,
            other => {
                let state = other.name();
                self.state = other;
                return Err(DiError::out_of_order("inject_properties", state));
            }
        };

        for spec in &self.plan.properties {
            #[cfg(feature = "logging")]
            trace!(
                target: "bindery",
                key = self.plan.target().name(),
                property = spec.name,
                dependency = spec.target.name(),
                "Injecting property"
            );

            let value = self.container.resolve_key(spec.target)?;
            (spec.assign)(product.as_mut(), value)?;
        }

        self.state = BuildState::PropertiesInjected(product);
        Ok(self)
    }

    /// Resolve parameters and invoke each declared method, in declaration
    /// order, with no extra arguments.
    pub fn inject_methods(&mut self) -> Result<&mut Self> {
        let mut product = match std::mem::replace(&mut self.state, BuildState::Empty) {
            BuildState::PropertiesInjected(p) => p,
            other => {
                let state = other.name();
                self.state = other;
                return Err(DiError::out_of_order("inject_methods", state));
            }
        };

        for spec in &self.plan.methods {
            run_method(&self.container, self.plan.target(), spec, product.as_mut(), &[])?;
        }

        self.state = BuildState::MethodsInjected(product);
        Ok(self)
    }

    /// Invoke a single declared method directly, appending caller-supplied
    /// extra arguments after the resolved parameters.
    ///
    /// This is the external-caller form of method injection; it requires a
    /// product to exist but does not advance the pipeline.
    pub fn invoke_method(&mut self, name: &str, extra: &[AnyInstance]) -> Result<&mut Self> {
        let spec = self.plan.method(name).ok_or_else(|| DiError::UnknownMethod {
            key: self.plan.target(),
            name: name.to_string(),
        })?;

        let state_name = self.state.name();
        let Some(product) = self.state.product_mut() else {
            return Err(DiError::out_of_order("invoke_method", state_name));
        };
        run_method(&self.container, self.plan.target(), spec, product, extra)?;
        Ok(self)
    }

    /// Release the assembled instance.
    ///
    /// Available once the pipeline has completed, or immediately after
    /// [`InstanceBuilder::adopt`]. Idempotent: every call returns the same
    /// `Arc`.
    pub fn product(&mut self) -> Result<AnyInstance> {
        match std::mem::replace(&mut self.state, BuildState::Empty) {
            BuildState::MethodsInjected(p) | BuildState::Adopted(p) => {
                let released: AnyInstance = Arc::from(p);
                self.state = BuildState::Released(Arc::clone(&released));
                Ok(released)
            }
            BuildState::Released(p) => {
                let clone = Arc::clone(&p);
                self.state = BuildState::Released(p);
                Ok(clone)
            }
            other => {
                let state = other.name();
                self.state = other;
                Err(DiError::out_of_order("product", state))
            }
        }
    }
}

/// Resolve a method's declared parameters, append extras, invoke.
fn run_method(
    container: &Container,
    target: ServiceKey,
    spec: &MethodSpec,
    product: &mut (dyn Any + Send + Sync),
    extra: &[AnyInstance],
) -> Result<()> {
    #[cfg(feature = "logging")]
    trace!(
        target: "bindery",
        key = target.name(),
        method = spec.name,
        params = spec.params.len(),
        extra = extra.len(),
        "Invoking injectable method"
    );

    let mut values = Vec::with_capacity(spec.params.len() + extra.len());
    for param in &spec.params {
        values.push(container.resolve_key(*param)?);
    }
    values.extend(extra.iter().cloned());

    (spec.invoke)(product, ArgList::new(target, values))
}

impl std::fmt::Debug for InstanceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceBuilder")
            .field("target", &self.plan.target())
            .field("state", &self.state.name())
            .finish()
    }
}

/// Selects the builder for a target type by consulting the container's
/// metadata provider.
pub struct InstanceBuilderFactory;

impl InstanceBuilderFactory {
    /// Create a builder for `key`, bound to `container` for dependency
    /// resolution.
    ///
    /// Fails with [`DiError::MetadataUnavailable`] when the provider has no
    /// plan for the key. A plan with no injection members yields a builder
    /// whose injection stages are no-ops around plain construction.
    pub fn create(container: &Container, key: ServiceKey) -> Result<InstanceBuilder> {
        let plan = container
            .plan_for(key)
            .ok_or_else(|| DiError::metadata_unavailable(key))?;

        #[cfg(feature = "logging")]
        if plan.is_passthrough() {
            trace!(
                target: "bindery",
                key = key.name(),
                "Type declares no injection; using pass-through builder"
            );
        }

        Ok(InstanceBuilder::new(container.clone(), plan))
    }

    /// Create a builder for a sized type.
    #[inline]
    pub fn create_for<T: Send + Sync + 'static>(container: &Container) -> Result<InstanceBuilder> {
        Self::create(container, ServiceKey::of::<T>())
    }
}
