//! # Bindery - Metadata-Driven Object-Graph Construction for Rust
//!
//! A dependency-injection container built around explicit type bindings:
//! register how each type is produced, then resolve any key into a
//! fully-initialized instance with constructor, property, and method
//! injection wired automatically.
//!
//! ## Features
//!
//! - 🧩 **Four binding strategies** - class (pipeline-built), factory,
//!   pre-built instance, and a singleton decorator over any of them
//! - 🔗 **Alias chasing** - bind an abstract key to another bound key and
//!   resolution follows the chain, with cycle detection
//! - ♻️ **Reversible registries** - snapshot the binding table and restore it
//!   wholesale (memento)
//! - 🏗️ **Staged pipeline** - construct → inject properties → inject methods,
//!   enforced by an explicit state machine
//! - 🔌 **Pluggable metadata** - the core consumes an injection-plan provider;
//!   plans are explicit registration tables, no reflection
//! - 📊 **Observable** - optional tracing integration with JSON or pretty output
//!
//! ## Quick Start
//!
//! ```rust
//! use bindery::{Container, InjectionPlan, MetadataRegistry, ServiceKey};
//! use std::sync::Arc;
//!
//! struct Engine {
//!     hp: u32,
//! }
//!
//! struct Car {
//!     engine: Arc<Engine>,
//! }
//!
//! // Describe how each type is constructed and what it needs.
//! let metadata = MetadataRegistry::new()
//!     .with(
//!         InjectionPlan::for_type::<Engine>()
//!             .constructor(|_| Ok(Engine { hp: 120 }))
//!             .finish(),
//!     )
//!     .with(
//!         InjectionPlan::for_type::<Car>()
//!             .constructor_with(vec![ServiceKey::of::<Engine>()], |mut args| {
//!                 Ok(Car { engine: args.take()? })
//!             })
//!             .finish(),
//!     );
//!
//! // Bind and resolve.
//! let container = Container::with_metadata(Arc::new(metadata));
//! container.singleton::<Engine, Engine>();
//! container.bind::<Car, Car>();
//!
//! let car = container.resolve::<Car>().unwrap();
//! assert_eq!(car.engine.hp, 120);
//! ```
//!
//! ## Binding Strategies
//!
//! ```rust
//! use bindery::Container;
//!
//! #[derive(Default)]
//! struct Config {
//!     debug: bool,
//! }
//!
//! struct RequestId(u64);
//!
//! let container = Container::new();
//!
//! // Pre-built instance - identity preserved across resolves
//! container.instance::<Config, _>(Config { debug: true });
//!
//! // Factory - the closure owns production and may resolve dependencies
//! container.bind_factory::<RequestId, _, _>(|_| Ok(RequestId(7)));
//!
//! // Singleton factory - first result cached, producer never re-runs
//! container.singleton_factory::<Vec<u8>, _, _>(|_| Ok(vec![0u8; 1024]));
//! ```
//!
//! ## Aliasing and Snapshots
//!
//! ```rust
//! use bindery::Container;
//!
//! struct Logger {
//!     level: u8,
//! }
//! struct DefaultLogger;
//!
//! let container = Container::new();
//! container.instance::<Logger, _>(Logger { level: 3 });
//! // DefaultLogger delegates to whatever Logger is bound to.
//! container.bind::<DefaultLogger, Logger>();
//!
//! let snapshot = container.save();
//! container.unbind::<DefaultLogger>();
//! container.restore(&snapshot);
//!
//! let logger = container.resolve_as::<DefaultLogger, Logger>().unwrap();
//! assert_eq!(logger.level, 3);
//! ```

mod autowire;
mod binding;
mod builder;
mod container;
mod error;
mod key;
#[cfg(feature = "logging")]
pub mod logging;
mod metadata;
mod registry;

pub use autowire::*;
pub use builder::*;
pub use container::*;
pub use error::*;
pub use key::*;
pub use metadata::*;
pub use registry::Memento;

// Re-export tracing macros for convenience when logging feature is enabled
#[cfg(feature = "logging")]
pub use tracing::{debug, error, info, trace, warn};

// Re-export for convenience
pub use std::sync::Arc;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        arg, AutowireRegistry, Container, DiError, InjectionPlan, InstanceBuilder,
        InstanceBuilderFactory, Memento, MetadataProvider, MetadataRegistry, Result, ServiceKey,
    };
    pub use std::sync::Arc;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct Database {
        url: String,
    }

    struct Cache {
        size: usize,
    }

    struct UserService {
        db: Arc<Database>,
        cache: Arc<Cache>,
        audit: Vec<u32>,
    }

    fn metadata() -> MetadataRegistry {
        MetadataRegistry::new()
            .with(
                InjectionPlan::for_type::<Database>()
                    .constructor(|_| {
                        Ok(Database {
                            url: "postgres://localhost".into(),
                        })
                    })
                    .finish(),
            )
            .with(
                InjectionPlan::for_type::<Cache>()
                    .constructor(|_| Ok(Cache { size: 1024 }))
                    .finish(),
            )
            .with(
                InjectionPlan::for_type::<UserService>()
                    .constructor_with(
                        vec![ServiceKey::of::<Database>(), ServiceKey::of::<Cache>()],
                        |mut args| {
                            Ok(UserService {
                                db: args.take()?,
                                cache: args.take()?,
                                audit: (0..args.remaining())
                                    .map(|_| args.take::<u32>().map(|v| *v))
                                    .collect::<Result<_>>()?,
                            })
                        },
                    )
                    .finish(),
            )
    }

    #[test]
    fn test_graph_resolution_end_to_end() {
        let container = Container::with_metadata(Arc::new(metadata()));
        container.singleton::<Database, Database>();
        container.bind::<Cache, Cache>();
        container.bind::<UserService, UserService>();

        let service = container.resolve::<UserService>().unwrap();
        assert_eq!(service.db.url, "postgres://localhost");
        assert_eq!(service.cache.size, 1024);

        // The database is a singleton: the service's handle and a direct
        // resolve share one instance.
        let db = container.resolve::<Database>().unwrap();
        assert!(Arc::ptr_eq(&service.db, &db));
    }

    #[test]
    fn test_constructor_receives_injected_then_extra_args() {
        let container = Container::with_metadata(Arc::new(metadata()));
        container.bind::<Database, Database>();
        container.bind::<Cache, Cache>();
        container.bind_with_args::<UserService, UserService>(args![10u32, 20u32]);

        let service = container.resolve::<UserService>().unwrap();
        assert_eq!(service.audit, vec![10, 20]);
    }

    #[test]
    fn test_singleton_class_binding_builds_once() {
        static BUILDS: AtomicU32 = AtomicU32::new(0);

        struct Tracker;

        let metadata = MetadataRegistry::new().with(
            InjectionPlan::for_type::<Tracker>()
                .constructor(|_| {
                    BUILDS.fetch_add(1, Ordering::SeqCst);
                    Ok(Tracker)
                })
                .finish(),
        );
        let container = Container::with_metadata(Arc::new(metadata));
        container.singleton::<Tracker, Tracker>();

        let a = container.resolve::<Tracker>().unwrap();
        let b = container.resolve::<Tracker>().unwrap();
        assert_eq!(BUILDS.load(Ordering::SeqCst), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_property_then_method_injection_order() {
        struct Recorder {
            events: Mutex<Vec<&'static str>>,
        }

        struct Subject;

        let metadata = MetadataRegistry::new().with(
            InjectionPlan::for_type::<Subject>()
                .constructor(|_| Ok(Subject))
                .property::<Recorder, _>("first", |_, recorder| {
                    recorder.events.lock().unwrap().push("property");
                })
                .method("setup", vec![ServiceKey::of::<Recorder>()], |_, mut args| {
                    let recorder = args.take::<Recorder>()?;
                    recorder.events.lock().unwrap().push("method");
                    Ok(())
                })
                .finish(),
        );
        let container = Container::with_metadata(Arc::new(metadata));
        let recorder = Arc::new(Recorder {
            events: Mutex::new(Vec::new()),
        });
        container.instance_shared::<Recorder, _>(Arc::clone(&recorder));
        container.bind::<Subject, Subject>();

        container.resolve::<Subject>().unwrap();
        assert_eq!(*recorder.events.lock().unwrap(), vec!["property", "method"]);
    }

    #[test]
    fn test_alias_resolution_uses_target_binding() {
        struct Primary;

        let container = Container::new();
        container.instance::<Database, _>(Database { url: "real".into() });
        container.bind::<Primary, Database>();

        let via_alias = container.resolve_as::<Primary, Database>().unwrap();
        let direct = container.resolve::<Database>().unwrap();
        assert!(Arc::ptr_eq(&via_alias, &direct));
    }

    #[test]
    fn test_restore_reverts_bindings_made_after_save() {
        let container = Container::with_metadata(Arc::new(metadata()));
        container.bind::<Database, Database>();

        let snapshot = container.save();

        container.bind::<Cache, Cache>();
        container.unbind::<Database>();
        assert!(container.is_bound::<Cache>());
        assert!(!container.is_bound::<Database>());

        container.restore(&snapshot);
        assert!(!container.is_bound::<Cache>());
        assert!(container.is_bound::<Database>());
        assert!(container.resolve::<Database>().is_ok());
    }
}
