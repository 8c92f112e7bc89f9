//! Example demonstrating logging capabilities
//!
//! Run with JSON logging (production):
//! ```bash
//! cargo run --example logging --features logging-json
//! ```
//!
//! Run with pretty logging (development):
//! ```bash
//! cargo run --example logging --features logging-pretty
//! ```

use bindery::Container;

#[allow(dead_code)]
struct Database {
    url: String,
}

#[allow(dead_code)]
struct RequestContext {
    request_id: String,
}

fn main() {
    // Uses JSON if logging-json is enabled, pretty if logging-pretty is.
    #[cfg(feature = "logging")]
    {
        bindery::logging::init();
    }

    println!("=== Bindery Logging Demo ===\n");

    // Logs: "Creating new container"
    let container = Container::new();

    // Logs: "Registering binding" with kind = "instance"
    container.instance::<Database, _>(Database {
        url: "postgres://localhost/mydb".into(),
    });

    // Logs: "Registering binding" with kind = "singleton-factory"
    container.singleton_factory::<RequestContext, _, _>(|_| {
        println!("  [App] request context being created...");
        Ok(RequestContext {
            request_id: "default".into(),
        })
    });

    // Logs: "Resolving" at trace level, then the singleton init at debug
    let _ = container.resolve::<Database>().expect("database resolves");
    let _ = container.resolve::<RequestContext>().expect("context resolves");
    // Second resolve logs the cached-instance path instead
    let _ = container.resolve::<RequestContext>().expect("context resolves");

    // Logs: "Saved registry snapshot" / "Restored registry snapshot"
    let snapshot = container.save();
    container.unbind::<Database>();
    container.restore(&snapshot);

    println!("\ndone - bound services: {}", container.len());
}
