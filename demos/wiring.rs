//! Example demonstrating metadata-driven wiring of an object graph
//!
//! Run with:
//!   cargo run --example wiring

use bindery::{
    args, AutowireRegistry, Container, InjectionPlan, MetadataRegistry, ServiceKey,
};
use std::sync::Arc;

struct Engine {
    hp: u32,
}

struct Radio {
    station: &'static str,
}

struct Car {
    engine: Arc<Engine>,
    plate: u32,
    radio: Option<Arc<Radio>>,
}

impl Car {
    fn describe(&self) -> String {
        let radio = self
            .radio
            .as_ref()
            .map(|r| r.station)
            .unwrap_or("no radio");
        format!(
            "Car #{} with a {}hp engine, tuned to {}",
            self.plate, self.engine.hp, radio
        )
    }
}

fn metadata() -> MetadataRegistry {
    MetadataRegistry::new()
        .with(
            InjectionPlan::for_type::<Engine>()
                .constructor(|_| Ok(Engine { hp: 120 }))
                .finish(),
        )
        .with(
            InjectionPlan::for_type::<Car>()
                // Constructor: injected Engine first, then the extra plate number.
                .constructor_with(vec![ServiceKey::of::<Engine>()], |mut a| {
                    Ok(Car {
                        engine: a.take()?,
                        plate: *a.take::<u32>()?,
                        radio: None,
                    })
                })
                // Property: resolved and assigned after construction.
                .property::<Radio, _>("radio", |car, radio| car.radio = Some(radio))
                .finish(),
        )
}

fn main() {
    let container = Container::with_metadata(Arc::new(metadata()));

    // The engine is shared: one instance for every car.
    container.singleton::<Engine, Engine>();
    container.instance::<Radio, _>(Radio { station: "98.5 FM" });
    container.bind_with_args::<Car, Car>(args![7u32]);

    let car = container.resolve::<Car>().expect("car resolves");
    println!("{}", car.describe());

    // Aliasing: a second identity that delegates to the bound Car.
    struct CompanyCar;
    container.bind::<CompanyCar, Car>();
    let company = container
        .resolve_as::<CompanyCar, Car>()
        .expect("alias resolves");
    println!("company car -> {}", company.describe());

    // Snapshot, rebind, restore.
    let snapshot = container.save();
    container.unbind::<Car>();
    assert!(container.resolve::<Car>().is_err());
    container.restore(&snapshot);
    println!(
        "after restore -> {}",
        container.resolve::<Car>().expect("restored").describe()
    );

    // Autowiring: a Car built by hand still gets its radio injected.
    let mut autowire = AutowireRegistry::new();
    autowire.set_default_container(container.clone());
    let handmade = Car {
        engine: container.resolve::<Engine>().expect("engine resolves"),
        plate: 99,
        radio: None,
    };
    let wired = autowire.wire(handmade).expect("wiring succeeds");
    println!("handmade -> {}", wired.describe());
}
