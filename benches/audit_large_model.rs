//! This bench audits a generated model of a few thousand interlinked
//! elements spread over the business and application layers.

#![allow(missing_docs)]

use archmodel::{
    AuditOrchestrator, Config, ModelElement, ModelSnapshot, SpecRegistry,
    ValidationRunner, ValidationScope, storage::ModelMetadata,
};
use criterion::{Criterion, criterion_group, criterion_main};

const SERVICES: usize = 1_000;
const COMPONENTS: usize = 2_000;

/// Generates services that use their neighbour and components that realize
/// a service and use the previous component.
fn generate_model() -> ModelSnapshot {
    let mut elements = Vec::with_capacity(SERVICES + COMPONENTS);

    for i in 0..SERVICES {
        let mut service = ModelElement::new(
            format!("business-service-s{i}"),
            "business",
            "service",
            format!("Service {i}"),
        );
        if i > 0 {
            service = service.with_relationship("uses", format!("business-service-s{}", i - 1));
        }
        elements.push(service);
    }

    for i in 0..COMPONENTS {
        let mut component = ModelElement::new(
            format!("application-component-c{i}"),
            "application",
            "component",
            format!("Component {i}"),
        )
        .with_relationship("realizes", format!("business-service-s{}", i % SERVICES));
        if i % 7 != 0 && i > 0 {
            component =
                component.with_relationship("uses", format!("application-component-c{}", i - 1));
        }
        elements.push(component);
    }

    let metadata = ModelMetadata {
        name: "bench".to_string(),
        version: "1.0.0".to_string(),
        description: None,
    };
    ModelSnapshot::new(metadata, elements)
}

fn audit_large_model(c: &mut Criterion) {
    let registry = SpecRegistry::builtin().unwrap();
    let config = Config::default();
    let snapshot = generate_model();
    let orchestrator = AuditOrchestrator::new(&registry, &config);

    c.bench_function("audit large model", |b| {
        b.iter(|| orchestrator.audit(&snapshot, None));
    });

    c.bench_function("audit single layer", |b| {
        b.iter(|| orchestrator.audit(&snapshot, Some("application")));
    });

    c.bench_function("validate large model", |b| {
        let runner = ValidationRunner::new(&registry);
        b.iter(|| runner.run(&snapshot, &ValidationScope::All));
    });
}

criterion_group!(benches, audit_large_model);
criterion_main!(benches);
