//! Reference integrity and direction.
//!
//! A reference must resolve to an element somewhere in the model, and may
//! only point to the same layer or a lower-numbered one. The two rules are
//! checked independently, so a single reference can break both.

use crate::{
    domain::{Finding, ModelElement, Reference, Validator},
    registry::SpecRegistry,
    storage::ModelSnapshot,
    validation::ValidationScope,
};

pub(super) fn validate(
    snapshot: &ModelSnapshot,
    registry: &SpecRegistry,
    scope: &ValidationScope,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for element in scope.elements(snapshot) {
        let source_layer = registry.layer_number(&element.layer);
        for reference in &element.references {
            check_reference(element, source_layer, reference, snapshot, registry, &mut findings);
        }
    }
    findings
}

fn check_reference(
    element: &ModelElement,
    source_layer: Option<u8>,
    reference: &Reference,
    snapshot: &ModelSnapshot,
    registry: &SpecRegistry,
    findings: &mut Vec<Finding>,
) {
    let target = snapshot.find(&reference.target);

    if target.is_none() {
        findings.push(Finding::error(
            Validator::Reference,
            &element.id,
            format!("broken reference: '{}' does not exist", reference.target),
        ));
    }

    // Missing targets still have a layer implied by their id.
    let target_layer = match target {
        Some(target) => registry.layer_number(&target.layer),
        None => registry.layer_number_of_id(&reference.target),
    };

    if let (Some(source), Some(target_number)) = (source_layer, target_layer) {
        if source < target_number {
            tracing::trace!(
                source = %element.id,
                target = %reference.target,
                "Upward reference"
            );
            findings.push(Finding::error(
                Validator::Reference,
                &element.id,
                format!(
                    "reference to '{}' points up from layer {source} to layer {target_number}; \
                     references must target the same or a lower layer",
                    reference.target
                ),
            ));
        }
    }
}
