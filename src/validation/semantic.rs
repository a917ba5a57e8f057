//! Model-wide semantic rules: unique ids and permitted relationships.

use std::collections::HashMap;

use crate::{
    domain::{Finding, ModelElement, Validator},
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
    // id -> layer of its first occurrence
    let mut seen: HashMap<&str, &str> = HashMap::with_capacity(snapshot.len());

    for element in snapshot.elements() {
        let first = if element.id.is_empty() {
            None
        } else {
            seen.get(element.id.as_str()).copied()
        };

        if !scope.includes(element) {
            seen.entry(&element.id).or_insert(&element.layer);
            continue;
        }

        if let Some(first_layer) = first {
            findings.push(Finding::error(
                Validator::Semantic,
                &element.id,
                format!(
                    "duplicate id '{}': already declared in layer '{first_layer}'",
                    element.id
                ),
            ));
        } else {
            seen.insert(&element.id, &element.layer);
        }

        check_relationships(element, snapshot, registry, &mut findings);
    }

    findings
}

fn check_relationships(
    element: &ModelElement,
    snapshot: &ModelSnapshot,
    registry: &SpecRegistry,
    findings: &mut Vec<Finding>,
) {
    if element.relationships.is_empty() {
        return;
    }

    // Unknown node types are a schema error; there is nothing to check
    // predicates against.
    let Some(source_type) = element
        .spec_node_id()
        .filter(|id| registry.node_type(id).is_some())
    else {
        return;
    };

    let valid_predicates = registry.valid_predicates_for_source(&source_type);

    for relationship in &element.relationships {
        let predicate = relationship.predicate.as_str();
        let predicate_valid = valid_predicates.iter().any(|p| p == predicate);

        if !predicate_valid {
            let message = format!("predicate '{predicate}' is not valid for {source_type}");
            findings.push(if registry.is_advisory(predicate) {
                Finding::warning(Validator::Semantic, &element.id, message)
            } else {
                Finding::error(Validator::Semantic, &element.id, message)
            });
        }

        let Some(target) = snapshot.find(&relationship.target) else {
            findings.push(Finding::error(
                Validator::Semantic,
                &element.id,
                format!(
                    "relationship '{predicate}' targets '{}', which does not exist",
                    relationship.target
                ),
            ));
            continue;
        };

        if predicate_valid {
            if let Some(target_type) = target.spec_node_id() {
                if !registry.is_valid_relationship(&source_type, predicate, &target_type) {
                    findings.push(Finding::warning(
                        Validator::Semantic,
                        &element.id,
                        format!(
                            "relationship {source_type} --{predicate}--> {target_type} is not \
                             specified"
                        ),
                    ));
                }
            }
        }
    }
}
