//! Structural checks against node type definitions.

use crate::{
    domain::{Finding, ModelElement, Validator},
    registry::{NodeTypeSpec, SpecRegistry},
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
        check_element(element, registry, &mut findings);
    }
    findings
}

fn check_element(element: &ModelElement, registry: &SpecRegistry, findings: &mut Vec<Finding>) {
    let error = |message: String| Finding::error(Validator::Schema, &element.id, message);

    if element.id.trim().is_empty() {
        findings.push(error(format!(
            "element '{}' in layer '{}' has no id",
            element.name, element.layer
        )));
    }
    if element.attribute("name").is_none() {
        findings.push(error("missing required attribute 'name'".to_string()));
    }

    let Some(node_type) = element
        .spec_node_id()
        .and_then(|id| registry.node_type(&id))
    else {
        findings.push(error(format!(
            "unknown node type '{}.{}'",
            element.layer, element.element_type
        )));
        return;
    };

    for attribute in &node_type.required_attributes {
        if attribute != "name" && element.attribute(attribute).is_none() {
            findings.push(error(format!("missing required attribute '{attribute}'")));
        }
    }

    for (attribute, constraint) in &node_type.attribute_constraints {
        if let Some(value) = element.attribute(attribute) {
            if let Err(violation) = constraint.check(value) {
                findings.push(error(format!("attribute '{attribute}': {violation}")));
            }
        }
    }

    for key in element.properties.keys() {
        if !is_declared(node_type, key) {
            findings.push(Finding::warning(
                Validator::Schema,
                &element.id,
                format!(
                    "attribute '{key}' is not defined for {}",
                    node_type.spec_node_id
                ),
            ));
        }
    }
}

fn is_declared(node_type: &NodeTypeSpec, attribute: &str) -> bool {
    node_type.required_attributes.contains(attribute)
        || node_type.optional_attributes.contains(attribute)
}
