//! Identifier naming convention: `{layer}-{type}-{name}`, the name being
//! lowercase letters, digits and hyphens.

use std::sync::LazyLock;

use regex::Regex;

use crate::{
    domain::{Finding, ModelElement, Validator},
    registry::SpecRegistry,
    storage::ModelSnapshot,
    validation::ValidationScope,
};

pub(super) fn validate(
    snapshot: &ModelSnapshot,
    _registry: &SpecRegistry,
    scope: &ValidationScope,
) -> Vec<Finding> {
    scope
        .elements(snapshot)
        // a missing id is a schema error
        .filter(|element| !element.id.trim().is_empty())
        .filter_map(|element| {
            check_id(element)
                .err()
                .map(|message| Finding::error(Validator::Naming, &element.id, message))
        })
        .collect()
}

static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("valid regex"));

/// Checks one id, describing the first rule it breaks.
fn check_id(element: &ModelElement) -> Result<(), String> {
    let id = &element.id;
    let prefix = format!("{}-{}-", element.layer, element.element_type);
    match id.strip_prefix(&prefix) {
        Some(name) if NAME.is_match(name) => Ok(()),
        Some(name) if !name.is_empty() => Err(format!(
            "id '{id}' has name '{name}'; names use lowercase letters, digits and hyphens"
        )),
        _ => Err(format!(
            "id '{id}' must have the form '{prefix}<name>' for a {}.{} element",
            element.layer, element.element_type
        )),
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::validation::tests::snapshot;

    #[test_case("business-service-orders", "business", "service"; "simple")]
    #[test_case("data-model-entity-order-line", "data-model", "entity"; "hyphenated layer")]
    #[test_case("application-data-object-customer", "application", "data-object"; "hyphenated type")]
    #[test_case("api-operation-v2", "api", "operation"; "digits")]
    #[test_case("business-service-order--line", "business", "service"; "double hyphen in name")]
    #[test_case("business-service-orders-", "business", "service"; "trailing hyphen in name")]
    fn accepts(id: &str, layer: &str, element_type: &str) {
        assert!(check_id(&ModelElement::new(id, layer, element_type, "x")).is_ok());
    }

    #[test_case("Business-service-orders", "business", "service"; "uppercase")]
    #[test_case("business_service_orders", "business", "service"; "underscores")]
    #[test_case("business.service.orders", "business", "service"; "dots")]
    #[test_case("business-service-Orders", "business", "service"; "uppercase name")]
    #[test_case("business-service-order_line", "business", "service"; "underscore in name")]
    #[test_case("business-service-", "business", "service"; "trailing hyphen")]
    #[test_case("business-service", "business", "service"; "no name")]
    #[test_case("application-service-orders", "business", "service"; "wrong layer")]
    #[test_case("business-process-orders", "business", "service"; "wrong type")]
    #[test_case("business--service-orders", "business", "service"; "double hyphen")]
    fn rejects(id: &str, layer: &str, element_type: &str) {
        assert!(check_id(&ModelElement::new(id, layer, element_type, "x")).is_err());
    }

    #[test]
    fn one_finding_per_malformed_id() {
        let registry = SpecRegistry::builtin().unwrap();
        let model = snapshot(vec![
            ModelElement::new("Business_Service_X", "business", "service", "X"),
            ModelElement::new("business-service-ok", "business", "service", "Ok"),
            ModelElement::new("", "business", "service", "Anonymous"),
        ]);

        let findings = validate(&model, &registry, &ValidationScope::All);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].element_id.as_deref(), Some("Business_Service_X"));
    }
}
