use serde_json::json;

use crate::{
    domain::{FieldDefinition, FieldKind, FieldSchema, Layout, SelectOption},
    form::{FormEngine, FormPhase, NUMBER_MESSAGE, REQUIRED_MESSAGE, SubmitReadiness},
};

fn plan_form() -> FormEngine {
    let schema = FieldSchema::new([
        FieldDefinition::new("nombre", "Nombre", FieldKind::String)
            .required()
            .with_length(Some(2), Some(40)),
        FieldDefinition::new("precio", "Precio", FieldKind::Number).with_range(Some(0.0), None),
        FieldDefinition::new(
            "plan",
            "Plan",
            FieldKind::Select {
                options: vec![SelectOption::new("Mensual", 1), SelectOption::new("Anual", 12)],
            },
        ),
        FieldDefinition::new("codigo", "Código", FieldKind::String)
            .with_default("AUTO")
            .disabled(),
    ])
    .expect("schema");
    let layout = Layout::stacked(["nombre", "precio", "plan", "codigo"]);
    FormEngine::new(schema, &layout).expect("engine")
}

#[test]
fn new_form_starts_idle_with_defaults() {
    let engine = plan_form();
    assert_eq!(engine.phase(), FormPhase::Idle);
    assert_eq!(engine.state().value("codigo"), "AUTO");
    assert!(!engine.state().is_dirty());
}

#[test]
fn first_change_enters_editing_and_validates_synchronously() {
    let mut engine = plan_form();
    engine.change("precio", "12a");
    assert_eq!(engine.phase(), FormPhase::Editing);
    assert_eq!(engine.state().error("precio"), Some(NUMBER_MESSAGE));
    engine.change("precio", "12");
    assert_eq!(engine.state().error("precio"), None);
    assert!(engine.state().is_field_dirty("precio"));
}

#[test]
fn disabled_and_unknown_fields_ignore_changes() {
    let mut engine = plan_form();
    engine.change("codigo", "MANUAL");
    engine.change("missing", "x");
    assert_eq!(engine.state().value("codigo"), "AUTO");
    assert_eq!(engine.phase(), FormPhase::Idle);
}

#[test]
fn request_submit_reports_every_invalid_field() {
    let mut engine = plan_form();
    engine.change("precio", "-3");
    assert_eq!(
        engine.request_submit(),
        SubmitReadiness::Invalid { issues: 2 }
    );
    assert_eq!(engine.state().error("nombre"), Some(REQUIRED_MESSAGE));
    assert!(engine.state().error("precio").is_some());
    assert_eq!(engine.status().message(), "2 issue(s) remaining");
}

#[test]
fn request_submit_is_ready_without_async_validators() {
    let mut engine = plan_form();
    engine.change("nombre", "Ana");
    engine.change("plan", "12");
    assert_eq!(engine.request_submit(), SubmitReadiness::Ready);
    assert_eq!(engine.phase(), FormPhase::Editing);
}

#[test]
fn initial_values_seed_edit_forms() {
    let entity = json!({"nombre": "Ana", "precio": 30, "plan": 12});
    let engine = plan_form().with_initial_values(entity.as_object().expect("object"));
    assert_eq!(engine.state().value("precio"), "30");
    assert_eq!(engine.state().value("plan"), "12");
    assert_eq!(engine.state().value("codigo"), "AUTO");
}

#[test]
fn reset_restores_defaults_and_clears_errors() {
    let mut engine = plan_form();
    engine.change("precio", "abc");
    engine.reset();
    assert_eq!(engine.state().value("precio"), "");
    assert_eq!(engine.state().error_count(), 0);
    assert_eq!(engine.phase(), FormPhase::Idle);
}

#[test]
fn closed_form_ignores_events() {
    let mut engine = plan_form();
    engine.close();
    engine.change("nombre", "Ana");
    assert_eq!(engine.state().value("nombre"), "");
    assert_eq!(engine.request_submit(), SubmitReadiness::Closed);
    assert!(engine.is_closed());
}
