use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::{
    app::{Control, ControlKind, EnterOutcome, SUBMIT_CONTROL},
    domain::{FieldDefinition, FieldKind, FieldSchema, Layout, LayoutCell},
    form::{FormEngine, REQUIRED_MESSAGE},
};

fn enter() -> KeyEvent {
    KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)
}

fn engine() -> FormEngine {
    let schema = FieldSchema::new([
        FieldDefinition::new("nombre", "Nombre", FieldKind::String).required(),
        FieldDefinition::new("precio", "Precio", FieldKind::Number),
        FieldDefinition::new("color", "Color", FieldKind::Color),
    ])
    .expect("schema");
    // Declared out of order; the grid decides the focus order.
    let layout = Layout::new()
        .with_cell("color", LayoutCell::row(2))
        .with_cell("precio", LayoutCell::new(1, 7, 6))
        .with_cell("nombre", LayoutCell::new(1, 1, 6));
    FormEngine::new(schema, &layout).expect("engine")
}

#[test]
fn enter_walks_fields_in_grid_order_then_submit() {
    let mut engine = engine();
    engine.focus("nombre");
    assert_eq!(
        engine.handle_key(&enter()),
        EnterOutcome::MoveFocus("precio".into())
    );
    assert_eq!(
        engine.handle_key(&enter()),
        EnterOutcome::MoveFocus("color".into())
    );
    assert_eq!(
        engine.handle_key(&enter()),
        EnterOutcome::MoveFocus(SUBMIT_CONTROL.into())
    );
    assert_eq!(engine.focused(), Some(SUBMIT_CONTROL));
    assert_eq!(engine.handle_key(&enter()), EnterOutcome::PassThrough);
}

#[test]
fn leaving_a_field_with_enter_validates_it() {
    let mut engine = engine();
    engine.focus("nombre");
    engine.handle_key(&enter());
    assert_eq!(engine.state().error("nombre"), Some(REQUIRED_MESSAGE));
}

#[test]
fn adornments_are_skipped() {
    let mut engine = engine().with_control_after(
        "nombre",
        Control::new("nombre-clear", ControlKind::Adornment),
    );
    engine.focus("nombre");
    assert_eq!(
        engine.handle_key(&enter()),
        EnterOutcome::MoveFocus("precio".into())
    );
}

#[test]
fn without_submit_the_last_field_swallows_enter() {
    let mut engine = engine().without_submit_control();
    engine.focus("color");
    assert_eq!(engine.handle_key(&enter()), EnterOutcome::Suppressed);
    assert_eq!(engine.focused(), Some("color"));
}

#[test]
fn expanded_select_keeps_enter_for_itself() {
    let mut engine = engine().with_control_after(
        "precio",
        Control::new("moneda", ControlKind::Select),
    );
    engine.focus("moneda");
    assert!(engine.set_expanded("moneda", true));
    assert_eq!(engine.handle_key(&enter()), EnterOutcome::PassThrough);
    engine.set_expanded("moneda", false);
    assert_eq!(
        engine.handle_key(&enter()),
        EnterOutcome::MoveFocus("color".into())
    );
}
