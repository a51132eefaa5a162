use crate::{
    form::{FormEngine, SubmitReadiness},
    io::{DocumentFormat, load_form_document},
};

const MEMBER_FORM: &str = r#"{
    "title": "Nuevo socio",
    "fields": [
        {"name": "dni", "label": "DNI", "kind": "string", "required": true,
         "regex": "^[0-9]{7,8}$", "patternMessage": "DNI must have 7 or 8 digits"},
        {"name": "email", "label": "Email", "kind": "email"},
        {"name": "alta", "label": "Fecha de alta", "kind": "date"},
        {"name": "plan", "label": "Plan", "kind": "search-select",
         "options": [{"label": "Mensual", "value": "m"}, {"label": "Anual", "value": "a"}]}
    ],
    "layout": {
        "dni": {"rowStart": 1, "colStart": 1, "colSpan": 4},
        "email": {"rowStart": 1, "colStart": 5, "colSpan": 8},
        "alta": {"rowStart": 2, "colStart": 1, "colSpan": 6},
        "plan": {"rowStart": 2, "colStart": 7, "colSpan": 6}
    }
}"#;

#[test]
fn document_drives_a_working_engine() {
    let document = load_form_document(MEMBER_FORM, DocumentFormat::Json).expect("document");
    let (schema, plan) = document.resolve().expect("resolved");
    let order: Vec<_> = plan.field_names().collect();
    assert_eq!(order, ["dni", "email", "alta", "plan"]);

    let mut engine = FormEngine::new(schema, &document.effective_layout()).expect("engine");
    engine.change("dni", "12ab");
    assert_eq!(
        engine.state().error("dni"),
        Some("DNI must have 7 or 8 digits")
    );
    engine.change("dni", "30111222");
    engine.change("alta", "2024-02-30");
    engine.change("plan", "x");
    assert_eq!(
        engine.request_submit(),
        SubmitReadiness::Invalid { issues: 2 }
    );
}
