/// Schema, layout or wiring mistakes. Fatal at setup time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("duplicate field name '{name}'")]
    DuplicateField { name: String },

    #[error("field '{name}' has an invalid regex: {message}")]
    InvalidPattern { name: String, message: String },

    #[error("field '{name}' has no layout cell")]
    MissingLayout { name: String },

    #[error("layout references unknown field '{name}'")]
    UnknownLayoutField { name: String },

    #[error("layout cell for '{name}' does not fit the 12-column grid")]
    CellOutOfBounds { name: String },

    #[error("layout cells for '{first}' and '{second}' overlap")]
    OverlappingCells { first: String, second: String },

    #[error("async validator registered for unknown field '{name}'")]
    UnknownValidatorField { name: String },
}

/// Editing text that cannot become the submitted JSON value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct FieldCoercionError {
    pub field: String,
    pub message: String,
}
