mod engine;
mod error;
mod rules;
mod state;
mod validation;

pub use engine::{FormEngine, SubmitOutcome, SubmitReadiness};
pub use error::{ConfigError, FieldCoercionError};
pub use rules::{
    COLOR_MESSAGE, DATE_MESSAGE, EMAIL_MESSAGE, NUMBER_MESSAGE, OPTION_MESSAGE, PATTERN_MESSAGE,
    REQUIRED_MESSAGE, TIME_MESSAGE, check_field, coerce_value, coerce_values, validate_values,
};
pub use state::{FormPhase, FormState, FormValues};
pub use validation::{AsyncTrigger, AsyncValidator, ValidationFuture};
