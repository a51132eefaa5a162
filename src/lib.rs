#![deny(rust_2018_idioms)]

pub mod app;
pub mod cache;
pub mod domain;
pub mod form;
pub mod io;
pub mod presentation;
pub mod schema;

#[cfg(test)]
mod tests;

pub use app::FormOptions;
pub use cache::{CacheKey, CacheStore, MutationIntent, OptimisticSync};
pub use domain::{FieldDefinition, FieldKind, FieldSchema, Layout, LayoutCell};
pub use form::{AsyncValidator, ConfigError, FormEngine, FormPhase, SubmitOutcome};

pub mod prelude {
    pub use super::{
        AsyncValidator, CacheKey, CacheStore, ConfigError, FieldDefinition, FieldKind,
        FieldSchema, FormEngine, FormOptions, FormPhase, Layout, LayoutCell, MutationIntent,
        OptimisticSync, SubmitOutcome,
    };
    pub use crate::domain::SelectOption;
}
