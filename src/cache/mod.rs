mod key;
mod store;
mod sync;

pub use key::{CacheKey, CachePrefix};
pub use store::{
    CachePolicy, CacheReader, CacheStore, CachedCollection, RefreshOutcome, RefreshTicket,
};
pub use sync::{
    ApplyOutcome, CacheBinding, MutationAction, MutationIntent, OptimisticSync, apply_intent,
};
