use std::fmt;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped inside one key segment so `/` stays a separator.
const SEGMENT: &AsciiSet = &CONTROLS.add(b'/').add(b'%').add(b' ');

/// Composite cache key: entity kind, scope, page, limit and query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    entity: String,
    scope: Option<String>,
    page: u32,
    limit: u32,
    query: String,
}

impl CacheKey {
    pub fn new(entity: impl Into<String>, page: u32, limit: u32) -> Self {
        Self {
            entity: entity.into(),
            scope: None,
            page,
            limit,
            query: String::new(),
        }
    }

    /// An empty scope is the unscoped key; both encode the same way.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into()).filter(|scope| !scope.is_empty());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Prefix shared by every page and query of this entity scope.
    pub fn prefix(&self) -> CachePrefix {
        CachePrefix::new(&self.entity, self.scope.as_deref())
    }

    pub(crate) fn encoded(&self) -> String {
        format!(
            "{}{}/{}/{}",
            self.prefix().0,
            self.page,
            self.limit,
            encode(&self.query)
        )
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachePrefix(String);

impl CachePrefix {
    pub fn new(entity: &str, scope: Option<&str>) -> Self {
        Self(format!(
            "{}/{}/",
            encode(entity),
            encode(scope.unwrap_or(""))
        ))
    }

    pub fn matches(&self, encoded_key: &str) -> bool {
        encoded_key.starts_with(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn encode(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}
