mod form;
mod schema;
