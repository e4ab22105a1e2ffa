//! PostgreSQL integration tests. Require `TEST_ADMIN_DATABASE_URL`.

mod service;
mod store;
mod support;
