//! Shared helpers for docflow's database-backed tests.

pub mod db;
