//! Property-based tests for tables and coercion.
