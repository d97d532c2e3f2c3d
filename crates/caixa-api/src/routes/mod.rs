//! Route groups merged by [`crate::router`].

pub mod api;
pub mod input;
pub mod pages;
