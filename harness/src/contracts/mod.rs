//! Typed bindings for the programs the harness exercises.

pub mod wrapped_credits;
