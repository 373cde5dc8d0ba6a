//! Sign-magnitude number system primitives.
//!
//! This module provides the core types for working with the DDP-24's
//! 24-bit sign-magnitude numbers:
//! - [`Word`] - The machine word (sign bit 23, magnitude bits 22..0)
//! - [`arith`] - Signed arithmetic, double-width multiply/divide, shifts

mod word;
pub mod arith;

pub use word::Word;
pub use arith::{add, subtract, multiply, divide};
