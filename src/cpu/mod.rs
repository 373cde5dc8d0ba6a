//! CPU emulation for the DDP-24.
//!
//! This module implements the DDP-24 architecture:
//! - 32768 twenty-four-bit words of core memory
//! - Registers: A, B (accumulators), X1..X3 (index), PC
//! - Single-address instructions with indexing and one-level
//!   indirection
//! - Per-instruction cycle costs with a budgeted run loop

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MEMORY_SIZE, ADDR_MASK};
pub use registers::Registers;
pub use decode::{Instruction, Opcode};
pub use execute::Cpu;
