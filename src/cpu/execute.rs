//! CPU execution engine for the DDP-24.
//!
//! Implements the fetch-decode-execute cycle and all instruction
//! behaviors. Each step returns its cycle cost and accumulates it into
//! a monotone counter; the run loop uses the same costs for its budget.
//!
//! Nothing here returns an error: every observable failure is encoded
//! in the machine flags. An unknown opcode halts the machine and emits
//! a one-line diagnostic through the `log` facade.

use crate::signmag::{Word, arith};
use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, Instruction, Opcode};
use crate::cpu::memory::ADDR_MASK;
use serde::{Serialize, Deserialize};

/// Maximum depth of nested XEC instructions. A longer chain halts the
/// machine with a diagnostic.
pub const XEC_DEPTH_LIMIT: u32 = 64;

/// The DDP-24 CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Core memory.
    pub mem: Memory,
    /// Arithmetic overflow / improper divide indicator. Sticky: once
    /// set it stays set until a reset.
    pub overflow: bool,
    /// Set by HLT and by decode errors. Stepping while halted is a
    /// no-op; clearing the flag resumes execution.
    pub halted: bool,
    /// Interrupt enable flag. Stored for completeness, never consulted.
    pub interrupt_enabled: bool,
    /// Accumulated instruction cycle costs.
    pub cycles: u64,
}

impl Cpu {
    /// Create a new CPU with zeroed registers, flags and memory.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            overflow: false,
            halted: false,
            interrupt_enabled: false,
            cycles: 0,
        }
    }

    /// Zero the whole machine, memory included.
    pub fn init(&mut self) {
        self.reset();
        self.mem.clear();
    }

    /// Reset registers, flags and the cycle counter. Memory is
    /// preserved.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.overflow = false;
        self.halted = false;
        self.interrupt_enabled = false;
        self.cycles = 0;
    }

    /// Check if the CPU is halted.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Execute a single instruction and return its cycle cost.
    ///
    /// Returns zero without touching any state when the machine is
    /// halted.
    pub fn step(&mut self) -> u64 {
        self.step_nested(0)
    }

    /// Run until halt, or until the cycle budget is exhausted between
    /// instructions. A budget of zero means unbounded.
    ///
    /// Returns the cumulative cost of this invocation. The halted flag
    /// is untouched when the budget runs out.
    pub fn run(&mut self, budget: u64) -> u64 {
        let mut total = 0;
        while !self.halted && (budget == 0 || total < budget) {
            total += self.step();
        }
        total
    }

    /// Compute the effective address of an instruction: the address
    /// field, plus the selected index register when the selector is
    /// nonzero, then one level of indirection. Always a valid 15-bit
    /// address.
    fn effective_address(&self, instr: Instruction) -> u16 {
        let mut addr = instr.address;

        // Index selector 0 reads the hardwired zero register
        if instr.index != 0 {
            addr = addr.wrapping_add(self.regs.index(instr.index)) & ADDR_MASK;
        }

        if instr.indirect {
            addr = (self.mem.read(addr).raw() as u16) & ADDR_MASK;
        }

        addr
    }

    fn step_nested(&mut self, depth: u32) -> u64 {
        if self.halted {
            return 0;
        }

        // Fetch
        let fetch_pc = self.regs.pc;
        let raw = self.mem.read(fetch_pc);
        self.regs.advance_pc();

        // Decode
        let instr = decode::decode(raw);
        let ea = self.effective_address(instr);

        // Execute
        let cost = match Opcode::from_code(instr.opcode) {
            Some(op) => self.execute(op, instr, ea, fetch_pc, depth),
            None => {
                log::error!(
                    "unassigned opcode {:02o} at PC={:05o}",
                    instr.opcode,
                    fetch_pc
                );
                self.halted = true;
                5
            }
        };

        self.cycles += cost;
        cost
    }

    /// Execute one decoded instruction, returning its cycle cost.
    fn execute(&mut self, op: Opcode, instr: Instruction, ea: u16, fetch_pc: u16, depth: u32) -> u64 {
        match op {
            // ==================== Control ====================

            Opcode::Hlt => {
                self.halted = true;
                // Stay at the HLT word so a resumed step re-fetches it
                self.regs.rewind_pc();
                5
            }

            Opcode::Nop => 5,

            // ==================== Data transfer ====================

            Opcode::Lda => {
                self.regs.a = self.mem.read(ea);
                10
            }

            Opcode::Ldb => {
                self.regs.b = self.mem.read(ea);
                10
            }

            Opcode::Sta => {
                self.mem.write(ea, self.regs.a);
                10
            }

            Opcode::Stb => {
                self.mem.write(ea, self.regs.b);
                10
            }

            Opcode::Tab => {
                self.regs.b = self.regs.a;
                5
            }

            Opcode::Iab => {
                std::mem::swap(&mut self.regs.a, &mut self.regs.b);
                10
            }

            Opcode::Ldx => {
                let value = self.mem.read(ea);
                self.regs
                    .set_index(instr.index, (value.raw() & u32::from(ADDR_MASK)) as u16);
                5
            }

            Opcode::Six => {
                self.mem
                    .write(ea, Word::from_raw(u32::from(self.regs.index(instr.index))));
                10
            }

            // ==================== Arithmetic ====================

            Opcode::Add => {
                let operand = self.mem.read(ea);
                let (sum, overflowed) = arith::add(self.regs.a, operand);
                if overflowed {
                    self.overflow = true;
                }
                self.regs.a = sum;
                10
            }

            Opcode::Sub => {
                let operand = self.mem.read(ea);
                let (difference, overflowed) = arith::subtract(self.regs.a, operand);
                if overflowed {
                    self.overflow = true;
                }
                self.regs.a = difference;
                10
            }

            Opcode::Mpy => {
                let operand = self.mem.read(ea);
                let (high, low) = arith::multiply(self.regs.b, operand);
                self.regs.a = high;
                self.regs.b = low;
                28
            }

            Opcode::Div => {
                let divisor = self.mem.read(ea);
                match arith::divide(self.regs.a, self.regs.b, divisor) {
                    Some((quotient, remainder)) => {
                        self.regs.b = quotient;
                        self.regs.a = remainder;
                    }
                    // Improper divide: flag it, operands stay put
                    None => self.overflow = true,
                }
                44
            }

            // ==================== Logical ====================

            Opcode::Ana => {
                self.regs.a = self.regs.a & self.mem.read(ea);
                10
            }

            Opcode::Ora => {
                self.regs.a = self.regs.a | self.mem.read(ea);
                10
            }

            Opcode::Era => {
                self.regs.a = self.regs.a ^ self.mem.read(ea);
                10
            }

            // ==================== Shifts ====================

            Opcode::Ars => {
                let count = u32::from(ea) & 0x1F;
                self.regs.a = arith::shift_right(self.regs.a, count);
                5 + u64::from(count)
            }

            Opcode::Als => {
                let count = u32::from(ea) & 0x1F;
                self.regs.a = arith::shift_left(self.regs.a, count);
                5 + u64::from(count)
            }

            // ==================== Jumps and skips ====================

            Opcode::Jmp => {
                self.regs.jump(ea);
                5
            }

            Opcode::Jpl => {
                if !self.regs.a.is_negative() && !self.regs.a.is_zero() {
                    self.regs.jump(ea);
                }
                6
            }

            Opcode::Jmi => {
                if self.regs.a.is_negative() {
                    self.regs.jump(ea);
                }
                6
            }

            Opcode::Jze => {
                if self.regs.a.is_zero() {
                    self.regs.jump(ea);
                }
                6
            }

            Opcode::Jnz => {
                if !self.regs.a.is_zero() {
                    self.regs.jump(ea);
                }
                6
            }

            Opcode::Jsl => {
                self.mem.write(ea, Word::from_raw(u32::from(self.regs.pc)));
                self.regs.jump(ea.wrapping_add(1));
                10
            }

            Opcode::Skg => {
                let operand = self.mem.read(ea);
                if self.regs.a.to_i32() > operand.to_i32() {
                    self.regs.advance_pc();
                }
                10
            }

            Opcode::Skn => {
                let operand = self.mem.read(ea);
                if self.regs.a != operand {
                    self.regs.advance_pc();
                }
                10
            }

            // ==================== Execute ====================

            Opcode::Xec => {
                if depth >= XEC_DEPTH_LIMIT {
                    log::warn!(
                        "XEC chain deeper than {} at PC={:05o}; halting",
                        XEC_DEPTH_LIMIT,
                        fetch_pc
                    );
                    self.halted = true;
                    5
                } else {
                    self.regs.jump(ea.wrapping_add(1));
                    // PC changes made by the recursive step stand
                    5 + self.step_nested(depth + 1)
                }
            }

            // Declared in the manual, not implemented in this core
            other => {
                log::error!(
                    "unimplemented opcode {:02o} ({:?}) at PC={:05o}",
                    other.code(),
                    other,
                    fetch_pc
                );
                self.halted = true;
                5
            }
        }
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("regs", &self.regs)
            .field("overflow", &self.overflow)
            .field("halted", &self.halted)
            .field("cycles", &self.cycles)
            .finish()
    }
}
