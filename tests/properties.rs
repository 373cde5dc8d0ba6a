//! Randomized properties of the word algebra and the execution engine.

use ddp24::{Cpu, Opcode, Word};
use ddp24::signmag::arith;
use ddp24::cpu::decode::encode;
use proptest::prelude::*;

proptest! {
    #[test]
    fn word_roundtrip_through_raw(bits in 0u32..=0xFF_FFFF) {
        let word = Word::from_raw(bits);
        if word.magnitude() != 0 {
            prop_assert_eq!(Word::from_i32(word.to_i32()), word);
        } else {
            // Both zeros convert back to +0
            prop_assert_eq!(Word::from_i32(word.to_i32()), Word::zero());
        }
    }

    #[test]
    fn word_roundtrip_through_signed(value in Word::MIN..=Word::MAX) {
        prop_assert_eq!(Word::from_i32(value).to_i32(), value);
    }

    #[test]
    fn add_then_subtract_restores(a in Word::MIN..=Word::MAX, b in Word::MIN..=Word::MAX) {
        prop_assume!((a + b) >= Word::MIN && (a + b) <= Word::MAX);

        let wa = Word::from_i32(a);
        let wb = Word::from_i32(b);

        let (sum, overflowed) = arith::add(wa, wb);
        prop_assert!(!overflowed);

        let (restored, overflowed) = arith::subtract(sum, wb);
        prop_assert!(!overflowed);
        prop_assert_eq!(restored, wa);
    }

    #[test]
    fn multiply_then_divide_recovers(
        b in Word::MIN..=Word::MAX,
        divisor in prop_oneof![Word::MIN..=-1, 1..=Word::MAX],
    ) {
        let wb = Word::from_i32(b);
        let wd = Word::from_i32(divisor);

        let (high, low) = arith::multiply(wb, wd);
        let (quotient, remainder) = arith::divide(high, low, wd)
            .expect("a freshly formed product divides back without becoming improper");

        prop_assert_eq!(quotient.to_i32(), b);
        prop_assert_eq!(remainder, Word::zero());
    }

    #[test]
    fn and_commutative_idempotent(x in 0u32..=0xFF_FFFF, y in 0u32..=0xFF_FFFF) {
        let a = Word::from_raw(x);
        let b = Word::from_raw(y);

        prop_assert_eq!(a & b, b & a);
        prop_assert_eq!(a & a, a);
        prop_assert_eq!(a ^ a, Word::zero());
    }

    #[test]
    fn shift_by_zero_is_identity(
        magnitude in 1u32..=0x7F_FFFF,
        negative in any::<bool>(),
    ) {
        let raw = if negative { Word::SIGN_BIT | magnitude } else { magnitude };
        let word = Word::from_raw(raw);

        let mut cpu = Cpu::new();
        cpu.regs.a = word;
        cpu.mem.write(0, encode(Opcode::Ars, false, 0, 0));
        cpu.mem.write(1, encode(Opcode::Als, false, 0, 0));

        cpu.step();
        prop_assert_eq!(cpu.regs.a, word);
        cpu.step();
        prop_assert_eq!(cpu.regs.a, word);
    }

    #[test]
    fn swap_twice_is_identity(a_bits in 0u32..=0xFF_FFFF, b_bits in 0u32..=0xFF_FFFF) {
        let a = Word::from_raw(a_bits);
        let b = Word::from_raw(b_bits);

        let mut cpu = Cpu::new();
        cpu.regs.a = a;
        cpu.regs.b = b;
        cpu.mem.write(0, encode(Opcode::Iab, false, 0, 0));
        cpu.mem.write(1, encode(Opcode::Iab, false, 0, 0));

        cpu.step();
        cpu.step();

        prop_assert_eq!(cpu.regs.a, a);
        prop_assert_eq!(cpu.regs.b, b);
    }

    #[test]
    fn machine_invariants_hold_on_random_programs(
        words in proptest::collection::vec(0u32..=0xFF_FFFF, 1..128),
        budget in 1u64..2_000,
    ) {
        let words: Vec<Word> = words.into_iter().map(Word::from_raw).collect();

        let mut cpu = Cpu::new();
        cpu.mem.load_words(&words);

        let mut previous = cpu.cycles;
        while !cpu.is_halted() && cpu.cycles < budget {
            cpu.step();

            prop_assert!(cpu.cycles >= previous);
            previous = cpu.cycles;

            prop_assert!(cpu.regs.a.raw() <= Word::MASK);
            prop_assert!(cpu.regs.b.raw() <= Word::MASK);
            prop_assert!(cpu.regs.pc <= 0x7FFF);
            for selector in 0..4 {
                prop_assert!(cpu.regs.index(selector) <= 0x7FFF);
            }
            prop_assert_eq!(cpu.regs.index(0), 0);
        }
    }

    #[test]
    fn halted_machine_is_frozen(seed in 0u32..=0xFF_FFFF) {
        let mut cpu = Cpu::new();
        cpu.regs.a = Word::from_raw(seed);
        // Memory is all zeros, i.e. a HLT at every address
        cpu.run(0);
        prop_assert!(cpu.is_halted());

        let (pc, a, cycles) = (cpu.regs.pc, cpu.regs.a, cpu.cycles);
        for _ in 0..4 {
            prop_assert_eq!(cpu.step(), 0);
        }

        prop_assert_eq!(cpu.regs.pc, pc);
        prop_assert_eq!(cpu.regs.a, a);
        prop_assert_eq!(cpu.cycles, cycles);
    }
}
