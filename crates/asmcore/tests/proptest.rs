//! Property-based tests.
//!
//! These verify the resolution-engine invariants across randomly
//! generated programs: bounded convergence, jump-form correctness at the
//! short/near boundary, and deterministic output.

use asmcore::{lookup, Context, Expr, Mode, Operand, Register, Section};
use proptest::prelude::*;

fn ctx() -> Context {
    Context::new(Mode::Bits32)
}

/// Assemble one forward jump over `pad` bytes of filler.
fn jump_over(pad: usize) -> Vec<u8> {
    let c = ctx();
    let mut sec = Section::new();
    let end = sec.symbol("end");
    sec.add_insn(lookup("jmp").unwrap(), &[Operand::imm(Expr::Sym(end))], &[], &c, 1);
    sec.add_bytes(vec![0x90; pad], 2);
    sec.label("end", 3);
    sec.emit(&c).unwrap().bytes().to_vec()
}

proptest! {
    /// The shortest legal jump form is always chosen, and the boundary
    /// sits exactly at a displacement of 127.
    #[test]
    fn jump_form_matches_distance(pad in 0usize..400) {
        let bytes = jump_over(pad);
        if pad <= 127 {
            prop_assert_eq!(bytes[0], 0xEB);
            prop_assert_eq!(bytes.len(), 2 + pad);
            prop_assert_eq!(bytes[1] as i8 as i64, pad as i64);
        } else {
            prop_assert_eq!(bytes[0], 0xE9);
            prop_assert_eq!(bytes.len(), 5 + pad);
            let disp = i32::from_le_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
            prop_assert_eq!(disp as i64, pad as i64);
        }
    }

    /// A chain of forward jumps to a common label converges within the
    /// pass bound, and every encoded displacement lands exactly on the
    /// label.
    #[test]
    fn jump_chains_converge_and_land(count in 1usize..24, pad in 0usize..300) {
        let c = ctx();
        let mut sec = Section::new();
        let end = sec.symbol("end");
        for i in 0..count {
            sec.add_insn(
                lookup("jmp").unwrap(),
                &[Operand::imm(Expr::Sym(end))],
                &[],
                &c,
                i as u32 + 1,
            );
        }
        sec.add_bytes(vec![0x90; pad], 99);
        sec.label("end", 100);
        let out = sec.emit(&c).unwrap();
        let bytes = out.bytes();
        let end_off = bytes.len() as i64;

        let mut pos = 0usize;
        for _ in 0..count {
            match bytes[pos] {
                0xEB => {
                    let next = pos as i64 + 2;
                    let disp = bytes[pos + 1] as i8 as i64;
                    prop_assert_eq!(next + disp, end_off);
                    pos += 2;
                }
                0xE9 => {
                    let next = pos as i64 + 5;
                    let disp = i32::from_le_bytes([
                        bytes[pos + 1],
                        bytes[pos + 2],
                        bytes[pos + 3],
                        bytes[pos + 4],
                    ]) as i64;
                    prop_assert_eq!(next + disp, end_off);
                    pos += 5;
                }
                other => prop_assert!(false, "unexpected opcode {:#x}", other),
            }
        }
        prop_assert_eq!(pos + pad, bytes.len());
    }

    /// Assembling the same program twice yields identical bytes.
    #[test]
    fn assembly_is_deterministic(pad in 0usize..300, v in any::<i32>()) {
        let once = || {
            let c = ctx();
            let mut sec = Section::new();
            let end = sec.symbol("end");
            sec.add_insn(
                lookup("mov").unwrap(),
                &[Operand::reg(Register::Eax), Operand::imm_const(i64::from(v))],
                &[],
                &c,
                1,
            );
            sec.add_insn(lookup("jmp").unwrap(), &[Operand::imm(Expr::Sym(end))], &[], &c, 2);
            sec.add_bytes(vec![0x90; pad], 3);
            sec.label("end", 4);
            sec.emit(&c).unwrap().bytes().to_vec()
        };
        prop_assert_eq!(once(), once());
    }

    /// MOV reg32, imm32 reproduces the immediate little-endian.
    #[test]
    fn mov_imm_roundtrip(v in any::<i32>()) {
        let c = ctx();
        let mut sec = Section::new();
        sec.add_insn(
            lookup("mov").unwrap(),
            &[Operand::reg(Register::Ecx), Operand::imm_const(i64::from(v))],
            &[],
            &c,
            1,
        );
        let out = sec.emit(&c).unwrap();
        let mut expect = vec![0xB9];
        expect.extend_from_slice(&v.to_le_bytes());
        prop_assert_eq!(out.bytes(), &expect[..]);
    }

    /// The sign-extended-imm8 optimization fires exactly on the i8 range.
    #[test]
    fn arith_imm8_window(v in any::<i32>()) {
        let c = ctx();
        let mut sec = Section::new();
        sec.add_insn(
            lookup("add").unwrap(),
            &[Operand::reg(Register::Ebx), Operand::imm_const(i64::from(v))],
            &[],
            &c,
            1,
        );
        let out = sec.emit(&c).unwrap();
        if (-128..=127).contains(&v) {
            prop_assert_eq!(out.bytes(), &[0x83, 0xC3, v as u8][..]);
        } else {
            let mut expect = vec![0x81, 0xC3];
            expect.extend_from_slice(&v.to_le_bytes());
            prop_assert_eq!(out.bytes(), &expect[..]);
        }
    }
}
