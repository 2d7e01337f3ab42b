//! 32-bit and 16-bit mode encoding tests.

use asmcore::ea::EffectiveAddress;
use asmcore::error::AsmError;
use asmcore::{lookup, Context, Dialect, Expr, Mode, Operand, Register, Section};
use pretty_assertions::assert_eq;

fn ctx32() -> Context {
    Context::new(Mode::Bits32)
}

fn ctx16() -> Context {
    Context::new(Mode::Bits16)
}

fn one(c: &Context, mnemonic: &str, ops: &[Operand]) -> Vec<u8> {
    let mut sec = Section::new();
    sec.add_insn(lookup(mnemonic).unwrap(), ops, &[], c, 1);
    sec.emit(c).unwrap().bytes().to_vec()
}

fn reg(r: Register) -> Operand {
    Operand::reg(r)
}

fn imm(v: i64) -> Operand {
    Operand::imm_const(v)
}

fn mem(e: Expr) -> Operand {
    Operand::mem(EffectiveAddress::mem(e))
}

// ── Basic 32-bit ───────────────────────────────────────────

#[test]
fn no_rex_ever_in_32bit_mode() {
    // A register form that would take REX.W in 64-bit mode.
    assert_eq!(one(&ctx32(), "add", &[reg(Register::Ebx), reg(Register::Ecx)]), vec![0x01, 0xCB]);
}

#[test]
fn extended_register_rejected_in_32bit() {
    let c = ctx32();
    let mut sec = Section::new();
    sec.add_insn(
        lookup("mov").unwrap(),
        &[reg(Register::R8d), reg(Register::Eax)],
        &[],
        &c,
        1,
    );
    assert!(sec.emit(&c).is_err());
    assert!(matches!(
        sec.diagnostics().errors()[0],
        AsmError::RegisterUnencodable { .. }
    ));
}

#[test]
fn mov_imm16_needs_66_in_32bit() {
    assert_eq!(
        one(&ctx32(), "mov", &[reg(Register::Ax), imm(5)]),
        vec![0x66, 0xB8, 0x05, 0x00]
    );
}

#[test]
fn inc_short_form_available() {
    assert_eq!(one(&ctx32(), "inc", &[reg(Register::Eax)]), vec![0x40]);
    assert_eq!(one(&ctx32(), "dec", &[reg(Register::Edi)]), vec![0x4F]);
}

#[test]
fn absolute_disp32_no_sib() {
    assert_eq!(
        one(&ctx32(), "inc", &[mem(Expr::Const(0x1234)).with_size(32)]),
        vec![0xFF, 0x05, 0x34, 0x12, 0x00, 0x00]
    );
}

// ── Direct-offset MOV optimization ─────────────────────────

#[test]
fn mov_accumulator_absolute_uses_short_form() {
    assert_eq!(
        one(&ctx32(), "mov", &[reg(Register::Eax), mem(Expr::Const(0x1234))]),
        vec![0xA1, 0x34, 0x12, 0x00, 0x00]
    );
    assert_eq!(
        one(&ctx32(), "mov", &[mem(Expr::Const(0x1234)), reg(Register::Al)]),
        vec![0xA2, 0x34, 0x12, 0x00, 0x00]
    );
}

#[test]
fn mov_accumulator_with_base_keeps_modrm() {
    assert_eq!(
        one(&ctx32(), "mov", &[reg(Register::Eax), mem(Expr::Reg(Register::Ebx))]),
        vec![0x8B, 0x03]
    );
}

#[test]
fn mov_non_accumulator_absolute_keeps_modrm() {
    assert_eq!(
        one(&ctx32(), "mov", &[reg(Register::Ecx), mem(Expr::Const(0x1234))]),
        vec![0x8B, 0x0D, 0x34, 0x12, 0x00, 0x00]
    );
}

// ── AAM/AAD (implicit immediate from the modifier channel) ─

#[test]
fn aam_default_base() {
    assert_eq!(one(&ctx32(), "aam", &[]), vec![0xD4, 0x0A]);
}

#[test]
fn aam_explicit_base() {
    assert_eq!(one(&ctx32(), "aam", &[imm(16)]), vec![0xD4, 0x10]);
}

#[test]
fn aad_default_base() {
    assert_eq!(one(&ctx32(), "aad", &[]), vec![0xD5, 0x0A]);
}

// ── 16-bit addressing ──────────────────────────────────────

#[test]
fn bx_si_pair() {
    let e = Expr::Sum(vec![
        Expr::Reg(Register::Bx),
        Expr::Reg(Register::Si),
        Expr::Const(2),
    ]);
    assert_eq!(
        one(&ctx16(), "mov", &[reg(Register::Cx), mem(e)]),
        vec![0x8B, 0x48, 0x02]
    );
}

#[test]
fn bp_alone_needs_disp8() {
    assert_eq!(
        one(&ctx16(), "mov", &[reg(Register::Ax), mem(Expr::Reg(Register::Bp))]),
        vec![0x8B, 0x46, 0x00]
    );
}

#[test]
fn accumulator_absolute_16bit() {
    assert_eq!(
        one(&ctx16(), "mov", &[reg(Register::Ax), mem(Expr::Const(0x10))]),
        vec![0xA1, 0x10, 0x00]
    );
}

#[test]
fn addr16_in_32bit_mode_takes_67() {
    let e = Expr::Reg(Register::Bx);
    assert_eq!(
        one(&ctx32(), "mov", &[reg(Register::Eax), mem(e)]),
        vec![0x67, 0x8B, 0x07]
    );
}

#[test]
fn oper32_in_16bit_mode_takes_66() {
    assert_eq!(
        one(&ctx16(), "mov", &[reg(Register::Eax), reg(Register::Ebx)]),
        vec![0x66, 0x89, 0xD8]
    );
}

// ── Jumps ──────────────────────────────────────────────────

#[test]
fn jcc_short_backward() {
    let c = ctx32();
    let mut sec = Section::new();
    sec.label("top", 1);
    let top = sec.symbol("top");
    sec.add_insn(lookup("jne").unwrap(), &[Operand::imm(Expr::Sym(top))], &[], &c, 2);
    let out = sec.emit(&c).unwrap();
    assert_eq!(out.bytes(), &[0x75, 0xFE]);
}

#[test]
fn jcc_promotes_to_near_at_128() {
    let c = ctx32();
    let mut sec = Section::new();
    let end = sec.symbol("end");
    sec.add_insn(lookup("je").unwrap(), &[Operand::imm(Expr::Sym(end))], &[], &c, 1);
    sec.add_bytes(vec![0x90; 128], 2);
    sec.label("end", 3);
    let out = sec.emit(&c).unwrap();
    assert_eq!(&out.bytes()[..6], &[0x0F, 0x84, 0x80, 0x00, 0x00, 0x00]);
}

#[test]
fn jcc_near_unavailable_without_386() {
    use asmcore::CpuFeatures;
    let c = Context::new(Mode::Bits16).with_cpu(CpuFeatures::F186);
    let mut sec = Section::new();
    let end = sec.symbol("end");
    sec.add_insn(lookup("je").unwrap(), &[Operand::imm(Expr::Sym(end))], &[], &c, 1);
    sec.add_bytes(vec![0x90; 200], 2);
    sec.label("end", 3);
    // No near form on a 186: the undecided jump cannot be encoded.
    assert!(sec.emit(&c).is_err());
}

#[test]
fn forced_short_out_of_range_is_reported() {
    let c = ctx32();
    let mut sec = Section::new();
    let end = sec.symbol("end");
    sec.add_insn(
        lookup("jmp").unwrap(),
        &[Operand::imm(Expr::Sym(end)).with_target(asmcore::TargetMod::Short)],
        &[],
        &c,
        1,
    );
    sec.add_bytes(vec![0x90; 200], 2);
    sec.label("end", 3);
    assert!(sec.emit(&c).is_err());
    assert!(matches!(
        sec.diagnostics().errors()[0],
        AsmError::ShortJumpOutOfRange { .. }
    ));
}

#[test]
fn call_has_no_short_form() {
    let c = ctx32();
    let mut sec = Section::new();
    let f = sec.symbol("f");
    sec.add_insn(
        lookup("call").unwrap(),
        &[Operand::imm(Expr::Sym(f)).with_target(asmcore::TargetMod::Short)],
        &[],
        &c,
        1,
    );
    sec.label("f", 2);
    assert!(sec.emit(&c).is_err());
    assert!(matches!(
        sec.diagnostics().errors()[0],
        AsmError::MissingJumpForm { form: "short", .. }
    ));
}

#[test]
fn loop_has_no_near_form() {
    let c = ctx32();
    let mut sec = Section::new();
    let end = sec.symbol("end");
    sec.add_insn(lookup("loop").unwrap(), &[Operand::imm(Expr::Sym(end))], &[], &c, 1);
    sec.add_bytes(vec![0x90; 200], 2);
    sec.label("end", 3);
    assert!(sec.emit(&c).is_err());
}

#[test]
fn direct_far_jump() {
    assert_eq!(
        one(
            &ctx32(),
            "jmp",
            &[Operand::imm(Expr::seg_off(Expr::Const(0x1234), Expr::Const(0x5678)))
                .with_target(asmcore::TargetMod::Far)],
        ),
        vec![0xEA, 0x78, 0x56, 0x00, 0x00, 0x34, 0x12]
    );
}

#[test]
fn far_call_16bit() {
    assert_eq!(
        one(
            &ctx16(),
            "call",
            &[Operand::imm(Expr::seg_off(Expr::Const(0x1234), Expr::Const(0x5678)))],
        ),
        vec![0x9A, 0x78, 0x56, 0x34, 0x12]
    );
}

#[test]
fn indirect_far_jump_through_memory() {
    assert_eq!(
        one(
            &ctx32(),
            "jmp",
            &[mem(Expr::Const(0x1234)).with_target(asmcore::TargetMod::Far)],
        ),
        vec![0xFF, 0x2D, 0x34, 0x12, 0x00, 0x00]
    );
}

#[test]
fn jcxz_in_32bit_mode_takes_addr_override() {
    let c = ctx32();
    let mut sec = Section::new();
    sec.label("top", 1);
    let top = sec.symbol("top");
    sec.add_insn(lookup("jcxz").unwrap(), &[Operand::imm(Expr::Sym(top))], &[], &c, 2);
    let out = sec.emit(&c).unwrap();
    assert_eq!(out.bytes(), &[0x67, 0xE3, 0xFD]);
}

#[test]
fn near_jump_rel16_in_16bit_mode() {
    let c = ctx16();
    let mut sec = Section::new();
    let end = sec.symbol("end");
    sec.add_insn(lookup("jmp").unwrap(), &[Operand::imm(Expr::Sym(end))], &[], &c, 1);
    sec.add_bytes(vec![0x90; 200], 2);
    sec.label("end", 3);
    let out = sec.emit(&c).unwrap();
    // E9 rel16: 200 bytes past the 3-byte jump.
    assert_eq!(&out.bytes()[..3], &[0xE9, 0xC8, 0x00]);
}

// ── Dialects ───────────────────────────────────────────────

#[test]
fn gas_dialect_reverses_operands() {
    let c = ctx32().with_dialect(Dialect::Gas);
    // GAS source order (src, dst) must encode like Intel (dst, src).
    assert_eq!(
        one(&c, "mov", &[reg(Register::Ebx), reg(Register::Eax)]),
        one(&ctx32(), "mov", &[reg(Register::Eax), reg(Register::Ebx)])
    );
}

#[test]
fn gas_dialect_three_operand_reversal() {
    let c = ctx32().with_dialect(Dialect::Gas);
    assert_eq!(
        one(&c, "imul", &[imm(3), reg(Register::Ebx), reg(Register::Eax)]),
        one(&ctx32(), "imul", &[reg(Register::Eax), reg(Register::Ebx), imm(3)])
    );
}

// ── Error aggregation ──────────────────────────────────────

#[test]
fn three_bad_instructions_three_errors() {
    let c = ctx32();
    let mut sec = Section::new();
    for line in 1..=3 {
        sec.add_insn(lookup("nop").unwrap(), &[imm(1)], &[], &c, line);
    }
    match sec.emit(&c) {
        Err(AsmError::ErrorsPresent { count }) => assert_eq!(count, 3),
        other => panic!("expected ErrorsPresent, got {:?}", other),
    }
    let lines: Vec<u32> = sec.diagnostics().errors().iter().map(AsmError::line).collect();
    assert_eq!(lines, vec![1, 2, 3]);
}
