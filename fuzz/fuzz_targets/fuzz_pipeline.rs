#![no_main]
use libfuzzer_sys::fuzz_target;

use asmcore::ea::EffectiveAddress;
use asmcore::{Context, Expr, Mode, Operand, Register, Section, TargetMod, MNEMONICS};

const REGS: &[Register] = &[
    Register::Al,
    Register::Ah,
    Register::Cl,
    Register::Spl,
    Register::R9b,
    Register::Ax,
    Register::Dx,
    Register::Eax,
    Register::Ecx,
    Register::Esp,
    Register::Ebp,
    Register::R10d,
    Register::Rax,
    Register::Rsp,
    Register::Rbp,
    Register::R8,
    Register::R12,
    Register::R13,
    Register::Bx,
    Register::Bp,
    Register::Si,
    Register::Cs,
    Register::Fs,
    Register::Cr0,
    Register::Dr6,
    Register::Tr6,
];

/// Decode one operand from the byte stream.
fn operand(bytes: &mut impl Iterator<Item = u8>, sec: &mut Section) -> Option<Operand> {
    let tag = bytes.next()?;
    let op = match tag % 6 {
        0 => Operand::reg(REGS[bytes.next()? as usize % REGS.len()]),
        1 => Operand::imm_const(i64::from(bytes.next()?) - 128),
        2 => {
            let base = REGS[bytes.next()? as usize % REGS.len()];
            let disp = i64::from(bytes.next()?);
            Operand::mem(EffectiveAddress::mem(Expr::add(
                Expr::Reg(base),
                Expr::Const(disp),
            )))
        }
        3 => Operand::mem(EffectiveAddress::mem(Expr::Const(i64::from(bytes.next()?)))),
        4 => {
            let sym = sec.symbol("target");
            Operand::imm(Expr::Sym(sym))
        }
        _ => {
            let scale = [1u32, 2, 3, 4, 5, 8, 9][bytes.next()? as usize % 7];
            let idx = REGS[bytes.next()? as usize % REGS.len()];
            Operand::mem(EffectiveAddress::mem(Expr::Scaled(idx, scale)))
        }
    };
    let op = match bytes.next()? % 5 {
        0 => op.with_target(TargetMod::Short),
        1 => op.with_target(TargetMod::Near),
        2 => op.with_target(TargetMod::Far),
        3 => op.with_size(8 << (bytes.next()? % 4)),
        _ => op,
    };
    Some(op)
}

// Arbitrary operand streams through select → resolve → emit must never
// panic; everything invalid has to surface as a diagnostic.
fuzz_target!(|data: &[u8]| {
    let mut bytes = data.iter().copied();
    let mode = match bytes.next() {
        Some(b) => match b % 3 {
            0 => Mode::Bits16,
            1 => Mode::Bits32,
            _ => Mode::Bits64,
        },
        None => return,
    };
    let ctx = Context::new(mode);
    let mut sec = Section::new();

    for line in 0..32u32 {
        let Some(sel) = bytes.next() else { break };
        let def = &MNEMONICS[sel as usize % MNEMONICS.len()].1;
        let Some(count) = bytes.next() else { break };
        let mut ops = Vec::new();
        for _ in 0..count % 4 {
            match operand(&mut bytes, &mut sec) {
                Some(op) => ops.push(op),
                None => break,
            }
        }
        sec.add_insn(def, &ops, &[], &ctx, line);
    }
    sec.label("target", 999);
    let _ = sec.emit(&ctx);
});
