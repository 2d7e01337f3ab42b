//! Final byte emission.
//!
//! Runs exactly once per bytecode, after global resolution has converged.
//! Values that still contain an unresolvable symbol are written as zeroed
//! placeholders with a [`Relocation`] recorded at the field's offset; the
//! object-format layer patches them later.

#[allow(unused_imports)]
use alloc::format;
use alloc::rc::Rc;
use alloc::string::ToString;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

use crate::bytecode::{oper_prefix, Bytecode, BytecodeKind, Insn, JmpRel, JmpSel};
use crate::ctx::Context;
use crate::ea::{DispLen, Need};
use crate::error::{AsmError, AsmWarning, Diagnostics};
use crate::expr::{Expr, ExprEnv};

/// How a relocated value is computed from the target symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelocKind {
    /// Absolute address, written as raw little-endian bytes.
    Absolute,
    /// PC-relative: `target + addend - (offset + size + trailing)`.
    PcRel,
}

/// A placeholder recorded where a symbolic value could not be resolved.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Relocation {
    /// Offset in the output stream where the field starts.
    pub offset: usize,
    /// Field size in bytes (1, 2, 4, or 8).
    pub size: u8,
    /// Target symbol name.  `Rc<str>` keeps cloning cheap.
    pub symbol: Rc<str>,
    /// Patch computation.
    pub kind: RelocKind,
    /// Constant addend.
    pub addend: i64,
    /// Bytes between the end of this field and the end of the
    /// instruction (a trailing immediate shifts the PC-relative base).
    pub trailing: u8,
}

/// The output byte stream plus its relocation list.
#[derive(Debug, Clone, Default)]
pub struct Output {
    bytes: Vec<u8>,
    relocs: Vec<Relocation>,
}

impl Output {
    /// An empty output buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The emitted bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The recorded relocations.
    #[must_use]
    pub fn relocations(&self) -> &[Relocation] {
        &self.relocs
    }

    /// Current length (== the offset of the next byte written).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether nothing has been emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Take the bytes and relocations out.
    #[must_use]
    pub fn into_parts(self) -> (Vec<u8>, Vec<Relocation>) {
        (self.bytes, self.relocs)
    }

    /// Append one byte.
    pub fn push(&mut self, b: u8) {
        self.bytes.push(b);
    }

    /// Append a slice.
    pub fn extend_from_slice(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Write `expr` into a little-endian field of `size` bytes.
    ///
    /// A reducible expression is written as a (possibly truncated)
    /// constant, warning on overflow; an irreducible single-symbol
    /// expression becomes a zeroed placeholder plus a [`Relocation`].
    ///
    /// # Errors
    ///
    /// Fails when the expression is neither reducible nor of
    /// symbol-plus-addend shape.
    pub fn write_sized(
        &mut self,
        expr: &Expr,
        size: u8,
        pc_rel: bool,
        trailing: u8,
        env: &dyn ExprEnv,
        line: u32,
        diag: &mut Diagnostics,
    ) -> Result<(), AsmError> {
        let simplified = expr.clone().simplify();
        if let Some(mut value) = simplified.try_get_constant(env) {
            if pc_rel {
                value -= self.len() as i64 + i64::from(size) + i64::from(trailing);
            }
            self.write_const(value, size, line, diag);
            return Ok(());
        }
        if let Some((sym, addend)) = simplified.symbol_addend() {
            let symbol = env.symbol_name(sym).ok_or(AsmError::Internal {
                detail: "relocation against unnamed symbol".to_string(),
                line,
            })?;
            self.relocs.push(Relocation {
                offset: self.len(),
                size,
                symbol,
                kind: if pc_rel {
                    RelocKind::PcRel
                } else {
                    RelocKind::Absolute
                },
                addend,
                trailing,
            });
            self.write_zeros(size);
            return Ok(());
        }
        Err(AsmError::Unresolved {
            detail: format!("expression {}", simplified),
            line,
        })
    }

    /// Write a constant little-endian, warning when it does not fit the
    /// field's signed-or-unsigned window.
    fn write_const(&mut self, value: i64, size: u8, line: u32, diag: &mut Diagnostics) {
        let bits = u32::from(size) * 8;
        if bits < 64 {
            let min = -(1i64 << (bits - 1));
            let max = (1i64 << bits) - 1;
            if value < min || value > max {
                diag.warn(AsmWarning::ValueTruncated {
                    value,
                    bits: bits as u8,
                    line,
                });
            }
        }
        let le = value.to_le_bytes();
        self.bytes.extend_from_slice(&le[..usize::from(size)]);
    }

    fn write_zeros(&mut self, size: u8) {
        for _ in 0..size {
            self.bytes.push(0);
        }
    }
}

/// Emit one fully resolved bytecode.
///
/// # Errors
///
/// Only internal invariant violations (invalid ModR/M, REX outside
/// 64-bit mode, an undecided jump) and unresolvable multi-symbol
/// expressions fail here; user-level problems were caught during
/// selection and resolution.
pub fn emit(
    bc: &Bytecode,
    ctx: &Context,
    out: &mut Output,
    env: &dyn ExprEnv,
    diag: &mut Diagnostics,
) -> Result<(), AsmError> {
    match &bc.kind {
        BytecodeKind::Raw(bytes) => {
            out.extend_from_slice(bytes);
            Ok(())
        }
        BytecodeKind::Insn(insn) => emit_insn(insn, ctx, out, env, bc.line, diag),
        BytecodeKind::Jmp(jmp) => emit_jmp(jmp, ctx, out, env, bc.line, diag),
    }
}

fn emit_insn(
    insn: &Insn,
    ctx: &Context,
    out: &mut Output,
    env: &dyn ExprEnv,
    line: u32,
    diag: &mut Diagnostics,
) -> Result<(), AsmError> {
    if insn.special_prefix != 0 {
        out.push(insn.special_prefix);
    }
    if let Some(lr) = insn.lockrep {
        out.push(lr);
    }
    if let Some(ea) = &insn.ea {
        if let Some(seg) = ea.segment_prefix_byte() {
            out.push(seg);
        }
    }
    let (p66, _) = oper_prefix(ctx.mode, insn.opersize, insn.def_opersize_64);
    if p66 {
        out.push(0x66);
    }
    let eff_addr = if insn.addrsize == 0 {
        ctx.mode.default_addrsize()
    } else {
        insn.addrsize
    };
    if eff_addr != ctx.mode.default_addrsize() {
        out.push(0x67);
    }
    if let Some(rex) = insn.rex.byte() {
        if !ctx.mode.is_64() {
            return Err(AsmError::Internal {
                detail: "REX prefix outside 64-bit mode".to_string(),
                line,
            });
        }
        out.push(rex);
    }
    out.extend_from_slice(&insn.opcode[..usize::from(insn.opcode_len)]);

    if let Some(ea) = &insn.ea {
        if ea.need_modrm {
            if !ea.modrm_valid {
                return Err(AsmError::Internal {
                    detail: "ModRM required but never computed".to_string(),
                    line,
                });
            }
            out.push(ea.modrm | ((insn.spare & 7) << 3));
        }
        match ea.need_sib {
            Need::No => {}
            Need::Yes => {
                if !ea.sib_valid {
                    return Err(AsmError::Internal {
                        detail: "SIB required but never computed".to_string(),
                        line,
                    });
                }
                out.push(ea.sib);
            }
            Need::Unknown => {
                return Err(AsmError::Internal {
                    detail: "SIB requirement never resolved".to_string(),
                    line,
                })
            }
        }
        match ea.disp_len {
            DispLen::Unknown => {
                return Err(AsmError::Internal {
                    detail: "displacement width never resolved".to_string(),
                    line,
                })
            }
            DispLen::Fixed(0) => {}
            DispLen::Fixed(n) => {
                let trailing = insn.imm.as_ref().map_or(0, |i| i.len);
                match &ea.disp {
                    None => {
                        // A displacement field whose value proved to be
                        // exactly zero but whose width is forced.
                        for _ in 0..n {
                            out.push(0);
                        }
                    }
                    Some(d) => {
                        // Final fold: register terms were consumed by the
                        // ModRM/SIB computation.
                        let (_, residue) = d.clone().simplify().take_reg_terms();
                        out.write_sized(&residue, n, ea.pc_rel, trailing, env, line, diag)?;
                    }
                }
            }
        }
    }

    if let Some(imm) = &insn.imm {
        out.write_sized(&imm.val, imm.len, false, 0, env, line, diag)?;
    }
    Ok(())
}

fn emit_jmp(
    jmp: &JmpRel,
    ctx: &Context,
    out: &mut Output,
    env: &dyn ExprEnv,
    line: u32,
    diag: &mut Diagnostics,
) -> Result<(), AsmError> {
    if let Some(lr) = jmp.lockrep {
        out.push(lr);
    }
    let opersize = if jmp.opersize == 0 {
        ctx.mode.default_opersize()
    } else {
        jmp.opersize
    };
    let rel_bytes: u8 = if opersize == 16 { 2 } else { 4 };
    let (p66, _) = oper_prefix(ctx.mode, jmp.opersize, jmp.def_opersize_64);
    if p66 {
        out.push(0x66);
    }
    let eff_addr = if jmp.addrsize == 0 {
        ctx.mode.default_addrsize()
    } else {
        jmp.addrsize
    };
    if eff_addr != ctx.mode.default_addrsize() {
        out.push(0x67);
    }

    let missing = |what: &'static str| AsmError::Internal {
        detail: format!("selected {} form does not exist", what),
        line,
    };
    match jmp.sel {
        JmpSel::Undecided => Err(AsmError::Internal {
            detail: "jump form never selected".to_string(),
            line,
        }),
        JmpSel::Short => {
            let op = jmp.short_op.ok_or_else(|| missing("short"))?;
            out.extend_from_slice(&op.opcode[..usize::from(op.len)]);
            out.write_sized(&jmp.target, 1, true, 0, env, line, diag)
        }
        JmpSel::Near => {
            let op = jmp.near_op.ok_or_else(|| missing("near"))?;
            out.extend_from_slice(&op.opcode[..usize::from(op.len)]);
            out.write_sized(&jmp.target, rel_bytes, true, 0, env, line, diag)
        }
        JmpSel::Far => {
            let op = jmp.far_op.ok_or_else(|| missing("far"))?;
            out.extend_from_slice(&op.opcode[..usize::from(op.len)]);
            out.write_sized(&jmp.target, rel_bytes, false, 2, env, line, diag)?;
            let seg = jmp.seg.as_ref().ok_or(AsmError::Internal {
                detail: "far jump without a segment".to_string(),
                line,
            })?;
            out.write_sized(seg, 2, false, 0, env, line, diag)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::{resolve, Immediate, Insn};
    use crate::ctx::Mode;
    use crate::ea::EffectiveAddress;
    use crate::expr::{EmptyEnv, SymbolId};
    use crate::reg::Register;
    use alloc::collections::BTreeMap;

    struct MapEnv(BTreeMap<u32, i64>);

    impl ExprEnv for MapEnv {
        fn symbol_value(&self, id: SymbolId) -> Option<i64> {
            self.0.get(&id.0).copied()
        }

        fn symbol_name(&self, id: SymbolId) -> Option<Rc<str>> {
            Some(Rc::from(format!("sym{}", id.0).as_str()))
        }
    }

    fn emit_one(insn: Insn, ctx: &Context) -> Vec<u8> {
        let mut bc = Bytecode::new(BytecodeKind::Insn(insn), 1);
        let mut diag = Diagnostics::new();
        resolve(&mut bc, ctx, false, &EmptyEnv).unwrap();
        resolve(&mut bc, ctx, true, &EmptyEnv).unwrap();
        let mut out = Output::new();
        emit(&bc, ctx, &mut out, &EmptyEnv, &mut diag).unwrap();
        assert_eq!(out.len() as u32, bc.len, "resolved length must match emission");
        out.bytes().to_vec()
    }

    #[test]
    fn bare_opcode_roundtrip() {
        let ctx = Context::new(Mode::Bits64);
        assert_eq!(emit_one(Insn::new([0x90, 0, 0], 1), &ctx), vec![0x90]);
    }

    #[test]
    fn reg_reg_with_spare() {
        // add ecx, eax in 32-bit mode: 01 C1
        let ctx = Context::new(Mode::Bits32);
        let mut insn = Insn::new([0x01, 0, 0], 1);
        insn.opersize = 32;
        insn.ea = Some(EffectiveAddress::direct_reg(Register::Ecx));
        assert_eq!(emit_one(insn, &ctx), vec![0x01, 0xC1]);
    }

    #[test]
    fn mem_disp8() {
        // inc dword [eax+4] style body: FF /0 with disp8
        let ctx = Context::new(Mode::Bits32);
        let mut insn = Insn::new([0xFF, 0, 0], 1);
        insn.opersize = 32;
        insn.ea = Some(EffectiveAddress::mem(Expr::add(
            Expr::Reg(Register::Eax),
            Expr::Const(4),
        )));
        assert_eq!(emit_one(insn, &ctx), vec![0xFF, 0x40, 0x04]);
    }

    #[test]
    fn zero_disp_elided() {
        let ctx = Context::new(Mode::Bits32);
        let mut insn = Insn::new([0xFF, 0, 0], 1);
        insn.opersize = 32;
        insn.ea = Some(EffectiveAddress::mem(Expr::add(
            Expr::Reg(Register::Eax),
            Expr::Const(0),
        )));
        assert_eq!(emit_one(insn, &ctx), vec![0xFF, 0x00]);
    }

    #[test]
    fn immediate_written_le() {
        let ctx = Context::new(Mode::Bits32);
        let mut insn = Insn::new([0xB8, 0, 0], 1);
        insn.opersize = 32;
        insn.imm = Some(Immediate::new(Expr::Const(0x1234_5678), 4));
        assert_eq!(
            emit_one(insn, &ctx),
            vec![0xB8, 0x78, 0x56, 0x34, 0x12]
        );
    }

    #[test]
    fn unknown_symbol_becomes_relocation() {
        let ctx = Context::new(Mode::Bits32);
        let mut insn = Insn::new([0xB8, 0, 0], 1);
        insn.opersize = 32;
        insn.imm = Some(Immediate::new(
            Expr::add(Expr::Sym(SymbolId(7)), Expr::Const(4)),
            4,
        ));
        let mut bc = Bytecode::new(BytecodeKind::Insn(insn), 3);
        let env = MapEnv(BTreeMap::new());
        let mut diag = Diagnostics::new();
        resolve(&mut bc, &ctx, true, &env).unwrap();
        let mut out = Output::new();
        emit(&bc, &ctx, &mut out, &env, &mut diag).unwrap();
        assert_eq!(out.bytes(), &[0xB8, 0, 0, 0, 0]);
        let relocs = out.relocations();
        assert_eq!(relocs.len(), 1);
        assert_eq!(relocs[0].offset, 1);
        assert_eq!(relocs[0].size, 4);
        assert_eq!(&*relocs[0].symbol, "sym7");
        assert_eq!(relocs[0].kind, RelocKind::Absolute);
        assert_eq!(relocs[0].addend, 4);
    }

    #[test]
    fn truncation_warns() {
        let ctx = Context::new(Mode::Bits32);
        let mut out = Output::new();
        let mut diag = Diagnostics::new();
        out.write_sized(&Expr::Const(0x1FF), 1, false, 0, &EmptyEnv, 5, &mut diag)
            .unwrap();
        assert_eq!(out.bytes(), &[0xFF]);
        assert_eq!(diag.warnings().len(), 1);
    }

    #[test]
    fn pc_relative_subtracts_field_end() {
        let env = MapEnv(BTreeMap::from([(0, 0x10)]));
        let mut out = Output::new();
        let mut diag = Diagnostics::new();
        out.push(0xE8);
        out.write_sized(&Expr::Sym(SymbolId(0)), 4, true, 0, &env, 1, &mut diag)
            .unwrap();
        // target 0x10 - (1 + 4) = 0x0B
        assert_eq!(out.bytes(), &[0xE8, 0x0B, 0x00, 0x00, 0x00]);
    }
}
