//! Instruction selection: first-match search over a mnemonic's candidate
//! forms, then bytecode construction.
//!
//! The candidate list is walked strictly in table order — the first form
//! whose CPU gating, operand count, dialect restriction, and per-slot
//! requirements all hold wins, even when a later row would encode shorter.
//! Deliberately-ordered diagnostic rows rely on this.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::ToString;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

use crate::bytecode::{
    Bytecode, BytecodeKind, Immediate, Insn, JmpForce, JmpOpcode, JmpRel, JmpSel, REX_B, REX_R,
};
use crate::ctx::{Context, Dialect};
use crate::ea::EffectiveAddress;
use crate::error::{AsmError, AsmWarning, Diagnostics};
use crate::expr::{EmptyEnv, Expr, SymbolId};
use crate::form::{
    Action, EncodingForm, FormFlags, InsnDef, ModAction, OperandReq, PostAction, ReqKind, SizeReq,
};
use crate::operand::{Operand, OperandKind, TargetMod};
use crate::reg::{RegClass, Register};

/// Select an encoding form for `operands` and build its bytecode.
///
/// Warnings (deliberate warning rows, ignored overrides) go to `diag`;
/// the returned error means the whole instruction was rejected.
///
/// # Errors
///
/// [`AsmError::InvalidOperands`] when no candidate matches; more specific
/// errors when a candidate matched but could not be encoded (REX
/// conflicts, missing jump forms, bad target modifiers).
pub fn select(
    def: &InsnDef,
    operands: &[Operand],
    ctx: &Context,
    line: u32,
    diag: &mut Diagnostics,
) -> Result<Bytecode, AsmError> {
    for form in def.forms {
        if !ctx.cpu_ok(form.cpu) {
            continue;
        }
        if form.operands.len() != operands.len() {
            continue;
        }
        if form.flags.has(FormFlags::GAS_ONLY) && ctx.dialect != Dialect::Gas {
            continue;
        }
        if form.flags.has(FormFlags::GAS_ILLEGAL) && ctx.dialect == Dialect::Gas {
            continue;
        }

        let reverse = ctx.dialect == Dialect::Gas
            && !form.flags.has(FormFlags::GAS_NO_REVERSE)
            && operands.len() > 1;
        let ordered: Vec<&Operand> = if reverse {
            operands.iter().rev().collect()
        } else {
            operands.iter().collect()
        };

        if !form
            .operands
            .iter()
            .zip(ordered.iter())
            .all(|(req, op)| operand_matches(req, op, form, ctx))
        {
            continue;
        }

        if form.flags.has(FormFlags::EXT_ERROR) {
            return Err(AsmError::InvalidOperands {
                detail: "operand combination explicitly rejected".to_string(),
                line,
            });
        }
        if form.flags.has(FormFlags::EXT_WARN) {
            diag.warn(AsmWarning::Discouraged {
                detail: "operand combination is discouraged".to_string(),
                line,
            });
        }

        return build(def, form, &ordered, ctx, line, diag);
    }

    Err(AsmError::InvalidOperands {
        detail: "no encoding form accepts these operands".to_string(),
        line,
    })
}

// ─── Matching ──────────────────────────────────────────────

/// Required size in bits, `None` meaning unconstrained.
fn req_bits(req: &OperandReq, form: &EncodingForm, ctx: &Context) -> Option<u16> {
    match req.size {
        SizeReq::S8 => Some(8),
        SizeReq::S16 => Some(16),
        SizeReq::S32 => Some(32),
        SizeReq::S64 => Some(64),
        SizeReq::Oper => Some(if form.opersize != 0 {
            form.opersize
        } else {
            ctx.mode.default_opersize()
        }),
        SizeReq::Any => None,
    }
}

fn operand_matches(req: &OperandReq, op: &Operand, form: &EncodingForm, ctx: &Context) -> bool {
    // Target-modifier equality.  The undecided jump row (no required
    // modifier, JmpRel action) is lenient: it also accepts short/near/far
    // so that a forced form missing from the table is reported as a
    // missing-form error instead of a generic mismatch.
    let tmod_ok = if req.target_mod == op.target_mod {
        true
    } else {
        matches!(req.action, Action::JmpRel) && req.target_mod.is_none()
    };
    if !tmod_ok {
        return false;
    }

    let kind_ok = match req.kind {
        ReqKind::Imm => matches!(op.kind, OperandKind::Imm(_)),
        ReqKind::Imm1 => match &op.kind {
            OperandKind::Imm(e) => e.try_get_constant(&EmptyEnv) == Some(1),
            _ => false,
        },
        ReqKind::Reg => matches!(&op.kind, OperandKind::Reg(r) if r.class() == RegClass::Gp),
        ReqKind::RegMem => match &op.kind {
            OperandKind::Reg(r) => r.class() == RegClass::Gp,
            OperandKind::Mem(_) => true,
            _ => false,
        },
        ReqKind::Mem => matches!(op.kind, OperandKind::Mem(_)),
        ReqKind::SegReg => matches!(op.kind, OperandKind::SegReg(_)),
        ReqKind::CtrlReg => {
            matches!(&op.kind, OperandKind::Reg(r) if r.class() == RegClass::Ctrl)
        }
        ReqKind::DebugReg => {
            matches!(&op.kind, OperandKind::Reg(r) if r.class() == RegClass::Dbg)
        }
        ReqKind::TestReg => {
            matches!(&op.kind, OperandKind::Reg(r) if r.class() == RegClass::Test)
        }
        ReqKind::Areg => matches!(&op.kind, OperandKind::Reg(r) if r.is_accumulator()),
        ReqKind::Creg => matches!(&op.kind, OperandKind::Reg(r) if r.is_count()),
        ReqKind::Dreg => matches!(op.kind, OperandKind::Reg(Register::Dx)),
        ReqKind::SegEs => matches!(op.kind, OperandKind::SegReg(Register::Es)),
        ReqKind::SegCs => matches!(op.kind, OperandKind::SegReg(Register::Cs)),
        ReqKind::SegSs => matches!(op.kind, OperandKind::SegReg(Register::Ss)),
        ReqKind::SegDs => matches!(op.kind, OperandKind::SegReg(Register::Ds)),
        ReqKind::SegFs => matches!(op.kind, OperandKind::SegReg(Register::Fs)),
        ReqKind::SegGs => matches!(op.kind, OperandKind::SegReg(Register::Gs)),
    };
    if !kind_ok {
        return false;
    }

    // Size check.  Registers always match exactly; sized memory and
    // immediates match exactly; unsized ones only match relaxed slots.
    let want = req_bits(req, form, ctx);
    match &op.kind {
        OperandKind::Reg(r) => {
            // Control/debug/test registers match by sub-index only.
            if r.class() != RegClass::Gp {
                return true;
            }
            match want {
                Some(bits) => r.size_bits() == bits,
                None => true,
            }
        }
        OperandKind::SegReg(_) => true,
        OperandKind::Mem(_) | OperandKind::Imm(_) => match (want, op.size_bits()) {
            (None, _) => true,
            (Some(bits), Some(have)) => bits == have,
            (Some(_), None) => req.relaxed,
        },
    }
}

// ─── Construction ──────────────────────────────────────────

/// Drain the mnemonic's modifier bytes through a form's action list.
struct Patched {
    opcode: [u8; 3],
    special_prefix: u8,
    spare: u8,
    opersize: u16,
    addrsize: u16,
    def_opersize_64: u16,
    imm_byte: Option<u8>,
}

fn apply_mods(form: &EncodingForm, def: &InsnDef) -> Patched {
    let mut p = Patched {
        opcode: form.opcode,
        special_prefix: form.special_prefix,
        spare: form.spare,
        opersize: form.opersize,
        addrsize: 0,
        def_opersize_64: form.def_opersize_64,
        imm_byte: None,
    };
    let mut queue = def.mod_data.iter().copied();
    for m in form.mods {
        let b = queue.next().unwrap_or(0);
        match m {
            ModAction::Gap => {}
            ModAction::AddOp0 => p.opcode[0] = p.opcode[0].wrapping_add(b),
            ModAction::AddOp1 => p.opcode[1] = p.opcode[1].wrapping_add(b),
            ModAction::AddOp2 => p.opcode[2] = p.opcode[2].wrapping_add(b),
            ModAction::AddPrefix => p.special_prefix = p.special_prefix.wrapping_add(b),
            ModAction::AddSpare => p.spare = p.spare.wrapping_add(b),
            ModAction::SetOperSize => p.opersize = u16::from(b) * 8,
            ModAction::SetAddrSize => p.addrsize = u16::from(b) * 8,
            ModAction::SetImmByte => p.imm_byte = Some(b),
            ModAction::SetDef64OperSize => p.def_opersize_64 = u16::from(b) * 8,
        }
    }
    p
}

/// Merge a register's REX needs into the instruction.
fn merge_reg_rex(insn: &mut Insn, r: Register, bit: u8, ctx: &Context, line: u32) -> Result<(), AsmError> {
    if r.is_high_byte() {
        return insn.rex.forbid(line);
    }
    if r.is_extended() {
        return insn.rex.set(bit, ctx.mode, line);
    }
    if r.requires_rex_for_byte() {
        return insn.rex.set(0, ctx.mode, line);
    }
    Ok(())
}

fn imm_width(req: &OperandReq, form: &EncodingForm, ctx: &Context) -> (u8, bool) {
    let bits = req_bits(req, form, ctx).unwrap_or(ctx.mode.default_opersize());
    // Only an explicit 64-bit slot carries a full imm64; operand-sized
    // immediates in 64-bit mode are imm32 sign-extended.
    if bits == 64 && req.size == SizeReq::Oper {
        (4, true)
    } else {
        ((bits / 8) as u8, false)
    }
}

fn build(
    def: &InsnDef,
    form: &'static EncodingForm,
    ops: &[&Operand],
    ctx: &Context,
    line: u32,
    diag: &mut Diagnostics,
) -> Result<Bytecode, AsmError> {
    if let Some(pos) = form
        .operands
        .iter()
        .position(|r| matches!(r.action, Action::JmpRel | Action::JmpFar))
    {
        return build_jmp(def, form, ops, pos, ctx, line);
    }

    let p = apply_mods(form, def);
    let mut insn = Insn::new(p.opcode, form.opcode_len);
    insn.special_prefix = p.special_prefix;
    insn.opersize = p.opersize;
    insn.addrsize = p.addrsize;
    insn.def_opersize_64 = p.def_opersize_64;
    if let Some(b) = p.imm_byte {
        insn.imm = Some(Immediate::new(Expr::Const(i64::from(b)), 1));
    }
    let mut spare = p.spare;

    for (req, op) in form.operands.iter().zip(ops.iter()) {
        match req.action {
            Action::None => {}
            Action::Ea => match &op.kind {
                OperandKind::Reg(r) => {
                    insn.ea = Some(EffectiveAddress::direct_reg(*r));
                    merge_reg_rex(&mut insn, *r, REX_B, ctx, line)?;
                }
                OperandKind::Mem(ea) => {
                    let ea = ea.clone();
                    match req.post {
                        PostAction::ShortMov(alt) => insn.short_mov = Some(alt),
                        PostAction::Address16 => {
                            if insn.addrsize != 0 && insn.addrsize != 16 {
                                diag.warn(AsmWarning::AddressSizeIgnored { line });
                            }
                            insn.addrsize = 16;
                        }
                        _ => {}
                    }
                    if let Some(bits) = op.size {
                        // An explicit size on the memory operand fixes the
                        // operand size when the form left it open.
                        if insn.opersize == 0 {
                            insn.opersize = bits;
                        }
                    }
                    insn.ea = Some(ea);
                }
                OperandKind::Imm(e) => {
                    let (w, _) = imm_width(req, form, ctx);
                    insn.ea = Some(EffectiveAddress::from_imm(e.clone(), w));
                }
                OperandKind::SegReg(_) => {
                    return Err(AsmError::Internal {
                        detail: "segment register routed to EA".to_string(),
                        line,
                    })
                }
            },
            Action::Imm | Action::SignExtImm => {
                let e = match &op.kind {
                    OperandKind::Imm(e) => e.clone(),
                    _ => {
                        return Err(AsmError::Internal {
                            detail: "non-immediate routed to immediate field".to_string(),
                            line,
                        })
                    }
                };
                let (w, auto_sign) = imm_width(req, form, ctx);
                let mut imm = Immediate::new(e, w);
                imm.sign = auto_sign || req.action == Action::SignExtImm;
                match req.post {
                    PostAction::ShiftOp => imm.shift_op = true,
                    PostAction::SignExtImm8(alt) => imm.simm8 = Some(alt),
                    _ => {}
                }
                insn.imm = Some(imm);
            }
            Action::Spare => {
                let r = match &op.kind {
                    OperandKind::Reg(r) | OperandKind::SegReg(r) => *r,
                    _ => {
                        return Err(AsmError::Internal {
                            detail: "non-register routed to spare field".to_string(),
                            line,
                        })
                    }
                };
                spare = r.base_code() & 7;
                merge_reg_rex(&mut insn, r, REX_R, ctx, line)?;
            }
            Action::AddOp0 | Action::AddOp1 => {
                let r = match &op.kind {
                    OperandKind::Reg(r) => *r,
                    _ => {
                        return Err(AsmError::Internal {
                            detail: "non-register added to opcode".to_string(),
                            line,
                        })
                    }
                };
                let idx = usize::from(req.action == Action::AddOp1);
                insn.opcode[idx] = insn.opcode[idx].wrapping_add(r.base_code() & 7);
                merge_reg_rex(&mut insn, r, REX_B, ctx, line)?;
            }
            Action::JmpRel | Action::JmpFar => unreachable!("handled above"),
        }
    }

    insn.spare = spare;

    Ok(Bytecode::new(BytecodeKind::Insn(insn), line))
}

/// Extract the patched opcode of a sibling jump row.
fn jmp_opcode(form: &EncodingForm, def: &InsnDef) -> JmpOpcode {
    let p = apply_mods(form, def);
    JmpOpcode {
        opcode: p.opcode,
        len: form.opcode_len,
    }
}

fn build_jmp(
    def: &InsnDef,
    form: &'static EncodingForm,
    ops: &[&Operand],
    pos: usize,
    ctx: &Context,
    line: u32,
) -> Result<Bytecode, AsmError> {
    let op = ops[pos];
    let expr = match &op.kind {
        OperandKind::Imm(e) => e.clone(),
        _ => {
            return Err(AsmError::Internal {
                detail: "non-immediate jump target".to_string(),
                line,
            })
        }
    };
    let p = apply_mods(form, def);

    let matched_far = form.operands[pos].action == Action::JmpFar;
    let is_far = matched_far
        || op.target_mod == Some(TargetMod::Far)
        || matches!(expr, Expr::SegOff { .. });

    // Collect the sibling variants: same mnemonic, CPU-eligible, same
    // operand size.
    let mut short_op: Option<JmpOpcode> = None;
    let mut near_op: Option<JmpOpcode> = None;
    let mut far_op: Option<JmpOpcode> = None;
    for sib in def.forms {
        if !ctx.cpu_ok(sib.cpu) || sib.opersize != form.opersize {
            continue;
        }
        if let Some(sreq) = sib
            .operands
            .iter()
            .find(|r| matches!(r.action, Action::JmpRel | Action::JmpFar))
        {
            match (sreq.action, sreq.target_mod) {
                (Action::JmpFar, _) => {
                    if far_op.is_none() {
                        far_op = Some(jmp_opcode(sib, def));
                    }
                }
                (_, Some(TargetMod::Short)) => {
                    if short_op.is_none() {
                        short_op = Some(jmp_opcode(sib, def));
                    }
                }
                (_, Some(TargetMod::Near)) => {
                    if near_op.is_none() {
                        near_op = Some(jmp_opcode(sib, def));
                    }
                }
                _ => {}
            }
        }
    }

    let mut jmp = JmpRel {
        target: expr,
        seg: None,
        origin: SymbolId::UNSET,
        short_op,
        near_op,
        far_op,
        sel: JmpSel::Undecided,
        forced: None,
        addrsize: p.addrsize,
        opersize: p.opersize,
        def_opersize_64: p.def_opersize_64,
        lockrep: None,
    };

    if is_far {
        if jmp.far_op.is_none() {
            return Err(AsmError::MissingJumpForm { form: "far", line });
        }
        let (off, seg) = jmp.target.clone().extract_segment();
        let seg = seg.ok_or(AsmError::InvalidOperands {
            detail: "far jump needs a segment:offset target".to_string(),
            line,
        })?;
        jmp.target = off;
        jmp.seg = Some(seg);
        jmp.sel = JmpSel::Far;
        return Ok(Bytecode::new(BytecodeKind::Jmp(jmp), line));
    }

    match op.target_mod {
        None => {}
        Some(TargetMod::Short) => {
            if jmp.short_op.is_none() {
                return Err(AsmError::MissingJumpForm {
                    form: "short",
                    line,
                });
            }
            jmp.forced = Some(JmpForce::Short);
        }
        Some(TargetMod::Near) => {
            if jmp.near_op.is_none() {
                return Err(AsmError::MissingJumpForm { form: "near", line });
            }
            jmp.forced = Some(JmpForce::Near);
        }
        Some(TargetMod::Far) => unreachable!("handled by the far path"),
        Some(TargetMod::To) => return Err(AsmError::BadTargetModifier { line }),
    }

    Ok(Bytecode::new(BytecodeKind::Jmp(jmp), line))
}
