//! Bytecodes — variable-length units of output — and their two-phase
//! length resolution.
//!
//! [`resolve`] is called over every bytecode once per global pass.  Trial
//! passes (`commit = false`) may under-commit: they report the safe
//! (widest still-possible) length and flag bytecodes that may shrink once
//! more is known.  The single commit pass binds every deferred choice
//! (shift-by-1, sign-extended imm8, direct-offset MOV, short/near jump
//! selection) or fails with a definite error.  Trial lengths never shrink
//! pass-over-pass, which bounds the fixed-point loop.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::ToString;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

use crate::ctx::{Context, Mode};
use crate::ea::{DispLen, EaCheck, EffectiveAddress, Need};
use crate::error::AsmError;
use crate::expr::{Expr, ExprEnv, SymbolId};

/// REX.W bit.
pub const REX_W: u8 = 0x8;
/// REX.R bit (ModR/M reg-field extension).
pub const REX_R: u8 = 0x4;
/// REX.X bit (SIB index extension).
pub const REX_X: u8 = 0x2;
/// REX.B bit (ModR/M r/m, SIB base, or opcode-register extension).
pub const REX_B: u8 = 0x1;

/// REX prefix state.
///
/// `Forbidden` records that a high-byte register (AH/BH/CH/DH) was
/// encoded; any later attempt to set a REX bit is then an error, as is
/// encoding a high-byte register once a bit is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Rex {
    /// No REX byte.
    #[default]
    None,
    /// A REX byte must not be emitted.
    Forbidden,
    /// A REX byte with these bits (0x40 base included).
    Present(u8),
}

impl Rex {
    /// Record that the encoding is incompatible with REX.
    ///
    /// # Errors
    ///
    /// Fails if a REX bit has already been set.
    pub fn forbid(&mut self, line: u32) -> Result<(), AsmError> {
        match *self {
            Rex::None | Rex::Forbidden => {
                *self = Rex::Forbidden;
                Ok(())
            }
            Rex::Present(_) => Err(AsmError::RegisterUnencodable {
                detail: "high byte register cannot be combined with a REX prefix".to_string(),
                line,
            }),
        }
    }

    /// Require a REX byte with `bit` set (`bit` may be 0 to require a
    /// bare 0x40 prefix, as SPL/BPL/SIL/DIL do).
    ///
    /// # Errors
    ///
    /// Fails outside 64-bit mode, or when REX is forbidden for this
    /// bytecode.
    pub fn set(&mut self, bit: u8, mode: Mode, line: u32) -> Result<(), AsmError> {
        if !mode.is_64() {
            return Err(AsmError::RegisterUnencodable {
                detail: "register requires 64-bit mode".to_string(),
                line,
            });
        }
        match *self {
            Rex::Forbidden => Err(AsmError::RegisterUnencodable {
                detail: "high byte register cannot be combined with a REX prefix".to_string(),
                line,
            }),
            Rex::None => {
                *self = Rex::Present(0x40 | bit);
                Ok(())
            }
            Rex::Present(v) => {
                *self = Rex::Present(v | bit);
                Ok(())
            }
        }
    }

    /// The prefix byte to emit, if any.
    #[must_use]
    pub fn byte(self) -> Option<u8> {
        match self {
            Rex::Present(v) => Some(v),
            Rex::None | Rex::Forbidden => None,
        }
    }
}

/// An instruction immediate, with its deferred optimization tags.
#[derive(Debug, Clone)]
pub struct Immediate {
    /// The immediate value.
    pub val: Expr,
    /// Field width in bytes.
    pub len: u8,
    /// Whether the field is sign-extended.
    pub sign: bool,
    /// Shift-group `,1` optimization is armed.
    pub shift_op: bool,
    /// Sign-extended-imm8 alternate opcode, if the form has one.
    pub simm8: Option<u8>,
}

impl Immediate {
    /// A plain immediate of `len` bytes.
    #[must_use]
    pub fn new(val: Expr, len: u8) -> Self {
        Self {
            val,
            len,
            sign: false,
            shift_op: false,
            simm8: None,
        }
    }
}

/// A general instruction bytecode.
#[derive(Debug, Clone)]
pub struct Insn {
    /// Opcode bytes.
    pub opcode: [u8; 3],
    /// Number of opcode bytes.
    pub opcode_len: u8,
    /// ModR/M reg-field (spare) bits, ORed into the EA's ModR/M byte at
    /// emission.
    pub spare: u8,
    /// Effective address, if the encoding has a ModR/M operand.
    pub ea: Option<EffectiveAddress>,
    /// Immediate, if any.
    pub imm: Option<Immediate>,
    /// Forced address size in bits (0 = derive).
    pub addrsize: u16,
    /// Operand size in bits (0 = mode default).
    pub opersize: u16,
    /// Operand size that needs no prefix in 64-bit mode (0 = 32).
    pub def_opersize_64: u16,
    /// Mandatory prefix byte (0 = none).
    pub special_prefix: u8,
    /// LOCK/REP-class prefix byte, if any.
    pub lockrep: Option<u8>,
    /// REX prefix state.
    pub rex: Rex,
    /// Direct-offset alternate opcode (accumulator MOV forms).
    pub short_mov: Option<u8>,
}

impl Insn {
    /// A bare instruction with the given opcode bytes.
    #[must_use]
    pub fn new(opcode: [u8; 3], opcode_len: u8) -> Self {
        Self {
            opcode,
            opcode_len,
            spare: 0,
            ea: None,
            imm: None,
            addrsize: 0,
            opersize: 0,
            def_opersize_64: 0,
            special_prefix: 0,
            lockrep: None,
            rex: Rex::None,
            short_mov: None,
        }
    }
}

/// One opcode variant of a relative/far jump.
#[derive(Debug, Clone, Copy)]
pub struct JmpOpcode {
    /// Opcode bytes.
    pub opcode: [u8; 3],
    /// Number of opcode bytes.
    pub len: u8,
}

/// Which jump encoding is currently selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JmpSel {
    /// Not yet decided (resolver picks short or near).
    Undecided,
    /// Short (rel8) form.
    Short,
    /// Near (rel16/rel32) form.
    Near,
    /// Far (ptr16:16/ptr16:32) form.
    Far,
}

/// Which form the source explicitly forced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JmpForce {
    /// `short` was written.
    Short,
    /// `near` was written.
    Near,
}

/// A relative or far jump bytecode.
#[derive(Debug, Clone)]
pub struct JmpRel {
    /// Target offset expression.
    pub target: Expr,
    /// Far-pointer segment expression, for far jumps.
    pub seg: Option<Expr>,
    /// Symbol bound to the end of this bytecode; displacements are
    /// measured from it.
    pub origin: SymbolId,
    /// Short-form opcode, if the mnemonic has one.
    pub short_op: Option<JmpOpcode>,
    /// Near-form opcode, if the mnemonic has one.
    pub near_op: Option<JmpOpcode>,
    /// Far-form opcode, if the mnemonic has one.
    pub far_op: Option<JmpOpcode>,
    /// Currently selected variant.
    pub sel: JmpSel,
    /// Form explicitly forced by the source, if any.
    pub forced: Option<JmpForce>,
    /// Forced address size in bits (0 = mode default).
    pub addrsize: u16,
    /// Operand size in bits (0 = mode default).
    pub opersize: u16,
    /// Operand size that needs no prefix in 64-bit mode (0 = 32).
    pub def_opersize_64: u16,
    /// LOCK/REP-class prefix byte, if any.
    pub lockrep: Option<u8>,
}

/// The bytecode payload.
#[derive(Debug, Clone)]
pub enum BytecodeKind {
    /// A selected instruction.
    Insn(Insn),
    /// A relative/far jump with deferred form selection.
    Jmp(JmpRel),
    /// Raw data bytes.
    Raw(Vec<u8>),
}

/// One unit of output, tracked until its final size and bytes are known.
#[derive(Debug, Clone)]
pub struct Bytecode {
    /// The payload.
    pub kind: BytecodeKind,
    /// Resolved total length in bytes (0 = not yet known).
    pub len: u32,
    /// Source line for diagnostics.
    pub line: u32,
    /// Set when an error has been reported for this bytecode; it is then
    /// skipped by later passes.
    pub errored: bool,
}

impl Bytecode {
    /// Wrap a payload with its source line.
    #[must_use]
    pub fn new(kind: BytecodeKind, line: u32) -> Self {
        let len = match &kind {
            BytecodeKind::Raw(bytes) => bytes.len() as u32,
            _ => 0,
        };
        Self {
            kind,
            len,
            line,
            errored: false,
        }
    }
}

/// Outcome of resolving one bytecode on one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Resolution {
    /// The minimum possible length has been reached; it cannot change.
    MinLen,
    /// The recorded length is an upper bound; a later pass (or the commit
    /// pass) may pick a shorter encoding.
    MayShrink,
    /// The length depends on still-unknown values and may grow.
    Unknown,
}

fn worse(a: Resolution, b: Resolution) -> Resolution {
    a.max(b)
}

/// Whether the mode/operand-size combination needs an operand-size prefix
/// or a forced REX.W.
pub(crate) fn oper_prefix(mode: Mode, opersize: u16, def64: u16) -> (bool, bool) {
    if opersize == 0 {
        return (false, false);
    }
    match mode {
        Mode::Bits16 => (opersize == 32, false),
        Mode::Bits32 => (opersize == 16, false),
        Mode::Bits64 => {
            if opersize == 16 {
                (true, false)
            } else if opersize == 64 && def64 != 64 {
                (false, true)
            } else {
                (false, false)
            }
        }
    }
}

/// Resolve one bytecode's length.
///
/// Updates `bc.len` and returns the pass outcome.  With `commit` set,
/// deferred encoding choices are bound permanently; without it, the
/// bytecode is left untouched apart from `len`.
///
/// # Errors
///
/// Hard encoding failures (unencodable EA, forced-short jump out of
/// range, unresolvable values at commit time) are returned and should be
/// recorded against the bytecode by the driver.
pub fn resolve(
    bc: &mut Bytecode,
    ctx: &Context,
    commit: bool,
    env: &dyn ExprEnv,
) -> Result<Resolution, AsmError> {
    let line = bc.line;
    let (len, outcome) = match &mut bc.kind {
        BytecodeKind::Raw(bytes) => (bytes.len() as u32, Resolution::MinLen),
        BytecodeKind::Insn(insn) => resolve_insn(insn, ctx, commit, env, line)?,
        BytecodeKind::Jmp(jmp) => resolve_jmp(jmp, ctx, commit, env, line)?,
    };
    bc.len = len;
    Ok(outcome)
}

fn resolve_insn(
    insn: &mut Insn,
    ctx: &Context,
    commit: bool,
    env: &dyn ExprEnv,
    line: u32,
) -> Result<(u32, Resolution), AsmError> {
    let mut outcome = Resolution::MinLen;
    let mut len = u32::from(insn.opcode_len);
    let mut ea_len = 0u32;
    let mut ea_rex = false;
    let mut addr_size = insn.addrsize;

    if let Some(mut ea) = insn.ea.take() {
        if commit {
            match ea.check(insn.addrsize, ctx, env, line)? {
                EaCheck::Done {
                    addr_size: asz,
                    rex_x,
                    rex_b,
                } => {
                    addr_size = asz;
                    insn.addrsize = asz;
                    if rex_x {
                        insn.rex.set(REX_X, ctx.mode, line)?;
                    }
                    if rex_b {
                        insn.rex.set(REX_B, ctx.mode, line)?;
                    }
                    // Direct-offset MOV: a bare-displacement EA switches to
                    // the accumulator short opcode and sheds its ModR/M.
                    if let Some(alt) = insn.short_mov {
                        if !ctx.mode.is_64() && ea.is_absolute() {
                            insn.opcode = [alt, 0, 0];
                            insn.opcode_len = 1;
                            ea.need_modrm = false;
                            ea.modrm_valid = false;
                            ea.need_sib = Need::No;
                            ea.sib_valid = false;
                            ea.disp_len = DispLen::Fixed((asz / 8) as u8);
                            len = 1;
                        }
                        insn.short_mov = None;
                    }
                    // An exactly-zero displacement is dropped entirely.
                    if ea.disp_len == DispLen::Fixed(0) {
                        ea.disp = None;
                    }
                    ea_len = ea.byte_len();
                }
                EaCheck::NotYet => {
                    insn.ea = Some(ea);
                    return Err(AsmError::Unresolved {
                        detail: "effective address".to_string(),
                        line,
                    });
                }
            }
        } else {
            let mut tmp = ea.clone();
            match tmp.check(insn.addrsize, ctx, env, line)? {
                EaCheck::Done {
                    addr_size: asz,
                    rex_x,
                    rex_b,
                } => {
                    addr_size = asz;
                    ea_rex = rex_x || rex_b;
                    ea_len = tmp.byte_len();
                    if insn.short_mov.is_some() && !ctx.mode.is_64() && tmp.is_absolute() {
                        outcome = worse(outcome, Resolution::MayShrink);
                    }
                }
                EaCheck::NotYet => {
                    // Assume the widest form until the symbols land.
                    ea_len = 6 + u32::from(ea.segment.is_some());
                    outcome = worse(outcome, Resolution::Unknown);
                }
            }
        }
        insn.ea = Some(ea);
    }
    len += ea_len;

    if let Some(imm) = &mut insn.imm {
        let known = imm.val.try_get_constant(env);
        if imm.shift_op {
            match known {
                Some(1) => {
                    if commit {
                        // Shift-by-1: the parameterless opcode is the
                        // immediate form + 0x10 (C0/C1 → D0/D1).
                        let last = usize::from(insn.opcode_len - 1);
                        insn.opcode[last] = insn.opcode[last].wrapping_add(0x10);
                        insn.imm = None;
                    } else {
                        len += u32::from(imm.len);
                        outcome = worse(outcome, Resolution::MayShrink);
                    }
                }
                Some(_) => len += u32::from(imm.len),
                None => {
                    len += u32::from(imm.len);
                    outcome = worse(outcome, Resolution::MayShrink);
                }
            }
        } else if let Some(alt) = imm.simm8 {
            match known {
                Some(v) if (-128..=127).contains(&v) => {
                    if commit {
                        let last = usize::from(insn.opcode_len - 1);
                        insn.opcode[last] = alt;
                        imm.len = 1;
                        imm.sign = true;
                        imm.simm8 = None;
                        len += 1;
                    } else {
                        len += u32::from(imm.len);
                        outcome = worse(outcome, Resolution::MayShrink);
                    }
                }
                Some(_) => len += u32::from(imm.len),
                None => {
                    len += u32::from(imm.len);
                    if !commit {
                        outcome = worse(outcome, Resolution::MayShrink);
                    }
                }
            }
        } else {
            len += u32::from(imm.len);
        }
    }

    // Prefix accounting.
    let eff_addr = if addr_size == 0 {
        ctx.mode.default_addrsize()
    } else {
        addr_size
    };
    if eff_addr != ctx.mode.default_addrsize() {
        len += 1;
    }
    let (p66, rexw) = oper_prefix(ctx.mode, insn.opersize, insn.def_opersize_64);
    if p66 {
        len += 1;
    }
    if insn.special_prefix != 0 {
        len += 1;
    }
    if insn.lockrep.is_some() {
        len += 1;
    }
    if ctx.mode.is_64() {
        if rexw && commit {
            insn.rex.set(REX_W, ctx.mode, line)?;
        }
        if matches!(insn.rex, Rex::Present(_)) || ea_rex || rexw {
            len += 1;
        }
    }

    Ok((len, outcome))
}

fn resolve_jmp(
    jmp: &mut JmpRel,
    ctx: &Context,
    commit: bool,
    env: &dyn ExprEnv,
    line: u32,
) -> Result<(u32, Resolution), AsmError> {
    let opersize = if jmp.opersize == 0 {
        ctx.mode.default_opersize()
    } else {
        jmp.opersize
    };
    let rel_bytes: u32 = if opersize == 16 { 2 } else { 4 };

    let disp = match (jmp.target.try_get_constant(env), env.symbol_value(jmp.origin)) {
        (Some(target), Some(origin)) => Some(target - origin),
        _ => None,
    };

    let short_len = jmp.short_op.map(|op| u32::from(op.len) + 1);
    let near_len = jmp.near_op.map(|op| u32::from(op.len) + rel_bytes);
    let far_len = jmp.far_op.map(|op| u32::from(op.len) + 2 + rel_bytes);

    let (body, outcome) = if jmp.sel == JmpSel::Far {
        let len = far_len.ok_or(AsmError::MissingJumpForm { form: "far", line })?;
        (len, Resolution::MinLen)
    } else {
        match jmp.forced {
            Some(JmpForce::Short) => {
                let len = short_len.ok_or(AsmError::MissingJumpForm {
                    form: "short",
                    line,
                })?;
                match disp {
                    Some(d) if (-128..=127).contains(&d) => {
                        if commit {
                            jmp.sel = JmpSel::Short;
                        }
                        (len, Resolution::MinLen)
                    }
                    Some(d) => return Err(AsmError::ShortJumpOutOfRange { disp: d, line }),
                    None if commit => {
                        return Err(AsmError::Unresolved {
                            detail: "short jump target".to_string(),
                            line,
                        })
                    }
                    None => (len, Resolution::Unknown),
                }
            }
            Some(JmpForce::Near) => {
                let len = near_len.ok_or(AsmError::MissingJumpForm { form: "near", line })?;
                if commit {
                    jmp.sel = JmpSel::Near;
                }
                (len, Resolution::MinLen)
            }
            None => match disp {
                Some(d) if (-128..=127).contains(&d) && short_len.is_some() => {
                    if commit {
                        jmp.sel = JmpSel::Short;
                    }
                    (short_len.unwrap(), Resolution::MinLen)
                }
                Some(d) => match near_len {
                    Some(len) => {
                        if commit {
                            jmp.sel = JmpSel::Near;
                        }
                        let outcome = if short_len.is_some() {
                            Resolution::MayShrink
                        } else {
                            Resolution::MinLen
                        };
                        (len, outcome)
                    }
                    None if commit => {
                        return Err(AsmError::ShortJumpOutOfRange { disp: d, line })
                    }
                    None => (short_len.unwrap_or(2), Resolution::Unknown),
                },
                None => match near_len {
                    Some(len) => {
                        if commit {
                            jmp.sel = JmpSel::Near;
                        }
                        (len, Resolution::Unknown)
                    }
                    None if commit => {
                        return Err(AsmError::Unresolved {
                            detail: "jump target".to_string(),
                            line,
                        })
                    }
                    None => (short_len.unwrap_or(2), Resolution::Unknown),
                },
            },
        }
    };

    let mut len = body;
    let eff_addr = if jmp.addrsize == 0 {
        ctx.mode.default_addrsize()
    } else {
        jmp.addrsize
    };
    if eff_addr != ctx.mode.default_addrsize() {
        len += 1;
    }
    let (p66, _) = oper_prefix(ctx.mode, jmp.opersize, jmp.def_opersize_64);
    if p66 {
        len += 1;
    }
    if jmp.lockrep.is_some() {
        len += 1;
    }
    let outcome = if commit { Resolution::MinLen } else { outcome };
    Ok((len, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::rc::Rc;

    struct MapEnv(BTreeMap<u32, i64>);

    impl ExprEnv for MapEnv {
        fn symbol_value(&self, id: SymbolId) -> Option<i64> {
            self.0.get(&id.0).copied()
        }

        fn symbol_name(&self, id: SymbolId) -> Option<Rc<str>> {
            Some(Rc::from(format!("s{}", id.0).as_str()))
        }
    }

    fn ctx64() -> Context {
        Context::new(Mode::Bits64)
    }

    fn ctx32() -> Context {
        Context::new(Mode::Bits32)
    }

    fn empty_env() -> MapEnv {
        MapEnv(BTreeMap::new())
    }

    #[test]
    fn bare_opcode_resolves_to_opcode_len() {
        let mut bc = Bytecode::new(BytecodeKind::Insn(Insn::new([0x90, 0, 0], 1)), 1);
        let r = resolve(&mut bc, &ctx64(), false, &empty_env()).unwrap();
        assert_eq!(r, Resolution::MinLen);
        assert_eq!(bc.len, 1);
    }

    #[test]
    fn opersize16_adds_prefix_in_32bit_mode() {
        let mut insn = Insn::new([0x01, 0, 0], 1);
        insn.opersize = 16;
        insn.ea = Some(EffectiveAddress::direct_reg(crate::reg::Register::Bx));
        let mut bc = Bytecode::new(BytecodeKind::Insn(insn), 1);
        resolve(&mut bc, &ctx32(), false, &empty_env()).unwrap();
        // 0x66 + opcode + modrm
        assert_eq!(bc.len, 3);
    }

    #[test]
    fn rex_counted_in_64bit_mode() {
        let mut insn = Insn::new([0x01, 0, 0], 1);
        insn.opersize = 64;
        insn.ea = Some(EffectiveAddress::direct_reg(crate::reg::Register::Rbx));
        let mut bc = Bytecode::new(BytecodeKind::Insn(insn), 1);
        resolve(&mut bc, &ctx64(), false, &empty_env()).unwrap();
        // REX.W + opcode + modrm
        assert_eq!(bc.len, 3);
    }

    #[test]
    fn def64_suppresses_rex_w() {
        let mut insn = Insn::new([0x50, 0, 0], 1);
        insn.opersize = 64;
        insn.def_opersize_64 = 64;
        let mut bc = Bytecode::new(BytecodeKind::Insn(insn), 1);
        resolve(&mut bc, &ctx64(), false, &empty_env()).unwrap();
        assert_eq!(bc.len, 1);
    }

    #[test]
    fn shift_by_one_trial_keeps_imm_commit_drops_it() {
        let mut insn = Insn::new([0xC1, 0, 0], 1);
        insn.ea = Some(EffectiveAddress::direct_reg(crate::reg::Register::Eax));
        let mut imm = Immediate::new(Expr::Const(1), 1);
        imm.shift_op = true;
        insn.imm = Some(imm);
        let mut bc = Bytecode::new(BytecodeKind::Insn(insn), 1);

        let r = resolve(&mut bc, &ctx32(), false, &empty_env()).unwrap();
        assert_eq!(r, Resolution::MayShrink);
        assert_eq!(bc.len, 3);

        resolve(&mut bc, &ctx32(), true, &empty_env()).unwrap();
        assert_eq!(bc.len, 2);
        match &bc.kind {
            BytecodeKind::Insn(i) => {
                assert_eq!(i.opcode[0], 0xD1);
                assert!(i.imm.is_none());
            }
            _ => panic!("expected insn"),
        }
    }

    #[test]
    fn shift_by_three_keeps_imm_form() {
        let mut insn = Insn::new([0xC1, 0, 0], 1);
        insn.ea = Some(EffectiveAddress::direct_reg(crate::reg::Register::Eax));
        let mut imm = Immediate::new(Expr::Const(3), 1);
        imm.shift_op = true;
        insn.imm = Some(imm);
        let mut bc = Bytecode::new(BytecodeKind::Insn(insn), 1);

        let r = resolve(&mut bc, &ctx32(), false, &empty_env()).unwrap();
        assert_eq!(r, Resolution::MinLen);
        resolve(&mut bc, &ctx32(), true, &empty_env()).unwrap();
        assert_eq!(bc.len, 3);
        match &bc.kind {
            BytecodeKind::Insn(i) => assert_eq!(i.opcode[0], 0xC1),
            _ => panic!("expected insn"),
        }
    }

    #[test]
    fn simm8_commit_switches_opcode() {
        let mut insn = Insn::new([0x81, 0, 0], 1);
        insn.ea = Some(EffectiveAddress::direct_reg(crate::reg::Register::Ecx));
        let mut imm = Immediate::new(Expr::Const(5), 4);
        imm.simm8 = Some(0x83);
        insn.imm = Some(imm);
        let mut bc = Bytecode::new(BytecodeKind::Insn(insn), 1);

        let r = resolve(&mut bc, &ctx32(), false, &empty_env()).unwrap();
        assert_eq!(r, Resolution::MayShrink);
        assert_eq!(bc.len, 6);

        resolve(&mut bc, &ctx32(), true, &empty_env()).unwrap();
        assert_eq!(bc.len, 3);
        match &bc.kind {
            BytecodeKind::Insn(i) => {
                assert_eq!(i.opcode[0], 0x83);
                let imm = i.imm.as_ref().unwrap();
                assert_eq!(imm.len, 1);
                assert!(imm.sign);
            }
            _ => panic!("expected insn"),
        }
    }

    #[test]
    fn simm8_large_value_keeps_wide_form() {
        let mut insn = Insn::new([0x81, 0, 0], 1);
        insn.ea = Some(EffectiveAddress::direct_reg(crate::reg::Register::Ecx));
        let mut imm = Immediate::new(Expr::Const(0x1000), 4);
        imm.simm8 = Some(0x83);
        insn.imm = Some(imm);
        let mut bc = Bytecode::new(BytecodeKind::Insn(insn), 1);
        let r = resolve(&mut bc, &ctx32(), false, &empty_env()).unwrap();
        assert_eq!(r, Resolution::MinLen);
        resolve(&mut bc, &ctx32(), true, &empty_env()).unwrap();
        assert_eq!(bc.len, 6);
    }

    fn test_jmp(env_pairs: &[(u32, i64)], forced: Option<JmpForce>) -> (Bytecode, MapEnv) {
        let jmp = JmpRel {
            target: Expr::Sym(SymbolId(0)),
            seg: None,
            origin: SymbolId(1),
            short_op: Some(JmpOpcode {
                opcode: [0xEB, 0, 0],
                len: 1,
            }),
            near_op: Some(JmpOpcode {
                opcode: [0xE9, 0, 0],
                len: 1,
            }),
            far_op: None,
            sel: JmpSel::Undecided,
            forced,
            addrsize: 0,
            opersize: 0,
            def_opersize_64: 64,
            lockrep: None,
        };
        (
            Bytecode::new(BytecodeKind::Jmp(jmp), 1),
            MapEnv(env_pairs.iter().copied().collect()),
        )
    }

    #[test]
    fn jump_in_short_range_selects_short() {
        let (mut bc, env) = test_jmp(&[(0, 0x7F + 2), (1, 2)], None);
        let r = resolve(&mut bc, &ctx64(), false, &env).unwrap();
        assert_eq!(r, Resolution::MinLen);
        assert_eq!(bc.len, 2);
        resolve(&mut bc, &ctx64(), true, &env).unwrap();
        match &bc.kind {
            BytecodeKind::Jmp(j) => assert_eq!(j.sel, JmpSel::Short),
            _ => panic!("expected jmp"),
        }
    }

    #[test]
    fn jump_at_128_promotes_to_near() {
        let (mut bc, env) = test_jmp(&[(0, 128 + 2), (1, 2)], None);
        let r = resolve(&mut bc, &ctx64(), false, &env).unwrap();
        assert_eq!(r, Resolution::MayShrink);
        assert_eq!(bc.len, 5);
        resolve(&mut bc, &ctx64(), true, &env).unwrap();
        match &bc.kind {
            BytecodeKind::Jmp(j) => assert_eq!(j.sel, JmpSel::Near),
            _ => panic!("expected jmp"),
        }
    }

    #[test]
    fn unknown_target_assumes_near() {
        let (mut bc, env) = test_jmp(&[(1, 2)], None);
        let r = resolve(&mut bc, &ctx64(), false, &env).unwrap();
        assert_eq!(r, Resolution::Unknown);
        assert_eq!(bc.len, 5);
    }

    #[test]
    fn forced_short_out_of_range_errors() {
        let (mut bc, env) = test_jmp(&[(0, 500), (1, 2)], Some(JmpForce::Short));
        assert!(resolve(&mut bc, &ctx64(), false, &env).is_err());
    }

    #[test]
    fn forced_short_in_range_is_minlen() {
        let (mut bc, env) = test_jmp(&[(0, 10), (1, 2)], Some(JmpForce::Short));
        let r = resolve(&mut bc, &ctx64(), false, &env).unwrap();
        assert_eq!(r, Resolution::MinLen);
        assert_eq!(bc.len, 2);
    }

    #[test]
    fn near_rel16_in_16bit_mode() {
        let (mut bc, env) = test_jmp(&[(0, 5000), (1, 2)], Some(JmpForce::Near));
        let ctx = Context::new(Mode::Bits16);
        resolve(&mut bc, &ctx, false, &env).unwrap();
        // opcode + rel16
        assert_eq!(bc.len, 3);
    }

    #[test]
    fn rex_state_machine() {
        let mut rex = Rex::None;
        rex.set(REX_B, Mode::Bits64, 1).unwrap();
        rex.set(REX_W, Mode::Bits64, 1).unwrap();
        assert_eq!(rex.byte(), Some(0x49));
        assert!(rex.forbid(1).is_err());

        let mut rex = Rex::None;
        rex.forbid(1).unwrap();
        assert!(rex.set(REX_B, Mode::Bits64, 1).is_err());

        let mut rex = Rex::None;
        assert!(rex.set(REX_B, Mode::Bits32, 1).is_err());
    }
}
