//! Effective-address analysis: register extraction, ModR/M and SIB
//! computation, displacement sizing.
//!
//! [`EffectiveAddress::check`] is run during every resolution pass (on a
//! scratch copy until the commit pass) and once more during emission.  It
//! simplifies the displacement expression, pulls the base/index register
//! terms out, and classifies what remains.  Displacement widths follow the
//! smallest-not-provably-too-small rule: a symbolic residue sizes wide, a
//! constant sizes minimal, and a later pass may only ever widen.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::ToString;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

use crate::ctx::{Context, Mode};
use crate::error::AsmError;
use crate::expr::{Expr, ExprEnv};
use crate::reg::{RegClass, Register};

/// Tri-state requirement flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Need {
    /// Definitely not needed.
    No,
    /// Definitely needed.
    Yes,
    /// Not yet determined.
    Unknown,
}

/// Resolved displacement width in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DispLen {
    /// Width not yet determined.
    Unknown,
    /// A fixed number of displacement bytes (0 when the encoding carries
    /// no displacement field).
    Fixed(u8),
}

impl DispLen {
    /// The byte count, treating `Unknown` pessimistically as `wide`.
    #[must_use]
    pub fn bytes_or(self, wide: u8) -> u8 {
        match self {
            DispLen::Unknown => wide,
            DispLen::Fixed(n) => n,
        }
    }
}

/// Outcome of one effective-address check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EaCheck {
    /// The address is fully classified; ModRM/SIB/displacement fields are
    /// written.
    Done {
        /// Chosen address size in bits.
        addr_size: u16,
        /// REX.X must be set (extended index register).
        rex_x: bool,
        /// REX.B must be set (extended base register).
        rex_b: bool,
    },
    /// Classification is still blocked on unresolved symbols; retry on a
    /// later pass.
    NotYet,
}

/// A memory-operand effective address.
///
/// Mutated in place by [`EffectiveAddress::check`]; treated as immutable
/// once emission begins.
#[derive(Debug, Clone)]
pub struct EffectiveAddress {
    /// Displacement expression (may contain register terms before the
    /// first check).  `None` once a zero displacement has been dropped.
    pub disp: Option<Expr>,
    /// Resolved displacement width.
    pub disp_len: DispLen,
    /// Explicit displacement width forced by the source, in bytes.
    pub forced_len: Option<u8>,
    /// Segment-override register, if any.
    pub segment: Option<Register>,
    /// ModR/M byte (mod and r/m bits only; the reg/spare field is ORed in
    /// at emission).
    pub modrm: u8,
    /// Whether `modrm` has been computed.
    pub modrm_valid: bool,
    /// Whether the encoding carries a ModR/M byte at all.
    pub need_modrm: bool,
    /// SIB byte.
    pub sib: u8,
    /// Whether `sib` has been computed.
    pub sib_valid: bool,
    /// Whether the encoding carries a SIB byte.
    pub need_sib: Need,
    /// RIP-relative addressing (64-bit mode only).
    pub pc_rel: bool,
    /// Forbid splitting `reg*2` into `reg+reg*1`.
    pub nosplit: bool,
    /// Chosen address size in bits (0 until checked).
    pub addr_size: u16,
}

impl EffectiveAddress {
    /// A memory reference with the given displacement expression
    /// (register terms included).
    #[must_use]
    pub fn mem(disp: Expr) -> Self {
        Self {
            disp: Some(disp),
            disp_len: DispLen::Unknown,
            forced_len: None,
            segment: None,
            modrm: 0,
            modrm_valid: false,
            need_modrm: true,
            sib: 0,
            sib_valid: false,
            need_sib: Need::Unknown,
            pc_rel: false,
            nosplit: false,
            addr_size: 0,
        }
    }

    /// A direct register reference (mod = 11).
    #[must_use]
    pub fn direct_reg(r: Register) -> Self {
        Self {
            disp: None,
            disp_len: DispLen::Fixed(0),
            forced_len: None,
            segment: None,
            modrm: 0xC0 | (r.base_code() & 7),
            modrm_valid: true,
            need_modrm: true,
            sib: 0,
            sib_valid: false,
            need_sib: Need::No,
            pc_rel: false,
            nosplit: false,
            addr_size: 0,
        }
    }

    /// An immediate routed into the displacement field with no ModR/M
    /// (direct-offset encodings).
    #[must_use]
    pub fn from_imm(disp: Expr, len: u8) -> Self {
        Self {
            disp: Some(disp),
            disp_len: DispLen::Fixed(len),
            forced_len: Some(len),
            segment: None,
            modrm: 0,
            modrm_valid: false,
            need_modrm: false,
            sib: 0,
            sib_valid: false,
            need_sib: Need::No,
            pc_rel: false,
            nosplit: false,
            addr_size: 0,
        }
    }

    /// Force an explicit displacement width in bytes.
    #[must_use]
    pub fn with_forced_len(mut self, bytes: u8) -> Self {
        self.forced_len = Some(bytes);
        self
    }

    /// Attach a segment override.
    #[must_use]
    pub fn with_segment(mut self, seg: Register) -> Self {
        self.segment = Some(seg);
        self
    }

    /// The legacy prefix byte for the segment override, if one is set.
    #[must_use]
    pub fn segment_prefix_byte(&self) -> Option<u8> {
        self.segment.map(|seg| match seg {
            Register::Es => 0x26,
            Register::Cs => 0x2E,
            Register::Ss => 0x36,
            Register::Fs => 0x64,
            Register::Gs => 0x65,
            // Any other register here is a selector bug; DS is the
            // explicit-DS override.
            _ => 0x3E,
        })
    }

    /// Total encoded bytes this EA contributes (ModRM + SIB + displacement
    /// + segment-override prefix).
    #[must_use]
    pub fn byte_len(&self) -> u32 {
        let mut n = 0u32;
        if self.need_modrm {
            n += 1;
        }
        if self.need_sib == Need::Yes {
            n += 1;
        }
        n += u32::from(self.disp_len.bytes_or(4));
        if self.segment.is_some() {
            n += 1;
        }
        n
    }

    /// Whether the (checked) address is a bare absolute displacement —
    /// no base, no index, not RIP-relative.
    #[must_use]
    pub fn is_absolute(&self) -> bool {
        if !self.modrm_valid || self.pc_rel {
            return false;
        }
        match self.addr_size {
            16 => self.modrm == 0b00_000_110,
            32 => self.modrm == 0b00_000_101,
            64 => self.modrm == 0b00_000_100 && self.sib == 0x25,
            _ => false,
        }
    }

    /// Classify the address and fill in ModRM/SIB/displacement width.
    ///
    /// `addr_size_req` is a forced address size in bits (0 = derive from
    /// the registers present, defaulting to the mode width).
    ///
    /// # Errors
    ///
    /// Hard failures (unencodable register combinations, address-size
    /// conflicts) return an [`AsmError::EffectiveAddress`]; these abort
    /// the bytecode.
    pub fn check(
        &mut self,
        addr_size_req: u16,
        ctx: &Context,
        _env: &dyn ExprEnv,
        line: u32,
    ) -> Result<EaCheck, AsmError> {
        if self.modrm_valid {
            // Already classified (direct register, or a committed pass).
            return Ok(EaCheck::Done {
                addr_size: self.addr_size,
                rex_x: false,
                rex_b: false,
            });
        }
        if !self.need_modrm {
            // Direct-offset form: displacement only, nothing to compute.
            self.addr_size = if addr_size_req != 0 {
                addr_size_req
            } else {
                ctx.mode.default_addrsize()
            };
            return Ok(EaCheck::Done {
                addr_size: self.addr_size,
                rex_x: false,
                rex_b: false,
            });
        }

        let err = |detail: alloc::string::String| AsmError::EffectiveAddress { detail, line };

        // Pull register terms out of the displacement.
        let expr = self.disp.take().unwrap_or(Expr::Const(0)).simplify();
        let (mut regs, residue) = expr.take_reg_terms();
        if matches!(residue, Expr::SegOff { .. }) {
            return Err(err("segmented value used as displacement".to_string()));
        }

        regs.retain(|(_, s)| *s != 0);
        for (r, scale) in &regs {
            if *scale < 0 {
                return Err(err(format!("negative multiple of register {}", r)));
            }
            match r.class() {
                RegClass::Gp | RegClass::Ip => {}
                _ => return Err(err(format!("register {} not usable in addressing", r))),
            }
        }

        // Derive the address size from the registers present.
        let mut addr_size = addr_size_req;
        for (r, _) in &regs {
            let bits = if *r == Register::Rip { 64 } else { r.size_bits() };
            if bits == 8 {
                return Err(err(format!("byte register {} in address", r)));
            }
            if addr_size == 0 {
                addr_size = bits;
            } else if addr_size != bits {
                return Err(err("mixed address-register sizes".to_string()));
            }
        }
        if addr_size == 0 {
            addr_size = ctx.mode.default_addrsize();
        }
        match (ctx.mode, addr_size) {
            (Mode::Bits64, 16) => {
                return Err(err("16-bit addressing not available in 64-bit mode".to_string()))
            }
            (Mode::Bits16 | Mode::Bits32, 64) => {
                return Err(err("64-bit addressing requires 64-bit mode".to_string()))
            }
            _ => {}
        }
        if !ctx.mode.is_64() {
            if let Some((r, _)) = regs.iter().find(|(r, _)| r.is_extended()) {
                return Err(err(format!("register {} requires 64-bit mode", r)));
            }
        }

        let residue_const = residue.try_get_constant(&crate::expr::EmptyEnv);
        let symbolic = residue.has_symbols();
        self.disp = Some(residue);
        self.addr_size = addr_size;

        // RIP-relative: [rip + disp32].
        if let Some(pos) = regs.iter().position(|(r, _)| *r == Register::Rip) {
            let (_, scale) = regs[pos];
            if !ctx.mode.is_64() {
                return Err(err("rip-relative addressing requires 64-bit mode".to_string()));
            }
            if scale != 1 || regs.len() != 1 {
                return Err(err("rip may not be scaled or combined".to_string()));
            }
            self.modrm = 0b00_000_101;
            self.modrm_valid = true;
            self.need_sib = Need::No;
            self.sib_valid = false;
            self.pc_rel = true;
            self.disp_len = DispLen::Fixed(4);
            return Ok(EaCheck::Done {
                addr_size,
                rex_x: false,
                rex_b: false,
            });
        }

        if addr_size == 16 {
            self.check16(&regs, residue_const, symbolic, line)?;
            return Ok(EaCheck::Done {
                addr_size,
                rex_x: false,
                rex_b: false,
            });
        }

        // 32/64-bit addressing: split register multiples into base+index.
        let unscaled: Vec<Register> = regs
            .iter()
            .filter(|(_, s)| *s == 1)
            .map(|(r, _)| *r)
            .collect();
        let scaled: Vec<(Register, i64)> =
            regs.iter().filter(|(_, s)| *s != 1).copied().collect();
        if scaled.len() > 1 {
            return Err(err("more than one scaled register".to_string()));
        }

        let mut base: Option<Register> = None;
        let mut index: Option<(Register, u8)> = None;
        if let Some(&(r, scale)) = scaled.first() {
            match scale {
                2 if !self.nosplit && unscaled.is_empty() => {
                    // reg*2 → reg + reg*1: avoids the SIB disp32 form.
                    base = Some(r);
                    index = Some((r, 1));
                }
                2 | 4 | 8 => index = Some((r, scale as u8)),
                3 | 5 | 9 if !self.nosplit && unscaled.is_empty() => {
                    // reg*3/5/9 → reg + reg*(scale-1).
                    base = Some(r);
                    index = Some((r, (scale - 1) as u8));
                }
                _ => return Err(err(format!("invalid scale {}", scale))),
            }
        }
        for r in unscaled {
            if base.is_none() {
                base = Some(r);
            } else if index.is_none() {
                index = Some((r, 1));
            } else {
                return Err(err("more than two registers in address".to_string()));
            }
        }

        // The encoding has no slot for a scaled stack pointer: SIB index
        // 100 means "none".  R12 is fine (REX.X distinguishes it).
        if let Some((ir, iscale)) = index {
            if ir.base_code() & 7 == 4 && !ir.is_extended() {
                if iscale == 1 && base.map_or(true, |b| b.base_code() & 7 != 4 || b.is_extended()) {
                    // Swap roles: the stack pointer can be a base.
                    let old_base = base;
                    base = Some(ir);
                    index = old_base.map(|b| (b, 1));
                } else {
                    return Err(err(format!("{} cannot be an index register", ir)));
                }
            }
        }

        let rex_b = base.map_or(false, Register::is_extended);
        let rex_x = index.map_or(false, |(r, _)| r.is_extended());

        match base {
            None => {
                // Displacement-only or index-only.
                match (ctx.mode.is_64(), index) {
                    (false, None) => {
                        // 32-bit absolute: mod=00, r/m=101, disp32.
                        self.modrm = 0b00_000_101;
                        self.need_sib = Need::No;
                        self.sib_valid = false;
                    }
                    _ => {
                        // SIB with base=101: disp32 follows, index optional.
                        self.modrm = 0b00_000_100;
                        let (idx_code, scale) =
                            index.map_or((0b100, 1), |(r, s)| (r.base_code(), s));
                        self.sib = sib(scale, idx_code, 0b101);
                        self.sib_valid = true;
                        self.need_sib = Need::Yes;
                    }
                }
                self.modrm_valid = true;
                self.disp_len = DispLen::Fixed(4);
            }
            Some(b) => {
                let need_sib = index.is_some() || b.base_code() & 7 == 4;
                let (modbits, dlen) = self.pick_mod_disp(b, residue_const, symbolic, 4, line)?;
                if need_sib {
                    self.modrm = (modbits << 6) | 0b100;
                    let (idx_code, scale) = index.map_or((0b100, 1), |(r, s)| (r.base_code(), s));
                    self.sib = sib(scale, idx_code, b.base_code());
                    self.sib_valid = true;
                    self.need_sib = Need::Yes;
                } else {
                    self.modrm = (modbits << 6) | (b.base_code() & 7);
                    self.need_sib = Need::No;
                    self.sib_valid = false;
                }
                self.modrm_valid = true;
                self.disp_len = DispLen::Fixed(dlen);
            }
        }

        Ok(EaCheck::Done {
            addr_size,
            rex_x,
            rex_b,
        })
    }

    /// 16-bit addressing: fixed base/index pairs, no SIB.
    fn check16(
        &mut self,
        regs: &[(Register, i64)],
        residue_const: Option<i64>,
        symbolic: bool,
        line: u32,
    ) -> Result<(), AsmError> {
        use Register::{Bp, Bx, Di, Si};
        let err = |detail: alloc::string::String| AsmError::EffectiveAddress { detail, line };

        for (r, scale) in regs {
            if *scale != 1 {
                return Err(err(format!("scaled register {} in 16-bit address", r)));
            }
        }
        let mut set: Vec<Register> = regs.iter().map(|(r, _)| *r).collect();
        set.sort_by_key(|r| *r as u32);

        let rm: u8 = match set.as_slice() {
            [Bx, Si] => 0,
            [Bx, Di] => 1,
            [Bp, Si] => 2,
            [Bp, Di] => 3,
            [Si] => 4,
            [Di] => 5,
            [Bp] => 6,
            [Bx] => 7,
            [] => {
                // Bare displacement: mod=00, r/m=110, disp16.
                self.modrm = 0b00_000_110;
                self.modrm_valid = true;
                self.need_sib = Need::No;
                self.disp_len = DispLen::Fixed(2);
                return Ok(());
            }
            _ => {
                return Err(err("invalid 16-bit base/index combination".to_string()));
            }
        };

        // BP alone has no mod=00 encoding (that slot is disp16).
        let bp_base = rm == 6;
        let (modbits, dlen) = match self.forced_len {
            Some(1) => (0b01, 1),
            Some(_) => (0b10, 2),
            None => match residue_const {
                Some(0) if !symbolic && !bp_base => (0b00, 0),
                Some(v) if !symbolic && (-128..=127).contains(&v) => (0b01, 1),
                _ => (0b10, 2),
            },
        };
        self.modrm = (modbits << 6) | rm;
        self.modrm_valid = true;
        self.need_sib = Need::No;
        self.disp_len = DispLen::Fixed(dlen);
        Ok(())
    }

    /// Choose mod bits and displacement width for a based address.
    fn pick_mod_disp(
        &self,
        base: Register,
        residue_const: Option<i64>,
        symbolic: bool,
        wide: u8,
        line: u32,
    ) -> Result<(u8, u8), AsmError> {
        // mod=00 with r/m=101 (EBP/RBP/R13) means disp32-or-rip, so those
        // bases always carry a displacement.
        let bp_like = base.base_code() & 7 == 5;
        if let Some(forced) = self.forced_len {
            return match forced {
                0 if bp_like => Err(AsmError::EffectiveAddress {
                    detail: format!("{} base requires a displacement", base),
                    line,
                }),
                0 => Ok((0b00, 0)),
                1 => Ok((0b01, 1)),
                _ => Ok((0b10, wide)),
            };
        }
        Ok(match residue_const {
            Some(0) if !symbolic && !bp_like => (0b00, 0),
            Some(0) if !symbolic => (0b01, 1),
            Some(v) if !symbolic && (-128..=127).contains(&v) => (0b01, 1),
            _ => (0b10, wide),
        })
    }
}

/// Build a SIB byte.
#[inline]
fn sib(scale: u8, index: u8, base: u8) -> u8 {
    let ss = match scale {
        1 => 0,
        2 => 1,
        4 => 2,
        8 => 3,
        _ => 0,
    };
    (ss << 6) | ((index & 7) << 3) | (base & 7)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::EmptyEnv;

    fn ctx64() -> Context {
        Context::new(Mode::Bits64)
    }

    fn ctx32() -> Context {
        Context::new(Mode::Bits32)
    }

    fn checked(mut ea: EffectiveAddress, ctx: &Context) -> EffectiveAddress {
        ea.check(0, ctx, &EmptyEnv, 1).unwrap();
        ea
    }

    #[test]
    fn plain_base_register() {
        let ea = checked(EffectiveAddress::mem(Expr::Reg(Register::Rbx)), &ctx64());
        assert_eq!(ea.modrm, 0b00_000_011);
        assert_eq!(ea.need_sib, Need::No);
        assert_eq!(ea.disp_len, DispLen::Fixed(0));
    }

    #[test]
    fn rsp_base_needs_sib() {
        let ea = checked(EffectiveAddress::mem(Expr::Reg(Register::Rsp)), &ctx64());
        assert_eq!(ea.modrm, 0b00_000_100);
        assert_eq!(ea.need_sib, Need::Yes);
        assert_eq!(ea.sib, 0x24);
    }

    #[test]
    fn rbp_base_forces_disp8() {
        let ea = checked(EffectiveAddress::mem(Expr::Reg(Register::Rbp)), &ctx64());
        assert_eq!(ea.modrm, 0b01_000_101);
        assert_eq!(ea.disp_len, DispLen::Fixed(1));
    }

    #[test]
    fn base_index_scale_disp8() {
        let e = Expr::Sum(vec![
            Expr::Reg(Register::Rax),
            Expr::Scaled(Register::Rcx, 8),
            Expr::Const(0x10),
        ]);
        let ea = checked(EffectiveAddress::mem(e), &ctx64());
        assert_eq!(ea.modrm, 0b01_000_100);
        assert_eq!(ea.sib, (3 << 6) | (1 << 3) | 0);
        assert_eq!(ea.disp_len, DispLen::Fixed(1));
    }

    #[test]
    fn large_disp_uses_dword() {
        let e = Expr::add(Expr::Reg(Register::Rax), Expr::Const(0x1000));
        let ea = checked(EffectiveAddress::mem(e), &ctx64());
        assert_eq!(ea.modrm >> 6, 0b10);
        assert_eq!(ea.disp_len, DispLen::Fixed(4));
    }

    #[test]
    fn scale2_splits_into_base_plus_index() {
        let ea = checked(
            EffectiveAddress::mem(Expr::Scaled(Register::Rbx, 2)),
            &ctx64(),
        );
        // rbx + rbx*1, not rbx*2 + disp32.
        assert_eq!(ea.need_sib, Need::Yes);
        assert_eq!(ea.sib, (0 << 6) | (3 << 3) | 3);
        assert_eq!(ea.disp_len, DispLen::Fixed(0));
    }

    #[test]
    fn nosplit_keeps_scale2() {
        let mut ea = EffectiveAddress::mem(Expr::Scaled(Register::Rbx, 2));
        ea.nosplit = true;
        ea.check(0, &ctx64(), &EmptyEnv, 1).unwrap();
        assert_eq!(ea.sib, (1 << 6) | (3 << 3) | 0b101);
        assert_eq!(ea.disp_len, DispLen::Fixed(4));
    }

    #[test]
    fn rip_relative() {
        let e = Expr::add(Expr::Reg(Register::Rip), Expr::Sym(crate::expr::SymbolId(0)));
        let ea = checked(EffectiveAddress::mem(e), &ctx64());
        assert!(ea.pc_rel);
        assert_eq!(ea.modrm, 0b00_000_101);
        assert_eq!(ea.disp_len, DispLen::Fixed(4));
    }

    #[test]
    fn rip_in_32bit_mode_rejected() {
        let e = Expr::Reg(Register::Rip);
        let mut ea = EffectiveAddress::mem(e);
        assert!(ea.check(0, &ctx32(), &EmptyEnv, 1).is_err());
    }

    #[test]
    fn absolute_in_64bit_uses_sib() {
        let ea = checked(EffectiveAddress::mem(Expr::Const(0x1234)), &ctx64());
        assert_eq!(ea.modrm, 0b00_000_100);
        assert_eq!(ea.sib, 0x25);
        assert_eq!(ea.disp_len, DispLen::Fixed(4));
    }

    #[test]
    fn absolute_in_32bit_no_sib() {
        let ea = checked(EffectiveAddress::mem(Expr::Const(0x1234)), &ctx32());
        assert_eq!(ea.modrm, 0b00_000_101);
        assert_eq!(ea.need_sib, Need::No);
        assert_eq!(ea.disp_len, DispLen::Fixed(4));
    }

    #[test]
    fn esp_cannot_be_index() {
        let e = Expr::Sum(vec![
            Expr::Reg(Register::Eax),
            Expr::Scaled(Register::Esp, 2),
        ]);
        let mut ea = EffectiveAddress::mem(e);
        assert!(ea.check(0, &ctx32(), &EmptyEnv, 1).is_err());
    }

    #[test]
    fn esp_index_swaps_to_base_when_unscaled() {
        let e = Expr::Sum(vec![Expr::Reg(Register::Eax), Expr::Reg(Register::Esp)]);
        let ea = checked(EffectiveAddress::mem(e), &ctx32());
        // esp must be the base, eax the index.
        assert_eq!(ea.sib & 7, 4);
        assert_eq!((ea.sib >> 3) & 7, 0);
    }

    #[test]
    fn three_registers_rejected() {
        let e = Expr::Sum(vec![
            Expr::Reg(Register::Rax),
            Expr::Reg(Register::Rbx),
            Expr::Reg(Register::Rcx),
        ]);
        let mut ea = EffectiveAddress::mem(e);
        assert!(ea.check(0, &ctx64(), &EmptyEnv, 1).is_err());
    }

    #[test]
    fn sixteen_bit_pairs() {
        let ctx = Context::new(Mode::Bits16);
        let e = Expr::Sum(vec![
            Expr::Reg(Register::Bx),
            Expr::Reg(Register::Si),
            Expr::Const(2),
        ]);
        let ea = checked(EffectiveAddress::mem(e), &ctx);
        assert_eq!(ea.modrm, 0b01_000_000);
        assert_eq!(ea.disp_len, DispLen::Fixed(1));
        assert_eq!(ea.need_sib, Need::No);
    }

    #[test]
    fn sixteen_bit_bp_alone_gets_disp8() {
        let ctx = Context::new(Mode::Bits16);
        let ea = checked(EffectiveAddress::mem(Expr::Reg(Register::Bp)), &ctx);
        assert_eq!(ea.modrm, 0b01_000_110);
        assert_eq!(ea.disp_len, DispLen::Fixed(1));
    }

    #[test]
    fn sixteen_bit_invalid_pair_rejected() {
        let ctx = Context::new(Mode::Bits16);
        let e = Expr::Sum(vec![Expr::Reg(Register::Bx), Expr::Reg(Register::Bp)]);
        let mut ea = EffectiveAddress::mem(e);
        assert!(ea.check(0, &ctx, &EmptyEnv, 1).is_err());
    }

    #[test]
    fn sixteen_bit_addressing_rejected_in_64bit() {
        let e = Expr::Reg(Register::Bx);
        let mut ea = EffectiveAddress::mem(e);
        assert!(ea.check(0, &ctx64(), &EmptyEnv, 1).is_err());
    }

    #[test]
    fn extended_register_rejected_in_32bit() {
        let mut ea = EffectiveAddress::mem(Expr::Reg(Register::R8d));
        assert!(ea.check(0, &ctx32(), &EmptyEnv, 1).is_err());
    }

    #[test]
    fn extended_base_and_index_report_rex() {
        let e = Expr::Sum(vec![
            Expr::Reg(Register::R8),
            Expr::Scaled(Register::R9, 4),
        ]);
        let mut ea = EffectiveAddress::mem(e);
        match ea.check(0, &ctx64(), &EmptyEnv, 1).unwrap() {
            EaCheck::Done { rex_x, rex_b, .. } => {
                assert!(rex_x);
                assert!(rex_b);
            }
            EaCheck::NotYet => panic!("expected Done"),
        }
    }

    #[test]
    fn symbolic_disp_sizes_wide() {
        let e = Expr::add(Expr::Reg(Register::Rax), Expr::Sym(crate::expr::SymbolId(0)));
        let ea = checked(EffectiveAddress::mem(e), &ctx64());
        assert_eq!(ea.disp_len, DispLen::Fixed(4));
        assert_eq!(ea.modrm >> 6, 0b10);
    }

    #[test]
    fn forced_len_keeps_zero_disp() {
        let e = Expr::add(Expr::Reg(Register::Rax), Expr::Const(0));
        let ea = checked(EffectiveAddress::mem(e).with_forced_len(1), &ctx64());
        assert_eq!(ea.disp_len, DispLen::Fixed(1));
        assert_eq!(ea.modrm >> 6, 0b01);
    }

    #[test]
    fn address_size_derived_from_registers() {
        let ea = checked(EffectiveAddress::mem(Expr::Reg(Register::Ecx)), &ctx64());
        assert_eq!(ea.addr_size, 32);
    }
}
