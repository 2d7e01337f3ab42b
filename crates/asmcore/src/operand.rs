//! Runtime operands, as handed over by the parser collaborator.

use crate::ea::EffectiveAddress;
use crate::expr::Expr;
use crate::reg::{RegClass, Register};

/// Jump-target / operand modifier: `near`, `short`, `far`, `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetMod {
    /// NEAR: force the near form.
    Near,
    /// SHORT: force the short form.
    Short,
    /// FAR: segment:offset target.
    Far,
    /// TO: reversed-direction x87-style modifier.
    To,
}

/// The payload of an operand.
#[derive(Debug, Clone)]
pub enum OperandKind {
    /// A register.
    Reg(Register),
    /// A segment register used as a plain operand.
    SegReg(Register),
    /// A memory reference.
    Mem(EffectiveAddress),
    /// An immediate expression.
    Imm(Expr),
}

/// One parsed operand: payload plus the optional target modifier and
/// explicit size override (`byte`, `word`, `dword`, `qword`).
#[derive(Debug, Clone)]
pub struct Operand {
    /// The operand payload.
    pub kind: OperandKind,
    /// Optional target modifier.
    pub target_mod: Option<TargetMod>,
    /// Explicit size override in bits, if the source gave one.
    pub size: Option<u16>,
}

impl Operand {
    /// A register operand.
    #[must_use]
    pub fn reg(r: Register) -> Self {
        let kind = if r.class() == RegClass::Seg {
            OperandKind::SegReg(r)
        } else {
            OperandKind::Reg(r)
        };
        Self {
            kind,
            target_mod: None,
            size: None,
        }
    }

    /// An immediate operand.
    #[must_use]
    pub fn imm(e: Expr) -> Self {
        Self {
            kind: OperandKind::Imm(e),
            target_mod: None,
            size: None,
        }
    }

    /// A constant immediate operand.
    #[must_use]
    pub fn imm_const(v: i64) -> Self {
        Self::imm(Expr::Const(v))
    }

    /// A memory operand.
    #[must_use]
    pub fn mem(ea: EffectiveAddress) -> Self {
        Self {
            kind: OperandKind::Mem(ea),
            target_mod: None,
            size: None,
        }
    }

    /// Attach an explicit size override (bits).
    #[must_use]
    pub fn with_size(mut self, bits: u16) -> Self {
        self.size = Some(bits);
        self
    }

    /// Attach a target modifier.
    #[must_use]
    pub fn with_target(mut self, t: TargetMod) -> Self {
        self.target_mod = Some(t);
        self
    }

    /// The operand's size in bits, if determinable without a form.
    ///
    /// Registers always know their size; memory and immediates only have
    /// one when the source gave an explicit override.
    #[must_use]
    pub fn size_bits(&self) -> Option<u16> {
        match &self.kind {
            OperandKind::Reg(r) | OperandKind::SegReg(r) => Some(r.size_bits()),
            OperandKind::Mem(_) | OperandKind::Imm(_) => self.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_operand_knows_size() {
        let op = Operand::reg(Register::Ecx);
        assert_eq!(op.size_bits(), Some(32));
        assert!(matches!(op.kind, OperandKind::Reg(Register::Ecx)));
    }

    #[test]
    fn segment_register_routed_to_segreg() {
        let op = Operand::reg(Register::Fs);
        assert!(matches!(op.kind, OperandKind::SegReg(Register::Fs)));
    }

    #[test]
    fn immediate_size_comes_from_override() {
        let op = Operand::imm_const(5);
        assert_eq!(op.size_bits(), None);
        let op = op.with_size(8);
        assert_eq!(op.size_bits(), Some(8));
    }

    #[test]
    fn target_modifier_attaches() {
        let op = Operand::imm_const(0).with_target(TargetMod::Short);
        assert_eq!(op.target_mod, Some(TargetMod::Short));
    }
}
