//! Assembly context: execution mode, enabled CPU features, syntax dialect.
//!
//! A [`Context`] value is passed by reference into the selector, resolver,
//! and emitter.  There is no global state, so independent contexts can
//! coexist (and be exercised side by side in tests).

use core::fmt;

/// Execution mode (BITS setting).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    /// 16-bit real/protected mode.
    Bits16,
    /// 32-bit protected mode.
    Bits32,
    /// 64-bit long mode.
    Bits64,
}

impl Mode {
    /// The mode width in bits (16, 32, or 64).
    #[must_use]
    pub fn bits(self) -> u16 {
        match self {
            Mode::Bits16 => 16,
            Mode::Bits32 => 32,
            Mode::Bits64 => 64,
        }
    }

    /// Default operand size for this mode, in bits.
    ///
    /// 64-bit mode defaults to 32-bit operands; REX.W or a form's
    /// default-64 flag widens them.
    #[must_use]
    pub fn default_opersize(self) -> u16 {
        match self {
            Mode::Bits16 => 16,
            Mode::Bits32 | Mode::Bits64 => 32,
        }
    }

    /// Default address size for this mode, in bits.
    #[must_use]
    pub fn default_addrsize(self) -> u16 {
        self.bits()
    }

    /// Whether this is 64-bit long mode.
    #[must_use]
    pub fn is_64(self) -> bool {
        self == Mode::Bits64
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Assembly syntax dialect, as reported by the front end.
///
/// The core only cares about two dialect effects: operand-order reversal
/// for two-operand instructions, and dialect-restricted table rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Dialect {
    /// Intel/NASM-style operand order: `mov dst, src`.
    Nasm,
    /// AT&T/GAS-style operand order: `mov src, dst`.
    Gas,
}

/// A set of enabled (or, in a form, required) CPU features.
///
/// Plain `u32` bitset.  Two bits are mode gates rather than features: a form
/// carrying [`CpuFeatures::ONLY_64`] matches only in 64-bit mode, and one
/// carrying [`CpuFeatures::NOT_64`] never matches there.  Both are checked
/// against the mode and stripped before the subset test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuFeatures(pub u32);

impl CpuFeatures {
    /// No feature requirement.
    pub const ANY: CpuFeatures = CpuFeatures(0);
    /// 80186 instruction set.
    pub const F186: CpuFeatures = CpuFeatures(1 << 0);
    /// 80286 instruction set.
    pub const F286: CpuFeatures = CpuFeatures(1 << 1);
    /// 80386 instruction set.
    pub const F386: CpuFeatures = CpuFeatures(1 << 2);
    /// 80486 instruction set.
    pub const F486: CpuFeatures = CpuFeatures(1 << 3);
    /// Pentium instruction set.
    pub const F586: CpuFeatures = CpuFeatures(1 << 4);
    /// Pentium Pro / P6 instruction set.
    pub const F686: CpuFeatures = CpuFeatures(1 << 5);
    /// Privileged instructions.
    pub const PRIV: CpuFeatures = CpuFeatures(1 << 6);

    /// Mode gate: form is valid only in 64-bit mode.
    pub const ONLY_64: CpuFeatures = CpuFeatures(1 << 30);
    /// Mode gate: form is invalid in 64-bit mode.
    pub const NOT_64: CpuFeatures = CpuFeatures(1 << 31);

    /// Every feature bit set (mode gates excluded).
    pub const ALL: CpuFeatures = CpuFeatures(0x3FFF_FFFF);

    /// Union of two feature sets.
    #[must_use]
    pub const fn or(self, other: CpuFeatures) -> CpuFeatures {
        CpuFeatures(self.0 | other.0)
    }

    /// Whether every bit of `required` is present in `self`.
    #[must_use]
    pub fn contains(self, required: CpuFeatures) -> bool {
        self.0 & required.0 == required.0
    }

    /// Strip the mode-gate bits, leaving only real feature requirements.
    #[must_use]
    pub fn without_mode_gates(self) -> CpuFeatures {
        CpuFeatures(self.0 & !(Self::ONLY_64.0 | Self::NOT_64.0))
    }

    /// Whether the 64-bit-only gate is set.
    #[must_use]
    pub fn only_64(self) -> bool {
        self.0 & Self::ONLY_64.0 != 0
    }

    /// Whether the not-in-64-bit gate is set.
    #[must_use]
    pub fn not_64(self) -> bool {
        self.0 & Self::NOT_64.0 != 0
    }
}

/// The assembly context threaded through the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Context {
    /// Execution mode.
    pub mode: Mode,
    /// Enabled CPU features.
    pub cpu: CpuFeatures,
    /// Active syntax dialect.
    pub dialect: Dialect,
}

impl Context {
    /// A context for `mode` with all CPU features enabled and NASM dialect.
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            cpu: CpuFeatures::ALL,
            dialect: Dialect::Nasm,
        }
    }

    /// Switch the dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    /// Restrict the enabled CPU features.
    #[must_use]
    pub fn with_cpu(mut self, cpu: CpuFeatures) -> Self {
        self.cpu = cpu;
        self
    }

    /// Whether a form's CPU requirement (including mode gates) is satisfied.
    #[must_use]
    pub fn cpu_ok(&self, required: CpuFeatures) -> bool {
        if required.only_64() && !self.mode.is_64() {
            return false;
        }
        if required.not_64() && self.mode.is_64() {
            return false;
        }
        self.cpu.contains(required.without_mode_gates())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_widths() {
        assert_eq!(Mode::Bits16.bits(), 16);
        assert_eq!(Mode::Bits64.bits(), 64);
        assert_eq!(Mode::Bits64.default_opersize(), 32);
        assert_eq!(Mode::Bits64.default_addrsize(), 64);
    }

    #[test]
    fn feature_subset() {
        let enabled = CpuFeatures::F186.or(CpuFeatures::F286).or(CpuFeatures::F386);
        assert!(enabled.contains(CpuFeatures::F286));
        assert!(enabled.contains(CpuFeatures::ANY));
        assert!(!enabled.contains(CpuFeatures::F486));
    }

    #[test]
    fn mode_gates_checked_and_stripped() {
        let ctx32 = Context::new(Mode::Bits32);
        let ctx64 = Context::new(Mode::Bits64);

        let only64 = CpuFeatures::ONLY_64;
        assert!(!ctx32.cpu_ok(only64));
        assert!(ctx64.cpu_ok(only64));

        let not64 = CpuFeatures::NOT_64;
        assert!(ctx32.cpu_ok(not64));
        assert!(!ctx64.cpu_ok(not64));

        // Gates must not leak into the subset test.
        let gated_feature = CpuFeatures::F386.or(CpuFeatures::ONLY_64);
        let ctx64_no386 = Context::new(Mode::Bits64).with_cpu(CpuFeatures::F186);
        assert!(!ctx64_no386.cpu_ok(gated_feature));
        let ctx64_386 = Context::new(Mode::Bits64).with_cpu(CpuFeatures::F386);
        assert!(ctx64_386.cpu_ok(gated_feature));
    }
}
