//! Error and warning types for the selection/resolution/emission pipeline.
//!
//! Errors abort the current bytecode but never the whole run; the driver
//! collects them so a single pass over a source unit can surface every
//! diagnostic at once.  Warnings never abort anything.

#[allow(unused_imports)]
use alloc::format;
use alloc::string::String;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

/// Assembly error, tagged with the 1-based source line it came from.
///
/// A line of 0 means the construct was generated internally.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsmError {
    /// No candidate form matched the operand combination.
    InvalidOperands {
        /// Description of the operand combination that failed.
        detail: String,
        /// Source line of the instruction.
        line: u32,
    },

    /// A register cannot be encoded with the REX prefix the form requires
    /// (AH/BH/CH/DH combined with any REX-requiring operand), or an
    /// extended register was used outside 64-bit mode.
    RegisterUnencodable {
        /// Description of the conflicting register.
        detail: String,
        /// Source line of the instruction.
        line: u32,
    },

    /// The requested jump form (short/near/far) has no encoding for this
    /// mnemonic.
    MissingJumpForm {
        /// Which form is missing: "short", "near", or "far".
        form: &'static str,
        /// Source line of the jump.
        line: u32,
    },

    /// A short jump's resolved displacement does not fit in -128..=127.
    ShortJumpOutOfRange {
        /// The resolved displacement.
        disp: i64,
        /// Source line of the jump.
        line: u32,
    },

    /// A target modifier (short/near/far/to) is not valid for the
    /// instruction it was applied to.
    BadTargetModifier {
        /// Source line of the instruction.
        line: u32,
    },

    /// The effective address cannot be encoded (two base registers,
    /// invalid scale, bad 16-bit register combination, and so on).
    EffectiveAddress {
        /// Description of the addressing problem.
        detail: String,
        /// Source line of the instruction.
        line: u32,
    },

    /// A symbolic value could not be resolved when a definite answer was
    /// required (commit-phase resolution).
    Unresolved {
        /// The symbol or construct that stayed symbolic.
        detail: String,
        /// Source line of the instruction.
        line: u32,
    },

    /// A label was defined more than once.
    DuplicateLabel {
        /// The label name.
        name: String,
        /// Source line of the second definition.
        line: u32,
    },

    /// Resolution did not converge within the allowed number of passes.
    ResolutionLimit {
        /// Maximum number of passes allowed.
        max: usize,
    },

    /// Emission was requested while the error count is nonzero.
    ErrorsPresent {
        /// Number of errors collected.
        count: usize,
    },

    /// Internal invariant violation (invalid ModRM at emission time, REX
    /// outside 64-bit mode, ...).  Indicates a bug in the selector or
    /// resolver, not a user error.
    Internal {
        /// Description of the violated invariant.
        detail: String,
        /// Source line of the offending bytecode.
        line: u32,
    },

    /// Multiple errors collected during a run.
    Multiple {
        /// The collected errors.
        errors: Vec<AsmError>,
    },
}

impl AsmError {
    /// The source line the error is tagged with (0 for run-level errors).
    #[must_use]
    pub fn line(&self) -> u32 {
        match self {
            AsmError::InvalidOperands { line, .. }
            | AsmError::RegisterUnencodable { line, .. }
            | AsmError::MissingJumpForm { line, .. }
            | AsmError::ShortJumpOutOfRange { line, .. }
            | AsmError::BadTargetModifier { line }
            | AsmError::EffectiveAddress { line, .. }
            | AsmError::Unresolved { line, .. }
            | AsmError::DuplicateLabel { line, .. }
            | AsmError::Internal { line, .. } => *line,
            AsmError::ResolutionLimit { .. }
            | AsmError::ErrorsPresent { .. }
            | AsmError::Multiple { .. } => 0,
        }
    }
}

impl fmt::Display for AsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmError::InvalidOperands { detail, line } => {
                write!(f, "line {}: invalid combination of opcode and operands: {}", line, detail)
            }
            AsmError::RegisterUnencodable { detail, line } => {
                write!(f, "line {}: register not encodable: {}", line, detail)
            }
            AsmError::MissingJumpForm { form, line } => {
                write!(f, "line {}: no {} form of that jump instruction exists", line, form)
            }
            AsmError::ShortJumpOutOfRange { disp, line } => {
                write!(f, "line {}: short jump out of range (displacement={}, max=\u{b1}127)", line, disp)
            }
            AsmError::BadTargetModifier { line } => {
                write!(f, "line {}: invalid target modifier for instruction", line)
            }
            AsmError::EffectiveAddress { detail, line } => {
                write!(f, "line {}: invalid effective address: {}", line, detail)
            }
            AsmError::Unresolved { detail, line } => {
                write!(f, "line {}: cannot resolve {}", line, detail)
            }
            AsmError::DuplicateLabel { name, line } => {
                write!(f, "line {}: label '{}' defined more than once", line, name)
            }
            AsmError::ResolutionLimit { max } => {
                write!(f, "resolution exceeded maximum of {} passes (possible oscillation)", max)
            }
            AsmError::ErrorsPresent { count } => {
                write!(f, "refusing to emit: {} error(s) were reported", count)
            }
            AsmError::Internal { detail, line } => {
                write!(f, "line {}: internal error: {}", line, detail)
            }
            AsmError::Multiple { errors } => {
                for (i, e) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AsmError {}

/// Non-fatal diagnostic, tagged with the 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AsmWarning {
    /// More than one LOCK/REP-class prefix was given; the left-most wins.
    MultipleLockRep {
        /// Source line of the instruction.
        line: u32,
    },

    /// More than one segment override was given; the left-most wins.
    MultipleSegmentOverrides {
        /// Source line of the instruction.
        line: u32,
    },

    /// An explicit address-size override conflicts with the address size
    /// the instruction forces and was ignored.
    AddressSizeIgnored {
        /// Source line of the instruction.
        line: u32,
    },

    /// A value was truncated to fit the destination field.
    ValueTruncated {
        /// The value before truncation.
        value: i64,
        /// Destination field width in bits.
        bits: u8,
        /// Source line of the value.
        line: u32,
    },

    /// GAS-style indirect call/jump without a `*` dereference marker.
    IndirectWithoutStar {
        /// Source line of the instruction.
        line: u32,
    },

    /// A deliberately-matched table row flagged this combination as
    /// discouraged.
    Discouraged {
        /// Description of the discouraged combination.
        detail: String,
        /// Source line of the instruction.
        line: u32,
    },
}

impl fmt::Display for AsmWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AsmWarning::MultipleLockRep { line } => {
                write!(f, "line {}: multiple LOCK/REP prefixes, using leftmost", line)
            }
            AsmWarning::MultipleSegmentOverrides { line } => {
                write!(f, "line {}: multiple segment overrides, using leftmost", line)
            }
            AsmWarning::AddressSizeIgnored { line } => {
                write!(f, "line {}: address size override ignored", line)
            }
            AsmWarning::ValueTruncated { value, bits, line } => {
                write!(f, "line {}: value {} does not fit in {} bits, truncated", line, value, bits)
            }
            AsmWarning::IndirectWithoutStar { line } => {
                write!(f, "line {}: indirect call without '*'", line)
            }
            AsmWarning::Discouraged { detail, line } => {
                write!(f, "line {}: {}", line, detail)
            }
        }
    }
}

/// Collected diagnostics for one run.
///
/// The pipeline reports through this sink instead of unwinding, so one run
/// can surface every error in the unit.  Final emission is refused while
/// [`Diagnostics::error_count`] is nonzero.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostics {
    errors: Vec<AsmError>,
    warnings: Vec<AsmWarning>,
}

impl Diagnostics {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error.
    pub fn error(&mut self, err: AsmError) {
        self.errors.push(err);
    }

    /// Record a warning.
    pub fn warn(&mut self, warning: AsmWarning) {
        self.warnings.push(warning);
    }

    /// Number of errors recorded so far.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// All errors recorded so far.
    #[must_use]
    pub fn errors(&self) -> &[AsmError] {
        &self.errors
    }

    /// All warnings recorded so far.
    #[must_use]
    pub fn warnings(&self) -> &[AsmWarning] {
        &self.warnings
    }

    /// Whether any errors were recorded.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Collapse the recorded errors into a single error value, or `Ok(())`
    /// when none were recorded.
    ///
    /// # Errors
    ///
    /// Returns the sole error directly, or [`AsmError::Multiple`] when more
    /// than one was recorded.
    pub fn into_result(mut self) -> Result<(), AsmError> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.pop().unwrap()),
            _ => Err(AsmError::Multiple {
                errors: self.errors,
            }),
        }
    }
}
