//! # asmcore — x86/x86-64 instruction-selection and emission core
//!
//! `asmcore` is the back half of an assembler: it takes a mnemonic handle
//! and a structured operand list (a front end's output), selects a binary
//! encoding form, tracks the result as a variable-length *bytecode*,
//! iteratively resolves every bytecode's final size, and emits concrete
//! machine code with relocations for whatever stayed symbolic.
//!
//! ## Quick start
//!
//! ```rust
//! use asmcore::{lookup, Context, Mode, Operand, Register, Section};
//!
//! let ctx = Context::new(Mode::Bits64);
//! let mut sec = Section::new();
//! sec.add_insn(lookup("nop").unwrap(), &[], &[], &ctx, 1);
//! sec.add_insn(
//!     lookup("push").unwrap(),
//!     &[Operand::reg(Register::Rax)],
//!     &[],
//!     &ctx,
//!     2,
//! );
//! let out = sec.emit(&ctx).unwrap();
//! assert_eq!(out.bytes(), &[0x90, 0x50]);
//! ```
//!
//! ## Pipeline
//!
//! - **Selection** — first-match walk over a mnemonic's ordered candidate
//!   forms; builds an instruction or relative-jump bytecode.
//! - **Resolution** — bounded trial passes size every bytecode without
//!   committing, growing monotonically until a fixed point; one commit
//!   pass then binds the deferred choices (short/near jumps, shift-by-1,
//!   sign-extended imm8, direct-offset MOV).
//! - **Emission** — a single final pass writes prefixes, REX, opcode,
//!   ModR/M, SIB, displacement, and immediates, recording relocations
//!   where symbols stayed unresolved.
//!
//! ## Features
//!
//! - **`no_std` + `alloc`** — usable in embedded and sandboxed hosts
//!   (`std` is on by default, only gating `std::error::Error` impls).
//! - **`serde`** — serialization derives on the public data types.

#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]
// ── Lint policy ─────────────────────────────────────────────────────────
// Encoders narrow and widen integers constantly (i64→u8 displacement
// bytes, u8→u16 size promotion) and the tables are dense hex; these lints
// would fight every line of that.
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_possible_wrap,
    clippy::cast_lossless,
    clippy::unreadable_literal,
    clippy::match_same_arms,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::too_many_arguments,
    clippy::too_many_lines,
    clippy::uninlined_format_args,
    clippy::wildcard_imports
)]

extern crate alloc;

/// Bytecodes and the two-phase length resolver.
pub mod bytecode;
/// Assembly context: mode, CPU features, dialect.
pub mod ctx;
/// Effective-address analysis (ModR/M, SIB, displacement sizing).
pub mod ea;
/// Final byte emission and relocations.
pub mod emit;
/// Error and warning types.
pub mod error;
/// Displacement/immediate expressions and symbols.
pub mod expr;
/// Static encoding-form descriptors.
pub mod form;
/// Runtime operands.
pub mod operand;
/// Register model.
pub mod reg;
/// Instruction selection.
pub mod select;
/// The section driver: bytecode stream, fixed-point loop, emission.
pub mod section;
/// Static encoding tables and the mnemonic index.
pub mod table;

pub use bytecode::{resolve, Bytecode, BytecodeKind, Resolution};
pub use ctx::{Context, CpuFeatures, Dialect, Mode};
pub use ea::EffectiveAddress;
pub use emit::{emit, Output, RelocKind, Relocation};
pub use error::{AsmError, AsmWarning, Diagnostics};
pub use expr::{Expr, ExprEnv, SymbolId, SymbolTable};
pub use form::InsnDef;
pub use operand::{Operand, OperandKind, TargetMod};
pub use reg::Register;
pub use section::{Prefix, Section};
pub use select::select;
pub use table::{lookup, MNEMONICS};
