//! The section driver: a bytecode stream, its labels, the global
//! fixed-point resolution loop, and final emission.
//!
//! Resolution runs bounded trial passes until no bytecode's length moves,
//! then a single commit pass binds every deferred encoding choice.  Trial
//! lengths only ever grow, so the loop terminates; the commit pass may
//! shrink (optimizations bind), after which offsets are final.  Errors are
//! collected per-bytecode so one run surfaces every diagnostic; emission
//! is refused while the error count is nonzero.

#[allow(unused_imports)]
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
#[allow(unused_imports)]
use alloc::string::ToString;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;

use crate::bytecode::{resolve, Bytecode, BytecodeKind, Resolution};
use crate::ctx::Context;
use crate::emit::{emit, Output};
use crate::error::{AsmError, AsmWarning, Diagnostics};
use crate::expr::{ExprEnv, SymLoc, SymbolId, SymbolTable};
use crate::form::InsnDef;
use crate::operand::Operand;
use crate::reg::Register;
use crate::select::select;

/// Maximum number of trial passes before giving up.
const MAX_RESOLUTION_PASSES: usize = 100;

/// An instruction prefix as delivered by the parser collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Prefix {
    /// LOCK (0xF0).
    Lock,
    /// REP/REPE (0xF3).
    Rep,
    /// REPNE (0xF2).
    Repne,
    /// Segment override.
    Seg(Register),
}

/// Offset view over the symbol table for one pass.
struct View<'a> {
    symtab: &'a SymbolTable,
    offsets: &'a [u64],
}

impl ExprEnv for View<'_> {
    fn symbol_value(&self, id: SymbolId) -> Option<i64> {
        let off = match self.symtab.loc(id)? {
            SymLoc::Start(i) => *self.offsets.get(i)?,
            SymLoc::End(i) => *self.offsets.get(i + 1)?,
        };
        Some(off as i64)
    }

    fn symbol_name(&self, id: SymbolId) -> Option<Rc<str>> {
        self.symtab.name(id)
    }
}

/// A single output section being assembled.
#[derive(Debug, Default)]
pub struct Section {
    bytecodes: Vec<Bytecode>,
    symtab: SymbolTable,
    diag: Diagnostics,
    resolved: bool,
}

impl Section {
    /// An empty section.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a symbol name (label or external) for use in expressions.
    pub fn symbol(&mut self, name: &str) -> SymbolId {
        self.symtab.intern(name)
    }

    /// Define a label at the current position.
    ///
    /// Redefinition is recorded as an error and leaves the first
    /// definition in place.
    pub fn label(&mut self, name: &str, line: u32) -> SymbolId {
        let id = self.symtab.intern(name);
        if self.symtab.is_defined(id) {
            self.diag.error(AsmError::DuplicateLabel {
                name: name.to_string(),
                line,
            });
            return id;
        }
        self.symtab.define(id, SymLoc::Start(self.bytecodes.len()));
        id
    }

    /// Select and append one instruction.
    ///
    /// Selection failures are recorded in the diagnostics sink (the run
    /// continues), matching the collect-everything error policy.
    pub fn add_insn(
        &mut self,
        def: &InsnDef,
        operands: &[Operand],
        prefixes: &[Prefix],
        ctx: &Context,
        line: u32,
    ) {
        match select(def, operands, ctx, line, &mut self.diag) {
            Ok(mut bc) => {
                self.apply_prefixes(&mut bc, prefixes, line);
                if let BytecodeKind::Jmp(jmp) = &mut bc.kind {
                    jmp.origin = self
                        .symtab
                        .fresh(SymLoc::End(self.bytecodes.len()));
                }
                self.bytecodes.push(bc);
            }
            Err(e) => self.diag.error(e),
        }
    }

    /// Append raw data bytes.
    pub fn add_bytes(&mut self, bytes: Vec<u8>, line: u32) {
        self.bytecodes
            .push(Bytecode::new(BytecodeKind::Raw(bytes), line));
    }

    fn apply_prefixes(&mut self, bc: &mut Bytecode, prefixes: &[Prefix], line: u32) {
        let mut lockrep: Option<u8> = None;
        let mut seg: Option<Register> = None;
        for p in prefixes {
            match p {
                Prefix::Lock | Prefix::Rep | Prefix::Repne => {
                    let byte = match p {
                        Prefix::Lock => 0xF0,
                        Prefix::Rep => 0xF3,
                        _ => 0xF2,
                    };
                    if lockrep.is_some() {
                        self.diag.warn(AsmWarning::MultipleLockRep { line });
                    } else {
                        lockrep = Some(byte);
                    }
                }
                Prefix::Seg(r) => {
                    if seg.is_some() {
                        self.diag.warn(AsmWarning::MultipleSegmentOverrides { line });
                    } else {
                        seg = Some(*r);
                    }
                }
            }
        }
        match &mut bc.kind {
            BytecodeKind::Insn(insn) => {
                insn.lockrep = lockrep;
                if let Some(s) = seg {
                    if let Some(ea) = &mut insn.ea {
                        if ea.segment.is_some() {
                            self.diag.warn(AsmWarning::MultipleSegmentOverrides { line });
                        } else {
                            ea.segment = Some(s);
                        }
                    }
                }
            }
            BytecodeKind::Jmp(jmp) => jmp.lockrep = lockrep,
            BytecodeKind::Raw(_) => {}
        }
    }

    /// Offset table with an end sentinel: `offsets[i]` is the start of
    /// bytecode `i`, `offsets[len]` the section end.
    fn compute_offsets(&self, offsets: &mut Vec<u64>) {
        offsets.clear();
        let mut cur = 0u64;
        for bc in &self.bytecodes {
            offsets.push(cur);
            cur += u64::from(bc.len);
        }
        offsets.push(cur);
    }

    /// Run the global fixed-point resolution: trial passes until lengths
    /// stop moving, then the commit pass.
    pub fn resolve(&mut self, ctx: &Context) {
        if self.resolved {
            return;
        }
        let mut offsets: Vec<u64> = Vec::with_capacity(self.bytecodes.len() + 1);

        let mut pass = 0;
        loop {
            pass += 1;
            if pass > MAX_RESOLUTION_PASSES {
                self.diag.error(AsmError::ResolutionLimit {
                    max: MAX_RESOLUTION_PASSES,
                });
                self.resolved = true;
                return;
            }
            self.compute_offsets(&mut offsets);
            let mut changed = false;
            for bc in self.bytecodes.iter_mut() {
                if bc.errored {
                    continue;
                }
                let old = bc.len;
                let view = View {
                    symtab: &self.symtab,
                    offsets: &offsets,
                };
                match resolve(bc, ctx, false, &view) {
                    Ok(Resolution::MinLen | Resolution::MayShrink | Resolution::Unknown) => {}
                    Err(e) => {
                        bc.errored = true;
                        self.diag.error(e);
                    }
                }
                debug_assert!(
                    old == 0 || bc.len >= old,
                    "trial length shrank from {} to {}",
                    old,
                    bc.len
                );
                if bc.len != old {
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // Commit pass: bind deferred choices; lengths may shrink here.
        self.compute_offsets(&mut offsets);
        for bc in self.bytecodes.iter_mut() {
            if bc.errored {
                continue;
            }
            let view = View {
                symtab: &self.symtab,
                offsets: &offsets,
            };
            if let Err(e) = resolve(bc, ctx, true, &view) {
                bc.errored = true;
                self.diag.error(e);
            }
        }
        self.resolved = true;
    }

    /// Resolve (if not yet done) and emit the final bytes.
    ///
    /// # Errors
    ///
    /// [`AsmError::ErrorsPresent`] when any error was collected;
    /// otherwise only internal invariant violations.
    pub fn emit(&mut self, ctx: &Context) -> Result<Output, AsmError> {
        self.resolve(ctx);
        if self.diag.has_errors() {
            return Err(AsmError::ErrorsPresent {
                count: self.diag.error_count(),
            });
        }
        let mut offsets: Vec<u64> = Vec::with_capacity(self.bytecodes.len() + 1);
        self.compute_offsets(&mut offsets);

        let mut out = Output::new();
        for bc in &self.bytecodes {
            let view = View {
                symtab: &self.symtab,
                offsets: &offsets,
            };
            let before = out.len();
            emit(bc, ctx, &mut out, &view, &mut self.diag)?;
            debug_assert_eq!(
                (out.len() - before) as u32,
                bc.len,
                "emitted length disagrees with resolved length at line {}",
                bc.line
            );
        }
        Ok(out)
    }

    /// Collected diagnostics.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diag
    }

    /// Number of bytecodes in the stream.
    #[must_use]
    pub fn bytecode_count(&self) -> usize {
        self.bytecodes.len()
    }

    /// Human-readable dump of the resolved stream, for debugging.
    #[must_use]
    pub fn listing(&self) -> String {
        let mut offsets = Vec::with_capacity(self.bytecodes.len() + 1);
        self.compute_offsets(&mut offsets);
        let mut s = String::new();
        for (i, bc) in self.bytecodes.iter().enumerate() {
            let kind = match &bc.kind {
                BytecodeKind::Insn(_) => "insn",
                BytecodeKind::Jmp(_) => "jmp",
                BytecodeKind::Raw(_) => "data",
            };
            s.push_str(&format!(
                "{:08x}  len={:<3} line={:<4} {}{}\n",
                offsets[i],
                bc.len,
                bc.line,
                kind,
                if bc.errored { "  (error)" } else { "" }
            ));
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::Mode;
    use crate::expr::Expr;
    use crate::form::{
        req_tmod, Action, EncodingForm, InsnDef, ReqKind, SizeReq, EMPTY_FORM,
    };
    use crate::operand::TargetMod;

    // A minimal jump group: short EB, near E9.
    const JMP_FORMS: &[EncodingForm] = &[
        EncodingForm {
            opcode: [0xEB, 0, 0],
            def_opersize_64: 64,
            operands: &[req_tmod(
                ReqKind::Imm,
                SizeReq::Any,
                Action::JmpRel,
                Some(TargetMod::Short),
            )],
            ..EMPTY_FORM
        },
        EncodingForm {
            opcode: [0xE9, 0, 0],
            def_opersize_64: 64,
            operands: &[req_tmod(
                ReqKind::Imm,
                SizeReq::Any,
                Action::JmpRel,
                Some(TargetMod::Near),
            )],
            ..EMPTY_FORM
        },
        EncodingForm {
            opcode: [0xE9, 0, 0],
            def_opersize_64: 64,
            operands: &[req_tmod(ReqKind::Imm, SizeReq::Any, Action::JmpRel, None)],
            ..EMPTY_FORM
        },
    ];
    const JMP: InsnDef = InsnDef::plain(JMP_FORMS);

    const NOP_FORMS: &[EncodingForm] = &[EncodingForm {
        opcode: [0x90, 0, 0],
        ..EMPTY_FORM
    }];
    const NOP: InsnDef = InsnDef::plain(NOP_FORMS);

    fn ctx() -> Context {
        Context::new(Mode::Bits32)
    }

    fn jmp_to(sec: &mut Section, name: &str, line: u32) {
        let sym = sec.symbol(name);
        sec.add_insn(&JMP, &[Operand::imm(Expr::Sym(sym))], &[], &ctx(), line);
    }

    #[test]
    fn backward_short_jump() {
        let mut sec = Section::new();
        sec.label("top", 1);
        sec.add_insn(&NOP, &[], &[], &ctx(), 2);
        jmp_to(&mut sec, "top", 3);
        let out = sec.emit(&ctx()).unwrap();
        // nop; jmp -3
        assert_eq!(out.bytes(), &[0x90, 0xEB, 0xFD]);
    }

    #[test]
    fn forward_short_jump() {
        let mut sec = Section::new();
        jmp_to(&mut sec, "end", 1);
        sec.add_insn(&NOP, &[], &[], &ctx(), 2);
        sec.label("end", 3);
        let out = sec.emit(&ctx()).unwrap();
        assert_eq!(out.bytes(), &[0xEB, 0x01, 0x90]);
    }

    #[test]
    fn boundary_127_stays_short() {
        let mut sec = Section::new();
        jmp_to(&mut sec, "end", 1);
        sec.add_bytes(vec![0x90; 127], 2);
        sec.label("end", 3);
        let out = sec.emit(&ctx()).unwrap();
        assert_eq!(out.bytes()[0], 0xEB);
        assert_eq!(out.bytes()[1], 0x7F);
        assert_eq!(out.bytes().len(), 129);
    }

    #[test]
    fn boundary_128_promotes_to_near() {
        let mut sec = Section::new();
        jmp_to(&mut sec, "end", 1);
        sec.add_bytes(vec![0x90; 128], 2);
        sec.label("end", 3);
        let out = sec.emit(&ctx()).unwrap();
        assert_eq!(out.bytes()[0], 0xE9);
        assert_eq!(
            &out.bytes()[1..5],
            &0x80i32.to_le_bytes()[..]
        );
        assert_eq!(out.bytes().len(), 133);
    }

    #[test]
    fn cascading_promotion() {
        // Promoting the second jump pushes the first one's target out of
        // short range as well.
        let mut sec = Section::new();
        jmp_to(&mut sec, "l1", 1);
        sec.add_bytes(vec![0x90; 125], 2);
        jmp_to(&mut sec, "l2", 3);
        sec.label("l1", 4);
        sec.add_bytes(vec![0x90; 130], 5);
        sec.label("l2", 6);
        let out = sec.emit(&ctx()).unwrap();
        // With both short, l1 sits exactly 127 past the first jump — but
        // the second jump's 130-byte displacement forces it to near form,
        // which pushes l1 out of range for the first as well.
        assert_eq!(out.bytes()[0], 0xE9);
        assert_eq!(out.bytes()[5 + 125], 0xE9);
        assert_eq!(out.bytes().len(), 5 + 125 + 5 + 130);
    }

    #[test]
    fn undefined_label_becomes_relocation() {
        let mut sec = Section::new();
        jmp_to(&mut sec, "external", 1);
        let out = sec.emit(&ctx()).unwrap();
        // Near form with a pc-relative placeholder.
        assert_eq!(out.bytes()[0], 0xE9);
        assert_eq!(out.relocations().len(), 1);
        assert_eq!(&*out.relocations()[0].symbol, "external");
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let mut sec = Section::new();
        sec.label("x", 1);
        sec.add_insn(&NOP, &[], &[], &ctx(), 2);
        sec.label("x", 3);
        assert!(sec.emit(&ctx()).is_err());
        assert_eq!(sec.diagnostics().error_count(), 1);
    }

    #[test]
    fn errors_aggregate_across_bytecodes() {
        let mut sec = Section::new();
        // Three instructions with operands NOP can never take.
        for line in 1..=3 {
            sec.add_insn(&NOP, &[Operand::imm_const(1)], &[], &ctx(), line);
        }
        match sec.emit(&ctx()) {
            Err(AsmError::ErrorsPresent { count }) => assert_eq!(count, 3),
            other => panic!("expected ErrorsPresent, got {:?}", other),
        }
        assert_eq!(sec.diagnostics().error_count(), 3);
    }

    #[test]
    fn listing_mentions_each_bytecode() {
        let mut sec = Section::new();
        sec.add_insn(&NOP, &[], &[], &ctx(), 1);
        sec.add_bytes(vec![1, 2, 3], 2);
        sec.resolve(&ctx());
        let listing = sec.listing();
        assert!(listing.contains("insn"));
        assert!(listing.contains("data"));
    }
}
