//! Static encoding-form tables.
//!
//! Pure data: ordered candidate lists per mnemonic group, plus a sorted
//! mnemonic index resolved by binary search.  Row order is meaningful —
//! the selector stops at the first match — so accumulator rows precede
//! generic ones and short-jump rows precede near rows.
//!
//! Shared groups read the per-mnemonic modifier bytes: e.g. every
//! arithmetic-group mnemonic points at [`ARITH_FORMS`] and supplies
//! `[opcode_delta, spare]`, which rows consume through their `mods` lists.

use crate::ctx::CpuFeatures;
use crate::form::{
    req, req_post, req_rel, req_tmod, Action, EncodingForm, InsnDef, ModAction, PostAction,
    ReqKind, SizeReq, EMPTY_FORM,
};
use crate::operand::TargetMod;

const C186: CpuFeatures = CpuFeatures::F186;
const C286: CpuFeatures = CpuFeatures::F286;
const C386: CpuFeatures = CpuFeatures::F386;
const C486: CpuFeatures = CpuFeatures::F486;
const NOT64: CpuFeatures = CpuFeatures::NOT_64;
const ONLY64: CpuFeatures = CpuFeatures::ONLY_64;

const fn op1(b: u8) -> [u8; 3] {
    [b, 0, 0]
}

const fn op2(a: u8, b: u8) -> [u8; 3] {
    [a, b, 0]
}

// ─── Generic zero-operand groups ───────────────────────────

/// One opcode byte from the modifier data.
const ONEBYTE: &[EncodingForm] = &[EncodingForm {
    mods: &[ModAction::AddOp0],
    ..EMPTY_FORM
}];

/// One opcode byte, invalid in 64-bit mode.
const ONEBYTE_NOT64: &[EncodingForm] = &[EncodingForm {
    cpu: NOT64,
    mods: &[ModAction::AddOp0],
    ..EMPTY_FORM
}];

/// One opcode byte plus an operand-size selection.
const ONEBYTE_OPER: &[EncodingForm] = &[EncodingForm {
    mods: &[ModAction::AddOp0, ModAction::SetOperSize],
    ..EMPTY_FORM
}];

/// One opcode byte plus operand size, 64-bit mode only.
const ONEBYTE_OPER64: &[EncodingForm] = &[EncodingForm {
    cpu: ONLY64,
    mods: &[ModAction::AddOp0, ModAction::SetOperSize],
    ..EMPTY_FORM
}];

/// Two opcode bytes from the modifier data.
const TWOBYTE: &[EncodingForm] = &[EncodingForm {
    mods: &[ModAction::AddOp0, ModAction::AddOp1],
    opcode_len: 2,
    ..EMPTY_FORM
}];

/// Mandatory prefix byte plus one opcode byte.
const ONEBYTE_PREFIX: &[EncodingForm] = &[EncodingForm {
    mods: &[ModAction::AddPrefix, ModAction::AddOp0],
    ..EMPTY_FORM
}];

// ─── RET / AAM-AAD ─────────────────────────────────────────

const RET_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0xC3),
        def_opersize_64: 64,
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xC2),
        def_opersize_64: 64,
        operands: &[req_rel(ReqKind::Imm, SizeReq::S16, Action::Imm)],
        ..EMPTY_FORM
    },
];

const RETF_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0xCB),
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xCA),
        operands: &[req_rel(ReqKind::Imm, SizeReq::S16, Action::Imm)],
        ..EMPTY_FORM
    },
];

/// AAM/AAD: explicit base operand, or the implicit default 10 drawn from
/// the modifier data.
const AAX_FORMS: &[EncodingForm] = &[
    EncodingForm {
        cpu: NOT64,
        mods: &[ModAction::AddOp0],
        operands: &[req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        mods: &[ModAction::AddOp0, ModAction::SetImmByte],
        ..EMPTY_FORM
    },
];

// ─── MOV ───────────────────────────────────────────────────

const MOV_FORMS: &[EncodingForm] = &[
    // Accumulator stores/loads first: they carry the direct-offset
    // optimization the generic rows cannot express.
    EncodingForm {
        opcode: op1(0x88),
        opersize: 8,
        operands: &[
            req_post(ReqKind::Mem, SizeReq::S8, Action::Ea, PostAction::ShortMov(0xA2)),
            req(ReqKind::Areg, SizeReq::S8, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x89),
        opersize: 16,
        operands: &[
            req_post(ReqKind::Mem, SizeReq::S16, Action::Ea, PostAction::ShortMov(0xA3)),
            req(ReqKind::Areg, SizeReq::S16, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x89),
        opersize: 32,
        operands: &[
            req_post(ReqKind::Mem, SizeReq::S32, Action::Ea, PostAction::ShortMov(0xA3)),
            req(ReqKind::Areg, SizeReq::S32, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x89),
        opersize: 64,
        operands: &[
            req(ReqKind::Mem, SizeReq::S64, Action::Ea),
            req(ReqKind::Areg, SizeReq::S64, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x8A),
        opersize: 8,
        operands: &[
            req(ReqKind::Areg, SizeReq::S8, Action::Spare),
            req_post(ReqKind::Mem, SizeReq::S8, Action::Ea, PostAction::ShortMov(0xA0)),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x8B),
        opersize: 16,
        operands: &[
            req(ReqKind::Areg, SizeReq::S16, Action::Spare),
            req_post(ReqKind::Mem, SizeReq::S16, Action::Ea, PostAction::ShortMov(0xA1)),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x8B),
        opersize: 32,
        operands: &[
            req(ReqKind::Areg, SizeReq::S32, Action::Spare),
            req_post(ReqKind::Mem, SizeReq::S32, Action::Ea, PostAction::ShortMov(0xA1)),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x8B),
        opersize: 64,
        operands: &[
            req(ReqKind::Areg, SizeReq::S64, Action::Spare),
            req(ReqKind::Mem, SizeReq::S64, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    // Generic store/load.
    EncodingForm {
        opcode: op1(0x88),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
            req(ReqKind::Reg, SizeReq::S8, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x89),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x89),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x89),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x8A),
        opersize: 8,
        operands: &[
            req(ReqKind::Reg, SizeReq::S8, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x8B),
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x8B),
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x8B),
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    // Segment-register moves.
    EncodingForm {
        opcode: op1(0x8E),
        operands: &[
            req(ReqKind::SegReg, SizeReq::Any, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x8C),
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req(ReqKind::SegReg, SizeReq::Any, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    // Control/debug/test register moves.
    EncodingForm {
        cpu: C386.or(NOT64),
        opcode: op2(0x0F, 0x20),
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Ea),
            req(ReqKind::CtrlReg, SizeReq::Any, Action::Spare),
        ],
        opcode_len: 2,
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op2(0x0F, 0x20),
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::Ea),
            req(ReqKind::CtrlReg, SizeReq::Any, Action::Spare),
        ],
        opcode_len: 2,
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386.or(NOT64),
        opcode: op2(0x0F, 0x22),
        operands: &[
            req(ReqKind::CtrlReg, SizeReq::Any, Action::Spare),
            req(ReqKind::Reg, SizeReq::S32, Action::Ea),
        ],
        opcode_len: 2,
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op2(0x0F, 0x22),
        operands: &[
            req(ReqKind::CtrlReg, SizeReq::Any, Action::Spare),
            req(ReqKind::Reg, SizeReq::S64, Action::Ea),
        ],
        opcode_len: 2,
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op2(0x0F, 0x21),
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Ea),
            req(ReqKind::DebugReg, SizeReq::Any, Action::Spare),
        ],
        opcode_len: 2,
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op2(0x0F, 0x23),
        operands: &[
            req(ReqKind::DebugReg, SizeReq::Any, Action::Spare),
            req(ReqKind::Reg, SizeReq::S32, Action::Ea),
        ],
        opcode_len: 2,
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C486.or(NOT64),
        opcode: op2(0x0F, 0x24),
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Ea),
            req(ReqKind::TestReg, SizeReq::Any, Action::Spare),
        ],
        opcode_len: 2,
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C486.or(NOT64),
        opcode: op2(0x0F, 0x26),
        operands: &[
            req(ReqKind::TestReg, SizeReq::Any, Action::Spare),
            req(ReqKind::Reg, SizeReq::S32, Action::Ea),
        ],
        opcode_len: 2,
        ..EMPTY_FORM
    },
    // Register immediates.
    EncodingForm {
        opcode: op1(0xB0),
        opersize: 8,
        operands: &[
            req(ReqKind::Reg, SizeReq::S8, Action::AddOp0),
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xB8),
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::AddOp0),
            req_rel(ReqKind::Imm, SizeReq::S16, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0xB8),
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::AddOp0),
            req_rel(ReqKind::Imm, SizeReq::S32, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    // An explicitly 32-bit immediate into a 64-bit register takes the
    // shorter sign-extended C7 form; the full imm64 row follows.
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0xC7),
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::Ea),
            req(ReqKind::Imm, SizeReq::S32, Action::SignExtImm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0xB8),
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::AddOp0),
            req_rel(ReqKind::Imm, SizeReq::S64, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    // Memory immediates.
    EncodingForm {
        opcode: op1(0xC6),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xC7),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req_rel(ReqKind::Imm, SizeReq::S16, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0xC7),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req_rel(ReqKind::Imm, SizeReq::S32, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0xC7),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req_rel(ReqKind::Imm, SizeReq::S32, Action::SignExtImm),
        ],
        ..EMPTY_FORM
    },
];

// ─── Arithmetic group (ADD/OR/ADC/SBB/AND/SUB/XOR/CMP) ─────
//
// Modifier data: [opcode_delta = group * 8, spare = group].

const ARITH_FORMS: &[EncodingForm] = &[
    EncodingForm {
        mods: &[ModAction::AddOp0],
        opcode: op1(0x04),
        opersize: 8,
        operands: &[
            req(ReqKind::Areg, SizeReq::S8, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::AddOp0],
        opcode: op1(0x05),
        opersize: 16,
        operands: &[
            req(ReqKind::Areg, SizeReq::S16, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S16, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::AddOp0],
        opcode: op1(0x05),
        opersize: 32,
        operands: &[
            req(ReqKind::Areg, SizeReq::S32, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S32, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::AddOp0],
        opcode: op1(0x05),
        opersize: 64,
        operands: &[
            req(ReqKind::Areg, SizeReq::S64, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S32, Action::SignExtImm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0x80),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    // Explicit byte immediates pick 83 /r directly.
    EncodingForm {
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0x83),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req(ReqKind::Imm, SizeReq::S8, Action::SignExtImm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0x83),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req(ReqKind::Imm, SizeReq::S8, Action::SignExtImm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0x83),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req(ReqKind::Imm, SizeReq::S8, Action::SignExtImm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0x81),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req_post(
                ReqKind::Imm,
                SizeReq::S16,
                Action::Imm,
                PostAction::SignExtImm8(0x83),
            ),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0x81),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req_post(
                ReqKind::Imm,
                SizeReq::S32,
                Action::Imm,
                PostAction::SignExtImm8(0x83),
            ),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0x81),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req_post(
                ReqKind::Imm,
                SizeReq::S32,
                Action::SignExtImm,
                PostAction::SignExtImm8(0x83),
            ),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::AddOp0],
        opcode: op1(0x00),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
            req(ReqKind::Reg, SizeReq::S8, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::AddOp0],
        opcode: op1(0x01),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::AddOp0],
        opcode: op1(0x01),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::AddOp0],
        opcode: op1(0x01),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::AddOp0],
        opcode: op1(0x02),
        opersize: 8,
        operands: &[
            req(ReqKind::Reg, SizeReq::S8, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::AddOp0],
        opcode: op1(0x03),
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::AddOp0],
        opcode: op1(0x03),
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::AddOp0],
        opcode: op1(0x03),
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
        ],
        ..EMPTY_FORM
    },
];

// ─── Shift group (ROL/ROR/RCL/RCR/SHL/SHR/SAR) ─────────────
//
// Modifier data: [spare].

const SHIFT_FORMS: &[EncodingForm] = &[
    EncodingForm {
        mods: &[ModAction::AddSpare],
        opcode: op1(0xD0),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
            req(ReqKind::Imm1, SizeReq::Any, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::AddSpare],
        opcode: op1(0xD1),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req(ReqKind::Imm1, SizeReq::Any, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::AddSpare],
        opcode: op1(0xD1),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req(ReqKind::Imm1, SizeReq::Any, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::AddSpare],
        opcode: op1(0xD1),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req(ReqKind::Imm1, SizeReq::Any, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::AddSpare],
        opcode: op1(0xD2),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
            req(ReqKind::Creg, SizeReq::S8, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::AddSpare],
        opcode: op1(0xD3),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req(ReqKind::Creg, SizeReq::S8, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::AddSpare],
        opcode: op1(0xD3),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req(ReqKind::Creg, SizeReq::S8, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::AddSpare],
        opcode: op1(0xD3),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req(ReqKind::Creg, SizeReq::S8, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C186,
        mods: &[ModAction::AddSpare],
        opcode: op1(0xC0),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
            req_post(ReqKind::Imm, SizeReq::S8, Action::Imm, PostAction::ShiftOp),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C186,
        mods: &[ModAction::AddSpare],
        opcode: op1(0xC1),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req_post(ReqKind::Imm, SizeReq::S8, Action::Imm, PostAction::ShiftOp),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::AddSpare],
        opcode: op1(0xC1),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req_post(ReqKind::Imm, SizeReq::S8, Action::Imm, PostAction::ShiftOp),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::AddSpare],
        opcode: op1(0xC1),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req_post(ReqKind::Imm, SizeReq::S8, Action::Imm, PostAction::ShiftOp),
        ],
        ..EMPTY_FORM
    },
];

// ─── Group 3 (NOT/NEG/MUL/DIV/IDIV) ────────────────────────
//
// Modifier data: [spare].

const GRP3_FORMS: &[EncodingForm] = &[
    EncodingForm {
        mods: &[ModAction::AddSpare],
        opcode: op1(0xF6),
        opersize: 8,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::AddSpare],
        opcode: op1(0xF7),
        opersize: 16,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::AddSpare],
        opcode: op1(0xF7),
        opersize: 32,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::AddSpare],
        opcode: op1(0xF7),
        opersize: 64,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea)],
        ..EMPTY_FORM
    },
];

const IMUL_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0xF6),
        opersize: 8,
        spare: 5,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xF7),
        opersize: 16,
        spare: 5,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0xF7),
        opersize: 32,
        spare: 5,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0xF7),
        opersize: 64,
        spare: 5,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op2(0x0F, 0xAF),
        opcode_len: 2,
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op2(0x0F, 0xAF),
        opcode_len: 2,
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op2(0x0F, 0xAF),
        opcode_len: 2,
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C186,
        opcode: op1(0x6B),
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req(ReqKind::Imm, SizeReq::S8, Action::SignExtImm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x6B),
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req(ReqKind::Imm, SizeReq::S8, Action::SignExtImm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C186,
        opcode: op1(0x69),
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req_post(
                ReqKind::Imm,
                SizeReq::S16,
                Action::Imm,
                PostAction::SignExtImm8(0x6B),
            ),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x69),
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req_post(
                ReqKind::Imm,
                SizeReq::S32,
                Action::Imm,
                PostAction::SignExtImm8(0x6B),
            ),
        ],
        ..EMPTY_FORM
    },
];

// ─── TEST ──────────────────────────────────────────────────

const TEST_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0xA8),
        opersize: 8,
        operands: &[
            req(ReqKind::Areg, SizeReq::S8, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xA9),
        opersize: 16,
        operands: &[
            req(ReqKind::Areg, SizeReq::S16, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S16, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0xA9),
        opersize: 32,
        operands: &[
            req(ReqKind::Areg, SizeReq::S32, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S32, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0xA9),
        opersize: 64,
        operands: &[
            req(ReqKind::Areg, SizeReq::S64, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S32, Action::SignExtImm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xF6),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xF7),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req_rel(ReqKind::Imm, SizeReq::S16, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0xF7),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req_rel(ReqKind::Imm, SizeReq::S32, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0xF7),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req_rel(ReqKind::Imm, SizeReq::S32, Action::SignExtImm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x84),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
            req(ReqKind::Reg, SizeReq::S8, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x85),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x85),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x85),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x84),
        opersize: 8,
        operands: &[
            req(ReqKind::Reg, SizeReq::S8, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x85),
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x85),
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x85),
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
        ],
        ..EMPTY_FORM
    },
];

// ─── INC/DEC ───────────────────────────────────────────────
//
// Modifier data: [short_opcode_delta, spare].

const INCDEC_FORMS: &[EncodingForm] = &[
    EncodingForm {
        cpu: NOT64,
        mods: &[ModAction::AddOp0],
        opcode: op1(0x40),
        opersize: 16,
        operands: &[req(ReqKind::Reg, SizeReq::S16, Action::AddOp0)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386.or(NOT64),
        mods: &[ModAction::AddOp0],
        opcode: op1(0x40),
        opersize: 32,
        operands: &[req(ReqKind::Reg, SizeReq::S32, Action::AddOp0)],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0xFE),
        opersize: 8,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0xFF),
        opersize: 16,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0xFF),
        opersize: 32,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::Gap, ModAction::AddSpare],
        opcode: op1(0xFF),
        opersize: 64,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea)],
        ..EMPTY_FORM
    },
];

// ─── PUSH/POP ──────────────────────────────────────────────

const PUSH_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0x50),
        opersize: 16,
        def_opersize_64: 64,
        operands: &[req(ReqKind::Reg, SizeReq::S16, Action::AddOp0)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386.or(NOT64),
        opcode: op1(0x50),
        opersize: 32,
        operands: &[req(ReqKind::Reg, SizeReq::S32, Action::AddOp0)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x50),
        opersize: 64,
        def_opersize_64: 64,
        operands: &[req(ReqKind::Reg, SizeReq::S64, Action::AddOp0)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0xFF),
        opersize: 64,
        def_opersize_64: 64,
        spare: 6,
        operands: &[req_rel(ReqKind::Mem, SizeReq::S64, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0xFF),
        spare: 6,
        operands: &[req_rel(ReqKind::Mem, SizeReq::Oper, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xFF),
        opersize: 16,
        def_opersize_64: 64,
        spare: 6,
        operands: &[req(ReqKind::Mem, SizeReq::S16, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386.or(NOT64),
        opcode: op1(0xFF),
        opersize: 32,
        spare: 6,
        operands: &[req(ReqKind::Mem, SizeReq::S32, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C186,
        opcode: op1(0x6A),
        def_opersize_64: 64,
        operands: &[req(ReqKind::Imm, SizeReq::S8, Action::SignExtImm)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C186,
        opcode: op1(0x68),
        def_opersize_64: 64,
        operands: &[req_post(
            ReqKind::Imm,
            SizeReq::Oper,
            Action::Imm,
            PostAction::SignExtImm8(0x6A),
        )],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0x06),
        operands: &[req(ReqKind::SegEs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0x0E),
        operands: &[req(ReqKind::SegCs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0x16),
        operands: &[req(ReqKind::SegSs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0x1E),
        operands: &[req(ReqKind::SegDs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op2(0x0F, 0xA0),
        opcode_len: 2,
        operands: &[req(ReqKind::SegFs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op2(0x0F, 0xA8),
        opcode_len: 2,
        operands: &[req(ReqKind::SegGs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
];

const POP_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0x58),
        opersize: 16,
        def_opersize_64: 64,
        operands: &[req(ReqKind::Reg, SizeReq::S16, Action::AddOp0)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386.or(NOT64),
        opcode: op1(0x58),
        opersize: 32,
        operands: &[req(ReqKind::Reg, SizeReq::S32, Action::AddOp0)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x58),
        opersize: 64,
        def_opersize_64: 64,
        operands: &[req(ReqKind::Reg, SizeReq::S64, Action::AddOp0)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x8F),
        opersize: 64,
        def_opersize_64: 64,
        operands: &[req_rel(ReqKind::Mem, SizeReq::S64, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0x8F),
        operands: &[req_rel(ReqKind::Mem, SizeReq::Oper, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x8F),
        opersize: 16,
        def_opersize_64: 64,
        operands: &[req(ReqKind::Mem, SizeReq::S16, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386.or(NOT64),
        opcode: op1(0x8F),
        opersize: 32,
        operands: &[req(ReqKind::Mem, SizeReq::S32, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0x07),
        operands: &[req(ReqKind::SegEs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0x17),
        operands: &[req(ReqKind::SegSs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0x1F),
        operands: &[req(ReqKind::SegDs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op2(0x0F, 0xA1),
        opcode_len: 2,
        operands: &[req(ReqKind::SegFs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op2(0x0F, 0xA9),
        opcode_len: 2,
        operands: &[req(ReqKind::SegGs, SizeReq::Any, Action::None)],
        ..EMPTY_FORM
    },
];

// ─── LEA / MOVZX / MOVSX / MOVSXD / ARPL / BSWAP ───────────

const LEA_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0x8D),
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
            req_rel(ReqKind::Mem, SizeReq::Any, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x8D),
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
            req_rel(ReqKind::Mem, SizeReq::Any, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x8D),
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
            req_rel(ReqKind::Mem, SizeReq::Any, Action::Ea),
        ],
        ..EMPTY_FORM
    },
];

/// MOVZX/MOVSX share rows; the modifier byte is 0x00 or 0x08 added into
/// opcode byte 1 (0F B6/B7 vs 0F BE/BF).
const MOVSZX_FORMS: &[EncodingForm] = &[
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::AddOp1],
        opcode: op2(0x0F, 0xB6),
        opcode_len: 2,
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
            req(ReqKind::RegMem, SizeReq::S8, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::AddOp1],
        opcode: op2(0x0F, 0xB6),
        opcode_len: 2,
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
            req(ReqKind::RegMem, SizeReq::S8, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::AddOp1],
        opcode: op2(0x0F, 0xB6),
        opcode_len: 2,
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
            req(ReqKind::RegMem, SizeReq::S8, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::AddOp1],
        opcode: op2(0x0F, 0xB7),
        opcode_len: 2,
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
            req(ReqKind::RegMem, SizeReq::S16, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::AddOp1],
        opcode: op2(0x0F, 0xB7),
        opcode_len: 2,
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
            req(ReqKind::RegMem, SizeReq::S16, Action::Ea),
        ],
        ..EMPTY_FORM
    },
];

const MOVSXD_FORMS: &[EncodingForm] = &[EncodingForm {
    cpu: ONLY64,
    opcode: op1(0x63),
    opersize: 64,
    operands: &[
        req(ReqKind::Reg, SizeReq::S64, Action::Spare),
        req(ReqKind::RegMem, SizeReq::S32, Action::Ea),
    ],
    ..EMPTY_FORM
}];

const ARPL_FORMS: &[EncodingForm] = &[EncodingForm {
    cpu: C286.or(NOT64),
    opcode: op1(0x63),
    operands: &[
        req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
        req(ReqKind::Reg, SizeReq::S16, Action::Spare),
    ],
    ..EMPTY_FORM
}];

const BSWAP_FORMS: &[EncodingForm] = &[
    EncodingForm {
        cpu: C486,
        opcode: op2(0x0F, 0xC8),
        opcode_len: 2,
        opersize: 32,
        operands: &[req(ReqKind::Reg, SizeReq::S32, Action::AddOp1)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op2(0x0F, 0xC8),
        opcode_len: 2,
        opersize: 64,
        operands: &[req(ReqKind::Reg, SizeReq::S64, Action::AddOp1)],
        ..EMPTY_FORM
    },
];

// ─── XCHG ──────────────────────────────────────────────────

const XCHG_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0x90),
        opersize: 16,
        operands: &[
            req(ReqKind::Areg, SizeReq::S16, Action::None),
            req(ReqKind::Reg, SizeReq::S16, Action::AddOp0),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x90),
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::AddOp0),
            req(ReqKind::Areg, SizeReq::S16, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x90),
        opersize: 32,
        operands: &[
            req(ReqKind::Areg, SizeReq::S32, Action::None),
            req(ReqKind::Reg, SizeReq::S32, Action::AddOp0),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x90),
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::AddOp0),
            req(ReqKind::Areg, SizeReq::S32, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x90),
        opersize: 64,
        operands: &[
            req(ReqKind::Areg, SizeReq::S64, Action::None),
            req(ReqKind::Reg, SizeReq::S64, Action::AddOp0),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x90),
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::AddOp0),
            req(ReqKind::Areg, SizeReq::S64, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x86),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
            req(ReqKind::Reg, SizeReq::S8, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x86),
        opersize: 8,
        operands: &[
            req(ReqKind::Reg, SizeReq::S8, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S8, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x87),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0x87),
        opersize: 16,
        operands: &[
            req(ReqKind::Reg, SizeReq::S16, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S16, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x87),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0x87),
        opersize: 32,
        operands: &[
            req(ReqKind::Reg, SizeReq::S32, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S32, Action::Ea),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x87),
        opersize: 64,
        operands: &[
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0x87),
        opersize: 64,
        operands: &[
            req(ReqKind::Reg, SizeReq::S64, Action::Spare),
            req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea),
        ],
        ..EMPTY_FORM
    },
];

// ─── IN/OUT ────────────────────────────────────────────────

const IN_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0xE4),
        opersize: 8,
        operands: &[
            req(ReqKind::Areg, SizeReq::S8, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xE5),
        opersize: 16,
        operands: &[
            req(ReqKind::Areg, SizeReq::S16, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0xE5),
        opersize: 32,
        operands: &[
            req(ReqKind::Areg, SizeReq::S32, Action::None),
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xEC),
        opersize: 8,
        operands: &[
            req(ReqKind::Areg, SizeReq::S8, Action::None),
            req(ReqKind::Dreg, SizeReq::Any, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xED),
        opersize: 16,
        operands: &[
            req(ReqKind::Areg, SizeReq::S16, Action::None),
            req(ReqKind::Dreg, SizeReq::Any, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0xED),
        opersize: 32,
        operands: &[
            req(ReqKind::Areg, SizeReq::S32, Action::None),
            req(ReqKind::Dreg, SizeReq::Any, Action::None),
        ],
        ..EMPTY_FORM
    },
];

const OUT_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0xE6),
        opersize: 8,
        operands: &[
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
            req(ReqKind::Areg, SizeReq::S8, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xE7),
        opersize: 16,
        operands: &[
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
            req(ReqKind::Areg, SizeReq::S16, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0xE7),
        opersize: 32,
        operands: &[
            req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm),
            req(ReqKind::Areg, SizeReq::S32, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xEE),
        opersize: 8,
        operands: &[
            req(ReqKind::Dreg, SizeReq::Any, Action::None),
            req(ReqKind::Areg, SizeReq::S8, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xEF),
        opersize: 16,
        operands: &[
            req(ReqKind::Dreg, SizeReq::Any, Action::None),
            req(ReqKind::Areg, SizeReq::S16, Action::None),
        ],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386,
        opcode: op1(0xEF),
        opersize: 32,
        operands: &[
            req(ReqKind::Dreg, SizeReq::Any, Action::None),
            req(ReqKind::Areg, SizeReq::S32, Action::None),
        ],
        ..EMPTY_FORM
    },
];

const INT_FORMS: &[EncodingForm] = &[EncodingForm {
    opcode: op1(0xCD),
    operands: &[req_rel(ReqKind::Imm, SizeReq::S8, Action::Imm)],
    ..EMPTY_FORM
}];

// ─── Jumps ─────────────────────────────────────────────────

const JMP_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0xEB),
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
        opcode: op1(0xE9),
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
        opcode: op1(0xE9),
        def_opersize_64: 64,
        operands: &[req_tmod(ReqKind::Imm, SizeReq::Any, Action::JmpRel, None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0xEA),
        operands: &[req_tmod(
            ReqKind::Imm,
            SizeReq::Any,
            Action::JmpFar,
            Some(TargetMod::Far),
        )],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0xFF),
        opersize: 64,
        def_opersize_64: 64,
        spare: 4,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0xFF),
        spare: 4,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::Oper, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0xFF),
        opersize: 16,
        spare: 4,
        operands: &[req(ReqKind::RegMem, SizeReq::S16, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386.or(NOT64),
        opcode: op1(0xFF),
        opersize: 32,
        spare: 4,
        operands: &[req(ReqKind::RegMem, SizeReq::S32, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xFF),
        spare: 5,
        operands: &[req_tmod(
            ReqKind::Mem,
            SizeReq::Any,
            Action::Ea,
            Some(TargetMod::Far),
        )],
        ..EMPTY_FORM
    },
];

const CALL_FORMS: &[EncodingForm] = &[
    EncodingForm {
        opcode: op1(0xE8),
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
        opcode: op1(0xE8),
        def_opersize_64: 64,
        operands: &[req_tmod(ReqKind::Imm, SizeReq::Any, Action::JmpRel, None)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0x9A),
        operands: &[req_tmod(
            ReqKind::Imm,
            SizeReq::Any,
            Action::JmpFar,
            Some(TargetMod::Far),
        )],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: ONLY64,
        opcode: op1(0xFF),
        opersize: 64,
        def_opersize_64: 64,
        spare: 2,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::S64, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0xFF),
        spare: 2,
        operands: &[req_rel(ReqKind::RegMem, SizeReq::Oper, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: NOT64,
        opcode: op1(0xFF),
        opersize: 16,
        spare: 2,
        operands: &[req(ReqKind::RegMem, SizeReq::S16, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        cpu: C386.or(NOT64),
        opcode: op1(0xFF),
        opersize: 32,
        spare: 2,
        operands: &[req(ReqKind::RegMem, SizeReq::S32, Action::Ea)],
        ..EMPTY_FORM
    },
    EncodingForm {
        opcode: op1(0xFF),
        spare: 3,
        operands: &[req_tmod(
            ReqKind::Mem,
            SizeReq::Any,
            Action::Ea,
            Some(TargetMod::Far),
        )],
        ..EMPTY_FORM
    },
];

/// Conditional jumps.  Modifier data: [condition_code].
const JCC_FORMS: &[EncodingForm] = &[
    EncodingForm {
        mods: &[ModAction::AddOp0],
        opcode: op1(0x70),
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
        cpu: C386,
        mods: &[ModAction::AddOp1],
        opcode: op2(0x0F, 0x80),
        opcode_len: 2,
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
        mods: &[ModAction::AddOp1],
        opcode: op2(0x0F, 0x80),
        opcode_len: 2,
        def_opersize_64: 64,
        operands: &[req_tmod(ReqKind::Imm, SizeReq::Any, Action::JmpRel, None)],
        ..EMPTY_FORM
    },
];

/// JCXZ/JECXZ/JRCXZ: short-only, counter width via address size.
/// Modifier data: [address_size_bytes].
const JCXZ16_FORMS: &[EncodingForm] = &[
    EncodingForm {
        cpu: NOT64,
        mods: &[ModAction::SetAddrSize],
        opcode: op1(0xE3),
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
        cpu: NOT64,
        mods: &[ModAction::SetAddrSize],
        opcode: op1(0xE3),
        def_opersize_64: 64,
        operands: &[req_tmod(ReqKind::Imm, SizeReq::Any, Action::JmpRel, None)],
        ..EMPTY_FORM
    },
];

const JCXZ32_FORMS: &[EncodingForm] = &[
    EncodingForm {
        cpu: C386,
        mods: &[ModAction::SetAddrSize],
        opcode: op1(0xE3),
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
        cpu: C386,
        mods: &[ModAction::SetAddrSize],
        opcode: op1(0xE3),
        def_opersize_64: 64,
        operands: &[req_tmod(ReqKind::Imm, SizeReq::Any, Action::JmpRel, None)],
        ..EMPTY_FORM
    },
];

const JCXZ64_FORMS: &[EncodingForm] = &[
    EncodingForm {
        cpu: ONLY64,
        mods: &[ModAction::SetAddrSize],
        opcode: op1(0xE3),
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
        cpu: ONLY64,
        mods: &[ModAction::SetAddrSize],
        opcode: op1(0xE3),
        def_opersize_64: 64,
        operands: &[req_tmod(ReqKind::Imm, SizeReq::Any, Action::JmpRel, None)],
        ..EMPTY_FORM
    },
];

/// LOOP/LOOPE/LOOPNE: short-only.  Modifier data: [opcode_delta].
const LOOP_FORMS: &[EncodingForm] = &[
    EncodingForm {
        mods: &[ModAction::AddOp0],
        opcode: op1(0xE0),
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
        mods: &[ModAction::AddOp0],
        opcode: op1(0xE0),
        def_opersize_64: 64,
        operands: &[req_tmod(ReqKind::Imm, SizeReq::Any, Action::JmpRel, None)],
        ..EMPTY_FORM
    },
];

// ─── Mnemonic index ────────────────────────────────────────

const fn d1(b0: u8) -> [u8; 3] {
    [b0, 0, 0]
}

const fn d2(b0: u8, b1: u8) -> [u8; 3] {
    [b0, b1, 0]
}

/// Sorted mnemonic index.  Keep strictly ordered by name: lookups binary
/// search, and a test enforces sortedness.
pub const MNEMONICS: &[(&str, InsnDef)] = &[
    ("aad", InsnDef::with_data(AAX_FORMS, d2(0xD5, 0x0A))),
    ("aam", InsnDef::with_data(AAX_FORMS, d2(0xD4, 0x0A))),
    ("adc", InsnDef::with_data(ARITH_FORMS, d2(0x10, 2))),
    ("add", InsnDef::with_data(ARITH_FORMS, d2(0x00, 0))),
    ("and", InsnDef::with_data(ARITH_FORMS, d2(0x20, 4))),
    ("arpl", InsnDef::plain(ARPL_FORMS)),
    ("bswap", InsnDef::plain(BSWAP_FORMS)),
    ("call", InsnDef::plain(CALL_FORMS)),
    ("cbw", InsnDef::with_data(ONEBYTE_OPER, d2(0x98, 2))),
    ("cdq", InsnDef::with_data(ONEBYTE_OPER, d2(0x99, 4))),
    ("cdqe", InsnDef::with_data(ONEBYTE_OPER64, d2(0x98, 8))),
    ("clc", InsnDef::with_data(ONEBYTE, d1(0xF8))),
    ("cld", InsnDef::with_data(ONEBYTE, d1(0xFC))),
    ("cli", InsnDef::with_data(ONEBYTE, d1(0xFA))),
    ("cmc", InsnDef::with_data(ONEBYTE, d1(0xF5))),
    ("cmp", InsnDef::with_data(ARITH_FORMS, d2(0x38, 7))),
    ("cmpsb", InsnDef::with_data(ONEBYTE, d1(0xA6))),
    ("cmpsd", InsnDef::with_data(ONEBYTE_OPER, d2(0xA7, 4))),
    ("cmpsq", InsnDef::with_data(ONEBYTE_OPER64, d2(0xA7, 8))),
    ("cmpsw", InsnDef::with_data(ONEBYTE_OPER, d2(0xA7, 2))),
    ("cpuid", InsnDef::with_data(TWOBYTE, d2(0x0F, 0xA2))),
    ("cqo", InsnDef::with_data(ONEBYTE_OPER64, d2(0x99, 8))),
    ("cwd", InsnDef::with_data(ONEBYTE_OPER, d2(0x99, 2))),
    ("cwde", InsnDef::with_data(ONEBYTE_OPER, d2(0x98, 4))),
    ("dec", InsnDef::with_data(INCDEC_FORMS, d2(0x08, 1))),
    ("div", InsnDef::with_data(GRP3_FORMS, d1(6))),
    ("hlt", InsnDef::with_data(ONEBYTE, d1(0xF4))),
    ("idiv", InsnDef::with_data(GRP3_FORMS, d1(7))),
    ("imul", InsnDef::plain(IMUL_FORMS)),
    ("in", InsnDef::plain(IN_FORMS)),
    ("inc", InsnDef::with_data(INCDEC_FORMS, d2(0x00, 0))),
    ("int", InsnDef::plain(INT_FORMS)),
    ("int3", InsnDef::with_data(ONEBYTE, d1(0xCC))),
    ("into", InsnDef::with_data(ONEBYTE_NOT64, d1(0xCE))),
    ("ja", InsnDef::with_data(JCC_FORMS, d1(7))),
    ("jae", InsnDef::with_data(JCC_FORMS, d1(3))),
    ("jb", InsnDef::with_data(JCC_FORMS, d1(2))),
    ("jbe", InsnDef::with_data(JCC_FORMS, d1(6))),
    ("jc", InsnDef::with_data(JCC_FORMS, d1(2))),
    ("jcxz", InsnDef::with_data(JCXZ16_FORMS, d1(2))),
    ("je", InsnDef::with_data(JCC_FORMS, d1(4))),
    ("jecxz", InsnDef::with_data(JCXZ32_FORMS, d1(4))),
    ("jg", InsnDef::with_data(JCC_FORMS, d1(15))),
    ("jge", InsnDef::with_data(JCC_FORMS, d1(13))),
    ("jl", InsnDef::with_data(JCC_FORMS, d1(12))),
    ("jle", InsnDef::with_data(JCC_FORMS, d1(14))),
    ("jmp", InsnDef::plain(JMP_FORMS)),
    ("jna", InsnDef::with_data(JCC_FORMS, d1(6))),
    ("jnae", InsnDef::with_data(JCC_FORMS, d1(2))),
    ("jnb", InsnDef::with_data(JCC_FORMS, d1(3))),
    ("jnbe", InsnDef::with_data(JCC_FORMS, d1(7))),
    ("jnc", InsnDef::with_data(JCC_FORMS, d1(3))),
    ("jne", InsnDef::with_data(JCC_FORMS, d1(5))),
    ("jng", InsnDef::with_data(JCC_FORMS, d1(14))),
    ("jnge", InsnDef::with_data(JCC_FORMS, d1(12))),
    ("jnl", InsnDef::with_data(JCC_FORMS, d1(13))),
    ("jnle", InsnDef::with_data(JCC_FORMS, d1(15))),
    ("jno", InsnDef::with_data(JCC_FORMS, d1(1))),
    ("jnp", InsnDef::with_data(JCC_FORMS, d1(11))),
    ("jns", InsnDef::with_data(JCC_FORMS, d1(9))),
    ("jnz", InsnDef::with_data(JCC_FORMS, d1(5))),
    ("jo", InsnDef::with_data(JCC_FORMS, d1(0))),
    ("jp", InsnDef::with_data(JCC_FORMS, d1(10))),
    ("jpe", InsnDef::with_data(JCC_FORMS, d1(10))),
    ("jpo", InsnDef::with_data(JCC_FORMS, d1(11))),
    ("jrcxz", InsnDef::with_data(JCXZ64_FORMS, d1(8))),
    ("js", InsnDef::with_data(JCC_FORMS, d1(8))),
    ("jz", InsnDef::with_data(JCC_FORMS, d1(4))),
    ("lahf", InsnDef::with_data(ONEBYTE, d1(0x9F))),
    ("lea", InsnDef::plain(LEA_FORMS)),
    ("leave", InsnDef::with_data(ONEBYTE, d1(0xC9))),
    ("lodsb", InsnDef::with_data(ONEBYTE, d1(0xAC))),
    ("lodsd", InsnDef::with_data(ONEBYTE_OPER, d2(0xAD, 4))),
    ("lodsq", InsnDef::with_data(ONEBYTE_OPER64, d2(0xAD, 8))),
    ("lodsw", InsnDef::with_data(ONEBYTE_OPER, d2(0xAD, 2))),
    ("loop", InsnDef::with_data(LOOP_FORMS, d1(2))),
    ("loope", InsnDef::with_data(LOOP_FORMS, d1(1))),
    ("loopne", InsnDef::with_data(LOOP_FORMS, d1(0))),
    ("loopnz", InsnDef::with_data(LOOP_FORMS, d1(0))),
    ("loopz", InsnDef::with_data(LOOP_FORMS, d1(1))),
    ("mov", InsnDef::plain(MOV_FORMS)),
    ("movsb", InsnDef::with_data(ONEBYTE, d1(0xA4))),
    ("movsd", InsnDef::with_data(ONEBYTE_OPER, d2(0xA5, 4))),
    ("movsq", InsnDef::with_data(ONEBYTE_OPER64, d2(0xA5, 8))),
    ("movsw", InsnDef::with_data(ONEBYTE_OPER, d2(0xA5, 2))),
    ("movsx", InsnDef::with_data(MOVSZX_FORMS, d1(0x08))),
    ("movsxd", InsnDef::plain(MOVSXD_FORMS)),
    ("movzx", InsnDef::with_data(MOVSZX_FORMS, d1(0x00))),
    ("mul", InsnDef::with_data(GRP3_FORMS, d1(4))),
    ("neg", InsnDef::with_data(GRP3_FORMS, d1(3))),
    ("nop", InsnDef::with_data(ONEBYTE, d1(0x90))),
    ("not", InsnDef::with_data(GRP3_FORMS, d1(2))),
    ("or", InsnDef::with_data(ARITH_FORMS, d2(0x08, 1))),
    ("out", InsnDef::plain(OUT_FORMS)),
    ("pause", InsnDef::with_data(ONEBYTE_PREFIX, d2(0xF3, 0x90))),
    ("pop", InsnDef::plain(POP_FORMS)),
    ("popf", InsnDef::with_data(ONEBYTE, d1(0x9D))),
    ("push", InsnDef::plain(PUSH_FORMS)),
    ("pushf", InsnDef::with_data(ONEBYTE, d1(0x9C))),
    ("rcl", InsnDef::with_data(SHIFT_FORMS, d1(2))),
    ("rcr", InsnDef::with_data(SHIFT_FORMS, d1(3))),
    ("rdtsc", InsnDef::with_data(TWOBYTE, d2(0x0F, 0x31))),
    ("ret", InsnDef::plain(RET_FORMS)),
    ("retf", InsnDef::plain(RETF_FORMS)),
    ("retn", InsnDef::plain(RET_FORMS)),
    ("rol", InsnDef::with_data(SHIFT_FORMS, d1(0))),
    ("ror", InsnDef::with_data(SHIFT_FORMS, d1(1))),
    ("sahf", InsnDef::with_data(ONEBYTE, d1(0x9E))),
    ("sal", InsnDef::with_data(SHIFT_FORMS, d1(4))),
    ("sar", InsnDef::with_data(SHIFT_FORMS, d1(7))),
    ("sbb", InsnDef::with_data(ARITH_FORMS, d2(0x18, 3))),
    ("scasb", InsnDef::with_data(ONEBYTE, d1(0xAE))),
    ("scasd", InsnDef::with_data(ONEBYTE_OPER, d2(0xAF, 4))),
    ("scasq", InsnDef::with_data(ONEBYTE_OPER64, d2(0xAF, 8))),
    ("scasw", InsnDef::with_data(ONEBYTE_OPER, d2(0xAF, 2))),
    ("shl", InsnDef::with_data(SHIFT_FORMS, d1(4))),
    ("shr", InsnDef::with_data(SHIFT_FORMS, d1(5))),
    ("stc", InsnDef::with_data(ONEBYTE, d1(0xF9))),
    ("std", InsnDef::with_data(ONEBYTE, d1(0xFD))),
    ("sti", InsnDef::with_data(ONEBYTE, d1(0xFB))),
    ("stosb", InsnDef::with_data(ONEBYTE, d1(0xAA))),
    ("stosd", InsnDef::with_data(ONEBYTE_OPER, d2(0xAB, 4))),
    ("stosq", InsnDef::with_data(ONEBYTE_OPER64, d2(0xAB, 8))),
    ("stosw", InsnDef::with_data(ONEBYTE_OPER, d2(0xAB, 2))),
    ("sub", InsnDef::with_data(ARITH_FORMS, d2(0x28, 5))),
    ("syscall", InsnDef::with_data(TWOBYTE, d2(0x0F, 0x05))),
    ("test", InsnDef::plain(TEST_FORMS)),
    ("ud2", InsnDef::with_data(TWOBYTE, d2(0x0F, 0x0B))),
    ("xchg", InsnDef::plain(XCHG_FORMS)),
    ("xlatb", InsnDef::with_data(ONEBYTE, d1(0xD7))),
    ("xor", InsnDef::with_data(ARITH_FORMS, d2(0x30, 6))),
];

/// Look up a mnemonic (lowercase) in the sorted index.
#[must_use]
pub fn lookup(mnemonic: &str) -> Option<&'static InsnDef> {
    MNEMONICS
        .binary_search_by_key(&mnemonic, |&(name, _)| name)
        .ok()
        .map(|i| &MNEMONICS[i].1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::FormFlags;

    #[test]
    fn mnemonic_index_is_sorted() {
        for pair in MNEMONICS.windows(2) {
            assert!(
                pair[0].0 < pair[1].0,
                "index out of order: {} >= {}",
                pair[0].0,
                pair[1].0
            );
        }
    }

    #[test]
    fn lookup_finds_known_and_rejects_unknown() {
        assert!(lookup("mov").is_some());
        assert!(lookup("jmp").is_some());
        assert!(lookup("xlatb").is_some());
        assert!(lookup("frobnicate").is_none());
        assert!(lookup("MOV").is_none());
    }

    #[test]
    fn no_row_sets_both_mode_gates() {
        for (name, def) in MNEMONICS {
            for form in def.forms {
                assert!(
                    !(form.cpu.only_64() && form.cpu.not_64()),
                    "{} has a row gated both only-64 and not-64",
                    name
                );
            }
        }
    }

    #[test]
    fn at_most_one_sink_per_action_kind() {
        for (name, def) in MNEMONICS {
            for form in def.forms {
                let count = |a: Action| form.operands.iter().filter(|r| r.action == a).count();
                assert!(count(Action::Ea) <= 1, "{}: multiple EA sinks", name);
                let imms = form
                    .operands
                    .iter()
                    .filter(|r| matches!(r.action, Action::Imm | Action::SignExtImm))
                    .count();
                assert!(imms <= 1, "{}: multiple immediate sinks", name);
                assert!(count(Action::Spare) <= 1, "{}: multiple spare sinks", name);
                assert!(
                    count(Action::JmpRel) + count(Action::JmpFar) <= 1,
                    "{}: multiple jump sinks",
                    name
                );
            }
        }
    }

    #[test]
    fn forms_have_sane_opcode_lengths() {
        for (name, def) in MNEMONICS {
            for form in def.forms {
                assert!(
                    (1..=3).contains(&form.opcode_len),
                    "{}: opcode_len out of range",
                    name
                );
                assert!(form.operands.len() <= 3, "{}: too many operands", name);
            }
        }
    }

    #[test]
    fn modifier_lists_fit_the_data_queue() {
        for (name, def) in MNEMONICS {
            for form in def.forms {
                assert!(
                    form.mods.len() <= def.mod_data.len(),
                    "{}: modifier list longer than data queue",
                    name
                );
            }
        }
    }

    #[test]
    fn flags_are_unused_unless_dialect_rows_exist() {
        // The current tables carry no dialect-restricted rows; if one is
        // added, its flag combination must be self-consistent.
        for (name, def) in MNEMONICS {
            for form in def.forms {
                assert!(
                    !(form.flags.has(FormFlags::GAS_ONLY)
                        && form.flags.has(FormFlags::GAS_ILLEGAL)),
                    "{}: row both GAS-only and GAS-illegal",
                    name
                );
            }
        }
    }
}
