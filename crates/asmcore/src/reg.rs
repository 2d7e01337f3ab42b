//! x86/x86-64 register model.
//!
//! Each variant knows its own encoding number ([`Register::base_code`]) and
//! width ([`Register::size_bits`]); the extended registers (R8-R15 and
//! their sub-registers) additionally report whether they need a REX
//! extension bit.

use core::fmt;

/// An x86/x86-64 register.
///
/// Covers the general-purpose registers for 8- through 64-bit operand
/// sizes, the instruction pointer, and the segment, control, debug, and
/// test register files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Register {
    // -- 64-bit general-purpose registers --
    /// RAX — 64-bit accumulator.
    Rax,
    /// RCX — 64-bit counter.
    Rcx,
    /// RDX — 64-bit data.
    Rdx,
    /// RBX — 64-bit base.
    Rbx,
    /// RSP — 64-bit stack pointer.
    Rsp,
    /// RBP — 64-bit frame pointer.
    Rbp,
    /// RSI — 64-bit source index.
    Rsi,
    /// RDI — 64-bit destination index.
    Rdi,
    /// Extended 64-bit register (requires REX.B/REX.R).
    R8,
    /// Extended 64-bit register.
    R9,
    /// Extended 64-bit register.
    R10,
    /// Extended 64-bit register.
    R11,
    /// Extended 64-bit register.
    R12,
    /// Extended 64-bit register.
    R13,
    /// Extended 64-bit register.
    R14,
    /// Extended 64-bit register.
    R15,
    // -- 32-bit general-purpose registers --
    /// EAX — 32-bit accumulator.
    Eax,
    /// ECX — 32-bit counter.
    Ecx,
    /// EDX — 32-bit data.
    Edx,
    /// EBX — 32-bit base.
    Ebx,
    /// ESP — 32-bit stack pointer.
    Esp,
    /// EBP — 32-bit frame pointer.
    Ebp,
    /// ESI — 32-bit source index.
    Esi,
    /// EDI — 32-bit destination index.
    Edi,
    /// Low 32 bits of R8.
    R8d,
    /// Low 32 bits of R9.
    R9d,
    /// Low 32 bits of R10.
    R10d,
    /// Low 32 bits of R11.
    R11d,
    /// Low 32 bits of R12.
    R12d,
    /// Low 32 bits of R13.
    R13d,
    /// Low 32 bits of R14.
    R14d,
    /// Low 32 bits of R15.
    R15d,
    // -- 16-bit general-purpose registers --
    /// AX — 16-bit accumulator.
    Ax,
    /// CX — 16-bit counter.
    Cx,
    /// DX — 16-bit data.
    Dx,
    /// BX — 16-bit base.
    Bx,
    /// SP — 16-bit stack pointer.
    Sp,
    /// BP — 16-bit frame pointer.
    Bp,
    /// SI — 16-bit source index.
    Si,
    /// DI — 16-bit destination index.
    Di,
    /// Low 16 bits of R8.
    R8w,
    /// Low 16 bits of R9.
    R9w,
    /// Low 16 bits of R10.
    R10w,
    /// Low 16 bits of R11.
    R11w,
    /// Low 16 bits of R12.
    R12w,
    /// Low 16 bits of R13.
    R13w,
    /// Low 16 bits of R14.
    R14w,
    /// Low 16 bits of R15.
    R15w,
    // -- 8-bit general-purpose registers --
    /// AL — low byte of RAX.
    Al,
    /// CL — low byte of RCX.
    Cl,
    /// DL — low byte of RDX.
    Dl,
    /// BL — low byte of RBX.
    Bl,
    /// AH — high byte of AX (incompatible with REX).
    Ah,
    /// CH — high byte of CX (incompatible with REX).
    Ch,
    /// DH — high byte of DX (incompatible with REX).
    Dh,
    /// BH — high byte of BX (incompatible with REX).
    Bh,
    /// SPL — low byte of RSP (requires REX).
    Spl,
    /// BPL — low byte of RBP (requires REX).
    Bpl,
    /// SIL — low byte of RSI (requires REX).
    Sil,
    /// DIL — low byte of RDI (requires REX).
    Dil,
    /// Low byte of R8.
    R8b,
    /// Low byte of R9.
    R9b,
    /// Low byte of R10.
    R10b,
    /// Low byte of R11.
    R11b,
    /// Low byte of R12.
    R12b,
    /// Low byte of R13.
    R13b,
    /// Low byte of R14.
    R14b,
    /// Low byte of R15.
    R15b,
    // -- Instruction pointer --
    /// RIP — for RIP-relative addressing (64-bit mode only).
    Rip,
    // -- Segment registers --
    /// ES — extra segment.
    Es,
    /// CS — code segment.
    Cs,
    /// SS — stack segment.
    Ss,
    /// DS — data segment.
    Ds,
    /// FS.
    Fs,
    /// GS.
    Gs,
    // -- Control registers --
    /// CR0.
    Cr0,
    /// CR2.
    Cr2,
    /// CR3.
    Cr3,
    /// CR4.
    Cr4,
    /// CR8 (64-bit mode only).
    Cr8,
    // -- Debug registers --
    /// DR0.
    Dr0,
    /// DR1.
    Dr1,
    /// DR2.
    Dr2,
    /// DR3.
    Dr3,
    /// DR6.
    Dr6,
    /// DR7.
    Dr7,
    // -- Test registers (80486 and earlier) --
    /// TR3.
    Tr3,
    /// TR4.
    Tr4,
    /// TR5.
    Tr5,
    /// TR6.
    Tr6,
    /// TR7.
    Tr7,
}

/// Broad register class, used for operand-kind matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegClass {
    /// General-purpose register.
    Gp,
    /// Segment register.
    Seg,
    /// Control register.
    Ctrl,
    /// Debug register.
    Dbg,
    /// Test register.
    Test,
    /// The instruction pointer (addressing only).
    Ip,
}

impl Register {
    /// The 4-bit register number (0-15).  For ModR/M and SIB fields only
    /// the low 3 bits are encoded; bit 3 goes into a REX extension bit.
    #[must_use]
    pub fn base_code(self) -> u8 {
        use Register::*;
        match self {
            Rax | Eax | Ax | Al | Es | Cr0 | Dr0 => 0,
            Rcx | Ecx | Cx | Cl | Cs | Dr1 => 1,
            Rdx | Edx | Dx | Dl | Ss | Cr2 | Dr2 => 2,
            Rbx | Ebx | Bx | Bl | Ds | Cr3 | Dr3 | Tr3 => 3,
            Rsp | Esp | Sp | Ah | Spl | Fs | Cr4 | Tr4 => 4,
            Rbp | Ebp | Bp | Ch | Bpl | Gs | Tr5 => 5,
            Rsi | Esi | Si | Dh | Sil | Dr6 | Tr6 => 6,
            Rdi | Edi | Di | Bh | Dil | Dr7 | Tr7 => 7,
            R8 | R8d | R8w | R8b | Cr8 => 8,
            R9 | R9d | R9w | R9b => 9,
            R10 | R10d | R10w | R10b => 10,
            R11 | R11d | R11w | R11b => 11,
            R12 | R12d | R12w | R12b => 12,
            R13 | R13d | R13w | R13b => 13,
            R14 | R14d | R14w | R14b => 14,
            R15 | R15d | R15w | R15b => 15,
            Rip => 5,
        }
    }

    /// Register width in bits.  Segment registers are 16 bits; control,
    /// debug, and test registers report the mode-independent 32.
    #[must_use]
    pub fn size_bits(self) -> u16 {
        use Register::*;
        match self {
            Rax | Rcx | Rdx | Rbx | Rsp | Rbp | Rsi | Rdi | R8 | R9 | R10 | R11 | R12 | R13
            | R14 | R15 | Rip => 64,
            Eax | Ecx | Edx | Ebx | Esp | Ebp | Esi | Edi | R8d | R9d | R10d | R11d | R12d
            | R13d | R14d | R15d | Cr0 | Cr2 | Cr3 | Cr4 | Cr8 | Dr0 | Dr1 | Dr2 | Dr3 | Dr6
            | Dr7 | Tr3 | Tr4 | Tr5 | Tr6 | Tr7 => 32,
            Ax | Cx | Dx | Bx | Sp | Bp | Si | Di | R8w | R9w | R10w | R11w | R12w | R13w
            | R14w | R15w | Es | Cs | Ss | Ds | Fs | Gs => 16,
            Al | Cl | Dl | Bl | Ah | Ch | Dh | Bh | Spl | Bpl | Sil | Dil | R8b | R9b | R10b
            | R11b | R12b | R13b | R14b | R15b => 8,
        }
    }

    /// The register's broad class.
    #[must_use]
    pub fn class(self) -> RegClass {
        use Register::*;
        match self {
            Es | Cs | Ss | Ds | Fs | Gs => RegClass::Seg,
            Cr0 | Cr2 | Cr3 | Cr4 | Cr8 => RegClass::Ctrl,
            Dr0 | Dr1 | Dr2 | Dr3 | Dr6 | Dr7 => RegClass::Dbg,
            Tr3 | Tr4 | Tr5 | Tr6 | Tr7 => RegClass::Test,
            Rip => RegClass::Ip,
            _ => RegClass::Gp,
        }
    }

    /// Whether the register number is 8-15 (needs a REX extension bit).
    #[must_use]
    pub fn is_extended(self) -> bool {
        self.base_code() >= 8
    }

    /// Whether this is AH, BH, CH, or DH.  These encode as numbers 4-7
    /// without REX; with any REX prefix those numbers mean SPL/BPL/SIL/DIL
    /// instead, so high-byte registers and REX are mutually exclusive.
    #[must_use]
    pub fn is_high_byte(self) -> bool {
        matches!(self, Register::Ah | Register::Ch | Register::Dh | Register::Bh)
    }

    /// Whether this is SPL, BPL, SIL, or DIL — byte registers that only
    /// exist under a REX prefix.
    #[must_use]
    pub fn requires_rex_for_byte(self) -> bool {
        matches!(self, Register::Spl | Register::Bpl | Register::Sil | Register::Dil)
    }

    /// Whether this is the accumulator of its size (AL/AX/EAX/RAX).
    #[must_use]
    pub fn is_accumulator(self) -> bool {
        matches!(self, Register::Al | Register::Ax | Register::Eax | Register::Rax)
    }

    /// Whether this is the count register of its size (CL/CX/ECX/RCX).
    #[must_use]
    pub fn is_count(self) -> bool {
        matches!(self, Register::Cl | Register::Cx | Register::Ecx | Register::Rcx)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Debug names are the conventional spellings, just capitalized.
        let name = alloc::format!("{:?}", self).to_ascii_lowercase();
        f.write_str(&name)
    }
}
