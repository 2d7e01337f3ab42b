//! Displacement/immediate expressions and the symbol view used to reduce
//! them.
//!
//! The selector and resolver treat expression evaluation as a service:
//! [`Expr::try_get_constant`] either reduces an expression to a constant
//! (possibly through the distance between two locations) or reports that
//! it is still symbolic.  Register terms only appear inside effective
//! addresses and are pulled out by [`Expr::take_reg_terms`] before the
//! residue is evaluated.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
#[allow(unused_imports)]
use alloc::format;
use alloc::rc::Rc;
#[allow(unused_imports)]
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use crate::reg::Register;

/// Interned symbol handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SymbolId(pub u32);

impl SymbolId {
    /// Placeholder for a not-yet-assigned symbol (jump origins receive
    /// their real symbol when the bytecode joins a stream).
    pub const UNSET: SymbolId = SymbolId(u32::MAX);
}

/// A displacement or immediate expression.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    /// Integer constant.
    Const(i64),
    /// Reference to a symbol (label).
    Sym(SymbolId),
    /// A register term (only meaningful inside an effective address).
    Reg(Register),
    /// A register scaled by a small constant.
    Scaled(Register, u32),
    /// Negation.
    Neg(Box<Expr>),
    /// Sum of terms.
    Sum(Vec<Expr>),
    /// A far-pointer `segment:offset` pair.
    SegOff {
        /// Segment part.
        seg: Box<Expr>,
        /// Offset part.
        off: Box<Expr>,
    },
}

impl Expr {
    /// `a + b`.
    #[must_use]
    pub fn add(a: Expr, b: Expr) -> Expr {
        Expr::Sum(vec![a, b])
    }

    /// `a - b`.
    #[must_use]
    pub fn sub(a: Expr, b: Expr) -> Expr {
        Expr::Sum(vec![a, Expr::Neg(Box::new(b))])
    }

    /// A `segment:offset` far pointer.
    #[must_use]
    pub fn seg_off(seg: Expr, off: Expr) -> Expr {
        Expr::SegOff {
            seg: Box::new(seg),
            off: Box::new(off),
        }
    }

    /// Flatten sums, fold constants, and merge repeated register terms.
    ///
    /// The result contains at most one `Const` term, and each register at
    /// most once (as `Reg` for scale 1, `Scaled` otherwise).  A sum that
    /// collapses to a single term is unwrapped.
    #[must_use]
    pub fn simplify(self) -> Expr {
        match self {
            Expr::SegOff { seg, off } => Expr::SegOff {
                seg: Box::new(seg.simplify()),
                off: Box::new(off.simplify()),
            },
            other => {
                let mut konst: i64 = 0;
                let mut regs: Vec<(Register, i64)> = Vec::new();
                let mut rest: Vec<Expr> = Vec::new();
                collect_terms(other, 1, &mut konst, &mut regs, &mut rest);

                let mut terms: Vec<Expr> = Vec::new();
                for (r, scale) in regs {
                    match scale {
                        0 => {}
                        1 => terms.push(Expr::Reg(r)),
                        s if s > 1 => terms.push(Expr::Scaled(r, s as u32)),
                        // A negative register multiple cannot be encoded;
                        // keep it visible so the EA check can reject it.
                        s => terms.push(Expr::Neg(Box::new(Expr::Scaled(r, (-s) as u32)))),
                    }
                }
                terms.extend(rest);
                if konst != 0 || terms.is_empty() {
                    terms.push(Expr::Const(konst));
                }
                if terms.len() == 1 {
                    terms.pop().unwrap()
                } else {
                    Expr::Sum(terms)
                }
            }
        }
    }

    /// Try to reduce the expression to a constant.
    ///
    /// Symbol references reduce through [`ExprEnv::symbol_value`]; an
    /// expression containing register terms or an unknown symbol returns
    /// `None`.
    #[must_use]
    pub fn try_get_constant(&self, env: &dyn ExprEnv) -> Option<i64> {
        match self {
            Expr::Const(v) => Some(*v),
            Expr::Sym(id) => env.symbol_value(*id),
            Expr::Reg(_) | Expr::Scaled(..) | Expr::SegOff { .. } => None,
            Expr::Neg(e) => e.try_get_constant(env).map(i64::wrapping_neg),
            Expr::Sum(terms) => {
                let mut acc: i64 = 0;
                for t in terms {
                    acc = acc.wrapping_add(t.try_get_constant(env)?);
                }
                Some(acc)
            }
        }
    }

    /// Whether any symbol reference occurs in the expression.
    #[must_use]
    pub fn has_symbols(&self) -> bool {
        match self {
            Expr::Sym(_) => true,
            Expr::Const(_) | Expr::Reg(_) | Expr::Scaled(..) => false,
            Expr::Neg(e) => e.has_symbols(),
            Expr::Sum(terms) => terms.iter().any(Expr::has_symbols),
            Expr::SegOff { seg, off } => seg.has_symbols() || off.has_symbols(),
        }
    }

    /// Whether any register term occurs in the expression.
    #[must_use]
    pub fn has_registers(&self) -> bool {
        match self {
            Expr::Reg(_) | Expr::Scaled(..) => true,
            Expr::Const(_) | Expr::Sym(_) => false,
            Expr::Neg(e) => e.has_registers(),
            Expr::Sum(terms) => terms.iter().any(Expr::has_registers),
            Expr::SegOff { seg, off } => seg.has_registers() || off.has_registers(),
        }
    }

    /// Split a far-pointer expression into `(offset, Some(segment))`, or
    /// return the expression unchanged with `None`.
    #[must_use]
    pub fn extract_segment(self) -> (Expr, Option<Expr>) {
        match self {
            Expr::SegOff { seg, off } => (*off, Some(*seg)),
            other => (other, None),
        }
    }

    /// Pull register terms out of the (simplified) expression.
    ///
    /// Returns the register multiples and the register-free residue.
    /// Negated register terms are returned with a negative scale so the
    /// caller can reject them.
    #[must_use]
    pub fn take_reg_terms(self) -> (Vec<(Register, i64)>, Expr) {
        let mut konst: i64 = 0;
        let mut regs: Vec<(Register, i64)> = Vec::new();
        let mut rest: Vec<Expr> = Vec::new();
        collect_terms(self, 1, &mut konst, &mut regs, &mut rest);

        if konst != 0 || rest.is_empty() {
            rest.push(Expr::Const(konst));
        }
        let residue = if rest.len() == 1 {
            rest.pop().unwrap()
        } else {
            Expr::Sum(rest)
        };
        (regs, residue)
    }

    /// Decompose into a single symbol plus constant addend, if the
    /// expression has that shape.
    #[must_use]
    pub fn symbol_addend(&self) -> Option<(SymbolId, i64)> {
        match self {
            Expr::Sym(id) => Some((*id, 0)),
            Expr::Sum(terms) => {
                let mut sym: Option<SymbolId> = None;
                let mut addend: i64 = 0;
                for t in terms {
                    match t {
                        Expr::Sym(id) if sym.is_none() => sym = Some(*id),
                        Expr::Const(c) => addend = addend.wrapping_add(*c),
                        _ => return None,
                    }
                }
                sym.map(|s| (s, addend))
            }
            _ => None,
        }
    }
}

/// Accumulate `e * sign` into constant / register / other-term buckets.
fn collect_terms(
    e: Expr,
    sign: i64,
    konst: &mut i64,
    regs: &mut Vec<(Register, i64)>,
    rest: &mut Vec<Expr>,
) {
    match e {
        Expr::Const(v) => *konst = konst.wrapping_add(v.wrapping_mul(sign)),
        Expr::Reg(r) => add_reg(regs, r, sign),
        Expr::Scaled(r, s) => add_reg(regs, r, (s as i64).wrapping_mul(sign)),
        Expr::Neg(inner) => collect_terms(*inner, -sign, konst, regs, rest),
        Expr::Sum(terms) => {
            for t in terms {
                collect_terms(t, sign, konst, regs, rest);
            }
        }
        sym @ Expr::Sym(_) => {
            if sign == 1 {
                rest.push(sym);
            } else {
                rest.push(Expr::Neg(Box::new(sym)));
            }
        }
        so @ Expr::SegOff { .. } => rest.push(so),
    }
}

fn add_reg(regs: &mut Vec<(Register, i64)>, r: Register, scale: i64) {
    for entry in regs.iter_mut() {
        if entry.0 == r {
            entry.1 += scale;
            return;
        }
    }
    regs.push((r, scale));
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Const(v) => write!(f, "{}", v),
            Expr::Sym(id) => write!(f, "sym#{}", id.0),
            Expr::Reg(r) => write!(f, "{}", r),
            Expr::Scaled(r, s) => write!(f, "{}*{}", r, s),
            Expr::Neg(e) => write!(f, "-({})", e),
            Expr::Sum(terms) => {
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        write!(f, "+")?;
                    }
                    write!(f, "{}", t)?;
                }
                Ok(())
            }
            Expr::SegOff { seg, off } => write!(f, "{}:{}", seg, off),
        }
    }
}

// ─── Symbols ───────────────────────────────────────────────

/// Where a symbol is bound within a bytecode stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymLoc {
    /// The start of the bytecode at this index.
    Start(usize),
    /// The end of the bytecode at this index (jump origins).
    End(usize),
}

#[derive(Debug, Clone)]
struct SymbolEntry {
    name: Rc<str>,
    loc: Option<SymLoc>,
}

/// Interning symbol table.
///
/// Symbols may be referenced before definition (forward jumps); an
/// undefined symbol simply has no location and never reduces to a value.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    syms: Vec<SymbolEntry>,
    by_name: BTreeMap<Rc<str>, SymbolId>,
}

impl SymbolTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern `name`, creating an undefined symbol if it is new.
    pub fn intern(&mut self, name: &str) -> SymbolId {
        if let Some(id) = self.by_name.get(name) {
            return *id;
        }
        let rc: Rc<str> = Rc::from(name);
        let id = SymbolId(self.syms.len() as u32);
        self.syms.push(SymbolEntry {
            name: Rc::clone(&rc),
            loc: None,
        });
        self.by_name.insert(rc, id);
        id
    }

    /// Create a fresh internal symbol (jump origins and the like).  The
    /// generated name is not addressable through [`SymbolTable::intern`].
    pub fn fresh(&mut self, loc: SymLoc) -> SymbolId {
        let id = SymbolId(self.syms.len() as u32);
        let name: Rc<str> = Rc::from(format!(".L{}", id.0).as_str());
        self.syms.push(SymbolEntry {
            name,
            loc: Some(loc),
        });
        id
    }

    /// Bind `id` to a location.
    pub fn define(&mut self, id: SymbolId, loc: SymLoc) {
        if let Some(entry) = self.syms.get_mut(id.0 as usize) {
            entry.loc = Some(loc);
        }
    }

    /// The symbol's name.
    #[must_use]
    pub fn name(&self, id: SymbolId) -> Option<Rc<str>> {
        self.syms.get(id.0 as usize).map(|e| Rc::clone(&e.name))
    }

    /// The symbol's bound location, if defined.
    #[must_use]
    pub fn loc(&self, id: SymbolId) -> Option<SymLoc> {
        self.syms.get(id.0 as usize).and_then(|e| e.loc)
    }

    /// Whether the symbol has been defined.
    #[must_use]
    pub fn is_defined(&self, id: SymbolId) -> bool {
        self.loc(id).is_some()
    }

    /// Number of interned symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.syms.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.syms.is_empty()
    }
}

/// Read-only view the expression code uses to reduce symbols.
///
/// During resolution the driver exposes the provisional per-pass offsets;
/// during emission the converged ones.  Symbols the view cannot value
/// (externals, not-yet-laid-out labels) return `None` and stay symbolic.
pub trait ExprEnv {
    /// Current value of a symbol, or `None` if unknown.
    fn symbol_value(&self, id: SymbolId) -> Option<i64>;

    /// Name of a symbol, for relocations and diagnostics.
    fn symbol_name(&self, id: SymbolId) -> Option<Rc<str>>;

    /// Distance between two locations, `a - b`, when both are known.
    fn distance(&self, a: SymbolId, b: SymbolId) -> Option<i64> {
        Some(self.symbol_value(a)? - self.symbol_value(b)?)
    }
}

/// An [`ExprEnv`] with no known symbols.  Used where an expression is
/// required to be free of symbol references.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEnv;

impl ExprEnv for EmptyEnv {
    fn symbol_value(&self, _id: SymbolId) -> Option<i64> {
        None
    }

    fn symbol_name(&self, _id: SymbolId) -> Option<Rc<str>> {
        None
    }
}
