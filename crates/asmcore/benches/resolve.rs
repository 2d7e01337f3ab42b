//! Performance benchmarks for `asmcore`.
//!
//! Measures:
//! - Single-instruction select→resolve→emit latency
//! - Jump-heavy sections (relaxation passes)
//! - Straight-line throughput
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use asmcore::ea::EffectiveAddress;
use asmcore::{lookup, Context, Expr, Mode, Operand, Register, Section};

fn ctx() -> Context {
    Context::new(Mode::Bits64)
}

fn bench_single_instruction(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_instruction");

    group.bench_function("nop", |b| {
        b.iter(|| {
            let cx = ctx();
            let mut sec = Section::new();
            sec.add_insn(lookup(black_box("nop")).unwrap(), &[], &[], &cx, 1);
            sec.emit(&cx).unwrap()
        })
    });

    group.bench_function("mov_reg_imm", |b| {
        b.iter(|| {
            let cx = ctx();
            let mut sec = Section::new();
            sec.add_insn(
                lookup("mov").unwrap(),
                &[
                    Operand::reg(Register::Rax),
                    Operand::imm_const(black_box(0x1234)),
                ],
                &[],
                &cx,
                1,
            );
            sec.emit(&cx).unwrap()
        })
    });

    group.bench_function("mov_mem_sib", |b| {
        b.iter(|| {
            let cx = ctx();
            let mut sec = Section::new();
            sec.add_insn(
                lookup("mov").unwrap(),
                &[
                    Operand::mem(EffectiveAddress::mem(Expr::Sum(vec![
                        Expr::Reg(Register::Rax),
                        Expr::Scaled(Register::Rcx, 8),
                        Expr::Const(0x10),
                    ]))),
                    Operand::reg(Register::Rdx),
                ],
                &[],
                &cx,
                1,
            );
            sec.emit(&cx).unwrap()
        })
    });

    group.finish();
}

fn bench_relaxation(c: &mut Criterion) {
    let mut group = c.benchmark_group("relaxation");

    for jumps in [16usize, 64, 256] {
        group.throughput(Throughput::Elements(jumps as u64));
        group.bench_function(format!("chain_{jumps}"), |b| {
            b.iter(|| {
                let cx = ctx();
                let mut sec = Section::new();
                let end = sec.symbol("end");
                for i in 0..jumps {
                    sec.add_insn(
                        lookup("jmp").unwrap(),
                        &[Operand::imm(Expr::Sym(end))],
                        &[],
                        &cx,
                        i as u32,
                    );
                }
                sec.add_bytes(vec![0x90; 120], 999);
                sec.label("end", 1000);
                sec.emit(&cx).unwrap()
            })
        });
    }

    group.finish();
}

fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.throughput(Throughput::Elements(1000));

    group.bench_function("straight_line_1000", |b| {
        b.iter(|| {
            let cx = ctx();
            let mut sec = Section::new();
            for i in 0..1000u32 {
                sec.add_insn(
                    lookup("add").unwrap(),
                    &[
                        Operand::reg(Register::Rbx),
                        Operand::imm_const(i64::from(i)),
                    ],
                    &[],
                    &cx,
                    i,
                );
            }
            sec.emit(&cx).unwrap()
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_single_instruction,
    bench_relaxation,
    bench_throughput
);
criterion_main!(benches);
