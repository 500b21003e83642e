//! Performance benchmarks for salary structure resolution.
//!
//! Covers the hot path of a preview batch: dependency ordering and full
//! per-employee resolution, at growing structure sizes.
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use payroll_engine::calculation::{dependency_order, resolve_pay};
use payroll_engine::config::{PfRule, StatutoryRuleSet};
use payroll_engine::models::{
    Component, ComponentKind, EmployeeProfile, EmployeeStatus, PeriodAttendance, SalaryStructure,
    ValueType,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Builds a structure with a BASIC root and `extra` components, each a
/// percentage of the previous one, forming a dependency chain.
fn chained_structure(extra: usize) -> SalaryStructure {
    let mut components = vec![Component {
        code: "BASIC".to_string(),
        label: "Basic Salary".to_string(),
        kind: ComponentKind::Earning,
        value: ValueType::PercentageOf {
            reference: "CTC".to_string(),
            percent: dec("40"),
        },
        taxable: true,
        prorated: true,
        sequence: 1,
    }];

    for i in 0..extra {
        let previous = if i == 0 {
            "BASIC".to_string()
        } else {
            format!("C{}", i - 1)
        };
        components.push(Component {
            code: format!("C{}", i),
            label: format!("Component {}", i),
            kind: ComponentKind::Earning,
            value: ValueType::Formula {
                expression: format!("min({}, 50000) * 0.5", previous),
            },
            taxable: true,
            prorated: true,
            sequence: (i + 2) as u32,
        });
    }

    SalaryStructure {
        code: "BENCH".to_string(),
        version: 1,
        is_active: true,
        components,
    }
}

fn profile() -> EmployeeProfile {
    EmployeeProfile {
        id: "emp_bench_001".to_string(),
        display_name: "Bench Employee".to_string(),
        annual_ctc: dec("600000"),
        structure_code: Some("BENCH".to_string()),
        join_date: NaiveDate::from_ymd_opt(2022, 6, 1).unwrap(),
        status: EmployeeStatus::Active,
        esi_exempt: false,
    }
}

fn attendance() -> PeriodAttendance {
    PeriodAttendance {
        present_days: dec("22"),
        paid_leave_days: dec("0"),
        total_working_days: dec("22"),
    }
}

fn rules() -> StatutoryRuleSet {
    StatutoryRuleSet {
        version: "v2024_04".to_string(),
        name: "FY 2024-25".to_string(),
        effective_from: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        pf: Some(PfRule {
            employee_percent: dec("12"),
            employer_percent: dec("12"),
            wage_ceiling: dec("15000"),
        }),
        esi: None,
        pt: None,
    }
}

fn bench_dependency_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("dependency_order");
    for size in [3usize, 10, 50] {
        let structure = chained_structure(size);
        group.throughput(Throughput::Elements(structure.components.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &structure,
            |b, structure| b.iter(|| dependency_order(black_box(structure)).unwrap()),
        );
    }
    group.finish();
}

fn bench_resolve_pay(c: &mut Criterion) {
    let profile = profile();
    let attendance = attendance();
    let rules = rules();

    let mut group = c.benchmark_group("resolve_pay");
    for size in [3usize, 10, 50] {
        let structure = chained_structure(size);
        group.throughput(Throughput::Elements(structure.components.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(size),
            &structure,
            |b, structure| {
                b.iter(|| {
                    resolve_pay(
                        black_box(structure),
                        black_box(&profile),
                        black_box(&attendance),
                        black_box(&rules),
                    )
                    .unwrap()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_dependency_order, bench_resolve_pay);
criterion_main!(benches);
