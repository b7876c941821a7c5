//! Performance benchmarks for the Leave Ledger Engine.
//!
//! This benchmark suite tracks the hot paths:
//! - Single mark: one transaction, one ledger debit, one propagation
//! - Bulk mark of a full month: one transaction, ~22 debits
//! - Full-year rebuild for one employee with daily attendance
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use leave_ledger::config::LeavePolicy;
use leave_ledger::engine::{LeaveEngine, MarkRequest};
use leave_ledger::models::{AttendanceStatus, Employee, LeaveSummary, Location, MonthKey};
use leave_ledger::store::MemoryStore;

fn fresh_engine() -> LeaveEngine {
    let store = Arc::new(MemoryStore::new());
    store.insert_location(Location {
        id: "loc_01".to_string(),
        name: "Head Office".to_string(),
    });
    store.insert_employee(Employee {
        id: "emp_001".to_string(),
        name: "Asha Rao".to_string(),
        location_id: "loc_01".to_string(),
        join_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        manual_override: false,
        leave_summary: LeaveSummary::default(),
    });
    // High allocation so sustained marking never hits the balance check.
    let policy = LeavePolicy {
        yearly_allocation: Decimal::from_str("600").unwrap(),
        ..LeavePolicy::default()
    };
    LeaveEngine::new(store, policy)
}

fn request(date: NaiveDate, status: AttendanceStatus) -> MarkRequest {
    MarkRequest {
        employee_id: "emp_001".to_string(),
        location_id: "loc_01".to_string(),
        date,
        status,
        marked_by: "admin".to_string(),
        overwrite: true,
    }
}

/// Weekday marks for one month, alternating a leave in every fifth slot.
fn month_of_requests(year: i32, month: u32) -> Vec<MarkRequest> {
    (1..=28)
        .filter_map(|day| NaiveDate::from_ymd_opt(year, month, day))
        .enumerate()
        .map(|(i, date)| {
            let status = if i % 5 == 4 {
                AttendanceStatus::Leave
            } else {
                AttendanceStatus::Present
            };
            request(date, status)
        })
        .collect()
}

fn bench_single_mark(c: &mut Criterion) {
    let engine = fresh_engine();
    let date = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();

    c.bench_function("single_mark_present", |b| {
        b.iter(|| {
            let outcome = engine
                .mark(black_box(request(date, AttendanceStatus::Present)))
                .expect("mark failed");
            black_box(outcome)
        })
    });

    c.bench_function("single_mark_leave", |b| {
        b.iter(|| {
            let outcome = engine
                .mark(black_box(request(date, AttendanceStatus::Leave)))
                .expect("mark failed");
            black_box(outcome)
        })
    });
}

fn bench_bulk_mark(c: &mut Criterion) {
    let mut group = c.benchmark_group("bulk_mark");
    for months in [1usize, 3, 6] {
        let requests: Vec<MarkRequest> = (1..=months as u32)
            .flat_map(|m| month_of_requests(2025, m))
            .collect();
        group.throughput(Throughput::Elements(requests.len() as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(months),
            &requests,
            |b, requests| {
                b.iter(|| {
                    let engine = fresh_engine();
                    let report = engine
                        .bulk_mark(black_box(requests), true, false)
                        .expect("bulk mark failed");
                    black_box(report)
                })
            },
        );
    }
    group.finish();
}

fn bench_rebuild(c: &mut Criterion) {
    // One employee with a full year of daily attendance.
    let engine = fresh_engine();
    for month in 1..=12u32 {
        engine
            .bulk_mark(&month_of_requests(2025, month), true, false)
            .expect("seed failed");
    }

    c.bench_function("rebuild_full_year", |b| {
        b.iter(|| {
            let entries = engine
                .recompute_employee(black_box("emp_001"), MonthKey::new(2025, 12))
                .expect("rebuild failed");
            black_box(entries)
        })
    });
}

criterion_group!(benches, bench_single_mark, bench_bulk_mark, bench_rebuild);
criterion_main!(benches);
