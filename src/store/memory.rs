//! In-memory transactional document store with optimistic concurrency.
//!
//! The store keeps five collections (employees, locations, ledger entries,
//! attendance records, correction requests), each record carrying a version
//! counter. A [`Transaction`] records the version of everything it reads
//! (absent reads record version 0) and buffers its writes; `commit`
//! re-validates the whole read set under the store lock and applies all
//! buffered writes atomically, or fails with [`LedgerError::Conflict`]
//! without applying anything.
//!
//! Scans (month queries, slot lookups) are validated through per-employee
//! generation counters: any committed write to an employee's attendance or
//! ledger set bumps that employee's generation, so a scan conflicts with
//! concurrent writes for the same employee but never with writes for a
//! different employee.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AttendanceRecord, CorrectionRequest, Employee, LedgerEntry, Location, MonthKey,
};

#[derive(Debug, Clone)]
struct Versioned<T> {
    version: u64,
    value: T,
}

#[derive(Debug, Default)]
struct StoreInner {
    employees: HashMap<String, Versioned<Employee>>,
    locations: HashMap<String, Versioned<Location>>,
    ledger: HashMap<String, Versioned<LedgerEntry>>,
    attendance: HashMap<String, Versioned<AttendanceRecord>>,
    corrections: HashMap<String, Versioned<CorrectionRequest>>,
    /// Bumped on every committed attendance write for the employee.
    attendance_gen: HashMap<String, u64>,
    /// Bumped on every committed ledger write for the employee.
    ledger_gen: HashMap<String, u64>,
}

/// What a transaction read, and at which version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ReadKey {
    Employee(String),
    Location(String),
    Ledger(String),
    Attendance(String),
    Correction(String),
    AttendanceGen(String),
    LedgerGen(String),
}

impl ReadKey {
    fn describe(&self) -> String {
        match self {
            ReadKey::Employee(id) => format!("employee '{id}'"),
            ReadKey::Location(id) => format!("location '{id}'"),
            ReadKey::Ledger(id) => format!("ledger entry '{id}'"),
            ReadKey::Attendance(id) => format!("attendance record '{id}'"),
            ReadKey::Correction(id) => format!("correction request '{id}'"),
            ReadKey::AttendanceGen(id) => format!("attendance set of employee '{id}'"),
            ReadKey::LedgerGen(id) => format!("ledger set of employee '{id}'"),
        }
    }
}

/// A durable, transactional in-memory store.
///
/// Cheap to share behind an `Arc`; all state lives behind one mutex, but
/// transactions hold the lock only for individual reads and for the final
/// commit validation, never across the whole unit of work.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<StoreInner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        // A poisoned lock only means another thread panicked mid-read;
        // the data itself is still consistent (writes are commit-atomic).
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Begins a new transaction.
    pub fn begin(&self) -> Transaction<'_> {
        Transaction {
            store: self,
            reads: HashMap::new(),
            employees: HashMap::new(),
            ledger: HashMap::new(),
            attendance: HashMap::new(),
            corrections: HashMap::new(),
        }
    }

    /// Inserts an employee directly, outside any transaction. Intended for
    /// seeding; replaces any existing employee with the same id.
    pub fn insert_employee(&self, employee: Employee) {
        let mut inner = self.lock();
        let version = inner.employees.get(&employee.id).map_or(0, |v| v.version) + 1;
        inner.employees.insert(
            employee.id.clone(),
            Versioned {
                version,
                value: employee,
            },
        );
    }

    /// Inserts a location directly, outside any transaction.
    pub fn insert_location(&self, location: Location) {
        let mut inner = self.lock();
        let version = inner.locations.get(&location.id).map_or(0, |v| v.version) + 1;
        inner.locations.insert(
            location.id.clone(),
            Versioned {
                version,
                value: location,
            },
        );
    }

    /// Inserts a ledger entry directly, outside any transaction. Intended
    /// for seeding test fixtures (including duplicate logical keys for
    /// corrector repair tests).
    pub fn insert_ledger_entry(&self, entry: LedgerEntry) {
        let mut inner = self.lock();
        *inner
            .ledger_gen
            .entry(entry.employee_id.clone())
            .or_insert(0) += 1;
        let version = inner.ledger.get(&entry.id).map_or(0, |v| v.version) + 1;
        inner.ledger.insert(
            entry.id.clone(),
            Versioned {
                version,
                value: entry,
            },
        );
    }

    /// Reads an employee outside any transaction.
    pub fn employee(&self, id: &str) -> Option<Employee> {
        self.lock().employees.get(id).map(|v| v.value.clone())
    }

    /// Reads an attendance record outside any transaction.
    pub fn attendance_record(&self, id: &str) -> Option<AttendanceRecord> {
        self.lock().attendance.get(id).map(|v| v.value.clone())
    }

    /// Reads a correction request outside any transaction.
    pub fn correction_request(&self, id: &str) -> Option<CorrectionRequest> {
        self.lock().corrections.get(id).map(|v| v.value.clone())
    }

    /// Reads the ledger entry for an employee-month outside any transaction.
    pub fn ledger_entry(&self, employee_id: &str, key: MonthKey) -> Option<LedgerEntry> {
        self.lock()
            .ledger
            .values()
            .filter(|v| {
                v.value.employee_id == employee_id
                    && v.value.year == key.year
                    && v.value.month == key.month
            })
            .map(|v| v.value.clone())
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    /// All ledger entries for an employee, chronologically, outside any
    /// transaction.
    pub fn ledger_entries(&self, employee_id: &str) -> Vec<LedgerEntry> {
        let mut entries: Vec<_> = self
            .lock()
            .ledger
            .values()
            .filter(|v| v.value.employee_id == employee_id)
            .map(|v| v.value.clone())
            .collect();
        entries.sort_by(|a, b| (a.year, a.month, a.id.clone()).cmp(&(b.year, b.month, b.id.clone())));
        entries
    }
}

/// One atomic unit of work against a [`MemoryStore`].
///
/// Reads see the transaction's own buffered writes. Nothing is visible to
/// other transactions until `commit` succeeds; an abandoned transaction
/// leaves zero partial writes.
#[derive(Debug)]
pub struct Transaction<'a> {
    store: &'a MemoryStore,
    reads: HashMap<ReadKey, u64>,
    /// Buffered writes, keyed by id. `None` in the ledger map is a delete.
    employees: HashMap<String, Employee>,
    ledger: HashMap<String, Option<LedgerEntry>>,
    attendance: HashMap<String, AttendanceRecord>,
    corrections: HashMap<String, CorrectionRequest>,
}

impl<'a> Transaction<'a> {
    fn record_read(&mut self, key: ReadKey, version: u64) {
        // First read wins; re-reads must not mask an earlier observation.
        self.reads.entry(key).or_insert(version);
    }

    /// Reads an employee.
    pub fn employee(&mut self, id: &str) -> Option<Employee> {
        if let Some(pending) = self.employees.get(id) {
            return Some(pending.clone());
        }
        let inner = self.store.lock();
        let found = inner.employees.get(id);
        let version = found.map_or(0, |v| v.version);
        let value = found.map(|v| v.value.clone());
        drop(inner);
        self.record_read(ReadKey::Employee(id.to_string()), version);
        value
    }

    /// Buffers an employee write.
    pub fn put_employee(&mut self, employee: Employee) {
        self.employees.insert(employee.id.clone(), employee);
    }

    /// Returns true if the location exists.
    pub fn location_exists(&mut self, id: &str) -> bool {
        let inner = self.store.lock();
        let found = inner.locations.get(id);
        let version = found.map_or(0, |v| v.version);
        drop(inner);
        self.record_read(ReadKey::Location(id.to_string()), version);
        version != 0
    }

    /// Reads an attendance record by id.
    pub fn attendance(&mut self, id: &str) -> Option<AttendanceRecord> {
        if let Some(pending) = self.attendance.get(id) {
            return Some(pending.clone());
        }
        let inner = self.store.lock();
        let found = inner.attendance.get(id);
        let version = found.map_or(0, |v| v.version);
        let value = found.map(|v| v.value.clone());
        drop(inner);
        self.record_read(ReadKey::Attendance(id.to_string()), version);
        value
    }

    /// Buffers an attendance write (create, edit, or soft delete).
    pub fn put_attendance(&mut self, record: AttendanceRecord) {
        self.attendance.insert(record.id.clone(), record);
    }

    fn read_attendance_gen(&mut self, employee_id: &str) {
        let inner = self.store.lock();
        let generation = inner
            .attendance_gen
            .get(employee_id)
            .copied()
            .unwrap_or(0);
        drop(inner);
        self.record_read(ReadKey::AttendanceGen(employee_id.to_string()), generation);
    }

    /// All active (non-deleted) attendance records for an employee within a
    /// calendar month, merged with this transaction's buffered writes.
    pub fn active_attendance_in_month(
        &mut self,
        employee_id: &str,
        key: MonthKey,
    ) -> Vec<AttendanceRecord> {
        self.read_attendance_gen(employee_id);
        let inner = self.store.lock();
        let mut by_id: HashMap<String, AttendanceRecord> = inner
            .attendance
            .values()
            .filter(|v| v.value.employee_id == employee_id)
            .map(|v| (v.value.id.clone(), v.value.clone()))
            .collect();
        drop(inner);
        for (id, pending) in &self.attendance {
            if pending.employee_id == employee_id {
                by_id.insert(id.clone(), pending.clone());
            }
        }
        use chrono::Datelike;
        let mut records: Vec<_> = by_id
            .into_values()
            .filter(|r| {
                r.is_active() && r.date.year() == key.year && r.date.month() == key.month
            })
            .collect();
        records.sort_by(|a, b| (a.date, a.id.clone()).cmp(&(b.date, b.id.clone())));
        records
    }

    /// The active record occupying an (employee, location, day) slot, if any.
    pub fn find_active_slot(
        &mut self,
        employee_id: &str,
        location_id: &str,
        date: chrono::NaiveDate,
    ) -> Option<AttendanceRecord> {
        self.read_attendance_gen(employee_id);
        let inner = self.store.lock();
        let mut by_id: HashMap<String, AttendanceRecord> = inner
            .attendance
            .values()
            .filter(|v| v.value.employee_id == employee_id)
            .map(|v| (v.value.id.clone(), v.value.clone()))
            .collect();
        drop(inner);
        for (id, pending) in &self.attendance {
            if pending.employee_id == employee_id {
                by_id.insert(id.clone(), pending.clone());
            }
        }
        by_id
            .into_values()
            .filter(|r| r.is_active() && r.location_id == location_id && r.date == date)
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    fn read_ledger_gen(&mut self, employee_id: &str) {
        let inner = self.store.lock();
        let generation = inner.ledger_gen.get(employee_id).copied().unwrap_or(0);
        drop(inner);
        self.record_read(ReadKey::LedgerGen(employee_id.to_string()), generation);
    }

    fn merged_ledger_entries(&mut self, employee_id: &str) -> Vec<LedgerEntry> {
        self.read_ledger_gen(employee_id);
        let inner = self.store.lock();
        let mut by_id: HashMap<String, Option<LedgerEntry>> = inner
            .ledger
            .values()
            .filter(|v| v.value.employee_id == employee_id)
            .map(|v| (v.value.id.clone(), Some(v.value.clone())))
            .collect();
        drop(inner);
        for (id, pending) in &self.ledger {
            let belongs = pending
                .as_ref()
                .map_or(true, |e| e.employee_id == employee_id);
            if belongs {
                by_id.insert(id.clone(), pending.clone());
            }
        }
        let mut entries: Vec<_> = by_id.into_values().flatten().collect();
        entries.sort_by(|a, b| (a.year, a.month, a.id.clone()).cmp(&(b.year, b.month, b.id.clone())));
        entries
    }

    /// All ledger entries for an employee, chronologically. Duplicate
    /// logical keys are returned as-is; the corrector repairs them.
    pub fn ledger_entries_for(&mut self, employee_id: &str) -> Vec<LedgerEntry> {
        self.merged_ledger_entries(employee_id)
    }

    /// The ledger entry for an employee-month, if one exists. With
    /// duplicate logical keys, the chronologically first entry wins.
    pub fn find_ledger_entry(&mut self, employee_id: &str, key: MonthKey) -> Option<LedgerEntry> {
        self.merged_ledger_entries(employee_id)
            .into_iter()
            .find(|e| e.year == key.year && e.month == key.month)
    }

    /// Buffers a ledger entry write.
    pub fn put_ledger_entry(&mut self, entry: LedgerEntry) {
        self.ledger.insert(entry.id.clone(), Some(entry));
    }

    /// Buffers a ledger entry delete. Only the corrector uses this, to
    /// repair duplicate logical keys.
    pub fn delete_ledger_entry(&mut self, id: &str) {
        self.ledger.insert(id.to_string(), None);
    }

    /// Reads a correction request by id.
    pub fn correction(&mut self, id: &str) -> Option<CorrectionRequest> {
        if let Some(pending) = self.corrections.get(id) {
            return Some(pending.clone());
        }
        let inner = self.store.lock();
        let found = inner.corrections.get(id);
        let version = found.map_or(0, |v| v.version);
        let value = found.map(|v| v.value.clone());
        drop(inner);
        self.record_read(ReadKey::Correction(id.to_string()), version);
        value
    }

    /// Buffers a correction request write.
    pub fn put_correction(&mut self, request: CorrectionRequest) {
        self.corrections.insert(request.id.clone(), request);
    }

    /// Validates the read set and applies all buffered writes atomically.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Conflict`] if any record or scan this
    /// transaction read was committed to by another transaction in the
    /// meantime. Nothing is applied in that case.
    pub fn commit(self) -> LedgerResult<()> {
        let mut inner = self.store.lock();

        for (key, seen) in &self.reads {
            let current = match key {
                ReadKey::Employee(id) => inner.employees.get(id).map_or(0, |v| v.version),
                ReadKey::Location(id) => inner.locations.get(id).map_or(0, |v| v.version),
                ReadKey::Ledger(id) => inner.ledger.get(id).map_or(0, |v| v.version),
                ReadKey::Attendance(id) => inner.attendance.get(id).map_or(0, |v| v.version),
                ReadKey::Correction(id) => inner.corrections.get(id).map_or(0, |v| v.version),
                ReadKey::AttendanceGen(id) => {
                    inner.attendance_gen.get(id).copied().unwrap_or(0)
                }
                ReadKey::LedgerGen(id) => inner.ledger_gen.get(id).copied().unwrap_or(0),
            };
            if current != *seen {
                return Err(LedgerError::Conflict {
                    message: format!("{} changed during the transaction", key.describe()),
                });
            }
        }

        // Read set is clean; apply everything.
        for (id, employee) in self.employees {
            let version = inner.employees.get(&id).map_or(0, |v| v.version) + 1;
            inner.employees.insert(
                id,
                Versioned {
                    version,
                    value: employee,
                },
            );
        }
        for (id, pending) in self.ledger {
            match pending {
                Some(entry) => {
                    *inner
                        .ledger_gen
                        .entry(entry.employee_id.clone())
                        .or_insert(0) += 1;
                    let version = inner.ledger.get(&id).map_or(0, |v| v.version) + 1;
                    inner.ledger.insert(
                        id,
                        Versioned {
                            version,
                            value: entry,
                        },
                    );
                }
                None => {
                    if let Some(removed) = inner.ledger.remove(&id) {
                        *inner
                            .ledger_gen
                            .entry(removed.value.employee_id.clone())
                            .or_insert(0) += 1;
                    }
                }
            }
        }
        for (id, record) in self.attendance {
            *inner
                .attendance_gen
                .entry(record.employee_id.clone())
                .or_insert(0) += 1;
            let version = inner.attendance.get(&id).map_or(0, |v| v.version) + 1;
            inner.attendance.insert(
                id,
                Versioned {
                    version,
                    value: record,
                },
            );
        }
        for (id, request) in self.corrections {
            let version = inner.corrections.get(&id).map_or(0, |v| v.version) + 1;
            inner.corrections.insert(
                id,
                Versioned {
                    version,
                    value: request,
                },
            );
        }

        Ok(())
    }
}
