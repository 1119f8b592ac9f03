//! Pay-run lifecycle management.
//!
//! [`PayRunManager`] owns the in-memory run store and the payslip book and
//! enforces the single-writer discipline: every lifecycle change is a
//! compare-and-swap on the run's status under the store lock. Calculation
//! fans employee lines out over blocking worker tasks against an immutable
//! snapshot of the salary structure, so a long batch never holds the store
//! lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{OrderCache, StructureSnapshot, compute_employee_line, compute_totals};
use crate::config::StatutoryConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceReport, EmployeeProfile, PayPeriod, PayRun, PayRunAction, PayRunEmployeeLine,
    PayRunStatus, Payslip,
};

/// Owns all pay runs and issued payslips for one organization.
pub struct PayRunManager {
    runs: RwLock<HashMap<Uuid, PayRun>>,
    payslips: RwLock<HashMap<Uuid, Vec<Payslip>>>,
    next_number: AtomicU64,
}

impl PayRunManager {
    /// Creates an empty manager. Numbering starts at `PR-0001`.
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
            payslips: RwLock::new(HashMap::new()),
            next_number: AtomicU64::new(1),
        }
    }

    /// Creates a draft run over a snapshot of the employee set.
    pub async fn create(&self, pay_period: PayPeriod, employees: Vec<EmployeeProfile>) -> PayRun {
        let seq = self.next_number.fetch_add(1, Ordering::SeqCst);
        let run = PayRun::new(format!("PR-{seq:04}"), pay_period, employees);
        info!(pay_run_id = %run.id, pay_run_number = %run.pay_run_number, "pay run created");
        self.runs.write().await.insert(run.id, run.clone());
        run
    }

    /// Fetches a run by id.
    pub async fn get(&self, id: Uuid) -> EngineResult<PayRun> {
        self.runs
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(EngineError::PayRunNotFound { id })
    }

    /// Calculates (or recalculates) every employee line of a run.
    ///
    /// The run moves to Calculating while worker tasks compute lines
    /// concurrently, then lands in PendingApproval with all previous lines
    /// destructively replaced. A per-employee failure becomes a flagged
    /// line; it never aborts the batch.
    pub async fn calculate(
        &self,
        id: Uuid,
        attendance: AttendanceReport,
        snapshot: StructureSnapshot,
        statutory: StatutoryConfig,
    ) -> EngineResult<PayRun> {
        let (period, employees) = {
            let mut runs = self.runs.write().await;
            let run = runs.get_mut(&id).ok_or(EngineError::PayRunNotFound { id })?;
            apply_action(run, PayRunAction::Calculate)?;
            (run.pay_period, run.employees.clone())
        };

        let snapshot = Arc::new(snapshot);
        let statutory = Arc::new(statutory);
        let attendance = Arc::new(attendance);
        let cache = Arc::new(OrderCache::new());

        let mut handles = Vec::with_capacity(employees.len());
        for employee in employees {
            let employee_id = employee.id.clone();
            let snapshot = Arc::clone(&snapshot);
            let statutory = Arc::clone(&statutory);
            let attendance = Arc::clone(&attendance);
            let cache = Arc::clone(&cache);
            let handle = tokio::task::spawn_blocking(move || {
                let line = compute_employee_line(
                    &employee,
                    &period,
                    &snapshot,
                    &attendance,
                    &statutory,
                    &cache,
                );
                match line {
                    Ok(line) => line,
                    Err(e) => {
                        warn!(employee_id = %employee.id, error = %e, "employee line flagged");
                        PayRunEmployeeLine::flagged(employee.id, e.to_string())
                    }
                }
            });
            handles.push((employee_id, handle));
        }

        // A worker failure (including a panic) flags that employee's line;
        // it must never abort the batch and leave the run in Calculating.
        let mut lines = Vec::with_capacity(handles.len());
        for (employee_id, handle) in handles {
            let line = match handle.await {
                Ok(line) => line,
                Err(e) => {
                    warn!(employee_id = %employee_id, error = %e, "calculation worker failed");
                    PayRunEmployeeLine::flagged(
                        employee_id,
                        format!("calculation worker failed: {e}"),
                    )
                }
            };
            lines.push(line);
        }
        let totals = compute_totals(&lines);

        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&id).ok_or(EngineError::PayRunNotFound { id })?;
        if run.status != PayRunStatus::Calculating {
            return Err(EngineError::ConcurrencyConflict {
                expected: PayRunStatus::Calculating.to_string(),
                actual: run.status.to_string(),
            });
        }
        run.lines = lines;
        run.totals = totals;
        run.calculated_at = Some(Utc::now());
        run.status = PayRunStatus::PendingApproval;
        info!(
            pay_run_id = %run.id,
            employees = run.totals.employee_count,
            flagged = run.flagged_line_count(),
            "pay run calculated"
        );
        Ok(run.clone())
    }

    /// Approves a run pending approval.
    ///
    /// # Errors
    ///
    /// `ApprovalBlocked` while any line is flagged; the caller must fix
    /// the structure and recalculate first.
    pub async fn approve(&self, id: Uuid) -> EngineResult<PayRun> {
        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&id).ok_or(EngineError::PayRunNotFound { id })?;
        let flagged = run.flagged_line_count();
        if flagged > 0 && run.status == PayRunStatus::PendingApproval {
            return Err(EngineError::ApprovalBlocked { count: flagged });
        }
        apply_action(run, PayRunAction::Approve)?;
        run.approved_at = Some(Utc::now());
        info!(pay_run_id = %run.id, "pay run approved");
        Ok(run.clone())
    }

    /// Manually completes an approved run without issuing payslips.
    pub async fn complete(&self, id: Uuid) -> EngineResult<PayRun> {
        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&id).ok_or(EngineError::PayRunNotFound { id })?;
        apply_action(run, PayRunAction::Complete)?;
        run.completed_at = Some(Utc::now());
        info!(pay_run_id = %run.id, "pay run completed");
        Ok(run.clone())
    }

    /// Cancels a run that has not been approved yet.
    ///
    /// Calculated lines are retained on the cancelled run for audit.
    pub async fn cancel(&self, id: Uuid) -> EngineResult<PayRun> {
        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&id).ok_or(EngineError::PayRunNotFound { id })?;
        apply_action(run, PayRunAction::Cancel)?;
        run.cancelled_at = Some(Utc::now());
        info!(pay_run_id = %run.id, "pay run cancelled");
        Ok(run.clone())
    }

    /// Issues one payslip per non-flagged line and completes the run.
    ///
    /// From Approved this drives Approved → Processing → Completed. From
    /// Completed it re-issues: the existing slips for the run are replaced,
    /// never duplicated.
    pub async fn generate_payslips(&self, id: Uuid) -> EngineResult<Vec<Payslip>> {
        let run = {
            let mut runs = self.runs.write().await;
            let run = runs.get_mut(&id).ok_or(EngineError::PayRunNotFound { id })?;
            apply_action(run, PayRunAction::GeneratePayslips)?;
            run.clone()
        };

        let issued_at = Utc::now();
        let slips: Vec<Payslip> = run
            .lines
            .iter()
            .filter(|l| !l.is_flagged())
            .map(|line| Payslip {
                id: Uuid::new_v4(),
                pay_run_id: run.id,
                employee_id: line.employee_id.clone(),
                line: line.clone(),
                net_salary: line.net_salary,
                issued_at,
                email_sent: false,
            })
            .collect();
        self.payslips.write().await.insert(run.id, slips.clone());

        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&id).ok_or(EngineError::PayRunNotFound { id })?;
        if run.status != PayRunStatus::Processing {
            return Err(EngineError::ConcurrencyConflict {
                expected: PayRunStatus::Processing.to_string(),
                actual: run.status.to_string(),
            });
        }
        run.status = PayRunStatus::Completed;
        if run.completed_at.is_none() {
            run.completed_at = Some(Utc::now());
        }
        info!(pay_run_id = %run.id, payslips = slips.len(), "payslips issued");
        Ok(slips)
    }

    /// The payslips issued for a run, if any.
    pub async fn payslips(&self, id: Uuid) -> EngineResult<Vec<Payslip>> {
        if !self.runs.read().await.contains_key(&id) {
            return Err(EngineError::PayRunNotFound { id });
        }
        Ok(self
            .payslips
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    /// Deletes a run. Only Draft, Cancelled, and Completed runs may be
    /// deleted; the run's payslips go with it.
    pub async fn delete(&self, id: Uuid) -> EngineResult<()> {
        let mut runs = self.runs.write().await;
        let run = runs.get_mut(&id).ok_or(EngineError::PayRunNotFound { id })?;
        apply_action(run, PayRunAction::Delete)?;
        runs.remove(&id);
        self.payslips.write().await.remove(&id);
        info!(pay_run_id = %id, "pay run deleted");
        Ok(())
    }
}

impl Default for PayRunManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare-and-swap on the run status under the store lock.
fn apply_action(run: &mut PayRun, action: PayRunAction) -> EngineResult<()> {
    match run.status.next(action) {
        Some(next) => {
            run.status = next;
            Ok(())
        }
        None => Err(EngineError::IllegalState {
            action: action.to_string(),
            status: run.status.to_string(),
        }),
    }
}
