//! Batch Processing

use crate::decision::{DecisionRecord, FailedDecision, Stage};
use crate::pipeline::DecisionWorkflow;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info};
use transaction::{Transaction, TIME_FIELD};

const HOURS_PER_DAY: usize = 24;
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Run every transaction through the workflow on at most `workers` blocking
/// threads. Records come back in input order.
pub async fn run_batch(
    workflow: Arc<DecisionWorkflow>,
    transactions: Vec<Transaction>,
    workers: usize,
) -> Vec<DecisionRecord> {
    let start = Instant::now();
    let total = transactions.len();
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));

    let mut handles = Vec::with_capacity(total);
    for transaction in transactions {
        // Acquire permit (limits concurrent runs)
        let permit = semaphore.clone().acquire_owned().await.ok();
        let workflow = workflow.clone();
        let fallback = transaction.clone();

        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            workflow.run(transaction)
        });
        handles.push((handle, fallback));
    }

    let mut records = Vec::with_capacity(total);
    for (handle, fallback) in handles {
        match handle.await {
            Ok(record) => records.push(record),
            Err(e) => {
                error!(error = %e, "Decision task aborted");
                records.push(aborted_record(fallback, &e));
            }
        }
    }

    info!(
        total,
        failed = records.iter().filter(|r| r.errored()).count(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Batch complete"
    );
    records
}

/// Failed record for a run whose task died before returning a record
fn aborted_record(transaction: Transaction, error: &dyn std::fmt::Display) -> DecisionRecord {
    DecisionRecord::Failed(FailedDecision::new(
        transaction,
        Stage::Unknown,
        format!("decision task aborted: {}", error),
        None,
        None,
    ))
}

/// Attempts and flagged decisions in one hour of the day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HourlyBucket {
    pub hour: usize,
    pub transactions: usize,
    pub flagged: usize,
}

/// Aggregate view over a batch of decision records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    /// Completed with a fraud verdict
    pub flagged: usize,
    /// Completed with a legitimate verdict
    pub cleared: usize,
    pub failed: usize,
    pub borderline: usize,
    pub total_amount: f64,
    pub flagged_amount: f64,
    /// 24 buckets, hour 0 first
    pub hourly: Vec<HourlyBucket>,
}

impl BatchSummary {
    pub fn from_records(records: &[DecisionRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            flagged: 0,
            cleared: 0,
            failed: 0,
            borderline: 0,
            total_amount: 0.0,
            flagged_amount: 0.0,
            hourly: (0..HOURS_PER_DAY)
                .map(|hour| HourlyBucket {
                    hour,
                    ..Default::default()
                })
                .collect(),
        };

        for (index, record) in records.iter().enumerate() {
            let transaction = record.transaction();
            let amount = transaction.amount().filter(|a| a.is_finite()).unwrap_or(0.0);
            summary.total_amount += amount;

            if record.is_borderline() {
                summary.borderline += 1;
            }

            let bucket = &mut summary.hourly[hour_of(transaction, index)];
            bucket.transactions += 1;

            match record.final_verdict() {
                Some(true) => {
                    summary.flagged += 1;
                    summary.flagged_amount += amount;
                    bucket.flagged += 1;
                }
                Some(false) => summary.cleared += 1,
                None => summary.failed += 1,
            }
        }

        summary
    }

    /// Share of completed decisions flagged as fraud
    pub fn fraud_rate(&self) -> f64 {
        let completed = self.flagged + self.cleared;
        if completed == 0 {
            0.0
        } else {
            self.flagged as f64 / completed as f64
        }
    }
}

/// Hour of day from the `Time` offset in seconds, else the record position
fn hour_of(transaction: &Transaction, index: usize) -> usize {
    match transaction.get(TIME_FIELD).filter(|t| t.is_finite()) {
        Some(seconds) => {
            let hours = (seconds / SECONDS_PER_HOUR).floor() as i64;
            hours.rem_euclid(HOURS_PER_DAY as i64) as usize
        }
        None => index % HOURS_PER_DAY,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{workflow_with, V1Probability};
    use explanation::ScriptedModel;

    fn shared_workflow(model: Arc<ScriptedModel>) -> Arc<DecisionWorkflow> {
        Arc::new(workflow_with(Box::new(V1Probability), model))
    }

    #[tokio::test]
    async fn test_aborted_task_has_unknown_stage() {
        let join_error = tokio::task::spawn_blocking(|| panic!("scorer crashed"))
            .await
            .unwrap_err();
        let transaction = Transaction::from_fields([("Amount", 5.0)]).with_id("tx-9");

        let record = aborted_record(transaction, &join_error);

        let DecisionRecord::Failed(failed) = &record else {
            panic!("expected failed record, got {:?}", record);
        };
        assert_eq!(failed.stage, Stage::Unknown);
        assert!(failed.reason.starts_with("decision task aborted"));
        assert_eq!(failed.transaction.id(), Some("tx-9"));
        assert_eq!(record.final_verdict(), None);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["stage"], "unknown");
    }

    #[tokio::test]
    async fn test_run_batch_preserves_order() {
        let workflow = shared_workflow(Arc::new(ScriptedModel::new()));
        let transactions: Vec<Transaction> = (0..40)
            .map(|i| {
                let v1 = if i % 2 == 0 { 0.9 } else { 0.1 };
                Transaction::from_fields([("Amount", i as f64), ("V1", v1)])
                    .with_id(format!("tx-{}", i))
            })
            .collect();

        let records = run_batch(workflow, transactions, 4).await;

        assert_eq!(records.len(), 40);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.transaction().id(), Some(format!("tx-{}", i).as_str()));
            assert_eq!(record.final_verdict(), Some(i % 2 == 0));
        }
    }

    #[tokio::test]
    async fn test_run_batch_zero_workers_still_runs() {
        let workflow = shared_workflow(Arc::new(ScriptedModel::new()));
        let records = run_batch(
            workflow,
            vec![Transaction::from_fields([("Amount", 1.0), ("V1", 0.95)])],
            0,
        )
        .await;
        assert_eq!(records[0].final_verdict(), Some(true));
    }

    #[tokio::test]
    async fn test_summary_counts() {
        let model = Arc::new(ScriptedModel::with_default_reply("Final Verdict: LEGITIMATE"));
        let workflow = shared_workflow(model);
        let transactions = vec![
            // flagged at 01:00
            Transaction::from_fields([("Amount", 100.0), ("V1", 0.9), ("Time", 3600.0)]),
            // cleared at 01:00
            Transaction::from_fields([("Amount", 10.0), ("V1", 0.1), ("Time", 7000.0)]),
            // borderline, cleared by the model, 00:00 next day
            Transaction::from_fields([("Amount", 5.0), ("V1", 0.5), ("Time", 86_400.0)]),
            // missing amount, position 3
            Transaction::from_fields([("V1", 0.9)]),
        ];

        let records = run_batch(workflow, transactions, 2).await;
        let summary = BatchSummary::from_records(&records);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.flagged, 1);
        assert_eq!(summary.cleared, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.borderline, 1);
        assert!((summary.total_amount - 115.0).abs() < 1e-9);
        assert!((summary.flagged_amount - 100.0).abs() < 1e-9);
        assert_eq!(summary.hourly.len(), 24);
        assert_eq!(summary.hourly[1].transactions, 2);
        assert_eq!(summary.hourly[1].flagged, 1);
        assert_eq!(summary.hourly[0].transactions, 1);
        assert_eq!(summary.hourly[3].transactions, 1);
        assert!((summary.fraud_rate() - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_records(&[]);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.fraud_rate(), 0.0);
        assert!(summary.hourly.iter().all(|b| b.transactions == 0));
    }
}
