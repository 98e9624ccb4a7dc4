//! Optional schema bootstrap.
//!
//! Creates the query indexes and, on request, seeds an empty board with a
//! handful of sample tasks. The store never relies on any of this for
//! correctness: the table itself is created by
//! [`SqliteTaskStore::ensure_schema`], and every query works without indexes.

use chrono::Utc;
use tracing::info;

use crate::domain::{NewTask, Task, TaskPriority, TaskStatus, TaskTitle};
use crate::store::{SqliteTaskStore, StoreError, TaskStore};

const INDEXES: [&str; 3] = [
    "CREATE INDEX IF NOT EXISTS idx_tasks_created_at ON tasks (created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_status ON tasks (status)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_priority ON tasks (priority)",
];

const SAMPLE_TASKS: [(&str, &str, TaskStatus, TaskPriority); 4] = [
    (
        "Setup AWS Infrastructure",
        "Configure VPC, subnets, and security groups using Terraform",
        TaskStatus::InProgress,
        TaskPriority::High,
    ),
    (
        "Deploy Kubernetes Cluster",
        "Use kubeadm to bootstrap K8s cluster on EC2 instances",
        TaskStatus::Todo,
        TaskPriority::High,
    ),
    (
        "Configure CI/CD Pipeline",
        "Setup GitHub Actions for automated deployments",
        TaskStatus::Todo,
        TaskPriority::Medium,
    ),
    (
        "Setup Monitoring Stack",
        "Deploy Prometheus and Grafana for observability",
        TaskStatus::Todo,
        TaskPriority::Medium,
    ),
];

/// Outcome of a bootstrap run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BootstrapReport {
    /// Indexes ensured.
    pub indexes: usize,
    /// Sample tasks inserted.
    pub seeded: usize,
}

/// Ensures the table and indexes exist, then seeds sample tasks when `seed`
/// is set and the table is empty. Safe to run on every startup.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub async fn bootstrap(store: &SqliteTaskStore, seed: bool) -> Result<BootstrapReport, StoreError> {
    store.ensure_schema().await?;

    for statement in INDEXES {
        sqlx::query(statement).execute(store.pool()).await?;
    }

    let mut report = BootstrapReport {
        indexes: INDEXES.len(),
        seeded: 0,
    };

    if seed && store.count_tasks().await? == 0 {
        let now = Utc::now();
        for draft in sample_tasks() {
            store.insert_task(&Task::create(draft, now)).await?;
            report.seeded += 1;
        }
    }

    info!(
        indexes = report.indexes,
        seeded = report.seeded,
        "Database bootstrap complete"
    );
    Ok(report)
}

fn sample_tasks() -> impl Iterator<Item = NewTask> {
    SAMPLE_TASKS
        .into_iter()
        .filter_map(|(title, description, status, priority)| {
            TaskTitle::parse(title).ok().map(|title| NewTask {
                title,
                description: Some(description.to_owned()),
                status,
                priority,
            })
        })
}
