//! Construction of the store, queue and service graph.
//!
//! The server binary and the CLI build the same graph from configuration;
//! nothing here is global.

use std::sync::Arc;

use uuid::Uuid;

use lexalert_core::config::AppConfig;
use lexalert_core::error::AppError;
use lexalert_database::memory::{MemoryAlertStore, MemoryJobStore, MemoryUserDirectory};
use lexalert_database::repositories::{AlertRepository, JobRepository, UserRepository};
use lexalert_database::{AlertStore, DatabasePool, JobStore, UserDirectory};
use lexalert_worker::jobs::{
    JobCleanupHandler, ReconcileJobHandler, Reconciler, ReminderJobHandler,
};
use lexalert_worker::notifier::{Notifier, build_notifier};
use lexalert_worker::{JobExecutor, JobQueue, ReminderScheduler, RetryPolicy, WorkerRunner};

use crate::admin::JobAdminService;
use crate::alert::AlertService;

/// The three stores everything else is built on.
#[derive(Debug, Clone)]
pub struct Stores {
    /// Alert store.
    pub alerts: Arc<dyn AlertStore>,
    /// Owner contact lookup.
    pub users: Arc<dyn UserDirectory>,
    /// Durable job store.
    pub jobs: Arc<dyn JobStore>,
}

impl Stores {
    /// PostgreSQL-backed stores sharing one pool.
    pub fn postgres(db: &DatabasePool) -> Self {
        Self {
            alerts: Arc::new(AlertRepository::new(db.pool())),
            users: Arc::new(UserRepository::new(db.pool())),
            jobs: Arc::new(JobRepository::new(db.pool())),
        }
    }

    /// Fresh, empty in-memory stores.
    pub fn memory() -> Self {
        Self {
            alerts: Arc::new(MemoryAlertStore::new()),
            users: Arc::new(MemoryUserDirectory::new()),
            jobs: Arc::new(MemoryJobStore::new()),
        }
    }
}

/// Everything a LexAlert process needs, wired from one configuration.
#[derive(Debug, Clone)]
pub struct Services {
    /// Stores the graph was built on.
    pub stores: Stores,
    /// Job queue, claiming under this process's worker id.
    pub queue: Arc<JobQueue>,
    /// Reminder scheduler.
    pub scheduler: ReminderScheduler,
    /// Reminder reconciler.
    pub reconciler: Arc<Reconciler>,
    /// Handlers for every job type.
    pub executor: Arc<JobExecutor>,
    /// Alert use cases.
    pub alerts: Arc<AlertService>,
    /// Job administration use cases.
    pub job_admin: Arc<JobAdminService>,
}

impl Services {
    /// Build the graph with the notifier selected by configuration.
    pub fn from_config(config: &AppConfig, stores: Stores) -> Result<Self, AppError> {
        let notifier = build_notifier(&config.notifier)?;
        Ok(Self::build(config, stores, notifier, default_worker_id()))
    }

    /// Build the graph around an explicit notifier and worker id.
    pub fn build(
        config: &AppConfig,
        stores: Stores,
        notifier: Arc<dyn Notifier>,
        worker_id: impl Into<String>,
    ) -> Self {
        let queue = Arc::new(JobQueue::new(
            Arc::clone(&stores.jobs),
            worker_id,
            config.worker.lease(),
            RetryPolicy::from(&config.worker.retry),
        ));
        let scheduler = ReminderScheduler::new(Arc::clone(&queue), config.reminder.lead_interval());
        let batch_size = u32::try_from(config.reminder.reconcile_batch_size).unwrap_or(u32::MAX);
        let reconciler = Arc::new(Reconciler::new(
            Arc::clone(&stores.alerts),
            scheduler.clone(),
            batch_size,
        ));

        let mut executor = JobExecutor::new();
        executor.register(Arc::new(ReminderJobHandler::new(
            Arc::clone(&stores.alerts),
            Arc::clone(&stores.users),
            notifier,
            config.notifier.send_timeout(),
        )));
        executor.register(Arc::new(ReconcileJobHandler::new(Arc::clone(&reconciler))));
        executor.register(Arc::new(JobCleanupHandler::new(
            Arc::clone(&queue),
            config.reminder.job_retention_days,
        )));

        let alerts = Arc::new(AlertService::new(
            Arc::clone(&stores.alerts),
            scheduler.clone(),
        ));
        let job_admin = Arc::new(JobAdminService::new(
            Arc::clone(&queue),
            Arc::clone(&reconciler),
        ));

        Self {
            stores,
            queue,
            scheduler,
            reconciler,
            executor: Arc::new(executor),
            alerts,
            job_admin,
        }
    }

    /// A worker runner over this graph's queue and handlers.
    pub fn runner(&self, config: &AppConfig) -> WorkerRunner {
        WorkerRunner::new(
            Arc::clone(&self.queue),
            Arc::clone(&self.executor),
            config.worker.clone(),
        )
    }
}

/// `worker-<pid>-<short uuid>`, unique per process.
pub fn default_worker_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("worker-{}-{}", std::process::id(), &suffix[..8])
}
