//! Business logic services

pub mod catalog;
pub mod email;
pub mod jobs;
pub mod users;

use std::sync::Arc;

use crate::{
    config::{AuthConfig, EmailConfig, JobsConfig},
    repository::Repository,
    validation::Clock,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub users: users::UsersService,
    pub email: email::EmailService,
    pub jobs: jobs::JobQueue,
}

impl Services {
    /// Create all services with the given repository.
    ///
    /// The returned receiver feeds the job worker, see [`jobs::JobWorker`].
    pub fn new(
        repository: Repository,
        clock: Arc<dyn Clock>,
        auth_config: AuthConfig,
        email_config: EmailConfig,
        jobs_config: &JobsConfig,
    ) -> (Self, tokio::sync::mpsc::Receiver<(uuid::Uuid, jobs::Job)>) {
        // chrono caps durations at i64::MAX milliseconds
        let secs = jobs_config.report_retention_secs.min(i64::MAX as u64 / 1000) as i64;
        let retention = chrono::Duration::seconds(secs);
        let (jobs, receiver) = jobs::JobQueue::new(jobs_config.queue_capacity, retention);
        let services = Self {
            catalog: catalog::CatalogService::new(repository.clone(), clock),
            users: users::UsersService::new(repository, auth_config),
            email: email::EmailService::new(email_config),
            jobs,
        };
        (services, receiver)
    }

    /// Worker bound to this container's services
    pub fn job_worker(
        &self,
        receiver: tokio::sync::mpsc::Receiver<(uuid::Uuid, jobs::Job)>,
        notify_email: Option<String>,
    ) -> jobs::JobWorker {
        jobs::JobWorker::new(
            &self.jobs,
            receiver,
            self.catalog.clone(),
            self.users.clone(),
            self.email.clone(),
            notify_email,
        )
    }
}
