//! Background jobs: bulk random data generation and mass mailing.
//!
//! Submissions go through a bounded channel to a single worker task. Each job
//! keeps a report that can be polled by id. Failures on individual items are
//! logged and counted as skipped; the job itself only fails when it cannot
//! run at all.

use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use rand::{distributions::Alphanumeric, rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::{
    sync::{mpsc, RwLock},
    task::JoinHandle,
};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{catalog::CatalogService, email::EmailService, users::UsersService};
use crate::{
    error::{AppError, AppResult},
    models::{author::AuthorPayload, genre::GenrePayload, language::LanguagePayload, user::CreateUser},
    validation::DateInput,
};

const MAX_BATCH: u32 = 1000;
const PASSWORD_LENGTH: usize = 15;

/// A unit of background work
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum Job {
    CreateRandomUsers { total: u32 },
    CreateRandomGenres { total: u32 },
    CreateRandomLanguages { total: u32 },
    CreateRandomAuthor,
    EmailAllUsers { subject: String, body: String },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::CreateRandomUsers { .. } => "create_random_users",
            Job::CreateRandomGenres { .. } => "create_random_genres",
            Job::CreateRandomLanguages { .. } => "create_random_languages",
            Job::CreateRandomAuthor => "create_random_author",
            Job::EmailAllUsers { .. } => "email_all_users",
        }
    }

    fn validate(&self) -> AppResult<()> {
        match self {
            Job::CreateRandomUsers { total }
            | Job::CreateRandomGenres { total }
            | Job::CreateRandomLanguages { total } => {
                if *total == 0 || *total > MAX_BATCH {
                    return Err(AppError::Validation(format!(
                        "total must be between 1 and {}",
                        MAX_BATCH
                    )));
                }
            }
            Job::EmailAllUsers { subject, .. } if subject.trim().is_empty() => {
                return Err(AppError::Validation("subject must not be empty".to_string()));
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

/// Progress and outcome of a submitted job
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct JobReport {
    pub id: Uuid,
    pub job: String,
    pub status: JobStatus,
    pub created: usize,
    pub skipped: usize,
    pub message: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

type Reports = Arc<RwLock<HashMap<Uuid, JobReport>>>;

/// Submission side of the queue, shared with the API
#[derive(Clone)]
pub struct JobQueue {
    sender: mpsc::Sender<(Uuid, Job)>,
    reports: Reports,
    retention: Duration,
}

impl JobQueue {
    /// Returns the queue and the receiver to hand to [`JobWorker::new`].
    /// Finished reports are dropped once older than `retention`.
    pub fn new(capacity: usize, retention: Duration) -> (Self, mpsc::Receiver<(Uuid, Job)>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let queue = Self {
            sender,
            reports: Arc::new(RwLock::new(HashMap::new())),
            retention,
        };
        (queue, receiver)
    }

    pub async fn submit(&self, job: Job) -> AppResult<JobReport> {
        job.validate()?;

        let id = Uuid::new_v4();
        let report = JobReport {
            id,
            job: job.name().to_string(),
            status: JobStatus::Queued,
            created: 0,
            skipped: 0,
            message: None,
            submitted_at: Utc::now(),
            finished_at: None,
        };
        {
            let mut reports = self.reports.write().await;
            prune_finished(&mut reports, report.submitted_at, self.retention);
            reports.insert(id, report.clone());
        }

        if let Err(e) = self.sender.try_send((id, job)) {
            self.reports.write().await.remove(&id);
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => {
                    AppError::Unavailable("Job queue is full, retry later".to_string())
                }
                mpsc::error::TrySendError::Closed(_) => {
                    AppError::Internal("Job worker is not running".to_string())
                }
            });
        }

        tracing::info!("Queued job {} ({})", report.job, id);
        Ok(report)
    }

    pub async fn report(&self, id: Uuid) -> AppResult<JobReport> {
        self.reports
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Job {} not found", id)))
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Outcome {
    created: usize,
    skipped: usize,
    message: Option<String>,
}

/// Consumes the queue one job at a time
pub struct JobWorker {
    receiver: mpsc::Receiver<(Uuid, Job)>,
    reports: Reports,
    retention: Duration,
    catalog: CatalogService,
    users: UsersService,
    email: EmailService,
    notify_email: Option<String>,
}

impl JobWorker {
    pub fn new(
        queue: &JobQueue,
        receiver: mpsc::Receiver<(Uuid, Job)>,
        catalog: CatalogService,
        users: UsersService,
        email: EmailService,
        notify_email: Option<String>,
    ) -> Self {
        Self {
            receiver,
            reports: queue.reports.clone(),
            retention: queue.retention,
            catalog,
            users,
            email,
            notify_email,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        tracing::info!("Job worker started");
        while let Some((id, job)) = self.receiver.recv().await {
            self.update(id, |r| r.status = JobStatus::Running).await;
            tracing::info!("Running job {} ({})", job.name(), id);

            let result = self.execute(&job).await;
            self.update(id, |r| {
                r.finished_at = Some(Utc::now());
                match result {
                    Ok(outcome) => {
                        r.status = JobStatus::Succeeded;
                        r.created = outcome.created;
                        r.skipped = outcome.skipped;
                        r.message = outcome.message;
                    }
                    Err(e) => {
                        tracing::error!("Job {} failed: {}", id, e);
                        r.status = JobStatus::Failed;
                        r.message = Some(e.to_string());
                    }
                }
            })
            .await;
            prune_finished(&mut *self.reports.write().await, Utc::now(), self.retention);
        }
        tracing::info!("Job worker stopped");
    }

    async fn update(&self, id: Uuid, f: impl FnOnce(&mut JobReport)) {
        if let Some(report) = self.reports.write().await.get_mut(&id) {
            f(report);
        }
    }

    async fn execute(&self, job: &Job) -> AppResult<Outcome> {
        let mut rng = StdRng::from_entropy();
        match job {
            Job::CreateRandomUsers { total } => self.create_random_users(&mut rng, *total).await,
            Job::CreateRandomGenres { total } => {
                let outcome = self.create_random_genres(&mut rng, *total).await?;
                self.notify(job, &outcome).await;
                Ok(outcome)
            }
            Job::CreateRandomLanguages { total } => {
                let outcome = self.create_random_languages(&mut rng, *total).await?;
                self.notify(job, &outcome).await;
                Ok(outcome)
            }
            Job::CreateRandomAuthor => {
                let outcome = self.create_random_author(&mut rng).await?;
                if outcome.created > 0 {
                    self.notify(job, &outcome).await;
                }
                Ok(outcome)
            }
            Job::EmailAllUsers { subject, body } => self.email_all_users(subject, body).await,
        }
    }

    async fn create_random_users(&self, rng: &mut StdRng, total: u32) -> AppResult<Outcome> {
        let mut outcome = Outcome::default();
        for _ in 0..total {
            let username = format!("user_{}", random_word(rng));
            let data = CreateUser {
                email: Some(format!("{}@example.com", username)),
                password: random_password(rng),
                username,
                is_staff: false,
                groups: vec![],
            };
            match self.users.create_user(data).await {
                Ok(_) => outcome.created += 1,
                Err(e) => {
                    tracing::warn!("Skipping random user: {}", e);
                    outcome.skipped += 1;
                }
            }
        }
        Ok(outcome)
    }

    async fn create_random_genres(&self, rng: &mut StdRng, total: u32) -> AppResult<Outcome> {
        let mut outcome = Outcome::default();
        for _ in 0..total {
            let name = capitalize(&random_word(rng));
            if name_taken("genre", &name, self.catalog.genre_name_exists(&name).await) {
                outcome.skipped += 1;
                continue;
            }
            match self.catalog.create_genre(GenrePayload { name, image: None }).await {
                Ok(_) => outcome.created += 1,
                Err(e) => {
                    tracing::warn!("Skipping random genre: {}", e);
                    outcome.skipped += 1;
                }
            }
        }
        Ok(outcome)
    }

    async fn create_random_languages(&self, rng: &mut StdRng, total: u32) -> AppResult<Outcome> {
        let mut outcome = Outcome::default();
        for _ in 0..total {
            let name = capitalize(&random_word(rng));
            if name_taken("language", &name, self.catalog.language_name_exists(&name).await) {
                outcome.skipped += 1;
                continue;
            }
            match self.catalog.create_language(LanguagePayload { name }).await {
                Ok(_) => outcome.created += 1,
                Err(e) => {
                    tracing::warn!("Skipping random language: {}", e);
                    outcome.skipped += 1;
                }
            }
        }
        Ok(outcome)
    }

    async fn create_random_author(&self, rng: &mut StdRng) -> AppResult<Outcome> {
        let data = AuthorPayload {
            first_name: capitalize(&random_word(rng)),
            last_name: capitalize(&random_word(rng)),
            date_of_birth: DateInput::Absent,
            date_of_death: DateInput::Absent,
            image: None,
            about_the_author: None,
        };
        match self.catalog.create_author(data).await {
            Ok(author) => Ok(Outcome {
                created: 1,
                skipped: 0,
                message: Some(format!("Created author {}", author.display_name())),
            }),
            Err(AppError::Rules(violations)) => {
                tracing::warn!("Random author rejected: {}", violations);
                Ok(Outcome {
                    created: 0,
                    skipped: 1,
                    message: Some(violations.to_string()),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn email_all_users(&self, subject: &str, body: &str) -> AppResult<Outcome> {
        let mut outcome = Outcome::default();
        for (username, address) in self.users.mail_recipients().await? {
            match self.email.send_notification(&address, subject, body).await {
                Ok(()) => outcome.created += 1,
                Err(e) => {
                    tracing::warn!("Could not mail {}: {}", username, e);
                    outcome.skipped += 1;
                }
            }
        }
        outcome.message = Some(format!("Sent {} messages", outcome.created));
        Ok(outcome)
    }

    /// Summary mail; a delivery failure does not fail the job
    async fn notify(&self, job: &Job, outcome: &Outcome) {
        let Some(to) = &self.notify_email else {
            return;
        };
        if let Err(e) = self
            .email
            .send_job_summary(to, job.name(), outcome.created, outcome.skipped)
            .await
        {
            tracing::warn!("Could not send {} summary: {}", job.name(), e);
        }
    }
}

/// Drops reports of jobs that finished more than `retention` before `now`
fn prune_finished(reports: &mut HashMap<Uuid, JobReport>, now: DateTime<Utc>, retention: Duration) {
    reports.retain(|_, r| match r.finished_at {
        Some(finished) => now - finished <= retention,
        None => true,
    });
}

/// A failed lookup counts as taken so the item is skipped, not the job
fn name_taken(kind: &str, name: &str, lookup: AppResult<bool>) -> bool {
    match lookup {
        Ok(taken) => taken,
        Err(e) => {
            tracing::warn!("Skipping random {} {}: {}", kind, name, e);
            true
        }
    }
}

fn random_word(rng: &mut impl Rng) -> String {
    let len = rng.gen_range(5..=10);
    (0..len)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}

fn random_password(rng: &mut impl Rng) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_random_values() {
        let mut rng = StdRng::seed_from_u64(7);
        let word = random_word(&mut rng);
        assert!((5..=10).contains(&word.len()));
        assert!(word.chars().all(|c| c.is_ascii_lowercase()));

        let password = random_password(&mut rng);
        assert_eq!(password.len(), PASSWORD_LENGTH);
        assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));

        assert_eq!(capitalize("poetry"), "Poetry");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_job_wire_format() {
        let job: Job = serde_json::from_str(r#"{"job": "create_random_genres", "total": 5}"#).unwrap();
        assert_matches!(job, Job::CreateRandomGenres { total: 5 });

        let job: Job = serde_json::from_str(r#"{"job": "create_random_author"}"#).unwrap();
        assert_eq!(job.name(), "create_random_author");
    }

    #[test]
    fn test_job_bounds() {
        assert!(Job::CreateRandomUsers { total: 0 }.validate().is_err());
        assert!(Job::CreateRandomUsers { total: MAX_BATCH + 1 }.validate().is_err());
        assert!(Job::CreateRandomLanguages { total: 10 }.validate().is_ok());
        let blank = Job::EmailAllUsers {
            subject: " ".to_string(),
            body: String::new(),
        };
        assert!(blank.validate().is_err());
    }

    #[tokio::test]
    async fn test_submit_records_queued_report() {
        let (queue, mut receiver) = JobQueue::new(4, Duration::hours(1));
        let report = queue.submit(Job::CreateRandomAuthor).await.unwrap();
        assert_eq!(report.status, JobStatus::Queued);
        assert_eq!(queue.report(report.id).await.unwrap().job, "create_random_author");

        let (id, job) = receiver.recv().await.unwrap();
        assert_eq!(id, report.id);
        assert_matches!(job, Job::CreateRandomAuthor);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_and_forgets_job() {
        let (queue, _receiver) = JobQueue::new(1, Duration::hours(1));
        queue.submit(Job::CreateRandomAuthor).await.unwrap();
        let err = queue.submit(Job::CreateRandomAuthor).await.unwrap_err();
        assert_matches!(err, AppError::Unavailable(_));
        assert_eq!(queue.reports.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_report() {
        let (queue, _receiver) = JobQueue::new(1, Duration::hours(1));
        assert_matches!(queue.report(Uuid::new_v4()).await, Err(AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_closed_queue() {
        let (queue, receiver) = JobQueue::new(1, Duration::hours(1));
        drop(receiver);
        assert_matches!(
            queue.submit(Job::CreateRandomAuthor).await,
            Err(AppError::Internal(_))
        );
    }

    #[test]
    fn test_failed_name_lookup_skips_item() {
        assert!(!name_taken("genre", "Poetry", Ok(false)));
        assert!(name_taken("genre", "Poetry", Ok(true)));
        let lookup = Err(AppError::Internal("connection reset".to_string()));
        assert!(name_taken("language", "Klingon", lookup));
    }

    fn report_finished(finished_at: Option<DateTime<Utc>>, status: JobStatus) -> JobReport {
        JobReport {
            id: Uuid::new_v4(),
            job: "create_random_author".to_string(),
            status,
            created: 0,
            skipped: 0,
            message: None,
            submitted_at: Utc::now() - Duration::hours(3),
            finished_at,
        }
    }

    #[test]
    fn test_prune_finished_reports() {
        let now = Utc::now();
        let old = report_finished(Some(now - Duration::hours(2)), JobStatus::Succeeded);
        let recent = report_finished(Some(now - Duration::minutes(5)), JobStatus::Failed);
        let queued = report_finished(None, JobStatus::Queued);
        let running = report_finished(None, JobStatus::Running);
        let mut reports: HashMap<Uuid, JobReport> = [&old, &recent, &queued, &running]
            .into_iter()
            .map(|r| (r.id, r.clone()))
            .collect();

        prune_finished(&mut reports, now, Duration::hours(1));

        assert!(!reports.contains_key(&old.id));
        for kept in [&recent, &queued, &running] {
            assert!(reports.contains_key(&kept.id));
        }
    }

    #[tokio::test]
    async fn test_submit_evicts_expired_reports() {
        let (queue, _receiver) = JobQueue::new(4, Duration::minutes(10));
        let expired = report_finished(Some(Utc::now() - Duration::minutes(30)), JobStatus::Succeeded);
        queue.reports.write().await.insert(expired.id, expired.clone());

        let report = queue.submit(Job::CreateRandomAuthor).await.unwrap();

        assert_matches!(queue.report(expired.id).await, Err(AppError::NotFound(_)));
        assert!(queue.report(report.id).await.is_ok());
    }
}
