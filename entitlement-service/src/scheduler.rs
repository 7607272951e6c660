//! Recurring license validation.
//!
//! The scheduler only decides *what* is scheduled; firing is the job of a
//! [`SchedulerHost`]. [`MemorySchedulerHost`] is an in-process host that
//! reports due jobs to a driver loop.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, TimeZone, Utc};
use entitlement_license::{Clock, SystemClock};
use tracing::{debug, info};

/// Interval between scheduled validations (twice daily).
pub const VALIDATION_INTERVAL_HOURS: i64 = 12;

/// A recurring job registered with a host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub trigger: String,
    pub args: Vec<String>,
    pub next_run: DateTime<Utc>,
    pub interval: Duration,
}

/// A job runner that fires recurring triggers.
///
/// A job is identified by its trigger id together with its arguments.
pub trait SchedulerHost: Send + Sync {
    fn schedule(&self, job: ScheduledJob);

    fn next_run(&self, trigger: &str, args: &[String]) -> Option<DateTime<Utc>>;

    fn cancel(&self, trigger: &str, args: &[String]);
}

/// In-process [`SchedulerHost`].
#[derive(Debug, Default)]
pub struct MemorySchedulerHost {
    jobs: Mutex<BTreeMap<(String, Vec<String>), ScheduledJob>>,
}

impl MemorySchedulerHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn jobs(&self) -> Vec<ScheduledJob> {
        self.with_jobs(|jobs| jobs.values().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.with_jobs(|jobs| jobs.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the jobs due at `now` and moves each past `now`.
    ///
    /// A job that missed several runs fires once.
    pub fn due(&self, now: DateTime<Utc>) -> Vec<ScheduledJob> {
        self.with_jobs(|jobs| {
            let mut fired = Vec::new();
            for job in jobs.values_mut().filter(|job| job.next_run <= now) {
                fired.push(job.clone());
                if job.interval <= Duration::zero() {
                    job.next_run = now + Duration::seconds(1);
                    continue;
                }
                while job.next_run <= now {
                    job.next_run += job.interval;
                }
            }
            fired
        })
    }

    fn with_jobs<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<(String, Vec<String>), ScheduledJob>) -> R,
    ) -> R {
        match self.jobs.lock() {
            Ok(mut jobs) => f(&mut jobs),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }
}

impl SchedulerHost for MemorySchedulerHost {
    fn schedule(&self, job: ScheduledJob) {
        self.with_jobs(|jobs| {
            jobs.insert((job.trigger.clone(), job.args.clone()), job);
        });
    }

    fn next_run(&self, trigger: &str, args: &[String]) -> Option<DateTime<Utc>> {
        self.with_jobs(|jobs| {
            jobs.get(&(trigger.to_string(), args.to_vec()))
                .map(|job| job.next_run)
        })
    }

    fn cancel(&self, trigger: &str, args: &[String]) {
        self.with_jobs(|jobs| {
            jobs.remove(&(trigger.to_string(), args.to_vec()));
        });
    }
}

/// Enables and disables the recurring validation of licenses.
pub struct ValidationScheduler {
    host: Arc<dyn SchedulerHost>,
    prefix: String,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ValidationScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationScheduler")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl ValidationScheduler {
    pub fn new(host: Arc<dyn SchedulerHost>, prefix: impl Into<String>) -> Self {
        Self {
            host,
            prefix: prefix.into(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Trigger id of the validation job of license `id`.
    pub fn trigger_id(&self, id: &str) -> String {
        format!("{}_{id}_license_validation", self.prefix)
    }

    /// Time of the next scheduled validation, if any.
    pub fn next_validation(&self, id: &str) -> Option<DateTime<Utc>> {
        self.host.next_run(&self.trigger_id(id), &args(id))
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.next_validation(id).is_some()
    }

    /// Schedules validation from the next local midnight, twice daily.
    /// Returns false if a validation was already scheduled.
    pub fn enable(&self, id: &str) -> bool {
        if self.is_enabled(id) {
            return false;
        }
        let next_run = next_midnight(self.clock.now(), &Local);
        self.host.schedule(ScheduledJob {
            trigger: self.trigger_id(id),
            args: args(id),
            next_run,
            interval: Duration::hours(VALIDATION_INTERVAL_HOURS),
        });
        info!(license = %id, %next_run, "license validation enabled");
        true
    }

    /// Cancels scheduled validation. Returns false if none was scheduled.
    pub fn disable(&self, id: &str) -> bool {
        if !self.is_enabled(id) {
            debug!(license = %id, "license validation not scheduled");
            return false;
        }
        self.host.cancel(&self.trigger_id(id), &args(id));
        info!(license = %id, "license validation disabled");
        true
    }

    /// The license id a fired job validates, if the job is a validation
    /// trigger of this scheduler.
    pub fn license_of<'a>(&self, job: &'a ScheduledJob) -> Option<&'a str> {
        let id = job.args.first()?;
        (job.trigger == self.trigger_id(id)).then_some(id.as_str())
    }
}

fn args(id: &str) -> Vec<String> {
    vec![id.to_string()]
}

/// The first midnight in `tz` strictly after `now`.
pub fn next_midnight<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> DateTime<Utc> {
    let tomorrow = now.with_timezone(tz).date_naive().succ_opt();
    tomorrow
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or_else(|| now + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn next_midnight_in_utc() {
        assert_eq!(
            next_midnight(at("2026-03-10T15:30:00Z"), &Utc),
            at("2026-03-11T00:00:00Z")
        );
    }

    #[test]
    fn exactly_midnight_moves_to_the_next_day() {
        assert_eq!(
            next_midnight(at("2026-03-10T00:00:00Z"), &Utc),
            at("2026-03-11T00:00:00Z")
        );
    }

    #[test]
    fn next_midnight_follows_the_zone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        // 23:30 UTC is already 01:30 on the 11th at +02:00.
        assert_eq!(
            next_midnight(at("2026-03-10T23:30:00Z"), &tz),
            at("2026-03-11T22:00:00Z")
        );
    }
}
