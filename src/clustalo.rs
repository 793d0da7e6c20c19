//! EBI Clustal Omega job client.
//!
//! Submits a FASTA payload to the clustalo REST service, polls the job
//! status on an escalating schedule, and fetches the `clustal_num` result.
//! The schedule is the bounded one the service tolerates well: poll every
//! 4 s, double the interval after every 5 polls, give up when the interval
//! would reach 64 s (about 300 s of waiting in total).

use crate::fasta::to_fasta;
use log::{debug, info};
use std::thread;
use std::time::Duration;

const RUN_URL: &str = "https://www.ebi.ac.uk/Tools/services/rest/clustalo/run";
const STATUS_URL: &str = "https://www.ebi.ac.uk/Tools/services/rest/clustalo/status";
const RESULT_URL: &str = "https://www.ebi.ac.uk/Tools/services/rest/clustalo/result";

#[derive(Debug)]
pub enum AlignJobErr {
    Http(reqwest::Error),
    TimedOut(String),
    JobFailed(String, String),
}

impl std::fmt::Display for AlignJobErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlignJobErr::Http(e) => write!(f, "alignment request failed: {}", e),
            AlignJobErr::TimedOut(job) => {
                write!(f, "alignment job {} did not finish before the poll budget", job)
            }
            AlignJobErr::JobFailed(job, status) => {
                write!(f, "alignment job {} ended with status {}", job, status)
            }
        }
    }
}

impl std::error::Error for AlignJobErr {}

impl From<reqwest::Error> for AlignJobErr {
    fn from(err: reqwest::Error) -> Self {
        AlignJobErr::Http(err)
    }
}

/// Escalating poll schedule: yields the wait before each status poll and
/// ends when the budget is spent.
pub struct PollSchedule {
    interval: Duration,
    polls: u32,
    exhausted: bool,
}

impl Default for PollSchedule {
    fn default() -> Self {
        PollSchedule {
            interval: Duration::from_secs(4),
            polls: 0,
            exhausted: false,
        }
    }
}

impl Iterator for PollSchedule {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.exhausted {
            return None;
        }
        let wait = self.interval;
        self.polls += 1;
        if self.polls % 5 == 0 {
            self.interval *= 2;
            if self.interval >= Duration::from_secs(64) {
                self.exhausted = true;
            }
        }
        Some(wait)
    }
}

/// Submit a multiple-alignment job for `seqs` and block until the aligned
/// `clustal_num` text is available.
///
/// `email` is the contact address the EBI requires on job submission.
pub fn request_multi_alignment(
    client: &reqwest::blocking::Client,
    seqs: &[(String, String)],
    email: &str,
) -> Result<String, AlignJobErr> {
    let fasta = to_fasta(seqs);
    let job_id = client
        .post(RUN_URL)
        .form(&[
            ("email", email),
            ("iterations", "1"),
            ("outfmt", "clustal_num"),
            ("order", "aligned"),
            ("sequence", &fasta),
        ])
        .send()?
        .error_for_status()?
        .text()?;
    info!("submitted clustalo job {}", job_id);

    for wait in PollSchedule::default() {
        thread::sleep(wait);
        let status = client
            .get(format!("{}/{}", STATUS_URL, job_id))
            .send()?
            .error_for_status()?
            .text()?;
        debug!("clustalo job {} status: {}", job_id, status);
        match status.as_str() {
            "RUNNING" => continue,
            "FINISHED" => {
                return Ok(client
                    .get(format!("{}/{}/aln-clustal_num", RESULT_URL, job_id))
                    .send()?
                    .error_for_status()?
                    .text()?);
            }
            _ => return Err(AlignJobErr::JobFailed(job_id, status)),
        }
    }
    Err(AlignJobErr::TimedOut(job_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_schedule_escalates_and_ends() {
        let waits: Vec<u64> = PollSchedule::default().map(|d| d.as_secs()).collect();
        assert_eq!(
            waits,
            vec![4, 4, 4, 4, 4, 8, 8, 8, 8, 8, 16, 16, 16, 16, 16, 32, 32, 32, 32, 32]
        );
        assert_eq!(waits.iter().sum::<u64>(), 300);
    }

    #[test]
    fn test_poll_schedule_is_fused() {
        let mut schedule = PollSchedule::default();
        for _ in 0..20 {
            assert!(schedule.next().is_some());
        }
        assert!(schedule.next().is_none());
        assert!(schedule.next().is_none());
    }
}
