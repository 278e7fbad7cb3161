//! Submission state for an interactive front-end.
//!
//! Submissions are never cancelled. Each one receives a sequence number and
//! only the answer to the newest submission may change what is displayed.

use std::sync::Mutex;

use crate::errors::AppError;
use crate::models::CredibilityAnalysis;
use crate::report::ReportView;
use crate::tier_policy::TrustTierPolicy;

/// Handle for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Submitting(Ticket),
    Success(Ticket, ReportView),
    Failed(Ticket, String),
}

struct Inner {
    latest: u64,
    state: SessionState,
}

pub struct AnalysisSession {
    policy: TrustTierPolicy,
    inner: Mutex<Inner>,
}

impl AnalysisSession {
    pub fn new(policy: TrustTierPolicy) -> Self {
        Self {
            policy,
            inner: Mutex::new(Inner {
                latest: 0,
                state: SessionState::Idle,
            }),
        }
    }

    /// Starts a submission, superseding any still in flight.
    pub fn submit(&self) -> Ticket {
        let mut inner = self.lock();
        inner.latest += 1;
        let ticket = Ticket(inner.latest);
        inner.state = SessionState::Submitting(ticket);
        ticket
    }

    /// Records the outcome of a submission.
    ///
    /// Returns `false`, leaving the state untouched, when a newer submission
    /// has been made since `ticket` was issued.
    pub fn resolve(
        &self,
        ticket: Ticket,
        outcome: Result<CredibilityAnalysis, AppError>,
    ) -> bool {
        let mut inner = self.lock();
        if ticket.0 != inner.latest {
            tracing::debug!(
                "Dropping stale result #{} (latest is #{})",
                ticket.0,
                inner.latest
            );
            return false;
        }

        inner.state = match outcome {
            Ok(analysis) => {
                SessionState::Success(ticket, ReportView::from_analysis(&analysis, &self.policy))
            }
            Err(e) => SessionState::Failed(ticket, e.to_string()),
        };
        true
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // State is replaced wholesale, so a poisoned guard is still consistent
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(TrustTierPolicy::default())
    }
}
