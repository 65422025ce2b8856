//! Service layer API for request workflow operations
use super::error::WorkflowError;
use super::history::HistoryEvent;
use super::request::{EventStamp, Request, RequestDraft, Role, Status};
use super::store::RequestStore;
use super::utils;

/// Bounded retries against a colliding request number before giving up.
const NUMBER_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Approve,
    Reject,
    Disburse,
}

/// One row of the allowed-transition table.
struct Transition {
    role: Role,
    action: Action,
    from: &'static [Status],
    to: Status,
    label: &'static str,
}

/// Single authority for which role may move a request from where to
/// where, and the history label each move leaves behind.
const TRANSITIONS: &[Transition] = &[
    Transition {
        role: Role::Liaison,
        action: Action::Approve,
        from: &[Status::Pending],
        to: Status::Management,
        label: "Liaison - approved",
    },
    Transition {
        role: Role::Liaison,
        action: Action::Reject,
        from: &[Status::Pending],
        to: Status::Rejected,
        label: "Liaison - rejected",
    },
    Transition {
        role: Role::Manager,
        action: Action::Approve,
        from: &[Status::Management],
        to: Status::WithCashier,
        label: "Management - approved",
    },
    Transition {
        role: Role::Manager,
        action: Action::Reject,
        from: &[Status::Management],
        to: Status::Rejected,
        label: "Management - rejected",
    },
    Transition {
        role: Role::Cashier,
        action: Action::Approve,
        from: &[Status::WithCashier],
        to: Status::CashierApproved,
        label: "Cashier - approved for disbursement",
    },
    Transition {
        role: Role::Cashier,
        action: Action::Reject,
        from: &[Status::WithCashier, Status::CashierApproved],
        to: Status::Rejected,
        label: "Cashier - rejected",
    },
    Transition {
        role: Role::Cashier,
        action: Action::Disburse,
        from: &[Status::CashierApproved],
        to: Status::Disbursed,
        label: "Cashier - disbursed",
    },
];

pub struct WorkflowService {
    store: RequestStore,
}

impl WorkflowService {
    pub fn new(store: RequestStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RequestStore {
        &self.store
    }

    /// Submit a new request for approval. Validates the draft, assigns
    /// an unused request number, prepends the request to the collection
    /// (most-recent-first display convention) and persists.
    pub fn create(&self, draft: RequestDraft) -> Result<Request, WorkflowError> {
        let mut requests = self.store.load()?;
        let number = next_free_number(&requests)?;
        let request = draft.into_request(number, EventStamp::new())?;

        requests.insert(0, request.clone());
        self.store.save(&requests)?;

        Ok(request)
    }

    /// Advance a request one step in the pipeline on behalf of `role`.
    pub fn approve(
        &self,
        number: &str,
        role: Role,
        actor: &str,
    ) -> Result<Request, WorkflowError> {
        self.apply(number, role, Action::Approve, actor, None)
    }

    /// Reject a request on behalf of `role`, recording the reason on
    /// both the request and its history event.
    pub fn reject(
        &self,
        number: &str,
        role: Role,
        actor: &str,
        reason: &str,
    ) -> Result<Request, WorkflowError> {
        self.apply(number, role, Action::Reject, actor, Some(reason))
    }

    /// Mark an approved request as paid out. Cashier only.
    pub fn disburse(&self, number: &str, actor: &str) -> Result<Request, WorkflowError> {
        self.apply(number, Role::Cashier, Action::Disburse, actor, None)
    }

    /// Look up a single request by number.
    pub fn get(&self, number: &str) -> Result<Request, WorkflowError> {
        let requests = self.store.load()?;
        requests
            .into_iter()
            .find(|request| request.number == number)
            .ok_or_else(|| WorkflowError::NotFound {
                number: number.to_string(),
            })
    }

    fn apply(
        &self,
        number: &str,
        role: Role,
        action: Action,
        actor: &str,
        reason: Option<&str>,
    ) -> Result<Request, WorkflowError> {
        let rule = TRANSITIONS
            .iter()
            .find(|t| t.role == role && t.action == action)
            .ok_or(WorkflowError::RoleNotAllowed { role })?;

        let mut requests = self.store.load()?;
        let request = requests
            .iter_mut()
            .find(|request| request.number == number)
            .ok_or_else(|| WorkflowError::NotFound {
                number: number.to_string(),
            })?;

        if !rule.from.contains(&request.status) {
            return Err(WorkflowError::InvalidTransition {
                current: request.status,
                attempted: rule.to,
            });
        }

        let mut event = HistoryEvent::new(rule.label, rule.to, EventStamp::new(), actor);
        match reason {
            Some(reason) => {
                event = event.with_reason(reason);
                request.rejection_reason = Some(reason.to_string());
            }
            None => request.rejection_reason = None,
        }

        request.status = rule.to;
        request.history.push(event);
        let updated = request.clone();

        self.store.save(&requests)?;

        Ok(updated)
    }
}

fn next_free_number(existing: &[Request]) -> Result<String, WorkflowError> {
    for _ in 0..NUMBER_ATTEMPTS {
        let candidate = utils::new_request_number();
        if !existing.iter().any(|request| request.number == candidate) {
            return Ok(candidate);
        }
    }
    Err(WorkflowError::NumberExhausted)
}
