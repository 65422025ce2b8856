//! Stateless query, filter and statistics layer over a request snapshot
use super::history;
use super::request::{Request, RequestDate, Role, Stage, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    OldestFirst,
    NewestFirst,
}

/// Composable filter chain over a borrowed snapshot. Filters may be
/// applied in any order; sorting is applied last.
pub struct Query<'a> {
    matches: Vec<&'a Request>,
}

impl<'a> Query<'a> {
    pub fn over(requests: &'a [Request]) -> Self {
        Self {
            matches: requests.iter().collect(),
        }
    }

    /// Restrict to the subset the given role is permitted to view.
    pub fn scope(mut self, role: Role) -> Self {
        self.matches.retain(|request| in_scope(request, role));
        self
    }

    /// Case-insensitive substring match against number and concept.
    pub fn search(mut self, term: &str) -> Self {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self;
        }
        self.matches.retain(|request| {
            request.number.to_lowercase().contains(&needle)
                || request.concept.to_lowercase().contains(&needle)
        });
        self
    }

    /// Case-insensitive substring match against the requester name.
    pub fn requester(mut self, term: &str) -> Self {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self;
        }
        self.matches
            .retain(|request| request.requester.to_lowercase().contains(&needle));
        self
    }

    /// Inclusive creation-date range; either bound may be left open.
    pub fn between(mut self, from: Option<RequestDate>, to: Option<RequestDate>) -> Self {
        let from = from.unwrap_or_else(RequestDate::far_past);
        let to = to.unwrap_or_else(RequestDate::far_future);
        self.matches
            .retain(|request| from <= request.created_date && request.created_date <= to);
        self
    }

    /// Exact status match.
    pub fn status(mut self, status: Status) -> Self {
        self.matches.retain(|request| request.status == status);
        self
    }

    /// Stable sort by creation date.
    pub fn sorted(mut self, order: SortOrder) -> Self {
        match order {
            SortOrder::OldestFirst => self.matches.sort_by_key(|request| request.created_date),
            SortOrder::NewestFirst => self
                .matches
                .sort_by_key(|request| std::cmp::Reverse(request.created_date)),
        }
        self
    }

    pub fn collect(self) -> Vec<&'a Request> {
        self.matches
    }
}

fn in_scope(request: &Request, role: Role) -> bool {
    match role {
        Role::Requester | Role::Liaison | Role::Manager => true,
        Role::Cashier => match request.status {
            Status::WithCashier | Status::CashierApproved | Status::Disbursed => true,
            Status::Rejected => history::rejection_stage(&request.history) == Stage::Cashier,
            Status::Pending | Status::Management => false,
        },
    }
}

/// Distinct requester names in first-seen order (feeds the requester
/// filter list in the approval views).
pub fn requesters(requests: &[Request]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for request in requests {
        if !seen.iter().any(|name| name == &request.requester) {
            seen.push(request.requester.clone());
        }
    }
    seen
}

/// Dashboard counters for one role scope.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RoleStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    /// Sum of disbursed amounts in cents. Populated for the requester
    /// dashboard only, zero elsewhere.
    pub disbursed_total: u64,
}

/// Aggregate counters over the role's visible subset.
pub fn stats(requests: &[Request], role: Role) -> RoleStats {
    let visible: Vec<&Request> = requests
        .iter()
        .filter(|request| in_scope(request, role))
        .collect();

    let count = |pred: &dyn Fn(&Request) -> bool| visible.iter().filter(|r| pred(r)).count();

    match role {
        Role::Requester => RoleStats {
            total: visible.len(),
            pending: count(&|r| r.status == Status::Pending),
            approved: count(&|r| {
                matches!(
                    r.status,
                    Status::Management | Status::WithCashier | Status::CashierApproved
                )
            }),
            rejected: count(&|r| r.status == Status::Rejected),
            disbursed_total: visible
                .iter()
                .filter(|r| r.status == Status::Disbursed)
                .map(|r| r.amount)
                .sum(),
        },
        Role::Liaison => RoleStats {
            total: visible.len(),
            pending: count(&|r| r.status == Status::Pending),
            approved: count(&|r| {
                !matches!(r.status, Status::Pending | Status::Rejected)
            }),
            rejected: count(&|r| r.status == Status::Rejected),
            disbursed_total: 0,
        },
        Role::Manager => RoleStats {
            total: visible.len(),
            pending: count(&|r| r.status == Status::Management),
            approved: count(&|r| {
                matches!(
                    r.status,
                    Status::WithCashier | Status::CashierApproved | Status::Disbursed
                )
            }),
            rejected: count(&|r| r.status == Status::Rejected),
            disbursed_total: 0,
        },
        // scope already narrows rejected requests to cashier-attributed ones
        Role::Cashier => RoleStats {
            total: visible.len(),
            pending: count(&|r| matches!(r.status, Status::WithCashier | Status::CashierApproved)),
            approved: count(&|r| r.status == Status::Disbursed),
            rejected: count(&|r| r.status == Status::Rejected),
            disbursed_total: 0,
        },
    }
}
