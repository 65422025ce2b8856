//! Core request types: status, roles, stages, dates and the creation draft
use super::error::ValidationError;
use super::history::{self, HistoryEvent};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::fmt;

/// Pipeline position of a request. The management step is a single
/// state regardless of which manager handles it.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    #[n(0)]
    Pending,
    #[n(1)]
    Management,
    #[n(2)]
    WithCashier,
    #[n(3)]
    CashierApproved,
    #[n(4)]
    Disbursed,
    #[n(5)]
    Rejected,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Status::Pending => "Pending",
            Status::Management => "At management",
            Status::WithCashier => "With cashier",
            Status::CashierApproved => "Approved for disbursement",
            Status::Disbursed => "Disbursed",
            Status::Rejected => "Rejected",
        };
        f.write_str(text)
    }
}

/// Acting role, passed explicitly into every workflow and query operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Requester,
    Liaison,
    Manager,
    Cashier,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Role::Requester => "Requester",
            Role::Liaison => "Liaison",
            Role::Manager => "Manager",
            Role::Cashier => "Cashier",
        };
        f.write_str(text)
    }
}

/// One of the four pipeline checkpoints a request passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Liaison,
    Management,
    Cashier,
    Disbursement,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Stage::Liaison => "Liaison",
            Stage::Management => "Management",
            Stage::Cashier => "Cashier",
            Stage::Disbursement => "Disbursement",
        };
        f.write_str(text)
    }
}

/// Calendar date, displayed and serialized as `dd/mm/yyyy`.
/// Time-of-day never participates in comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestDate(NaiveDate);

impl RequestDate {
    pub fn today() -> Self {
        Self(Utc::now().date_naive())
    }
    /// `None` when the components name no real calendar date.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }
    pub fn parse(text: &str) -> Option<Self> {
        NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y").ok().map(Self)
    }
    /// Default lower bound for an open-ended date range.
    pub fn far_past() -> Self {
        Self(NaiveDate::from_ymd_opt(1900, 1, 1).unwrap())
    }
    /// Default upper bound for an open-ended date range.
    pub fn far_future() -> Self {
        Self(NaiveDate::from_ymd_opt(2100, 12, 31).unwrap())
    }
}

impl fmt::Display for RequestDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d/%m/%Y"))
    }
}

impl<C> minicbor::Encode<C> for RequestDate {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        e.str(&self.to_string())?.ok()
    }
}

impl<'b, C> minicbor::Decode<'b, C> for RequestDate {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let text = d.str()?;

        RequestDate::parse(text).ok_or(minicbor::decode::Error::message(
            "expected a date in dd/mm/yyyy format",
        ))
    }
}

/// Wall-clock capture used to stamp history events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventStamp(DateTime<Utc>);

impl EventStamp {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Self {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .unwrap()
            .into()
    }
    pub fn date(&self) -> RequestDate {
        RequestDate(self.0.date_naive())
    }
    pub fn time(&self) -> String {
        self.0.format("%H:%M").to_string()
    }
    pub fn millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl From<DateTime<Utc>> for EventStamp {
    fn from(value: DateTime<Utc>) -> Self {
        EventStamp(value)
    }
}

/// Parse a decimal amount such as `"150.50"` into integer cents.
/// Zero, negative and unparseable input is rejected.
pub fn parse_amount(input: &str) -> Result<u64, ValidationError> {
    let invalid = || ValidationError::InvalidAmount {
        input: input.to_string(),
    };
    let text = input.trim();
    let (whole_part, frac_part) = match text.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (text, ""),
    };
    if whole_part.is_empty() && frac_part.is_empty() {
        return Err(invalid());
    }

    let whole: u64 = if whole_part.is_empty() {
        0
    } else {
        whole_part.parse().map_err(|_| invalid())?
    };
    let cents: u64 = match frac_part.len() {
        0 => 0,
        1 => frac_part.parse::<u64>().map_err(|_| invalid())? * 10,
        2 => frac_part.parse().map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    let total = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(cents))
        .ok_or_else(invalid)?;
    if total == 0 {
        return Err(invalid());
    }
    Ok(total)
}

/// Render integer cents back to a two-decimal string.
pub fn format_amount(cents: u64) -> String {
    format!("{}.{:02}", cents / 100, cents % 100)
}

pub(crate) const CREATED_LABEL: &str = "Request created";

/// One petty-cash ask.
///
/// `status` is the single source of truth for pipeline position and
/// always matches the status of the most recently appended history
/// event. `history` is append-only and never empty once built.
#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq)]
pub struct Request {
    #[n(0)]
    pub number: String,
    #[n(1)]
    pub created_date: RequestDate,
    #[n(2)]
    pub requester: String,
    #[n(3)]
    pub venue: String,
    #[n(4)]
    pub cost_center: String,
    #[n(5)]
    pub concept: String,
    #[n(6)]
    pub approver_name: String,
    #[n(7)]
    pub amount: u64, // integer cents
    #[n(8)]
    pub status: Status,
    #[n(9)]
    pub rejection_reason: Option<String>,
    #[n(10)]
    pub history: Vec<HistoryEvent>,
}

impl Request {
    /// The pipeline checkpoint this request currently sits at. Rejected
    /// requests report the stage the rejection is attributed to.
    pub fn current_stage(&self) -> Stage {
        match self.status {
            Status::Pending => Stage::Liaison,
            Status::Management => Stage::Management,
            Status::WithCashier | Status::CashierApproved => Stage::Cashier,
            Status::Disbursed => Stage::Disbursement,
            Status::Rejected => history::rejection_stage(&self.history),
        }
    }
}

// Used for constructing new requests before validation
#[derive(Debug, Default)]
pub struct RequestDraft {
    requester: Option<String>,
    venue: Option<String>,
    cost_center: Option<String>,
    concept: Option<String>,
    approver_name: Option<String>,
    amount: Option<String>,
}

impl RequestDraft {
    /// Construct a new draft, the basis for a request
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_requester(mut self, requester: &str) -> Self {
        self.requester = Some(requester.to_string());
        self
    }
    pub fn set_venue(mut self, venue: &str) -> Self {
        self.venue = Some(venue.to_string());
        self
    }
    pub fn set_cost_center(mut self, cost_center: &str) -> Self {
        self.cost_center = Some(cost_center.to_string());
        self
    }
    pub fn set_concept(mut self, concept: &str) -> Self {
        self.concept = Some(concept.to_string());
        self
    }
    pub fn set_approver_name(mut self, approver_name: &str) -> Self {
        self.approver_name = Some(approver_name.to_string());
        self
    }
    pub fn set_amount(mut self, amount: &str) -> Self {
        self.amount = Some(amount.to_string());
        self
    }

    /// Checks all required fields, then builds the request in `Pending`
    /// state with its single creation history event.
    pub fn into_request(
        self,
        number: String,
        stamp: EventStamp,
    ) -> Result<Request, ValidationError> {
        let requester = required("requester", self.requester)?;
        let venue = required("venue", self.venue)?;
        let cost_center = required("cost_center", self.cost_center)?;
        let concept = required("concept", self.concept)?;
        let approver_name = required("approver_name", self.approver_name)?;
        let amount = parse_amount(self.amount.as_deref().unwrap_or(""))?;

        let creation = HistoryEvent::new(CREATED_LABEL, Status::Pending, stamp, &requester);

        Ok(Request {
            number,
            created_date: stamp.date(),
            requester,
            venue,
            cost_center,
            concept,
            approver_name,
            amount,
            status: Status::Pending,
            rejection_reason: None,
            history: vec![creation],
        })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        _ => Err(ValidationError::EmptyField { field }),
    }
}
