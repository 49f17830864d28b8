use std::fmt;
use std::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

// ConflictReason narrows a business-rule rejection so that callers can match
// on the rule that fired instead of parsing message text.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum ConflictReason {
    AlreadyBorrowed,
    NotAvailable,
    LimitReached,
    Overdue,
    HasDemand,
    AlreadyReserved,
}

impl From<String> for ConflictReason {
    fn from(s: String) -> Self {
        match s.as_str() {
            "AlreadyBorrowed" => ConflictReason::AlreadyBorrowed,
            "NotAvailable" => ConflictReason::NotAvailable,
            "LimitReached" => ConflictReason::LimitReached,
            "Overdue" => ConflictReason::Overdue,
            "HasDemand" => ConflictReason::HasDemand,
            "AlreadyReserved" => ConflictReason::AlreadyReserved,
            _ => ConflictReason::NotAvailable,
        }
    }
}

impl Display for ConflictReason {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ConflictReason::AlreadyBorrowed => write!(f, "AlreadyBorrowed"),
            ConflictReason::NotAvailable => write!(f, "NotAvailable"),
            ConflictReason::LimitReached => write!(f, "LimitReached"),
            ConflictReason::Overdue => write!(f, "Overdue"),
            ConflictReason::HasDemand => write!(f, "HasDemand"),
            ConflictReason::AlreadyReserved => write!(f, "AlreadyReserved"),
        }
    }
}

#[derive(Debug)]
pub enum LibraryError {
    NotFound {
        message: String,
    },
    // An operation was attempted against an entity whose status makes it
    // ineligible, e.g. returning a loan that is already Returned.
    InvalidState {
        message: String,
    },
    // Ownership check failed, e.g. cancelling another member's reservation.
    Forbidden {
        message: String,
    },
    // Business-rule rejection. Terminal and never retried.
    Conflict {
        message: String,
        reason: ConflictReason,
    },
    // Transient record-store conflict (optimistic version check lost).
    // The only error class the borrow path retries.
    Contention {
        message: String,
        retryable: bool,
    },
    Serialization {
        message: String,
    },
    Runtime {
        message: String,
        reason_code: Option<String>,
    },
}

impl LibraryError {
    pub fn not_found(message: &str) -> LibraryError {
        LibraryError::NotFound { message: message.to_string() }
    }

    pub fn invalid_state(message: &str) -> LibraryError {
        LibraryError::InvalidState { message: message.to_string() }
    }

    pub fn forbidden(message: &str) -> LibraryError {
        LibraryError::Forbidden { message: message.to_string() }
    }

    pub fn conflict(message: &str, reason: ConflictReason) -> LibraryError {
        LibraryError::Conflict { message: message.to_string(), reason }
    }

    pub fn contention(message: &str, retryable: bool) -> LibraryError {
        LibraryError::Contention { message: message.to_string(), retryable }
    }

    pub fn serialization(message: &str) -> LibraryError {
        LibraryError::Serialization { message: message.to_string() }
    }

    pub fn runtime(message: &str, reason_code: Option<String>) -> LibraryError {
        LibraryError::Runtime { message: message.to_string(), reason_code }
    }

    pub fn retryable(&self) -> bool {
        match self {
            LibraryError::NotFound { .. } => false,
            LibraryError::InvalidState { .. } => false,
            LibraryError::Forbidden { .. } => false,
            LibraryError::Conflict { .. } => false,
            LibraryError::Contention { retryable, .. } => *retryable,
            LibraryError::Serialization { .. } => false,
            LibraryError::Runtime { .. } => false,
        }
    }

    pub fn conflict_reason(&self) -> Option<ConflictReason> {
        match self {
            LibraryError::Conflict { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LibraryError {
    fn from(err: serde_json::Error) -> Self {
        LibraryError::serialization(
            format!("serde json parsing {:?}", err).as_str())
    }
}

impl From<String> for LibraryError {
    fn from(err: String) -> Self {
        LibraryError::serialization(
            format!("serde parsing {:?}", err).as_str())
    }
}

impl Display for LibraryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LibraryError::NotFound { message } => {
                write!(f, "{}", message)
            }
            LibraryError::InvalidState { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Forbidden { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Conflict { message, reason } => {
                write!(f, "{} {}", message, reason)
            }
            LibraryError::Contention { message, retryable } => {
                write!(f, "{} {}", message, retryable)
            }
            LibraryError::Serialization { message } => {
                write!(f, "{}", message)
            }
            LibraryError::Runtime { message, reason_code } => {
                write!(f, "{} {:?}", message, reason_code)
            }
        }
    }
}

/// A specialized Result type for the circulation engine.
pub type LibraryResult<T> = Result<T, LibraryError>;

// It defines abstraction for paginated result
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    // The page number or token
    pub page: Option<String>,
    // page size
    pub page_size: usize,
    // Next page if available
    pub next_page: Option<String>,
    // list of records
    pub records: Vec<T>,
}

impl<T> PaginatedResult<T> {
    pub(crate) fn new(page: Option<&str>, page_size: usize,
                      next_page: Option<String>, records: Vec<T>) -> Self {
        PaginatedResult {
            page: page.map(str::to_string),
            page_size,
            next_page,
            records,
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum BookStatus {
    Available,
    Borrowed,
}

impl From<String> for BookStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Available" => BookStatus::Available,
            "Borrowed" => BookStatus::Borrowed,
            _ => BookStatus::Available,
        }
    }
}

impl Display for BookStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            BookStatus::Available => write!(f, "Available"),
            BookStatus::Borrowed => write!(f, "Borrowed"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum LoanStatus {
    Active,
    Extended,
    Returned,
}

impl LoanStatus {
    // Active and Extended both count as a currently held loan for
    // return/extend eligibility and for the per-member loan limit.
    pub fn is_open(&self) -> bool {
        matches!(self, LoanStatus::Active | LoanStatus::Extended)
    }
}

impl From<String> for LoanStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Active" => LoanStatus::Active,
            "Extended" => LoanStatus::Extended,
            "Returned" => LoanStatus::Returned,
            _ => LoanStatus::Active,
        }
    }
}

impl Display for LoanStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            LoanStatus::Active => write!(f, "Active"),
            LoanStatus::Extended => write!(f, "Extended"),
            LoanStatus::Returned => write!(f, "Returned"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum ReservationStatus {
    Pending,
    ReadyForPickup,
    Fulfilled,
    Expired,
    Cancelled,
}

impl ReservationStatus {
    // Pending and ReadyForPickup block the same member from reserving again.
    pub fn is_active(&self) -> bool {
        matches!(self, ReservationStatus::Pending | ReservationStatus::ReadyForPickup)
    }
}

impl From<String> for ReservationStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Pending" => ReservationStatus::Pending,
            "ReadyForPickup" => ReservationStatus::ReadyForPickup,
            "Fulfilled" => ReservationStatus::Fulfilled,
            "Expired" => ReservationStatus::Expired,
            "Cancelled" => ReservationStatus::Cancelled,
            _ => ReservationStatus::Pending,
        }
    }
}

impl Display for ReservationStatus {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ReservationStatus::Pending => write!(f, "Pending"),
            ReservationStatus::ReadyForPickup => write!(f, "ReadyForPickup"),
            ReservationStatus::Fulfilled => write!(f, "Fulfilled"),
            ReservationStatus::Expired => write!(f, "Expired"),
            ReservationStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Regular,
    Librarian,
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Admin" => Role::Admin,
            "Regular" => Role::Regular,
            "Librarian" => Role::Librarian,
            _ => Role::Regular,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "Admin"),
            Role::Regular => write!(f, "Regular"),
            Role::Librarian => write!(f, "Librarian"),
        }
    }
}
