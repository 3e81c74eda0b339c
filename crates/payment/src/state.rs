//! Payment status and method.

use serde::{Deserialize, Serialize};

/// The status of a payment attempt.
///
/// State transitions:
/// ```text
/// Pending ──┬──► Paid
///           ├──► Failed
///           └──► Expired
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Awaiting the gateway's outcome.
    #[default]
    Pending,

    /// Settled by the gateway (terminal state).
    Paid,

    /// Declined by the gateway (terminal state).
    Failed,

    /// Lapsed, either reported by the gateway or because the booking
    /// expired first (terminal state).
    Expired,
}

impl PaymentStatus {
    /// Returns true if the payment may still transition.
    pub fn is_pending(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !self.is_pending()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Expired => "EXPIRED",
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "FAILED" => Ok(PaymentStatus::Failed),
            "EXPIRED" => Ok(PaymentStatus::Expired),
            other => Err(format!("invalid payment status: {other}")),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Virtual account bank transfer.
    #[serde(rename = "VA")]
    VirtualAccount,
    #[serde(rename = "EWALLET")]
    EWallet,
    #[serde(rename = "QRIS")]
    Qris,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::VirtualAccount => "VA",
            PaymentMethod::EWallet => "EWALLET",
            PaymentMethod::Qris => "QRIS",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VA" => Ok(PaymentMethod::VirtualAccount),
            "EWALLET" => Ok(PaymentMethod::EWallet),
            "QRIS" => Ok(PaymentMethod::Qris),
            other => Err(format!(
                "invalid payment method {other}, allowed: VA, EWALLET, QRIS"
            )),
        }
    }
}
