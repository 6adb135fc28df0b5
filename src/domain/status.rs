use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Kitchen progress of an order. Serialized with the labels shown on the monitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    #[serde(rename = "調理中")]
    Cooking,
    #[serde(rename = "提供可能")]
    Ready,
    #[serde(rename = "完了")]
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum PaymentStatus {
    #[serde(rename = "未会計")]
    Unpaid,
    #[serde(rename = "会計済")]
    Paid,
}

/// Outcome of asking an order to move to a new status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The order already has the requested status; nothing to write.
    Unchanged,
    Advance(OrderStatus),
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 3] = [OrderStatus::Cooking, OrderStatus::Ready, OrderStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Cooking => "調理中",
            OrderStatus::Ready => "提供可能",
            OrderStatus::Done => "完了",
        }
    }

    pub fn next(&self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Cooking => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Done),
            OrderStatus::Done => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    /// Validates a status change. Only single forward steps are allowed and
    /// an order is handed over (`完了`) only once it has been paid.
    pub fn transition_to(
        self,
        target: OrderStatus,
        payment: PaymentStatus,
    ) -> Result<Transition, AppError> {
        if self == target {
            return Ok(Transition::Unchanged);
        }
        if self.next() != Some(target) {
            return Err(AppError::bad_request(format!(
                "Cannot change status from {} to {}",
                self, target
            )));
        }
        if target == OrderStatus::Done && payment != PaymentStatus::Paid {
            return Err(AppError::bad_request(
                "Order has not been paid yet; collect payment before handing it over",
            ));
        }
        Ok(Transition::Advance(target))
    }
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Unpaid => "未会計",
            PaymentStatus::Paid => "会計済",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "調理中" => Ok(OrderStatus::Cooking),
            "提供可能" => Ok(OrderStatus::Ready),
            "完了" => Ok(OrderStatus::Done),
            other => Err(AppError::bad_request(format!("Invalid order status: {other}"))),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "未会計" => Ok(PaymentStatus::Unpaid),
            "会計済" => Ok(PaymentStatus::Paid),
            other => Err(AppError::bad_request(format!(
                "Invalid payment status: {other}"
            ))),
        }
    }
}

/// Parses a comma separated status list such as `調理中,提供可能`.
pub fn parse_status_list(raw: &str) -> Result<Vec<OrderStatus>, AppError> {
    let mut statuses = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let status: OrderStatus = part.parse()?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    if statuses.is_empty() {
        return Err(AppError::bad_request("At least one status is required"));
    }
    Ok(statuses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_serde() {
        let json = serde_json::to_string(&OrderStatus::Ready).unwrap();
        assert_eq!(json, "\"提供可能\"");
        let back: PaymentStatus = serde_json::from_str("\"会計済\"").unwrap();
        assert_eq!(back, PaymentStatus::Paid);
    }

    #[test]
    fn kitchen_marks_cooking_order_ready() {
        let t = OrderStatus::Cooking
            .transition_to(OrderStatus::Ready, PaymentStatus::Unpaid)
            .unwrap();
        assert_eq!(t, Transition::Advance(OrderStatus::Ready));
    }

    #[test]
    fn duplicate_tap_is_a_no_op() {
        let t = OrderStatus::Ready
            .transition_to(OrderStatus::Ready, PaymentStatus::Unpaid)
            .unwrap();
        assert_eq!(t, Transition::Unchanged);
    }

    #[test]
    fn unpaid_order_cannot_be_handed_over() {
        let err = OrderStatus::Ready
            .transition_to(OrderStatus::Done, PaymentStatus::Unpaid)
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let ok = OrderStatus::Ready
            .transition_to(OrderStatus::Done, PaymentStatus::Paid)
            .unwrap();
        assert_eq!(ok, Transition::Advance(OrderStatus::Done));
    }

    #[test]
    fn skipping_or_reversing_is_rejected() {
        assert!(OrderStatus::Cooking
            .transition_to(OrderStatus::Done, PaymentStatus::Paid)
            .is_err());
        assert!(OrderStatus::Done
            .transition_to(OrderStatus::Cooking, PaymentStatus::Paid)
            .is_err());
        assert!(OrderStatus::Done.is_terminal());
    }

    #[test]
    fn status_list_dedups_and_rejects_unknown() {
        let list = parse_status_list("調理中, 提供可能,調理中").unwrap();
        assert_eq!(list, vec![OrderStatus::Cooking, OrderStatus::Ready]);
        assert!(parse_status_list("cooking").is_err());
        assert!(parse_status_list(" , ").is_err());
    }
}
