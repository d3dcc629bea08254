use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{codes, ServiceError};

/// Canonical order/quotation status.
///
/// This enum and its adjacency table are the single source of truth for
/// status semantics; nothing else in the codebase compares status strings.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    DeriveActiveEnum,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "generate_invoice")]
    GenerateInvoice,
    #[sea_orm(string_value = "handover_delivery")]
    HandoverDelivery,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "paid_invoice")]
    PaidInvoice,
}

/// Context some transitions require. Moving to `generate_invoice` needs the
/// invoicing fields; everything else ignores the context.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TransitionContext {
    pub payment_term: Option<String>,
    pub billing_company: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot transition order from '{from}' to '{to}'")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("transition to '{to}' requires '{field}' to be set")]
    MissingContext {
        to: OrderStatus,
        field: &'static str,
    },

    #[error("order is in terminal status '{0}' and accepts no further transitions")]
    TerminalState(OrderStatus),
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::MissingContext { .. } => {
                ServiceError::ValidationError(err.to_string())
            }
            TransitionError::InvalidTransition { .. } => {
                ServiceError::conflict_with_code(err.to_string(), codes::INVALID_TRANSITION)
            }
            TransitionError::TerminalState(_) => {
                ServiceError::conflict_with_code(err.to_string(), codes::TERMINAL_STATUS)
            }
        }
    }
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        self.allowed_targets().is_empty()
    }

    /// The adjacency table. An approved order may enter any fulfillment
    /// milestone directly; once inside the milestones they advance strictly
    /// forward.
    pub fn allowed_targets(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Approved, Rejected],
            Approved => &[GenerateInvoice, HandoverDelivery, Delivered, PaidInvoice],
            GenerateInvoice => &[HandoverDelivery],
            HandoverDelivery => &[Delivered],
            Delivered => &[PaidInvoice],
            Rejected | PaidInvoice => &[],
        }
    }

    pub fn can_transition_to(self, target: OrderStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Validates a requested transition, including any context the target
    /// status requires. Pure: the caller persists the change on `Ok`.
    pub fn validate_transition(
        self,
        target: OrderStatus,
        ctx: &TransitionContext,
    ) -> Result<(), TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::TerminalState(self));
        }
        if !self.can_transition_to(target) {
            return Err(TransitionError::InvalidTransition {
                from: self,
                to: target,
            });
        }
        if target == OrderStatus::GenerateInvoice {
            if ctx.payment_term.as_deref().map_or(true, str::is_empty) {
                return Err(TransitionError::MissingContext {
                    to: target,
                    field: "payment_term",
                });
            }
            if ctx.billing_company.as_deref().map_or(true, str::is_empty) {
                return Err(TransitionError::MissingContext {
                    to: target,
                    field: "billing_company",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use sea_orm::Iterable;
    use OrderStatus::*;

    fn invoice_ctx() -> TransitionContext {
        TransitionContext {
            payment_term: Some("net_30".into()),
            billing_company: Some("Acme Ltd".into()),
        }
    }

    #[test]
    fn pending_splits_into_approved_or_rejected() {
        let ctx = TransitionContext::default();
        assert!(Pending.validate_transition(Approved, &ctx).is_ok());
        assert!(Pending.validate_transition(Rejected, &ctx).is_ok());
    }

    #[test]
    fn pending_cannot_jump_to_paid_invoice() {
        let err = Pending
            .validate_transition(PaidInvoice, &TransitionContext::default())
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: Pending,
                to: PaidInvoice
            }
        );
    }

    #[test]
    fn milestones_advance_forward_only() {
        let ctx = TransitionContext::default();
        assert!(GenerateInvoice
            .validate_transition(HandoverDelivery, &ctx)
            .is_ok());
        assert!(HandoverDelivery.validate_transition(Delivered, &ctx).is_ok());
        assert!(Delivered.validate_transition(PaidInvoice, &ctx).is_ok());

        assert!(HandoverDelivery
            .validate_transition(GenerateInvoice, &invoice_ctx())
            .is_err());
        assert!(Delivered.validate_transition(HandoverDelivery, &ctx).is_err());
    }

    #[test]
    fn generate_invoice_requires_payment_term_and_billing_company() {
        let err = Approved
            .validate_transition(GenerateInvoice, &TransitionContext::default())
            .unwrap_err();
        assert_matches!(
            err,
            TransitionError::MissingContext {
                field: "payment_term",
                ..
            }
        );

        let partial = TransitionContext {
            payment_term: Some("net_30".into()),
            billing_company: None,
        };
        let err = Approved
            .validate_transition(GenerateInvoice, &partial)
            .unwrap_err();
        assert_matches!(
            err,
            TransitionError::MissingContext {
                field: "billing_company",
                ..
            }
        );

        assert!(Approved
            .validate_transition(GenerateInvoice, &invoice_ctx())
            .is_ok());
    }

    #[test]
    fn empty_context_strings_count_as_missing() {
        let blank = TransitionContext {
            payment_term: Some(String::new()),
            billing_company: Some("Acme Ltd".into()),
        };
        assert!(Approved
            .validate_transition(GenerateInvoice, &blank)
            .is_err());
    }

    #[test]
    fn terminal_states_accept_nothing() {
        let ctx = TransitionContext::default();
        for target in OrderStatus::iter() {
            assert_eq!(
                Rejected.validate_transition(target, &ctx),
                Err(TransitionError::TerminalState(Rejected))
            );
            assert_eq!(
                PaidInvoice.validate_transition(target, &ctx),
                Err(TransitionError::TerminalState(PaidInvoice))
            );
        }
    }

    #[test]
    fn every_disallowed_pair_is_rejected() {
        let ctx = invoice_ctx();
        for from in OrderStatus::iter() {
            for to in OrderStatus::iter() {
                let allowed = from.allowed_targets().contains(&to);
                assert_eq!(
                    from.validate_transition(to, &ctx).is_ok(),
                    allowed,
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        use std::str::FromStr;
        for status in OrderStatus::iter() {
            let rendered = status.to_string();
            assert_eq!(OrderStatus::from_str(&rendered).unwrap(), status);
        }
        assert_eq!(GenerateInvoice.to_string(), "generate_invoice");
    }
}
