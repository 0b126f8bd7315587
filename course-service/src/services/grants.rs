//! Payment verification and purchase grants.
//!
//! The only write path into a user's purchase ledger. Signature
//! verification gates everything; grants are idempotent and atomic.

use anyhow::anyhow;
use mongodb::bson::DateTime;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{OrderRecord, PurchaseRecord};
use crate::services::metrics;
use crate::services::razorpay::{PaymentVerification, RazorpayClient};
use crate::services::repository::CourseStore;

/// Result of a successful verification.
#[derive(Debug)]
pub struct Granted {
    /// Course ids newly appended to the ledger.
    pub granted: Vec<i64>,
    /// Course ids that were already owned (retried verification).
    pub already_owned: Vec<i64>,
}

#[derive(Clone)]
pub struct GrantService {
    store: CourseStore,
    razorpay: RazorpayClient,
}

impl GrantService {
    pub fn new(store: CourseStore, razorpay: RazorpayClient) -> Self {
        Self { store, razorpay }
    }

    /// Verify a completed payment and grant access to the purchased courses.
    ///
    /// The granted course set comes from the order record persisted at
    /// creation time; `claimed_course_ids` is only cross-checked for
    /// logging. Steps before the single ledger update mutate nothing, so a
    /// failure anywhere leaves no partial grant.
    pub async fn verify_and_grant(
        &self,
        user_id: Uuid,
        verification: &PaymentVerification,
        claimed_course_ids: Option<&[i64]>,
    ) -> Result<Granted, AppError> {
        if !self.razorpay.verify_payment_signature(verification) {
            metrics::record_verification("invalid_signature");
            tracing::warn!(
                user_id = %user_id,
                order_id = %verification.razorpay_order_id,
                "Rejected payment with invalid signature"
            );
            return Err(AppError::BadRequest(anyhow!("Invalid signature")));
        }

        let order = self
            .store
            .find_order(&verification.razorpay_order_id)
            .await
            .map_err(AppError::DatabaseError)?
            .ok_or_else(|| {
                metrics::record_verification("unknown_order");
                AppError::BadRequest(anyhow!("Unknown order"))
            })?;

        if order.user_id != user_id {
            metrics::record_verification("wrong_user");
            tracing::warn!(
                user_id = %user_id,
                order_id = %order.order_id,
                order_user_id = %order.user_id,
                "Verification attempted against another user's order"
            );
            return Err(AppError::Forbidden(anyhow!(
                "Order does not belong to the authenticated user"
            )));
        }

        if let Some(claimed) = claimed_course_ids {
            if !same_id_set(claimed, &order.course_ids) {
                tracing::warn!(
                    order_id = %order.order_id,
                    claimed = ?claimed,
                    ordered = ?order.course_ids,
                    "Client-claimed course ids differ from the paid order; using the order"
                );
            }
        }

        let user = self
            .store
            .find_user_by_id(user_id)
            .await
            .map_err(AppError::DatabaseError)?
            .ok_or_else(|| AppError::NotFound(anyhow!("User not found")))?;

        let records = records_to_grant(
            &user.purchased_courses,
            &order,
            &verification.razorpay_payment_id,
            DateTime::now(),
        );
        let granted: Vec<i64> = records.iter().map(|r| r.course_id).collect();
        let already_owned: Vec<i64> = order
            .course_ids
            .iter()
            .copied()
            .filter(|id| !granted.contains(id))
            .collect();

        if !records.is_empty() {
            let matched = self
                .store
                .append_purchases(user_id, &records)
                .await
                .map_err(AppError::DatabaseError)?;
            if !matched {
                return Err(AppError::NotFound(anyhow!("User not found")));
            }
        }

        metrics::record_verification("granted");
        tracing::info!(
            user_id = %user_id,
            order_id = %order.order_id,
            payment_id = %verification.razorpay_payment_id,
            granted = ?granted,
            already_owned = ?already_owned,
            "Payment verified, purchases granted"
        );

        Ok(Granted {
            granted,
            already_owned,
        })
    }
}

/// Build the purchase records to append: one per ordered course id not
/// already present in the ledger. The persistence layer re-applies the same
/// filter atomically at write time.
pub fn records_to_grant(
    existing: &[PurchaseRecord],
    order: &OrderRecord,
    payment_id: &str,
    now: DateTime,
) -> Vec<PurchaseRecord> {
    order
        .course_ids
        .iter()
        .copied()
        .filter(|id| !existing.iter().any(|r| r.course_id == *id))
        .map(|course_id| PurchaseRecord {
            course_id,
            order_id: order.order_id.clone(),
            payment_id: payment_id.to_string(),
            purchased_at: now,
        })
        .collect()
}

fn same_id_set(a: &[i64], b: &[i64]) -> bool {
    let mut a = a.to_vec();
    a.sort_unstable();
    a.dedup();
    let mut b = b.to_vec();
    b.sort_unstable();
    b.dedup();
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(order_id: &str, course_ids: Vec<i64>) -> OrderRecord {
        OrderRecord {
            order_id: order_id.to_string(),
            user_id: Uuid::new_v4(),
            course_ids,
            amount: 2998,
            amount_minor: 299_800,
            currency: "INR".to_string(),
            receipt: "receipt_1".to_string(),
            created_at: DateTime::now(),
        }
    }

    fn record(course_id: i64) -> PurchaseRecord {
        PurchaseRecord {
            course_id,
            order_id: "order_prev".to_string(),
            payment_id: "pay_prev".to_string(),
            purchased_at: DateTime::now(),
        }
    }

    #[test]
    fn grants_all_courses_on_fresh_ledger() {
        let records = records_to_grant(&[], &order("order_1", vec![1, 3]), "pay_1", DateTime::now());
        let ids: Vec<i64> = records.iter().map(|r| r.course_id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(records.iter().all(|r| r.order_id == "order_1"));
    }

    #[test]
    fn retried_verification_grants_nothing_new() {
        let now = DateTime::now();
        let ord = order("order_1", vec![1, 3]);

        let first = records_to_grant(&[], &ord, "pay_1", now);
        assert_eq!(first.len(), 2);

        // Replay with the ledger already containing the first grant.
        let second = records_to_grant(&first, &ord, "pay_1", now);
        assert!(second.is_empty());
    }

    #[test]
    fn overlapping_order_only_adds_missing_courses() {
        let existing = vec![record(1)];
        let records =
            records_to_grant(&existing, &order("order_2", vec![1, 5]), "pay_2", DateTime::now());
        let ids: Vec<i64> = records.iter().map(|r| r.course_id).collect();
        assert_eq!(ids, vec![5]);
    }

    #[test]
    fn existing_records_are_never_rewritten() {
        let existing = vec![record(1)];
        let records =
            records_to_grant(&existing, &order("order_3", vec![1]), "pay_3", DateTime::now());
        assert!(records.is_empty());
    }

    #[test]
    fn same_id_set_ignores_ordering() {
        assert!(same_id_set(&[3, 1], &[1, 3]));
        assert!(!same_id_set(&[1], &[1, 3]));
        assert!(!same_id_set(&[1, 4], &[1, 3]));
    }

    #[test]
    fn duplicate_ids_do_not_mask_a_mismatch() {
        assert!(!same_id_set(&[1, 1], &[1, 3]));
        assert!(!same_id_set(&[1, 3], &[3, 3]));
        // Duplicates of the same set still compare equal.
        assert!(same_id_set(&[1, 1, 3], &[3, 1]));
    }
}
