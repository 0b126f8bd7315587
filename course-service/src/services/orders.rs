//! Order orchestration: price a course selection and mint a provider order.

use anyhow::anyhow;
use chrono::Utc;
use mongodb::bson::DateTime;
use uuid::Uuid;

use crate::config::{OrderConfig, UnknownCoursePolicy};
use crate::error::AppError;
use crate::models::{Course, OrderRecord};
use crate::services::razorpay::{ProviderOrder, RazorpayClient};
use crate::services::repository::CourseStore;
use crate::services::metrics;

/// A priced set of catalog courses.
#[derive(Debug)]
pub struct PricedSelection {
    pub courses: Vec<Course>,
    /// Total in major currency units.
    pub amount: i64,
}

#[derive(Clone)]
pub struct OrderService {
    store: CourseStore,
    razorpay: RazorpayClient,
    config: OrderConfig,
}

impl OrderService {
    pub fn new(store: CourseStore, razorpay: RazorpayClient, config: OrderConfig) -> Self {
        Self {
            store,
            razorpay,
            config,
        }
    }

    /// Create a provider order for the requested course ids.
    ///
    /// The course set and amounts are persisted locally alongside the
    /// provider order id, so later verification never trusts the client's
    /// resubmitted course list.
    pub async fn create_order(
        &self,
        user_id: Uuid,
        requested_ids: &[i64],
    ) -> Result<(ProviderOrder, PricedSelection), AppError> {
        let requested = dedup_ids(requested_ids);

        let found = self
            .store
            .find_courses_by_ids(&requested)
            .await
            .map_err(AppError::DatabaseError)?;

        let selection =
            price_selection(&requested, found, self.config.unknown_course_policy)?;

        let amount_minor = (selection.amount as u64) * 100;
        // Time-derived receipt keeps retries from colliding provider-side.
        let receipt = format!("receipt_{}", Utc::now().timestamp_millis());

        let provider_order = self
            .razorpay
            .create_order(amount_minor, &self.config.currency, receipt.clone())
            .await
            .map_err(AppError::ProviderError)?;

        let record = OrderRecord {
            order_id: provider_order.id.clone(),
            user_id,
            course_ids: selection.courses.iter().map(|c| c.id).collect(),
            amount: selection.amount,
            amount_minor: amount_minor as i64,
            currency: self.config.currency.clone(),
            receipt,
            created_at: DateTime::now(),
        };
        self.store
            .insert_order(&record)
            .await
            .map_err(AppError::DatabaseError)?;

        metrics::record_order_created(&self.config.currency);
        tracing::info!(
            user_id = %user_id,
            order_id = %provider_order.id,
            amount = selection.amount,
            courses = ?record.course_ids,
            "Order created"
        );

        Ok((provider_order, selection))
    }
}

/// Resolve a requested id set against the courses found in the catalog.
///
/// Unknown ids are dropped or rejected per policy; an empty resolved set is
/// always an error.
pub fn price_selection(
    requested: &[i64],
    found: Vec<Course>,
    policy: UnknownCoursePolicy,
) -> Result<PricedSelection, AppError> {
    if policy == UnknownCoursePolicy::Reject && found.len() != requested.len() {
        let unknown: Vec<i64> = requested
            .iter()
            .copied()
            .filter(|id| !found.iter().any(|c| c.id == *id))
            .collect();
        return Err(AppError::BadRequest(anyhow!(
            "Unknown course ids: {:?}",
            unknown
        )));
    }

    if found.is_empty() {
        return Err(AppError::BadRequest(anyhow!(
            "No known courses in selection"
        )));
    }

    let amount = found.iter().map(|c| c.price).sum();
    Ok(PricedSelection {
        courses: found,
        amount,
    })
}

/// Drop duplicate ids, preserving first-seen order.
fn dedup_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = Vec::with_capacity(ids.len());
    for &id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}
