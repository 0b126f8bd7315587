//! Ownership checks gating protected course content.

use anyhow::anyhow;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Course, CourseModule, PurchaseRecord};
use crate::services::repository::CourseStore;

#[derive(Clone)]
pub struct AccessService {
    store: CourseStore,
}

impl AccessService {
    pub fn new(store: CourseStore) -> Self {
        Self { store }
    }

    /// Whether the user's ledger holds a purchase record for the course.
    pub async fn has_access(&self, user_id: Uuid, course_id: i64) -> Result<bool, AppError> {
        let user = self
            .store
            .find_user_by_id(user_id)
            .await
            .map_err(AppError::DatabaseError)?
            .ok_or_else(|| AppError::NotFound(anyhow!("User not found")))?;

        Ok(owns_course(&user.purchased_courses, course_id))
    }

    /// Release the full module/lesson structure for an owned course.
    ///
    /// Existence is checked before ownership so a missing course is 404 and
    /// an unowned one is 403, never conflated.
    pub async fn protected_content(
        &self,
        user_id: Uuid,
        course_id: i64,
    ) -> Result<Vec<CourseModule>, AppError> {
        let course = self
            .store
            .find_course_by_id(course_id)
            .await
            .map_err(AppError::DatabaseError)?;

        let user = self
            .store
            .find_user_by_id(user_id)
            .await
            .map_err(AppError::DatabaseError)?
            .ok_or_else(|| AppError::NotFound(anyhow!("User not found")))?;

        let decision = content_decision(course, &user.purchased_courses);
        if let Err(AppError::Forbidden(_)) = &decision {
            tracing::debug!(
                user_id = %user_id,
                course_id,
                "Content request for unowned course"
            );
        }
        decision
    }
}

/// Decide whether to release a course's modules to a ledger holder.
///
/// A missing course is 404 regardless of ownership; only an existing,
/// unowned course is 403.
pub fn content_decision(
    course: Option<Course>,
    ledger: &[PurchaseRecord],
) -> Result<Vec<CourseModule>, AppError> {
    let course = course.ok_or_else(|| AppError::NotFound(anyhow!("Course not found")))?;

    if !owns_course(ledger, course.id) {
        return Err(AppError::Forbidden(anyhow!("You do not own this course")));
    }

    Ok(course.modules)
}

/// Pure ownership predicate over a purchase ledger.
pub fn owns_course(records: &[PurchaseRecord], course_id: i64) -> bool {
    records.iter().any(|r| r.course_id == course_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::DateTime;

    fn record(course_id: i64) -> PurchaseRecord {
        PurchaseRecord {
            course_id,
            order_id: "order_1".to_string(),
            payment_id: "pay_1".to_string(),
            purchased_at: DateTime::now(),
        }
    }

    #[test]
    fn empty_ledger_owns_nothing() {
        assert!(!owns_course(&[], 1));
    }

    #[test]
    fn ownership_matches_course_id_only() {
        let ledger = vec![record(1), record(3)];
        assert!(owns_course(&ledger, 1));
        assert!(owns_course(&ledger, 3));
        assert!(!owns_course(&ledger, 2));
    }

    fn course(id: i64) -> Course {
        Course {
            id,
            slug: format!("course-{}", id),
            title: format!("Course {}", id),
            description: String::new(),
            price: 1999,
            original_price: 2999,
            level: "beginner".to_string(),
            duration: "8 weeks".to_string(),
            lessons: 45,
            projects: 8,
            rating: 4.8,
            students: 320,
            thumbnail: String::new(),
            intro_video_url: String::new(),
            modules: vec![crate::models::CourseModule {
                title: "Fundamentals".to_string(),
                lessons: Vec::new(),
            }],
        }
    }

    #[test]
    fn missing_course_is_not_found_even_for_a_non_owner() {
        let err = content_decision(None, &[]).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn missing_course_is_not_found_even_for_an_owner() {
        let ledger = vec![record(1)];
        let err = content_decision(None, &ledger).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn existing_unowned_course_is_forbidden() {
        let err = content_decision(Some(course(1)), &[]).unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn owned_course_releases_modules() {
        let ledger = vec![record(1)];
        let modules = content_decision(Some(course(1)), &ledger).unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].title, "Fundamentals");
    }
}
