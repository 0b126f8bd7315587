use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user and their purchase ledger.
///
/// `purchased_courses` is append-only and deduplicated by `course_id`;
/// only registration and the grant service write this document.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub purchased_courses: Vec<PurchaseRecord>,
    pub created_at: DateTime,
}

impl User {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            purchased_courses: Vec::new(),
            created_at: DateTime::now(),
        }
    }
}

/// One granted course purchase. Immutable once written.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PurchaseRecord {
    pub course_id: i64,
    pub order_id: String,
    pub payment_id: String,
    pub purchased_at: DateTime,
}

/// Catalog entry. Seeded externally; read-only from this service.
///
/// `id` is the stable, externally referenced course number, distinct from
/// the Mongo `_id`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Course {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
    /// Price in major currency units (rupees).
    pub price: i64,
    pub original_price: i64,
    pub level: String,
    pub duration: String,
    pub lessons: i64,
    pub projects: i64,
    pub rating: f64,
    pub students: i64,
    pub thumbnail: String,
    pub intro_video_url: String,
    #[serde(default)]
    pub modules: Vec<CourseModule>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CourseModule {
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Lesson {
    pub title: String,
    pub duration: String,
    /// Protected content reference; released only through the content endpoint.
    pub video_url: String,
}

/// Locally persisted record of a provider order.
///
/// Written at order creation so verification reads the course set back from
/// the server rather than trusting the client's resubmission.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderRecord {
    /// Razorpay order id.
    #[serde(rename = "_id")]
    pub order_id: String,
    pub user_id: Uuid,
    pub course_ids: Vec<i64>,
    /// Total in major currency units.
    pub amount: i64,
    /// Total in minor units (paise) as sent to the provider.
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
    pub created_at: DateTime,
}
