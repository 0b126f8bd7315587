use crate::models::{Course, OrderRecord, PurchaseRecord, User};
use anyhow::Result;
use futures::TryStreamExt;
use mongodb::options::{FindOptions, IndexOptions};
use mongodb::{
    bson::{self, doc},
    Collection, Database, IndexModel,
};
use uuid::Uuid;

/// Persistence layer over the users, courses and orders collections.
///
/// Injected into the services via `AppState`; no process-wide singletons.
#[derive(Clone)]
pub struct CourseStore {
    users: Collection<User>,
    courses: Collection<Course>,
    orders: Collection<OrderRecord>,
}

impl CourseStore {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection("users"),
            courses: db.collection("courses"),
            orders: db.collection("orders"),
        }
    }

    /// Initialize database indexes.
    pub async fn init_indexes(&self) -> Result<()> {
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(
                IndexOptions::builder()
                    .name("user_email_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.users.create_index(email_index, None).await?;

        // Courses are addressed by their stable numeric id, not the Mongo _id.
        let course_id_index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(
                IndexOptions::builder()
                    .name("course_id_idx".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        self.courses.create_index(course_id_index, None).await?;

        let order_user_index = IndexModel::builder()
            .keys(doc! { "user_id": 1 })
            .options(
                IndexOptions::builder()
                    .name("order_user_idx".to_string())
                    .build(),
            )
            .build();
        self.orders.create_index(order_user_index, None).await?;

        tracing::info!("Course service indexes initialized");
        Ok(())
    }

    // ---- users ----

    pub async fn insert_user(&self, user: &User) -> Result<()> {
        self.users.insert_one(user, None).await?;
        Ok(())
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self.users.find_one(doc! { "email": email }, None).await?;
        Ok(user)
    }

    pub async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let filter = doc! { "_id": bson::to_bson(&id)? };
        let user = self.users.find_one(filter, None).await?;
        Ok(user)
    }

    /// Append purchase records to a user's ledger, skipping course ids that
    /// are already present.
    ///
    /// This is a single aggregation-pipeline update on the user document, so
    /// it is atomic: retried verifications cannot duplicate records, and
    /// concurrent grants for the same user cannot lose each other's updates.
    /// Returns false when no user document matched.
    pub async fn append_purchases(
        &self,
        user_id: Uuid,
        records: &[PurchaseRecord],
    ) -> Result<bool> {
        let records_bson = bson::to_bson(&records)?;
        let update = vec![doc! {
            "$set": {
                "purchased_courses": {
                    "$concatArrays": [
                        { "$ifNull": ["$purchased_courses", []] },
                        { "$filter": {
                            "input": records_bson,
                            "as": "rec",
                            "cond": { "$not": {
                                "$in": [
                                    "$$rec.course_id",
                                    { "$ifNull": ["$purchased_courses.course_id", []] }
                                ]
                            } }
                        } }
                    ]
                }
            }
        }];

        let filter = doc! { "_id": bson::to_bson(&user_id)? };
        let result = self.users.update_one(filter, update, None).await?;
        Ok(result.matched_count > 0)
    }

    // ---- courses ----

    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        let options = FindOptions::builder().sort(doc! { "id": 1 }).build();
        let cursor = self.courses.find(doc! {}, Some(options)).await?;
        let courses: Vec<Course> = cursor.try_collect().await?;
        Ok(courses)
    }

    pub async fn find_course_by_id(&self, id: i64) -> Result<Option<Course>> {
        let course = self.courses.find_one(doc! { "id": id }, None).await?;
        Ok(course)
    }

    pub async fn find_courses_by_ids(&self, ids: &[i64]) -> Result<Vec<Course>> {
        let options = FindOptions::builder().sort(doc! { "id": 1 }).build();
        let cursor = self
            .courses
            .find(doc! { "id": { "$in": ids.to_vec() } }, Some(options))
            .await?;
        let courses: Vec<Course> = cursor.try_collect().await?;
        Ok(courses)
    }

    /// Replace the whole catalog. Used by the seeder only.
    pub async fn replace_catalog(&self, courses: Vec<Course>) -> Result<u64> {
        self.courses.delete_many(doc! {}, None).await?;
        let result = self.courses.insert_many(&courses, None).await?;
        Ok(result.inserted_ids.len() as u64)
    }

    // ---- orders ----

    pub async fn insert_order(&self, order: &OrderRecord) -> Result<()> {
        self.orders.insert_one(order, None).await?;
        Ok(())
    }

    pub async fn find_order(&self, order_id: &str) -> Result<Option<OrderRecord>> {
        let order = self.orders.find_one(doc! { "_id": order_id }, None).await?;
        Ok(order)
    }
}
