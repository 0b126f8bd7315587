//! Course catalog and protected content handlers.
//!
//! Catalog reads are public and carry metadata only; the module/lesson
//! structure with its video references is released solely through the
//! authenticated content endpoint after the ownership check.

use axum::extract::{Json, Path, State};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::{Course, CourseModule, Lesson};
use crate::AppState;

/// Public catalog view of a course. No modules, no video references.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: String,
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
}

impl From<Course> for CourseSummary {
    fn from(c: Course) -> Self {
        Self {
            id: c.id,
            slug: c.slug,
            title: c.title,
            description: c.description,
            price: c.price,
            original_price: c.original_price,
            level: c.level,
            duration: c.duration,
            lessons: c.lessons,
            projects: c.projects,
            rating: c.rating,
            students: c.students,
            thumbnail: c.thumbnail,
            intro_video_url: c.intro_video_url,
        }
    }
}

/// Protected content payload.
#[derive(Debug, Serialize)]
pub struct ContentResponse {
    pub modules: Vec<ModuleResponse>,
}

#[derive(Debug, Serialize)]
pub struct ModuleResponse {
    pub title: String,
    pub lessons: Vec<LessonResponse>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonResponse {
    pub title: String,
    pub duration: String,
    pub video_url: String,
}

impl From<CourseModule> for ModuleResponse {
    fn from(m: CourseModule) -> Self {
        Self {
            title: m.title,
            lessons: m.lessons.into_iter().map(LessonResponse::from).collect(),
        }
    }
}

impl From<Lesson> for LessonResponse {
    fn from(l: Lesson) -> Self {
        Self {
            title: l.title,
            duration: l.duration,
            video_url: l.video_url,
        }
    }
}

/// List the full catalog.
///
/// GET /api/courses
pub async fn list_courses(
    State(state): State<AppState>,
) -> Result<Json<Vec<CourseSummary>>, AppError> {
    let courses = state
        .store
        .list_courses()
        .await
        .map_err(AppError::DatabaseError)?;

    Ok(Json(courses.into_iter().map(CourseSummary::from).collect()))
}

/// Fetch one course by its catalog id.
///
/// GET /api/courses/:id
pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Json<CourseSummary>, AppError> {
    let course = state
        .store
        .find_course_by_id(course_id)
        .await
        .map_err(AppError::DatabaseError)?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Course not found")))?;

    Ok(Json(CourseSummary::from(course)))
}

/// Release protected course content to an owner.
///
/// GET /api/courses/:id/content
pub async fn course_content(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(course_id): Path<i64>,
) -> Result<Json<ContentResponse>, AppError> {
    let modules = state.access.protected_content(claims.sub, course_id).await?;

    Ok(Json(ContentResponse {
        modules: modules.into_iter().map(ModuleResponse::from).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course_with_video() -> Course {
        Course {
            id: 1,
            slug: "python-programming-masterclass".to_string(),
            title: "Python Programming Masterclass".to_string(),
            description: "Learn Python".to_string(),
            price: 1999,
            original_price: 2999,
            level: "beginner".to_string(),
            duration: "8 weeks".to_string(),
            lessons: 45,
            projects: 8,
            rating: 4.8,
            students: 320,
            thumbnail: "https://cdn.example/python.jpg".to_string(),
            intro_video_url: "https://cdn.example/python-intro.mp4".to_string(),
            modules: vec![CourseModule {
                title: "Python Fundamentals".to_string(),
                lessons: vec![Lesson {
                    title: "Introduction to Python".to_string(),
                    duration: "20 sec".to_string(),
                    video_url: "https://cdn.example/protected/m1-l1.mp4".to_string(),
                }],
            }],
        }
    }

    #[test]
    fn summary_omits_protected_video_refs() {
        let summary = CourseSummary::from(course_with_video());
        let json = serde_json::to_string(&summary).unwrap();

        assert!(json.contains("introVideoUrl"));
        assert!(json.contains("originalPrice"));
        assert!(!json.contains("protected/m1-l1.mp4"));
        assert!(!json.contains("modules"));
    }

    #[test]
    fn content_response_carries_video_refs_unfiltered() {
        let course = course_with_video();
        let content = ContentResponse {
            modules: course.modules.into_iter().map(ModuleResponse::from).collect(),
        };
        let json = serde_json::to_string(&content).unwrap();

        assert!(json.contains("protected/m1-l1.mp4"));
        assert!(json.contains("videoUrl"));
    }
}
