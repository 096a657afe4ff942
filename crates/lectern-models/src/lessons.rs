use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::ids::{CourseId, LessonId};

/// A lesson document. `course_id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub course_id: CourseId,
    pub title: String,
    pub content: Option<String>,
    pub video_url: Option<String>,
    /// Length in minutes
    pub duration: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Lesson {
    pub fn new(course_id: CourseId, dto: CreateLessonDto) -> Self {
        let now = Utc::now();
        Self {
            id: LessonId::new(),
            course_id,
            title: dto.title.trim().to_string(),
            content: dto.content,
            video_url: dto.video_url,
            duration: dto.duration,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonDto {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub content: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
    #[validate(range(min = 0, max = 1440))]
    pub duration: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub content: Option<String>,
    #[validate(url)]
    pub video_url: Option<String>,
    #[validate(range(min = 0, max = 1440))]
    pub duration: Option<i32>,
}

impl UpdateLessonDto {
    pub fn apply(&self, lesson: &mut Lesson) {
        if let Some(title) = &self.title {
            lesson.title = title.trim().to_string();
        }
        if let Some(content) = &self.content {
            lesson.content = Some(content.clone());
        }
        if let Some(video_url) = &self.video_url {
            lesson.video_url = Some(video_url.clone());
        }
        if let Some(duration) = self.duration {
            lesson.duration = Some(duration);
        }
        lesson.updated_at = Utc::now();
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LessonResponse {
    pub lesson: Lesson,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LessonsResponse {
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LessonMessageResponse {
    pub message: String,
    pub lesson: Lesson,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_dto_rejects_bad_url_and_duration() {
        let dto = CreateLessonDto {
            title: "Borrowing".into(),
            content: None,
            video_url: Some("not a url".into()),
            duration: Some(-5),
        };
        let errors = dto.validate().unwrap_err();
        assert_eq!(errors.field_errors().len(), 2);
        assert!(errors.field_errors().contains_key("duration"));
    }

    #[test]
    fn test_create_dto_accepts_minimal() {
        let dto: CreateLessonDto = serde_json::from_str(r#"{"title":"Lifetimes"}"#).unwrap();
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_update_keeps_course() {
        let course_id = CourseId::new();
        let mut lesson = Lesson::new(
            course_id,
            CreateLessonDto {
                title: "Traits".into(),
                content: None,
                video_url: None,
                duration: Some(20),
            },
        );
        UpdateLessonDto {
            duration: Some(30),
            ..Default::default()
        }
        .apply(&mut lesson);

        assert_eq!(lesson.duration, Some(30));
        assert_eq!(lesson.course_id, course_id);
        assert_eq!(lesson.title, "Traits");
    }
}
