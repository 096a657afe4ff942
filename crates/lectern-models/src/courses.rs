//! Course documents and DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::id_set::IdSet;
use crate::ids::{CourseId, LessonId, UserId};
use crate::users::UserSummary;

/// A course document.
///
/// `enrolled_student_ids` is the authoritative roster. `lesson_ids` keeps
/// lessons in creation order.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub teacher_id: UserId,
    #[schema(value_type = Vec<String>)]
    pub enrolled_student_ids: IdSet<UserId>,
    pub lesson_ids: Vec<LessonId>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    pub fn new(teacher_id: UserId, dto: CreateCourseDto) -> Self {
        let now = Utc::now();
        Self {
            id: CourseId::new(),
            teacher_id,
            enrolled_student_ids: IdSet::new(),
            lesson_ids: Vec::new(),
            title: dto.title.trim().to_string(),
            description: dto.description.trim().to_string(),
            category: dto.category.trim().to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_taught_by(&self, user_id: UserId) -> bool {
        self.teacher_id == user_id
    }

    pub fn has_student(&self, user_id: UserId) -> bool {
        self.enrolled_student_ids.contains(&user_id)
    }

    /// Case-insensitive substring match over title, description and category.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        [&self.title, &self.description, &self.category]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCourseDto {
    #[validate(length(min = 1, max = 200))]
    #[schema(example = "Intro to Rust")]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    #[schema(example = "programming")]
    pub category: String,
}

/// Partial update. Ownership and membership fields are not updatable.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCourseDto {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
}

impl UpdateCourseDto {
    pub fn apply(&self, course: &mut Course) {
        if let Some(title) = &self.title {
            course.title = title.trim().to_string();
        }
        if let Some(description) = &self.description {
            course.description = description.trim().to_string();
        }
        if let Some(category) = &self.category {
            course.category = category.trim().to_string();
        }
        course.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CourseSearch {
    /// Case-insensitive match against title, description and category
    pub search: Option<String>,
}

impl CourseSearch {
    pub fn term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseListResponse {
    pub courses: Vec<Course>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseMessageResponse {
    pub message: String,
    pub course: Course,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CoursesResponse {
    pub courses: Vec<Course>,
}

/// A course on the teacher dashboard, with its students resolved.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherCourse {
    #[serde(flatten)]
    pub course: Course,
    pub enrolled_students: Vec<UserSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TeacherCoursesResponse {
    pub courses: Vec<TeacherCourse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Course {
        Course::new(
            UserId::new(),
            CreateCourseDto {
                title: "  Rust Basics ".into(),
                description: "Ownership and borrowing".into(),
                category: "Programming".into(),
            },
        )
    }

    #[test]
    fn test_new_course_trims_and_starts_empty() {
        let course = sample();
        assert_eq!(course.title, "Rust Basics");
        assert!(course.enrolled_student_ids.is_empty());
        assert!(course.lesson_ids.is_empty());
    }

    #[test]
    fn test_matches_search_any_field() {
        let course = sample();
        assert!(course.matches_search("rust"));
        assert!(course.matches_search("BORROW"));
        assert!(course.matches_search("programming"));
        assert!(!course.matches_search("python"));
    }

    #[test]
    fn test_update_only_touches_given_fields() {
        let mut course = sample();
        let dto = UpdateCourseDto {
            category: Some("Systems".into()),
            ..Default::default()
        };
        dto.apply(&mut course);
        assert_eq!(course.category, "Systems");
        assert_eq!(course.title, "Rust Basics");
    }

    #[test]
    fn test_update_validation() {
        let dto = UpdateCourseDto {
            title: Some(String::new()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_search_term_ignores_blank() {
        let search = CourseSearch {
            search: Some("   ".into()),
        };
        assert_eq!(search.term(), None);
    }

    #[test]
    fn test_teacher_course_flattens() {
        let entry = TeacherCourse {
            course: sample(),
            enrolled_students: vec![],
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["title"], "Rust Basics");
        assert_eq!(json["enrolledStudents"], serde_json::json!([]));
    }
}
