pub use lectern_models::{TeacherCourse, TeacherCoursesResponse, UserSummary};
