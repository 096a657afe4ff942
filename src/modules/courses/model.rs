pub use lectern_core::PageParams;
pub use lectern_models::{
    Course, CourseListResponse, CourseMessageResponse, CourseSearch, CreateCourseDto,
    MessageResponse, UpdateCourseDto,
};
