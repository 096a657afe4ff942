pub use lectern_models::{
    CreateLessonDto, Lesson, LessonMessageResponse, LessonResponse, LessonsResponse,
    MessageResponse, UpdateLessonDto,
};
