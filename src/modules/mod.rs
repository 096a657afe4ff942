pub mod admin;
pub mod auth;
pub mod courses;
pub mod lessons;
pub mod students;
pub mod studios;
pub mod teachers;
