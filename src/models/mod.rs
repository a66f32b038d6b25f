pub mod course;
pub mod date_format;
pub mod planning;
pub mod profile;
pub mod settings;
pub mod task;
