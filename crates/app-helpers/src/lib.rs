pub mod file_name;
pub mod html;
pub mod id;
