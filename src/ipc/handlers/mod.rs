pub mod core;
pub mod grades;
pub mod policy;
pub mod terms;
