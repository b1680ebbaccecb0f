pub mod schedule;
pub mod timeline;
