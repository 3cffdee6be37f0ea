//! CLI command implementations

pub mod cluster;
pub mod completions;
pub mod group;
pub mod init;
pub mod meeting;
pub mod member;
pub mod report;
pub mod staff;
pub mod survey;
