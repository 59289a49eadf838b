//! CLI subcommands

pub mod feed;
pub mod import;
pub mod init;
pub mod list;
pub mod new;
