pub mod bulk;
pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod github;
pub mod logging;
pub mod output;
pub mod run;
pub mod scan;
pub mod storage;
