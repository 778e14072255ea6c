pub mod cli;
pub mod config;
pub mod models;
pub mod remote;
pub mod session;
pub mod shell;
pub mod storage;
pub mod task_list;
