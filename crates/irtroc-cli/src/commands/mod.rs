pub mod formats;
pub mod init;
pub mod run;
pub mod summarize;
