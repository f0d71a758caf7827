pub mod grade;
pub mod init;
pub mod report;
