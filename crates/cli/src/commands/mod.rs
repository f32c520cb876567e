pub mod create;
pub mod downgrade;
pub mod init;
pub mod status;
pub mod upgrade;
