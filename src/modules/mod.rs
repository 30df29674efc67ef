pub mod antivirus;
pub mod crypto;
pub mod notifier;
pub mod storage;
