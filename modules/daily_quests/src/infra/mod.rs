pub mod mail;
pub mod seed;
pub mod storage;
