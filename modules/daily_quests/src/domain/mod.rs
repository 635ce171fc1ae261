pub mod assignments;
pub mod catalog;
pub mod clock;
pub mod completion;
pub mod error;
pub mod jobs;
pub mod notification;
pub mod ports;
pub mod repo;
pub mod selection;
pub mod sender;
pub mod service;
pub mod token;
