//! Core of the MDM media job client: the download session manager.
//!
//! Submissions enter the [`scheduler`], admitted jobs live in the
//! [`registry`], one [`poller`] task per job reconciles backend status into the
//! registry, and completed jobs are appended to the persisted [`history`] log.
//! A [`session::Session`] wires all of them together for one process.

pub mod backend;
pub mod collection;
pub mod config;
pub mod error;
pub mod history;
pub mod job;
pub mod logging;
pub mod notify;
pub mod poller;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod storage;
