//! SMM assistant bot for a nail-care studio.
//!
//! A single-operator Telegram bot that drafts promotional posts through a
//! hosted chat-completion API and publishes them to a Telegram channel and
//! a VK group wall in one step.

pub mod actions;
pub mod bot;
pub mod channel;
pub mod config;
pub mod generation;
pub mod outcome;
pub mod prompt;
pub mod publisher;
pub mod retry;
pub mod session;
pub mod textutil;
pub mod vk;
