//! Wire types shared between the chat client and whatever hosts the backend
//! commands.

pub mod domain;
pub mod error;
pub mod protocol;
