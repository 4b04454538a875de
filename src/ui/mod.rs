//! Full-screen terminal front end.

pub mod chat_loop;
pub mod keys;
pub mod lifecycle;
pub mod renderer;
