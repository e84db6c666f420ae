pub mod broadcast;
pub mod connctx;
pub mod guard;
pub mod handler;
pub mod janitor;
pub mod msg_content_handler;
pub mod msg_cursor_handler;
pub mod msg_join_handler;
pub mod msg_leave_handler;
pub mod msg_save_handler;
pub mod registry;
