//! The three state stores plus the `MsgProxy` accessor (§4.1-§4.4).

pub mod chat_store;
pub mod message_store;
pub mod msg_proxy;
pub mod user_store;

pub use chat_store::ChatStore;
pub use message_store::MessageStore;
pub use msg_proxy::{MsgProxy, Variant};
pub use user_store::UserStore;
