pub mod handlers;
pub mod identity;
pub mod password;
pub mod resolver;
pub mod session;
pub mod tokens;
