pub mod cors;
pub mod dispatch;
pub mod errors;
pub mod handlers;
pub mod providers;
pub mod state;
pub mod validation;
