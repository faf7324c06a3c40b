pub mod auth;
pub mod awards;
pub mod dialogs;
pub mod flow;
pub mod results;
pub mod session;
pub mod vote;
