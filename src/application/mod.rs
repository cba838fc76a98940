pub mod bootstrap;
pub mod live_session;
pub mod recommendations;
pub mod session_driver;
pub mod statistics;
