pub mod actions;
pub mod enhance;
pub mod filters;
pub mod histogram;
pub mod replay;
