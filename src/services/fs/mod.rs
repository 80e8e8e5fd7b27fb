pub mod browser;
pub mod listing;
pub mod ops;
pub mod resolver;
pub mod search;
pub mod view;
