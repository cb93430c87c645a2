pub mod compare;
pub mod item;
pub mod rank;
pub mod setup;
pub mod ui;
