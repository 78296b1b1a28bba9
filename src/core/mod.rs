pub mod roster;
pub mod search;
pub mod select;
pub mod stats;
