pub mod exchange;
pub mod history;

pub use exchange::*;
pub use history::*;
