pub mod expr;
pub mod logic;
pub mod pipeline;
