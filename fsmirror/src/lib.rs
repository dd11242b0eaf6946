pub mod context;
pub mod diff;
pub mod error;
pub mod mirror;
pub mod queue;
pub mod run;
pub mod scanner;
pub mod state;
pub mod translate;

#[cfg(test)]
mod tests;
