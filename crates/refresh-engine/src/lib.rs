pub mod dedup;
pub mod orchestrator;
pub mod refresh;

#[cfg(test)]
pub(crate) mod fake;
