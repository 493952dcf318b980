pub mod extraction;
pub mod strategy;
