pub mod backup;
pub mod history;
pub mod members;
pub mod payments;
pub mod seed;
pub mod snapshot;
pub mod writeoffs;
