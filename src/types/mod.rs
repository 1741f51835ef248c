//! Core types: typed vector spaces, transformations, reports and ids

pub mod ids;
pub mod report;
pub mod spaces;
pub mod transforms;
