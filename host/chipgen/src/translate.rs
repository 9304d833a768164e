//! Front-ends that lower chip descriptions into the IR

pub mod svd;
