pub mod fingerprint;
pub mod matcher;
pub mod roots;
pub mod schedule;
pub mod scanner;
pub mod scanner_model;
pub mod traverse;
