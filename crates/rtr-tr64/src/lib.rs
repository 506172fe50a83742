pub mod tr64;

pub use tr64::*;
