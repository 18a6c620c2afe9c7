pub mod market;
pub mod pricing;
pub mod traits;
