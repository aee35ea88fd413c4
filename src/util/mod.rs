pub mod figment;
pub mod sensitive;

pub use sensitive::Sensitive;
