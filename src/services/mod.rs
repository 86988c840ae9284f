pub mod exports;
pub mod proxy;
