pub mod pool;
pub mod transport;
