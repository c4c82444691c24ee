pub mod router;
pub mod seed;
