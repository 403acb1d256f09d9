pub mod power;
pub mod price;
