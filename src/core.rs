pub mod aggregate;
pub mod cycle;
pub mod parse;
pub mod publish;
pub mod record;
