pub mod data;
pub mod entities;
pub mod token;
pub mod translate;
