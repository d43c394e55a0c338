pub mod object;
pub mod validation;
