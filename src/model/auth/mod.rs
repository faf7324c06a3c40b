mod token;

pub use token::*;
