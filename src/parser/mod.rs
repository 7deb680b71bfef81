mod php;

pub use php::{ParseError, PhpParser};
