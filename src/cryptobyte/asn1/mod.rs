mod bit_string;
mod object_identifier;

pub use bit_string::*;
pub use object_identifier::*;
