pub mod bvalue;
pub mod decode;
pub mod encode;
pub mod error;
pub mod scanner;

pub use bvalue::BValue;   // re-export
pub use decode::{decode, decode_bencode};   // re-export
pub use encode::{bvalue_to_json, encode, encode_bvalue, Bencodable};   // re-export
pub use error::BencodeError;
pub use scanner::Scanner;
