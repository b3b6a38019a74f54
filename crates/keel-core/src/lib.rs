mod error;
pub use error::Error;

pub mod graph;

pub mod schema;
pub use schema::DomainModel;

pub mod upgrade;

pub mod value;
pub use value::{Value, ValueTy};

/// A Result type alias that uses keel's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;
