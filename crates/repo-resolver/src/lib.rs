pub mod error;
pub use error::Result;
pub use error::Error;

pub mod catalog;
pub use catalog::Catalog;

mod repository;

pub mod resolver;
pub use resolver::RepositoryResolver;
