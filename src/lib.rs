pub mod config;
pub mod error;
pub mod model;
pub mod liveness;
pub mod ids;
pub mod source;
pub mod resolver;
pub mod genealogy;
pub mod record;
pub mod export;
pub mod tree;

pub use config::Config;
pub use error::{DynastyError, Result};
pub use export::{export_characters, Export};
pub use genealogy::{collect_genealogy, Genealogy, TraversalOptions};
pub use model::{Person, Qid};
pub use record::RecordOptions;
pub use resolver::PersonResolver;
