//! Knowledge sources: where person attributes and child links come from.
//!
//! A source reports failures as errors; downgrading them to "nothing known"
//! is the resolver's job.

mod memory;
mod sparql;

pub use memory::{FixturePerson, MemorySource};
pub use sparql::WikidataClient;

use crate::error::Result;
use crate::model::{Person, Qid};

/// Oracle over a remote genealogy graph.
#[allow(async_fn_in_trait)]
pub trait KnowledgeSource {
    /// Attributes of a single person.
    async fn fetch_person(&self, qid: &Qid) -> Result<Person>;

    /// Identifiers of the person's children, in no particular order.
    async fn fetch_children(&self, qid: &Qid) -> Result<Vec<Qid>>;
}
