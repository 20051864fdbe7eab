//! End-to-end character export: collect, allocate, render.

use crate::genealogy::{collect_genealogy, Genealogy, TraversalOptions};
use crate::ids::IdAllocator;
use crate::model::Qid;
use crate::record::{render_genealogy, RecordOptions};
use crate::resolver::PersonResolver;
use crate::source::KnowledgeSource;

/// Output of one export run
#[derive(Debug)]
pub struct Export {
    pub genealogy: Genealogy,
    /// Rendered character records, ready to write out
    pub text: String,
    /// Outbound queries issued for this export
    pub queries: usize,
}

/// Build the genealogy around `root` and render it as character records.
pub async fn export_characters<S: KnowledgeSource>(
    resolver: &mut PersonResolver<S>,
    root: &Qid,
    traversal: TraversalOptions,
    record: &RecordOptions,
    id_prefix: &str,
) -> Export {
    let start = std::time::Instant::now();
    let genealogy = collect_genealogy(resolver, root, traversal).await;

    let mut allocator = IdAllocator::new(id_prefix);
    let text = render_genealogy(&genealogy, resolver.directory(), &mut allocator, record);

    log::info!(
        "Export of {} finished: {} entries, {} queries, {:?}",
        root,
        genealogy.len(),
        resolver.query_count(),
        start.elapsed()
    );

    Export {
        genealogy,
        text,
        queries: resolver.query_count(),
    }
}
