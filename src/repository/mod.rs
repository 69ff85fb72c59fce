//! Repository layer: document stores and typed per-entity access

pub mod cases;
pub mod document;
pub mod inquiries;
pub mod memory;
pub mod postgres;
pub mod posts;
pub mod router;
pub mod seed;

pub use document::{DocumentStore, Filter, FindOptions, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgDocumentStore;
pub use router::{Backend, Datastore, WritePolicy};

/// Main repository struct holding the datastore router
#[derive(Clone)]
pub struct Repository {
    pub store: Datastore,
    pub posts: posts::PostsRepository,
    pub cases: cases::CasesRepository,
    pub inquiries: inquiries::InquiriesRepository,
}

impl Repository {
    pub fn new(store: Datastore) -> Self {
        Self {
            posts: posts::PostsRepository::new(store.clone()),
            cases: cases::CasesRepository::new(store.clone()),
            inquiries: inquiries::InquiriesRepository::new(store.clone()),
            store,
        }
    }
}
