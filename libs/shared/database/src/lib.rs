pub mod error;
pub mod memory;
pub mod store;
pub mod supabase;
pub mod supabase_store;

pub use error::DatabaseError;
pub use memory::InMemoryStore;
pub use store::{SchedulingStore, StoreResult};
pub use supabase::SupabaseClient;
pub use supabase_store::SupabaseStore;
