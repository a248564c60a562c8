pub mod memory;
pub mod repository;
pub mod state;
pub mod supabase;
pub mod supabase_store;

pub use memory::MemoryStore;
pub use repository::{Repositories, StoreError, StoreResult};
pub use state::AppState;
pub use supabase_store::SupabaseStore;
