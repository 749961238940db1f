//! In-memory storage backend.

mod store;

pub use store::{
    InMemoryStore, SEED_ADMIN_ID, SEED_MEMBER_ACCESS_CODE, SEED_MEMBER_ID, SEED_USER_ID,
};
