mod store;

pub use store::MemorySessionStore;
