pub mod commands;
pub mod mutations;
pub mod reducer;
pub mod store;

pub use commands::{AppCommand, Resource};
pub use mutations::Mutation;
pub use reducer::reduce;
pub use store::{AppStore, Subscriber};
