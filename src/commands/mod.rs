pub mod declarative;
pub mod schema;
pub mod state;
