//! Database repositories
//!
//! PostgreSQL implementations of the record store and user directory. Each repository owns
//! a `PgPool` clone and maps driver errors into `AppError`.

pub mod greeting;
pub mod pool;
pub mod user;

pub use greeting::GreetingRepository;
pub use pool::{connect, run_migrations};
pub use user::UserRepository;
