//! Handler adapters and their dispatch machinery: a `Handler` trait
//! implemented once per mirrored component, a closed `HandlerFactory`
//! registration table in place of dynamic module loading, and a
//! `Dispatcher` that fans webhook events out to every active handler and
//! aggregates per-handler failures.

pub mod adapters;
pub mod dispatcher;
pub mod factory;
pub mod handler;
mod task_adapter;

pub use dispatcher::Dispatcher;
pub use factory::HandlerFactory;
pub use handler::Handler;
