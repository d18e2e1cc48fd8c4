// Matrix data structures and operations

pub mod config;
pub mod conversion;
pub mod element;
pub mod extract;
pub mod pending;
pub mod storage;
pub mod wait;
pub mod zombie;

pub use config::{AssignConfig, Materialize, SystemParameters};
pub use element::{castable, Element, TypeCode};
pub use extract::extract;
pub use pending::PendingTuples;
pub use storage::{Matrix, Sparsity};
pub use zombie::RowIndex;
