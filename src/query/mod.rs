pub mod ast;

pub use ast::{CompositeOp, EngineQuery, LeafOp};
