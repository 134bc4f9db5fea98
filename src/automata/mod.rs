pub mod compiler;
pub mod hir;
pub mod program;
