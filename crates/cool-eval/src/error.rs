//! Runtime faults: the only true `Result` short-circuit in the pipeline.
//! Every other pass accumulates diagnostics and keeps going; the evaluator
//! instead unwinds the whole `run` call on the first one, mirroring a COOL
//! program that calls `abort` or divides by zero.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    VoidReference { context: String },
    ZeroDivision,
    InputError,
    MainClassNotFound,
    MainMethodNotFound,
    NoBranchMatches,
    Abort { class_name: String },
    SubstrOutOfRange,
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionError::VoidReference { context } => {
                write!(f, "ExecutionError: dispatch on void in \"{context}\".")
            }
            ExecutionError::ZeroDivision => write!(f, "ExecutionError: division by zero."),
            ExecutionError::InputError => write!(f, "ExecutionError: invalid integer input."),
            ExecutionError::MainClassNotFound => {
                write!(f, "ExecutionError: class \"Main\" not found.")
            }
            ExecutionError::MainMethodNotFound => {
                write!(f, "ExecutionError: method \"main\" not found in class \"Main\".")
            }
            ExecutionError::NoBranchMatches => write!(f, "ExecutionError: No branch matches."),
            ExecutionError::Abort { class_name } => {
                write!(f, "ExecutionError: Abort called from class {class_name}.")
            }
            ExecutionError::SubstrOutOfRange => write!(f, "ExecutionError: substr out of range"),
        }
    }
}

impl std::error::Error for ExecutionError {}
