//! # Domus Core
//!
//! Session-independent plumbing for the Domus orthogonal drawing front end:
//! geometric primitives, the fixed-path staging area shared with the drawing
//! engine, the example graph corpus, the engine call boundary, and the
//! invoker that turns an engine status code into an [`Outcome`].

pub mod geometry;
pub mod outcome;
pub mod staging;
pub mod corpus;
pub mod engine;
pub mod invoker;

pub use geometry::{BBox, Point};
pub use outcome::Outcome;
pub use staging::{Artifact, InputSource, StagingArea, StagingError};
pub use corpus::{CorpusError, ExampleCorpus};
pub use engine::{Engine, EngineError, FnEngine, SubprocessEngine};
pub use invoker::{ComputationInvoker, Invocation};
