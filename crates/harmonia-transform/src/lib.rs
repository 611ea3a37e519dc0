//! Statement generation for multimode survey processing.
//!
//! Each processing step is an [`InstructionGenerator`] producing
//! [`Statement`]s from metadata. [`apply_step`] runs those statements, then
//! the step's optional user script, through an [`ExecutionEngine`].
//! [`PipelineContext`] chains the steps of the unimodal and multimodal
//! stages over a shared set of [`Bindings`].

pub mod bindings;
pub mod engine;
pub mod error;
pub mod issue;
pub mod pipeline;
pub mod processing;
pub mod resolver;
pub mod statement;
pub mod steps;

pub use bindings::{Bindings, Dataset, Role};
pub use engine::ExecutionEngine;
pub use error::{Result, TransformError};
pub use issue::{Issue, IssueSeverity};
pub use pipeline::{
    MetadataSource, ModeSpec, MultimodalScripts, PipelineContext, PipelineParts, Stage,
    StageReport,
};
pub use processing::{DataFormat, StepReport, UnimodalStep, apply_step};
pub use resolver::{MAX_RESOLUTION_ITERATIONS, Resolution, resolve, resolve_with_limit};
pub use statement::{CalcItem, Clause, DatasetExpr, Operand, Statement, parse_script};
pub use steps::InstructionGenerator;
