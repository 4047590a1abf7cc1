//! Learning algorithms.
//!
//! Everything here operates on `ndarray` matrices and serde-serializable
//! fitted state. Nothing in this module does storage or other I/O; the
//! pipeline stages decide what gets persisted.

pub mod forest;
pub mod iterative;
pub mod metrics;
pub mod ridge;
pub mod scaler;
pub mod smote;
pub mod split;
pub mod tree;

pub use forest::RandomForest;
pub use iterative::{FittedIterativeImputer, IterativeImputer};
pub use metrics::{ClassMetrics, ClassificationReport};
pub use scaler::StandardScaler;
pub use smote::Smote;
pub use split::{stratified_split, SplitIndices};
