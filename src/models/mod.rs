pub mod analysis;
pub mod patient;
pub mod user;

pub use analysis::{AnalysisResult, ComparisonResult, Confidence, DISCLAIMER};
pub use patient::{ImageBinary, ImageProvenance, LesionImage, NewPatient, Patient};
pub use user::User;
