//! Identifier types shared by detection, the pipeline and the HTTP surface

pub mod framework_id;
pub mod id_enum_macro;

pub use framework_id::{FrameworkId, LanguageId};
