pub mod error;
pub mod traits;
pub mod types;

pub use error::AnalyzerError;
pub use traits::{Action, AssetUploader, ResponseSink};
pub use types::{
    AnalysisRequest, AnalysisResponse, Attachment, ClassificationResult, ImageOrigin,
    ResolvedImage,
};
