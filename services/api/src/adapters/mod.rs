pub mod analysis_llm;
pub mod db;
pub mod zip_csv;

pub use analysis_llm::OpenAiAnalysisAdapter;
pub use db::DbAdapter;
pub use zip_csv::CsvZipMetadataAdapter;
