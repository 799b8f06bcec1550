pub mod classify;
pub mod date;
pub mod dedup;
pub mod document;
pub mod ecli;
pub mod issue;
pub mod mapping;
pub mod notice;
pub mod record;
pub mod schema;
pub mod section;
pub mod text;

pub use classify::{ClassificationItem, Verdict};
pub use dedup::{DedupDecision, DedupOutcome, deduplicate};
pub use document::{Link, Paragraph, RawDocument, RawSection};
pub use ecli::{Ecli, ParsedEcli};
pub use issue::{Issue, IssueKind};
pub use mapping::{FieldMap, LabelTable, MappingError, TargetField};
pub use notice::Notice;
pub use record::{RelatedPublications, TransformedRecord, ValidationMethod, ValidationStatus};
pub use section::Section;
