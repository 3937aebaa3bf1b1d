mod editing;
mod repository;
mod sqlite_content_store;
mod store;

pub use editing::{Commit, EditModeController, EditableField};
pub use repository::ContentRepository;
pub use sqlite_content_store::SqliteContentStore;
pub use store::{ContentStore, SectionData};
