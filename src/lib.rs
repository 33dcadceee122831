pub mod config;
pub mod error;
pub mod events;
pub mod placeholder;
pub mod refresh;
pub mod row_pool;
pub mod table;
pub mod viewport;

pub use config::TableConfig;
pub use error::{ConstructionError, ProviderError, TableError};
pub use events::{
    DeleteHandler, InsertHandler, KeyCode, Modifiers, RowConstructionListener, RowFocusListener,
    ScrollDirection, ScrollEvent, ScrollListener, Traversal,
};
pub use placeholder::EmptyStatePlaceholder;
pub use refresh::{RefreshDispatcher, RowContentProvider, REFRESH_ERROR_MARKER};
pub use row_pool::{PoolStats, RowFactory, RowHandle, RowId, RowPool, RowPrototype};
pub use table::CompositeTable;
pub use viewport::{ViewportWindow, WindowUpdate};
