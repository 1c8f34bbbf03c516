pub mod action;
pub mod asset;
pub mod catalog;
pub mod error;
pub mod selection;
pub mod session;

pub use action::{summarize, Action, ActionKind, ActionSummary};
pub use asset::{Asset, AssetId};
pub use catalog::AssetCatalog;
pub use error::{StudioError, StudioResult};
pub use selection::SelectionSet;
pub use session::{EditSession, MergeResult, Notice, NoticeLevel, PlaybackState, TrimRequest};
