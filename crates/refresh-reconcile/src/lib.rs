pub mod derive;
pub mod duplicates;
pub mod identity;
pub mod origin;

pub use derive::{derive_targets, DerivedTargets, SkipCounts};
pub use duplicates::{active_target_ids, find_duplicate_groups, orphaned_targets, DuplicateGroup};
pub use identity::target_id;
pub use origin::{is_scm_origin, normalize, origin_to_connector_key, ScmOrigin};
